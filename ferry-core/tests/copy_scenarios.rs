use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};

use ferry_core::{
    Counter, CopyEngine, CopyReport, Event, Keyboard, NullPlotter, ProgressFrame, Reporter,
    StreamReader, TransferConfig, copy, destination_for, part_path_for, scan,
};
use filetime::FileTime;
use tempfile::TempDir;

/// Source tree `a/{f1 (10 bytes), f2 (empty)}` and empty `b/`
fn source() -> (TempDir, Vec<PathBuf>) {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("a")).unwrap();
    fs::write(temp.path().join("a/f1"), "0123456789").unwrap();
    fs::write(temp.path().join("a/f2"), "").unwrap();
    fs::create_dir(temp.path().join("b")).unwrap();
    let inputs = vec![temp.path().join("a"), temp.path().join("b")];
    (temp, inputs)
}

fn config(chunk_size: usize) -> TransferConfig {
    TransferConfig {
        chunk_size,
        ..TransferConfig::default()
    }
}

fn run(inputs: &[PathBuf], dst: &Path, chunk_size: usize) -> CopyReport {
    let tree = scan(inputs, false, None);
    CopyEngine::new(dst, config(chunk_size))
        .run(&tree, ferry_core::NoKeys, &mut ferry_core::NullReporter, &mut NullPlotter)
        .unwrap()
}

#[test]
fn copies_small_tree_in_chunks() {
    let (src, inputs) = source();
    let dst = TempDir::new().unwrap();

    let tree = scan(&inputs, false, None);
    assert_eq!(tree.counter, Counter::new(2, 10));

    let mut chunks: BTreeMap<PathBuf, Vec<usize>> = BTreeMap::new();
    let mut ends = Vec::new();
    for event in StreamReader::new(&tree, &config(4)) {
        match event {
            Event::FileOpened { path, .. } => {
                chunks.insert(path, Vec::new());
            }
            Event::DataChunk { path, len, .. } => chunks.entry(path).or_default().push(len),
            Event::EndOfFile { path, .. } => ends.push(path),
            _ => {}
        }
    }
    let f1 = src.path().join("a/f1");
    let f2 = src.path().join("a/f2");
    assert_eq!(chunks[&f1], vec![4, 4, 2]);
    assert_eq!(chunks[&f2], Vec::<usize>::new());
    assert_eq!(ends, vec![f1.clone(), f2.clone()]);

    let report = run(&inputs, dst.path(), 4);
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    assert_eq!(report.total(), Counter::new(2, 10));
    assert_eq!(report.copied, Counter::new(2, 10));

    assert_eq!(fs::read(destination_for(dst.path(), &f1)).unwrap(), b"0123456789");
    assert_eq!(fs::read(destination_for(dst.path(), &f2)).unwrap(), b"");
    let b = destination_for(dst.path(), &src.path().join("b"));
    assert!(b.is_dir());
    assert_eq!(fs::read_dir(&b).unwrap().count(), 0);
}

#[test]
fn existing_destination_file_is_skipped_but_counted() {
    let (src, inputs) = source();
    let dst = TempDir::new().unwrap();
    let existing = destination_for(dst.path(), &src.path().join("a/f1"));
    fs::create_dir_all(existing.parent().unwrap()).unwrap();
    fs::write(&existing, "old").unwrap();
    let old_mtime = FileTime::from_unix_time(1_200_000_000, 0);
    filetime::set_file_mtime(&existing, old_mtime).unwrap();

    let report = run(&inputs, dst.path(), 4);
    assert_eq!(report.skipped, Counter::new(1, 10));
    assert_eq!(report.copied, Counter::new(1, 0));
    assert_eq!(report.total(), Counter::new(2, 10));

    assert_eq!(fs::read_to_string(&existing).unwrap(), "old");
    let metadata = fs::metadata(&existing).unwrap();
    assert_eq!(FileTime::from_last_modification_time(&metadata), old_mtime);
    assert!(!part_path_for(&existing).exists());
}

#[test]
fn scan_with_destination_leaves_existing_files_out() {
    let (src, inputs) = source();
    let dst = TempDir::new().unwrap();
    let existing = destination_for(dst.path(), &src.path().join("a/f1"));
    fs::create_dir_all(existing.parent().unwrap()).unwrap();
    fs::write(&existing, "old").unwrap();

    let tree = scan(&inputs, false, Some(dst.path()));
    assert_eq!(tree.counter, Counter::new(1, 0));
}

#[test]
fn symlinks_are_recreated_not_followed() {
    let src = TempDir::new().unwrap();
    let dst = TempDir::new().unwrap();
    let link = src.path().join("c");
    std::os::unix::fs::symlink("/etc/passwd", &link).unwrap();

    let tree = scan(&[src.path().to_path_buf()], false, None);
    let report = copy(&tree, dst.path(), false, |w| panic!("unexpected warning: {w}")).unwrap();
    assert_eq!(report.copied, Counter::ZERO);

    let copied = destination_for(dst.path(), &link);
    assert!(fs::symlink_metadata(&copied).unwrap().file_type().is_symlink());
    assert_eq!(fs::read_link(&copied).unwrap(), PathBuf::from("/etc/passwd"));
}

#[test]
fn second_copy_writes_nothing() {
    let (src, inputs) = source();
    let dst = TempDir::new().unwrap();
    std::os::unix::fs::symlink("a/f1", src.path().join("link")).unwrap();
    let mut inputs = inputs;
    inputs.push(src.path().join("link"));

    let first = run(&inputs, dst.path(), 4);
    assert!(first.warnings.is_empty(), "{:?}", first.warnings);

    let files = [
        destination_for(dst.path(), &src.path().join("a/f1")),
        destination_for(dst.path(), &src.path().join("a/f2")),
    ];
    let before: Vec<(Vec<u8>, FileTime)> = files
        .iter()
        .map(|f| {
            let m = fs::metadata(f).unwrap();
            (fs::read(f).unwrap(), FileTime::from_last_modification_time(&m))
        })
        .collect();

    let second = run(&inputs, dst.path(), 4);
    assert!(second.warnings.is_empty(), "{:?}", second.warnings);
    assert_eq!(second.copied, Counter::ZERO);
    assert_eq!(second.skipped, Counter::new(2, 10));

    let after: Vec<(Vec<u8>, FileTime)> = files
        .iter()
        .map(|f| {
            let m = fs::metadata(f).unwrap();
            (fs::read(f).unwrap(), FileTime::from_last_modification_time(&m))
        })
        .collect();
    assert_eq!(before, after);
}

#[test]
fn directory_times_are_restored_after_contents() {
    let (src, inputs) = source();
    let dst = TempDir::new().unwrap();
    let a = src.path().join("a");
    let mtime = FileTime::from_unix_time(1_300_000_000, 0);
    filetime::set_file_times(&a, mtime, mtime).unwrap();

    let report = run(&inputs, dst.path(), 4);
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    let copied = fs::metadata(destination_for(dst.path(), &a)).unwrap();
    assert_eq!(FileTime::from_last_modification_time(&copied), mtime);
}

#[derive(Default)]
struct Recorder {
    messages: Vec<String>,
    paused: usize,
}

impl Reporter for Recorder {
    fn report(&mut self, frame: &ProgressFrame<'_>) -> io::Result<()> {
        self.messages.push(frame.message.to_string());
        Ok(())
    }

    fn paused(&mut self) -> io::Result<()> {
        self.paused += 1;
        Ok(())
    }
}

fn big_source() -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("big");
    fs::write(&file, vec![42u8; 64 * 1024]).unwrap();
    (temp, file)
}

#[test]
fn quit_key_leaves_partial_file() {
    let (_src, file) = big_source();
    let dst = TempDir::new().unwrap();
    let (mut tx, rx) = UnixStream::pair().unwrap();
    tx.write_all(b"q").unwrap();

    let tree = scan(&[file.clone()], false, None);
    let mut recorder = Recorder::default();
    let report = CopyEngine::new(dst.path(), config(1024))
        .run(&tree, Keyboard::new(rx), &mut recorder, &mut NullPlotter)
        .unwrap();

    assert!(report.interrupted);
    assert_eq!(report.copied, Counter::ZERO);
    let target = destination_for(dst.path(), &file);
    assert!(!target.exists());
    assert!(part_path_for(&target).exists());
}

#[test]
fn unbound_key_and_pause_keep_copying() {
    let (_src, file) = big_source();
    let dst = TempDir::new().unwrap();
    let (mut tx, rx) = UnixStream::pair().unwrap();
    // unbound key, pause, any key to continue, then a delay step up and down
    tx.write_all(b"x zdD").unwrap();
    drop(tx);

    let tree = scan(&[file.clone()], false, None);
    let mut recorder = Recorder::default();
    let report = CopyEngine::new(dst.path(), config(1024))
        .run(&tree, Keyboard::new(rx), &mut recorder, &mut NullPlotter)
        .unwrap();

    assert!(!report.interrupted);
    assert_eq!(report.copied, Counter::new(1, 64 * 1024));
    assert_eq!(recorder.paused, 1);
    assert!(recorder.messages.iter().any(|m| m == "key not bound: \"x\""));
    assert!(recorder.messages.iter().any(|m| m == "continued"));
    assert!(recorder.messages.iter().any(|m| m == "delay increased to 15ms"));
    assert!(recorder.messages.iter().any(|m| m == "delay disabled"));
    assert_eq!(fs::read(destination_for(dst.path(), &file)).unwrap().len(), 64 * 1024);
}
