use std::fs::{self, File, Metadata};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::control::{Control, Flow};
use super::metadata::restore;
use super::{CopyReport, NullReporter, Reporter, Warning, WarningKind};
use crate::config::TransferConfig;
use crate::destination::{destination_for, part_path_for};
use crate::error::{FerryError, Result};
use crate::progress::{NullPlotter, Plotter};
use crate::stream::{Event, InteractiveController, KeySource, NoKeys, SourceHandle, StreamReader};
use crate::tree::{Counter, SizeTree};

/// Where the chunks of the current source file go
enum Output {
    Closed,
    /// Streaming into `<destination>.part`
    Writing {
        file: File,
        part: PathBuf,
        destination: PathBuf,
        handle: SourceHandle,
        bytes: u64,
    },
    /// Reading through without writing, either because the destination
    /// already exists or because writing failed
    Draining {
        handle: SourceHandle,
        bytes: u64,
        existing: bool,
    },
}

/// Copies a scanned tree below a destination root.
///
/// Files are streamed into `<name>.part` and renamed into place when complete;
/// existing destination files are never touched. Directory metadata is applied
/// after everything else, deepest first.
pub struct CopyEngine {
    destination: PathBuf,
    config: TransferConfig,
}

impl CopyEngine {
    pub fn new(destination: impl Into<PathBuf>, config: TransferConfig) -> Self {
        Self {
            destination: destination.into(),
            config,
        }
    }

    /// Copy `tree`, taking commands from `keys` and reporting to `reporter`
    pub fn run<K: KeySource>(
        &self,
        tree: &SizeTree,
        keys: K,
        reporter: &mut dyn Reporter,
        plotter: &mut dyn Plotter,
    ) -> Result<CopyReport> {
        info!(
            destination = %self.destination.display(),
            files = tree.counter.files,
            bytes = tree.counter.bytes,
            "copy: started"
        );

        let mut controller = InteractiveController::new(StreamReader::new(tree, &self.config), keys);
        let mut control = Control::new(reporter, plotter, self.config.report_interval);
        let mut state = CopyState::new(&self.destination, self.config.follow_symlinks);

        while let Some(event) = controller.next() {
            let event = event?;
            if let Event::Keystroke(stroke) = &event {
                if control.handle(stroke, &mut controller)? == Flow::Quit {
                    info!("copy: quit requested");
                    state.abandon();
                    state.report.interrupted = true;
                    break;
                }
                continue;
            }

            if let (Some(path), Some(ancestry)) = (event.path(), event.ancestry())
                && !path.as_os_str().is_empty()
            {
                control.observe(path, ancestry);
            }
            state.apply(event, controller.chunk())?;
        }

        let report = state.finish();
        info!(
            copied = %report.copied,
            skipped = %report.skipped,
            warnings = report.warnings.len(),
            "copy: finished"
        );
        Ok(report)
    }
}

struct CopyState<'a> {
    root: &'a Path,
    follow_symlinks: bool,
    output: Output,
    /// Directory metadata to apply once all files are in place, in walk order
    deferred: Vec<(Metadata, PathBuf)>,
    report: CopyReport,
}

impl<'a> CopyState<'a> {
    fn new(root: &'a Path, follow_symlinks: bool) -> Self {
        Self {
            root,
            follow_symlinks,
            output: Output::Closed,
            deferred: Vec::new(),
            report: CopyReport::default(),
        }
    }

    fn stat(&self, path: &Path) -> io::Result<Metadata> {
        if self.follow_symlinks {
            fs::metadata(path)
        } else {
            fs::symlink_metadata(path)
        }
    }

    fn warn(&mut self, path: impl Into<PathBuf>, kind: WarningKind) {
        let warning = Warning::new(path, kind);
        warn!(path = %warning.path.display(), "{}", warning.kind);
        self.report.warnings.push(warning);
    }

    fn expect_closed(&self, event: &Event) -> Result<()> {
        match self.output {
            Output::Closed => Ok(()),
            _ => Err(FerryError::EventOrder(format!(
                "{} event while a file is open",
                event.kind()
            ))),
        }
    }

    fn apply(&mut self, event: Event, chunk: &[u8]) -> Result<()> {
        match event {
            Event::Directory { ref path, .. } => {
                self.expect_closed(&event)?;
                self.directory(path);
            }
            Event::FileOpened {
                ref path, handle, ..
            } => {
                self.expect_closed(&event)?;
                self.open(path, handle);
            }
            Event::DataChunk { handle, len, .. } => self.write(handle, &chunk[..len.min(chunk.len())])?,
            Event::EndOfFile { path, handle, .. } => self.close(&path, handle)?,
            Event::Special { ref path, .. } => {
                self.expect_closed(&event)?;
                self.special(path);
            }
            Event::BadLeaf {
                path, error, file, ..
            } => {
                let output = std::mem::replace(&mut self.output, Output::Closed);
                if matches!(output, Output::Closed) && file.is_some() {
                    return Err(FerryError::EventOrder(
                        "bad-leaf event carries a file that was never opened".to_string(),
                    ));
                }
                // Dropping the output closes the temp file; the partial file stays.
                drop(output);
                self.warn(path, WarningKind::BadLeaf(error));
            }
            Event::Leaf { .. } | Event::Keystroke(_) => {
                return Err(FerryError::EventOrder(format!(
                    "unexpected {} event",
                    event.kind()
                )));
            }
        }
        Ok(())
    }

    fn directory(&mut self, path: &Path) {
        // The pseudo-root gathering several inputs has no destination
        if path.as_os_str().is_empty() {
            return;
        }
        let destination = destination_for(self.root, path);
        if !destination.is_dir()
            && let Err(e) = fs::create_dir_all(&destination)
        {
            self.warn(destination, WarningKind::CreateDirectory(e));
            return;
        }
        match self.stat(path) {
            Ok(metadata) => self.deferred.push((metadata, destination)),
            Err(e) => self.warn(path, WarningKind::Stat(e)),
        }
    }

    fn open(&mut self, path: &Path, handle: SourceHandle) {
        let destination = destination_for(self.root, path);
        if let Some(parent) = destination.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            debug!(path = %parent.display(), error = %e, "copy: cannot create parent");
        }

        if fs::symlink_metadata(&destination).is_ok() {
            debug!(path = %destination.display(), "copy: destination exists, skipping");
            self.output = Output::Draining {
                handle,
                bytes: 0,
                existing: true,
            };
            return;
        }

        let part = part_path_for(&destination);
        self.output = match File::create(&part) {
            Ok(file) => Output::Writing {
                file,
                part,
                destination,
                handle,
                bytes: 0,
            },
            Err(e) => {
                self.warn(part, WarningKind::CreateFile(e));
                Output::Draining {
                    handle,
                    bytes: 0,
                    existing: false,
                }
            }
        };
    }

    fn write(&mut self, chunk_handle: SourceHandle, chunk: &[u8]) -> Result<()> {
        let failed = match &mut self.output {
            Output::Closed => {
                return Err(FerryError::EventOrder(
                    "data-chunk event without an open file".to_string(),
                ));
            }
            Output::Writing { handle, .. } | Output::Draining { handle, .. }
                if *handle != chunk_handle =>
            {
                return Err(FerryError::EventOrder(
                    "data-chunk event for a file that is not open".to_string(),
                ));
            }
            Output::Draining { bytes, .. } => {
                *bytes += chunk.len() as u64;
                None
            }
            Output::Writing {
                file, part, bytes, ..
            } => match file.write_all(chunk) {
                Ok(()) => {
                    *bytes += chunk.len() as u64;
                    None
                }
                Err(e) => Some((part.clone(), e, *bytes + chunk.len() as u64)),
            },
        };

        if let Some((part, error, bytes)) = failed {
            self.output = Output::Draining {
                handle: chunk_handle,
                bytes,
                existing: false,
            };
            self.warn(part, WarningKind::Write(error));
        }
        Ok(())
    }

    fn close(&mut self, source: &Path, eof_handle: SourceHandle) -> Result<()> {
        match std::mem::replace(&mut self.output, Output::Closed) {
            Output::Closed => Err(FerryError::EventOrder(
                "end-of-file event without an open file".to_string(),
            )),
            Output::Writing { handle, .. } | Output::Draining { handle, .. }
                if handle != eof_handle =>
            {
                Err(FerryError::EventOrder(
                    "end-of-file event for a file that is not open".to_string(),
                ))
            }
            Output::Writing {
                file,
                part,
                destination,
                bytes,
                ..
            } => {
                drop(file);
                if let Err(e) = fs::rename(&part, &destination) {
                    self.warn(part, WarningKind::Rename(e));
                    return Ok(());
                }
                self.report.copied += Counter::file(bytes);
                match self.stat(source) {
                    Ok(metadata) => {
                        for kind in restore(&metadata, &destination) {
                            self.warn(destination.clone(), kind);
                        }
                    }
                    Err(e) => self.warn(source, WarningKind::Stat(e)),
                }
                Ok(())
            }
            Output::Draining {
                bytes, existing, ..
            } => {
                if existing {
                    self.report.skipped += Counter::file(bytes);
                }
                Ok(())
            }
        }
    }

    fn special(&mut self, path: &Path) {
        let metadata = match self.stat(path) {
            Ok(m) => m,
            Err(e) => return self.warn(path, WarningKind::Stat(e)),
        };
        if !metadata.file_type().is_symlink() {
            return self.warn(path, WarningKind::Unsupported);
        }

        let target = match fs::read_link(path) {
            Ok(t) => t,
            Err(e) => return self.warn(path, WarningKind::Stat(e)),
        };
        let destination = destination_for(self.root, path);
        if fs::symlink_metadata(&destination).is_ok() {
            debug!(path = %destination.display(), "copy: link exists, skipping");
            return;
        }
        if let Some(parent) = destination.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            debug!(path = %parent.display(), error = %e, "copy: cannot create parent");
        }

        if let Err(error) = std::os::unix::fs::symlink(&target, &destination) {
            return self.warn(destination, WarningKind::Symlink { target, error });
        }
        for kind in restore(&metadata, &destination) {
            self.warn(destination.clone(), kind);
        }
    }

    /// Close a half-written file on quit, leaving the `.part` behind
    fn abandon(&mut self) {
        if let Output::Writing { part, .. } = std::mem::replace(&mut self.output, Output::Closed) {
            debug!(path = %part.display(), "copy: partial file left behind");
        }
    }

    /// Apply deferred directory metadata, deepest first
    fn finish(mut self) -> CopyReport {
        let deferred = std::mem::take(&mut self.deferred);
        for (metadata, destination) in deferred.iter().rev() {
            for kind in restore(metadata, destination) {
                self.warn(destination.clone(), kind);
            }
        }
        self.report
    }
}

/// Copy `tree` below `destination` without a terminal, handing each warning
/// to `on_warning` once the copy is done.
pub fn copy<F>(
    tree: &SizeTree,
    destination: &Path,
    follow_symlinks: bool,
    mut on_warning: F,
) -> Result<CopyReport>
where
    F: FnMut(&Warning),
{
    let config = TransferConfig {
        follow_symlinks,
        ..TransferConfig::default()
    };
    let report = CopyEngine::new(destination, config).run(
        tree,
        NoKeys,
        &mut NullReporter,
        &mut NullPlotter,
    )?;
    report.warnings.iter().for_each(&mut on_warning);
    Ok(report)
}
