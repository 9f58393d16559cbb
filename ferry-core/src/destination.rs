use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// Suffix of the temporary file a destination is written to before the rename
pub const PART_SUFFIX: &str = ".part";

/// Map a source path to its place below the destination root.
///
/// The source path is mirrored below `root` as given on the command line:
/// `a/f1` lands at `root/a/f1`, `/abs/x` at `root/abs/x`. Root, prefix, `.`
/// and `..` components are dropped so nothing can land outside `root`.
pub fn destination_for(root: &Path, source: &Path) -> PathBuf {
    let mut target = root.to_path_buf();
    for component in source.components() {
        if let Component::Normal(part) = component {
            target.push(part);
        }
    }
    target
}

/// The sibling `<path>.part` a file is streamed into
pub fn part_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(OsString::new);
    name.push(PART_SUFFIX);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_for_relative() {
        assert_eq!(
            destination_for(Path::new("/dst"), Path::new("a/f1")),
            PathBuf::from("/dst/a/f1")
        );
        assert_eq!(
            destination_for(Path::new("/dst"), Path::new("./a/./f1")),
            PathBuf::from("/dst/a/f1")
        );
    }

    #[test]
    fn test_destination_for_absolute_and_parent() {
        assert_eq!(
            destination_for(Path::new("/dst"), Path::new("/src/a")),
            PathBuf::from("/dst/src/a")
        );
        assert_eq!(
            destination_for(Path::new("/dst"), Path::new("../a")),
            PathBuf::from("/dst/a")
        );
        assert_eq!(destination_for(Path::new("/dst"), Path::new("")), PathBuf::from("/dst"));
    }

    #[test]
    fn test_part_path_for() {
        assert_eq!(
            part_path_for(Path::new("/dst/a/f1")),
            PathBuf::from("/dst/a/f1.part")
        );
        assert_eq!(
            part_path_for(Path::new("/dst/a/f1.txt")),
            PathBuf::from("/dst/a/f1.txt.part")
        );
    }
}
