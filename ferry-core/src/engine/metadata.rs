use std::fs::{self, Metadata, Permissions};
use std::os::unix::fs::{MetadataExt, PermissionsExt, lchown};
use std::path::Path;

use filetime::{FileTime, set_file_times, set_symlink_file_times};

use super::WarningKind;

/// Copy owner, permission bits and access/modification times from `source`
/// onto `destination`. Each step is attempted independently; the failures are
/// returned.
///
/// Symlinks keep their own permission bits and are never followed.
pub(crate) fn restore(source: &Metadata, destination: &Path) -> Vec<WarningKind> {
    let mut failures = Vec::new();
    let symlink = source.file_type().is_symlink();

    let (uid, gid) = (source.uid(), source.gid());
    if let Err(error) = lchown(destination, Some(uid), Some(gid)) {
        failures.push(WarningKind::Chown { uid, gid, error });
    }

    if !symlink {
        let mode = source.mode() & 0o7777;
        if let Err(error) = fs::set_permissions(destination, Permissions::from_mode(mode)) {
            failures.push(WarningKind::Chmod { mode, error });
        }
    }

    let accessed = FileTime::from_last_access_time(source);
    let modified = FileTime::from_last_modification_time(source);
    let result = if symlink {
        set_symlink_file_times(destination, accessed, modified)
    } else {
        set_file_times(destination, accessed, modified)
    };
    if let Err(error) = result {
        failures.push(WarningKind::Times(error));
    }

    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_restore_copies_mode_and_times() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        let dest = temp.path().join("dest");
        fs::write(&source, "data").unwrap();
        fs::write(&dest, "data").unwrap();
        fs::set_permissions(&source, Permissions::from_mode(0o640)).unwrap();
        let mtime = FileTime::from_unix_time(1_000_000_000, 0);
        set_file_times(&source, mtime, mtime).unwrap();

        let failures = restore(&fs::symlink_metadata(&source).unwrap(), &dest);
        assert!(failures.is_empty(), "{failures:?}");

        let copied = fs::metadata(&dest).unwrap();
        assert_eq!(copied.mode() & 0o7777, 0o640);
        assert_eq!(FileTime::from_last_modification_time(&copied), mtime);
    }

    #[test]
    fn test_restore_on_missing_destination_reports_every_step() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        fs::write(&source, "data").unwrap();

        let failures = restore(&fs::metadata(&source).unwrap(), &temp.path().join("absent"));
        assert_eq!(failures.len(), 3);
        assert!(matches!(failures[0], WarningKind::Chown { .. }));
        assert!(matches!(failures[2], WarningKind::Times(_)));
    }
}
