use crate::error::{RefactorError, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Replace the contents of `path` atomically.
///
/// The new contents go to a temporary file in the same directory which is
/// fsynced, given the original file's permissions and then renamed over the
/// original. A failure at any step leaves the original file untouched.
/// A symlinked `path` is resolved first, so the link survives and its target
/// receives the new contents.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let resolved = fs::canonicalize(path).map_err(|e| RefactorError::write_back(path, e))?;
    let target = resolved.as_path();

    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let original_permissions = fs::metadata(target)
        .map_err(|e| RefactorError::write_back(path, e))?
        .permissions();

    let mut temp = tempfile::Builder::new()
        .prefix(".recast")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|e| RefactorError::write_back(path, e))?;

    temp.write_all(contents)
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|e| RefactorError::write_back(path, e))?;

    fs::set_permissions(temp.path(), original_permissions)
        .map_err(|e| RefactorError::write_back(path, e))?;

    temp.persist(target)
        .map_err(|e| RefactorError::write_back(path, e.error))?;

    // Sync parent directory on Unix so the rename itself is durable
    #[cfg(unix)]
    {
        let dir = File::open(parent).map_err(|e| RefactorError::write_back(path, e))?;
        dir.sync_all()
            .map_err(|e| RefactorError::write_back(path, e))?;
    }

    debug!(path = %path.display(), bytes = contents.len(), "committed file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_replaces_contents() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("main.go");
        fs::write(&file, "package main\n").unwrap();

        write_atomic(&file, b"package other\n").unwrap();

        assert_eq!(fs::read_to_string(&file).unwrap(), "package other\n");
    }

    #[test]
    fn test_write_atomic_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("README.md");
        fs::write(&file, "old").unwrap();

        write_atomic(&file, b"new").unwrap();

        let entries: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(std::result::Result::ok)
            .map(|e| e.file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("README.md")]);
    }

    #[test]
    fn test_write_atomic_missing_file_is_write_back_error() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("missing.txt");

        let err = write_atomic(&file, b"data").unwrap_err();
        assert!(matches!(err, RefactorError::WriteBack { .. }));
        assert!(!file.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_writes_through_symlink() {
        let temp_dir = TempDir::new().unwrap();
        let real = temp_dir.path().join("main.go");
        let link = temp_dir.path().join("link.go");
        fs::write(&real, "package main\n").unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        write_atomic(&link, b"package other\n").unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&real).unwrap(), "package other\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_preserves_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("script.sh");
        fs::write(&file, "echo old").unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o750)).unwrap();

        write_atomic(&file, b"echo new").unwrap();

        let mode = fs::metadata(&file).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o750);
    }
}
