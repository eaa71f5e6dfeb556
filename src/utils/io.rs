//! File I/O primitives with consistent error handling.

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Read a UTF-8 file, mapping failures to `internal.io_error` tagged with `operation`.
pub fn read_file(path: &Path, operation: &str) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| Error::internal_io(e.to_string(), Some(operation.to_string())))
}

/// Like [`read_file`], but a missing file is `Ok(None)`.
pub fn read_file_if_exists(path: &Path, operation: &str) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::internal_io(e.to_string(), Some(operation.to_string()))),
    }
}

/// Sibling path used while a file is being replaced.
pub fn temp_path_for(path: &Path) -> Result<PathBuf> {
    let parent = path.parent().ok_or_else(|| {
        Error::internal_io(format!("Invalid path: {}", path.display()), None)
    })?;
    let filename = path.file_name().ok_or_else(|| {
        Error::internal_io(format!("Invalid path: {}", path.display()), None)
    })?;
    Ok(parent.join(format!(".{}.masquerade.tmp", filename.to_string_lossy())))
}

/// Write content to file atomically (write to a temp sibling, then rename).
///
/// Readers see either the old content or the new content, never a partial write.
pub fn write_file_atomic(path: &Path, content: &str, operation: &str) -> Result<()> {
    let tmp_path = temp_path_for(path).map_err(|e| {
        Error::internal_io(e.message, Some(operation.to_string()))
    })?;

    fs::write(&tmp_path, content).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("{} (write temp)", operation)))
    })?;

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(Error::internal_io(
            e.to_string(),
            Some(format!("{} (rename)", operation)),
        ));
    }

    Ok(())
}

/// `path` relative to `root` with `/` separators, for reports and error details.
pub fn display_relative(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn read_file_succeeds_for_existing_file() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "channelName=alpha").unwrap();

        let content = read_file(temp.path(), "test read").unwrap();
        assert!(content.contains("channelName"));
    }

    #[test]
    fn read_file_returns_error_for_missing_file() {
        let err = read_file(Path::new("/nonexistent/path.txt"), "test read").unwrap_err();
        assert_eq!(err.code.as_str(), "internal.io_error");
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempdir().unwrap();
        let result = read_file_if_exists(&dir.path().join("absent"), "test read").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn atomic_write_replaces_content_and_cleans_up() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nameMapping.properties");
        fs::write(&path, "old").unwrap();

        write_file_atomic(&path, "new", "test write").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert!(!temp_path_for(&path).unwrap().exists());
    }

    #[test]
    fn atomic_write_fails_for_missing_directory() {
        let err = write_file_atomic(
            Path::new("/nonexistent/dir/file.txt"),
            "content",
            "test write",
        )
        .unwrap_err();
        assert_eq!(err.code.as_str(), "internal.io_error");
    }

    #[test]
    fn relative_display_uses_forward_slashes() {
        let root = Path::new("/project");
        assert_eq!(
            display_relative(root, &root.join("lib").join("main.dart")),
            "lib/main.dart"
        );
    }
}
