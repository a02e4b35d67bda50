//! Local filesystem adapter using std::fs.

use std::io;
use std::path::Path;

use kiln_core::{
    application::ports::TemplateLoader,
    error::{KilnError, KilnResult},
};

/// Production template loader reading from disk.
#[derive(Debug, Clone, Copy)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    /// Create a new local filesystem adapter.
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateLoader for LocalFilesystem {
    fn load_text(&self, path: &Path) -> KilnResult<String> {
        std::fs::read_to_string(path).map_err(|e| map_io_error(path, e, "read template"))
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

fn map_io_error(path: &Path, e: io::Error, operation: &str) -> KilnError {
    use kiln_core::application::ApplicationError;

    ApplicationError::FilesystemError {
        path: path.to_path_buf(),
        reason: format!("Failed to {}: {}", operation, e),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::application::ApplicationError;

    #[test]
    fn reads_existing_templates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.tpl");
        std::fs::write(&path, "Hello <% name %>\n").unwrap();

        let fs = LocalFilesystem::new();
        assert!(fs.exists(&path));
        assert_eq!(fs.load_text(&path).unwrap(), "Hello <% name %>\n");
    }

    #[test]
    fn directories_are_not_templates() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!LocalFilesystem::new().exists(dir.path()));
    }

    #[test]
    fn missing_file_is_a_filesystem_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.tpl");

        let err = LocalFilesystem::new().load_text(&path).unwrap_err();
        match err {
            KilnError::Application(ApplicationError::FilesystemError { path: p, reason }) => {
                assert_eq!(p, path);
                assert!(reason.starts_with("Failed to read template"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
