//! In-memory filesystem for tests and embedding.

use std::{
    collections::HashMap,
    path::{Component, Path, PathBuf},
    sync::{Arc, RwLock},
};

use kiln_core::{
    application::{ApplicationError, ports::TemplateLoader},
    error::KilnResult,
};

/// Templates held in memory, keyed by normalized path.
///
/// `./a.tpl` and `views/../a.tpl` both name `a.tpl`, so include paths
/// joined onto a template's directory resolve the same way they would on
/// disk.
#[derive(Debug, Clone)]
pub struct MemoryFilesystem {
    inner: Arc<RwLock<MemoryFilesystemInner>>,
}

#[derive(Debug, Default)]
struct MemoryFilesystemInner {
    files: HashMap<PathBuf, String>,
}

impl MemoryFilesystem {
    /// Create a new empty memory filesystem.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryFilesystemInner::default())),
        }
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_file(self, path: impl AsRef<Path>, content: impl Into<String>) -> KilnResult<Self> {
        self.insert(path, content)?;
        Ok(self)
    }

    /// Store a template, replacing any previous content.
    pub fn insert(&self, path: impl AsRef<Path>, content: impl Into<String>) -> KilnResult<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| ApplicationError::FilesystemLockError)?;
        inner.files.insert(normalize(path.as_ref()), content.into());
        Ok(())
    }

    /// Read a file's content (testing helper).
    pub fn read_file(&self, path: &Path) -> Option<String> {
        let inner = self.inner.read().ok()?;
        inner.files.get(&normalize(path)).cloned()
    }

    /// Remove a template. Returns whether it was present.
    pub fn remove(&self, path: &Path) -> KilnResult<bool> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| ApplicationError::FilesystemLockError)?;
        Ok(inner.files.remove(&normalize(path)).is_some())
    }

    /// List all files, sorted.
    pub fn list_files(&self) -> Vec<PathBuf> {
        let Ok(inner) = self.inner.read() else {
            return Vec::new();
        };
        let mut files: Vec<PathBuf> = inner.files.keys().cloned().collect();
        files.sort();
        files
    }

    /// Clear all contents.
    pub fn clear(&self) -> KilnResult<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| ApplicationError::FilesystemLockError)?;
        inner.files.clear();
        Ok(())
    }
}

impl Default for MemoryFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateLoader for MemoryFilesystem {
    fn load_text(&self, path: &Path) -> KilnResult<String> {
        let inner = self
            .inner
            .read()
            .map_err(|_| ApplicationError::FilesystemLockError)?;
        inner.files.get(&normalize(path)).cloned().ok_or_else(|| {
            ApplicationError::FilesystemError {
                path: path.to_path_buf(),
                reason: "No such template in memory".into(),
            }
            .into()
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner
            .read()
            .map(|inner| inner.files.contains_key(&normalize(path)))
            .unwrap_or(false)
    }
}

/// Lexically resolve `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::error::KilnError;

    #[test]
    fn poisoned_lock_is_reported() {
        let fs = MemoryFilesystem::new().with_file("a.tpl", "a").unwrap();
        let writer = fs.clone();
        let _ = std::thread::spawn(move || {
            let _guard = writer.inner.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        let err = fs.load_text(Path::new("a.tpl")).unwrap_err();
        assert!(matches!(
            err,
            KilnError::Application(ApplicationError::FilesystemLockError)
        ));
        assert_eq!(err.to_string(), "In-memory filesystem lock poisoned");
        assert!(fs.insert("b.tpl", "b").is_err());
        assert!(!fs.exists(Path::new("a.tpl")));
    }

    #[test]
    fn stored_templates_can_be_loaded() {
        let fs = MemoryFilesystem::new()
            .with_file("views/page.tpl", "body")
            .unwrap();
        assert!(fs.exists(Path::new("views/page.tpl")));
        assert_eq!(fs.load_text(Path::new("views/page.tpl")).unwrap(), "body");
        assert!(!fs.exists(Path::new("views/page")));
    }

    #[test]
    fn paths_are_normalized() {
        let fs = MemoryFilesystem::new()
            .with_file("./shared/header.tpl", "head")
            .unwrap();
        assert!(fs.exists(Path::new("views/../shared/header.tpl")));
        assert_eq!(
            fs.read_file(Path::new("shared/./header.tpl")).as_deref(),
            Some("head")
        );
        assert_eq!(fs.list_files(), vec![PathBuf::from("shared/header.tpl")]);
    }

    #[test]
    fn missing_template_is_an_error() {
        let fs = MemoryFilesystem::new();
        assert!(fs.load_text(Path::new("nope.tpl")).is_err());
    }

    #[test]
    fn remove_and_clear() {
        let fs = MemoryFilesystem::new();
        fs.insert("a.tpl", "a").unwrap();
        fs.insert("b.tpl", "b").unwrap();

        assert!(fs.remove(Path::new("a.tpl")).unwrap());
        assert!(!fs.remove(Path::new("a.tpl")).unwrap());
        fs.clear().unwrap();
        assert!(fs.list_files().is_empty());
    }
}
