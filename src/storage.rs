use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Storage Service Trait
///
/// Abstract file-store contract for question images. Links handed out by
/// `save` are opaque tokens; only this trait knows how they map to files.
/// Errors are plain strings and are translated to API errors by callers.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Creates the backing location if it does not exist yet.
    async fn ensure_ready(&self) -> Result<(), String>;

    /// Persists the bytes and returns the link to store on the question.
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<String, String>;

    async fn read(&self, link: &str) -> Result<Vec<u8>, String>;

    async fn delete(&self, link: &str) -> Result<(), String>;

    /// Removes every stored image. Used by the super-admin cleanup.
    async fn purge(&self) -> Result<(), String>;
}

pub type StorageState = Arc<dyn ImageStore>;

/// Links must be bare file names; anything that could traverse out of the
/// store directory is rejected.
fn sanitize_link(link: &str) -> Result<&str, String> {
    if link.is_empty() || link.contains('/') || link.contains('\\') || link.contains("..") {
        return Err(format!("invalid image link: {link}"));
    }
    Ok(link)
}

/// Local Image Store
///
/// Stores files on the local disk under a single flat directory. Names are
/// prefixed with a millisecond timestamp so repeated uploads of the same
/// file never collide.
pub struct LocalImageStore {
    dir: PathBuf,
}

impl LocalImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, link: &str) -> Result<PathBuf, String> {
        Ok(self.dir.join(sanitize_link(link)?))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn ensure_ready(&self) -> Result<(), String> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| format!("failed to create image directory: {e}"))
    }

    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<String, String> {
        let name = sanitize_link(filename)?;
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| e.to_string())?
            .as_millis();
        let link = format!("{millis}_{name}");

        tokio::fs::write(self.dir.join(&link), bytes)
            .await
            .map_err(|e| format!("failed to write image: {e}"))?;

        Ok(link)
    }

    async fn read(&self, link: &str) -> Result<Vec<u8>, String> {
        tokio::fs::read(self.path_for(link)?)
            .await
            .map_err(|e| format!("failed to read image: {e}"))
    }

    async fn delete(&self, link: &str) -> Result<(), String> {
        match tokio::fs::remove_file(self.path_for(link)?).await {
            Ok(()) => Ok(()),
            // Already gone counts as deleted.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(format!("failed to delete image: {e}")),
        }
    }

    async fn purge(&self) -> Result<(), String> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(format!("failed to list images: {e}")),
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| format!("failed to list images: {e}"))?
        {
            let path = entry.path();
            if is_image_file(&path) {
                tokio::fs::remove_file(&path)
                    .await
                    .map_err(|e| format!("failed to delete image: {e}"))?;
            }
        }
        Ok(())
    }
}

fn is_image_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("png") | Some("jpeg") | Some("jpg")
    )
}

/// In-memory stand-in used by the test suites.
pub struct MockImageStore {
    files: std::sync::Mutex<std::collections::HashMap<String, Vec<u8>>>,
    should_fail: bool,
}

impl MockImageStore {
    pub fn new() -> Self {
        Self {
            files: std::sync::Mutex::new(std::collections::HashMap::new()),
            should_fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            files: std::sync::Mutex::new(std::collections::HashMap::new()),
            should_fail: true,
        }
    }

    pub fn len(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MockImageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageStore for MockImageStore {
    async fn ensure_ready(&self) -> Result<(), String> {
        Ok(())
    }

    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<String, String> {
        if self.should_fail {
            return Err("mock storage failure".to_string());
        }
        let name = sanitize_link(filename)?;
        let link = format!("0_{name}");
        self.files
            .lock()
            .unwrap()
            .insert(link.clone(), bytes.to_vec());
        Ok(link)
    }

    async fn read(&self, link: &str) -> Result<Vec<u8>, String> {
        if self.should_fail {
            return Err("mock storage failure".to_string());
        }
        self.files
            .lock()
            .unwrap()
            .get(link)
            .cloned()
            .ok_or_else(|| format!("no such image: {link}"))
    }

    async fn delete(&self, link: &str) -> Result<(), String> {
        if self.should_fail {
            return Err("mock storage failure".to_string());
        }
        self.files.lock().unwrap().remove(link);
        Ok(())
    }

    async fn purge(&self) -> Result<(), String> {
        if self.should_fail {
            return Err("mock storage failure".to_string());
        }
        self.files.lock().unwrap().clear();
        Ok(())
    }
}
