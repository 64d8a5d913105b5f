use bytes::Bytes;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image file not found: {0}")]
    NotFound(String),
}

/// Filesystem directory uploaded images live in. Files are keyed by their
/// generated stored name; the metadata rows live in redb.
#[derive(Clone)]
pub struct ImageDir {
    base_path: PathBuf,
}

impl ImageDir {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, std::io::Error> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_path.join(name)
    }

    /// Write the bytes to a temp sibling, drop any pre-existing file at the
    /// destination, then rename into place. The rename is atomic on the
    /// same filesystem; a crash can still leave a stray `.tmp` behind.
    pub async fn save(&self, name: &str, data: &[u8]) -> Result<(), ImageStoreError> {
        let dest = self.file_path(name);
        let tmp = self.base_path.join(format!("{name}.tmp"));

        tokio::fs::write(&tmp, data).await?;
        if dest.exists() {
            tokio::fs::remove_file(&dest).await?;
        }
        tokio::fs::rename(&tmp, &dest).await?;
        Ok(())
    }

    pub async fn read(&self, name: &str) -> Result<Bytes, ImageStoreError> {
        let path = self.file_path(name);
        if !path.exists() {
            return Err(ImageStoreError::NotFound(name.to_string()));
        }
        let data = tokio::fs::read(&path).await?;
        Ok(Bytes::from(data))
    }

    pub async fn remove(&self, name: &str) -> Result<(), ImageStoreError> {
        let path = self.file_path(name);
        if path.exists() {
            tokio::fs::remove_file(&path).await?;
        }
        Ok(())
    }

    pub async fn exists(&self, name: &str) -> Result<bool, ImageStoreError> {
        Ok(self.file_path(name).exists())
    }
}
