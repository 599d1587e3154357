use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("File not found: {0:?}")]
    FileNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Decode error: {0:?}")]
    Decode(PathBuf),

    #[error("Missing definition: {0}")]
    MissingDefinition(String),
}

/// Loads files from a plain data directory on disk.
pub struct AssetLoader {
    root_path: PathBuf,
}

impl AssetLoader {
    pub fn new(root_path: impl AsRef<Path>) -> Self {
        Self {
            root_path: root_path.as_ref().to_owned(),
        }
    }

    pub fn load_raw(&self, path: impl AsRef<Path>) -> Result<Vec<u8>, AssetError> {
        let full_path = self.root_path.join(path.as_ref());
        if !full_path.exists() {
            return Err(AssetError::FileNotFound(full_path));
        }

        Ok(std::fs::read(&full_path)?)
    }

    pub fn load_text(&self, path: impl AsRef<Path>) -> Result<String, AssetError> {
        let data = self.load_raw(path.as_ref())?;
        String::from_utf8(data).map_err(|_| AssetError::Decode(path.as_ref().to_owned()))
    }
}
