use std::fs;
use std::io;
use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};

use crate::config::StorageConfig;
use crate::domain::TemplateId;
use crate::error::BridgeError;

#[derive(Debug, Clone)]
pub struct Store {
    config: StorageConfig,
}

impl Store {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn archive_path(&self, id: &TemplateId) -> Utf8PathBuf {
        self.config.download_dir.join(format!("{id}.zip"))
    }

    pub fn extract_dir(&self, id: &TemplateId) -> Utf8PathBuf {
        self.config.extract_dir.join(id.as_str())
    }

    pub fn template_json_path(&self, id: &TemplateId) -> Utf8PathBuf {
        self.extract_dir(id).join("template.json")
    }

    pub fn scene_path(&self, id: &TemplateId) -> Utf8PathBuf {
        self.config.converted_dir.join(format!("{id}.scene.json"))
    }

    pub fn ensure_layout(&self) -> Result<(), BridgeError> {
        for dir in [
            &self.config.download_dir,
            &self.config.extract_dir,
            &self.config.converted_dir,
            &self.config.metadata_dir,
        ] {
            fs::create_dir_all(dir.as_std_path())
                .map_err(|err| BridgeError::Filesystem(err.to_string()))?;
        }
        if let Some(parent) = self.config.registry_path.parent() {
            fs::create_dir_all(parent.as_std_path())
                .map_err(|err| BridgeError::Filesystem(err.to_string()))?;
        }
        Ok(())
    }

    pub fn list_metadata_documents(&self) -> Result<Vec<Utf8PathBuf>, BridgeError> {
        let root = &self.config.metadata_dir;
        if !root.as_std_path().exists() {
            return Ok(Vec::new());
        }
        let entries =
            fs::read_dir(root.as_std_path()).map_err(|err| BridgeError::Filesystem(err.to_string()))?;
        let mut documents = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| BridgeError::Filesystem(err.to_string()))?;
            let path = Utf8PathBuf::from_path_buf(entry.path())
                .map_err(|path| BridgeError::Filesystem(format!("non UTF-8 path {}", path.display())))?;
            if path.is_file() && path.extension() == Some("json") {
                documents.push(path);
            }
        }
        documents.sort();
        Ok(documents)
    }

    pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), BridgeError> {
        let parent = path
            .parent()
            .ok_or_else(|| BridgeError::Filesystem("invalid destination path".to_string()))?;
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| BridgeError::Filesystem(err.to_string()))?;
        let mut temp = tempfile::Builder::new()
            .prefix(".tsb-write")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| BridgeError::Filesystem(err.to_string()))?;
        io::Write::write_all(&mut temp, content)
            .map_err(|err| BridgeError::Filesystem(err.to_string()))?;
        temp.persist(path.as_std_path())
            .map_err(|err| BridgeError::Filesystem(err.to_string()))?;
        Ok(())
    }
}

pub fn atomic_rename_dir(from: &Path, to: &Path) -> io::Result<()> {
    if to.exists() {
        fs::remove_dir_all(to)?;
    }
    fs::rename(from, to)
}
