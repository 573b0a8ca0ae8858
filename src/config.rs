use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

pub const DEFAULT_CONFIG_FILE: &str = "tsb.json";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;
pub const SUPPORTED_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub download_dir: Option<String>,
    #[serde(default)]
    pub extract_dir: Option<String>,
    #[serde(default)]
    pub converted_dir: Option<String>,
    #[serde(default)]
    pub metadata_dir: Option<String>,
    #[serde(default)]
    pub registry_path: Option<String>,
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub root: Utf8PathBuf,
    pub download_dir: Utf8PathBuf,
    pub extract_dir: Utf8PathBuf,
    pub converted_dir: Utf8PathBuf,
    pub metadata_dir: Utf8PathBuf,
    pub registry_path: Utf8PathBuf,
    pub http_timeout: Duration,
}

impl StorageConfig {
    pub fn with_root(root: Utf8PathBuf) -> Self {
        Self {
            download_dir: root.join("downloads"),
            extract_dir: root.join("assets"),
            converted_dir: root.join("converted"),
            metadata_dir: root.join("raw_json"),
            registry_path: root.join("db").join("templates.db"),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            root,
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(
        path: Option<&str>,
        root_override: Option<&str>,
    ) -> Result<StorageConfig, BridgeError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let config = if path.is_none() && !config_path.exists() {
            Config::default()
        } else {
            let content = fs::read_to_string(&config_path)
                .map_err(|_| BridgeError::ConfigRead(config_path.clone()))?;
            serde_json::from_str(&content)
                .map_err(|err| BridgeError::ConfigParse(err.to_string()))?
        };

        let schema_version = config.schema_version.unwrap_or(SUPPORTED_SCHEMA_VERSION);
        if schema_version != SUPPORTED_SCHEMA_VERSION {
            return Err(BridgeError::ConfigParse(format!(
                "unsupported schema_version {schema_version}"
            )));
        }

        let root = match root_override.or(config.root.as_deref()) {
            Some(root) => Utf8PathBuf::from(root),
            None => default_root()?,
        };

        Ok(Self::resolve_config(config, root))
    }

    pub fn resolve_config(config: Config, root: Utf8PathBuf) -> StorageConfig {
        let defaults = StorageConfig::with_root(root.clone());
        let pick = |value: Option<String>, fallback: Utf8PathBuf| match value {
            Some(value) => relative_to(&root, &value),
            None => fallback,
        };

        StorageConfig {
            download_dir: pick(config.download_dir, defaults.download_dir),
            extract_dir: pick(config.extract_dir, defaults.extract_dir),
            converted_dir: pick(config.converted_dir, defaults.converted_dir),
            metadata_dir: pick(config.metadata_dir, defaults.metadata_dir),
            registry_path: pick(config.registry_path, defaults.registry_path),
            http_timeout: config
                .http_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
            root: defaults.root,
        }
    }
}

fn relative_to(root: &Utf8Path, value: &str) -> Utf8PathBuf {
    let path = Utf8PathBuf::from(value);
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}

fn default_root() -> Result<Utf8PathBuf, BridgeError> {
    BaseDirs::new()
        .and_then(|dirs| {
            Utf8PathBuf::from_path_buf(dirs.data_local_dir().join("template-scene-bridge")).ok()
        })
        .ok_or_else(|| BridgeError::Filesystem("unable to resolve data directory".to_string()))
}
