use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum BridgeError {
    #[error("invalid template id: {0}")]
    InvalidTemplateId(String),

    #[error("Cannot extract filename")]
    MissingFilename,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("archive request failed: {0}")]
    Http(String),

    #[error("HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("archive error: {0}")]
    Archive(String),

    #[error("registry error: {0}")]
    Registry(String),

    #[error("Failed to load metadata JSON: {0}")]
    MetadataParse(String),

    #[error("template.json not found for template {0}")]
    #[diagnostic(help("run `tsb templates sync` first so the bundle is extracted"))]
    TemplateNotFound(String),

    #[error("conversion failed: {0}")]
    Conversion(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_item_reasons_match_report_wording() {
        assert_eq!(
            BridgeError::HttpStatus { status: 404 }.to_string(),
            "HTTP 404"
        );
        assert_eq!(
            BridgeError::MissingFilename.to_string(),
            "Cannot extract filename"
        );
        assert!(
            BridgeError::MetadataParse("eof".to_string())
                .to_string()
                .starts_with("Failed to load metadata JSON:")
        );
    }
}
