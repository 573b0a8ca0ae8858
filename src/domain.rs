use std::fmt;
use std::str::FromStr;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateId(String);

impl TemplateId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn from_url(url: &str) -> Result<Self, BridgeError> {
        let parsed = Url::parse(url.trim()).map_err(|_| BridgeError::MissingFilename)?;
        let segment = parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default();
        if segment.is_empty() {
            return Err(BridgeError::MissingFilename);
        }
        segment.parse().map_err(|_| BridgeError::MissingFilename)
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TemplateId {
    type Err = BridgeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        let is_valid = !normalized.is_empty()
            && normalized != "."
            && normalized != ".."
            && !normalized.contains(['/', '\\']);
        if !is_valid {
            return Err(BridgeError::InvalidTemplateId(value.to_string()));
        }
        Ok(Self(normalized.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn id_is_url_basename() {
        let id = TemplateId::from_url(
            "https://cdn.example.com/tpl/ogEAwyl0dBCAWo6ILtIBCfhgORzCIWAPVt3h0E?sig=abc",
        )
        .unwrap();
        assert_eq!(id.as_str(), "ogEAwyl0dBCAWo6ILtIBCfhgORzCIWAPVt3h0E");
    }

    #[test]
    fn trailing_slash_has_no_filename() {
        assert_matches!(
            TemplateId::from_url("https://cdn.example.com/tpl/"),
            Err(BridgeError::MissingFilename)
        );
        assert_matches!(
            TemplateId::from_url("https://cdn.example.com"),
            Err(BridgeError::MissingFilename)
        );
    }

    #[test]
    fn unusable_last_segment_has_no_filename() {
        assert_matches!(
            TemplateId::from_url("foo://host/dir/a\\b"),
            Err(BridgeError::MissingFilename)
        );
    }

    #[test]
    fn rejects_path_like_ids() {
        assert!("../etc".parse::<TemplateId>().is_err());
        assert!("a/b".parse::<TemplateId>().is_err());
        assert!("  ".parse::<TemplateId>().is_err());
    }
}
