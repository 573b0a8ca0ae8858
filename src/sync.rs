use std::fs;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::domain::TemplateId;
use crate::error::BridgeError;
use crate::fetch::{ArchiveClient, BundleFetcher, FetchOutcome};
use crate::registry::MetadataRegistry;

pub const MISSING_TEMPLATE_URL: &str = "Missing template_url";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MetadataDocument {
    #[serde(default)]
    pub data: MetadataData,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MetadataData {
    #[serde(default)]
    pub templates: Vec<Value>,
}

impl MetadataDocument {
    pub fn from_json(content: &str) -> Result<Self, BridgeError> {
        serde_json::from_str(content).map_err(|err| BridgeError::MetadataParse(err.to_string()))
    }

    pub fn load(path: &Utf8Path) -> Result<Self, BridgeError> {
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|err| BridgeError::MetadataParse(format!("{path}: {err}")))?;
        Self::from_json(&content)
    }

    pub fn templates(&self) -> &[Value] {
        &self.data.templates
    }
}

// Entries stay untyped: a malformed entry is a per-item failure.
fn template_url(entry: &Value) -> Option<&str> {
    entry
        .get("template_url")
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<TemplateId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkSyncReport {
    pub downloaded: Vec<TemplateId>,
    pub skipped: Vec<TemplateId>,
    pub failed: Vec<FailedEntry>,
    pub total: usize,
}

impl BulkSyncReport {
    pub fn record(&mut self, index: usize, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::Downloaded { id } => self.downloaded.push(id),
            FetchOutcome::Skipped { id } => self.skipped.push(id),
            FetchOutcome::Failed { id, reason } => self.failed.push(FailedEntry {
                index: Some(index),
                id: Some(id),
                document: None,
                reason,
            }),
        }
    }

    pub fn merge(&mut self, other: BulkSyncReport) {
        self.downloaded.extend(other.downloaded);
        self.skipped.extend(other.skipped);
        self.failed.extend(other.failed);
        self.total += other.total;
    }
}

pub struct SyncOrchestrator<'a, C: ArchiveClient, R: MetadataRegistry> {
    fetcher: BundleFetcher<'a, C, R>,
}

impl<'a, C: ArchiveClient, R: MetadataRegistry> SyncOrchestrator<'a, C, R> {
    pub fn new(fetcher: BundleFetcher<'a, C, R>) -> Self {
        Self { fetcher }
    }

    pub fn sync(&self, document: &MetadataDocument) -> Result<BulkSyncReport, BridgeError> {
        let templates = document.templates();
        let mut report = BulkSyncReport {
            total: templates.len(),
            ..BulkSyncReport::default()
        };

        for (index, entry) in templates.iter().enumerate() {
            let Some(url) = template_url(entry) else {
                warn!(index, "metadata entry has no template_url");
                report.failed.push(FailedEntry {
                    index: Some(index),
                    id: None,
                    document: None,
                    reason: MISSING_TEMPLATE_URL.to_string(),
                });
                continue;
            };

            let id = match TemplateId::from_url(url) {
                Ok(id) => id,
                Err(err) => {
                    warn!(index, url, "cannot derive template id");
                    report.failed.push(FailedEntry {
                        index: Some(index),
                        id: None,
                        document: None,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            let outcome = self.fetcher.fetch(&id, url)?;
            report.record(index, outcome);
        }

        info!(
            total = report.total,
            downloaded = report.downloaded.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "metadata document synced"
        );
        Ok(report)
    }
}
