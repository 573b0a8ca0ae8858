use std::time::Duration;

use serde::Serialize;

use crate::convert::convert_file;
use crate::domain::TemplateId;
use crate::error::BridgeError;
use crate::fetch::{ArchiveClient, BundleFetcher};
use crate::registry::MetadataRegistry;
use crate::store::Store;
use crate::sync::{BulkSyncReport, FailedEntry, MetadataDocument, SyncOrchestrator};

#[derive(Debug, Clone, Serialize)]
pub struct ListResult {
    pub templates: Vec<TemplateId>,
    pub sync: BulkSyncReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConvertResult {
    pub template_id: TemplateId,
    pub scene_path: String,
    pub download_url: String,
    pub children: usize,
}

#[derive(Debug, Clone, Copy)]
pub enum ProgressSinkKind {
    Sync,
    List,
    Convert,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct App<C: ArchiveClient, R: MetadataRegistry> {
    store: Store,
    client: C,
    registry: R,
}

impl<C: ArchiveClient, R: MetadataRegistry> App<C, R> {
    pub fn new(store: Store, client: C, registry: R) -> Self {
        Self {
            store,
            client,
            registry,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn list_known_template_ids(&self) -> Result<Vec<TemplateId>, BridgeError> {
        self.registry.list()
    }

    pub fn sync_document(
        &self,
        document: &MetadataDocument,
        sink: &dyn ProgressSink,
    ) -> Result<BulkSyncReport, BridgeError> {
        sink.event(ProgressEvent {
            message: format!("phase=Fetch; {} templates", document.templates().len()),
            elapsed: None,
        });
        let start = std::time::Instant::now();
        let fetcher = BundleFetcher::new(&self.store, &self.client, &self.registry);
        let report = SyncOrchestrator::new(fetcher).sync(document)?;
        sink.event(ProgressEvent {
            message: format!(
                "phase=Done; downloaded={} skipped={} failed={}",
                report.downloaded.len(),
                report.skipped.len(),
                report.failed.len()
            ),
            elapsed: Some(start.elapsed()),
        });
        Ok(report)
    }

    pub fn sync_all(&self, sink: &dyn ProgressSink) -> Result<BulkSyncReport, BridgeError> {
        self.store.ensure_layout()?;
        let documents = self.store.list_metadata_documents()?;
        sink.event(ProgressEvent {
            message: format!("phase=Resolve; {} metadata documents", documents.len()),
            elapsed: None,
        });

        let mut report = BulkSyncReport::default();
        for path in documents {
            match MetadataDocument::load(&path) {
                Ok(document) => {
                    sink.event(ProgressEvent {
                        message: format!("phase=Sync; {path}"),
                        elapsed: None,
                    });
                    report.merge(self.sync_document(&document, sink)?);
                }
                Err(err) => {
                    tracing::warn!(document = %path, error = %err, "skipping metadata document");
                    report.failed.push(FailedEntry {
                        index: None,
                        id: None,
                        document: Some(path.to_string()),
                        reason: err.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }

    pub fn list(&self, sink: &dyn ProgressSink) -> Result<ListResult, BridgeError> {
        let sync = self.sync_all(sink)?;
        let templates = self.list_known_template_ids()?;
        Ok(ListResult { templates, sync })
    }

    pub fn convert_template(
        &self,
        id: &TemplateId,
        sink: &dyn ProgressSink,
    ) -> Result<ConvertResult, BridgeError> {
        let input = self.store.template_json_path(id);
        if !input.as_std_path().is_file() {
            return Err(BridgeError::TemplateNotFound(id.to_string()));
        }
        let output = self.store.scene_path(id);

        sink.event(ProgressEvent {
            message: format!("phase=Convert; {input}"),
            elapsed: None,
        });
        let start = std::time::Instant::now();
        let document = convert_file(&input, &output, id.as_str())?;
        sink.event(ProgressEvent {
            message: format!("phase=Done; {output}"),
            elapsed: Some(start.elapsed()),
        });

        Ok(ConvertResult {
            template_id: id.clone(),
            scene_path: output.to_string(),
            download_url: format!("/converted/{id}.scene.json"),
            children: document.children.len(),
        })
    }
}
