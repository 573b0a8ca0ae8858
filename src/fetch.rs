use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::TemplateId;
use crate::error::BridgeError;
use crate::fs_util::extract_zip_atomic;
use crate::registry::MetadataRegistry;
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct ArchiveResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

pub trait ArchiveClient: Send + Sync {
    fn get(&self, url: &str) -> Result<ArchiveResponse, BridgeError>;
}

#[derive(Clone)]
pub struct HttpArchiveClient {
    client: Client,
}

impl HttpArchiveClient {
    pub fn new(timeout: Duration) -> Result<Self, BridgeError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("tsb/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| BridgeError::Http(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| BridgeError::Http(err.to_string()))?;
        Ok(Self { client })
    }
}

impl ArchiveClient for HttpArchiveClient {
    fn get(&self, url: &str) -> Result<ArchiveResponse, BridgeError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| BridgeError::Http(err.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|err| BridgeError::Http(err.to_string()))?;
        Ok(ArchiveResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum FetchOutcome {
    Downloaded { id: TemplateId },
    Skipped { id: TemplateId },
    Failed { id: TemplateId, reason: String },
}

pub struct BundleFetcher<'a, C: ArchiveClient, R: MetadataRegistry> {
    store: &'a Store,
    client: &'a C,
    registry: &'a R,
}

impl<'a, C: ArchiveClient, R: MetadataRegistry> BundleFetcher<'a, C, R> {
    pub fn new(store: &'a Store, client: &'a C, registry: &'a R) -> Self {
        Self {
            store,
            client,
            registry,
        }
    }

    pub fn fetch(&self, id: &TemplateId, archive_url: &str) -> Result<FetchOutcome, BridgeError> {
        if self.registry.exists(id)? {
            info!(template = %id, "already registered, skipping");
            return Ok(FetchOutcome::Skipped { id: id.clone() });
        }

        if let Err(err) = self.materialize(id, archive_url) {
            warn!(template = %id, error = %err, "template fetch failed");
            return Ok(FetchOutcome::Failed {
                id: id.clone(),
                reason: failure_reason(&err),
            });
        }

        self.registry.register(id)?;
        info!(template = %id, "downloaded and extracted");
        Ok(FetchOutcome::Downloaded { id: id.clone() })
    }

    fn materialize(&self, id: &TemplateId, archive_url: &str) -> Result<(), BridgeError> {
        let start = std::time::Instant::now();
        let response = self.client.get(archive_url)?;
        if !(200..300).contains(&response.status) {
            return Err(BridgeError::HttpStatus {
                status: response.status,
            });
        }
        tracing::debug!(
            template = %id,
            bytes = response.body.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "archive received"
        );

        let archive_path = self.store.archive_path(id);
        Store::write_bytes_atomic(&archive_path, &response.body)?;
        extract_zip_atomic(
            archive_path.as_std_path(),
            self.store.extract_dir(id).as_std_path(),
        )
    }
}

fn failure_reason(err: &BridgeError) -> String {
    match err {
        BridgeError::Http(message)
        | BridgeError::Filesystem(message)
        | BridgeError::Archive(message) => message.clone(),
        other => other.to_string(),
    }
}
