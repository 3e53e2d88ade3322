//! HTTP-backed Pure API client.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, instrument};

use async_trait::async_trait;

use purerdm_core::error::{ApiError, Error, InvalidInputError, StoreError};
use purerdm_core::record::SourceRecord;
use purerdm_core::traits::PureApi;
use purerdm_core::types::RecordUuid;
use purerdm_core::{Counters, Result};

use crate::map_transport;

/// Name of the header carrying the Pure API key.
const API_KEY_HEADER: &str = "api-key";

/// HTTP client for the Pure research-information system.
///
/// Read-only. Downloaded files are staged under a local directory until
/// the submitter has pushed them to RDM.
#[derive(Debug, Clone)]
pub struct PureClient {
    http: reqwest::Client,
    base: Url,
    api_key: Option<String>,
    staging_dir: PathBuf,
    counters: Arc<Counters>,
}

impl PureClient {
    /// Create a client for the Pure instance at `base_url`.
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        staging_dir: impl AsRef<Path>,
        counters: Arc<Counters>,
    ) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|e| InvalidInputError::Other {
            message: format!("invalid Pure base URL '{}': {}", base_url, e),
        })?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("purerdm/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(map_transport)?;
        Ok(Self {
            http,
            base,
            api_key,
            staging_dir: staging_dir.as_ref().to_path_buf(),
            counters,
        })
    }

    /// Directory holding files staged for upload.
    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    fn endpoint(&self, suffix: &str) -> String {
        let base = self.base.as_str().trim_end_matches('/');
        format!("{}/{}", base, suffix)
    }

    fn with_key(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let response = self
            .with_key(self.http.get(url))
            .send()
            .await
            .map_err(map_transport)?;
        let status = response.status().as_u16();
        self.counters.count_http_response(status);

        if response.status().is_success() {
            Ok(response)
        } else {
            let body = response.text().await.ok().filter(|b| !b.is_empty());
            Err(Error::Api(ApiError::new(status, body)))
        }
    }
}

#[async_trait]
impl PureApi for PureClient {
    #[instrument(skip(self))]
    async fn record_by_uuid(&self, uuid: &RecordUuid) -> Result<Option<SourceRecord>> {
        debug!(uuid = %uuid, "Pure get record");
        let url = self.endpoint(&format!("research-outputs/{}", uuid));
        match self.get(&url).await {
            Ok(response) => {
                let value: Value = response.json().await.map_err(map_transport)?;
                Ok(Some(SourceRecord::new(value)?))
            }
            Err(Error::Api(e)) if e.status == 404 => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self))]
    async fn person(&self, person_uuid: &str) -> Result<Value> {
        debug!(person_uuid, "Pure get person");
        let url = self.endpoint(&format!("persons/{}", person_uuid));
        let response = self.get(&url).await?;
        response.json().await.map_err(map_transport)
    }

    #[instrument(skip(self))]
    async fn download_file(&self, url: &str, file_name: &str) -> Result<PathBuf> {
        debug!(url, file_name, "Pure download file");
        let response = self.get(url).await?;
        let bytes = response.bytes().await.map_err(map_transport)?;

        tokio::fs::create_dir_all(&self.staging_dir)
            .await
            .map_err(StoreError::from)?;
        let path = self.staging_dir.join(file_name);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(StoreError::from)?;
        Ok(path)
    }

    #[instrument(skip(self))]
    async fn changed_uuids(&self, date: NaiveDate) -> Result<Vec<RecordUuid>> {
        let url = self.endpoint(&format!("changes/{}", date.format("%Y-%m-%d")));
        let response = self.get(&url).await?;
        let body: Value = response.json().await.map_err(map_transport)?;

        let mut uuids = Vec::new();
        if let Some(items) = body.get("items").and_then(Value::as_array) {
            for item in items {
                if let Some(uuid) = item.get("uuid").and_then(Value::as_str) {
                    // Skip identities of unexpected shape rather than
                    // aborting the whole date.
                    if let Ok(uuid) = RecordUuid::new(uuid) {
                        uuids.push(uuid);
                    }
                }
            }
        }
        Ok(uuids)
    }
}
