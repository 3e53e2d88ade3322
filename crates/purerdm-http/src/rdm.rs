//! HTTP-backed RDM API client.

use std::path::Path;
use std::sync::Arc;

use reqwest::Url;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use async_trait::async_trait;

use purerdm_core::error::{ApiError, Error, InvalidInputError};
use purerdm_core::traits::{RdmApi, RecordHit, RecordPage};
use purerdm_core::types::Recid;
use purerdm_core::{Counters, Result};

use crate::map_transport;
use crate::pacing::{Pacer, Pacing};

/// HTTP client for the RDM repository.
///
/// Owns pacing and backpressure: every response is counted into the shared
/// [`Counters`], and any delay mandated by the status (write gap on
/// success, cooldown on 429) has been served before a call returns.
#[derive(Debug, Clone)]
pub struct RdmClient {
    http: reqwest::Client,
    base: Url,
    counters: Arc<Counters>,
    pacer: Pacer,
}

impl RdmClient {
    /// Create a client for the RDM instance at `base_url`.
    pub fn new(base_url: &str, counters: Arc<Counters>, pacing: Pacing) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|e| InvalidInputError::Other {
            message: format!("invalid RDM base URL '{}': {}", base_url, e),
        })?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("purerdm/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(map_transport)?;
        Ok(Self {
            http,
            base,
            counters,
            pacer: Pacer::new(pacing),
        })
    }

    fn records_url(&self) -> String {
        format!("{}api/records", ensure_slash(self.base.as_str()))
    }

    fn record_url(&self, recid: &Recid) -> String {
        format!("{}/{}", self.records_url(), recid)
    }

    fn file_url(&self, recid: &Recid, file_name: &str) -> String {
        format!("{}/files/{}", self.record_url(recid), file_name)
    }

    fn groups_url(&self) -> String {
        format!("{}api/groups", ensure_slash(self.base.as_str()))
    }

    /// Send a request, count the response, serve pacing, map failures.
    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await.map_err(map_transport)?;
        let status = response.status().as_u16();
        self.counters.count_http_response(status);
        self.pacer.after_response(status).await;

        if response.status().is_success() {
            Ok(response)
        } else {
            let body = response.text().await.ok().filter(|b| !b.is_empty());
            Err(Error::Api(ApiError::new(status, body)))
        }
    }
}

fn ensure_slash(base: &str) -> String {
    let mut base = base.to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    base
}

fn parse_record_page(body: &Value) -> Result<RecordPage> {
    let total = body
        .pointer("/hits/total")
        .and_then(Value::as_u64)
        .ok_or_else(|| InvalidInputError::Other {
            message: "query response has no hits.total".to_string(),
        })?;

    let mut hits = Vec::new();
    if let Some(items) = body.pointer("/hits/hits").and_then(Value::as_array) {
        for item in items {
            let metadata = item.get("metadata").cloned().unwrap_or(Value::Null);
            let recid = metadata
                .get("recid")
                .and_then(Value::as_str)
                .ok_or_else(|| InvalidInputError::Other {
                    message: "query hit has no metadata.recid".to_string(),
                })?;
            hits.push(RecordHit {
                recid: Recid::new(recid)?,
                metadata,
            });
        }
    }

    Ok(RecordPage { total, hits })
}

#[async_trait]
impl RdmApi for RdmClient {
    #[instrument(skip(self))]
    async fn query_records(&self, query: &str, page: u32, size: u32) -> Result<RecordPage> {
        debug!(query, page, size, "RDM query");
        let response = self
            .execute(self.http.get(self.records_url()).query(&[
                ("sort", "mostrecent"),
                ("size", &size.to_string()),
                ("page", &page.to_string()),
                ("q", query),
            ]))
            .await?;
        let body: Value = response.json().await.map_err(map_transport)?;
        parse_record_page(&body)
    }

    #[instrument(skip(self))]
    async fn get_record(&self, recid: &Recid) -> Result<Value> {
        let response = self.execute(self.http.get(self.record_url(recid))).await?;
        response.json().await.map_err(map_transport)
    }

    #[instrument(skip(self, record))]
    async fn create_record(&self, record: &Value) -> Result<()> {
        debug!("RDM create record");
        self.execute(self.http.post(self.records_url()).json(record))
            .await?;
        Ok(())
    }

    #[instrument(skip(self, record))]
    async fn replace_record(&self, recid: &Recid, record: &Value) -> Result<()> {
        debug!(recid = %recid, "RDM replace record");
        self.execute(self.http.put(self.record_url(recid)).json(record))
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_record(&self, recid: &Recid) -> Result<()> {
        debug!(recid = %recid, "RDM delete record");
        self.execute(self.http.delete(self.record_url(recid))).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn put_file(&self, recid: &Recid, file_name: &str, staged: &Path) -> Result<()> {
        debug!(recid = %recid, file_name, "RDM put file");
        let bytes = tokio::fs::read(staged)
            .await
            .map_err(|e| purerdm_core::error::StoreError::from(e))?;
        self.execute(
            self.http
                .put(self.file_url(recid, file_name))
                .header(CONTENT_TYPE, "application/octet-stream")
                .body(bytes),
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn ensure_group(&self, external_id: &str, name: Option<&str>) -> Result<()> {
        let body = serde_json::json!({
            "externalId": external_id,
            "name": name.unwrap_or(external_id),
        });
        match self
            .execute(self.http.post(self.groups_url()).json(&body))
            .await
        {
            Ok(_) => Ok(()),
            // The group already exists; creation is idempotent.
            Err(Error::Api(e)) if e.status == 409 => {
                debug!(external_id, "Group already present");
                Ok(())
            }
            Err(e) => {
                warn!(external_id, error = %e, "Group creation failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_query_page() {
        let body = json!({
            "hits": {
                "total": 2,
                "hits": [
                    {"metadata": {"recid": "abcde-11111", "titles": []}},
                    {"metadata": {"recid": "abcde-22222"}},
                ],
            },
        });
        let page = parse_record_page(&body).unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.hits[0].recid.as_str(), "abcde-11111");
        assert_eq!(page.hits[1].recid.as_str(), "abcde-22222");
    }

    #[test]
    fn rejects_page_without_total() {
        assert!(parse_record_page(&json!({"hits": {}})).is_err());
    }
}
