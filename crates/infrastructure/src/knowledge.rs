use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, instrument};

use responder_core::config::KnowledgeConfig;
use responder_core::traits::{ReferenceDocument, ReferenceSearch};
use responder_core::{ResponderError, ResponderResult};

use crate::http::{build_client, ensure_success, transport_error};

const SERVICE: &str = "reference-search";

/// Similarity search exposed as a PostgREST RPC function taking
/// `query_text` and `match_count`.
pub struct ReferenceSearchClient {
    http: Client,
    endpoint: String,
    api_key: String,
}

impl ReferenceSearchClient {
    pub fn new(config: &KnowledgeConfig) -> ResponderResult<Self> {
        let base = config
            .url
            .as_deref()
            .ok_or_else(|| ResponderError::config_error("knowledge.url is not set"))?;
        Ok(Self {
            http: build_client(Duration::from_secs(config.timeout_seconds))?,
            endpoint: format!("{}/rest/v1/rpc/{}", base.trim_end_matches('/'), config.rpc_function),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl ReferenceSearch for ReferenceSearchClient {
    #[instrument(skip(self, text))]
    async fn similar(&self, text: &str, top_k: usize) -> ResponderResult<Vec<ReferenceDocument>> {
        let response = self
            .http
            .post(&self.endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&json!({ "query_text": text, "match_count": top_k }))
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        let response = ensure_success(SERVICE, response).await?;
        let mut documents: Vec<ReferenceDocument> =
            response.json().await.map_err(|e| transport_error(SERVICE, e))?;

        documents.truncate(top_k);
        debug!(count = documents.len(), "reference documents fetched");
        Ok(documents)
    }
}
