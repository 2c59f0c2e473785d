use std::path::Path;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::mode::Mode;

/// Number of sources requested for every query.
pub const TOP_K: usize = 3;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Serialize)]
pub struct QueryRequest<'a> {
    pub query: &'a str,
    pub top_k: usize,
    pub mode: Mode,
}

/// Body returned by `POST /query`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub answer: Option<String>,
    pub results: Vec<SourceHit>,
}

/// One retrieved chunk, scored by similarity to the query.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceHit {
    #[serde(default)]
    pub filename: Option<String>,
    pub score: f64,
    #[serde(default)]
    pub content: String,
}

/// Body returned by `GET /`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub service: String,
}

/// The retrieval service the client talks to.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn query(&self, query: &str, mode: Mode) -> Result<QueryResult>;

    async fn ingest(&self, filename: &str, bytes: Vec<u8>) -> Result<()>;

    async fn status(&self) -> Result<ServiceStatus>;

    /// Read a file from disk and send it to `ingest` under its base name.
    async fn ingest_path(&self, path: &Path) -> Result<()> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        self.ingest(&file_name(path), bytes).await
    }
}

/// Base name of a path, as shown in the conversation and sent as the part filename.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn content_type_for(filename: &str) -> &'static str {
    let ext = Path::new(filename)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase());
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        _ => "application/octet-stream",
    }
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn query(&self, query: &str, mode: Mode) -> Result<QueryResult> {
        let url = format!("{}/query", self.base_url);

        let request = QueryRequest {
            query,
            top_k: TOP_K,
            mode,
        };

        debug!(%url, mode = mode.as_str(), "sending query");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Query request failed with status: {}",
                response.status()
            ));
        }

        let result: QueryResult = response.json().await?;
        Ok(result)
    }

    async fn ingest(&self, filename: &str, bytes: Vec<u8>) -> Result<()> {
        let url = format!("{}/ingest", self.base_url);

        debug!(%url, filename, size = bytes.len(), "uploading document");

        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type_for(filename))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Ingest request for {} failed with status: {}",
                filename,
                response.status()
            ));
        }

        Ok(())
    }

    async fn status(&self) -> Result<ServiceStatus> {
        let url = format!("{}/", self.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!("Status request failed: {}", response.status()));
        }

        let status: ServiceStatus = response.json().await?;
        Ok(status)
    }
}
