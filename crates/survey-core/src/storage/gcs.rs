//! Google Cloud Storage backend
//!
//! Uses the JSON API simple media upload: the whole payload goes out as the
//! body of one `POST .../upload/storage/v1/b/<bucket>/o?uploadType=media`
//! request, and the object exists once that request returns 2xx.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use url::Url;

use super::ObjectStore;
use crate::StorageError;

/// Public Cloud Storage endpoint
pub const GCS_ENDPOINT: &str = "https://storage.googleapis.com";

/// GCE/Cloud Run metadata server token URL
pub const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Where upload credentials come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// Fixed bearer token
    Static(String),
    /// Ask the metadata server for the default service account token
    MetadataServer,
    /// No Authorization header (emulators)
    Anonymous,
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
}

pub struct GcsObjectStore {
    bucket: String,
    endpoint: String,
    token_source: TokenSource,
    metadata_url: String,
    http_client: reqwest::Client,
}

impl GcsObjectStore {
    /// Store writing to `bucket` with the metadata server's credentials
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            endpoint: GCS_ENDPOINT.to_string(),
            token_source: TokenSource::MetadataServer,
            metadata_url: METADATA_TOKEN_URL.to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Store talking to a storage emulator
    ///
    /// `host` follows the `STORAGE_EMULATOR_HOST` convention: a bare
    /// `host:port` is taken as plain HTTP.
    pub fn emulator(bucket: impl Into<String>, host: &str) -> Self {
        let endpoint = if host.contains("://") {
            host.to_string()
        } else {
            format!("http://{}", host)
        };
        Self::new(bucket)
            .with_endpoint(endpoint)
            .with_token_source(TokenSource::Anonymous)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_token_source(mut self, source: TokenSource) -> Self {
        self.token_source = source;
        self
    }

    pub fn with_metadata_url(mut self, url: impl Into<String>) -> Self {
        self.metadata_url = url.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn token_source(&self) -> &TokenSource {
        &self.token_source
    }

    /// Upload URL for `key`
    pub fn upload_url(&self, key: &str) -> Result<Url, StorageError> {
        let mut url =
            Url::parse(&self.endpoint).map_err(|e| StorageError::Transport(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| StorageError::Transport(format!("bad endpoint: {}", self.endpoint)))?
            .pop_if_empty()
            .extend(["upload", "storage", "v1", "b", self.bucket.as_str(), "o"]);
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", key);
        Ok(url)
    }

    async fn access_token(&self) -> Result<Option<String>, StorageError> {
        match &self.token_source {
            TokenSource::Static(token) => Ok(Some(token.clone())),
            TokenSource::Anonymous => Ok(None),
            TokenSource::MetadataServer => {
                let resp = self
                    .http_client
                    .get(&self.metadata_url)
                    .header("Metadata-Flavor", "Google")
                    .send()
                    .await
                    .map_err(|e| StorageError::Auth(e.to_string()))?;

                if !resp.status().is_success() {
                    return Err(StorageError::Auth(format!(
                        "metadata server returned {}",
                        resp.status()
                    )));
                }

                let token: MetadataToken = resp
                    .json()
                    .await
                    .map_err(|e| StorageError::Auth(e.to_string()))?;
                Ok(Some(token.access_token))
            }
        }
    }
}

impl std::fmt::Debug for GcsObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcsObjectStore")
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ObjectStore for GcsObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(&self, key: &str, payload: &[u8]) -> Result<(), StorageError> {
        let url = self.upload_url(key)?;

        let mut request = self
            .http_client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload.to_vec());
        if let Some(token) = self.access_token().await? {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StorageError::Upload {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
