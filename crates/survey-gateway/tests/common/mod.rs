#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use survey_core::storage::MemoryObjectStore;
use survey_core::{ObjectStore, StorageError, VerificationError, VerificationResult, Verifier};
use survey_gateway::{Gateway, GatewayConfig, GatewayState, StorageBackend};

/// What the fake verifier answers
#[derive(Debug, Clone, Copy)]
pub enum Verdict {
    Human,
    Bot,
    Unreachable,
}

/// Verifier that records its calls and answers with a fixed verdict
#[derive(Debug)]
pub struct FakeVerifier {
    verdict: Verdict,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeVerifier {
    pub fn new(verdict: Verdict) -> Arc<Self> {
        Arc::new(Self {
            verdict,
            calls: Mutex::new(Vec::new()),
        })
    }

    /// `(remote_ip, response)` pairs seen so far
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Verifier for FakeVerifier {
    async fn verify(
        &self,
        remote_ip: &str,
        response: &str,
    ) -> Result<VerificationResult, VerificationError> {
        self.calls
            .lock()
            .push((remote_ip.to_string(), response.to_string()));

        match self.verdict {
            Verdict::Human => Ok(VerificationResult {
                success: true,
                score: 0.9,
                ..Default::default()
            }),
            Verdict::Bot => Ok(VerificationResult {
                success: false,
                score: 0.1,
                error_codes: vec!["invalid-input-response".to_string()],
                ..Default::default()
            }),
            Verdict::Unreachable => Err(VerificationError::Transport(
                "connection refused".to_string(),
            )),
        }
    }
}

/// Store whose every write fails
pub struct FailingStore;

#[async_trait]
impl ObjectStore for FailingStore {
    fn bucket(&self) -> &str {
        "broken"
    }

    async fn put(&self, _key: &str, _payload: &[u8]) -> Result<(), StorageError> {
        Err(StorageError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk on fire",
        )))
    }
}

/// Store that never finishes a write in reasonable time
pub struct StallingStore;

#[async_trait]
impl ObjectStore for StallingStore {
    fn bucket(&self) -> &str {
        "stalled"
    }

    async fn put(&self, _key: &str, _payload: &[u8]) -> Result<(), StorageError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }
}

pub fn config() -> GatewayConfig {
    GatewayConfig::new()
        .with_host("127.0.0.1")
        .with_port(0)
        .with_bucket("answers")
        .with_storage_backend(StorageBackend::Memory)
}

pub fn router(
    config: GatewayConfig,
    verifier: Arc<dyn Verifier>,
    store: Arc<dyn ObjectStore>,
) -> Router {
    let state = GatewayState::with_components(config, verifier, store).unwrap();
    Gateway::from_state(state).build_router()
}

/// Router with verification disabled and an in-memory store
pub fn memory_router() -> (Router, Arc<MemoryObjectStore>) {
    let store = Arc::new(MemoryObjectStore::new("answers"));
    let router = router(config(), FakeVerifier::new(Verdict::Human), store.clone());
    (router, store)
}

pub fn post(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

pub async fn send(router: Router, request: Request<Body>) -> TestResponse {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    TestResponse {
        status,
        headers,
        body,
    }
}
