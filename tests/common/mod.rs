// Shared harness: a real gateway router over a throwaway document store
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{request::Builder, Request, Response},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use remap_gateway::api::{create_router, AppState};
use remap_gateway::blob::BlobStore;
use remap_gateway::config::GatewayConfig;
use remap_gateway::credentials::{CredentialRecord, CredentialStore};
use remap_gateway::event::EventSink;
use remap_gateway::store::DocumentStore;
use remap_gateway::task::DocumentTaskCatalog;
use tempfile::TempDir;
use tower::ServiceExt;

pub const API_KEY: &str = "test-api-key";
pub const USER: &str = "alice";
pub const SECRET: &str = "correct-horse";

pub struct TestGateway {
    pub dir: TempDir,
    pub store: DocumentStore,
    pub router: Router,
}

impl TestGateway {
    pub async fn new() -> Self {
        Self::with_config(GatewayConfig::default()).await
    }

    pub async fn with_config(config: GatewayConfig) -> Self {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::open(dir.path().join("gateway.db")).unwrap();

        CredentialStore::new(store.clone())
            .unwrap()
            .upsert(CredentialRecord {
                subject_id: USER.to_string(),
                secret: SECRET.to_string(),
            })
            .await
            .unwrap();

        let state = AppState::from_config(store.clone(), API_KEY, &config).unwrap();
        Self {
            dir,
            store,
            router: create_router(state),
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub fn events(&self) -> EventSink {
        EventSink::new(self.store.clone()).unwrap()
    }

    pub fn blobs(&self) -> BlobStore {
        BlobStore::new(self.store.clone()).unwrap()
    }

    pub fn tasks(&self) -> DocumentTaskCatalog {
        DocumentTaskCatalog::new(self.store.clone()).unwrap()
    }
}

pub fn basic(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
}

/// Request builder carrying the shared key and valid credentials.
pub fn authed(method: &str, uri: &str) -> Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-api-key", API_KEY)
        .header("authorization", basic(USER, SECRET))
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
