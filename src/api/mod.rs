// HTTP surface: /events, /upload and /tasks behind one credential gate

mod body;
mod error;
mod events;
mod gate;
mod tasks;
mod upload;

use crate::auth::Authenticator;
use crate::blob::BlobStore;
use crate::config::{GatewayConfig, LimitsConfig, TaskSource};
use crate::credentials::CredentialStore;
use crate::event::EventSink;
use crate::store::DocumentStore;
use crate::task::{DocumentTaskCatalog, FileTaskCatalog, TaskCatalog};
use anyhow::{Context, Result};
use axum::{routing::any, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use body::{declared_length, exceeds_limit};
pub use error::ApiError;
pub use gate::Caller;

/// Body returned by every successful write
pub const SUCCESS: &str = "Success";

/// Everything a request handler needs, built once at startup.
pub struct AppState {
    pub authenticator: Authenticator,
    pub events: EventSink,
    pub blobs: BlobStore,
    pub tasks: Arc<dyn TaskCatalog>,
    pub limits: LimitsConfig,
}

impl AppState {
    /// Wires every component onto one document store.
    pub fn from_config(store: DocumentStore, api_key: &str, config: &GatewayConfig) -> Result<Self> {
        let credentials =
            CredentialStore::new(store.clone()).context("Failed to initialize credential store")?;
        let authenticator = Authenticator::new(api_key, credentials)
            .with_header(config.auth.header.as_str())
            .with_realm(config.auth.realm.as_str());

        let events = EventSink::new(store.clone()).context("Failed to initialize event sink")?;
        let blobs = BlobStore::new(store.clone())
            .context("Failed to initialize blob store")?
            .with_chunk_size(config.store.blob_chunk_size_bytes);

        let tasks: Arc<dyn TaskCatalog> = match config.tasks.source {
            TaskSource::Store => Arc::new(
                DocumentTaskCatalog::new(store).context("Failed to initialize task catalog")?,
            ),
            TaskSource::File => Arc::new(FileTaskCatalog::new(&config.tasks.file)),
        };

        Ok(Self {
            authenticator,
            events,
            blobs,
            tasks,
            limits: config.limits.clone(),
        })
    }
}

/// Create the gateway router.
///
/// Routes accept any method so that a wrong method is answered with the
/// gateway's own 400 rather than the framework's 405.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/events", any(events::post_event))
        .route("/upload", any(upload::upload_blob))
        .route("/tasks", any(tasks::list_tasks))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}
