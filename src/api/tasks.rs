use super::{error::ApiError, gate::Caller, AppState};
use crate::task::TaskFilter;
use axum::{extract::State, http::Method, Json};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// GET /tasks - List task descriptors, optionally filtered by `ios` / `android`
pub(super) async fn list_tasks(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<Vec<Value>>, ApiError> {
    state.admit(&caller, Method::GET).await?;

    let filter = TaskFilter::from_query(caller.query.as_deref());
    let tasks = state.tasks.lookup(&filter).await.map_err(|e| {
        warn!(remote_addr = %caller.remote_addr, error = %e, "Task lookup failed");
        ApiError::TasksUnavailable
    })?;

    debug!(count = tasks.len(), filter = ?filter.platforms(), "Serving tasks");
    Ok(Json(tasks))
}
