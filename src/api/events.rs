use super::body::{declared_length, exceeds_limit};
use super::{error::ApiError, gate::Caller, AppState, SUCCESS};
use crate::event::parse_payload;
use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{header, Method},
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// POST /events - Record one telemetry event for the authenticated subject
pub(super) async fn post_event(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    body: Body,
) -> Result<&'static str, ApiError> {
    let subject = state.admit(&caller, Method::POST).await?;

    let content_type = caller
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if content_type != "application/json" {
        warn!(subject = %subject, content_type = %content_type, "Wrong content type");
        return Err(ApiError::UnsupportedContentType);
    }

    let limit = state.limits.max_event_bytes;
    if let Some(len) = declared_length(&caller.headers).filter(|len| *len > limit) {
        warn!(subject = %subject, remote_addr = %caller.remote_addr, length = len, "Content too large");
        return Err(ApiError::ContentTooLarge);
    }

    let max = usize::try_from(limit).unwrap_or(usize::MAX);
    let bytes = to_bytes(body, max).await.map_err(|e| {
        if exceeds_limit(&e) {
            warn!(subject = %subject, remote_addr = %caller.remote_addr, "Content too large");
            ApiError::ContentTooLarge
        } else {
            error!(subject = %subject, error = %e, "Could not read data");
            ApiError::Internal(format!("Could not read data: {}", e))
        }
    })?;

    let data = parse_payload(&bytes).map_err(|e| {
        warn!(subject = %subject, error = %e, "Could not parse event");
        ApiError::InvalidPayload(e.to_string())
    })?;

    let record = state.events.record(&subject, data).await.map_err(|e| {
        error!(subject = %subject, error = %e, "Could not insert event");
        ApiError::Internal(format!("Could not insert event: {}", e))
    })?;

    info!(subject = %subject, event_id = %record.id, "Recorded event");
    Ok(SUCCESS)
}
