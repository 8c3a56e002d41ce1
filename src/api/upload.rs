use super::body::declared_length;
use super::{error::ApiError, gate::Caller, AppState, SUCCESS};
use crate::blob::{BlobMetadata, UploadStream, UPLOAD_BLOB_NAME};
use axum::{body::Body, extract::State, http::Method};
use futures::StreamExt;
use std::sync::Arc;
use tracing::{error, info, warn};

/// POST /upload - Stream the raw body into a new blob
///
/// The declared Content-Length is checked up front, and the same ceiling is
/// enforced on the bytes actually received, so an absent or understated
/// length cannot push an oversized object into the store.
pub(super) async fn upload_blob(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    body: Body,
) -> Result<&'static str, ApiError> {
    let subject = state.admit(&caller, Method::POST).await?;

    let limit = state.limits.max_upload_bytes;
    if let Some(len) = declared_length(&caller.headers).filter(|len| *len > limit) {
        warn!(subject = %subject, remote_addr = %caller.remote_addr, length = len, "Content too large");
        return Err(ApiError::ContentTooLarge);
    }

    let mut upload = state
        .blobs
        .open_upload_stream(UPLOAD_BLOB_NAME, BlobMetadata::for_subject(&subject));

    let mut stream = body.into_data_stream();
    while let Some(frame) = stream.next().await {
        let written = match frame {
            Ok(chunk) if upload.length() + chunk.len() as u64 > limit => {
                warn!(subject = %subject, remote_addr = %caller.remote_addr, "Content too large");
                Err(ApiError::ContentTooLarge)
            }
            Ok(chunk) => upload.write(&chunk).await.map_err(|e| {
                error!(subject = %subject, error = %e, "Could not upload stream");
                ApiError::Internal(format!("Could not upload stream: {}", e))
            }),
            Err(e) => {
                error!(subject = %subject, error = %e, "Could not read upload body");
                Err(ApiError::Internal(format!("Could not upload stream: {}", e)))
            }
        };
        if let Err(err) = written {
            discard(upload).await;
            return Err(err);
        }
    }

    let file = upload.finish().await.map_err(|e| {
        error!(subject = %subject, error = %e, "Could not finish upload");
        ApiError::Internal(format!("Could not upload stream: {}", e))
    })?;

    info!(subject = %subject, blob_id = %file.id, length = file.length, "Stored upload");
    Ok(SUCCESS)
}

async fn discard(upload: UploadStream) {
    let id = upload.id().to_string();
    if let Err(e) = upload.abort().await {
        error!(blob_id = %id, error = %e, "Could not discard partial upload");
    }
}
