// Integration tests for POST /upload

mod common;

use axum::{body::Body, http::StatusCode};
use common::{authed, body_string, TestGateway, USER};
use remap_gateway::blob::UPLOAD_BLOB_NAME;
use remap_gateway::config::GatewayConfig;

/// Raw bytes are stored under the fixed name with server-assigned metadata.
#[tokio::test]
async fn test_upload_stores_blob() {
    let gw = TestGateway::new().await;
    let payload: Vec<u8> = (0..=255u8).cycle().take(600_000).collect();

    let response = gw
        .send(
            authed("POST", "/upload")
                .header("Content-Type", "application/octet-stream")
                .header("Content-Length", payload.len().to_string())
                .body(Body::from(payload.clone()))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "Success");

    let files = gw.blobs().find(UPLOAD_BLOB_NAME).await.unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "upload");
    assert_eq!(files[0].length, 600_000);
    assert_eq!(files[0].metadata.subject_id, USER);

    let content = gw.blobs().read_content(&files[0].id).await.unwrap();
    assert_eq!(content, payload);
}

/// Declared length one byte over 16,000,000 → 400 and nothing stored.
#[tokio::test]
async fn test_declared_length_over_limit_rejected() {
    let gw = TestGateway::new().await;

    let response = gw
        .send(
            authed("POST", "/upload")
                .header("Content-Length", "16000001")
                .body(Body::from("tiny"))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(response).await, "Content too large");
    assert!(gw.blobs().find(UPLOAD_BLOB_NAME).await.unwrap().is_empty());
}

/// Exactly 16,000,000 bytes is accepted.
#[tokio::test]
async fn test_upload_at_exact_limit_succeeds() {
    let gw = TestGateway::new().await;
    let payload = vec![7u8; 16_000_000];

    let response = gw
        .send(
            authed("POST", "/upload")
                .header("Content-Length", "16000000")
                .body(Body::from(payload))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);

    let files = gw.blobs().find(UPLOAD_BLOB_NAME).await.unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].length, 16_000_000);
    assert_eq!(files[0].metadata.subject_id, USER);
}

/// Streamed bytes are capped even when no length is declared.
#[tokio::test]
async fn test_undeclared_oversized_stream_rejected() {
    let mut config = GatewayConfig::default();
    config.limits.max_upload_bytes = 10;
    config.store.blob_chunk_size_bytes = 4;
    let gw = TestGateway::with_config(config).await;

    let response = gw
        .send(
            authed("POST", "/upload")
                .body(Body::from("0123456789A"))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(response).await, "Content too large");
    assert!(gw.blobs().find(UPLOAD_BLOB_NAME).await.unwrap().is_empty());
}

/// Understated length does not bypass the cap.
#[tokio::test]
async fn test_understated_length_rejected() {
    let mut config = GatewayConfig::default();
    config.limits.max_upload_bytes = 10;
    let gw = TestGateway::with_config(config).await;

    let response = gw
        .send(
            authed("POST", "/upload")
                .header("Content-Length", "5")
                .body(Body::from("0123456789ABCDEF"))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(gw.blobs().find(UPLOAD_BLOB_NAME).await.unwrap().is_empty());
}

/// Empty uploads are valid objects.
#[tokio::test]
async fn test_empty_upload() {
    let gw = TestGateway::new().await;

    let response = gw
        .send(authed("POST", "/upload").body(Body::empty()).unwrap())
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let files = gw.blobs().find(UPLOAD_BLOB_NAME).await.unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].length, 0);
}

/// A failed chunk write → 500 and no visible blob.
#[tokio::test]
async fn test_chunk_write_failure_is_internal_error() {
    let mut config = GatewayConfig::default();
    config.store.blob_chunk_size_bytes = 4;
    let gw = TestGateway::with_config(config).await;
    gw.store
        .blocking(|conn| {
            conn.execute_batch("ALTER TABLE blob_chunks RENAME TO blob_chunks_parked")?;
            Ok(())
        })
        .unwrap();

    let response = gw
        .send(authed("POST", "/upload").body(Body::from("0123456789")).unwrap())
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_string(response).await.starts_with("Could not upload stream:"));
    assert!(gw.blobs().find(UPLOAD_BLOB_NAME).await.unwrap().is_empty());
}

/// A failed file entry write → 500 and the chunks already written are removed.
#[tokio::test]
async fn test_file_entry_failure_leaves_no_chunks() {
    let mut config = GatewayConfig::default();
    config.store.blob_chunk_size_bytes = 4;
    let gw = TestGateway::with_config(config).await;
    gw.store
        .blocking(|conn| {
            conn.execute_batch("ALTER TABLE blob_files RENAME TO blob_files_parked")?;
            Ok(())
        })
        .unwrap();

    let response = gw
        .send(authed("POST", "/upload").body(Body::from("0123456789")).unwrap())
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_string(response).await.starts_with("Could not upload stream:"));

    let (files, chunks): (i64, i64) = gw
        .store
        .blocking(|conn| {
            let files = conn.query_row("SELECT COUNT(*) FROM blob_files_parked", [], |r| r.get(0))?;
            let chunks = conn.query_row("SELECT COUNT(*) FROM blob_chunks", [], |r| r.get(0))?;
            Ok((files, chunks))
        })
        .unwrap();
    assert_eq!((files, chunks), (0, 0));
}
