use axum::http::{header, HeaderMap};
use http_body_util::LengthLimitError;
use std::error::Error as _;

/// Body length declared by the client, if any.
///
/// Advisory only: clients may omit it or send a different number of bytes.
pub fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Returns true if `err` from `axum::body::to_bytes` means the body outgrew its limit.
pub fn exceeds_limit(err: &axum::Error) -> bool {
    let mut source = err.source();
    while let Some(inner) = source {
        if inner.is::<LengthLimitError>() {
            return true;
        }
        source = inner.source();
    }
    false
}
