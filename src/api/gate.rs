use super::{error::ApiError, AppState};
use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap, Method},
};
use std::convert::Infallible;
use std::net::SocketAddr;
use tracing::warn;

/// Request facts every route needs before it touches the body.
#[derive(Debug, Clone)]
pub struct Caller {
    pub method: Method,
    pub headers: HeaderMap,
    pub query: Option<String>,
    /// Peer address, or `unknown` when the server was not started with connect info
    pub remote_addr: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let remote_addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        Ok(Self {
            method: parts.method.clone(),
            headers: parts.headers.clone(),
            query: parts.uri.query().map(str::to_string),
            remote_addr,
        })
    }
}

impl AppState {
    /// Admits a caller to a route: method first, then credentials.
    ///
    /// Returns the authenticated subject identifier.
    pub async fn admit(&self, caller: &Caller, expected: Method) -> Result<String, ApiError> {
        if caller.method != expected {
            warn!(
                remote_addr = %caller.remote_addr,
                method = %caller.method,
                "Bad request: wrong method"
            );
            return Err(ApiError::WrongMethod);
        }

        self.authenticator
            .authenticate(&caller.headers, &caller.remote_addr)
            .await
            .map_err(|failure| ApiError::from_auth(failure, &self.authenticator))
    }
}
