use crate::credentials::CredentialStore;
use axum::http::{header, HeaderMap};
use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::{error, info, warn};


/// Default header carrying the shared API key
pub const DEFAULT_API_KEY_HEADER: &str = "x-api-key";

/// Default realm advertised in the basic-auth challenge
pub const DEFAULT_REALM: &str = "ReMAP";

/// Why a request failed authentication.
///
/// Clients only ever see the status code; the reason is for the log.
#[derive(Debug, PartialEq, Clone)]
pub enum AuthFailure {
    /// Shared key header missing or different from the configured key
    WrongSharedKey,
    /// No usable basic-auth credentials on the request
    MissingCredentials,
    /// Username not present in the credential store
    UnknownSubject(String),
    /// Password does not match the stored secret
    WrongSecret(String),
    /// Credential store could not be queried
    Lookup(String),
}

impl std::fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthFailure::WrongSharedKey => write!(f, "wrong shared key"),
            AuthFailure::MissingCredentials => write!(f, "missing credentials"),
            AuthFailure::UnknownSubject(_) => write!(f, "unknown subject"),
            AuthFailure::WrongSecret(_) => write!(f, "wrong secret"),
            AuthFailure::Lookup(msg) => write!(f, "credential lookup failed: {}", msg),
        }
    }
}

impl std::error::Error for AuthFailure {}

/// The single credential gate in front of every route.
///
/// Checks run in a fixed order and stop at the first failure:
/// 1. Shared key header equals the configured key (exact, case-sensitive)
/// 2. Basic-auth credentials are present and well formed
/// 3. The username exists in the credential store
/// 4. The stored secret equals the supplied password
///
/// Nothing is cached; every request is verified from scratch.
pub struct Authenticator {
    api_key: String,
    header: String,
    realm: String,
    credentials: CredentialStore,
}

impl Authenticator {
    pub fn new(api_key: impl Into<String>, credentials: CredentialStore) -> Self {
        Self {
            api_key: api_key.into(),
            header: DEFAULT_API_KEY_HEADER.to_string(),
            realm: DEFAULT_REALM.to_string(),
            credentials,
        }
    }

    /// Overrides the shared key header name.
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into().to_ascii_lowercase();
        self
    }

    /// Overrides the basic-auth realm.
    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = realm.into();
        self
    }

    /// Value for the `WWW-Authenticate` challenge header.
    pub fn challenge(&self) -> String {
        format!("Basic realm=\"{}\"", self.realm)
    }

    /// Authenticates a request, returning the subject identifier on success.
    ///
    /// Every outcome is logged together with `remote_addr`.
    pub async fn authenticate(
        &self,
        headers: &HeaderMap,
        remote_addr: &str,
    ) -> Result<String, AuthFailure> {
        let result = self.verify(headers).await;
        match &result {
            Ok(subject) => {
                info!(remote_addr = %remote_addr, subject = %subject, "Authenticated request");
            }
            Err(AuthFailure::Lookup(msg)) => {
                error!(remote_addr = %remote_addr, error = %msg, "Credential lookup failed");
            }
            Err(failure) => {
                let subject = match failure {
                    AuthFailure::UnknownSubject(s) | AuthFailure::WrongSecret(s) => s.as_str(),
                    _ => "",
                };
                warn!(
                    remote_addr = %remote_addr,
                    subject = %subject,
                    reason = %failure,
                    "Rejected request"
                );
            }
        }
        result
    }

    async fn verify(&self, headers: &HeaderMap) -> Result<String, AuthFailure> {
        let presented = headers
            .get(self.header.as_str())
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if presented != self.api_key {
            return Err(AuthFailure::WrongSharedKey);
        }

        let (username, password) =
            extract_basic_credentials(headers).ok_or(AuthFailure::MissingCredentials)?;

        let stored = self
            .credentials
            .find_secret(&username)
            .await
            .map_err(|e| AuthFailure::Lookup(e.to_string()))?
            .ok_or_else(|| AuthFailure::UnknownSubject(username.clone()))?;

        if stored != password {
            return Err(AuthFailure::WrongSecret(username));
        }

        Ok(username)
    }
}

/// Extract basic-auth username and password from the Authorization header
///
/// Expected format: "Authorization: Basic base64(username:password)".
/// The scheme is matched case-insensitively and the decoded value is split on
/// the first colon, so passwords may themselves contain colons.
pub fn extract_basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    parse_basic_credentials(value)
}

fn parse_basic_credentials(header_value: &str) -> Option<(String, String)> {
    const PREFIX: &str = "basic ";
    if header_value.len() < PREFIX.len()
        || !header_value[..PREFIX.len()].eq_ignore_ascii_case(PREFIX)
    {
        return None;
    }

    let decoded = STANDARD.decode(&header_value[PREFIX.len()..]).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;

    Some((username.to_string(), password.to_string()))
}
