//! Credential records for basic-auth subjects.
//!
//! Records are administered out-of-band; the gateway only ever reads them.
//!
//! # Usage
//!
//! ```no_run
//! use remap_gateway::credentials::{CredentialRecord, CredentialStore};
//! use remap_gateway::store::DocumentStore;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let store = DocumentStore::open("gateway.db")?;
//! let credentials = CredentialStore::new(store)?;
//!
//! credentials.upsert(CredentialRecord {
//!     subject_id: "participant-17".to_string(),
//!     secret: "hunter2".to_string(),
//! }).await?;
//!
//! if let Some(secret) = credentials.find_secret("participant-17").await? {
//!     println!("stored secret has {} chars", secret.len());
//! }
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};

mod storage;

pub use storage::CredentialStore;

/// A subject and the secret it authenticates with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Unique subject identifier (the basic-auth username)
    #[serde(rename = "subjectId")]
    pub subject_id: String,

    /// Stored secret, compared verbatim against the supplied password
    #[serde(rename = "password")]
    pub secret: String,
}
