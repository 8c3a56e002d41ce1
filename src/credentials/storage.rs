//! Credential lookups against the `auth` collection.

use super::CredentialRecord;
use crate::store::DocumentStore;
use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension};

/// Read access to subject secrets.
///
/// # Schema
/// ```sql
/// CREATE TABLE auth (
///     subject_id TEXT PRIMARY KEY,
///     password   TEXT NOT NULL
/// );
/// ```
#[derive(Clone)]
pub struct CredentialStore {
    store: DocumentStore,
}

impl CredentialStore {
    /// Wraps the document store, creating the `auth` table if needed.
    pub fn new(store: DocumentStore) -> Result<Self> {
        store.blocking(|conn| {
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS auth (
                    subject_id TEXT PRIMARY KEY,
                    password   TEXT NOT NULL
                );",
            )
            .context("Failed to create auth table")
        })?;
        Ok(Self { store })
    }

    /// Looks up the stored secret for `subject_id`.
    ///
    /// # Returns
    /// * `Ok(Some(secret))` - Subject exists
    /// * `Ok(None)` - No such subject
    /// * `Err` - Store unreachable or query failed
    pub async fn find_secret(&self, subject_id: &str) -> Result<Option<String>> {
        let subject_id = subject_id.to_string();
        self.store
            .run(move |conn| {
                conn.query_row(
                    "SELECT password FROM auth WHERE subject_id = ?1",
                    params![subject_id],
                    |row| row.get::<_, String>(0),
                )
                .optional()
                .context("Failed to query auth collection")
            })
            .await
    }

    /// Inserts or replaces a credential record.
    ///
    /// Administrative helper; request handling never writes credentials.
    pub async fn upsert(&self, record: CredentialRecord) -> Result<()> {
        self.store
            .run(move |conn| {
                conn.execute(
                    "INSERT INTO auth (subject_id, password) VALUES (?1, ?2)
                     ON CONFLICT(subject_id) DO UPDATE SET password = excluded.password",
                    params![record.subject_id, record.secret],
                )
                .context("Failed to store credential record")?;
                Ok(())
            })
            .await
    }
}
