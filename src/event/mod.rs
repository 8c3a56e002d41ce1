use crate::store::DocumentStore;
use anyhow::{Context, Result};
use bson::{Bson, Document};
use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;


/// EventRecord is one telemetry event as persisted by the gateway.
///
/// Subject and creation time are always assigned server-side; nothing in the
/// client payload can override them. Records are never updated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// UUIDv7 identifier (time-ordered, unique per insert)
    pub id: String,

    /// Authenticated subject that submitted the event
    #[serde(rename = "subjectId")]
    pub subject_id: String,

    /// Server receive time
    #[serde(rename = "createdDate")]
    pub created_at: DateTime<Utc>,

    /// Client payload, stored as relaxed extended JSON
    pub data: Value,
}

/// Payload parse errors
#[derive(Debug, PartialEq)]
pub enum PayloadError {
    /// Body is not valid JSON
    Syntax(String),
    /// Body is valid JSON but not an object
    NotADocument,
    /// An extended JSON wrapper (`$date`, `$oid`, `$numberInt`, ...) is malformed
    ExtendedJson(String),
}

impl std::fmt::Display for PayloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayloadError::Syntax(msg) => write!(f, "{}", msg),
            PayloadError::NotADocument => write!(f, "payload must be a JSON document"),
            PayloadError::ExtendedJson(msg) => write!(f, "invalid extended JSON: {}", msg),
        }
    }
}

impl std::error::Error for PayloadError {}

/// Parses an event body as an extended JSON document.
///
/// The top level must be an object. Type wrappers such as `{"$date": ...}`,
/// `{"$oid": ...}` or `{"$numberLong": ...}` are decoded into their BSON
/// types, so a malformed wrapper is a parse failure.
pub fn parse_payload(body: &[u8]) -> Result<Document, PayloadError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| PayloadError::Syntax(e.to_string()))?;
    if !value.is_object() {
        return Err(PayloadError::NotADocument);
    }

    match Bson::try_from(value) {
        Ok(Bson::Document(doc)) => Ok(doc),
        Ok(_) => Err(PayloadError::NotADocument),
        Err(e) => Err(PayloadError::ExtendedJson(e.to_string())),
    }
}

/// Writes event records into the `events` collection.
///
/// # Schema
/// ```sql
/// CREATE TABLE events (
///     id         TEXT PRIMARY KEY,
///     subject_id TEXT NOT NULL,
///     created_at TEXT NOT NULL,   -- RFC 3339
///     data       TEXT NOT NULL    -- JSON document
/// );
/// ```
#[derive(Clone)]
pub struct EventSink {
    store: DocumentStore,
}

impl EventSink {
    pub fn new(store: DocumentStore) -> Result<Self> {
        store.blocking(|conn| {
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS events (
                    id         TEXT PRIMARY KEY,
                    subject_id TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    data       TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_events_subject ON events(subject_id);",
            )
            .context("Failed to create events table")
        })?;
        Ok(Self { store })
    }

    /// Stamps `data` with the subject and current time and inserts it.
    ///
    /// Identical payloads produce distinct records; there is no deduplication.
    pub async fn record(&self, subject_id: &str, data: Document) -> Result<EventRecord> {
        let record = EventRecord {
            id: Uuid::now_v7().to_string(),
            subject_id: subject_id.to_string(),
            created_at: Utc::now(),
            data: Bson::Document(data).into_relaxed_extjson(),
        };

        let row = record.clone();
        self.store
            .run(move |conn| {
                let data = serde_json::to_string(&row.data).context("Failed to encode event")?;
                conn.execute(
                    "INSERT INTO events (id, subject_id, created_at, data) VALUES (?1, ?2, ?3, ?4)",
                    params![row.id, row.subject_id, row.created_at.to_rfc3339(), data],
                )
                .context("Failed to insert event")?;
                Ok(())
            })
            .await?;

        Ok(record)
    }

    /// Returns every event recorded for `subject_id`, oldest first.
    pub async fn list_by_subject(&self, subject_id: &str) -> Result<Vec<EventRecord>> {
        let subject_id = subject_id.to_string();
        self.store
            .run(move |conn| {
                let mut stmt = conn
                    .prepare(
                        "SELECT id, subject_id, created_at, data FROM events
                         WHERE subject_id = ?1 ORDER BY id ASC",
                    )
                    .context("Failed to prepare events query")?;
                let rows = stmt
                    .query_map(params![subject_id], |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                        ))
                    })
                    .context("Failed to query events")?;

                let mut events = Vec::new();
                for row in rows {
                    let (id, subject_id, created_at, data) =
                        row.context("Failed to read event row")?;
                    let created_at = DateTime::parse_from_rfc3339(&created_at)
                        .with_context(|| format!("Bad created_at on event {}", id))?
                        .with_timezone(&Utc);
                    let data = serde_json::from_str(&data)
                        .with_context(|| format!("Bad data on event {}", id))?;
                    events.push(EventRecord {
                        id,
                        subject_id,
                        created_at,
                        data,
                    });
                }
                Ok(events)
            })
            .await
    }
}
