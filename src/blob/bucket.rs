use super::{BlobFile, BlobMetadata, DEFAULT_CHUNK_SIZE};
use crate::store::DocumentStore;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

/// Blob bucket stored alongside the documents.
///
/// # Schema
/// ```sql
/// CREATE TABLE blob_files (
///     id          TEXT PRIMARY KEY,
///     name        TEXT NOT NULL,
///     length      INTEGER NOT NULL,
///     chunk_size  INTEGER NOT NULL,
///     upload_date TEXT NOT NULL,      -- RFC 3339
///     metadata    TEXT NOT NULL       -- JSON
/// );
/// CREATE TABLE blob_chunks (
///     files_id TEXT NOT NULL,
///     n        INTEGER NOT NULL,
///     data     BLOB NOT NULL,
///     PRIMARY KEY (files_id, n)
/// );
/// ```
#[derive(Clone)]
pub struct BlobStore {
    store: DocumentStore,
    chunk_size: usize,
}

impl BlobStore {
    pub fn new(store: DocumentStore) -> Result<Self> {
        store.blocking(|conn| {
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS blob_files (
                    id          TEXT PRIMARY KEY,
                    name        TEXT NOT NULL,
                    length      INTEGER NOT NULL,
                    chunk_size  INTEGER NOT NULL,
                    upload_date TEXT NOT NULL,
                    metadata    TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS blob_chunks (
                    files_id TEXT NOT NULL,
                    n        INTEGER NOT NULL,
                    data     BLOB NOT NULL,
                    PRIMARY KEY (files_id, n)
                );",
            )
            .context("Failed to create blob tables")
        })?;
        Ok(Self {
            store,
            chunk_size: DEFAULT_CHUNK_SIZE,
        })
    }

    /// Overrides the chunk size for new uploads. Zero is treated as one byte.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Starts a new upload. Nothing is visible until [`UploadStream::finish`].
    pub fn open_upload_stream(&self, name: &str, metadata: BlobMetadata) -> UploadStream {
        UploadStream {
            store: self.store.clone(),
            id: Uuid::now_v7().to_string(),
            name: name.to_string(),
            metadata,
            chunk_size: self.chunk_size,
            buffer: Vec::with_capacity(self.chunk_size),
            next_chunk: 0,
            length: 0,
        }
    }

    /// Completed blobs named `name`, oldest first.
    pub async fn find(&self, name: &str) -> Result<Vec<BlobFile>> {
        let name = name.to_string();
        self.store
            .run(move |conn| {
                let mut stmt = conn
                    .prepare(
                        "SELECT id, name, length, chunk_size, upload_date, metadata
                         FROM blob_files WHERE name = ?1 ORDER BY upload_date ASC, id ASC",
                    )
                    .context("Failed to prepare blob query")?;
                let rows = stmt
                    .query_map(params![name], |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, i64>(2)?,
                            row.get::<_, i64>(3)?,
                            row.get::<_, String>(4)?,
                            row.get::<_, String>(5)?,
                        ))
                    })
                    .context("Failed to query blob files")?;

                let mut files = Vec::new();
                for row in rows {
                    let (id, name, length, chunk_size, upload_date, metadata) =
                        row.context("Failed to read blob file row")?;
                    let upload_date = DateTime::parse_from_rfc3339(&upload_date)
                        .with_context(|| format!("Bad upload_date on blob {}", id))?
                        .with_timezone(&Utc);
                    let metadata = serde_json::from_str(&metadata)
                        .with_context(|| format!("Bad metadata on blob {}", id))?;
                    files.push(BlobFile {
                        id,
                        name,
                        length: length as u64,
                        chunk_size: chunk_size as usize,
                        upload_date,
                        metadata,
                    });
                }
                Ok(files)
            })
            .await
    }

    /// Reassembles the content of blob `id` from its chunks.
    pub async fn read_content(&self, id: &str) -> Result<Vec<u8>> {
        let id = id.to_string();
        self.store
            .run(move |conn| {
                let mut stmt = conn
                    .prepare("SELECT data FROM blob_chunks WHERE files_id = ?1 ORDER BY n ASC")
                    .context("Failed to prepare chunk query")?;
                let chunks = stmt
                    .query_map(params![id], |row| row.get::<_, Vec<u8>>(0))
                    .context("Failed to query chunks")?;

                let mut content = Vec::new();
                for chunk in chunks {
                    content.extend_from_slice(&chunk.context("Failed to read chunk")?);
                }
                Ok(content)
            })
            .await
    }
}

/// An in-progress upload.
///
/// Bytes are buffered until a full chunk is available, then written out.
pub struct UploadStream {
    store: DocumentStore,
    id: String,
    name: String,
    metadata: BlobMetadata,
    chunk_size: usize,
    buffer: Vec<u8>,
    next_chunk: i64,
    length: u64,
}

impl UploadStream {
    /// Identifier the blob will have once finished.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Bytes accepted so far.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Appends `data`, flushing every full chunk to the store.
    pub async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(data);
        self.length += data.len() as u64;

        while self.buffer.len() >= self.chunk_size {
            let rest = self.buffer.split_off(self.chunk_size);
            let chunk = std::mem::replace(&mut self.buffer, rest);
            self.flush_chunk(chunk).await?;
        }
        Ok(())
    }

    /// Flushes the tail chunk and writes the file entry.
    ///
    /// On failure every chunk written for this upload is removed again, so a
    /// failed upload leaves nothing behind.
    pub async fn finish(mut self) -> Result<BlobFile> {
        match self.complete().await {
            Ok(file) => Ok(file),
            Err(e) => match self.delete_chunks().await {
                Ok(()) => Err(e),
                Err(cleanup) => Err(e.context(format!("cleanup also failed: {}", cleanup))),
            },
        }
    }

    /// Discards the upload and any chunks already written.
    pub async fn abort(self) -> Result<()> {
        self.delete_chunks().await
    }

    async fn complete(&mut self) -> Result<BlobFile> {
        if !self.buffer.is_empty() {
            let chunk = std::mem::take(&mut self.buffer);
            self.flush_chunk(chunk).await?;
        }

        let file = BlobFile {
            id: self.id.clone(),
            name: self.name.clone(),
            length: self.length,
            chunk_size: self.chunk_size,
            upload_date: Utc::now(),
            metadata: self.metadata.clone(),
        };

        let row = file.clone();
        self.store
            .run(move |conn| {
                let metadata =
                    serde_json::to_string(&row.metadata).context("Failed to encode metadata")?;
                conn.execute(
                    "INSERT INTO blob_files (id, name, length, chunk_size, upload_date, metadata)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        row.id,
                        row.name,
                        row.length as i64,
                        row.chunk_size as i64,
                        row.upload_date.to_rfc3339(),
                        metadata,
                    ],
                )
                .context("Failed to write blob file entry")?;
                Ok(())
            })
            .await?;

        Ok(file)
    }

    async fn delete_chunks(&self) -> Result<()> {
        let id = self.id.clone();
        self.store
            .run(move |conn| {
                conn.execute("DELETE FROM blob_chunks WHERE files_id = ?1", params![id])
                    .context("Failed to delete orphaned chunks")?;
                Ok(())
            })
            .await
    }

    async fn flush_chunk(&mut self, chunk: Vec<u8>) -> Result<()> {
        let id = self.id.clone();
        let n = self.next_chunk;
        self.store
            .run(move |conn| {
                conn.execute(
                    "INSERT INTO blob_chunks (files_id, n, data) VALUES (?1, ?2, ?3)",
                    params![id, n, chunk],
                )
                .map_err(|e| anyhow!("Failed to write chunk {} of blob {}: {}", n, id, e))?;
                Ok(())
            })
            .await?;
        self.next_chunk += 1;
        Ok(())
    }
}
