//! Chunked blob storage for raw uploads.
//!
//! Uploads are split into fixed-size chunks in `blob_chunks` and become visible
//! once their entry in `blob_files` is written by [`UploadStream::finish`].
//! An aborted or failed upload leaves no file entry behind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod bucket;

pub use bucket::{BlobStore, UploadStream};

/// Name given to every object stored through `/upload`
pub const UPLOAD_BLOB_NAME: &str = "upload";

/// Default chunk size (255 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 255 * 1024;

/// Server-assigned metadata attached to each blob.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlobMetadata {
    #[serde(rename = "subjectId")]
    pub subject_id: String,

    #[serde(rename = "createdDate")]
    pub created_at: DateTime<Utc>,
}

impl BlobMetadata {
    /// Metadata for an upload by `subject_id` received now.
    pub fn for_subject(subject_id: &str) -> Self {
        Self {
            subject_id: subject_id.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// A completed blob.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlobFile {
    pub id: String,
    pub name: String,
    pub length: u64,
    pub chunk_size: usize,
    pub upload_date: DateTime<Utc>,
    pub metadata: BlobMetadata,
}
