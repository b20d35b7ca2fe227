#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A file offered for upload by the picker or a drop event.
///
/// Lives only for the duration of one selection batch. The bytes are
/// loaded lazily by the transport, so a candidate stays cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFile {
    pub name: String,
    pub byte_size: u64,
    pub mime_type: String,
    #[serde(skip)]
    pub source: FileSource,
}

/// Where the transport reads a candidate's contents from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FileSource {
    /// No backing data (tests and dry runs).
    #[default]
    Detached,
    Path(std::path::PathBuf),
    Memory(bytes::Bytes),
}

impl CandidateFile {
    pub fn new(name: impl Into<String>, byte_size: u64, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            byte_size,
            mime_type: mime_type.into(),
            source: FileSource::Detached,
        }
    }

    /// Builds a candidate from a file on disk, guessing the MIME type from
    /// the extension the way a browser file picker does.
    pub async fn from_path(path: &std::path::Path) -> std::io::Result<Self> {
        let metadata = tokio::fs::metadata(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();

        Ok(Self {
            name,
            byte_size: metadata.len(),
            mime_type,
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    pub fn with_bytes(name: impl Into<String>, mime_type: impl Into<String>, data: bytes::Bytes) -> Self {
        Self {
            name: name.into(),
            byte_size: data.len() as u64,
            mime_type: mime_type.into(),
            source: FileSource::Memory(data),
        }
    }
}

/// Record returned by `POST /api/v1/file/{agent_id}` on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub id: Uuid,
    pub filename: String,
    pub file_size: u64,
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Full file row as listed by `GET /api/v1/file/agent/{agent_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub file_path: String,
    pub file_size: u64,
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileUrl {
    #[serde(rename = "signedUrl")]
    pub signed_url: String,
    pub filename: String,
}
