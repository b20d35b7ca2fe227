/// Files client — the only module that talks to the backend's `/api/v1/file`
/// routes. Uploads stream the body in chunks so the caller sees byte-level
/// progress; read-only calls retry on 429 and 5xx with exponential backoff.
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::{multipart, Body, Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::file::{CandidateFile, FileRecord, FileSource, FileUrl, UploadRecord};
use crate::models::session::Session;
use crate::upload::progress::{ProgressReporter, Uploader};

const FILES_PATH: &str = "/api/v1/file";
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;
const MAX_RETRIES: u32 = 3;

/// Failures talking to the backend. During a batch these are per-file and
/// never abort sibling uploads.
#[derive(Debug, Error)]
pub enum FilesError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to read {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No contents available for {0}")]
    MissingContent(String),

    #[error("Upload cancelled")]
    Cancelled,
}

impl FilesError {
    pub fn status(&self) -> Option<u16> {
        match self {
            FilesError::Api { status, .. } => Some(*status),
            FilesError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BackendError {
    error: String,
}

#[derive(Clone)]
pub struct FilesClient {
    client: Client,
    base_url: String,
}

impl FilesClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FilesError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, FILES_PATH, path)
    }

    /// POST /api/v1/file/{agent_id}
    pub async fn upload_file(
        &self,
        agent_id: Uuid,
        user_id: Uuid,
        file: &CandidateFile,
        progress: ProgressReporter,
    ) -> Result<UploadRecord, FilesError> {
        let data = load_contents(file).await?;
        let length = data.len() as u64;
        let body = Body::wrap_stream(progress_chunks(data, progress));

        let part = multipart::Part::stream_with_length(body, length)
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("user_id", user_id.to_string());

        debug!("Uploading {} ({} bytes)", file.name, length);
        let response = self
            .client
            .post(self.endpoint(&format!("/{agent_id}")))
            .multipart(form)
            .send()
            .await?;

        let record: UploadRecord = check(response).await?.json().await?;
        info!("Uploaded {} as {}", record.filename, record.id);
        Ok(record)
    }

    /// GET /api/v1/file/agent/{agent_id}
    pub async fn list_agent_files(
        &self,
        agent_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<FileRecord>, FilesError> {
        let url = self.endpoint(&format!("/agent/{agent_id}"));
        self.get_json(|| self.client.get(&url).query(&[("user_id", user_id)]))
            .await
    }

    /// GET /api/v1/file/{file_id}/url
    pub async fn get_file_url(&self, file_id: Uuid, user_id: Uuid) -> Result<FileUrl, FilesError> {
        let url = self.endpoint(&format!("/{file_id}/url"));
        self.get_json(|| self.client.get(&url).query(&[("user_id", user_id)]))
            .await
    }

    /// DELETE /api/v1/file/{file_id}
    pub async fn delete_file(&self, file_id: Uuid, user_id: Uuid) -> Result<(), FilesError> {
        let response = self
            .client
            .delete(self.endpoint(&format!("/{file_id}")))
            .query(&[("user_id", user_id)])
            .send()
            .await?;
        check(response).await?;
        info!("Deleted file {file_id}");
        Ok(())
    }

    /// Sends an idempotent request, retrying on 429 and 5xx.
    async fn get_json<T, F>(&self, build: F) -> Result<T, FilesError>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let mut last_error: Option<FilesError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Files API attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match build().send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(FilesError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Files API returned {}: {}", status, body);
                last_error = Some(FilesError::Api {
                    status: status.as_u16(),
                    message: error_message(&body),
                });
                continue;
            }

            return Ok(check(response).await?.json().await?);
        }

        Err(last_error.unwrap_or(FilesError::Api {
            status: 503,
            message: format!("Gave up after {MAX_RETRIES} attempts"),
        }))
    }
}

/// Uploads into one agent's file area on behalf of the signed-in user.
#[derive(Clone)]
pub struct AgentUploader {
    client: FilesClient,
    agent_id: Uuid,
    user_id: Uuid,
}

impl AgentUploader {
    pub fn new(client: FilesClient, agent_id: Uuid, session: &Session) -> Self {
        Self {
            client,
            agent_id,
            user_id: session.user_id,
        }
    }
}

#[async_trait]
impl Uploader for AgentUploader {
    async fn upload_one(
        &self,
        file: &CandidateFile,
        progress: ProgressReporter,
    ) -> Result<UploadRecord, FilesError> {
        self.client
            .upload_file(self.agent_id, self.user_id, file, progress)
            .await
    }
}

async fn load_contents(file: &CandidateFile) -> Result<Bytes, FilesError> {
    match &file.source {
        FileSource::Memory(data) => Ok(data.clone()),
        FileSource::Path(path) => tokio::fs::read(path)
            .await
            .map(Bytes::from)
            .map_err(|source| FilesError::Io {
                name: file.name.clone(),
                source,
            }),
        FileSource::Detached => Err(FilesError::MissingContent(file.name.clone())),
    }
}

/// Splits the payload into chunks and reports the running byte count as
/// each one is handed to the transport.
fn progress_chunks(
    data: Bytes,
    progress: ProgressReporter,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + Sync + 'static {
    let total = data.len() as u64;
    let chunks: Vec<Bytes> = (0..data.len())
        .step_by(UPLOAD_CHUNK_SIZE)
        .map(|start| data.slice(start..(start + UPLOAD_CHUNK_SIZE).min(data.len())))
        .collect();

    let mut sent = 0u64;
    futures::stream::iter(chunks).map(move |chunk| {
        sent += chunk.len() as u64;
        progress.report_bytes(sent, total);
        Ok::<Bytes, std::io::Error>(chunk)
    })
}

async fn check(response: Response) -> Result<Response, FilesError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(FilesError::Api {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// Pulls `error` out of a `{"error": "..."}` body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<BackendError>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| body.to_string())
}
