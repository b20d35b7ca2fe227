#![allow(dead_code)]

//! Sequential batch upload with a single overall percentage.
//!
//! Each file in a batch of N carries weight 1/N. While file `i` is in flight
//! at fraction `p`, overall = round(100·i/N + p·100/N). Files that finish,
//! successfully or not, keep their full weight, so the overall value never
//! goes down.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::files_client::FilesError;
use crate::models::file::{CandidateFile, UploadRecord};

/// One native progress event: file `file_index` is `fraction` done.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressTick {
    pub file_index: usize,
    pub fraction: f64,
}

/// Handed to an [`Uploader`] for a single file. Cheap to clone and safe to
/// move into a request body stream.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    file_index: usize,
    tx: mpsc::UnboundedSender<ProgressTick>,
}

impl ProgressReporter {
    pub fn new(file_index: usize, tx: mpsc::UnboundedSender<ProgressTick>) -> Self {
        Self { file_index, tx }
    }

    pub fn report(&self, fraction: f64) {
        if !fraction.is_finite() {
            return;
        }
        // Receiver is gone once the batch moved on; late ticks are dropped.
        let _ = self.tx.send(ProgressTick {
            file_index: self.file_index,
            fraction: fraction.clamp(0.0, 1.0),
        });
    }

    pub fn report_bytes(&self, sent: u64, total: u64) {
        if total > 0 {
            self.report(sent as f64 / total as f64);
        }
    }
}

/// Uploads one file. Implemented by the HTTP client and by test doubles.
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload_one(
        &self,
        file: &CandidateFile,
        progress: ProgressReporter,
    ) -> Result<UploadRecord, FilesError>;
}

/// Per-file completion for the batch in flight.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UploadProgressState {
    file_count: usize,
    per_file: BTreeMap<usize, f64>,
}

impl UploadProgressState {
    pub fn new(file_count: usize) -> Self {
        Self {
            file_count,
            per_file: BTreeMap::new(),
        }
    }

    pub fn file_count(&self) -> usize {
        self.file_count
    }

    /// Records a tick and returns the recomputed overall percentage.
    /// A file's fraction never moves backwards.
    pub fn record(&mut self, tick: ProgressTick) -> u8 {
        if tick.file_index < self.file_count {
            let entry = self.per_file.entry(tick.file_index).or_insert(0.0);
            *entry = entry.max(tick.fraction.clamp(0.0, 1.0));
        }
        self.overall_percentage()
    }

    /// Marks a file as done; it contributes its full weight from now on.
    pub fn finish(&mut self, file_index: usize) -> u8 {
        self.record(ProgressTick {
            file_index,
            fraction: 1.0,
        })
    }

    pub fn file_percentage(&self, file_index: usize) -> u8 {
        let fraction = self.per_file.get(&file_index).copied().unwrap_or(0.0);
        (fraction * 100.0).round() as u8
    }

    pub fn overall_percentage(&self) -> u8 {
        if self.file_count == 0 {
            return 0;
        }
        let done: f64 = self.per_file.values().sum();
        (done * 100.0 / self.file_count as f64).round().min(100.0) as u8
    }
}

/// Uploads `files` one after another and returns the records of those that
/// succeeded, in input order.
///
/// `on_progress` receives the overall percentage on every tick. A failed
/// or cancelled file is logged and skipped; the batch never fails as a whole.
pub async fn upload_batch<U, F>(
    files: &[CandidateFile],
    uploader: &U,
    cancel: &CancellationToken,
    mut on_progress: F,
) -> Vec<UploadRecord>
where
    U: Uploader + ?Sized,
    F: FnMut(u8),
{
    let mut state = UploadProgressState::new(files.len());
    let mut records = Vec::with_capacity(files.len());

    for (index, file) in files.iter().enumerate() {
        if cancel.is_cancelled() {
            warn!("Batch cancelled, skipping {}", file.name);
            state.finish(index);
            continue;
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        let upload = uploader.upload_one(file, ProgressReporter::new(index, tx));
        tokio::pin!(upload);

        let outcome = loop {
            tokio::select! {
                biased;
                Some(tick) = rx.recv() => on_progress(state.record(tick)),
                result = &mut upload => break result,
                _ = cancel.cancelled() => break Err(FilesError::Cancelled),
            }
        };
        while let Ok(tick) = rx.try_recv() {
            on_progress(state.record(tick));
        }
        state.finish(index);

        match outcome {
            Ok(record) => {
                info!("[{}/{}] uploaded {}", index + 1, files.len(), file.name);
                records.push(record);
            }
            Err(e) => warn!(
                "[{}/{}] upload of {} failed, continuing: {e}",
                index + 1,
                files.len(),
                file.name
            ),
        }
    }

    records
}
