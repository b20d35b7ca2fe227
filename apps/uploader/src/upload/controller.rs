//! Single owner of the upload helper's state.
//!
//! All mutation goes through `UploadController`; renderers only ever see
//! cloned [`UploadSnapshot`]s published on a watch channel.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::models::file::{CandidateFile, UploadRecord};
use crate::upload::drop_zone::{DragEvent, DropZone, DropZoneState, ElementId};
use crate::upload::format::plural;
use crate::upload::notify::{Notification, NotificationSink};
use crate::upload::policy::UploadPolicy;
use crate::upload::progress::{upload_batch, Uploader};
use crate::upload::selection::SelectionState;
use crate::upload::validator::validate;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UploadSnapshot {
    pub selection: SelectionState,
    pub file_list_label: String,
    pub drop_zone: DropZoneState,
    pub uploading: bool,
    pub overall_percentage: u8,
}

pub struct UploadController {
    policy: UploadPolicy,
    selection: SelectionState,
    drop_zone: DropZone,
    sink: Arc<dyn NotificationSink>,
    snapshot_tx: watch::Sender<UploadSnapshot>,
}

impl UploadController {
    pub fn new(policy: UploadPolicy, root: ElementId, sink: Arc<dyn NotificationSink>) -> Self {
        let (snapshot_tx, _) = watch::channel(UploadSnapshot::default());
        Self {
            policy,
            selection: SelectionState::default(),
            drop_zone: DropZone::new(root),
            sink,
            snapshot_tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn snapshot(&self) -> UploadSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Files chosen through the picker. An empty pick changes nothing.
    pub fn select_files(&mut self, files: Vec<CandidateFile>) {
        if files.is_empty() {
            return;
        }
        let result = validate(files, &self.policy);
        let notifications = self.selection.add_validated(result);
        self.sink.notify_all(&notifications);
        self.publish();
    }

    pub fn handle_drag(&mut self, event: DragEvent) -> DropZoneState {
        let before = self.drop_zone.state();
        let after = self.drop_zone.handle(event);
        if before != after {
            self.publish();
        }
        after
    }

    pub fn drop_files(&mut self, target: ElementId, files: Vec<CandidateFile>) {
        match self.drop_zone.drop_files(target, files) {
            Some(files) => self.select_files(files),
            None => self.publish(),
        }
    }

    pub fn remove_at(&mut self, index: usize) -> Option<CandidateFile> {
        let removed = self.selection.remove_at(index);
        if removed.is_some() {
            self.publish();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.selection.clear();
        self.drop_zone.clear();
        self.publish();
    }

    /// Uploads the current selection one file at a time. The selection is
    /// cleared only when every file made it; otherwise it is kept so the
    /// user can retry.
    pub async fn upload_selected<U>(
        &mut self,
        uploader: &U,
        cancel: &CancellationToken,
    ) -> Vec<UploadRecord>
    where
        U: Uploader + ?Sized,
    {
        let files = self.selection.files.clone();
        if files.is_empty() {
            return Vec::new();
        }

        self.snapshot_tx.send_modify(|s| {
            s.uploading = true;
            s.overall_percentage = 0;
        });

        let tx = &self.snapshot_tx;
        let records = upload_batch(&files, uploader, cancel, |percentage| {
            tx.send_modify(|s| s.overall_percentage = percentage);
        })
        .await;

        let total = files.len();
        let uploaded = records.len();
        info!("Batch finished: {uploaded}/{total} uploaded");
        if uploaded == total {
            self.sink.notify(&Notification::info(
                "Upload complete",
                format!("{uploaded} file{} uploaded", plural(uploaded)),
            ));
            self.selection.clear();
        } else {
            self.sink.notify(&Notification::error(
                "Some uploads failed",
                format!("Uploaded {uploaded} of {total} file{}", plural(total)),
            ));
        }

        self.snapshot_tx.send_modify(|s| s.uploading = false);
        self.publish();
        records
    }

    fn publish(&self) {
        let selection = self.selection.clone();
        let drop_zone = self.drop_zone.state();
        self.snapshot_tx.send_modify(|s| {
            s.file_list_label = selection.file_list_label();
            s.selection = selection;
            s.drop_zone = drop_zone;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files_client::FilesError;
    use crate::upload::notify::{CollectingSink, Severity};
    use crate::upload::progress::ProgressReporter;
    use async_trait::async_trait;
    use chrono::Utc;
    use uuid::Uuid;

    const ROOT: ElementId = ElementId(10);
    const CHILD: ElementId = ElementId(11);

    struct RejectNamed(&'static str);

    #[async_trait]
    impl Uploader for RejectNamed {
        async fn upload_one(
            &self,
            file: &CandidateFile,
            progress: ProgressReporter,
        ) -> Result<UploadRecord, FilesError> {
            progress.report(1.0);
            if file.name == self.0 {
                return Err(FilesError::Api {
                    status: 502,
                    message: "bad gateway".into(),
                });
            }
            Ok(UploadRecord {
                id: Uuid::new_v4(),
                filename: file.name.clone(),
                file_size: file.byte_size,
                mime_type: file.mime_type.clone(),
                uploaded_at: Utc::now(),
            })
        }
    }

    fn controller() -> (UploadController, Arc<CollectingSink>) {
        let sink = Arc::new(CollectingSink::default());
        let ctl = UploadController::new(UploadPolicy::resume_documents(), ROOT, sink.clone());
        (ctl, sink)
    }

    fn pdf(name: &str) -> CandidateFile {
        CandidateFile::new(name, 1_000, "application/pdf")
    }

    #[test]
    fn test_select_publishes_snapshot_and_notifications() {
        let (mut ctl, sink) = controller();
        let rx = ctl.subscribe();

        ctl.select_files(vec![
            pdf("resume.pdf"),
            CandidateFile::new("photo.png", 1_000, "image/png"),
        ]);

        let snap = rx.borrow().clone();
        assert_eq!(snap.selection.files.len(), 1);
        assert_eq!(snap.file_list_label, "Selected Files (1)");
        assert_eq!(snap.selection.last_error.as_deref(), Some("Unsupported file type: photo.png"));

        let notes = sink.take();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].severity, Severity::Error);
        assert_eq!(notes[1].title, "Files added");
    }

    #[test]
    fn test_empty_selection_is_ignored() {
        let (mut ctl, sink) = controller();
        ctl.select_files(vec![]);
        assert!(ctl.selection().is_empty());
        assert!(sink.take().is_empty());
    }

    #[test]
    fn test_drag_then_drop_feeds_validator() {
        let (mut ctl, _) = controller();
        ctl.handle_drag(DragEvent::Enter { target: ROOT });
        ctl.handle_drag(DragEvent::Leave { target: CHILD });
        assert_eq!(ctl.snapshot().drop_zone, DropZoneState::DraggingOver);

        ctl.drop_files(CHILD, vec![pdf("a.pdf"), CandidateFile::new("big.pdf", 6 * 1024 * 1024, "application/pdf")]);
        let snap = ctl.snapshot();
        assert_eq!(snap.drop_zone, DropZoneState::Idle);
        assert_eq!(snap.selection.files, vec![pdf("a.pdf")]);
        assert_eq!(
            snap.selection.last_error.as_deref(),
            Some("File exceeding 5.0 MB size limit: big.pdf")
        );
    }

    #[test]
    fn test_remove_and_clear() {
        let (mut ctl, _) = controller();
        ctl.select_files(vec![pdf("a.pdf"), pdf("b.pdf")]);
        assert_eq!(ctl.remove_at(0).map(|f| f.name), Some("a.pdf".into()));
        assert_eq!(ctl.snapshot().file_list_label, "Selected Files (1)");
        ctl.clear();
        assert_eq!(ctl.snapshot().file_list_label, "");
    }

    #[tokio::test]
    async fn test_upload_selected_keeps_selection_on_partial_failure() {
        let (mut ctl, sink) = controller();
        ctl.select_files(vec![pdf("a.pdf"), pdf("b.pdf")]);

        let records = ctl
            .upload_selected(&RejectNamed("b.pdf"), &CancellationToken::new())
            .await;

        assert_eq!(records.len(), 1);
        assert_eq!(ctl.selection().len(), 2);
        let snap = ctl.snapshot();
        assert!(!snap.uploading);
        assert_eq!(snap.overall_percentage, 100);
        let notes = sink.take();
        assert_eq!(notes.last().map(|n| n.title.as_str()), Some("Some uploads failed"));
    }

    #[tokio::test]
    async fn test_upload_selected_clears_on_success() {
        let (mut ctl, sink) = controller();
        ctl.select_files(vec![pdf("a.pdf")]);

        let records = ctl
            .upload_selected(&RejectNamed("none"), &CancellationToken::new())
            .await;

        assert_eq!(records.len(), 1);
        assert!(ctl.selection().is_empty());
        assert_eq!(sink.take()[0].description, "1 file uploaded");
    }
}
