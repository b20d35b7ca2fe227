//! Selection state and the policy that turns a validation result into
//! state changes plus notifications.

use serde::Serialize;

use crate::models::file::CandidateFile;
use crate::upload::format::{format_file_size, plural, summarize_names};
use crate::upload::notify::Notification;
use crate::upload::validator::ValidationResult;

/// Files picked so far and the single-slot error shown under the drop zone.
///
/// No duplicate detection: adding a file with an existing name appends a
/// second entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionState {
    pub files: Vec<CandidateFile>,
    pub last_error: Option<String>,
}

impl SelectionState {
    /// Applies a validation result in place and returns the notifications
    /// to dispatch.
    pub fn add_validated(&mut self, result: ValidationResult) -> Vec<Notification> {
        let (next, notifications) = apply_validation(result, std::mem::take(self));
        *self = next;
        notifications
    }

    /// Removes the file at `index`. Out-of-range indices are ignored.
    pub fn remove_at(&mut self, index: usize) -> Option<CandidateFile> {
        (index < self.files.len()).then(|| self.files.remove(index))
    }

    pub fn clear(&mut self) {
        self.files.clear();
        self.last_error = None;
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.byte_size).sum()
    }

    /// Heading for the file list, empty when nothing is selected.
    pub fn file_list_label(&self) -> String {
        if self.files.is_empty() {
            String::new()
        } else {
            format!("Selected Files ({})", self.files.len())
        }
    }
}

/// Oversized rejections own the error slot; unsupported types only fill it
/// when nothing was oversized. The "Files added" notice is only sent for a
/// partial success.
pub fn apply_validation(
    result: ValidationResult,
    mut state: SelectionState,
) -> (SelectionState, Vec<Notification>) {
    let mut notifications = Vec::new();
    let rejected = result.rejected();
    let limit = format_file_size(result.size_limit);

    let oversized = &result.oversized_names;
    if !oversized.is_empty() {
        let names = summarize_names(oversized);
        state.last_error = Some(format!(
            "File{} exceeding {limit} size limit: {names}",
            plural(oversized.len())
        ));
        notifications.push(Notification::error(
            "Files too large",
            format!(
                "{} file{} over the {limit} limit: {names}",
                oversized.len(),
                plural(oversized.len())
            ),
        ));
    }

    let unsupported = &result.unsupported_names;
    if !unsupported.is_empty() {
        let names = summarize_names(unsupported);
        if oversized.is_empty() {
            state.last_error = Some(format!(
                "Unsupported file type{}: {names}",
                plural(unsupported.len())
            ));
        }
        notifications.push(Notification::error(
            "Unsupported file type",
            format!(
                "{} file{} of unsupported type removed: {names}",
                unsupported.len(),
                plural(unsupported.len())
            ),
        ));
    }

    let added = result.supported.len();
    if added > 0 {
        if rejected == 0 {
            state.last_error = None;
        }
        state.files.extend(result.supported);

        if rejected > 0 {
            notifications.push(Notification::info(
                "Files added",
                format!("{added} file{} added successfully", plural(added)),
            ));
        }
    }

    (state, notifications)
}
