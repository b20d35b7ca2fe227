use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub const MIB: u64 = 1024 * 1024;

const DOCUMENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

const SPREADSHEET_AND_TEXT_TYPES: &[&str] = &[
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.oasis.opendocument.spreadsheet",
    "text/csv",
    "text/plain",
    "application/json",
];

/// Size ceiling and MIME allow-list that the validator checks files against.
///
/// An allow-list entry ending in `/*` (e.g. `image/*`) matches every subtype.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPolicy {
    pub max_bytes: u64,
    pub allowed_mime_types: BTreeSet<String>,
}

/// Named policies used by the surrounding application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PolicyPreset {
    /// Agent attachments: 50 MiB, documents, spreadsheets and images.
    General,
    /// Profile resume: 5 MiB, PDF/DOC/DOCX only.
    Resume,
}

impl PolicyPreset {
    pub fn policy(self) -> UploadPolicy {
        match self {
            PolicyPreset::General => UploadPolicy::general_attachments(),
            PolicyPreset::Resume => UploadPolicy::resume_documents(),
        }
    }
}

impl UploadPolicy {
    pub fn new<I, S>(max_bytes: u64, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            max_bytes,
            allowed_mime_types: allowed
                .into_iter()
                .map(|s| s.as_ref().trim().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn general_attachments() -> Self {
        Self::new(
            50 * MIB,
            DOCUMENT_TYPES
                .iter()
                .chain(SPREADSHEET_AND_TEXT_TYPES)
                .chain(&["image/*"]),
        )
    }

    pub fn resume_documents() -> Self {
        Self::new(5 * MIB, DOCUMENT_TYPES)
    }

    /// Whether `mime_type` is on the allow-list. Parameters such as
    /// `; charset=utf-8` are ignored and comparison is case-insensitive.
    pub fn allows(&self, mime_type: &str) -> bool {
        let essence = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if essence.is_empty() {
            return false;
        }
        if self.allowed_mime_types.contains(&essence) {
            return true;
        }
        match essence.split_once('/') {
            Some((top, _)) => self.allowed_mime_types.contains(&format!("{top}/*")),
            None => false,
        }
    }

    pub fn exceeds_limit(&self, byte_size: u64) -> bool {
        byte_size > self.max_bytes
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::general_attachments()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_general_allows_documents_and_images() {
        let policy = UploadPolicy::general_attachments();
        assert!(policy.allows("application/pdf"));
        assert!(policy.allows("text/csv"));
        assert!(policy.allows("image/png"));
        assert!(policy.allows("image/webp"));
        assert!(!policy.allows("application/x-msdownload"));
        assert!(!policy.allows("video/mp4"));
    }

    #[test]
    fn test_resume_rejects_images() {
        let policy = UploadPolicy::resume_documents();
        assert_eq!(policy.max_bytes, 5 * MIB);
        assert!(policy.allows("application/msword"));
        assert!(!policy.allows("image/jpeg"));
        assert!(!policy.allows("text/plain"));
    }

    #[test]
    fn test_allows_ignores_case_and_parameters() {
        let policy = UploadPolicy::general_attachments();
        assert!(policy.allows("Text/Plain; charset=UTF-8"));
        assert!(policy.allows("IMAGE/GIF"));
    }

    #[test]
    fn test_allows_rejects_empty_and_malformed() {
        let policy = UploadPolicy::general_attachments();
        assert!(!policy.allows(""));
        assert!(!policy.allows("image"));
    }

    #[test]
    fn test_wildcard_only_when_listed() {
        let policy = UploadPolicy::new(10, ["application/pdf"]);
        assert!(!policy.allows("image/png"));
    }

    #[test]
    fn test_exceeds_limit_is_strict() {
        let policy = UploadPolicy::new(100, ["text/plain"]);
        assert!(!policy.exceeds_limit(100));
        assert!(policy.exceeds_limit(101));
    }

    #[test]
    fn test_preset_maps_to_policy() {
        assert_eq!(PolicyPreset::Resume.policy(), UploadPolicy::resume_documents());
        assert_eq!(PolicyPreset::General.policy(), UploadPolicy::default());
    }
}
