#![allow(dead_code)]

use serde::Serialize;

use crate::models::file::CandidateFile;
use crate::upload::policy::UploadPolicy;

/// Which bucket a single file falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Supported,
    UnsupportedType,
    OversizedFile,
}

/// Files split into the three disjoint buckets, each in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub supported: Vec<CandidateFile>,
    pub unsupported_names: Vec<String>,
    pub oversized_names: Vec<String>,
    /// The policy's size ceiling, kept for message text.
    pub size_limit: u64,
}

impl ValidationResult {
    pub fn total(&self) -> usize {
        self.supported.len() + self.unsupported_names.len() + self.oversized_names.len()
    }

    pub fn rejected(&self) -> usize {
        self.unsupported_names.len() + self.oversized_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Size is checked before type: an oversized file is reported as oversized
/// whatever its MIME type.
pub fn classify(file: &CandidateFile, policy: &UploadPolicy) -> Classification {
    if policy.exceeds_limit(file.byte_size) {
        Classification::OversizedFile
    } else if !policy.allows(&file.mime_type) {
        Classification::UnsupportedType
    } else {
        Classification::Supported
    }
}

pub fn validate(files: impl IntoIterator<Item = CandidateFile>, policy: &UploadPolicy) -> ValidationResult {
    let mut result = ValidationResult {
        size_limit: policy.max_bytes,
        ..Default::default()
    };

    for file in files {
        match classify(&file, policy) {
            Classification::Supported => result.supported.push(file),
            Classification::UnsupportedType => result.unsupported_names.push(file.name),
            Classification::OversizedFile => result.oversized_names.push(file.name),
        }
    }

    result
}
