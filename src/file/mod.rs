//! File management module for filevault.
//!
//! This module provides:
//! - Per-user folder hierarchies with cascading delete
//! - File storage with type classification and a recycle bin
//! - Ownership-based access control
//! - Storage aggregates (recent files, per-type totals, folder sizes)

mod access;
mod aggregate;
mod file_type;
mod folder;
mod metadata;
mod serialize;
mod service;
mod share;
mod tree;

pub use access::{authorize, can_access, AccessGuard, Requester};
pub use aggregate::{AggregationService, FolderSize, FolderStats, DEFAULT_RECENT_LIMIT};
pub use file_type::FileType;
pub use folder::{DeleteSummary, Folder, FolderRepository, FolderUpdate, NewFolder};
pub use metadata::{FileRecord, FileRepository, NewFile, TypeTotal};
pub use serialize::{ContentEntry, FolderContents, SerializedFile, SerializedFolder};
pub use service::{Download, FileService, UploadRequest};
pub use share::{ShareRepository, SharedFile};
pub use tree::FolderArena;

use crate::{Result, VaultError};

/// Maximum length for folder and file names (in characters).
pub const MAX_NAME_LENGTH: usize = 100;

/// Default maximum upload size (10MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Reduce an uploaded filename to a bare name.
///
/// Keeps only the last path component and drops control characters.
/// Returns an empty string for names like `..` or `dir/`.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim();

    if cleaned == "." || cleaned == ".." {
        return String::new();
    }
    cleaned.to_string()
}

/// Validate a folder or file name, returning it trimmed.
pub fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(VaultError::Validation("name must not be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(VaultError::Validation(format!(
            "name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(VaultError::Validation(
            "name must not contain control characters".to_string(),
        ));
    }

    Ok(trimmed.to_string())
}
