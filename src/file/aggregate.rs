//! Owner-scoped storage aggregates.
//!
//! Everything here is read-only and ignores files in the recycle bin.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::config::StorageConfig;
use crate::db::Database;
use crate::{Result, VaultError};

use super::access::{AccessGuard, Requester};
use super::file_type::FileType;
use super::metadata::{FileRecord, FileRepository};

/// Default number of files in the recent-files view.
pub const DEFAULT_RECENT_LIMIT: i64 = 5;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Total size of a folder's direct files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FolderSize {
    /// Sum of the live files' content lengths.
    pub bytes: i64,
    /// `bytes / 1024²`.
    pub megabytes: f64,
    /// `megabytes / 1024`.
    pub gigabytes: f64,
}

impl FolderSize {
    /// Derive the MB and GB figures from a byte total.
    pub fn from_bytes(bytes: i64) -> Self {
        let megabytes = bytes as f64 / BYTES_PER_MB;
        Self {
            bytes,
            megabytes,
            gigabytes: megabytes / 1024.0,
        }
    }
}

/// File count and size for one folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct FolderStats {
    pub folder_id: i64,
    pub name: String,
    /// Live files directly in the folder.
    pub file_count: i64,
    /// Total size of those files; 0 for an empty folder.
    pub bytes: i64,
}

/// Derived views over a user's files.
pub struct AggregationService<'a> {
    db: &'a Database,
    recent_limit: i64,
}

impl<'a> AggregationService<'a> {
    /// Create an AggregationService with the default recent-files limit.
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }

    /// Create an AggregationService using the storage configuration.
    pub fn with_config(db: &'a Database, config: &StorageConfig) -> Self {
        Self {
            db,
            recent_limit: config.recent_files_limit,
        }
    }

    /// The requester's newest live files. `None` uses the configured limit.
    pub async fn recent_files(&self, requester: Requester, limit: Option<i64>) -> Result<Vec<FileRecord>> {
        let limit = limit.unwrap_or(self.recent_limit);
        if limit < 0 {
            return Err(VaultError::Validation(
                "limit must not be negative".to_string(),
            ));
        }

        FileRepository::new(self.db.pool())
            .list_recent(requester.id, limit)
            .await
    }

    /// Bytes per file type. Types without files are absent.
    pub async fn file_type_totals(&self, requester: Requester) -> Result<BTreeMap<FileType, i64>> {
        let totals = FileRepository::new(self.db.pool())
            .type_totals(requester.id)
            .await?;

        debug!(owner_id = requester.id, types = totals.len(), "Computed type totals");
        Ok(totals.into_iter().map(|t| (t.file_type, t.bytes)).collect())
    }

    /// Number of live files directly inside a folder.
    pub async fn folder_file_count(&self, folder_id: i64, requester: Requester) -> Result<i64> {
        AccessGuard::new(self.db.pool())
            .folder(folder_id, requester)
            .await?;

        FileRepository::new(self.db.pool())
            .count_by_folder(folder_id)
            .await
    }

    /// Size of the live files directly inside a folder.
    pub async fn folder_total_size(&self, folder_id: i64, requester: Requester) -> Result<FolderSize> {
        AccessGuard::new(self.db.pool())
            .folder(folder_id, requester)
            .await?;

        let bytes = FileRepository::new(self.db.pool())
            .total_size_by_folder(folder_id)
            .await?;
        Ok(FolderSize::from_bytes(bytes))
    }

    /// Count and size of direct live files for every folder the requester
    /// owns, oldest folder first.
    pub async fn folder_sizes(&self, requester: Requester) -> Result<Vec<FolderStats>> {
        let stats = sqlx::query_as::<_, FolderStats>(
            "SELECT d.id AS folder_id, d.name AS name,
                    COUNT(f.id) AS file_count,
                    COALESCE(SUM(f.size), 0) AS bytes
             FROM folders d
             LEFT JOIN files f ON f.folder_id = d.id AND f.deleted = 0
             WHERE d.owner_id = ?
             GROUP BY d.id, d.name
             ORDER BY d.created_at ASC, d.id ASC",
        )
        .bind(requester.id)
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| VaultError::Database(e.to_string()))?;

        Ok(stats)
    }
}
