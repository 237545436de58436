//! filevault - Multi-user file vault
//!
//! Nested per-user folders, files with a recycle bin, ownership-scoped
//! access and storage aggregates over SQLite.

pub mod auth;
pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;

pub use auth::{
    hash_password, register, validate_password, verify_password, ApiToken, PasswordError,
    RegistrationRequest,
};
pub use config::Config;
pub use db::{Database, NewUser, User, UserProfile, UserRepository};
pub use error::{Result, VaultError};
pub use file::{
    AccessGuard, AggregationService, ContentEntry, DeleteSummary, Download, FileRecord,
    FileService, FileType, Folder, FolderContents, FolderSize, FolderStats, Requester,
    SerializedFile, SerializedFolder, SharedFile, UploadRequest,
};
