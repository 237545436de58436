//! Ownership-based access control.
//!
//! A folder is accessible only to its owner; a file is accessible only to
//! the owner of its containing folder. Lookups always report a missing
//! entity before a foreign one.

use sqlx::SqlitePool;
use tracing::warn;

use super::folder::{Folder, FolderRepository};
use super::metadata::{FileRecord, FileRepository};
use crate::{Result, VaultError};

/// The identity making a request, as supplied by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Requester {
    /// User ID compared against `owner_id` on every guarded entity.
    pub id: i64,
}

impl Requester {
    /// Wrap an already-authenticated user ID.
    pub fn new(id: i64) -> Self {
        Self { id }
    }
}

/// Whether `requester` may act on something owned by `owner_id`.
pub fn can_access(owner_id: i64, requester: Requester) -> bool {
    owner_id == requester.id
}

/// Fail with `Permission` unless `requester` owns the entity.
pub fn authorize(owner_id: i64, requester: Requester, entity: &str) -> Result<()> {
    if can_access(owner_id, requester) {
        return Ok(());
    }
    warn!(
        requester = requester.id,
        owner = owner_id,
        "Access denied to {entity}"
    );
    Err(VaultError::Permission(format!(
        "{entity} belongs to another user"
    )))
}

/// Loads folders and files on behalf of a requester.
pub struct AccessGuard<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AccessGuard<'a> {
    /// Create a new AccessGuard with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Load a folder the requester owns.
    pub async fn folder(&self, folder_id: i64, requester: Requester) -> Result<Folder> {
        let folder = FolderRepository::new(self.pool)
            .get_by_id(folder_id)
            .await?
            .ok_or_else(|| VaultError::NotFound("folder".to_string()))?;

        authorize(folder.owner_id, requester, "folder")?;
        Ok(folder)
    }

    /// Load a file the requester owns through its folder.
    pub async fn file(&self, file_id: i64, requester: Requester) -> Result<FileRecord> {
        let files = FileRepository::new(self.pool);
        let file = files
            .get_by_id(file_id)
            .await?
            .ok_or_else(|| VaultError::NotFound("file".to_string()))?;

        let owner_id = files
            .resolve_owner(file_id)
            .await?
            .ok_or_else(|| VaultError::NotFound("folder".to_string()))?;

        authorize(owner_id, requester, "file")?;
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewUser, UserRepository};
    use crate::file::{NewFile, NewFolder};
    use crate::Database;

    async fn setup() -> (Database, Requester, Requester, Folder, FileRecord) {
        let db = Database::open_in_memory().await.unwrap();
        let users = UserRepository::new(db.pool());
        let alice = users
            .create(&NewUser::new("alice", "alice@example.com", "hash"))
            .await
            .unwrap();
        let bob = users
            .create(&NewUser::new("bob", "bob@example.com", "hash"))
            .await
            .unwrap();
        let folder = FolderRepository::new(db.pool())
            .create(&NewFolder::new("Private", alice.id))
            .await
            .unwrap();
        let file = FileRepository::new(db.pool())
            .create(&NewFile::new(folder.id, "secret.pdf", vec![0; 4]))
            .await
            .unwrap();
        (
            db,
            Requester::new(alice.id),
            Requester::new(bob.id),
            folder,
            file,
        )
    }

    #[test]
    fn test_can_access() {
        assert!(can_access(1, Requester::new(1)));
        assert!(!can_access(1, Requester::new(2)));
    }

    #[tokio::test]
    async fn test_owner_allowed() {
        let (db, alice, _, folder, file) = setup().await;
        let guard = AccessGuard::new(db.pool());

        assert_eq!(guard.folder(folder.id, alice).await.unwrap().id, folder.id);
        assert_eq!(guard.file(file.id, alice).await.unwrap().id, file.id);
    }

    #[tokio::test]
    async fn test_other_user_denied() {
        let (db, _, bob, folder, file) = setup().await;
        let guard = AccessGuard::new(db.pool());

        assert!(matches!(
            guard.folder(folder.id, bob).await,
            Err(VaultError::Permission(_))
        ));
        assert!(matches!(
            guard.file(file.id, bob).await,
            Err(VaultError::Permission(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_is_not_found_for_anyone() {
        let (db, alice, bob, _, _) = setup().await;
        let guard = AccessGuard::new(db.pool());

        for requester in [alice, bob] {
            assert!(matches!(
                guard.folder(9999, requester).await,
                Err(VaultError::NotFound(_))
            ));
            assert!(matches!(
                guard.file(9999, requester).await,
                Err(VaultError::NotFound(_))
            ));
        }
    }
}
