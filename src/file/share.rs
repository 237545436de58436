//! File share grants.

use serde::Serialize;
use sqlx::{QueryBuilder, SqlitePool};

use super::folder::{push_id_list, ID_CHUNK_SIZE};
use crate::{Result, VaultError};

/// A grant of one file to another user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct SharedFile {
    pub id: i64,
    pub file_id: i64,
    /// The user the file is shared with.
    pub user_id: i64,
    pub shared_at: String,
}

/// Repository for share grants.
pub struct ShareRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ShareRepository<'a> {
    /// Create a new ShareRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Grant a file to a user.
    pub async fn create(&self, file_id: i64, user_id: i64) -> Result<SharedFile> {
        let result = sqlx::query("INSERT INTO shared_files (file_id, user_id) VALUES (?, ?)")
            .bind(file_id)
            .bind(user_id)
            .execute(self.pool)
            .await
            .map_err(|e| VaultError::Database(e.to_string()))?;

        let id = result.last_insert_rowid();
        let share = sqlx::query_as::<_, SharedFile>(
            "SELECT id, file_id, user_id, shared_at FROM shared_files WHERE id = ?",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| VaultError::Database(e.to_string()))?;

        Ok(share)
    }

    /// Get the grant of a file to a user, if any.
    pub async fn get(&self, file_id: i64, user_id: i64) -> Result<Option<SharedFile>> {
        let share = sqlx::query_as::<_, SharedFile>(
            "SELECT id, file_id, user_id, shared_at FROM shared_files
             WHERE file_id = ? AND user_id = ?",
        )
        .bind(file_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| VaultError::Database(e.to_string()))?;

        Ok(share)
    }

    /// List grants of a file, oldest first.
    pub async fn list_by_file(&self, file_id: i64) -> Result<Vec<SharedFile>> {
        self.list_by_files(&[file_id]).await
    }

    /// List grants of any of the given files, oldest first.
    pub async fn list_by_files(&self, file_ids: &[i64]) -> Result<Vec<SharedFile>> {
        if file_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut shares = Vec::new();
        for chunk in file_ids.chunks(ID_CHUNK_SIZE) {
            let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new(
                "SELECT id, file_id, user_id, shared_at FROM shared_files WHERE file_id IN (",
            );
            push_id_list(&mut query, chunk);
            query.push(")");

            let rows = query
                .build_query_as::<SharedFile>()
                .fetch_all(self.pool)
                .await
                .map_err(|e| VaultError::Database(e.to_string()))?;
            shares.extend(rows);
        }

        shares.sort_by(|a, b| (&a.shared_at, a.id).cmp(&(&b.shared_at, b.id)));
        Ok(shares)
    }

    /// List grants received by a user, newest first.
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<SharedFile>> {
        let shares = sqlx::query_as::<_, SharedFile>(
            "SELECT id, file_id, user_id, shared_at FROM shared_files
             WHERE user_id = ? ORDER BY shared_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| VaultError::Database(e.to_string()))?;

        Ok(shares)
    }

    /// Revoke a grant. Returns false if there was none.
    pub async fn delete(&self, file_id: i64, user_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM shared_files WHERE file_id = ? AND user_id = ?")
            .bind(file_id)
            .bind(user_id)
            .execute(self.pool)
            .await
            .map_err(|e| VaultError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewUser, UserRepository};
    use crate::file::{FileRepository, FolderRepository, NewFile, NewFolder};
    use crate::Database;

    async fn setup() -> (Database, i64, i64) {
        let db = Database::open_in_memory().await.unwrap();
        let users = UserRepository::new(db.pool());
        let owner = users
            .create(&NewUser::new("owner", "owner@example.com", "hash"))
            .await
            .unwrap();
        let grantee = users
            .create(&NewUser::new("grantee", "grantee@example.com", "hash"))
            .await
            .unwrap();
        let folder = FolderRepository::new(db.pool())
            .create(&NewFolder::new("Shared", owner.id))
            .await
            .unwrap();
        let file = FileRepository::new(db.pool())
            .create(&NewFile::new(folder.id, "plan.docx", vec![0; 8]))
            .await
            .unwrap();
        (db, file.id, grantee.id)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (db, file_id, grantee) = setup().await;
        let repo = ShareRepository::new(db.pool());

        let share = repo.create(file_id, grantee).await.unwrap();
        assert_eq!(share.file_id, file_id);
        assert_eq!(share.user_id, grantee);
        assert!(!share.shared_at.is_empty());

        assert_eq!(repo.get(file_id, grantee).await.unwrap(), Some(share));
        assert_eq!(repo.list_by_file(file_id).await.unwrap().len(), 1);
        assert_eq!(repo.list_by_user(grantee).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_grant_rejected() {
        let (db, file_id, grantee) = setup().await;
        let repo = ShareRepository::new(db.pool());

        repo.create(file_id, grantee).await.unwrap();
        assert!(repo.create(file_id, grantee).await.is_err());
    }

    #[tokio::test]
    async fn test_delete() {
        let (db, file_id, grantee) = setup().await;
        let repo = ShareRepository::new(db.pool());

        repo.create(file_id, grantee).await.unwrap();
        assert!(repo.delete(file_id, grantee).await.unwrap());
        assert!(!repo.delete(file_id, grantee).await.unwrap());
        assert!(repo.get(file_id, grantee).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_by_files_empty() {
        let (db, _, _) = setup().await;
        let repo = ShareRepository::new(db.pool());

        assert!(repo.list_by_files(&[]).await.unwrap().is_empty());
    }
}
