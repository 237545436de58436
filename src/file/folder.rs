//! Folder types and repository for filevault.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, SqliteConnection, SqlitePool};

use crate::{Result, VaultError};

/// A folder in a user's hierarchy.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Folder {
    /// Unique folder ID.
    pub id: i64,
    /// Folder name.
    pub name: String,
    /// Owning user ID. Never changes after creation.
    pub owner_id: i64,
    /// Parent folder ID (None for root folders).
    pub parent_id: Option<i64>,
    /// When the folder was created.
    pub created_at: String,
    /// Whether the folder is marked as zipped.
    pub is_zipped: bool,
}

impl Folder {
    /// Get the created_at as DateTime<Utc>.
    pub fn created_at_datetime(&self) -> Option<DateTime<Utc>> {
        crate::datetime::parse_timestamp(&self.created_at)
    }

    /// Whether this is a root folder.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Data for creating a new folder.
#[derive(Debug, Clone)]
pub struct NewFolder {
    /// Folder name.
    pub name: String,
    /// Owning user ID.
    pub owner_id: i64,
    /// Parent folder ID (None for root folders).
    pub parent_id: Option<i64>,
}

impl NewFolder {
    /// Create a new root folder for the given owner.
    pub fn new(name: impl Into<String>, owner_id: i64) -> Self {
        Self {
            name: name.into(),
            owner_id,
            parent_id: None,
        }
    }

    /// Set the parent folder.
    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// Builder for updating a folder.
#[derive(Debug, Clone, Default)]
pub struct FolderUpdate {
    /// New folder name.
    pub name: Option<String>,
}

impl FolderUpdate {
    /// Create a new FolderUpdate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Check if any fields are set.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
    }
}

/// Counts removed by a cascading folder delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteSummary {
    /// Folders removed, including the target itself.
    pub folders: u64,
    /// Files removed from those folders.
    pub files: u64,
}

const FOLDER_COLUMNS: &str = "id, name, owner_id, parent_id, created_at, is_zipped";

/// IDs of the folder bound as the single parameter and everything beneath
/// it. `UNION` keeps the recursion finite on cyclic parent links.
const SUBTREE_IDS: &str = "WITH RECURSIVE subtree(id) AS (
        SELECT id FROM folders WHERE id = ?
        UNION
        SELECT f.id FROM folders f INNER JOIN subtree s ON f.parent_id = s.id
     )
     SELECT id FROM subtree";

/// Repository for folder operations.
pub struct FolderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FolderRepository<'a> {
    /// Create a new FolderRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new folder.
    ///
    /// Does not check the parent; callers go through the access guard first.
    pub async fn create(&self, folder: &NewFolder) -> Result<Folder> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| VaultError::Database(e.to_string()))?;
        let id = Self::insert_in(&mut conn, folder).await?;
        Self::find_in(&mut conn, id)
            .await?
            .ok_or_else(|| VaultError::NotFound("folder".to_string()))
    }

    /// Get a folder by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Folder>> {
        let folder = sqlx::query_as::<_, Folder>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| VaultError::Database(e.to_string()))?;

        Ok(folder)
    }

    /// List every folder owned by a user, newest first.
    pub async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Folder>> {
        let folders = sqlx::query_as::<_, Folder>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE owner_id = ?
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(owner_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| VaultError::Database(e.to_string()))?;

        Ok(folders)
    }

    /// List direct child folders of a parent folder, oldest first.
    pub async fn list_children(&self, parent_id: i64) -> Result<Vec<Folder>> {
        let folders = sqlx::query_as::<_, Folder>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE parent_id = ?
             ORDER BY created_at, id"
        ))
        .bind(parent_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| VaultError::Database(e.to_string()))?;

        Ok(folders)
    }

    /// Load a folder and all of its descendants.
    ///
    /// `UNION` discards rows already produced, so the query terminates even
    /// if the parent links contain a cycle.
    pub async fn load_subtree(&self, root_id: i64) -> Result<Vec<Folder>> {
        let folders = sqlx::query_as::<_, Folder>(
            "WITH RECURSIVE subtree(id) AS (
                SELECT id FROM folders WHERE id = ?
                UNION
                SELECT f.id FROM folders f INNER JOIN subtree s ON f.parent_id = s.id
             )
             SELECT f.id, f.name, f.owner_id, f.parent_id, f.created_at, f.is_zipped
             FROM folders f INNER JOIN subtree s ON f.id = s.id
             ORDER BY f.created_at, f.id",
        )
        .bind(root_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| VaultError::Database(e.to_string()))?;

        Ok(folders)
    }

    /// Update a folder.
    pub async fn update(&self, id: i64, update: &FolderUpdate) -> Result<Option<Folder>> {
        if update.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE folders SET ");
        let mut separated = query.separated(", ");

        if let Some(ref name) = update.name {
            separated.push("name = ");
            separated.push_bind_unseparated(name);
        }

        query.push(" WHERE id = ");
        query.push_bind(id);

        let result = query
            .build()
            .execute(self.pool)
            .await
            .map_err(|e| VaultError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    /// Delete a folder and everything beneath it in one transaction.
    ///
    /// Returns `None` if the folder does not exist.
    pub async fn delete_cascade(&self, id: i64) -> Result<Option<DeleteSummary>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| VaultError::Database(e.to_string()))?;

        if Self::find_in(&mut tx, id).await?.is_none() {
            return Ok(None);
        }
        let summary = Self::delete_subtree_in(&mut tx, id).await?;

        tx.commit()
            .await
            .map_err(|e| VaultError::Database(e.to_string()))?;
        Ok(Some(summary))
    }

    /// Get a folder by ID on an existing connection or transaction.
    pub async fn find_in(conn: &mut SqliteConnection, id: i64) -> Result<Option<Folder>> {
        let folder = sqlx::query_as::<_, Folder>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| VaultError::Database(e.to_string()))?;

        Ok(folder)
    }

    /// Insert a folder on an existing connection, returning its ID.
    pub async fn insert_in(conn: &mut SqliteConnection, folder: &NewFolder) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO folders (name, owner_id, parent_id) VALUES (?, ?, ?)",
        )
        .bind(&folder.name)
        .bind(folder.owner_id)
        .bind(folder.parent_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| VaultError::Database(e.to_string()))?;

        Ok(result.last_insert_rowid())
    }

    /// Re-parent a folder on an existing connection.
    pub async fn set_parent_in(
        conn: &mut SqliteConnection,
        id: i64,
        parent_id: Option<i64>,
    ) -> Result<bool> {
        let result = sqlx::query("UPDATE folders SET parent_id = ? WHERE id = ?")
            .bind(parent_id)
            .bind(id)
            .execute(&mut *conn)
            .await
            .map_err(|e| VaultError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// IDs of a folder and all of its descendants. Empty if the folder does
    /// not exist.
    pub async fn subtree_ids_in(conn: &mut SqliteConnection, root_id: i64) -> Result<Vec<i64>> {
        let rows: Vec<(i64,)> = sqlx::query_as(SUBTREE_IDS)
            .bind(root_id)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| VaultError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Remove share grants, files and folders of the subtree rooted at
    /// `root_id`.
    ///
    /// Each statement selects the subtree itself, so the number of bound
    /// parameters does not grow with the size of the tree.
    pub async fn delete_subtree_in(
        conn: &mut SqliteConnection,
        root_id: i64,
    ) -> Result<DeleteSummary> {
        sqlx::query(&format!(
            "DELETE FROM shared_files WHERE file_id IN (
                SELECT id FROM files WHERE folder_id IN ({SUBTREE_IDS})
             )"
        ))
        .bind(root_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| VaultError::Database(e.to_string()))?;

        let files = sqlx::query(&format!(
            "DELETE FROM files WHERE folder_id IN ({SUBTREE_IDS})"
        ))
        .bind(root_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| VaultError::Database(e.to_string()))?
        .rows_affected();

        let folders = sqlx::query(&format!(
            "DELETE FROM folders WHERE id IN ({SUBTREE_IDS})"
        ))
        .bind(root_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| VaultError::Database(e.to_string()))?
        .rows_affected();

        Ok(DeleteSummary { folders, files })
    }
}

/// Largest number of IDs bound into a single `IN (...)` list. SQLite
/// rejects statements with more than 32766 parameters.
pub(crate) const ID_CHUNK_SIZE: usize = 500;

/// Append `?, ?, ...` bound to `ids`.
pub(crate) fn push_id_list(query: &mut QueryBuilder<'_, sqlx::Sqlite>, ids: &[i64]) {
    let mut separated = query.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
}
