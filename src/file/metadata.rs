//! File records and repository for filevault.
//!
//! Content is stored inline as a BLOB but never loaded with the record;
//! [`FileRepository::get_content`] fetches it separately.

use sqlx::{QueryBuilder, SqliteConnection, SqlitePool};

use super::file_type::FileType;
use super::folder::{push_id_list, ID_CHUNK_SIZE};
use crate::{Result, VaultError};

/// A stored file, without its content.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FileRecord {
    /// Unique file ID.
    pub id: i64,
    /// Display filename.
    pub name: String,
    /// Content length in bytes.
    pub size: i64,
    /// Category derived from the current name.
    #[sqlx(try_from = "String")]
    pub file_type: FileType,
    /// When the file was uploaded.
    pub created_at: String,
    /// Containing folder. The file's owner is this folder's owner.
    pub folder_id: i64,
    /// Whether the file is in the recycle bin.
    pub deleted: bool,
}

/// Data for creating a new file entry.
#[derive(Debug, Clone)]
pub struct NewFile {
    /// Target folder ID.
    pub folder_id: i64,
    /// Display filename.
    pub name: String,
    /// Raw content.
    pub content: Vec<u8>,
}

impl NewFile {
    /// Create a new NewFile.
    pub fn new(folder_id: i64, name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            folder_id,
            name: name.into(),
            content,
        }
    }

    /// Category the file will be stored under.
    pub fn file_type(&self) -> FileType {
        FileType::classify(&self.name)
    }

    /// Size in bytes.
    pub fn size(&self) -> i64 {
        self.content.len() as i64
    }
}

/// Bytes stored per file type for one owner.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TypeTotal {
    #[sqlx(try_from = "String")]
    pub file_type: FileType,
    /// Summed size of the owner's live files of this type.
    pub bytes: i64,
}

const FILE_COLUMNS: &str = "f.id, f.name, f.size, f.file_type, f.created_at, f.folder_id, f.deleted";

/// Repository for file operations.
pub struct FileRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FileRepository<'a> {
    /// Create a new FileRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new file entry.
    pub async fn create(&self, file: &NewFile) -> Result<FileRecord> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| VaultError::Database(e.to_string()))?;
        let id = Self::insert_in(&mut conn, file).await?;
        Self::find_in(&mut conn, id)
            .await?
            .ok_or_else(|| VaultError::NotFound("file".to_string()))
    }

    /// Get a file by ID, including files in the recycle bin.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<FileRecord>> {
        let file = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files f WHERE f.id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| VaultError::Database(e.to_string()))?;

        Ok(file)
    }

    /// Get the raw content of a file.
    pub async fn get_content(&self, id: i64) -> Result<Option<Vec<u8>>> {
        let content: Option<(Vec<u8>,)> = sqlx::query_as("SELECT content FROM files WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| VaultError::Database(e.to_string()))?;

        Ok(content.map(|(c,)| c))
    }

    /// Resolve a file's owner through its containing folder.
    pub async fn resolve_owner(&self, id: i64) -> Result<Option<i64>> {
        let owner: Option<(i64,)> = sqlx::query_as(
            "SELECT d.owner_id FROM files f INNER JOIN folders d ON d.id = f.folder_id
             WHERE f.id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| VaultError::Database(e.to_string()))?;

        Ok(owner.map(|(o,)| o))
    }

    /// List live files directly inside a folder, oldest first.
    pub async fn list_by_folder(&self, folder_id: i64) -> Result<Vec<FileRecord>> {
        let files = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files f
             WHERE f.folder_id = ? AND f.deleted = 0
             ORDER BY f.created_at, f.id"
        ))
        .bind(folder_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| VaultError::Database(e.to_string()))?;

        Ok(files)
    }

    /// List live files inside any of the given folders, oldest first.
    pub async fn list_by_folders(&self, folder_ids: &[i64]) -> Result<Vec<FileRecord>> {
        if folder_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for chunk in folder_ids.chunks(ID_CHUNK_SIZE) {
            let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new(format!(
                "SELECT {FILE_COLUMNS} FROM files f WHERE f.deleted = 0 AND f.folder_id IN ("
            ));
            push_id_list(&mut query, chunk);
            query.push(")");

            let rows = query
                .build_query_as::<FileRecord>()
                .fetch_all(self.pool)
                .await
                .map_err(|e| VaultError::Database(e.to_string()))?;
            files.extend(rows);
        }

        files.sort_by(|a, b| (&a.created_at, a.id).cmp(&(&b.created_at, b.id)));
        Ok(files)
    }

    /// List an owner's live files, newest first, optionally of one type.
    pub async fn list_by_owner(
        &self,
        owner_id: i64,
        file_type: Option<FileType>,
    ) -> Result<Vec<FileRecord>> {
        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new(format!(
            "SELECT {FILE_COLUMNS} FROM files f INNER JOIN folders d ON d.id = f.folder_id
             WHERE f.deleted = 0 AND d.owner_id = "
        ));
        query.push_bind(owner_id);
        if let Some(file_type) = file_type {
            query.push(" AND f.file_type = ");
            query.push_bind(file_type.as_str());
        }
        query.push(" ORDER BY f.created_at DESC, f.id DESC");

        let files = query
            .build_query_as::<FileRecord>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| VaultError::Database(e.to_string()))?;

        Ok(files)
    }

    /// The owner's most recently uploaded live files.
    pub async fn list_recent(&self, owner_id: i64, limit: i64) -> Result<Vec<FileRecord>> {
        let files = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files f INNER JOIN folders d ON d.id = f.folder_id
             WHERE f.deleted = 0 AND d.owner_id = ?
             ORDER BY f.created_at DESC, f.id DESC
             LIMIT ?"
        ))
        .bind(owner_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await
        .map_err(|e| VaultError::Database(e.to_string()))?;

        Ok(files)
    }

    /// The owner's files in the recycle bin, newest first.
    pub async fn list_trashed(&self, owner_id: i64) -> Result<Vec<FileRecord>> {
        let files = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files f INNER JOIN folders d ON d.id = f.folder_id
             WHERE f.deleted = 1 AND d.owner_id = ?
             ORDER BY f.created_at DESC, f.id DESC"
        ))
        .bind(owner_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| VaultError::Database(e.to_string()))?;

        Ok(files)
    }

    /// Rename a file, re-deriving its type from the new name.
    pub async fn rename(&self, id: i64, name: &str) -> Result<Option<FileRecord>> {
        let result = sqlx::query("UPDATE files SET name = ?, file_type = ? WHERE id = ?")
            .bind(name)
            .bind(FileType::classify(name).as_str())
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| VaultError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Set or clear the recycle-bin flag.
    pub async fn set_deleted(&self, id: i64, deleted: bool) -> Result<Option<FileRecord>> {
        let result = sqlx::query("UPDATE files SET deleted = ? WHERE id = ?")
            .bind(deleted)
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| VaultError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Count live files directly inside a folder.
    pub async fn count_by_folder(&self, folder_id: i64) -> Result<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM files WHERE folder_id = ? AND deleted = 0")
                .bind(folder_id)
                .fetch_one(self.pool)
                .await
                .map_err(|e| VaultError::Database(e.to_string()))?;

        Ok(count.0)
    }

    /// Total bytes of live files directly inside a folder.
    pub async fn total_size_by_folder(&self, folder_id: i64) -> Result<i64> {
        let size: (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(size), 0) FROM files WHERE folder_id = ? AND deleted = 0",
        )
        .bind(folder_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| VaultError::Database(e.to_string()))?;

        Ok(size.0)
    }

    /// Bytes per file type across an owner's live files.
    pub async fn type_totals(&self, owner_id: i64) -> Result<Vec<TypeTotal>> {
        let totals = sqlx::query_as::<_, TypeTotal>(
            "SELECT f.file_type AS file_type, SUM(f.size) AS bytes
             FROM files f INNER JOIN folders d ON d.id = f.folder_id
             WHERE f.deleted = 0 AND d.owner_id = ?
             GROUP BY f.file_type",
        )
        .bind(owner_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| VaultError::Database(e.to_string()))?;

        Ok(totals)
    }

    /// Get a file by ID on an existing connection or transaction.
    pub async fn find_in(conn: &mut SqliteConnection, id: i64) -> Result<Option<FileRecord>> {
        let file = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files f WHERE f.id = ?"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| VaultError::Database(e.to_string()))?;

        Ok(file)
    }

    /// Insert a file on an existing connection, returning its ID.
    pub async fn insert_in(conn: &mut SqliteConnection, file: &NewFile) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO files (name, content, size, file_type, folder_id) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&file.name)
        .bind(&file.content)
        .bind(file.size())
        .bind(file.file_type().as_str())
        .bind(file.folder_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| VaultError::Database(e.to_string()))?;

        Ok(result.last_insert_rowid())
    }

    /// Move a file to another folder on an existing connection.
    pub async fn set_folder_in(conn: &mut SqliteConnection, id: i64, folder_id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE files SET folder_id = ? WHERE id = ?")
            .bind(folder_id)
            .bind(id)
            .execute(&mut *conn)
            .await
            .map_err(|e| VaultError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Hard-delete files and their share grants on an existing connection.
    ///
    /// Returns the number of files removed.
    pub async fn delete_in(conn: &mut SqliteConnection, ids: &[i64]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut removed = 0;
        for chunk in ids.chunks(ID_CHUNK_SIZE) {
            let mut query: QueryBuilder<sqlx::Sqlite> =
                QueryBuilder::new("DELETE FROM shared_files WHERE file_id IN (");
            push_id_list(&mut query, chunk);
            query.push(")");
            query
                .build()
                .execute(&mut *conn)
                .await
                .map_err(|e| VaultError::Database(e.to_string()))?;

            let mut query: QueryBuilder<sqlx::Sqlite> =
                QueryBuilder::new("DELETE FROM files WHERE id IN (");
            push_id_list(&mut query, chunk);
            query.push(")");
            removed += query
                .build()
                .execute(&mut *conn)
                .await
                .map_err(|e| VaultError::Database(e.to_string()))?
                .rows_affected();
        }

        Ok(removed)
    }

    /// IDs of an owner's files in the recycle bin, on an existing connection.
    pub async fn trashed_ids_in(conn: &mut SqliteConnection, owner_id: i64) -> Result<Vec<i64>> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT f.id FROM files f INNER JOIN folders d ON d.id = f.folder_id
             WHERE f.deleted = 1 AND d.owner_id = ?",
        )
        .bind(owner_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| VaultError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
