//! Test helpers for integration tests.

#![allow(dead_code)]

use filevault::db::{NewUser, UserRepository};
use filevault::{Database, FileRecord, FileService, Folder, Requester, UploadRequest};

/// Open a fresh in-memory store.
pub async fn setup_db() -> Database {
    Database::open_in_memory()
        .await
        .expect("Failed to create test database")
}

/// Create a user and return them as a requester.
pub async fn create_user(db: &Database, username: &str) -> Requester {
    let user = UserRepository::new(db.pool())
        .create(&NewUser::new(
            username,
            format!("{username}@example.com"),
            "hash",
        ))
        .await
        .expect("Failed to create user");
    Requester::new(user.id)
}

pub async fn create_folder(
    db: &Database,
    name: &str,
    owner: Requester,
    parent_id: Option<i64>,
) -> Folder {
    FileService::new(db)
        .create_folder(name, owner, parent_id)
        .await
        .expect("Failed to create folder")
}

/// Upload `size` zero bytes under `name`.
pub async fn upload(
    db: &Database,
    folder_id: i64,
    name: &str,
    size: usize,
    owner: Requester,
) -> FileRecord {
    FileService::new(db)
        .upload(&UploadRequest::new(folder_id, name, vec![0; size]), owner)
        .await
        .expect("Failed to upload file")
}

/// Count rows of `table` whose `column` is one of `ids`.
pub async fn count_referencing(db: &Database, table: &str, column: &str, ids: &[i64]) -> i64 {
    let list = ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!("SELECT COUNT(*) FROM {table} WHERE {column} IN ({list})");
    let (count,): (i64,) = sqlx::query_as(&sql)
        .fetch_one(db.pool())
        .await
        .expect("Failed to count rows");
    count
}
