//! Database schema and migrations for filevault.
//!
//! Migrations are applied sequentially when the database is first opened
//! or upgraded.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: Users table
    r#"
CREATE TABLE users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL UNIQUE COLLATE NOCASE,
    email       TEXT NOT NULL UNIQUE COLLATE NOCASE,
    fullname    TEXT NOT NULL,
    password    TEXT NOT NULL,           -- Argon2 hash
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);
"#,
    // v2: Folder hierarchy
    r#"
-- Forest of folders; a folder's parent always has the same owner
CREATE TABLE folders (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    owner_id    INTEGER NOT NULL REFERENCES users(id),
    parent_id   INTEGER REFERENCES folders(id),  -- NULL for root folders
    is_zipped   INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_folders_owner_id ON folders(owner_id);
CREATE INDEX idx_folders_parent_id ON folders(parent_id);
"#,
    // v3: Files stored inline
    r#"
CREATE TABLE files (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    content     BLOB NOT NULL,
    size        INTEGER NOT NULL,        -- bytes
    file_type   TEXT NOT NULL DEFAULT 'OTHER',
    folder_id   INTEGER NOT NULL REFERENCES folders(id),
    deleted     INTEGER NOT NULL DEFAULT 0,  -- recycle bin flag
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_files_folder_id ON files(folder_id);
CREATE INDEX idx_files_created_at ON files(created_at);
"#,
    // v4: File share grants
    r#"
CREATE TABLE shared_files (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    file_id     INTEGER NOT NULL REFERENCES files(id),
    user_id     INTEGER NOT NULL REFERENCES users(id),
    shared_at   TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(file_id, user_id)
);

CREATE INDEX idx_shared_files_user_id ON shared_files(user_id);
"#,
];
