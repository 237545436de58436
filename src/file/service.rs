//! File service for filevault.
//!
//! High-level folder and file operations on behalf of a [`Requester`].
//! Every operation resolves its target through the access guard, so a
//! missing entity is reported before a foreign one. Multi-step mutations
//! run inside a single transaction.

use tracing::{debug, info};

use crate::config::StorageConfig;
use crate::db::{Database, UserRepository};
use crate::{Result, VaultError};

use super::access::{authorize, can_access, AccessGuard, Requester};
use super::file_type::FileType;
use super::folder::{DeleteSummary, Folder, FolderRepository, FolderUpdate, NewFolder};
use super::metadata::{FileRecord, FileRepository, NewFile};
use super::serialize::{ContentEntry, FolderContents, SerializedFile, SerializedFolder};
use super::share::{ShareRepository, SharedFile};
use super::tree::FolderArena;
use super::{sanitize_filename, validate_name, DEFAULT_MAX_FILE_SIZE, MAX_NAME_LENGTH};

/// Request data for file upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Folder ID to upload to.
    pub folder_id: i64,
    /// Filename as sent by the client.
    pub filename: String,
    /// File content.
    pub content: Vec<u8>,
}

impl UploadRequest {
    /// Create a new upload request.
    pub fn new(folder_id: i64, filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            folder_id,
            filename: filename.into(),
            content,
        }
    }
}

/// Result of a file download.
#[derive(Debug)]
pub struct Download {
    /// Stored filename.
    pub filename: String,
    /// File content.
    pub content: Vec<u8>,
}

/// Folder and file operations.
pub struct FileService<'a> {
    db: &'a Database,
    max_file_size: u64,
}

impl<'a> FileService<'a> {
    /// Create a new FileService.
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Create a new FileService using the storage configuration.
    pub fn with_config(db: &'a Database, config: &StorageConfig) -> Self {
        Self::new(db).with_max_file_size(config.max_upload_bytes())
    }

    /// Set a custom max upload size in bytes.
    pub fn with_max_file_size(mut self, max_size: u64) -> Self {
        self.max_file_size = max_size;
        self
    }

    /// Get the configured max upload size.
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    fn guard(&self) -> AccessGuard<'a> {
        AccessGuard::new(self.db.pool())
    }

    // ------------------------------------------------------------------
    // Folders
    // ------------------------------------------------------------------

    /// List the immediate child folders and live files of a folder.
    pub async fn list_contents(&self, folder_id: i64, requester: Requester) -> Result<FolderContents> {
        let folder = self.guard().folder(folder_id, requester).await?;

        let children = FolderRepository::new(self.db.pool())
            .list_children(folder_id)
            .await?;
        let files = FileRepository::new(self.db.pool())
            .list_by_folder(folder_id)
            .await?;

        debug!(
            folder_id,
            folders = children.len(),
            files = files.len(),
            "Listed folder contents"
        );

        Ok(FolderContents {
            folder_name: folder.name,
            folders: children.iter().map(ContentEntry::from).collect(),
            files: files.iter().map(ContentEntry::from).collect(),
        })
    }

    /// Serialize a folder with all of its descendants and their live files.
    pub async fn serialize_tree(&self, folder_id: i64, requester: Requester) -> Result<SerializedFolder> {
        self.guard().folder(folder_id, requester).await?;

        let arena = FolderArena::load_subtree(self.db.pool(), folder_id).await?;
        debug!(folder_id, folders = arena.len(), "Serializing folder tree");

        arena
            .serialize(folder_id)
            .ok_or_else(|| VaultError::NotFound("folder".to_string()))
    }

    /// Serialize every folder the requester owns, newest first.
    pub async fn list_folders(&self, requester: Requester) -> Result<Vec<SerializedFolder>> {
        let folders = FolderRepository::new(self.db.pool())
            .list_by_owner(requester.id)
            .await?;
        let order: Vec<i64> = folders.iter().map(|f| f.id).collect();

        let arena = FolderArena::load_folders(self.db.pool(), folders).await?;
        Ok(order.into_iter().filter_map(|id| arena.serialize(id)).collect())
    }

    /// Create a folder, optionally inside a parent the requester owns.
    pub async fn create_folder(
        &self,
        name: &str,
        requester: Requester,
        parent_id: Option<i64>,
    ) -> Result<Folder> {
        let name = validate_name(name)?;
        let mut new_folder = NewFolder::new(name, requester.id);

        let mut tx = self.db.begin().await?;

        if let Some(parent_id) = parent_id {
            let parent = FolderRepository::find_in(&mut tx, parent_id)
                .await?
                .ok_or_else(|| VaultError::NotFound("parent folder".to_string()))?;
            authorize(parent.owner_id, requester, "parent folder")?;
            new_folder = new_folder.with_parent(parent_id);
        }

        let id = FolderRepository::insert_in(&mut tx, &new_folder).await?;
        let folder = FolderRepository::find_in(&mut tx, id)
            .await?
            .ok_or_else(|| VaultError::NotFound("folder".to_string()))?;
        tx.commit().await?;

        info!(
            folder_id = folder.id,
            owner_id = folder.owner_id,
            parent_id = ?folder.parent_id,
            "Folder created"
        );
        Ok(folder)
    }

    /// Rename a folder. Sibling names may repeat.
    pub async fn rename_folder(
        &self,
        folder_id: i64,
        new_name: &str,
        requester: Requester,
    ) -> Result<Folder> {
        self.guard().folder(folder_id, requester).await?;
        let name = validate_name(new_name)?;

        let folder = FolderRepository::new(self.db.pool())
            .update(folder_id, &FolderUpdate::new().name(name))
            .await?
            .ok_or_else(|| VaultError::NotFound("folder".to_string()))?;

        info!(folder_id, "Folder renamed");
        Ok(folder)
    }

    /// Move a folder under a new parent, or to the root with `None`.
    ///
    /// The new parent must exist, belong to the requester, and lie outside
    /// the folder's own subtree; otherwise `InvalidReference`.
    pub async fn move_folder(
        &self,
        folder_id: i64,
        new_parent: Option<i64>,
        requester: Requester,
    ) -> Result<Folder> {
        self.guard().folder(folder_id, requester).await?;

        let mut tx = self.db.begin().await?;

        if let Some(target_id) = new_parent {
            let target = FolderRepository::find_in(&mut tx, target_id)
                .await?
                .ok_or_else(|| {
                    VaultError::InvalidReference(format!("folder {target_id} does not exist"))
                })?;
            if !can_access(target.owner_id, requester) {
                return Err(VaultError::InvalidReference(format!(
                    "folder {target_id} belongs to another user"
                )));
            }

            let subtree = FolderRepository::subtree_ids_in(&mut tx, folder_id).await?;
            if subtree.contains(&target_id) {
                return Err(VaultError::InvalidReference(format!(
                    "folder {target_id} is inside folder {folder_id}"
                )));
            }
        }

        FolderRepository::set_parent_in(&mut tx, folder_id, new_parent).await?;
        let folder = FolderRepository::find_in(&mut tx, folder_id)
            .await?
            .ok_or_else(|| VaultError::NotFound("folder".to_string()))?;
        tx.commit().await?;

        info!(folder_id, parent_id = ?new_parent, "Folder moved");
        Ok(folder)
    }

    /// Delete a folder with every descendant folder, file and share grant.
    pub async fn delete_folder(&self, folder_id: i64, requester: Requester) -> Result<DeleteSummary> {
        self.guard().folder(folder_id, requester).await?;

        let summary = FolderRepository::new(self.db.pool())
            .delete_cascade(folder_id)
            .await?
            .ok_or_else(|| VaultError::NotFound("folder".to_string()))?;

        info!(
            folder_id,
            folders = summary.folders,
            files = summary.files,
            "Folder deleted"
        );
        Ok(summary)
    }

    // ------------------------------------------------------------------
    // Files
    // ------------------------------------------------------------------

    /// Upload a file into a folder the requester owns.
    ///
    /// The filename is reduced to its last path component. The type is
    /// derived from the name and the size is the content length in bytes.
    pub async fn upload(&self, request: &UploadRequest, requester: Requester) -> Result<FileRecord> {
        let name = sanitize_filename(&request.filename);
        if name.is_empty() {
            return Err(VaultError::Validation("no selected file".to_string()));
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(VaultError::Validation(format!(
                "filename must be at most {MAX_NAME_LENGTH} characters"
            )));
        }
        if request.content.len() as u64 > self.max_file_size {
            let max_mb = self.max_file_size / 1024 / 1024;
            return Err(VaultError::Validation(format!(
                "file is too large (max {max_mb}MB)"
            )));
        }

        let new_file = NewFile::new(request.folder_id, name, request.content.clone());

        let mut tx = self.db.begin().await?;

        let folder = FolderRepository::find_in(&mut tx, request.folder_id)
            .await?
            .ok_or_else(|| {
                VaultError::InvalidReference(format!("folder {} does not exist", request.folder_id))
            })?;
        authorize(folder.owner_id, requester, "folder")?;

        let id = FileRepository::insert_in(&mut tx, &new_file).await?;
        let file = FileRepository::find_in(&mut tx, id)
            .await?
            .ok_or_else(|| VaultError::NotFound("file".to_string()))?;
        tx.commit().await?;

        info!(
            file_id = file.id,
            folder_id = file.folder_id,
            size = file.size,
            file_type = %file.file_type,
            "File uploaded"
        );
        Ok(file)
    }

    /// Get a file record, including one in the recycle bin.
    pub async fn get_file(&self, file_id: i64, requester: Requester) -> Result<FileRecord> {
        self.guard().file(file_id, requester).await
    }

    /// Get a file's name and raw content.
    pub async fn download(&self, file_id: i64, requester: Requester) -> Result<Download> {
        let file = self.guard().file(file_id, requester).await?;

        let content = FileRepository::new(self.db.pool())
            .get_content(file_id)
            .await?
            .ok_or_else(|| VaultError::NotFound("file".to_string()))?;

        debug!(file_id, size = content.len(), "File downloaded");
        Ok(Download {
            filename: file.name,
            content,
        })
    }

    /// Rename a file. The name is reduced to a bare filename as on upload
    /// and its type is re-derived from it.
    pub async fn rename_file(
        &self,
        file_id: i64,
        new_name: &str,
        requester: Requester,
    ) -> Result<FileRecord> {
        self.guard().file(file_id, requester).await?;
        let name = sanitize_filename(new_name);
        if name.is_empty() {
            return Err(VaultError::Validation("filename must not be empty".to_string()));
        }
        let name = validate_name(&name)?;

        let file = FileRepository::new(self.db.pool())
            .rename(file_id, &name)
            .await?
            .ok_or_else(|| VaultError::NotFound("file".to_string()))?;

        info!(file_id, file_type = %file.file_type, "File renamed");
        Ok(file)
    }

    /// Move a file into another folder the requester owns.
    pub async fn move_file(
        &self,
        file_id: i64,
        target_folder_id: i64,
        requester: Requester,
    ) -> Result<FileRecord> {
        self.guard().file(file_id, requester).await?;

        let mut tx = self.db.begin().await?;

        let target = FolderRepository::find_in(&mut tx, target_folder_id)
            .await?
            .ok_or_else(|| {
                VaultError::InvalidReference(format!("folder {target_folder_id} does not exist"))
            })?;
        if !can_access(target.owner_id, requester) {
            return Err(VaultError::InvalidReference(format!(
                "folder {target_folder_id} belongs to another user"
            )));
        }

        FileRepository::set_folder_in(&mut tx, file_id, target_folder_id).await?;
        let file = FileRepository::find_in(&mut tx, file_id)
            .await?
            .ok_or_else(|| VaultError::NotFound("file".to_string()))?;
        tx.commit().await?;

        info!(file_id, folder_id = target_folder_id, "File moved");
        Ok(file)
    }

    /// Permanently delete a file and its share grants.
    pub async fn delete_file(&self, file_id: i64, requester: Requester) -> Result<()> {
        self.guard().file(file_id, requester).await?;

        let mut tx = self.db.begin().await?;
        FileRepository::delete_in(&mut tx, &[file_id]).await?;
        tx.commit().await?;

        info!(file_id, "File deleted");
        Ok(())
    }

    /// Move a file to the recycle bin.
    pub async fn trash_file(&self, file_id: i64, requester: Requester) -> Result<FileRecord> {
        self.set_deleted(file_id, true, requester).await
    }

    /// Restore a file from the recycle bin.
    pub async fn restore_file(&self, file_id: i64, requester: Requester) -> Result<FileRecord> {
        self.set_deleted(file_id, false, requester).await
    }

    async fn set_deleted(&self, file_id: i64, deleted: bool, requester: Requester) -> Result<FileRecord> {
        self.guard().file(file_id, requester).await?;

        let file = FileRepository::new(self.db.pool())
            .set_deleted(file_id, deleted)
            .await?
            .ok_or_else(|| VaultError::NotFound("file".to_string()))?;

        info!(file_id, deleted, "File recycle flag changed");
        Ok(file)
    }

    /// The requester's files in the recycle bin, newest first.
    pub async fn recycle_bin(&self, requester: Requester) -> Result<Vec<FileRecord>> {
        FileRepository::new(self.db.pool())
            .list_trashed(requester.id)
            .await
    }

    /// Permanently delete every file in the requester's recycle bin.
    ///
    /// Returns the number of files removed.
    pub async fn empty_recycle_bin(&self, requester: Requester) -> Result<u64> {
        let mut tx = self.db.begin().await?;
        let ids = FileRepository::trashed_ids_in(&mut tx, requester.id).await?;
        let removed = FileRepository::delete_in(&mut tx, &ids).await?;
        tx.commit().await?;

        info!(owner_id = requester.id, removed, "Recycle bin emptied");
        Ok(removed)
    }

    /// All of the requester's live files, newest first.
    pub async fn list_files(&self, requester: Requester) -> Result<Vec<FileRecord>> {
        FileRepository::new(self.db.pool())
            .list_by_owner(requester.id, None)
            .await
    }

    /// Live files directly inside a folder, oldest first.
    pub async fn list_folder_files(&self, folder_id: i64, requester: Requester) -> Result<Vec<FileRecord>> {
        self.guard().folder(folder_id, requester).await?;

        FileRepository::new(self.db.pool())
            .list_by_folder(folder_id)
            .await
    }

    /// The requester's live files of one type, newest first.
    pub async fn files_by_type(&self, requester: Requester, file_type: FileType) -> Result<Vec<FileRecord>> {
        FileRepository::new(self.db.pool())
            .list_by_owner(requester.id, Some(file_type))
            .await
    }

    /// Serialize a single file with its folder name and share grants.
    pub async fn serialize_file(&self, file_id: i64, requester: Requester) -> Result<SerializedFile> {
        let file = self.guard().file(file_id, requester).await?;

        let folder = FolderRepository::new(self.db.pool())
            .get_by_id(file.folder_id)
            .await?
            .ok_or_else(|| VaultError::NotFound("folder".to_string()))?;
        let shares = ShareRepository::new(self.db.pool())
            .list_by_file(file_id)
            .await?;

        Ok(SerializedFile::new(&file, &folder.name, shares))
    }

    // ------------------------------------------------------------------
    // Sharing
    // ------------------------------------------------------------------

    /// Grant one of the requester's files to another user.
    pub async fn share_file(
        &self,
        file_id: i64,
        grantee_id: i64,
        requester: Requester,
    ) -> Result<SharedFile> {
        self.guard().file(file_id, requester).await?;

        if grantee_id == requester.id {
            return Err(VaultError::Validation(
                "cannot share a file with its owner".to_string(),
            ));
        }
        UserRepository::new(self.db.pool())
            .get_by_id(grantee_id)
            .await?
            .ok_or_else(|| VaultError::NotFound("user".to_string()))?;

        let shares = ShareRepository::new(self.db.pool());
        if shares.get(file_id, grantee_id).await?.is_some() {
            return Err(VaultError::Validation(
                "file is already shared with this user".to_string(),
            ));
        }

        let share = shares.create(file_id, grantee_id).await?;
        info!(file_id, grantee_id, "File shared");
        Ok(share)
    }

    /// Revoke a grant of one of the requester's files.
    pub async fn revoke_share(&self, file_id: i64, grantee_id: i64, requester: Requester) -> Result<()> {
        self.guard().file(file_id, requester).await?;

        if !ShareRepository::new(self.db.pool())
            .delete(file_id, grantee_id)
            .await?
        {
            return Err(VaultError::NotFound("share".to_string()));
        }

        info!(file_id, grantee_id, "File share revoked");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::NewUser;

    async fn setup() -> (Database, Requester, Requester) {
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
        (db, Requester::new(alice.id), Requester::new(bob.id))
    }

    #[tokio::test]
    async fn test_create_folder_with_parent() {
        let (db, alice, _) = setup().await;
        let service = FileService::new(&db);

        let root = service.create_folder("Projects", alice, None).await.unwrap();
        let child = service
            .create_folder("  2024  ", alice, Some(root.id))
            .await
            .unwrap();

        assert_eq!(child.name, "2024");
        assert_eq!(child.parent_id, Some(root.id));
        assert_eq!(child.owner_id, alice.id);
    }

    #[tokio::test]
    async fn test_create_folder_errors() {
        let (db, alice, bob) = setup().await;
        let service = FileService::new(&db);

        assert!(matches!(
            service.create_folder("", alice, None).await,
            Err(VaultError::Validation(_))
        ));
        assert!(matches!(
            service.create_folder("Sub", alice, Some(9999)).await,
            Err(VaultError::NotFound(_))
        ));

        let bobs = service.create_folder("Bob's", bob, None).await.unwrap();
        assert!(matches!(
            service.create_folder("Sneaky", alice, Some(bobs.id)).await,
            Err(VaultError::Permission(_))
        ));
    }

    #[tokio::test]
    async fn test_list_contents() {
        let (db, alice, _) = setup().await;
        let service = FileService::new(&db);

        let root = service.create_folder("Root", alice, None).await.unwrap();
        service.create_folder("Sub", alice, Some(root.id)).await.unwrap();
        service
            .upload(&UploadRequest::new(root.id, "a.txt", b"abc".to_vec()), alice)
            .await
            .unwrap();
        let trashed = service
            .upload(&UploadRequest::new(root.id, "b.txt", b"def".to_vec()), alice)
            .await
            .unwrap();
        service.trash_file(trashed.id, alice).await.unwrap();

        let contents = service.list_contents(root.id, alice).await.unwrap();
        assert_eq!(contents.folder_name, "Root");
        assert_eq!(contents.folders.len(), 1);
        assert_eq!(contents.files.len(), 1);
        assert_eq!(contents.files[0].name(), "a.txt");
        assert_eq!(contents.entries().len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_sibling_names_allowed() {
        let (db, alice, _) = setup().await;
        let service = FileService::new(&db);

        let root = service.create_folder("Root", alice, None).await.unwrap();
        service.create_folder("Same", alice, Some(root.id)).await.unwrap();
        service.create_folder("Same", alice, Some(root.id)).await.unwrap();

        let contents = service.list_contents(root.id, alice).await.unwrap();
        assert_eq!(contents.folders.len(), 2);
    }

    #[tokio::test]
    async fn test_rename_folder() {
        let (db, alice, bob) = setup().await;
        let service = FileService::new(&db);

        let folder = service.create_folder("Old", alice, None).await.unwrap();
        let renamed = service.rename_folder(folder.id, "New", alice).await.unwrap();
        assert_eq!(renamed.name, "New");

        assert!(matches!(
            service.rename_folder(folder.id, "Mine", bob).await,
            Err(VaultError::Permission(_))
        ));
        assert!(matches!(
            service.rename_folder(folder.id, " ", alice).await,
            Err(VaultError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_move_folder_rejects_cycles() {
        let (db, alice, _) = setup().await;
        let service = FileService::new(&db);

        let a = service.create_folder("A", alice, None).await.unwrap();
        let b = service.create_folder("B", alice, Some(a.id)).await.unwrap();
        let c = service.create_folder("C", alice, Some(b.id)).await.unwrap();

        assert!(matches!(
            service.move_folder(a.id, Some(a.id), alice).await,
            Err(VaultError::InvalidReference(_))
        ));
        assert!(matches!(
            service.move_folder(a.id, Some(c.id), alice).await,
            Err(VaultError::InvalidReference(_))
        ));

        let moved = service.move_folder(c.id, None, alice).await.unwrap();
        assert!(moved.parent_id.is_none());

        let moved = service.move_folder(a.id, Some(c.id), alice).await.unwrap();
        assert_eq!(moved.parent_id, Some(c.id));
    }

    #[tokio::test]
    async fn test_move_folder_rejects_foreign_or_missing_target() {
        let (db, alice, bob) = setup().await;
        let service = FileService::new(&db);

        let mine = service.create_folder("Mine", alice, None).await.unwrap();
        let theirs = service.create_folder("Theirs", bob, None).await.unwrap();

        assert!(matches!(
            service.move_folder(mine.id, Some(theirs.id), alice).await,
            Err(VaultError::InvalidReference(_))
        ));
        assert!(matches!(
            service.move_folder(mine.id, Some(9999), alice).await,
            Err(VaultError::InvalidReference(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_folder_cascades() {
        let (db, alice, bob) = setup().await;
        let service = FileService::new(&db);

        let root = service.create_folder("Root", alice, None).await.unwrap();
        let child = service.create_folder("Child", alice, Some(root.id)).await.unwrap();
        let file = service
            .upload(&UploadRequest::new(child.id, "deep.pdf", vec![0; 10]), alice)
            .await
            .unwrap();
        service.share_file(file.id, bob.id, alice).await.unwrap();

        assert!(matches!(
            service.delete_folder(root.id, bob).await,
            Err(VaultError::Permission(_))
        ));

        let summary = service.delete_folder(root.id, alice).await.unwrap();
        assert_eq!(summary, DeleteSummary { folders: 2, files: 1 });

        assert!(matches!(
            service.get_file(file.id, alice).await,
            Err(VaultError::NotFound(_))
        ));
        assert!(matches!(
            service.list_contents(child.id, alice).await,
            Err(VaultError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_upload_and_download() {
        let (db, alice, _) = setup().await;
        let service = FileService::new(&db);

        let folder = service.create_folder("Pictures", alice, None).await.unwrap();
        let file = service
            .upload(
                &UploadRequest::new(folder.id, "../photo.JPG", vec![7; 2048]),
                alice,
            )
            .await
            .unwrap();

        assert_eq!(file.name, "photo.JPG");
        assert_eq!(file.file_type, FileType::Image);
        assert_eq!(file.size, 2048);
        assert_eq!(file.folder_id, folder.id);

        let download = service.download(file.id, alice).await.unwrap();
        assert_eq!(download.filename, "photo.JPG");
        assert_eq!(download.content, vec![7; 2048]);
    }

    #[tokio::test]
    async fn test_upload_errors() {
        let (db, alice, bob) = setup().await;
        let service = FileService::new(&db).with_max_file_size(16);

        let folder = service.create_folder("Docs", alice, None).await.unwrap();

        match service
            .upload(&UploadRequest::new(folder.id, "", b"x".to_vec()), alice)
            .await
        {
            Err(VaultError::Validation(msg)) => assert_eq!(msg, "no selected file"),
            other => panic!("Expected Validation error, got {other:?}"),
        }
        assert!(matches!(
            service
                .upload(&UploadRequest::new(folder.id, "big.bin", vec![0; 17]), alice)
                .await,
            Err(VaultError::Validation(_))
        ));
        assert!(matches!(
            service
                .upload(&UploadRequest::new(9999, "a.txt", b"x".to_vec()), alice)
                .await,
            Err(VaultError::InvalidReference(_))
        ));
        assert!(matches!(
            service
                .upload(&UploadRequest::new(folder.id, "a.txt", b"x".to_vec()), bob)
                .await,
            Err(VaultError::Permission(_))
        ));
    }

    #[tokio::test]
    async fn test_rename_file_reclassifies() {
        let (db, alice, _) = setup().await;
        let service = FileService::new(&db);

        let folder = service.create_folder("Docs", alice, None).await.unwrap();
        let file = service
            .upload(&UploadRequest::new(folder.id, "notes.txt", b"x".to_vec()), alice)
            .await
            .unwrap();
        assert_eq!(file.file_type, FileType::Other);

        let renamed = service.rename_file(file.id, "notes.docx", alice).await.unwrap();
        assert_eq!(renamed.file_type, FileType::Docx);
    }

    #[tokio::test]
    async fn test_rename_file_keeps_bare_name() {
        let (db, alice, _) = setup().await;
        let service = FileService::new(&db);

        let folder = service.create_folder("Docs", alice, None).await.unwrap();
        let file = service
            .upload(&UploadRequest::new(folder.id, "a.txt", b"x".to_vec()), alice)
            .await
            .unwrap();

        let renamed = service
            .rename_file(file.id, "../../etc/x.pdf", alice)
            .await
            .unwrap();
        assert_eq!(renamed.name, "x.pdf");
        assert_eq!(renamed.file_type, FileType::Pdf);
        assert_eq!(service.download(file.id, alice).await.unwrap().filename, "x.pdf");

        for bad in ["dir/", "..", "  "] {
            assert!(matches!(
                service.rename_file(file.id, bad, alice).await,
                Err(VaultError::Validation(_))
            ));
        }
        assert_eq!(service.get_file(file.id, alice).await.unwrap().name, "x.pdf");
    }

    #[tokio::test]
    async fn test_move_file() {
        let (db, alice, bob) = setup().await;
        let service = FileService::new(&db);

        let from = service.create_folder("From", alice, None).await.unwrap();
        let to = service.create_folder("To", alice, None).await.unwrap();
        let foreign = service.create_folder("Foreign", bob, None).await.unwrap();
        let file = service
            .upload(&UploadRequest::new(from.id, "a.csv", b"1,2".to_vec()), alice)
            .await
            .unwrap();

        let moved = service.move_file(file.id, to.id, alice).await.unwrap();
        assert_eq!(moved.folder_id, to.id);

        assert!(matches!(
            service.move_file(file.id, foreign.id, alice).await,
            Err(VaultError::InvalidReference(_))
        ));
        assert!(matches!(
            service.move_file(file.id, 9999, alice).await,
            Err(VaultError::InvalidReference(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_file() {
        let (db, alice, bob) = setup().await;
        let service = FileService::new(&db);

        let folder = service.create_folder("Docs", alice, None).await.unwrap();
        let file = service
            .upload(&UploadRequest::new(folder.id, "a.pdf", b"a".to_vec()), alice)
            .await
            .unwrap();
        service.share_file(file.id, bob.id, alice).await.unwrap();

        assert!(matches!(
            service.delete_file(file.id, bob).await,
            Err(VaultError::Permission(_))
        ));

        service.delete_file(file.id, alice).await.unwrap();
        assert!(matches!(
            service.download(file.id, alice).await,
            Err(VaultError::NotFound(_))
        ));
        assert!(ShareRepository::new(db.pool())
            .list_by_user(bob.id)
            .await
            .unwrap()
            .is_empty());
        assert!(matches!(
            service.delete_file(file.id, alice).await,
            Err(VaultError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_recycle_bin() {
        let (db, alice, _) = setup().await;
        let service = FileService::new(&db);

        let folder = service.create_folder("Docs", alice, None).await.unwrap();
        let a = service
            .upload(&UploadRequest::new(folder.id, "a.pdf", b"a".to_vec()), alice)
            .await
            .unwrap();
        let b = service
            .upload(&UploadRequest::new(folder.id, "b.pdf", b"b".to_vec()), alice)
            .await
            .unwrap();

        service.trash_file(a.id, alice).await.unwrap();
        service.trash_file(b.id, alice).await.unwrap();
        assert_eq!(service.recycle_bin(alice).await.unwrap().len(), 2);
        assert!(service.list_files(alice).await.unwrap().is_empty());

        let restored = service.restore_file(a.id, alice).await.unwrap();
        assert!(!restored.deleted);
        assert_eq!(service.list_files(alice).await.unwrap().len(), 1);

        assert_eq!(service.empty_recycle_bin(alice).await.unwrap(), 1);
        assert!(service.recycle_bin(alice).await.unwrap().is_empty());
        assert!(matches!(
            service.get_file(b.id, alice).await,
            Err(VaultError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_files_by_type_and_list_folder_files() {
        let (db, alice, bob) = setup().await;
        let service = FileService::new(&db);

        let folder = service.create_folder("Mixed", alice, None).await.unwrap();
        for name in ["a.pdf", "b.png", "c.gif", "d.mp4"] {
            service
                .upload(&UploadRequest::new(folder.id, name, b"x".to_vec()), alice)
                .await
                .unwrap();
        }

        let images = service.files_by_type(alice, FileType::Image).await.unwrap();
        assert_eq!(images.len(), 2);
        assert!(service.files_by_type(bob, FileType::Image).await.unwrap().is_empty());

        let files = service.list_folder_files(folder.id, alice).await.unwrap();
        assert_eq!(files.len(), 4);
        assert!(matches!(
            service.list_folder_files(folder.id, bob).await,
            Err(VaultError::Permission(_))
        ));
    }

    #[tokio::test]
    async fn test_share_and_revoke() {
        let (db, alice, bob) = setup().await;
        let service = FileService::new(&db);

        let folder = service.create_folder("Docs", alice, None).await.unwrap();
        let file = service
            .upload(&UploadRequest::new(folder.id, "plan.xlsx", b"x".to_vec()), alice)
            .await
            .unwrap();

        let share = service.share_file(file.id, bob.id, alice).await.unwrap();
        assert_eq!(share.user_id, bob.id);

        assert!(matches!(
            service.share_file(file.id, bob.id, alice).await,
            Err(VaultError::Validation(_))
        ));
        assert!(matches!(
            service.share_file(file.id, alice.id, alice).await,
            Err(VaultError::Validation(_))
        ));
        assert!(matches!(
            service.share_file(file.id, 9999, alice).await,
            Err(VaultError::NotFound(_))
        ));
        assert!(matches!(
            service.share_file(file.id, alice.id, bob).await,
            Err(VaultError::Permission(_))
        ));

        // Grants do not open the file to the grantee
        assert!(matches!(
            service.get_file(file.id, bob).await,
            Err(VaultError::Permission(_))
        ));

        let serialized = service.serialize_file(file.id, alice).await.unwrap();
        assert_eq!(serialized.folder_name, "Docs");
        assert_eq!(serialized.shared_files.len(), 1);

        service.revoke_share(file.id, bob.id, alice).await.unwrap();
        assert!(matches!(
            service.revoke_share(file.id, bob.id, alice).await,
            Err(VaultError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_serialize_tree_and_list_folders() {
        let (db, alice, bob) = setup().await;
        let service = FileService::new(&db);

        let root = service.create_folder("Root", alice, None).await.unwrap();
        let child = service.create_folder("Child", alice, Some(root.id)).await.unwrap();
        service
            .upload(&UploadRequest::new(child.id, "a.pdf", b"x".to_vec()), alice)
            .await
            .unwrap();
        service.create_folder("Other", bob, None).await.unwrap();

        let tree = service.serialize_tree(root.id, alice).await.unwrap();
        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].files.len(), 1);
        assert_eq!(tree.children[0].files[0].folder_name, "Child");

        let folders = service.list_folders(alice).await.unwrap();
        assert_eq!(folders.len(), 2);
        assert_eq!(folders[0].id, child.id);
        assert_eq!(folders[1].id, root.id);
        assert_eq!(folders[1].children.len(), 1);

        assert!(matches!(
            service.serialize_tree(root.id, bob).await,
            Err(VaultError::Permission(_))
        ));
    }

    #[tokio::test]
    async fn test_with_config() {
        let db = Database::open_in_memory().await.unwrap();
        let config = StorageConfig {
            max_upload_size_mb: 2,
            ..Default::default()
        };

        let service = FileService::with_config(&db, &config);
        assert_eq!(service.max_file_size(), 2 * 1024 * 1024);
    }
}
