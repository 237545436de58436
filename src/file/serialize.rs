//! Serializable views of folders and files.

use serde::Serialize;

use super::file_type::FileType;
use super::folder::Folder;
use super::metadata::FileRecord;
use super::share::SharedFile;
use crate::datetime::format_timestamp;

/// A folder with its live files and child folders, recursively.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SerializedFolder {
    pub id: i64,
    pub name: String,
    pub created_at: String,
    pub is_zipped: bool,
    /// Live files, oldest first.
    pub files: Vec<SerializedFile>,
    /// Child folders, oldest first.
    pub children: Vec<SerializedFolder>,
}

impl SerializedFolder {
    /// Build a node from a folder and its already-serialized contents.
    pub fn new(
        folder: &Folder,
        files: Vec<SerializedFile>,
        children: Vec<SerializedFolder>,
    ) -> Self {
        Self {
            id: folder.id,
            name: folder.name.clone(),
            created_at: format_timestamp(&folder.created_at),
            is_zipped: folder.is_zipped,
            files,
            children,
        }
    }

    /// Number of folders in this subtree, including this one.
    pub fn folder_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    /// IDs of every folder in this subtree, preorder.
    pub fn folder_ids(&self) -> Vec<i64> {
        let mut ids = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            ids.push(node.id);
            stack.extend(node.children.iter().rev());
        }
        ids
    }
}

/// A file with its folder name and share grants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SerializedFile {
    pub id: i64,
    pub name: String,
    pub size: i64,
    pub file_type: FileType,
    pub created_at: String,
    pub deleted: bool,
    pub folder_id: i64,
    pub folder_name: String,
    pub shared_files: Vec<SharedFile>,
}

impl SerializedFile {
    /// Build a file view; `folder_name` is the name of `file.folder_id`.
    pub fn new(file: &FileRecord, folder_name: &str, shares: Vec<SharedFile>) -> Self {
        Self {
            id: file.id,
            name: file.name.clone(),
            size: file.size,
            file_type: file.file_type,
            created_at: format_timestamp(&file.created_at),
            deleted: file.deleted,
            folder_id: file.folder_id,
            folder_name: folder_name.to_string(),
            shared_files: shares
                .into_iter()
                .map(|s| SharedFile {
                    shared_at: format_timestamp(&s.shared_at),
                    ..s
                })
                .collect(),
        }
    }
}

/// One entry of a folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentEntry {
    Folder {
        id: i64,
        name: String,
        created_at: String,
    },
    File {
        id: i64,
        name: String,
        created_at: String,
        size: i64,
    },
}

impl ContentEntry {
    /// ID of the folder or file.
    pub fn id(&self) -> i64 {
        match self {
            ContentEntry::Folder { id, .. } | ContentEntry::File { id, .. } => *id,
        }
    }

    /// Name of the folder or file.
    pub fn name(&self) -> &str {
        match self {
            ContentEntry::Folder { name, .. } | ContentEntry::File { name, .. } => name,
        }
    }
}

impl From<&Folder> for ContentEntry {
    fn from(folder: &Folder) -> Self {
        ContentEntry::Folder {
            id: folder.id,
            name: folder.name.clone(),
            created_at: format_timestamp(&folder.created_at),
        }
    }
}

impl From<&FileRecord> for ContentEntry {
    fn from(file: &FileRecord) -> Self {
        ContentEntry::File {
            id: file.id,
            name: file.name.clone(),
            created_at: format_timestamp(&file.created_at),
            size: file.size,
        }
    }
}

/// Immediate children of a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderContents {
    /// Name of the listed folder.
    pub folder_name: String,
    pub folders: Vec<ContentEntry>,
    pub files: Vec<ContentEntry>,
}

impl FolderContents {
    /// Folders first, then files.
    pub fn entries(&self) -> Vec<ContentEntry> {
        self.folders
            .iter()
            .chain(self.files.iter())
            .cloned()
            .collect()
    }

    /// Whether the folder has neither child folders nor live files.
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.files.is_empty()
    }
}
