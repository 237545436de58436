//! In-memory folder arena for recursive serialization.
//!
//! Folders are indexed by ID with parent links kept as IDs. Trees are
//! assembled iteratively with a visited set, so every folder is emitted at
//! most once and corrupt cyclic data cannot cause unbounded recursion.

use std::collections::{HashMap, HashSet};

use sqlx::SqlitePool;

use super::folder::{Folder, FolderRepository};
use super::metadata::{FileRecord, FileRepository};
use super::serialize::{SerializedFile, SerializedFolder};
use super::share::{ShareRepository, SharedFile};
use crate::Result;

/// Folders, their live files and share grants, indexed for tree assembly.
#[derive(Debug, Default)]
pub struct FolderArena {
    folders: HashMap<i64, Folder>,
    children: HashMap<i64, Vec<i64>>,
    files: HashMap<i64, Vec<FileRecord>>,
    shares: HashMap<i64, Vec<SharedFile>>,
}

impl FolderArena {
    /// Build an arena from already-loaded rows.
    ///
    /// Child folders are ordered oldest first; files keep the order they
    /// are given in.
    pub fn from_parts(folders: Vec<Folder>, files: Vec<FileRecord>, shares: Vec<SharedFile>) -> Self {
        let mut arena = Self::default();

        for folder in &folders {
            if let Some(parent_id) = folder.parent_id {
                arena.children.entry(parent_id).or_default().push(folder.id);
            }
        }
        arena.folders = folders.into_iter().map(|f| (f.id, f)).collect();

        let by_id = &arena.folders;
        for siblings in arena.children.values_mut() {
            siblings.sort_by_key(|id| by_id.get(id).map(|f| (f.created_at.clone(), f.id)));
        }

        for file in files {
            arena.files.entry(file.folder_id).or_default().push(file);
        }
        for share in shares {
            arena.shares.entry(share.file_id).or_default().push(share);
        }

        arena
    }

    /// Load the subtree rooted at `root_id`.
    pub async fn load_subtree(pool: &SqlitePool, root_id: i64) -> Result<Self> {
        let folders = FolderRepository::new(pool).load_subtree(root_id).await?;
        Self::load_folders(pool, folders).await
    }

    /// Build an arena over the given folders, loading their live files and
    /// share grants.
    pub async fn load_folders(pool: &SqlitePool, folders: Vec<Folder>) -> Result<Self> {
        let folder_ids: Vec<i64> = folders.iter().map(|f| f.id).collect();
        let files = FileRepository::new(pool).list_by_folders(&folder_ids).await?;
        let file_ids: Vec<i64> = files.iter().map(|f| f.id).collect();
        let shares = ShareRepository::new(pool).list_by_files(&file_ids).await?;

        Ok(Self::from_parts(folders, files, shares))
    }

    /// Number of folders in the arena.
    pub fn len(&self) -> usize {
        self.folders.len()
    }

    /// Whether the arena holds no folders.
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    /// Look up a loaded folder by ID.
    pub fn get(&self, id: i64) -> Option<&Folder> {
        self.folders.get(&id)
    }

    /// Preorder walk from `root_id`, returning each reachable folder once
    /// together with the children it was first reached through.
    fn walk(&self, root_id: i64) -> (Vec<i64>, HashMap<i64, Vec<i64>>) {
        let mut order = Vec::new();
        let mut tree_children: HashMap<i64, Vec<i64>> = HashMap::new();
        let mut visited = HashSet::new();

        if !self.folders.contains_key(&root_id) {
            return (order, tree_children);
        }

        visited.insert(root_id);
        let mut stack = vec![root_id];
        while let Some(id) = stack.pop() {
            order.push(id);

            let mut kept = Vec::new();
            for &child in self.children.get(&id).into_iter().flatten() {
                if self.folders.contains_key(&child) && visited.insert(child) {
                    kept.push(child);
                }
            }
            stack.extend(kept.iter().rev());
            tree_children.insert(id, kept);
        }

        (order, tree_children)
    }

    /// IDs of `root_id` and every folder beneath it, preorder.
    pub fn descendants(&self, root_id: i64) -> Vec<i64> {
        self.walk(root_id).0
    }

    /// Serialize the tree rooted at `root_id`, or `None` if it is not in
    /// the arena.
    pub fn serialize(&self, root_id: i64) -> Option<SerializedFolder> {
        let (order, mut tree_children) = self.walk(root_id);
        let mut built: HashMap<i64, SerializedFolder> = HashMap::with_capacity(order.len());

        // Reverse preorder: every child is built before its parent.
        for &id in order.iter().rev() {
            let folder = self.folders.get(&id)?;
            let children = tree_children
                .remove(&id)
                .unwrap_or_default()
                .into_iter()
                .filter_map(|child| built.remove(&child))
                .collect();
            let files = self.serialize_files(folder);
            built.insert(id, SerializedFolder::new(folder, files, children));
        }

        built.remove(&root_id)
    }

    fn serialize_files(&self, folder: &Folder) -> Vec<SerializedFile> {
        self.files
            .get(&folder.id)
            .into_iter()
            .flatten()
            .map(|file| {
                let shares = self.shares.get(&file.id).cloned().unwrap_or_default();
                SerializedFile::new(file, &folder.name, shares)
            })
            .collect()
    }
}
