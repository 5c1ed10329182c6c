// Virtual filesystem used by Finder, Terminal and TextEdit.
// A flat map from absolute path to record, persisted as one JSON document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const SEED_DIRECTORIES: [&str; 3] = ["/Desktop", "/Documents", "/Projects"];

#[derive(Debug, Error)]
pub enum VfsError {
    #[error("{0}: no such file or directory")]
    NotFound(String),
    #[error("{0}: destination exists")]
    DestinationExists(String),
    #[error("{0}: invalid path")]
    InvalidPath(String),
    #[error("{0}: not a directory")]
    NotADirectory(String),
    #[error("{0}: is a directory")]
    IsADirectory(String),
    #[error("filesystem io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("filesystem encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,
    pub name: String,
    pub kind: EntryKind,
    pub content: String,
    pub created_at: u64,
    pub modified_at: u64,
}

impl FileRecord {
    fn new(path: String, kind: EntryKind, content: String) -> Self {
        let now = now_millis();
        Self {
            name: file_name(&path).to_string(),
            path,
            kind,
            content,
            created_at: now,
            modified_at: now,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Canonical absolute form of `path`: leading `/`, no empty, `.` or `..` segments.
pub fn normalize_path(path: &str) -> Result<String, VfsError> {
    if !path.starts_with('/') {
        return Err(VfsError::InvalidPath(path.to_string()));
    }
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts
                    .pop()
                    .ok_or_else(|| VfsError::InvalidPath(path.to_string()))?;
            }
            other => parts.push(other),
        }
    }
    Ok(format!("/{}", parts.join("/")))
}

fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(i) => &path[..i],
    }
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn is_within(path: &str, ancestor: &str) -> bool {
    if ancestor == "/" {
        return path != "/";
    }
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'/'
}

fn join(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", dir, name)
    }
}

pub struct VirtualFs {
    store: Option<PathBuf>,
    entries: RwLock<BTreeMap<String, FileRecord>>,
}

impl VirtualFs {
    /// Filesystem that lives only in memory, seeded with the default folders.
    pub fn in_memory() -> Self {
        Self {
            store: None,
            entries: RwLock::new(seed()),
        }
    }

    /// Open the filesystem stored at `store`, seeding it on first run.
    /// An unreadable store is kept next to it as `vfs.json.bak`.
    pub async fn open(store: PathBuf) -> Result<Self, VfsError> {
        let entries = match tokio::fs::read_to_string(&store).await {
            Ok(text) => match serde_json::from_str::<BTreeMap<String, FileRecord>>(&text) {
                Ok(entries) => entries,
                Err(e) => {
                    let backup = store.with_extension("json.bak");
                    tokio::fs::rename(&store, &backup).await?;
                    warn!(
                        path = %store.display(),
                        backup = %backup.display(),
                        error = %e,
                        "corrupt filesystem store moved aside, reseeding"
                    );
                    seed()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => seed(),
            Err(e) => return Err(e.into()),
        };
        info!(path = %store.display(), entries = entries.len(), "virtual filesystem opened");

        let fs = Self {
            store: Some(store),
            entries: RwLock::new(entries),
        };
        let guard = fs.entries.read().await;
        fs.persist(&guard).await?;
        drop(guard);
        Ok(fs)
    }

    pub async fn create_directory(&self, path: &str) -> Result<FileRecord, VfsError> {
        self.insert_new(path, EntryKind::Directory, String::new()).await
    }

    pub async fn create_file(&self, path: &str, content: &str) -> Result<FileRecord, VfsError> {
        self.insert_new(path, EntryKind::File, content.to_string()).await
    }

    pub async fn read_file(&self, path: &str) -> Result<FileRecord, VfsError> {
        let path = normalize_path(path)?;
        let entries = self.entries.read().await;
        entries
            .get(&path)
            .cloned()
            .ok_or(VfsError::NotFound(path))
    }

    pub async fn update_file(&self, path: &str, content: &str) -> Result<FileRecord, VfsError> {
        let path = normalize_path(path)?;
        let mut entries = self.entries.write().await;
        let record = entries
            .get_mut(&path)
            .ok_or_else(|| VfsError::NotFound(path.clone()))?;
        if record.is_dir() {
            return Err(VfsError::IsADirectory(path));
        }
        record.content = content.to_string();
        record.modified_at = now_millis();
        let updated = record.clone();
        self.persist(&entries).await?;
        Ok(updated)
    }

    /// Remove `path` and, for a directory, everything below it.
    /// Returns how many records were removed.
    pub async fn delete_file(&self, path: &str) -> Result<usize, VfsError> {
        let path = normalize_path(path)?;
        if path == "/" {
            return Err(VfsError::InvalidPath(path));
        }
        let mut entries = self.entries.write().await;
        if !entries.contains_key(&path) {
            return Err(VfsError::NotFound(path));
        }
        let before = entries.len();
        entries.retain(|p, _| p != &path && !is_within(p, &path));
        let removed = before - entries.len();
        self.persist(&entries).await?;
        debug!(%path, removed, "deleted");
        Ok(removed)
    }

    /// Direct children of `path`, directories first then by name.
    pub async fn list_directory(&self, path: &str) -> Result<Vec<FileRecord>, VfsError> {
        let path = normalize_path(path)?;
        let entries = self.entries.read().await;
        if path != "/" {
            match entries.get(&path) {
                None => return Err(VfsError::NotFound(path)),
                Some(record) if !record.is_dir() => return Err(VfsError::NotADirectory(path)),
                Some(_) => {}
            }
        }
        let mut children: Vec<FileRecord> = entries
            .values()
            .filter(|r| r.path != "/" && parent_of(&r.path) == path)
            .cloned()
            .collect();
        children.sort_by(|a, b| {
            b.is_dir()
                .cmp(&a.is_dir())
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        Ok(children)
    }

    /// Move `from` (and its descendants) to `to`.
    pub async fn move_file(&self, from: &str, to: &str) -> Result<FileRecord, VfsError> {
        self.relocate(from, to, true).await
    }

    /// Copy `from` (and its descendants) to `to`.
    pub async fn copy_file(&self, from: &str, to: &str) -> Result<FileRecord, VfsError> {
        self.relocate(from, to, false).await
    }

    /// Rename in place; `new_name` is a single path segment.
    pub async fn rename_file(&self, path: &str, new_name: &str) -> Result<FileRecord, VfsError> {
        if new_name.is_empty() || new_name.contains('/') || new_name == "." || new_name == ".." {
            return Err(VfsError::InvalidPath(new_name.to_string()));
        }
        let path = normalize_path(path)?;
        let target = join(parent_of(&path), new_name);
        self.relocate(&path, &target, true).await
    }

    /// Case-insensitive match on names and file content.
    pub async fn search_files(&self, query: &str) -> Vec<FileRecord> {
        let needle = query.to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        let entries = self.entries.read().await;
        entries
            .values()
            .filter(|r| {
                r.name.to_lowercase().contains(&needle)
                    || (!r.is_dir() && r.content.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect()
    }

    async fn insert_new(
        &self,
        path: &str,
        kind: EntryKind,
        content: String,
    ) -> Result<FileRecord, VfsError> {
        let path = normalize_path(path)?;
        if path == "/" {
            return Err(VfsError::DestinationExists(path));
        }
        let mut entries = self.entries.write().await;
        check_destination(&entries, &path)?;

        let record = FileRecord::new(path.clone(), kind, content);
        entries.insert(path, record.clone());
        self.persist(&entries).await?;
        Ok(record)
    }

    async fn relocate(&self, from: &str, to: &str, remove_source: bool) -> Result<FileRecord, VfsError> {
        let from = normalize_path(from)?;
        let to = normalize_path(to)?;
        if from == "/" || to == from || is_within(&to, &from) {
            return Err(VfsError::InvalidPath(to));
        }

        let mut entries = self.entries.write().await;
        if !entries.contains_key(&from) {
            return Err(VfsError::NotFound(from));
        }
        check_destination(&entries, &to)?;

        let moving: Vec<FileRecord> = entries
            .values()
            .filter(|r| r.path == from || is_within(&r.path, &from))
            .cloned()
            .collect();

        let now = now_millis();
        let mut top = None;
        for mut record in moving {
            if remove_source {
                entries.remove(&record.path);
            } else {
                record.created_at = now;
            }
            let new_path = format!("{}{}", to, &record.path[from.len()..]);
            record.name = file_name(&new_path).to_string();
            record.path = new_path.clone();
            record.modified_at = now;
            if new_path == to {
                top = Some(record.clone());
            }
            entries.insert(new_path, record);
        }

        self.persist(&entries).await?;
        debug!(%from, %to, moved = remove_source, "relocated");
        top.ok_or(VfsError::NotFound(from))
    }

    async fn persist(&self, entries: &BTreeMap<String, FileRecord>) -> Result<(), VfsError> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        if let Some(parent) = store.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let text = serde_json::to_string(entries)?;
        tokio::fs::write(store, text).await?;
        Ok(())
    }
}

fn check_destination(entries: &BTreeMap<String, FileRecord>, path: &str) -> Result<(), VfsError> {
    if entries.contains_key(path) {
        return Err(VfsError::DestinationExists(path.to_string()));
    }
    let parent = parent_of(path);
    if parent != "/" {
        match entries.get(parent) {
            None => return Err(VfsError::NotFound(parent.to_string())),
            Some(record) if !record.is_dir() => {
                return Err(VfsError::NotADirectory(parent.to_string()))
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn seed() -> BTreeMap<String, FileRecord> {
    SEED_DIRECTORIES
        .iter()
        .map(|dir| {
            (
                dir.to_string(),
                FileRecord::new(dir.to_string(), EntryKind::Directory, String::new()),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_paths() {
        assert_eq!(normalize_path("/a//b/./c/").unwrap(), "/a/b/c");
        assert_eq!(normalize_path("/a/b/../c").unwrap(), "/a/c");
        assert_eq!(normalize_path("/").unwrap(), "/");
        assert!(normalize_path("relative").is_err());
        assert!(normalize_path("/..").is_err());
    }

    #[test]
    fn within_respects_segment_boundaries() {
        assert!(is_within("/Docs/a", "/Docs"));
        assert!(!is_within("/Docs2/a", "/Docs"));
        assert!(!is_within("/Docs", "/Docs"));
        assert!(is_within("/Docs", "/"));
    }

    #[tokio::test]
    async fn create_and_read_file() {
        let fs = VirtualFs::in_memory();
        fs.create_file("/Documents/resume.md", "# Me").await.unwrap();
        let record = fs.read_file("/Documents/resume.md").await.unwrap();
        assert_eq!(record.content, "# Me");
        assert_eq!(record.name, "resume.md");
        assert_eq!(record.kind, EntryKind::File);
    }

    #[tokio::test]
    async fn create_rejects_existing_and_orphan_paths() {
        let fs = VirtualFs::in_memory();
        fs.create_file("/Documents/a.txt", "").await.unwrap();
        assert!(matches!(
            fs.create_file("/Documents/a.txt", "").await,
            Err(VfsError::DestinationExists(_))
        ));
        assert!(matches!(
            fs.create_file("/Nowhere/a.txt", "").await,
            Err(VfsError::NotFound(_))
        ));
        assert!(matches!(
            fs.create_file("/Documents/a.txt/b", "").await,
            Err(VfsError::NotADirectory(_))
        ));
    }

    #[tokio::test]
    async fn update_missing_file_is_not_found() {
        let fs = VirtualFs::in_memory();
        assert!(matches!(
            fs.update_file("/Documents/ghost.txt", "x").await,
            Err(VfsError::NotFound(_))
        ));
        let updated = {
            fs.create_file("/Documents/n.txt", "old").await.unwrap();
            fs.update_file("/Documents/n.txt", "new").await.unwrap()
        };
        assert_eq!(updated.content, "new");
    }

    #[tokio::test]
    async fn list_shows_direct_children_dirs_first() {
        let fs = VirtualFs::in_memory();
        fs.create_file("/Projects/b.txt", "").await.unwrap();
        fs.create_directory("/Projects/alpha").await.unwrap();
        fs.create_file("/Projects/alpha/deep.txt", "").await.unwrap();

        let names: Vec<_> = fs
            .list_directory("/Projects")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["alpha", "b.txt"]);

        let root: Vec<_> = fs
            .list_directory("/")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(root, vec!["Desktop", "Documents", "Projects"]);
    }

    #[tokio::test]
    async fn move_directory_carries_descendants() {
        let fs = VirtualFs::in_memory();
        fs.create_directory("/Projects/site").await.unwrap();
        fs.create_file("/Projects/site/index.html", "<h1>").await.unwrap();

        fs.move_file("/Projects/site", "/Desktop/site").await.unwrap();
        assert!(fs.read_file("/Projects/site/index.html").await.is_err());
        let moved = fs.read_file("/Desktop/site/index.html").await.unwrap();
        assert_eq!(moved.content, "<h1>");
    }

    #[tokio::test]
    async fn move_into_itself_or_onto_existing_is_rejected() {
        let fs = VirtualFs::in_memory();
        assert!(matches!(
            fs.move_file("/Projects", "/Projects/inner").await,
            Err(VfsError::InvalidPath(_))
        ));
        assert!(matches!(
            fs.move_file("/Projects", "/Documents").await,
            Err(VfsError::DestinationExists(_))
        ));
        assert!(matches!(
            fs.move_file("/Ghost", "/Other").await,
            Err(VfsError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn copy_keeps_source() {
        let fs = VirtualFs::in_memory();
        fs.create_file("/Documents/a.txt", "hello").await.unwrap();
        fs.copy_file("/Documents/a.txt", "/Desktop/a.txt").await.unwrap();
        assert_eq!(fs.read_file("/Documents/a.txt").await.unwrap().content, "hello");
        assert_eq!(fs.read_file("/Desktop/a.txt").await.unwrap().content, "hello");
    }

    #[tokio::test]
    async fn rename_stays_in_parent() {
        let fs = VirtualFs::in_memory();
        fs.create_file("/Documents/draft.txt", "").await.unwrap();
        let renamed = fs.rename_file("/Documents/draft.txt", "final.txt").await.unwrap();
        assert_eq!(renamed.path, "/Documents/final.txt");
        assert!(fs.rename_file("/Documents/final.txt", "a/b").await.is_err());
    }

    #[tokio::test]
    async fn delete_directory_is_recursive() {
        let fs = VirtualFs::in_memory();
        fs.create_directory("/Documents/old").await.unwrap();
        fs.create_file("/Documents/old/a", "").await.unwrap();
        fs.create_file("/Documents/older", "").await.unwrap();

        assert_eq!(fs.delete_file("/Documents/old").await.unwrap(), 2);
        assert!(fs.read_file("/Documents/older").await.is_ok());
        assert!(matches!(
            fs.delete_file("/Documents/old").await,
            Err(VfsError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn search_matches_names_and_content() {
        let fs = VirtualFs::in_memory();
        fs.create_file("/Documents/Resume.md", "rust engineer").await.unwrap();
        fs.create_file("/Documents/notes.txt", "learn RUST").await.unwrap();

        assert_eq!(fs.search_files("resume").await.len(), 1);
        assert_eq!(fs.search_files("rust").await.len(), 2);
        assert!(fs.search_files("").await.is_empty());
    }

    #[tokio::test]
    async fn store_survives_reopen() {
        let dir = std::env::temp_dir().join(format!("foliodesk-vfs-{}", uuid::Uuid::new_v4()));
        let store = dir.join("vfs.json");

        let fs = VirtualFs::open(store.clone()).await.unwrap();
        fs.create_file("/Desktop/todo.txt", "ship it").await.unwrap();
        drop(fs);

        let reopened = VirtualFs::open(store).await.unwrap();
        assert_eq!(
            reopened.read_file("/Desktop/todo.txt").await.unwrap().content,
            "ship it"
        );
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn corrupt_store_is_backed_up_before_reseeding() {
        let dir = std::env::temp_dir().join(format!("foliodesk-vfs-{}", uuid::Uuid::new_v4()));
        let store = dir.join("vfs.json");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(&store, "{ not json").unwrap();

        let fs = VirtualFs::open(store.clone()).await.unwrap();
        assert!(fs.read_file("/Desktop").await.unwrap().is_dir());

        let backup = std::fs::read_to_string(dir.join("vfs.json.bak")).unwrap();
        assert_eq!(backup, "{ not json");
        let _ = std::fs::remove_dir_all(dir);
    }
}
