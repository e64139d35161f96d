//! Folder lifecycle for run directories
//!
//! Every run gets a fresh `<root>/<run_id>` folder under both the pages root
//! and the builds root. Folders are recreated before a run and removed after it.

use crate::config::Config;
use crate::error::FolderError;
use crate::types::RunId;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// The pair of folders owned by one run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunFolders {
    /// Folder holding the page files
    pub pages: PathBuf,
    /// Folder holding the merged exports
    pub builds: PathBuf,
}

impl RunFolders {
    /// Folders for `run_id` under the configured roots
    pub fn for_run(config: &Config, run_id: RunId) -> Self {
        let id = run_id.to_string();
        Self {
            pages: config.folders.pages_folder.join(&id),
            builds: config.folders.builds_folder.join(&id),
        }
    }

    /// Both folders, pages first
    pub fn paths(&self) -> [&Path; 2] {
        [&self.pages, &self.builds]
    }
}

/// Delete `path` if it exists, then create it as an empty directory
///
/// Calling this twice in a row is fine: both calls leave an empty directory.
pub async fn remake_folder(path: &Path) -> Result<(), FolderError> {
    let remake_error = |source| FolderError::Remake {
        path: path.to_path_buf(),
        source,
    };

    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => debug!(?path, "removed existing folder"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(remake_error(e)),
    }

    tokio::fs::create_dir_all(path).await.map_err(remake_error)?;
    debug!(?path, "created folder");
    Ok(())
}

/// Open (creating if absent) `directory/name` positioned for append
pub fn open_for_append(directory: &Path, name: &str) -> Result<File, FolderError> {
    let path = directory.join(name);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| FolderError::Open { path, source })
}

/// Async variant of [`open_for_append`] used by the merge strategies
pub async fn open_for_append_async(path: &Path) -> Result<tokio::fs::File, FolderError> {
    tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|source| FolderError::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// Recursively remove every path in `paths`
///
/// All paths are attempted; the first failure is returned.
pub async fn cleanup<P: AsRef<Path>>(paths: &[P]) -> Result<(), FolderError> {
    let mut first_error = None;

    for path in paths {
        let path = path.as_ref();
        match tokio::fs::remove_dir_all(path).await {
            Ok(()) => debug!(?path, "removed folder"),
            Err(source) => {
                if first_error.is_none() {
                    first_error = Some(FolderError::Remove {
                        path: path.to_path_buf(),
                        source,
                    });
                }
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Regular files directly inside `directory`, sorted by file name
///
/// Subdirectories and other non-file entries are skipped.
pub async fn list_page_files(directory: &Path) -> Result<Vec<PathBuf>, FolderError> {
    let list_error = |source| FolderError::List {
        path: directory.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(directory).await.map_err(list_error)?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(list_error)? {
        let file_type = entry.file_type().await.map_err(list_error)?;
        if file_type.is_file() {
            files.push(entry.path());
        }
    }

    files.sort();
    Ok(files)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_remake_folder_is_idempotent() {
        let temp = tempdir().unwrap();
        let folder = temp.path().join("pages");

        remake_folder(&folder).await.unwrap();
        std::fs::write(folder.join("leftover"), b"x").unwrap();

        remake_folder(&folder).await.unwrap();
        assert!(folder.is_dir());
        assert_eq!(std::fs::read_dir(&folder).unwrap().count(), 0);

        remake_folder(&folder).await.unwrap();
        assert_eq!(std::fs::read_dir(&folder).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_remake_folder_creates_missing_parents() {
        let temp = tempdir().unwrap();
        let folder = temp.path().join("a").join("b").join("c");

        remake_folder(&folder).await.unwrap();
        assert!(folder.is_dir());
    }

    #[tokio::test]
    async fn test_remake_folder_fails_on_file_in_path() {
        let temp = tempdir().unwrap();
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, b"not a dir").unwrap();

        let result = remake_folder(&blocker.join("child")).await;
        assert!(matches!(result, Err(FolderError::Remake { .. })));
    }

    #[test]
    fn test_open_for_append_appends() {
        let temp = tempdir().unwrap();

        let mut file = open_for_append(temp.path(), "page_1").unwrap();
        file.write_all(b"one\n").unwrap();
        drop(file);

        let mut file = open_for_append(temp.path(), "page_1").unwrap();
        file.write_all(b"two\n").unwrap();
        drop(file);

        let content = std::fs::read_to_string(temp.path().join("page_1")).unwrap();
        assert_eq!(content, "one\ntwo\n");
    }

    #[test]
    fn test_open_for_append_missing_directory() {
        let temp = tempdir().unwrap();
        let result = open_for_append(&temp.path().join("missing"), "page_1");
        assert!(matches!(result, Err(FolderError::Open { .. })));
    }

    #[tokio::test]
    async fn test_cleanup_removes_everything() {
        let temp = tempdir().unwrap();
        let pages = temp.path().join("pages");
        let builds = temp.path().join("builds");
        remake_folder(&pages).await.unwrap();
        remake_folder(&builds).await.unwrap();
        std::fs::write(pages.join("page_1"), b"row\n").unwrap();

        cleanup(&[&pages, &builds]).await.unwrap();
        assert!(!pages.exists());
        assert!(!builds.exists());

        // remake on the same path afterwards leaves no residue
        remake_folder(&pages).await.unwrap();
        assert_eq!(std::fs::read_dir(&pages).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_cleanup_reports_missing_path_but_removes_rest() {
        let temp = tempdir().unwrap();
        let missing = temp.path().join("missing");
        let present = temp.path().join("present");
        remake_folder(&present).await.unwrap();

        let result = cleanup(&[&missing, &present]).await;
        match result {
            Err(FolderError::Remove { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected remove error, got {other:?}"),
        }
        assert!(!present.exists());
    }

    #[tokio::test]
    async fn test_list_page_files_sorted_and_skips_dirs() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("page_2"), b"").unwrap();
        std::fs::write(temp.path().join("page_1"), b"").unwrap();
        std::fs::create_dir(temp.path().join("nested")).unwrap();

        let files = list_page_files(temp.path()).await.unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["page_1", "page_2"]);
    }

    #[test]
    fn test_run_folders_are_isolated_per_run() {
        let config = Config::default();
        let a = RunFolders::for_run(&config, RunId::new());
        let b = RunFolders::for_run(&config, RunId::new());

        assert_ne!(a.pages, b.pages);
        assert!(a.pages.starts_with(&config.folders.pages_folder));
        assert!(a.builds.starts_with(&config.folders.builds_folder));
        assert_eq!(a.paths().len(), 2);
    }
}
