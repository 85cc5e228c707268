//! Per-request scratch workspaces
//!
//! A [`ScratchWorkspace`] owns two temp directories: one holding the staged
//! upload and one the engine writes its artifacts into. Both are removed when
//! the workspace is closed or dropped, whichever happens first.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::{Builder, TempDir};
use uuid::Uuid;

/// Workspace error types
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("Failed to create temp directory: {0}")]
    CreateDir(#[source] io::Error),

    #[error("Failed to create temp file: {0}")]
    WriteFile(#[source] io::Error),

    #[error("Temp file not found at {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to prepare output directory: {0}")]
    PrepareOutput(#[source] io::Error),
}

/// Scratch directories for a single request
#[derive(Debug)]
pub struct ScratchWorkspace {
    input_dir: Option<TempDir>,
    output_dir: Option<TempDir>,
    input_path: PathBuf,
    output_path: PathBuf,
}

impl ScratchWorkspace {
    /// Stage `content` as `upload_<token><extension>` in a fresh input
    /// directory and allocate an empty output directory.
    ///
    /// `extension` includes the leading dot. Directories are created under
    /// `root` when given, otherwise under the OS temp dir.
    pub async fn create(
        root: Option<&Path>,
        extension: &str,
        content: &[u8],
    ) -> Result<Self, WorkspaceError> {
        let input_dir = make_dir(root, "dots-input-")?;
        let input_path = input_dir
            .path()
            .join(format!("upload_{}{}", Uuid::new_v4().simple(), extension));

        // From here on the guard owns the directory, so every early return cleans up.
        let mut workspace = Self {
            input_dir: Some(input_dir),
            output_dir: None,
            input_path,
            output_path: PathBuf::new(),
        };

        tokio::fs::write(&workspace.input_path, content)
            .await
            .map_err(WorkspaceError::WriteFile)?;

        workspace.input_path = tokio::fs::canonicalize(&workspace.input_path)
            .await
            .map_err(|_| WorkspaceError::NotFound(workspace.input_path.clone()))?;

        let output_dir = make_dir(root, "dots-output-")?;
        clear_dir(output_dir.path())
            .await
            .map_err(WorkspaceError::PrepareOutput)?;
        workspace.output_path = output_dir.path().to_path_buf();
        workspace.output_dir = Some(output_dir);

        tracing::debug!(
            input = %workspace.input_path.display(),
            output = %workspace.output_path.display(),
            bytes = content.len(),
            "Workspace staged"
        );

        Ok(workspace)
    }

    /// Absolute path of the staged upload
    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    /// Directory handed to the engine for its artifacts
    pub fn output_dir(&self) -> &Path {
        &self.output_path
    }

    /// Remove both directories now, logging anything that could not be deleted.
    ///
    /// The recursive delete runs on the blocking pool. Once this is called the
    /// directories are owned by that task, so cleanup finishes even if the
    /// caller is cancelled while awaiting it.
    pub async fn close(mut self) {
        let dirs = self.take_dirs();
        if let Err(e) = tokio::task::spawn_blocking(move || remove_dirs(dirs)).await {
            tracing::warn!(error = %e, "Workspace cleanup task failed");
        }
    }

    fn take_dirs(&mut self) -> Vec<TempDir> {
        [self.input_dir.take(), self.output_dir.take()]
            .into_iter()
            .flatten()
            .collect()
    }
}

impl Drop for ScratchWorkspace {
    fn drop(&mut self) {
        remove_dirs(self.take_dirs());
    }
}

fn remove_dirs(dirs: Vec<TempDir>) {
    for dir in dirs {
        let path = dir.path().to_path_buf();
        match dir.close() {
            Ok(()) => tracing::debug!(path = %path.display(), "Removed workspace directory"),
            Err(e) => tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to remove workspace directory"
            ),
        }
    }
}

fn make_dir(root: Option<&Path>, prefix: &str) -> Result<TempDir, WorkspaceError> {
    let mut builder = Builder::new();
    builder.prefix(prefix);
    let dir = match root {
        Some(root) => builder.tempdir_in(root),
        None => builder.tempdir(),
    };
    dir.map_err(WorkspaceError::CreateDir)
}

/// Remove everything inside `dir`, keeping the directory itself.
async fn clear_dir(dir: &Path) -> io::Result<()> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_dir() {
            tokio::fs::remove_dir_all(&path).await?;
        } else {
            tokio::fs::remove_file(&path).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn test_create_stages_upload() {
        let root = TempDir::new().unwrap();
        let workspace = ScratchWorkspace::create(Some(root.path()), ".png", b"image bytes")
            .await
            .unwrap();

        let input = workspace.input_path().to_path_buf();
        assert!(input.is_absolute());
        assert_eq!(std::fs::read(&input).unwrap(), b"image bytes");

        let name = input.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("upload_"));
        assert!(name.ends_with(".png"));

        let output = workspace.output_dir();
        assert!(output.is_dir());
        assert_eq!(entries(output), 0);
        assert_ne!(input.parent().unwrap(), output);
    }

    #[tokio::test]
    async fn test_close_removes_everything() {
        let root = TempDir::new().unwrap();
        let workspace = ScratchWorkspace::create(Some(root.path()), ".pdf", b"%PDF-1.7")
            .await
            .unwrap();

        // Engine artifacts, including nested directories
        let output = workspace.output_dir().to_path_buf();
        std::fs::create_dir(output.join("api_pdf")).unwrap();
        std::fs::write(output.join("api_pdf").join("page_0.json"), "{}").unwrap();
        std::fs::write(output.join("api_pdf.jsonl"), "{}\n").unwrap();

        workspace.close().await;

        assert_eq!(entries(root.path()), 0);
    }

    #[tokio::test]
    async fn test_drop_removes_everything() {
        let root = TempDir::new().unwrap();
        {
            let _workspace = ScratchWorkspace::create(Some(root.path()), ".jpg", b"jpeg")
                .await
                .unwrap();
            assert_eq!(entries(root.path()), 2);
        }
        assert_eq!(entries(root.path()), 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_close_on_single_threaded_runtime() {
        let root = TempDir::new().unwrap();
        let workspace = ScratchWorkspace::create(Some(root.path()), ".png", b"png")
            .await
            .unwrap();
        std::fs::write(workspace.output_dir().join("page_0.json"), "{}").unwrap();

        workspace.close().await;

        assert_eq!(entries(root.path()), 0);
    }

    #[tokio::test]
    async fn test_names_are_unique() {
        let root = TempDir::new().unwrap();
        let a = ScratchWorkspace::create(Some(root.path()), ".png", b"a").await.unwrap();
        let b = ScratchWorkspace::create(Some(root.path()), ".png", b"b").await.unwrap();

        assert_ne!(a.input_path(), b.input_path());
        assert_ne!(a.output_dir(), b.output_dir());
    }

    #[tokio::test]
    async fn test_missing_root_fails_without_leftovers() {
        let root = TempDir::new().unwrap();
        let missing = root.path().join("does-not-exist");

        let result = ScratchWorkspace::create(Some(&missing), ".png", b"a").await;

        assert!(matches!(result, Err(WorkspaceError::CreateDir(_))));
        assert_eq!(entries(root.path()), 0);
    }

    #[tokio::test]
    async fn test_clear_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("stale.json"), "{}").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("x"), "x").unwrap();

        clear_dir(dir.path()).await.unwrap();

        assert!(dir.path().is_dir());
        assert_eq!(entries(dir.path()), 0);
    }
}
