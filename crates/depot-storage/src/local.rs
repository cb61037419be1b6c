use crate::traits::{StorageError, StorageResult};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage rooted at a caller-provided directory.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Open an existing storage directory.
    ///
    /// The directory is never created here: a missing or non-directory path is a
    /// deployment error and is reported as [`StorageError::DirectoryUnavailable`].
    pub async fn open(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        let meta = fs::metadata(&base_path).await.map_err(|e| {
            StorageError::DirectoryUnavailable(format!("{}: {}", base_path.display(), e))
        })?;
        if !meta.is_dir() {
            return Err(StorageError::DirectoryUnavailable(format!(
                "{} is not a directory",
                base_path.display()
            )));
        }

        Ok(LocalStorage { base_path })
    }

    /// Convert a stored name to a filesystem path with security validation
    ///
    /// A stored name is a single path segment. Anything that could climb out of or
    /// descend below the storage directory is rejected.
    pub fn resolve(&self, name: &str) -> StorageResult<PathBuf> {
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains('/')
            || name.contains('\\')
            || name.contains('\0')
        {
            return Err(StorageError::InvalidName(format!(
                "'{}' is not a single safe path segment",
                name.escape_debug()
            )));
        }

        let path = self.base_path.join(name);
        if path.parent() != Some(self.base_path.as_path()) {
            return Err(StorageError::InvalidName(
                "Stored name resolves outside storage directory".to_string(),
            ));
        }

        Ok(path)
    }

    /// Create `name` for writing. Fails if a file with that name already exists.
    pub async fn create(&self, name: &str) -> StorageResult<FileWriter> {
        let path = self.resolve(name)?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(0o666);

        let file = options.open(&path).await.map_err(|e| {
            StorageError::CreateFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        Ok(FileWriter {
            file,
            path,
            bytes_written: 0,
            started: Instant::now(),
        })
    }

    /// Remove a stored file. Removing a file that is already gone succeeds.
    pub async fn remove(&self, name: &str) -> StorageResult<()> {
        let path = self.resolve(name)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Local storage delete successful");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Best-effort removal used on failure paths; logs instead of returning errors.
    pub async fn discard(&self, name: &str) {
        if let Err(e) = self.remove(name).await {
            tracing::warn!(error = %e, stored_name = %name, "Failed to clean up stored file");
        }
    }

    pub async fn metadata(&self, name: &str) -> StorageResult<std::fs::Metadata> {
        let path = self.resolve(name)?;
        fs::metadata(&path).await.map_err(StorageError::from)
    }
}

/// Exclusive write handle to a freshly created stored file.
///
/// The underlying handle is closed when the writer is dropped, so every exit path
/// releases it. A writer that is dropped without [`FileWriter::finish`] leaves a
/// partial file behind; deciding whether to remove it is the caller's job.
#[derive(Debug)]
pub struct FileWriter {
    file: fs::File,
    path: PathBuf,
    bytes_written: u64,
    started: Instant,
}

impl FileWriter {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> StorageResult<()> {
        self.file.write_all(chunk).await.map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to write file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        self.bytes_written += chunk.len() as u64;
        Ok(())
    }

    /// Copy every chunk of `stream` into the file.
    ///
    /// Read errors come back unchanged; write errors are converted through
    /// `From<StorageError>`, so the caller can still tell the two apart.
    pub async fn copy_stream<S, E>(&mut self, stream: S) -> Result<u64, E>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: From<StorageError>,
    {
        let mut stream = std::pin::pin!(stream);
        while let Some(chunk) = stream.next().await {
            self.write_chunk(&chunk?).await?;
        }
        Ok(self.bytes_written)
    }

    /// Flush and sync the file, then close it. Returns the number of bytes written.
    pub async fn finish(mut self) -> StorageResult<u64> {
        self.file.flush().await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to flush file {}: {}", self.path.display(), e))
        })?;
        self.file.sync_all().await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to sync file {}: {}", self.path.display(), e))
        })?;

        tracing::info!(
            path = %self.path.display(),
            size_bytes = self.bytes_written,
            duration_ms = self.started.elapsed().as_secs_f64() * 1000.0,
            "Local storage stream write successful"
        );

        Ok(self.bytes_written)
    }
}
