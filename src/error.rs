use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while reorganizing a pack.
///
/// The `Root*` variants abort a run. The per-file variants are collected into
/// the report and the run moves on to the next file.
#[derive(Debug, Error)]
pub enum ReorganizeError {
    #[error("Pack root not found: {}", path.display())]
    RootNotFound { path: PathBuf },

    #[error("Pack root is not a directory: {}", path.display())]
    RootNotDirectory { path: PathBuf },

    #[error("Pack root is not readable: {}: {}", path.display(), reason)]
    RootUnreadable { path: PathBuf, reason: String },

    #[error("Failed to traverse {}: {}", path.display(), reason)]
    Traversal { path: PathBuf, reason: String },

    #[error("Permission denied: {}", path.display())]
    PermissionDenied { path: PathBuf },

    #[error("Failed to move {} to {}: {}", from.display(), to.display(), reason)]
    FileMove {
        from: PathBuf,
        to: PathBuf,
        reason: String,
    },

    #[error("Failed to write manifest {}: {}", path.display(), reason)]
    Manifest { path: PathBuf, reason: String },
}

impl ReorganizeError {
    /// Maps an I/O failure on a single transfer to a per-file error.
    pub fn from_transfer(source: &Path, destination: &Path, err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => ReorganizeError::PermissionDenied {
                path: source.to_path_buf(),
            },
            _ => ReorganizeError::FileMove {
                from: source.to_path_buf(),
                to: destination.to_path_buf(),
                reason: err.to_string(),
            },
        }
    }

    /// Whether this error aborts the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ReorganizeError::RootNotFound { .. }
                | ReorganizeError::RootNotDirectory { .. }
                | ReorganizeError::RootUnreadable { .. }
        )
    }

    /// Short machine-friendly name used in JSON reports.
    pub fn kind(&self) -> &'static str {
        match self {
            ReorganizeError::RootNotFound { .. } => "root_not_found",
            ReorganizeError::RootNotDirectory { .. } => "root_not_directory",
            ReorganizeError::RootUnreadable { .. } => "root_unreadable",
            ReorganizeError::Traversal { .. } => "traversal",
            ReorganizeError::PermissionDenied { .. } => "permission_denied",
            ReorganizeError::FileMove { .. } => "file_move",
            ReorganizeError::Manifest { .. } => "manifest",
        }
    }
}

pub type Result<T> = std::result::Result<T, ReorganizeError>;
