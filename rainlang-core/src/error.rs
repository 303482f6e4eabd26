use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to read meta store: {0}")]
    StoreIo(#[from] std::io::Error),
    #[error("meta store directory was not found at {0}")]
    MissingStore(PathBuf),
    #[error("corrupt meta in {path}: {message}")]
    CorruptMeta { path: PathBuf, message: String },
    #[error("overlapping edits at offset {0}")]
    OverlappingEdit(usize),
    #[error("internal fault at offset {position}: {message}")]
    Fault { position: usize, message: String },
}
