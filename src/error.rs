// Copyright (c) 2026 rezky_nightky

use std::path::PathBuf;

use thiserror::Error;

/// Content table miss. The interpreter turns this into a red line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("subject {0} not found")]
    SubjectNotFound(String),

    #[error("note {0} not found")]
    NoteNotFound(String),
}

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("no audio asset for {category}/{id}")]
    NotFound { category: String, id: String },

    #[error("no audio player available")]
    NoPlayer,

    #[error("audio disabled")]
    Disabled,

    #[error("failed to start player for {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("could not resolve a data directory")]
    NoDataDir,

    #[error("state file I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("state file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
