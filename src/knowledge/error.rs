use std::path::PathBuf;

use thiserror::Error;

/// A collaborator call that did not complete. Local state stays as it was.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} responded with {status}: {detail}")]
    Status {
        endpoint: String,
        status: u16,
        detail: String,
    },
    #[error("unexpected response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("background request worker stopped before replying")]
    WorkerLost,
}

/// Rejected before any network call.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("enter some note text to analyze")]
    EmptyNote,
    #[error("note is too short to analyze (at least {min} characters)")]
    NoteTooShort { min: usize },
    #[error("note exceeds the {max} character limit")]
    NoteTooLong { max: usize },
    #[error("an analysis is already running")]
    AnalysisInFlight,
    #[error("another change is still being saved")]
    MutationInFlight,
    #[error("select at least one node to delete")]
    EmptySelection,
    #[error("unknown node `{0}`")]
    UnknownNode(String),
    #[error("a link needs a relation name")]
    EmptyRelation,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("position store I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not encode pinned positions: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum GraphError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
