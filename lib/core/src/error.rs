use std::sync::Arc;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("Invalid {field} dimension: expected {expected}, got {actual}")]
    InvalidDimension {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid request: {0}")]
    Validation(String),

    /// Transient provider failure (transport error, rate limit, 5xx)
    #[error("Embedding provider error: {0}")]
    Provider(String),

    /// Provider refused the request; retrying cannot help
    #[error("Embedding provider rejected request: {0}")]
    ProviderRejected(String),

    #[error("Embedding provider returned an empty vector")]
    EmptyEmbedding,

    #[error("Embedding failed after {attempts} attempts: {source}")]
    EmbeddingExhausted {
        attempts: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("Retrieval failed during {stage}: {source}")]
    Retrieval {
        stage: &'static str,
        #[source]
        source: Box<Error>,
    },

    #[error("Deadline exceeded")]
    DeadlineExceeded,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Image error: {0}")]
    Image(String),

    #[error("IO error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A blocking worker panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(String),

}

impl Error {
    /// Wrap a lower-level failure as a retrieval failure at `stage`.
    pub fn retrieval(stage: &'static str, source: Error) -> Self {
        Error::Retrieval {
            stage,
            source: Box::new(source),
        }
    }

    /// Whether a provider call that failed with this error may be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Provider(_) => true,
            _ => false,
        }
    }

    /// Whether this error (possibly wrapped) was caused by an expired deadline.
    pub fn is_deadline(&self) -> bool {
        match self {
            Error::DeadlineExceeded => true,
            Error::Retrieval { source, .. } | Error::EmbeddingExhausted { source, .. } => {
                source.is_deadline()
            }
            _ => false,
        }
    }

    /// Owned copy of an error handed out to every caller waiting on the same
    /// in-flight request.
    pub fn from_shared(shared: Arc<Error>) -> Self {
        Arc::unwrap_or_clone(shared)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(Arc::new(e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
