use thiserror::Error;

pub type Result<T> = std::result::Result<T, KtopError>;

/// Boxed error from an external collaborator (cluster client, terminal backend).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum KtopError {
    /// A list or metrics call against the cluster failed. Aborts the whole
    /// refresh; no partial snapshot is published.
    #[error("failed to fetch {what}: {source}")]
    Fetch {
        what: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("invalid {target} filter `{pattern}`: {message}")]
    InvalidFilter {
        target: &'static str,
        pattern: String,
        message: String,
    },

    #[error("render failed: {0}")]
    Render(#[from] std::io::Error),

    #[error("fetch task ended unexpectedly: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl KtopError {
    pub fn fetch(what: &'static str, source: impl Into<BoxError>) -> Self {
        KtopError::Fetch {
            what,
            source: source.into(),
        }
    }
}
