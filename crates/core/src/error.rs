use providers::ProviderError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("search term must not be empty")]
    InvalidTerm,
    #[error("search failed: {0}")]
    Search(#[from] ProviderError),
    #[error("download of {url} failed: {reason}")]
    Download { url: String, reason: String },
    #[error("cannot decode {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn decode(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Decode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
