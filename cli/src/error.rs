use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum Error {
    #[error("cannot read {path}: {source}")]
    Input {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to decode PEM block: {0}")]
    FirstBlock(#[from] pem::Error),

    #[error("cannot write transient artifact: {0}")]
    Artifact(std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub(crate) type Result<T> = std::result::Result<T, Error>;
