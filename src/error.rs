use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source or warehouse could not be reached/opened.
    #[error("Connection failed: {0}")]
    Connectivity(String),

    /// A query or statement failed against an open connection.
    #[error("Query failed: {0}")]
    Query(#[from] tokio_rusqlite::Error),

    /// A row came back in a shape a derivation cannot accept,
    /// e.g. a non-null timestamp column that does not parse.
    #[error("Unexpected data shape: {0}")]
    DataShape(String),

    /// The warehouse was left partially written: an earlier export
    /// committed but a later export or delete failed. Re-running the
    /// batch converges (upsert + id-based delete are idempotent).
    #[error("Partial write: {step} failed after earlier writes committed: {source}")]
    PartialWrite {
        step: &'static str,
        #[source]
        source: Box<AppError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
