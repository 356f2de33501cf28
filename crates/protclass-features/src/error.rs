use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExtractError>;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("could not parse structure {path}: {message}")]
    Structure { path: String, message: String },

    #[error("no CA atoms found in {0}")]
    NoCaAtoms(String),

    #[error("{file}: {reason}")]
    Malformed { file: String, reason: String },

    #[error("missing column `{0}`")]
    MissingColumn(String),

    #[error("row {row}: coordinate `{column}` is not a number")]
    InvalidCoordinate { column: String, row: usize },

    #[error("AAindex entry {0} not found")]
    UnknownIndex(String),

    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with {status}: {stderr}")]
    Subprocess {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error(transparent)]
    Table(#[from] protclass_io::IoError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
