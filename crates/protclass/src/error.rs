use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] toml::de::Error),

    #[error("could not encode default configuration: {0}")]
    Defaults(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("could not decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_pickle::Error,
    },

    #[error(transparent)]
    Encode(#[from] serde_pickle::Error),

    #[error(transparent)]
    Pipeline(#[from] protclass_ml::PipelineError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
