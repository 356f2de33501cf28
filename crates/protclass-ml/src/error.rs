use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("required column `{0}` is missing")]
    MissingColumn(String),

    #[error("column `{0}` has no non-missing values")]
    EmptyColumn(String),

    #[error("column `{column}` row {row}: cannot read `{value}` as a number")]
    NonNumericCell {
        column: String,
        row: usize,
        value: String,
    },

    #[error("column `{column}` row {row}: value `{value}` is not finite")]
    NonFiniteValue {
        column: String,
        row: usize,
        value: f64,
    },

    #[error("row {row}: label `{value}` is not 0 or 1")]
    InvalidLabel { row: usize, value: String },

    #[error("feature mask covers {expected} features but the matrix has {found}")]
    MaskMismatch { expected: usize, found: usize },

    #[error("model was fitted on {expected} features but received {found}")]
    FeatureCountMismatch { expected: usize, found: usize },

    #[error("{rows} rows but {labels} labels")]
    LengthMismatch { rows: usize, labels: usize },

    #[error("cannot resample: {0}")]
    DegenerateClass(String),

    #[error("feature selection confirmed no features")]
    NoFeaturesSelected,

    #[error("`{0}` has not been fitted")]
    NotFitted(&'static str),

    #[error("training data is empty")]
    EmptyData,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("artifact format version {found} is not supported (expected {expected})")]
    VersionMismatch { expected: u32, found: u32 },

    #[error(transparent)]
    Metric(#[from] MetricError),

    #[error(transparent)]
    Table(#[from] protclass_io::IoError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MetricError {
    #[error("specificity is undefined: no negative samples")]
    NoNegatives,

    #[error("{0} is undefined when only one class is present")]
    SingleClass(&'static str),

    #[error("{predictions} predictions for {labels} labels")]
    LengthMismatch { predictions: usize, labels: usize },

    #[error("no samples to score")]
    Empty,
}
