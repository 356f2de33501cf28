use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("input file does not exist: {0}")]
    NotFound(String),

    #[error("unsupported table format (expected .csv, .xlsx or .xls): {0}")]
    UnsupportedFormat(String),

    #[error("workbook has no sheets: {0}")]
    EmptyWorkbook(String),

    #[error("column `{column}` has {found} rows, expected {expected}")]
    RaggedColumn {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("duplicate column name `{0}`")]
    DuplicateColumn(String),

    #[error("table is too large for a worksheet ({0} rows)")]
    TooManyRows(usize),

    #[error("table is too wide for a worksheet ({0} columns)")]
    TooManyColumns(usize),

    #[error(transparent)]
    Polars(#[from] polars::prelude::PolarsError),

    #[error(transparent)]
    Calamine(#[from] calamine::Error),

    #[error(transparent)]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
