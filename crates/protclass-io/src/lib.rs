//! protclass-io
//!
//! Tabular input/output for the residue feature pipeline.
//!
//! Every stage of the pipeline exchanges [`Table`]s: ordered, named columns of
//! [`Cell`] values. Tables are read from and written to CSV files (via polars)
//! or spreadsheet workbooks (calamine for reading, rust_xlsxwriter for writing).
//!
//! ```no_run
//! use protclass_io::{read_table, write_table};
//! let table = read_table("1WQW_A_feature.csv").expect("readable table");
//! write_table("copy.xlsx", &table).expect("writable workbook");
//! ```
mod csv;
mod error;
mod table;
mod workbook;

use std::path::Path;

pub use self::error::IoError;
pub use self::table::{Cell, Column, Table};

/// Supported on-disk table formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Workbook,
}

impl TableFormat {
    /// Resolve the format from a file extension (case-insensitive).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(TableFormat::Csv),
            "xlsx" | "xls" | "xlsm" => Ok(TableFormat::Workbook),
            _ => Err(IoError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Read the first sheet (or the whole CSV) at `path` into a [`Table`].
pub fn read_table(path: impl AsRef<Path>) -> Result<Table, IoError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(IoError::NotFound(path.display().to_string()));
    }
    let table = match TableFormat::from_path(path)? {
        TableFormat::Csv => csv::read_csv(path)?,
        TableFormat::Workbook => workbook::read_first_sheet(path)?,
    };
    log::debug!(
        "read {} rows x {} columns from {}",
        table.n_rows(),
        table.n_cols(),
        path.display()
    );
    Ok(table)
}

/// Write `table` to `path`. A `.csv` extension writes CSV; anything else is
/// written as a single-sheet workbook.
pub fn write_table(path: impl AsRef<Path>, table: &Table) -> Result<(), IoError> {
    let path = path.as_ref();
    match TableFormat::from_path(path) {
        Ok(TableFormat::Csv) => csv::write_csv(path, table),
        _ => workbook::write_workbook(path, &[("Sheet1", table)]),
    }
}

/// Write several named sheets into one workbook.
pub fn write_workbook(path: impl AsRef<Path>, sheets: &[(&str, &Table)]) -> Result<(), IoError> {
    workbook::write_workbook(path.as_ref(), sheets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(TableFormat::from_path("a.csv").unwrap(), TableFormat::Csv);
        assert_eq!(TableFormat::from_path("a.XLSX").unwrap(), TableFormat::Workbook);
        assert_eq!(TableFormat::from_path("a.xls").unwrap(), TableFormat::Workbook);
        assert!(matches!(
            TableFormat::from_path("a.txt"),
            Err(IoError::UnsupportedFormat(_))
        ));
        assert!(TableFormat::from_path("noext").is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            read_table("/definitely/not/here.csv"),
            Err(IoError::NotFound(_))
        ));
    }

    #[test]
    fn test_csv_and_workbook_agree() {
        let table = Table::from_columns(vec![
            Column::new("ProteinID", vec![Cell::text("1WQW_A"), Cell::text("1WQW_A")]),
            Column::new("ACC", vec![Cell::Number(12.5), Cell::Empty]),
            Column::new("PSSM", vec![Cell::text("1.0,2.0"), Cell::Number(3.0)]),
        ])
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("t.csv");
        let xlsx_path = dir.path().join("t.xlsx");
        write_table(&csv_path, &table).unwrap();
        write_table(&xlsx_path, &table).unwrap();

        let from_csv = read_table(&csv_path).unwrap();
        let from_xlsx = read_table(&xlsx_path).unwrap();
        for t in [&from_csv, &from_xlsx] {
            assert_eq!(t.column_names(), vec!["ProteinID", "ACC", "PSSM"]);
            assert_eq!(t.n_rows(), 2);
            let acc = t.column("ACC").unwrap();
            assert_eq!(acc.cells()[0], Cell::Number(12.5));
            assert!(acc.cells()[1].is_empty());
            assert_eq!(t.column("PSSM").unwrap().cells()[0], Cell::text("1.0,2.0"));
        }
    }

    #[test]
    fn test_workbook_column_limit() {
        let columns = (0..16_385).map(|i| Column::new(format!("c{i}"), Vec::new()));
        let table = Table::from_columns(columns.collect()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.xlsx");
        assert!(matches!(
            write_table(&path, &table),
            Err(IoError::TooManyColumns(16_385))
        ));
        assert!(!path.exists());
    }
}
