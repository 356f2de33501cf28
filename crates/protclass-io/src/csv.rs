//! CSV tables through polars.
//!
//! Every column is read as text and then interpreted cell-by-cell, so a column
//! mixing plain numbers with comma-separated multi-value strings survives
//! intact for the preprocessing stage.
use crate::{Cell, Column, IoError, Table};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

pub(crate) fn read_csv(path: &Path) -> Result<Table, IoError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let mut table = Table::new();
    for series in df.iter() {
        let values = series.cast(&DataType::String)?;
        let cells = values
            .str()?
            .into_iter()
            .map(|v| v.map(Cell::parse).unwrap_or(Cell::Empty))
            .collect();
        table.push_column(Column::new(series.name().to_string(), cells))?;
    }
    Ok(table)
}

pub(crate) fn write_csv(path: &Path, table: &Table) -> Result<(), IoError> {
    let series: Vec<Series> = table.columns().iter().map(column_to_series).collect();
    let mut df = DataFrame::new(series.into_iter().map(Into::into).collect())?;
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)?;
    Ok(())
}

fn column_to_series(column: &Column) -> Series {
    if column.is_numeric() {
        let values: Vec<Option<f64>> = column.cells().iter().map(Cell::as_f64).collect();
        Series::new(column.name().into(), values)
    } else {
        let values: Vec<Option<String>> = column
            .cells()
            .iter()
            .map(|c| match c {
                Cell::Empty => None,
                other => Some(other.to_string()),
            })
            .collect();
        Series::new(column.name().into(), values)
    }
}
