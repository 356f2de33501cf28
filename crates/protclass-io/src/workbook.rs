//! Spreadsheet workbooks: calamine for reading, rust_xlsxwriter for writing.
use crate::{Cell, Column, IoError, Table};
use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::Workbook;
use std::path::Path;

/// Excel's hard row limit.
const MAX_ROWS: usize = 1_048_576;
const MAX_COLS: usize = 16_384;

pub(crate) fn read_first_sheet(path: &Path) -> Result<Table, IoError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IoError::EmptyWorkbook(path.display().to_string()))??;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Table::new());
    };
    let names: Vec<String> = header.iter().map(|d| d.to_string()).collect();
    let mut columns: Vec<Vec<Cell>> = vec![Vec::new(); names.len()];
    for row in rows {
        for (idx, cells) in columns.iter_mut().enumerate() {
            cells.push(row.get(idx).map(data_to_cell).unwrap_or(Cell::Empty));
        }
    }

    let mut table = Table::new();
    for (name, cells) in names.into_iter().zip(columns) {
        table.push_column(Column::new(name, cells))?;
    }
    Ok(table)
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Int(v) => Cell::Number(*v as f64),
        Data::Float(v) => Cell::from(*v),
        Data::Bool(b) => Cell::Number(if *b { 1.0 } else { 0.0 }),
        Data::String(s) => Cell::parse(s),
        other => Cell::Text(other.to_string()),
    }
}

pub(crate) fn write_workbook(path: &Path, sheets: &[(&str, &Table)]) -> Result<(), IoError> {
    let mut workbook = Workbook::new();
    for (name, table) in sheets {
        if table.n_rows() + 1 > MAX_ROWS {
            return Err(IoError::TooManyRows(table.n_rows()));
        }
        if table.n_cols() > MAX_COLS {
            return Err(IoError::TooManyColumns(table.n_cols()));
        }
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name)?;
        for (col_idx, column) in table.columns().iter().enumerate() {
            let col =
                u16::try_from(col_idx).map_err(|_| IoError::TooManyColumns(table.n_cols()))?;
            worksheet.write_string(0, col, column.name())?;
            for (row_idx, cell) in column.cells().iter().enumerate() {
                let row = row_idx as u32 + 1;
                match cell {
                    Cell::Empty => {}
                    Cell::Number(v) => {
                        worksheet.write_number(row, col, *v)?;
                    }
                    Cell::Text(s) => {
                        worksheet.write_string(row, col, s.as_str())?;
                    }
                }
            }
        }
    }
    workbook.save(path)?;
    Ok(())
}
