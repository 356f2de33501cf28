//! In-memory tables

use crate::IoError;
use std::collections::HashSet;
use std::fmt;

/// Tokens read as missing values, in addition to the empty string.
const NA_TOKENS: [&str; 8] = ["NA", "N/A", "NaN", "nan", "null", "NULL", "None", "-nan"];

/// A single table value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Interpret a raw string the way a spreadsheet reader would: blanks and NA
    /// tokens are empty, anything parseable as a float is a number.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || NA_TOKENS.contains(&trimmed) {
            return Cell::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_nan() => Cell::Empty,
            Ok(v) => Cell::Number(v),
            Err(_) => Cell::Text(raw.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(v) => write!(f, "{}", v),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        if v.is_nan() {
            Cell::Empty
        } else {
            Cell::Number(v)
        }
    }
}

impl From<Option<f64>> for Cell {
    fn from(v: Option<f64>) -> Self {
        v.map(Cell::from).unwrap_or(Cell::Empty)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

/// A named column of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Column {
            name: name.into(),
            cells,
        }
    }

    pub fn from_numbers(name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Column::new(name, values.into_iter().map(Cell::from).collect())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// True when every non-empty cell is a number.
    pub fn is_numeric(&self) -> bool {
        self.cells
            .iter()
            .all(|c| matches!(c, Cell::Empty | Cell::Number(_)))
    }
}

/// Ordered collection of equally long, uniquely named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new() -> Self {
        Table::default()
    }

    pub fn from_columns(columns: Vec<Column>) -> Result<Self, IoError> {
        let mut table = Table::new();
        for column in columns {
            table.push_column(column)?;
        }
        Ok(table)
    }

    /// Append a column. The first column fixes the row count.
    pub fn push_column(&mut self, column: Column) -> Result<(), IoError> {
        if let Some(first) = self.columns.first() {
            if first.len() != column.len() {
                return Err(IoError::RaggedColumn {
                    expected: first.len(),
                    found: column.len(),
                    column: column.name,
                });
            }
        }
        if self.column_index(column.name()).is_some() {
            return Err(IoError::DuplicateColumn(column.name));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Append a column, replacing an existing one of the same name in place.
    pub fn set_column(&mut self, column: Column) -> Result<(), IoError> {
        match self.column_index(column.name()) {
            Some(idx) => {
                if self.columns[idx].len() != column.len() {
                    return Err(IoError::RaggedColumn {
                        expected: self.columns[idx].len(),
                        found: column.len(),
                        column: column.name,
                    });
                }
                self.columns[idx] = column;
                Ok(())
            }
            None => self.push_column(column),
        }
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Keep only the rows whose index satisfies `keep`.
    pub fn filter_rows(&self, keep: impl Fn(usize) -> bool) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|c| {
                let cells = c
                    .cells
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| keep(*i))
                    .map(|(_, cell)| cell.clone())
                    .collect();
                Column::new(c.name.clone(), cells)
            })
            .collect();
        Table { columns }
    }

    /// Stack tables with identical column names on top of each other.
    pub fn concat(tables: &[Table]) -> Result<Table, IoError> {
        let Some(first) = tables.first() else {
            return Ok(Table::new());
        };
        let names: HashSet<&str> = first.column_names().into_iter().collect();
        let mut columns: Vec<Column> = first.columns.clone();
        for table in &tables[1..] {
            for column in &mut columns {
                let other = table.column(column.name()).ok_or_else(|| IoError::RaggedColumn {
                    column: column.name().to_string(),
                    expected: 1,
                    found: 0,
                })?;
                column.cells.extend(other.cells.iter().cloned());
            }
            if let Some(extra) = table
                .column_names()
                .into_iter()
                .find(|n| !names.contains(n))
            {
                return Err(IoError::DuplicateColumn(extra.to_string()));
            }
        }
        Ok(Table { columns })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_parse() {
        assert_eq!(Cell::parse(" 3.5 "), Cell::Number(3.5));
        assert_eq!(Cell::parse(""), Cell::Empty);
        assert_eq!(Cell::parse("NA"), Cell::Empty);
        assert_eq!(Cell::parse("nan"), Cell::Empty);
        assert_eq!(Cell::parse("H"), Cell::text("H"));
        assert_eq!(Cell::parse("1,2"), Cell::text("1,2"));
        assert_eq!(Cell::from(f64::NAN), Cell::Empty);
    }

    #[test]
    fn test_ragged_and_duplicate_columns() {
        let mut t = Table::new();
        t.push_column(Column::from_numbers("a", [1.0, 2.0])).unwrap();
        assert!(matches!(
            t.push_column(Column::from_numbers("b", [1.0])),
            Err(IoError::RaggedColumn { .. })
        ));
        assert!(matches!(
            t.push_column(Column::from_numbers("a", [1.0, 2.0])),
            Err(IoError::DuplicateColumn(_))
        ));
        t.set_column(Column::from_numbers("a", [5.0, 6.0])).unwrap();
        assert_eq!(t.column("a").unwrap().cells()[0], Cell::Number(5.0));
        assert_eq!(t.n_cols(), 1);
        match t.set_column(Column::from_numbers("a", [1.0, 2.0, 3.0])) {
            Err(IoError::RaggedColumn {
                column,
                expected,
                found,
            }) => {
                assert_eq!(column, "a");
                assert_eq!((expected, found), (2, 3));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_filter_and_concat() {
        let t = Table::from_columns(vec![
            Column::from_numbers("a", [1.0, 2.0, 3.0]),
            Column::new("b", vec!["x".into(), "y".into(), "z".into()]),
        ])
        .unwrap();
        let odd = t.filter_rows(|i| i % 2 == 0);
        assert_eq!(odd.n_rows(), 2);
        assert_eq!(odd.column("b").unwrap().cells()[1], Cell::text("z"));

        let both = Table::concat(&[t.clone(), odd]).unwrap();
        assert_eq!(both.n_rows(), 5);
        assert!(t.column("a").unwrap().is_numeric());
        assert!(!t.column("b").unwrap().is_numeric());
    }
}
