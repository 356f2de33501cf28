//! DSSP secondary-structure tables.
use crate::{ExtractError, Result};
use protclass_io::{Cell, Column, Table};
use std::path::Path;
use std::process::Command;

/// Line that precedes the per-residue records.
pub const DSSP_HEADER: &str = "  #  RESIDUE AA STRUCTURE BP1 BP2  ACC";

/// Records shorter than this are skipped.
const MIN_RECORD_LEN: usize = 120;

/// Output columns and their byte ranges in a record; `seq` is generated.
const FIELDS: [(&str, usize, Option<usize>); 18] = [
    ("RESIDUE", 5, Some(10)),
    ("AA", 13, Some(14)),
    ("STRUCTURE", 16, Some(25)),
    ("BP1", 25, Some(29)),
    ("BP2", 29, Some(33)),
    ("ACC", 34, Some(38)),
    ("N-H-->O", 39, Some(50)),
    ("O-->H-N", 50, Some(61)),
    ("N-H-->O (2)", 61, Some(72)),
    ("O-->H-N (2)", 72, Some(83)),
    ("TCO", 84, Some(91)),
    ("KAPPA", 91, Some(97)),
    ("ALPHA", 97, Some(103)),
    ("PHI", 103, Some(109)),
    ("PSI", 109, Some(115)),
    ("X-CA", 115, Some(122)),
    ("Y-CA", 122, Some(129)),
    ("Z-CA", 129, None),
];

/// Parse the residue records of a DSSP file into a table whose first column,
/// `seq`, numbers the records from 1.
pub fn parse_dssp(text: &str) -> Result<Table> {
    let mut columns: Vec<Vec<Cell>> = vec![Vec::new(); FIELDS.len()];
    let mut in_records = false;
    for line in text.lines() {
        if line.starts_with(DSSP_HEADER) {
            in_records = true;
            continue;
        }
        if !in_records || line.len() < MIN_RECORD_LEN {
            continue;
        }
        for ((_, start, end), cells) in FIELDS.iter().zip(columns.iter_mut()) {
            let field = match end {
                Some(end) => line.get(*start..*end),
                None => line.get(*start..),
            };
            cells.push(Cell::parse(field.unwrap_or_default().trim()));
        }
    }
    if !in_records {
        return Err(ExtractError::Malformed {
            file: "DSSP".into(),
            reason: "residue header not found".into(),
        });
    }

    let n = columns[0].len();
    let mut table = Table::new();
    table.push_column(Column::from_numbers("seq", (1..=n).map(|i| i as f64)))?;
    for ((name, _, _), cells) in FIELDS.iter().zip(columns) {
        table.push_column(Column::new(*name, cells))?;
    }
    Ok(table)
}

pub fn read_dssp(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    parse_dssp(&text).map_err(|err| match err {
        ExtractError::Malformed { reason, .. } => ExtractError::Malformed {
            file: path.display().to_string(),
            reason,
        },
        other => other,
    })
}

/// Run `<program> -i <pdb> -o <out>`.
pub fn run_dssp(program: &str, pdb: &Path, out: &Path) -> Result<()> {
    let output = Command::new(program)
        .arg("-i")
        .arg(pdb)
        .arg("-o")
        .arg(out)
        .output()
        .map_err(|source| ExtractError::Spawn {
            program: program.to_string(),
            source,
        })?;
    if !output.status.success() {
        return Err(ExtractError::Subprocess {
            program: program.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}
