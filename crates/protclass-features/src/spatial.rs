//! Neighbour-averaged residue features.
//!
//! Every residue gets, for each configured feature, the mean value over the
//! `n` residues of the same protein closest to it in space.
use crate::{ExtractError, Result};
use ndarray::Array2;
use protclass_io::{Cell, Column, Table};
use protclass_ml::NearestNeighbors;
use std::collections::BTreeMap;

pub const DEFAULT_NEIGHBOURS: usize = 7;
pub const PROTEIN_COLUMN: &str = "ProteinID";
pub const COORDINATE_COLUMNS: [&str; 3] = ["x", "y", "z"];

#[rustfmt::skip]
pub const DEFAULT_FEATURES: [&str; 13] = [
    "NTE5", "PRScol", "PRSlin", "ISPOCKET", "Entropy", "Conservation Score",
    "FrstIndex", "ACC", "NTECR_AVE", "NTECR_MAX", "NTECR_MIN", "NTECR_MID", "msf",
];

/// Name of the averaged column for `feature`.
pub fn space_column(feature: &str, n: usize) -> String {
    format!("space_{feature}_{n}nn")
}

/// Numeric view of a cell: numbers as is, text parsed when possible.
fn numeric(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(v) => Some(*v),
        Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        Cell::Empty => None,
    }
}

/// Coerce a column to numbers and fill the gaps with the column mean. A
/// column with no numeric value stays empty.
pub fn mean_impute(column: &Column) -> Vec<Option<f64>> {
    let values: Vec<Option<f64>> = column.cells().iter().map(numeric).collect();
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return values;
    }
    let mean = present.iter().sum::<f64>() / present.len() as f64;
    values.into_iter().map(|v| Some(v.unwrap_or(mean))).collect()
}

/// Replace each feature column with its imputed numeric version and append
/// `space_<feature>_<n>nn` columns.
pub fn add_spatial_features(table: &Table, features: &[&str], n: usize) -> Result<Table> {
    let coords = coordinates(table)?;
    let proteins: Vec<String> = table
        .column(PROTEIN_COLUMN)
        .ok_or_else(|| ExtractError::MissingColumn(PROTEIN_COLUMN.into()))?
        .cells()
        .iter()
        .map(Cell::to_string)
        .collect();

    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (row, protein) in proteins.iter().enumerate() {
        groups.entry(protein.as_str()).or_default().push(row);
    }
    let neighbours = neighbour_rows(&coords, &groups, n);

    let mut out = table.clone();
    for &feature in features {
        let Some(column) = table.column(feature) else {
            log::warn!("column `{feature}` not found, skipping");
            continue;
        };
        let values = mean_impute(column);
        let averaged: Vec<Cell> = neighbours
            .iter()
            .map(|rows| {
                let picked: Vec<f64> = rows.iter().filter_map(|&r| values[r]).collect();
                if picked.is_empty() {
                    Cell::Empty
                } else {
                    Cell::Number(picked.iter().sum::<f64>() / picked.len() as f64)
                }
            })
            .collect();
        out.set_column(Column::new(
            feature,
            values.into_iter().map(Cell::from).collect(),
        ))?;
        out.set_column(Column::new(space_column(feature, n), averaged))?;
    }
    Ok(out)
}

// Helper Functions ----------------------------------------------------------

fn coordinates(table: &Table) -> Result<Array2<f64>> {
    let mut coords = Array2::zeros((table.n_rows(), 3));
    for (j, name) in COORDINATE_COLUMNS.iter().enumerate() {
        let column = table
            .column(name)
            .ok_or_else(|| ExtractError::MissingColumn(name.to_string()))?;
        for (row, cell) in column.cells().iter().enumerate() {
            coords[[row, j]] = numeric(cell).ok_or_else(|| ExtractError::InvalidCoordinate {
                column: name.to_string(),
                row,
            })?;
        }
    }
    Ok(coords)
}

/// For every row, the rows of the same protein nearest to it, itself
/// excluded.
fn neighbour_rows(
    coords: &Array2<f64>,
    groups: &BTreeMap<&str, Vec<usize>>,
    n: usize,
) -> Vec<Vec<usize>> {
    let mut neighbours = vec![Vec::new(); coords.nrows()];
    for rows in groups.values() {
        let local = coords.select(ndarray::Axis(0), rows);
        let index = NearestNeighbors::new(local.view());
        for (k, found) in index.query_rows(local.view(), n + 1).into_iter().enumerate() {
            neighbours[rows[k]] = found
                .into_iter()
                .filter(|&j| j != k)
                .take(n)
                .map(|j| rows[j])
                .collect();
        }
    }
    neighbours
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Two proteins: five residues on a line and a lone residue.
    fn toy_table() -> Table {
        let protein = ["P1", "P1", "P1", "P1", "P1", "P2"];
        Table::from_columns(vec![
            Column::new(PROTEIN_COLUMN, protein.iter().map(|&p| Cell::from(p)).collect()),
            Column::from_numbers("x", [0.0, 1.0, 2.0, 3.0, 10.0, 0.0]),
            Column::from_numbers("y", [0.0; 6]),
            Column::from_numbers("z", [0.0; 6]),
            Column::new(
                "ACC",
                vec![
                    Cell::Number(1.0),
                    Cell::Number(2.0),
                    Cell::Empty,
                    Cell::text("4"),
                    Cell::text("n/a"),
                    Cell::Number(5.0),
                ],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_mean_impute() {
        let table = toy_table();
        let values = mean_impute(table.column("ACC").unwrap());
        // mean of 1, 2, 4, 5
        assert_eq!(values[2], Some(3.0));
        assert_eq!(values[3], Some(4.0));
        assert_eq!(values[4], Some(3.0));
    }

    #[test]
    fn test_neighbour_average_within_protein() {
        let out = add_spatial_features(&toy_table(), &["ACC", "msf"], 2).unwrap();
        let name = space_column("ACC", 2);
        assert_eq!(name, "space_ACC_2nn");
        let cells = out.column(&name).unwrap().cells();
        // row 0 -> rows 1, 2: (2 + 3) / 2
        assert_relative_eq!(cells[0].as_f64().unwrap(), 2.5);
        // row 1 -> rows 0, 2 at equal distance
        assert_relative_eq!(cells[1].as_f64().unwrap(), 2.0);
        // row 4 -> rows 3, 2
        assert_relative_eq!(cells[4].as_f64().unwrap(), 3.5);
        // a protein with one residue has no neighbours
        assert!(cells[5].is_empty());
        assert_eq!(out.column("ACC").unwrap().cells()[2], Cell::Number(3.0));
        assert!(!out.has_column("space_msf_2nn"));
    }

    #[test]
    fn test_invalid_coordinate() {
        let mut table = toy_table();
        table
            .set_column(Column::new("z", vec![Cell::text("?"); 6]))
            .unwrap();
        assert!(matches!(
            add_spatial_features(&table, &DEFAULT_FEATURES, DEFAULT_NEIGHBOURS),
            Err(ExtractError::InvalidCoordinate { row: 0, .. })
        ));
    }
}
