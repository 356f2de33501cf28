//! Table → feature matrix.
//!
//! A [`FeaturePipeline`] is fit once on the training table and then reused for
//! every table that must line up with it: the independent test set during
//! training and arbitrary inputs at prediction time. It records
//!
//! - the one-hot categories derived from the first letter of `STRUCTURE`,
//! - the numeric feature columns, in byte-lexicographic order,
//! - per-column imputation means and min/max scaling bounds,
//! - the feature mask chosen by Boruta, once selection has run.
use crate::{FeatureMask, FeatureMatrix, PipelineError, Result};
use ndarray::Array2;
use protclass_io::{Cell, Column, Table};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const STRUCTURE_COLUMN: &str = "STRUCTURE";
pub const LABEL_COLUMN: &str = "label";
pub const OTHER_CATEGORY: &str = "Other";

/// Columns that never become numeric features.
pub const NON_FEATURE_COLUMNS: [&str; 9] = [
    "ProteinID",
    "label",
    "FirstLetter",
    "STRUCTURE",
    "x",
    "y",
    "z",
    "ResidueInfo",
    "Residue Number",
];

/// Bumped whenever the serialized layout of [`FeaturePipeline`] changes.
pub const PIPELINE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelMode {
    Present,
    Absent,
}

/// Output of [`FeaturePipeline::transform`].
#[derive(Debug, Clone)]
pub struct Preprocessed {
    pub matrix: FeatureMatrix,
    pub labels: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturePipeline {
    version: u32,
    categories: Vec<String>,
    numeric_columns: Vec<String>,
    means: Vec<f64>,
    mins: Vec<f64>,
    maxs: Vec<f64>,
    mask: Option<FeatureMask>,
}

impl FeaturePipeline {
    /// Learn categories, column order and scaling statistics from `table`.
    pub fn fit(table: &Table) -> Result<Self> {
        let structure = require(table, STRUCTURE_COLUMN)?;
        let categories: BTreeSet<String> =
            structure.cells().iter().map(structure_bucket).collect();

        let mut numeric_columns: Vec<String> = table
            .column_names()
            .into_iter()
            .filter(|name| !NON_FEATURE_COLUMNS.contains(name))
            .map(str::to_string)
            .collect();
        numeric_columns.sort();

        let mut means = Vec::with_capacity(numeric_columns.len());
        let mut mins = Vec::with_capacity(numeric_columns.len());
        let mut maxs = Vec::with_capacity(numeric_columns.len());
        for name in &numeric_columns {
            let values = numeric_values(require(table, name)?)?;
            let observed: Vec<f64> = values.iter().flatten().copied().collect();
            if observed.is_empty() {
                return Err(PipelineError::EmptyColumn(name.clone()));
            }
            let mean = observed.iter().sum::<f64>() / observed.len() as f64;
            let (lo, hi) = values
                .iter()
                .map(|v| v.unwrap_or(mean))
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                    (lo.min(v), hi.max(v))
                });
            means.push(mean);
            mins.push(lo);
            maxs.push(hi);
        }

        log::debug!(
            "fitted feature pipeline: {} categories, {} numeric columns",
            categories.len(),
            numeric_columns.len()
        );
        Ok(FeaturePipeline {
            version: PIPELINE_FORMAT_VERSION,
            categories: categories.into_iter().collect(),
            numeric_columns,
            means,
            mins,
            maxs,
            mask: None,
        })
    }

    pub fn fit_transform(table: &Table, labels: LabelMode) -> Result<(Self, Preprocessed)> {
        let pipeline = FeaturePipeline::fit(table)?;
        let out = pipeline.transform(table, labels)?;
        Ok((pipeline, out))
    }

    /// Encode `table` with the fitted statistics. The mask is not applied here;
    /// see [`FeaturePipeline::select`].
    pub fn transform(&self, table: &Table, labels: LabelMode) -> Result<Preprocessed> {
        let n_rows = table.n_rows();
        let n_cat = self.categories.len();
        let mut values = Array2::<f64>::zeros((n_rows, n_cat + self.numeric_columns.len()));

        let structure = require(table, STRUCTURE_COLUMN)?;
        let mut unseen = 0usize;
        for (row, cell) in structure.cells().iter().enumerate() {
            let bucket = structure_bucket(cell);
            match self.categories.iter().position(|c| *c == bucket) {
                Some(col) => values[[row, col]] = 1.0,
                None => unseen += 1,
            }
        }
        if unseen > 0 {
            log::warn!("{unseen} rows have a structure class unseen during fitting; encoded as all zeros");
        }

        for (j, name) in self.numeric_columns.iter().enumerate() {
            let column = numeric_values(require(table, name)?)?;
            let range = self.maxs[j] - self.mins[j];
            let scale = if range == 0.0 { 1.0 } else { range };
            for (row, v) in column.into_iter().enumerate() {
                let v = v.unwrap_or(self.means[j]);
                values[[row, n_cat + j]] = (v - self.mins[j]) / scale;
            }
        }

        let labels = match labels {
            LabelMode::Present => Some(read_labels(require(table, LABEL_COLUMN)?)?),
            LabelMode::Absent => None,
        };
        Ok(Preprocessed {
            matrix: FeatureMatrix::new(values, self.feature_names())?,
            labels,
        })
    }

    /// Category names followed by numeric column names, before masking.
    pub fn feature_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .chain(self.numeric_columns.iter())
            .cloned()
            .collect()
    }

    pub fn n_features(&self) -> usize {
        self.categories.len() + self.numeric_columns.len()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric_columns
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn mask(&self) -> Option<&FeatureMask> {
        self.mask.as_ref()
    }

    /// Attach the selection mask. Its length must match the encoded width.
    pub fn set_mask(&mut self, mask: FeatureMask) -> Result<()> {
        if mask.len() != self.n_features() {
            return Err(PipelineError::MaskMismatch {
                expected: self.n_features(),
                found: mask.len(),
            });
        }
        self.mask = Some(mask);
        Ok(())
    }

    /// Apply the selection mask if one is attached.
    pub fn select(&self, matrix: &FeatureMatrix) -> Result<FeatureMatrix> {
        match &self.mask {
            Some(mask) => matrix.select(mask),
            None => Ok(matrix.clone()),
        }
    }

    pub fn check_version(&self) -> Result<()> {
        if self.version != PIPELINE_FORMAT_VERSION {
            return Err(PipelineError::VersionMismatch {
                expected: PIPELINE_FORMAT_VERSION,
                found: self.version,
            });
        }
        Ok(())
    }
}

// Helper Functions ----------------------------------------------------------

fn require<'a>(table: &'a Table, name: &str) -> Result<&'a Column> {
    table
        .column(name)
        .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
}

/// First character of the structure code, or `Other` when it is not an ASCII
/// letter.
pub fn structure_bucket(cell: &Cell) -> String {
    let text = cell.to_string();
    match text.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => c.to_string(),
        _ => OTHER_CATEGORY.to_string(),
    }
}

/// Read a column as optional floats, averaging comma-separated cells.
fn numeric_values(column: &Column) -> Result<Vec<Option<f64>>> {
    column
        .cells()
        .iter()
        .enumerate()
        .map(|(row, cell)| {
            let value = match cell {
                Cell::Empty => return Ok(None),
                Cell::Number(v) => *v,
                Cell::Text(s) => comma_mean(column, row, s)?,
            };
            if !value.is_finite() {
                return Err(PipelineError::NonFiniteValue {
                    column: column.name().to_string(),
                    row,
                    value,
                });
            }
            Ok(Some(value))
        })
        .collect()
}

/// Mean of the components of a comma-separated cell.
fn comma_mean(column: &Column, row: usize, s: &str) -> Result<f64> {
    let bad = || PipelineError::NonNumericCell {
        column: column.name().to_string(),
        row,
        value: s.to_string(),
    };
    if !s.contains(',') {
        return Err(bad());
    }
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f64>().map_err(|_| bad()))
        .collect::<Result<Vec<f64>>>()?;
    Ok(parts.iter().sum::<f64>() / parts.len() as f64)
}

fn read_labels(column: &Column) -> Result<Vec<u8>> {
    column
        .cells()
        .iter()
        .enumerate()
        .map(|(row, cell)| match cell {
            Cell::Empty => Ok(0),
            Cell::Number(v) if *v == 0.0 => Ok(0),
            Cell::Number(v) if *v == 1.0 => Ok(1),
            other => Err(PipelineError::InvalidLabel {
                row,
                value: other.to_string(),
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_frame() -> Table {
        let structure = ["H", "H", "E", "H", "C", "E", "E", "H", "C", "H"];
        let labels = [0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0];
        let mut columns = vec![
            Column::new(
                "ProteinID",
                (0..10).map(|_| Cell::text("1ABC_A")).collect(),
            ),
            Column::new(
                STRUCTURE_COLUMN,
                structure.iter().map(|s| Cell::text(*s)).collect(),
            ),
            Column::from_numbers("x", (0..10).map(f64::from)),
            Column::from_numbers("y", (0..10).map(f64::from)),
            Column::from_numbers("z", (0..10).map(f64::from)),
            Column::from_numbers(LABEL_COLUMN, labels),
        ];
        for (k, name) in ["ACC", "PHI", "PSI", "NTE5", "msf"].iter().enumerate() {
            columns.push(Column::from_numbers(
                *name,
                (0..10).map(|i| ((i * (k + 3)) % 7) as f64 - 2.0),
            ));
        }
        Table::from_columns(columns).unwrap()
    }

    #[test]
    fn test_toy_frame() {
        let table = toy_frame();
        let (pipeline, out) = FeaturePipeline::fit_transform(&table, LabelMode::Present).unwrap();
        assert_eq!(pipeline.categories(), ["C", "E", "H"]);
        assert_eq!(pipeline.numeric_columns(), ["ACC", "NTE5", "PHI", "PSI", "msf"]);
        assert_eq!(out.matrix.n_features(), 8);
        assert_eq!(out.matrix.names[..3], ["C", "E", "H"]);

        // exactly one category per row
        for row in out.matrix.values.rows() {
            let hot: f64 = row.iter().take(3).sum();
            assert_eq!(hot, 1.0);
        }
        for v in out.matrix.values.iter() {
            assert!((0.0..=1.0).contains(v));
        }
        assert_eq!(
            out.labels.unwrap(),
            vec![0, 0, 1, 0, 1, 1, 0, 0, 1, 0]
        );
    }

    #[test]
    fn test_comma_cells_and_imputation() {
        let table = Table::from_columns(vec![
            Column::new(
                STRUCTURE_COLUMN,
                vec![Cell::text("H"), Cell::text("-"), Cell::Empty],
            ),
            Column::new(
                "PSSM",
                vec![Cell::text("1.0,3.0"), Cell::Number(6.0), Cell::Empty],
            ),
        ])
        .unwrap();
        let (pipeline, out) = FeaturePipeline::fit_transform(&table, LabelMode::Absent).unwrap();
        assert_eq!(pipeline.categories(), ["H", "Other"]);
        assert!(out.labels.is_none());
        // 2.0, 6.0, mean 4.0 -> scaled 0, 1, 0.5
        let pssm: Vec<f64> = out.matrix.values.column(2).to_vec();
        assert_eq!(pssm, vec![0.0, 1.0, 0.5]);
    }

    #[test]
    fn test_constant_column_scales_to_zero() {
        let table = Table::from_columns(vec![
            Column::new(STRUCTURE_COLUMN, vec![Cell::text("H"), Cell::text("E")]),
            Column::from_numbers("flat", [3.0, 3.0]),
        ])
        .unwrap();
        let (_, out) = FeaturePipeline::fit_transform(&table, LabelMode::Absent).unwrap();
        assert_eq!(out.matrix.values.column(2).to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_errors() {
        let no_structure =
            Table::from_columns(vec![Column::from_numbers("a", [1.0])]).unwrap();
        assert!(matches!(
            FeaturePipeline::fit(&no_structure),
            Err(PipelineError::MissingColumn(c)) if c == STRUCTURE_COLUMN
        ));

        let empty = Table::from_columns(vec![
            Column::new(STRUCTURE_COLUMN, vec![Cell::text("H")]),
            Column::new("a", vec![Cell::Empty]),
        ])
        .unwrap();
        assert!(matches!(
            FeaturePipeline::fit(&empty),
            Err(PipelineError::EmptyColumn(_))
        ));

        let text = Table::from_columns(vec![
            Column::new(STRUCTURE_COLUMN, vec![Cell::text("H")]),
            Column::new("a", vec![Cell::text("1.0,abc")]),
        ])
        .unwrap();
        assert!(matches!(
            FeaturePipeline::fit(&text),
            Err(PipelineError::NonNumericCell { .. })
        ));

        let infinite = Table::from_columns(vec![
            Column::new(
                STRUCTURE_COLUMN,
                vec![Cell::text("H"), Cell::text("E"), Cell::text("C")],
            ),
            Column::new(
                "ACC",
                vec![Cell::parse("1.0"), Cell::parse("inf"), Cell::parse("3.0")],
            ),
        ])
        .unwrap();
        assert!(matches!(
            FeaturePipeline::fit_transform(&infinite, LabelMode::Absent),
            Err(PipelineError::NonFiniteValue { row: 1, .. })
        ));
        let infinite_component = Table::from_columns(vec![
            Column::new(STRUCTURE_COLUMN, vec![Cell::text("H")]),
            Column::new("a", vec![Cell::text("1.0,-inf")]),
        ])
        .unwrap();
        assert!(matches!(
            FeaturePipeline::fit(&infinite_component),
            Err(PipelineError::NonFiniteValue { row: 0, .. })
        ));

        let bad_label = Table::from_columns(vec![
            Column::new(STRUCTURE_COLUMN, vec![Cell::text("H")]),
            Column::from_numbers("a", [1.0]),
            Column::from_numbers(LABEL_COLUMN, [2.0]),
        ])
        .unwrap();
        assert!(matches!(
            FeaturePipeline::fit_transform(&bad_label, LabelMode::Present),
            Err(PipelineError::InvalidLabel { row: 0, .. })
        ));
    }

    #[test]
    fn test_transform_reuses_training_statistics() {
        let train = toy_frame();
        let pipeline = FeaturePipeline::fit(&train).unwrap();

        let mut test = train.filter_rows(|i| i < 2);
        test.set_column(Column::new(
            STRUCTURE_COLUMN,
            vec![Cell::text("G"), Cell::text("H")],
        ))
        .unwrap();
        let out = pipeline.transform(&test, LabelMode::Absent).unwrap();
        assert_eq!(out.matrix.names, pipeline.feature_names());
        // unseen "G" encodes as all zeros
        assert_eq!(out.matrix.values.row(0).iter().take(3).sum::<f64>(), 0.0);
        assert_eq!(out.matrix.values[[1, 2]], 1.0);

        let trimmed = Table::from_columns(
            test.columns()
                .iter()
                .filter(|c| c.name() != "msf")
                .cloned()
                .collect(),
        )
        .unwrap();
        assert!(matches!(
            pipeline.transform(&trimmed, LabelMode::Absent),
            Err(PipelineError::MissingColumn(c)) if c == "msf"
        ));
    }

    #[test]
    fn test_mask_attachment() {
        let mut pipeline = FeaturePipeline::fit(&toy_frame()).unwrap();
        assert!(matches!(
            pipeline.set_mask(FeatureMask::all(3)),
            Err(PipelineError::MaskMismatch { .. })
        ));
        let mut support = vec![false; 8];
        support[3] = true;
        pipeline.set_mask(FeatureMask::new(support)).unwrap();
        let out = pipeline.transform(&toy_frame(), LabelMode::Present).unwrap();
        let selected = pipeline.select(&out.matrix).unwrap();
        assert_eq!(selected.names, vec!["ACC"]);
        assert!(pipeline.check_version().is_ok());
    }
}
