//! Scoring new residue tables with persisted artifacts.
use crate::persist::load_artifacts;
use anyhow::Context;
use protclass_io::{read_table, write_table, Cell, Column, Table};
use protclass_ml::LabelMode;
use std::path::{Path, PathBuf};

pub const PREDICTED_LABEL: &str = "Predicted_Label";
pub const PROBABILITY_CLASS_0: &str = "Prediction_Probability_Class_0";
pub const PROBABILITY_CLASS_1: &str = "Prediction_Probability_Class_1";

/// `<input without extension>_predictions.xlsx`.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.with_extension("");
    PathBuf::from(format!("{}_predictions.xlsx", stem.display()))
}

/// Predict every row of `input` and write the scored copy.
///
/// Returns the scored table, or `None` after logging the error when any step
/// fails.
pub fn predict_single_file(
    model: &Path,
    selector: &Path,
    input: &Path,
    output: Option<&Path>,
) -> Option<Table> {
    match predict_file(model, selector, input, output) {
        Ok(table) => Some(table),
        Err(err) => {
            log::error!("Error in single file prediction: {err:#}");
            None
        }
    }
}

fn predict_file(
    model_path: &Path,
    selector_path: &Path,
    input: &Path,
    output: Option<&Path>,
) -> anyhow::Result<Table> {
    log::info!("Loading input file: {}", input.display());
    let table = read_table(input).with_context(|| format!("could not load {}", input.display()))?;
    log::info!("Loaded {} samples from {}", table.n_rows(), input.display());

    let (model, pipeline) = load_artifacts(model_path, selector_path)?;
    log::info!("Loaded trained model and feature selector");

    let data = pipeline.transform(&table, LabelMode::Absent)?;
    let x = pipeline.select(&data.matrix)?;
    let probabilities = model.predict_proba_pairs(&x.values)?;
    let labels: Vec<u8> = probabilities.iter().map(|p| u8::from(p[1] > 0.5)).collect();

    let mut scored = table.clone();
    scored.set_column(Column::from_numbers(
        PREDICTED_LABEL,
        labels.iter().map(|&l| f64::from(l)),
    ))?;
    scored.set_column(Column::from_numbers(
        PROBABILITY_CLASS_0,
        probabilities.iter().map(|p| p[0]),
    ))?;
    scored.set_column(Column::from_numbers(
        PROBABILITY_CLASS_1,
        probabilities.iter().map(|p| p[1]),
    ))?;

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(input));
    write_table(&output, &scored)
        .with_context(|| format!("could not write predictions to {}", output.display()))?;
    log::info!("Predictions saved to: {}", output.display());

    log_summary(&labels);
    Ok(scored)
}

fn log_summary(labels: &[u8]) {
    let total = labels.len();
    let positive = labels.iter().filter(|&&l| l == 1).count();
    log::info!("Prediction Summary:");
    log::info!("Total samples: {total}");
    log::info!("Predicted positive: {positive}");
    log::info!("Predicted negative: {}", total - positive);
    if total > 0 {
        log::info!("Positive rate: {:.2}%", 100.0 * positive as f64 / total as f64);
    }
}

/// Read the label column written by [`predict_single_file`].
pub fn predicted_labels(table: &Table) -> Option<Vec<u8>> {
    table
        .column(PREDICTED_LABEL)?
        .cells()
        .iter()
        .map(|c| match c {
            Cell::Number(v) => Some(*v as u8),
            _ => None,
        })
        .collect()
}
