//! The training run: preprocessing through persisted artifacts.
use crate::config::PipelineConfig;
use crate::persist::save;
use anyhow::{anyhow, bail, Context};
use protclass_io::read_table;
use protclass_ml::{
    cross_val_mcc, select_features, svm_smote, Classifier, EvaluationMetrics, FeatureMatrix,
    FeaturePipeline, LabelMode, TreeExplainer, VotingEnsemble,
};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

pub const INDEPENDENT_SET_NAME: &str = "Independent Test Set";

/// What a successful run produced.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingSummary {
    pub cv_mcc_mean: f64,
    pub cv_scores: Vec<f64>,
    pub n_synthetic: usize,
    pub selected_features: Vec<String>,
    pub independent: EvaluationMetrics,
    #[serde(skip)]
    pub shap_plots: Vec<PathBuf>,
}

/// Run training and log its duration. A failure is appended to the report as
/// `Exception: <error>` and logged; it is not returned.
pub fn run_training(config: &PipelineConfig) -> Option<TrainingSummary> {
    let start = Instant::now();
    let result = train_model(config);
    let summary = match result {
        Ok(summary) => Some(summary),
        Err(err) => {
            if let Err(write_err) = append_exception(&config.paths.report, &err) {
                log::error!("could not append to {}: {write_err}", config.paths.report.display());
            }
            log::error!("Error: {err:?}");
            None
        }
    };
    log::info!("Total training time: {:.2}s", start.elapsed().as_secs_f64());
    summary
}

pub fn train_model(config: &PipelineConfig) -> anyhow::Result<TrainingSummary> {
    let paths = &config.paths;

    log::info!("Loading and preprocessing training data...");
    let train = read_table(&paths.train)
        .with_context(|| format!("could not load training data {}", paths.train.display()))?;
    let (mut pipeline, train_data) = FeaturePipeline::fit_transform(&train, LabelMode::Present)?;
    let y_train = train_data
        .labels
        .ok_or_else(|| anyhow!("training table has no labels"))?;

    log::info!("Loading and preprocessing independent test data...");
    let independent = read_table(&paths.independent_test).with_context(|| {
        format!(
            "could not load independent test data {}",
            paths.independent_test.display()
        )
    })?;
    let independent_data = pipeline.transform(&independent, LabelMode::Present)?;
    let y_independent = independent_data
        .labels
        .ok_or_else(|| anyhow!("independent test table has no labels"))?;

    log::info!("Applying oversampling...");
    let resampled = svm_smote(&train_data.matrix.values, &y_train, &config.smote)?;
    log::info!(
        "added {} synthetic minority rows ({} total)",
        resampled.n_synthetic,
        resampled.y.len()
    );
    let balanced = FeatureMatrix::new(resampled.x, train_data.matrix.names)?;

    log::info!("Performing feature selection...");
    let selection = select_features(&balanced, &resampled.y, &config.boruta)?;
    pipeline.set_mask(selection.outcome.mask.clone())?;
    let x_train = selection.matrix;
    let x_independent = pipeline.select(&independent_data.matrix)?;
    log::info!("Selected features: {}", x_train.names.join(", "));

    log::info!("Training and evaluating model...");
    let mut report = File::create(&paths.report)
        .with_context(|| format!("could not create report {}", paths.report.display()))?;

    let cv_scores = cross_val_mcc(
        || VotingEnsemble::new(&config.ensemble),
        &x_train.values,
        &resampled.y,
        config.cv_folds,
    )?;
    let cv_mcc_mean = cv_scores.iter().sum::<f64>() / cv_scores.len() as f64;
    writeln!(report, "Cross-validation MCC: {cv_mcc_mean:.4}")?;
    writeln!(report, "Scores: {}", format_scores(&cv_scores))?;
    log::info!("Cross-validation MCC: {cv_mcc_mean:.4}");
    if let Some(min) = config.cv_min_mcc {
        if cv_mcc_mean < min {
            bail!("cross-validation MCC {cv_mcc_mean:.4} is below the configured minimum {min}");
        }
    }

    let mut model = VotingEnsemble::new(&config.ensemble);
    model.fit(&x_train.values, &resampled.y)?;

    let probabilities = model.predict_proba(&x_independent.values)?;
    let predictions = model.predict(&x_independent.values)?;
    let metrics = EvaluationMetrics::compute(&y_independent, &predictions, &probabilities)?;
    let section = metrics.report_section(INDEPENDENT_SET_NAME, &y_independent, &predictions)?;
    report.write_all(section.as_bytes())?;
    for (name, value) in metrics.named() {
        log::info!("{INDEPENDENT_SET_NAME} {name}: {value:.4}");
    }

    log::info!("Analyzing SHAP values...");
    let explainer = TreeExplainer::new(model.xgb())?;
    let shap = explainer.shap_values(&x_train.values, &x_train.names)?;
    let shap_plots = protclass_plot::save_shap_plots(&shap, &paths.shap_dir, config.shap_max_display)?;

    save(&paths.model, &model)?;
    save(&paths.selector, &pipeline)?;
    log::info!(
        "Model and feature selector saved to {} and {}",
        paths.model.display(),
        paths.selector.display()
    );

    let summary = TrainingSummary {
        cv_mcc_mean,
        cv_scores,
        n_synthetic: resampled.n_synthetic,
        selected_features: x_train.names,
        independent: metrics,
        shap_plots,
    };
    write_metrics(&paths.metrics, &summary)?;
    Ok(summary)
}

// Helper Functions ----------------------------------------------------------

/// `[0.81234567 0.79012345 ...]`
fn format_scores(scores: &[f64]) -> String {
    let inner: Vec<String> = scores.iter().map(|s| format!("{s:.8}")).collect();
    format!("[{}]", inner.join(" "))
}

fn write_metrics(path: &Path, summary: &TrainingSummary) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)
        .with_context(|| format!("could not create metrics file {}", path.display()))?;
    serde_json::to_writer_pretty(file, summary)?;
    Ok(())
}

fn append_exception(report: &Path, err: &anyhow::Error) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(report)?;
    writeln!(file, "Exception: {err:?}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::small_config;

    #[test]
    fn test_format_scores() {
        assert_eq!(format_scores(&[0.5, 0.25]), "[0.50000000 0.25000000]");
    }

    #[test]
    fn test_training_run_writes_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let config = small_config(dir.path());
        let summary = run_training(&config).unwrap();

        assert_eq!(summary.cv_scores.len(), 5);
        assert!(!summary.selected_features.is_empty());
        assert!(summary.n_synthetic > 0);
        assert_eq!(summary.shap_plots.len(), 3);
        assert!(config.paths.model.exists());
        assert!(config.paths.selector.exists());

        let report = std::fs::read_to_string(&config.paths.report).unwrap();
        assert!(report.starts_with("Cross-validation MCC: "));
        assert!(report.contains("Scores: ["));
        assert!(report.contains("===== Independent Test Set Evaluation ====="));
        assert!(report.contains("Specificity: "));
        assert!(report.contains("Classification Report:"));

        let metrics: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&config.paths.metrics).unwrap())
                .unwrap();
        assert!(metrics["independent"]["mcc"].is_number());
        assert_eq!(metrics["cv_scores"].as_array().unwrap().len(), 5);
    }

    #[test]
    fn test_failure_is_appended_to_report() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = small_config(dir.path());
        config.paths.independent_test = dir.path().join("missing.csv");
        std::fs::write(&config.paths.report, "previous run\n").unwrap();

        assert!(run_training(&config).is_none());
        let report = std::fs::read_to_string(&config.paths.report).unwrap();
        assert!(report.starts_with("previous run\n"));
        assert!(report.contains("Exception: could not load independent test data"));
        assert!(!config.paths.model.exists());
    }

    #[test]
    fn test_cv_gate_aborts_training() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = small_config(dir.path());
        // above any reachable MCC
        config.cv_min_mcc = Some(1.5);
        let err = train_model(&config).unwrap_err();
        assert!(err.to_string().contains("below the configured minimum"));
        assert!(!config.paths.model.exists());
        let report = std::fs::read_to_string(&config.paths.report).unwrap();
        assert!(report.starts_with("Cross-validation MCC: "));
    }
}
