//! Shared fixtures for unit tests.
use crate::config::{PathsConfig, PipelineConfig};
use protclass_ml::{
    BorutaParams, Classifier, FeatureMask, FeatureMatrix, FeaturePipeline, LabelMode,
    VotingEnsemble,
};
use protclass_test_data::TestFile;
use std::path::Path;

/// A config rooted in `dir` with the fixture tables copied in and ensembles
/// small enough for unit tests.
pub(crate) fn small_config(dir: &Path) -> PipelineConfig {
    let train = TestFile::train_table().copy_to(dir, "train.csv").unwrap();
    let independent_test = TestFile::independent_table()
        .copy_to(dir, "independent_test.csv")
        .unwrap();
    let mut config = PipelineConfig {
        paths: PathsConfig {
            train,
            independent_test,
            report: dir.join("training_report.txt"),
            metrics: dir.join("results/metrics.json"),
            shap_dir: dir.join("results/shap"),
            model: dir.join("models/trained_model.pkl"),
            selector: dir.join("models/feature_selector.pkl"),
        },
        boruta: BorutaParams {
            n_estimators: Some(30),
            max_depth: Some(5),
            max_iter: 20,
            ..Default::default()
        },
        ..Default::default()
    };
    config.ensemble.xgb.n_estimators = 15;
    config.ensemble.xgb.max_depth = Some(4);
    config.ensemble.lgbm.n_estimators = 15;
    config.ensemble.lgbm.min_child_samples = 5;
    config.ensemble.rf.n_estimators = 15;
    config
}

/// An ensemble fit on the training fixture with every feature kept, its
/// pipeline, and the encoded training matrix.
pub(crate) fn fitted_artifacts() -> (VotingEnsemble, FeaturePipeline, FeatureMatrix) {
    let (path, _handle) = TestFile::train_table().create_temp().unwrap();
    let table = protclass_io::read_table(&path).unwrap();
    let (mut pipeline, data) = FeaturePipeline::fit_transform(&table, LabelMode::Present).unwrap();
    pipeline
        .set_mask(FeatureMask::all(pipeline.n_features()))
        .unwrap();
    let x = pipeline.select(&data.matrix).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mut model = VotingEnsemble::new(&small_config(dir.path()).ensemble);
    model.fit(&x.values, &data.labels.unwrap()).unwrap();
    (model, pipeline, x)
}
