//! Model artifacts in Python pickle format.
use crate::error::ArtifactError;
use protclass_ml::{FeaturePipeline, VotingEnsemble};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_pickle::{DeOptions, SerOptions};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Pickle `value` to `path`, creating parent directories.
pub fn save<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<(), ArtifactError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_pickle::to_writer(&mut writer, value, SerOptions::new())?;
    writer.flush()?;
    Ok(())
}

pub fn load<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ArtifactError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ArtifactError::Missing(path.to_path_buf()));
    }
    let reader = BufReader::new(File::open(path)?);
    serde_pickle::from_reader(reader, DeOptions::new()).map_err(|source| ArtifactError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// The trained ensemble and its fitted feature pipeline.
pub fn load_artifacts(
    model: impl AsRef<Path>,
    selector: impl AsRef<Path>,
) -> Result<(VotingEnsemble, FeaturePipeline), ArtifactError> {
    let ensemble: VotingEnsemble = load(model)?;
    let pipeline: FeaturePipeline = load(selector)?;
    pipeline.check_version()?;
    if pipeline
        .mask()
        .is_some_and(|m| m.n_selected() != ensemble.n_features())
    {
        return Err(protclass_ml::PipelineError::FeatureCountMismatch {
            expected: ensemble.n_features(),
            found: pipeline.mask().map(|m| m.n_selected()).unwrap_or_default(),
        }
        .into());
    }
    Ok((ensemble, pipeline))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fitted_artifacts;
    use protclass_ml::Classifier;

    #[test]
    fn test_reloaded_model_predicts_identically() {
        let dir = tempfile::tempdir().unwrap();
        let (model, pipeline, x) = fitted_artifacts();
        let model_path = dir.path().join("models/trained_model.pkl");
        let selector_path = dir.path().join("models/feature_selector.pkl");
        save(&model_path, &model).unwrap();
        save(&selector_path, &pipeline).unwrap();

        let (reloaded, reloaded_pipeline) = load_artifacts(&model_path, &selector_path).unwrap();
        assert_eq!(reloaded_pipeline, pipeline);
        let before = model.predict_proba(&x.values).unwrap();
        let after = reloaded.predict_proba(&x.values).unwrap();
        assert_eq!(
            before.iter().map(|p| p.to_bits()).collect::<Vec<_>>(),
            after.iter().map(|p| p.to_bits()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let result: Result<VotingEnsemble, _> = load(dir.path().join("nope.pkl"));
        assert!(matches!(result, Err(ArtifactError::Missing(_))));
    }
}
