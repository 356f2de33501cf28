//! Soft-voting ensemble of two boosters and a random forest.
use crate::forest::{RandomForest, RandomForestParams};
use crate::gbdt::{BoosterParams, GradientBooster};
use crate::model::{check_training_input, Classifier};
use crate::Result;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleParams {
    pub xgb: BoosterParams,
    pub lgbm: BoosterParams,
    pub rf: RandomForestParams,
}

impl Default for EnsembleParams {
    fn default() -> Self {
        EnsembleParams {
            xgb: BoosterParams::xgb_member(),
            lgbm: BoosterParams::lgbm_member(),
            rf: RandomForestParams::ensemble_member(),
        }
    }
}

/// Equal-weight average of the members' class-1 probabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VotingEnsemble {
    xgb: GradientBooster,
    lgbm: GradientBooster,
    rf: RandomForest,
}

impl VotingEnsemble {
    /// Configure the members. Nothing is trained here.
    pub fn new(params: &EnsembleParams) -> Self {
        VotingEnsemble {
            xgb: GradientBooster::new("xgb", params.xgb.clone()),
            lgbm: GradientBooster::new("lgbm", params.lgbm.clone()),
            rf: RandomForest::new(params.rf.clone()),
        }
    }

    /// The depth-wise booster; TreeSHAP explanations are computed on it.
    pub fn xgb(&self) -> &GradientBooster {
        &self.xgb
    }

    pub fn lgbm(&self) -> &GradientBooster {
        &self.lgbm
    }

    pub fn rf(&self) -> &RandomForest {
        &self.rf
    }

    pub fn is_fitted(&self) -> bool {
        self.xgb.is_fitted() && self.lgbm.is_fitted() && self.rf.is_fitted()
    }

    pub fn n_features(&self) -> usize {
        self.xgb.n_features()
    }

    /// `[P(0), P(1)]` for every row.
    pub fn predict_proba_pairs(&self, x: &Array2<f64>) -> Result<Vec<[f64; 2]>> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| [1.0 - p, p])
            .collect())
    }

    fn members(&self) -> [&dyn Classifier; 3] {
        [&self.xgb, &self.lgbm, &self.rf]
    }
}

impl Classifier for VotingEnsemble {
    fn name(&self) -> &str {
        "voting"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<()> {
        check_training_input(x, y)?;
        for member in [
            &mut self.xgb as &mut dyn Classifier,
            &mut self.lgbm,
            &mut self.rf,
        ] {
            log::debug!("fitting ensemble member {}", member.name());
            member.fit(x, y)?;
        }
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        let mut sum = vec![0.0; x.nrows()];
        let members = self.members();
        for member in members {
            for (acc, p) in sum.iter_mut().zip(member.predict_proba(x)?) {
                *acc += p;
            }
        }
        let n = members.len() as f64;
        Ok(sum.into_iter().map(|s| s / n).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{blobs, small_ensemble_params};
    use crate::PipelineError;

    #[test]
    fn test_construction_does_not_train() {
        let model = VotingEnsemble::new(&EnsembleParams::default());
        assert!(!model.is_fitted());
        assert_eq!(model.rf().params().n_estimators, 198);
        assert_eq!(model.xgb().params().learning_rate, 0.083);
        let (x, _) = blobs(4);
        assert!(matches!(
            model.predict_proba(&x),
            Err(PipelineError::NotFitted(_))
        ));
    }

    #[test]
    fn test_soft_vote_is_member_average() {
        let (x, y) = blobs(60);
        let mut model = VotingEnsemble::new(&small_ensemble_params());
        model.fit(&x, &y).unwrap();
        let avg = model.predict_proba(&x).unwrap();
        let members: Vec<Vec<f64>> = [
            model.xgb().predict_proba(&x).unwrap(),
            model.lgbm().predict_proba(&x).unwrap(),
            model.rf().predict_proba(&x).unwrap(),
        ]
        .into();
        for (i, p) in avg.iter().enumerate() {
            let expected = (members[0][i] + members[1][i] + members[2][i]) / 3.0;
            approx::assert_relative_eq!(*p, expected, epsilon = 1e-12);
        }
        let labels = model.predict(&x).unwrap();
        for (l, p) in labels.iter().zip(&avg) {
            assert_eq!(*l == 1, *p > 0.5);
        }
        assert_eq!(labels, y);
        for pair in model.predict_proba_pairs(&x).unwrap() {
            approx::assert_relative_eq!(pair[0] + pair[1], 1.0, epsilon = 1e-12);
        }
    }
}
