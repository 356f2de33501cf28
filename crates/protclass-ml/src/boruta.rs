//! Boruta all-relevant feature selection (Kursa & Rudnicki, 2010).
//!
//! Every round the still-undecided and accepted features are copied into
//! shuffled "shadow" columns, a random forest is fit on real + shadow columns,
//! and each real feature scores a hit when it beats the best shadow. Hits are
//! tested against a fair coin: a significantly high count confirms a feature,
//! a significantly low count rejects it.
use crate::forest::{RandomForest, RandomForestParams};
use crate::matrix::{FeatureMask, FeatureMatrix};
use crate::model::{check_training_input, derive_seed, Classifier};
use crate::stats::{binom_cdf, binom_sf, fdr_bh, nan_median, percentile};
use crate::{PipelineError, Result};
use ndarray::{Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BorutaParams {
    /// Trees per forest; `None` sizes the forest from the number of active
    /// features each round.
    pub n_estimators: Option<usize>,
    pub max_depth: Option<usize>,
    /// Percentile of shadow importances a feature has to beat.
    pub perc: f64,
    pub alpha: f64,
    /// Bonferroni correction on top of the FDR test.
    pub two_step: bool,
    pub max_iter: usize,
    /// Keep tentative features that outperform the median shadow maximum.
    pub include_tentative: bool,
    pub seed: u64,
}

impl Default for BorutaParams {
    fn default() -> Self {
        BorutaParams {
            n_estimators: None,
            max_depth: None,
            perc: 100.0,
            alpha: 0.05,
            two_step: true,
            max_iter: 100,
            include_tentative: false,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Tentative,
    Confirmed,
    Rejected,
}

#[derive(Debug, Clone)]
pub struct BorutaOutcome {
    pub decisions: Vec<Decision>,
    /// Tentative features whose median importance beats the median shadow
    /// maximum.
    pub weak: Vec<bool>,
    pub hits: Vec<u64>,
    pub iterations: usize,
    pub mask: FeatureMask,
}

/// Reduced matrix, selected names and the selection details.
#[derive(Debug, Clone)]
pub struct Selection {
    pub matrix: FeatureMatrix,
    pub outcome: BorutaOutcome,
}

pub fn select_features(
    matrix: &FeatureMatrix,
    y: &[u8],
    params: &BorutaParams,
) -> Result<Selection> {
    let outcome = boruta(&matrix.values, y, params)?;
    if outcome.mask.n_selected() == 0 {
        return Err(PipelineError::NoFeaturesSelected);
    }
    let selected = matrix.select(&outcome.mask)?;
    log::info!(
        "Boruta kept {} of {} features after {} iterations",
        selected.n_features(),
        matrix.n_features(),
        outcome.iterations
    );
    Ok(Selection {
        matrix: selected,
        outcome,
    })
}

pub fn boruta(x: &Array2<f64>, y: &[u8], params: &BorutaParams) -> Result<BorutaOutcome> {
    check_training_input(x, y)?;
    if params.max_iter < 2 {
        return Err(PipelineError::InvalidParameter(
            "Boruta needs max_iter of at least 2".into(),
        ));
    }
    let p = x.ncols();
    let mut decisions = vec![Decision::Tentative; p];
    let mut hits = vec![0u64; p];
    let mut imp_history: Vec<Vec<f64>> = Vec::new();
    let mut shadow_max_history: Vec<f64> = Vec::new();
    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);

    let mut iteration = 1usize;
    while decisions.contains(&Decision::Tentative) && iteration < params.max_iter {
        let active: Vec<usize> = (0..p)
            .filter(|&i| decisions[i] != Decision::Rejected)
            .collect();
        let n_trees = params
            .n_estimators
            .unwrap_or_else(|| auto_tree_count(active.len(), params.max_depth));

        let (real_imp, shadow_imp) =
            importances(x, y, &active, n_trees, params, iteration, &mut rng)?;
        let shadow_max = percentile(&shadow_imp, params.perc);
        shadow_max_history.push(shadow_max);

        let mut round = vec![f64::NAN; p];
        for (&feature, &imp) in active.iter().zip(&real_imp) {
            round[feature] = imp;
            if imp > shadow_max {
                hits[feature] += 1;
            }
        }
        imp_history.push(round);

        assign_hits(&mut decisions, &hits, iteration as u64, params);
        log::debug!(
            "Boruta iteration {iteration}: {} confirmed, {} tentative, {} rejected",
            count(&decisions, Decision::Confirmed),
            count(&decisions, Decision::Tentative),
            count(&decisions, Decision::Rejected)
        );
        iteration += 1;
    }

    let shadow_median = nan_median(&shadow_max_history);
    let weak: Vec<bool> = (0..p)
        .map(|f| {
            decisions[f] == Decision::Tentative && {
                let history: Vec<f64> = imp_history.iter().map(|r| r[f]).collect();
                nan_median(&history) > shadow_median
            }
        })
        .collect();

    let support: Vec<bool> = (0..p)
        .map(|f| decisions[f] == Decision::Confirmed || (params.include_tentative && weak[f]))
        .collect();
    Ok(BorutaOutcome {
        decisions,
        weak,
        hits,
        iterations: iteration - 1,
        mask: FeatureMask::new(support),
    })
}

// Helper Functions ----------------------------------------------------------

fn count(decisions: &[Decision], kind: Decision) -> usize {
    decisions.iter().filter(|&&d| d == kind).count()
}

/// Tree count scaled to the number of candidate columns (real + shadow).
fn auto_tree_count(n_active: usize, max_depth: Option<usize>) -> usize {
    let depth = max_depth.unwrap_or(10) as f64;
    let f_repr = 100.0;
    let multi = (2 * n_active) as f64 / ((2 * n_active) as f64).sqrt() / depth;
    ((multi * f_repr) as usize).max(1)
}

/// Fit a forest on the active real columns plus their shuffled shadows and
/// return (real importances, shadow importances).
fn importances(
    x: &Array2<f64>,
    y: &[u8],
    active: &[usize],
    n_trees: usize,
    params: &BorutaParams,
    iteration: usize,
    rng: &mut ChaCha8Rng,
) -> Result<(Vec<f64>, Vec<f64>)> {
    let real = x.select(Axis(1), active);
    let mut shadow = real.clone();
    while shadow.ncols() < 5 {
        shadow = ndarray::concatenate(Axis(1), &[shadow.view(), shadow.view()])
            .map_err(|e| PipelineError::InvalidParameter(format!("shadow columns: {e}")))?;
    }
    for mut column in shadow.columns_mut() {
        let mut values = column.to_vec();
        values.shuffle(rng);
        column.iter_mut().zip(values).for_each(|(c, v)| *c = v);
    }
    let combined = ndarray::concatenate(Axis(1), &[real.view(), shadow.view()])
        .map_err(|e| PipelineError::InvalidParameter(format!("shadow columns: {e}")))?;

    let mut forest = RandomForest::new(RandomForestParams {
        n_estimators: n_trees,
        max_depth: params.max_depth,
        seed: derive_seed(params.seed, iteration as u64),
        ..Default::default()
    });
    forest.fit(&combined, y)?;
    let imp = forest.feature_importances();
    let n_real = active.len();
    Ok((imp[..n_real].to_vec(), imp[n_real..].to_vec()))
}

/// Binomial test of the hit counts after `iteration` rounds. The tests run
/// over every feature not yet rejected; only tentative ones change state.
fn assign_hits(decisions: &mut [Decision], hits: &[u64], iteration: u64, params: &BorutaParams) {
    let active: Vec<usize> = (0..decisions.len())
        .filter(|&f| decisions[f] != Decision::Rejected)
        .collect();
    if active.is_empty() {
        return;
    }
    let accept_p: Vec<f64> = active
        .iter()
        .map(|&f| binom_sf(hits[f] as i64 - 1, iteration, 0.5))
        .collect();
    let reject_p: Vec<f64> = active
        .iter()
        .map(|&f| binom_cdf(hits[f] as i64, iteration, 0.5))
        .collect();

    let (accept, reject): (Vec<bool>, Vec<bool>) = if params.two_step {
        let bonferroni = params.alpha / iteration as f64;
        let accept_fdr = fdr_bh(&accept_p, params.alpha);
        let reject_fdr = fdr_bh(&reject_p, params.alpha);
        (
            accept_fdr
                .iter()
                .zip(&accept_p)
                .map(|(&a, &p)| a && p <= bonferroni)
                .collect(),
            reject_fdr
                .iter()
                .zip(&reject_p)
                .map(|(&r, &p)| r && p <= bonferroni)
                .collect(),
        )
    } else {
        let bonferroni = params.alpha / decisions.len() as f64;
        (
            accept_p.iter().map(|&p| p <= bonferroni).collect(),
            reject_p.iter().map(|&p| p <= bonferroni).collect(),
        )
    };

    for (k, &f) in active.iter().enumerate() {
        if decisions[f] != Decision::Tentative {
            continue;
        }
        if accept[k] {
            decisions[f] = Decision::Confirmed;
        } else if reject[k] {
            decisions[f] = Decision::Rejected;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    /// Feature 0 determines the label; features 1..4 are uniform noise.
    fn informative_and_noise(n: usize) -> (Array2<f64>, Vec<u8>) {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let y: Vec<u8> = (0..n).map(|i| (i % 2) as u8).collect();
        let x = Array2::from_shape_fn((n, 4), |(i, j)| {
            if j == 0 {
                f64::from(y[i]) + rng.gen_range(-0.3..0.3)
            } else {
                rng.gen_range(0.0..1.0)
            }
        });
        (x, y)
    }

    #[test]
    fn test_confirms_signal_and_rejects_noise() {
        let (x, y) = informative_and_noise(120);
        let params = BorutaParams {
            n_estimators: Some(30),
            max_depth: Some(5),
            max_iter: 30,
            ..Default::default()
        };
        let outcome = boruta(&x, &y, &params).unwrap();
        assert_eq!(outcome.decisions[0], Decision::Confirmed);
        assert!(outcome.decisions[1..]
            .iter()
            .all(|&d| d != Decision::Confirmed));
        assert_eq!(outcome.mask.support(), &[true, false, false, false]);
    }

    #[test]
    fn test_auto_tree_count() {
        // 2n = 50: 50 / sqrt(50) / 10 * 100
        assert_eq!(auto_tree_count(25, None), 70);
        assert_eq!(auto_tree_count(25, Some(5)), 141);
    }

    #[test]
    fn test_hit_assignment() {
        let params = BorutaParams::default();
        let mut decisions = vec![Decision::Tentative; 3];
        // after 10 rounds: always hit, never hit, half
        assign_hits(&mut decisions, &[10, 0, 5], 10, &params);
        assert_eq!(
            decisions,
            vec![Decision::Confirmed, Decision::Rejected, Decision::Tentative]
        );
    }

    #[test]
    fn test_nothing_selected_is_an_error() {
        let (x, y) = informative_and_noise(40);
        let matrix = FeatureMatrix::new(
            x.select(Axis(1), &[1, 2, 3]),
            vec!["a".into(), "b".into(), "c".into()],
        )
        .unwrap();
        let params = BorutaParams {
            n_estimators: Some(20),
            max_depth: Some(3),
            max_iter: 12,
            ..Default::default()
        };
        assert!(matches!(
            select_features(&matrix, &y, &params),
            Err(PipelineError::NoFeaturesSelected)
        ));
    }
}
