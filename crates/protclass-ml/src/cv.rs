//! Stratified k-fold cross-validation.
use crate::metrics::matthews_corrcoef;
use crate::model::{check_training_input, Classifier};
use crate::{PipelineError, Result};
use ndarray::{Array2, Axis};

/// Train/test row indices for one fold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Stratified folds without shuffling.
///
/// Class counts are spread over the folds as evenly as possible: the sorted
/// label vector is dealt round-robin, and each class's rows are assigned to
/// folds in their original order.
pub fn stratified_kfold(y: &[u8], n_splits: usize) -> Result<Vec<Fold>> {
    if n_splits < 2 {
        return Err(PipelineError::InvalidParameter(format!(
            "cross-validation needs at least 2 folds, got {n_splits}"
        )));
    }
    if n_splits > y.len() {
        return Err(PipelineError::InvalidParameter(format!(
            "cannot split {} samples into {n_splits} folds",
            y.len()
        )));
    }
    let counts = [
        y.iter().filter(|&&v| v == 0).count(),
        y.iter().filter(|&&v| v == 1).count(),
    ];
    if counts.iter().all(|&c| c < n_splits) {
        return Err(PipelineError::InvalidParameter(format!(
            "n_splits={n_splits} is greater than the number of members in each class"
        )));
    }
    if counts.iter().any(|&c| c > 0 && c < n_splits) {
        log::warn!(
            "the least populated class has only {} members, fewer than n_splits={n_splits}",
            counts.iter().filter(|&&c| c > 0).min().copied().unwrap_or(0)
        );
    }

    // allocation[fold][class]: deal the sorted labels round-robin
    let mut sorted = y.to_vec();
    sorted.sort_unstable();
    let mut allocation = vec![[0usize; 2]; n_splits];
    for (i, &label) in sorted.iter().enumerate() {
        allocation[i % n_splits][label as usize] += 1;
    }

    let mut test_fold = vec![0usize; y.len()];
    for class in 0..2u8 {
        let fold_ids = (0..n_splits)
            .flat_map(|f| std::iter::repeat(f).take(allocation[f][class as usize]));
        let rows = (0..y.len()).filter(|&i| y[i] == class);
        for (row, fold) in rows.zip(fold_ids) {
            test_fold[row] = fold;
        }
    }

    Ok((0..n_splits)
        .map(|f| {
            let (test, train): (Vec<usize>, Vec<usize>) =
                (0..y.len()).partition(|&i| test_fold[i] == f);
            Fold { train, test }
        })
        .collect())
}

/// MCC of a freshly built model on each fold.
pub fn cross_val_mcc<C, F>(build: F, x: &Array2<f64>, y: &[u8], n_splits: usize) -> Result<Vec<f64>>
where
    C: Classifier,
    F: Fn() -> C,
{
    check_training_input(x, y)?;
    let folds = stratified_kfold(y, n_splits)?;
    let mut scores = Vec::with_capacity(folds.len());
    for (k, fold) in folds.iter().enumerate() {
        let mut model = build();
        let x_train = x.select(Axis(0), &fold.train);
        let y_train: Vec<u8> = fold.train.iter().map(|&i| y[i]).collect();
        model.fit(&x_train, &y_train)?;

        let x_test = x.select(Axis(0), &fold.test);
        let y_test: Vec<u8> = fold.test.iter().map(|&i| y[i]).collect();
        let pred = model.predict(&x_test)?;
        let score = matthews_corrcoef(&y_test, &pred)?;
        log::debug!("fold {}: MCC {score:.4}", k + 1);
        scores.push(score);
    }
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{blobs, small_ensemble_params};
    use crate::VotingEnsemble;

    #[test]
    fn test_folds_partition_and_stratify() {
        let y: Vec<u8> = (0..50).map(|i| u8::from(i % 5 == 0)).collect();
        let folds = stratified_kfold(&y, 5).unwrap();
        assert_eq!(folds.len(), 5);
        let mut seen = vec![0; 50];
        for fold in &folds {
            assert_eq!(fold.test.len(), 10);
            assert_eq!(fold.train.len() + fold.test.len(), 50);
            let pos = fold.test.iter().filter(|&&i| y[i] == 1).count();
            assert_eq!(pos, 2);
            for &i in &fold.test {
                seen[i] += 1;
            }
        }
        assert!(seen.iter().all(|&c| c == 1));
    }

    #[test]
    fn test_fold_assignment_follows_row_order() {
        // 3 negatives then 3 positives, 3 folds: one of each per fold
        let y = [0, 0, 0, 1, 1, 1];
        let folds = stratified_kfold(&y, 3).unwrap();
        assert_eq!(folds[0].test, vec![0, 3]);
        assert_eq!(folds[1].test, vec![1, 4]);
        assert_eq!(folds[2].test, vec![2, 5]);
    }

    #[test]
    fn test_invalid_splits() {
        assert!(stratified_kfold(&[0, 1, 0, 1], 1).is_err());
        assert!(stratified_kfold(&[0, 1, 0, 1], 3).is_err());
    }

    #[test]
    fn test_cross_val_mcc_on_separable_data() {
        let (x, y) = blobs(100);
        let params = small_ensemble_params();
        let scores = cross_val_mcc(|| VotingEnsemble::new(&params), &x, &y, 5).unwrap();
        assert_eq!(scores.len(), 5);
        assert!(scores.iter().all(|&s| s > 0.8));
    }
}
