//! Binary classification metrics and the text evaluation report.
//!
//! Ratios whose denominator is zero (precision with no predicted positives,
//! MCC with an empty margin) evaluate to 0. Metrics that are undefined rather
//! than merely degenerate (specificity without negatives, ranking metrics with
//! a single class) return a [`MetricError`].
use crate::MetricError;
use serde::{Deserialize, Serialize};
use std::fmt;

type MetricResult<T> = std::result::Result<T, MetricError>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub tn: usize,
    pub fp: usize,
    pub fn_: usize,
    pub tp: usize,
}

impl ConfusionMatrix {
    pub fn from_labels(y_true: &[u8], y_pred: &[u8]) -> MetricResult<Self> {
        check_lengths(y_true.len(), y_pred.len())?;
        let mut cm = ConfusionMatrix::default();
        for (&t, &p) in y_true.iter().zip(y_pred) {
            match (t == 1, p == 1) {
                (false, false) => cm.tn += 1,
                (false, true) => cm.fp += 1,
                (true, false) => cm.fn_ += 1,
                (true, true) => cm.tp += 1,
            }
        }
        Ok(cm)
    }

    pub fn total(&self) -> usize {
        self.tn + self.fp + self.fn_ + self.tp
    }

    pub fn accuracy(&self) -> f64 {
        safe_div((self.tp + self.tn) as f64, self.total() as f64)
    }

    pub fn precision(&self) -> f64 {
        safe_div(self.tp as f64, (self.tp + self.fp) as f64)
    }

    pub fn recall(&self) -> f64 {
        safe_div(self.tp as f64, (self.tp + self.fn_) as f64)
    }

    pub fn f1(&self) -> f64 {
        f1(self.precision(), self.recall())
    }

    /// `tn / (tn + fp)`.
    pub fn specificity(&self) -> MetricResult<f64> {
        let negatives = self.tn + self.fp;
        if negatives == 0 {
            return Err(MetricError::NoNegatives);
        }
        Ok(self.tn as f64 / negatives as f64)
    }

    /// Matthews correlation coefficient.
    pub fn mcc(&self) -> f64 {
        let (tp, tn, fp, fn_) = (
            self.tp as f64,
            self.tn as f64,
            self.fp as f64,
            self.fn_ as f64,
        );
        let denom = ((tp + fp) * (tp + fn_) * (tn + fp) * (tn + fn_)).sqrt();
        safe_div(tp * tn - fp * fn_, denom)
    }
}

/// Printed the way numpy prints a 2x2 integer array.
impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let w = [self.tn, self.fp, self.fn_, self.tp]
            .iter()
            .map(|v| v.to_string().len())
            .max()
            .unwrap_or(1);
        write!(
            f,
            "[[{:>w$} {:>w$}]\n [{:>w$} {:>w$}]]",
            self.tn, self.fp, self.fn_, self.tp
        )
    }
}

pub fn matthews_corrcoef(y_true: &[u8], y_pred: &[u8]) -> MetricResult<f64> {
    Ok(ConfusionMatrix::from_labels(y_true, y_pred)?.mcc())
}

/// Area under the ROC curve via the rank-sum statistic; tied scores share
/// their average rank.
pub fn roc_auc(y_true: &[u8], scores: &[f64]) -> MetricResult<f64> {
    check_lengths(y_true.len(), scores.len())?;
    let n_pos = y_true.iter().filter(|&&v| v == 1).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(MetricError::SingleClass("ROC AUC"));
    }
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut rank_sum = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // 1-based ranks i+1 ..= j+1 share their mean
        let avg_rank = (i + j + 2) as f64 / 2.0;
        rank_sum += avg_rank * order[i..=j].iter().filter(|&&k| y_true[k] == 1).count() as f64;
        i = j + 1;
    }
    let n_pos = n_pos as f64;
    Ok((rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg as f64))
}

/// Average precision: `Σ (R_k − R_{k−1}) P_k` over descending distinct
/// score thresholds.
pub fn average_precision(y_true: &[u8], scores: &[f64]) -> MetricResult<f64> {
    check_lengths(y_true.len(), scores.len())?;
    let n_pos = y_true.iter().filter(|&&v| v == 1).count();
    if n_pos == 0 || n_pos == y_true.len() {
        return Err(MetricError::SingleClass("average precision"));
    }
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let (mut tp, mut fp) = (0usize, 0usize);
    let mut prev_recall = 0.0;
    let mut ap = 0.0;
    let mut i = 0;
    while i < order.len() {
        let threshold = scores[order[i]];
        while i < order.len() && scores[order[i]] == threshold {
            if y_true[order[i]] == 1 {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }
        let recall = tp as f64 / n_pos as f64;
        let precision = tp as f64 / (tp + fp) as f64;
        ap += (recall - prev_recall) * precision;
        prev_recall = recall;
    }
    Ok(ap)
}

/// The metric battery written to the report for one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub accuracy: f64,
    pub auc: f64,
    pub auprc: f64,
    pub mcc: f64,
    pub f1: f64,
    pub recall: f64,
    pub precision: f64,
    pub specificity: f64,
    pub confusion_matrix: ConfusionMatrix,
}

impl EvaluationMetrics {
    pub fn compute(y_true: &[u8], y_pred: &[u8], y_prob: &[f64]) -> MetricResult<Self> {
        if y_true.is_empty() {
            return Err(MetricError::Empty);
        }
        let cm = ConfusionMatrix::from_labels(y_true, y_pred)?;
        Ok(EvaluationMetrics {
            accuracy: cm.accuracy(),
            auc: roc_auc(y_true, y_prob)?,
            auprc: average_precision(y_true, y_prob)?,
            mcc: cm.mcc(),
            f1: cm.f1(),
            recall: cm.recall(),
            precision: cm.precision(),
            specificity: cm.specificity()?,
            confusion_matrix: cm,
        })
    }

    /// Report labels paired with their values, in report order.
    pub fn named(&self) -> [(&'static str, f64); 8] {
        [
            ("Accuracy", self.accuracy),
            ("AUC", self.auc),
            ("AUPRC", self.auprc),
            ("MCC", self.mcc),
            ("F1", self.f1),
            ("Recall", self.recall),
            ("Precision", self.precision),
            ("Specificity", self.specificity),
        ]
    }

    /// One report section: header, metrics, confusion matrix and the
    /// per-class table.
    pub fn report_section(&self, set_name: &str, y_true: &[u8], y_pred: &[u8]) -> MetricResult<String> {
        let mut out = format!("\n===== {set_name} Evaluation =====\n");
        for (name, value) in self.named() {
            out.push_str(&format!("{name}: {value:.4}\n"));
        }
        out.push_str("\nConfusion Matrix:\n");
        out.push_str(&self.confusion_matrix.to_string());
        out.push_str("\n\nClassification Report:\n");
        out.push_str(&classification_report(y_true, y_pred)?);
        Ok(out)
    }
}

/// Per-class precision, recall, F1 and support with accuracy, macro and
/// support-weighted averages, laid out like scikit-learn's report.
pub fn classification_report(y_true: &[u8], y_pred: &[u8]) -> MetricResult<String> {
    check_lengths(y_true.len(), y_pred.len())?;
    if y_true.is_empty() {
        return Err(MetricError::Empty);
    }
    let labels: Vec<u8> = [0u8, 1]
        .into_iter()
        .filter(|l| y_true.contains(l) || y_pred.contains(l))
        .collect();

    let headers = ["precision", "recall", "f1-score", "support"];
    let width = "weighted avg".len();
    let mut out = format!("{:>width$} ", "");
    for h in headers {
        out.push_str(&format!(" {h:>9}"));
    }
    out.push_str("\n\n");

    let total = y_true.len();
    let mut rows: Vec<(f64, f64, f64, usize)> = Vec::new();
    for &label in &labels {
        let tp = count_pairs(y_true, y_pred, |t, p| t == label && p == label);
        let predicted = y_pred.iter().filter(|&&p| p == label).count();
        let support = y_true.iter().filter(|&&t| t == label).count();
        let precision = safe_div(tp as f64, predicted as f64);
        let recall = safe_div(tp as f64, support as f64);
        let f = f1(precision, recall);
        out.push_str(&format!(
            "{:>width$}  {precision:>9.2} {recall:>9.2} {f:>9.2} {support:>9}\n",
            label.to_string()
        ));
        rows.push((precision, recall, f, support));
    }
    out.push('\n');

    let correct = count_pairs(y_true, y_pred, |t, p| t == p);
    let accuracy = correct as f64 / total as f64;
    out.push_str(&format!(
        "{:>width$}  {:>9} {:>9} {accuracy:>9.2} {total:>9}\n",
        "accuracy", "", ""
    ));

    let n = rows.len() as f64;
    let macro_avg = rows.iter().fold((0.0, 0.0, 0.0), |acc, r| {
        (acc.0 + r.0 / n, acc.1 + r.1 / n, acc.2 + r.2 / n)
    });
    let weighted = rows.iter().fold((0.0, 0.0, 0.0), |acc, r| {
        let w = r.3 as f64 / total as f64;
        (acc.0 + r.0 * w, acc.1 + r.1 * w, acc.2 + r.2 * w)
    });
    for (name, (p, r, f)) in [("macro avg", macro_avg), ("weighted avg", weighted)] {
        out.push_str(&format!(
            "{name:>width$}  {p:>9.2} {r:>9.2} {f:>9.2} {total:>9}\n"
        ));
    }
    Ok(out)
}

// Helper Functions ----------------------------------------------------------

fn safe_div(num: f64, denom: f64) -> f64 {
    if denom == 0.0 {
        0.0
    } else {
        num / denom
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    safe_div(2.0 * precision * recall, precision + recall)
}

fn count_pairs(y_true: &[u8], y_pred: &[u8], pred: impl Fn(u8, u8) -> bool) -> usize {
    y_true
        .iter()
        .zip(y_pred)
        .filter(|(&t, &p)| pred(t, p))
        .count()
}

fn check_lengths(labels: usize, predictions: usize) -> MetricResult<()> {
    if labels != predictions {
        return Err(MetricError::LengthMismatch {
            predictions,
            labels,
        });
    }
    Ok(())
}
