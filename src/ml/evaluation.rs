// ============================================================
// Layer 5 - Binary Classification Metrics
// ============================================================
// Confusion counts and the derived scores for one evaluation
// pass. A prediction is "bound" when its probability is at or
// above the threshold (0.5 by default).
//
//   precision = tp / (tp + fp)
//   recall    = tp / (tp + fn)
//   f1        = 2 * precision * recall / (precision + recall)
//   accuracy  = (tp + tn) / total
//
// Every ratio with a zero denominator is reported as 0.

use serde::{Deserialize, Serialize};

pub const DEFAULT_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub true_positives:  usize,
    pub false_positives: usize,
    pub true_negatives:  usize,
    pub false_negatives: usize,
    pub precision:       f64,
    pub recall:          f64,
    pub f1:              f64,
    pub accuracy:        f64,
}

impl ClassificationReport {
    /// `probabilities[i]` is P(bound) for sample i, `labels[i]` is 1 for bound.
    pub fn from_predictions(probabilities: &[f32], labels: &[u8], threshold: f32) -> Self {
        let mut report = Self::default();
        for (&p, &label) in probabilities.iter().zip(labels) {
            match (p >= threshold, label == 1) {
                (true,  true)  => report.true_positives  += 1,
                (true,  false) => report.false_positives += 1,
                (false, false) => report.true_negatives  += 1,
                (false, true)  => report.false_negatives += 1,
            }
        }
        report.compute_scores();
        report
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.true_negatives + self.false_negatives
    }

    fn compute_scores(&mut self) {
        let tp = self.true_positives as f64;
        self.precision = ratio(tp, tp + self.false_positives as f64);
        self.recall    = ratio(tp, tp + self.false_negatives as f64);
        self.f1        = ratio(2.0 * self.precision * self.recall, self.precision + self.recall);
        self.accuracy  = ratio(tp + self.true_negatives as f64, self.total() as f64);
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 { num / den } else { 0.0 }
}
