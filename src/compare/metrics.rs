//! Confusion matrix and per-class precision/recall/F1 report.
//!
//! Axes are the sorted set of labels observed on either side. Any metric
//! with a zero denominator is reported as 0.0.

use std::collections::BTreeSet;
use std::fmt;

/// Label counts; rows are ground truth, columns are predictions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub labels: Vec<String>,
    pub counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    /// Build from paired `(truth, predicted)` labels.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)> + Clone) -> Self {
        let labels: Vec<String> = pairs
            .clone()
            .into_iter()
            .flat_map(|(t, p)| [t, p])
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(String::from)
            .collect();

        let mut counts = vec![vec![0usize; labels.len()]; labels.len()];
        for (truth, predicted) in pairs {
            // Both labels were collected above, so the lookups always hit.
            if let (Some(row), Some(col)) = (
                labels.iter().position(|l| l == truth),
                labels.iter().position(|l| l == predicted),
            ) {
                counts[row][col] += 1;
            }
        }

        Self { labels, counts }
    }

    /// Count at (truth, predicted), zero when either label is unseen.
    pub fn get(&self, truth: &str, predicted: &str) -> usize {
        let row = self.labels.iter().position(|l| l == truth);
        let col = self.labels.iter().position(|l| l == predicted);
        match (row, col) {
            (Some(r), Some(c)) => self.counts[r][c],
            _ => 0,
        }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    fn row_sum(&self, i: usize) -> usize {
        self.counts[i].iter().sum()
    }

    fn col_sum(&self, j: usize) -> usize {
        self.counts.iter().map(|row| row[j]).sum()
    }

    fn diagonal(&self) -> usize {
        (0..self.labels.len()).map(|i| self.counts[i][i]).sum()
    }
}

impl fmt::Display for ConfusionMatrix {
    /// Text table: one header row of predicted labels, one row per truth
    /// label.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label_width = self
            .labels
            .iter()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0)
            .max("truth \\ pred".len());
        let cell_width = self
            .labels
            .iter()
            .map(|l| l.chars().count())
            .chain(
                self.counts
                    .iter()
                    .flatten()
                    .map(|c| c.to_string().len()),
            )
            .max()
            .unwrap_or(1);

        write!(f, "{:<label_width$}", "truth \\ pred")?;
        for label in &self.labels {
            write!(f, "  {label:>cell_width$}")?;
        }
        writeln!(f)?;

        for (label, row) in self.labels.iter().zip(&self.counts) {
            write!(f, "{label:<label_width$}")?;
            for count in row {
                write!(f, "  {count:>cell_width$}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Precision/recall/F1/support for one label (or one average row).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class metrics plus accuracy and averages.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    pub classes: Vec<(String, ClassMetrics)>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

impl ClassificationReport {
    pub fn from_matrix(matrix: &ConfusionMatrix) -> Self {
        let classes: Vec<(String, ClassMetrics)> = matrix
            .labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let tp = matrix.counts[i][i];
                let support = matrix.row_sum(i);
                let precision = ratio(tp, matrix.col_sum(i));
                let recall = ratio(tp, support);
                (
                    label.clone(),
                    ClassMetrics {
                        precision,
                        recall,
                        f1: f1(precision, recall),
                        support,
                    },
                )
            })
            .collect();

        let total = matrix.total();
        let n = classes.len();

        let mean = |pick: fn(&ClassMetrics) -> f64| {
            if n == 0 {
                0.0
            } else {
                classes.iter().map(|(_, m)| pick(m)).sum::<f64>() / n as f64
            }
        };
        let weighted = |pick: fn(&ClassMetrics) -> f64| {
            if total == 0 {
                0.0
            } else {
                classes
                    .iter()
                    .map(|(_, m)| pick(m) * m.support as f64)
                    .sum::<f64>()
                    / total as f64
            }
        };

        let macro_avg = ClassMetrics {
            precision: mean(|m: &ClassMetrics| m.precision),
            recall: mean(|m: &ClassMetrics| m.recall),
            f1: mean(|m: &ClassMetrics| m.f1),
            support: total,
        };
        let weighted_avg = ClassMetrics {
            precision: weighted(|m: &ClassMetrics| m.precision),
            recall: weighted(|m: &ClassMetrics| m.recall),
            f1: weighted(|m: &ClassMetrics| m.f1),
            support: total,
        };

        Self {
            accuracy: ratio(matrix.diagonal(), total),
            classes,
            macro_avg,
            weighted_avg,
        }
    }

    pub fn support(&self) -> usize {
        self.macro_avg.support
    }
}

impl fmt::Display for ClassificationReport {
    /// Layout follows the usual scikit-learn text report.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|(l, _)| l.chars().count())
            .max()
            .unwrap_or(0)
            .max("weighted avg".len());

        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;

        for (label, metrics) in &self.classes {
            write_row(f, label, metrics, width)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.support()
        )?;
        write_row(f, "macro avg", &self.macro_avg, width)?;
        write_row(f, "weighted avg", &self.weighted_avg, width)
    }
}

fn write_row(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    m: &ClassMetrics,
    width: usize,
) -> fmt::Result {
    writeln!(
        f,
        "{name:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
        m.precision, m.recall, m.f1, m.support
    )
}
