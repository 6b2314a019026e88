//! Reconciliation of predictions against a hand-labeled ground truth.
//!
//! Both sides are keyed on their subject after trimming and lowercasing.
//! The join is inner and keeps duplicates as a cross product, so a subject
//! that appears twice on each side yields four matched rows.

pub mod metrics;

pub use metrics::{ClassMetrics, ClassificationReport, ConfusionMatrix};

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::CompareError;
use crate::pipeline::ClassifiedEmail;
use crate::pipeline::output::read_classified;

/// One labeled row of the ground-truth CSV. Extra columns are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GroundTruthRow {
    pub subjects: String,
    pub urgence: String,
    pub categories: String,
}

/// One joined pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRow {
    pub truth_subject: String,
    pub predicted_subject: String,
    pub truth_urgence: String,
    pub predicted_urgence: String,
    pub truth_categorie: String,
    pub predicted_categorie: String,
}

/// Join result plus one matrix/report per label dimension.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub matches: Vec<MatchedRow>,
    pub urgence: DimensionReport,
    pub categorie: DimensionReport,
}

#[derive(Debug, Clone)]
pub struct DimensionReport {
    pub matrix: ConfusionMatrix,
    pub report: ClassificationReport,
}

impl DimensionReport {
    fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)> + Clone) -> Self {
        let matrix = ConfusionMatrix::from_pairs(pairs);
        let report = ClassificationReport::from_matrix(&matrix);
        Self { matrix, report }
    }
}

/// Load the prediction file written by a pipeline run.
pub fn load_predictions(path: &Path) -> Result<Vec<ClassifiedEmail>, CompareError> {
    Ok(read_classified(path)?)
}

/// Load the ground-truth CSV.
pub fn load_ground_truth(path: &Path) -> Result<Vec<GroundTruthRow>, CompareError> {
    if !path.exists() {
        return Err(CompareError::GroundTruthNotFound(path.to_path_buf()));
    }
    let invalid = |reason: String| CompareError::InvalidGroundTruth {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = csv::Reader::from_path(path).map_err(|e| invalid(e.to_string()))?;
    reader
        .deserialize()
        .collect::<Result<Vec<GroundTruthRow>, _>>()
        .map_err(|e| invalid(e.to_string()))
}

/// Join key for a subject.
pub fn normalize(subject: &str) -> String {
    subject.trim().to_lowercase()
}

/// Inner join on normalized subject.
///
/// Rows come out in ground-truth order, and within one key in prediction
/// order.
pub fn join(predicted: &[ClassifiedEmail], ground_truth: &[GroundTruthRow]) -> Vec<MatchedRow> {
    let mut by_subject: HashMap<String, Vec<&ClassifiedEmail>> = HashMap::new();
    for email in predicted {
        by_subject
            .entry(normalize(&email.subject))
            .or_default()
            .push(email);
    }

    let duplicated = by_subject.values().filter(|v| v.len() > 1).count();
    if duplicated > 0 {
        debug!(
            duplicated,
            "Predictions share normalized subjects; matches form a cross product"
        );
    }

    let mut matches = Vec::new();
    for truth in ground_truth {
        let Some(candidates) = by_subject.get(&normalize(&truth.subjects)) else {
            continue;
        };
        for email in candidates {
            matches.push(MatchedRow {
                truth_subject: truth.subjects.clone(),
                predicted_subject: email.subject.clone(),
                truth_urgence: truth.urgence.clone(),
                predicted_urgence: email.urgence.clone(),
                truth_categorie: truth.categories.clone(),
                predicted_categorie: email.categorie.clone(),
            });
        }
    }
    matches
}

/// Join both sides and score each label dimension.
pub fn compare(predicted: &[ClassifiedEmail], ground_truth: &[GroundTruthRow]) -> Comparison {
    let matches = join(predicted, ground_truth);
    info!(
        predicted = predicted.len(),
        ground_truth = ground_truth.len(),
        matches = matches.len(),
        "Joined predictions with ground truth"
    );

    let urgence = DimensionReport::from_pairs(
        matches
            .iter()
            .map(|m| (m.truth_urgence.as_str(), m.predicted_urgence.as_str())),
    );
    let categorie = DimensionReport::from_pairs(
        matches
            .iter()
            .map(|m| (m.truth_categorie.as_str(), m.predicted_categorie.as_str())),
    );

    Comparison {
        matches,
        urgence,
        categorie,
    }
}
