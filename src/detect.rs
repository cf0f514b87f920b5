use anyhow::{Result, ensure};
use serde::Serialize;

use crate::semantic::SimilarityOracle;
use crate::similarity::sequence_ratio;

pub const DEFAULT_THRESHOLD_MAIN: f64 = 0.88;
pub const DEFAULT_THRESHOLD_FALLBACK: f64 = 0.85;
pub const DEFAULT_TEXTUAL_CUTOFF: f64 = 0.87;

#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub main: f64,
    pub fallback: f64,
    pub textual_cutoff: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            main: DEFAULT_THRESHOLD_MAIN,
            fallback: DEFAULT_THRESHOLD_FALLBACK,
            textual_cutoff: DEFAULT_TEXTUAL_CUTOFF,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeLine {
    pub text: String,
    pub textual_ratio: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Noise,
    Real,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedChange {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub textual_ratio: Option<f64>,
    pub classification: Classification,
}

pub fn detect_changes(
    oracle: &dyn SimilarityOracle,
    baseline_lines: &[String],
    current_lines: &[String],
    thresholds: Thresholds,
) -> Result<Vec<ChangeLine>> {
    let baseline = trimmed_nonempty(baseline_lines);
    let current = trimmed_nonempty(current_lines);

    if baseline.is_empty() || current.is_empty() {
        return Ok(current
            .into_iter()
            .map(|text| ChangeLine {
                text,
                textual_ratio: None,
            })
            .collect());
    }

    let matrix = oracle.score_matrix(&current, &baseline)?;
    ensure!(
        matrix.len() == current.len(),
        "similarity matrix has {} rows, expected {}",
        matrix.len(),
        current.len()
    );

    let mut changes = Vec::new();

    for (row, line) in matrix.iter().zip(&current) {
        ensure!(
            row.len() == baseline.len(),
            "similarity matrix row has {} columns, expected {}",
            row.len(),
            baseline.len()
        );

        let mut best_index = 0_usize;
        let mut best_score = f64::NEG_INFINITY;
        for (index, score) in row.iter().enumerate() {
            if *score > best_score {
                best_index = index;
                best_score = *score;
            }
        }

        // The two thresholds are tested independently; scores between them
        // fall through as matched.
        if best_score < thresholds.main {
            changes.push(ChangeLine {
                text: line.clone(),
                textual_ratio: None,
            });
        } else if best_score > thresholds.fallback {
            let ratio = sequence_ratio(line, &baseline[best_index]);
            if ratio < thresholds.textual_cutoff {
                changes.push(ChangeLine {
                    text: line.clone(),
                    textual_ratio: Some(ratio),
                });
            }
        }
    }

    Ok(changes)
}

pub fn classify_line(line: &str) -> Classification {
    let trimmed = line.trim();

    if trimmed.is_empty() {
        return Classification::Noise;
    }

    if trimmed.contains("TEST:") {
        return Classification::Real;
    }

    Classification::Noise
}

pub fn classify_changes(changes: Vec<ChangeLine>) -> Vec<ClassifiedChange> {
    changes
        .into_iter()
        .map(|change| {
            let classification = classify_line(&change.text);
            ClassifiedChange {
                text: change.text,
                textual_ratio: change.textual_ratio,
                classification,
            }
        })
        .collect()
}

fn trimmed_nonempty(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}
