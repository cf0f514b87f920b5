use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use anyhow::Result;

pub const DEFAULT_EMBEDDING_DIM: usize = 384;

pub trait SimilarityOracle {
    fn score_matrix(&self, current: &[String], baseline: &[String]) -> Result<Vec<Vec<f64>>>;
}

#[derive(Debug, Clone)]
pub struct HashEmbeddingOracle {
    dimensions: usize,
}

impl HashEmbeddingOracle {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(8),
        }
    }

    fn encode_batch(&self, lines: &[String]) -> Vec<Vec<f32>> {
        lines
            .iter()
            .map(|line| embed_line(line, self.dimensions))
            .collect()
    }
}

impl SimilarityOracle for HashEmbeddingOracle {
    fn score_matrix(&self, current: &[String], baseline: &[String]) -> Result<Vec<Vec<f64>>> {
        let current_vectors = self.encode_batch(current);
        let baseline_vectors = self.encode_batch(baseline);

        Ok(current_vectors
            .iter()
            .map(|current_vector| {
                baseline_vectors
                    .iter()
                    .map(|baseline_vector| {
                        cosine_similarity(current_vector, baseline_vector).clamp(0.0, 1.0)
                    })
                    .collect()
            })
            .collect())
    }
}

fn embed_line(line: &str, dimensions: usize) -> Vec<f32> {
    let mut vector = vec![0_f32; dimensions];
    let mut features = line_features(line);

    if features.is_empty() {
        return vector;
    }

    for feature in features.drain(..) {
        let hash = stable_hash(&feature);
        let index = (hash as usize) % dimensions;
        let sign = if (hash >> 63) & 1 == 0 { 1.0 } else { -1.0 };
        let weight = 1.0 + (((hash >> 48) & 0xFF) as f32 / 255.0);
        vector[index] += sign * weight;
    }

    normalize_vector(&mut vector);
    vector
}

fn line_features(line: &str) -> Vec<String> {
    let words = line
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|character| character.is_ascii_alphanumeric())
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<String>>();

    let mut features = Vec::<String>::with_capacity(words.len() * 2);
    for (index, word) in words.iter().enumerate() {
        features.push(format!("w:{word}"));
        if let Some(next) = words.get(index + 1) {
            features.push(format!("b:{word}_{next}"));
        }
    }
    features
}

fn cosine_similarity(left: &[f32], right: &[f32]) -> f64 {
    if left.len() != right.len() || left.is_empty() {
        return 0.0;
    }

    left.iter()
        .zip(right.iter())
        .map(|(left_value, right_value)| f64::from(*left_value) * f64::from(*right_value))
        .sum::<f64>()
}

fn stable_hash(value: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn normalize_vector(values: &mut [f32]) {
    let squared_norm = values
        .iter()
        .map(|value| f64::from(*value) * f64::from(*value))
        .sum::<f64>();

    if squared_norm <= 0.0 {
        return;
    }

    let norm = squared_norm.sqrt() as f32;
    if norm == 0.0 {
        return;
    }

    for value in values {
        *value /= norm;
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_EMBEDDING_DIM, HashEmbeddingOracle, SimilarityOracle, embed_line};

    fn lines(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn identical_lines_score_one() {
        let oracle = HashEmbeddingOracle::new(DEFAULT_EMBEDDING_DIM);
        let matrix = oracle
            .score_matrix(
                &lines(&["TEST: build passes"]),
                &lines(&["TEST: build passes"]),
            )
            .expect("scoring should succeed");

        assert!((matrix[0][0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn related_line_outranks_unrelated_line() {
        let oracle = HashEmbeddingOracle::new(DEFAULT_EMBEDDING_DIM);
        let matrix = oracle
            .score_matrix(
                &lines(&["login failed with timeout"]),
                &lines(&[
                    "login failed with error",
                    "completely unrelated words here",
                ]),
            )
            .expect("scoring should succeed");

        assert!(matrix[0][0] > matrix[0][1]);
    }

    #[test]
    fn matrix_shape_is_current_by_baseline() {
        let oracle = HashEmbeddingOracle::new(64);
        let matrix = oracle
            .score_matrix(&lines(&["a", "b"]), &lines(&["x", "y", "z"]))
            .expect("scoring should succeed");

        assert_eq!(matrix.len(), 2);
        assert!(matrix.iter().all(|row| row.len() == 3));
    }

    #[test]
    fn scores_stay_within_unit_interval() {
        let oracle = HashEmbeddingOracle::new(32);
        let matrix = oracle
            .score_matrix(
                &lines(&["error: timeout waiting for socket"]),
                &lines(&["ok 4 - socket teardown", "TEST: socket setup"]),
            )
            .expect("scoring should succeed");

        for row in &matrix {
            for score in row {
                assert!((0.0..=1.0).contains(score));
            }
        }
    }

    #[test]
    fn line_without_alphanumeric_tokens_embeds_to_zero_vector() {
        let vector = embed_line("---- ==== ....", 32);
        assert!(vector.iter().all(|value| *value == 0.0));
    }

    #[test]
    fn embedded_vectors_are_unit_length() {
        let vector = embed_line("not ok 7 - teardown", 64);
        let squared_norm: f64 = vector
            .iter()
            .map(|value| f64::from(*value) * f64::from(*value))
            .sum();

        assert!((squared_norm - 1.0).abs() < 1e-5);
    }
}
