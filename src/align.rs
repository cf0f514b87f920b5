use crate::model::{MatchOutcome, SuiteIndex};
use crate::similarity::sequence_ratio;

pub const DEFAULT_FUZZY_CUTOFF: f64 = 0.6;

pub fn align(index: &SuiteIndex, current_name: &str, cutoff: f64) -> MatchOutcome {
    if index.contains(current_name) {
        return MatchOutcome::Exact(current_name.to_string());
    }

    let mut best: Option<(&str, f64)> = None;
    for candidate in index.names() {
        let ratio = sequence_ratio(current_name, candidate);
        let improved = match best {
            Some((_, best_ratio)) => ratio > best_ratio,
            None => true,
        };
        if improved {
            best = Some((candidate, ratio));
        }
    }

    match best {
        Some((candidate, ratio)) if ratio >= cutoff => MatchOutcome::Fuzzy {
            matched: candidate.to_string(),
            ratio,
        },
        _ => MatchOutcome::NoMatch,
    }
}
