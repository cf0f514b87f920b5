use anyhow::{Context, Result};
use regex::Regex;

use crate::model::SectionMap;

const RESULTS_MARKER: &str = "- Test results:";

#[derive(Debug)]
pub struct LogPatterns {
    results_name: Regex,
    not_ok_suite: Regex,
    ok_test: Regex,
    not_ok_test: Regex,
}

impl LogPatterns {
    pub fn new() -> Result<Self> {
        Ok(Self {
            results_name: Regex::new(r"(\S+)\s*-\s*Test results:")
                .context("failed to compile results-marker pattern")?,
            not_ok_suite: Regex::new(r"^not ok\s+\d+\s*-\s*(\S+)")
                .context("failed to compile failure-record pattern")?,
            ok_test: Regex::new(r"^ok\s+\d+\s*-")
                .context("failed to compile pass-record pattern")?,
            not_ok_test: Regex::new(r"^not ok\s+\d+\s*-")
                .context("failed to compile failure-prefix pattern")?,
        })
    }
}

pub fn parse_sections(patterns: &LogPatterns, text: &str) -> SectionMap {
    let mut sections = SectionMap::default();
    let mut open: Option<(String, Vec<String>)> = None;

    for raw_line in text.lines() {
        let line = raw_line.trim();

        let boundary = if line.contains(RESULTS_MARKER) {
            let name = patterns
                .results_name
                .captures(line)
                .and_then(|captures| captures.get(1))
                .map(|token| token.as_str().to_string())
                .unwrap_or_else(|| loose_results_name(line));
            Some((name, Vec::new()))
        } else if let Some(captures) = patterns.not_ok_suite.captures(line) {
            // A failure record stays as the first line of its own suite.
            Some((captures[1].to_string(), vec![line.to_string()]))
        } else {
            None
        };

        match boundary {
            Some((name, seed)) => {
                if let Some((previous, lines)) = open.take() {
                    sections.commit(previous, lines);
                }
                open = Some((name, seed));
            }
            None => {
                if let Some((_, lines)) = open.as_mut() {
                    lines.push(line.to_string());
                }
            }
        }
    }

    if let Some((name, lines)) = open {
        sections.commit(name, lines);
    }

    sections
}

fn loose_results_name(line: &str) -> String {
    line.split(RESULTS_MARKER)
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

pub fn filter_passing(patterns: &LogPatterns, lines: &[String]) -> Vec<String> {
    let mut kept = Vec::with_capacity(lines.len());
    let mut skipping = false;

    for line in lines {
        let trimmed = line.trim();

        if patterns.ok_test.is_match(trimmed) {
            skipping = true;
            continue;
        }

        if patterns.not_ok_test.is_match(trimmed) {
            skipping = false;
            kept.push(line.clone());
            continue;
        }

        if !skipping {
            kept.push(line.clone());
        }
    }

    kept
}
