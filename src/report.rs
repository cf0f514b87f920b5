use serde::Serialize;

use crate::detect::{Classification, ClassifiedChange};

#[derive(Debug, Serialize)]
pub struct CompareReport {
    pub generated_at: String,
    pub baseline: String,
    pub current: String,
    pub threshold_main: f64,
    pub threshold_fallback: f64,
    pub textual_cutoff: f64,
    pub fuzzy_cutoff: f64,
    pub files: Vec<FileReport>,
}

#[derive(Debug, Serialize)]
pub struct FileReport {
    pub file: String,
    pub sha256: String,
    pub suites: Vec<String>,
    pub results: Vec<SuiteReport>,
}

#[derive(Debug, Serialize)]
pub struct SuiteReport {
    pub suite: String,
    pub match_kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_baseline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_ratio: Option<f64>,
    pub baseline_sources: Vec<String>,
    pub changes: Vec<ClassifiedChange>,
}

impl SuiteReport {
    pub fn real(&self) -> impl Iterator<Item = &ClassifiedChange> {
        self.changes
            .iter()
            .filter(|change| change.classification == Classification::Real)
    }

    pub fn noise(&self) -> impl Iterator<Item = &ClassifiedChange> {
        self.changes
            .iter()
            .filter(|change| change.classification == Classification::Noise)
    }
}

pub fn render_text(report: &CompareReport) -> String {
    let mut out = String::new();

    for file in &report.files {
        out.push_str(&format!("===== NEW LOG: {} =====\n", file.file));
        out.push_str(&format!("Parsed suites: {}\n\n", file.suites.join(", ")));

        for suite in &file.results {
            render_suite(&mut out, suite);
        }
    }

    out
}

fn render_suite(out: &mut String, suite: &SuiteReport) {
    if suite.match_kind == "none" {
        out.push_str(&format!("[NEW] Suite without match: {}\n", suite.suite));
        for change in &suite.changes {
            out.push_str(&format!("   + {}\n", render_change(change)));
        }
        out.push('\n');
        return;
    }

    if let (Some(matched), "fuzzy") = (suite.matched_baseline.as_deref(), suite.match_kind.as_str())
    {
        out.push_str(&format!("Fuzzy match: '{}' -> '{}'\n", suite.suite, matched));
    }

    out.push_str(&format!(
        "Comparing suite '{}' (from {})\n",
        suite.suite,
        suite.baseline_sources.join(", ")
    ));

    if suite.changes.is_empty() {
        out.push_str("No meaningful test differences.\n\n");
        return;
    }

    let real: Vec<&ClassifiedChange> = suite.real().collect();
    if !real.is_empty() {
        out.push_str("Real semantic changes:\n");
        for change in real {
            out.push_str(&format!("   - {}\n", render_change(change)));
        }
    }

    let noise: Vec<&ClassifiedChange> = suite.noise().collect();
    if !noise.is_empty() {
        out.push_str("Noise changes:\n");
        for change in noise {
            out.push_str(&format!("   - {}\n", render_change(change)));
        }
    }

    out.push('\n');
}

fn render_change(change: &ClassifiedChange) -> String {
    match change.textual_ratio {
        Some(ratio) => format!("{} (ratio={ratio:.2})", change.text),
        None => change.text.clone(),
    }
}
