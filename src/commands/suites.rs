use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::SuitesArgs;
use crate::parse::{self, LogPatterns};

#[derive(Debug, Serialize)]
struct SuiteRow {
    suite: String,
    lines: usize,
}

#[derive(Debug, Serialize)]
struct SuitesResponse {
    log: String,
    suite_count: usize,
    suites: Vec<SuiteRow>,
}

pub fn run(args: SuitesArgs) -> Result<()> {
    let patterns = LogPatterns::new()?;

    let text = fs::read_to_string(&args.log_path)
        .with_context(|| format!("failed to read {}", args.log_path.display()))?;

    let sections = parse::parse_sections(&patterns, &text);

    let mut rows = Vec::with_capacity(sections.len());
    for suite in sections.iter() {
        let lines = if args.keep_passing {
            suite.lines.clone()
        } else {
            parse::filter_passing(&patterns, &suite.lines)
        };

        if !lines.is_empty() {
            rows.push(SuiteRow {
                suite: suite.name.clone(),
                lines: lines.len(),
            });
        }
    }

    info!(
        log = %args.log_path.display(),
        suites = rows.len(),
        "parsed log sections"
    );

    let response = SuitesResponse {
        log: args.log_path.display().to_string(),
        suite_count: rows.len(),
        suites: rows,
    };

    let mut output = io::BufWriter::new(io::stdout().lock());

    if args.json {
        serde_json::to_writer_pretty(&mut output, &response)
            .context("failed to serialize suites output")?;
        writeln!(output)?;
    } else {
        writeln!(output, "Log: {}", response.log)?;
        writeln!(output, "Suites: {}", response.suite_count)?;
        for row in &response.suites {
            writeln!(output, "\t{}\t{} lines", row.suite, row.lines)?;
        }
    }

    output.flush()?;
    Ok(())
}
