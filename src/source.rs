use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use reqwest::Url;
use reqwest::blocking::Client;
use tracing::{info, warn};

use crate::model::LogFile;

#[derive(Debug, Clone)]
pub enum LogLocation {
    Dir(PathBuf),
    Remote(Url),
}

impl LogLocation {
    pub fn parse(input: &str) -> Result<Self> {
        if input.starts_with("http://") || input.starts_with("https://") {
            let url = Url::parse(input).with_context(|| format!("invalid build url: {input}"))?;
            return Ok(Self::Remote(url));
        }

        Ok(Self::Dir(PathBuf::from(input)))
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Dir(path) => path.display().to_string(),
            Self::Remote(url) => url.to_string(),
        }
    }
}

pub fn load_logs(location: &LogLocation, extension: &str) -> Result<Vec<LogFile>> {
    match location {
        LogLocation::Dir(dir) => load_local(dir, extension),
        LogLocation::Remote(url) => fetch_remote(url, extension),
    }
}

fn load_local(dir: &Path, extension: &str) -> Result<Vec<LogFile>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        let matches_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(extension))
            .unwrap_or(false);

        if matches_extension {
            paths.push(path);
        }
    }

    paths.sort();

    let mut logs = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(ToOwned::to_owned)
            .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;

        match fs::read_to_string(&path) {
            Ok(text) => logs.push(LogFile::new(name, text)),
            Err(err) => warn!(path = %path.display(), error = %err, "skipping unreadable log"),
        }
    }

    Ok(logs)
}

fn fetch_remote(url: &Url, extension: &str) -> Result<Vec<LogFile>> {
    let client = Client::builder()
        .build()
        .context("failed to build http client")?;

    info!(url = %url, extension, "scanning build index for logs");

    let index_page = client
        .get(url.clone())
        .send()
        .with_context(|| format!("failed to fetch build index: {url}"))?
        .error_for_status()
        .with_context(|| format!("build index request rejected: {url}"))?
        .text()
        .with_context(|| format!("failed to read build index body: {url}"))?;

    let links = extract_links(&index_page, url, extension)?;

    let mut logs = Vec::with_capacity(links.len());
    for link in links {
        let name = file_name_of(&link);
        info!(file = %name, "downloading log");

        match download(&client, &link) {
            Ok(text) => logs.push(LogFile::new(name, text)),
            Err(err) => warn!(url = %link, error = %err, "skipping failed download"),
        }
    }

    Ok(logs)
}

fn download(client: &Client, url: &Url) -> Result<String> {
    client
        .get(url.clone())
        .send()
        .with_context(|| format!("failed to download {url}"))?
        .error_for_status()
        .with_context(|| format!("download rejected: {url}"))?
        .text()
        .with_context(|| format!("failed to read body of {url}"))
}

fn extract_links(html: &str, base: &Url, extension: &str) -> Result<Vec<Url>> {
    let href = Regex::new(r#"href\s*=\s*["']([^"']+)["']"#)
        .context("failed to compile href pattern")?;
    let suffix = format!(".{}", extension.to_ascii_lowercase());

    let mut links = Vec::new();
    for captures in href.captures_iter(html) {
        let target = &captures[1];

        let Ok(resolved) = base.join(target) else {
            warn!(link = target, "ignoring unresolvable link");
            continue;
        };

        if resolved.as_str().to_ascii_lowercase().ends_with(&suffix) {
            links.push(resolved);
        }
    }

    Ok(links)
}

fn file_name_of(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .unwrap_or("unnamed.log")
        .to_string()
}
