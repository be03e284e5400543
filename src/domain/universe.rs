//! Ticker universe for a scan.
//!
//! A universe is given either inline as a comma-separated list or as a path
//! to a file with one ticker per line.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UniverseError {
    #[error("ticker list is empty")]
    Empty,

    #[error("failed to read ticker file {path}: {reason}")]
    Unreadable { path: String, reason: String },
}

/// Trim, upper-case and de-duplicate tickers, keeping first-seen order.
pub fn normalize<'a, I>(raw: I) -> Result<Vec<String>, UniverseError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in raw {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            continue;
        }
        let ticker = trimmed.to_uppercase();
        if seen.insert(ticker.clone()) {
            tickers.push(ticker);
        }
    }

    if tickers.is_empty() {
        return Err(UniverseError::Empty);
    }
    Ok(tickers)
}

pub fn parse_tickers(input: &str) -> Result<Vec<String>, UniverseError> {
    normalize(input.split(','))
}

/// Read `value` as a ticker file when it names one, otherwise as an inline list.
pub fn load_tickers(value: &str) -> Result<Vec<String>, UniverseError> {
    let path = Path::new(value);
    if path.is_file() {
        let content = fs::read_to_string(path).map_err(|e| UniverseError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        normalize(content.lines())
    } else {
        parse_tickers(value)
    }
}
