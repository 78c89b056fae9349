//! Company identity lookups.
//!
//! SEC.gov publishes one bulk directory mapping every listed ticker to its CIK and
//! conformed company name. Almost every other request is keyed by CIK, so resolving
//! a ticker through this directory is usually the first call an application makes:
//!
//! ```ignore
//! let cik = edgar.company_cik("AAPL").await?;          // 320193
//! let filings = edgar.filings(&cik.to_string(), None).await?;
//! ```
//!
//! The directory is fetched through the client's response cache, so repeated lookups
//! within the cache TTL cost no network traffic.

use super::CompanyOperations;
use super::Edgar;
use super::error::{EdgarError, LookupKind, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Mapping between stock ticker symbols and company CIKs.
///
/// A company with several listed share classes appears once per ticker, all with the
/// same CIK.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CompanyTicker {
    #[serde(rename = "cik_str")]
    pub cik: u64,
    pub ticker: String,
    pub title: String,
}

/// Outcome of one identifier in a [`CompanyOperations::batch_lookup`] call.
#[derive(Debug)]
pub struct CompanyLookup {
    pub identifier: String,
    pub result: Result<CompanyTicker>,
}

impl Edgar {
    fn company_tickers_url(&self) -> String {
        format!("{}/company_tickers.json", self.edgar_files_url)
    }
}

/// Orders the directory the way SEC.gov publishes it (`"0"`, `"1"`, ...).
fn directory_entries(map: HashMap<String, CompanyTicker>) -> Vec<CompanyTicker> {
    let mut entries: Vec<(u64, CompanyTicker)> = map
        .into_iter()
        .map(|(key, ticker)| (key.parse().unwrap_or(u64::MAX), ticker))
        .collect();
    entries.sort_by_key(|(position, _)| *position);
    entries.into_iter().map(|(_, ticker)| ticker).collect()
}

fn find_by_ticker(directory: &[CompanyTicker], ticker: &str) -> Result<CompanyTicker> {
    let wanted = ticker.trim().to_uppercase();
    directory
        .iter()
        .find(|t| t.ticker.to_uppercase() == wanted)
        .cloned()
        .ok_or_else(|| EdgarError::CompanyNotFound {
            kind: LookupKind::Ticker,
            key: ticker.to_string(),
        })
}

fn find_by_cik(directory: &[CompanyTicker], cik: u64) -> Result<CompanyTicker> {
    directory
        .iter()
        .find(|t| t.cik == cik)
        .cloned()
        .ok_or_else(|| EdgarError::CompanyNotFound {
            kind: LookupKind::Cik,
            key: cik.to_string(),
        })
}

/// Digits (with optional zero padding) are a CIK; anything else is a ticker.
fn resolve_identifier(directory: &[CompanyTicker], identifier: &str) -> Result<CompanyTicker> {
    let trimmed = identifier.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        let cik = trimmed.parse::<u64>().map_err(|_| EdgarError::CompanyNotFound {
            kind: LookupKind::Cik,
            key: identifier.to_string(),
        })?;
        find_by_cik(directory, cik)
    } else {
        find_by_ticker(directory, trimmed)
    }
}

fn search_directory(directory: &[CompanyTicker], query: &str) -> Vec<CompanyTicker> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }
    directory
        .iter()
        .filter(|t| {
            t.title.to_lowercase().contains(&query) || t.ticker.to_lowercase() == query
        })
        .cloned()
        .collect()
}

/// Company lookups backed by the SEC ticker directory.
///
/// # Errors
///
/// Lookups that find nothing return `EdgarError::CompanyNotFound` carrying the searched
/// key and whether it was a ticker, CIK or name. Transport failures while fetching the
/// directory propagate unchanged.
#[async_trait]
impl CompanyOperations for Edgar {
    /// Retrieves the full ticker directory in published order.
    async fn company_tickers(&self) -> Result<Vec<CompanyTicker>> {
        let url = self.company_tickers_url();
        let map: HashMap<String, CompanyTicker> = self.get_json(&url).await?;
        Ok(directory_entries(map))
    }

    /// Retrieves the Central Index Key (CIK) for a ticker symbol, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `EdgarError::CompanyNotFound { kind: Ticker, .. }` if the ticker is not listed.
    async fn company_cik(&self, ticker: &str) -> Result<u64> {
        let directory = self.company_tickers().await?;
        Ok(find_by_ticker(&directory, ticker)?.cik)
    }

    /// Retrieves the directory entry for a CIK. For multi-class issuers this is the
    /// first listed ticker.
    async fn company_by_cik(&self, cik: u64) -> Result<CompanyTicker> {
        let directory = self.company_tickers().await?;
        find_by_cik(&directory, cik)
    }

    /// Finds companies whose name contains `query` or whose ticker equals it,
    /// ignoring case. An empty result is not an error.
    async fn search_companies(&self, query: &str) -> Result<Vec<CompanyTicker>> {
        let directory = self.company_tickers().await?;
        Ok(search_directory(&directory, query))
    }

    /// Resolves a ticker or a numeric CIK to its directory entry.
    async fn lookup_company(&self, identifier: &str) -> Result<CompanyTicker> {
        let directory = self.company_tickers().await?;
        resolve_identifier(&directory, identifier)
    }

    /// Resolves many identifiers against one copy of the directory.
    ///
    /// Each identifier gets its own `Result`, so an unknown ticker does not affect the
    /// others. Only a failure to fetch the directory itself fails the whole call.
    async fn batch_lookup(&self, identifiers: &[&str]) -> Result<Vec<CompanyLookup>> {
        let directory = self.company_tickers().await?;
        Ok(identifiers
            .iter()
            .map(|identifier| CompanyLookup {
                identifier: identifier.to_string(),
                result: resolve_identifier(&directory, identifier),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> Vec<CompanyTicker> {
        let json = r#"{
            "1": {"cik_str": 789019, "ticker": "MSFT", "title": "MICROSOFT CORP"},
            "0": {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."},
            "2": {"cik_str": 1067983, "ticker": "BRK-B", "title": "BERKSHIRE HATHAWAY INC"},
            "10": {"cik_str": 1067983, "ticker": "BRK-A", "title": "BERKSHIRE HATHAWAY INC"}
        }"#;
        directory_entries(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_directory_keeps_published_order() {
        let tickers: Vec<_> = directory().into_iter().map(|t| t.ticker).collect();
        assert_eq!(tickers, vec!["AAPL", "MSFT", "BRK-B", "BRK-A"]);
    }

    #[test]
    fn test_find_by_ticker_ignores_case() {
        let company = find_by_ticker(&directory(), "aapl").unwrap();
        assert_eq!(company.cik, 320193);
        assert_eq!(company.title, "Apple Inc.");
    }

    #[test]
    fn test_unknown_ticker_carries_key() {
        let err = find_by_ticker(&directory(), "NOPE").unwrap_err();
        match err {
            EdgarError::CompanyNotFound { kind, key } => {
                assert_eq!(kind, LookupKind::Ticker);
                assert_eq!(key, "NOPE");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_cik_lookup_returns_first_class() {
        let company = find_by_cik(&directory(), 1067983).unwrap();
        assert_eq!(company.ticker, "BRK-B");
    }

    #[test]
    fn test_resolve_identifier() {
        let dir = directory();
        assert_eq!(resolve_identifier(&dir, "0000320193").unwrap().ticker, "AAPL");
        assert_eq!(resolve_identifier(&dir, "msft").unwrap().cik, 789019);
        assert!(matches!(
            resolve_identifier(&dir, "999"),
            Err(EdgarError::CompanyNotFound {
                kind: LookupKind::Cik,
                ..
            })
        ));
    }

    #[test]
    fn test_search_directory() {
        let dir = directory();
        let hits = search_directory(&dir, "berkshire");
        assert_eq!(hits.len(), 2);

        let hits = search_directory(&dir, "msft");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "MICROSOFT CORP");

        assert!(search_directory(&dir, "  ").is_empty());
    }
}
