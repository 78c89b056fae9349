//! Trait definitions organizing EDGAR operations by feature area.
//!
//! The client's network operations fall into three groups: company identity lookups,
//! filing retrieval, and the XBRL data API. Each group is a trait that [`Edgar`] implements
//! when the matching cargo feature is enabled.
//!
//! Most callers use `Edgar` directly and only import the traits to bring the methods into
//! scope. The traits also let tests stand in an alternative implementation.
//!
//! [`Edgar`]: crate::Edgar

#[cfg(feature = "company")]
use super::company::{CompanyLookup, CompanyTicker};
use super::error::Result;
#[cfg(feature = "filings")]
use super::filings::{DetailedFiling, DirectoryResponse, Submission};
#[cfg(feature = "filings")]
use super::options::FilingOptions;
#[cfg(feature = "xbrl")]
use super::xbrl::{CompanyConcept, CompanyFacts, Frame, FramePeriod};
use async_trait::async_trait;

/// Operations for resolving companies by ticker, CIK or name.
///
/// All of these read the SEC ticker directory, which the client caches like any other
/// response.
#[cfg(feature = "company")]
#[async_trait]
pub trait CompanyOperations {
    /// Retrieves the full ticker directory.
    async fn company_tickers(&self) -> Result<Vec<CompanyTicker>>;
    /// Retrieves the Central Index Key (CIK) for a ticker symbol.
    async fn company_cik(&self, ticker: &str) -> Result<u64>;
    /// Retrieves the directory entry for a CIK.
    async fn company_by_cik(&self, cik: u64) -> Result<CompanyTicker>;
    /// Finds companies by name fragment or exact ticker.
    async fn search_companies(&self, query: &str) -> Result<Vec<CompanyTicker>>;
    /// Resolves either a ticker or a CIK.
    async fn lookup_company(&self, identifier: &str) -> Result<CompanyTicker>;
    /// Resolves many identifiers, one result per identifier.
    async fn batch_lookup(&self, identifiers: &[&str]) -> Result<Vec<CompanyLookup>>;
}

/// Operations for accessing SEC filings and related documents.
///
/// Covers the submissions record of a company, filtered views of its filing history,
/// filing manifests, and the raw documents themselves.
#[cfg(feature = "filings")]
#[async_trait]
pub trait FilingOperations {
    /// Retrieves the submission record for a CIK.
    async fn submissions(&self, cik: &str) -> Result<Submission>;
    /// Retrieves the recent filings of a CIK.
    async fn recent_filings(&self, cik: &str) -> Result<Vec<DetailedFiling>>;
    /// Retrieves filings filtered by form type, date range, offset and limit.
    async fn filings(&self, cik: &str, opts: Option<FilingOptions>) -> Result<Vec<DetailedFiling>>;
    /// Retrieves the file manifest of one filing.
    async fn filing_index(&self, cik: &str, accession_number: &str) -> Result<DirectoryResponse>;
    /// Retrieves one document of a filing.
    async fn filing_document(
        &self,
        cik: &str,
        accession_number: &str,
        document: &str,
    ) -> Result<String>;
    /// Retrieves the full-submission text file of a filing.
    async fn filing_text(&self, cik: &str, accession_number: &str) -> Result<String>;
    /// Retrieves the primary document of the latest filing of a form type.
    async fn latest_filing_content(&self, cik: &str, form_type: &str) -> Result<String>;
    /// Retrieves submission records for many CIKs concurrently.
    async fn batch_submissions(&self, ciks: &[&str]) -> Vec<(String, Result<Submission>)>;
}

/// Operations on the XBRL structured-data API.
#[cfg(feature = "xbrl")]
#[async_trait]
pub trait XbrlOperations {
    /// Retrieves every XBRL fact for a company.
    async fn company_facts(&self, cik: u64) -> Result<CompanyFacts>;
    /// Retrieves one concept for a company, optionally limited to one unit.
    async fn company_concept(
        &self,
        cik: u64,
        taxonomy: &str,
        tag: &str,
        unit: Option<&str>,
    ) -> Result<CompanyConcept>;
    /// Retrieves one concept across all companies for a period.
    async fn frames(
        &self,
        taxonomy: &str,
        tag: &str,
        unit: &str,
        period: FramePeriod,
    ) -> Result<Frame>;
}
