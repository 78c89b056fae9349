//! # edgar-toolkit - SEC EDGAR client and filing parsers
//!
//! edgar-toolkit talks to the SEC's EDGAR (Electronic Data Gathering, Analysis, and
//! Retrieval) system and turns what comes back into typed Rust values.
//!
//! ## Features
//!
//! - **Polite HTTP client** - one shared rate gate, bounded retries with jittered
//!   backoff, `Retry-After` support and a TTL/LRU response cache
//! - **Company lookups** - ticker and CIK resolution, name search, batch lookups
//! - **Filings** - submissions, filtered filing history, filing manifests and documents
//! - **XBRL** - company facts, single concepts and cross-company frames
//! - **Parsers** - Form 3/4/5 ownership XML, 10-K/10-Q/8-K item extraction, financial
//!   data from annual and quarterly reports, and 8-K material events
//!
//! ## Requirements
//!
//! The client is async and needs a runtime; the examples use [tokio](https://tokio.rs).
//! The parsers are synchronous and need no runtime at all.
//!
//! ## Basic Usage
//!
//! ```ignore
//! use edgar_toolkit::{CompanyOperations, Edgar, FilingOperations, FilingOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // SEC.gov requires a descriptive user agent with contact details
//!     let edgar = Edgar::new("YourAppName contact@example.com")?;
//!
//!     let cik = edgar.company_cik("AAPL").await?;
//!     let options = FilingOptions::new().with_form_type("10-K").with_limit(5);
//!
//!     for filing in edgar.filings(&cik.to_string(), Some(options)).await? {
//!         println!("{} filed {}", filing.form, filing.filing_date);
//!     }
//!     Ok(())
//! }
//! ```

mod cache;
mod config;
mod core;
mod error;

#[cfg(feature = "parsers")]
pub mod parsing;

#[cfg(feature = "filings")]
mod options;

#[cfg(any(feature = "company", feature = "filings", feature = "xbrl"))]
mod traits;

#[cfg(feature = "company")]
mod company;
#[cfg(feature = "filings")]
mod filings;
#[cfg(feature = "xbrl")]
mod xbrl;

// Core client (always available)
pub use cache::{Cache, CacheStats, cache_key};
pub use config::{CacheConfig, EdgarConfig, EdgarUrls, MIN_USER_AGENT_LEN, RetryPolicy};
pub use core::{Edgar, FetchOptions};
pub use error::{EdgarError, LookupKind, Result};

#[cfg(feature = "filings")]
pub use options::FilingOptions;

#[cfg(feature = "company")]
pub use company::{CompanyLookup, CompanyTicker};
#[cfg(feature = "filings")]
pub use filings::{
    Address, Addresses, DetailedFiling, Directory, DirectoryItem, DirectoryResponse,
    FilingFile, FilingsData, FormerName, RecentFilings, Submission,
};
#[cfg(feature = "xbrl")]
pub use xbrl::{
    CompanyConcept, CompanyFacts, DataPoint, Fact, Frame, FrameDataPoint, FramePeriod,
    TaxonomyGroups,
};

#[cfg(feature = "company")]
pub use traits::CompanyOperations;
#[cfg(feature = "filings")]
pub use traits::FilingOperations;
#[cfg(feature = "xbrl")]
pub use traits::XbrlOperations;

/// Current crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
