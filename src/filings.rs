//! Submission history, filing manifests and raw filing documents.
//!
//! `submissions(cik)` returns the company record plus its most recent filings as
//! parallel arrays; `filings` flattens those into [`DetailedFiling`] rows and applies
//! [`FilingOptions`] (form type, inclusive date range, offset, limit). Document
//! fetches return raw text for the parsers in [`crate::parsing`].

use super::Edgar;
use super::error::{EdgarError, Result};
use super::options::FilingOptions;
use super::traits::FilingOperations;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use futures_util::future::join_all;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Submission {
    pub cik: String,
    #[serde(rename = "entityType", default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub sic: Option<String>,
    #[serde(rename = "sicDescription", default)]
    pub sic_description: Option<String>,
    pub name: String,
    #[serde(default)]
    pub tickers: Vec<String>,
    #[serde(default)]
    pub exchanges: Vec<String>,
    pub ein: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "fiscalYearEnd", default)]
    pub fiscal_year_end: Option<String>,
    #[serde(rename = "stateOfIncorporation", default)]
    pub state_of_incorporation: Option<String>,
    #[serde(default)]
    pub addresses: Option<Addresses>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(rename = "formerNames", default)]
    pub former_names: Vec<FormerName>,
    pub filings: FilingsData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Addresses {
    pub mailing: Address,
    pub business: Address,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Address {
    pub street1: Option<String>,
    pub street2: Option<String>,
    pub city: Option<String>,
    #[serde(rename = "stateOrCountry")]
    pub state_or_country: Option<String>,
    #[serde(rename = "zipCode")]
    pub zip_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FormerName {
    pub name: String,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilingsData {
    pub recent: RecentFilings,
    #[serde(default)]
    pub files: Vec<FilingFile>,
}

/// An older page of filing history (`CIK##########-submissions-###.json`).
#[derive(Debug, Clone, Deserialize)]
pub struct FilingFile {
    pub name: String,
    #[serde(rename = "filingCount")]
    pub filing_count: u64,
    #[serde(rename = "filingFrom")]
    pub filing_from: String,
    #[serde(rename = "filingTo")]
    pub filing_to: String,
}

/// Recent filings as published: one array per column, same length, same order.
#[derive(Debug, Clone, Deserialize)]
pub struct RecentFilings {
    #[serde(rename = "accessionNumber")]
    pub accession_number: Vec<String>,
    #[serde(rename = "filingDate")]
    pub filing_date: Vec<String>,
    #[serde(rename = "reportDate")]
    pub report_date: Option<Vec<String>>,
    #[serde(rename = "acceptanceDateTime")]
    pub acceptance_date_time: Vec<String>,
    pub form: Vec<String>,
    #[serde(rename = "fileNumber")]
    pub file_number: Option<Vec<String>>,
    pub items: Option<Vec<String>>,
    pub size: Vec<i64>,
    #[serde(rename = "isXBRL")]
    pub is_xbrl: Option<Vec<i32>>,
    #[serde(rename = "isInlineXBRL")]
    pub is_inline_xbrl: Option<Vec<i32>>,
    #[serde(rename = "primaryDocument")]
    pub primary_document: Option<Vec<String>>,
    #[serde(rename = "primaryDocDescription")]
    pub primary_doc_description: Option<Vec<String>>,
}

/// One row of [`RecentFilings`].
#[derive(Debug, Clone)]
pub struct DetailedFiling {
    pub accession_number: String,
    pub filing_date: NaiveDate,
    pub report_date: Option<String>,
    pub acceptance_date_time: DateTime<FixedOffset>,
    pub form: String,
    pub file_number: Option<String>,
    pub items: Option<String>,
    pub size: i64,
    pub is_xbrl: bool,
    pub is_inline_xbrl: bool,
    pub primary_document: Option<String>,
    pub primary_doc_description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryResponse {
    pub directory: Directory,
}

/// Files belonging to one filing.
#[derive(Debug, Clone, Deserialize)]
pub struct Directory {
    #[serde(default)]
    pub item: Vec<DirectoryItem>,
    pub name: String,
    #[serde(rename = "parent-dir", default)]
    pub parent_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryItem {
    #[serde(rename = "last-modified", default)]
    pub last_modified: Option<String>,
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

impl RecentFilings {
    pub fn len(&self) -> usize {
        self.accession_number.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accession_number.is_empty()
    }

    fn get_vec_item_at<T: Clone>(&self, vec_opt: &Option<Vec<T>>, idx: usize) -> Option<T> {
        vec_opt.as_ref().and_then(|v| v.get(idx).cloned())
    }

    fn get_bool_at(&self, vec_opt: &Option<Vec<i32>>, idx: usize) -> bool {
        vec_opt
            .as_ref()
            .and_then(|v| v.get(idx))
            .is_some_and(|flag| *flag == 1)
    }

    /// Converts every row, skipping rows with unparseable dates.
    pub fn to_detailed(&self) -> Vec<DetailedFiling> {
        (0..self.len())
            .filter_map(|idx| match DetailedFiling::try_from((self, idx)) {
                Ok(filing) => Some(filing),
                Err(err) => {
                    tracing::debug!(
                        "Skipping filing {}: {}",
                        self.accession_number[idx],
                        err
                    );
                    None
                }
            })
            .collect()
    }
}

/// Why a [`RecentFilings`] row could not be converted.
#[derive(Debug)]
pub enum FilingRowError {
    MissingColumn(&'static str),
    Date(chrono::ParseError),
}

impl std::fmt::Display for FilingRowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilingRowError::MissingColumn(column) => write!(f, "missing {column} value"),
            FilingRowError::Date(err) => write!(f, "invalid date: {err}"),
        }
    }
}

impl From<chrono::ParseError> for FilingRowError {
    fn from(err: chrono::ParseError) -> Self {
        FilingRowError::Date(err)
    }
}

impl TryFrom<(&RecentFilings, usize)> for DetailedFiling {
    type Error = FilingRowError;

    fn try_from((recent, idx): (&RecentFilings, usize)) -> std::result::Result<Self, Self::Error> {
        let column = |values: &Vec<String>, name: &'static str| {
            values
                .get(idx)
                .cloned()
                .ok_or(FilingRowError::MissingColumn(name))
        };

        let acceptance = column(&recent.acceptance_date_time, "acceptanceDateTime")?;
        let acceptance_date_time = DateTime::parse_from_rfc3339(&acceptance)?;
        let filing_date =
            NaiveDate::parse_from_str(&column(&recent.filing_date, "filingDate")?, "%Y-%m-%d")?;

        Ok(DetailedFiling {
            accession_number: column(&recent.accession_number, "accessionNumber")?,
            filing_date,
            report_date: recent
                .get_vec_item_at(&recent.report_date, idx)
                .filter(|d| !d.is_empty()),
            acceptance_date_time,
            form: column(&recent.form, "form")?,
            file_number: recent.get_vec_item_at(&recent.file_number, idx),
            items: recent
                .get_vec_item_at(&recent.items, idx)
                .filter(|i| !i.is_empty()),
            size: recent.size.get(idx).copied().unwrap_or_default(),
            is_xbrl: recent.get_bool_at(&recent.is_xbrl, idx),
            is_inline_xbrl: recent.get_bool_at(&recent.is_inline_xbrl, idx),
            primary_document: recent.get_vec_item_at(&recent.primary_document, idx),
            primary_doc_description: recent.get_vec_item_at(&recent.primary_doc_description, idx),
        })
    }
}

#[derive(Debug)]
enum UrlType {
    Submission,
    FilingIndex,
    FilingContent,
    TextFiling,
}

/// CIK without zero padding, as the archive paths expect.
fn archive_cik(cik: &str) -> &str {
    let trimmed = cik.trim().trim_start_matches('0');
    if trimmed.is_empty() { "0" } else { trimmed }
}

impl Edgar {
    fn build_url(&self, url_type: UrlType, params: &[&str]) -> String {
        match url_type {
            UrlType::Submission => {
                let cik = format!("{:0>10}", params[0].trim());
                format!("{}/submissions/CIK{}.json", self.edgar_data_url, cik)
            }
            UrlType::FilingIndex => {
                let (cik, acc_no) = (archive_cik(params[0]), params[1]);
                format!(
                    "{}/data/{}/{}/{}-index.json",
                    self.edgar_archives_url,
                    cik,
                    acc_no.replace('-', ""),
                    acc_no
                )
            }
            UrlType::FilingContent => {
                let (cik, acc_no, filename) = (archive_cik(params[0]), params[1], params[2]);
                format!(
                    "{}/data/{}/{}/{}",
                    self.edgar_archives_url,
                    cik,
                    acc_no.replace('-', ""),
                    filename
                )
            }
            UrlType::TextFiling => {
                // /Archives/edgar/data/CIK/ACC_NO_NO_DASHES/ACC_NO_WITH_DASHES.txt
                let (cik, acc_no) = (archive_cik(params[0]), params[1]);
                format!(
                    "{}/data/{}/{}/{}.txt",
                    self.edgar_archives_url,
                    cik,
                    acc_no.replace('-', ""),
                    acc_no
                )
            }
        }
    }

    /// URL of one document inside a filing.
    pub fn filing_url(&self, cik: &str, accession_number: &str, filename: &str) -> String {
        self.build_url(UrlType::FilingContent, &[cik, accession_number, filename])
    }

    /// URL of the full-submission text file of a filing.
    pub fn text_filing_url(&self, cik: &str, accession_number: &str) -> String {
        self.build_url(UrlType::TextFiling, &[cik, accession_number])
    }
}

/// Filing history and documents.
///
/// # Errors
///
/// Transport and status errors propagate from the HTTP layer. `filing_index` turns a 404
/// into `EdgarError::FilingNotFound` so callers can tell a bad accession number from a
/// bad URL.
#[async_trait]
impl FilingOperations for Edgar {
    /// Retrieves the submission record and recent filing history for a CIK.
    ///
    /// The CIK may be given with or without zero padding.
    async fn submissions(&self, cik: &str) -> Result<Submission> {
        let url = self.build_url(UrlType::Submission, &[cik]);
        self.get_json(&url).await
    }

    /// Retrieves recent filings for a CIK as [`DetailedFiling`] rows, newest first.
    async fn recent_filings(&self, cik: &str) -> Result<Vec<DetailedFiling>> {
        let submission = self.submissions(cik).await?;
        Ok(submission.filings.recent.to_detailed())
    }

    /// Retrieves recent filings filtered by `opts`.
    ///
    /// Form types match exactly (amendments only with `include_amendments`), the date
    /// range is inclusive at both ends, and offset/limit apply after filtering.
    async fn filings(&self, cik: &str, opts: Option<FilingOptions>) -> Result<Vec<DetailedFiling>> {
        let all_filings = self.recent_filings(cik).await?;
        Ok(match opts {
            Some(opts) => opts.apply(all_filings),
            None => all_filings,
        })
    }

    /// Retrieves the manifest of files in one filing.
    ///
    /// # Errors
    ///
    /// Returns `EdgarError::FilingNotFound` if SEC.gov has no such filing for the CIK.
    async fn filing_index(&self, cik: &str, accession_number: &str) -> Result<DirectoryResponse> {
        let url = self.build_url(UrlType::FilingIndex, &[cik, accession_number]);
        self.get_json(&url).await.map_err(|err| match err {
            EdgarError::NotFound { .. } => EdgarError::FilingNotFound {
                cik: cik.to_string(),
                accession: accession_number.to_string(),
            },
            other => other,
        })
    }

    /// Retrieves one document of a filing as text.
    async fn filing_document(
        &self,
        cik: &str,
        accession_number: &str,
        document: &str,
    ) -> Result<String> {
        let url = self.filing_url(cik, accession_number, document);
        self.fetch_text(&url).await
    }

    /// Retrieves the full-submission `.txt` of a filing, SGML header included.
    async fn filing_text(&self, cik: &str, accession_number: &str) -> Result<String> {
        let url = self.text_filing_url(cik, accession_number);
        self.fetch_text(&url).await
    }

    /// Retrieves the primary document of the most recent filing of `form_type`.
    ///
    /// # Errors
    ///
    /// Returns `EdgarError::FilingNotFound` if the company has no such filing or the filing
    /// lists no primary document.
    async fn latest_filing_content(&self, cik: &str, form_type: &str) -> Result<String> {
        let opts = FilingOptions::new().with_form_type(form_type).with_limit(1);
        let filings = self.filings(cik, Some(opts)).await?;
        let not_found = || EdgarError::FilingNotFound {
            cik: cik.to_string(),
            accession: format!("latest {form_type}"),
        };
        let filing = filings.first().ok_or_else(not_found)?;
        let primary_doc = filing.primary_document.as_deref().ok_or_else(not_found)?;
        self.filing_document(cik, &filing.accession_number, primary_doc)
            .await
    }

    /// Fetches submissions for many CIKs concurrently, one `Result` per CIK.
    ///
    /// Requests still pass through the shared rate gate, so this is concurrent in
    /// waiting, not in dispatch rate.
    async fn batch_submissions(&self, ciks: &[&str]) -> Vec<(String, Result<Submission>)> {
        let results = join_all(ciks.iter().map(|cik| self.submissions(cik))).await;
        ciks.iter()
            .map(|cik| cik.to_string())
            .zip(results)
            .collect()
    }
}
