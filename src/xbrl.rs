//! XBRL endpoints of the SEC data API.
//!
//! - `company_facts(cik)`: every fact a company has tagged, grouped by taxonomy.
//! - `company_concept(cik, taxonomy, tag, unit)`: one concept's time series, optionally
//!   narrowed to a single unit of measure.
//! - `frames(taxonomy, tag, unit, period)`: one concept across all companies for a
//!   calendar period.

use super::Edgar;
use super::XbrlOperations;
use super::error::{EdgarError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Complete set of XBRL facts reported by a company across all filings.
///
/// Facts are organized by taxonomy (US-GAAP, DEI, and any others such as IFRS) and then by
/// concept tag. For a single concept prefer [`CompanyConcept`], which is much smaller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyFacts {
    pub cik: u64,
    #[serde(rename = "entityName")]
    pub entity_name: String,
    #[serde(rename = "facts")]
    pub taxonomies: TaxonomyGroups,
}

/// Facts grouped by taxonomy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxonomyGroups {
    #[serde(rename = "us-gaap", default)]
    pub us_gaap: HashMap<String, Fact>,
    #[serde(default)]
    pub dei: HashMap<String, Fact>,
    /// Any other taxonomy, keyed by its prefix (e.g. `ifrs-full`, `srt`)
    #[serde(flatten)]
    pub other: HashMap<String, HashMap<String, Fact>>,
}

/// A single XBRL concept with its data points per unit of measure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub units: HashMap<String, Vec<DataPoint>>,
}

/// One reported value for one period.
///
/// Duration facts (income statement) carry `start`; instant facts (balance sheet) do not.
/// `val` is usually numeric but some concepts are text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    pub end: String,
    pub val: serde_json::Value,
    pub accn: String,
    #[serde(default)]
    pub fy: Option<i32>,
    #[serde(default)]
    pub fp: Option<String>,
    pub form: String,
    pub filed: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<String>,
}

/// Historical data for a single XBRL concept across a company's filings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyConcept {
    pub cik: u64,
    pub taxonomy: String,
    pub tag: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub units: HashMap<String, Vec<DataPoint>>,
}

impl CompanyConcept {
    /// Keeps only the data points reported in `unit` (matched case-insensitively).
    pub fn retain_unit(&mut self, unit: &str) {
        self.units.retain(|key, _| key.eq_ignore_ascii_case(unit));
    }
}

/// One concept across all companies for one period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub ccp: String,
    pub tag: String,
    pub taxonomy: String,
    pub uom: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub pts: u64,
    #[serde(rename = "data")]
    pub data_points: Vec<FrameDataPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameDataPoint {
    #[serde(rename = "entityName")]
    pub entity_name: String,
    pub cik: u64,
    pub val: f64,
    pub accn: String,
    #[serde(default)]
    pub loc: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    pub end: String,
}

/// Calendar period of a frame request.
///
/// Renders as `CY2023` (annual), `CY2023Q1` (quarterly duration) or `CY2023Q1I`
/// (instant at quarter end).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePeriod {
    Annual(i32),
    Quarterly(i32, u8),
    Instantaneous(i32, u8),
}

impl FramePeriod {
    /// A quarterly duration period.
    ///
    /// # Errors
    ///
    /// Returns `EdgarError::InvalidPeriod` if `quarter` is not in `1..=4`.
    pub fn quarterly(year: i32, quarter: u8) -> Result<Self> {
        check_quarter(quarter)?;
        Ok(FramePeriod::Quarterly(year, quarter))
    }

    /// An instant at the end of a quarter.
    ///
    /// # Errors
    ///
    /// Returns `EdgarError::InvalidPeriod` if `quarter` is not in `1..=4`.
    pub fn instantaneous(year: i32, quarter: u8) -> Result<Self> {
        check_quarter(quarter)?;
        Ok(FramePeriod::Instantaneous(year, quarter))
    }
}

fn check_quarter(quarter: u8) -> Result<()> {
    if (1..=4).contains(&quarter) {
        Ok(())
    } else {
        Err(EdgarError::InvalidPeriod(format!(
            "quarter must be between 1 and 4, got {quarter}"
        )))
    }
}

impl fmt::Display for FramePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FramePeriod::Annual(year) => write!(f, "CY{year}"),
            FramePeriod::Quarterly(year, q) => write!(f, "CY{year}Q{q}"),
            FramePeriod::Instantaneous(year, q) => write!(f, "CY{year}Q{q}I"),
        }
    }
}

impl FromStr for FramePeriod {
    type Err = EdgarError;

    /// Accepts `YYYY`, `YYYYQn` and `YYYYQnI`, with or without a `CY` prefix.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || EdgarError::InvalidPeriod(format!("unrecognized frame period '{s}'"));
        let upper = s.trim().to_ascii_uppercase();
        let body = upper.strip_prefix("CY").unwrap_or(&upper);

        if body.len() < 4 || !body.is_char_boundary(4) {
            return Err(invalid());
        }
        let (year, rest) = body.split_at(4);
        let year: i32 = year.parse().map_err(|_| invalid())?;

        if rest.is_empty() {
            return Ok(FramePeriod::Annual(year));
        }
        let quarter_part = rest.strip_prefix('Q').ok_or_else(invalid)?;
        let (quarter, instant) = match quarter_part.strip_suffix('I') {
            Some(q) => (q, true),
            None => (quarter_part, false),
        };
        let quarter: u8 = quarter.parse().map_err(|_| invalid())?;
        if instant {
            FramePeriod::instantaneous(year, quarter)
        } else {
            FramePeriod::quarterly(year, quarter)
        }
    }
}

#[derive(Debug)]
enum XbrlUrlType {
    CompanyFacts,
    CompanyConcept,
    Frames,
}

impl Edgar {
    fn build_xbrl_url(&self, url_type: XbrlUrlType, params: &[&str]) -> String {
        match url_type {
            XbrlUrlType::CompanyFacts => {
                let padded_cik = format!("{:0>10}", params[0]);
                format!(
                    "{}/api/xbrl/companyfacts/CIK{}.json",
                    self.edgar_data_url, padded_cik
                )
            }
            XbrlUrlType::CompanyConcept => {
                let (cik, taxonomy, tag) = (params[0], params[1], params[2]);
                let padded_cik = format!("{:0>10}", cik);
                format!(
                    "{}/api/xbrl/companyconcept/CIK{}/{}/{}.json",
                    self.edgar_data_url, padded_cik, taxonomy, tag
                )
            }
            XbrlUrlType::Frames => {
                let (taxonomy, tag, unit, period) = (params[0], params[1], params[2], params[3]);
                format!(
                    "{}/api/xbrl/frames/{}/{}/{}/{}.json",
                    self.edgar_data_url, taxonomy, tag, unit, period
                )
            }
        }
    }
}

#[async_trait]
impl XbrlOperations for Edgar {
    /// Retrieves every XBRL fact a company has reported.
    async fn company_facts(&self, cik: u64) -> Result<CompanyFacts> {
        let url = self.build_xbrl_url(XbrlUrlType::CompanyFacts, &[&cik.to_string()]);
        self.get_json(&url).await
    }

    /// Retrieves one concept's time series for a company.
    ///
    /// # Arguments
    ///
    /// * `cik` - Company CIK
    /// * `taxonomy` - e.g. "us-gaap", "dei", "ifrs-full"
    /// * `tag` - concept name, e.g. "AccountsPayableCurrent"
    /// * `unit` - when given, only data points in this unit are kept
    ///
    /// # Errors
    ///
    /// Returns `EdgarError::ConceptNotFound` if the company never reported the concept.
    async fn company_concept(
        &self,
        cik: u64,
        taxonomy: &str,
        tag: &str,
        unit: Option<&str>,
    ) -> Result<CompanyConcept> {
        let url = self.build_xbrl_url(
            XbrlUrlType::CompanyConcept,
            &[&cik.to_string(), taxonomy, tag],
        );
        let mut concept: CompanyConcept = self.get_json(&url).await.map_err(|err| match err {
            EdgarError::NotFound { .. } => EdgarError::ConceptNotFound {
                cik,
                taxonomy: taxonomy.to_string(),
                tag: tag.to_string(),
            },
            other => other,
        })?;
        if let Some(unit) = unit {
            concept.retain_unit(unit);
        }
        Ok(concept)
    }

    /// Retrieves one concept across all companies for a calendar period.
    async fn frames(
        &self,
        taxonomy: &str,
        tag: &str,
        unit: &str,
        period: FramePeriod,
    ) -> Result<Frame> {
        let period = period.to_string();
        let url = self.build_xbrl_url(XbrlUrlType::Frames, &[taxonomy, tag, unit, &period]);
        self.get_json(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_period_display() {
        assert_eq!(FramePeriod::Annual(2023).to_string(), "CY2023");
        assert_eq!(FramePeriod::quarterly(2019, 1).unwrap().to_string(), "CY2019Q1");
        assert_eq!(
            FramePeriod::instantaneous(2019, 1).unwrap().to_string(),
            "CY2019Q1I"
        );
    }

    #[test]
    fn test_frame_period_parse() {
        assert_eq!("2023".parse::<FramePeriod>().unwrap(), FramePeriod::Annual(2023));
        assert_eq!(
            "cy2024q2".parse::<FramePeriod>().unwrap(),
            FramePeriod::Quarterly(2024, 2)
        );
        assert_eq!(
            "2019Q1I".parse::<FramePeriod>().unwrap(),
            FramePeriod::Instantaneous(2019, 1)
        );
        assert!("2019Q5".parse::<FramePeriod>().is_err());
        assert!("FY2020".parse::<FramePeriod>().is_err());
        assert!("20".parse::<FramePeriod>().is_err());
    }

    #[test]
    fn test_invalid_quarter() {
        assert!(matches!(
            FramePeriod::quarterly(2024, 0),
            Err(EdgarError::InvalidPeriod(_))
        ));
    }

    #[test]
    fn test_parse_fact_with_null_fields() {
        let json = r#"{
                "label": null,
                "description": null,
                "units": {
                    "USD": [
                        {
                            "end": "2021-12-31",
                            "val": 1000000,
                            "accn": "0001234567-21-000001",
                            "fy": 2021,
                            "fp": "FY",
                            "form": "10-K",
                            "filed": "2022-01-31"
                        }
                    ]
                }
            }"#;

        let fact: Fact = serde_json::from_str(json).unwrap();
        assert!(fact.label.is_none());
        assert!(fact.description.is_none());
        assert!(!fact.units.is_empty());
    }

    #[test]
    fn test_retain_unit() {
        let json = r#"{
            "cik": 320193, "taxonomy": "us-gaap", "tag": "Revenues",
            "units": {
                "USD": [{"end": "2021-12-31", "val": 5, "accn": "a", "form": "10-K", "filed": "2022-01-31"}],
                "EUR": [{"end": "2021-12-31", "val": 4, "accn": "a", "form": "10-K", "filed": "2022-01-31"}]
            }
        }"#;
        let mut concept: CompanyConcept = serde_json::from_str(json).unwrap();
        concept.retain_unit("usd");
        assert_eq!(concept.units.len(), 1);
        assert!(concept.units.contains_key("USD"));
    }

    #[test]
    fn test_url_building() {
        let edgar = Edgar::new("test_agent example@example.com").unwrap();
        assert_eq!(
            edgar.build_xbrl_url(XbrlUrlType::CompanyFacts, &["320193"]),
            "https://data.sec.gov/api/xbrl/companyfacts/CIK0000320193.json"
        );
        assert_eq!(
            edgar.build_xbrl_url(
                XbrlUrlType::Frames,
                &["us-gaap", "AccountsPayableCurrent", "USD", "CY2019Q1I"]
            ),
            "https://data.sec.gov/api/xbrl/frames/us-gaap/AccountsPayableCurrent/USD/CY2019Q1I.json"
        );
    }
}
