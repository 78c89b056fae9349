//! Parser for insider ownership forms (Forms 3, 4 and 5).
//!
//! These XML documents report what officers, directors and 10% holders own and how
//! that changed:
//!
//! - Form 3: initial statement of beneficial ownership
//! - Form 4: changes in beneficial ownership, due within two business days
//! - Form 5: annual statement of changes that were exempt from, or missed by, Form 4
//!
//! The document is read eagerly, so malformed XML fails in the constructor. Field
//! extraction after that never fails: missing numbers are `0.0`, missing or
//! unparseable dates are `None` (with a warning), missing text is empty.
//!
//! ```ignore
//! let parser = Form4Parser::new(&xml)?;
//! let form = parser.parse_all();
//! for tx in &form.non_derivative_transactions {
//!     println!("{} {} shares at {}", tx.code, tx.shares, tx.price_per_share);
//! }
//! ```

use super::header::parse_date;
use super::xml::{XmlElement, parse_document};
use crate::error::{EdgarError, Result};
use chrono::NaiveDate;
use std::ops::Deref;
use std::sync::OnceLock;
use tracing::warn;

/// How a document's form type was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormTypeSource {
    /// Read from the document's `documentType` element.
    Declared,
    /// `documentType` was missing; the configured fallback was applied because the
    /// document carries a `schemaVersion`. This is a guess, not an inference.
    SchemaFallback,
}

/// Options controlling how an ownership document is interpreted.
#[derive(Debug, Clone)]
pub struct OwnershipParseOptions {
    /// Form type assumed when `documentType` is absent but `schemaVersion` is present.
    /// `None` makes such documents an error instead.
    pub fallback_form_type: Option<String>,
}

impl Default for OwnershipParseOptions {
    fn default() -> Self {
        Self {
            fallback_form_type: Some("4".to_string()),
        }
    }
}

impl OwnershipParseOptions {
    pub fn without_fallback() -> Self {
        Self {
            fallback_form_type: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentInfo {
    pub form_type: String,
    pub form_type_source: FormTypeSource,
    pub schema_version: String,
    pub document_type: String,
    pub period_of_report: Option<NaiveDate>,
    pub date_of_original_submission: Option<NaiveDate>,
    /// `None` when the element is absent.
    pub not_subject_to_section16: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssuerInfo {
    pub cik: String,
    pub name: String,
    pub trading_symbol: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OwnerRelationship {
    pub is_director: bool,
    pub is_officer: bool,
    pub is_ten_percent_owner: bool,
    pub is_other: bool,
    pub officer_title: String,
    pub other_text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportingOwnerInfo {
    pub cik: String,
    pub name: String,
    pub street1: String,
    pub street2: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub state_description: String,
    pub relationship: Option<OwnerRelationship>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NonDerivativeTransaction {
    pub security_title: String,
    pub transaction_date: Option<NaiveDate>,
    pub shares: f64,
    pub price_per_share: f64,
    /// `A` (acquired) or `D` (disposed).
    pub acquired_disposed_code: String,
    /// Form the transaction belongs to; a Form 5 lists late Form 4 transactions as `4`.
    pub transaction_form_type: String,
    /// SEC transaction code, e.g. `S` (open market sale), `P` (purchase), `A` (grant).
    pub code: String,
    pub equity_swap_involved: bool,
    pub shares_owned_following_transaction: f64,
    pub direct_or_indirect_ownership: String,
    pub nature_of_ownership: String,
}

impl NonDerivativeTransaction {
    /// Shares times price per share.
    pub fn value(&self) -> f64 {
        self.shares * self.price_per_share
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NonDerivativeHolding {
    pub security_title: String,
    pub shares_owned: f64,
    pub direct_or_indirect_ownership: String,
    pub nature_of_ownership: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivativeTransaction {
    pub security_title: String,
    pub conversion_or_exercise_price: f64,
    pub transaction_date: Option<NaiveDate>,
    pub shares: f64,
    pub total_value: f64,
    pub acquired_disposed_code: String,
    pub code: String,
    pub exercise_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    pub underlying_title: String,
    pub underlying_shares: f64,
}

/// Everything extracted from one ownership document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOwnershipForm {
    pub document_info: DocumentInfo,
    pub issuer: Option<IssuerInfo>,
    pub reporting_owner: Option<ReportingOwnerInfo>,
    pub non_derivative_transactions: Vec<NonDerivativeTransaction>,
    pub non_derivative_holdings: Vec<NonDerivativeHolding>,
    pub derivative_transactions: Vec<DerivativeTransaction>,
    /// Recoverable problems met while parsing, such as unparseable dates.
    pub warnings: Vec<String>,
}

/// Generic parser for Forms 3, 4 and 5.
#[derive(Debug)]
pub struct OwnershipFormParser {
    root: XmlElement,
    form_type: String,
    form_type_source: FormTypeSource,
    notes: Vec<String>,
    parsed: OnceLock<ParsedOwnershipForm>,
}

impl OwnershipFormParser {
    /// Parses `xml` with the default options (missing `documentType` falls back to Form 4).
    ///
    /// # Errors
    ///
    /// Returns `EdgarError::OwnershipParse` if the text is not well-formed XML or the form
    /// type cannot be determined.
    pub fn new(xml: &str) -> Result<Self> {
        Self::with_options(xml, &OwnershipParseOptions::default())
    }

    /// Parses raw bytes; invalid UTF-8 sequences are replaced rather than rejected.
    pub fn from_bytes(xml: &[u8]) -> Result<Self> {
        Self::new(&String::from_utf8_lossy(xml))
    }

    pub fn with_options(xml: &str, options: &OwnershipParseOptions) -> Result<Self> {
        let root = parse_document(xml).map_err(|err| EdgarError::OwnershipParse {
            message: err.message,
            position: err.position,
        })?;

        let mut notes = Vec::new();
        let declared = root
            .find("documentType")
            .and_then(XmlElement::scalar)
            .map(str::to_string);

        let (form_type, form_type_source) = match declared {
            Some(form_type) => (form_type, FormTypeSource::Declared),
            None => {
                let fallback = options
                    .fallback_form_type
                    .as_ref()
                    .filter(|_| root.find("schemaVersion").is_some())
                    .ok_or_else(|| EdgarError::OwnershipParse {
                        message: "could not determine form type: no documentType element"
                            .to_string(),
                        position: None,
                    })?;
                let note = format!(
                    "documentType missing; assuming Form {fallback} from schemaVersion"
                );
                warn!("{note}");
                notes.push(note);
                (fallback.clone(), FormTypeSource::SchemaFallback)
            }
        };

        Ok(Self {
            root,
            form_type,
            form_type_source,
            notes,
            parsed: OnceLock::new(),
        })
    }

    pub fn form_type(&self) -> &str {
        &self.form_type
    }

    pub fn form_type_source(&self) -> FormTypeSource {
        self.form_type_source
    }

    /// Parses every section once and returns the cached result on later calls.
    pub fn parse_all(&self) -> &ParsedOwnershipForm {
        self.parsed.get_or_init(|| {
            let mut fields = FieldReader {
                warnings: self.notes.clone(),
            };
            let form = ParsedOwnershipForm {
                document_info: fields.document_info(
                    &self.root,
                    &self.form_type,
                    self.form_type_source,
                ),
                issuer: self.root.find("issuer").map(FieldReader::issuer),
                reporting_owner: self
                    .root
                    .find("reportingOwner")
                    .map(FieldReader::reporting_owner),
                non_derivative_transactions: self
                    .root
                    .find_all("nonDerivativeTransaction")
                    .into_iter()
                    .map(|e| fields.non_derivative_transaction(e))
                    .collect(),
                non_derivative_holdings: self
                    .root
                    .find_all("nonDerivativeHolding")
                    .into_iter()
                    .map(FieldReader::non_derivative_holding)
                    .collect(),
                derivative_transactions: self
                    .root
                    .find_all("derivativeTransaction")
                    .into_iter()
                    .map(|e| fields.derivative_transaction(e))
                    .collect(),
                warnings: Vec::new(),
            };
            ParsedOwnershipForm {
                warnings: fields.warnings,
                ..form
            }
        })
    }

    pub fn document_info(&self) -> &DocumentInfo {
        &self.parse_all().document_info
    }

    pub fn issuer(&self) -> Option<&IssuerInfo> {
        self.parse_all().issuer.as_ref()
    }

    pub fn reporting_owner(&self) -> Option<&ReportingOwnerInfo> {
        self.parse_all().reporting_owner.as_ref()
    }

    pub fn non_derivative_transactions(&self) -> &[NonDerivativeTransaction] {
        &self.parse_all().non_derivative_transactions
    }

    pub fn non_derivative_holdings(&self) -> &[NonDerivativeHolding] {
        &self.parse_all().non_derivative_holdings
    }

    pub fn derivative_transactions(&self) -> &[DerivativeTransaction] {
        &self.parse_all().derivative_transactions
    }

    pub fn warnings(&self) -> &[String] {
        &self.parse_all().warnings
    }

    fn expect_form_type(mut self, expected: &str) -> Self {
        if self.form_type != expected {
            let note = format!("expected Form {expected}, but found Form {}", self.form_type);
            warn!("{note}");
            self.notes.push(note);
        }
        self
    }
}

/// Field extraction shared by every section; collects warnings as it goes.
struct FieldReader {
    warnings: Vec<String>,
}

impl FieldReader {
    fn text(element: &XmlElement, path: &str) -> String {
        element
            .path(path)
            .and_then(XmlElement::scalar)
            .unwrap_or_default()
            .to_string()
    }

    fn number(element: &XmlElement, path: &str) -> f64 {
        element
            .path(path)
            .and_then(XmlElement::scalar)
            .and_then(|s| s.replace(',', "").parse::<f64>().ok())
            .filter(|n| n.is_finite())
            .unwrap_or(0.0)
    }

    fn flag(element: &XmlElement, path: &str) -> bool {
        element
            .path(path)
            .and_then(XmlElement::scalar)
            .is_some_and(|s| s == "1" || s.eq_ignore_ascii_case("true"))
    }

    fn date(&mut self, element: &XmlElement, path: &str) -> Option<NaiveDate> {
        self.date_of(element.path(path), path)
    }

    fn date_of(&mut self, element: Option<&XmlElement>, field: &str) -> Option<NaiveDate> {
        let text = element.and_then(XmlElement::scalar)?;
        let date = parse_date(text);
        if date.is_none() {
            let note = format!("could not parse date '{text}' in <{field}>");
            warn!("{note}");
            self.warnings.push(note);
        }
        date
    }

    fn document_info(
        &mut self,
        root: &XmlElement,
        form_type: &str,
        form_type_source: FormTypeSource,
    ) -> DocumentInfo {
        let top = |name: &str| root.find(name);
        DocumentInfo {
            form_type: form_type.to_string(),
            form_type_source,
            schema_version: top("schemaVersion")
                .and_then(XmlElement::scalar)
                .unwrap_or_default()
                .to_string(),
            document_type: top("documentType")
                .and_then(XmlElement::scalar)
                .unwrap_or_default()
                .to_string(),
            period_of_report: self.date_of(top("periodOfReport"), "periodOfReport"),
            date_of_original_submission: self
                .date_of(top("dateOfOriginalSubmission"), "dateOfOriginalSubmission"),
            not_subject_to_section16: top("notSubjectToSection16")
                .map(|e| e.scalar().is_some_and(|s| s == "1" || s.eq_ignore_ascii_case("true"))),
        }
    }

    fn issuer(issuer: &XmlElement) -> IssuerInfo {
        IssuerInfo {
            cik: Self::text(issuer, "issuerCik"),
            name: Self::text(issuer, "issuerName"),
            trading_symbol: Self::text(issuer, "issuerTradingSymbol"),
        }
    }

    fn reporting_owner(owner: &XmlElement) -> ReportingOwnerInfo {
        let id = owner.child("reportingOwnerId");
        let address = owner.child("reportingOwnerAddress");
        // Addresses sit in their own element in current schemas and inside the id in old ones.
        let addr = |name: &str| {
            address
                .map(|a| Self::text(a, name))
                .filter(|s| !s.is_empty())
                .or_else(|| id.map(|i| Self::text(i, name)))
                .unwrap_or_default()
        };
        ReportingOwnerInfo {
            cik: id.map(|i| Self::text(i, "rptOwnerCik")).unwrap_or_default(),
            name: id.map(|i| Self::text(i, "rptOwnerName")).unwrap_or_default(),
            street1: addr("rptOwnerStreet1"),
            street2: addr("rptOwnerStreet2"),
            city: addr("rptOwnerCity"),
            state: addr("rptOwnerState"),
            zip_code: addr("rptOwnerZipCode"),
            state_description: addr("rptOwnerStateDescription"),
            relationship: owner
                .child("reportingOwnerRelationship")
                .map(|r| OwnerRelationship {
                    is_director: Self::flag(r, "isDirector"),
                    is_officer: Self::flag(r, "isOfficer"),
                    is_ten_percent_owner: Self::flag(r, "isTenPercentOwner"),
                    is_other: Self::flag(r, "isOther"),
                    officer_title: Self::text(r, "officerTitle"),
                    other_text: Self::text(r, "otherText"),
                }),
        }
    }

    fn non_derivative_transaction(&mut self, tx: &XmlElement) -> NonDerivativeTransaction {
        NonDerivativeTransaction {
            security_title: Self::text(tx, "securityTitle"),
            transaction_date: self.date(tx, "transactionDate"),
            shares: Self::number(tx, "transactionAmounts/transactionShares"),
            price_per_share: Self::number(tx, "transactionAmounts/transactionPricePerShare"),
            acquired_disposed_code: Self::text(
                tx,
                "transactionAmounts/transactionAcquiredDisposedCode",
            ),
            transaction_form_type: Self::text(tx, "transactionCoding/transactionFormType"),
            code: Self::text(tx, "transactionCoding/transactionCode"),
            equity_swap_involved: Self::flag(tx, "transactionCoding/equitySwapInvolved"),
            shares_owned_following_transaction: Self::number(
                tx,
                "postTransactionAmounts/sharesOwnedFollowingTransaction",
            ),
            direct_or_indirect_ownership: Self::ownership_kind(tx),
            nature_of_ownership: Self::ownership_nature(tx),
        }
    }

    fn non_derivative_holding(holding: &XmlElement) -> NonDerivativeHolding {
        let shares_owned = match holding.child("sharesOwned") {
            Some(_) => Self::number(holding, "sharesOwned"),
            None => Self::number(holding, "postTransactionAmounts/sharesOwnedFollowingTransaction"),
        };
        NonDerivativeHolding {
            security_title: Self::text(holding, "securityTitle"),
            shares_owned,
            direct_or_indirect_ownership: Self::ownership_kind(holding),
            nature_of_ownership: Self::ownership_nature(holding),
        }
    }

    fn derivative_transaction(&mut self, tx: &XmlElement) -> DerivativeTransaction {
        DerivativeTransaction {
            security_title: Self::text(tx, "securityTitle"),
            conversion_or_exercise_price: Self::number(tx, "conversionOrExercisePrice"),
            transaction_date: self.date(tx, "transactionDate"),
            shares: Self::number(tx, "transactionAmounts/transactionShares"),
            total_value: Self::number(tx, "transactionAmounts/transactionTotalValue"),
            acquired_disposed_code: Self::text(
                tx,
                "transactionAmounts/transactionAcquiredDisposedCode",
            ),
            code: Self::text(tx, "transactionCoding/transactionCode"),
            exercise_date: self.date(tx, "exerciseDate"),
            expiration_date: self.date(tx, "expirationDate"),
            underlying_title: Self::text(tx, "underlyingSecurity/underlyingSecurityTitle"),
            underlying_shares: Self::number(tx, "underlyingSecurity/underlyingSecurityShares"),
        }
    }

    /// `D` or `I`, found either at the top of the entry or under `ownershipNature`.
    fn ownership_kind(entry: &XmlElement) -> String {
        [
            "directOrIndirectOwnership",
            "ownershipNature/directOrIndirectOwnership",
            "postTransactionAmounts/directOrIndirectOwnership",
        ]
        .iter()
        .map(|path| Self::text(entry, path))
        .find(|s| !s.is_empty())
        .unwrap_or_default()
    }

    /// Free-text nature of ownership: `ownershipNature/natureOfOwnership` in the current
    /// schema, or a bare value under `ownershipNature`.
    fn ownership_nature(entry: &XmlElement) -> String {
        let Some(nature) = entry.child("ownershipNature") else {
            return String::new();
        };
        match nature.child("natureOfOwnership") {
            Some(inner) => inner.scalar().unwrap_or_default().to_string(),
            None => nature
                .child("value")
                .and_then(XmlElement::scalar)
                .unwrap_or_default()
                .to_string(),
        }
    }
}

/// Form 4 parser: the generic parser plus a form-type check and Form 4 summaries.
#[derive(Debug)]
pub struct Form4Parser(OwnershipFormParser);

impl Form4Parser {
    /// Parses `xml`, warning (not failing) if the document declares another form type.
    pub fn new(xml: &str) -> Result<Self> {
        Ok(Self(OwnershipFormParser::new(xml)?.expect_form_type("4")))
    }

    pub fn from_parser(parser: OwnershipFormParser) -> Self {
        Self(parser.expect_form_type("4"))
    }

    /// Total non-derivative shares acquired (`A`) in this filing.
    pub fn total_shares_acquired(&self) -> f64 {
        self.total_shares("A")
    }

    /// Total non-derivative shares disposed of (`D`) in this filing.
    pub fn total_shares_disposed(&self) -> f64 {
        self.total_shares("D")
    }

    fn total_shares(&self, code: &str) -> f64 {
        self.non_derivative_transactions()
            .iter()
            .filter(|tx| tx.acquired_disposed_code.eq_ignore_ascii_case(code))
            .map(|tx| tx.shares)
            .sum()
    }

    pub fn into_inner(self) -> OwnershipFormParser {
        self.0
    }
}

impl Deref for Form4Parser {
    type Target = OwnershipFormParser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Form 5 parser: the generic parser plus a form-type check and Form 5 accessors.
#[derive(Debug)]
pub struct Form5Parser(OwnershipFormParser);

impl Form5Parser {
    /// Parses `xml`, warning (not failing) if the document declares another form type.
    pub fn new(xml: &str) -> Result<Self> {
        Ok(Self(OwnershipFormParser::new(xml)?.expect_form_type("5")))
    }

    pub fn from_parser(parser: OwnershipFormParser) -> Self {
        Self(parser.expect_form_type("5"))
    }

    /// Transactions that should have been reported on a Form 4 and are reported late here.
    pub fn late_form4_transactions(&self) -> Vec<&NonDerivativeTransaction> {
        self.non_derivative_transactions()
            .iter()
            .filter(|tx| tx.transaction_form_type == "4")
            .collect()
    }

    /// End of the issuer's fiscal year covered by this annual statement.
    pub fn fiscal_year_end(&self) -> Option<NaiveDate> {
        self.document_info().period_of_report
    }

    pub fn into_inner(self) -> OwnershipFormParser {
        self.0
    }
}

impl Deref for Form5Parser {
    type Target = OwnershipFormParser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"<ownershipDocument>
        <schemaVersion>X0306</schemaVersion>
        <documentType>4</documentType>
        <periodOfReport>01/15/2024</periodOfReport>
        <nonDerivativeTable>
            <nonDerivativeTransaction>
                <securityTitle><value>Common Stock</value></securityTitle>
                <transactionDate><value>2024-13-45</value></transactionDate>
                <transactionAmounts>
                    <transactionShares><value>not-a-number</value></transactionShares>
                    <transactionPricePerShare>12.5</transactionPricePerShare>
                </transactionAmounts>
            </nonDerivativeTransaction>
        </nonDerivativeTable>
    </ownershipDocument>"#;

    #[test]
    fn test_defaults_and_warnings() {
        let parser = OwnershipFormParser::new(MINIMAL).unwrap();
        let form = parser.parse_all();

        assert_eq!(form.document_info.period_of_report, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(form.document_info.not_subject_to_section16, None);
        assert!(form.issuer.is_none());

        let tx = &form.non_derivative_transactions[0];
        assert_eq!(tx.transaction_date, None);
        assert_eq!(tx.shares, 0.0);
        assert_eq!(tx.price_per_share, 12.5);
        assert_eq!(form.warnings.len(), 1);
        assert!(form.warnings[0].contains("2024-13-45"));
    }

    #[test]
    fn test_parse_all_is_cached() {
        let parser = OwnershipFormParser::new(MINIMAL).unwrap();
        let first = parser.parse_all() as *const ParsedOwnershipForm;
        let second = parser.parse_all() as *const ParsedOwnershipForm;
        assert_eq!(first, second);
        // Warnings are collected once, not once per call
        assert_eq!(parser.warnings().len(), 1);
    }

    #[test]
    fn test_schema_fallback() {
        let xml = "<ownershipDocument><schemaVersion>X0306</schemaVersion></ownershipDocument>";
        let parser = OwnershipFormParser::new(xml).unwrap();
        assert_eq!(parser.form_type(), "4");
        assert_eq!(parser.form_type_source(), FormTypeSource::SchemaFallback);
        assert_eq!(parser.warnings().len(), 1);

        let strict = OwnershipFormParser::with_options(xml, &OwnershipParseOptions::without_fallback());
        assert!(matches!(strict, Err(EdgarError::OwnershipParse { .. })));
    }

    #[test]
    fn test_no_form_type_markers() {
        let err = OwnershipFormParser::new("<test><other>1</other></test>").unwrap_err();
        assert!(matches!(err, EdgarError::OwnershipParse { position: None, .. }));
    }

    #[test]
    fn test_malformed_xml_fails_in_constructor() {
        let err = OwnershipFormParser::new("<invalid>unclosed tag").unwrap_err();
        assert!(matches!(err, EdgarError::OwnershipParse { .. }));
    }

    #[test]
    fn test_flags_accept_one_and_true() {
        let xml = r#"<ownershipDocument>
            <documentType>4</documentType>
            <reportingOwner>
                <reportingOwnerId><rptOwnerName>DOE JANE</rptOwnerName></reportingOwnerId>
                <reportingOwnerRelationship>
                    <isDirector>1</isDirector>
                    <isOfficer>TRUE</isOfficer>
                    <isTenPercentOwner>0</isTenPercentOwner>
                </reportingOwnerRelationship>
            </reportingOwner>
        </ownershipDocument>"#;
        let parser = OwnershipFormParser::new(xml).unwrap();
        let owner = parser.reporting_owner().unwrap();
        let relationship = owner.relationship.as_ref().unwrap();
        assert!(relationship.is_director);
        assert!(relationship.is_officer);
        assert!(!relationship.is_ten_percent_owner);
        assert!(!relationship.is_other);
        assert_eq!(owner.name, "DOE JANE");
        assert_eq!(owner.city, "");
    }

    #[test]
    fn test_type_mismatch_is_a_warning() {
        let xml = "<ownershipDocument><documentType>5</documentType></ownershipDocument>";
        let parser = Form4Parser::new(xml).unwrap();
        assert_eq!(parser.form_type(), "5");
        assert!(parser.warnings().iter().any(|w| w.contains("expected Form 4")));
    }
}
