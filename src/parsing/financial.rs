//! Best-effort extraction of financial data from 10-K and 10-Q text.
//!
//! Annual and quarterly reports are not a fixed grammar. Each extractor here is a small
//! independent rule: find a section by heading, then pick out lines that look like
//! `Label ..... $ 1,234`. A section that cannot be found yields empty results rather
//! than an error, so callers should treat every field as optional.
//!
//! Amounts are taken as printed. Most statements are presented "in millions" and that
//! scale is not applied, but an explicit magnitude next to an amount (`$2.1 billion`)
//! is.

use super::header::{FilingHeader, Severity, floor_char_boundary, parse_money, parse_number, truncate_chars};
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

/// How far past its heading a section may extend when no `</DOCUMENT>` closes it.
const SECTION_WINDOW: usize = 50_000;
const MAX_RISK_FACTORS: usize = 10;
const MAX_RISK_DESCRIPTION: usize = 500;
const MAX_MDNA_CONTENT: usize = 1000;
const MAX_KEY_METRICS: usize = 5;

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($re).expect(concat!("valid pattern ", stringify!($name))));
    };
}

pattern!(BALANCE_SHEET, r"(?i)consolidated\s+balance\s+sheets?|balance\s+sheets?");
pattern!(
    INCOME_STATEMENT,
    r"(?i)consolidated\s+statements?\s+of\s+(?:operations|income|earnings)|income\s+statements?|statements?\s+of\s+(?:operations|earnings)"
);
pattern!(
    CASH_FLOW,
    r"(?i)consolidated\s+statements?\s+of\s+cash\s+flows?|statements?\s+of\s+cash\s+flows?|cash\s+flows?\s+statements?"
);
pattern!(SEGMENTS, r"(?i)segment\s+information|business\s+segments?|geographic\s+information");
pattern!(RISK_FACTORS, r"(?i)risk\s+factors|item\s+1a\b");
pattern!(MDNA, r"(?i)management['’]s\s+discussion\s+and\s+analysis|md&a");
pattern!(NEXT_ITEM, r"(?im)^[^\S\n]*item\s+\d+[a-z]?\.");

pattern!(CURRENT_ASSETS, r"(?i)current[^$\n]*assets");
pattern!(NON_CURRENT_ASSETS, r"(?i)non-?\s*current[^$\n]*assets|property,?\s+plant[^$\n]*equipment");
pattern!(TOTAL_ASSETS, r"(?i)total\s+assets");
pattern!(INVENTORY, r"(?i)inventor(?:y|ies)");
pattern!(CURRENT_LIABILITIES, r"(?i)current[^$\n]*liabilities");
pattern!(NON_CURRENT_LIABILITIES, r"(?i)non-?\s*current[^$\n]*liabilities|long-?\s*term\s+debt");
pattern!(TOTAL_LIABILITIES, r"(?i)total\s+liabilities");
pattern!(
    TOTAL_EQUITY,
    r"(?i)total\s+(?:shareholders|stockholders)['’]?\s+equity|total\s+equity"
);
pattern!(RETAINED_EARNINGS, r"(?i)retained\s+earnings|accumulated\s+deficit");
pattern!(NON_CURRENT_LABEL, r"(?i)non-?\s*current");

pattern!(REVENUE, r"(?i)total\s+net\s+sales|total\s+revenues?|net\s+sales|net\s+revenues?|revenues?");
pattern!(COST_OF_REVENUE, r"(?i)cost\s+of\s+(?:sales|revenues?|goods\s+sold)");
pattern!(GROSS_PROFIT, r"(?i)gross\s+(?:profit|margin)");
pattern!(
    OPERATING_EXPENSES,
    r"(?i)research\s+and\s+development|selling,?\s+general\s+and\s+administrative|sales\s+and\s+marketing|total\s+operating\s+expenses"
);
pattern!(OPERATING_INCOME, r"(?i)operating\s+income|income\s+from\s+operations");
pattern!(NET_INCOME, r"(?i)net\s+income|net\s+earnings");
pattern!(EPS, r"(?i)earnings\s+per\s+share|diluted|basic");

pattern!(OPERATING_ACTIVITIES, r"(?i)operating\s+activities");
pattern!(INVESTING_ACTIVITIES, r"(?i)investing\s+activities");
pattern!(FINANCING_ACTIVITIES, r"(?i)financing\s+activities");
pattern!(
    NET_CASH_CHANGE,
    r"(?i)net\s+(?:increase|decrease|change)[^$\n]*cash|net\s+cash\s+flow"
);

pattern!(
    LINE_VALUE,
    r"(?i)\$\s*(\(?[0-9][0-9,]*(?:\.[0-9]+)?\)?)(?:\s*(million|billion|thousand)\b)?"
);
pattern!(
    SEGMENT_LINE,
    r"([A-Z][A-Za-z&]*(?:[ \t]+[A-Z][A-Za-z&]*)*)[ \t]+(?i:segment)[^\n]*?(?i:revenue)[^\n$]*\$\s*([0-9][0-9,]*(?:\.[0-9]+)?)(?:\s*(?i:(million|billion|thousand))\b)?"
);
pattern!(RISK_SPLIT, r"•|·|(?m:^)[^\S\n]*\d+\.\s|\n[^\S\n]*\n");
pattern!(
    MDNA_SPLIT,
    r"(?i)overview|results\s+of\s+operations|financial\s+condition|liquidity"
);
pattern!(
    KEY_METRIC,
    r"(?i)((?:\w+[ \t]+){0,3}\w+)[ \t]+(?:increased|decreased|changed)[ \t]+by[ \t]+([\d.]+%)"
);
pattern!(IX_NON_FRACTION, r"(?i)<ix:nonFraction([^>]*)>([^<]*)");
pattern!(XML_ATTRIBUTE, r#"([\w:.-]+)\s*=\s*"([^"]*)""#);

/// A labeled amount from a statement line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BalanceSheet {
    pub current_assets: Vec<LineItem>,
    pub non_current_assets: Vec<LineItem>,
    pub total_assets: Option<LineItem>,
    pub inventory: Option<LineItem>,
    pub current_liabilities: Vec<LineItem>,
    pub non_current_liabilities: Vec<LineItem>,
    pub total_liabilities: Option<LineItem>,
    pub total_equity: Option<LineItem>,
    pub retained_earnings: Option<LineItem>,
}

impl BalanceSheet {
    /// The "Total current assets" line if present, else the sum of current asset lines.
    pub fn total_current_assets(&self) -> Option<f64> {
        total_of(&self.current_assets)
    }

    pub fn total_current_liabilities(&self) -> Option<f64> {
        total_of(&self.current_liabilities)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncomeStatement {
    pub revenue: Option<LineItem>,
    pub cost_of_revenue: Option<LineItem>,
    pub gross_profit: Option<LineItem>,
    pub operating_expenses: Vec<LineItem>,
    pub operating_income: Option<LineItem>,
    pub net_income: Option<LineItem>,
    pub earnings_per_share: Option<LineItem>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CashFlowStatement {
    pub operating_activities: Vec<LineItem>,
    pub investing_activities: Vec<LineItem>,
    pub financing_activities: Vec<LineItem>,
    pub net_change_in_cash: Option<LineItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BusinessSegment {
    pub name: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskCategory {
    Market,
    Regulatory,
    Technology,
    Financial,
    Operational,
    General,
}

impl RiskCategory {
    const KEYWORDS: [(RiskCategory, &'static [&'static str]); 5] = [
        (RiskCategory::Market, &["market", "competition", "customer"]),
        (RiskCategory::Regulatory, &["regulation", "compliance", "legal"]),
        (RiskCategory::Technology, &["technology", "cyber", "security"]),
        (RiskCategory::Financial, &["financial", "credit", "liquidity"]),
        (
            RiskCategory::Operational,
            &["operational", "supply chain", "manufacturing"],
        ),
    ];

    /// First category whose keywords occur in `text`, in the order listed above.
    pub fn classify(text: &str) -> Self {
        let text = text.to_lowercase();
        Self::KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
            .map_or(RiskCategory::General, |(category, _)| *category)
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RiskCategory::Market => "Market Risk",
            RiskCategory::Regulatory => "Regulatory Risk",
            RiskCategory::Technology => "Technology Risk",
            RiskCategory::Financial => "Financial Risk",
            RiskCategory::Operational => "Operational Risk",
            RiskCategory::General => "General Risk",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskFactor {
    pub category: RiskCategory,
    pub description: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyMetric {
    pub metric: String,
    pub change: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MdnaSection {
    pub title: String,
    pub content: String,
    pub key_metrics: Vec<KeyMetric>,
}

/// A numeric fact tagged with inline XBRL (`ix:nonFraction`).
#[derive(Debug, Clone, PartialEq)]
pub struct XbrlFact {
    pub name: String,
    pub context_ref: String,
    pub unit_ref: Option<String>,
    /// `None` for `INF` or a missing attribute.
    pub decimals: Option<i32>,
    pub scale: i32,
    /// Displayed value times `10^scale`, negated when `sign="-"`.
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickRatioMethod {
    /// (current assets - inventory) / current liabilities
    ExcludingInventory,
    /// 0.8 x current assets / current liabilities; used when no inventory line was
    /// found. An approximation, not the textbook ratio.
    Approximate,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuickRatio {
    pub value: f64,
    pub method: QuickRatioMethod,
}

/// Ratios derived from the extracted statements. Each is `None` when an input is
/// missing or its denominator is zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinancialMetrics {
    pub current_ratio: Option<f64>,
    pub quick_ratio: Option<QuickRatio>,
    pub return_on_equity: Option<f64>,
    pub debt_to_equity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFinancialForm {
    pub header: FilingHeader,
    pub balance_sheet: BalanceSheet,
    pub income_statement: IncomeStatement,
    pub cash_flow: CashFlowStatement,
    pub segments: Vec<BusinessSegment>,
    pub risk_factors: Vec<RiskFactor>,
    pub mdna: Vec<MdnaSection>,
    pub xbrl_facts: Vec<XbrlFact>,
    pub metrics: FinancialMetrics,
}

/// Extractor for 10-K and 10-Q documents, raw HTML or full-submission text.
#[derive(Debug, Clone, Copy)]
pub struct FinancialFormParser<'a> {
    content: &'a str,
}

impl<'a> FinancialFormParser<'a> {
    pub fn new(content: &'a str) -> Self {
        Self { content }
    }

    /// Runs every extractor.
    pub fn parse(&self) -> ParsedFinancialForm {
        let balance_sheet = self.balance_sheet();
        let income_statement = self.income_statement();
        let metrics = compute_metrics(&balance_sheet, &income_statement);
        ParsedFinancialForm {
            header: FilingHeader::parse(self.content),
            balance_sheet,
            income_statement,
            cash_flow: self.cash_flow(),
            segments: self.segments(),
            risk_factors: self.risk_factors(),
            mdna: self.management_discussion(),
            xbrl_facts: self.xbrl_facts(),
            metrics,
        }
    }

    pub fn balance_sheet(&self) -> BalanceSheet {
        let section = section(self.content, &BALANCE_SHEET);
        let not_non_current = |items: Vec<LineItem>| -> Vec<LineItem> {
            items
                .into_iter()
                .filter(|item| !NON_CURRENT_LABEL.is_match(&item.label))
                .collect()
        };
        BalanceSheet {
            current_assets: not_non_current(line_items(section, &CURRENT_ASSETS)),
            non_current_assets: line_items(section, &NON_CURRENT_ASSETS),
            total_assets: first_line_item(section, &TOTAL_ASSETS),
            inventory: first_line_item(section, &INVENTORY),
            current_liabilities: not_non_current(line_items(section, &CURRENT_LIABILITIES)),
            non_current_liabilities: line_items(section, &NON_CURRENT_LIABILITIES),
            total_liabilities: first_line_item(section, &TOTAL_LIABILITIES),
            total_equity: first_line_item(section, &TOTAL_EQUITY),
            retained_earnings: first_line_item(section, &RETAINED_EARNINGS),
        }
    }

    pub fn income_statement(&self) -> IncomeStatement {
        let section = section(self.content, &INCOME_STATEMENT);
        IncomeStatement {
            revenue: first_line_item(section, &REVENUE),
            cost_of_revenue: first_line_item(section, &COST_OF_REVENUE),
            gross_profit: first_line_item(section, &GROSS_PROFIT),
            operating_expenses: line_items(section, &OPERATING_EXPENSES),
            operating_income: first_line_item(section, &OPERATING_INCOME),
            net_income: first_line_item(section, &NET_INCOME),
            earnings_per_share: first_line_item(section, &EPS),
        }
    }

    pub fn cash_flow(&self) -> CashFlowStatement {
        let section = section(self.content, &CASH_FLOW);
        CashFlowStatement {
            operating_activities: line_items(section, &OPERATING_ACTIVITIES),
            investing_activities: line_items(section, &INVESTING_ACTIVITIES),
            financing_activities: line_items(section, &FINANCING_ACTIVITIES),
            net_change_in_cash: first_line_item(section, &NET_CASH_CHANGE),
        }
    }

    pub fn segments(&self) -> Vec<BusinessSegment> {
        let section = section(self.content, &SEGMENTS);
        SEGMENT_LINE
            .captures_iter(section)
            .filter_map(|caps| {
                let name = caps.get(1)?.as_str();
                let name = name.strip_prefix("The ").unwrap_or(name).trim();
                let revenue = parse_money(caps.get(2)?.as_str(), caps.get(3).map(|m| m.as_str()))?;
                Some(BusinessSegment {
                    name: name.to_string(),
                    revenue,
                })
            })
            .collect()
    }

    /// Up to ten risk factors from the risk factor section, split at bullets, numbered
    /// paragraphs and blank lines.
    pub fn risk_factors(&self) -> Vec<RiskFactor> {
        let section = item_section(self.content, &RISK_FACTORS);
        split_at(section, &RISK_SPLIT)
            .into_iter()
            .map(|piece| piece.trim().trim_start_matches(['•', '·']).trim_start())
            .filter(|piece| piece.chars().count() > 50)
            .take(MAX_RISK_FACTORS)
            .map(|piece| RiskFactor {
                category: RiskCategory::classify(piece),
                description: truncate_chars(piece, MAX_RISK_DESCRIPTION).to_string(),
                severity: Severity::classify(
                    piece,
                    &["material adverse", "significant risk", "substantial risk", "could result in"],
                    &["may affect", "potential impact", "could impact"],
                ),
            })
            .collect()
    }

    /// MD&A subsections (overview, results of operations, financial condition,
    /// liquidity) with up to five "X increased by N%" metrics each.
    pub fn management_discussion(&self) -> Vec<MdnaSection> {
        let section = item_section(self.content, &MDNA);
        split_at(section, &MDNA_SPLIT)
            .into_iter()
            .filter(|piece| piece.trim().chars().count() > 100)
            .map(|piece| MdnaSection {
                title: section_title(piece),
                content: truncate_chars(piece.trim(), MAX_MDNA_CONTENT).to_string(),
                key_metrics: key_metrics(piece),
            })
            .collect()
    }

    pub fn xbrl_facts(&self) -> Vec<XbrlFact> {
        IX_NON_FRACTION
            .captures_iter(self.content)
            .filter_map(|caps| {
                let attributes = caps.get(1)?.as_str();
                let attr = |name: &str| {
                    XML_ATTRIBUTE
                        .captures_iter(attributes)
                        .find(|a| a.get(1).is_some_and(|k| k.as_str().eq_ignore_ascii_case(name)))
                        .and_then(|a| a.get(2))
                        .map(|v| v.as_str().to_string())
                };
                let displayed = parse_number(caps.get(2)?.as_str())?;
                let scale: i32 = attr("scale").and_then(|s| s.parse().ok()).unwrap_or(0);
                let sign = if attr("sign").as_deref() == Some("-") { -1.0 } else { 1.0 };
                Some(XbrlFact {
                    name: attr("name")?,
                    context_ref: attr("contextRef").unwrap_or_default(),
                    unit_ref: attr("unitRef"),
                    decimals: attr("decimals").and_then(|d| d.parse().ok()),
                    scale,
                    value: sign * displayed * 10f64.powi(scale),
                })
            })
            .collect()
    }

    pub fn metrics(&self) -> FinancialMetrics {
        compute_metrics(&self.balance_sheet(), &self.income_statement())
    }
}

fn compute_metrics(balance_sheet: &BalanceSheet, income: &IncomeStatement) -> FinancialMetrics {
    let current_assets = balance_sheet.total_current_assets();
    let current_liabilities = balance_sheet.total_current_liabilities();
    let equity = balance_sheet.total_equity.as_ref().map(|i| i.value);

    let quick_ratio = match (current_assets, &balance_sheet.inventory) {
        (Some(assets), Some(inventory)) => {
            ratio(Some(assets - inventory.value), current_liabilities).map(|value| QuickRatio {
                value,
                method: QuickRatioMethod::ExcludingInventory,
            })
        }
        (Some(assets), None) => ratio(Some(assets * 0.8), current_liabilities).map(|value| {
            QuickRatio {
                value,
                method: QuickRatioMethod::Approximate,
            }
        }),
        (None, _) => None,
    };

    FinancialMetrics {
        current_ratio: ratio(current_assets, current_liabilities),
        quick_ratio,
        return_on_equity: ratio(income.net_income.as_ref().map(|i| i.value), equity),
        debt_to_equity: ratio(balance_sheet.total_liabilities.as_ref().map(|i| i.value), equity),
    }
}

fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => Some(n / d),
        _ => None,
    }
}

fn total_of(items: &[LineItem]) -> Option<f64> {
    if let Some(total) = items
        .iter()
        .find(|item| item.label.to_lowercase().starts_with("total"))
    {
        return Some(total.value);
    }
    (!items.is_empty()).then(|| items.iter().map(|item| item.value).sum())
}

/// From the first match of `heading` to `</DOCUMENT>`, or a fixed window past it.
fn section<'t>(text: &'t str, heading: &Regex) -> &'t str {
    let Some(found) = heading.find(text) else {
        return "";
    };
    let start = found.start();
    let end = text[start..]
        .find("</DOCUMENT>")
        .map(|offset| start + offset)
        .unwrap_or_else(|| floor_char_boundary(text, start + SECTION_WINDOW));
    &text[start..end]
}

/// Like [`section`], but also stops at the next `Item N.` heading line.
fn item_section<'t>(text: &'t str, heading: &Regex) -> &'t str {
    let section = section(text, heading);
    let body_start = heading.find(section).map_or(0, |m| m.end());
    match NEXT_ITEM.find_at(section, body_start) {
        Some(next) => &section[..next.start()],
        None => section,
    }
}

/// Cuts `text` immediately before every match of `separator`.
fn split_at<'t>(text: &'t str, separator: &Regex) -> Vec<&'t str> {
    let mut pieces = Vec::new();
    let mut last = 0;
    for found in separator.find_iter(text) {
        if found.start() > last {
            pieces.push(&text[last..found.start()]);
        }
        last = found.start();
    }
    pieces.push(&text[last..]);
    pieces
}

/// Every line whose text matches `label` and that carries a dollar amount after it.
///
/// The label is the whole line up to the `$`, so "Total current assets" keeps its
/// "Total". Each line is reported once.
fn line_items(section: &str, label: &Regex) -> Vec<LineItem> {
    let mut seen_lines = HashSet::new();
    let mut items = Vec::new();
    for found in label.find_iter(section) {
        let line_start = section[..found.start()].rfind('\n').map_or(0, |i| i + 1);
        if !seen_lines.insert(line_start) {
            continue;
        }
        let line_end = section[found.end()..]
            .find('\n')
            .map_or(section.len(), |i| found.end() + i);
        let rest = &section[found.end()..line_end];
        let Some(caps) = LINE_VALUE.captures(rest) else {
            continue;
        };
        let (Some(whole), Some(amount)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let Some(value) = parse_money(amount.as_str(), caps.get(2).map(|m| m.as_str())) else {
            continue;
        };
        let label = section[line_start..found.end() + whole.start()]
            .trim()
            .trim_end_matches(['.', ':', ' ', '\t'])
            .to_string();
        items.push(LineItem { label, value });
    }
    items
}

fn first_line_item(section: &str, label: &Regex) -> Option<LineItem> {
    line_items(section, label).into_iter().next()
}

fn section_title(section: &str) -> String {
    section
        .lines()
        .take(5)
        .map(str::trim)
        .find(|line| (11..100).contains(&line.chars().count()))
        .unwrap_or("Management Discussion")
        .to_string()
}

fn key_metrics(section: &str) -> Vec<KeyMetric> {
    KEY_METRIC
        .captures_iter(section)
        .filter_map(|caps| {
            Some(KeyMetric {
                metric: caps.get(1)?.as_str().trim().to_string(),
                change: caps.get(2)?.as_str().to_string(),
            })
        })
        .take(MAX_KEY_METRICS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BALANCE: &str = "CONSOLIDATED BALANCE SHEETS
Cash and cash equivalents $ 29,943
Inventories $ 7,286
Other current assets $ 14,287
Total current assets $ 152,987
Property, plant and equipment, net $ 45,680
Total assets $ 364,980
Total current liabilities $ 176,392
Total liabilities $ 308,030
Total shareholders' equity $ 56,950
</DOCUMENT>";

    #[test]
    fn test_line_items_keep_full_label() {
        let sheet = FinancialFormParser::new(BALANCE).balance_sheet();
        let labels: Vec<_> = sheet.current_assets.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["Other current assets", "Total current assets"]);
        assert_eq!(sheet.total_current_assets(), Some(152_987.0));
        assert_eq!(sheet.inventory.as_ref().map(|i| i.value), Some(7_286.0));
        assert_eq!(sheet.total_assets.as_ref().map(|i| i.value), Some(364_980.0));
        assert_eq!(sheet.non_current_assets.len(), 1);
    }

    #[test]
    fn test_quick_ratio_uses_inventory_when_present() {
        let metrics = FinancialFormParser::new(BALANCE).metrics();
        let quick = metrics.quick_ratio.unwrap();
        assert_eq!(quick.method, QuickRatioMethod::ExcludingInventory);
        assert!((quick.value - (152_987.0 - 7_286.0) / 176_392.0).abs() < 1e-12);
        assert!((metrics.debt_to_equity.unwrap() - 308_030.0 / 56_950.0).abs() < 1e-12);
        // No income statement, so no ROE
        assert_eq!(metrics.return_on_equity, None);
    }

    #[test]
    fn test_quick_ratio_approximation() {
        let text = "BALANCE SHEET\nTotal current assets $ 100\nTotal current liabilities $ 50\n";
        let quick = FinancialFormParser::new(text).metrics().quick_ratio.unwrap();
        assert_eq!(quick.method, QuickRatioMethod::Approximate);
        assert!((quick.value - 1.6).abs() < 1e-12);
    }

    #[test]
    fn test_zero_denominator_gives_none() {
        let text = "BALANCE SHEET\nTotal current assets $ 100\nTotal current liabilities $ 0\n";
        let metrics = FinancialFormParser::new(text).metrics();
        assert_eq!(metrics.current_ratio, None);
        assert_eq!(metrics.quick_ratio, None);
    }

    #[test]
    fn test_missing_section_is_empty() {
        let parsed = FinancialFormParser::new("nothing to see").parse();
        assert_eq!(parsed.balance_sheet, BalanceSheet::default());
        assert_eq!(parsed.metrics, FinancialMetrics::default());
        assert!(parsed.risk_factors.is_empty());
    }

    #[test]
    fn test_negative_and_scaled_amounts() {
        let text = "CONSOLIDATED STATEMENTS OF CASH FLOWS
Cash used in investing activities $ (2,935)
Cash generated by financing activities $ 1.2 billion
";
        let cash = FinancialFormParser::new(text).cash_flow();
        assert_eq!(cash.investing_activities[0].value, -2_935.0);
        assert_eq!(cash.financing_activities[0].value, 1.2e9);
    }

    #[test]
    fn test_xbrl_facts() {
        let html = r#"<ix:nonFraction name="us-gaap:Revenues" contextRef="FY2024" unitRef="usd" decimals="-6" scale="6">391,035</ix:nonFraction>
<ix:nonFraction contextRef="FY2024" name="us-gaap:OtherLoss" unitRef="usd" decimals="INF" sign="-">12</ix:nonFraction>"#;
        let facts = FinancialFormParser::new(html).xbrl_facts();
        assert_eq!(facts.len(), 2);
        assert_eq!(facts[0].name, "us-gaap:Revenues");
        assert_eq!(facts[0].decimals, Some(-6));
        assert_eq!(facts[0].value, 391_035e6);
        assert_eq!(facts[1].decimals, None);
        assert_eq!(facts[1].value, -12.0);
    }

    #[test]
    fn test_risk_category() {
        assert_eq!(RiskCategory::classify("intense competition"), RiskCategory::Market);
        assert_eq!(RiskCategory::classify("cyber attacks"), RiskCategory::Technology);
        assert_eq!(RiskCategory::classify("weather"), RiskCategory::General);
        assert_eq!(RiskCategory::Financial.to_string(), "Financial Risk");
    }

    #[test]
    fn test_split_at_keeps_separators() {
        let re = Regex::new("b").unwrap();
        assert_eq!(split_at("abcabc", &re), vec!["a", "bca", "bc"]);
    }
}
