mod common;

use chrono::NaiveDate;
use common::read_fixture;
use edgar_toolkit::parsing::financial::{QuickRatioMethod, RiskCategory};
use edgar_toolkit::parsing::{FinancialFormParser, Severity};

fn value(item: &Option<edgar_toolkit::parsing::financial::LineItem>) -> Option<f64> {
    item.as_ref().map(|i| i.value)
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-12,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn header_of_full_submission() {
    let text = read_fixture("documents/10k.txt");

    let header = FinancialFormParser::new(&text).parse().header;

    assert_eq!(header.accession_number.as_deref(), Some("0000320193-24-000123"));
    assert_eq!(header.form_type.as_deref(), Some("10-K"));
    assert_eq!(header.company_name.as_deref(), Some("Apple Inc."));
    assert_eq!(header.cik.as_deref(), Some("0000320193"));
    assert_eq!(header.filed_date, NaiveDate::from_ymd_opt(2024, 11, 1));
    assert_eq!(header.period_of_report, NaiveDate::from_ymd_opt(2024, 9, 28));
}

#[test]
fn income_statement_lines() {
    let text = read_fixture("documents/10k.txt");

    let income = FinancialFormParser::new(&text).income_statement();

    assert_eq!(value(&income.revenue), Some(391_035.0));
    assert_eq!(value(&income.cost_of_revenue), Some(210_352.0));
    assert_eq!(value(&income.gross_profit), Some(180_683.0));
    assert_eq!(income.operating_expenses.len(), 3);
    assert_eq!(income.operating_expenses[2].label, "Total operating expenses");
    assert_eq!(value(&income.operating_income), Some(123_216.0));
    assert_eq!(value(&income.net_income), Some(93_736.0));
    let eps = income.earnings_per_share.unwrap();
    assert_eq!(eps.label, "Diluted earnings per share");
    assert_eq!(eps.value, 6.08);
}

#[test]
fn balance_sheet_lines() {
    let text = read_fixture("documents/10k.txt");

    let sheet = FinancialFormParser::new(&text).balance_sheet();

    assert_eq!(sheet.current_assets.len(), 2);
    assert_eq!(sheet.total_current_assets(), Some(152_987.0));
    assert_eq!(sheet.non_current_assets.len(), 2);
    assert_eq!(value(&sheet.total_assets), Some(364_980.0));
    assert_eq!(value(&sheet.inventory), Some(7_286.0));
    assert_eq!(sheet.current_liabilities.len(), 1);
    assert_eq!(sheet.total_current_liabilities(), Some(176_392.0));
    assert_eq!(sheet.non_current_liabilities[0].value, 45_888.0);
    assert_eq!(value(&sheet.total_liabilities), Some(308_030.0));
    assert_eq!(value(&sheet.retained_earnings), Some(-19_154.0));
    assert_eq!(value(&sheet.total_equity), Some(56_950.0));
}

#[test]
fn cash_flow_lines() {
    let text = read_fixture("documents/10k.txt");

    let cash = FinancialFormParser::new(&text).cash_flow();

    assert_eq!(cash.operating_activities[0].value, 118_254.0);
    assert_eq!(cash.investing_activities[0].value, 2_935.0);
    assert_eq!(cash.financing_activities[0].value, -121_983.0);
    assert_eq!(value(&cash.net_change_in_cash), Some(-794.0));
}

#[test]
fn segments_apply_magnitude() {
    let text = read_fixture("documents/10k.txt");

    let segments = FinancialFormParser::new(&text).segments();

    let found: Vec<_> = segments
        .iter()
        .map(|s| (s.name.as_str(), s.revenue))
        .collect();
    assert_eq!(
        found,
        vec![
            ("Americas", 167_045e6),
            ("Europe", 101_328e6),
            ("Greater China", 66_952e6),
        ]
    );
}

#[test]
fn risk_factors_are_classified() {
    let text = read_fixture("documents/10k.txt");

    let risks = FinancialFormParser::new(&text).risk_factors();

    assert_eq!(risks.len(), 3);
    assert_eq!(risks[0].category, RiskCategory::Market);
    assert_eq!(risks[0].severity, Severity::High);
    assert!(risks[0].description.starts_with("Global markets"));
    assert_eq!(risks[1].category, RiskCategory::Regulatory);
    assert_eq!(risks[1].severity, Severity::Medium);
    assert_eq!(risks[2].category, RiskCategory::Financial);
    assert_eq!(risks[2].severity, Severity::Low);
}

#[test]
fn management_discussion_sections() {
    let text = read_fixture("documents/10k.txt");

    let sections = FinancialFormParser::new(&text).management_discussion();

    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0].title, "Fiscal 2024 Highlights");
    let metrics: Vec<_> = sections[0]
        .key_metrics
        .iter()
        .map(|m| (m.metric.as_str(), m.change.as_str()))
        .collect();
    assert_eq!(
        metrics,
        vec![("Total net sales", "2%"), ("Services net sales", "13%")]
    );
    assert_eq!(sections[1].title, "LIQUIDITY AND CAPITAL RESOURCES");
    assert!(sections[1].key_metrics.is_empty());
}

#[test]
fn ratios_from_statements() {
    let text = read_fixture("documents/10k.txt");

    let metrics = FinancialFormParser::new(&text).metrics();

    assert_close(metrics.current_ratio.unwrap(), 152_987.0 / 176_392.0);
    let quick = metrics.quick_ratio.unwrap();
    assert_eq!(quick.method, QuickRatioMethod::ExcludingInventory);
    assert_close(quick.value, (152_987.0 - 7_286.0) / 176_392.0);
    assert_close(metrics.return_on_equity.unwrap(), 93_736.0 / 56_950.0);
    assert_close(metrics.debt_to_equity.unwrap(), 308_030.0 / 56_950.0);
}

#[test]
fn inline_xbrl_facts() {
    let html = read_fixture("documents/10k.htm");

    let facts = FinancialFormParser::new(&html).xbrl_facts();

    assert_eq!(facts.len(), 4);
    assert_eq!(
        facts[0].name,
        "us-gaap:RevenueFromContractWithCustomerExcludingAssessedTax"
    );
    assert_eq!(facts[0].context_ref, "c-1");
    assert_eq!(facts[0].unit_ref.as_deref(), Some("usd"));
    assert_eq!(facts[0].decimals, Some(-6));
    assert_eq!(facts[0].value, 391_035e6);
    assert_eq!(facts[1].value, 93_736e6);
    assert_eq!(facts[2].decimals, Some(2));
    assert_eq!(facts[2].scale, 0);
    assert_eq!(facts[2].value, 6.08);
    assert_eq!(facts[3].value, -264e6);
}

#[test]
fn plain_html_without_statements_parses_to_empty() {
    let html = read_fixture("documents/10q.htm");

    let parsed = FinancialFormParser::new(&html).parse();

    assert!(parsed.xbrl_facts.is_empty());
    assert!(parsed.segments.is_empty());
    assert_eq!(parsed.metrics.current_ratio, None);
    assert_eq!(parsed.header.accession_number, None);
}
