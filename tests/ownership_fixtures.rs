mod common;

use chrono::NaiveDate;
use common::read_fixture;
use edgar_toolkit::EdgarError;
use edgar_toolkit::parsing::ownership::FormTypeSource;
use edgar_toolkit::parsing::{
    Form4Parser, Form5Parser, OwnershipFormParser, OwnershipParseOptions,
};

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

#[test]
fn form4_document_and_parties() {
    let parser = OwnershipFormParser::new(&read_fixture("ownership/form4.xml")).unwrap();
    let form = parser.parse_all();

    assert_eq!(parser.form_type(), "4");
    assert_eq!(parser.form_type_source(), FormTypeSource::Declared);
    assert_eq!(form.document_info.schema_version, "X0306");
    assert_eq!(form.document_info.period_of_report, date(2024, 1, 15));
    assert_eq!(form.document_info.not_subject_to_section16, Some(false));

    let issuer = form.issuer.as_ref().unwrap();
    assert_eq!(issuer.cik, "0000320193");
    assert_eq!(issuer.trading_symbol, "AAPL");

    let owner = form.reporting_owner.as_ref().unwrap();
    assert_eq!(owner.cik, "0001214128");
    assert_eq!(owner.name, "COOK TIMOTHY D");
    assert_eq!(owner.city, "CUPERTINO");
    assert_eq!(owner.zip_code, "95014");
    assert_eq!(owner.street2, "");
    let relationship = owner.relationship.as_ref().unwrap();
    assert!(relationship.is_director);
    assert!(relationship.is_officer);
    assert!(!relationship.is_ten_percent_owner);
    assert_eq!(relationship.officer_title, "Chief Executive Officer");

    assert!(form.warnings.is_empty());
}

#[test]
fn form4_tables() {
    let parser = OwnershipFormParser::new(&read_fixture("ownership/form4.xml")).unwrap();

    let sales = parser.non_derivative_transactions();
    assert_eq!(sales.len(), 1);
    let sale = &sales[0];
    assert_eq!(sale.security_title, "Common Stock");
    assert_eq!(sale.transaction_date, date(2024, 1, 15));
    assert_eq!(sale.code, "S");
    assert_eq!(sale.shares, 1000.0);
    assert_eq!(sale.price_per_share, 185.5);
    assert_eq!(sale.value(), 185_500.0);
    assert_eq!(sale.acquired_disposed_code, "D");
    assert_eq!(sale.shares_owned_following_transaction, 3_425_000.0);
    assert_eq!(sale.direct_or_indirect_ownership, "D");
    assert!(!sale.equity_swap_involved);

    let holdings = parser.non_derivative_holdings();
    assert_eq!(holdings.len(), 1);
    assert_eq!(holdings[0].shares_owned, 3_425_000.0);
    assert_eq!(holdings[0].direct_or_indirect_ownership, "I");
    assert_eq!(holdings[0].nature_of_ownership, "By Trust");

    let options = parser.derivative_transactions();
    assert_eq!(options.len(), 1);
    let option = &options[0];
    assert_eq!(option.security_title, "Employee Stock Option");
    assert_eq!(option.conversion_or_exercise_price, 125.0);
    assert_eq!(option.shares, 500.0);
    assert_eq!(option.total_value, 62_500.0);
    assert_eq!(option.exercise_date, date(2020, 1, 15));
    assert_eq!(option.expiration_date, date(2030, 1, 15));
    assert_eq!(option.underlying_title, "Common Stock");
    assert_eq!(option.underlying_shares, 500.0);
}

#[test]
fn form4_totals() {
    let parser = Form4Parser::new(&read_fixture("ownership/form4.xml")).unwrap();

    assert_eq!(parser.total_shares_disposed(), 1000.0);
    assert_eq!(parser.total_shares_acquired(), 0.0);
    assert!(parser.warnings().is_empty());
}

#[test]
fn form5_late_transactions_and_fiscal_year() {
    let parser = Form5Parser::new(&read_fixture("ownership/form5.xml")).unwrap();

    assert_eq!(parser.form_type(), "5");
    assert_eq!(parser.fiscal_year_end(), date(2023, 12, 31));
    assert_eq!(
        parser.document_info().not_subject_to_section16,
        Some(true)
    );

    let late = parser.late_form4_transactions();
    assert_eq!(late.len(), 1);
    assert_eq!(late[0].shares, 2500.0);
    assert_eq!(late[0].code, "G");
    // Thousands separators are accepted
    assert_eq!(late[0].shares_owned_following_transaction, 833_424.0);

    let all = parser.non_derivative_transactions();
    assert_eq!(all[1].transaction_date, date(2023, 12, 15));
    assert_eq!(all[1].price_per_share, 0.0);

    let owner = parser.reporting_owner().unwrap();
    assert_eq!(owner.name, "NADELLA SATYA");
    assert_eq!(owner.state, "WA");
}

#[test]
fn mismatched_parser_warns_instead_of_failing() {
    let parser = Form5Parser::new(&read_fixture("ownership/form4.xml")).unwrap();

    assert_eq!(parser.form_type(), "4");
    assert!(
        parser
            .warnings()
            .iter()
            .any(|w| w.contains("expected Form 5"))
    );
}

#[test]
fn missing_document_type_uses_schema_fallback() {
    let xml = read_fixture("ownership/form4.xml").replace("<documentType>4</documentType>", "");

    let parser = OwnershipFormParser::new(&xml).unwrap();
    assert_eq!(parser.form_type(), "4");
    assert_eq!(parser.form_type_source(), FormTypeSource::SchemaFallback);
    assert_eq!(parser.warnings().len(), 1);

    let err = OwnershipFormParser::with_options(&xml, &OwnershipParseOptions::without_fallback())
        .unwrap_err();
    assert!(matches!(err, EdgarError::OwnershipParse { .. }));
}

#[test]
fn bad_dates_become_warnings() {
    let xml = read_fixture("ownership/form4.xml").replace(
        "<value>2024-01-15</value>",
        "<value>fifteenth of January</value>",
    );

    let parser = OwnershipFormParser::new(&xml).unwrap();

    assert_eq!(parser.non_derivative_transactions()[0].transaction_date, None);
    assert!(
        parser
            .warnings()
            .iter()
            .any(|w| w.contains("fifteenth of January"))
    );
}

#[test]
fn malformed_xml_is_an_error() {
    let err = OwnershipFormParser::new("<ownershipDocument><issuer></ownershipDocument>")
        .unwrap_err();
    assert!(matches!(err, EdgarError::OwnershipParse { .. }));

    let bytes = read_fixture("ownership/form5.xml").into_bytes();
    assert_eq!(OwnershipFormParser::from_bytes(&bytes).unwrap().form_type(), "5");
}
