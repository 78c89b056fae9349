mod common;

use chrono::NaiveDate;
use common::{MockResponse, MockServer, mock_edgar, read_fixture};
use edgar_toolkit::{
    CompanyOperations, DirectoryResponse, EdgarError, FilingOperations, FilingOptions, Submission,
};

const SUBMISSIONS: &str = "/submissions/CIK0000320193.json";
const FILING_DIR: &str = "/Archives/edgar/data/320193/000032019324000123";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn server() -> MockServer {
    let server = MockServer::start().await;
    server.route(
        SUBMISSIONS,
        vec![MockResponse::fixture("submissions/CIK0000320193.json")],
    );
    server.route(
        "/files/company_tickers.json",
        vec![MockResponse::fixture("tickers/company_tickers.json")],
    );
    server
}

#[test]
fn parse_submission_fixture() {
    let submission: Submission =
        serde_json::from_str(&read_fixture("submissions/CIK0000320193.json")).unwrap();

    assert_eq!(submission.name, "Apple Inc.");
    assert_eq!(submission.cik, "0000320193");
    assert_eq!(submission.tickers, vec!["AAPL"]);
    assert_eq!(submission.former_names.len(), 2);
    assert_eq!(submission.filings.recent.len(), 7);

    let filings = submission.filings.recent.to_detailed();
    assert_eq!(filings.len(), 7);
    assert_eq!(filings[0].form, "10-K");
    assert_eq!(filings[0].filing_date, date(2024, 11, 1));
    assert!(filings[0].acceptance_date_time.timestamp() > 0);
    assert_eq!(filings[1].items.as_deref(), Some("2.02,9.01"));
}

#[test]
fn parse_directory_fixture() {
    let index: DirectoryResponse =
        serde_json::from_str(&read_fixture("filings/index.json")).unwrap();

    assert_eq!(index.directory.item.len(), 3);
    assert_eq!(index.directory.name, FILING_DIR);
    assert_eq!(index.directory.item[2].name, "aapl-20240928.htm");
}

#[tokio::test]
async fn submissions_accept_unpadded_cik() {
    let server = server().await;
    let edgar = mock_edgar(&server);

    let submission = edgar.submissions("320193").await.unwrap();

    assert_eq!(submission.name, "Apple Inc.");
    assert_eq!(server.hit_count(SUBMISSIONS), 1);
}

#[tokio::test]
async fn ticker_to_annual_reports_in_date_range() {
    let server = server().await;
    let edgar = mock_edgar(&server);

    let cik = edgar.company_cik("AAPL").await.unwrap();
    let options = FilingOptions::new()
        .with_form_type("10-K")
        .with_date_range(date(2023, 11, 3), date(2024, 11, 1));
    let filings = edgar
        .filings(&cik.to_string(), Some(options))
        .await
        .unwrap();

    // Both range bounds are filing dates, so both filings are kept
    let accessions: Vec<_> = filings.iter().map(|f| f.accession_number.as_str()).collect();
    assert_eq!(
        accessions,
        vec!["0000320193-24-000123", "0000320193-23-000106"]
    );
}

#[tokio::test]
async fn offset_and_limit_apply_after_filtering() {
    let server = server().await;
    let edgar = mock_edgar(&server);

    let options = FilingOptions::new()
        .with_form_type("10-Q")
        .with_offset(1)
        .with_limit(1);
    let filings = edgar.filings("320193", Some(options)).await.unwrap();

    assert_eq!(filings.len(), 1);
    assert_eq!(filings[0].filing_date, date(2024, 5, 3));

    let all = edgar.filings("320193", None).await.unwrap();
    assert_eq!(all.len(), 7);
}

#[tokio::test]
async fn several_form_types_at_once() {
    let server = server().await;
    let edgar = mock_edgar(&server);

    let options = FilingOptions::new().with_form_types(vec!["8-K".to_string(), "4".to_string()]);
    let filings = edgar.filings("320193", Some(options)).await.unwrap();

    let forms: Vec<_> = filings.iter().map(|f| f.form.as_str()).collect();
    assert_eq!(forms, vec!["8-K", "4"]);
}

#[tokio::test]
async fn filing_index_lists_documents() {
    let server = server().await;
    server.route(
        &format!("{FILING_DIR}/0000320193-24-000123-index.json"),
        vec![MockResponse::fixture("filings/index.json")],
    );
    let edgar = mock_edgar(&server);

    let index = edgar
        .filing_index("0000320193", "0000320193-24-000123")
        .await
        .unwrap();

    assert_eq!(index.directory.item.len(), 3);
}

#[tokio::test]
async fn missing_filing_index_is_filing_not_found() {
    let server = server().await;
    let edgar = mock_edgar(&server);

    let err = edgar
        .filing_index("320193", "0000320193-99-000001")
        .await
        .unwrap_err();

    match err {
        EdgarError::FilingNotFound { cik, accession } => {
            assert_eq!(cik, "320193");
            assert_eq!(accession, "0000320193-99-000001");
        }
        other => panic!("expected FilingNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn filing_text_uses_full_submission_path() {
    let server = server().await;
    server.route(
        &format!("{FILING_DIR}/0000320193-24-000123.txt"),
        vec![MockResponse::fixture("documents/10k.txt")],
    );
    let edgar = mock_edgar(&server);

    let text = edgar
        .filing_text("320193", "0000320193-24-000123")
        .await
        .unwrap();

    assert!(text.contains("<SEC-HEADER>"));
    assert_eq!(
        edgar.text_filing_url("0000320193", "0000320193-24-000123"),
        server.url_for(&format!("{FILING_DIR}/0000320193-24-000123.txt"))
    );
}

#[tokio::test]
async fn latest_filing_content_fetches_primary_document() {
    let server = server().await;
    server.route(
        &format!("{FILING_DIR}/aapl-20240928.htm"),
        vec![MockResponse::fixture("documents/10k.htm")],
    );
    let edgar = mock_edgar(&server);

    let content = edgar.latest_filing_content("320193", "10-K").await.unwrap();
    assert!(content.contains("ix:nonFraction"));

    let err = edgar
        .latest_filing_content("320193", "20-F")
        .await
        .unwrap_err();
    assert!(matches!(err, EdgarError::FilingNotFound { .. }));
}

#[tokio::test]
async fn batch_submissions_keep_per_cik_results() {
    let server = server().await;
    let edgar = mock_edgar(&server);

    let results = edgar.batch_submissions(&["320193", "789019"]).await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0, "320193");
    assert_eq!(results[0].1.as_ref().unwrap().name, "Apple Inc.");
    assert_eq!(results[1].0, "789019");
    assert!(matches!(results[1].1, Err(EdgarError::NotFound { .. })));
}
