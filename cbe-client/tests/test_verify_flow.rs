use cbe_client::{FetchConfig, ReceiptFetcher, Verifier};
use cbe_core::{
    ClaimedTransaction, FieldValue, MismatchField, ReceiptField, VerifyError, VERIFICATION_FAILED,
};
use cbe_ingest::{PageRows, RowDecoder};
use httpmock::prelude::*;

const REFERENCE: &str = "FT24074ABCDE";
const SUFFIX: &str = "12345678";

/// Stands in for PDF decoding: every document yields the same rows.
struct StubRows(Vec<&'static str>);

impl RowDecoder for StubRows {
    fn decode(&self, _bytes: &[u8]) -> Result<Vec<PageRows>, VerifyError> {
        Ok(vec![PageRows::from_lines(1, self.0.iter().copied())])
    }
}

fn receipt_rows() -> StubRows {
    StubRows(vec![
        "Commercial Bank of Ethiopia",
        "PayerABEBE KEBEDE",
        "Account1****1234",
        "ReceiverTIGIST ALEMU",
        "Account1****5678",
        "Payment Date & Time3/14/2024, 10:21:05 AM",
        "Reference No. (VAT Invoice No)FT24074ABCDE12345678",
        "Reason / Type of serviceRent payment",
        "Transferred Amount500.00 ETB",
    ])
}

fn verifier<D: RowDecoder>(server: &MockServer, decoder: D) -> Verifier<D> {
    let config = FetchConfig::default()
        .with_base_url(server.base_url())
        .with_timeout_secs(5);
    Verifier::with_decoder(ReceiptFetcher::new(config).unwrap(), decoder)
}

fn pdf_mock(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(GET)
            .path("/")
            .query_param("id", "FT24074ABCDE12345678")
            .header("accept", "application/pdf");
        then.status(200)
            .header("content-type", "application/pdf")
            .body("%PDF-1.4 stub");
    })
}

#[test]
fn test_matching_claim_is_verified_with_details() {
    let server = MockServer::start();
    let mock = pdf_mock(&server);

    let claim = ClaimedTransaction::new(REFERENCE, SUFFIX, 500.00);
    let outcome = verifier(&server, receipt_rows()).verify_blocking(&claim, true);

    mock.assert();
    assert!(outcome.is_valid(), "unexpected outcome: {outcome:?}");
    assert!(outcome.error().is_none());
    assert!(outcome.mismatches().is_none());

    let details = outcome.details().unwrap();
    assert_eq!(details.payer, "ABEBE KEBEDE");
    assert_eq!(details.payer_account, "1****1234");
    assert_eq!(details.receiver, "TIGIST ALEMU");
    assert_eq!(details.receiver_account, "1****5678");
    assert_eq!(details.reason, "Rent payment");
    assert_eq!(details.amount, 500.00);
}

#[test]
fn test_details_omitted_unless_requested() {
    let server = MockServer::start();
    let _mock = pdf_mock(&server);

    let claim = ClaimedTransaction::new(REFERENCE, SUFFIX, 500.00);
    let outcome = verifier(&server, receipt_rows()).verify_blocking(&claim, false);

    assert!(outcome.is_valid());
    assert!(outcome.details().is_none());
}

#[test]
fn test_amount_mismatch_is_reported() {
    let server = MockServer::start();
    let _mock = pdf_mock(&server);

    let claim = ClaimedTransaction::new(REFERENCE, SUFFIX, 499.99);
    let outcome = verifier(&server, receipt_rows()).verify_blocking(&claim, true);

    assert!(!outcome.is_valid());
    assert_eq!(outcome.error(), Some(VERIFICATION_FAILED));
    assert!(outcome.details().is_none());

    let mismatches = outcome.mismatches().unwrap();
    assert_eq!(mismatches.len(), 1);
    let amount = &mismatches[&MismatchField::Amount];
    assert_eq!(amount.provided, FieldValue::Amount(499.99));
    assert_eq!(amount.official, FieldValue::Amount(500.00));
}

#[test]
fn test_non_200_is_a_structural_error() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/");
        then.status(404)
            .header("content-type", "application/pdf")
            .body("not found");
    });

    let claim = ClaimedTransaction::new(REFERENCE, SUFFIX, 500.00);
    let outcome = verifier(&server, receipt_rows()).verify_blocking(&claim, true);

    mock.assert();
    assert!(!outcome.is_valid());
    assert!(outcome.error().unwrap().contains("invalid PDF response"));
    assert!(outcome.error().unwrap().contains("404"));
    assert!(outcome.mismatches().is_none());
}

#[test]
fn test_html_response_is_a_structural_error() {
    let server = MockServer::start();
    let _mock = server.mock(|when, then| {
        when.method(GET).path("/");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body("<html>maintenance</html>");
    });

    let claim = ClaimedTransaction::new(REFERENCE, SUFFIX, 500.00);
    let outcome = verifier(&server, receipt_rows()).verify_blocking(&claim, false);

    assert!(!outcome.is_valid());
    assert!(outcome.error().unwrap().contains("text/html"));
    assert!(outcome.mismatches().is_none());
}

#[test]
fn test_incomplete_receipt_reports_missing_fields() {
    let server = MockServer::start();
    let _mock = pdf_mock(&server);

    let rows = StubRows(vec![
        "Payer ABEBE KEBEDE",
        "Account 1****1234",
        "Receiver TIGIST ALEMU",
        "Payment Date 3/14/2024",
        "Reference No. FT24074ABCDE12345678",
        "Transferred Amount 500.00 ETB",
    ]);

    let claim = ClaimedTransaction::new(REFERENCE, SUFFIX, 500.00);
    let outcome = verifier(&server, rows).verify_blocking(&claim, false);

    assert!(!outcome.is_valid());
    let error = outcome.error().unwrap();
    assert!(error.starts_with("missing one or more required fields"));
    assert!(error.contains("receiverAccount"));
    assert!(!error.contains("payerAccount"));
    assert!(outcome.mismatches().is_none());

    let missing = outcome.missing_fields().expect("missing-field map");
    for field in ReceiptField::ALL {
        assert_eq!(missing.is_missing(field), field == ReceiptField::ReceiverAccount, "{field}");
    }
}

#[test]
fn test_real_decoder_rejects_non_pdf_body() {
    let server = MockServer::start();
    let _mock = server.mock(|when, then| {
        when.method(GET).path("/");
        then.status(200)
            .header("content-type", "application/pdf")
            .body("<html>not really a pdf</html>");
    });

    let claim = ClaimedTransaction::new(REFERENCE, SUFFIX, 500.00);
    let outcome = verifier(&server, cbe_ingest::LopdfDecoder).verify_blocking(&claim, false);

    assert!(!outcome.is_valid());
    assert_eq!(outcome.error(), Some("invalid PDF format: missing PDF header"));
}

#[test]
fn test_invalid_input_makes_no_request() {
    // Nothing listens on the discard port; reaching the network would surface
    // a network error instead of the input error.
    let config = FetchConfig::default()
        .with_base_url("http://127.0.0.1:9")
        .with_timeout_secs(1);
    let verifier = Verifier::with_decoder(ReceiptFetcher::new(config).unwrap(), receipt_rows());

    let outcome = verifier.verify_blocking(&ClaimedTransaction::new(REFERENCE, "   ", 500.0), false);
    assert_eq!(outcome.error(), Some("invalid suffix"));

    let outcome = verifier.verify_blocking(&ClaimedTransaction::new(REFERENCE, SUFFIX, 0.0), false);
    assert_eq!(outcome.error(), Some("invalid amount: 0"));
}

#[test]
fn test_connection_failure_is_a_network_error() {
    let config = FetchConfig::default()
        .with_base_url("http://127.0.0.1:9")
        .with_timeout_secs(2);
    let verifier = Verifier::with_decoder(ReceiptFetcher::new(config).unwrap(), receipt_rows());

    let claim = ClaimedTransaction::new(REFERENCE, SUFFIX, 500.0);
    let err = tokio::runtime::Runtime::new()
        .unwrap()
        .block_on(verifier.check(&claim))
        .unwrap_err();
    assert!(matches!(err, VerifyError::Network(_)), "unexpected error: {err:?}");
}

#[tokio::test]
async fn test_async_verify_against_mock_server() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/").query_param("id", "FT24074ABCDE12345678");
            then.status(200)
                .header("content-type", "application/pdf")
                .body("%PDF-1.4 stub");
        })
        .await;

    let claim = ClaimedTransaction::new(REFERENCE, SUFFIX, 500.004);
    let outcome = verifier(&server, receipt_rows()).verify(&claim, false).await;

    mock.assert_async().await;
    assert!(outcome.is_valid());
}

#[tokio::test]
async fn test_blocking_verify_from_current_thread_runtime() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/").query_param("id", "FT24074ABCDE12345678");
            then.status(200)
                .header("content-type", "application/pdf")
                .body("%PDF-1.4 stub");
        })
        .await;

    let claim = ClaimedTransaction::new(REFERENCE, SUFFIX, 500.00);
    let outcome = verifier(&server, receipt_rows()).verify_blocking(&claim, true);

    mock.assert_async().await;
    assert!(outcome.is_valid(), "unexpected outcome: {outcome:?}");
    assert_eq!(outcome.details().map(|d| d.payer.as_str()), Some("ABEBE KEBEDE"));
}
