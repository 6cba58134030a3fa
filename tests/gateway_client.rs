//! Integration tests for `GatewayClient` using wiremock HTTP mocks.

use storefront_payments::{GatewayClient, GatewayError, GatewayStatus, PaymentMethod};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> GatewayClient {
    GatewayClient::with_base_url("test-token", 5, base_url).expect("client construction should not fail")
}

#[tokio::test]
async fn fetch_payment_sends_bearer_token_and_parses_body() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "id": 1319512345_u64,
        "status": "approved",
        "status_detail": "accredited",
        "external_reference": "0190a1b2-0000-7000-8000-000000000001",
        "payment_method_id": "visa",
        "payment_type_id": "credit_card",
        "transaction_amount": 114.9,
        "currency_id": "BRL"
    });

    Mock::given(method("GET"))
        .and(path("/v1/payments/1319512345"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let payment = test_client(&server.uri()).fetch_payment("1319512345").await.expect("should parse payment");

    assert_eq!(payment.id, "1319512345");
    assert_eq!(payment.gateway_status(), GatewayStatus::Approved);
    assert_eq!(payment.status_detail.as_deref(), Some("accredited"));
    assert_eq!(payment.payment_method(), PaymentMethod::CreditCard);
    assert_eq!(payment.currency_id.as_deref(), Some("BRL"));
    assert!(payment.transaction_amount.is_some());
    assert!(payment.pix_data().is_none());
}

#[tokio::test]
async fn fetch_payment_exposes_pix_transaction_data() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "id": "42",
        "status": "pending",
        "status_detail": "pending_waiting_transfer",
        "payment_method_id": "pix",
        "payment_type_id": "bank_transfer",
        "point_of_interaction": {
            "transaction_data": {
                "qr_code": "00020126580014br.gov.bcb.pix",
                "qr_code_base64": "iVBORw0KGgo=",
                "ticket_url": "https://gateway.test/payments/42/ticket"
            }
        }
    });

    Mock::given(method("GET"))
        .and(path("/v1/payments/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let payment = test_client(&server.uri()).fetch_payment("42").await.expect("should parse payment");
    let pix = payment.pix_data().expect("pix payments carry transaction data");
    assert_eq!(pix.qr_code.as_deref(), Some("00020126580014br.gov.bcb.pix"));
    assert_eq!(pix.ticket_url.as_deref(), Some("https://gateway.test/payments/42/ticket"));
}

#[tokio::test]
async fn non_success_status_is_reported_with_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/payments/404404"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({"message": "Payment not found"})))
        .mount(&server)
        .await;

    let err = test_client(&server.uri()).fetch_payment("404404").await.expect_err("404 should fail");
    match err {
        GatewayError::Status { status, body } => {
            assert_eq!(status, 404);
            assert!(body.contains("Payment not found"));
        }
        other => panic!("expected Status error, got {other:?}"),
    }
}

#[tokio::test]
async fn long_error_bodies_are_truncated() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/payments/1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("x".repeat(5000)))
        .mount(&server)
        .await;

    let err = test_client(&server.uri()).fetch_payment("1").await.expect_err("500 should fail");
    let GatewayError::Status { body, .. } = err else { panic!("expected Status error") };
    assert_eq!(body.len(), 300);
}

#[tokio::test]
async fn unexpected_body_is_a_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/payments/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"unexpected": true})))
        .mount(&server)
        .await;

    let err = test_client(&server.uri()).fetch_payment("1").await.expect_err("missing fields should fail");
    assert!(matches!(err, GatewayError::Deserialize { .. }), "got {err:?}");
}

#[tokio::test]
async fn unreachable_gateway_is_an_http_error() {
    // Nothing listens on port 1.
    let err = test_client("http://127.0.0.1:1").fetch_payment("1").await.expect_err("closed port should fail");
    assert!(matches!(err, GatewayError::Http(_)), "got {err:?}");
}
