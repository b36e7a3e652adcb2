use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vaultcore_dashboard::{
    BankApi, BankClient, Config, Dashboard, DashboardError, LoginFlow, Route, Session,
    SessionContext, TransferRequest, TransferStep,
};

fn client_for(server: &MockServer) -> BankClient {
    let config = Config {
        api_base_url: server.uri(),
        ..Config::default()
    };
    BankClient::new(&config).expect("client should build")
}

#[tokio::test]
async fn balance_is_fetched_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/account/my-balance"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "username": "ishaq",
            "email": "ishaq@example.com",
            "accountNumber": "ACC-1A2B3C",
            "currentBalance": 5000.50
        })))
        .expect(1)
        .mount(&server)
        .await;

    let account = client_for(&server).my_balance("abc").await.unwrap();
    assert_eq!(account.account_number, "ACC-1A2B3C");
    assert_eq!(account.current_balance, Decimal::from_str("5000.50").unwrap());
}

#[tokio::test]
async fn unauthorized_history_is_an_auth_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/transaction/history"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .transaction_history("expired")
        .await
        .unwrap_err();
    assert!(matches!(err, DashboardError::Unauthorized { status: 401, .. }));
}

#[tokio::test]
async fn rejected_transfer_carries_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/transaction/transfer"))
        .and(header_exists("x-request-id"))
        .and(body_json(json!({
            "receiverAccount": "ACC-XYZ123",
            "amount": "250.00",
            "otp": "123456"
        })))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": "Insufficient balance"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let request = TransferRequest {
        receiver_account: "ACC-XYZ123".to_string(),
        amount: Decimal::from_str("250.00").unwrap(),
        otp: "123456".to_string(),
    };
    let err = client_for(&server)
        .transfer("abc", &request)
        .await
        .unwrap_err();

    assert_eq!(err.user_message("Transfer failed. Check OTP or Balance."), "Insufficient balance");
    assert!(matches!(err, DashboardError::Api { status: 400, .. }));
}

#[tokio::test]
async fn plain_text_error_body_is_used_as_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/transaction/request-transfer-otp"))
        .respond_with(ResponseTemplate::new(500).set_body_string("OTP service down"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .request_transfer_otp("abc")
        .await
        .unwrap_err();
    assert_eq!(err.user_message("Failed to initiate transfer."), "OTP service down");
}

#[tokio::test]
async fn empty_otp_reply_is_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/transaction/request-transfer-otp"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client_for(&server).request_transfer_otp("abc").await.unwrap();
    assert!(reply.message.is_none());
}

#[tokio::test]
async fn statement_is_returned_as_bytes() {
    let server = MockServer::start().await;
    let pdf = b"%PDF-1.4 statement".to_vec();
    Mock::given(method("GET"))
        .and(path("/api/transaction/download-pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(pdf.clone()),
        )
        .mount(&server)
        .await;

    let bytes = client_for(&server).download_statement("abc").await.unwrap();
    assert_eq!(bytes, pdf);
}

#[tokio::test]
async fn legacy_login_route_and_token_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(json!({"email": "ishaq@example.com", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "legacy"})))
        .expect(1)
        .mount(&server)
        .await;

    let config = Config {
        api_base_url: server.uri(),
        login_path: "/login".to_string(),
        ..Config::default()
    };
    let client = BankClient::new(&config).unwrap();
    let session = SessionContext::in_memory();
    let mut flow = LoginFlow::new(session.clone());

    let route = flow.submit(&client, "ishaq@example.com", "pw").await.unwrap();
    assert_eq!(route, Route::Dashboard);
    assert_eq!(session.access_token().as_deref(), Some("legacy"));
    // No username in the reply, the email stands in
    assert_eq!(session.username().as_deref(), Some("ishaq@example.com"));
}

#[tokio::test]
async fn dashboard_logs_out_when_confirm_is_forbidden() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/account/my-balance"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "username": "ishaq",
            "accountNumber": "ACC-1A2B3C",
            "currentBalance": 100
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/transaction/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "senderAccountId": 7, "receiverAccountId": 9, "amount": 25,
             "status": "SUCCESS", "timestamp": "2024-03-01T10:15:30"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/transaction/request-transfer-otp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "OTP sent"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/transaction/transfer"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let config = Config {
        api_base_url: server.uri(),
        ..Config::default()
    };
    let session = SessionContext::in_memory();
    session.set(&Session::new("abc")).unwrap();
    let mut dashboard = Dashboard::new(BankClient::new(&config).unwrap(), session.clone(), &config);

    assert_eq!(dashboard.mount().await, Route::Dashboard);
    assert_eq!(dashboard.transactions.len(), 1);

    dashboard.transfer.receiver_account = "ACC-XYZ123".to_string();
    dashboard.transfer.amount = "10".to_string();
    dashboard.request_transfer_otp().await.unwrap();
    assert_eq!(dashboard.transfer.notice(), Some("OTP sent"));

    dashboard.transfer.otp = "123456".to_string();
    let err = dashboard.confirm_transfer().await.unwrap_err();

    assert!(err.is_auth_failure());
    assert_eq!(dashboard.route(), Route::Login);
    assert_eq!(dashboard.transfer.step(), TransferStep::EnteringDetails);
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn rejected_login_shows_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"message": "Invalid email or password."})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let session = SessionContext::in_memory();
    let mut flow = LoginFlow::new(session.clone());

    let err = flow
        .submit(&client, "ishaq@example.com", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DashboardError::Unauthorized {
            status: 401,
            message: Some(_)
        }
    ));
    assert_eq!(flow.error.as_deref(), Some("Invalid email or password."));
    assert!(!session.is_authenticated());
}
