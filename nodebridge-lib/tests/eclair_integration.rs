//! Integration tests for the Eclair dialect.
//!
//! Every test runs against a wiremock server standing in for Eclair's REST API.
//!
//! ```bash
//! cargo test -p nodebridge-lib --test eclair_integration
//! ```

use std::time::Duration;

use nodebridge_lib::config::{BitcoindConfig, EclairConfig, PollConfig, RetryConfig};
use nodebridge_lib::eclair::EclairClient;
use nodebridge_lib::{
    build_client, CancelToken, InvoiceStatus, LightningClient, NodeBridgeError, NodeInfo,
    OpenChannelOutcome, OpenChannelRequest, OutPoint, PayOutcome, PollResult,
};
use wiremock::{
    matchers::{body_string_contains, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

// base64(":secret")
const BASIC_AUTH: &str = "Basic OnNlY3JldA==";

fn fast_config(uri: &str) -> EclairConfig {
    EclairConfig::new(uri, "secret")
        .with_retry(RetryConfig::new(2, Duration::from_millis(1)))
        .with_poll(
            PollConfig::default()
                .with_intervals(Duration::from_millis(5), Duration::from_millis(5))
                .with_max_attempts(Some(50)),
        )
}

fn client_for(server: &MockServer) -> EclairClient {
    EclairClient::new(fast_config(&server.uri())).unwrap()
}

fn open_request() -> OpenChannelRequest {
    OpenChannelRequest {
        node: NodeInfo::new("02aa", "10.0.0.2", 9735),
        amount_sat: 100_000,
        fee_rate_sat_per_vb: 5,
    }
}

// ============================================================================
// Node info and auth
// ============================================================================

#[tokio::test]
async fn test_get_info_mock() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/getinfo"))
        .and(header("authorization", BASIC_AUTH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "nodeId": "03abc",
            "alias": "bob",
            "blockHeight": 812,
            "publicAddresses": ["10.0.0.1:9735", "[::1]:9736", "garbage"]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let info = client_for(&mock_server).get_info().await.unwrap();

    assert_eq!(info.block_height, 812);
    assert_eq!(
        info.nodes,
        vec![
            NodeInfo::new("03abc", "10.0.0.1", 9735),
            NodeInfo::new("03abc", "::1", 9736),
        ]
    );
}

#[tokio::test]
async fn test_backend_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/getinfo"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(serde_json::json!({ "error": "boom" })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server).get_info().await.unwrap_err();
    match err {
        NodeBridgeError::Backend { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_unstructured_backend_error_keeps_raw_text() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/getinfo"))
        .respond_with(ResponseTemplate::new(401).set_body_string("The supplied authentication is invalid"))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server).get_info().await.unwrap_err();
    assert_eq!(
        err.backend_message(),
        Some("The supplied authentication is invalid")
    );
}

#[tokio::test]
async fn test_unreachable_after_retries() {
    // Nothing listens on port 1.
    let config = EclairConfig::new("http://127.0.0.1:1", "secret")
        .with_retry(RetryConfig::new(3, Duration::from_millis(1)));
    let client = EclairClient::new(config).unwrap();

    match client.get_info().await {
        Err(NodeBridgeError::Unreachable { attempts, .. }) => assert_eq!(attempts, 3),
        other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }
}

// ============================================================================
// Invoices
// ============================================================================

#[tokio::test]
async fn test_create_invoice_mock() {
    let mock_server = MockServer::start().await;
    let now = chrono::Utc::now().timestamp();

    Mock::given(method("POST"))
        .and(path("/createinvoice"))
        .and(body_string_contains("amountMsat=5000"))
        .and(body_string_contains("expireIn=600"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "serialized": "lnbcrt50n1",
            "paymentHash": "h1",
            "timestamp": now,
            "expiry": 600,
            "amount": 5000,
            "description": "coffee"
        })))
        .mount(&mock_server)
        .await;

    let invoice = client_for(&mock_server)
        .create_invoice(5000, "coffee", Duration::from_secs(600))
        .await
        .unwrap();

    assert_eq!(invoice.id, "h1");
    assert_eq!(invoice.bolt11, "lnbcrt50n1");
    assert_eq!(invoice.status, InvoiceStatus::Unpaid);
    assert_eq!(invoice.expires_at.timestamp(), now + 600);
}

async fn mount_invoice(server: &MockServer, timestamp: i64) {
    Mock::given(method("POST"))
        .and(path("/getinvoice"))
        .and(body_string_contains("paymentHash=h1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "serialized": "lnbcrt50n1",
            "paymentHash": "h1",
            "timestamp": timestamp,
            "expiry": 3600,
            "amount": 5000
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_get_paid_invoice_mock() {
    let mock_server = MockServer::start().await;
    let now = chrono::Utc::now();
    mount_invoice(&mock_server, now.timestamp()).await;

    Mock::given(method("POST"))
        .and(path("/getreceivedinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "paymentHash": "h1",
            "amountMsat": 5000,
            "receivedAt": now.timestamp_millis()
        })))
        .mount(&mock_server)
        .await;

    let invoice = client_for(&mock_server).get_invoice("h1").await.unwrap();

    assert_eq!(invoice.status, InvoiceStatus::Paid);
    assert_eq!(invoice.amount_received_msat, 5000);
    assert_eq!(
        invoice.paid_at.map(|at| at.timestamp_millis()),
        Some(now.timestamp_millis())
    );
}

#[tokio::test]
async fn test_failed_received_lookup_counts_as_zero() {
    let mock_server = MockServer::start().await;
    mount_invoice(&mock_server, chrono::Utc::now().timestamp()).await;

    Mock::given(method("POST"))
        .and(path("/getreceivedinfo"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({ "error": "cannot find payment" })),
        )
        .mount(&mock_server)
        .await;

    let invoice = client_for(&mock_server).get_invoice("h1").await.unwrap();

    assert_eq!(invoice.status, InvoiceStatus::Unpaid);
    assert_eq!(invoice.amount_received_msat, 0);
    assert_eq!(invoice.paid_at, None);
}

#[tokio::test]
async fn test_unpaid_invoice_past_expiry_is_expired() {
    let mock_server = MockServer::start().await;
    mount_invoice(&mock_server, 1_600_000_000).await;

    Mock::given(method("POST"))
        .and(path("/getreceivedinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "paymentHash": "h1",
            "amountMsat": 4999
        })))
        .mount(&mock_server)
        .await;

    let invoice = client_for(&mock_server).get_invoice("h1").await.unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Expired);
    assert_eq!(invoice.amount_received_msat, 4999);
}

// ============================================================================
// Payments
// ============================================================================

async fn mount_pay(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/payinvoice"))
        .and(body_string_contains("invoice=lnbcrt1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!("uuid-1")))
        .mount(server)
        .await;
}

fn sent_info(status: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!([
        { "id": "uuid-1", "paymentHash": "h1", "status": status }
    ]))
}

#[tokio::test]
async fn test_pay_polls_until_sent() {
    let mock_server = MockServer::start().await;
    mount_pay(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/getsentinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/getsentinfo"))
        .respond_with(sent_info(serde_json::json!({ "type": "pending" })))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/getsentinfo"))
        .and(body_string_contains("id=uuid-1"))
        .respond_with(sent_info(serde_json::json!({ "type": "sent" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server)
        .pay("lnbcrt1", &CancelToken::never())
        .await
        .unwrap();
    assert_eq!(result, PollResult::Settled(PayOutcome::Ok));
}

#[tokio::test]
async fn test_pay_failed_status() {
    let mock_server = MockServer::start().await;
    mount_pay(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/getsentinfo"))
        .respond_with(sent_info(serde_json::json!("FAILED")))
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server)
        .pay("lnbcrt1", &CancelToken::never())
        .await
        .unwrap();
    assert_eq!(result, PollResult::Settled(PayOutcome::CouldNotFindRoute));
}

#[tokio::test]
async fn test_pay_rejected_without_polling() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/payinvoice"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({ "error": "invalid invoice" })),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/getsentinfo"))
        .respond_with(sent_info(serde_json::json!("PENDING")))
        .expect(0)
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server)
        .pay("lnbcrt1", &CancelToken::never())
        .await
        .unwrap();
    assert_eq!(result, PollResult::Settled(PayOutcome::CouldNotFindRoute));
}

#[tokio::test]
async fn test_pay_cancelled_while_pending() {
    let mock_server = MockServer::start().await;
    mount_pay(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/getsentinfo"))
        .respond_with(sent_info(serde_json::json!("PENDING")))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let (handle, token) = CancelToken::pair();

    let (result, _) = tokio::join!(client.pay("lnbcrt1", &token), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.cancel();
    });

    assert_eq!(result.unwrap(), PollResult::Cancelled);
}

#[tokio::test]
async fn test_pay_cancel_interrupts_slow_status_query() {
    let mock_server = MockServer::start().await;
    mount_pay(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/getsentinfo"))
        .respond_with(sent_info(serde_json::json!("SUCCEEDED")).set_delay(Duration::from_secs(10)))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let (handle, token) = CancelToken::pair();
    let started = std::time::Instant::now();

    let (result, _) = tokio::join!(client.pay("lnbcrt1", &token), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.cancel();
    });

    assert_eq!(result.unwrap(), PollResult::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_pay_gives_up_at_ceiling() {
    let mock_server = MockServer::start().await;
    mount_pay(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/getsentinfo"))
        .respond_with(sent_info(serde_json::json!("PENDING")))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = fast_config(&mock_server.uri()).with_poll(
        PollConfig::default()
            .with_intervals(Duration::from_millis(1), Duration::from_millis(1))
            .with_max_attempts(Some(3)),
    );
    let client = EclairClient::new(config).unwrap();

    let result = client.pay("lnbcrt1", &CancelToken::never()).await.unwrap();
    assert_eq!(result, PollResult::GaveUp { attempts: 3 });
}

// ============================================================================
// Channels
// ============================================================================

async fn open_with(response: ResponseTemplate, channel_state: Option<&str>) -> OpenChannelOutcome {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/open"))
        .and(body_string_contains("nodeId=02aa"))
        .and(body_string_contains("fundingSatoshis=100000"))
        .and(body_string_contains("fundingFeerateSatByte=5"))
        .respond_with(response)
        .expect(1)
        .mount(&mock_server)
        .await;

    if let Some(state) = channel_state {
        Mock::given(method("POST"))
            .and(path("/channel"))
            .and(body_string_contains("channelId=abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "nodeId": "02aa",
                "channelId": "abc123",
                "state": state,
                "data": {}
            })))
            .mount(&mock_server)
            .await;
    }

    client_for(&mock_server)
        .open_channel(&open_request())
        .await
        .unwrap()
}

fn open_error(message: &str) -> ResponseTemplate {
    ResponseTemplate::new(500).set_body_json(serde_json::json!({ "error": message }))
}

fn open_success(message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!(message))
}

#[tokio::test]
async fn test_open_channel_outcomes() {
    let created = "created channel abc123 with fundingTxId=deadbeef and fees=720 sat";

    assert_eq!(
        open_with(open_success(created), Some("WAIT_FOR_FUNDING_CONFIRMED")).await,
        OpenChannelOutcome::NeedMoreConfirmations
    );
    assert_eq!(
        open_with(open_success(created), Some("NORMAL")).await,
        OpenChannelOutcome::Ok
    );
    assert_eq!(
        open_with(open_success("couldn't publish funding tx"), None).await,
        OpenChannelOutcome::CannotAffordFunding
    );
    assert_eq!(
        open_with(open_error("peer 02aa is not connected"), None).await,
        OpenChannelOutcome::PeerNotConnected
    );
    assert_eq!(
        open_with(open_error("insufficient funds"), None).await,
        OpenChannelOutcome::CannotAffordFunding
    );
    assert_eq!(
        open_with(
            open_error("peer sent error: 'Multiple channels unsupported'"),
            None
        )
        .await,
        OpenChannelOutcome::AlreadyExists
    );
    assert_eq!(
        open_with(open_error("something unexpected"), None).await,
        OpenChannelOutcome::AlreadyExists
    );
}

#[tokio::test]
async fn test_connect_to_mock() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/connect"))
        .and(body_string_contains("nodeId=02aa"))
        .and(body_string_contains("host=10.0.0.2"))
        .and(body_string_contains("port=9735"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!("connected")))
        .expect(1)
        .mount(&mock_server)
        .await;

    client_for(&mock_server)
        .connect_to(&NodeInfo::new("02aa", "10.0.0.2", 9735))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_list_channels_mock() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/channels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "nodeId": "02aa",
                "channelId": "abc123",
                "state": "NORMAL",
                "data": { "commitments": {
                    "channelFlags": 1,
                    "localCommit": { "spec": { "toLocalMsat": 42000 } },
                    "commitInput": { "outPoint": "abcd1234:0", "amountSatoshis": 100000 }
                } }
            },
            {
                "nodeId": "02bb",
                "channelId": "def456",
                "state": "WAIT_FOR_FUNDING_CONFIRMED",
                "data": {}
            }
        ])))
        .mount(&mock_server)
        .await;

    let channels = client_for(&mock_server).list_channels().await.unwrap();

    assert_eq!(channels.len(), 2);
    assert_eq!(channels[0].remote_node, "02aa");
    assert_eq!(channels[0].local_balance_msat, 42000);
    assert_eq!(channels[0].capacity_sat, 100000);
    assert_eq!(
        channels[0].channel_point,
        Some(OutPoint {
            txid: "abcd1234".into(),
            vout: 0
        })
    );
    assert!(channels[0].is_active && channels[0].is_public);
    assert_eq!(channels[1].channel_point, None);
    assert!(!channels[1].is_active);
}

// ============================================================================
// Collaborators
// ============================================================================

#[tokio::test]
async fn test_deposit_address_through_bitcoind() {
    let eclair = MockServer::start().await;
    let bitcoind = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_string_contains("getnewaddress"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "result": "bcrt1qdeposit",
            "error": null,
            "id": "nodebridge"
        })))
        .expect(1)
        .mount(&bitcoind)
        .await;

    let config = fast_config(&eclair.uri())
        .with_bitcoind(BitcoindConfig::new(bitcoind.uri(), "rpc", "pw"));
    let client = build_client(nodebridge_lib::config::BackendConfig::Eclair(config)).unwrap();

    assert_eq!(client.get_deposit_address().await.unwrap(), "bcrt1qdeposit");
}

#[tokio::test]
async fn test_listen_without_event_source() {
    let mock_server = MockServer::start().await;
    let result = client_for(&mock_server).listen().await;
    assert!(matches!(result, Err(NodeBridgeError::NotSupported(_))));
}
