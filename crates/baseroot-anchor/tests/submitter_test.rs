//! AnchorSubmitter against a wiremock JSON-RPC endpoint.

use std::sync::Arc;

use baseroot_anchor::{
    AnchorConfig, AnchorError, AnchorRecord, AnchorStatus, AnchorSubmitter, Anchorer, Hash,
};
use baseroot_core::{sha256_digest, ContentId, Pubkey};
use baseroot_crypto::{KeyProvider, LocalKeyProvider};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BLOCKHASH: &str = "11111111111111111111111111111111";

fn record() -> AnchorRecord {
    AnchorRecord::new(
        sha256_digest(b"Hello, Pinata!"),
        ContentId::new("QmNRCQWfgze6AbBCaT1rkrkV5tJ2aP4oTNPb5JZcXYywve").unwrap(),
        Pubkey::new([2; 32]),
    )
}

fn test_submitter(mock_server: &MockServer, confirm_timeout_secs: u64) -> AnchorSubmitter {
    let mut config = AnchorConfig::local_mock(&mock_server.uri(), Pubkey::new([7; 32])).unwrap();
    config.confirm_timeout_secs = confirm_timeout_secs;
    let signer: Arc<dyn KeyProvider> = Arc::new(LocalKeyProvider::from_seed(&[1; 32]));
    AnchorSubmitter::new(&config, signer).unwrap()
}

fn rpc_result(result: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": result}))
}

async fn mount_blockhash(mock_server: &MockServer) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "getLatestBlockhash"})))
        .respond_with(rpc_result(json!({
            "context": {"slot": 100},
            "value": {"blockhash": BLOCKHASH, "lastValidBlockHeight": 250}
        })))
        .mount(mock_server)
        .await;
}

/// The signature the submitter will produce for `record()`.
fn expected_signature(submitter: &AnchorSubmitter) -> String {
    submitter
        .prepare_with_blockhash(&record(), BLOCKHASH.parse::<Hash>().unwrap())
        .unwrap()
        .signature
        .to_base58()
}

async fn mount_send_any(mock_server: &MockServer, signature: &str) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "sendTransaction"})))
        .respond_with(rpc_result(json!(signature)))
        .expect(1)
        .mount(mock_server)
        .await;
}

async fn mount_status(mock_server: &MockServer, value: serde_json::Value) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "getSignatureStatuses"})))
        .respond_with(rpc_result(json!({"context": {"slot": 101}, "value": [value]})))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn anchor_sends_once_and_waits_for_confirmation() {
    let mock_server = MockServer::start().await;
    let submitter = test_submitter(&mock_server, 2);
    let sig = expected_signature(&submitter);

    mount_blockhash(&mock_server).await;
    mount_send_any(&mock_server, &sig).await;
    mount_status(
        &mock_server,
        json!({"slot": 101, "confirmations": 0, "err": null, "confirmationStatus": "confirmed"}),
    )
    .await;

    let signature = submitter.anchor(&record()).await.unwrap();
    assert_eq!(signature.to_base58(), sig);
}

#[tokio::test]
async fn send_transaction_carries_base64_wire_bytes() {
    use base64::Engine;

    let mock_server = MockServer::start().await;
    let submitter = test_submitter(&mock_server, 2);
    let prepared = submitter
        .prepare_with_blockhash(&record(), BLOCKHASH.parse::<Hash>().unwrap())
        .unwrap();
    let encoded = base64::engine::general_purpose::STANDARD.encode(&prepared.wire);

    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "sendTransaction",
            "params": [encoded, {"encoding": "base64", "preflightCommitment": "confirmed"}]
        })))
        .respond_with(rpc_result(json!(prepared.signature.to_base58())))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_status(&mock_server, json!({"err": null, "confirmationStatus": "finalized"})).await;

    let signature = submitter.submit(&prepared).await.unwrap();
    assert_eq!(signature, prepared.signature);
}

#[tokio::test]
async fn transaction_error_is_rejected() {
    let mock_server = MockServer::start().await;
    let submitter = test_submitter(&mock_server, 2);
    let sig = expected_signature(&submitter);

    mount_blockhash(&mock_server).await;
    mount_send_any(&mock_server, &sig).await;
    mount_status(
        &mock_server,
        json!({"slot": 101, "err": {"InstructionError": [0, {"Custom": 1}]}, "confirmationStatus": "processed"}),
    )
    .await;

    match submitter.anchor(&record()).await.unwrap_err() {
        AnchorError::Rejected { signature, reason } => {
            assert_eq!(signature.to_base58(), sig);
            assert!(reason.contains("InstructionError"));
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn unconfirmed_transaction_times_out() {
    let mock_server = MockServer::start().await;
    let submitter = test_submitter(&mock_server, 0);
    let sig = expected_signature(&submitter);

    mount_blockhash(&mock_server).await;
    mount_send_any(&mock_server, &sig).await;
    mount_status(&mock_server, serde_json::Value::Null).await;

    let err = submitter.anchor(&record()).await.unwrap_err();
    assert!(matches!(err, AnchorError::ConfirmationTimeout { .. }));
    assert!(err.outcome_unknown());
}

#[tokio::test]
async fn preflight_failure_is_rpc_error_and_not_polled() {
    let mock_server = MockServer::start().await;
    let submitter = test_submitter(&mock_server, 2);

    mount_blockhash(&mock_server).await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "sendTransaction"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32002, "message": "Transaction simulation failed: Attempt to debit an account but found no record of a prior credit."}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "getSignatureStatuses"})))
        .respond_with(rpc_result(json!({"value": [null]})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let err = submitter.anchor(&record()).await.unwrap_err();
    assert!(!err.outcome_unknown());
    match err {
        AnchorError::Rpc { method, code, message } => {
            assert_eq!(method, "sendTransaction");
            assert_eq!(code, -32002);
            assert!(message.contains("simulation failed"));
        }
        other => panic!("expected Rpc, got {other:?}"),
    }
}

#[tokio::test]
async fn mismatched_signature_is_outcome_unknown() {
    let mock_server = MockServer::start().await;
    let submitter = test_submitter(&mock_server, 2);
    let other = LocalKeyProvider::from_seed(&[9; 32]).sign(b"x").unwrap().to_base58();

    mount_blockhash(&mock_server).await;
    mount_send_any(&mock_server, &other).await;

    let err = submitter.anchor(&record()).await.unwrap_err();
    assert!(err.outcome_unknown());
    match err {
        AnchorError::Unresolved { source, .. } => {
            assert!(matches!(*source, AnchorError::InvalidResponse { .. }))
        }
        other => panic!("expected Unresolved, got {other:?}"),
    }
}

#[tokio::test]
async fn failed_send_reply_is_outcome_unknown_and_not_polled() {
    let mock_server = MockServer::start().await;
    let submitter = test_submitter(&mock_server, 2);
    let sig = expected_signature(&submitter);

    mount_blockhash(&mock_server).await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "sendTransaction"})))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "getSignatureStatuses"})))
        .respond_with(rpc_result(json!({"value": [null]})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let err = submitter.anchor(&record()).await.unwrap_err();
    assert!(err.outcome_unknown());
    match err {
        AnchorError::Unresolved { signature, source } => {
            assert_eq!(signature.to_base58(), sig);
            assert!(source.to_string().contains("502"));
        }
        other => panic!("expected Unresolved, got {other:?}"),
    }
}

#[tokio::test]
async fn status_errors_after_send_are_outcome_unknown() {
    let mock_server = MockServer::start().await;
    let submitter = test_submitter(&mock_server, 0);
    let sig = expected_signature(&submitter);

    mount_blockhash(&mock_server).await;
    mount_send_any(&mock_server, &sig).await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "getSignatureStatuses"})))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&mock_server)
        .await;

    let err = submitter.anchor(&record()).await.unwrap_err();
    assert!(err.outcome_unknown());
    assert!(matches!(err, AnchorError::Unresolved { .. }));
}

#[tokio::test]
async fn transient_status_error_keeps_polling() {
    let mock_server = MockServer::start().await;
    let submitter = test_submitter(&mock_server, 2);
    let sig = expected_signature(&submitter);

    mount_blockhash(&mock_server).await;
    mount_send_any(&mock_server, &sig).await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "getSignatureStatuses"})))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_status(&mock_server, json!({"err": null, "confirmationStatus": "confirmed"})).await;

    let signature = submitter.anchor(&record()).await.unwrap();
    assert_eq!(signature.to_base58(), sig);
}

#[tokio::test]
async fn unreachable_rpc_is_http_error() {
    let config = AnchorConfig::local_mock("http://127.0.0.1:1", Pubkey::new([7; 32])).unwrap();
    let signer: Arc<dyn KeyProvider> = Arc::new(LocalKeyProvider::from_seed(&[1; 32]));
    let submitter = AnchorSubmitter::new(&config, signer).unwrap();
    let err = submitter.prepare(&record()).await.unwrap_err();
    assert!(matches!(err, AnchorError::Http { .. }));
}

#[tokio::test]
async fn signature_status_classifies() {
    let submitter_sig = LocalKeyProvider::from_seed(&[1; 32]).sign(b"y").unwrap();

    let cases = [
        (serde_json::Value::Null, AnchorStatus::NotFound),
        (json!({"err": null, "confirmationStatus": "processed"}), AnchorStatus::Pending),
        (json!({"err": null, "confirmationStatus": "finalized"}), AnchorStatus::Confirmed),
    ];
    for (value, expected) in cases {
        let mock_server = MockServer::start().await;
        mount_status(&mock_server, value).await;
        let submitter = test_submitter(&mock_server, 2);
        assert_eq!(submitter.signature_status(&submitter_sig).await.unwrap(), expected);
    }
}
