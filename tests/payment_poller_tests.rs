mod support;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use soko::error::SokoError;
use soko::payment::{
    PaymentPoller, PaymentStatusSource, PollEvent, PollOutcome, PollPolicy,
};
use soko::types::{EntityId, PaymentRecord, PaymentStatus};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::{client_for, seeded_store};

/// Replays a fixed sequence of answers; repeats `Pending` once exhausted.
struct ScriptedSource {
    script: Mutex<VecDeque<Result<PaymentStatus, u16>>>,
    calls: Mutex<Vec<Instant>>,
}

impl ScriptedSource {
    fn new(script: Vec<Result<PaymentStatus, u16>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }
}

fn record(id: &EntityId, status: PaymentStatus) -> PaymentRecord {
    serde_json::from_value(json!({"payment_id": id.as_str(), "status": status.to_string()})).unwrap()
}

#[async_trait]
impl PaymentStatusSource for ScriptedSource {
    async fn payment_status(&self, payment_id: &EntityId) -> Result<PaymentRecord, SokoError> {
        self.calls.lock().unwrap().push(Instant::now());
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(PaymentStatus::Pending));
        match next {
            Ok(status) => Ok(record(payment_id, status)),
            Err(status) => Err(SokoError::api(status, json!({"error": "Payment gateway timeout"}))),
        }
    }
}

fn poller(source: Arc<ScriptedSource>, policy: PollPolicy) -> PaymentPoller {
    PaymentPoller::new(source, policy)
}

#[tokio::test(start_paused = true)]
async fn pending_pending_completed_makes_three_checks_five_seconds_apart() {
    let source = ScriptedSource::new(vec![
        Ok(PaymentStatus::Pending),
        Ok(PaymentStatus::Pending),
        Ok(PaymentStatus::Completed),
    ]);
    let start = Instant::now();
    let handle = poller(source.clone(), PollPolicy::default()).spawn(EntityId::from("pay-1"));

    let outcome = handle.outcome().await;
    assert!(outcome.is_success());

    let calls = source.calls();
    assert_eq!(calls.len(), 3);
    let offsets: Vec<u64> = calls
        .iter()
        .map(|at| at.duration_since(start).as_secs())
        .collect();
    assert_eq!(offsets, vec![5, 10, 15]);
}

#[tokio::test(start_paused = true)]
async fn pending_checks_are_reported_as_events() {
    let source = ScriptedSource::new(vec![Ok(PaymentStatus::Pending), Ok(PaymentStatus::Completed)]);
    let mut handle = poller(source, PollPolicy::default()).spawn(EntityId::from("pay-2"));

    match handle.next_event().await {
        Some(PollEvent::Pending { attempt, record }) => {
            assert_eq!(attempt, 1);
            assert_eq!(record.status, PaymentStatus::Pending);
        }
        other => panic!("expected pending event, got {other:?}"),
    }
    assert!(handle.next_event().await.is_none());
    assert!(matches!(handle.outcome().await, PollOutcome::Completed(_)));
}

#[tokio::test(start_paused = true)]
async fn check_failures_are_reported_and_polling_continues() {
    let source = ScriptedSource::new(vec![Err(504), Ok(PaymentStatus::Completed)]);
    let mut handle = poller(source.clone(), PollPolicy::default()).spawn(EntityId::from("pay-3"));

    match handle.next_event().await {
        Some(PollEvent::Failed {
            attempt,
            error,
            message,
        }) => {
            assert_eq!(attempt, 1);
            assert_eq!(error.status, Some(504));
            assert_eq!(message, "Payment gateway timeout");
        }
        other => panic!("expected failure event, got {other:?}"),
    }
    assert!(handle.outcome().await.is_success());
    assert_eq!(source.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn failed_status_ends_polling() {
    let source = ScriptedSource::new(vec![Ok(PaymentStatus::Failed)]);
    let handle = poller(source.clone(), PollPolicy::default()).spawn(EntityId::from("pay-4"));

    match handle.outcome().await {
        PollOutcome::Failed(record) => {
            assert_eq!(record.tracking_id().map(EntityId::as_str), Some("pay-4"))
        }
        other => panic!("expected failed outcome, got {other:?}"),
    }
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(source.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn max_attempts_bounds_the_number_of_checks() {
    let source = ScriptedSource::new(vec![]);
    let policy = PollPolicy::default()
        .with_interval(Duration::from_secs(2))
        .with_max_attempts(3);

    let outcome = poller(source.clone(), policy).spawn(EntityId::from("pay-5")).outcome().await;

    assert_eq!(outcome, PollOutcome::Exhausted { attempts: 3 });
    assert_eq!(source.calls().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_polling() {
    let source = ScriptedSource::new(vec![]);
    let handle = poller(source.clone(), PollPolicy::default()).spawn(EntityId::from("pay-6"));

    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(source.calls().len(), 2);

    handle.cancel();
    assert_eq!(handle.outcome().await, PollOutcome::Cancelled);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(source.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_stops_polling() {
    let source = ScriptedSource::new(vec![]);
    let handle = poller(source.clone(), PollPolicy::default()).spawn(EntityId::from("pay-7"));

    tokio::time::sleep(Duration::from_secs(6)).await;
    drop(handle);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(source.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn run_returns_cancelled_for_a_pre_cancelled_token() {
    let source = ScriptedSource::new(vec![Ok(PaymentStatus::Completed)]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = poller(source.clone(), PollPolicy::default())
        .run(&EntityId::from("pay-8"), cancel, None)
        .await;

    assert_eq!(outcome, PollOutcome::Cancelled);
    assert!(source.calls().is_empty());
}

#[tokio::test]
async fn api_client_polls_verify_endpoint_until_completed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/verify-payment/"))
        .and(body_json(json!({"payment_id": "pay-9"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"payment_id": "pay-9", "status": "pending"})))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/verify-payment/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "payment_id": "pay-9",
            "status": "completed",
            "amount": 15000,
            "currency": "TZS"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, seeded_store("access-1", None));
    let policy = PollPolicy::default().with_interval(Duration::from_millis(20));
    let handle = client.watch_payment_with("pay-9", policy);

    match handle.outcome().await {
        PollOutcome::Completed(record) => {
            assert_eq!(record.amount.as_deref(), Some("15000"));
            assert_eq!(record.currency.as_deref(), Some("TZS"));
        }
        other => panic!("expected completed outcome, got {other:?}"),
    }
}

#[tokio::test]
async fn status_only_verify_responses_still_settle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/verify-payment/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "pending"})))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/verify-payment/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 41,
            "payment_id": "AZ-pay-10",
            "status": "completed",
            "created_at": "2024-05-01T10:00:00"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, seeded_store("access-1", None));
    let policy = PollPolicy::default()
        .with_interval(Duration::from_millis(20))
        .with_max_attempts(5);
    let mut handle = client.watch_payment_with("AZ-pay-10", policy);

    match handle.next_event().await {
        Some(PollEvent::Pending { record, .. }) => {
            assert_eq!(record.id, None);
            assert_eq!(record.tracking_id().map(EntityId::as_str), Some("AZ-pay-10"));
        }
        other => panic!("expected pending event, got {other:?}"),
    }
    match handle.outcome().await {
        PollOutcome::Completed(record) => {
            assert_eq!(record.id.as_ref().map(EntityId::as_str), Some("41"));
            assert!(record.created_at.is_some());
        }
        other => panic!("expected completed outcome, got {other:?}"),
    }
}
