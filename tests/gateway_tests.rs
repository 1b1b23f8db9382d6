//! Gateway tests against a live server on an ephemeral port: payload
//! validation, busy signalling and the status snapshot.

use std::net::SocketAddr;

use serde_json::{json, Value};

use duck_sentry::bus::{self, BusReceiver};
use duck_sentry::gateway::{self, AppState};
use duck_sentry::state::{self, Mode, StateWriter};
use duck_sentry::triggers::{Expression, Trigger, TriggerSource};

/// Bind the router on an ephemeral port. The state writer is returned so
/// tests can stage snapshots; the receiver so they can inspect the queue.
async fn spawn_gateway(capacity: usize) -> (SocketAddr, BusReceiver, StateWriter) {
    let (bus_tx, bus_rx) = bus::bounded(capacity);
    let (state_tx, state_rx) = state::channel();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = gateway::app(AppState {
        bus: bus_tx,
        state: state_rx,
    });
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, bus_rx, state_tx)
}

#[tokio::test]
async fn test_speak_request_is_accepted_and_enqueued() {
    let (addr, mut bus_rx, _state) = spawn_gateway(8).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/speak"))
        .json(&json!({"text": "Hello developer"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 202);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "accepted");

    assert_eq!(
        bus_rx.next().await,
        Some(Trigger::Speak {
            text: "Hello developer".to_string()
        })
    );
}

#[tokio::test]
async fn test_speak_rejects_empty_text() {
    let (addr, _bus_rx, _state) = spawn_gateway(8).await;
    let client = reqwest::Client::new();

    for body in [json!({"text": ""}), json!({"text": "   "}), json!({})] {
        let response = client
            .post(format!("http://{addr}/speak"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400, "payload {body} should be rejected");
    }
}

#[tokio::test]
async fn test_help_request_enqueues_network_trigger() {
    let (addr, mut bus_rx, _state) = spawn_gateway(8).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/help"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 202);
    assert_eq!(
        bus_rx.next().await,
        Some(Trigger::HelpRequest {
            source: TriggerSource::Network
        })
    );
}

#[tokio::test]
async fn test_expression_override_validated_against_fixed_set() {
    let (addr, mut bus_rx, _state) = spawn_gateway(8).await;
    let client = reqwest::Client::new();

    let rejected = client
        .post(format!("http://{addr}/expression"))
        .json(&json!({"expression": "grumpy"}))
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), 400);

    let accepted = client
        .post(format!("http://{addr}/expression"))
        .json(&json!({"expression": "happy"}))
        .send()
        .await
        .unwrap();
    assert_eq!(accepted.status(), 202);

    assert_eq!(
        bus_rx.next().await,
        Some(Trigger::Expression {
            expression: Expression::Happy
        })
    );
}

#[tokio::test]
async fn test_full_queue_answers_busy_instead_of_dropping() {
    // Capacity one and no consumer draining: the second request must get an
    // explicit busy signal, since a human is waiting on it.
    let (addr, _bus_rx, _state) = spawn_gateway(1).await;
    let client = reqwest::Client::new();

    let first = client
        .post(format!("http://{addr}/speak"))
        .json(&json!({"text": "one"}))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), 202);

    let second = client
        .post(format!("http://{addr}/speak"))
        .json(&json!({"text": "two"}))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 503);
    let body: Value = second.json().await.unwrap();
    assert_eq!(body["status"], "busy");
}

#[tokio::test]
async fn test_status_returns_consistent_snapshot() {
    let (addr, _bus_rx, state) = spawn_gateway(8).await;
    let client = reqwest::Client::new();

    state.update(|s| {
        s.mode = Mode::Speaking;
        s.expression = Expression::Concerned;
        s.speaking_text = Some("Take a breath".to_string());
        s.last_error = Some("speech failed: device busy".to_string());
    });

    let response = client
        .get(format!("http://{addr}/status"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["mode"], "SPEAKING");
    assert_eq!(body["expression"], "concerned");
    assert_eq!(body["speaking_text"], "Take a breath");
    assert_eq!(body["last_error"], "speech failed: device busy");
    assert_eq!(body["last_action_at"], Value::Null);
}
