//! Integration tests: interaction buffer flush properties and brain client
//! failure taxonomy against a fake backend.
//!
//! ## Scenarios
//! 1. Everything buffered before capture is dispatched exactly once.
//! 2. An empty buffer with no pending snapshot performs no network call.
//! 3. Records appended while a flush is out on the network wait for the
//!    next tick (capture-then-clear atomicity).
//! 4. A pending snapshot syncs even when the batch is empty.
//! 5. A 429 or quota-text backend response yields SLEEPING / "Exhausted".
//! 6. A dead backend yields IDLE, a warning-marker response, no gem updates.
//! 7. A secure origin dialing a direct target reports the security block.
//! 8. A healthy backend round-trips cycle results and memory endpoints.

use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use luminous_core::{
    BrainClient, BrainError, Console, ContextSnapshot, InteractionBuffer, InteractionRecord,
    LuminousState, MemoryKind, MemorySink, SyncEngine, WARNING_MARKER,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

fn rec(input: &str) -> InteractionRecord {
    InteractionRecord::new(input, "ok", LuminousState::Idle, "Neutral")
}

fn inputs(batch: &[InteractionRecord]) -> Vec<String> {
    batch.iter().map(|r| r.input.clone()).collect()
}

// ---------------------------------------------------------------------------
// Recording sink: captures flush traffic; optionally gates the first history
// write so a test can interleave producer appends with in-flight network I/O.
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RecordingSink {
    history: Mutex<Vec<Vec<InteractionRecord>>>,
    contexts: Mutex<Vec<ContextSnapshot>>,
    entered: Notify,
    release: Notify,
    gated: AtomicBool,
}

impl RecordingSink {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn gated() -> Arc<Self> {
        let sink = Self::default();
        sink.gated.store(true, Ordering::SeqCst);
        Arc::new(sink)
    }

    fn history_batches(&self) -> Vec<Vec<InteractionRecord>> {
        self.history.lock().unwrap().clone()
    }

    fn context_saves(&self) -> Vec<ContextSnapshot> {
        self.contexts.lock().unwrap().clone()
    }
}

#[async_trait]
impl MemorySink for RecordingSink {
    async fn append_history(&self, items: &[InteractionRecord]) -> Result<(), BrainError> {
        self.history.lock().unwrap().push(items.to_vec());
        if self.gated.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        Ok(())
    }

    async fn save_context(&self, snapshot: &ContextSnapshot) -> Result<(), BrainError> {
        self.contexts.lock().unwrap().push(snapshot.clone());
        Ok(())
    }
}

fn sync_engine(
    buffer: &Arc<InteractionBuffer>,
    sink: &Arc<RecordingSink>,
) -> Arc<SyncEngine> {
    Arc::new(SyncEngine::new(
        Arc::clone(buffer),
        Arc::clone(sink) as Arc<dyn MemorySink>,
        Console::new(),
    ))
}

// ===========================================================================
// Scenario 1: everything buffered before capture is dispatched exactly once
// ===========================================================================

#[tokio::test]
async fn flush_dispatches_each_record_exactly_once() {
    let buffer = Arc::new(InteractionBuffer::new());
    let sink = RecordingSink::new();
    let sync = sync_engine(&buffer, &sink);

    buffer.record(rec("A"));
    buffer.record(rec("B"));
    buffer.set_context(ContextSnapshot::from_cycle("B", "ok"));

    let dispatched = sync.flush().await;
    assert_eq!(dispatched, 2);
    assert!(buffer.is_empty());

    let batches = sink.history_batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(inputs(&batches[0]), vec!["A", "B"]);
    assert_eq!(sink.context_saves().len(), 1);

    // Second tick has nothing; neither endpoint is touched again.
    assert_eq!(sync.flush().await, 0);
    assert_eq!(sink.history_batches().len(), 1);
    assert_eq!(sink.context_saves().len(), 1);
}

// ===========================================================================
// Scenario 2: empty flush performs no network call
// ===========================================================================

#[tokio::test]
async fn empty_flush_touches_nothing() {
    let buffer = Arc::new(InteractionBuffer::new());
    let sink = RecordingSink::new();
    let sync = sync_engine(&buffer, &sink);

    assert_eq!(sync.flush().await, 0);
    assert!(sink.history_batches().is_empty());
    assert!(sink.context_saves().is_empty());
}

// ===========================================================================
// Scenario 3: records appended during network I/O wait for the next tick
// ===========================================================================

#[tokio::test]
async fn late_records_land_in_the_next_flush() {
    let buffer = Arc::new(InteractionBuffer::new());
    let sink = RecordingSink::gated();
    let sync = sync_engine(&buffer, &sink);

    buffer.record(rec("A"));
    buffer.record(rec("B"));

    let flush = tokio::spawn({
        let sync = Arc::clone(&sync);
        async move { sync.flush().await }
    });

    // The sink is now mid-"network call" holding the captured batch.
    sink.entered.notified().await;
    buffer.record(rec("C"));
    assert_eq!(buffer.pending_len(), 1);

    sink.release.notify_one();
    assert_eq!(flush.await.unwrap(), 2);

    let batches = sink.history_batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(inputs(&batches[0]), vec!["A", "B"]);

    assert_eq!(sync.flush().await, 1);
    let batches = sink.history_batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(inputs(&batches[1]), vec!["C"]);
}

// ===========================================================================
// Scenario 4: a pending snapshot syncs even without history records
// ===========================================================================

#[tokio::test]
async fn context_only_flush_saves_the_snapshot() {
    let buffer = Arc::new(InteractionBuffer::new());
    let sink = RecordingSink::new();
    let sync = sync_engine(&buffer, &sink);

    buffer.set_context(ContextSnapshot::from_cycle("ping", "pong"));
    assert_eq!(sync.flush().await, 0);

    assert!(sink.history_batches().is_empty());
    let saves = sink.context_saves();
    assert_eq!(saves.len(), 1);
    assert_eq!(saves[0].last_response, "pong");
    assert!(buffer.is_empty());
}

// ---------------------------------------------------------------------------
// Fake backend plumbing
// ---------------------------------------------------------------------------

async fn spawn_backend(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn dead_address() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("{}", addr)
}

// ===========================================================================
// Scenario 5: quota exhaustion puts the agent to sleep
// ===========================================================================

#[tokio::test]
async fn http_429_yields_sleeping_exhausted() {
    let app = Router::new().route(
        "/cycle",
        post(|| async { (StatusCode::TOO_MANY_REQUESTS, "rate limited") }),
    );
    let base = spawn_backend(app).await;
    let client = BrainClient::new(false, Some(&base), None, None);

    let result = client
        .process_cycle("hello", LuminousState::Idle, None, "now")
        .await;
    assert_eq!(result.state, LuminousState::Sleeping);
    assert_eq!(result.emotional_state, "Exhausted");
    assert!(result.is_warning());
}

#[tokio::test]
async fn quota_text_in_error_body_also_counts() {
    let app = Router::new().route(
        "/cycle",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "User quota exceeded for this model",
            )
        }),
    );
    let base = spawn_backend(app).await;
    let client = BrainClient::new(false, Some(&base), None, None);

    let result = client
        .process_cycle("hello", LuminousState::Idle, None, "now")
        .await;
    assert_eq!(result.state, LuminousState::Sleeping);
    assert_eq!(result.emotional_state, "Exhausted");
}

// ===========================================================================
// Scenario 6: a dead backend reads as a severed link
// ===========================================================================

#[tokio::test]
async fn network_failure_yields_idle_with_warning_marker() {
    let addr = dead_address().await;
    let client = BrainClient::new(false, Some(&format!("http://{}", addr)), None, None);

    let result = client
        .process_cycle("hello", LuminousState::Thinking, None, "now")
        .await;
    assert_eq!(result.state, LuminousState::Idle);
    assert_eq!(result.emotional_state, "Disconnected");
    assert!(result.response.starts_with(WARNING_MARKER));
    assert!(result.gem_updates.is_empty());
}

// ===========================================================================
// Scenario 7: secure origin + direct target = security block diagnostic
// ===========================================================================

#[tokio::test]
async fn secure_direct_dial_failure_reports_security_block() {
    let addr = dead_address().await;
    let client = BrainClient::new(true, Some(&format!("https://{}", addr)), None, None);

    let result = client
        .process_cycle("hello", LuminousState::Idle, None, "now")
        .await;
    assert_eq!(result.state, LuminousState::Idle);
    assert!(result.response.contains("Security Block"));
}

// ===========================================================================
// Scenario 8: healthy backend round-trips
// ===========================================================================

#[derive(Clone, Default)]
struct CapturedRequests {
    cycle: Arc<Mutex<Vec<serde_json::Value>>>,
    history: Arc<Mutex<Vec<serde_json::Value>>>,
    short: Arc<Mutex<Vec<serde_json::Value>>>,
}

fn healthy_backend(captured: CapturedRequests) -> Router {
    Router::new()
        .route(
            "/cycle",
            post(
                |State(captured): State<CapturedRequests>, Json(body): Json<serde_json::Value>| async move {
                    captured.cycle.lock().unwrap().push(body);
                    Json(serde_json::json!({
                        "state": "THINKING",
                        "emotional_state": "Curious",
                        "thought_process": "Reviewing directives.",
                        "response": "All systems nominal.",
                        "gem_updates": [
                            {"id": "LearnerGEM", "load": 55, "hint": "ignored-extra"},
                            {"id": "BrandNewGEM", "load": 10}
                        ],
                        "untracked_field": true
                    }))
                },
            ),
        )
        .route(
            "/memory/history",
            post(
                |State(captured): State<CapturedRequests>, Json(body): Json<serde_json::Value>| async move {
                    captured.history.lock().unwrap().push(body);
                    StatusCode::OK
                },
            ),
        )
        .route(
            "/memory/short",
            post(
                |State(captured): State<CapturedRequests>, Json(body): Json<serde_json::Value>| async move {
                    captured.short.lock().unwrap().push(body);
                    StatusCode::OK
                },
            )
            .get(|| async {
                Json(serde_json::json!({"result": {"lastInput": "x...", "lastResponse": "y"}}))
            }),
        )
        .route(
            "/memory/long/search",
            post(|| async {
                Json(serde_json::json!({
                    "results": [{"key": "origin", "value": "first boot", "type": "long-term"}]
                }))
            }),
        )
        .with_state(captured)
}

#[tokio::test]
async fn healthy_cycle_parses_and_sends_expected_fields() {
    let captured = CapturedRequests::default();
    let base = spawn_backend(healthy_backend(captured.clone())).await;
    let client = BrainClient::new(false, Some(&base), None, Some("key-123".into()));

    let memory = serde_json::json!({"lastInput": "prev"});
    let result = client
        .try_cycle("status report", LuminousState::Idle, Some(&memory), "Friday")
        .await
        .unwrap();

    assert_eq!(result.state, LuminousState::Thinking);
    assert_eq!(result.response, "All systems nominal.");
    assert_eq!(result.gem_updates.len(), 2);
    assert_eq!(
        result.gem_updates[0].id,
        luminous_core::GemType::Learner
    );
    assert_eq!(result.gem_updates[0].load, Some(55));
    assert_eq!(
        result.gem_updates[1].id,
        luminous_core::GemType::Unknown
    );

    let sent = captured.cycle.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["input_text"], "status report");
    assert_eq!(sent[0]["current_state"], "IDLE");
    assert_eq!(sent[0]["time_context"], "Friday");
    // memory_context travels as a JSON-encoded string
    assert_eq!(sent[0]["memory_context"], "{\"lastInput\":\"prev\"}");
}

#[tokio::test]
async fn memory_endpoints_round_trip() {
    let captured = CapturedRequests::default();
    let base = spawn_backend(healthy_backend(captured.clone())).await;
    let client = BrainClient::new(false, Some(&base), None, None);

    client.append_history(&[rec("A"), rec("B")]).await.unwrap();
    client
        .save_short_term("luminous_context", serde_json::json!({"lastInput": "A..."}))
        .await
        .unwrap();

    let stm = client.get_short_term("luminous_context").await.unwrap();
    assert_eq!(stm.unwrap()["lastResponse"], "y");

    let results = client.search_long_term("origin").await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].key, "origin");
    assert_eq!(results[0].kind, MemoryKind::LongTerm);

    let history = captured.history.lock().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["items"].as_array().unwrap().len(), 2);
    let short = captured.short.lock().unwrap();
    assert_eq!(short[0]["key"], "luminous_context");
}

#[tokio::test]
async fn sync_engine_flushes_through_the_real_client() {
    let captured = CapturedRequests::default();
    let base = spawn_backend(healthy_backend(captured.clone())).await;
    let client = Arc::new(BrainClient::new(false, Some(&base), None, None));

    let buffer = Arc::new(InteractionBuffer::new());
    let sync = SyncEngine::new(
        Arc::clone(&buffer),
        client as Arc<dyn MemorySink>,
        Console::new(),
    );

    buffer.record(rec("A"));
    buffer.set_context(ContextSnapshot::from_cycle("A", "ok"));
    assert_eq!(sync.flush().await, 1);

    let history = captured.history.lock().unwrap();
    assert_eq!(history.len(), 1);
    let short = captured.short.lock().unwrap();
    assert_eq!(short.len(), 1);
    assert_eq!(short[0]["key"], "luminous_context");
    assert_eq!(short[0]["value"]["lastResponse"], "ok");
}
