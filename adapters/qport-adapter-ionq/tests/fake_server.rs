//! End-to-end tests against a local stand-in for the IonQ jobs API.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{Value, json};

use qport_adapter_ionq::{Backend, IonQBackend, IonQClient};
use qport_hal::{HalError, ResultHandle, StatusEnum};
use qport_ir::{Circuit, QubitId};

#[derive(Default)]
struct Scripted {
    submit: Value,
    /// Served in order; the last one repeats.
    polls: Vec<Value>,
    cancel: Value,
    cancelled: bool,
    auth: Vec<String>,
    submitted: Vec<Value>,
}

type Shared = Arc<Mutex<Scripted>>;

fn record_auth(state: &mut Scripted, headers: &HeaderMap) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    state.auth.push(auth.to_string());
}

async fn submit(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    let mut state = state.lock().unwrap();
    record_auth(&mut state, &headers);
    state.submitted.push(body);
    Json(state.submit.clone())
}

async fn poll(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Json<Value> {
    let mut state = state.lock().unwrap();
    record_auth(&mut state, &headers);
    if state.cancelled {
        return Json(json!({"id": id, "status": "canceled"}));
    }
    let next = if state.polls.len() > 1 {
        state.polls.remove(0)
    } else {
        state.polls.first().cloned().unwrap_or(Value::Null)
    };
    Json(next)
}

async fn cancel(State(state): State<Shared>, headers: HeaderMap, Path(_id): Path<String>) -> Json<Value> {
    let mut state = state.lock().unwrap();
    record_auth(&mut state, &headers);
    if state.cancel.get("error").is_none() {
        state.cancelled = true;
    }
    Json(state.cancel.clone())
}

async fn serve(script: Scripted) -> (SocketAddr, Shared) {
    let state: Shared = Arc::new(Mutex::new(script));
    let app = Router::new()
        .route("/v0.1/jobs/", post(submit))
        .route("/v0.1/jobs/{id}", get(poll))
        .route("/v0.1/jobs/{id}/status/cancel", put(cancel))
        .with_state(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

fn backend(addr: SocketAddr) -> IonQBackend {
    let client = IonQClient::with_base_url(format!("http://{addr}/v0.1/jobs/"), "test-key").unwrap();
    IonQBackend::with_client(client, "simulator", "job")
}

fn bell() -> Circuit {
    let mut circuit = Circuit::with_size("bell", 2, 2);
    circuit.h(QubitId(0)).unwrap();
    circuit.cx(QubitId(0), QubitId(1)).unwrap();
    circuit.measure_all().unwrap();
    circuit
}

fn completed_bell() -> Value {
    json!({
        "id": "job-1",
        "status": "completed",
        "qubits": "2",
        "data": {"histogram": {"0": 0.5, "3": 0.5}}
    })
}

const FAST: Duration = Duration::from_millis(10);

#[tokio::test]
async fn test_submit_and_collect_counts() {
    let (addr, state) = serve(Scripted {
        submit: json!({"id": "job-1", "status": "ready"}),
        polls: vec![json!({"id": "job-1", "status": "running"}), completed_bell()],
        ..Scripted::default()
    })
    .await;
    let backend = backend(addr);

    let compiled = backend.get_compiled_circuit(&bell(), 0).unwrap();
    let handle = backend.process_circuit(&compiled, 100, true, false).await.unwrap();
    assert_eq!(handle.str_at(0), Some("job-1"));
    assert_eq!(handle.int_at(1), Some(100));

    let result = backend
        .get_result(&handle, Some(Duration::from_secs(5)), FAST)
        .await
        .unwrap();
    let counts = result.get_counts();
    assert_eq!(counts.get(&"00".parse().unwrap()), 50);
    assert_eq!(counts.get(&"11".parse().unwrap()), 50);

    let state = state.lock().unwrap();
    assert!(state.auth.iter().all(|a| a == "apiKey test-key"));
    let body = &state.submitted[0];
    assert_eq!(body["lang"], "json");
    assert_eq!(body["target"], "simulator");
    assert_eq!(body["name"], "bell");
    assert_eq!(body["shots"], 100);
    assert_eq!(body["body"]["qubits"], 2);
    assert_eq!(body["body"]["circuit"][1]["gate"], "cnot");
}

#[tokio::test]
async fn test_unnamed_circuits_use_label() {
    let (addr, state) = serve(Scripted {
        submit: json!({"id": "job-1"}),
        ..Scripted::default()
    })
    .await;
    let backend = backend(addr);

    let mut circuit = bell();
    circuit.set_name("");
    backend
        .process_circuits(&[circuit.clone(), circuit], &[10, 20], true, false)
        .await
        .unwrap();

    let state = state.lock().unwrap();
    assert_eq!(state.submitted[0]["name"], "job_0");
    assert_eq!(state.submitted[1]["name"], "job_1");
    assert_eq!(state.submitted[1]["shots"], 20);
}

#[tokio::test]
async fn test_submit_error_field() {
    let (addr, _) = serve(Scripted {
        submit: json!({"error": "quota exceeded"}),
        ..Scripted::default()
    })
    .await;
    let err = backend(addr)
        .process_circuit(&bell(), 10, true, false)
        .await
        .unwrap_err();
    assert!(matches!(err, HalError::SubmissionFailed(ref m) if m == "quota exceeded"));
}

#[tokio::test]
async fn test_submit_failed_without_error() {
    let (addr, _) = serve(Scripted {
        submit: json!({"status": "failed"}),
        ..Scripted::default()
    })
    .await;
    let err = backend(addr)
        .process_circuit(&bell(), 10, true, false)
        .await
        .unwrap_err();
    assert!(
        matches!(err, HalError::SubmissionFailed(ref m) if m == "Unknown error while submitting job.")
    );
}

#[tokio::test]
async fn test_connection_refused() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = backend(addr)
        .process_circuit(&bell(), 10, true, false)
        .await
        .unwrap_err();
    assert!(
        matches!(err, HalError::SubmissionFailed(ref m) if m == "job Connection Error: Error during submit...")
    );
}

#[tokio::test]
async fn test_invalid_circuit_never_reaches_the_server() {
    let (addr, state) = serve(Scripted::default()).await;
    let mut circuit = Circuit::with_size("toffoli", 3, 0);
    circuit.ccx(QubitId(0), QubitId(1), QubitId(2)).unwrap();

    let err = backend(addr)
        .process_circuit(&circuit, 10, true, false)
        .await
        .unwrap_err();
    assert!(matches!(err, HalError::CircuitNotValid { index: 0, .. }));
    assert!(state.lock().unwrap().submitted.is_empty());
}

#[tokio::test]
async fn test_cancel() {
    let (addr, _) = serve(Scripted {
        submit: json!({"id": "job-1", "status": "ready"}),
        polls: vec![json!({"id": "job-1", "status": "running"})],
        cancel: json!({"id": "job-1", "status": "canceled"}),
        ..Scripted::default()
    })
    .await;
    let backend = backend(addr);
    let handle = backend.process_circuit(&bell(), 10, true, false).await.unwrap();

    assert_eq!(
        backend.circuit_status(&handle).await.unwrap().status,
        StatusEnum::Running
    );
    backend.cancel(&handle).await.unwrap();

    let err = backend.get_result(&handle, None, FAST).await.unwrap_err();
    assert!(matches!(err, HalError::JobFailed(ref m) if m == "Job cancelled"));
}

#[tokio::test]
async fn test_cancel_error() {
    let (addr, _) = serve(Scripted {
        submit: json!({"id": "job-1"}),
        cancel: json!({"error": "job already finished"}),
        ..Scripted::default()
    })
    .await;
    let backend = backend(addr);
    let handle = backend.process_circuit(&bell(), 10, true, false).await.unwrap();

    let err = backend.cancel(&handle).await.unwrap_err();
    assert!(matches!(err, HalError::Backend(ref m) if m == "job already finished"));
}

#[tokio::test]
async fn test_failed_and_unknown_status() {
    let (addr, _) = serve(Scripted {
        submit: json!({"id": "job-1"}),
        polls: vec![json!({"id": "job-1", "status": "failed", "error": "calibration"})],
        ..Scripted::default()
    })
    .await;
    let backend = backend(addr);
    let handle = backend.process_circuit(&bell(), 10, true, false).await.unwrap();
    let err = backend.get_result(&handle, None, FAST).await.unwrap_err();
    assert!(matches!(err, HalError::JobFailed(ref m) if m == "calibration"));

    let (addr, _) = serve(Scripted {
        submit: json!({"id": "job-2"}),
        polls: vec![json!({"id": "job-2", "status": "melted"})],
        ..Scripted::default()
    })
    .await;
    let backend = self::backend(addr);
    let handle = backend.process_circuit(&bell(), 10, true, false).await.unwrap();
    let status = backend.circuit_status(&handle).await.unwrap();
    assert_eq!(status.status, StatusEnum::Error);
    assert_eq!(status.message, "melted");
}

#[tokio::test]
async fn test_handle_survives_a_new_backend() {
    let (addr, _) = serve(Scripted {
        submit: json!({"id": "job-1"}),
        polls: vec![completed_bell()],
        ..Scripted::default()
    })
    .await;
    let text = backend(addr)
        .process_circuit(&bell(), 100, true, false)
        .await
        .unwrap()
        .to_string();

    let handle: ResultHandle = text.parse().unwrap();
    let result = backend(addr)
        .get_result(&handle, Some(Duration::from_secs(5)), FAST)
        .await
        .unwrap();
    assert_eq!(result.n_shots(), 100);
}

#[tokio::test]
async fn test_timeout() {
    let (addr, _) = serve(Scripted {
        submit: json!({"id": "job-1"}),
        polls: vec![json!({"id": "job-1", "status": "running"})],
        ..Scripted::default()
    })
    .await;
    let backend = backend(addr);
    let handle = backend.process_circuit(&bell(), 10, true, false).await.unwrap();

    let err = backend
        .get_result(&handle, Some(Duration::from_millis(50)), FAST)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Timed out: no results after 0.05 seconds.");
}

#[tokio::test]
async fn test_machine_debug_sends_nothing() {
    let (addr, state) = serve(Scripted::default()).await;
    let backend = backend(addr).with_machine_debug(true);

    let result = backend.run_circuit(&bell(), 7, true, false).await.unwrap();
    assert_eq!(result.get_counts().get(&"00".parse().unwrap()), 7);

    let state = state.lock().unwrap();
    assert!(state.submitted.is_empty());
    assert!(state.auth.is_empty());
}
