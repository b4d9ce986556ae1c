use std::{sync::Arc, time::Duration};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use shared::{
    domain::FormField,
    error::ValidationError,
    protocol::{PredictRequest, PredictionResult},
};
use tokio::{
    net::TcpListener,
    sync::{Mutex, Notify},
    task::JoinHandle,
};

use crate::{
    AdvisorClient, BackendError, ClientError, ClientEvent, HttpPredictionBackend,
    MissingPredictionBackend, PredictionBackend, UiStatus,
};

fn sample_result() -> PredictionResult {
    PredictionResult {
        temperature_c: 28.5,
        humidity_percent: 64.2,
        moisture_estimate: 40.0,
        predicted_crop_type: "rice".to_string(),
        predicted_fertilizer_name: "urea".to_string(),
    }
}

#[derive(Clone)]
enum PredictReply {
    Success(PredictionResult),
    Failure { status: u16, detail: Option<String> },
}

#[derive(Clone)]
struct BackendStub {
    soil_types_reply: Arc<Mutex<Result<Vec<String>, u16>>>,
    soil_types_calls: Arc<Mutex<u32>>,
    predict_calls: Arc<Mutex<u32>>,
    received: Arc<Mutex<Vec<PredictRequest>>>,
    predict_reply: Arc<Mutex<PredictReply>>,
    gate: Option<Arc<Notify>>,
}

impl BackendStub {
    fn with_soil_types(soil_types: &[&str]) -> Self {
        Self {
            soil_types_reply: Arc::new(Mutex::new(Ok(soil_types
                .iter()
                .map(|label| label.to_string())
                .collect()))),
            soil_types_calls: Arc::new(Mutex::new(0)),
            predict_calls: Arc::new(Mutex::new(0)),
            received: Arc::new(Mutex::new(Vec::new())),
            predict_reply: Arc::new(Mutex::new(PredictReply::Success(sample_result()))),
            gate: None,
        }
    }

    fn failing_soil_types(status: u16) -> Self {
        let stub = Self::with_soil_types(&[]);
        Self {
            soil_types_reply: Arc::new(Mutex::new(Err(status))),
            ..stub
        }
    }

    async fn set_predict_failure(&self, status: u16, detail: Option<&str>) {
        *self.predict_reply.lock().await = PredictReply::Failure {
            status,
            detail: detail.map(str::to_string),
        };
    }

    fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(gate.clone());
        (self, gate)
    }
}

async fn handle_soil_types(State(stub): State<BackendStub>) -> Response {
    *stub.soil_types_calls.lock().await += 1;
    match &*stub.soil_types_reply.lock().await {
        Ok(soil_types) => Json(soil_types.clone()).into_response(),
        Err(status) => StatusCode::from_u16(*status)
            .expect("stub status")
            .into_response(),
    }
}

async fn handle_predict(
    State(stub): State<BackendStub>,
    Json(request): Json<PredictRequest>,
) -> Response {
    *stub.predict_calls.lock().await += 1;
    stub.received.lock().await.push(request);
    if let Some(gate) = &stub.gate {
        gate.notified().await;
    }
    match stub.predict_reply.lock().await.clone() {
        PredictReply::Success(result) => Json(result).into_response(),
        PredictReply::Failure { status, detail } => {
            let body = match detail {
                Some(detail) => json!({ "detail": detail }),
                None => json!({}),
            };
            (
                StatusCode::from_u16(status).expect("stub status"),
                Json(body),
            )
                .into_response()
        }
    }
}

async fn spawn_backend(stub: BackendStub) -> (String, JoinHandle<()>) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let app = Router::new()
        .route("/soil-types", get(handle_soil_types))
        .route("/predict", post(handle_predict))
        .with_state(stub);
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), handle)
}

async fn fill_valid_form(client: &AdvisorClient) {
    client.set_field(FormField::Nitrogen, "37").await;
    client.set_field(FormField::Potassium, "0").await;
    client.set_field(FormField::Phosphorous, "0").await;
    client.set_field(FormField::Location, "Bengaluru").await;
}

async fn wait_for_predict_call(stub: &BackendStub) {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if *stub.predict_calls.lock().await >= 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("predict call timeout");
}

#[tokio::test]
async fn catalog_load_seeds_default_soil_type_and_enables_submit() {
    let stub = BackendStub::with_soil_types(&["red", "black", "clay"]);
    let (url, _server) = spawn_backend(stub).await;
    let client = AdvisorClient::new(Arc::new(HttpPredictionBackend::new(url)));
    let mut events = client.subscribe_events();

    client.load_soil_types().await.expect("load catalog");

    assert_eq!(client.form().await.soil_type, "red");
    assert!(client.can_submit().await);
    match events.recv().await.expect("event") {
        ClientEvent::CatalogLoaded { soil_types } => {
            assert_eq!(soil_types, ["red", "black", "clay"]);
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn empty_catalog_keeps_submission_disabled() {
    let stub = BackendStub::with_soil_types(&[]);
    let (url, _server) = spawn_backend(stub.clone()).await;
    let client = AdvisorClient::new(Arc::new(HttpPredictionBackend::new(url)));

    client.load_soil_types().await.expect("load catalog");

    assert!(client.form().await.soil_type.is_empty());
    assert!(!client.can_submit().await);

    fill_valid_form(&client).await;
    let err = client.submit().await.expect_err("must be disabled");
    assert!(matches!(err, ClientError::CatalogUnavailable));
    assert_eq!(*stub.predict_calls.lock().await, 0);
}

#[tokio::test]
async fn catalog_loader_runs_once_per_session() {
    let stub = BackendStub::with_soil_types(&["red"]);
    let (url, _server) = spawn_backend(stub.clone()).await;
    let client = AdvisorClient::new(Arc::new(HttpPredictionBackend::new(url)));

    client.load_soil_types().await.expect("first load");
    client.load_soil_types().await.expect("second load is a no-op");

    assert_eq!(*stub.soil_types_calls.lock().await, 1);
    assert_eq!(client.form().await.soil_type, "red");
}

#[tokio::test]
async fn catalog_failure_surfaces_error_and_blocks_submission() {
    let stub = BackendStub::failing_soil_types(500);
    let (url, _server) = spawn_backend(stub.clone()).await;
    let client = AdvisorClient::new(Arc::new(HttpPredictionBackend::new(url)));

    let err = client.load_soil_types().await.expect_err("must fail");
    assert!(matches!(
        err,
        ClientError::Backend(BackendError::Http { status: 500, .. })
    ));

    let status = client.status().await;
    let message = status.error_message().expect("error status");
    assert!(message.starts_with("Failed to load soil types:"));
    assert!(message.contains("HTTP error! status: 500"));
    assert!(message.ends_with("Please ensure backend is running."));

    assert!(!client.can_submit().await);
    fill_valid_form(&client).await;
    let err = client.submit().await.expect_err("submission stays disabled");
    assert!(matches!(err, ClientError::CatalogUnavailable));
    assert_eq!(*stub.predict_calls.lock().await, 0);
}

#[tokio::test]
async fn successful_submission_round_trips_the_exact_result() {
    let stub = BackendStub::with_soil_types(&["red", "black", "clay"]);
    let (url, _server) = spawn_backend(stub.clone()).await;
    let client = AdvisorClient::new(Arc::new(HttpPredictionBackend::new(url)));
    client.load_soil_types().await.expect("load catalog");
    fill_valid_form(&client).await;

    let mut events = client.subscribe_events();
    let result = client.submit().await.expect("submission");

    assert_eq!(result, sample_result());
    assert_eq!(client.status().await, UiStatus::Success(sample_result()));
    assert!(!client.status().await.is_loading());

    let received = stub.received.lock().await.clone();
    assert_eq!(
        received,
        vec![PredictRequest {
            nitrogen: 37.0,
            potassium: 0.0,
            phosphorous: 0.0,
            soil_type: "red".to_string(),
            location: "Bengaluru".to_string(),
        }]
    );

    match events.recv().await.expect("loading event") {
        ClientEvent::StatusChanged(status) => assert!(status.is_loading()),
        other => panic!("unexpected event: {other:?}"),
    }
    match events.recv().await.expect("success event") {
        ClientEvent::StatusChanged(status) => {
            assert_eq!(status.result(), Some(&sample_result()));
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn server_detail_is_embedded_verbatim_in_the_error_message() {
    let stub = BackendStub::with_soil_types(&["red"]);
    stub.set_predict_failure(422, Some("soil_type invalid")).await;
    let (url, _server) = spawn_backend(stub.clone()).await;
    let client = AdvisorClient::new(Arc::new(HttpPredictionBackend::new(url)));
    client.load_soil_types().await.expect("load catalog");
    fill_valid_form(&client).await;

    let err = client.submit().await.expect_err("must fail");
    assert!(matches!(
        err,
        ClientError::Backend(BackendError::Http { status: 422, .. })
    ));
    assert_eq!(
        client.status().await,
        UiStatus::Error(
            "Prediction failed: soil_type invalid. Ensure backend is running and correct data is provided."
                .to_string()
        )
    );
}

#[tokio::test]
async fn missing_detail_falls_back_to_status_coded_message() {
    let stub = BackendStub::with_soil_types(&["red"]);
    stub.set_predict_failure(500, None).await;
    let (url, _server) = spawn_backend(stub.clone()).await;
    let client = AdvisorClient::new(Arc::new(HttpPredictionBackend::new(url)));
    client.load_soil_types().await.expect("load catalog");
    fill_valid_form(&client).await;

    let err = client.submit().await.expect_err("must fail");
    assert!(matches!(err, ClientError::Backend(_)));
    assert_eq!(
        client.status().await,
        UiStatus::Error(
            "Prediction failed: HTTP error! status: 500. Ensure backend is running and correct data is provided."
                .to_string()
        )
    );
}

#[tokio::test]
async fn transport_failure_resolves_to_error_with_loading_cleared() {
    let stub = BackendStub::with_soil_types(&["red"]);
    let (url, server) = spawn_backend(stub).await;
    let client = AdvisorClient::new(Arc::new(HttpPredictionBackend::new(url)));
    client.load_soil_types().await.expect("load catalog");
    fill_valid_form(&client).await;

    server.abort();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let err = client.submit().await.expect_err("connection refused");
    assert!(matches!(
        err,
        ClientError::Backend(BackendError::Transport(_))
    ));

    let status = client.status().await;
    assert!(!status.is_loading());
    assert!(status
        .error_message()
        .expect("error status")
        .starts_with("Prediction failed:"));
}

#[tokio::test]
async fn validation_failure_short_circuits_without_any_network_call() {
    let stub = BackendStub::with_soil_types(&["red"]);
    let (url, _server) = spawn_backend(stub.clone()).await;
    let client = AdvisorClient::new(Arc::new(HttpPredictionBackend::new(url)));
    client.load_soil_types().await.expect("load catalog");

    // Nutrient fields left unset.
    client.set_field(FormField::Location, "Bengaluru").await;
    let err = client.submit().await.expect_err("missing fields");
    assert!(matches!(
        err,
        ClientError::Validation(ValidationError::MissingField)
    ));
    assert_eq!(
        client.status().await,
        UiStatus::Error("Please fill in all fields, including location.".to_string())
    );

    // A negative nutrient value is rejected as well.
    fill_valid_form(&client).await;
    client.set_field(FormField::Nitrogen, "-3").await;
    let err = client.submit().await.expect_err("negative value");
    assert!(matches!(
        err,
        ClientError::Validation(ValidationError::InvalidNumber)
    ));
    assert_eq!(
        client.status().await,
        UiStatus::Error("Nutrient values must be nonnegative numbers.".to_string())
    );

    assert_eq!(*stub.predict_calls.lock().await, 0);
}

#[tokio::test]
async fn second_submission_is_rejected_while_one_is_loading() {
    let (stub, gate) = BackendStub::with_soil_types(&["red"]).gated();
    let (url, _server) = spawn_backend(stub.clone()).await;
    let client = AdvisorClient::new(Arc::new(HttpPredictionBackend::new(url)));
    client.load_soil_types().await.expect("load catalog");
    fill_valid_form(&client).await;

    let first = tokio::spawn({
        let client = client.clone();
        async move { client.submit().await }
    });
    wait_for_predict_call(&stub).await;
    assert!(client.status().await.is_loading());

    let err = client.submit().await.expect_err("second submission");
    assert!(matches!(err, ClientError::SubmissionInFlight));
    assert_eq!(*stub.predict_calls.lock().await, 1);

    gate.notify_one();
    let result = first.await.expect("join").expect("first submission");
    assert_eq!(result, sample_result());
    assert!(!client.status().await.is_loading());
}

#[tokio::test]
async fn new_submission_replaces_the_previous_outcome() {
    let stub = BackendStub::with_soil_types(&["red"]);
    let (url, _server) = spawn_backend(stub.clone()).await;
    let client = AdvisorClient::new(Arc::new(HttpPredictionBackend::new(url)));
    client.load_soil_types().await.expect("load catalog");
    fill_valid_form(&client).await;

    client.submit().await.expect("first submission");
    assert!(client.status().await.result().is_some());

    stub.set_predict_failure(422, Some("soil_type invalid")).await;
    let _ = client.submit().await.expect_err("second submission fails");

    let status = client.status().await;
    assert!(status.result().is_none());
    assert!(status.error_message().is_some());
}

#[tokio::test]
async fn missing_backend_fails_every_call() {
    let backend = MissingPredictionBackend;
    let err = backend.soil_types().await.expect_err("not configured");
    assert!(matches!(err, BackendError::Transport(_)));
    assert!(err.to_string().contains("not configured"));
}
