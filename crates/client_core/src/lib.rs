use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::{FormField, FormInput, SoilTypeCatalog},
    error::ValidationError,
    protocol::{ErrorBody, PredictRequest, PredictionResult},
};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

pub mod state;

pub use state::{SessionAction, SessionState, SubmissionId, UiStatus};

fn server_error_text(status: &u16, detail: &Option<String>) -> String {
    match detail {
        Some(detail) => detail.clone(),
        None => format!("HTTP error! status: {status}"),
    }
}

/// Failure of a single backend call. The Display text is what gets
/// interpolated into the user-visible message templates.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The request could not be sent or the response body could not be
    /// read or decoded.
    #[error("{0}")]
    Transport(String),
    /// The backend answered with a non-2xx status. The server-supplied
    /// `detail` wins over the generic status-coded message.
    #[error("{}", server_error_text(.status, .detail))]
    Http {
        status: u16,
        detail: Option<String>,
    },
}

impl BackendError {
    fn transport(err: reqwest::Error) -> Self {
        BackendError::Transport(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("soil-type catalog is not loaded; submission is disabled")]
    CatalogUnavailable,
    #[error("a submission is already in flight")]
    SubmissionInFlight,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// The two remote operations the client depends on. Injectable so tests
/// can substitute deterministic stubs for the network.
#[async_trait]
pub trait PredictionBackend: Send + Sync {
    async fn soil_types(&self) -> Result<Vec<String>, BackendError>;
    async fn predict(&self, request: &PredictRequest) -> Result<PredictionResult, BackendError>;
}

pub struct MissingPredictionBackend;

#[async_trait]
impl PredictionBackend for MissingPredictionBackend {
    async fn soil_types(&self) -> Result<Vec<String>, BackendError> {
        Err(BackendError::Transport(
            "prediction backend is not configured".to_string(),
        ))
    }

    async fn predict(&self, _request: &PredictRequest) -> Result<PredictionResult, BackendError> {
        Err(BackendError::Transport(
            "prediction backend is not configured".to_string(),
        ))
    }
}

/// reqwest implementation against the configured base URL.
pub struct HttpPredictionBackend {
    http: Client,
    base_url: String,
}

impl HttpPredictionBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: normalize_base_url(base_url.into()),
        }
    }

    /// Same as [`new`](Self::new) but with an explicit per-request
    /// deadline. Without it the transport defaults apply and an
    /// unresponsive backend holds the submission in Loading indefinitely.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(BackendError::transport)?;
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url.into()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn error_from(response: reqwest::Response) -> BackendError {
        let status = response.status().as_u16();
        let detail = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.detail);
        BackendError::Http { status, detail }
    }
}

fn normalize_base_url(base_url: String) -> String {
    base_url.trim_end_matches('/').to_string()
}

#[async_trait]
impl PredictionBackend for HttpPredictionBackend {
    async fn soil_types(&self) -> Result<Vec<String>, BackendError> {
        let response = self
            .http
            .get(self.url("soil-types"))
            .send()
            .await
            .map_err(BackendError::transport)?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        response.json().await.map_err(BackendError::transport)
    }

    async fn predict(&self, request: &PredictRequest) -> Result<PredictionResult, BackendError> {
        let response = self
            .http
            .post(self.url("predict"))
            .json(request)
            .send()
            .await
            .map_err(BackendError::transport)?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        response.json().await.map_err(BackendError::transport)
    }
}

#[derive(Debug, Clone)]
pub enum ClientEvent {
    CatalogLoaded { soil_types: Vec<String> },
    StatusChanged(UiStatus),
}

/// Async client owning the session state and driving the two flows: the
/// one-shot catalog load and the submission lifecycle.
pub struct AdvisorClient {
    backend: Arc<dyn PredictionBackend>,
    session: Mutex<SessionState>,
    catalog_requested: AtomicBool,
    events: broadcast::Sender<ClientEvent>,
}

impl AdvisorClient {
    pub fn new(backend: Arc<dyn PredictionBackend>) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            backend,
            session: Mutex::new(SessionState::default()),
            catalog_requested: AtomicBool::new(false),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub async fn form(&self) -> FormInput {
        self.session.lock().await.form().clone()
    }

    pub async fn catalog(&self) -> SoilTypeCatalog {
        self.session.lock().await.catalog().clone()
    }

    pub async fn status(&self) -> UiStatus {
        self.session.lock().await.status().clone()
    }

    pub async fn can_submit(&self) -> bool {
        self.session.lock().await.can_submit()
    }

    pub async fn set_field(&self, field: FormField, value: impl Into<String> + Send) {
        let mut session = self.session.lock().await;
        self.apply(&mut session, SessionAction::SetField {
            field,
            value: value.into(),
        });
    }

    /// Replaces the whole form snapshot (one `SetField` per field), used by
    /// UIs that keep their own draft while editing.
    pub async fn replace_form(&self, input: FormInput) {
        let mut session = self.session.lock().await;
        for (field, value) in [
            (FormField::Nitrogen, input.nitrogen),
            (FormField::Potassium, input.potassium),
            (FormField::Phosphorous, input.phosphorous),
            (FormField::SoilType, input.soil_type),
            (FormField::Location, input.location),
        ] {
            self.apply(&mut session, SessionAction::SetField { field, value });
        }
    }

    /// Fetches the soil-type catalog and seeds the default selection.
    /// Runs at most once per session; later calls are no-ops. A failure
    /// leaves the catalog empty (submission stays disabled) and surfaces
    /// the error through [`UiStatus::Error`].
    pub async fn load_soil_types(&self) -> Result<(), ClientError> {
        if self.catalog_requested.swap(true, Ordering::SeqCst) {
            debug!("soil-type catalog already requested this session");
            return Ok(());
        }

        info!("loading soil-type catalog");
        match self.backend.soil_types().await {
            Ok(soil_types) => {
                info!(count = soil_types.len(), "soil-type catalog loaded");
                let mut session = self.session.lock().await;
                self.apply(&mut session, SessionAction::CatalogLoaded {
                    soil_types: soil_types.clone(),
                });
                drop(session);
                let _ = self.events.send(ClientEvent::CatalogLoaded { soil_types });
                Ok(())
            }
            Err(err) => {
                warn!("soil-type catalog load failed: {err}");
                let message =
                    format!("Failed to load soil types: {err}. Please ensure backend is running.");
                let mut session = self.session.lock().await;
                self.apply(&mut session, SessionAction::CatalogFailed { message });
                Err(err.into())
            }
        }
    }

    /// Runs one submission: validate, serialize, POST, reduce the outcome.
    /// Loading is cleared on every exit path; a validation failure aborts
    /// before any network call.
    pub async fn submit(&self) -> Result<PredictionResult, ClientError> {
        let (request, submission) = {
            let mut session = self.session.lock().await;
            if session.status().is_loading() {
                return Err(ClientError::SubmissionInFlight);
            }
            if session.catalog().is_empty() {
                return Err(ClientError::CatalogUnavailable);
            }
            match session.form().validate() {
                Ok(request) => {
                    let submission = session.allocate_submission();
                    self.apply(&mut session, SessionAction::SubmitStarted { submission });
                    (request, submission)
                }
                Err(err) => {
                    self.apply(&mut session, SessionAction::SubmitFailed {
                        submission: None,
                        message: err.to_string(),
                    });
                    return Err(err.into());
                }
            }
        };

        info!(submission, soil_type = %request.soil_type, "submitting prediction request");
        let outcome = self.backend.predict(&request).await;

        let mut session = self.session.lock().await;
        match outcome {
            Ok(result) => {
                info!(submission, crop = %result.predicted_crop_type, "prediction received");
                self.apply(&mut session, SessionAction::SubmitSucceeded {
                    submission,
                    result: result.clone(),
                });
                Ok(result)
            }
            Err(err) => {
                warn!(submission, "prediction request failed: {err}");
                let message = format!(
                    "Prediction failed: {err}. Ensure backend is running and correct data is provided."
                );
                self.apply(&mut session, SessionAction::SubmitFailed {
                    submission: Some(submission),
                    message,
                });
                Err(err.into())
            }
        }
    }

    fn apply(&self, session: &mut SessionState, action: SessionAction) {
        let before = session.status().clone();
        session.apply(action);
        if *session.status() != before {
            let _ = self
                .events
                .send(ClientEvent::StatusChanged(session.status().clone()));
        }
    }
}

#[cfg(test)]
mod tests;
