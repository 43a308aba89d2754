use anniversary_storage::Database;
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;

use crate::reconcile::Reconciler;
use crate::{api, telemetry};

#[derive(Clone)]
pub struct AppState {
    metrics: PrometheusHandle,
    storage: Database,
    reconciler: Reconciler<Database>,
}

impl AppState {
    pub fn new(metrics: PrometheusHandle, storage: Database, reconciler: Reconciler<Database>) -> Self {
        Self {
            metrics,
            storage,
            reconciler,
        }
    }

    pub fn metrics(&self) -> &PrometheusHandle {
        &self.metrics
    }

    pub fn storage(&self) -> &Database {
        &self.storage
    }

    pub fn reconciler(&self) -> &Reconciler<Database> {
        &self.reconciler
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .route(
            "/employees",
            get(api::list_employees).post(api::create_employee),
        )
        .route(
            "/employees/:employee_id/certificates",
            get(api::list_employee_certificates),
        )
        .route("/certificates", get(api::list_certificates))
        .route("/certificates/reconcile", post(api::reconcile))
        .route("/dashboard", get(api::dashboard))
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = telemetry::render_metrics(state.metrics());
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
        .body(Body::from(body))
        .unwrap()
}
