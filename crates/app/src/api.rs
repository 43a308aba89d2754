use anniversary_core::{Certificate, Employee, EmployeeSubmission, NewEmployee};
use anniversary_storage::RecordStore;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use metrics::counter;
use serde::Serialize;
use tracing::{info, warn};

use crate::dashboard::{build_dashboard, CertificateCard, EmployeeOverview};
use crate::problem::ProblemResponse;
use crate::router::AppState;

#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    pub issued: usize,
}

pub async fn create_employee(
    State(state): State<AppState>,
    payload: Result<Json<EmployeeSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<Employee>), ProblemResponse> {
    let Json(submission) = payload.map_err(|rejection| {
        ProblemResponse::new(
            StatusCode::BAD_REQUEST,
            "invalid_json",
            rejection.body_text(),
        )
    })?;

    let employee = NewEmployee::try_from(submission).map_err(|err| {
        warn!(stage = "api", error = %err, "employee submission rejected");
        ProblemResponse::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid_employee",
            err.to_string(),
        )
    })?;

    let stored = state.storage().insert_employee(&employee).await?;
    counter!("employees_created_total").increment(1);
    info!(stage = "api", employee_id = %stored.id, "employee created");

    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn list_employees(
    State(state): State<AppState>,
) -> Result<Json<Vec<Employee>>, ProblemResponse> {
    let employees = state.storage().list_employees().await?;
    Ok(Json(employees))
}

pub async fn list_employee_certificates(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
) -> Result<Json<Vec<Certificate>>, ProblemResponse> {
    let certificates = state.storage().list_certificates_for(&employee_id).await?;
    Ok(Json(certificates))
}

pub async fn list_certificates(
    State(state): State<AppState>,
) -> Result<Json<Vec<CertificateCard>>, ProblemResponse> {
    let certificates = state.storage().list_certificates().await?;
    Ok(Json(
        certificates.into_iter().map(CertificateCard::from).collect(),
    ))
}

pub async fn reconcile(
    State(state): State<AppState>,
) -> Result<Json<ReconcileResponse>, ProblemResponse> {
    let issued = state.reconciler().reconcile().await?;
    Ok(Json(ReconcileResponse { issued }))
}

pub async fn dashboard(
    State(state): State<AppState>,
) -> Result<Json<Vec<EmployeeOverview>>, ProblemResponse> {
    let today = state.reconciler().today();
    let overview = build_dashboard(state.storage(), today).await?;
    Ok(Json(overview))
}
