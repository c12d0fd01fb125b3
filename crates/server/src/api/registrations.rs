//! Patient registration handler.

use axum::{extract::State, http::StatusCode, Json};
use callboard_core::{PatientForm, QueueError, Registration};
use std::sync::Arc;
use tracing::info;

use super::handlers::{ApiError, ErrorResponse};
use crate::state::AppState;

/// Register a patient and put the issued ticket in the queue
pub async fn register_patient(
    State(state): State<Arc<AppState>>,
    Json(form): Json<PatientForm>,
) -> Result<(StatusCode, Json<Registration>), ApiError> {
    let registration = state
        .registrar()
        .register(&form)
        .map_err(|e| ErrorResponse::with_status(StatusCode::UNPROCESSABLE_ENTITY, e))?;

    match state
        .dispatcher()
        .enroll(registration.ticket.clone())
        .await
    {
        Ok(()) => {
            info!(
                ticket_id = %registration.ticket.id,
                class = registration.patient.priority_class.as_str(),
                "Patient registered"
            );
            Ok((StatusCode::CREATED, Json(registration)))
        }
        Err(e @ QueueError::DuplicateEnrollment(_)) => {
            Err(ErrorResponse::with_status(StatusCode::CONFLICT, e))
        }
    }
}
