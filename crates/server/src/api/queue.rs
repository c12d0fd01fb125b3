//! Queue API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use callboard_core::{
    DispatchPhase, DispatchStatus, PriorityClass, QueueEntry, QueueError, QueueSnapshot, Ticket,
    TicketCode,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::handlers::{ApiError, ErrorResponse};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for enrolling a pre-built ticket
#[derive(Debug, Deserialize)]
pub struct EnrollBody {
    /// Ticket code, e.g. `P001`
    pub id: String,
    pub subject: String,
    /// Must agree with the code prefix when given
    pub priority_class: Option<PriorityClass>,
    pub counter_label: Option<String>,
}

/// Queue contents plus scheduler state
#[derive(Debug, Serialize)]
pub struct QueueResponse {
    pub active: bool,
    pub phase: DispatchPhase,
    #[serde(flatten)]
    pub snapshot: QueueSnapshot,
}

/// Response for a manual selection
#[derive(Debug, Serialize)]
pub struct SelectResponse {
    /// False when the code was not waiting
    pub selected: bool,
    #[serde(flatten)]
    pub queue: QueueResponse,
}

/// Service history
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub entries: Vec<QueueEntry>,
    pub total: usize,
}

async fn queue_response(state: &AppState) -> QueueResponse {
    let (status, snapshot) = state.dispatcher().view().await;
    QueueResponse {
        active: status.active,
        phase: status.phase,
        snapshot,
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Get the current queue
pub async fn get_queue(State(state): State<Arc<AppState>>) -> Json<QueueResponse> {
    Json(queue_response(&state).await)
}

/// Get served tickets, oldest first
pub async fn get_history(State(state): State<Arc<AppState>>) -> Json<HistoryResponse> {
    let entries = state.dispatcher().snapshot().await.archive;
    let total = entries.len();
    Json(HistoryResponse { entries, total })
}

/// Enroll a ticket issued elsewhere
pub async fn enroll_ticket(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EnrollBody>,
) -> Result<(StatusCode, Json<Ticket>), ApiError> {
    let code: TicketCode = body
        .id
        .parse()
        .map_err(|e| ErrorResponse::with_status(StatusCode::BAD_REQUEST, e))?;

    if let Some(class) = body.priority_class {
        if class != code.class() {
            return Err(ErrorResponse::with_status(
                StatusCode::BAD_REQUEST,
                format!(
                    "priority_class {} does not match ticket code {}",
                    class.as_str(),
                    code
                ),
            ));
        }
    }

    let mut ticket = Ticket::new(code, body.subject);
    if let Some(label) = body.counter_label {
        ticket = ticket.with_counter_label(label);
    }

    match state.dispatcher().enroll(ticket.clone()).await {
        Ok(()) => Ok((StatusCode::CREATED, Json(ticket))),
        Err(e @ QueueError::DuplicateEnrollment(_)) => {
            Err(ErrorResponse::with_status(StatusCode::CONFLICT, e))
        }
    }
}

/// Make a waiting ticket current
pub async fn select_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SelectResponse>, ApiError> {
    let code: TicketCode = id
        .parse()
        .map_err(|e| ErrorResponse::with_status(StatusCode::BAD_REQUEST, e))?;

    let selected = state.dispatcher().select_current(&code).await;
    Ok(Json(SelectResponse {
        selected,
        queue: queue_response(&state).await,
    }))
}

/// Archive the current ticket and call the next one
pub async fn call_next(State(state): State<Arc<AppState>>) -> Json<QueueResponse> {
    state.dispatcher().call_next().await;
    Json(queue_response(&state).await)
}

/// Start automatic dispatching
pub async fn start_dispatch(State(state): State<Arc<AppState>>) -> Json<DispatchStatus> {
    state.dispatcher().start().await;
    Json(state.dispatcher().status().await)
}

/// Stop automatic dispatching
pub async fn stop_dispatch(State(state): State<Arc<AppState>>) -> Json<DispatchStatus> {
    state.dispatcher().stop().await;
    Json(state.dispatcher().status().await)
}
