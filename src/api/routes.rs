// src/api/routes.rs

//! HTTP route handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};

use crate::api::dto::{
    CalculateRequest, CalculateResponse, ExpressionDetailResponse, ExpressionDto,
    ExpressionsResponse, TaskDto, TaskResponse, TaskResultRequest, TaskResultResponse,
};
use crate::dag::TaskGraphStore;
use crate::errors::CalcError;
use crate::types::{ExpressionId, TaskId};

/// Shared state of every handler.
pub type SharedStore = Arc<TaskGraphStore>;

/// Build the router: user API under `/api/v1`, worker API under `/internal`.
pub fn build_router(store: SharedStore) -> Router {
    Router::new()
        .route("/api/v1/calculate", post(calculate))
        .route("/api/v1/expressions", get(list_expressions))
        .route("/api/v1/expressions/{id}", get(get_expression))
        .route("/api/v1/tasks/{id}", get(task_result))
        .route("/internal/task", get(claim_task).post(submit_result))
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

/// Maps store errors onto HTTP statuses.
#[derive(Debug)]
pub struct ApiError(CalcError);

impl From<CalcError> for ApiError {
    fn from(err: CalcError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CalcError::Syntax(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CalcError::ExpressionNotFound(_)
            | CalcError::TaskNotFound(_)
            | CalcError::TaskNotCompleted(_) => StatusCode::NOT_FOUND,
            other => {
                error!(error = %other, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, self.0.to_string()).into_response()
    }
}

async fn calculate(
    State(store): State<SharedStore>,
    Json(req): Json<CalculateRequest>,
) -> Result<(StatusCode, Json<CalculateResponse>), ApiError> {
    match store.create_expression(&req.expression) {
        Ok(id) => Ok((StatusCode::CREATED, Json(CalculateResponse { id }))),
        Err(err) => {
            warn!(expression = %req.expression, error = %err, "rejected expression");
            Err(err.into())
        }
    }
}

async fn list_expressions(State(store): State<SharedStore>) -> Json<ExpressionsResponse> {
    let expressions = store
        .list_expressions()
        .iter()
        .map(ExpressionDto::from)
        .collect();
    Json(ExpressionsResponse { expressions })
}

async fn get_expression(
    State(store): State<SharedStore>,
    Path(id): Path<u64>,
) -> Result<Json<ExpressionDetailResponse>, ApiError> {
    let record = store.get_expression(ExpressionId(id))?;
    Ok(Json(ExpressionDetailResponse {
        expression: ExpressionDto::from(&record),
    }))
}

async fn task_result(
    State(store): State<SharedStore>,
    Path(id): Path<u64>,
) -> Result<Json<TaskResultResponse>, ApiError> {
    let result = store.task_result(TaskId(id))?;
    Ok(Json(TaskResultResponse { result }))
}

async fn claim_task(State(store): State<SharedStore>) -> Result<Json<TaskResponse>, StatusCode> {
    match store.claim_ready_task() {
        Some(task) => Ok(Json(TaskResponse {
            task: TaskDto::from(&task),
        })),
        None => Err(StatusCode::NOT_FOUND),
    }
}

async fn submit_result(
    State(store): State<SharedStore>,
    Json(req): Json<TaskResultRequest>,
) -> Result<StatusCode, ApiError> {
    let step = store.complete_task(req.id, req.result)?;
    debug!(
        task = %step.task,
        newly_ready = step.newly_ready.len(),
        finished = step.finished_expression(),
        "result accepted"
    );
    Ok(StatusCode::OK)
}
