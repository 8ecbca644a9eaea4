// tests/http_api.rs

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use calcdag::api::build_router;
use calcdag::api::dto::TaskDto;
use calcdag::config::OperationTimes;
use calcdag::dag::{ClaimedTask, TaskGraphStore};
use calcdag::exec::WorkerError;
use calcdag::types::{Argument, ExpressionId, Operator, TaskId};
use calcdag_test_utils::init_tracing;

fn app() -> (Arc<TaskGraphStore>, Router) {
    init_tracing();
    let store = Arc::new(TaskGraphStore::new(OperationTimes::default()));
    (Arc::clone(&store), build_router(store))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

fn json_of(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

#[tokio::test]
async fn calculate_returns_created_with_id() {
    let (_, app) = app();

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/calculate",
        Some(json!({"expression": "(1+2)*3"})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json_of(&body), json!({"id": 1}));
}

#[tokio::test]
async fn invalid_expression_is_unprocessable() {
    let (store, app) = app();

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/calculate",
        Some(json!({"expression": "1+2a"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(store.list_expressions().is_empty());
}

#[tokio::test]
async fn overlong_literal_is_unprocessable_and_leaves_no_task() {
    let (store, app) = app();

    let expression = format!("1{}+1", "0".repeat(400));
    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/calculate",
        Some(json!({ "expression": expression })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(store.list_expressions().is_empty());

    let (status, _) = send(&app, "GET", "/internal/task", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn expressions_can_be_listed_and_fetched() {
    let (store, app) = app();
    store.create_expression("1+2").unwrap();
    store.create_expression("5").unwrap();

    let (status, body) = send(&app, "GET", "/api/v1/expressions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json_of(&body),
        json!({"expressions": [
            {"id": 1, "expression": "1+2", "status": "pending"},
            {"id": 2, "expression": "5", "status": "done", "result": 5.0},
        ]})
    );

    let (status, body) = send(&app, "GET", "/api/v1/expressions/2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body)["expression"]["result"], json!(5.0));

    let (status, _) = send(&app, "GET", "/api/v1/expressions/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn claim_is_not_found_when_nothing_is_ready() {
    let (_, app) = app();
    let (status, _) = send(&app, "GET", "/internal/task", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn worker_protocol_round_trip_over_http() {
    let (store, app) = app();
    let id = store.create_expression("(1+2)*3").unwrap();

    let (status, body) = send(&app, "GET", "/internal/task", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json_of(&body),
        json!({"task": {
            "id": 1,
            "expression_id": 1,
            "arg1": {"literal": 1.0},
            "arg2": {"literal": 2.0},
            "operation": "+",
            "operation_time": 100,
        }})
    );

    let (status, _) = send(&app, "GET", "/api/v1/tasks/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        "/internal/task",
        Some(json!({"id": 1, "result": 3.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", "/api/v1/tasks/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body), json!({"result": 3.0}));

    let (status, body) = send(&app, "GET", "/internal/task", None).await;
    assert_eq!(status, StatusCode::OK);
    let task = &json_of(&body)["task"];
    assert_eq!(task["arg1"], json!({"task": 1}));
    assert_eq!(task["operation"], json!("*"));

    let (status, _) = send(
        &app,
        "POST",
        "/internal/task",
        Some(json!({"id": 2, "result": 9.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let record = store.get_expression(id).unwrap();
    assert_eq!(record.result, Some(9.0));
}

#[tokio::test]
async fn submitting_unknown_task_is_not_found() {
    let (_, app) = app();
    let (status, _) = send(
        &app,
        "POST",
        "/internal/task",
        Some(json!({"id": 77, "result": 1.0})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[test]
fn task_dto_with_unknown_operator_is_rejected() {
    let dto = TaskDto {
        id: TaskId(1),
        expression_id: ExpressionId(1),
        arg1: Argument::Literal(1.0),
        arg2: Argument::Literal(2.0),
        operation: "%".to_string(),
        operation_time: 0,
    };
    assert_eq!(
        ClaimedTask::try_from(dto.clone()),
        Err(WorkerError::UnknownOperator("%".to_string()))
    );

    let ok = TaskDto {
        operation: "/".to_string(),
        ..dto
    };
    assert_eq!(ClaimedTask::try_from(ok).unwrap().operator, Operator::Divide);
}
