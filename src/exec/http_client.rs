// src/exec/http_client.rs

//! HTTP implementation of [`DispatchClient`].

use std::time::Duration;

use anyhow::Context;
use reqwest::StatusCode;
use tracing::debug;

use crate::api::dto::{TaskResponse, TaskResultRequest, TaskResultResponse};
use crate::dag::ClaimedTask;
use crate::errors::Result;
use crate::exec::WorkerError;
use crate::exec::backend::{DispatchClient, DispatchFuture};
use crate::types::TaskId;

/// Client for the orchestrator's `/internal` and `/api/v1/tasks` routes.
#[derive(Debug, Clone)]
pub struct HttpDispatch {
    base_url: String,
    http: reqwest::Client,
}

impl HttpDispatch {
    /// Create a client with a per-request timeout.
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn task_url(&self) -> String {
        format!("{}/internal/task", self.base_url)
    }
}

impl DispatchClient for HttpDispatch {
    fn claim_task(&self) -> DispatchFuture<'_, Option<ClaimedTask>> {
        Box::pin(async move {
            let resp = self.http.get(self.task_url()).send().await?;

            match resp.status() {
                StatusCode::NOT_FOUND => Ok(None),
                status if status.is_success() => {
                    let body: TaskResponse = resp.json().await?;
                    Ok(Some(ClaimedTask::try_from(body.task)?))
                }
                status => Err(WorkerError::Transport(format!("claim returned {status}"))),
            }
        })
    }

    fn fetch_result(&self, task: TaskId) -> DispatchFuture<'_, Option<f64>> {
        Box::pin(async move {
            let url = format!("{}/api/v1/tasks/{}", self.base_url, task.0);
            let resp = self.http.get(&url).send().await?;

            match resp.status() {
                StatusCode::NOT_FOUND => {
                    debug!(task = %task, "result not available yet");
                    Ok(None)
                }
                status if status.is_success() => {
                    let body: TaskResultResponse = resp.json().await?;
                    Ok(Some(body.result))
                }
                status => Err(WorkerError::Transport(format!(
                    "fetching {task} returned {status}"
                ))),
            }
        })
    }

    fn submit_result(&self, task: TaskId, result: f64) -> DispatchFuture<'_, ()> {
        Box::pin(async move {
            let resp = self
                .http
                .post(self.task_url())
                .json(&TaskResultRequest { id: task, result })
                .send()
                .await?;

            match resp.status() {
                StatusCode::NOT_FOUND => Err(WorkerError::TaskRejected(task)),
                status if status.is_success() => Ok(()),
                status => {
                    let body = resp.text().await.unwrap_or_default();
                    Err(WorkerError::Transport(format!(
                        "submitting {task} returned {status}: {body}"
                    )))
                }
            }
        })
    }
}
