// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! HTTP API
//!
//! `/deploy` accepts a multipart upload (field `deployment`) behind the
//! bearer gate. `/health` is open.
//!
//! Responses are plain text except for `/health`.

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::application::deployment::{DeploymentError, DeploymentService};
use crate::application::executor::ExecutorError;
use crate::infrastructure::archive::ExtractError;
use crate::presentation::auth::BearerGate;

/// Multipart field carrying the archive
pub const DEPLOYMENT_FIELD: &str = "deployment";

struct AppState {
    deployments: Arc<DeploymentService>,
    start_time: Instant,
}

/// Build the agent's router
pub fn app(deployments: Arc<DeploymentService>, gate: BearerGate, max_upload_bytes: usize) -> Router {
    let state = Arc::new(AppState {
        deployments,
        start_time: Instant::now(),
    });

    // Any method reaches the gate first, so an unauthenticated GET is a
    // 401 rather than a 405
    let deploy = gate.protect(Router::new().route("/deploy", any(handle_deploy)));

    Router::new()
        .route("/health", get(health_handler))
        .merge(deploy)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "uptime_seconds": state.start_time.elapsed().as_secs(),
    }))
}

async fn handle_deploy(
    State(state): State<Arc<AppState>>,
    method: Method,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    if method != Method::POST {
        return (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed").into_response();
    }

    let archive = match read_deployment_field(multipart).await {
        Ok(archive) => archive,
        Err(reason) => {
            warn!(reason = %reason, "Rejected deployment upload");
            return (StatusCode::BAD_REQUEST, "Failed to get uploaded file").into_response();
        }
    };

    match state.deployments.deploy(archive).await {
        Ok(handle) => {
            info!(workspace = %handle.workspace.name(), "Deployment accepted");
            (
                StatusCode::OK,
                format!(
                    "Deployment started successfully in {}\n",
                    handle.workspace.root().display()
                ),
            )
                .into_response()
        }
        Err(e) => e.into_response(),
    }
}

async fn read_deployment_field(multipart: Result<Multipart, MultipartRejection>) -> Result<Bytes, String> {
    let mut multipart = multipart.map_err(|e| e.body_text())?;

    while let Some(field) = multipart.next_field().await.map_err(|e| e.body_text())? {
        if field.name() == Some(DEPLOYMENT_FIELD) {
            return field.bytes().await.map_err(|e| e.body_text());
        }
    }

    Err(format!("missing multipart field '{}'", DEPLOYMENT_FIELD))
}

impl IntoResponse for DeploymentError {
    fn into_response(self) -> Response {
        let message = match &self {
            DeploymentError::CreateWorkspace(_) => "Failed to create deployment directory".to_string(),
            DeploymentError::SaveArchive(_) => "Failed to save zip file".to_string(),
            DeploymentError::Extract(ExtractError::UnsafePath { entry, .. }) => {
                format!("Unsafe path in deployment archive: {}", entry)
            }
            DeploymentError::Extract(_) | DeploymentError::ExtractionTask(_) => {
                "Failed to extract deployment".to_string()
            }
            DeploymentError::Executor(ExecutorError::MissingEntryPoint(script)) => {
                format!("{} not found in deployment", script)
            }
            DeploymentError::Executor(ExecutorError::Inspect { .. }) => {
                "Failed to inspect deploy script".to_string()
            }
            DeploymentError::Executor(ExecutorError::Permissions { .. }) => {
                "Failed to make deploy script executable".to_string()
            }
            DeploymentError::Executor(ExecutorError::Spawn { .. }) => "Failed to start deploy script".to_string(),
        };

        (self.status_code(), message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::path_sanitizer::PathSanitizerError;
    use std::path::PathBuf;

    #[test]
    fn test_unsafe_path_is_bad_request() {
        let error = DeploymentError::Extract(ExtractError::UnsafePath {
            entry: "../../etc/passwd".into(),
            reason: PathSanitizerError::PathTraversal("../../etc/passwd".into()),
        });
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_missing_entry_point_is_bad_request() {
        let error = DeploymentError::Executor(ExecutorError::MissingEntryPoint("DEPLOY.sh".into()));
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_spawn_failure_is_server_error() {
        let error = DeploymentError::Executor(ExecutorError::Spawn {
            program: PathBuf::from("/bin/bash"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        });
        assert_eq!(error.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_script_inspection_failure_is_server_error() {
        let error = DeploymentError::Executor(ExecutorError::Inspect {
            path: PathBuf::from("extracted/DEPLOY.sh"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        });
        assert_eq!(error.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
