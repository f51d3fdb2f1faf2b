// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Bearer Authentication
//!
//! Gate placed in front of any route that accepts deployments. A request
//! that fails the check gets a 401 and never reaches the wrapped handler,
//! so nothing is read from its body or written to disk.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

use crate::domain::credential::ApiKey;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authorization header required")]
    MissingHeader,

    #[error("Invalid authorization format")]
    MalformedHeader,

    #[error("Invalid API key")]
    InvalidCredential,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, self.to_string()).into_response()
    }
}

#[derive(Clone)]
pub struct BearerGate {
    api_key: Arc<ApiKey>,
}

impl BearerGate {
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_key: Arc::new(api_key),
        }
    }

    /// Check `Authorization: Bearer <key>` against the configured key
    pub fn authorize(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let value = match headers.get(AUTHORIZATION) {
            Some(value) if !value.is_empty() => value,
            _ => return Err(AuthError::MissingHeader),
        };

        let token = value
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix(BEARER_PREFIX))
            .ok_or(AuthError::MalformedHeader)?;

        if self.api_key.matches(token) {
            Ok(())
        } else {
            Err(AuthError::InvalidCredential)
        }
    }

    /// Put the gate in front of every route already on `router`
    pub fn protect<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.route_layer(middleware::from_fn_with_state(self, require_bearer))
    }
}

pub async fn require_bearer(State(gate): State<BearerGate>, request: Request, next: Next) -> Response {
    match gate.authorize(request.headers()) {
        Ok(()) => next.run(request).await,
        Err(e) => {
            warn!(path = %request.uri().path(), reason = %e, "Rejected unauthenticated request");
            e.into_response()
        }
    }
}
