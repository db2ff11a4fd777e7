// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::{AuthError, IssueError};
use crate::context::{InvalidContentReference, UnsupportedProductError};
use crate::credentials::CredentialNotFound;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<InvalidContentReference> for ApiError {
    fn from(error: InvalidContentReference) -> Self {
        Self::bad_request(error.to_string())
    }
}

impl From<IssueError> for ApiError {
    fn from(error: IssueError) -> Self {
        tracing::error!(error = %error, "Failed to mint capability token");
        Self::internal("Failed to mint capability token")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

/// Handler error: either a rejected caller or an invalid request.
#[derive(Debug)]
pub enum HandlerError {
    Auth(AuthError),
    Api(ApiError),
}

impl From<ApiError> for HandlerError {
    fn from(error: ApiError) -> Self {
        HandlerError::Api(error)
    }
}

impl From<IssueError> for HandlerError {
    fn from(error: IssueError) -> Self {
        HandlerError::Api(error.into())
    }
}

impl From<InvalidContentReference> for HandlerError {
    fn from(error: InvalidContentReference) -> Self {
        HandlerError::Api(error.into())
    }
}

impl From<AuthError> for HandlerError {
    fn from(error: AuthError) -> Self {
        HandlerError::Auth(error)
    }
}

impl From<CredentialNotFound> for HandlerError {
    fn from(error: CredentialNotFound) -> Self {
        HandlerError::Auth(error.into())
    }
}

impl From<UnsupportedProductError> for HandlerError {
    fn from(error: UnsupportedProductError) -> Self {
        HandlerError::Auth(error.into())
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        match self {
            HandlerError::Auth(error) => error.into_response(),
            HandlerError::Api(error) => error.into_response(),
        }
    }
}
