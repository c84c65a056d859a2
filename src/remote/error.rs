//! Mapping of HTTP failures onto the shopdesk error taxonomy.
//!
//! Every non-2xx answer and every transport failure from the admin API goes
//! through [`ApiError`] so that status handling is decided in one place:
//! `401` means the session expired, `403` means the role is missing, anything
//! else with a body is a server error, and no response at all is a network
//! error. None of these are retried automatically.

use std::fmt;

use reqwest::StatusCode;

use crate::error::ShopdeskError;

use super::envelope::{ErrorBody, describe_failure};

/// A failed HTTP exchange with the admin API.
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status code, absent when no response arrived
    pub status: Option<StatusCode>,
    /// Human-readable error message
    pub message: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(message: impl Into<String>, status: StatusCode) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Build from a non-2xx status and the raw response body.
    pub fn from_body(status: StatusCode, body: &str) -> Self {
        let message = match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) if parsed.message.is_some() || parsed.errors.is_some() => {
                describe_failure(parsed.message.as_deref(), parsed.errors.as_ref())
            }
            _ if !body.trim().is_empty() && body.len() <= 200 => body.trim().to_string(),
            _ => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
        };
        Self::with_status(message, status)
    }

    /// Server-side failures may succeed on a manual retry.
    pub fn is_transient(&self) -> bool {
        match self.status {
            Some(status) => status.is_server_error(),
            None => true,
        }
    }

    pub fn to_shopdesk_error(&self) -> ShopdeskError {
        match self.status {
            None => ShopdeskError::Network(self.message.clone()),
            Some(StatusCode::UNAUTHORIZED) => ShopdeskError::AuthExpired,
            Some(StatusCode::FORBIDDEN) => ShopdeskError::Forbidden(self.message.clone()),
            Some(status) => ShopdeskError::Server {
                status: status.as_u16(),
                message: self.message.clone(),
            },
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<ApiError> for ShopdeskError {
    fn from(error: ApiError) -> Self {
        error.to_shopdesk_error()
    }
}

impl From<reqwest::Error> for ShopdeskError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return ShopdeskError::Decode(err.to_string());
        }
        match err.status() {
            Some(status) => ApiError::with_status(err.to_string(), status).into(),
            None => ApiError::new(err.to_string()).into(),
        }
    }
}
