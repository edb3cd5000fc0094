//! Centralized error handling.
//!
//! Provides a unified error type for the entire application. Services
//! classify lower-level faults into these variants; the single place
//! status codes are produced is the `IntoResponse` implementation.

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Application error taxonomy
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid username or password")]
    InvalidCredentials,

    // Resource errors
    #[error("{0}")]
    NotFound(String),

    // Structural input rejection, field-scoped
    #[error("Validation failed")]
    Validation(BTreeMap<String, String>),

    // Business-rule rejection (uniqueness conflicts, empty role set, ...)
    #[error("{0}")]
    BusinessRule(String),

    // External service errors
    #[error("Database error")]
    Database {
        source: sea_orm::DbErr,
        context: Option<String>,
    },

    #[error("Authentication error")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    // Internal
    #[error("{0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AppError {
    fn from(source: sea_orm::DbErr) -> Self {
        AppError::Database {
            source,
            context: None,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .iter()
            .map(|(field, errs)| {
                let message = errs
                    .iter()
                    .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .next()
                    .unwrap_or_else(|| format!("{} is invalid", field));
                (field.to_string(), message)
            })
            .collect();
        AppError::Validation(fields)
    }
}

/// Structured error body returned to clients
#[derive(Debug, Serialize)]
struct ErrorResponse {
    timestamp: DateTime<Utc>,
    status: u16,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    validation_errors: Option<BTreeMap<String, String>>,
}

impl AppError {
    /// Get HTTP status code
    fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::InvalidCredentials | AppError::Jwt(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::BusinessRule(_) => StatusCode::BAD_REQUEST,
            AppError::Database { .. } | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get user-facing message (hides internal details)
    fn user_message(&self) -> String {
        match self {
            AppError::Database { source, context } => {
                tracing::error!(context = context.as_deref(), "Database error: {:?}", source);
                "An unexpected error occurred".to_string()
            }
            AppError::Jwt(e) => {
                tracing::debug!("JWT error: {:?}", e);
                "Invalid or expired token".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An unexpected error occurred".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Operation context rendered into the `details` field
    fn details(&self) -> Option<String> {
        match self {
            AppError::Database { context, .. } => context.clone(),
            AppError::Validation(_) => Some("Validation errors".to_string()),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let validation_errors = match &self {
            AppError::Validation(fields) => Some(fields.clone()),
            _ => None,
        };

        let body = ErrorResponse {
            timestamp: Utc::now(),
            status: status.as_u16(),
            message: self.user_message(),
            details: self.details(),
            validation_errors,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self, msg: impl Into<String>) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, msg: impl Into<String>) -> AppResult<T> {
        self.ok_or_else(|| AppError::NotFound(msg.into()))
    }
}

/// Convenience constructors
impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn business_rule(msg: impl Into<String>) -> Self {
        AppError::BusinessRule(msg.into())
    }

    pub fn validation_field(field: impl Into<String>, msg: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(field.into(), msg.into());
        AppError::Validation(fields)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    pub fn database(source: sea_orm::DbErr, context: impl Into<String>) -> Self {
        AppError::Database {
            source,
            context: Some(context.into()),
        }
    }

    /// Attach operation context to a database error; other variants pass
    /// through unchanged.
    pub fn with_db_context(self, context: impl Into<String>) -> Self {
        match self {
            AppError::Database { source, .. } => AppError::Database {
                source,
                context: Some(context.into()),
            },
            other => other,
        }
    }
}
