//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;

pub const NOT_FOUND_MESSAGE: &str = "Object not found";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing reference: {kind} '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("duplicate path segment: {0}")]
    DuplicatePathSegment(String),
    #[error("environment variable {var}: {message}")]
    Env { var: &'static str, message: String },
    #[error("invalid settings: {0}")]
    Invalid(#[from] validator::ValidationErrors),
    #[error("validation: {0}")]
    Validation(String),
}

/// Per-field validation messages, in rule declaration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidationErrors {
    fields: Vec<(String, Vec<String>)>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: String) {
        match self.fields.iter_mut().find(|(f, _)| f == field) {
            Some((_, messages)) => messages.push(message),
            None => self.fields.push((field.to_string(), vec![message])),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.iter().any(|(f, _)| f == field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, m)| m.as_slice())
    }

    pub fn len(&self) -> usize {
        self.fields.iter().map(|(_, m)| m.len()).sum()
    }

    /// First message, plus a count of the rest: "The name field is required. (and 2 more errors)".
    pub fn summary(&self) -> String {
        let Some(first) = self.fields.first().and_then(|(_, m)| m.first()) else {
            return "The given data was invalid.".to_string();
        };
        match self.len() - 1 {
            0 => first.clone(),
            1 => format!("{} (and 1 more error)", first),
            n => format!("{} (and {} more errors)", first, n),
        }
    }

    /// Single-field error, e.g. from a constraint violation.
    pub fn single(field: &str, message: String) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, messages) in &self.fields {
            map.serialize_entry(field, messages)?;
        }
        map.end()
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.summary())
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(ValidationErrors),
    #[error("{0}")]
    UnsupportedFilter(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Conflict(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("internal: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::UnsupportedFilter(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Db(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            AppError::Config(_) | AppError::Db(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(serde::Serialize)]
struct MessageBody<'a> {
    message: &'a str,
}

#[derive(serde::Serialize)]
struct ValidationBody<'a> {
    message: String,
    errors: &'a ValidationErrors,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        }
        match &self {
            AppError::Validation(errors) => (
                status,
                Json(ValidationBody {
                    message: errors.summary(),
                    errors,
                }),
            )
                .into_response(),
            AppError::NotFound(_) | AppError::Db(sqlx::Error::RowNotFound) => {
                (status, Json(MessageBody { message: NOT_FOUND_MESSAGE })).into_response()
            }
            AppError::UnsupportedFilter(message)
            | AppError::BadRequest(message)
            | AppError::Conflict(message) => {
                (status, Json(MessageBody { message })).into_response()
            }
            AppError::Config(_) | AppError::Db(_) | AppError::Internal(_) => {
                (status, Json(MessageBody { message: "Server Error" })).into_response()
            }
        }
    }
}
