//! Typed errors and their JSON:API error documents.

use crate::response::JsonApi;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },
    #[error("validation: {0}")]
    Validation(String),
}

/// Where in the request an error originates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSource {
    /// JSON pointer into the request document, e.g. `/data/attributes/name_first`.
    Pointer(String),
    /// Name of the offending query parameter, e.g. `filter[email]`.
    Parameter(String),
}

/// One failed field of a resource being persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    pub pointer: String,
}

impl FieldError {
    pub fn attribute(field: &str, message: &str) -> Self {
        FieldError {
            field: field.to_string(),
            message: message.to_string(),
            pointer: format!("/data/attributes/{}", field),
        }
    }

    pub fn relationship(field: &str, message: &str) -> Self {
        FieldError {
            field: field.to_string(),
            message: message.to_string(),
            pointer: format!("/data/relationships/{}", field),
        }
    }
}

fn describe_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{} {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("validation: {}", describe_fields(.0))]
    Validation(Vec<FieldError>),
    #[error("{0} is not allowed")]
    UnsupportedFilter(String),
    #[error("{requested} is not a valid value for {param} page parameter, maximum is {maximum}")]
    PageSizeExceeded {
        param: &'static str,
        requested: u64,
        maximum: u64,
    },
    #[error("{value} is not a valid value for {param} page parameter")]
    InvalidPageValue { param: String, value: String },
    #[error("bad request: {message}")]
    BadRequest {
        message: String,
        origin: Option<ErrorSource>,
    },
    #[error("the record identified by {id} could not be found in {resource}")]
    NotFound { resource: &'static str, id: String },
    #[error("no route matches {0}")]
    RouteNotFound(String),
    #[error("method {method} is not allowed for {path}")]
    MethodNotAllowed { method: String, path: String },
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest {
            message: message.into(),
            origin: None,
        }
    }

    pub fn bad_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::BadRequest {
            message: message.into(),
            origin: Some(ErrorSource::Parameter(parameter.into())),
        }
    }

    pub fn bad_pointer(pointer: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::BadRequest {
            message: message.into(),
            origin: Some(ErrorSource::Pointer(pointer.into())),
        }
    }

    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        AppError::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::UnsupportedFilter(_)
            | AppError::PageSizeExceeded { .. }
            | AppError::InvalidPageValue { .. }
            | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } | AppError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Db(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            AppError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code_and_title(&self) -> (&'static str, &'static str) {
        match self {
            AppError::Config(_) => ("config_error", "Configuration error"),
            AppError::Validation(_) => ("validation_error", "Validation error"),
            AppError::UnsupportedFilter(_) => ("filter_not_allowed", "Filter not allowed"),
            AppError::PageSizeExceeded { .. } => ("page_size_exceeded", "Invalid page size"),
            AppError::InvalidPageValue { .. } => ("invalid_page_value", "Invalid page value"),
            AppError::BadRequest { .. } => ("bad_request", "Bad request"),
            AppError::NotFound { .. } => ("not_found", "Record not found"),
            AppError::RouteNotFound(_) => ("route_not_found", "Not found"),
            AppError::MethodNotAllowed { .. } => ("method_not_allowed", "Method not allowed"),
            AppError::Conflict(_) => ("conflict", "Conflict"),
            AppError::PayloadTooLarge(_) => ("payload_too_large", "Payload too large"),
            AppError::Db(sqlx::Error::RowNotFound) => ("not_found", "Record not found"),
            AppError::Db(_) => ("database_error", "Internal server error"),
        }
    }

    /// Error objects for the top-level `errors` array. Validation failures yield one per field.
    pub fn error_objects(&self) -> Vec<ErrorObject> {
        let status = self.status();
        let (code, title) = self.code_and_title();
        match self {
            AppError::Validation(fields) => fields
                .iter()
                .map(|f| {
                    ErrorObject::new(
                        status,
                        code,
                        title,
                        format!("{} - {}", f.field, f.message),
                        Some(ErrorSource::Pointer(f.pointer.clone())),
                    )
                })
                .collect(),
            _ => {
                let source = match self {
                    AppError::UnsupportedFilter(key) => Some(ErrorSource::Parameter(format!("filter[{}]", key))),
                    AppError::PageSizeExceeded { param, .. } => Some(ErrorSource::Parameter(format!("page[{}]", param))),
                    AppError::InvalidPageValue { param, .. } => Some(ErrorSource::Parameter(format!("page[{}]", param))),
                    AppError::BadRequest { origin, .. } => origin.clone(),
                    _ => None,
                };
                let detail = match self {
                    AppError::BadRequest { message, .. } => message.clone(),
                    AppError::Db(_) if status.is_server_error() => "an internal error occurred".to_string(),
                    other => other.to_string(),
                };
                vec![ErrorObject::new(status, code, title, detail, source)]
            }
        }
    }
}

/// A JSON:API error object.
#[derive(Clone, Debug, Serialize)]
pub struct ErrorObject {
    pub id: String,
    pub status: String,
    pub code: &'static str,
    pub title: &'static str,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ErrorSource>,
}

impl ErrorObject {
    fn new(
        status: StatusCode,
        code: &'static str,
        title: &'static str,
        detail: String,
        source: Option<ErrorSource>,
    ) -> Self {
        ErrorObject {
            id: uuid::Uuid::new_v4().to_string(),
            status: status.as_u16().to_string(),
            code,
            title,
            detail,
            source,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorDocument {
    pub errors: Vec<ErrorObject>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "request rejected");
        }
        let body = ErrorDocument {
            errors: self.error_objects(),
        };
        JsonApi(status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_yields_one_object_per_field() {
        let err = AppError::Validation(vec![
            FieldError::attribute("name_first", "can't be blank"),
            FieldError::attribute("name_last", "can't be blank"),
        ]);
        let objects = err.error_objects();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].status, "422");
        assert_eq!(
            objects[1].source,
            Some(ErrorSource::Pointer("/data/attributes/name_last".into()))
        );
        assert_ne!(objects[0].id, objects[1].id);
    }

    #[test]
    fn filter_error_points_at_parameter() {
        let err = AppError::UnsupportedFilter("email".into());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let objects = err.error_objects();
        assert_eq!(objects[0].code, "filter_not_allowed");
        assert_eq!(objects[0].source, Some(ErrorSource::Parameter("filter[email]".into())));
        assert_eq!(objects[0].detail, "email is not allowed");
    }

    #[test]
    fn source_serializes_as_single_member_object() {
        let v = serde_json::to_value(ErrorSource::Pointer("/data".into())).unwrap();
        assert_eq!(v, serde_json::json!({ "pointer": "/data" }));
    }

    #[test]
    fn row_not_found_maps_to_404() {
        assert_eq!(AppError::Db(sqlx::Error::RowNotFound).status(), StatusCode::NOT_FOUND);
    }
}
