//! 404 for unmatched paths and 405 for a known path with the wrong verb, both as error documents.

use crate::error::AppError;
use axum::{extract::OriginalUri, http::Method};

pub async fn not_found(OriginalUri(uri): OriginalUri) -> AppError {
    AppError::RouteNotFound(uri.path().to_string())
}

pub async fn method_not_allowed(method: Method, OriginalUri(uri): OriginalUri) -> AppError {
    AppError::MethodNotAllowed {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
}
