//! `ApiQuery` from the request URI: full path plus JSON:API query parameters.

use crate::error::AppError;
use crate::query::{ApiQuery, QueryParams};
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, OriginalUri, Query},
    http::request::Parts,
};

#[async_trait]
impl<S> FromRequestParts<S> for ApiQuery
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Nested routers see a stripped URI; links and cache keys need the full path.
        let path = parts
            .extensions
            .get::<OriginalUri>()
            .map(|uri| uri.0.path().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
        Ok(ApiQuery {
            path,
            params: QueryParams::parse(pairs)?,
        })
    }
}
