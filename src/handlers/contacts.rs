//! Contact handlers: list, fetch, create, update, delete, and the phone number relationship.

use super::parse_id;
use crate::error::AppError;
use crate::extractors::JsonBody;
use crate::query::ApiQuery;
use crate::response::{created, ok, Document, JsonApi};
use crate::service::ContactService;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
};

pub async fn list(State(state): State<AppState>, q: ApiQuery) -> Result<JsonApi<Document>, AppError> {
    Ok(ok(ContactService::list(&state, &q).await?))
}

pub async fn read(
    State(state): State<AppState>,
    Path(id): Path<String>,
    q: ApiQuery,
) -> Result<JsonApi<Document>, AppError> {
    let id = parse_id(&id)?;
    Ok(ok(ContactService::fetch(&state, id, &q).await?))
}

pub async fn create(State(state): State<AppState>, JsonBody(body): JsonBody) -> Result<JsonApi<Document>, AppError> {
    Ok(created(ContactService::create(&state, body).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> Result<JsonApi<Document>, AppError> {
    let id = parse_id(&id)?;
    Ok(ok(ContactService::update(&state, id, body).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    ContactService::delete(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn related_phone_numbers(
    State(state): State<AppState>,
    Path(id): Path<String>,
    q: ApiQuery,
) -> Result<JsonApi<Document>, AppError> {
    let id = parse_id(&id)?;
    Ok(ok(ContactService::related_phone_numbers(&state, id, &q).await?))
}

pub async fn phone_numbers_relationship(
    State(state): State<AppState>,
    Path(id): Path<String>,
    q: ApiQuery,
) -> Result<JsonApi<Document>, AppError> {
    let id = parse_id(&id)?;
    Ok(ok(ContactService::phone_numbers_relationship(&state, id, &q).await?))
}
