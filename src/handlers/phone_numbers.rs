//! Phone number handlers, including the writable `contact` relationship.

use super::parse_id;
use crate::error::AppError;
use crate::extractors::JsonBody;
use crate::query::ApiQuery;
use crate::response::{created, ok, Document, JsonApi};
use crate::service::PhoneNumberService;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
};

pub async fn list(State(state): State<AppState>, q: ApiQuery) -> Result<JsonApi<Document>, AppError> {
    Ok(ok(PhoneNumberService::list(&state, &q).await?))
}

pub async fn read(
    State(state): State<AppState>,
    Path(id): Path<String>,
    q: ApiQuery,
) -> Result<JsonApi<Document>, AppError> {
    let id = parse_id(&id)?;
    Ok(ok(PhoneNumberService::fetch(&state, id, &q).await?))
}

pub async fn create(State(state): State<AppState>, JsonBody(body): JsonBody) -> Result<JsonApi<Document>, AppError> {
    Ok(created(PhoneNumberService::create(&state, body).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> Result<JsonApi<Document>, AppError> {
    let id = parse_id(&id)?;
    Ok(ok(PhoneNumberService::update(&state, id, body).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    PhoneNumberService::delete(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn related_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
    q: ApiQuery,
) -> Result<JsonApi<Document>, AppError> {
    let id = parse_id(&id)?;
    Ok(ok(PhoneNumberService::related_contact(&state, id, &q).await?))
}

pub async fn contact_relationship(
    State(state): State<AppState>,
    Path(id): Path<String>,
    q: ApiQuery,
) -> Result<JsonApi<Document>, AppError> {
    let id = parse_id(&id)?;
    Ok(ok(PhoneNumberService::contact_relationship(&state, id, &q).await?))
}

pub async fn replace_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    PhoneNumberService::replace_contact(&state, id, body).await?;
    Ok(StatusCode::NO_CONTENT)
}
