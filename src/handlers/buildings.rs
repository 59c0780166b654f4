//! Building registry handlers under `/api/core/buildings`.

use crate::error::AppError;
use crate::middleware::Principal;
use crate::response::{success_many, success_one, success_one_ok};
use crate::service::{CreateBuildingRequest, UpdateBuildingRequest};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

fn actor(principal: Option<Extension<Principal>>) -> Option<Uuid> {
    principal.and_then(|Extension(p)| p.subject)
}

fn parse_id(id_str: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id_str).map_err(|_| AppError::BadRequest("invalid uuid".into()))
}

pub async fn list_active(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    Ok(success_many(state.registry.list_active().await?))
}

pub async fn list_all(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    Ok(success_many(state.registry.list_all().await?))
}

pub async fn dropdown(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    Ok(success_many(state.registry.dropdown().await?))
}

pub async fn read(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let building = state
        .registry
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(id_str))?;
    Ok(success_one_ok(building))
}

/// Provision a tenant schema and register the building.
pub async fn create(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    Json(body): Json<CreateBuildingRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let building = state.buildings.create_tenant(body, actor(principal)).await?;
    Ok(success_one(building))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    principal: Option<Extension<Principal>>,
    Json(body): Json<UpdateBuildingRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let building = state.buildings.update_building(id, body, actor(principal)).await?;
    Ok(success_one_ok(building))
}
