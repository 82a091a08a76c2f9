use axum::{
    extract::{Path, State},
    Json,
};

use crate::api_models::master::{
    CreateMasterRequest, CreatedMaster, CreatedMasterResponse, MasterEnvelope,
    MasterListResponse,
};
use crate::api_models::stock::ActiveResponse;
use crate::app::AppState;
use crate::handler::error::{blocking, AppError};
use crate::models::LifecycleAction;

pub async fn create_master(
    State(state): State<AppState>,
    Json(payload): Json<CreateMasterRequest>,
) -> Result<Json<CreatedMasterResponse>, AppError> {
    let request = payload.into_request()?;
    let master = blocking(move || state.masters().create_master(&request)).await?;
    Ok(Json(CreatedMasterResponse {
        master: CreatedMaster { id: master.id },
    }))
}

pub async fn list_masters(
    State(state): State<AppState>,
) -> Result<Json<MasterListResponse>, AppError> {
    let listing = blocking(move || state.masters().list()).await?;
    Ok(Json(listing.into()))
}

pub async fn get_master(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MasterEnvelope>, AppError> {
    let detail = blocking(move || state.masters().get(id)).await?;
    Ok(Json(MasterEnvelope {
        master: detail.into(),
    }))
}

async fn change_lifecycle(
    state: AppState,
    id: i32,
    action: LifecycleAction,
) -> Result<Json<ActiveResponse>, AppError> {
    let master = blocking(move || state.masters().apply(id, action)).await?;
    Ok(Json(ActiveResponse {
        active: master.active,
    }))
}

pub async fn retire_master(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ActiveResponse>, AppError> {
    change_lifecycle(state, id, LifecycleAction::Retire).await
}

pub async fn activate_master(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ActiveResponse>, AppError> {
    change_lifecycle(state, id, LifecycleAction::Activate).await
}

pub async fn delete_master(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ActiveResponse>, AppError> {
    change_lifecycle(state, id, LifecycleAction::Delete).await
}
