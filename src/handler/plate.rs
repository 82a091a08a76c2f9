use axum::{
    extract::{Path, State},
    Json,
};

use crate::api_models::master::MasterResponse;
use crate::api_models::plate::{
    MasterPlateEnvelope, MasterPlateOwnerResponse, PlateOwnersResponse, StockPlateEnvelope,
    TakeRequest,
};
use crate::app::AppState;
use crate::handler::error::{blocking, AppError};
use crate::services::PlateError;

pub async fn plate_owners(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<PlateOwnersResponse>, AppError> {
    let owners = blocking(move || state.stocks().plate_owners(id)).await?;
    Ok(Json(owners.into()))
}

/// Manual withdrawal from every occupied well of a stock plate.
pub async fn withdraw_from_plate(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<TakeRequest>,
) -> Result<Json<StockPlateEnvelope>, AppError> {
    let plate = blocking(move || state.ledger().withdraw_uniform(id, payload.volume)).await?;
    Ok(Json(StockPlateEnvelope { plate }))
}

pub async fn master_plate_owner(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MasterPlateOwnerResponse>, AppError> {
    let master = blocking(move || match state.masters().owner_of_plate(id) {
        Ok(master) => Ok(Some(master)),
        Err(PlateError::NotFound { .. }) => Ok(None),
        Err(err) => Err(err),
    })
    .await?;
    Ok(Json(MasterPlateOwnerResponse {
        master: master.map(MasterResponse::from),
    }))
}

pub async fn withdraw_from_master_plate(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<TakeRequest>,
) -> Result<Json<MasterPlateEnvelope>, AppError> {
    let master_plate =
        blocking(move || state.ledger().withdraw_master_plate(id, payload.volume)).await?;
    Ok(Json(MasterPlateEnvelope { master_plate }))
}
