use axum::{
    extract::{Path, State},
    Json,
};

use crate::api_models::stock::{
    ActiveResponse, CreateStockRequest, FrCheckRequest, FrCheckResponse, NameCheckRequest,
    NameCheckResponse, SaveStockRequest, StockEnvelope, StockListResponse, StockResponse,
};
use crate::app::AppState;
use crate::handler::error::{blocking, AppError};
use crate::models::LifecycleAction;
use crate::services::PlateError;

pub async fn list_stocks(
    State(state): State<AppState>,
) -> Result<Json<StockListResponse>, AppError> {
    let listing = blocking(move || state.stocks().list()).await?;
    Ok(Json(listing.into()))
}

pub async fn get_stock(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<StockEnvelope>, AppError> {
    let detail = blocking(move || state.stocks().get(id)).await?;
    Ok(Json(StockEnvelope {
        stock: StockResponse::with_plate(detail.stock, detail.plate),
    }))
}

pub async fn create_stock(
    State(state): State<AppState>,
    Json(payload): Json<CreateStockRequest>,
) -> Result<Json<StockEnvelope>, AppError> {
    let (fields, wells) = payload.stock.into_parts();
    let stock = blocking(move || state.stocks().create(fields, wells)).await?;
    Ok(Json(StockEnvelope {
        stock: stock.into(),
    }))
}

pub async fn save_stock(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<SaveStockRequest>,
) -> Result<Json<StockEnvelope>, AppError> {
    let edits = payload.stock.well_edits()?;
    let fields = payload.stock.fields();
    let detail = blocking(move || state.stocks().update(id, fields, edits)).await?;
    Ok(Json(StockEnvelope {
        stock: StockResponse::with_plate(detail.stock, detail.plate),
    }))
}

async fn change_lifecycle(
    state: AppState,
    id: i32,
    action: LifecycleAction,
) -> Result<Json<ActiveResponse>, AppError> {
    let stock = blocking(move || state.stocks().apply(id, action)).await?;
    Ok(Json(ActiveResponse {
        active: stock.active,
    }))
}

pub async fn retire_stock(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ActiveResponse>, AppError> {
    change_lifecycle(state, id, LifecycleAction::Retire).await
}

pub async fn activate_stock(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ActiveResponse>, AppError> {
    change_lifecycle(state, id, LifecycleAction::Activate).await
}

pub async fn delete_stock(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ActiveResponse>, AppError> {
    change_lifecycle(state, id, LifecycleAction::Delete).await
}

pub async fn check_name(
    State(state): State<AppState>,
    Json(payload): Json<NameCheckRequest>,
) -> Result<Json<NameCheckResponse>, AppError> {
    let ok = blocking(move || state.stocks().name_available(&payload.name)).await?;
    Ok(Json(NameCheckResponse { ok }))
}

/// Echoes back the submitted entries whose FR already sits on a live plate.
pub async fn check_frs(
    State(state): State<AppState>,
    Json(payload): Json<FrCheckRequest>,
) -> Result<Json<FrCheckResponse>, AppError> {
    let submitted = payload
        .frs
        .ok_or_else(|| AppError::from(PlateError::InvalidRequest("no frs sent".into())))?;
    let frs: Vec<String> = submitted.iter().filter_map(|item| item.fr.clone()).collect();
    let in_use = blocking(move || state.stocks().frs_in_use(&frs)).await?;
    let frs = submitted
        .into_iter()
        .filter(|item| item.fr.as_ref().is_some_and(|fr| in_use.contains(fr)))
        .collect();
    Ok(Json(FrCheckResponse { frs }))
}
