use axum::{extract::State, Json};

use crate::api_models::inventory::{EcListResponse, SearchRequest, SearchResponse};
use crate::app::AppState;
use crate::handler::error::{blocking, AppError};
use crate::services::InventoryIndex;

pub async fn aggregate_inventory(
    State(state): State<AppState>,
) -> Result<Json<EcListResponse>, AppError> {
    let index = blocking(move || InventoryIndex::snapshot(state.store.as_ref())).await?;
    Ok(Json(EcListResponse {
        ecs: index.aggregate_by_external_code(),
    }))
}

pub async fn search_inventory(
    State(state): State<AppState>,
    Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    let index = blocking(move || InventoryIndex::snapshot(state.store.as_ref())).await?;
    Ok(Json(SearchResponse {
        results: index.search(&payload.id),
    }))
}
