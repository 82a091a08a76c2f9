use axum::{
    routing::{get, post},
    Router,
};

use crate::app::AppState;
use crate::handler::plate::{
    master_plate_owner, plate_owners, withdraw_from_master_plate, withdraw_from_plate,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/plate/:id", get(plate_owners))
        .route("/plate/:id/take", post(withdraw_from_plate))
        .route("/masterPlate/:id", get(master_plate_owner))
        .route("/masterPlate/:id/take", post(withdraw_from_master_plate))
}
