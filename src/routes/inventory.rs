use axum::{
    routing::{get, post},
    Router,
};

use crate::app::AppState;
use crate::handler::inventory::{aggregate_inventory, search_inventory};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/frec", get(aggregate_inventory))
        .route("/frec/search", post(search_inventory))
}
