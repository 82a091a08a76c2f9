use axum::Router;

use crate::app::AppState;

mod inventory;
mod master;
mod plate;
mod root;
mod stock;

pub fn build_routes() -> Router<AppState> {
    Router::new()
        .merge(root::router())
        .nest(
            "/api",
            stock::router()
                .merge(master::router())
                .merge(inventory::router())
                .merge(plate::router()),
        )
}
