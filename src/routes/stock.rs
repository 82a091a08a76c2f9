use axum::{
    routing::{get, post},
    Router,
};

use crate::app::AppState;
use crate::handler::stock::{
    activate_stock, check_frs, check_name, create_stock, delete_stock, get_stock, list_stocks,
    retire_stock, save_stock,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stock", get(list_stocks))
        .route("/stock/new", post(create_stock))
        .route("/stock/check/name", post(check_name))
        .route("/stock/check/frs", post(check_frs))
        .route("/stock/:id", get(get_stock))
        .route("/stock/:id/save", post(save_stock))
        .route("/stock/:id/retire", post(retire_stock))
        .route("/stock/:id/activate", post(activate_stock))
        .route("/stock/:id/delete", post(delete_stock))
}
