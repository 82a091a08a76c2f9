use axum::{
    routing::{get, post},
    Router,
};

use crate::app::AppState;
use crate::handler::master::{
    activate_master, create_master, delete_master, get_master, list_masters, retire_master,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/master", get(list_masters))
        .route("/master/new", post(create_master))
        .route("/master/:id", get(get_master))
        .route("/master/:id/retire", post(retire_master))
        .route("/master/:id/activate", post(activate_master))
        .route("/master/:id/delete", post(delete_master))
}
