use std::sync::Arc;

use axum::Router;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};
use tracing::Level;

use crate::repositories::{MemoryPlateStore, PgPlateStore, PlateStore};
use crate::routes;
use crate::services::{MasterService, StockService, VolumeLedger};
use crate::utils::config::ServerConfig;
use crate::utils::middleware;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PlateStore>,
    pub conflict_retries: usize,
}

impl AppState {
    pub fn stocks(&self) -> StockService<'_> {
        StockService::new(self.store.as_ref(), self.conflict_retries)
    }

    pub fn masters(&self) -> MasterService<'_> {
        MasterService::new(self.store.as_ref(), self.conflict_retries)
    }

    pub fn ledger(&self) -> VolumeLedger<'_> {
        VolumeLedger::new(self.store.as_ref(), self.conflict_retries)
    }
}

pub fn build_app(cfg: &ServerConfig) -> anyhow::Result<Router> {
    let store: Arc<dyn PlateStore> = match &cfg.database_url {
        Some(url) => Arc::new(PgPlateStore::connect(url)?),
        None => {
            tracing::warn!("DATABASE_URL not set, keeping inventory in memory only");
            Arc::new(MemoryPlateStore::new())
        }
    };
    tracing::info!("using {} plate store", store.backend_tag());
    Ok(build_app_with_store(store, cfg.conflict_retries))
}

pub fn build_app_with_store(store: Arc<dyn PlateStore>, conflict_retries: usize) -> Router {
    let state = AppState {
        store,
        conflict_retries,
    };

    routes::build_routes()
        .with_state(state)
        .layer(middleware::cors_layer())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
