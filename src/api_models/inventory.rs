use serde::{Deserialize, Serialize};

use crate::services::{EcGroup, SearchHit};

#[derive(Debug, Serialize)]
pub struct EcListResponse {
    pub ecs: Vec<EcGroup>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
}
