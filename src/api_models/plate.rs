use serde::{Deserialize, Serialize};

use crate::api_models::master::MasterResponse;
use crate::api_models::stock::StockResponse;
use crate::models::{MasterPlate, StockPlate};
use crate::services::PlateOwners;

#[derive(Debug, Deserialize)]
pub struct TakeRequest {
    #[serde(default)]
    pub volume: f64,
}

#[derive(Debug, Serialize)]
pub struct PlateOwnersResponse {
    pub stock: Option<StockResponse>,
    pub master: Option<MasterResponse>,
}

impl From<PlateOwners> for PlateOwnersResponse {
    fn from(owners: PlateOwners) -> Self {
        Self {
            stock: owners.stock.map(StockResponse::from),
            master: owners.master.map(MasterResponse::from),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StockPlateEnvelope {
    pub plate: StockPlate,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterPlateEnvelope {
    pub master_plate: MasterPlate,
}

#[derive(Debug, Serialize)]
pub struct MasterPlateOwnerResponse {
    pub master: Option<MasterResponse>,
}
