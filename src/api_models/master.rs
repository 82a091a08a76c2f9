use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::{Master, MasterPlate};
use crate::services::{
    LayoutStrategy, Listing, MasterDetail, MasterRequest, Orientation, PlateError, SourceItem,
};

const DEFAULT_REPLICATES: usize = 3;

fn one_plate() -> usize {
    1
}

#[derive(Debug, Deserialize)]
pub struct SourcePlateRef {
    pub id: i32,
    pub items: Option<Vec<SourceItem>>,
}

/// Layout selector as the form posts it: a number or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LayoutCode {
    Code(i32),
    Text(String),
}

impl LayoutCode {
    pub fn strategy(&self) -> Result<LayoutStrategy, PlateError> {
        let code = match self {
            LayoutCode::Code(code) => *code,
            LayoutCode::Text(text) => text.trim().parse().map_err(|_| {
                PlateError::InvalidRequest(format!("masterLayout {text:?} is not a number"))
            })?,
        };
        LayoutStrategy::try_from(code)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMasterRequest {
    pub plate: SourcePlateRef,
    pub volume: f64,
    pub replicates: Option<usize>,
    #[serde(default = "one_plate")]
    pub no_of_plates: usize,
    #[serde(default)]
    pub master_name: String,
    pub reps_layout: Option<Orientation>,
    pub master_layout: LayoutCode,
}

impl CreateMasterRequest {
    pub fn into_request(self) -> Result<MasterRequest, PlateError> {
        Ok(MasterRequest {
            plate_id: self.plate.id,
            items: self.plate.items,
            dose: self.volume,
            replicates: self.replicates.unwrap_or(DEFAULT_REPLICATES),
            plate_count: self.no_of_plates,
            strategy: self.master_layout.strategy()?,
            orientation: self.reps_layout.unwrap_or_default(),
            name: self.master_name,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedMaster {
    pub id: i32,
}

#[derive(Debug, Serialize)]
pub struct CreatedMasterResponse {
    pub master: CreatedMaster,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterResponse {
    pub id: i32,
    pub stock_id: i32,
    pub name: String,
    pub species: Option<String>,
    pub volume: f64,
    pub active: bool,
    pub deleted: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plates: Option<Vec<MasterPlate>>,
}

impl From<Master> for MasterResponse {
    fn from(master: Master) -> Self {
        Self {
            id: master.id,
            stock_id: master.stock_id,
            name: master.name,
            species: master.species,
            volume: master.volume,
            active: master.active,
            deleted: master.deleted,
            created_at: master.created_at,
            updated_at: master.updated_at,
            plates: None,
        }
    }
}

impl From<MasterDetail> for MasterResponse {
    fn from(detail: MasterDetail) -> Self {
        Self {
            plates: Some(detail.plates),
            ..Self::from(detail.master)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MasterEnvelope {
    pub master: MasterResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterListResponse {
    pub masters_active: Vec<MasterResponse>,
    pub masters_retired: Vec<MasterResponse>,
}

impl From<Listing<Master>> for MasterListResponse {
    fn from(listing: Listing<Master>) -> Self {
        Self {
            masters_active: listing.active.into_iter().map(MasterResponse::from).collect(),
            masters_retired: listing.retired.into_iter().map(MasterResponse::from).collect(),
        }
    }
}
