use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::grid::{Address, Grid};
use crate::models::well::{DualWell, Well, WellContents};
use crate::schema::plates;

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = plates)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PlateRow {
    pub id: i32,
    pub kind: String,
    pub master_id: Option<i32>,
    pub wells: serde_json::Value,
    pub version: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = plates)]
pub struct NewPlateRow {
    pub kind: String,
    pub master_id: Option<i32>,
    pub wells: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlateKind {
    Stock,
    Master,
}

impl PlateKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PlateKind::Stock => "stock",
            PlateKind::Master => "master",
        }
    }
}

/// A persisted grid plus the version counter used for compare-and-swap saves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plate<W> {
    pub id: i32,
    pub version: i32,
    #[serde(flatten)]
    pub wells: Grid<W>,
}

pub type StockPlate = Plate<Well>;
pub type MasterPlate = Plate<DualWell>;

impl PlateRow {
    pub fn into_plate<W>(self) -> Result<Plate<W>, serde_json::Error>
    where
        W: DeserializeOwned + Default,
    {
        Ok(Plate {
            id: self.id,
            version: self.version,
            wells: serde_json::from_value(self.wells)?,
        })
    }
}

/// A plate as seen by inventory queries.
#[derive(Debug, Clone)]
pub enum InventoryPlate {
    Stock(StockPlate),
    Master(MasterPlate),
}

impl InventoryPlate {
    pub fn id(&self) -> i32 {
        match self {
            InventoryPlate::Stock(plate) => plate.id,
            InventoryPlate::Master(plate) => plate.id,
        }
    }

    pub fn wells(&self) -> Box<dyn Iterator<Item = (Address, &dyn WellContents)> + '_> {
        match self {
            InventoryPlate::Stock(plate) => Box::new(
                plate
                    .wells
                    .iter()
                    .map(|(address, well)| (address, well as &dyn WellContents)),
            ),
            InventoryPlate::Master(plate) => Box::new(
                plate
                    .wells
                    .iter()
                    .map(|(address, well)| (address, well as &dyn WellContents)),
            ),
        }
    }
}
