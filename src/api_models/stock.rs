use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::{Address, Grid, Stock, StockFields, StockPlate, Well};
use crate::services::{Listing, PlateError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStockPayload {
    #[serde(default)]
    pub name: String,
    pub barcode: Option<String>,
    pub species: Option<String>,
    pub species_description: Option<String>,
    pub optimisation: Option<String>,
    #[serde(rename = "type")]
    pub plate_type: Option<String>,
    #[serde(default)]
    pub plate: Grid<Well>,
}

impl NewStockPayload {
    pub fn into_parts(self) -> (StockFields, Grid<Well>) {
        let fields = StockFields {
            name: self.name,
            barcode: self.barcode,
            species: self.species,
            species_description: self.species_description,
            optimisation: self.optimisation,
            plate_type: self.plate_type,
        };
        (fields, self.plate)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateStockRequest {
    pub stock: NewStockPayload,
}

/// Edited stock as sent back by the plate editor. The plate map may carry
/// bookkeeping keys next to the well labels; only well labels are applied.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditedStockPayload {
    pub name: Option<String>,
    pub barcode: Option<String>,
    pub species: Option<String>,
    pub species_description: Option<String>,
    pub optimisation: Option<String>,
    #[serde(rename = "type")]
    pub plate_type: Option<String>,
    #[serde(default)]
    pub plate: serde_json::Map<String, serde_json::Value>,
}

impl EditedStockPayload {
    /// Descriptive fields, only when the editor sent a name along.
    pub fn fields(&self) -> Option<StockFields> {
        self.name.as_ref().map(|name| StockFields {
            name: name.clone(),
            barcode: self.barcode.clone(),
            species: self.species.clone(),
            species_description: self.species_description.clone(),
            optimisation: self.optimisation.clone(),
            plate_type: self.plate_type.clone(),
        })
    }

    pub fn well_edits(&self) -> Result<BTreeMap<Address, Well>, PlateError> {
        let mut edits = BTreeMap::new();
        for (key, value) in &self.plate {
            if key.starts_with('_') || value.is_null() {
                continue;
            }
            let Ok(address) = key.parse::<Address>() else {
                continue;
            };
            let well: Well = serde_json::from_value(value.clone())
                .map_err(|e| PlateError::InvalidRequest(format!("well {key}: {e}")))?;
            edits.insert(address, well);
        }
        Ok(edits)
    }
}

#[derive(Debug, Deserialize)]
pub struct SaveStockRequest {
    pub stock: EditedStockPayload,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockResponse {
    pub id: i32,
    pub plate_id: i32,
    pub name: String,
    pub barcode: Option<String>,
    pub species: Option<String>,
    pub species_description: Option<String>,
    pub optimisation: Option<String>,
    #[serde(rename = "type")]
    pub plate_type: Option<String>,
    pub active: bool,
    pub deleted: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plate: Option<StockPlate>,
}

impl From<Stock> for StockResponse {
    fn from(stock: Stock) -> Self {
        Self {
            id: stock.id,
            plate_id: stock.plate_id,
            name: stock.name,
            barcode: stock.barcode,
            species: stock.species,
            species_description: stock.species_description,
            optimisation: stock.optimisation,
            plate_type: stock.plate_type,
            active: stock.active,
            deleted: stock.deleted,
            created_at: stock.created_at,
            updated_at: stock.updated_at,
            plate: None,
        }
    }
}

impl StockResponse {
    pub fn with_plate(stock: Stock, plate: StockPlate) -> Self {
        Self {
            plate: Some(plate),
            ..Self::from(stock)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StockEnvelope {
    pub stock: StockResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockListResponse {
    pub stocks_active: Vec<StockResponse>,
    pub stocks_retired: Vec<StockResponse>,
}

impl From<Listing<Stock>> for StockListResponse {
    fn from(listing: Listing<Stock>) -> Self {
        Self {
            stocks_active: listing.active.into_iter().map(StockResponse::from).collect(),
            stocks_retired: listing.retired.into_iter().map(StockResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ActiveResponse {
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct NameCheckRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct NameCheckResponse {
    pub ok: bool,
}

/// A submitted FR, echoed back untouched when it is already in use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrCheckItem {
    pub fr: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct FrCheckRequest {
    pub frs: Option<Vec<FrCheckItem>>,
}

#[derive(Debug, Serialize)]
pub struct FrCheckResponse {
    pub frs: Vec<FrCheckItem>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn editor_bookkeeping_keys_are_ignored() {
        let payload: SaveStockRequest = serde_json::from_value(json!({
            "stock": {
                "plate": {
                    "_id": "abc",
                    "__v": 3,
                    "createdAt": "yesterday",
                    "a1": {"fr": "FR1", "ec": "EC1", "volume": 4.5},
                    "b2": null
                }
            }
        }))
        .unwrap();
        let edits = payload.stock.well_edits().unwrap();
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[&"a1".parse::<Address>().unwrap()].volume, 4.5);
        assert!(payload.stock.fields().is_none());
    }

    #[test]
    fn new_stock_reads_type_and_camel_case() {
        let payload: CreateStockRequest = serde_json::from_value(json!({
            "stock": {
                "name": "S1",
                "speciesDescription": "bakers yeast",
                "type": "deep well",
                "plate": {"h12": {"fr": "FR9", "volume": 1}}
            }
        }))
        .unwrap();
        let (fields, plate) = payload.stock.into_parts();
        assert_eq!(fields.species_description.as_deref(), Some("bakers yeast"));
        assert_eq!(fields.plate_type.as_deref(), Some("deep well"));
        assert_eq!(plate["h12".parse::<Address>().unwrap()].volume, 1.0);
    }
}
