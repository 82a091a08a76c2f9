use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::models::lifecycle::Lifecycle;
use crate::schema::stocks;

#[derive(Queryable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = stocks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Stock {
    pub id: i32,
    pub plate_id: i32,
    pub name: String,
    pub barcode: Option<String>,
    pub species: Option<String>,
    pub species_description: Option<String>,
    pub optimisation: Option<String>,
    pub plate_type: Option<String>,
    pub active: bool,
    pub deleted: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Operator-editable descriptive fields of a stock.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StockFields {
    pub name: String,
    pub barcode: Option<String>,
    pub species: Option<String>,
    pub species_description: Option<String>,
    pub optimisation: Option<String>,
    pub plate_type: Option<String>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = stocks)]
pub struct NewStock {
    pub plate_id: i32,
    pub name: String,
    pub barcode: Option<String>,
    pub species: Option<String>,
    pub species_description: Option<String>,
    pub optimisation: Option<String>,
    pub plate_type: Option<String>,
}

impl NewStock {
    pub fn new(plate_id: i32, fields: StockFields) -> Self {
        Self {
            plate_id,
            name: fields.name,
            barcode: fields.barcode,
            species: fields.species,
            species_description: fields.species_description,
            optimisation: fields.optimisation,
            plate_type: fields.plate_type,
        }
    }
}

impl Stock {
    pub fn apply_fields(&mut self, fields: StockFields) {
        self.name = fields.name;
        self.barcode = fields.barcode;
        self.species = fields.species;
        self.species_description = fields.species_description;
        self.optimisation = fields.optimisation;
        self.plate_type = fields.plate_type;
    }

    pub fn fields(&self) -> StockFields {
        StockFields {
            name: self.name.clone(),
            barcode: self.barcode.clone(),
            species: self.species.clone(),
            species_description: self.species_description.clone(),
            optimisation: self.optimisation.clone(),
            plate_type: self.plate_type.clone(),
        }
    }
}

impl Lifecycle for Stock {
    fn active_mut(&mut self) -> &mut bool {
        &mut self.active
    }

    fn deleted_mut(&mut self) -> &mut bool {
        &mut self.deleted
    }
}
