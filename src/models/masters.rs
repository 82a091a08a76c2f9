use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::models::lifecycle::Lifecycle;
use crate::schema::masters;

/// A set of master plates derived from one stock. `species` and `stock_id`
/// are fixed at creation.
#[derive(Queryable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = masters)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Master {
    pub id: i32,
    pub stock_id: i32,
    pub name: String,
    pub species: Option<String>,
    pub volume: f64,
    pub active: bool,
    pub deleted: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = masters)]
pub struct NewMaster {
    pub stock_id: i32,
    pub name: String,
    pub species: Option<String>,
    pub volume: f64,
}

impl Lifecycle for Master {
    fn active_mut(&mut self) -> &mut bool {
        &mut self.active
    }

    fn deleted_mut(&mut self) -> &mut bool {
        &mut self.deleted
    }
}
