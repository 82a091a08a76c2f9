use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};

use crate::models::{
    DualWell, Grid, InventoryPlate, Master, MasterPlate, NewMaster, NewPlateRow, NewStock,
    PlateKind, PlateRow, Stock, StockFields, StockPlate, Well,
};
use crate::repositories::{master, plate, stock, DbPool, PgPoolConn, PlateStore, StoreError};

/// Postgres-backed store. Plate wells live in a JSONB column; `version` is
/// bumped by every successful save.
#[derive(Clone)]
pub struct PgPlateStore {
    pool: DbPool,
}

impl PgPlateStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn connect(database_url: &str) -> Result<Self, StoreError> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = Pool::builder().build(manager)?;
        Ok(Self::new(pool))
    }

    fn conn(&self) -> Result<PgPoolConn, StoreError> {
        Ok(self.pool.get()?)
    }
}

fn found<T>(result: QueryResult<T>, entity: &'static str, id: i32) -> Result<T, StoreError> {
    result.optional()?.ok_or(StoreError::NotFound { entity, id })
}

fn stock_plate(row: PlateRow) -> Result<StockPlate, StoreError> {
    if row.kind != PlateKind::Stock.as_str() {
        return Err(StoreError::NotFound {
            entity: "stock plate",
            id: row.id,
        });
    }
    Ok(row.into_plate()?)
}

fn master_plate(row: PlateRow) -> Result<MasterPlate, StoreError> {
    if row.kind != PlateKind::Master.as_str() {
        return Err(StoreError::NotFound {
            entity: "master plate",
            id: row.id,
        });
    }
    Ok(row.into_plate()?)
}

fn swap(
    conn: &mut PgPoolConn,
    plate_kind: PlateKind,
    plate_id: i32,
    expected: i32,
    wells: &serde_json::Value,
) -> Result<PlateRow, StoreError> {
    let now = Utc::now().naive_utc();
    let kind = plate_kind.as_str();
    match plate::swap_wells(conn, plate_id, kind, expected, wells, now)? {
        Some(row) => Ok(row),
        None if plate::exists(conn, plate_id, kind)? => {
            Err(StoreError::Conflict { plate_id, expected })
        }
        None => Err(StoreError::NotFound {
            entity: match plate_kind {
                PlateKind::Stock => "stock plate",
                PlateKind::Master => "master plate",
            },
            id: plate_id,
        }),
    }
}

impl PlateStore for PgPlateStore {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    fn create_stock(&self, fields: StockFields, wells: Grid<Well>) -> Result<Stock, StoreError> {
        let wells = serde_json::to_value(&wells)?;
        let mut conn = self.conn()?;
        conn.transaction::<Stock, StoreError, _>(|conn| {
            let row = plate::create(
                conn,
                &NewPlateRow {
                    kind: PlateKind::Stock.as_str().to_string(),
                    master_id: None,
                    wells,
                },
            )?;
            Ok(stock::create(conn, &NewStock::new(row.id, fields))?)
        })
    }

    fn load_stock(&self, stock_id: i32) -> Result<Stock, StoreError> {
        let mut conn = self.conn()?;
        found(stock::find_by_id(&mut conn, stock_id), "stock", stock_id)
    }

    fn load_stocks_by_plate(&self, plate_id: i32) -> Result<Vec<Stock>, StoreError> {
        let mut conn = self.conn()?;
        Ok(stock::find_by_plate(&mut conn, plate_id)?)
    }

    fn find_stocks_by_name(&self, name: &str) -> Result<Vec<Stock>, StoreError> {
        let mut conn = self.conn()?;
        Ok(stock::find_by_name(&mut conn, name)?)
    }

    fn list_stocks(&self) -> Result<Vec<Stock>, StoreError> {
        let mut conn = self.conn()?;
        Ok(stock::list_not_deleted(&mut conn)?)
    }

    fn save_stock(&self, updated: &Stock) -> Result<Stock, StoreError> {
        let mut conn = self.conn()?;
        let now = Utc::now().naive_utc();
        found(stock::update(&mut conn, updated, now), "stock", updated.id)
    }

    fn load_stock_plate(&self, plate_id: i32) -> Result<StockPlate, StoreError> {
        let mut conn = self.conn()?;
        stock_plate(found(plate::find_by_id(&mut conn, plate_id), "plate", plate_id)?)
    }

    fn save_stock_plate(&self, updated: &StockPlate) -> Result<StockPlate, StoreError> {
        let wells = serde_json::to_value(&updated.wells)?;
        let mut conn = self.conn()?;
        stock_plate(swap(&mut conn, PlateKind::Stock, updated.id, updated.version, &wells)?)
    }

    fn load_master(&self, master_id: i32) -> Result<Master, StoreError> {
        let mut conn = self.conn()?;
        found(master::find_by_id(&mut conn, master_id), "master", master_id)
    }

    fn load_masters_by_plate(&self, plate_id: i32) -> Result<Vec<Master>, StoreError> {
        let mut conn = self.conn()?;
        let owner = found(plate::find_by_id(&mut conn, plate_id), "plate", plate_id)?.master_id;
        match owner {
            Some(master_id) => Ok(vec![master::find_by_id(&mut conn, master_id)?]),
            None => Ok(Vec::new()),
        }
    }

    fn list_masters(&self) -> Result<Vec<Master>, StoreError> {
        let mut conn = self.conn()?;
        Ok(master::list_not_deleted(&mut conn)?)
    }

    fn save_master(&self, updated: &Master) -> Result<Master, StoreError> {
        let mut conn = self.conn()?;
        let now = Utc::now().naive_utc();
        found(master::update(&mut conn, updated, now), "master", updated.id)
    }

    fn load_master_plates(&self, master_id: i32) -> Result<Vec<MasterPlate>, StoreError> {
        let mut conn = self.conn()?;
        plate::find_by_master(&mut conn, master_id)?
            .into_iter()
            .map(master_plate)
            .collect()
    }

    fn load_master_plate(&self, plate_id: i32) -> Result<MasterPlate, StoreError> {
        let mut conn = self.conn()?;
        master_plate(found(plate::find_by_id(&mut conn, plate_id), "plate", plate_id)?)
    }

    fn save_master_plate(&self, updated: &MasterPlate) -> Result<MasterPlate, StoreError> {
        let wells = serde_json::to_value(&updated.wells)?;
        let mut conn = self.conn()?;
        master_plate(swap(&mut conn, PlateKind::Master, updated.id, updated.version, &wells)?)
    }

    fn commit_master(
        &self,
        source: &StockPlate,
        new_master: NewMaster,
        plates: Vec<Grid<DualWell>>,
    ) -> Result<Master, StoreError> {
        let source_wells = serde_json::to_value(&source.wells)?;
        let plate_wells = plates
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        let mut conn = self.conn()?;
        conn.transaction::<Master, StoreError, _>(|conn| {
            swap(conn, PlateKind::Stock, source.id, source.version, &source_wells)?;
            let created = master::create(conn, &new_master)?;
            for wells in plate_wells {
                plate::create(
                    conn,
                    &NewPlateRow {
                        kind: PlateKind::Master.as_str().to_string(),
                        master_id: Some(created.id),
                        wells,
                    },
                )?;
            }
            Ok(created)
        })
    }

    fn list_plates(&self) -> Result<Vec<InventoryPlate>, StoreError> {
        let mut conn = self.conn()?;
        let stock_plate_ids = stock::list_not_deleted(&mut conn)?
            .into_iter()
            .map(|s| s.plate_id)
            .collect();
        let master_ids = master::list_not_deleted(&mut conn)?
            .into_iter()
            .map(|m| m.id)
            .collect();

        let mut inventory = Vec::new();
        for row in plate::find_by_ids(&mut conn, stock_plate_ids)? {
            inventory.push(InventoryPlate::Stock(stock_plate(row)?));
        }
        for row in plate::find_by_masters(&mut conn, master_ids)? {
            inventory.push(InventoryPlate::Master(master_plate(row)?));
        }
        Ok(inventory)
    }
}
