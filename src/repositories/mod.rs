use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use thiserror::Error;

use crate::models::{
    DualWell, Grid, InventoryPlate, Master, MasterPlate, NewMaster, Stock, StockFields, StockPlate,
    Well,
};

pub mod master;
pub mod memory;
pub mod pg_store;
pub mod plate;
pub mod stock;

pub use memory::MemoryPlateStore;
pub use pg_store::PgPlateStore;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;
pub type PgPoolConn = PooledConnection<ConnectionManager<PgConnection>>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },
    #[error("plate {plate_id} changed since version {expected}")]
    Conflict { plate_id: i32, expected: i32 },
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    #[error("stored wells are malformed: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Durable storage for stocks, masters and their plates.
///
/// Plate saves are compare-and-swap on `Plate::version`: a save whose version
/// no longer matches the stored one fails with `StoreError::Conflict` and
/// writes nothing. A successful save returns the plate with its new version.
pub trait PlateStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    fn create_stock(&self, fields: StockFields, wells: Grid<Well>) -> Result<Stock, StoreError>;
    fn load_stock(&self, stock_id: i32) -> Result<Stock, StoreError>;
    fn load_stocks_by_plate(&self, plate_id: i32) -> Result<Vec<Stock>, StoreError>;
    fn find_stocks_by_name(&self, name: &str) -> Result<Vec<Stock>, StoreError>;
    /// Every stock not soft-deleted, oldest first.
    fn list_stocks(&self) -> Result<Vec<Stock>, StoreError>;
    fn save_stock(&self, stock: &Stock) -> Result<Stock, StoreError>;

    fn load_stock_plate(&self, plate_id: i32) -> Result<StockPlate, StoreError>;
    fn save_stock_plate(&self, plate: &StockPlate) -> Result<StockPlate, StoreError>;

    fn load_master(&self, master_id: i32) -> Result<Master, StoreError>;
    fn load_masters_by_plate(&self, plate_id: i32) -> Result<Vec<Master>, StoreError>;
    /// Every master not soft-deleted, oldest first.
    fn list_masters(&self) -> Result<Vec<Master>, StoreError>;
    fn save_master(&self, master: &Master) -> Result<Master, StoreError>;
    fn load_master_plates(&self, master_id: i32) -> Result<Vec<MasterPlate>, StoreError>;
    fn load_master_plate(&self, plate_id: i32) -> Result<MasterPlate, StoreError>;
    fn save_master_plate(&self, plate: &MasterPlate) -> Result<MasterPlate, StoreError>;

    /// Saves the withdrawn source plate, inserts the master and all of its
    /// plates as one unit. Nothing is written if any step fails.
    fn commit_master(
        &self,
        source: &StockPlate,
        new_master: NewMaster,
        plates: Vec<Grid<DualWell>>,
    ) -> Result<Master, StoreError>;

    /// Plates of non-deleted stocks followed by plates of non-deleted masters.
    fn list_plates(&self) -> Result<Vec<InventoryPlate>, StoreError>;
}
