pub mod error;
pub mod inventory_index;
pub mod layout;
pub mod master_deriver;
pub mod master_service;
pub mod slot_planner;
pub mod stock_service;
pub mod volume_ledger;

pub use error::PlateError;
pub use inventory_index::{EcGroup, FrEntry, InventoryIndex, SearchHit};
pub use layout::{LayoutStrategy, SourceItem};
pub use master_deriver::Orientation;
pub use master_service::{MasterDetail, MasterRequest, MasterService};
pub use stock_service::{PlateOwners, StockDetail, StockService};
pub use volume_ledger::VolumeLedger;

/// Non-deleted records split by their `active` flag, order preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    pub active: Vec<T>,
    pub retired: Vec<T>,
}

impl<T> Listing<T> {
    pub fn split(items: Vec<T>, is_active: impl Fn(&T) -> bool) -> Self {
        let (active, retired): (Vec<T>, Vec<T>) = items.into_iter().partition(|item| is_active(item));
        Self { active, retired }
    }
}
