pub mod grid;
pub mod lifecycle;
pub mod masters;
pub mod plates;
pub mod stocks;
pub mod well;

pub use grid::{Address, Grid};
pub use lifecycle::{Lifecycle, LifecycleAction};
pub use masters::{Master, NewMaster};
pub use plates::{InventoryPlate, MasterPlate, NewPlateRow, Plate, PlateKind, PlateRow, StockPlate};
pub use stocks::{NewStock, Stock, StockFields};
pub use well::{Compartment, DualWell, Well, WellContents};
