pub mod inventory;
pub mod master;
pub mod plate;
pub mod stock;
