use std::collections::BTreeMap;

use crate::models::{
    Address, Grid, Lifecycle, LifecycleAction, Master, Stock, StockFields, StockPlate, Well,
};
use crate::repositories::PlateStore;
use crate::services::error::{retry_on_conflict, PlateError};
use crate::services::inventory_index::InventoryIndex;
use crate::services::Listing;

#[derive(Debug, Clone, PartialEq)]
pub struct StockDetail {
    pub stock: Stock,
    pub plate: StockPlate,
}

/// Live stock and master that own a plate, if any.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlateOwners {
    pub stock: Option<Stock>,
    pub master: Option<Master>,
}

pub struct StockService<'a> {
    store: &'a dyn PlateStore,
    conflict_retries: usize,
}

impl<'a> StockService<'a> {
    pub fn new(store: &'a dyn PlateStore, conflict_retries: usize) -> Self {
        Self {
            store,
            conflict_retries,
        }
    }

    fn live_stock(&self, stock_id: i32) -> Result<Stock, PlateError> {
        let stock = self.store.load_stock(stock_id)?;
        if stock.deleted {
            return Err(PlateError::NotFound {
                entity: "stock",
                id: stock_id,
            });
        }
        Ok(stock)
    }

    fn check_name(&self, name: &str, except: Option<i32>) -> Result<(), PlateError> {
        if name.is_empty() {
            return Err(PlateError::InvalidRequest("stock name is required".into()));
        }
        let taken = self
            .store
            .find_stocks_by_name(name)?
            .iter()
            .any(|s| !s.deleted && Some(s.id) != except);
        if taken {
            return Err(PlateError::InvalidRequest(format!(
                "a stock named {name:?} already exists"
            )));
        }
        Ok(())
    }

    pub fn create(&self, mut fields: StockFields, wells: Grid<Well>) -> Result<Stock, PlateError> {
        fields.name = fields.name.trim().to_string();
        self.check_name(&fields.name, None)?;
        let stock = self.store.create_stock(fields, wells)?;
        tracing::info!("created stock {} ({}) on plate {}", stock.id, stock.name, stock.plate_id);
        Ok(stock)
    }

    pub fn get(&self, stock_id: i32) -> Result<StockDetail, PlateError> {
        let stock = self.live_stock(stock_id)?;
        let plate = self.store.load_stock_plate(stock.plate_id)?;
        Ok(StockDetail { stock, plate })
    }

    pub fn list(&self) -> Result<Listing<Stock>, PlateError> {
        Ok(Listing::split(self.store.list_stocks()?, |s| s.active))
    }

    pub fn apply(&self, stock_id: i32, action: LifecycleAction) -> Result<Stock, PlateError> {
        let mut stock = self.store.load_stock(stock_id)?;
        stock.apply(action);
        let saved = self.store.save_stock(&stock)?;
        tracing::info!("stock {} {:?}", stock_id, action);
        Ok(saved)
    }

    /// Replaces the descriptive fields (when given) and overwrites the edited
    /// wells. Wells not named in `edits` keep their stored contents, so
    /// concurrent withdrawals on other wells are not lost.
    ///
    /// The plate is written before the stock record, so a failed plate save
    /// leaves the fields untouched as well.
    pub fn update(
        &self,
        stock_id: i32,
        fields: Option<StockFields>,
        edits: BTreeMap<Address, Well>,
    ) -> Result<StockDetail, PlateError> {
        let mut stock = self.live_stock(stock_id)?;
        let fields = match fields {
            Some(mut fields) => {
                fields.name = fields.name.trim().to_string();
                self.check_name(&fields.name, Some(stock_id))?;
                Some(fields)
            }
            None => None,
        };

        let plate = if edits.is_empty() {
            self.store.load_stock_plate(stock.plate_id)?
        } else {
            retry_on_conflict(self.conflict_retries, || {
                let mut plate = self.store.load_stock_plate(stock.plate_id)?;
                for (address, well) in &edits {
                    plate.wells[*address] = well.clone();
                }
                Ok(self.store.save_stock_plate(&plate)?)
            })?
        };
        if let Some(fields) = fields {
            stock.apply_fields(fields);
            stock = self.store.save_stock(&stock)?;
        }
        tracing::info!("saved stock {} ({} wells edited)", stock_id, edits.len());
        Ok(StockDetail { stock, plate })
    }

    /// True when no live stock uses `name`.
    pub fn name_available(&self, name: &str) -> Result<bool, PlateError> {
        Ok(self
            .store
            .find_stocks_by_name(name.trim())?
            .iter()
            .all(|s| s.deleted))
    }

    /// The submitted FRs that already sit on a live plate.
    pub fn frs_in_use(&self, frs: &[String]) -> Result<Vec<String>, PlateError> {
        let index = InventoryIndex::snapshot(self.store)?;
        Ok(index.frs_in_use(frs).into_iter().cloned().collect())
    }

    pub fn plate_owners(&self, plate_id: i32) -> Result<PlateOwners, PlateError> {
        let stock = self
            .store
            .load_stocks_by_plate(plate_id)?
            .into_iter()
            .find(|s| !s.deleted);
        let master = self
            .store
            .load_masters_by_plate(plate_id)?
            .into_iter()
            .find(|m| !m.deleted);
        Ok(PlateOwners { stock, master })
    }
}
