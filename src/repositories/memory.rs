use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use crate::models::{
    DualWell, Grid, InventoryPlate, Master, MasterPlate, NewMaster, Plate, Stock, StockFields,
    StockPlate, Well,
};
use crate::repositories::{PlateStore, StoreError};

#[derive(Debug, Clone)]
enum StoredPlate {
    Stock(StockPlate),
    Master { master_id: i32, plate: MasterPlate },
}

#[derive(Debug, Default)]
struct MemoryState {
    next_plate_id: i32,
    next_stock_id: i32,
    next_master_id: i32,
    plates: BTreeMap<i32, StoredPlate>,
    stocks: BTreeMap<i32, Stock>,
    masters: BTreeMap<i32, Master>,
}

fn next(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

impl MemoryState {
    fn stock_plate(&self, plate_id: i32) -> Result<&StockPlate, StoreError> {
        match self.plates.get(&plate_id) {
            Some(StoredPlate::Stock(plate)) => Ok(plate),
            _ => Err(StoreError::NotFound {
                entity: "stock plate",
                id: plate_id,
            }),
        }
    }

    fn master_plate(&self, plate_id: i32) -> Result<&MasterPlate, StoreError> {
        match self.plates.get(&plate_id) {
            Some(StoredPlate::Master { plate, .. }) => Ok(plate),
            _ => Err(StoreError::NotFound {
                entity: "master plate",
                id: plate_id,
            }),
        }
    }

    fn check_version(&self, plate_id: i32, expected: i32) -> Result<(), StoreError> {
        let stored = match self.plates.get(&plate_id) {
            Some(StoredPlate::Stock(plate)) => plate.version,
            Some(StoredPlate::Master { plate, .. }) => plate.version,
            None => {
                return Err(StoreError::NotFound {
                    entity: "plate",
                    id: plate_id,
                })
            }
        };
        if stored != expected {
            return Err(StoreError::Conflict { plate_id, expected });
        }
        Ok(())
    }

    fn swap_stock_plate(&mut self, updated: &StockPlate) -> Result<StockPlate, StoreError> {
        self.stock_plate(updated.id)?;
        self.check_version(updated.id, updated.version)?;
        let saved = Plate {
            version: updated.version + 1,
            ..updated.clone()
        };
        self.plates.insert(saved.id, StoredPlate::Stock(saved.clone()));
        Ok(saved)
    }
}

/// In-process store with the same compare-and-swap semantics as the Postgres
/// store. Used when no database is configured and by the test suites.
#[derive(Debug, Default)]
pub struct MemoryPlateStore {
    state: Mutex<MemoryState>,
}

impl MemoryPlateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PlateStore for MemoryPlateStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    fn create_stock(&self, fields: StockFields, wells: Grid<Well>) -> Result<Stock, StoreError> {
        let mut state = self.state();
        let plate_id = next(&mut state.next_plate_id);
        state.plates.insert(
            plate_id,
            StoredPlate::Stock(Plate {
                id: plate_id,
                version: 0,
                wells,
            }),
        );
        let now = Utc::now().naive_utc();
        let stock = Stock {
            id: next(&mut state.next_stock_id),
            plate_id,
            name: fields.name,
            barcode: fields.barcode,
            species: fields.species,
            species_description: fields.species_description,
            optimisation: fields.optimisation,
            plate_type: fields.plate_type,
            active: true,
            deleted: false,
            created_at: now,
            updated_at: now,
        };
        state.stocks.insert(stock.id, stock.clone());
        Ok(stock)
    }

    fn load_stock(&self, stock_id: i32) -> Result<Stock, StoreError> {
        self.state()
            .stocks
            .get(&stock_id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "stock",
                id: stock_id,
            })
    }

    fn load_stocks_by_plate(&self, plate_id: i32) -> Result<Vec<Stock>, StoreError> {
        Ok(self
            .state()
            .stocks
            .values()
            .filter(|s| s.plate_id == plate_id)
            .cloned()
            .collect())
    }

    fn find_stocks_by_name(&self, name: &str) -> Result<Vec<Stock>, StoreError> {
        Ok(self
            .state()
            .stocks
            .values()
            .filter(|s| s.name == name)
            .cloned()
            .collect())
    }

    fn list_stocks(&self) -> Result<Vec<Stock>, StoreError> {
        Ok(self
            .state()
            .stocks
            .values()
            .filter(|s| !s.deleted)
            .cloned()
            .collect())
    }

    fn save_stock(&self, updated: &Stock) -> Result<Stock, StoreError> {
        let mut state = self.state();
        let slot = state.stocks.get_mut(&updated.id).ok_or(StoreError::NotFound {
            entity: "stock",
            id: updated.id,
        })?;
        *slot = Stock {
            id: slot.id,
            plate_id: slot.plate_id,
            created_at: slot.created_at,
            updated_at: Utc::now().naive_utc(),
            ..updated.clone()
        };
        Ok(slot.clone())
    }

    fn load_stock_plate(&self, plate_id: i32) -> Result<StockPlate, StoreError> {
        self.state().stock_plate(plate_id).cloned()
    }

    fn save_stock_plate(&self, plate: &StockPlate) -> Result<StockPlate, StoreError> {
        self.state().swap_stock_plate(plate)
    }

    fn load_master(&self, master_id: i32) -> Result<Master, StoreError> {
        self.state()
            .masters
            .get(&master_id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "master",
                id: master_id,
            })
    }

    fn load_masters_by_plate(&self, plate_id: i32) -> Result<Vec<Master>, StoreError> {
        let state = self.state();
        match state.plates.get(&plate_id) {
            Some(StoredPlate::Master { master_id, .. }) => {
                Ok(state.masters.get(master_id).cloned().into_iter().collect())
            }
            Some(StoredPlate::Stock(_)) => Ok(Vec::new()),
            None => Err(StoreError::NotFound {
                entity: "plate",
                id: plate_id,
            }),
        }
    }

    fn list_masters(&self) -> Result<Vec<Master>, StoreError> {
        Ok(self
            .state()
            .masters
            .values()
            .filter(|m| !m.deleted)
            .cloned()
            .collect())
    }

    fn save_master(&self, updated: &Master) -> Result<Master, StoreError> {
        let mut state = self.state();
        let slot = state.masters.get_mut(&updated.id).ok_or(StoreError::NotFound {
            entity: "master",
            id: updated.id,
        })?;
        slot.name = updated.name.clone();
        slot.active = updated.active;
        slot.deleted = updated.deleted;
        slot.updated_at = Utc::now().naive_utc();
        Ok(slot.clone())
    }

    fn load_master_plates(&self, master_id: i32) -> Result<Vec<MasterPlate>, StoreError> {
        Ok(self
            .state()
            .plates
            .values()
            .filter_map(|stored| match stored {
                StoredPlate::Master { master_id: owner, plate } if *owner == master_id => {
                    Some(plate.clone())
                }
                _ => None,
            })
            .collect())
    }

    fn load_master_plate(&self, plate_id: i32) -> Result<MasterPlate, StoreError> {
        self.state().master_plate(plate_id).cloned()
    }

    fn save_master_plate(&self, updated: &MasterPlate) -> Result<MasterPlate, StoreError> {
        let mut state = self.state();
        let master_id = match state.plates.get(&updated.id) {
            Some(StoredPlate::Master { master_id, .. }) => *master_id,
            _ => {
                return Err(StoreError::NotFound {
                    entity: "master plate",
                    id: updated.id,
                })
            }
        };
        state.check_version(updated.id, updated.version)?;
        let saved = Plate {
            version: updated.version + 1,
            ..updated.clone()
        };
        state.plates.insert(
            saved.id,
            StoredPlate::Master {
                master_id,
                plate: saved.clone(),
            },
        );
        Ok(saved)
    }

    fn commit_master(
        &self,
        source: &StockPlate,
        new_master: NewMaster,
        plates: Vec<Grid<DualWell>>,
    ) -> Result<Master, StoreError> {
        let mut state = self.state();
        state.swap_stock_plate(source)?;

        let now = Utc::now().naive_utc();
        let master = Master {
            id: next(&mut state.next_master_id),
            stock_id: new_master.stock_id,
            name: new_master.name,
            species: new_master.species,
            volume: new_master.volume,
            active: true,
            deleted: false,
            created_at: now,
            updated_at: now,
        };
        for wells in plates {
            let plate_id = next(&mut state.next_plate_id);
            state.plates.insert(
                plate_id,
                StoredPlate::Master {
                    master_id: master.id,
                    plate: Plate {
                        id: plate_id,
                        version: 0,
                        wells,
                    },
                },
            );
        }
        state.masters.insert(master.id, master.clone());
        Ok(master)
    }

    fn list_plates(&self) -> Result<Vec<InventoryPlate>, StoreError> {
        let state = self.state();
        let mut inventory: Vec<InventoryPlate> = state
            .stocks
            .values()
            .filter(|s| !s.deleted)
            .filter_map(|s| state.stock_plate(s.plate_id).ok())
            .cloned()
            .map(InventoryPlate::Stock)
            .collect();
        for stored in state.plates.values() {
            if let StoredPlate::Master { master_id, plate } = stored {
                let live = state.masters.get(master_id).is_some_and(|m| !m.deleted);
                if live {
                    inventory.push(InventoryPlate::Master(plate.clone()));
                }
            }
        }
        Ok(inventory)
    }
}
