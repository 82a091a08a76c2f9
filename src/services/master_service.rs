use crate::models::{
    Lifecycle, LifecycleAction, Master, MasterPlate, NewMaster, Stock, StockPlate, WellContents,
};
use crate::repositories::PlateStore;
use crate::services::error::{retry_on_conflict, PlateError};
use crate::services::layout::{LayoutStrategy, SourceItem};
use crate::services::master_deriver::{derive_master_plate, Orientation};
use crate::services::slot_planner::destination_slots;
use crate::services::volume_ledger::{apply_withdrawal, withdrawal_amount};
use crate::services::Listing;

/// Upper bound on copies of one master plate per request.
pub const MAX_PLATE_COUNT: usize = 50;

/// Everything needed to derive a master from one stock plate.
#[derive(Debug, Clone)]
pub struct MasterRequest {
    pub plate_id: i32,
    /// Wells picked by the operator. `None` takes every occupied well of the
    /// source plate in address order.
    pub items: Option<Vec<SourceItem>>,
    pub dose: f64,
    pub replicates: usize,
    pub plate_count: usize,
    pub strategy: LayoutStrategy,
    pub orientation: Orientation,
    pub name: String,
}

impl MasterRequest {
    fn validate(&self) -> Result<(), PlateError> {
        if self.name.trim().is_empty() {
            return Err(PlateError::InvalidRequest("master name is required".into()));
        }
        if self.plate_count == 0 {
            return Err(PlateError::InvalidRequest(
                "a master needs at least one plate".into(),
            ));
        }
        if self.plate_count > MAX_PLATE_COUNT {
            return Err(PlateError::InvalidRequest(format!(
                "a master has at most {MAX_PLATE_COUNT} plates, got {}",
                self.plate_count
            )));
        }
        if !self.dose.is_finite() || self.dose <= 0.0 {
            return Err(PlateError::InvalidRequest(format!(
                "dose must be a positive number, got {}",
                self.dose
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MasterDetail {
    pub master: Master,
    pub plates: Vec<MasterPlate>,
}

/// Occupied wells of a stock plate as layout input, in address order.
pub fn source_items(plate: &StockPlate) -> Vec<SourceItem> {
    plate
        .wells
        .iter()
        .filter_map(|(_, well)| {
            well.fr().map(|fr| SourceItem {
                fr: fr.to_string(),
                ec: well.ec().map(str::to_string),
                volume: well.volume,
            })
        })
        .collect()
}

/// Looks up each picked FR on the source plate. EC and volume come from the
/// plate, so a pick can only name a compound the plate actually holds.
pub fn resolve_items(
    plate: &StockPlate,
    picked: &[SourceItem],
) -> Result<Vec<SourceItem>, PlateError> {
    picked
        .iter()
        .map(|pick| {
            let fr = pick.fr.trim();
            if fr.is_empty() {
                return Err(PlateError::InvalidRequest("picked well has no FR".into()));
            }
            plate
                .wells
                .iter()
                .find(|(_, well)| well.fr() == Some(fr))
                .map(|(_, well)| SourceItem {
                    fr: fr.to_string(),
                    ec: well.ec().map(str::to_string),
                    volume: well.volume,
                })
                .ok_or_else(|| {
                    PlateError::InvalidRequest(format!("{fr} is not on plate {}", plate.id))
                })
        })
        .collect()
}

pub struct MasterService<'a> {
    store: &'a dyn PlateStore,
    conflict_retries: usize,
}

impl<'a> MasterService<'a> {
    pub fn new(store: &'a dyn PlateStore, conflict_retries: usize) -> Self {
        Self {
            store,
            conflict_retries,
        }
    }

    fn owning_stock(&self, plate_id: i32) -> Result<Stock, PlateError> {
        self.store
            .load_stocks_by_plate(plate_id)?
            .into_iter()
            .find(|stock| !stock.deleted)
            .ok_or(PlateError::NotFound {
                entity: "stock plate",
                id: plate_id,
            })
    }

    /// Derives the master plates, withdraws their volume from the source plate
    /// and commits both together. A lost race on the source plate reruns the
    /// whole derivation against fresh volumes.
    pub fn create_master(&self, request: &MasterRequest) -> Result<Master, PlateError> {
        request.validate()?;
        let slots = destination_slots(request.replicates)?;

        retry_on_conflict(self.conflict_retries, || {
            let stock = self.owning_stock(request.plate_id)?;
            let mut source = self.store.load_stock_plate(request.plate_id)?;

            let items = match &request.items {
                Some(picked) => resolve_items(&source, picked)?,
                None => source_items(&source),
            };
            if items.is_empty() {
                return Err(PlateError::InvalidRequest(
                    "no source wells were selected".into(),
                ));
            }

            let ordered = request.strategy.arrange(&items)?;
            let derivation = derive_master_plate(
                &ordered,
                &slots,
                request.replicates,
                request.orientation,
                request.dose,
            )?;
            if derivation.dropped_items > 0 {
                tracing::warn!(
                    "plate {} has room for {} of {} items, dropping the rest",
                    request.plate_id,
                    derivation.placed_items,
                    ordered.len()
                );
            }

            let amount = withdrawal_amount(request.dose, request.replicates, request.plate_count);
            apply_withdrawal(&mut source, &derivation.placed_frs, amount)?;

            let new_master = NewMaster {
                stock_id: stock.id,
                name: request.name.trim().to_string(),
                species: stock.species.clone(),
                volume: request.dose,
            };
            let plates = vec![derivation.wells; request.plate_count];
            let master = self.store.commit_master(&source, new_master, plates)?;
            tracing::info!(
                "created master {} from plate {} ({} frs, {} plates, {} withdrawn each)",
                master.id,
                request.plate_id,
                derivation.placed_frs.len(),
                request.plate_count,
                amount
            );
            Ok(master)
        })
    }

    pub fn get(&self, master_id: i32) -> Result<MasterDetail, PlateError> {
        let master = self.store.load_master(master_id)?;
        if master.deleted {
            return Err(PlateError::NotFound {
                entity: "master",
                id: master_id,
            });
        }
        let plates = self.store.load_master_plates(master_id)?;
        Ok(MasterDetail { master, plates })
    }

    pub fn list(&self) -> Result<Listing<Master>, PlateError> {
        Ok(Listing::split(self.store.list_masters()?, |m| m.active))
    }

    pub fn apply(&self, master_id: i32, action: LifecycleAction) -> Result<Master, PlateError> {
        let mut master = self.store.load_master(master_id)?;
        master.apply(action);
        let saved = self.store.save_master(&master)?;
        tracing::info!("master {} {:?}", master_id, action);
        Ok(saved)
    }

    /// The live master owning a master plate.
    pub fn owner_of_plate(&self, plate_id: i32) -> Result<Master, PlateError> {
        self.store
            .load_masters_by_plate(plate_id)?
            .into_iter()
            .find(|master| !master.deleted)
            .ok_or(PlateError::NotFound {
                entity: "master plate",
                id: plate_id,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Address, Grid, StockFields, Well};
    use crate::repositories::MemoryPlateStore;

    fn seeded(store: &MemoryPlateStore) -> Stock {
        let wells: Grid<Well> = (1..=4)
            .map(|i| (Address::ALL[i - 1], Well::new(format!("fr{i}"), format!("EC{i}"), 20.0)))
            .collect();
        store
            .create_stock(
                StockFields {
                    name: "stock".into(),
                    species: Some("yeast".into()),
                    ..StockFields::default()
                },
                wells,
            )
            .unwrap()
    }

    fn request(plate_id: i32) -> MasterRequest {
        MasterRequest {
            plate_id,
            items: None,
            dose: 1.0,
            replicates: 2,
            plate_count: 2,
            strategy: LayoutStrategy::DescendingFr,
            orientation: Orientation::Horizontally,
            name: "m1".into(),
        }
    }

    #[test]
    fn missing_items_take_the_whole_plate() {
        let store = MemoryPlateStore::new();
        let stock = seeded(&store);
        let service = MasterService::new(&store, 3);
        let master = service.create_master(&request(stock.plate_id)).unwrap();
        assert_eq!(master.species.as_deref(), Some("yeast"));
        assert_eq!(master.stock_id, stock.id);

        let detail = service.get(master.id).unwrap();
        assert_eq!(detail.plates.len(), 2);
        assert_eq!(detail.plates[0].wells, detail.plates[1].wells);
        let first = destination_slots(2).unwrap()[0];
        assert_eq!(detail.plates[0].wells[first].fr.as_deref(), Some("fr4"));

        let source = store.load_stock_plate(stock.plate_id).unwrap();
        for i in 0..4 {
            assert_eq!(source.wells[Address::ALL[i]].volume, 16.0);
        }
    }

    #[test]
    fn invalid_requests_touch_nothing() {
        let store = MemoryPlateStore::new();
        let stock = seeded(&store);
        let service = MasterService::new(&store, 3);

        let mut bad = request(stock.plate_id);
        bad.plate_count = 0;
        assert!(matches!(service.create_master(&bad), Err(PlateError::InvalidRequest(_))));
        let mut bad = request(stock.plate_id);
        bad.replicates = 13;
        assert!(matches!(
            service.create_master(&bad),
            Err(PlateError::InvalidReplicateCount(13))
        ));
        assert!(matches!(
            service.create_master(&request(999)),
            Err(PlateError::NotFound { .. })
        ));
        assert!(store.list_masters().unwrap().is_empty());
        assert_eq!(store.load_stock_plate(stock.plate_id).unwrap().version, 0);
    }

    #[test]
    fn plate_count_is_capped() {
        let store = MemoryPlateStore::new();
        let stock = seeded(&store);
        let service = MasterService::new(&store, 3);

        let mut bad = request(stock.plate_id);
        bad.dose = 1e-9;
        bad.plate_count = 1_000_000;
        assert!(matches!(service.create_master(&bad), Err(PlateError::InvalidRequest(_))));
        assert!(store.list_masters().unwrap().is_empty());

        let mut most = request(stock.plate_id);
        most.dose = 0.1;
        most.plate_count = MAX_PLATE_COUNT;
        let master = service.create_master(&most).unwrap();
        assert_eq!(service.get(master.id).unwrap().plates.len(), MAX_PLATE_COUNT);
    }

    #[test]
    fn picks_take_ec_and_volume_from_the_plate() {
        let store = MemoryPlateStore::new();
        let stock = seeded(&store);
        let source = store.load_stock_plate(stock.plate_id).unwrap();

        let resolved = resolve_items(&source, &[SourceItem::new(" fr2 ", "WRONG", 99.0)]).unwrap();
        assert_eq!(resolved, vec![SourceItem::new("fr2", "EC2", 20.0)]);

        for pick in [SourceItem::new("fr9", "EC9", 1.0), SourceItem::new("  ", "EC1", 1.0)] {
            assert!(matches!(
                resolve_items(&source, &[pick]),
                Err(PlateError::InvalidRequest(_))
            ));
        }
    }

    #[test]
    fn deleted_masters_leave_listings_and_lookups() {
        let store = MemoryPlateStore::new();
        let stock = seeded(&store);
        let service = MasterService::new(&store, 3);
        let master = service.create_master(&request(stock.plate_id)).unwrap();
        let plate_id = service.get(master.id).unwrap().plates[0].id;
        assert_eq!(service.owner_of_plate(plate_id).unwrap().id, master.id);

        service.apply(master.id, LifecycleAction::Retire).unwrap();
        let listing = service.list().unwrap();
        assert!(listing.active.is_empty());
        assert_eq!(listing.retired.len(), 1);

        service.apply(master.id, LifecycleAction::Delete).unwrap();
        let after = service.apply(master.id, LifecycleAction::Activate).unwrap();
        assert!(after.deleted);
        assert!(service.list().unwrap().retired.is_empty());
        assert!(matches!(service.get(master.id), Err(PlateError::NotFound { .. })));
        assert!(service.owner_of_plate(plate_id).is_err());
    }
}
