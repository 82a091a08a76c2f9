use crate::models::grid::Address;
use crate::models::well::WellContents;
use crate::models::{MasterPlate, StockPlate};
use crate::repositories::PlateStore;
use crate::services::error::{retry_on_conflict, PlateError};

/// Results this close below zero are floating-point residue and settle to zero.
pub const VOLUME_EPSILON: f64 = 1e-9;

fn validate_amount(amount: f64) -> Result<(), PlateError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(PlateError::InvalidRequest(format!(
            "withdrawal volume must be a non-negative number, got {amount}"
        )));
    }
    Ok(())
}

fn ensure_available(
    plate_id: i32,
    address: Address,
    available: f64,
    requested: f64,
) -> Result<(), PlateError> {
    if available - requested < -VOLUME_EPSILON {
        return Err(PlateError::InsufficientVolume {
            plate_id,
            address,
            available,
            requested,
        });
    }
    Ok(())
}

fn settle(volume: f64) -> f64 {
    if volume < 0.0 {
        0.0
    } else {
        volume
    }
}

/// Takes `amount` from every well whose FR is in `consumed_frs`.
///
/// All qualifying wells are checked before any is touched: on
/// `InsufficientVolume` the plate is left exactly as it was. Returns the
/// number of wells debited.
pub fn apply_withdrawal(
    plate: &mut StockPlate,
    consumed_frs: &[String],
    amount: f64,
) -> Result<usize, PlateError> {
    validate_amount(amount)?;
    let targets: Vec<Address> = plate
        .wells
        .iter()
        .filter(|(_, well)| {
            well.fr()
                .is_some_and(|fr| consumed_frs.iter().any(|c| c == fr))
        })
        .map(|(address, _)| address)
        .collect();

    for &address in &targets {
        ensure_available(plate.id, address, plate.wells[address].volume, amount)?;
    }
    for &address in &targets {
        let well = &mut plate.wells[address];
        well.volume = settle(well.volume - amount);
    }
    Ok(targets.len())
}

/// Manual withdrawal of `amount` from every occupied well of a stock plate.
pub fn apply_uniform_withdrawal(plate: &mut StockPlate, amount: f64) -> Result<usize, PlateError> {
    validate_amount(amount)?;
    let targets: Vec<Address> = plate
        .wells
        .iter()
        .filter(|(_, well)| well.is_occupied())
        .map(|(address, _)| address)
        .collect();

    for &address in &targets {
        ensure_available(plate.id, address, plate.wells[address].volume, amount)?;
    }
    for &address in &targets {
        let well = &mut plate.wells[address];
        well.volume = settle(well.volume - amount);
    }
    Ok(targets.len())
}

/// Takes `amount` from both compartments of every occupied master-plate well.
pub fn apply_master_plate_withdrawal(
    plate: &mut MasterPlate,
    amount: f64,
) -> Result<usize, PlateError> {
    validate_amount(amount)?;
    let targets: Vec<Address> = plate
        .wells
        .iter()
        .filter(|(_, well)| well.is_occupied())
        .map(|(address, _)| address)
        .collect();

    for &address in &targets {
        let well = &plate.wells[address];
        let available = well.upper.volume.min(well.lower.volume);
        ensure_available(plate.id, address, available, amount)?;
    }
    for &address in &targets {
        let well = &mut plate.wells[address];
        well.upper.volume = settle(well.upper.volume - amount);
        well.lower.volume = settle(well.lower.volume - amount);
    }
    Ok(targets.len())
}

/// Volume drawn from each consumed source well by a master of `plate_count`
/// plates.
pub fn withdrawal_amount(dose: f64, replicates: usize, plate_count: usize) -> f64 {
    dose * replicates as f64 * plate_count as f64
}

/// Store-backed withdrawals. Each call reloads the plate, applies the
/// withdrawal and saves it with compare-and-swap, retrying lost races.
pub struct VolumeLedger<'a> {
    store: &'a dyn PlateStore,
    conflict_retries: usize,
}

impl<'a> VolumeLedger<'a> {
    pub fn new(store: &'a dyn PlateStore, conflict_retries: usize) -> Self {
        Self {
            store,
            conflict_retries,
        }
    }

    pub fn withdraw(
        &self,
        plate_id: i32,
        consumed_frs: &[String],
        amount: f64,
    ) -> Result<StockPlate, PlateError> {
        retry_on_conflict(self.conflict_retries, || {
            let mut plate = self.store.load_stock_plate(plate_id)?;
            let touched = apply_withdrawal(&mut plate, consumed_frs, amount)?;
            let saved = self.store.save_stock_plate(&plate)?;
            tracing::info!(
                "withdrew {} from {} wells of plate {}",
                amount,
                touched,
                plate_id
            );
            Ok(saved)
        })
    }

    pub fn withdraw_uniform(&self, plate_id: i32, amount: f64) -> Result<StockPlate, PlateError> {
        retry_on_conflict(self.conflict_retries, || {
            let mut plate = self.store.load_stock_plate(plate_id)?;
            let touched = apply_uniform_withdrawal(&mut plate, amount)?;
            let saved = self.store.save_stock_plate(&plate)?;
            tracing::info!(
                "manual withdrawal of {} from {} wells of plate {}",
                amount,
                touched,
                plate_id
            );
            Ok(saved)
        })
    }

    pub fn withdraw_master_plate(
        &self,
        plate_id: i32,
        amount: f64,
    ) -> Result<MasterPlate, PlateError> {
        retry_on_conflict(self.conflict_retries, || {
            let mut plate = self.store.load_master_plate(plate_id)?;
            let touched = apply_master_plate_withdrawal(&mut plate, amount)?;
            let saved = self.store.save_master_plate(&plate)?;
            tracing::info!(
                "withdrew {} from {} master wells of plate {}",
                amount,
                touched,
                plate_id
            );
            Ok(saved)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DualWell, Grid, Plate, StockFields, Well};
    use crate::repositories::MemoryPlateStore;

    fn at(label: &str) -> Address {
        label.parse().unwrap()
    }

    fn source() -> StockPlate {
        let mut wells = Grid::<Well>::default();
        wells[at("a1")] = Well::new("FR1", "EC1", 10.0);
        wells[at("a2")] = Well::new("FR1", "EC1", 4.0);
        wells[at("a3")] = Well::new("FR2", "EC1", 10.0);
        wells[at("a4")] = Well::new("FR3", "EC2", 1.0);
        Plate {
            id: 1,
            version: 0,
            wells,
        }
    }

    #[test]
    fn only_matching_frs_are_debited() {
        let mut plate = source();
        let touched = apply_withdrawal(&mut plate, &["FR1".to_string()], 3.0).unwrap();
        assert_eq!(touched, 2);
        assert_eq!(plate.wells[at("a1")].volume, 7.0);
        assert_eq!(plate.wells[at("a2")].volume, 1.0);
        // same EC, different FR
        assert_eq!(plate.wells[at("a3")].volume, 10.0);
        assert_eq!(plate.wells[at("b1")].volume, 0.0);
    }

    #[test]
    fn shortfall_rejects_the_whole_withdrawal() {
        let mut plate = source();
        let before = plate.clone();
        let err = apply_withdrawal(&mut plate, &["FR1".into(), "FR2".into()], 5.0).unwrap_err();
        match err {
            PlateError::InsufficientVolume {
                address, available, ..
            } => {
                assert_eq!(address, at("a2"));
                assert_eq!(available, 4.0);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(plate, before);
    }

    #[test]
    fn exact_drain_reaches_zero() {
        let mut plate = source();
        apply_withdrawal(&mut plate, &["FR3".into()], 1.0).unwrap();
        assert_eq!(plate.wells[at("a4")].volume, 0.0);

        let mut plate = source();
        plate.wells[at("a4")].volume = 0.3;
        apply_withdrawal(&mut plate, &["FR3".into()], 0.1 + 0.2).unwrap();
        assert!(plate.wells[at("a4")].volume >= 0.0);
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let mut plate = source();
        assert!(matches!(
            apply_withdrawal(&mut plate, &["FR1".into()], -1.0),
            Err(PlateError::InvalidRequest(_))
        ));
        assert!(apply_uniform_withdrawal(&mut plate, f64::NAN).is_err());
    }

    #[test]
    fn uniform_withdrawal_skips_empty_wells() {
        let mut plate = source();
        let touched = apply_uniform_withdrawal(&mut plate, 1.0).unwrap();
        assert_eq!(touched, 4);
        assert_eq!(plate.wells[at("a4")].volume, 0.0);
        assert_eq!(plate.wells[at("h12")].volume, 0.0);
    }

    #[test]
    fn master_wells_lose_volume_in_both_compartments() {
        let mut wells = Grid::<DualWell>::default();
        wells[at("c1")] = DualWell::dosed("FR1", None, 2.0);
        let mut plate = Plate {
            id: 5,
            version: 0,
            wells,
        };
        apply_master_plate_withdrawal(&mut plate, 0.5).unwrap();
        assert_eq!(plate.wells[at("c1")].upper.volume, 1.5);
        assert_eq!(plate.wells[at("c1")].lower.volume, 1.5);
        assert!(apply_master_plate_withdrawal(&mut plate, 2.0).is_err());
        assert_eq!(plate.wells[at("c1")].upper.volume, 1.5);
    }

    #[test]
    fn repeated_withdrawal_is_refused_once_it_would_go_negative() {
        let store = MemoryPlateStore::new();
        let mut wells = Grid::<Well>::default();
        wells[at("a1")] = Well::new("FR1", "EC1", 10.0);
        let stock = store
            .create_stock(
                StockFields {
                    name: "s".into(),
                    ..StockFields::default()
                },
                wells,
            )
            .unwrap();
        let ledger = VolumeLedger::new(&store, 3);
        let frs = vec!["FR1".to_string()];

        let first = ledger.withdraw(stock.plate_id, &frs, 6.0).unwrap();
        assert_eq!(first.wells[at("a1")].volume, 4.0);
        assert!(matches!(
            ledger.withdraw(stock.plate_id, &frs, 6.0),
            Err(PlateError::InsufficientVolume { .. })
        ));
        let stored = store.load_stock_plate(stock.plate_id).unwrap();
        assert_eq!(stored.wells[at("a1")].volume, 4.0);
        assert_eq!(stored.version, 1);
    }
}
