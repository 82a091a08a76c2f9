use crate::models::grid::{Address, COLUMNS, ROWS};
use crate::services::error::PlateError;

/// Leading replicate groups left empty at the start of every master plate.
pub const RESERVED_GROUPS: usize = 2;

/// Number of full column groups of width `replicates`. Columns that do not fill
/// a whole group are left unused.
pub fn column_groups(replicates: usize) -> Result<usize, PlateError> {
    if replicates == 0 || replicates > COLUMNS {
        return Err(PlateError::InvalidReplicateCount(replicates));
    }
    Ok(COLUMNS / replicates)
}

/// Destination wells for a master plate, in fill order.
///
/// Columns are cut into groups of `replicates`; each group is walked top to
/// bottom, emitting that row's `replicates` wells left to right. The first
/// `RESERVED_GROUPS * replicates` wells of that walk are dropped.
pub fn destination_slots(replicates: usize) -> Result<Vec<Address>, PlateError> {
    let groups = column_groups(replicates)?;
    let mut order = Vec::with_capacity(groups * ROWS * replicates);
    for group in 0..groups {
        for row in 0..ROWS {
            for offset in 0..replicates {
                order.push(Address::ALL[row * COLUMNS + group * replicates + offset]);
            }
        }
    }
    order.drain(..RESERVED_GROUPS * replicates);
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(slots: &[Address]) -> Vec<&'static str> {
        slots.iter().map(|a| a.label()).collect()
    }

    #[test]
    fn triplicates_leave_ninety_slots() {
        let slots = destination_slots(3).unwrap();
        assert_eq!(slots.len(), 90);
        assert_eq!(labels(&slots[..6]), vec!["c1", "c2", "c3", "d1", "d2", "d3"]);
        // second column group starts after rows c..h of the first
        assert_eq!(slots[18].label(), "a4");
        assert_eq!(slots.last().unwrap().label(), "h12");
    }

    #[test]
    fn quadruplicates_tile_three_groups() {
        assert_eq!(column_groups(4).unwrap(), 3);
        let slots = destination_slots(4).unwrap();
        assert_eq!(slots.len(), 88);
        assert_eq!(slots[0].label(), "c1");
        assert_eq!(slots[24].label(), "a5");
    }

    #[test]
    fn trailing_columns_are_dropped() {
        let slots = destination_slots(5).unwrap();
        assert_eq!(column_groups(5).unwrap(), 2);
        assert_eq!(slots.len(), 2 * 8 * 5 - 10);
        assert!(slots.iter().all(|a| a.column() < 10));
    }

    #[test]
    fn zero_group_counts_are_rejected() {
        assert!(matches!(
            destination_slots(0),
            Err(PlateError::InvalidReplicateCount(0))
        ));
        assert!(matches!(
            destination_slots(13),
            Err(PlateError::InvalidReplicateCount(13))
        ));
        assert_eq!(destination_slots(12).unwrap().len(), 72);
    }

    #[test]
    fn slots_never_repeat() {
        for replicates in 1..=COLUMNS {
            let slots = destination_slots(replicates).unwrap();
            let mut sorted = slots.clone();
            sorted.sort();
            sorted.dedup();
            assert_eq!(sorted.len(), slots.len(), "replicates={replicates}");
        }
    }
}
