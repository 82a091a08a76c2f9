use std::str::FromStr;

use serde::Deserialize;

use crate::models::grid::{Address, Grid};
use crate::models::well::DualWell;
use crate::services::error::PlateError;
use crate::services::layout::SourceItem;

/// Direction in which the replicate copies of one source item run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Copies run down a column of the column group, wrapping into its next column.
    #[default]
    Vertically,
    /// Copies run across one row of the column group.
    Horizontally,
}

impl FromStr for Orientation {
    type Err = PlateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vertically" => Ok(Orientation::Vertically),
            "horizontally" => Ok(Orientation::Horizontally),
            other => Err(PlateError::InvalidRequest(format!(
                "unknown orientation {other:?}"
            ))),
        }
    }
}

impl Orientation {
    /// Re-walks planner slots in the order copies are laid down.
    fn walk(self, slots: &[Address], replicates: usize) -> Vec<Address> {
        let mut walk = slots.to_vec();
        if self == Orientation::Vertically && replicates > 0 {
            walk.sort_by_key(|a| (a.column() / replicates, a.column(), a.row()));
        }
        walk
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Derivation {
    pub wells: Grid<DualWell>,
    /// Distinct FRs that received at least one well, in placement order.
    pub placed_frs: Vec<String>,
    pub placed_items: usize,
    pub dropped_items: usize,
}

/// Lays `items` onto one master plate, `replicates` contiguous copies each.
///
/// Every used well gets the item's FR/EC and `dose` in both compartments.
/// Unused slots stay empty; items beyond the plate's capacity are dropped and
/// reported in `dropped_items`.
pub fn derive_master_plate(
    items: &[SourceItem],
    slots: &[Address],
    replicates: usize,
    orientation: Orientation,
    dose: f64,
) -> Result<Derivation, PlateError> {
    if replicates == 0 {
        return Err(PlateError::InvalidReplicateCount(replicates));
    }

    let walk = orientation.walk(slots, replicates);
    let mut wells = Grid::<DualWell>::default();
    let mut placed_frs: Vec<String> = Vec::new();
    let mut placed_items = 0;

    for (item, copies) in items.iter().zip(walk.chunks_exact(replicates)) {
        for &address in copies {
            wells[address] = DualWell::dosed(item.fr.clone(), item.ec.clone(), dose);
        }
        if !placed_frs.contains(&item.fr) {
            placed_frs.push(item.fr.clone());
        }
        placed_items += 1;
    }

    Ok(Derivation {
        wells,
        placed_frs,
        placed_items,
        dropped_items: items.len() - placed_items,
    })
}
