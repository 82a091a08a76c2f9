use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::models::InventoryPlate;
use crate::repositories::PlateStore;
use crate::services::error::PlateError;

/// Queries shorter than this return nothing.
pub const MIN_QUERY_LEN: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrEntry {
    pub fr: Option<String>,
    pub volume: f64,
    #[serde(rename = "plateID")]
    pub plate_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EcGroup {
    pub ec: String,
    pub volume: f64,
    pub frs: Vec<FrEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub ec: String,
    pub fr: Option<String>,
    pub volume: f64,
    #[serde(rename = "plateID")]
    pub plate_id: i32,
}

/// Read-only snapshot of every live plate.
#[derive(Debug, Clone, Default)]
pub struct InventoryIndex {
    plates: Vec<InventoryPlate>,
}

impl InventoryIndex {
    pub fn new(plates: Vec<InventoryPlate>) -> Self {
        Self { plates }
    }

    pub fn snapshot(store: &dyn PlateStore) -> Result<Self, PlateError> {
        Ok(Self::new(store.list_plates()?))
    }

    pub fn plates(&self) -> &[InventoryPlate] {
        &self.plates
    }

    /// Groups every well that has an EC, in first-seen order. Wells of one
    /// plate fold into a single entry; each plate keeps its own entry.
    pub fn aggregate_by_external_code(&self) -> Vec<EcGroup> {
        let mut groups: Vec<EcGroup> = Vec::new();
        let mut by_ec: HashMap<String, usize> = HashMap::new();

        for plate in &self.plates {
            let plate_id = plate.id();
            for (_, well) in plate.wells() {
                let Some(ec) = well.ec() else { continue };
                let volume = well.volume();
                let index = *by_ec.entry(ec.to_string()).or_insert_with(|| {
                    groups.push(EcGroup {
                        ec: ec.to_string(),
                        volume: 0.0,
                        frs: Vec::new(),
                    });
                    groups.len() - 1
                });
                let group = &mut groups[index];
                group.volume += volume;
                match group.frs.iter_mut().find(|entry| entry.plate_id == plate_id) {
                    Some(entry) => entry.volume += volume,
                    None => group.frs.push(FrEntry {
                        fr: well.fr().map(str::to_string),
                        volume,
                        plate_id,
                    }),
                }
            }
        }
        groups
    }

    /// Case-insensitive substring match on EC, one hit per distinct
    /// `(ec, fr, volume, plate)`.
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        if query.chars().count() < MIN_QUERY_LEN {
            return Vec::new();
        }
        let needle = query.to_uppercase();
        let mut seen = HashSet::new();
        let mut hits = Vec::new();

        for plate in &self.plates {
            let plate_id = plate.id();
            for (_, well) in plate.wells() {
                let Some(ec) = well.ec() else { continue };
                if !ec.to_uppercase().contains(&needle) {
                    continue;
                }
                let fr = well.fr().map(str::to_string);
                let volume = well.volume();
                let key = (ec.to_string(), fr.clone(), volume.to_bits(), plate_id);
                if seen.insert(key) {
                    hits.push(SearchHit {
                        ec: ec.to_string(),
                        fr,
                        volume,
                        plate_id,
                    });
                }
            }
        }
        hits
    }

    /// The subset of `frs` already present on some live plate.
    pub fn frs_in_use<'a>(&self, frs: &'a [String]) -> Vec<&'a String> {
        let present: HashSet<&str> = self
            .plates
            .iter()
            .flat_map(|plate| plate.wells().filter_map(|(_, well)| well.fr()))
            .collect();
        frs.iter().filter(|fr| present.contains(fr.as_str())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Address, DualWell, Grid, Plate, Well};

    fn stock(id: i32, wells: &[(&str, Well)]) -> InventoryPlate {
        let grid: Grid<Well> = wells
            .iter()
            .map(|(label, well)| (label.parse::<Address>().unwrap(), well.clone()))
            .collect();
        InventoryPlate::Stock(Plate {
            id,
            version: 0,
            wells: grid,
        })
    }

    #[test]
    fn same_ec_across_plates_keeps_one_entry_per_plate() {
        let a = stock(1, &[("a1", Well::new("fr1", "X1", 5.0))]);
        let b = stock(2, &[("a1", Well::new("fr2", "X1", 3.0))]);
        let groups = InventoryIndex::new(vec![a.clone(), b.clone()]).aggregate_by_external_code();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].volume, 8.0);
        assert_eq!(groups[0].frs.len(), 2);

        let reversed = InventoryIndex::new(vec![b, a]).aggregate_by_external_code();
        assert_eq!(reversed[0].volume, 8.0);
        assert_eq!(reversed[0].frs.len(), 2);
    }

    #[test]
    fn same_plate_contributions_merge() {
        let plate = stock(
            4,
            &[
                ("a1", Well::new("fr1", "X1", 5.0)),
                ("a2", Well::new("fr1", "X1", 2.0)),
                ("a3", Well::new("fr9", "Y2", 1.0)),
            ],
        );
        let groups = InventoryIndex::new(vec![plate]).aggregate_by_external_code();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].ec, "X1");
        assert_eq!(
            groups[0].frs,
            vec![FrEntry {
                fr: Some("fr1".into()),
                volume: 7.0,
                plate_id: 4
            }]
        );
        assert_eq!(groups[0].volume, 7.0);
        assert_eq!(groups[1].ec, "Y2");
    }

    #[test]
    fn master_wells_count_both_compartments() {
        let mut wells = Grid::<DualWell>::default();
        wells["c1".parse::<Address>().unwrap()] = DualWell::dosed("fr1", Some("X1".into()), 2.0);
        let index = InventoryIndex::new(vec![InventoryPlate::Master(Plate {
            id: 8,
            version: 0,
            wells,
        })]);
        let groups = index.aggregate_by_external_code();
        assert_eq!(groups[0].volume, 4.0);
    }

    #[test]
    fn search_ignores_case_and_short_queries() {
        let index = InventoryIndex::new(vec![
            stock(1, &[("a1", Well::new("fr1", "X12", 5.0))]),
            stock(2, &[("b1", Well::new("fr2", "ax1", 3.0))]),
        ]);
        let lower = index.search("x12");
        let upper = index.search("X12");
        assert_eq!(lower, upper);
        assert_eq!(lower.len(), 1);
        assert!(index.search("x").is_empty());
        assert!(index.search("X1").is_empty());
        assert_eq!(index.search("AX1").len(), 1);
    }

    #[test]
    fn identical_hits_are_reported_once() {
        let index = InventoryIndex::new(vec![stock(
            1,
            &[
                ("a1", Well::new("fr1", "EC100", 5.0)),
                ("a2", Well::new("fr1", "EC100", 5.0)),
                ("a3", Well::new("fr1", "EC100", 4.0)),
            ],
        )]);
        assert_eq!(index.search("ec10").len(), 2);
    }

    #[test]
    fn reports_frs_already_on_a_plate() {
        let index = InventoryIndex::new(vec![stock(1, &[("a1", Well::new("fr1", "X1", 5.0))])]);
        let asked = vec!["fr1".to_string(), "fr7".to_string()];
        assert_eq!(index.frs_in_use(&asked), vec![&"fr1".to_string()]);
    }
}
