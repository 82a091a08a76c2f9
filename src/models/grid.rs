use std::fmt;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use serde::de::{self, IgnoredAny, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

pub const ROWS: usize = 8;
pub const COLUMNS: usize = 12;
pub const WELL_COUNT: usize = ROWS * COLUMNS;

const LABELS: [&str; WELL_COUNT] = [
    "a1", "a2", "a3", "a4", "a5", "a6", "a7", "a8", "a9", "a10", "a11", "a12", //
    "b1", "b2", "b3", "b4", "b5", "b6", "b7", "b8", "b9", "b10", "b11", "b12", //
    "c1", "c2", "c3", "c4", "c5", "c6", "c7", "c8", "c9", "c10", "c11", "c12", //
    "d1", "d2", "d3", "d4", "d5", "d6", "d7", "d8", "d9", "d10", "d11", "d12", //
    "e1", "e2", "e3", "e4", "e5", "e6", "e7", "e8", "e9", "e10", "e11", "e12", //
    "f1", "f2", "f3", "f4", "f5", "f6", "f7", "f8", "f9", "f10", "f11", "f12", //
    "g1", "g2", "g3", "g4", "g5", "g6", "g7", "g8", "g9", "g10", "g11", "g12", //
    "h1", "h2", "h3", "h4", "h5", "h6", "h7", "h8", "h9", "h10", "h11", "h12",
];

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown well label {0:?}")]
pub struct AddressParseError(pub String);

/// One of the 96 wells of a plate, ordered by row then column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(u8);

impl Address {
    /// Every address in row-major order (`a1`, `a2`, ..., `h12`).
    pub const ALL: [Address; WELL_COUNT] = {
        let mut all = [Address(0); WELL_COUNT];
        let mut i = 0;
        while i < WELL_COUNT {
            all[i] = Address(i as u8);
            i += 1;
        }
        all
    };

    /// Zero-based row and column.
    pub fn new(row: usize, column: usize) -> Option<Self> {
        if row < ROWS && column < COLUMNS {
            Some(Self::ALL[row * COLUMNS + column])
        } else {
            None
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn row(self) -> usize {
        self.index() / COLUMNS
    }

    pub fn column(self) -> usize {
        self.index() % COLUMNS
    }

    pub fn label(self) -> &'static str {
        LABELS[self.index()]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        LABELS
            .iter()
            .position(|label| *label == wanted)
            .map(|i| Self::ALL[i])
            .ok_or_else(|| AddressParseError(s.to_string()))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// A full 8 x 12 plate of wells. Every address always holds a well; an empty
/// position holds `W::default()`.
///
/// On the wire a grid is a JSON object keyed by well label. Missing labels read
/// as empty wells, `null` wells read as empty, keys starting with `_` are
/// document metadata and skipped, anything else that is not a label is rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<W> {
    wells: Vec<W>,
}

impl<W: Default> Default for Grid<W> {
    fn default() -> Self {
        Self {
            wells: (0..WELL_COUNT).map(|_| W::default()).collect(),
        }
    }
}

impl<W> Grid<W> {
    pub fn iter(&self) -> impl Iterator<Item = (Address, &W)> {
        Address::ALL.into_iter().zip(self.wells.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Address, &mut W)> {
        Address::ALL.into_iter().zip(self.wells.iter_mut())
    }
}

impl<W: Default> FromIterator<(Address, W)> for Grid<W> {
    fn from_iter<I: IntoIterator<Item = (Address, W)>>(iter: I) -> Self {
        let mut grid = Self::default();
        for (address, well) in iter {
            grid[address] = well;
        }
        grid
    }
}

impl<W> Index<Address> for Grid<W> {
    type Output = W;

    fn index(&self, address: Address) -> &W {
        &self.wells[address.index()]
    }
}

impl<W> IndexMut<Address> for Grid<W> {
    fn index_mut(&mut self, address: Address) -> &mut W {
        &mut self.wells[address.index()]
    }
}

impl<W: Serialize> Serialize for Grid<W> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(WELL_COUNT))?;
        for (address, well) in self.iter() {
            map.serialize_entry(address.label(), well)?;
        }
        map.end()
    }
}

impl<'de, W> Deserialize<'de> for Grid<W>
where
    W: Deserialize<'de> + Default,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct GridVisitor<W>(PhantomData<W>);

        impl<'de, W> Visitor<'de> for GridVisitor<W>
        where
            W: Deserialize<'de> + Default,
        {
            type Value = Grid<W>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from well labels a1..h12 to wells")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Grid<W>, A::Error> {
                let mut grid = Grid::default();
                while let Some(key) = map.next_key::<String>()? {
                    if key.starts_with('_') {
                        map.next_value::<IgnoredAny>()?;
                        continue;
                    }
                    let address = key.parse::<Address>().map_err(de::Error::custom)?;
                    grid[address] = map.next_value::<Option<W>>()?.unwrap_or_default();
                }
                Ok(grid)
            }
        }

        deserializer.deserialize_map(GridVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_follow_row_major_order() {
        assert_eq!(Address::ALL[0].label(), "a1");
        assert_eq!(Address::ALL[11].label(), "a12");
        assert_eq!(Address::ALL[12].label(), "b1");
        assert_eq!(Address::ALL[WELL_COUNT - 1].label(), "h12");
        for (i, address) in Address::ALL.iter().enumerate() {
            assert_eq!(address.index(), i);
            assert_eq!(Address::new(address.row(), address.column()), Some(*address));
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("C7".parse::<Address>(), Ok(Address::new(2, 6).unwrap()));
        assert_eq!(" h12 ".parse::<Address>(), Ok(Address::ALL[95]));
        assert!("i1".parse::<Address>().is_err());
        assert!("a13".parse::<Address>().is_err());
    }

    #[test]
    fn addresses_order_by_row_then_column() {
        let a12 = "a12".parse::<Address>().unwrap();
        let b1 = "b1".parse::<Address>().unwrap();
        assert!(a12 < b1);
        assert_eq!(Address::new(8, 0), None);
        assert_eq!(Address::new(0, 12), None);
    }

    #[test]
    fn grid_reads_sparse_documents() {
        let grid: Grid<Option<u32>> =
            serde_json::from_value(serde_json::json!({"a1": 4, "h12": null, "_id": "abc"}))
                .unwrap();
        assert_eq!(grid[Address::ALL[0]], Some(4));
        assert_eq!(grid.iter().filter(|(_, w)| w.is_some()).count(), 1);

        let err = serde_json::from_value::<Grid<Option<u32>>>(serde_json::json!({"z9": 1}));
        assert!(err.is_err());
    }

    #[test]
    fn grid_writes_every_label() {
        let grid: Grid<u8> = Grid::default();
        let value = serde_json::to_value(&grid).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), WELL_COUNT);
        assert!(object.contains_key("d7"));
    }
}
