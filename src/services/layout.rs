use std::cmp::Reverse;

use serde::Deserialize;

use crate::services::error::PlateError;

/// A stock well picked by the operator for a new master.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceItem {
    pub fr: String,
    #[serde(default)]
    pub ec: Option<String>,
    #[serde(default)]
    pub volume: f64,
}

impl SourceItem {
    pub fn new(fr: impl Into<String>, ec: impl Into<String>, volume: f64) -> Self {
        Self {
            fr: fr.into(),
            ec: Some(ec.into()),
            volume,
        }
    }
}

/// Order in which source items are laid onto a master plate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutStrategy {
    AscendingFr,
    DescendingFr,
    DescendingEc,
    /// Keep the order the operator clicked the wells in.
    ClickOrder,
}

impl TryFrom<i32> for LayoutStrategy {
    type Error = PlateError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(LayoutStrategy::AscendingFr),
            1 => Ok(LayoutStrategy::DescendingFr),
            2 => Ok(LayoutStrategy::DescendingEc),
            3 => Ok(LayoutStrategy::ClickOrder),
            other => Err(PlateError::InvalidStrategy(other)),
        }
    }
}

impl LayoutStrategy {
    /// Returns the items in layout order. Sorting is stable, so items with equal
    /// keys keep their relative input order.
    pub fn arrange(self, items: &[SourceItem]) -> Result<Vec<SourceItem>, PlateError> {
        let mut keyed = match self {
            LayoutStrategy::ClickOrder => return Ok(items.to_vec()),
            LayoutStrategy::AscendingFr | LayoutStrategy::DescendingFr => items
                .iter()
                .map(|item| Ok((numeric_suffix(&item.fr)?, item)))
                .collect::<Result<Vec<_>, PlateError>>()?,
            LayoutStrategy::DescendingEc => items
                .iter()
                .map(|item| {
                    let ec = item
                        .ec
                        .as_deref()
                        .ok_or_else(|| PlateError::InvalidIdentifier(format!("{} (no ec)", item.fr)))?;
                    Ok((numeric_suffix(ec)?, item))
                })
                .collect::<Result<Vec<_>, PlateError>>()?,
        };

        if self == LayoutStrategy::AscendingFr {
            keyed.sort_by_key(|(key, _)| *key);
        } else {
            keyed.sort_by_key(|(key, _)| Reverse(*key));
        }
        Ok(keyed.into_iter().map(|(_, item)| item.clone()).collect())
    }
}

/// Integer after the two-character prefix of an FR or EC code, e.g. 120 for
/// `"FR120"`. Only the leading digits count.
pub fn numeric_suffix(identifier: &str) -> Result<u64, PlateError> {
    let digits: String = identifier
        .trim()
        .chars()
        .skip(2)
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits
        .parse()
        .map_err(|_| PlateError::InvalidIdentifier(identifier.to_string()))
}
