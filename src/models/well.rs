use serde::{Deserialize, Serialize};

/// Read access shared by stock wells and master-plate wells.
pub trait WellContents {
    /// Fluid resource identifier of the aliquot in the well.
    fn fr(&self) -> Option<&str>;
    /// External code of the compound in the well.
    fn ec(&self) -> Option<&str>;
    /// Total volume currently held.
    fn volume(&self) -> f64;

    fn is_occupied(&self) -> bool {
        self.fr().is_some() || self.ec().is_some()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// A well on a stock plate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Well {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ec: Option<String>,
    pub volume: f64,
}

impl Well {
    pub fn new(fr: impl Into<String>, ec: impl Into<String>, volume: f64) -> Self {
        Self {
            fr: Some(fr.into()),
            ec: Some(ec.into()),
            volume,
        }
    }
}

impl WellContents for Well {
    fn fr(&self) -> Option<&str> {
        non_empty(&self.fr)
    }

    fn ec(&self) -> Option<&str> {
        non_empty(&self.ec)
    }

    fn volume(&self) -> f64 {
        self.volume
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Compartment {
    pub volume: f64,
}

/// A master-plate well: one aliquot split over an upper and a lower compartment.
/// Both compartments are always dosed and withdrawn together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DualWell {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ec: Option<String>,
    pub upper: Compartment,
    pub lower: Compartment,
}

impl DualWell {
    /// A freshly dispensed well with `dose` in each compartment.
    pub fn dosed(fr: impl Into<String>, ec: Option<String>, dose: f64) -> Self {
        Self {
            fr: Some(fr.into()),
            ec,
            upper: Compartment { volume: dose },
            lower: Compartment { volume: dose },
        }
    }
}

impl WellContents for DualWell {
    fn fr(&self) -> Option<&str> {
        non_empty(&self.fr)
    }

    fn ec(&self) -> Option<&str> {
        non_empty(&self.ec)
    }

    fn volume(&self) -> f64 {
        self.upper.volume + self.lower.volume
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_identifiers_do_not_count() {
        let well = Well {
            fr: Some(String::new()),
            ec: Some("  ".into()),
            volume: 3.0,
        };
        assert_eq!(well.fr(), None);
        assert!(!well.is_occupied());
    }

    #[test]
    fn dual_well_reports_both_compartments() {
        let well = DualWell::dosed("FR12", Some("EC7".into()), 2.5);
        assert_eq!(well.volume(), 5.0);
        assert_eq!(well.fr(), Some("FR12"));
        assert!(well.is_occupied());
    }

    #[test]
    fn wells_read_partial_documents() {
        let well: Well = serde_json::from_str(r#"{"fr":"FR1"}"#).unwrap();
        assert_eq!(well.volume, 0.0);
        assert_eq!(well.ec, None);

        let dual: DualWell = serde_json::from_str(r#"{"upper":{"volume":1.5}}"#).unwrap();
        assert_eq!(dual.upper.volume, 1.5);
        assert_eq!(dual.lower.volume, 0.0);
    }
}
