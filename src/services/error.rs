use thiserror::Error;

use crate::models::Address;
use crate::repositories::StoreError;

#[derive(Debug, Error)]
pub enum PlateError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },
    #[error("unrecognized layout strategy {0}")]
    InvalidStrategy(i32),
    #[error("replicate count {0} leaves no column group on a 12-column plate")]
    InvalidReplicateCount(usize),
    #[error("well {address} on plate {plate_id} holds {available} but {requested} was requested")]
    InsufficientVolume {
        plate_id: i32,
        address: Address,
        available: f64,
        requested: f64,
    },
    #[error("plate {plate_id} was modified concurrently, retry with fresh data")]
    Conflict { plate_id: i32 },
    #[error("identifier {0:?} has no numeric suffix")]
    InvalidIdentifier(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("storage failure: {0}")]
    Store(#[source] StoreError),
}

impl From<StoreError> for PlateError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => PlateError::NotFound { entity, id },
            StoreError::Conflict { plate_id, .. } => PlateError::Conflict { plate_id },
            other => PlateError::Store(other),
        }
    }
}

/// Re-runs `op` while it loses compare-and-swap races, at most `retries`
/// extra times. Every other outcome is returned as is.
pub(crate) fn retry_on_conflict<T>(
    retries: usize,
    mut op: impl FnMut() -> Result<T, PlateError>,
) -> Result<T, PlateError> {
    let mut attempt = 0;
    loop {
        match op() {
            Err(PlateError::Conflict { plate_id }) if attempt < retries => {
                attempt += 1;
                tracing::warn!(
                    "plate {} changed underneath us, retrying ({}/{})",
                    plate_id,
                    attempt,
                    retries
                );
            }
            outcome => return outcome,
        }
    }
}
