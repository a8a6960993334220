use thiserror::Error;

use crate::models::MarkerId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarkerError {
    #[error("marker {0} is already in the collection")]
    DuplicateId(MarkerId),
    #[error("location ({lon}, {lat}) is not finite")]
    NonFiniteLocation { lon: f64, lat: f64 },
    #[error("invalid location input lon={lon:?} lat={lat:?}")]
    InvalidLocation { lon: String, lat: String },
}
