/// Remote observation sources.
///
/// Submodules:
/// - `erddap`: NOAA ERDDAP griddap client for SST and wave height.

pub mod erddap;

use crate::model::{Coordinate, Observation};

/// Point-in-time environmental readings for a coordinate.
///
/// Implementations never fail: any transport or data problem is logged and
/// reported as [`Observation::Unavailable`]. Both calls are read-only and may
/// run concurrently.
pub trait ObservationSource: Send + Sync {
    fn fetch_temperature(&self, coordinate: &Coordinate) -> Observation;
    fn fetch_wave_height(&self, coordinate: &Coordinate) -> Observation;
}
