//! Classifier input vector.
//!
//! The model was trained on `(lat, lon, sst, wave_height)` rows. How absent
//! readings are filled is kept behind [`MissingValuePolicy`] so it can be
//! revisited without touching the pipeline.

use crate::model::{Coordinate, Observation};

/// Number of features the classifier expects.
pub const FEATURE_COUNT: usize = 4;

/// Ordered `(latitude, longitude, sst, wave_height)` input to the classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl From<[f64; FEATURE_COUNT]> for FeatureVector {
    fn from(values: [f64; FEATURE_COUNT]) -> Self {
        FeatureVector(values)
    }
}

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn latitude(&self) -> f64 {
        self.0[0]
    }

    pub fn longitude(&self) -> f64 {
        self.0[1]
    }

    pub fn sst(&self) -> f64 {
        self.0[2]
    }

    pub fn wave_height(&self) -> f64 {
        self.0[3]
    }
}

/// How an unavailable observation is represented in the feature vector.
///
/// `ZeroFill` conflates "no reading" with "reads zero". It matches how the
/// deployed model is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingValuePolicy {
    #[default]
    ZeroFill,
}

impl MissingValuePolicy {
    pub fn fill(&self, observation: Observation) -> f64 {
        match self {
            MissingValuePolicy::ZeroFill => observation.value().unwrap_or(0.0),
        }
    }

    pub fn build(
        &self,
        coordinate: &Coordinate,
        sst: Observation,
        wave_height: Observation,
    ) -> FeatureVector {
        FeatureVector([
            coordinate.latitude,
            coordinate.longitude,
            self.fill(sst),
            self.fill(wave_height),
        ])
    }
}
