/// Core data types for the turtle risk service.
///
/// Coordinate, Observation, RiskLabel and AssessmentResult are the shared
/// domain model imported by every other module. Nothing here performs I/O;
/// everything is created per request and dropped once the response is built.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Client-reported SST (°C) above which classification is skipped and the
/// location is reported as low risk.
pub const SST_SHORT_CIRCUIT_C: f64 = 28.0;

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// A WGS84 fishing location. Build with [`Coordinate::new`] to get the
/// range checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(ValidationError::LatitudeOutOfRange(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationError::LongitudeOutOfRange(longitude));
        }
        Ok(Self { latitude, longitude })
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4},{:.4}", self.latitude, self.longitude)
    }
}

// ---------------------------------------------------------------------------
// Observations
// ---------------------------------------------------------------------------

/// The two environmental metrics the classifier consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    SeaSurfaceTemperature,
    WaveHeight,
}

impl Metric {
    pub fn unit(&self) -> &'static str {
        match self {
            Metric::SeaSurfaceTemperature => "degC",
            Metric::WaveHeight => "m",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::SeaSurfaceTemperature => write!(f, "SST"),
            Metric::WaveHeight => write!(f, "wave height"),
        }
    }
}

/// A single reading together with where it came from.
///
/// `Unavailable` is an ordinary value, not an error: a failed fetch degrades
/// to it and the pipeline carries on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observation {
    /// Reported by the caller alongside the request.
    Supplied(f64),
    /// Retrieved from the gridded-data service.
    Fetched(f64),
    Unavailable,
}

impl Observation {
    pub fn value(&self) -> Option<f64> {
        match self {
            Observation::Supplied(v) | Observation::Fetched(v) => Some(*v),
            Observation::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, Observation::Unavailable)
    }
}

// ---------------------------------------------------------------------------
// Risk labels
// ---------------------------------------------------------------------------

/// Discrete risk tier produced by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RiskLabel {
    #[serde(rename = "Low Risk")]
    Low,
    #[serde(rename = "Moderate Risk")]
    Moderate,
    #[serde(rename = "High Risk")]
    High,
    #[serde(rename = "Unknown Risk")]
    Unknown,
}

impl RiskLabel {
    /// Fixed decoding of the classifier's integer output.
    /// Codes outside 0..=2 decode to `Unknown` rather than failing.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => RiskLabel::Low,
            1 => RiskLabel::Moderate,
            2 => RiskLabel::High,
            _ => RiskLabel::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLabel::Low => "Low Risk",
            RiskLabel::Moderate => "Moderate Risk",
            RiskLabel::High => "High Risk",
            RiskLabel::Unknown => "Unknown Risk",
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// The response artifact of a successful assessment.
///
/// Serializes to the wire shape
/// `{latitude, longitude, SST, wave_height, risk}` with absent readings as
/// `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentResult {
    #[serde(flatten)]
    pub coordinate: Coordinate,
    #[serde(rename = "SST")]
    pub sst: Option<f64>,
    pub wave_height: Option<f64>,
    pub risk: RiskLabel,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Caller-correctable problems with an inbound request. No external call is
/// made once one of these is raised.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("latitude and longitude are required")]
    MissingCoordinate,
    #[error("{field} must be a number")]
    NotNumeric { field: &'static str },
    #[error("{field} must be a string")]
    NotText { field: &'static str },
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_accepts_bounds() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
        assert!(Coordinate::new(25.0, -80.0).is_ok());
    }

    #[test]
    fn test_coordinate_rejects_out_of_range_and_nan() {
        assert_eq!(
            Coordinate::new(90.5, 0.0),
            Err(ValidationError::LatitudeOutOfRange(90.5))
        );
        assert_eq!(
            Coordinate::new(0.0, -181.0),
            Err(ValidationError::LongitudeOutOfRange(-181.0))
        );
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_risk_label_decoding() {
        assert_eq!(RiskLabel::from_code(0), RiskLabel::Low);
        assert_eq!(RiskLabel::from_code(1), RiskLabel::Moderate);
        assert_eq!(RiskLabel::from_code(2), RiskLabel::High);
        assert_eq!(RiskLabel::from_code(3), RiskLabel::Unknown);
        assert_eq!(RiskLabel::from_code(-1), RiskLabel::Unknown);
    }

    #[test]
    fn test_observation_value() {
        assert_eq!(Observation::Supplied(29.5).value(), Some(29.5));
        assert_eq!(Observation::Fetched(1.2).value(), Some(1.2));
        assert_eq!(Observation::Unavailable.value(), None);
        assert!(!Observation::Unavailable.is_available());
    }

    #[test]
    fn test_result_serializes_to_wire_shape() {
        let result = AssessmentResult {
            coordinate: Coordinate::new(25.0, -80.0).unwrap(),
            sst: Some(29.5),
            wave_height: None,
            risk: RiskLabel::Low,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "latitude": 25.0,
                "longitude": -80.0,
                "SST": 29.5,
                "wave_height": null,
                "risk": "Low Risk",
            })
        );
    }
}
