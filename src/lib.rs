//! Sea-turtle collision risk for a fishing location.
//!
//! Fuses ERDDAP sea-surface-temperature and wave-height readings with a
//! pretrained classifier, and texts the user when the area is risky (or
//! warm enough to be safe). External feeds degrade to "absent" instead of
//! failing; only bad input and a missing or failing model end a request.

pub mod alert;
pub mod analysis;
pub mod api;
pub mod assessment;
pub mod classifier;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod users;
pub mod verify;

pub use assessment::{Assessment, AssessmentError, AssessmentRequest, RiskAssessor};
pub use model::{AssessmentResult, Coordinate, Observation, RiskLabel};
