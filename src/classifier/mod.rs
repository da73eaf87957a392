//! Risk classifier adapter.
//!
//! Wraps a model that was loaded once at startup. The adapter does no
//! feature engineering: it hands the 4-feature vector to the model and
//! decodes the integer class with [`RiskLabel::from_code`].
//!
//! A model that failed to load leaves the adapter permanently
//! [`ClassifierState::Unavailable`]; every call then fails with
//! [`ClassifierError::ModelUnavailable`] instead of producing a label.

pub mod forest;

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::analysis::features::FeatureVector;
use crate::logging::{self, DataSource};
use crate::model::RiskLabel;

pub use forest::{ForestModel, ModelLoadError};

/// A trained classifier: feature vector in, class code out.
///
/// Implementations must be safe to call from several threads at once; the
/// adapter does not serialize access.
pub trait RiskModel: Send + Sync {
    fn predict(&self, features: &[f64]) -> Result<i64, Box<dyn std::error::Error + Send + Sync>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifierError {
    /// The model never loaded. Fatal for every request, not retried.
    #[error("AI model is unavailable: {0}")]
    ModelUnavailable(String),
    /// The model is loaded but rejected this input.
    #[error("Prediction failed: {0}")]
    PredictionFailed(String),
}

#[derive(Clone)]
pub enum ClassifierState {
    Ready(Arc<dyn RiskModel>),
    Unavailable { reason: String },
}

/// Immutable, cheaply clonable handle shared by all assessments.
#[derive(Clone)]
pub struct RiskClassifier {
    state: ClassifierState,
}

impl RiskClassifier {
    pub fn ready(model: Arc<dyn RiskModel>) -> Self {
        Self {
            state: ClassifierState::Ready(model),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            state: ClassifierState::Unavailable {
                reason: reason.into(),
            },
        }
    }

    /// Load the tree-ensemble export at `path`. A failed load is logged and
    /// yields an unavailable classifier rather than an error, so the service
    /// can still start and answer with a service error.
    pub fn load(path: &Path) -> Self {
        match ForestModel::load(path) {
            Ok(model) => {
                logging::info(
                    DataSource::Model,
                    None,
                    &format!(
                        "Model loaded from {} ({} trees)",
                        path.display(),
                        model.tree_count()
                    ),
                );
                Self::ready(Arc::new(model))
            }
            Err(err) => {
                logging::error(
                    DataSource::Model,
                    None,
                    &format!("Error loading model from {}: {}", path.display(), err),
                );
                Self::unavailable(err.to_string())
            }
        }
    }

    pub fn state(&self) -> &ClassifierState {
        &self.state
    }

    pub fn is_available(&self) -> bool {
        matches!(self.state, ClassifierState::Ready(_))
    }

    pub fn ensure_available(&self) -> Result<(), ClassifierError> {
        match &self.state {
            ClassifierState::Ready(_) => Ok(()),
            ClassifierState::Unavailable { reason } => {
                Err(ClassifierError::ModelUnavailable(reason.clone()))
            }
        }
    }

    pub fn classify(&self, features: &FeatureVector) -> Result<RiskLabel, ClassifierError> {
        let model = match &self.state {
            ClassifierState::Ready(model) => model,
            ClassifierState::Unavailable { reason } => {
                return Err(ClassifierError::ModelUnavailable(reason.clone()));
            }
        };

        // A panicking model is an inference failure for this request only.
        let outcome = catch_unwind(AssertUnwindSafe(|| model.predict(features.as_slice())));

        match outcome {
            Ok(Ok(code)) => Ok(RiskLabel::from_code(code)),
            Ok(Err(err)) => Err(ClassifierError::PredictionFailed(err.to_string())),
            Err(_) => Err(ClassifierError::PredictionFailed(
                "model panicked during inference".to_string(),
            )),
        }
    }
}
