//! Risk assessment pipeline.
//!
//! Sequences one request through
//! `Validating → ShortCircuitCheck → Fetching → Classifying → Alerting → Responding`.
//! Only invalid input and classifier failures end a request early; missing
//! observations and failed alerts are absorbed into the result.

use std::sync::Arc;

use thiserror::Error;

use crate::alert::{AlertDispatcher, AlertMessage, AlertTask, AlertTier, TwilioConnector};
use crate::analysis::features::MissingValuePolicy;
use crate::classifier::{ClassifierError, RiskClassifier};
use crate::config::{MessagingCredentials, ServiceConfig};
use crate::ingest::ObservationSource;
use crate::ingest::erddap::{ErddapClient, ErddapError};
use crate::logging::{self, DataSource};
use crate::model::{
    AssessmentResult, Coordinate, Observation, RiskLabel, SST_SHORT_CIRCUIT_C, ValidationError,
};

// ---------------------------------------------------------------------------
// Request / outcome types
// ---------------------------------------------------------------------------

/// Inbound assessment request after JSON decoding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssessmentRequest {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// SST reported by the client, °C.
    pub sst: Option<f64>,
    /// Phone number to notify.
    pub contact: Option<String>,
}

impl AssessmentRequest {
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            ..Self::default()
        }
    }

    pub fn with_sst(mut self, sst: f64) -> Self {
        self.sst = Some(sst);
        self
    }

    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = Some(contact.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssessmentError {
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationError),
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
}

/// Which branch produced the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Client SST above the threshold; the model was not consulted.
    ShortCircuit,
    Classified,
}

/// A completed assessment.
///
/// `alert` is the in-flight notification, if one was sent. Dropping it
/// detaches the send; nothing in `result` depends on it.
#[derive(Debug)]
pub struct Assessment {
    pub result: AssessmentResult,
    pub decision: Decision,
    pub alert: Option<AlertTask>,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Shared, read-only pipeline. Each call to [`RiskAssessor::assess`] builds
/// its own observations and result; nothing is shared between requests
/// beyond the immutable collaborators held here.
#[derive(Clone)]
pub struct RiskAssessor {
    observations: Arc<dyn ObservationSource>,
    classifier: RiskClassifier,
    dispatcher: AlertDispatcher,
    policy: MissingValuePolicy,
    sst_threshold_c: f64,
}

impl RiskAssessor {
    pub fn new(
        observations: Arc<dyn ObservationSource>,
        classifier: RiskClassifier,
        dispatcher: AlertDispatcher,
    ) -> Self {
        Self {
            observations,
            classifier,
            dispatcher,
            policy: MissingValuePolicy::default(),
            sst_threshold_c: SST_SHORT_CIRCUIT_C,
        }
    }

    /// Wire the production collaborators: ERDDAP, the model file named in
    /// the config, and Twilio.
    pub fn from_config(
        config: &ServiceConfig,
        credentials: MessagingCredentials,
    ) -> Result<Self, ErddapError> {
        let observations = Arc::new(ErddapClient::new(config.erddap.clone())?);
        let classifier = RiskClassifier::load(&config.model.path);
        let connector = Arc::new(TwilioConnector::new(credentials, &config.alerts));
        let dispatcher = AlertDispatcher::new(connector, config.alerts.sender.clone());

        Ok(Self::new(observations, classifier, dispatcher)
            .with_short_circuit_threshold(config.assessment.sst_short_circuit_c))
    }

    pub fn with_short_circuit_threshold(mut self, sst_threshold_c: f64) -> Self {
        self.sst_threshold_c = sst_threshold_c;
        self
    }

    pub fn with_missing_value_policy(mut self, policy: MissingValuePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn assess(&self, request: &AssessmentRequest) -> Result<Assessment, AssessmentError> {
        let coordinate = validate(request)?;
        let contact = request
            .contact
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
        let subject = coordinate.to_string();

        // The loaded model is a precondition for every answer, including the
        // short-circuit one.
        if let Err(err) = self.classifier.ensure_available() {
            logging::error(DataSource::Model, Some(&subject), &err.to_string());
            return Err(err.into());
        }

        if let Some(sst) = request.sst.filter(|sst| *sst > self.sst_threshold_c) {
            logging::info(
                DataSource::System,
                Some(&subject),
                &format!("SST {} above {}; skipping classification", sst, self.sst_threshold_c),
            );
            let alert = contact.map(|c| self.dispatcher.dispatch(AlertMessage::new(c, AlertTier::SafeToFish)));
            return Ok(Assessment {
                result: AssessmentResult {
                    coordinate,
                    sst: Some(sst),
                    wave_height: None,
                    risk: RiskLabel::Low,
                },
                decision: Decision::ShortCircuit,
                alert,
            });
        }

        let (sst, wave_height) = self.fetch_observations(&coordinate);

        let features = self.policy.build(&coordinate, sst, wave_height);
        let risk = self.classifier.classify(&features).inspect_err(|err| {
            logging::error(DataSource::Model, Some(&subject), &err.to_string());
        })?;

        let alert = contact
            .zip(AlertTier::for_classified(risk))
            .map(|(c, tier)| self.dispatcher.dispatch(AlertMessage::new(c, tier)));

        logging::info(
            DataSource::System,
            Some(&subject),
            &format!(
                "{} (sst={:?}, wave_height={:?}, alert={})",
                risk,
                sst.value(),
                wave_height.value(),
                alert.is_some()
            ),
        );

        Ok(Assessment {
            result: AssessmentResult {
                coordinate,
                sst: sst.value(),
                wave_height: wave_height.value(),
                risk,
            },
            decision: Decision::Classified,
            alert,
        })
    }

    /// Fetch SST and wave height side by side. Falls back to fetching in
    /// sequence if a worker thread cannot be started.
    fn fetch_observations(&self, coordinate: &Coordinate) -> (Observation, Observation) {
        let source = self.observations.as_ref();
        std::thread::scope(|scope| {
            let sst_worker = std::thread::Builder::new()
                .name("sst-fetch".to_string())
                .spawn_scoped(scope, || source.fetch_temperature(coordinate));

            let wave_height = source.fetch_wave_height(coordinate);

            let sst = match sst_worker {
                Ok(handle) => handle.join().unwrap_or(Observation::Unavailable),
                Err(_) => source.fetch_temperature(coordinate),
            };
            (sst, wave_height)
        })
    }
}

/// Both coordinates present, finite and in range; client SST, if given,
/// finite.
pub fn validate(request: &AssessmentRequest) -> Result<Coordinate, ValidationError> {
    let (Some(latitude), Some(longitude)) = (request.latitude, request.longitude) else {
        return Err(ValidationError::MissingCoordinate);
    };
    if let Some(sst) = request.sst {
        if !sst.is_finite() {
            return Err(ValidationError::NotNumeric { field: "sst" });
        }
    }
    Coordinate::new(latitude, longitude)
}
