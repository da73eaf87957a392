/// ERDDAP (NOAA CoastWatch) griddap client
///
/// Retrieves the latest sea-surface temperature and significant wave height
/// for a single grid point. Each metric is one GET with a bounded timeout;
/// there are no retries and nothing is cached.
///
/// API documentation: https://coastwatch.pfeg.noaa.gov/erddap/griddap/documentation.html

use serde::Deserialize;
use thiserror::Error;

use crate::config::{DatasetConfig, ErddapConfig};
use crate::ingest::ObservationSource;
use crate::logging;
use crate::model::{Coordinate, Metric, Observation};

/// Column holding the data value in a griddap row:
/// `[time, latitude, longitude, value]`.
pub const VALUE_COLUMN: usize = 3;

// ============================================================================
// ERDDAP Response Structures
// ============================================================================

/// Top-level `.json` griddap response
#[derive(Debug, Deserialize)]
pub struct ErddapTableResponse {
    pub table: ErddapTable,
}

/// Only `rows` is read; the value sits at [`VALUE_COLUMN`].
#[derive(Debug, Deserialize)]
pub struct ErddapTable {
    pub rows: Vec<Vec<serde_json::Value>>,
}

// ============================================================================
// Errors
// ============================================================================

/// Why a single metric could not be read. The [`ObservationSource`] impl
/// logs it and degrades to `Observation::Unavailable`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErddapError {
    #[error("HTTP error: {0}")]
    Http(u16),
    #[error("Request failed: {0}")]
    Request(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("No data rows in table")]
    EmptyTable,
    #[error("No data value in column {0} of first row")]
    MissingValue(usize),
}

impl From<reqwest::Error> for ErddapError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ErddapError::Request(format!("timeout: {}", err))
        } else if let Some(status) = err.status() {
            ErddapError::Http(status.as_u16())
        } else {
            ErddapError::Request(err.to_string())
        }
    }
}

// ============================================================================
// URL Construction and Parsing
// ============================================================================

/// Build the griddap query for the latest value of `dataset` at `coordinate`.
///
/// ```text
/// {base}/griddap/{dataset}.json?{variable}[(latest)][({lat})][({lon})]
/// ```
pub fn build_griddap_url(base_url: &str, dataset: &DatasetConfig, coordinate: &Coordinate) -> String {
    format!(
        "{}/griddap/{}.json?{}[(latest)][({})][({})]",
        base_url.trim_end_matches('/'),
        dataset.dataset_id,
        dataset.variable,
        coordinate.latitude,
        coordinate.longitude
    )
}

/// Extract `rows[0][3]` from a griddap JSON body.
pub fn parse_table_value(body: &str) -> Result<f64, ErddapError> {
    let response: ErddapTableResponse =
        serde_json::from_str(body).map_err(|e| ErddapError::Parse(e.to_string()))?;

    let first_row = response.table.rows.first().ok_or(ErddapError::EmptyTable)?;

    match first_row.get(VALUE_COLUMN) {
        None | Some(serde_json::Value::Null) => Err(ErddapError::MissingValue(VALUE_COLUMN)),
        Some(value) => value.as_f64().ok_or_else(|| {
            ErddapError::Parse(format!("value column is not numeric: {}", value))
        }),
    }
}

// ============================================================================
// API Client
// ============================================================================

pub struct ErddapClient {
    http: reqwest::blocking::Client,
    config: ErddapConfig,
}

impl ErddapClient {
    pub fn new(config: ErddapConfig) -> Result<Self, ErddapError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self { http, config })
    }

    fn dataset(&self, metric: Metric) -> &DatasetConfig {
        match metric {
            Metric::SeaSurfaceTemperature => &self.config.sst,
            Metric::WaveHeight => &self.config.wave_height,
        }
    }

    pub fn url_for(&self, metric: Metric, coordinate: &Coordinate) -> String {
        build_griddap_url(&self.config.base_url, self.dataset(metric), coordinate)
    }

    /// Fetch one metric, surfacing the failure reason.
    ///
    /// Use [`ObservationSource`] from pipeline code; this is for callers that
    /// need to report why a source is not answering.
    pub fn fetch_metric(&self, metric: Metric, coordinate: &Coordinate) -> Result<f64, ErddapError> {
        let url = self.url_for(metric, coordinate);

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .send()?;

        if !response.status().is_success() {
            return Err(ErddapError::Http(response.status().as_u16()));
        }

        let body = response.text()?;
        parse_table_value(&body)
    }

    fn observe(&self, metric: Metric, coordinate: &Coordinate) -> Observation {
        match self.fetch_metric(metric, coordinate) {
            Ok(value) => {
                logging::debug(
                    logging::DataSource::Erddap,
                    Some(&coordinate.to_string()),
                    &format!("{} = {} {}", metric, value, metric.unit()),
                );
                Observation::Fetched(value)
            }
            Err(err) => {
                logging::log_observation_failure(
                    &coordinate.to_string(),
                    &format!("{} fetch", metric),
                    &err,
                );
                Observation::Unavailable
            }
        }
    }
}

impl ObservationSource for ErddapClient {
    fn fetch_temperature(&self, coordinate: &Coordinate) -> Observation {
        self.observe(Metric::SeaSurfaceTemperature, coordinate)
    }

    fn fetch_wave_height(&self, coordinate: &Coordinate) -> Observation {
        self.observe(Metric::WaveHeight, coordinate)
    }
}

// ============================================================================
// Tests
// ============================================================================
