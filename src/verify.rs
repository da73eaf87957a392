//! Data Source Verification Module
//!
//! Checks the configured collaborators against a probe coordinate so an
//! operator can tell, before taking traffic, which inputs the assessment
//! pipeline will actually get: each ERDDAP dataset, the model file, and the
//! messaging credentials.

use chrono::Utc;
use serde::Serialize;
use std::error::Error;
use std::path::Path;

use crate::analysis::features::MissingValuePolicy;
use crate::classifier::ForestModel;
use crate::config::{MessagingCredentials, ServiceConfig};
use crate::ingest::erddap::ErddapClient;
use crate::logging::{self, DataSource};
use crate::model::{Coordinate, Metric, Observation, RiskLabel};

/// Open water off the Florida Keys; inside both default datasets' grids.
pub const DEFAULT_PROBE_LATITUDE: f64 = 24.4;
pub const DEFAULT_PROBE_LONGITUDE: f64 = -81.6;

// ============================================================================
// Verification Results
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub timestamp: String,
    pub probe: Coordinate,
    pub datasets: Vec<DatasetVerification>,
    pub model: ModelVerification,
    pub messaging: MessagingVerification,
    pub summary: VerificationSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationSummary {
    pub total: usize,
    pub working: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetVerification {
    pub metric: String,
    pub url: String,
    pub status: VerificationStatus,
    pub value: Option<f64>,
    pub unit: String,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelVerification {
    pub path: String,
    pub status: VerificationStatus,
    pub tree_count: usize,
    /// Label for the probe coordinate with both readings missing.
    pub sample_risk: Option<RiskLabel>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessagingVerification {
    pub status: VerificationStatus,
    pub credentials_present: bool,
    pub sender_configured: bool,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub enum VerificationStatus {
    Success,
    PartialSuccess,
    Failed,
}

// ============================================================================
// Individual Checks
// ============================================================================

pub fn verify_dataset(client: &ErddapClient, metric: Metric, probe: &Coordinate) -> DatasetVerification {
    let mut result = DatasetVerification {
        metric: metric.to_string(),
        url: client.url_for(metric, probe),
        status: VerificationStatus::Failed,
        value: None,
        unit: metric.unit().to_string(),
        error_message: None,
    };

    match client.fetch_metric(metric, probe) {
        Ok(value) => {
            result.value = Some(value);
            result.status = VerificationStatus::Success;
        }
        Err(e) => {
            result.error_message = Some(e.to_string());
        }
    }

    result
}

pub fn verify_model(path: &Path, probe: &Coordinate) -> ModelVerification {
    let mut result = ModelVerification {
        path: path.display().to_string(),
        status: VerificationStatus::Failed,
        tree_count: 0,
        sample_risk: None,
        error_message: None,
    };

    let model = match ForestModel::load(path) {
        Ok(model) => model,
        Err(e) => {
            result.error_message = Some(e.to_string());
            return result;
        }
    };
    result.tree_count = model.tree_count();

    let features =
        MissingValuePolicy::ZeroFill.build(probe, Observation::Unavailable, Observation::Unavailable);
    match model.predict_class(features.as_slice()) {
        Ok(code) => {
            result.sample_risk = Some(RiskLabel::from_code(code));
            result.status = VerificationStatus::Success;
        }
        Err(e) => {
            // Loads but cannot score the 4-feature vector
            result.error_message = Some(format!("Sample prediction failed: {}", e));
            result.status = VerificationStatus::PartialSuccess;
        }
    }

    result
}

/// Presence check only; no message is sent.
pub fn verify_messaging(credentials: &MessagingCredentials, sender: Option<&str>) -> MessagingVerification {
    let credentials_present = credentials.is_complete();
    let sender_configured = sender.is_some_and(|s| !s.trim().is_empty());

    let status = match (credentials_present, sender_configured) {
        (true, true) => VerificationStatus::Success,
        (false, false) => VerificationStatus::Failed,
        _ => VerificationStatus::PartialSuccess,
    };

    MessagingVerification {
        status,
        credentials_present,
        sender_configured,
    }
}

// ============================================================================
// Full Verification Runner
// ============================================================================

fn summarize(
    datasets: &[DatasetVerification],
    model: &ModelVerification,
    messaging: &MessagingVerification,
) -> VerificationSummary {
    let statuses: Vec<VerificationStatus> = datasets
        .iter()
        .map(|d| d.status)
        .chain([model.status, messaging.status])
        .collect();
    let failed = statuses
        .iter()
        .filter(|s| **s == VerificationStatus::Failed)
        .count();

    VerificationSummary {
        total: statuses.len(),
        working: statuses.len() - failed,
        failed,
    }
}

/// Run every check at `probe`. Progress goes to stderr so the report can
/// be piped.
pub fn run_full_verification(
    config: &ServiceConfig,
    credentials: &MessagingCredentials,
    probe: Coordinate,
) -> Result<VerificationReport, Box<dyn Error>> {
    let client = ErddapClient::new(config.erddap.clone())?;

    eprintln!("🔍 Verifying ERDDAP datasets at {}...", probe);
    let mut datasets = Vec::new();
    for metric in [Metric::SeaSurfaceTemperature, Metric::WaveHeight] {
        eprint!("  {} ... ", metric);
        let result = verify_dataset(&client, metric, &probe);
        match (&result.value, &result.error_message) {
            (Some(v), _) => eprintln!("✓ OK ({} {})", v, result.unit),
            (None, err) => eprintln!("✗ FAILED: {}", err.as_deref().unwrap_or("Unknown")),
        }
        datasets.push(result);
    }

    eprintln!("\n🔍 Verifying model...");
    let model = verify_model(&config.model.path, &probe);
    match model.status {
        VerificationStatus::Success => eprintln!(
            "  ✓ OK ({} trees, probe → {})",
            model.tree_count,
            model.sample_risk.map(|r| r.as_str()).unwrap_or("-")
        ),
        _ => eprintln!(
            "  ✗ {}",
            model.error_message.as_deref().unwrap_or("Unknown")
        ),
    }

    eprintln!("\n🔍 Verifying messaging configuration...");
    let messaging = verify_messaging(credentials, config.alerts.sender.as_deref());
    eprintln!(
        "  credentials: {}, sender: {}",
        if messaging.credentials_present { "present" } else { "missing" },
        if messaging.sender_configured { "configured" } else { "missing" }
    );

    let summary = summarize(&datasets, &model, &messaging);
    logging::log_check_summary(DataSource::System, summary.total, summary.working, summary.failed);

    Ok(VerificationReport {
        timestamp: Utc::now().to_rfc3339(),
        probe,
        datasets,
        model,
        messaging,
        summary,
    })
}

pub fn print_summary(report: &VerificationReport) {
    println!("\n═══════════════════════════════════════════════════════════");
    println!("📊 VERIFICATION SUMMARY");
    println!("═══════════════════════════════════════════════════════════");
    println!();
    for dataset in &report.datasets {
        println!("{:<16} {:?}", dataset.metric, dataset.status);
    }
    println!("{:<16} {:?}", "model", report.model.status);
    println!("{:<16} {:?}", "messaging", report.messaging.status);
    println!();

    let success_rate = if report.summary.total > 0 {
        (report.summary.working as f64 / report.summary.total as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Overall: {:.1}% ({}/{} working)",
        success_rate, report.summary.working, report.summary.total
    );
    println!("═══════════════════════════════════════════════════════════");
}
