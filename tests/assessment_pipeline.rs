/// End-to-end tests for the assessment pipeline with scripted collaborators.
///
/// These tests verify:
/// 1. Invalid requests make no external calls
/// 2. The warm-water short-circuit skips fetching and classification
/// 3. Missing observations are zero-filled and classification proceeds
/// 4. Alerts go out only for the tiers that warrant them
/// 5. An unavailable model or a failed alert is handled as documented
///
/// Run with: cargo test --test assessment_pipeline

mod common;

use std::sync::Arc;
use std::thread;

use common::{Harness, HarnessOptions, ModelScript, SENDER};
use turtle_risk_service::alert::tiers::{HIGH_RISK_TEXT, MODERATE_RISK_TEXT, SAFE_TO_FISH_TEXT};
use turtle_risk_service::assessment::Decision;
use turtle_risk_service::classifier::ClassifierError;
use turtle_risk_service::model::ValidationError;
use turtle_risk_service::{AssessmentError, AssessmentRequest, Observation, RiskLabel};

fn classified(code: i64) -> Harness {
    Harness::new(HarnessOptions {
        model: Some(ModelScript::Code(code)),
        ..HarnessOptions::default()
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[test]
fn test_missing_coordinate_makes_no_calls() {
    let h = classified(2);
    let request = AssessmentRequest {
        latitude: Some(25.0),
        sst: Some(29.5),
        contact: Some("+15551234567".into()),
        ..AssessmentRequest::default()
    };

    let err = h.assessor.assess(&request).unwrap_err();
    assert_eq!(err, AssessmentError::InvalidInput(ValidationError::MissingCoordinate));
    assert_eq!(h.source.total_calls(), 0);
    assert_eq!(h.model_calls(), 0);
    assert!(h.sent().is_empty());
}

#[test]
fn test_out_of_range_coordinate_makes_no_calls() {
    let h = classified(2);
    let err = h
        .assessor
        .assess(&AssessmentRequest::at(95.0, -80.0).with_contact("+15551234567"))
        .unwrap_err();

    assert_eq!(err, AssessmentError::InvalidInput(ValidationError::LatitudeOutOfRange(95.0)));
    assert_eq!(h.source.total_calls(), 0);
    assert_eq!(h.model_calls(), 0);
}

// ---------------------------------------------------------------------------
// Short-circuit
// ---------------------------------------------------------------------------

#[test]
fn test_warm_water_short_circuits_and_sends_safe_text() {
    let h = classified(2);
    let request = AssessmentRequest::at(25.0, -80.0)
        .with_sst(29.5)
        .with_contact("+15551234567");

    let assessment = h.assessor.assess(&request).unwrap();
    assert_eq!(assessment.decision, Decision::ShortCircuit);
    assert_eq!(assessment.result.sst, Some(29.5));
    assert_eq!(assessment.result.wave_height, None);
    assert_eq!(assessment.result.risk, RiskLabel::Low);

    assert!(assessment.alert.expect("alert dispatched").wait());
    assert_eq!(h.source.total_calls(), 0);
    assert_eq!(h.model_calls(), 0);

    let sent = h.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].body, SAFE_TO_FISH_TEXT);
    assert_eq!(sent[0].recipient, "+15551234567");
    assert_eq!(sent[0].sender, SENDER);
}

#[test]
fn test_short_circuit_without_contact_sends_nothing() {
    let h = classified(2);
    let assessment = h
        .assessor
        .assess(&AssessmentRequest::at(25.0, -80.0).with_sst(31.0))
        .unwrap();

    assert_eq!(assessment.result.risk, RiskLabel::Low);
    assert!(assessment.alert.is_none());
    assert!(h.sent().is_empty());
}

#[test]
fn test_threshold_is_strict() {
    let h = Harness::new(HarnessOptions {
        sst: Observation::Fetched(27.9),
        model: Some(ModelScript::Code(1)),
        ..HarnessOptions::default()
    });

    let assessment = h
        .assessor
        .assess(&AssessmentRequest::at(25.0, -80.0).with_sst(28.0))
        .unwrap();

    assert_eq!(assessment.decision, Decision::Classified);
    assert_eq!(assessment.result.risk, RiskLabel::Moderate);
    assert_eq!(h.model_calls(), 1);
    assert_eq!(h.source.total_calls(), 2);
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[test]
fn test_fetched_values_feed_the_model_and_the_response() {
    let h = Harness::new(HarnessOptions {
        sst: Observation::Fetched(26.5),
        wave_height: Observation::Fetched(1.2),
        model: Some(ModelScript::Code(0)),
        ..HarnessOptions::default()
    });

    let assessment = h.assessor.assess(&AssessmentRequest::at(25.0, -80.0)).unwrap();
    assert_eq!(assessment.result.sst, Some(26.5));
    assert_eq!(assessment.result.wave_height, Some(1.2));

    let input = h.model.as_ref().unwrap().last_input().unwrap();
    assert_eq!(input, vec![25.0, -80.0, 26.5, 1.2]);
}

#[test]
fn test_failed_fetches_are_zero_filled() {
    let h = classified(1);

    let assessment = h.assessor.assess(&AssessmentRequest::at(25.0, -80.0)).unwrap();
    assert_eq!(assessment.result.sst, None);
    assert_eq!(assessment.result.wave_height, None);
    assert_eq!(assessment.result.risk, RiskLabel::Moderate);

    let input = h.model.as_ref().unwrap().last_input().unwrap();
    assert_eq!(input, vec![25.0, -80.0, 0.0, 0.0]);
}

#[test]
fn test_client_sst_at_or_below_threshold_is_not_used() {
    let h = classified(0);

    let assessment = h
        .assessor
        .assess(&AssessmentRequest::at(25.0, -80.0).with_sst(20.0))
        .unwrap();

    assert_eq!(assessment.result.sst, None);
    let input = h.model.as_ref().unwrap().last_input().unwrap();
    assert_eq!(input[2], 0.0);
}

#[test]
fn test_high_risk_alerts_with_null_readings() {
    let h = classified(2);

    let assessment = h
        .assessor
        .assess(&AssessmentRequest::at(25.0, -80.0).with_contact("+15551234567"))
        .unwrap();

    let json = serde_json::to_value(&assessment.result).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "latitude": 25.0,
            "longitude": -80.0,
            "SST": null,
            "wave_height": null,
            "risk": "High Risk",
        })
    );

    assert!(assessment.alert.expect("alert dispatched").wait());
    let sent = h.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].body, HIGH_RISK_TEXT);
}

#[test]
fn test_moderate_risk_alerts() {
    let h = classified(1);
    let assessment = h
        .assessor
        .assess(&AssessmentRequest::at(25.0, -80.0).with_contact("+15551234567"))
        .unwrap();

    assert!(assessment.alert.expect("alert dispatched").wait());
    assert_eq!(h.sent()[0].body, MODERATE_RISK_TEXT);
}

#[test]
fn test_classified_low_risk_sends_nothing() {
    let h = classified(0);
    let assessment = h
        .assessor
        .assess(&AssessmentRequest::at(25.0, -80.0).with_contact("+15551234567"))
        .unwrap();

    assert_eq!(assessment.result.risk, RiskLabel::Low);
    assert!(assessment.alert.is_none());
    assert!(h.sent().is_empty());
}

#[test]
fn test_unrecognized_code_is_unknown_risk_without_alert() {
    let h = classified(7);
    let assessment = h
        .assessor
        .assess(&AssessmentRequest::at(25.0, -80.0).with_contact("+15551234567"))
        .unwrap();

    assert_eq!(assessment.result.risk, RiskLabel::Unknown);
    assert!(assessment.alert.is_none());
    assert!(h.sent().is_empty());
}

#[test]
fn test_blank_contact_is_treated_as_absent() {
    let h = classified(2);
    let assessment = h
        .assessor
        .assess(&AssessmentRequest::at(25.0, -80.0).with_contact("   "))
        .unwrap();

    assert_eq!(assessment.result.risk, RiskLabel::High);
    assert!(assessment.alert.is_none());
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn test_unavailable_model_fails_every_valid_request() {
    let h = Harness::new(HarnessOptions {
        model: None,
        ..HarnessOptions::default()
    });

    let requests = [
        AssessmentRequest::at(25.0, -80.0),
        AssessmentRequest::at(25.0, -80.0).with_sst(29.5).with_contact("+15551234567"),
        AssessmentRequest::at(-10.0, 140.0).with_sst(15.0),
    ];

    for request in &requests {
        let err = h.assessor.assess(request).unwrap_err();
        assert!(matches!(
            err,
            AssessmentError::Classifier(ClassifierError::ModelUnavailable(_))
        ));
    }
    assert_eq!(h.source.total_calls(), 0);
    assert!(h.sent().is_empty());
}

#[test]
fn test_model_error_is_prediction_failure() {
    let h = Harness::new(HarnessOptions {
        model: Some(ModelScript::Fail),
        ..HarnessOptions::default()
    });

    let err = h
        .assessor
        .assess(&AssessmentRequest::at(25.0, -80.0).with_contact("+15551234567"))
        .unwrap_err();

    assert!(matches!(
        err,
        AssessmentError::Classifier(ClassifierError::PredictionFailed(_))
    ));
    assert!(h.sent().is_empty());
}

#[test]
fn test_rejected_alert_does_not_change_the_result() {
    let h = Harness::new(HarnessOptions {
        model: Some(ModelScript::Code(2)),
        provider_fails: true,
        ..HarnessOptions::default()
    });

    let assessment = h
        .assessor
        .assess(&AssessmentRequest::at(25.0, -80.0).with_contact("+10000000000"))
        .unwrap();

    assert_eq!(assessment.result.risk, RiskLabel::High);
    assert!(!assessment.alert.expect("alert dispatched").wait());
    assert_eq!(h.sent().len(), 1);
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn test_concurrent_requests_are_independent() {
    let h = Harness::new(HarnessOptions {
        sst: Observation::Fetched(26.0),
        wave_height: Observation::Fetched(0.8),
        model: Some(ModelScript::Code(1)),
        ..HarnessOptions::default()
    });
    let assessor = Arc::new(h.assessor.clone());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let assessor = Arc::clone(&assessor);
            thread::spawn(move || {
                let latitude = 20.0 + i as f64;
                let assessment = assessor
                    .assess(&AssessmentRequest::at(latitude, -80.0))
                    .unwrap();
                (latitude, assessment.result)
            })
        })
        .collect();

    for handle in handles {
        let (latitude, result) = handle.join().unwrap();
        assert_eq!(result.coordinate.latitude, latitude);
        assert_eq!(result.sst, Some(26.0));
        assert_eq!(result.risk, RiskLabel::Moderate);
    }
    assert_eq!(h.model_calls(), 8);
    assert_eq!(h.source.total_calls(), 16);
}
