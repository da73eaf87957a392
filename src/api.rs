//! Inbound JSON surface.
//!
//! Decodes request bodies, runs the matching operation and maps the outcome
//! to a status code plus JSON body. Routing and HTTP framing belong to
//! whatever server embeds this crate.

use serde_json::{Map, Value, json};

use crate::alert::AlertTask;
use crate::assessment::{AssessmentError, AssessmentRequest, RiskAssessor};
use crate::classifier::ClassifierError;
use crate::model::ValidationError;
use crate::users::{self, DirectoryError, UserDirectory};

pub const STATUS_OK: u16 = 200;
pub const STATUS_CREATED: u16 = 201;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_UNAUTHORIZED: u16 = 401;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

/// A status code and JSON body, ready for framing.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        Self::new(status, json!({ "error": message.into() }))
    }

    fn message(status: u16, message: impl Into<String>) -> Self {
        Self::new(status, json!({ "message": message.into() }))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// ---------------------------------------------------------------------------
// Request decoding
// ---------------------------------------------------------------------------

fn optional_number(body: &Map<String, Value>, field: &'static str) -> Result<Option<f64>, ValidationError> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or(ValidationError::NotNumeric { field }),
    }
}

fn optional_text(body: &Map<String, Value>, field: &'static str) -> Result<Option<String>, ValidationError> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ValidationError::NotText { field }),
    }
}

/// Decode `{latitude, longitude, sst?, contact?}`. `phone_number` is
/// accepted in place of `contact`.
pub fn parse_assessment_request(payload: &Value) -> Result<AssessmentRequest, ValidationError> {
    let Some(body) = payload.as_object() else {
        return Err(ValidationError::MissingCoordinate);
    };

    let contact = match optional_text(body, "contact")? {
        Some(contact) => Some(contact),
        None => optional_text(body, "phone_number")?,
    };

    Ok(AssessmentRequest {
        latitude: optional_number(body, "latitude")?,
        longitude: optional_number(body, "longitude")?,
        sst: optional_number(body, "sst")?,
        contact,
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn assessment_error_response(err: &AssessmentError) -> ApiResponse {
    match err {
        AssessmentError::InvalidInput(ValidationError::MissingCoordinate) => {
            ApiResponse::error(STATUS_BAD_REQUEST, "Latitude and Longitude are required")
        }
        AssessmentError::InvalidInput(other) => ApiResponse::error(STATUS_BAD_REQUEST, other.to_string()),
        AssessmentError::Classifier(ClassifierError::ModelUnavailable(_)) => {
            ApiResponse::error(STATUS_INTERNAL_ERROR, "AI model is unavailable")
        }
        AssessmentError::Classifier(ClassifierError::PredictionFailed(_)) => {
            ApiResponse::error(STATUS_INTERNAL_ERROR, "Prediction failed")
        }
    }
}

/// "Assess risk". Returns the response and, when an alert was sent, its
/// in-flight task; callers that only answer the request can drop it.
pub fn handle_assess(assessor: &RiskAssessor, payload: &Value) -> (ApiResponse, Option<AlertTask>) {
    let outcome = parse_assessment_request(payload)
        .map_err(AssessmentError::from)
        .and_then(|request| assessor.assess(&request));

    match outcome {
        Ok(assessment) => {
            let body = serde_json::to_value(&assessment.result).unwrap_or(Value::Null);
            (ApiResponse::new(STATUS_OK, body), assessment.alert)
        }
        Err(err) => (assessment_error_response(&err), None),
    }
}

fn directory_error_response(err: &DirectoryError) -> ApiResponse {
    match err {
        DirectoryError::MissingField | DirectoryError::AlreadyExists => {
            ApiResponse::error(STATUS_BAD_REQUEST, err.to_string())
        }
        DirectoryError::InvalidCredentials => ApiResponse::error(STATUS_UNAUTHORIZED, err.to_string()),
        DirectoryError::Backend(_) => ApiResponse::error(STATUS_INTERNAL_ERROR, err.to_string()),
    }
}

fn credentials(payload: &Value) -> (&str, &str) {
    let field = |name: &str| payload.get(name).and_then(Value::as_str).unwrap_or("");
    (field("username"), field("phone_number"))
}

pub fn handle_register(directory: &dyn UserDirectory, payload: &Value) -> ApiResponse {
    let (username, phone_number) = credentials(payload);
    match users::register(directory, username, phone_number) {
        Ok(_) => ApiResponse::message(STATUS_CREATED, "User registered successfully"),
        Err(err) => directory_error_response(&err),
    }
}

pub fn handle_login(directory: &dyn UserDirectory, payload: &Value) -> ApiResponse {
    let (username, phone_number) = credentials(payload);
    match users::login(directory, username, phone_number) {
        Ok(user) => ApiResponse::message(STATUS_OK, format!("Welcome back, {}!", user.username)),
        Err(err) => directory_error_response(&err),
    }
}
