//! Scripted collaborators for driving the assessment pipeline offline.

#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use turtle_risk_service::alert::{
    AlertDispatcher, MessagingProvider, ProviderConnector, ProviderError,
};
use turtle_risk_service::classifier::{RiskClassifier, RiskModel};
use turtle_risk_service::ingest::ObservationSource;
use turtle_risk_service::{Coordinate, Observation, RiskAssessor};

pub const SENDER: &str = "+15550000000";

// ---------------------------------------------------------------------------
// Observation source
// ---------------------------------------------------------------------------

pub struct ScriptedSource {
    sst: Observation,
    wave_height: Observation,
    pub temperature_calls: AtomicUsize,
    pub wave_calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(sst: Observation, wave_height: Observation) -> Self {
        Self {
            sst,
            wave_height,
            temperature_calls: AtomicUsize::new(0),
            wave_calls: AtomicUsize::new(0),
        }
    }

    pub fn total_calls(&self) -> usize {
        self.temperature_calls.load(Ordering::SeqCst) + self.wave_calls.load(Ordering::SeqCst)
    }
}

impl ObservationSource for ScriptedSource {
    fn fetch_temperature(&self, _: &Coordinate) -> Observation {
        self.temperature_calls.fetch_add(1, Ordering::SeqCst);
        self.sst
    }

    fn fetch_wave_height(&self, _: &Coordinate) -> Observation {
        self.wave_calls.fetch_add(1, Ordering::SeqCst);
        self.wave_height
    }
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

pub enum ModelScript {
    Code(i64),
    Fail,
}

pub struct ScriptedModel {
    script: ModelScript,
    pub inputs: Mutex<Vec<Vec<f64>>>,
}

impl ScriptedModel {
    pub fn new(script: ModelScript) -> Self {
        Self {
            script,
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.inputs.lock().unwrap().len()
    }

    pub fn last_input(&self) -> Option<Vec<f64>> {
        self.inputs.lock().unwrap().last().cloned()
    }
}

impl RiskModel for ScriptedModel {
    fn predict(&self, features: &[f64]) -> Result<i64, Box<dyn std::error::Error + Send + Sync>> {
        self.inputs.lock().unwrap().push(features.to_vec());
        match self.script {
            ModelScript::Code(code) => Ok(code),
            ModelScript::Fail => Err("X has 3 features, but model is expecting 4".into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Messaging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub body: String,
    pub sender: String,
    pub recipient: String,
}

pub type Outbox = Arc<Mutex<Vec<SentMessage>>>;

struct RecordingProvider {
    outbox: Outbox,
    fail: bool,
}

impl MessagingProvider for RecordingProvider {
    fn send_message(&self, body: &str, sender: &str, recipient: &str) -> Result<String, ProviderError> {
        self.outbox.lock().unwrap().push(SentMessage {
            body: body.to_string(),
            sender: sender.to_string(),
            recipient: recipient.to_string(),
        });
        if self.fail {
            Err(ProviderError::Rejected {
                status: 400,
                message: "The 'To' number +10000000000 is not a valid phone number.".into(),
            })
        } else {
            Ok("SM00000000000000000000000000000000".to_string())
        }
    }
}

pub struct RecordingConnector {
    outbox: Outbox,
    fail: bool,
}

impl ProviderConnector for RecordingConnector {
    fn connect(&self) -> Result<Box<dyn MessagingProvider>, ProviderError> {
        Ok(Box::new(RecordingProvider {
            outbox: Arc::clone(&self.outbox),
            fail: self.fail,
        }))
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct HarnessOptions {
    pub sst: Observation,
    pub wave_height: Observation,
    /// `None` leaves the classifier unavailable.
    pub model: Option<ModelScript>,
    pub provider_fails: bool,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            sst: Observation::Unavailable,
            wave_height: Observation::Unavailable,
            model: Some(ModelScript::Code(0)),
            provider_fails: false,
        }
    }
}

pub struct Harness {
    pub source: Arc<ScriptedSource>,
    pub model: Option<Arc<ScriptedModel>>,
    pub outbox: Outbox,
    pub assessor: RiskAssessor,
}

impl Harness {
    pub fn new(options: HarnessOptions) -> Self {
        let source = Arc::new(ScriptedSource::new(options.sst, options.wave_height));

        let model = options.model.map(|script| Arc::new(ScriptedModel::new(script)));
        let classifier = match &model {
            Some(model) => RiskClassifier::ready(Arc::clone(model) as Arc<dyn RiskModel>),
            None => RiskClassifier::unavailable("Failed to read model file turtle_risk_model.json"),
        };

        let outbox: Outbox = Arc::new(Mutex::new(Vec::new()));
        let connector = RecordingConnector {
            outbox: Arc::clone(&outbox),
            fail: options.provider_fails,
        };
        let dispatcher = AlertDispatcher::new(Arc::new(connector), Some(SENDER.to_string()));

        let assessor = RiskAssessor::new(
            Arc::clone(&source) as Arc<dyn ObservationSource>,
            classifier,
            dispatcher,
        );

        Self {
            source,
            model,
            outbox,
            assessor,
        }
    }

    pub fn model_calls(&self) -> usize {
        self.model.as_ref().map(|m| m.calls()).unwrap_or(0)
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.outbox.lock().unwrap().clone()
    }
}

// ---------------------------------------------------------------------------
// One-shot HTTP stub
// ---------------------------------------------------------------------------

/// What the stub saw: the request line and the request body.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub request_line: String,
    pub body: String,
}

/// Answer exactly one HTTP request on a loopback port with `status` and
/// `body`. Returns the base URL and a handle yielding the captured request.
pub fn serve_once(status: u16, body: &str) -> (String, JoinHandle<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let body = body.to_string();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());

        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();

        let mut content_length = 0usize;
        loop {
            let mut header = String::new();
            reader.read_line(&mut header).unwrap();
            let header = header.trim_end();
            if header.is_empty() {
                break;
            }
            if let Some((name, value)) = header.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap();
                }
            }
        }

        let mut request_body = vec![0u8; content_length];
        reader.read_exact(&mut request_body).unwrap();

        let response = format!(
            "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();

        CapturedRequest {
            request_line: request_line.trim_end().to_string(),
            body: String::from_utf8(request_body).unwrap(),
        }
    });

    (base_url, handle)
}
