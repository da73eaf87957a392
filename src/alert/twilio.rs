/// Twilio Programmable Messaging client
///
/// Sends one SMS per call through the Messages REST resource. A fresh HTTP
/// client is built on every connect; no connection state outlives a send.
///
/// API documentation: https://www.twilio.com/docs/messaging/api/message-resource

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::config::{AlertConfig, ENV_ACCOUNT_SID, ENV_AUTH_TOKEN, MessagingCredentials};

// ============================================================================
// Provider Abstraction
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("Missing messaging credentials: {0}")]
    MissingCredentials(&'static str),
    #[error("Provider rejected message: HTTP {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("Transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Transport(err.to_string())
    }
}

/// A connected messaging client.
pub trait MessagingProvider {
    /// Send `body` from `sender` to `recipient`, returning the provider's
    /// message id.
    fn send_message(&self, body: &str, sender: &str, recipient: &str) -> Result<String, ProviderError>;
}

/// Builds a [`MessagingProvider`] for a single send.
pub trait ProviderConnector: Send + Sync {
    fn connect(&self) -> Result<Box<dyn MessagingProvider>, ProviderError>;
}

// ============================================================================
// Twilio Response Structures
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TwilioMessageResponse {
    pub sid: String,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TwilioErrorResponse {
    pub code: Option<i64>,
    pub message: Option<String>,
}

// ============================================================================
// Client
// ============================================================================

pub struct TwilioClient {
    http: reqwest::blocking::Client,
    api_base: String,
    account_sid: String,
    auth_token: String,
}

impl TwilioClient {
    pub fn messages_url(api_base: &str, account_sid: &str) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            api_base.trim_end_matches('/'),
            account_sid
        )
    }
}

impl MessagingProvider for TwilioClient {
    fn send_message(&self, body: &str, sender: &str, recipient: &str) -> Result<String, ProviderError> {
        let url = Self::messages_url(&self.api_base, &self.account_sid);
        let form = [("To", recipient), ("From", sender), ("Body", body)];

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()?;

        let status = response.status();
        let text = response.text()?;

        if !status.is_success() {
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                message: describe_error_body(&text),
            });
        }

        let created: TwilioMessageResponse = serde_json::from_str(&text)
            .map_err(|e| ProviderError::Transport(format!("unexpected response body: {}", e)))?;
        Ok(created.sid)
    }
}

fn describe_error_body(text: &str) -> String {
    match serde_json::from_str::<TwilioErrorResponse>(text) {
        Ok(TwilioErrorResponse {
            code: Some(code),
            message: Some(message),
        }) => format!("{} (code {})", message, code),
        Ok(TwilioErrorResponse {
            message: Some(message),
            ..
        }) => message,
        _ => "no error detail".to_string(),
    }
}

// ============================================================================
// Connector
// ============================================================================

/// Holds credentials and settings; creates a [`TwilioClient`] per send.
pub struct TwilioConnector {
    credentials: MessagingCredentials,
    api_base: String,
    timeout: Duration,
}

impl TwilioConnector {
    pub fn new(credentials: MessagingCredentials, config: &AlertConfig) -> Self {
        Self {
            credentials,
            api_base: config.api_base.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

impl ProviderConnector for TwilioConnector {
    fn connect(&self) -> Result<Box<dyn MessagingProvider>, ProviderError> {
        let account_sid = self
            .credentials
            .account_sid
            .clone()
            .ok_or(ProviderError::MissingCredentials(ENV_ACCOUNT_SID))?;
        let auth_token = self
            .credentials
            .auth_token
            .clone()
            .ok_or(ProviderError::MissingCredentials(ENV_AUTH_TOKEN))?;

        let http = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;

        Ok(Box::new(TwilioClient {
            http,
            api_base: self.api_base.clone(),
            account_sid,
            auth_token,
        }))
    }
}
