//! Best-effort alert delivery.
//!
//! [`AlertDispatcher::send`] never fails: every provider error becomes
//! `false` and a log line. [`AlertDispatcher::dispatch`] runs the send on
//! its own thread and hands back an [`AlertTask`] the caller may wait on or
//! simply drop.

use std::sync::Arc;
use std::thread::JoinHandle;

use crate::alert::tiers::AlertMessage;
use crate::alert::twilio::{ProviderConnector, ProviderError};
use crate::config::ENV_SENDER;
use crate::logging::{self, DataSource};

#[derive(Clone)]
pub struct AlertDispatcher {
    connector: Arc<dyn ProviderConnector>,
    sender: Option<String>,
}

impl AlertDispatcher {
    pub fn new(connector: Arc<dyn ProviderConnector>, sender: Option<String>) -> Self {
        Self { connector, sender }
    }

    /// Deliver `body` to `contact`. Returns whether the provider accepted it.
    pub fn send(&self, contact: &str, body: &str) -> bool {
        match self.try_send(contact, body) {
            Ok(message_id) => {
                logging::info(
                    DataSource::Sms,
                    Some(&logging::mask_contact(contact)),
                    &format!("SMS sent successfully ({})", message_id),
                );
                true
            }
            Err(err) => {
                logging::log_alert_failure(contact, &err);
                false
            }
        }
    }

    fn try_send(&self, contact: &str, body: &str) -> Result<String, ProviderError> {
        let sender = self
            .sender
            .as_deref()
            .ok_or(ProviderError::MissingCredentials(ENV_SENDER))?;
        let provider = self.connector.connect()?;
        provider.send_message(body, sender, contact)
    }

    /// Send `message` on a background thread.
    ///
    /// The returned task is detached when dropped; its outcome is only ever
    /// logged.
    pub fn dispatch(&self, message: AlertMessage) -> AlertTask {
        let dispatcher = self.clone();
        let spawned = std::thread::Builder::new()
            .name("alert-dispatch".to_string())
            .spawn(move || dispatcher.send(&message.recipient, &message.body));

        match spawned {
            Ok(handle) => AlertTask { handle: Some(handle) },
            Err(err) => {
                logging::error(
                    DataSource::Sms,
                    None,
                    &format!("Could not start alert dispatch: {}", err),
                );
                AlertTask { handle: None }
            }
        }
    }
}

/// Handle to an in-flight alert.
#[derive(Debug)]
pub struct AlertTask {
    handle: Option<JoinHandle<bool>>,
}

impl AlertTask {
    /// Block until the send finishes. A panicked or never-started send
    /// counts as not delivered.
    pub fn wait(self) -> bool {
        match self.handle {
            Some(handle) => handle.join().unwrap_or(false),
            None => false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }
}
