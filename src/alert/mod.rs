//! Risk alerting.
//!
//! Maps an assessment outcome to the fixed SMS text a contact receives and
//! delivers it through the messaging provider without ever blocking or
//! failing the assessment.
//!
//! Submodules:
//! - `tiers`: which outcomes alert, and with what text.
//! - `twilio`: messaging-provider client.
//! - `dispatch`: best-effort, fire-and-forget delivery.

pub mod dispatch;
pub mod tiers;
pub mod twilio;

pub use dispatch::{AlertDispatcher, AlertTask};
pub use tiers::{AlertMessage, AlertTier};
pub use twilio::{MessagingProvider, ProviderConnector, ProviderError, TwilioConnector};
