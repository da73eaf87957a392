//! Alert tiers and their fixed message texts.

use crate::model::RiskLabel;

pub const SAFE_TO_FISH_TEXT: &str = "Low Risk: The sea temperature is above 28°C. Safe to fish.";
pub const MODERATE_RISK_TEXT: &str = "Moderate Risk: Beware of sea turtles in the area.";
pub const HIGH_RISK_TEXT: &str = "High Risk: Avoid fishing in this area due to turtle presence.";

/// Outcomes that notify a contact, in ascending order of severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AlertTier {
    /// Low risk decided by the warm-water short-circuit, not the model.
    SafeToFish,
    Moderate,
    High,
}

impl AlertTier {
    pub fn body(&self) -> &'static str {
        match self {
            AlertTier::SafeToFish => SAFE_TO_FISH_TEXT,
            AlertTier::Moderate => MODERATE_RISK_TEXT,
            AlertTier::High => HIGH_RISK_TEXT,
        }
    }

    /// Tier for a label produced by the classifier.
    ///
    /// A classified Low does not alert; only the short-circuit sends the
    /// safe-to-fish text. Unknown never alerts.
    pub fn for_classified(label: RiskLabel) -> Option<AlertTier> {
        match label {
            RiskLabel::Moderate => Some(AlertTier::Moderate),
            RiskLabel::High => Some(AlertTier::High),
            RiskLabel::Low | RiskLabel::Unknown => None,
        }
    }
}

/// A notification ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub recipient: String,
    pub body: String,
    pub tier: AlertTier,
}

impl AlertMessage {
    pub fn new(recipient: impl Into<String>, tier: AlertTier) -> Self {
        Self {
            recipient: recipient.into(),
            body: tier.body().to_string(),
            tier,
        }
    }
}
