//! # Fastener Advisories
//!
//! Rule-driven notes shown next to the torque result:
//!
//! - [`nut_pairing`] - is the chosen nut a recommended partner for the stud
//!   grade, and does a mismatch need the technician's acknowledgement
//! - [`washer`] - galling, corrosion and bearing-surface advice
//!
//! Advisories never block a calculation. Only an unacknowledged nut mismatch
//! blocks saving a form.

pub mod nut_pairing;
pub mod washer;

pub use nut_pairing::{NutPairingConfig, NutRecommendation, PairingEvaluation, PairingRule, WarningRule};
pub use washer::{washer_messages, BearingSurface, WasherContext};

use serde::{Deserialize, Serialize};

/// Advisory severity. `High` requires acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[serde(alias = "INFO", alias = "Info")]
    Info,
    #[serde(alias = "WARN", alias = "Warn", alias = "warning")]
    Warn,
    #[serde(alias = "HIGH", alias = "High")]
    High,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::High => "HIGH",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A message with its severity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    pub severity: Severity,
    pub message: String,
}

impl Advisory {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Advisory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}
