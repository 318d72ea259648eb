//! Nut-to-stud pairing rules.
//!
//! Rules are data (`data/nut_pairing.json`), keyed by the stud's
//! `{spec, grade, class}`. Each rule lists the recommended nut grades and
//! three kinds of warning:
//!
//! - `boltPropertyWarnings` - fire for stainless studs regardless of nut
//! - `specialWarnings` - fire when the nut is one particular grade
//! - `mismatchWarnings` - fire when the nut is not a recommended grade
//!
//! Warnings are emitted in that order. A mismatch, or any `high` warning,
//! requires acknowledgement before the form can be saved.

use std::collections::{BTreeMap, HashSet};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::{Advisory, Severity};
use crate::errors::{FlangeError, FlangeResult};
use crate::fasteners::{BoltGrade, BoltSpecKey, NutGrade};

const BUNDLED_JSON: &str = include_str!("../../data/nut_pairing.json");

static BUNDLED: Lazy<FlangeResult<NutPairingConfig>> =
    Lazy::new(|| NutPairingConfig::from_json_str("bundled nut pairing rules", BUNDLED_JSON));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutRecommendation {
    pub nut: String,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarningRule {
    #[serde(rename = "ifNutIs", default)]
    pub if_nut_is: Option<String>,
    #[serde(rename = "ifNutNotInRecommended", default)]
    pub if_nut_not_in_recommended: bool,
    #[serde(rename = "ifBoltIsStainless", default)]
    pub if_bolt_is_stainless: bool,
    pub severity: Severity,
    #[serde(rename = "messageKey")]
    pub message_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairingRule {
    pub bolt: BoltSpecKey,
    #[serde(rename = "recommendedNuts", default)]
    pub recommended: Vec<NutRecommendation>,
    #[serde(rename = "mismatchWarnings", default)]
    pub mismatch_warnings: Vec<WarningRule>,
    #[serde(rename = "specialWarnings", default)]
    pub special_warnings: Vec<WarningRule>,
    #[serde(rename = "boltPropertyWarnings", default)]
    pub bolt_property_warnings: Vec<WarningRule>,
}

impl PairingRule {
    fn matches(&self, bolt: &BoltSpecKey) -> bool {
        self.bolt.spec == bolt.spec
            && self.bolt.grade == bolt.grade
            && self.bolt.class.as_deref().unwrap_or("") == bolt.class.as_deref().unwrap_or("")
    }
}

/// Result of checking a stud/nut combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairingEvaluation {
    pub recommended: Vec<NutRecommendation>,
    pub warnings: Vec<Advisory>,
    /// Nut chosen and not in the recommended set
    pub mismatch: bool,
    pub requires_ack: bool,
}

impl PairingEvaluation {
    /// `"A194 2H, A194 4, A194 7"`
    pub fn recommended_labels(&self) -> String {
        self.recommended
            .iter()
            .map(|r| if r.label.is_empty() { r.nut.as_str() } else { r.label.as_str() })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// The full rule set
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NutPairingConfig {
    #[serde(rename = "pairingRules", default)]
    pub rules: Vec<PairingRule>,
    #[serde(rename = "messageCatalog", default)]
    pub message_catalog: BTreeMap<String, String>,
}

impl NutPairingConfig {
    /// Rules compiled into the library.
    pub fn bundled() -> FlangeResult<&'static NutPairingConfig> {
        BUNDLED.as_ref().map_err(Clone::clone)
    }

    pub fn from_json_str(source_name: &str, json: &str) -> FlangeResult<Self> {
        serde_json::from_str(json).map_err(|e| FlangeError::ReferenceData {
            source_name: source_name.to_string(),
            reason: e.to_string(),
        })
    }

    /// Catalogue text for a key; unknown keys are shown as-is.
    pub fn resolve_message<'a>(&'a self, key: &'a str) -> &'a str {
        self.message_catalog.get(key).map(String::as_str).unwrap_or(key)
    }

    pub fn rule_for(&self, bolt: &BoltSpecKey) -> Option<&PairingRule> {
        self.rules.iter().find(|rule| rule.matches(bolt))
    }

    /// Check a stud against a nut key. `None` when no rule covers the stud.
    pub fn evaluate(&self, bolt: &BoltSpecKey, nut_key: Option<&str>) -> Option<PairingEvaluation> {
        let rule = self.rule_for(bolt)?;
        let nut_key = nut_key.map(str::trim).filter(|k| !k.is_empty());

        let recommended_keys: HashSet<&str> = rule.recommended.iter().map(|r| r.nut.as_str()).collect();
        let mismatch = nut_key.is_some_and(|k| !recommended_keys.contains(k));
        let stainless = bolt.grade.to_uppercase().contains("B8");

        let mut warnings = Vec::new();
        let mut push = |rule: &WarningRule| {
            warnings.push(Advisory::new(rule.severity, self.resolve_message(&rule.message_key)));
        };

        rule.bolt_property_warnings
            .iter()
            .filter(|w| w.if_bolt_is_stainless && stainless)
            .for_each(&mut push);
        rule.special_warnings
            .iter()
            .filter(|w| w.if_nut_is.is_some() && w.if_nut_is.as_deref() == nut_key)
            .for_each(&mut push);
        rule.mismatch_warnings
            .iter()
            .filter(|w| w.if_nut_not_in_recommended && mismatch)
            .for_each(&mut push);

        let requires_ack = mismatch || warnings.iter().any(|w| w.severity == Severity::High);
        if requires_ack {
            tracing::info!(bolt = %bolt.grade, nut = ?nut_key, "nut pairing requires acknowledgement");
        }

        Some(PairingEvaluation {
            recommended: rule.recommended.clone(),
            warnings,
            mismatch,
            requires_ack,
        })
    }

    /// Typed convenience over [`NutPairingConfig::evaluate`].
    pub fn evaluate_grades(&self, bolt: BoltGrade, nut: Option<NutGrade>) -> Option<PairingEvaluation> {
        self.evaluate(&bolt.spec_key(), nut.map(|n| n.code()))
    }
}
