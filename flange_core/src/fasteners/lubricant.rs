//! Thread lubricants and their nut factors.
//!
//! The nut factor K relates applied torque to achieved bolt tension
//! (`T = K·D·F/12`). Dry (unlubricated) assembly always uses K = 0.27.

use serde::{Deserialize, Serialize};

use crate::errors::{FlangeError, FlangeResult};

/// Nut factor for dry, unlubricated threads.
pub const DRY_NUT_FACTOR: f64 = 0.27;

/// Lubricant applied to threads and nut bearing faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lubricant {
    #[serde(rename = "Unlubricated")]
    Unlubricated,
    #[serde(rename = "Moly paste")]
    MolyPaste,
    #[serde(rename = "Never-Seez Regular")]
    NeverSeezRegular,
    #[serde(rename = "Copper/Nickel anti-seize")]
    CopperNickelAntiSeize,
    #[serde(rename = "High-temp blends")]
    HighTempBlend,
}

impl Lubricant {
    pub const ALL: [Lubricant; 5] = [
        Lubricant::Unlubricated,
        Lubricant::MolyPaste,
        Lubricant::NeverSeezRegular,
        Lubricant::CopperNickelAntiSeize,
        Lubricant::HighTempBlend,
    ];

    /// Nut factor K
    pub fn nut_factor(&self) -> f64 {
        match self {
            Lubricant::Unlubricated => DRY_NUT_FACTOR,
            Lubricant::MolyPaste => 0.11,
            Lubricant::NeverSeezRegular => 0.13,
            Lubricant::CopperNickelAntiSeize => 0.15,
            Lubricant::HighTempBlend => 0.17,
        }
    }

    /// Approximate fraction of the dry torque needed for the same bolt load
    pub fn percent_of_dry(&self) -> f64 {
        match self {
            Lubricant::Unlubricated => 1.0,
            Lubricant::MolyPaste => 0.41,
            Lubricant::NeverSeezRegular => 0.48,
            Lubricant::CopperNickelAntiSeize => 0.56,
            Lubricant::HighTempBlend => 0.63,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Lubricant::Unlubricated => "Unlubricated",
            Lubricant::MolyPaste => "Moly paste",
            Lubricant::NeverSeezRegular => "Never-Seez Regular",
            Lubricant::CopperNickelAntiSeize => "Copper/Nickel anti-seize",
            Lubricant::HighTempBlend => "High-temp blends",
        }
    }

    /// Label as stored on forms, e.g. `"Moly paste (K 0.11)"`
    pub fn display_name(&self) -> String {
        format!("{} (K {:.2})", self.name(), self.nut_factor())
    }

    /// Menu label including the share of dry torque
    pub fn menu_label(&self) -> String {
        if *self == Lubricant::Unlubricated {
            format!("{} - 100% of dry torque", self.display_name())
        } else {
            format!(
                "{} - ~{:.0}% of dry torque",
                self.display_name(),
                self.percent_of_dry() * 100.0
            )
        }
    }

    /// Parse from the plain name, the stored label, or a loose CLI spelling.
    pub fn from_str_flexible(s: &str) -> FlangeResult<Self> {
        let key: String = s
            .split(" (K")
            .next()
            .unwrap_or(s)
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match key.as_str() {
            "unlubricated" | "dry" | "none" => Ok(Lubricant::Unlubricated),
            "molypaste" | "moly" => Ok(Lubricant::MolyPaste),
            "neverseezregular" | "neverseez" => Ok(Lubricant::NeverSeezRegular),
            "coppernickelantiseize" | "coppernickel" | "antiseize" => {
                Ok(Lubricant::CopperNickelAntiSeize)
            }
            "hightempblends" | "hightempblend" | "hightemp" => Ok(Lubricant::HighTempBlend),
            _ => Err(FlangeError::unknown("lubricant", s)),
        }
    }
}

impl std::fmt::Display for Lubricant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
