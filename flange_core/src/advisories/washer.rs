//! Washer and galling advice.

use serde::{Deserialize, Serialize};

use super::{Advisory, Severity};
use crate::fasteners::{BoltGrade, NutGrade};

const STAINLESS_GALLING: &str = "Stainless fasteners are prone to galling causing incorrect inflated false torque readings. It is suggested to always use lubricant with stainless fastners.";
const USE_STAINLESS_WASHER: &str = "Use Stainless Flat washer + lubricant";
const USE_HARDENED_WASHER: &str = "Use Hardened Flat washer + lubricant";
const STAINLESS_WASHER_NOTE: &str =
    "For stainless bolting, washers + lubricant help reduce galling at the nut bearing surface.";
const MIXED_METAL_NOTE: &str = "Mixed stainless and carbon steel contact can increase corrosion risk in wet/salty environments. Verify facility corrosion/spec requirements.";
const HARDENED_WASHER_NOTE: &str = "A hardened flat washer can improve torque consistency by reducing embedment and providing a smoother bearing surface.";

/// Condition of the flange face under the nut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BearingSurface {
    #[default]
    Unknown,
    Painted,
    Rough,
    Smooth,
}

impl BearingSurface {
    fn benefits_from_washer(&self) -> bool {
        matches!(self, BearingSurface::Unknown | BearingSurface::Painted | BearingSurface::Rough)
    }
}

/// What the washer rules look at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WasherContext {
    pub bolt: Option<BoltGrade>,
    pub nut: Option<NutGrade>,
    pub washer_used: bool,
    #[serde(default)]
    pub bearing_surface: BearingSurface,
    #[serde(default)]
    pub stainless_washer_available: bool,
}

/// Washer advisories for a stud/nut combination, without duplicates.
pub fn washer_messages(ctx: &WasherContext) -> Vec<Advisory> {
    let stainless = ctx.bolt.is_some_and(|b| b.is_stainless()) || ctx.nut.is_some_and(|n| n.is_stainless());
    let alloy = ctx.bolt.is_some_and(|b| b.is_high_strength_alloy());

    let mut messages = Vec::new();
    if stainless {
        messages.push(Advisory::new(Severity::Warn, STAINLESS_GALLING));
        if !ctx.washer_used {
            let text = if ctx.stainless_washer_available {
                USE_STAINLESS_WASHER
            } else {
                USE_HARDENED_WASHER
            };
            messages.push(Advisory::new(Severity::Warn, text));
        }
        messages.push(Advisory::new(Severity::Info, STAINLESS_WASHER_NOTE));
        messages.push(Advisory::new(Severity::Info, MIXED_METAL_NOTE));
    }
    if alloy && !ctx.washer_used && ctx.bearing_surface.benefits_from_washer() {
        messages.push(Advisory::new(Severity::Info, HARDENED_WASHER_NOTE));
    }

    let mut seen = std::collections::HashSet::new();
    messages.retain(|m| seen.insert(m.message.clone()));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(bolt: BoltGrade, nut: Option<NutGrade>, washer_used: bool) -> WasherContext {
        WasherContext {
            bolt: Some(bolt),
            nut,
            washer_used,
            ..Default::default()
        }
    }

    #[test]
    fn test_stainless_without_washer() {
        let msgs = washer_messages(&ctx(BoltGrade::A193_B8M_Class1, Some(NutGrade::A194_8M), false));
        let texts: Vec<&str> = msgs.iter().map(|m| m.message.as_str()).collect();
        assert_eq!(
            texts,
            vec![STAINLESS_GALLING, USE_HARDENED_WASHER, STAINLESS_WASHER_NOTE, MIXED_METAL_NOTE]
        );
        assert_eq!(msgs[1].severity, Severity::Warn);
        assert_eq!(msgs[2].severity, Severity::Info);
    }

    #[test]
    fn test_stainless_washer_available() {
        let mut c = ctx(BoltGrade::A193_B8_Class1, None, false);
        c.stainless_washer_available = true;
        let msgs = washer_messages(&c);
        assert_eq!(msgs[1].message, USE_STAINLESS_WASHER);
    }

    #[test]
    fn test_stainless_nut_on_carbon_stud() {
        let msgs = washer_messages(&ctx(BoltGrade::A193_B7, Some(NutGrade::A194_8), true));
        assert_eq!(msgs.len(), 3);
        assert_eq!(msgs[0].message, STAINLESS_GALLING);
    }

    #[test]
    fn test_alloy_bearing_surface() {
        let msgs = washer_messages(&ctx(BoltGrade::A193_B7, Some(NutGrade::A194_2H), false));
        assert_eq!(msgs, vec![Advisory::new(Severity::Info, HARDENED_WASHER_NOTE)]);

        let mut smooth = ctx(BoltGrade::A193_B7, Some(NutGrade::A194_2H), false);
        smooth.bearing_surface = BearingSurface::Smooth;
        assert!(washer_messages(&smooth).is_empty());

        assert!(washer_messages(&ctx(BoltGrade::A193_B7, None, true)).is_empty());
    }

    #[test]
    fn test_660_gets_no_alloy_note() {
        assert!(washer_messages(&ctx(BoltGrade::A453_660_ClassB, None, false)).is_empty());
    }

    #[test]
    fn test_nothing_selected() {
        assert!(washer_messages(&WasherContext::default()).is_empty());
    }
}
