//! Multi-pass tightening schedule.
//!
//! Bolts are brought up to the final target torque in stages:
//!
//! | Pass  | Torque           | Order                                   |
//! |-------|------------------|-----------------------------------------|
//! | 1     | 20–30 % of target | marking sequence                       |
//! | 2     | 50–70 % of target | marking sequence                       |
//! | 3     | 100 % of target   | marking sequence                       |
//! | Check | 100 % of target   | circular, until no further nut rotation |

use serde::{Deserialize, Serialize};

/// Longest initials accepted on a pass sign-off
pub const MAX_INITIALS_LEN: usize = 4;

/// One stage of the tightening schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TighteningPass {
    Pass1,
    Pass2,
    Pass3,
    Check,
}

impl TighteningPass {
    pub const ALL: [TighteningPass; 4] = [
        TighteningPass::Pass1,
        TighteningPass::Pass2,
        TighteningPass::Pass3,
        TighteningPass::Check,
    ];

    /// Fraction of the target torque, `(low, high)`
    pub fn fraction_range(&self) -> (f64, f64) {
        match self {
            TighteningPass::Pass1 => (0.20, 0.30),
            TighteningPass::Pass2 => (0.50, 0.70),
            TighteningPass::Pass3 | TighteningPass::Check => (1.0, 1.0),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TighteningPass::Pass1 => "Pass #1",
            TighteningPass::Pass2 => "Pass #2",
            TighteningPass::Pass3 => "Pass #3",
            TighteningPass::Check => "Check Pass",
        }
    }

    pub fn instruction(&self) -> &'static str {
        match self {
            TighteningPass::Pass1 => "All bolts in sequence to 20% to 30% of the target torque.",
            TighteningPass::Pass2 => "All bolts in sequence to 50% to 70% of the target torque.",
            TighteningPass::Pass3 => "All bolts in sequence to 100% of the target torque.",
            TighteningPass::Check => {
                "All bolts in circular order at 100% of target torque until there is no further nut rotation."
            }
        }
    }

    /// 1-based position, also accepted from the CLI (`4` is the check pass)
    pub fn number(&self) -> u8 {
        match self {
            TighteningPass::Pass1 => 1,
            TighteningPass::Pass2 => 2,
            TighteningPass::Pass3 => 3,
            TighteningPass::Check => 4,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        TighteningPass::ALL.into_iter().find(|p| p.number() == n)
    }

    /// `"20-30%"` or `"100%"`
    pub fn percent_label(&self) -> String {
        let (low, high) = self.fraction_range();
        if low == high {
            format!("{:.0}%", high * 100.0)
        } else {
            format!("{:.0}-{:.0}%", low * 100.0, high * 100.0)
        }
    }

    /// Torque range (ft-lb) for this pass
    pub fn torque_range(&self, target_ftlb: f64) -> (f64, f64) {
        let (low, high) = self.fraction_range();
        (pass_torque(target_ftlb, low), pass_torque(target_ftlb, high))
    }

    /// `"60-90 ft-lb"` or `"300 ft-lb"`
    pub fn torque_text(&self, target_ftlb: f64) -> String {
        let (low, high) = self.torque_range(target_ftlb);
        if self.fraction_range().0 == self.fraction_range().1 {
            format!("{high:.0} ft-lb")
        } else {
            format!("{low:.0}-{high:.0} ft-lb")
        }
    }

    /// Report line, e.g. `"20-30% (60-90 ft-lb) AB"`.
    ///
    /// Without a target torque only the initials are shown.
    pub fn report_line(&self, target_ftlb: Option<f64>, initials: &str) -> String {
        let initials = initials.trim();
        let Some(target) = target_ftlb else {
            return initials.to_string();
        };
        let range = format!("{} ({})", self.percent_label(), self.torque_text(target));
        if initials.is_empty() {
            range
        } else {
            format!("{range} {initials}")
        }
    }
}

impl std::fmt::Display for TighteningPass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Torque for one pass: `target × pct`
pub fn pass_torque(target_ftlb: f64, pct: f64) -> f64 {
    target_ftlb * pct
}

/// Technician sign-off for one pass
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PassRecord {
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default)]
    pub initials: String,
}

impl PassRecord {
    /// Confirmation with initials clipped to four characters.
    pub fn signed(initials: &str) -> Self {
        Self {
            confirmed: true,
            initials: clip_initials(initials),
        }
    }
}

/// Trim and keep at most [`MAX_INITIALS_LEN`] characters.
pub fn clip_initials(initials: &str) -> String {
    initials.trim().chars().take(MAX_INITIALS_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_report_lines() {
        assert_eq!(TighteningPass::Pass1.report_line(Some(300.0), "AB"), "20-30% (60-90 ft-lb) AB");
        assert_eq!(TighteningPass::Pass2.report_line(Some(300.0), ""), "50-70% (150-210 ft-lb)");
        assert_eq!(TighteningPass::Pass3.report_line(Some(300.0), ""), "100% (300 ft-lb)");
        assert_eq!(TighteningPass::Check.report_line(Some(300.0), " KW "), "100% (300 ft-lb) KW");
        assert_eq!(TighteningPass::Pass1.report_line(None, "AB"), "AB");
    }

    #[test]
    fn test_torque_ranges() {
        let (low, high) = TighteningPass::Pass2.torque_range(200.0);
        assert_relative_eq!(low, 100.0);
        assert_relative_eq!(high, 140.0);
        assert_eq!(TighteningPass::Check.torque_range(200.0), (200.0, 200.0));
        assert_eq!(pass_torque(412.0, 0.5), 206.0);
    }

    #[test]
    fn test_pass_numbers() {
        for pass in TighteningPass::ALL {
            assert_eq!(TighteningPass::from_number(pass.number()), Some(pass));
        }
        assert_eq!(TighteningPass::from_number(5), None);
    }

    #[test]
    fn test_initials_are_clipped() {
        assert_eq!(PassRecord::signed("  ABCDEF ").initials, "ABCD");
        assert_eq!(clip_initials("jk"), "jk");
        assert!(PassRecord::signed("JK").confirmed);
        assert!(!PassRecord::default().confirmed);
    }
}
