//! # Fastener Catalogue
//!
//! Typed identifiers for the stud bolts, nuts, thread series and lubricants
//! that appear on a flange bolting form.
//!
//! Each bolt grade maps to two keys:
//! - the **reference key** used by the strength tables (`A193_B7`)
//! - the **pairing key** used by the nut pairing rules (`SA-193` / `B7`)
//!
//! ## Example
//!
//! ```rust
//! use flange_core::fasteners::{BoltGrade, NutGrade};
//!
//! let grade = BoltGrade::from_str_flexible("A193 B7").unwrap();
//! assert_eq!(grade.reference_key(), "A193_B7");
//! assert_eq!(grade.spec_key().spec, "SA-193");
//!
//! let nut = NutGrade::from_str_flexible("2H").unwrap();
//! assert_eq!(nut, NutGrade::A194_2H);
//! ```

pub mod diameter;
pub mod lubricant;

pub use diameter::{default_thread_series_for, normalize_diameter_key, parse_diameter_inches};
pub use lubricant::{Lubricant, DRY_NUT_FACTOR};

use serde::{Deserialize, Serialize};

use crate::errors::{FlangeError, FlangeResult};

/// Lowercase alphanumerics only, so `"A193 B7"`, `"a193_b7"` and
/// `"SA-193/B7"` compare equal once the leading `S` is dropped.
fn squash(s: &str) -> String {
    let key: String = s
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    match key.strip_prefix("sa") {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => format!("a{rest}"),
        _ => key,
    }
}

// ============================================================================
// Thread Series
// ============================================================================

/// Unified inch thread series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThreadSeries {
    /// Coarse
    #[serde(rename = "UNC")]
    Unc,
    /// Fine
    #[serde(rename = "UNF")]
    Unf,
    /// 8 threads per inch, standard for studs 1" and up
    #[serde(rename = "8UN")]
    Un8,
}

impl ThreadSeries {
    pub const ALL: [ThreadSeries; 3] = [ThreadSeries::Unc, ThreadSeries::Unf, ThreadSeries::Un8];

    /// Key used by the TPI and As tables
    pub fn code(&self) -> &'static str {
        match self {
            ThreadSeries::Unc => "UNC",
            ThreadSeries::Unf => "UNF",
            ThreadSeries::Un8 => "8UN",
        }
    }

    pub fn from_str_flexible(s: &str) -> FlangeResult<Self> {
        match squash(s).as_str() {
            "unc" | "coarse" => Ok(ThreadSeries::Unc),
            "unf" | "fine" => Ok(ThreadSeries::Unf),
            "8un" | "un8" | "8" => Ok(ThreadSeries::Un8),
            _ => Err(FlangeError::unknown("thread series", s)),
        }
    }
}

impl std::fmt::Display for ThreadSeries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Bolt Grades
// ============================================================================

/// Stud bolt material grade.
///
/// Serializes as the reference-table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum BoltGrade {
    #[serde(rename = "A193_B7")]
    A193_B7,
    #[serde(rename = "A193_B7M")]
    A193_B7M,
    #[serde(rename = "A193_B16")]
    A193_B16,
    #[serde(rename = "A193_B8_Class1_304")]
    A193_B8_Class1,
    #[serde(rename = "A193_B8M_Class1_316")]
    A193_B8M_Class1,
    #[serde(rename = "A320_L7")]
    A320_L7,
    #[serde(rename = "A320_L7M")]
    A320_L7M,
    #[serde(rename = "A453_660_ClassA")]
    A453_660_ClassA,
    #[serde(rename = "A453_660_ClassB")]
    A453_660_ClassB,
    #[serde(rename = "A453_660_ClassC")]
    A453_660_ClassC,
    #[serde(rename = "A453_660_ClassD")]
    A453_660_ClassD,
}

/// Bolt identity as used by the nut pairing rules
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoltSpecKey {
    pub spec: String,
    pub grade: String,
    #[serde(default)]
    pub class: Option<String>,
}

impl BoltSpecKey {
    pub fn new(spec: &str, grade: &str, class: Option<&str>) -> Self {
        Self {
            spec: spec.to_string(),
            grade: grade.to_string(),
            class: class.map(str::to_string),
        }
    }
}

impl BoltGrade {
    pub const ALL: [BoltGrade; 11] = [
        BoltGrade::A193_B7,
        BoltGrade::A193_B7M,
        BoltGrade::A193_B16,
        BoltGrade::A193_B8_Class1,
        BoltGrade::A193_B8M_Class1,
        BoltGrade::A320_L7,
        BoltGrade::A320_L7M,
        BoltGrade::A453_660_ClassA,
        BoltGrade::A453_660_ClassB,
        BoltGrade::A453_660_ClassC,
        BoltGrade::A453_660_ClassD,
    ];

    /// Key into the strength and allowable stress tables
    pub fn reference_key(&self) -> &'static str {
        match self {
            BoltGrade::A193_B7 => "A193_B7",
            BoltGrade::A193_B7M => "A193_B7M",
            BoltGrade::A193_B16 => "A193_B16",
            BoltGrade::A193_B8_Class1 => "A193_B8_Class1_304",
            BoltGrade::A193_B8M_Class1 => "A193_B8M_Class1_316",
            BoltGrade::A320_L7 => "A320_L7",
            BoltGrade::A320_L7M => "A320_L7M",
            BoltGrade::A453_660_ClassA => "A453_660_ClassA",
            BoltGrade::A453_660_ClassB => "A453_660_ClassB",
            BoltGrade::A453_660_ClassC => "A453_660_ClassC",
            BoltGrade::A453_660_ClassD => "A453_660_ClassD",
        }
    }

    /// Label as printed on forms and reports
    pub fn display_name(&self) -> &'static str {
        match self {
            BoltGrade::A193_B7 => "A193 B7",
            BoltGrade::A193_B7M => "A193 B7M",
            BoltGrade::A193_B16 => "A193 B16",
            BoltGrade::A193_B8_Class1 => "A193 B8 Class 1 (304)",
            BoltGrade::A193_B8M_Class1 => "A193 B8M Class 1 (316)",
            BoltGrade::A320_L7 => "A320 L7",
            BoltGrade::A320_L7M => "A320 L7M",
            BoltGrade::A453_660_ClassA => "A453 Grade 660 Class A",
            BoltGrade::A453_660_ClassB => "A453 Grade 660 Class B",
            BoltGrade::A453_660_ClassC => "A453 Grade 660 Class C",
            BoltGrade::A453_660_ClassD => "A453 Grade 660 Class D",
        }
    }

    /// Class letter for A453 Grade 660, `None` for the other specs
    pub fn class_letter(&self) -> Option<char> {
        match self {
            BoltGrade::A453_660_ClassA => Some('A'),
            BoltGrade::A453_660_ClassB => Some('B'),
            BoltGrade::A453_660_ClassC => Some('C'),
            BoltGrade::A453_660_ClassD => Some('D'),
            _ => None,
        }
    }

    /// Grade 660 with an explicit class letter.
    pub fn a453_660(class: char) -> FlangeResult<Self> {
        match class.to_ascii_uppercase() {
            'A' => Ok(BoltGrade::A453_660_ClassA),
            'B' => Ok(BoltGrade::A453_660_ClassB),
            'C' => Ok(BoltGrade::A453_660_ClassC),
            'D' => Ok(BoltGrade::A453_660_ClassD),
            other => Err(FlangeError::invalid_input(
                "fastener_class",
                other.to_string(),
                "A453 Grade 660 class must be A, B, C or D",
            )),
        }
    }

    /// Identity used by the nut pairing rules
    pub fn spec_key(&self) -> BoltSpecKey {
        match self {
            BoltGrade::A193_B7 => BoltSpecKey::new("SA-193", "B7", None),
            BoltGrade::A193_B7M => BoltSpecKey::new("SA-193", "B7M", None),
            BoltGrade::A193_B16 => BoltSpecKey::new("SA-193", "B16", None),
            BoltGrade::A193_B8_Class1 => BoltSpecKey::new("SA-193", "B8", None),
            BoltGrade::A193_B8M_Class1 => BoltSpecKey::new("SA-193", "B8M", None),
            BoltGrade::A320_L7 => BoltSpecKey::new("SA-320", "L7", None),
            BoltGrade::A320_L7M => BoltSpecKey::new("SA-320", "L7M", None),
            BoltGrade::A453_660_ClassA => BoltSpecKey::new("SA-453", "660", Some("Class A")),
            BoltGrade::A453_660_ClassB => BoltSpecKey::new("SA-453", "660", Some("Class B")),
            BoltGrade::A453_660_ClassC => BoltSpecKey::new("SA-453", "660", Some("Class C")),
            BoltGrade::A453_660_ClassD => BoltSpecKey::new("SA-453", "660", Some("Class D")),
        }
    }

    /// Austenitic stainless (B8 / B8M)
    pub fn is_stainless(&self) -> bool {
        matches!(self, BoltGrade::A193_B8_Class1 | BoltGrade::A193_B8M_Class1)
    }

    /// Quenched and tempered alloy steel grades
    pub fn is_high_strength_alloy(&self) -> bool {
        matches!(
            self,
            BoltGrade::A193_B7
                | BoltGrade::A193_B7M
                | BoltGrade::A193_B16
                | BoltGrade::A320_L7
                | BoltGrade::A320_L7M
        )
    }

    /// Parse a grade from a reference key, a display label, a pairing key
    /// (`"SA-193/B7"`) or the bare grade (`"B7"`, `"660 Class A"`).
    pub fn from_str_flexible(s: &str) -> FlangeResult<Self> {
        let wanted = squash(s);
        if wanted.is_empty() {
            return Err(FlangeError::unknown("bolt grade", s));
        }
        BoltGrade::ALL
            .into_iter()
            .find(|grade| {
                let key = grade.spec_key();
                let bare = match &key.class {
                    Some(class) => format!("{}{}", key.grade, class),
                    None => key.grade.clone(),
                };
                let paired = format!("{}{}", key.spec, bare);
                [grade.reference_key(), grade.display_name(), bare.as_str(), paired.as_str()]
                    .iter()
                    .any(|candidate| squash(candidate) == wanted)
            })
            .ok_or_else(|| FlangeError::unknown("bolt grade", s))
    }
}

impl std::fmt::Display for BoltGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// Nut Grades
// ============================================================================

/// Heavy hex nut grade (A194)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum NutGrade {
    #[serde(rename = "A194_2H")]
    A194_2H,
    #[serde(rename = "A194_2HM")]
    A194_2HM,
    #[serde(rename = "A194_4")]
    A194_4,
    #[serde(rename = "A194_4M")]
    A194_4M,
    #[serde(rename = "A194_7")]
    A194_7,
    #[serde(rename = "A194_7M")]
    A194_7M,
    #[serde(rename = "A194_8_304")]
    A194_8,
    #[serde(rename = "A194_8M_316")]
    A194_8M,
}

impl NutGrade {
    pub const ALL: [NutGrade; 8] = [
        NutGrade::A194_2H,
        NutGrade::A194_2HM,
        NutGrade::A194_4,
        NutGrade::A194_4M,
        NutGrade::A194_7,
        NutGrade::A194_7M,
        NutGrade::A194_8,
        NutGrade::A194_8M,
    ];

    /// Key used by the nut pairing rules
    pub fn code(&self) -> &'static str {
        match self {
            NutGrade::A194_2H => "A194_2H",
            NutGrade::A194_2HM => "A194_2HM",
            NutGrade::A194_4 => "A194_4",
            NutGrade::A194_4M => "A194_4M",
            NutGrade::A194_7 => "A194_7",
            NutGrade::A194_7M => "A194_7M",
            NutGrade::A194_8 => "A194_8_304",
            NutGrade::A194_8M => "A194_8M_316",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            NutGrade::A194_2H => "A194 2H",
            NutGrade::A194_2HM => "A194 2HM",
            NutGrade::A194_4 => "A194 4",
            NutGrade::A194_4M => "A194 4M",
            NutGrade::A194_7 => "A194 7",
            NutGrade::A194_7M => "A194 7M",
            NutGrade::A194_8 => "A194 8 (304)",
            NutGrade::A194_8M => "A194 8M (316)",
        }
    }

    pub fn is_stainless(&self) -> bool {
        matches!(self, NutGrade::A194_8 | NutGrade::A194_8M)
    }

    /// Parse `"A194_2H"`, `"A194 8M (316)"`, `"2HM"` and similar.
    pub fn from_str_flexible(s: &str) -> FlangeResult<Self> {
        let wanted = squash(s);
        if wanted.is_empty() {
            return Err(FlangeError::unknown("nut grade", s));
        }
        NutGrade::ALL
            .into_iter()
            .find(|nut| {
                let short = nut.display_name().trim_start_matches("A194 ");
                let bare = short.split(' ').next().unwrap_or(short);
                [nut.code(), nut.display_name(), short, bare]
                    .iter()
                    .any(|candidate| squash(candidate) == wanted)
            })
            .ok_or_else(|| FlangeError::unknown("nut grade", s))
    }
}

impl std::fmt::Display for NutGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bolt_grade_parsing() {
        assert_eq!(BoltGrade::from_str_flexible("A193_B7").unwrap(), BoltGrade::A193_B7);
        assert_eq!(BoltGrade::from_str_flexible("a193 b7m").unwrap(), BoltGrade::A193_B7M);
        assert_eq!(BoltGrade::from_str_flexible("SA-193/B16").unwrap(), BoltGrade::A193_B16);
        assert_eq!(BoltGrade::from_str_flexible("B8M").unwrap(), BoltGrade::A193_B8M_Class1);
        assert_eq!(
            BoltGrade::from_str_flexible("A193 B8 Class 1 (304)").unwrap(),
            BoltGrade::A193_B8_Class1
        );
        assert_eq!(
            BoltGrade::from_str_flexible("660 Class C").unwrap(),
            BoltGrade::A453_660_ClassC
        );
        assert!(BoltGrade::from_str_flexible("").is_err());
        assert!(BoltGrade::from_str_flexible("Grade 8").is_err());
    }

    #[test]
    fn test_every_grade_parses_from_its_own_keys() {
        for grade in BoltGrade::ALL {
            assert_eq!(BoltGrade::from_str_flexible(grade.reference_key()).unwrap(), grade);
            assert_eq!(BoltGrade::from_str_flexible(grade.display_name()).unwrap(), grade);
        }
        for nut in NutGrade::ALL {
            assert_eq!(NutGrade::from_str_flexible(nut.code()).unwrap(), nut);
            assert_eq!(NutGrade::from_str_flexible(nut.display_name()).unwrap(), nut);
        }
    }

    #[test]
    fn test_660_class_mapping() {
        let grade = BoltGrade::a453_660('b').unwrap();
        assert_eq!(grade, BoltGrade::A453_660_ClassB);
        assert_eq!(grade.class_letter(), Some('B'));
        assert_eq!(grade.spec_key(), BoltSpecKey::new("SA-453", "660", Some("Class B")));
        assert!(BoltGrade::a453_660('E').is_err());
        assert_eq!(BoltGrade::A193_B7.class_letter(), None);
    }

    #[test]
    fn test_material_families() {
        assert!(BoltGrade::A193_B8_Class1.is_stainless());
        assert!(!BoltGrade::A193_B7.is_stainless());
        assert!(BoltGrade::A320_L7M.is_high_strength_alloy());
        assert!(!BoltGrade::A453_660_ClassA.is_high_strength_alloy());
        assert!(NutGrade::A194_8M.is_stainless());
        assert!(!NutGrade::A194_2H.is_stainless());
    }

    #[test]
    fn test_nut_short_names() {
        assert_eq!(NutGrade::from_str_flexible("2H").unwrap(), NutGrade::A194_2H);
        assert_eq!(NutGrade::from_str_flexible("8M").unwrap(), NutGrade::A194_8M);
        assert_eq!(NutGrade::from_str_flexible("7m").unwrap(), NutGrade::A194_7M);
        assert!(NutGrade::from_str_flexible("9").is_err());
    }

    #[test]
    fn test_serde_uses_reference_keys() {
        let json = serde_json::to_string(&BoltGrade::A193_B8M_Class1).unwrap();
        assert_eq!(json, "\"A193_B8M_Class1_316\"");
        let nut: NutGrade = serde_json::from_str("\"A194_8_304\"").unwrap();
        assert_eq!(nut, NutGrade::A194_8);
        let series: ThreadSeries = serde_json::from_str("\"8UN\"").unwrap();
        assert_eq!(series, ThreadSeries::Un8);
    }

    #[test]
    fn test_thread_series_parsing() {
        assert_eq!(ThreadSeries::from_str_flexible("unc").unwrap(), ThreadSeries::Unc);
        assert_eq!(ThreadSeries::from_str_flexible("8-UN").unwrap(), ThreadSeries::Un8);
        assert!(ThreadSeries::from_str_flexible("metric").is_err());
    }
}
