//! # Reference Data
//!
//! Thread, strength, gasket and tightening tables used by the torque
//! calculations. A dataset is bundled with the library and parsed on first
//! use; a replacement file with the same layout can be loaded from disk
//! (see `AppConfig::reference_override`).
//!
//! The file layout is a single JSON object under the root key
//! `flange_helper_reference_data`:
//!
//! ```json
//! {
//!   "flange_helper_reference_data": {
//!     "fasteners": {
//!       "diameterOptions_in": ["1/2", "5/8"],
//!       "tpi_lookup": { "UNC": { "1/2": 13 } },
//!       "tensileStressArea_As_in2_lookup": { "UNC": { "1/2": 0.1419 } },
//!       "boltGrades": {
//!         "options": ["A193_B7"],
//!         "strength_Sy_Su_min_ksi": {
//!           "A193_B7": [{ "diaMin_in": 0, "diaMax_in": 2.5, "Sy": 105, "Su": 125 }]
//!         },
//!         "allowableStress_S_ksi_atTemp": {
//!           "A193_B7": [{ "diaMin_in": 0, "diaMax_in": 2.5,
//!                         "temps": [{ "tMin": -20, "tMax": 100, "S": 25.0 }] }]
//!         }
//!       }
//!     },
//!     "gasketTypes": [],
//!     "tightening": { "boltNumbering": { "direction": "CW" } }
//!   }
//! }
//! ```
//!
//! Values are reference figures only; the tables shipped here must be
//! checked against the governing code edition before field use.

use std::collections::BTreeMap;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::calculations::sequence::NumberingDirection;
use crate::errors::{FlangeError, FlangeResult};
use crate::fasteners::{BoltGrade, ThreadSeries};

const BUNDLED_JSON: &str = include_str!("../data/flange_reference.json");

static BUNDLED: Lazy<FlangeResult<ReferenceData>> =
    Lazy::new(|| ReferenceData::from_json_str("bundled reference data", BUNDLED_JSON));

/// `series -> diameter key -> value`, with `null` where a size is not made
pub type SeriesTable = BTreeMap<String, BTreeMap<String, Option<f64>>>;

#[derive(Debug, Deserialize)]
struct ReferenceFile {
    flange_helper_reference_data: ReferenceData,
}

/// Complete reference dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceData {
    #[serde(default)]
    pub meta: ReferenceMeta,
    pub fasteners: FastenerTables,
    #[serde(rename = "gasketTypes", default)]
    pub gasket_types: Vec<GasketType>,
    #[serde(default)]
    pub tightening: Tightening,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReferenceMeta {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub units: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FastenerTables {
    #[serde(rename = "diameterOptions_in", default)]
    pub diameter_options: Vec<String>,
    #[serde(rename = "tpi_lookup", default)]
    pub tpi: SeriesTable,
    #[serde(rename = "tensileStressArea_As_in2_lookup", default)]
    pub tensile_area: SeriesTable,
    #[serde(rename = "boltGrades")]
    pub bolt_grades: BoltGradeTables,
    #[serde(rename = "nutGrades", default)]
    pub nut_grades: OptionList,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OptionList {
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoltGradeTables {
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(rename = "strength_Sy_Su_min_ksi", default)]
    pub strength: BTreeMap<String, Vec<StrengthRow>>,
    #[serde(rename = "allowableStress_S_ksi_atTemp", default)]
    pub allowable: BTreeMap<String, Vec<AllowableRow>>,
}

/// Minimum yield/tensile strength for a diameter range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrengthRow {
    #[serde(rename = "diaMin_in", default)]
    pub dia_min_in: Option<f64>,
    #[serde(rename = "diaMax_in", default)]
    pub dia_max_in: Option<f64>,
    #[serde(rename = "Sy")]
    pub sy_ksi: f64,
    #[serde(rename = "Su", default)]
    pub su_ksi: Option<f64>,
}

/// Allowable stress by temperature for a diameter range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllowableRow {
    #[serde(rename = "diaMin_in", default)]
    pub dia_min_in: Option<f64>,
    #[serde(rename = "diaMax_in", default)]
    pub dia_max_in: Option<f64>,
    #[serde(default)]
    pub temps: Vec<TemperatureRow>,
}

/// One allowable stress value. Single temperatures have `t_min_f == t_max_f`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRow {
    #[serde(rename = "tMin")]
    pub t_min_f: i32,
    #[serde(rename = "tMax")]
    pub t_max_f: i32,
    #[serde(rename = "S")]
    pub s_ksi: f64,
}

/// Diameter ranges are inclusive; a missing lower bound is 0 and a missing
/// upper bound is open.
pub trait DiameterRange {
    fn bounds(&self) -> (Option<f64>, Option<f64>);

    fn contains_diameter(&self, d_in: f64) -> bool {
        let (min, max) = self.bounds();
        d_in >= min.unwrap_or(0.0) && d_in <= max.unwrap_or(f64::MAX)
    }
}

impl DiameterRange for StrengthRow {
    fn bounds(&self) -> (Option<f64>, Option<f64>) {
        (self.dia_min_in, self.dia_max_in)
    }
}

impl DiameterRange for AllowableRow {
    fn bounds(&self) -> (Option<f64>, Option<f64>) {
        (self.dia_min_in, self.dia_max_in)
    }
}

impl TemperatureRow {
    pub fn contains(&self, temp_f: i32) -> bool {
        temp_f >= self.t_min_f && temp_f <= self.t_max_f
    }

    pub fn is_single_temperature(&self) -> bool {
        self.t_min_f == self.t_max_f
    }
}

// ============================================================================
// Gaskets
// ============================================================================

/// How a gasket's target torque is established
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetMethod {
    /// Calculated from a percentage of bolt yield
    BoltStressPctYield,
    /// Torque must come from the gasket manufacturer or facility
    SpecifiedTargetTorqueRequired,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasketType {
    pub label: String,
    #[serde(rename = "targetMethod")]
    pub target_method: TargetMethod,
    #[serde(rename = "allowCalculatedTorque", default = "default_true")]
    pub allow_calculated_torque: bool,
    #[serde(default)]
    pub defaults: GasketDefaults,
    #[serde(default)]
    pub retorque: Retorque,
    #[serde(default)]
    pub warnings: Vec<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GasketDefaults {
    #[serde(rename = "boltStressPctYieldDefault", default)]
    pub pct_yield_default: Option<f64>,
    #[serde(rename = "boltStressPctYieldAllowed", default)]
    pub pct_yield_allowed: Vec<f64>,
    #[serde(rename = "specifiedTargetTorqueRequired", default)]
    pub specified_target_torque_required: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Retorque {
    #[serde(default)]
    pub recommended: bool,
    #[serde(default)]
    pub timing: Option<String>,
}

impl GasketType {
    /// True when the calculated torque may not be used for this gasket.
    pub fn requires_specified_torque(&self) -> bool {
        !self.allow_calculated_torque
            || self.target_method == TargetMethod::SpecifiedTargetTorqueRequired
            || self.defaults.specified_target_torque_required
    }

    /// `(min, max)` of the allowed percent-of-yield range, if given
    pub fn pct_yield_range(&self) -> Option<(f64, f64)> {
        let min = self.defaults.pct_yield_allowed.iter().copied().reduce(f64::min)?;
        let max = self.defaults.pct_yield_allowed.iter().copied().reduce(f64::max)?;
        Some((min, max))
    }
}

// ============================================================================
// Tightening
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Tightening {
    #[serde(rename = "boltNumbering", default)]
    pub bolt_numbering: BoltNumbering,
    #[serde(rename = "sequenceLookup", default)]
    pub sequence_lookup: SequenceLookup,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoltNumbering {
    #[serde(default)]
    pub direction: NumberingDirection,
    #[serde(default)]
    pub rule: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SequenceLookup {
    #[serde(rename = "sequenceByBoltCount", default)]
    pub by_bolt_count: BTreeMap<String, Vec<u32>>,
}

// ============================================================================
// Loading and lookups
// ============================================================================

impl ReferenceData {
    /// The dataset compiled into the library.
    pub fn bundled() -> FlangeResult<&'static ReferenceData> {
        BUNDLED.as_ref().map_err(Clone::clone)
    }

    /// Parse a reference document. `source_name` is only used in errors.
    pub fn from_json_str(source_name: &str, json: &str) -> FlangeResult<Self> {
        let file: ReferenceFile =
            serde_json::from_str(json).map_err(|e| FlangeError::ReferenceData {
                source_name: source_name.to_string(),
                reason: e.to_string(),
            })?;
        let data = file.flange_helper_reference_data;
        for grade in data.grades_without_strength() {
            tracing::warn!(source = source_name, grade = %grade, "no strength rows for bolt grade");
        }
        Ok(data)
    }

    /// Load a replacement dataset from disk.
    pub fn load_from_path(path: &Path) -> FlangeResult<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| FlangeError::file_error("read", path.display().to_string(), e.to_string()))?;
        let data = Self::from_json_str(&path.display().to_string(), &json)?;
        tracing::info!(path = %path.display(), "loaded reference data override");
        Ok(data)
    }

    /// The bundled set, or the file at `path` when one is given.
    pub fn bundled_or_override(path: Option<&Path>) -> FlangeResult<std::borrow::Cow<'static, ReferenceData>> {
        match path {
            Some(path) => Ok(std::borrow::Cow::Owned(Self::load_from_path(path)?)),
            None => Ok(std::borrow::Cow::Borrowed(Self::bundled()?)),
        }
    }

    /// Catalogue grades with no strength table in this dataset.
    pub fn grades_without_strength(&self) -> Vec<BoltGrade> {
        BoltGrade::ALL
            .into_iter()
            .filter(|g| {
                self.fasteners
                    .bolt_grades
                    .strength
                    .get(g.reference_key())
                    .map_or(true, |rows| rows.is_empty())
            })
            .collect()
    }

    /// Threads per inch for a normalized diameter key
    pub fn tpi(&self, series: ThreadSeries, diameter_key: &str) -> Option<f64> {
        lookup_series(&self.fasteners.tpi, series, diameter_key)
    }

    /// Published tensile stress area for a normalized diameter key
    pub fn table_tensile_area(&self, series: ThreadSeries, diameter_key: &str) -> Option<f64> {
        lookup_series(&self.fasteners.tensile_area, series, diameter_key)
    }

    pub fn strength_rows(&self, grade: BoltGrade) -> &[StrengthRow] {
        self.fasteners
            .bolt_grades
            .strength
            .get(grade.reference_key())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn allowable_rows(&self, grade: BoltGrade) -> &[AllowableRow] {
        self.fasteners
            .bolt_grades
            .allowable
            .get(grade.reference_key())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Gasket by label, ignoring case and surrounding whitespace.
    pub fn gasket(&self, label: &str) -> Option<&GasketType> {
        let wanted = label.trim();
        if wanted.is_empty() {
            return None;
        }
        self.gasket_types
            .iter()
            .find(|g| g.label.trim().eq_ignore_ascii_case(wanted))
    }

    /// Fixed marking order for a bolt count, when the dataset has one
    pub fn sequence_override(&self, bolt_count: u32) -> Option<&[u32]> {
        self.tightening
            .sequence_lookup
            .by_bolt_count
            .get(&bolt_count.to_string())
            .map(Vec::as_slice)
            .filter(|seq| !seq.is_empty())
    }

    pub fn numbering_direction(&self) -> NumberingDirection {
        self.tightening.bolt_numbering.direction
    }
}

fn lookup_series(table: &SeriesTable, series: ThreadSeries, diameter_key: &str) -> Option<f64> {
    table
        .get(series.code())?
        .get(diameter_key)
        .copied()
        .flatten()
        .filter(|v| v.is_finite() && *v > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundled() -> &'static ReferenceData {
        ReferenceData::bundled().unwrap()
    }

    #[test]
    fn test_bundled_parses_and_covers_every_grade() {
        let data = bundled();
        assert!(data.grades_without_strength().is_empty());
        assert_eq!(data.fasteners.diameter_options.first().map(String::as_str), Some("1/2"));
        assert_eq!(data.fasteners.diameter_options.last().map(String::as_str), Some("4"));
        for grade in BoltGrade::ALL {
            assert!(!data.allowable_rows(grade).is_empty(), "{grade} has no allowable rows");
        }
    }

    #[test]
    fn test_tpi_lookup() {
        let data = bundled();
        assert_eq!(data.tpi(ThreadSeries::Unc, "1/2"), Some(13.0));
        assert_eq!(data.tpi(ThreadSeries::Un8, "2"), Some(8.0));
        // 8UN is not made below 1"
        assert_eq!(data.tpi(ThreadSeries::Un8, "3/4"), None);
        assert_eq!(data.tpi(ThreadSeries::Unc, "12"), None);
    }

    #[test]
    fn test_gasket_lookup() {
        let data = bundled();
        let spiral = data.gasket("spiral-wound").unwrap();
        assert!(!spiral.requires_specified_torque());
        assert_eq!(spiral.defaults.pct_yield_default, Some(0.5));
        assert_eq!(spiral.pct_yield_range(), Some((0.4, 0.7)));

        let thick = data.gasket("Soft cut sheet, thickness >1/16\"").unwrap();
        assert!(thick.requires_specified_torque());
        assert_eq!(thick.defaults.pct_yield_default, None);
        assert_eq!(thick.pct_yield_range(), None);

        assert!(data.gasket("").is_none());
        assert!(data.gasket("Cardboard").is_none());
    }

    #[test]
    fn test_sequence_override_and_direction() {
        let data = bundled();
        assert_eq!(data.sequence_override(8), Some(&[1, 5, 3, 7, 2, 6, 4, 8][..]));
        assert_eq!(data.sequence_override(10), None);
        assert_eq!(data.numbering_direction(), NumberingDirection::Clockwise);
    }

    #[test]
    fn test_malformed_document_is_reference_error() {
        let err = ReferenceData::from_json_str("broken.json", "{\"nope\": 1}").unwrap_err();
        assert_eq!(err.error_code(), "REFERENCE_DATA");
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_unknown_target_method_is_tolerated() {
        let json = r#"{"flange_helper_reference_data": {
            "fasteners": {"boltGrades": {}},
            "gasketTypes": [{"label": "Custom", "targetMethod": "SOMETHING_NEW"}]
        }}"#;
        let data = ReferenceData::from_json_str("custom", json).unwrap();
        let gasket = data.gasket("custom").unwrap();
        assert_eq!(gasket.target_method, TargetMethod::Other);
        assert!(gasket.allow_calculated_torque);
        assert_eq!(data.grades_without_strength().len(), BoltGrade::ALL.len());
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let row = StrengthRow { dia_min_in: None, dia_max_in: Some(2.5), sy_ksi: 105.0, su_ksi: None };
        assert!(row.contains_diameter(0.0));
        assert!(row.contains_diameter(2.5));
        assert!(!row.contains_diameter(2.5625));
        let open = StrengthRow { dia_min_in: Some(4.0625), dia_max_in: None, sy_ksi: 75.0, su_ksi: None };
        assert!(open.contains_diameter(10.0));
    }
}
