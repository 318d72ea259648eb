//! Thread geometry and bolt strength lookups.
//!
//! Every lookup returns `Option`: a size or grade missing from the tables is
//! a normal outcome that the form reports as a validation message.

use serde::{Deserialize, Serialize};

use crate::fasteners::{normalize_diameter_key, BoltGrade, ThreadSeries};
use crate::reference::{DiameterRange, ReferenceData};

/// Width of an allowable stress temperature bucket (°F)
pub const TEMPERATURE_STEP_F: i32 = 50;

/// Tensile stress area from the unified thread formula
///
/// `As = 0.7854 · (D − 0.9743 / n)²` where `n` is threads per inch.
///
/// ```rust
/// use flange_core::calculations::tensile_stress_area;
///
/// let a = tensile_stress_area(Some(1.0), Some(8.0)).unwrap();
/// assert!((a - 0.6057).abs() < 1e-4);
/// assert_eq!(tensile_stress_area(Some(1.0), Some(0.0)), None);
/// ```
pub fn tensile_stress_area(diameter_in: Option<f64>, tpi: Option<f64>) -> Option<f64> {
    let d = diameter_in?;
    let n = tpi?;
    if n == 0.0 {
        return None;
    }
    let term = d - 0.9743 / n;
    Some(0.7854 * term * term)
}

/// Threads per inch for a diameter as entered (label allowed)
pub fn lookup_tpi(data: &ReferenceData, series: ThreadSeries, diameter: &str) -> Option<f64> {
    data.tpi(series, &normalize_diameter_key(diameter))
}

/// Tensile stress area: published table value first, formula second.
pub fn lookup_tensile_area(
    data: &ReferenceData,
    series: ThreadSeries,
    diameter: &str,
    diameter_in: Option<f64>,
) -> Option<f64> {
    let key = normalize_diameter_key(diameter);
    data.table_tensile_area(series, &key)
        .or_else(|| tensile_stress_area(diameter_in, data.tpi(series, &key)))
}

/// Minimum yield strength Sy (ksi) from the first diameter row containing `d`.
pub fn lookup_sy(data: &ReferenceData, grade: BoltGrade, diameter_in: Option<f64>) -> Option<f64> {
    let d = diameter_in?;
    data.strength_rows(grade)
        .iter()
        .find(|row| row.contains_diameter(d))
        .map(|row| row.sy_ksi)
}

/// Allowable stress and the temperature bucket it was read at
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllowableStress {
    pub s_ksi: f64,
    pub used_temp_f: i32,
}

/// Round a temperature up to the next 50 °F bucket.
///
/// Fractional degrees round up first, so 100.2 °F lands in the 150 °F bucket.
/// Temperatures with no representable bucket give `None`.
///
/// ```rust
/// use flange_core::calculations::round_temperature_up;
///
/// assert_eq!(round_temperature_up(100.0), Some(100));
/// assert_eq!(round_temperature_up(101.0), Some(150));
/// assert_eq!(round_temperature_up(-60.0), Some(-50));
/// assert_eq!(round_temperature_up(1e10), None);
/// ```
pub fn round_temperature_up(temp_f: f64) -> Option<i32> {
    let step = f64::from(TEMPERATURE_STEP_F);
    let bucket = (temp_f.ceil() / step).ceil() * step;
    if !bucket.is_finite() || bucket < f64::from(i32::MIN) || bucket > f64::from(i32::MAX) {
        return None;
    }
    // -0.0 from small negative inputs casts to 0
    Some(bucket as i32)
}

/// Allowable stress S (ksi) at the working temperature.
///
/// Picks the grade's diameter row, rounds the temperature up to its bucket
/// and prefers a single-temperature row over a range row that also contains
/// the bucket.
pub fn lookup_allowable_stress(
    data: &ReferenceData,
    grade: BoltGrade,
    diameter_in: Option<f64>,
    working_temp_f: Option<f64>,
) -> Option<AllowableStress> {
    let d = diameter_in?;
    let temp = working_temp_f.filter(|t| t.is_finite())?;
    let row = data
        .allowable_rows(grade)
        .iter()
        .find(|row| row.contains_diameter(d))?;
    let rounded = round_temperature_up(temp)?;
    let hit = row
        .temps
        .iter()
        .find(|t| t.contains(rounded) && t.is_single_temperature())
        .or_else(|| row.temps.iter().find(|t| t.contains(rounded)))?;
    Some(AllowableStress {
        s_ksi: hit.s_ksi,
        used_temp_f: rounded,
    })
}
