//! Nominal fastener diameter strings.
//!
//! Diameters are entered the way they are stamped on stud bolts and printed
//! in thread tables: `"1/2"`, `"1"`, `"1-1/8"`. Menus sometimes append an
//! `" (in.)"` label, which is stripped before parsing or table lookup.

use super::ThreadSeries;

const INCH_LABEL: &str = " (in.)";

/// Parse a nominal diameter string into inches.
///
/// Returns `None` for blank, malformed, or zero-denominator input.
///
/// ```rust
/// use flange_core::fasteners::parse_diameter_inches;
///
/// assert_eq!(parse_diameter_inches("1-1/8"), Some(1.125));
/// assert_eq!(parse_diameter_inches("3/4"), Some(0.75));
/// assert_eq!(parse_diameter_inches("4 (in.)"), Some(4.0));
/// assert_eq!(parse_diameter_inches("1/0"), None);
/// ```
pub fn parse_diameter_inches(value: &str) -> Option<f64> {
    if value.trim().is_empty() {
        return None;
    }
    let normalized = normalize_diameter_key(value);
    if normalized.contains('-') {
        let parts: Vec<&str> = normalized.split('-').collect();
        if parts.len() == 2 {
            let whole: f64 = parts[0].trim().parse().ok()?;
            let frac = parse_fraction(parts[1])?;
            Some(whole + frac)
        } else {
            normalized.parse().ok()
        }
    } else {
        parse_fraction(&normalized)
    }
}

/// Strip the menu label and whitespace, leaving the thread-table key.
pub fn normalize_diameter_key(value: &str) -> String {
    value.replace(INCH_LABEL, "").trim().to_string()
}

/// Default thread series for a diameter: 8UN from 1" up, UNC below.
pub fn default_thread_series_for(diameter_in: Option<f64>) -> Option<ThreadSeries> {
    let d = diameter_in?;
    if d >= 1.0 {
        Some(ThreadSeries::Un8)
    } else {
        Some(ThreadSeries::Unc)
    }
}

fn parse_fraction(value: &str) -> Option<f64> {
    let value = value.trim();
    if let Some((num, den)) = value.split_once('/') {
        if den.contains('/') {
            return None;
        }
        let num: f64 = num.trim().parse().ok()?;
        let den: f64 = den.trim().parse().ok()?;
        if den == 0.0 {
            None
        } else {
            Some(num / den)
        }
    } else {
        value.parse().ok()
    }
}
