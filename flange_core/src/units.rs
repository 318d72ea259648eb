//! # Unit Types
//!
//! Newtypes for the two quantities the bolting tables are not always
//! entered in: torque and temperature. The tables and formulas work in
//! ft-lb and °F; the metric side is for input and display only.
//!
//! ```rust
//! use flange_core::units::{FtLb, NewtonMeters};
//!
//! let metric: NewtonMeters = FtLb(100.0).into();
//! assert!((metric.0 - 135.58).abs() < 0.01);
//! assert_eq!(metric.to_string(), "135.6 N·m");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Mul;

/// 1 ft-lb in N·m
const NM_PER_FTLB: f64 = 1.355_817_948_3;

macro_rules! scalar_unit {
    ($(#[$doc:meta])* $name:ident, $suffix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub f64);

        impl Mul<f64> for $name {
            type Output = Self;
            fn mul(self, factor: f64) -> Self {
                Self(self.0 * factor)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let precision = f.precision().unwrap_or(1);
                write!(f, "{:.*} {}", precision, self.0, $suffix)
            }
        }
    };
}

scalar_unit!(
    /// Torque in foot-pounds
    FtLb,
    "ft-lb"
);
scalar_unit!(
    /// Torque in newton-metres
    NewtonMeters,
    "N·m"
);
scalar_unit!(
    /// Temperature in degrees Fahrenheit
    Fahrenheit,
    "°F"
);
scalar_unit!(
    /// Temperature in degrees Celsius
    Celsius,
    "°C"
);

impl From<FtLb> for NewtonMeters {
    fn from(t: FtLb) -> Self {
        NewtonMeters(t.0 * NM_PER_FTLB)
    }
}

impl From<NewtonMeters> for FtLb {
    fn from(t: NewtonMeters) -> Self {
        FtLb(t.0 / NM_PER_FTLB)
    }
}

impl From<Celsius> for Fahrenheit {
    fn from(t: Celsius) -> Self {
        Fahrenheit(t.0 * 9.0 / 5.0 + 32.0)
    }
}

impl From<Fahrenheit> for Celsius {
    fn from(t: Fahrenheit) -> Self {
        Celsius((t.0 - 32.0) * 5.0 / 9.0)
    }
}
