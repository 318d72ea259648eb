//! # Bolting Calculations
//!
//! Pure functions behind the flange bolting form. Each takes the reference
//! tables explicitly and returns plain values or `Option`s, so the same
//! code serves the CLI, the report and the tests.
//!
//! ## Available Calculations
//!
//! - [`strength`] - TPI, tensile stress area, yield and allowable stress
//! - [`torque`] - bolt load and target torque for a form ([`evaluate_torque`])
//! - [`sequence`] - star-pattern bolt marking order
//! - [`passes`] - the four-pass tightening schedule

pub mod passes;
pub mod sequence;
pub mod strength;
pub mod torque;

pub use passes::{clip_initials, pass_torque, PassRecord, TighteningPass, MAX_INITIALS_LEN};
pub use sequence::{
    bolt_sequence, generate_bolt_sequence, marking_instruction, reverse_bits, NumberingDirection,
};
pub use strength::{
    lookup_allowable_stress, lookup_sy, lookup_tensile_area, lookup_tpi, round_temperature_up,
    tensile_stress_area, AllowableStress,
};
pub use torque::{
    compute_bolt_load, compute_target_torque, evaluate_torque, parse_percent, CalcIssue,
    TorqueEvaluation, TorqueInput, TorqueMethod, DEFAULT_PCT_YIELD, DEFAULT_WORKING_TEMP_F,
};
