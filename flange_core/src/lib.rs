//! # flange_core - Flange Bolting Calculation Engine
//!
//! `flange_core` works out target torques for bolted flange joints and keeps
//! the records a field technician fills in while making one up: the job,
//! one form per flange, pass-by-pass sign-offs and the final PDF report.
//! All inputs and outputs are JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Data-driven**: bolt tables, gasket rules and nut pairings are bundled
//!   JSON that can be swapped for site tables
//! - **Gaps are messages**: a lookup that finds nothing produces a
//!   [`calculations::CalcIssue`] on the evaluation, not an error
//! - **Rich Errors**: [`errors::FlangeError`] for things that stop an operation
//!
//! ## Quick Start
//!
//! ```rust
//! use flange_core::calculations::{evaluate_torque, TorqueInput, TighteningPass};
//! use flange_core::fasteners::BoltGrade;
//! use flange_core::reference::ReferenceData;
//!
//! let data = ReferenceData::bundled().unwrap();
//! let input = TorqueInput {
//!     diameter: "3/4".to_string(),
//!     grade: Some(BoltGrade::A193_B7),
//!     gasket: Some("Spiral-wound".to_string()),
//!     ..Default::default()
//! };
//!
//! let eval = evaluate_torque(data, &input);
//! let target = eval.effective_torque_ftlb.unwrap();
//! assert!(target > 0.0);
//! println!("{}", eval.pass_line(TighteningPass::Pass1, "AB"));
//! ```
//!
//! ## Modules
//!
//! - [`calculations`] - Stress area, strength lookups, torque, sequences, passes
//! - [`reference`] - Bundled reference tables
//! - [`fasteners`] - Bolt and nut grades, thread series, lubricants
//! - [`advisories`] - Nut pairing and washer advice
//! - [`form`] / [`job`] - Flange forms, jobs and the job book
//! - [`file_io`] - Storage folder with atomic saves and locking
//! - [`pdf`] - Job reports
//! - [`config`] - `flange.toml` settings
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] - Structured error types

pub mod advisories;
pub mod calculations;
pub mod config;
pub mod errors;
pub mod fasteners;
pub mod file_io;
pub mod form;
pub mod job;
pub mod pdf;
pub mod reference;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use config::AppConfig;
pub use errors::{FlangeError, FlangeResult};
pub use file_io::{load_book, save_book, FileLock, StorageLayout};
pub use form::FlangeForm;
pub use job::{Job, JobBook};
pub use reference::ReferenceData;
