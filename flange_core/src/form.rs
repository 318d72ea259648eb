//! # Flange Bolting Form
//!
//! One bolted joint inspection: flange and gasket details, fastener
//! selection, torque inputs, the four tightening pass sign-offs, photos and
//! signatures.
//!
//! A form stores what the technician entered plus a snapshot of the derived
//! values at save time ([`DerivedValues`]), so a report printed later shows
//! the numbers the crew actually worked to even if the reference tables
//! change.
//!
//! ## Example
//!
//! ```rust
//! use flange_core::form::FlangeForm;
//! use flange_core::fasteners::BoltGrade;
//! use flange_core::advisories::NutPairingConfig;
//! use flange_core::reference::ReferenceData;
//! use uuid::Uuid;
//!
//! let data = ReferenceData::bundled().unwrap();
//! let pairing = NutPairingConfig::bundled().unwrap();
//!
//! let mut form = FlangeForm::new(Uuid::new_v4());
//! form.gasket_type = "Spiral-wound".to_string();
//! form.fastener_diameter = "7/8".to_string();
//! form.fastener_grade = Some(BoltGrade::A193_B7);
//! form.bolt_holes = Some(8);
//!
//! let eval = form.evaluate(data, pairing, None);
//! assert!(eval.torque.effective_torque_ftlb.is_some());
//! assert_eq!(eval.sequence, vec![1, 5, 3, 7, 2, 6, 4, 8]);
//! ```

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::advisories::{washer_messages, Advisory, BearingSurface, NutPairingConfig, PairingEvaluation, WasherContext};
use crate::calculations::{
    bolt_sequence, clip_initials, evaluate_torque, marking_instruction, CalcIssue, PassRecord,
    TighteningPass, TorqueEvaluation, TorqueInput, TorqueMethod,
};
use crate::errors::{FlangeError, FlangeResult};
use crate::fasteners::{BoltGrade, Lubricant, NutGrade, ThreadSeries};
use crate::reference::ReferenceData;

/// Photos kept per form
pub const MAX_PHOTOS: usize = 4;

/// Flange pressure classes offered on the form
pub const FLANGE_CLASSES: [&str; 7] = ["150#", "300#", "400#", "600#", "900#", "1500#", "2500#"];

/// Flange facing types
pub const FLANGE_FACES: [&str; 7] = ["RF", "FF", "LJF", "RTJ", "TF", "GF", "M&F"];

pub const FASTENER_TYPES: [&str; 2] = ["Bolts", "Studs"];

pub const MIN_BOLT_HOLES: u32 = 4;
pub const MAX_BOLT_HOLES: u32 = 88;

/// Even bolt counts from 4 to 88
pub fn bolt_hole_options() -> impl Iterator<Item = u32> {
    (MIN_BOLT_HOLES..=MAX_BOLT_HOLES).step_by(2)
}

/// Name, signature image and date for one party
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureBlock {
    pub print_name: String,
    /// PNG/JPEG on disk, usually under `signatures/`
    pub signature_path: Option<PathBuf>,
    pub date: Option<NaiveDate>,
}

impl SignatureBlock {
    pub fn is_signed(&self) -> bool {
        self.signature_path.is_some()
    }
}

/// Values derived at save time
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivedValues {
    pub rounded_temp_f: Option<i32>,
    pub tpi_used: Option<f64>,
    pub as_used_in2: Option<f64>,
    pub strength_ksi_used: Option<f64>,
    pub k_used: Option<f64>,
    /// Rounded to the nearest ft-lb
    pub calculated_target_torque: Option<f64>,
}

/// A flange bolting form
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlangeForm {
    pub id: Uuid,
    pub job_id: Uuid,
    #[serde(default = "today")]
    pub date: NaiveDate,

    // Flange and service
    pub description: String,
    pub service_type: String,
    pub gasket_type: String,
    pub flange_class: String,
    pub pipe_size: String,
    pub custom_inner_diameter: String,
    pub custom_outer_diameter: String,
    pub custom_thickness: String,
    pub flange_face: String,
    pub bolt_holes: Option<u32>,
    pub flange_face_condition: String,
    pub flange_parallel: Option<bool>,

    // Tooling
    pub wrench_serials: String,
    pub wrench_cal_date: Option<NaiveDate>,
    pub torque_dry: bool,
    pub torque_wet: bool,
    pub lubricant: Option<Lubricant>,

    // Fasteners
    pub fastener_type: String,
    /// Spec, grade and (for A453 Grade 660) class
    pub fastener_grade: Option<BoltGrade>,
    pub fastener_length: String,
    pub fastener_diameter: String,
    pub thread_series: Option<ThreadSeries>,
    pub nut_grade: Option<NutGrade>,
    pub nut_override_acknowledged: bool,
    pub washer_used: bool,
    pub bearing_surface: BearingSurface,

    // Torque inputs
    pub working_temp_f: Option<f64>,
    pub torque_method: TorqueMethod,
    pub target_bolt_load_lbf: Option<f64>,
    /// As typed; `None` until edited
    pub pct_yield_target: Option<String>,
    pub use_custom_torque: bool,
    pub specified_target_torque: Option<f64>,
    pub derived: DerivedValues,

    /// Pass 1, 2, 3 and the check pass
    pub passes: [PassRecord; 4],

    pub photos: Vec<PathBuf>,
    pub contractor: SignatureBlock,
    pub facility: SignatureBlock,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Everything the form screen shows next to the inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormEvaluation {
    pub torque: TorqueEvaluation,
    pub nut: Option<PairingEvaluation>,
    pub washer: Vec<Advisory>,
    pub sequence: Vec<u32>,
    pub marking_instruction: Option<String>,
    /// Torque issues plus an unacknowledged nut mismatch
    pub issues: Vec<CalcIssue>,
}

impl FormEvaluation {
    pub fn nut_requires_ack(&self) -> bool {
        self.nut.as_ref().is_some_and(|n| n.requires_ack)
    }
}

impl FlangeForm {
    /// Blank form dated today.
    pub fn new(job_id: Uuid) -> Self {
        FlangeForm {
            id: Uuid::new_v4(),
            job_id,
            date: today(),
            ..Default::default()
        }
    }

    /// Torque calculation inputs as entered on this form
    pub fn torque_input(&self, fallback_pct_yield: Option<f64>) -> TorqueInput {
        TorqueInput {
            diameter: self.fastener_diameter.clone(),
            thread_series: self.thread_series,
            grade: self.fastener_grade,
            working_temp_f: self.working_temp_f,
            gasket: Some(self.gasket_type.clone()).filter(|g| !g.trim().is_empty()),
            pct_yield: self.pct_yield_target.clone(),
            fallback_pct_yield,
            target_bolt_load_lbf: self.target_bolt_load_lbf,
            torque_wet: self.torque_wet,
            lubricant: self.lubricant,
            specified_torque_ftlb: self.specified_target_torque,
            use_custom_torque: self.use_custom_torque,
        }
    }

    pub fn washer_context(&self) -> WasherContext {
        WasherContext {
            bolt: self.fastener_grade,
            nut: self.nut_grade,
            washer_used: self.washer_used,
            bearing_surface: self.bearing_surface,
            stainless_washer_available: false,
        }
    }

    /// Run the torque calculation, nut and washer advisories and sequencing.
    pub fn evaluate(
        &self,
        data: &ReferenceData,
        pairing: &NutPairingConfig,
        fallback_pct_yield: Option<f64>,
    ) -> FormEvaluation {
        let torque = evaluate_torque(data, &self.torque_input(fallback_pct_yield));
        let nut = self
            .fastener_grade
            .and_then(|grade| pairing.evaluate_grades(grade, self.nut_grade));
        let washer = washer_messages(&self.washer_context());

        let sequence = self
            .bolt_holes
            .map(|n| bolt_sequence(data, n))
            .unwrap_or_default();
        let marking_instruction = self
            .bolt_holes
            .map(|n| marking_instruction(n, data.numbering_direction(), &sequence));

        let mut issues = torque.issues.clone();
        if nut.as_ref().is_some_and(|n| n.requires_ack) && !self.nut_override_acknowledged {
            issues.push(CalcIssue::NutMismatchUnacknowledged);
        }

        FormEvaluation {
            torque,
            nut,
            washer,
            sequence,
            marking_instruction,
            issues,
        }
    }

    /// Copy derived values from an evaluation onto the form.
    pub fn snapshot(&mut self, eval: &TorqueEvaluation) {
        self.torque_method = eval.method;
        if self.thread_series.is_none() {
            self.thread_series = eval.thread_series;
        }
        self.derived = DerivedValues {
            rounded_temp_f: eval.used_temp_f,
            tpi_used: eval.tpi,
            as_used_in2: eval.as_in2,
            strength_ksi_used: eval.strength_ksi,
            k_used: eval.k,
            calculated_target_torque: eval.calculated_torque_ftlb.map(f64::round),
        };
        if eval.requires_specified_torque {
            self.use_custom_torque = true;
        }
    }

    /// Issues that stop the form being saved
    pub fn save_blockers(&self, eval: &FormEvaluation) -> Vec<CalcIssue> {
        eval.issues
            .iter()
            .copied()
            .filter(|issue| *issue == CalcIssue::NutMismatchUnacknowledged)
            .collect()
    }

    /// Final target torque: specified when in use, else the saved calculation.
    pub fn effective_torque(&self) -> Option<f64> {
        let specified = self.specified_target_torque.filter(|t| *t > 0.0);
        let using_specified =
            specified.is_some() && (self.use_custom_torque || self.torque_method == TorqueMethod::SpecifiedTorque);
        if using_specified {
            specified
        } else {
            self.derived.calculated_target_torque.or(specified)
        }
    }

    pub fn pass(&self, pass: TighteningPass) -> &PassRecord {
        &self.passes[usize::from(pass.number() - 1)]
    }

    /// Record a pass sign-off; initials are clipped to four characters.
    pub fn sign_pass(&mut self, pass: TighteningPass, initials: &str) {
        self.passes[usize::from(pass.number() - 1)] = PassRecord::signed(initials);
    }

    pub fn clear_pass(&mut self, pass: TighteningPass) {
        self.passes[usize::from(pass.number() - 1)] = PassRecord::default();
    }

    /// Report line for a pass against the effective torque
    pub fn pass_line(&self, pass: TighteningPass) -> String {
        pass.report_line(self.effective_torque(), &self.pass(pass).initials)
    }

    pub fn add_photo(&mut self, path: PathBuf) -> FlangeResult<()> {
        if self.photos.len() >= MAX_PHOTOS {
            return Err(FlangeError::invalid_input(
                "photos",
                path.display().to_string(),
                format!("A form holds at most {MAX_PHOTOS} photos"),
            ));
        }
        self.photos.push(path);
        Ok(())
    }

    /// Structural checks applied before a form is stored.
    pub fn validate(&self) -> FlangeResult<()> {
        if let Some(n) = self.bolt_holes {
            if !(MIN_BOLT_HOLES..=MAX_BOLT_HOLES).contains(&n) || n % 2 != 0 {
                return Err(FlangeError::invalid_input(
                    "bolt_holes",
                    n.to_string(),
                    format!("Bolt holes must be an even number from {MIN_BOLT_HOLES} to {MAX_BOLT_HOLES}"),
                ));
            }
        }
        if self.photos.len() > MAX_PHOTOS {
            return Err(FlangeError::invalid_input(
                "photos",
                self.photos.len().to_string(),
                format!("A form holds at most {MAX_PHOTOS} photos"),
            ));
        }
        if let Some(t) = self.working_temp_f {
            if !t.is_finite() {
                return Err(FlangeError::invalid_input("working_temp_f", t.to_string(), "Temperature must be a number"));
            }
        }
        if self.torque_dry && self.torque_wet {
            return Err(FlangeError::invalid_input(
                "torque_wet",
                "true",
                "Torque cannot be both dry and wet",
            ));
        }
        Ok(())
    }

    /// Evaluate, snapshot and check the form is ready to store.
    pub fn prepare_for_save(
        &mut self,
        data: &ReferenceData,
        pairing: &NutPairingConfig,
        fallback_pct_yield: Option<f64>,
    ) -> FlangeResult<FormEvaluation> {
        self.validate()?;
        for record in self.passes.iter_mut() {
            record.initials = clip_initials(&record.initials);
        }
        let eval = self.evaluate(data, pairing, fallback_pct_yield);
        if !eval.nut_requires_ack() {
            self.nut_override_acknowledged = false;
        }
        if let Some(blocker) = self.save_blockers(&eval).first() {
            return Err(FlangeError::invalid_input(
                "nut_override_acknowledged",
                "false",
                blocker.message(),
            ));
        }
        self.snapshot(&eval.torque);
        Ok(eval)
    }
}
