//! # PDF Reports
//!
//! Renders a job and its flange forms to PDF with Typst.
//!
//! - The Typst source is assembled from string fragments
//! - Photos and signature images are served to Typst from memory; files
//!   that cannot be read are left out
//! - Output is raw PDF bytes (`Vec<u8>`)
//!
//! ## Example
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use flange_core::advisories::NutPairingConfig;
//! use flange_core::job::Job;
//! use flange_core::pdf::{export_file_name, render_job_pdf};
//! use flange_core::reference::ReferenceData;
//!
//! let date = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
//! let job = Job::new("24-118", "Unit 3 crude heater", date);
//! let pdf = render_job_pdf(&job, ReferenceData::bundled()?, NutPairingConfig::bundled()?)?;
//! std::fs::write(export_file_name(&job, date), pdf).unwrap();
//! # Ok::<(), flange_core::errors::FlangeError>(())
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Local, NaiveDate};
use once_cell::sync::Lazy;
use typst::diag::{FileError, FileResult};
use typst::foundations::{Bytes, Datetime};
use typst::syntax::{FileId, Source};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, LibraryExt, World};
use typst_pdf::PdfOptions;

use crate::advisories::NutPairingConfig;
use crate::calculations::TighteningPass;
use crate::errors::{FlangeError, FlangeResult};
use crate::form::{FlangeForm, SignatureBlock};
use crate::job::{format_date, Job};
use crate::reference::ReferenceData;

const NUT_WARNING_NOTE: &str = "Selected nut is not the commonly paired type for this stud material/grade. Proceed only if facility spec allows.";

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "svg"];

static FONTS: Lazy<Vec<Font>> = Lazy::new(|| {
    typst_assets::fonts()
        .flat_map(|data| Font::iter(Bytes::new(data)))
        .collect()
});

// ============================================================================
// Typst World
// ============================================================================

/// Single-document world with images held in memory.
struct PdfWorld {
    main: Source,
    book: LazyHash<FontBook>,
    library: LazyHash<Library>,
    /// Keyed by rootless virtual path, e.g. `images/photo-1-2.jpg`
    files: HashMap<PathBuf, Bytes>,
}

impl PdfWorld {
    fn new(source: String, files: HashMap<PathBuf, Bytes>) -> Self {
        PdfWorld {
            main: Source::detached(source),
            book: LazyHash::new(FontBook::from_fonts(FONTS.iter())),
            library: LazyHash::new(Library::default()),
            files,
        }
    }
}

impl World for PdfWorld {
    fn library(&self) -> &LazyHash<Library> {
        &self.library
    }

    fn book(&self) -> &LazyHash<FontBook> {
        &self.book
    }

    fn main(&self) -> FileId {
        self.main.id()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        if id == self.main.id() {
            Ok(self.main.clone())
        } else {
            Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
        }
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        let path = id.vpath().as_rootless_path();
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| FileError::NotFound(path.into()))
    }

    fn font(&self, index: usize) -> Option<Font> {
        FONTS.get(index).cloned()
    }

    fn today(&self, _offset: Option<i64>) -> Option<Datetime> {
        let now = Local::now();
        Datetime::from_ymd(now.year(), u8::try_from(now.month()).ok()?, u8::try_from(now.day()).ok()?)
    }
}

/// Images read from disk for one document
#[derive(Default)]
struct ImageStore {
    files: HashMap<PathBuf, Bytes>,
}

impl ImageStore {
    /// Load `path` under `name`. Returns the Typst path, or `None` when the
    /// file is missing, unreadable or not an image type Typst knows.
    fn add(&mut self, path: &Path, name: &str) -> Option<String> {
        let extension = path.extension()?.to_string_lossy().to_lowercase();
        if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            tracing::warn!(path = %path.display(), "skipping unsupported image type");
            return None;
        }
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping missing image");
                return None;
            }
        };
        let file_name = format!("{name}.{extension}");
        self.files.insert(Path::new("images").join(&file_name), Bytes::new(data));
        Some(format!("/images/{file_name}"))
    }
}

// ============================================================================
// Document Assembly
// ============================================================================

const PREAMBLE: &str = r##"
#set page(
  paper: "us-letter",
  margin: (x: 0.6in, y: 0.7in),
  footer: context [
    #line(length: 100%, stroke: 0.5pt + gray)
    #grid(
      columns: (1fr, 1fr),
      align(left)[#text(size: 8pt)[Job: {{JOB_NUMBER}}]],
      align(right)[#text(size: 8pt)[Page #counter(page).display()]],
    )
  ]
)
#set text(size: 9pt)

#align(center)[
  #block(width: 100%, fill: rgb("#f0f0f0"), inset: 10pt, radius: 4pt)[
    #text(size: 16pt, weight: "bold")[FLANGE TORQUE REPORT]
  ]
]
#grid(
  columns: (1fr, 1.6fr, 1fr),
  [*Job:* {{JOB_NUMBER}}],
  [*Location:* {{LOCATION}}],
  align(right)[*Date:* {{DATE}}],
)
#v(6pt)
"##;

/// Render a job and all its forms to PDF bytes.
pub fn render_job_pdf(job: &Job, data: &ReferenceData, pairing: &NutPairingConfig) -> FlangeResult<Vec<u8>> {
    let mut images = ImageStore::default();
    let mut source = PREAMBLE
        .replace("{{JOB_NUMBER}}", &escape_typst(&job.number))
        .replace("{{LOCATION}}", &escape_typst(&job.location))
        .replace("{{DATE}}", &job.date_label());

    if job.forms.is_empty() {
        source.push_str("\n_No flange forms recorded for this job._\n");
    }
    for (index, form) in job.forms.iter().enumerate() {
        if index > 0 {
            source.push_str("\n#pagebreak()\n");
        }
        source.push_str(&form_section(index + 1, form, data, pairing, &mut images));
    }

    let world = PdfWorld::new(source, images.files);
    let document = typst::compile(&world).output.map_err(|errors| {
        let msgs: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        FlangeError::ReportError {
            reason: format!("Typst compilation failed: {}", msgs.join("; ")),
        }
    })?;

    let pdf = typst_pdf::pdf(&document, &PdfOptions::default()).map_err(|errors| {
        let msgs: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        FlangeError::ReportError {
            reason: format!("PDF rendering failed: {}", msgs.join("; ")),
        }
    })?;

    tracing::info!(job = %job.number, forms = job.forms.len(), bytes = pdf.len(), "rendered job report");
    Ok(pdf)
}

/// Render and write the report into `dir`. Returns the written path.
pub fn write_job_report(
    job: &Job,
    data: &ReferenceData,
    pairing: &NutPairingConfig,
    dir: &Path,
    date: NaiveDate,
) -> FlangeResult<PathBuf> {
    let pdf = render_job_pdf(job, data, pairing)?;
    let path = dir.join(export_file_name(job, date));
    fs::write(&path, pdf).map_err(|e| FlangeError::file_error("write", path.display().to_string(), e.to_string()))?;
    Ok(path)
}

/// `Job_<number>_<yyyyMMdd>.pdf`, with path separators in the number replaced.
pub fn export_file_name(job: &Job, date: NaiveDate) -> String {
    let number: String = job
        .number
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect();
    format!("Job_{}_{}.pdf", number, date.format("%Y%m%d"))
}

fn form_section(
    number: usize,
    form: &FlangeForm,
    data: &ReferenceData,
    pairing: &NutPairingConfig,
    images: &mut ImageStore,
) -> String {
    let eval = form.evaluate(data, pairing, None);
    let torque = &eval.torque;
    let derived = &form.derived;

    let strength = derived.strength_ksi_used.or(torque.strength_ksi);
    let bolt_stress = strength.zip(torque.pct_yield).map(|(s, p)| s * p);
    let calc_torque = derived
        .calculated_target_torque
        .or(torque.calculated_torque_ftlb);

    let left: Vec<(&str, String)> = vec![
        ("Form #", number.to_string()),
        ("Flange Desc", form.description.clone()),
        ("Service Type", form.service_type.clone()),
        ("Gasket Type", form.gasket_type.clone()),
        ("Flange Class", form.flange_class.clone()),
        ("Pipe Size", form.pipe_size.clone()),
        ("Custom I.D.", form.custom_inner_diameter.clone()),
        ("Custom O.D.", form.custom_outer_diameter.clone()),
        ("Thickness", form.custom_thickness.clone()),
        ("Flange Face", form.flange_face.clone()),
        ("Bolt Holes", form.bolt_holes.map(|n| n.to_string()).unwrap_or_default()),
        ("Face Condition", form.flange_face_condition.clone()),
        ("Parallel", form.flange_parallel.map(yes_no).unwrap_or_default().to_string()),
        ("Fastener Type", form.fastener_type.clone()),
        ("Fastener Spec", form.fastener_grade.map(|g| g.display_name().to_string()).unwrap_or_default()),
        ("Fastener Length", inches(&form.fastener_length)),
        ("Fastener Dia", inches(&form.fastener_diameter)),
        ("Thread Series", form.thread_series.or(torque.thread_series).map(|s| s.code().to_string()).unwrap_or_default()),
        ("Nut Spec", form.nut_grade.map(|n| n.display_name().to_string()).unwrap_or_default()),
        ("Washer Used", yes_no(form.washer_used).to_string()),
    ];

    let mut right: Vec<(&str, String)> = vec![
        ("Wrench S/N", form.wrench_serials.clone()),
        ("Wrench Cal", form.wrench_cal_date.map(format_date).unwrap_or_default()),
        ("Lubricated", yes_no(form.torque_wet).to_string()),
        ("Lubricant", form.lubricant.map(|l| l.display_name()).unwrap_or_default()),
        ("Method", form.torque_method.label().to_string()),
        ("Target Bolt Stress", fmt_opt(bolt_stress, |v| format!("{v:.1} ksi"))),
        ("Yield %", fmt_opt(torque.pct_yield, |v| format!("{:.0}%", v * 100.0))),
        ("TPI", fmt_opt(derived.tpi_used.or(torque.tpi), |v| format!("{v:.0}"))),
        ("As", fmt_opt(derived.as_used_in2.or(torque.as_in2), |v| format!("{v:.4} in²"))),
        ("S Value", fmt_opt(strength, |v| format!("{v:.1} ksi"))),
        ("Target Bolt Load F", fmt_opt(torque.bolt_load_lbf, |v| format!("{v:.0} lbf"))),
        ("Nut factor (K)", fmt_opt(derived.k_used.or(torque.k), |v| format!("K={v:.2}"))),
        ("Calc Torque", fmt_opt(calc_torque, |v| format!("{v:.0} ft-lb"))),
        ("Specified", fmt_opt(form.specified_target_torque.filter(|t| *t > 0.0), |v| format!("{v:.0} ft-lb"))),
        ("Nut Override Ack", yes_no(form.nut_override_acknowledged).to_string()),
    ];
    for pass in TighteningPass::ALL {
        right.push((pass.label(), form.pass_line(pass)));
    }

    let mut out = format!(
        "\n#text(size: 11pt, weight: \"bold\")[Form {number}: {}]\n#v(4pt)\n#grid(\n  columns: (1fr, 1fr),\n  gutter: 10pt,\n{},\n{},\n)\n",
        escape_typst(&form.description),
        field_table(&left),
        field_table(&right),
    );

    if let Some(instruction) = &eval.marking_instruction {
        out.push_str(&format!("\n#v(6pt)\n*Bolt Marking:* {}\n", escape_typst(instruction)));
    }

    if eval.nut.as_ref().is_some_and(|n| !n.warnings.is_empty()) {
        out.push_str(&format!(
            "\n#v(6pt)\n#block(width: 100%, fill: rgb(\"#fff3cd\"), inset: 6pt, radius: 3pt)[*Nut Warning:* {}]\n",
            escape_typst(NUT_WARNING_NOTE)
        ));
    }

    out.push_str(&format!(
        "\n#v(10pt)\n#grid(\n  columns: (1fr, 1fr),\n  gutter: 16pt,\n{},\n{},\n)\n",
        signature_block("Contractor Representative", &form.contractor, &format!("sig-{number}-contractor"), images),
        signature_block("Facility Representative", &form.facility, &format!("sig-{number}-facility"), images),
    ));

    let photos: Vec<String> = form
        .photos
        .iter()
        .enumerate()
        .filter_map(|(i, path)| images.add(path, &format!("photo-{number}-{}", i + 1)))
        .map(|vpath| format!("  image(\"{vpath}\", width: 100%, height: 3.5in, fit: \"contain\"),"))
        .collect();
    if !photos.is_empty() {
        out.push_str(&format!(
            "\n#pagebreak()\n#text(size: 11pt, weight: \"bold\")[Flange Photos: Form {number}]\n#v(6pt)\n#grid(\n  columns: (1fr, 1fr),\n  gutter: 10pt,\n{}\n)\n",
            photos.join("\n")
        ));
    }

    out
}

fn field_table(fields: &[(&str, String)]) -> String {
    let rows: Vec<String> = fields
        .iter()
        .map(|(label, value)| format!("    [*{}*], [{}],", escape_typst(label), escape_typst(value)))
        .collect();
    format!(
        "  table(\n    columns: (auto, 1fr),\n    stroke: 0.5pt + gray,\n    inset: 4pt,\n{}\n  )",
        rows.join("\n")
    )
}

fn signature_block(header: &str, block: &SignatureBlock, image_name: &str, images: &mut ImageStore) -> String {
    let signature = block
        .signature_path
        .as_deref()
        .and_then(|path| images.add(path, image_name))
        .map(|vpath| format!("#image(\"{vpath}\", height: 0.6in)"))
        .unwrap_or_else(|| "#box(width: 2in, height: 0.6in)".to_string());
    format!(
        "  [\n    *{}* \\\n    Print: {} \\\n    Sign: {} \\\n    Date: {}\n  ]",
        escape_typst(header),
        escape_typst(&block.print_name),
        signature,
        block.date.map(format_date).unwrap_or_default(),
    )
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

fn inches(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        String::new()
    } else {
        format!("{value} in")
    }
}

fn fmt_opt(value: Option<f64>, f: impl Fn(f64) -> String) -> String {
    value.filter(|v| v.is_finite()).map(f).unwrap_or_default()
}

/// Escape Typst markup characters in user-provided text.
fn escape_typst(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '*' | '_' | '#' | '$' | '@' | '<' | '>' | '\\' | '`' | '[' | ']' | '~' | '/' | '=' | '-' | '+'
            | '"' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str(" \\ "),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}
