//! Command implementations.

use std::borrow::Cow;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use flange_core::advisories::{washer_messages, Advisory, BearingSurface, NutPairingConfig, WasherContext};
use flange_core::calculations::{
    bolt_sequence, evaluate_torque, marking_instruction, TighteningPass, TorqueEvaluation, TorqueInput,
};
use flange_core::config::AppConfig;
use flange_core::errors::{FlangeError, FlangeResult};
use flange_core::fasteners::{BoltGrade, Lubricant, NutGrade, ThreadSeries};
use flange_core::file_io::{Attachment, StorageLayout};
use flange_core::form::{FlangeForm, FormEvaluation, MAX_BOLT_HOLES, MIN_BOLT_HOLES};
use flange_core::job::{format_date, Job, JobBook};
use flange_core::pdf::{export_file_name, render_job_pdf, write_job_report};
use flange_core::reference::ReferenceData;
use flange_core::units::{Celsius, Fahrenheit, FtLb, NewtonMeters};
use serde::Serialize;
use uuid::Uuid;

use crate::{SignerRole, TorqueArgs};

/// Loaded settings and tables shared by every command
pub struct App {
    config: AppConfig,
    data: Cow<'static, ReferenceData>,
    pairing: &'static NutPairingConfig,
    storage: StorageLayout,
    json: bool,
}

#[derive(Serialize)]
struct JobRow<'a> {
    id: Uuid,
    number: &'a str,
    location: &'a str,
    date: NaiveDate,
    forms: usize,
}

impl<'a> From<&'a Job> for JobRow<'a> {
    fn from(job: &'a Job) -> Self {
        JobRow {
            id: job.id,
            number: &job.number,
            location: &job.location,
            date: job.date,
            forms: job.forms.len(),
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn row(label: &str, value: impl std::fmt::Display) {
    println!("  {label:<18}{value}");
}

fn parse_date(text: Option<&str>) -> Result<NaiveDate> {
    match text {
        Some(text) => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{text}', expected YYYY-MM-DD")),
        None => Ok(Local::now().date_naive()),
    }
}

/// Resolve a job by number, id or id prefix.
fn find_job<'a>(book: &'a JobBook, query: &str) -> FlangeResult<&'a Job> {
    book.find_job(query).ok_or_else(|| FlangeError::not_found("Job", query))
}

/// Resolve a form by id, id prefix (4+ characters) or 1-based position.
fn find_form<'a>(job: &'a Job, query: &str) -> FlangeResult<&'a FlangeForm> {
    let query = query.trim();
    if let Ok(index) = query.parse::<usize>() {
        if let Some(form) = index.checked_sub(1).and_then(|i| job.forms.get(i)) {
            return Ok(form);
        }
    }
    if let Ok(id) = Uuid::parse_str(query) {
        return job.form(id).ok_or_else(|| FlangeError::not_found("Flange form", id));
    }
    let mut hits = job
        .forms
        .iter()
        .filter(|f| query.len() >= 4 && f.id.to_string().starts_with(query));
    match (hits.next(), hits.next()) {
        (Some(form), None) => Ok(form),
        _ => Err(FlangeError::not_found("Flange form", query)),
    }
}

/// Apply `change` to a copy of the form and store it back.
fn edit_form<T>(
    book: &mut JobBook,
    job: &str,
    form: &str,
    change: impl FnOnce(&mut FlangeForm) -> FlangeResult<T>,
) -> FlangeResult<T> {
    let found = find_job(book, job)?;
    let job_id = found.id;
    let mut edited = find_form(found, form)?.clone();
    let out = change(&mut edited)?;
    book.replace_form(job_id, edited)?;
    Ok(out)
}

impl App {
    pub fn new(config: AppConfig, json: bool) -> Result<Self> {
        let data = config.reference_data().context("Failed to load reference data")?;
        let pairing = NutPairingConfig::bundled().context("Failed to load nut pairing rules")?;
        let storage = StorageLayout::new(&config.storage_dir);
        Ok(App {
            config,
            data,
            pairing,
            storage,
            json,
        })
    }

    fn user(&self) -> &str {
        &self.config.user_id
    }

    // ========================================================================
    // Calculations
    // ========================================================================

    /// Flags of `flange torque` as a calculation input.
    fn torque_input(&self, args: &TorqueArgs) -> Result<TorqueInput> {
        let grade = BoltGrade::from_str_flexible(&args.grade)?;
        let thread_series = args.series.as_deref().map(ThreadSeries::from_str_flexible).transpose()?;
        let lubricant = args.lubricant.as_deref().map(Lubricant::from_str_flexible).transpose()?;
        if let Some(gasket) = args.gasket.as_deref() {
            if self.data.gasket(gasket).is_none() {
                bail!("Unknown gasket type '{gasket}'. See `flange reference gaskets`");
            }
        }
        let working_temp_f = args
            .temp_f
            .or_else(|| args.temp_c.map(|c| Fahrenheit::from(Celsius(c)).0));

        Ok(TorqueInput {
            diameter: args.diameter.clone(),
            thread_series,
            grade: Some(grade),
            working_temp_f,
            gasket: args.gasket.clone(),
            pct_yield: args.pct_yield.clone(),
            fallback_pct_yield: self.config.default_pct_yield,
            target_bolt_load_lbf: args.bolt_load,
            torque_wet: args.wet,
            lubricant,
            specified_torque_ftlb: args.specified,
            use_custom_torque: args.custom,
        })
    }

    pub fn torque(&self, args: &TorqueArgs) -> Result<()> {
        let input = self.torque_input(args)?;
        let eval = evaluate_torque(&self.data, &input);
        if self.json {
            return print_json(&eval);
        }
        let grade = input.grade.map(|g| g.display_name()).unwrap_or_default();
        println!("{grade} {}", args.diameter);
        print_torque(&eval);
        Ok(())
    }

    pub fn sequence(&self, count: u32) -> Result<()> {
        if !(MIN_BOLT_HOLES..=MAX_BOLT_HOLES).contains(&count) || count % 2 != 0 {
            bail!("Bolt count must be an even number from {MIN_BOLT_HOLES} to {MAX_BOLT_HOLES}");
        }
        let sequence = bolt_sequence(&self.data, count);
        let instruction = marking_instruction(count, self.data.numbering_direction(), &sequence);
        if self.json {
            return print_json(&serde_json::json!({
                "bolt_count": count,
                "direction": self.data.numbering_direction(),
                "sequence": sequence,
                "instruction": instruction,
            }));
        }
        println!("{instruction}");
        Ok(())
    }

    pub fn nuts(&self, grade: &str, nut: Option<&str>, washer: bool, surface: BearingSurface) -> Result<()> {
        let bolt = BoltGrade::from_str_flexible(grade)?;
        let nut = nut.map(NutGrade::from_str_flexible).transpose()?;
        let pairing = self.pairing.evaluate_grades(bolt, nut);
        let washer = washer_messages(&WasherContext {
            bolt: Some(bolt),
            nut,
            washer_used: washer,
            bearing_surface: surface,
            stainless_washer_available: false,
        });

        if self.json {
            return print_json(&serde_json::json!({ "pairing": pairing, "washer": washer }));
        }
        match &pairing {
            Some(eval) => {
                row("Recommended nuts", eval.recommended_labels());
                if eval.requires_ack {
                    println!("  Acknowledgement required before a form with this pairing can be saved.");
                }
                print_advisories(&eval.warnings);
            }
            None => println!("  No pairing rule for {bolt}"),
        }
        print_advisories(&washer);
        Ok(())
    }

    // ========================================================================
    // Reference listings
    // ========================================================================

    pub fn list_grades(&self) -> Result<()> {
        if self.json {
            let rows: Vec<_> = BoltGrade::ALL
                .iter()
                .map(|g| serde_json::json!({ "key": g, "name": g.display_name(), "strength": self.data.strength_rows(*g) }))
                .collect();
            return print_json(&rows);
        }
        for grade in BoltGrade::ALL {
            let sy: Vec<String> = self
                .data
                .strength_rows(grade)
                .iter()
                .map(|r| match r.dia_max_in {
                    Some(max) => format!("Sy {} ksi to {max} in", r.sy_ksi),
                    None => format!("Sy {} ksi", r.sy_ksi),
                })
                .collect();
            println!("{:<26}{}", grade.display_name(), sy.join(", "));
        }
        Ok(())
    }

    pub fn list_nuts(&self) -> Result<()> {
        if self.json {
            return print_json(&NutGrade::ALL);
        }
        for nut in NutGrade::ALL {
            println!("{}", nut.display_name());
        }
        Ok(())
    }

    pub fn list_diameters(&self) -> Result<()> {
        let options = &self.data.fasteners.diameter_options;
        if self.json {
            return print_json(options);
        }
        println!("{:<10}{:>12}{:>12}{:>12}", "Diameter", "UNC", "UNF", "8UN");
        for key in options {
            let cell = |s: ThreadSeries| match (self.data.tpi(s, key), self.data.table_tensile_area(s, key)) {
                (Some(tpi), Some(area)) => format!("{tpi:.0}/{area:.3}"),
                _ => "-".to_string(),
            };
            println!(
                "{:<10}{:>12}{:>12}{:>12}",
                key,
                cell(ThreadSeries::Unc),
                cell(ThreadSeries::Unf),
                cell(ThreadSeries::Un8)
            );
        }
        println!("(TPI / As in²)");
        Ok(())
    }

    pub fn list_gaskets(&self) -> Result<()> {
        if self.json {
            return print_json(&self.data.gasket_types);
        }
        for gasket in &self.data.gasket_types {
            let method = if gasket.requires_specified_torque() {
                "specified torque required".to_string()
            } else {
                match gasket.pct_yield_range() {
                    Some((lo, hi)) => format!("{:.0}-{:.0}% of yield", lo * 100.0, hi * 100.0),
                    None => "% of yield".to_string(),
                }
            };
            println!("{}\n    {method}", gasket.label);
        }
        Ok(())
    }

    pub fn list_lubricants(&self) -> Result<()> {
        if self.json {
            return print_json(&Lubricant::ALL);
        }
        for lube in Lubricant::ALL {
            println!("{}", lube.menu_label());
        }
        Ok(())
    }

    // ========================================================================
    // Jobs
    // ========================================================================

    pub fn job_new(&self, number: &str, location: &str, date: Option<&str>) -> Result<()> {
        let job = Job::new(number.trim(), location.trim(), parse_date(date)?);
        let id = self.storage.update(self.user(), |book| book.add_job(job))?;
        tracing::info!(%id, "created job");
        if self.json {
            return print_json(&serde_json::json!({ "id": id }));
        }
        println!("Created job {number} ({id})");
        Ok(())
    }

    pub fn job_list(&self) -> Result<()> {
        let book = self.storage.load()?;
        if self.json {
            let rows: Vec<JobRow> = book.jobs.iter().map(JobRow::from).collect();
            return print_json(&rows);
        }
        if book.jobs.is_empty() {
            println!("No jobs yet. Create one with `flange job new <number>`.");
        }
        for job in &book.jobs {
            println!(
                "{:<14}{:<14}{:<30}{} form(s)  {}",
                job.number,
                job.date_label(),
                job.location,
                job.forms.len(),
                &job.id.to_string()[..8]
            );
        }
        Ok(())
    }

    pub fn job_show(&self, query: &str) -> Result<()> {
        let book = self.storage.load()?;
        let job = find_job(&book, query)?;
        if self.json {
            return print_json(job);
        }
        println!("Job {}  {}  {}", job.number, job.location, job.date_label());
        for (i, form) in job.forms.iter().enumerate() {
            let torque = form
                .effective_torque()
                .map(|t| format!("{t:.0} ft-lb"))
                .unwrap_or_else(|| "no target".to_string());
            let passes = TighteningPass::ALL
                .iter()
                .filter(|p| form.pass(**p).confirmed)
                .count();
            println!(
                "  {}. {:<40}{:<14}{}/4 passes  {}",
                i + 1,
                form.description,
                torque,
                passes,
                &form.id.to_string()[..8]
            );
        }
        Ok(())
    }

    pub fn job_edit(
        &self,
        query: &str,
        number: Option<String>,
        location: Option<String>,
        date: Option<&str>,
    ) -> Result<()> {
        let date = date.map(|d| parse_date(Some(d))).transpose()?;
        self.storage.update(self.user(), |book| {
            let mut job = find_job(book, query)?.clone();
            if let Some(number) = number {
                job.number = number.trim().to_string();
            }
            if let Some(location) = location {
                job.location = location.trim().to_string();
            }
            if let Some(date) = date {
                job.date = date;
            }
            book.update_job(job)
        })?;
        println!("Updated job {query}");
        Ok(())
    }

    pub fn job_delete(&self, query: &str) -> Result<()> {
        let removed = self.storage.update(self.user(), |book| {
            let id = find_job(book, query)?.id;
            book.remove_job(id)
        })?;
        println!("Deleted job {} and {} form(s)", removed.number, removed.forms.len());
        Ok(())
    }

    // ========================================================================
    // Forms
    // ========================================================================

    pub fn form_template(&self) -> Result<()> {
        print_json(&FlangeForm::new(Uuid::nil()))
    }

    pub fn form_add(&self, job: &str, file: &Path, acknowledge_nut: bool) -> Result<()> {
        let text = if file == Path::new("-") {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text).context("Failed to read form from stdin")?;
            text
        } else {
            std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?
        };
        let mut form: FlangeForm = serde_json::from_str(&text).context("Form is not valid JSON")?;
        if form.id.is_nil() {
            form.id = Uuid::new_v4();
        }
        if acknowledge_nut {
            form.nut_override_acknowledged = true;
        }

        let eval = form
            .prepare_for_save(&self.data, self.pairing, self.config.default_pct_yield)
            .context("Form cannot be saved")?;
        let form_id = self
            .storage
            .update(self.user(), |book| {
                let job_id = find_job(book, job)?.id;
                book.add_form(job_id, form)
            })?;

        if self.json {
            return print_json(&serde_json::json!({ "id": form_id, "evaluation": eval }));
        }
        println!("Added form {form_id}");
        print_evaluation(&eval);
        Ok(())
    }

    pub fn form_show(&self, job: &str, form: &str) -> Result<()> {
        let book = self.storage.load()?;
        let job = find_job(&book, job)?;
        let form = find_form(job, form)?;
        let eval = form.evaluate(&self.data, self.pairing, self.config.default_pct_yield);
        if self.json {
            return print_json(&serde_json::json!({ "form": form, "evaluation": eval }));
        }

        println!("{}  ({})", form.description, format_date(form.date));
        row("Gasket", &form.gasket_type);
        row("Fastener", form.fastener_grade.map(|g| g.display_name()).unwrap_or("-"));
        row("Diameter", &form.fastener_diameter);
        row("Nut", form.nut_grade.map(|n| n.display_name()).unwrap_or("-"));
        print_evaluation(&eval);
        println!();
        for pass in TighteningPass::ALL {
            let mark = if form.pass(pass).confirmed { "x" } else { " " };
            println!("  [{mark}] {:<12}{}", pass.label(), form.pass_line(pass));
        }
        Ok(())
    }

    pub fn form_remove(&self, job: &str, form: &str) -> Result<()> {
        self.storage.update(self.user(), |book| {
            let found = find_job(book, job)?;
            let (job_id, form_id) = (found.id, find_form(found, form)?.id);
            book.remove_form(job_id, form_id)
        })?;
        println!("Removed form {form}");
        Ok(())
    }

    pub fn form_pass(&self, job: &str, form: &str, number: u8, initials: Option<&str>, clear: bool) -> Result<()> {
        let pass = TighteningPass::from_number(number).context("Pass must be 1 to 4")?;
        let line = self.storage.update(self.user(), |book| {
            edit_form(book, job, form, |f| {
                match initials {
                    Some(initials) if !clear => f.sign_pass(pass, initials),
                    _ => f.clear_pass(pass),
                }
                Ok(f.pass_line(pass))
            })
        })?;
        println!("{}: {}", pass.label(), line);
        Ok(())
    }

    pub fn form_photo(&self, job: &str, form: &str, path: &Path) -> Result<()> {
        let stored = self.storage.import(Attachment::Photo, path)?;
        let result = self.storage.update(self.user(), |book| {
            edit_form(book, job, form, |f| f.add_photo(stored.clone()))
        });
        if let Err(e) = result {
            let _ = std::fs::remove_file(&stored);
            return Err(e.into());
        }
        println!("Attached {}", stored.display());
        Ok(())
    }

    pub fn form_sign(
        &self,
        job: &str,
        form: &str,
        role: SignerRole,
        name: &str,
        image: Option<&Path>,
        date: Option<&str>,
    ) -> Result<()> {
        let date = parse_date(date)?;
        let signature = image
            .map(|path| self.storage.import(Attachment::Signature, path))
            .transpose()?;
        self.storage.update(self.user(), |book| {
            edit_form(book, job, form, |f| {
                let block = match role {
                    SignerRole::Contractor => &mut f.contractor,
                    SignerRole::Facility => &mut f.facility,
                };
                block.print_name = name.trim().to_string();
                block.date = Some(date);
                if signature.is_some() {
                    block.signature_path = signature.clone();
                }
                Ok(())
            })
        })?;
        println!("Signed by {name}");
        Ok(())
    }

    // ========================================================================
    // Export, storage, config
    // ========================================================================

    pub fn export(&self, query: &str, out: Option<&Path>) -> Result<()> {
        let book = self.storage.load()?;
        let job = find_job(&book, query)?;
        let today = Local::now().date_naive();
        let path = match out {
            Some(out) => {
                let pdf = render_job_pdf(job, &self.data, self.pairing)?;
                std::fs::write(out, pdf).with_context(|| format!("Failed to write {}", out.display()))?;
                out.to_path_buf()
            }
            None => {
                self.storage.ensure()?;
                write_job_report(job, &self.data, self.pairing, &self.storage.reports_dir(), today)?
            }
        };
        tracing::debug!(default_name = %export_file_name(job, today), "export finished");
        println!("Wrote {}", path.display());
        Ok(())
    }

    pub fn storage(&self) -> Result<()> {
        let usage = self.storage.usage()?;
        if self.json {
            return print_json(&serde_json::json!({
                "root": self.storage.root(),
                "bytes": usage.bytes,
                "limit_bytes": usage.limit_bytes,
                "percent": usage.percent(),
            }));
        }
        println!("{}: {}", self.storage.root().display(), usage.summary());
        if usage.is_over_limit() {
            println!("Storage is full. Export and remove old jobs to free space.");
        }
        Ok(())
    }

    pub fn config_show(&self) -> Result<()> {
        if self.json {
            return print_json(&self.config);
        }
        print!("{}", toml::to_string_pretty(&self.config)?);
        Ok(())
    }
}

pub fn config_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    AppConfig::default().save(path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

// ============================================================================
// Output
// ============================================================================

fn print_advisories(advisories: &[Advisory]) {
    for advisory in advisories {
        println!("  {advisory}");
    }
}

fn print_torque(eval: &TorqueEvaluation) {
    let fmt = |v: Option<f64>, f: &dyn Fn(f64) -> String| v.map(f).unwrap_or_else(|| "-".to_string());

    row(
        "Thread",
        format!(
            "{} {}",
            eval.thread_series.map(|s| s.code()).unwrap_or("-"),
            fmt(eval.tpi, &|t| format!("({t:.0} TPI)"))
        ),
    );
    row("Tensile area", fmt(eval.as_in2, &|a| format!("{a:.4} in²")));
    match (eval.allowable_ksi, eval.used_temp_f) {
        (Some(s), Some(t)) => row("Strength", format!("S = {s:.1} ksi at {t}°F")),
        _ => row("Strength", fmt(eval.sy_ksi, &|s| format!("Sy = {s:.1} ksi"))),
    }
    row("Percent yield", fmt(eval.pct_yield, &|p| format!("{:.0}%", p * 100.0)));
    row("Bolt load", fmt(eval.bolt_load_lbf, &|f| format!("{f:.0} lbf")));
    row("Nut factor", fmt(eval.k, &|k| format!("K = {k:.2}")));
    row("Method", eval.method.label());
    row(
        "Target torque",
        fmt(eval.effective_torque_ftlb, &|t| {
            let nm: NewtonMeters = FtLb(t).into();
            format!("{:.0} ({nm:.0})", FtLb(t))
        }),
    );

    if eval.effective_torque_ftlb.is_some() {
        println!();
        for pass in TighteningPass::ALL {
            println!("  {:<12}{}", pass.label(), eval.pass_line(pass, ""));
        }
    }
    for note in &eval.gasket_notes {
        println!("  Note: {note}");
    }
    for message in eval.issue_messages() {
        println!("  ! {message}");
    }
}

fn print_evaluation(eval: &FormEvaluation) {
    print_torque(&eval.torque);
    if let Some(nut) = &eval.nut {
        print_advisories(&nut.warnings);
    }
    print_advisories(&eval.washer);
    if let Some(instruction) = &eval.marking_instruction {
        println!();
        println!("{instruction}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job_with_forms(n: usize) -> Job {
        let mut job = Job::new("24-118", "Unit 3", NaiveDate::from_ymd_opt(2026, 3, 4).unwrap());
        for _ in 0..n {
            job.forms.push(FlangeForm::new(job.id));
        }
        job
    }

    #[test]
    fn forms_resolve_by_position_id_and_prefix() {
        let job = job_with_forms(3);
        let second = job.forms[1].id;

        assert_eq!(find_form(&job, "2").unwrap().id, second);
        assert_eq!(find_form(&job, &second.to_string()).unwrap().id, second);
        assert_eq!(find_form(&job, &second.to_string()[..8]).unwrap().id, second);
        assert!(find_form(&job, "4").is_err());
        assert!(find_form(&job, "0").is_err());
    }

    #[test]
    fn dates_parse_iso_only() {
        assert_eq!(
            parse_date(Some("2026-03-04")).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 4).unwrap()
        );
        assert!(parse_date(Some("03/04/2026")).is_err());
        assert_eq!(parse_date(None).unwrap(), Local::now().date_naive());
    }

    #[test]
    fn edit_form_writes_back() {
        let mut book = JobBook::new();
        let job = job_with_forms(1);
        let form_id = job.forms[0].id;
        book.add_job(job).unwrap();

        let line = edit_form(&mut book, "24-118", "1", |f| {
            f.sign_pass(TighteningPass::Pass1, "ab");
            Ok(f.pass_line(TighteningPass::Pass1))
        })
        .unwrap();
        assert!(line.ends_with("ab"));

        let job_id = book.find_job("24-118").unwrap().id;
        assert!(book.form(job_id, form_id).unwrap().pass(TighteningPass::Pass1).confirmed);
    }

    fn app(dir: &tempfile::TempDir) -> App {
        let config = AppConfig {
            storage_dir: dir.path().join("flange_helper"),
            user_id: "jsmith".to_string(),
            ..AppConfig::default()
        };
        App::new(config, true).unwrap()
    }

    fn torque_args(grade: &str, diameter: &str) -> TorqueArgs {
        TorqueArgs {
            diameter: diameter.to_string(),
            grade: grade.to_string(),
            series: None,
            temp_f: None,
            temp_c: None,
            gasket: None,
            pct_yield: None,
            bolt_load: None,
            wet: false,
            lubricant: None,
            specified: None,
            custom: false,
        }
    }

    #[test]
    fn sequence_accepts_even_counts_within_form_limits() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = app(&dir);
        for count in [4, 12, 88] {
            assert!(app.sequence(count).is_ok(), "{count}");
        }
        for count in [0, 2, 3, 7, 90] {
            assert!(app.sequence(count).is_err(), "{count}");
        }
    }

    #[test]
    fn torque_converts_celsius() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = app(&dir);
        let args = TorqueArgs {
            temp_c: Some(100.0),
            ..torque_args("B7", "1")
        };
        let input = app.torque_input(&args).unwrap();
        assert_eq!(input.grade, Some(BoltGrade::A193_B7));
        let temp = input.working_temp_f.unwrap();
        assert!((temp - 212.0).abs() < 1e-9, "{temp}");

        let args = TorqueArgs {
            temp_f: Some(650.0),
            ..torque_args("B7", "1")
        };
        assert_eq!(app.torque_input(&args).unwrap().working_temp_f, Some(650.0));
    }

    #[test]
    fn torque_rejects_unknown_inputs() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = app(&dir);
        let args = TorqueArgs {
            gasket: Some("Cardboard".to_string()),
            ..torque_args("B7", "1")
        };
        let err = app.torque_input(&args).unwrap_err();
        assert!(err.to_string().contains("Unknown gasket type 'Cardboard'"));

        assert!(app.torque_input(&torque_args("A999", "1")).is_err());
        assert!(app.torque(&torque_args("B7", "1")).is_ok());
    }

    #[test]
    fn job_edit_keeps_numbers_unique() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = app(&dir);
        app.job_new("24-118", "Unit 3", Some("2026-03-04")).unwrap();
        app.job_new("24-119", "Unit 4", Some("2026-03-04")).unwrap();
        assert!(app.job_new("24-118", "", None).is_err());

        assert!(app.job_edit("24-119", Some("24-118".to_string()), None, None).is_err());
        app.job_edit("24-119", Some("24-120".to_string()), None, None).unwrap();

        let book = app.storage.load().unwrap();
        let numbers: Vec<&str> = book.jobs.iter().map(|j| j.number.as_str()).collect();
        assert_eq!(numbers, vec!["24-118", "24-120"]);
    }

    #[test]
    fn config_init_refuses_to_overwrite() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("flange.toml");

        config_init(&path, false).unwrap();
        assert!(config_init(&path, false).is_err());
        config_init(&path, true).unwrap();
        assert!(AppConfig::load_or_default(&path).is_ok());
    }
}
