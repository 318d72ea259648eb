//! # Jobs and the Job Book
//!
//! A [`Job`] is a work order at a site: a number, a location, a date and the
//! flange forms completed under it. The [`JobBook`] is the root container
//! persisted to `jobs.json`.
//!
//! ## Structure
//!
//! ```text
//! JobBook
//! ├── meta: JobBookMetadata (schema version, timestamps)
//! └── jobs: Vec<Job> (display order, newest last)
//!     └── forms: Vec<FlangeForm>
//! ```
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use flange_core::job::{Job, JobBook};
//! use flange_core::form::FlangeForm;
//!
//! let mut book = JobBook::new();
//! let date = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
//! let job_id = book.add_job(Job::new("24-118", "Unit 3 crude heater", date)).unwrap();
//!
//! let form_id = book.add_form(job_id, FlangeForm::new(job_id)).unwrap();
//! assert!(book.form(job_id, form_id).is_some());
//! assert_eq!(book.job(job_id).unwrap().date_label(), "Mar 4, 2026");
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{FlangeError, FlangeResult};
use crate::form::FlangeForm;

/// Current schema version for `jobs.json`
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Render a date the way forms and reports print it: `Mar 4, 2026`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// A work order and its flange forms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub number: String,
    pub location: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub forms: Vec<FlangeForm>,
}

impl Job {
    pub fn new(number: impl Into<String>, location: impl Into<String>, date: NaiveDate) -> Self {
        Job {
            id: Uuid::new_v4(),
            number: number.into(),
            location: location.into(),
            date,
            forms: Vec::new(),
        }
    }

    pub fn date_label(&self) -> String {
        format_date(self.date)
    }

    pub fn validate(&self) -> FlangeResult<()> {
        if self.number.trim().is_empty() {
            return Err(FlangeError::missing_field("number"));
        }
        Ok(())
    }

    pub fn form(&self, form_id: Uuid) -> Option<&FlangeForm> {
        self.forms.iter().find(|f| f.id == form_id)
    }
}

/// Root container persisted to `jobs.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobBook {
    pub meta: JobBookMetadata,
    #[serde(default)]
    pub jobs: Vec<Job>,
}

/// File header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobBookMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Default for JobBook {
    fn default() -> Self {
        JobBook::new()
    }
}

impl JobBook {
    pub fn new() -> Self {
        let now = Utc::now();
        JobBook {
            meta: JobBookMetadata {
                version: SCHEMA_VERSION.to_string(),
                created: now,
                modified: now,
            },
            jobs: Vec::new(),
        }
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    // ========================================================================
    // Jobs
    // ========================================================================

    /// Job numbers are unique across the book.
    fn check_number_free(&self, job: &Job) -> FlangeResult<()> {
        let number = job.number.trim();
        if self.jobs.iter().any(|j| j.id != job.id && j.number.trim() == number) {
            return Err(FlangeError::invalid_input("number", number, "Job number already exists"));
        }
        Ok(())
    }

    /// Append a job. Returns its id.
    pub fn add_job(&mut self, job: Job) -> FlangeResult<Uuid> {
        job.validate()?;
        if self.job(job.id).is_some() {
            return Err(FlangeError::invalid_input("id", job.id.to_string(), "Job id already exists"));
        }
        self.check_number_free(&job)?;
        let id = job.id;
        tracing::debug!(job = %job.number, %id, "adding job");
        self.jobs.push(job);
        self.touch();
        Ok(id)
    }

    /// Replace a job's header fields (number, location, date), keeping its forms.
    pub fn update_job(&mut self, job: Job) -> FlangeResult<()> {
        job.validate()?;
        self.check_number_free(&job)?;
        let existing = self
            .job_mut(job.id)
            .ok_or_else(|| FlangeError::not_found("Job", job.id))?;
        existing.number = job.number;
        existing.location = job.location;
        existing.date = job.date;
        self.touch();
        Ok(())
    }

    pub fn remove_job(&mut self, id: Uuid) -> FlangeResult<Job> {
        let index = self
            .jobs
            .iter()
            .position(|j| j.id == id)
            .ok_or_else(|| FlangeError::not_found("Job", id))?;
        let job = self.jobs.remove(index);
        self.touch();
        Ok(job)
    }

    pub fn job(&self, id: Uuid) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == id)
    }

    fn job_mut(&mut self, id: Uuid) -> Option<&mut Job> {
        self.jobs.iter_mut().find(|j| j.id == id)
    }

    /// Find a job by full id, id prefix (at least 4 characters) or job number.
    ///
    /// Ambiguous prefixes match nothing.
    pub fn find_job(&self, query: &str) -> Option<&Job> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        if let Ok(id) = Uuid::parse_str(query) {
            return self.job(id);
        }
        if let Some(job) = self.jobs.iter().find(|j| j.number == query) {
            return Some(job);
        }
        if query.len() < 4 {
            return None;
        }
        let mut hits = self.jobs.iter().filter(|j| j.id.to_string().starts_with(query));
        match (hits.next(), hits.next()) {
            (Some(job), None) => Some(job),
            _ => None,
        }
    }

    // ========================================================================
    // Forms
    // ========================================================================

    /// Append a form to a job. The form's `job_id` is set to match.
    pub fn add_form(&mut self, job_id: Uuid, mut form: FlangeForm) -> FlangeResult<Uuid> {
        form.validate()?;
        let job = self
            .job_mut(job_id)
            .ok_or_else(|| FlangeError::not_found("Job", job_id))?;
        if job.forms.iter().any(|f| f.id == form.id) {
            return Err(FlangeError::invalid_input("id", form.id.to_string(), "Form id already exists"));
        }
        form.job_id = job_id;
        let id = form.id;
        job.forms.push(form);
        self.touch();
        Ok(id)
    }

    /// Replace the form with the same id.
    pub fn replace_form(&mut self, job_id: Uuid, mut form: FlangeForm) -> FlangeResult<()> {
        form.validate()?;
        let job = self
            .job_mut(job_id)
            .ok_or_else(|| FlangeError::not_found("Job", job_id))?;
        let slot = job
            .forms
            .iter_mut()
            .find(|f| f.id == form.id)
            .ok_or_else(|| FlangeError::not_found("Flange form", form.id))?;
        form.job_id = job_id;
        *slot = form;
        self.touch();
        Ok(())
    }

    pub fn remove_form(&mut self, job_id: Uuid, form_id: Uuid) -> FlangeResult<FlangeForm> {
        let job = self
            .job_mut(job_id)
            .ok_or_else(|| FlangeError::not_found("Job", job_id))?;
        let index = job
            .forms
            .iter()
            .position(|f| f.id == form_id)
            .ok_or_else(|| FlangeError::not_found("Flange form", form_id))?;
        let form = job.forms.remove(index);
        self.touch();
        Ok(form)
    }

    pub fn form(&self, job_id: Uuid, form_id: Uuid) -> Option<&FlangeForm> {
        self.job(job_id)?.form(form_id)
    }

    /// Total forms across all jobs
    pub fn form_count(&self) -> usize {
        self.jobs.iter().map(|j| j.forms.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn book_with_job() -> (JobBook, Uuid) {
        let mut book = JobBook::new();
        let id = book.add_job(Job::new("24-118", "Unit 3", date(2026, 3, 4))).unwrap();
        (book, id)
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(date(2026, 3, 4)), "Mar 4, 2026");
        assert_eq!(format_date(date(2025, 12, 25)), "Dec 25, 2025");
    }

    #[test]
    fn test_new_book() {
        let book = JobBook::new();
        assert_eq!(book.meta.version, SCHEMA_VERSION);
        assert_eq!(book.job_count(), 0);
    }

    #[test]
    fn test_job_requires_number() {
        let mut book = JobBook::new();
        let err = book.add_job(Job::new("  ", "Somewhere", date(2026, 1, 1))).unwrap_err();
        assert_eq!(err, FlangeError::missing_field("number"));
    }

    #[test]
    fn test_update_keeps_forms() {
        let (mut book, id) = book_with_job();
        book.add_form(id, FlangeForm::new(id)).unwrap();

        let mut edited = book.job(id).unwrap().clone();
        edited.location = "Unit 4".to_string();
        edited.forms.clear();
        book.update_job(edited).unwrap();

        let job = book.job(id).unwrap();
        assert_eq!(job.location, "Unit 4");
        assert_eq!(job.forms.len(), 1);
    }

    #[test]
    fn test_mutations_touch_modified() {
        let (mut book, id) = book_with_job();
        let before = book.meta.modified;
        std::thread::sleep(std::time::Duration::from_millis(5));
        book.remove_job(id).unwrap();
        assert!(book.meta.modified > before);
    }

    #[test]
    fn test_form_lifecycle() {
        let (mut book, job_id) = book_with_job();
        let form = FlangeForm::new(Uuid::new_v4());
        let form_id = book.add_form(job_id, form).unwrap();
        assert_eq!(book.form(job_id, form_id).unwrap().job_id, job_id);
        assert_eq!(book.form_count(), 1);

        let mut edited = book.form(job_id, form_id).unwrap().clone();
        edited.description = "12\" 300# RF at P-101 discharge".to_string();
        book.replace_form(job_id, edited).unwrap();
        assert!(book.form(job_id, form_id).unwrap().description.contains("P-101"));

        book.remove_form(job_id, form_id).unwrap();
        assert!(book.form(job_id, form_id).is_none());
        assert_eq!(
            book.remove_form(job_id, form_id).unwrap_err().error_code(),
            "RECORD_NOT_FOUND"
        );
    }

    #[test]
    fn test_unknown_job() {
        let mut book = JobBook::new();
        let missing = Uuid::new_v4();
        assert!(book.add_form(missing, FlangeForm::new(missing)).is_err());
        assert!(book.remove_job(missing).is_err());
        assert!(book.update_job(Job::new("1", "", date(2026, 1, 1))).is_err());
    }

    #[test]
    fn test_job_numbers_are_unique() {
        let (mut book, id) = book_with_job();
        let err = book.add_job(Job::new(" 24-118", "Elsewhere", date(2026, 1, 1))).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");

        let other = book.add_job(Job::new("24-119", "", date(2026, 1, 1))).unwrap();
        let mut renamed = book.job(other).unwrap().clone();
        renamed.number = "24-118".to_string();
        assert!(book.update_job(renamed).is_err());
        assert_eq!(book.job(other).map(|j| j.number.as_str()), Some("24-119"));

        // Keeping its own number is fine
        let mut same = book.job(id).unwrap().clone();
        same.location = "Unit 4".to_string();
        book.update_job(same).unwrap();
        assert_eq!(book.job_count(), 2);
    }

    #[test]
    fn test_find_job() {
        let (book, id) = book_with_job();
        assert_eq!(book.find_job("24-118").map(|j| j.id), Some(id));
        assert_eq!(book.find_job(&id.to_string()).map(|j| j.id), Some(id));
        assert_eq!(book.find_job(&id.to_string()[..8]).map(|j| j.id), Some(id));
        assert!(book.find_job("abc").is_none());
        assert!(book.find_job("").is_none());
    }

    #[test]
    fn test_jobs_keep_insertion_order() {
        let mut book = JobBook::new();
        for n in ["A-1", "A-2", "A-3"] {
            book.add_job(Job::new(n, "", date(2026, 1, 1))).unwrap();
        }
        let numbers: Vec<&str> = book.jobs.iter().map(|j| j.number.as_str()).collect();
        assert_eq!(numbers, vec!["A-1", "A-2", "A-3"]);
    }
}
