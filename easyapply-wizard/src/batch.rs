//! Batch runner: apply to postings from a job board until a limit is hit.

use crate::answerer::AnswerSource;
use crate::profile::ApplicantProfile;
use crate::wizard::{ApplicationWizard, JobPosting, WizardOptions, WizardState};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use easyapply_common::Result;
use easyapply_drivers::browser::pacing::random_delay;
use easyapply_drivers::BrowserSession;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Source of postings and owner of the surrounding page.
#[async_trait]
pub trait JobBoard: Send {
    /// Select the next posting; `None` when the board is exhausted.
    async fn next_posting(&mut self) -> Result<Option<JobPosting>>;

    /// Open the quick-apply wizard for the selected posting. `false` when the
    /// posting has no quick-apply control.
    async fn open_application(&mut self, posting: &JobPosting) -> Result<bool>;

    /// Close any dialog left open by an unfinished application.
    async fn dismiss(&mut self) -> Result<()>;
}

/// One submitted application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedJob {
    pub company: String,
    pub title: String,
    pub applied_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Submitted applications, in order.
    pub applied: Vec<AppliedJob>,
    pub viewed: usize,
    pub skipped: usize,
    pub stuck: usize,
    pub abandoned: usize,
    /// Set when the board failed and the batch ended early.
    pub aborted: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub max_applications: usize,
    /// Pause after each submission, milliseconds `(min, max)`.
    pub pause_ms: (u64, u64),
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            max_applications: 10,
            pause_ms: (5_000, 10_000),
        }
    }
}

pub struct BatchRunner {
    settings: BatchSettings,
    wizard: WizardOptions,
}

impl BatchRunner {
    pub fn new(settings: BatchSettings, wizard: WizardOptions) -> Self {
        Self { settings, wizard }
    }

    pub async fn run<S, A, B>(
        &self,
        session: &S,
        board: &mut B,
        profile: &ApplicantProfile,
        source: &A,
    ) -> BatchReport
    where
        S: BrowserSession,
        A: AnswerSource + ?Sized,
        B: JobBoard + ?Sized,
    {
        let mut report = BatchReport::default();
        let wizard = ApplicationWizard::new(session, profile, source, &self.wizard);
        let max = self.settings.max_applications;

        while report.applied.len() < max {
            let posting = match board.next_posting().await {
                Ok(Some(posting)) => posting,
                Ok(None) => {
                    info!(target: "batch", "no more postings");
                    break;
                }
                Err(e) => {
                    error!(target: "batch", error = %e, "job board failed; ending batch");
                    report.aborted = Some(e.to_string());
                    break;
                }
            };
            report.viewed += 1;
            info!(target: "batch", title = %posting.title, company = %posting.company, "viewing posting");

            match board.open_application(&posting).await {
                Ok(true) => {}
                Ok(false) => {
                    info!(target: "batch", title = %posting.title, "no quick-apply control; skipping");
                    report.skipped += 1;
                    continue;
                }
                Err(e) => {
                    warn!(target: "batch", title = %posting.title, error = %e, "could not open application; skipping");
                    report.skipped += 1;
                    continue;
                }
            }

            let outcome = wizard.run(&posting).await;
            match outcome.state {
                WizardState::Submitted => {
                    report.applied.push(AppliedJob {
                        company: posting.company.clone(),
                        title: posting.title.clone(),
                        applied_at: Utc::now(),
                    });
                    info!(
                        target: "batch",
                        title = %posting.title,
                        company = %posting.company,
                        count = report.applied.len(),
                        max,
                        "application completed"
                    );
                    if report.applied.len() < max {
                        let (lo, hi) = self.settings.pause_ms;
                        random_delay(lo, hi).await;
                    }
                }
                state => {
                    if state == WizardState::Abandoned {
                        report.abandoned += 1;
                    } else {
                        report.stuck += 1;
                    }
                    if let Err(e) = board.dismiss().await {
                        warn!(target: "batch", error = %e, "could not dismiss dialogs");
                    }
                }
            }
        }

        info!(
            target: "batch",
            applied = report.applied.len(),
            viewed = report.viewed,
            skipped = report.skipped,
            stuck = report.stuck,
            abandoned = report.abandoned,
            "batch finished"
        );
        report
    }
}

/// JSON file of submitted applications.
#[derive(Debug, Clone)]
pub struct AppliedLog {
    path: PathBuf,
}

impl AppliedLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, applied: &[AppliedJob]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(applied)?)?;
        info!(target: "batch", path = %self.path.display(), count = applied.len(), "applied jobs saved");
        Ok(())
    }

    pub fn load(&self) -> Result<Vec<AppliedJob>> {
        let raw = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}
