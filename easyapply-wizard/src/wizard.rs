//! The quick-apply wizard driver.
//!
//! One [`ApplicationWizard::run`] drives one open application modal to a
//! terminal [`WizardState`]. Each step is filled, its free-text questions are
//! answered, and then exactly one progression decision is made. Nothing in
//! here returns an error: a wizard that cannot make progress ends `Stuck` or
//! `Abandoned`.

use crate::answerer::{AnswerSource, QuestionAnswerer};
use crate::filler::FieldFiller;
use crate::profile::ApplicantProfile;
use easyapply_drivers::{BrowserSession, Locator, Pacing};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

const SUBMIT: &str = "button[aria-label='Submit application']";
const DONE: &str = "button[aria-label='Done']";
const DISCARD: &str = "button[aria-label='Discard']";
const CONFIRM_DISCARD: &str = "button[aria-label='Discard application']";
const ERROR_INDICATOR: &str = ".artdeco-inline-feedback--error";
const PRIMARY_BUTTON: &str = "button.artdeco-button--primary";
const PROGRESSION_LABELS: &[&str] = &["Continue to next step", "Review your application", "Next"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardState {
    InProgress,
    Submitted,
    Stuck,
    Abandoned,
}

impl WizardState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, WizardState::InProgress)
    }
}

/// Knobs for one wizard run.
#[derive(Debug, Clone)]
pub struct WizardOptions {
    pub max_steps: u32,
    /// How long to wait for the discard confirmation dialog.
    pub confirm_timeout: Duration,
    pub generation_timeout: Duration,
    pub pacing: Pacing,
}

impl Default for WizardOptions {
    fn default() -> Self {
        Self {
            max_steps: 10,
            confirm_timeout: Duration::from_secs(3),
            generation_timeout: Duration::from_secs(30),
            pacing: Pacing::default(),
        }
    }
}

impl WizardOptions {
    /// Zero delays and short waits, for tests.
    pub fn instant() -> Self {
        Self {
            confirm_timeout: Duration::from_millis(50),
            generation_timeout: Duration::from_secs(1),
            pacing: Pacing::instant(),
            ..Self::default()
        }
    }
}

/// Title and company of the posting being applied to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    pub title: String,
    pub company: String,
}

impl JobPosting {
    pub fn new(title: impl Into<String>, company: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            company: company.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplicationOutcome {
    pub state: WizardState,
    /// Step number the wizard was on when it stopped.
    pub steps_used: u32,
    /// Loop iterations, repairs included.
    pub iterations: u32,
}

impl ApplicationOutcome {
    pub fn submitted(&self) -> bool {
        self.state == WizardState::Submitted
    }
}

/// What the progression phase of one iteration decided.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Progress {
    Submitted,
    Advanced(String),
    None,
}

pub struct ApplicationWizard<'a, S: BrowserSession, A: AnswerSource + ?Sized> {
    session: &'a S,
    profile: &'a ApplicantProfile,
    source: &'a A,
    options: &'a WizardOptions,
}

impl<'a, S: BrowserSession, A: AnswerSource + ?Sized> ApplicationWizard<'a, S, A> {
    pub fn new(
        session: &'a S,
        profile: &'a ApplicantProfile,
        source: &'a A,
        options: &'a WizardOptions,
    ) -> Self {
        Self {
            session,
            profile,
            source,
            options,
        }
    }

    /// Drive the open application to a terminal state.
    pub async fn run(&self, job: &JobPosting) -> ApplicationOutcome {
        let max_steps = self.options.max_steps.max(1);
        let pacing = &self.options.pacing;
        let filler = FieldFiller::new(self.session, self.profile, pacing);
        let answerer = QuestionAnswerer::new(
            self.session,
            self.source,
            self.profile,
            pacing,
            self.options.generation_timeout,
        );

        let mut step = 1;
        let mut iterations = 0;
        let mut repaired = false;
        let mut state = WizardState::InProgress;

        while step <= max_steps && !state.is_terminal() {
            iterations += 1;
            debug!(target: "wizard.step", step, iterations, repaired, "processing step");

            let report = filler.fill_step().await;
            let answered = answerer.answer_step(&job.title, &job.company).await;
            debug!(target: "wizard.step", step, applied = report.applied, answered, "step populated");

            match self.progress().await {
                Progress::Submitted => {
                    state = WizardState::Submitted;
                    continue;
                }
                Progress::Advanced(label) => {
                    info!(target: "wizard.step", step, %label, "advanced");
                    step += 1;
                    repaired = false;
                    continue;
                }
                Progress::None => {}
            }

            if !repaired && self.has_error_indicator().await {
                warn!(target: "wizard.step", step, "form reports errors; refilling once");
                repaired = true;
                continue;
            }

            if step == max_steps {
                state = WizardState::Stuck;
            } else if self.discard().await {
                state = WizardState::Abandoned;
            } else {
                debug!(target: "wizard.step", step, "no progression control; step spent");
                step += 1;
                repaired = false;
            }
        }

        if !state.is_terminal() {
            state = WizardState::Stuck;
        }
        let steps_used = step.min(max_steps);
        match state {
            WizardState::Submitted => {
                info!(target: "wizard.step", title = %job.title, company = %job.company, steps_used, "application submitted")
            }
            _ => {
                warn!(target: "wizard.step", title = %job.title, company = %job.company, ?state, steps_used, iterations, "application not submitted")
            }
        }
        ApplicationOutcome {
            state,
            steps_used,
            iterations,
        }
    }

    async fn progress(&self) -> Progress {
        if self.submit().await {
            return Progress::Submitted;
        }
        match self.progression_control().await {
            Some((button, label)) => match self.session.js_click(&button).await {
                Ok(()) => {
                    self.options.pacing.long_settle().await;
                    Progress::Advanced(label)
                }
                Err(e) => {
                    warn!(target: "wizard.step", %label, error = %e, "progression click failed");
                    Progress::None
                }
            },
            None => Progress::None,
        }
    }

    async fn submit(&self) -> bool {
        let s = self.session;
        let Ok(Some(button)) = s.try_find(Locator::Css(SUBMIT)).await else {
            return false;
        };
        if let Err(e) = s.js_click(&button).await {
            warn!(target: "wizard.step", error = %e, "submit click failed");
            return false;
        }
        self.options.pacing.long_settle().await;

        if let Ok(Some(done)) = s.try_find(Locator::Css(DONE)).await {
            if let Err(e) = s.click(&done).await {
                debug!(target: "wizard.step", error = %e, "done button not clickable");
            }
        }
        true
    }

    /// First displayed, enabled progression control in priority order.
    async fn progression_control(&self) -> Option<(S::Element, String)> {
        for label in PROGRESSION_LABELS {
            let css = format!("button[aria-label='{label}']");
            if let Some(button) = self.first_interactable(&css).await {
                return Some((button, label.to_string()));
            }
        }

        let buttons = self.session.find_all(Locator::Css("button")).await.unwrap_or_default();
        for button in buttons {
            let text = self.session.text(&button).await.unwrap_or_default().to_lowercase();
            if (text.contains("next") || text.contains("continue"))
                && self.session.is_interactable(&button).await
            {
                return Some((button, text.trim().to_string()));
            }
        }

        self.first_interactable(PRIMARY_BUTTON)
            .await
            .map(|button| (button, "primary".to_string()))
    }

    async fn first_interactable(&self, css: &str) -> Option<S::Element> {
        let found = self.session.find_all(Locator::Css(css)).await.ok()?;
        for el in found {
            if self.session.is_interactable(&el).await {
                return Some(el);
            }
        }
        None
    }

    async fn has_error_indicator(&self) -> bool {
        matches!(self.session.try_find(Locator::Css(ERROR_INDICATOR)).await, Ok(Some(_)))
    }

    async fn discard(&self) -> bool {
        let s = self.session;
        let Ok(Some(button)) = s.try_find(Locator::Css(DISCARD)).await else {
            return false;
        };
        if let Err(e) = s.js_click(&button).await {
            warn!(target: "wizard.step", error = %e, "discard click failed");
            return false;
        }
        info!(target: "wizard.step", "application appears stuck; discarded");
        match s
            .wait_for_clickable(Locator::Css(CONFIRM_DISCARD), self.options.confirm_timeout)
            .await
        {
            Ok(confirm) => {
                if let Err(e) = s.click(&confirm).await {
                    debug!(target: "wizard.step", error = %e, "discard confirmation not clickable");
                }
            }
            Err(e) => debug!(target: "wizard.step", error = %e, "no discard confirmation"),
        }
        true
    }
}
