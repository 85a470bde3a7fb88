//! Field filling for one wizard step.
//!
//! Each control is handled in isolation: failures are logged and reported as
//! [`FillOutcome::Failed`], never propagated.

use crate::classifier::{
    classify, normalize_space, own_label, radio_group_prompt, text_of, FieldKind, FormControl,
};
use crate::profile::ApplicantProfile;
use crate::rules::{
    choose_radio, choose_select_option, is_placeholder, route_text_field, text_value, RadioChoice,
};
use easyapply_common::Result;
use easyapply_drivers::{BrowserSession, Locator, Pacing};
use tracing::{debug, info, warn};

const FORM_CONTROLS: &str = "select, input:not([type='hidden']), textarea";
const UPLOAD_KEYWORDS: &[&str] = &["upload", "proceed", "continue", "next", "confirm"];
const SAVE_KEYWORDS: &[&str] = &["submit", "save"];

/// What happened to one control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillOutcome {
    Applied,
    Skipped(String),
    Failed(String),
}

impl FillOutcome {
    pub fn applied(&self) -> bool {
        matches!(self, FillOutcome::Applied)
    }

    fn skipped(reason: &str) -> Self {
        FillOutcome::Skipped(reason.to_string())
    }
}

/// Tally of one [`FieldFiller::fill_step`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillReport {
    pub applied: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl FillReport {
    fn record(&mut self, outcome: &FillOutcome) {
        match outcome {
            FillOutcome::Applied => self.applied += 1,
            FillOutcome::Skipped(_) => self.skipped += 1,
            FillOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Radios sharing a `name`, in document order.
#[derive(Debug, Clone)]
pub struct RadioGroup<E> {
    pub name: String,
    pub identifier: String,
    pub members: Vec<(E, RadioChoice)>,
}

pub struct FieldFiller<'a, S: BrowserSession> {
    session: &'a S,
    profile: &'a ApplicantProfile,
    pacing: &'a Pacing,
}

impl<'a, S: BrowserSession> FieldFiller<'a, S> {
    pub fn new(session: &'a S, profile: &'a ApplicantProfile, pacing: &'a Pacing) -> Self {
        Self {
            session,
            profile,
            pacing,
        }
    }

    /// Fill every eligible control on the current step.
    pub async fn fill_step(&self) -> FillReport {
        let mut report = FillReport::default();
        let elements = match self.session.find_all(Locator::Css(FORM_CONTROLS)).await {
            Ok(elements) => elements,
            Err(e) => {
                warn!(target: "wizard.fill", error = %e, "could not enumerate form controls");
                return report;
            }
        };

        let mut radios: Vec<FormControl<S::Element>> = Vec::new();
        for element in elements {
            let control = match classify(self.session, &element).await {
                Ok(control) => control,
                Err(e) => {
                    warn!(target: "wizard.fill", error = %e, "could not classify control");
                    report.failed += 1;
                    continue;
                }
            };
            match control.kind {
                FieldKind::Radio => radios.push(control),
                FieldKind::Unknown => {}
                _ => report.record(&self.fill(&control).await),
            }
        }

        for group in self.group_radios(radios).await {
            report.record(&self.fill_radio_group(&group).await);
        }

        debug!(
            target: "wizard.fill",
            applied = report.applied,
            skipped = report.skipped,
            failed = report.failed,
            "step filled"
        );
        report
    }

    /// Fill a single non-radio control.
    pub async fn fill(&self, control: &FormControl<S::Element>) -> FillOutcome {
        match self.try_fill(control).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    target: "wizard.fill",
                    identifier = %control.identifier,
                    error = %e,
                    "field fill failed"
                );
                FillOutcome::Failed(e.to_string())
            }
        }
    }

    async fn try_fill(&self, control: &FormControl<S::Element>) -> Result<FillOutcome> {
        let el = &control.element;
        if !self.session.is_enabled(el).await? {
            return Ok(FillOutcome::skipped("disabled"));
        }
        // File inputs are routinely rendered invisible behind a styled button.
        if control.kind != FieldKind::File && !self.session.is_displayed(el).await? {
            return Ok(FillOutcome::skipped("not displayed"));
        }

        match control.kind {
            FieldKind::Select => self.fill_select(control).await,
            FieldKind::Checkbox => self.fill_checkbox(control).await,
            FieldKind::File => self.fill_file(control).await,
            FieldKind::Text | FieldKind::TextArea => self.fill_text(control).await,
            FieldKind::Radio | FieldKind::Unknown => Ok(FillOutcome::skipped("not handled here")),
        }
    }

    async fn option_labels(&self, select: &S::Element) -> Result<Vec<(S::Element, String)>> {
        let options = self
            .session
            .find_all_from(select, Locator::Css("option"))
            .await?;
        let mut labels = Vec::with_capacity(options.len());
        for option in options {
            let label = normalize_space(&self.session.text(&option).await?);
            labels.push((option, label));
        }
        Ok(labels)
    }

    async fn fill_select(&self, control: &FormControl<S::Element>) -> Result<FillOutcome> {
        let options = self.option_labels(&control.element).await?;
        if options.is_empty() {
            return Ok(FillOutcome::skipped("no options"));
        }

        let mut selected = None;
        for (i, (option, _)) in options.iter().enumerate() {
            if self.session.is_selected(option).await? {
                selected = Some(i);
                break;
            }
        }
        if let Some(i) = selected {
            if i > 0 && !is_placeholder(&options[i].1) {
                return Ok(FillOutcome::skipped("already valued"));
            }
        }

        let labels: Vec<String> = options.iter().map(|(_, label)| label.clone()).collect();
        let Some(choice) = choose_select_option(&control.identifier, &labels, self.profile) else {
            return Ok(FillOutcome::skipped("no suitable option"));
        };
        let Some((option, _)) = options.iter().find(|(_, label)| *label == choice) else {
            return Ok(FillOutcome::skipped("no suitable option"));
        };

        info!(target: "wizard.fill", identifier = %control.identifier, option = %choice, "selecting option");
        self.session.select_option(&control.element, option).await?;
        self.pacing.settle().await;
        Ok(FillOutcome::Applied)
    }

    async fn fill_checkbox(&self, control: &FormControl<S::Element>) -> Result<FillOutcome> {
        if self.session.is_selected(&control.element).await? {
            return Ok(FillOutcome::skipped("already checked"));
        }
        let id = &control.identifier;
        if !(id.contains("agree") || id.contains("consent")) {
            return Ok(FillOutcome::skipped("not a consent box"));
        }
        self.session.js_click(&control.element).await?;
        self.pacing.settle().await;
        Ok(FillOutcome::Applied)
    }

    async fn fill_text(&self, control: &FormControl<S::Element>) -> Result<FillOutcome> {
        if !self.session.value(&control.element).await?.trim().is_empty() {
            return Ok(FillOutcome::skipped("already valued"));
        }
        let Some(field) = route_text_field(&control.identifier) else {
            return Ok(FillOutcome::skipped("no matching profile field"));
        };
        let Some(value) = text_value(field, self.profile) else {
            return Ok(FillOutcome::skipped("profile value empty"));
        };

        debug!(target: "wizard.fill", identifier = %control.identifier, ?field, "typing profile value");
        self.session.send_keys(&control.element, &value).await?;
        self.pacing.settle().await;
        Ok(FillOutcome::Applied)
    }

    async fn fill_file(&self, control: &FormControl<S::Element>) -> Result<FillOutcome> {
        let id = &control.identifier;
        if !(id.contains("resume") || id.contains("cv")) {
            return Ok(FillOutcome::skipped("not a resume upload"));
        }
        if !self.session.value(&control.element).await?.is_empty() {
            return Ok(FillOutcome::skipped("already valued"));
        }
        let Some(path) = self.profile.resume_absolute_path() else {
            return Ok(FillOutcome::skipped("no resume path in profile"));
        };

        info!(target: "wizard.fill", path = %path.display(), "uploading resume");
        self.session
            .send_keys(&control.element, &path.to_string_lossy())
            .await?;
        self.pacing.long_settle().await;
        self.confirm_upload(&control.element).await;
        Ok(FillOutcome::Applied)
    }

    /// Click at most one post-upload confirmation control.
    async fn confirm_upload(&self, input: &S::Element) {
        let buttons = self
            .session
            .find_all(Locator::Css("button"))
            .await
            .unwrap_or_default();

        let mut keyword_buttons = Vec::new();
        let mut save_buttons = Vec::new();
        for button in buttons {
            let text = text_of(self.session, &button).await.to_lowercase();
            if UPLOAD_KEYWORDS.iter().any(|k| text.contains(k)) {
                keyword_buttons.push(button);
            } else if SAVE_KEYWORDS.iter().any(|k| text.contains(k)) {
                save_buttons.push(button);
            }
        }

        if self.click_first_interactable(&keyword_buttons).await {
            return;
        }

        let mut nearby = Vec::new();
        let mut scope = input.clone();
        for _ in 0..2 {
            let Ok(parent) = self.session.parent(&scope).await else {
                break;
            };
            nearby.extend(
                self.session
                    .find_all_from(&parent, Locator::Css("button"))
                    .await
                    .unwrap_or_default(),
            );
            scope = parent;
        }
        if self.click_first_interactable(&nearby).await {
            return;
        }

        self.click_first_interactable(&save_buttons).await;
    }

    async fn click_first_interactable(&self, buttons: &[S::Element]) -> bool {
        for button in buttons {
            if self.session.is_interactable(button).await {
                if let Err(e) = self.session.js_click(button).await {
                    warn!(target: "wizard.fill", error = %e, "post-upload click failed");
                    continue;
                }
                self.pacing.long_settle().await;
                return true;
            }
        }
        false
    }

    async fn group_radios(&self, radios: Vec<FormControl<S::Element>>) -> Vec<RadioGroup<S::Element>> {
        let mut groups: Vec<RadioGroup<S::Element>> = Vec::new();
        for radio in radios {
            let label = own_label(self.session, &radio.element, &radio.id).await;
            let value = self.session.attr_or_empty(&radio.element, "value").await;
            let choice = RadioChoice::new(label, value);

            let key = if radio.name.is_empty() {
                radio.id.clone()
            } else {
                radio.name.clone()
            };
            match groups.iter_mut().find(|g| g.name == key) {
                Some(group) => group.members.push((radio.element, choice)),
                None => {
                    let prompt = radio_group_prompt(self.session, &radio.element).await;
                    let aria = self.session.attr_or_empty(&radio.element, "aria-label").await;
                    groups.push(RadioGroup {
                        identifier: format!("{key} {aria} {prompt}").to_lowercase(),
                        name: key,
                        members: vec![(radio.element, choice)],
                    });
                }
            }
        }
        groups
    }

    /// Select one radio of `group` unless a member is already selected.
    pub async fn fill_radio_group(&self, group: &RadioGroup<S::Element>) -> FillOutcome {
        match self.try_fill_radio_group(group).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    target: "wizard.fill",
                    identifier = %group.identifier,
                    error = %e,
                    "radio group fill failed"
                );
                FillOutcome::Failed(e.to_string())
            }
        }
    }

    async fn try_fill_radio_group(&self, group: &RadioGroup<S::Element>) -> Result<FillOutcome> {
        let mut live = Vec::new();
        for (element, choice) in &group.members {
            if self.session.is_selected(element).await? {
                return Ok(FillOutcome::skipped("already answered"));
            }
            if self.session.is_enabled(element).await? {
                live.push((element, choice.clone()));
            }
        }
        if live.is_empty() {
            return Ok(FillOutcome::skipped("disabled"));
        }

        let choices: Vec<RadioChoice> = live.iter().map(|(_, c)| c.clone()).collect();
        let Some(index) = choose_radio(&group.identifier, &choices, self.profile) else {
            return Ok(FillOutcome::skipped("no matching option"));
        };
        let (element, choice) = &live[index];

        info!(
            target: "wizard.fill",
            identifier = %group.identifier,
            option = %choice.label,
            value = %choice.value,
            "selecting radio"
        );
        // Best effort; the click below is what counts.
        let _ = self.session.scroll_into_view(element).await;
        self.session.js_click(element).await?;
        self.pacing.settle().await;
        Ok(FillOutcome::Applied)
    }
}
