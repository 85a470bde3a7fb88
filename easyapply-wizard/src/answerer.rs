//! Free-text question answering.
//!
//! Locates the prompt for each empty text control, asks an [`AnswerSource`]
//! for an answer (falling back to canned answers built from the profile),
//! and writes it back through an entry ladder with verification.

use crate::classifier::{
    first_text, label_for, nearest_question, normalize_space, preceding_question_in,
};
use crate::profile::{yes_no, ApplicantProfile};
use crate::rules::is_contact_field;
use async_trait::async_trait;
use easyapply_common::{EasyApplyError, Result};
use easyapply_drivers::{BrowserSession, Locator, Pacing};
use easyapply_llm::traits::LlmClient;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const TEXT_INPUTS: &str = "input[type='text'], input:not([type])";
const PRECEDING_BLOCKS_XPATH: &str =
    "preceding::*[self::p or self::h1 or self::h2 or self::h3 or self::label or self::div][position() <= 3]";
const QUESTION_DIVS: &str =
    "div[class*='question'], div[class*='label'], div[class*='field-label']";
const TEXT_BLOCKS: &str = "p, span, h1, h2, h3, h4";
const CHUNK_CHARS: usize = 50;
const TEXT_INPUT_MAX_CHARS: usize = 100;

/// Produces an answer to one application question.
#[async_trait]
pub trait AnswerSource: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        profile: &ApplicantProfile,
        job_title: &str,
        company: &str,
    ) -> Result<String>;
}

/// [`AnswerSource`] backed by a language model.
pub struct LlmAnswerSource {
    client: Arc<dyn LlmClient + Send + Sync>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

impl LlmAnswerSource {
    pub fn new(client: Arc<dyn LlmClient + Send + Sync>) -> Self {
        Self {
            client,
            max_tokens: Some(300),
            temperature: Some(0.7),
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl AnswerSource for LlmAnswerSource {
    async fn generate(
        &self,
        prompt: &str,
        profile: &ApplicantProfile,
        job_title: &str,
        company: &str,
    ) -> Result<String> {
        let context = profile.render_context(job_title, company);
        self.client
            .answer_question(prompt, &context, self.max_tokens, self.temperature)
            .await
    }
}

/// Source used when no model is configured; every prompt gets the fallback.
pub struct NoAnswerSource;

#[async_trait]
impl AnswerSource for NoAnswerSource {
    async fn generate(
        &self,
        _prompt: &str,
        _profile: &ApplicantProfile,
        _job_title: &str,
        _company: &str,
    ) -> Result<String> {
        Err(EasyApplyError::Agent("no language model configured".to_string()))
    }
}

/// Prompt families with a canned fallback answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionCategory {
    SelfIntroduction,
    Motivation,
    Salary,
    Availability,
    Strengths,
    Weaknesses,
    ChallengeStory,
    RemotePreference,
    Relocation,
    Visa,
}

const QUESTION_RULES: &[(QuestionCategory, &[&str])] = &[
    (
        QuestionCategory::SelfIntroduction,
        &["about yourself", "introduce yourself", "describe yourself", "tell us about you"],
    ),
    (
        QuestionCategory::Motivation,
        &[
            "why do you want",
            "why are you interested",
            "why would you like",
            "interested in this",
            "why this",
            "why join",
            "why us",
            "motivat",
        ],
    ),
    (
        QuestionCategory::Salary,
        &["salary", "compensation", "pay expectation", "expected pay"],
    ),
    (
        QuestionCategory::Availability,
        &["start date", "when can you start", "available to start", "availability", "notice period"],
    ),
    (QuestionCategory::Strengths, &["strength"]),
    (QuestionCategory::Weaknesses, &["weakness"]),
    (
        QuestionCategory::ChallengeStory,
        &["challenge", "difficult", "obstacle", "overcame", "conflict"],
    ),
    (
        QuestionCategory::RemotePreference,
        &["remote", "work setting", "hybrid", "on-site", "onsite"],
    ),
    (QuestionCategory::Relocation, &["relocat"]),
    (QuestionCategory::Visa, &["visa", "sponsor"]),
];

pub fn categorize_question(prompt: &str) -> Option<QuestionCategory> {
    let lower = prompt.to_lowercase();
    QUESTION_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(category, _)| *category)
}

fn lower_first(text: &str) -> String {
    let mut chars = text.chars();
    match (chars.next(), chars.clone().next()) {
        (Some(first), Some(second)) if first.is_uppercase() && !second.is_uppercase() => {
            first.to_lowercase().chain(chars).collect()
        }
        _ => text.to_string(),
    }
}

fn list(items: &[&str]) -> String {
    match items {
        [] => "my field".to_string(),
        [one] => one.to_string(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

/// Canned answer for `prompt`; never empty.
pub fn fallback_answer(
    prompt: &str,
    profile: &ApplicantProfile,
    job_title: &str,
    company: &str,
) -> String {
    let years = profile.years_of_experience();
    let skills = list(&profile.top_skills(3));
    let q = &profile.questions;
    let (role, employer) = profile
        .latest_role()
        .map(|r| (r.title.as_str(), r.company.as_str()))
        .filter(|(t, c)| !t.is_empty() && !c.is_empty())
        .unwrap_or(("professional", "my previous company"));

    match categorize_question(prompt) {
        Some(QuestionCategory::SelfIntroduction) => format!(
            "I am a {role} with {years} years of experience, most recently at {employer}. My core skills include {skills}."
        ),
        Some(QuestionCategory::Motivation) => format!(
            "I am excited about the {job_title} role at {company} because it builds directly on my {years} years of experience with {skills}. I would welcome the chance to contribute to the team at {company}."
        ),
        Some(QuestionCategory::Salary) if !q.salary_expectation.trim().is_empty() => format!(
            "My salary expectation is {}, and I am open to discussing the full compensation package.",
            q.salary_expectation.trim()
        ),
        Some(QuestionCategory::Salary) => {
            "I am open to a competitive salary in line with the market for this role.".to_string()
        }
        Some(QuestionCategory::Availability) => {
            let start = q.preferred_start_date.trim().trim_end_matches('.');
            if start.is_empty() {
                "I can start after a standard notice period.".to_string()
            } else {
                format!("I am available to start {}.", lower_first(start))
            }
        }
        Some(QuestionCategory::Strengths) => format!(
            "My key strengths are {skills}, backed by {years} years of hands-on experience delivering results."
        ),
        Some(QuestionCategory::Weaknesses) => "I sometimes spend too long polishing details, so I now set clear checkpoints to balance quality with delivery speed.".to_string(),
        Some(QuestionCategory::ChallengeStory) => format!(
            "As a {role} at {employer}, I took on a project with a tight deadline and shifting requirements. By breaking the work into small milestones and communicating early, we delivered on time."
        ),
        Some(QuestionCategory::RemotePreference) => {
            let setting = q.preferred_work_setting.trim();
            if setting.is_empty() {
                "I am comfortable working remotely, on-site, or in a hybrid arrangement.".to_string()
            } else {
                format!(
                    "My preferred work setting is {}, though I adapt well to the team's needs.",
                    lower_first(setting)
                )
            }
        }
        Some(QuestionCategory::Relocation) => match yes_no(&q.willing_to_relocate) {
            Some(false) => "I am not looking to relocate at this time.".to_string(),
            _ => "Yes, I am willing to relocate for this role.".to_string(),
        },
        Some(QuestionCategory::Visa) => match yes_no(&q.visa_sponsorship_required) {
            Some(true) => "Yes, I will require visa sponsorship.".to_string(),
            _ => "No, I do not require visa sponsorship.".to_string(),
        },
        None => format!(
            "With {years} years of experience and skills in {skills}, I am confident I can contribute to the {job_title} role at {company}."
        ),
    }
}

/// Where an answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOrigin {
    Generated,
    Fallback,
}

/// Ask `source`, bounded by `timeout`; any failure or a blank answer falls
/// back to [`fallback_answer`].
pub async fn resolve_answer<A: AnswerSource + ?Sized>(
    source: &A,
    timeout: Duration,
    prompt: &str,
    profile: &ApplicantProfile,
    job_title: &str,
    company: &str,
) -> (String, AnswerOrigin) {
    let generated = tokio::time::timeout(timeout, source.generate(prompt, profile, job_title, company)).await;
    match generated {
        Ok(Ok(answer)) if !answer.trim().is_empty() => (answer.trim().to_string(), AnswerOrigin::Generated),
        Ok(Ok(_)) => {
            debug!(target: "wizard.answer", %prompt, "blank answer; using fallback");
            (fallback_answer(prompt, profile, job_title, company), AnswerOrigin::Fallback)
        }
        Ok(Err(e)) => {
            warn!(target: "wizard.answer", %prompt, error = %e, "answer source failed; using fallback");
            (fallback_answer(prompt, profile, job_title, company), AnswerOrigin::Fallback)
        }
        Err(_) => {
            warn!(target: "wizard.answer", %prompt, ?timeout, "answer source timed out; using fallback");
            (fallback_answer(prompt, profile, job_title, company), AnswerOrigin::Fallback)
        }
    }
}

/// First sentence of `answer` when it is too long for a one-line input.
pub fn shorten_for_input(answer: &str) -> String {
    if answer.chars().count() <= TEXT_INPUT_MAX_CHARS {
        return answer.to_string();
    }
    let answer = answer.trim();
    let end = SENTENCE_BREAKS
        .iter()
        .filter_map(|brk| answer.find(brk))
        .min();
    match end {
        // Breaks start with one ASCII punctuation byte, kept in the output.
        Some(i) => answer[..=i].to_string(),
        None => answer.to_string(),
    }
}

const SENTENCE_BREAKS: &[&str] = &[". ", "? ", "! "];

/// One rung of the text-entry ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStrategy {
    DirectAssign,
    ChunkedKeys,
    CharByChar,
}

const LADDER: [EntryStrategy; 3] = [
    EntryStrategy::DirectAssign,
    EntryStrategy::ChunkedKeys,
    EntryStrategy::CharByChar,
];

fn verified(found: &str, expected: &str) -> bool {
    let found = found.trim();
    let expected = expected.trim();
    !found.is_empty()
        && (found == expected || (found.chars().count() > 10 && expected.starts_with(found)))
}

/// Write `text` into `element`, climbing the ladder until the value reads
/// back. Returns the rung that succeeded.
pub async fn write_text<S: BrowserSession>(
    session: &S,
    element: &S::Element,
    text: &str,
    pacing: &Pacing,
) -> Option<EntryStrategy> {
    for strategy in LADDER {
        // Clearing can fail on exotic widgets; the rung's own write decides.
        let _ = session.clear(element).await;
        if let Err(e) = enter(session, element, text, strategy, pacing).await {
            debug!(target: "wizard.answer", ?strategy, error = %e, "entry rung failed");
            continue;
        }
        pacing.settle().await;
        match session.value(element).await {
            Ok(value) if verified(&value, text) => return Some(strategy),
            Ok(_) => debug!(target: "wizard.answer", ?strategy, "value did not verify"),
            Err(e) => debug!(target: "wizard.answer", ?strategy, error = %e, "value unreadable"),
        }
    }
    None
}

async fn enter<S: BrowserSession>(
    session: &S,
    element: &S::Element,
    text: &str,
    strategy: EntryStrategy,
    pacing: &Pacing,
) -> Result<()> {
    match strategy {
        EntryStrategy::DirectAssign => session.set_value(element, text).await,
        EntryStrategy::ChunkedKeys => {
            let chars: Vec<char> = text.chars().collect();
            for chunk in chars.chunks(CHUNK_CHARS) {
                let chunk: String = chunk.iter().collect();
                session.send_keys(element, &chunk).await?;
                pacing.chunk_pause().await;
            }
            Ok(())
        }
        EntryStrategy::CharByChar => {
            let mut buf = [0u8; 4];
            for ch in text.chars() {
                session.send_keys(element, ch.encode_utf8(&mut buf)).await?;
                pacing.keystroke().await;
            }
            Ok(())
        }
    }
}

/// Answers free-text questions on the current step.
pub struct QuestionAnswerer<'a, S: BrowserSession, A: AnswerSource + ?Sized> {
    session: &'a S,
    source: &'a A,
    profile: &'a ApplicantProfile,
    pacing: &'a Pacing,
    timeout: Duration,
}

impl<'a, S: BrowserSession, A: AnswerSource + ?Sized> QuestionAnswerer<'a, S, A> {
    pub fn new(
        session: &'a S,
        source: &'a A,
        profile: &'a ApplicantProfile,
        pacing: &'a Pacing,
        timeout: Duration,
    ) -> Self {
        Self {
            session,
            source,
            profile,
            pacing,
            timeout,
        }
    }

    /// Answer every open question on the step; returns how many were written.
    pub async fn answer_step(&self, job_title: &str, company: &str) -> usize {
        let mut answered = 0;

        let textareas = self
            .session
            .find_all(Locator::Css("textarea"))
            .await
            .unwrap_or_default();
        for textarea in textareas {
            match self.answer_control(&textarea, true, job_title, company).await {
                Ok(true) => answered += 1,
                Ok(false) => {}
                Err(e) => warn!(target: "wizard.answer", error = %e, "textarea unanswered"),
            }
        }

        let inputs = self
            .session
            .find_all(Locator::Css(TEXT_INPUTS))
            .await
            .unwrap_or_default();
        for input in inputs {
            match self.answer_control(&input, false, job_title, company).await {
                Ok(true) => answered += 1,
                Ok(false) => {}
                Err(e) => warn!(target: "wizard.answer", error = %e, "text input unanswered"),
            }
        }

        if answered > 0 {
            info!(target: "wizard.answer", answered, "questions answered");
        }
        answered
    }

    async fn answer_control(
        &self,
        element: &S::Element,
        is_textarea: bool,
        job_title: &str,
        company: &str,
    ) -> Result<bool> {
        let s = self.session;
        if !s.value(element).await?.trim().is_empty()
            || !s.is_displayed(element).await?
            || !s.is_enabled(element).await?
        {
            return Ok(false);
        }

        let id = s.attr_or_empty(element, "id").await;
        let placeholder = s.attr_or_empty(element, "placeholder").await;
        if !is_textarea {
            let name = s.attr_or_empty(element, "name").await;
            let aria = s.attr_or_empty(element, "aria-label").await;
            let identifier = format!("{id} {name} {placeholder} {aria}").to_lowercase();
            if is_contact_field(&identifier) {
                return Ok(false);
            }
        }

        let _ = s.scroll_into_view(element).await;
        let Some(prompt) = self.resolve_prompt(element, &id, &placeholder).await else {
            return Ok(false);
        };
        if !is_textarea && !(prompt.contains('?') || prompt.chars().count() > 15) {
            return Ok(false);
        }

        let (answer, origin) = resolve_answer(
            self.source,
            self.timeout,
            &prompt,
            self.profile,
            job_title,
            company,
        )
        .await;
        let answer = if is_textarea {
            answer
        } else {
            shorten_for_input(&answer)
        };

        let Some(strategy) = write_text(s, element, &answer, self.pacing).await else {
            warn!(target: "wizard.answer", %prompt, "every entry strategy failed");
            return Ok(false);
        };
        if is_textarea {
            // Moves focus on so the form registers the change.
            let _ = s.send_tab(element).await;
        }
        info!(target: "wizard.answer", %prompt, ?origin, ?strategy, "question answered");
        Ok(true)
    }

    /// Question text for a free-text control, whitespace-collapsed.
    pub async fn resolve_prompt(
        &self,
        element: &S::Element,
        id: &str,
        placeholder: &str,
    ) -> Option<String> {
        let s = self.session;
        let placeholder = normalize_space(placeholder);
        let candidates = if placeholder.chars().count() > 10 {
            placeholder
        } else {
            let mut found = label_for(s, id).await;
            if found.is_empty() {
                found = self.ancestor_prompt(element).await;
            }
            if found.is_empty() {
                found = preceding_question_in(s, element, PRECEDING_BLOCKS_XPATH, 10).await;
            }
            if found.is_empty() {
                found = nearest_question(s, element).await;
            }
            found
        };
        let prompt = normalize_space(&candidates);
        (!prompt.is_empty()).then_some(prompt)
    }

    async fn ancestor_prompt(&self, element: &S::Element) -> String {
        let s = self.session;
        let mut scope = element.clone();
        for _ in 0..3 {
            let Ok(parent) = s.parent(&scope).await else {
                break;
            };
            for (css, min_len) in [("label", 0), (QUESTION_DIVS, 0), (TEXT_BLOCKS, 10)] {
                let text = first_text(s, &parent, css, min_len).await;
                if !text.is_empty() {
                    return text;
                }
            }
            scope = parent;
        }
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::WorkExperience;
    use easyapply_drivers::FakeBrowser;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Failing;

    #[async_trait]
    impl AnswerSource for Failing {
        async fn generate(&self, _: &str, _: &ApplicantProfile, _: &str, _: &str) -> Result<String> {
            Err(EasyApplyError::Agent("offline".into()))
        }
    }

    struct Fixed(&'static str, AtomicUsize);

    #[async_trait]
    impl AnswerSource for Fixed {
        async fn generate(&self, _: &str, _: &ApplicantProfile, _: &str, _: &str) -> Result<String> {
            self.1.fetch_add(1, Ordering::SeqCst);
            Ok(self.0.to_string())
        }
    }

    struct Slow;

    #[async_trait]
    impl AnswerSource for Slow {
        async fn generate(&self, _: &str, _: &ApplicantProfile, _: &str, _: &str) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("too late".into())
        }
    }

    fn profile() -> ApplicantProfile {
        let mut p = ApplicantProfile::default();
        p.skills = vec!["Rust".into(), "Tokio".into(), "PostgreSQL".into(), "Kafka".into()];
        p.work_experience = vec![WorkExperience {
            company: "Initech".into(),
            title: "Backend Engineer".into(),
            ..WorkExperience::default()
        }];
        p.questions.years_of_experience = "6".into();
        p.questions.salary_expectation = "$120,000".into();
        p.questions.preferred_start_date = "As soon as possible".into();
        p.questions.preferred_work_setting = "Remote".into();
        p.questions.willing_to_relocate = "No".into();
        p.questions.visa_sponsorship_required = "No".into();
        p
    }

    #[test]
    fn every_category_has_a_profile_backed_fallback() {
        let p = profile();
        let cases = [
            ("Tell us about yourself", "Backend Engineer"),
            ("Why do you want to work here?", "Acme"),
            ("What are your salary expectations?", "$120,000"),
            ("When can you start?", "as soon as possible"),
            ("What is your greatest strength?", "Rust, Tokio and PostgreSQL"),
            ("What is your biggest weakness?", "checkpoints"),
            ("Describe a challenge you overcame", "Initech"),
            ("Are you open to hybrid work?", "remote"),
            ("Would you relocate to Berlin?", "not looking to relocate"),
            ("Do you need a visa?", "do not require"),
        ];
        for (prompt, needle) in cases {
            let answer = fallback_answer(prompt, &p, "Platform Engineer", "Acme");
            assert!(answer.contains(needle), "{prompt:?} -> {answer:?}");
        }
    }

    #[test]
    fn unmatched_prompt_gets_generic_answer() {
        let answer = fallback_answer(
            "Anything else we should know",
            &profile(),
            "Platform Engineer",
            "Acme",
        );
        assert!(answer.contains("Platform Engineer"));
        assert!(answer.contains("Acme"));
        assert!(answer.contains("Rust, Tokio and PostgreSQL"));
        assert!(answer.contains("6 years"));
    }

    #[test]
    fn fallback_survives_an_empty_profile() {
        let answer = fallback_answer("Tell us about yourself", &ApplicantProfile::default(), "", "");
        assert!(!answer.trim().is_empty());
    }

    #[test]
    fn long_input_answers_keep_first_sentence() {
        let long = "I have six years of Rust. ".repeat(6);
        assert_eq!(shorten_for_input(&long), "I have six years of Rust.");
        assert_eq!(shorten_for_input("Six."), "Six.");
    }

    #[test]
    fn decimals_do_not_end_a_sentence() {
        let long = format!(
            "I have 6.5 years of Rust, mostly on storage engines! {}",
            "More detail follows here. ".repeat(4)
        );
        assert_eq!(
            shorten_for_input(&long),
            "I have 6.5 years of Rust, mostly on storage engines!"
        );

        let question = format!("Why not? {}", "x".repeat(120));
        assert_eq!(shorten_for_input(&question), "Why not?");
    }

    #[tokio::test]
    async fn failing_and_slow_sources_fall_back() {
        let p = profile();
        let (answer, origin) =
            resolve_answer(&Failing, Duration::from_secs(1), "Why us?", &p, "SRE", "Acme").await;
        assert_eq!(origin, AnswerOrigin::Fallback);
        assert!(answer.contains("Acme"));

        let (_, origin) =
            resolve_answer(&Slow, Duration::from_millis(20), "Why us?", &p, "SRE", "Acme").await;
        assert_eq!(origin, AnswerOrigin::Fallback);

        let blank = Fixed("   ", AtomicUsize::new(0));
        let (answer, origin) =
            resolve_answer(&blank, Duration::from_secs(1), "Why us?", &p, "SRE", "Acme").await;
        assert_eq!(origin, AnswerOrigin::Fallback);
        assert!(!answer.is_empty());
    }

    #[tokio::test]
    async fn motivation_textarea_without_model() {
        let browser = FakeBrowser::with_page(
            r#"<textarea id="q1" placeholder="Why do you want to work here?"></textarea>"#,
        );
        let p = profile();
        let pacing = Pacing::instant();
        let answerer =
            QuestionAnswerer::new(&browser, &NoAnswerSource, &p, &pacing, Duration::from_secs(1));

        assert_eq!(answerer.answer_step("Platform Engineer", "Acme").await, 1);
        let value = browser.value_of("#q1").unwrap();
        assert!(value.contains("Platform Engineer"));
        assert!(value.contains("Acme"));
        assert!(browser
            .events()
            .iter()
            .any(|e| matches!(e, easyapply_drivers::FakeEvent::Keys { text, .. } if text == easyapply_drivers::keys::TAB)));
    }

    #[tokio::test]
    async fn ladder_falls_through_to_char_by_char() {
        let browser = FakeBrowser::with_page(
            r#"<input id="a" data-reject-script>
               <input id="b" data-reject-script data-reject-chunks>"#,
        );
        let pacing = Pacing::instant();
        let a = browser.find(Locator::Id("a")).await.unwrap();
        let b = browser.find(Locator::Id("b")).await.unwrap();

        assert_eq!(
            write_text(&browser, &a, "Hello there", &pacing).await,
            Some(EntryStrategy::ChunkedKeys)
        );
        assert_eq!(
            write_text(&browser, &b, "Hello there", &pacing).await,
            Some(EntryStrategy::CharByChar)
        );
        assert_eq!(browser.value_of("#b").as_deref(), Some("Hello there"));
    }

    #[tokio::test]
    async fn contact_and_short_prompts_are_skipped() {
        let browser = FakeBrowser::with_page(
            r#"<div><label for="github-url">What is your GitHub profile URL?</label><input id="github-url" type="text"></div>
               <div><label for="city">City</label><input id="city" type="text"></div>
               <div><label for="yrs">How many years of Rust have you used?</label><input id="yrs" type="text"></div>"#,
        );
        let p = profile();
        let pacing = Pacing::instant();
        let source = Fixed("Six years, mostly async services.", AtomicUsize::new(0));
        let answerer = QuestionAnswerer::new(&browser, &source, &p, &pacing, Duration::from_secs(1));

        assert_eq!(answerer.answer_step("SRE", "Acme").await, 1);
        assert_eq!(source.1.load(Ordering::SeqCst), 1);
        assert_eq!(browser.value_of("#github-url").as_deref(), Some(""));
        assert_eq!(browser.value_of("#city").as_deref(), Some(""));
        assert_eq!(
            browser.value_of("#yrs").as_deref(),
            Some("Six years, mostly async services.")
        );
    }

    #[tokio::test]
    async fn prompt_found_in_ancestor_question_div() {
        let browser = FakeBrowser::with_page(
            r#"<div class="fb-dash-form-element">
                 <div class="jobs-easy-apply-form-element__question">Describe your on-call experience</div>
                 <div><textarea id="t"></textarea></div>
               </div>"#,
        );
        let p = profile();
        let pacing = Pacing::instant();
        let answerer = QuestionAnswerer::new(&browser, &NoAnswerSource, &p, &pacing, Duration::from_secs(1));
        let t = browser.find(Locator::Id("t")).await.unwrap();

        assert_eq!(
            answerer.resolve_prompt(&t, "t", "").await.as_deref(),
            Some("Describe your on-call experience")
        );
    }
}
