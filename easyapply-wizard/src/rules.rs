//! Keyword rule tables and the pure decisions built on them.
//!
//! Nothing here touches the browser: callers pass the lower-cased field
//! identifier plus the visible option labels and get back what to pick.

use crate::profile::{degree_priority, yes_no, ApplicantProfile};

/// Screening-question category recognised from a field identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Visa,
    Relocation,
    Travel,
    Education,
    WorkSetting,
    WorkAuthorization,
}

struct Rule {
    category: Category,
    keywords: &'static [&'static str],
}

const VISA: Rule = Rule {
    category: Category::Visa,
    keywords: &["visa", "sponsor"],
};
const RELOCATION: Rule = Rule {
    category: Category::Relocation,
    keywords: &["relocate"],
};
const TRAVEL: Rule = Rule {
    category: Category::Travel,
    keywords: &["travel"],
};
const EDUCATION: Rule = Rule {
    category: Category::Education,
    keywords: &["education", "degree"],
};
const WORK_SETTING: Rule = Rule {
    category: Category::WorkSetting,
    keywords: &["work remotely", "remote"],
};
const WORK_AUTHORIZATION: Rule = Rule {
    category: Category::WorkAuthorization,
    keywords: &["citizenship", "authorized"],
};

const SELECT_RULES: &[Rule] = &[VISA, RELOCATION, TRAVEL, EDUCATION, WORK_SETTING];
const RADIO_RULES: &[Rule] = &[
    VISA,
    RELOCATION,
    TRAVEL,
    EDUCATION,
    WORK_SETTING,
    WORK_AUTHORIZATION,
];

const PLACEHOLDER_WORDS: &[&str] = &["select", "choose", "please"];

fn categorize(rules: &[Rule], identifier: &str) -> Option<Category> {
    rules
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| identifier.contains(k)))
        .map(|rule| rule.category)
}

pub fn select_category(identifier: &str) -> Option<Category> {
    categorize(SELECT_RULES, identifier)
}

pub fn radio_category(identifier: &str) -> Option<Category> {
    categorize(RADIO_RULES, identifier)
}

/// Instructional options such as "Select an option".
pub fn is_placeholder(option: &str) -> bool {
    let lower = option.to_lowercase();
    lower.trim().is_empty() || PLACEHOLDER_WORDS.iter().any(|p| lower.contains(p))
}

/// Whole-word match, so "no" does not hit "not" or "know".
pub fn has_word(text: &str, word: &str) -> bool {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| w == word)
}

fn says(label: &str, value: &str, answer: bool) -> bool {
    let word = if answer { "yes" } else { "no" };
    let value = value.trim().to_lowercase();
    has_word(label, word)
        || value == word
        || (answer && value == "true")
        || (!answer && value == "false")
}

fn profile_answer(category: Category, profile: &ApplicantProfile) -> Option<bool> {
    let q = &profile.questions;
    match category {
        Category::Visa => yes_no(&q.visa_sponsorship_required),
        Category::Relocation => yes_no(&q.willing_to_relocate),
        Category::Travel => yes_no(&q.willing_to_travel),
        Category::WorkAuthorization => Some(true),
        Category::Education | Category::WorkSetting => None,
    }
}

/// Index of the option whose degree ranks highest without exceeding the
/// applicant's highest attained degree.
fn best_degree(labels: &[&str], profile: &ApplicantProfile) -> Option<usize> {
    let ceiling = profile.highest_degree_priority();
    if ceiling == 0 {
        return None;
    }
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| (i, degree_priority(label)))
        .filter(|(_, p)| *p > 0 && *p <= ceiling)
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        .map(|(i, _)| i)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Setting {
    Remote,
    OnSite,
    Hybrid,
}

fn preferred_setting(profile: &ApplicantProfile) -> Option<Setting> {
    let s = profile.questions.preferred_work_setting.to_lowercase();
    if s.contains("remote") {
        Some(Setting::Remote)
    } else if s.contains("on-site") || s.contains("onsite") || s.contains("on site") {
        Some(Setting::OnSite)
    } else if s.contains("hybrid") {
        Some(Setting::Hybrid)
    } else {
        None
    }
}

fn mentions_setting(label: &str, setting: Setting) -> bool {
    let l = label.to_lowercase();
    match setting {
        Setting::Remote => l.contains("remote"),
        Setting::OnSite => l.contains("onsite") || l.contains("on-site") || l.contains("on site"),
        Setting::Hybrid => l.contains("hybrid"),
    }
}

/// Pick the label to select in a dropdown, or `None` to leave it alone.
pub fn choose_select_option(
    identifier: &str,
    options: &[String],
    profile: &ApplicantProfile,
) -> Option<String> {
    let labels: Vec<&str> = options.iter().map(String::as_str).collect();

    let by_category = select_category(identifier).and_then(|category| match category {
        Category::Education => best_degree(&labels, profile),
        Category::WorkSetting => preferred_setting(profile)
            .and_then(|s| labels.iter().position(|l| mentions_setting(l, s))),
        other => profile_answer(other, profile)
            .and_then(|answer| labels.iter().position(|l| says(l, "", answer))),
    });

    by_category
        .map(|i| options[i].clone())
        .or_else(|| default_select_option(options))
}

/// An exact "Yes", else the first option that is not a placeholder.
pub fn default_select_option(options: &[String]) -> Option<String> {
    options
        .iter()
        .find(|o| o.trim().eq_ignore_ascii_case("yes"))
        .or_else(|| options.iter().find(|o| !is_placeholder(o)))
        .cloned()
}

/// One radio in a group, as the filler sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioChoice {
    pub label: String,
    pub value: String,
}

impl RadioChoice {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    fn text(&self) -> String {
        format!("{} {}", self.label, self.value)
    }
}

/// Index of the radio to select in a group where nothing is selected yet.
///
/// A recognised category that matches no option yields `None`; only an
/// unrecognised group falls back to Yes/true, then the first radio.
pub fn choose_radio(
    identifier: &str,
    choices: &[RadioChoice],
    profile: &ApplicantProfile,
) -> Option<usize> {
    if choices.is_empty() {
        return None;
    }

    match radio_category(identifier) {
        Some(Category::Education) => {
            let texts: Vec<String> = choices.iter().map(RadioChoice::text).collect();
            let labels: Vec<&str> = texts.iter().map(String::as_str).collect();
            best_degree(&labels, profile)
        }
        Some(Category::WorkSetting) => {
            let setting = preferred_setting(profile)?;
            choices
                .iter()
                .position(|c| mentions_setting(&c.text(), setting))
                .or_else(|| {
                    choices.iter().position(|c| match setting {
                        Setting::Remote => says(&c.label, &c.value, true),
                        Setting::OnSite => says(&c.label, &c.value, false),
                        Setting::Hybrid => c.label.to_lowercase().contains("flexible"),
                    })
                })
        }
        Some(category) => {
            let answer = profile_answer(category, profile)?;
            choices
                .iter()
                .position(|c| says(&c.label, &c.value, answer))
        }
        None => choices
            .iter()
            .position(|c| says(&c.label, &c.value, true))
            .or(Some(0)),
    }
}

/// Profile fields routed to plain text inputs by exact keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Phone,
    Email,
    FirstName,
    LastName,
    Website,
    Salary,
    Address,
    LinkedIn,
}

/// Routing key for a text identifier, in fixed priority order.
pub fn route_text_field(identifier: &str) -> Option<TextField> {
    let has = |k: &str| identifier.contains(k);
    if has("phone") {
        Some(TextField::Phone)
    } else if has("email") {
        Some(TextField::Email)
    } else if has("name") && has("first") {
        Some(TextField::FirstName)
    } else if has("name") && has("last") {
        Some(TextField::LastName)
    } else if has("website") || has("portfolio") {
        Some(TextField::Website)
    } else if has("salary") {
        Some(TextField::Salary)
    } else if has("address") {
        Some(TextField::Address)
    } else if has("linkedin") {
        Some(TextField::LinkedIn)
    } else {
        None
    }
}

/// Profile value for a routed field; empty values count as missing.
pub fn text_value(field: TextField, profile: &ApplicantProfile) -> Option<String> {
    let p = &profile.personal_info;
    let value = match field {
        TextField::Phone => p.phone.as_str(),
        TextField::Email => p.email.as_str(),
        TextField::FirstName => profile.first_name().unwrap_or_default(),
        TextField::LastName => profile.last_name().unwrap_or_default(),
        TextField::Website => p.website.as_str(),
        TextField::Salary => profile.questions.salary_expectation.as_str(),
        TextField::Address => p.address.as_str(),
        TextField::LinkedIn => p.linkedin.as_str(),
    };
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

const ANSWERER_EXCLUDED: &[&str] = &[
    "name", "email", "phone", "address", "website", "linkedin", "github",
];

/// Text inputs whose identifier marks them as contact fields are never
/// treated as free-text questions.
pub fn is_contact_field(identifier: &str) -> bool {
    route_text_field(identifier).is_some() || ANSWERER_EXCLUDED.iter().any(|k| identifier.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Education;

    fn profile() -> ApplicantProfile {
        let mut p = ApplicantProfile::default();
        p.personal_info.name = "Ada Lovelace".into();
        p.personal_info.phone = "+44 20 0000".into();
        p.questions.visa_sponsorship_required = "No".into();
        p.questions.willing_to_relocate = "Yes".into();
        p.questions.willing_to_travel = "No".into();
        p.questions.preferred_work_setting = "Remote".into();
        p.education = vec![Education {
            degree: "Master's in Mathematics".into(),
            ..Education::default()
        }];
        p
    }

    fn opts(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn degree_select_caps_at_highest_attained() {
        let options = opts(&["Select an option", "Bachelor's", "Master's", "PhD"]);
        assert_eq!(
            choose_select_option("highest degree", &options, &profile()).as_deref(),
            Some("Master's")
        );
    }

    #[test]
    fn visa_select_uses_whole_words() {
        let options = opts(&["Select an option", "I do not know", "No", "Yes"]);
        assert_eq!(
            choose_select_option("will you require visa sponsorship", &options, &profile()).as_deref(),
            Some("No")
        );
    }

    #[test]
    fn rules_apply_in_fixed_order() {
        // "sponsor" wins over "relocate" because visa comes first.
        assert_eq!(
            select_category("relocate or sponsor"),
            Some(Category::Visa)
        );
        assert_eq!(radio_category("are you authorized to work"), Some(Category::WorkAuthorization));
        assert_eq!(select_category("are you authorized to work"), None);
    }

    #[test]
    fn unmatched_select_defaults_to_yes_then_first_real_option() {
        let p = profile();
        assert_eq!(
            choose_select_option("favourite colour", &opts(&["Please choose", "No", "Yes"]), &p).as_deref(),
            Some("Yes")
        );
        assert_eq!(
            choose_select_option("favourite colour", &opts(&["Select", "Red", "Blue"]), &p).as_deref(),
            Some("Red")
        );
    }

    #[test]
    fn all_placeholder_select_is_left_alone() {
        let options = opts(&["Select an option", "Please choose one"]);
        assert_eq!(choose_select_option("anything", &options, &profile()), None);
    }

    #[test]
    fn work_setting_select_matches_preference() {
        let options = opts(&["Select", "On-site", "Hybrid", "Remote"]);
        assert_eq!(
            choose_select_option("preferred remote arrangement", &options, &profile()).as_deref(),
            Some("Remote")
        );
    }

    #[test]
    fn relocation_radio_follows_profile() {
        let choices = vec![RadioChoice::new("Yes", "Yes"), RadioChoice::new("No", "No")];
        assert_eq!(
            choose_radio("are you willing to relocate", &choices, &profile()),
            Some(0)
        );
        assert_eq!(
            choose_radio("are you willing to travel", &choices, &profile()),
            Some(1)
        );
    }

    #[test]
    fn radio_value_counts_when_label_is_blank() {
        let choices = vec![RadioChoice::new("", "true"), RadioChoice::new("", "false")];
        assert_eq!(choose_radio("visa sponsorship", &choices, &profile()), Some(1));
    }

    #[test]
    fn unknown_radio_prefers_yes_then_first() {
        let p = profile();
        let yes_last = vec![RadioChoice::new("Maybe", "m"), RadioChoice::new("Yes", "y")];
        assert_eq!(choose_radio("do you like rust", &yes_last, &p), Some(1));
        let no_yes = vec![RadioChoice::new("Red", "r"), RadioChoice::new("Blue", "b")];
        assert_eq!(choose_radio("favourite colour", &no_yes, &p), Some(0));
    }

    #[test]
    fn recognised_radio_without_match_selects_nothing() {
        let choices = vec![RadioChoice::new("Red", "r"), RadioChoice::new("Blue", "b")];
        assert_eq!(choose_radio("visa sponsorship", &choices, &profile()), None);
    }

    #[test]
    fn text_routing_order_and_values() {
        let p = profile();
        assert_eq!(route_text_field("first name"), Some(TextField::FirstName));
        assert_eq!(route_text_field("phone number email"), Some(TextField::Phone));
        assert_eq!(text_value(TextField::LastName, &p).as_deref(), Some("Lovelace"));
        assert_eq!(text_value(TextField::Email, &p), None);
        assert_eq!(route_text_field("how did you hear about us"), None);
        assert!(is_contact_field("github profile"));
        assert!(!is_contact_field("years of rust experience"));
    }
}
