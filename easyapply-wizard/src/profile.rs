//! Applicant profile: the read-only record every field value comes from.

use easyapply_common::{EasyApplyError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PersonalInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub website: String,
    pub linkedin: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Education {
    pub school: String,
    pub degree: String,
    pub field_of_study: String,
    pub start_date: String,
    pub end_date: String,
    pub gpa: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkExperience {
    pub company: String,
    pub title: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
}

/// Canned answers to the screening questions the filler recognises.
///
/// Yes/no values are the literal strings `"Yes"` / `"No"`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScreeningAnswers {
    pub years_of_experience: String,
    pub willing_to_relocate: String,
    pub willing_to_travel: String,
    pub preferred_work_setting: String,
    pub salary_expectation: String,
    pub preferred_start_date: String,
    pub visa_sponsorship_required: String,
    pub cleared_security_clearance: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApplicantProfile {
    pub personal_info: PersonalInfo,
    pub education: Vec<Education>,
    /// Most recent first.
    pub work_experience: Vec<WorkExperience>,
    pub skills: Vec<String>,
    pub certifications: Vec<String>,
    pub languages: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_path: Option<PathBuf>,
    pub questions: ScreeningAnswers,
}

/// Parse a `"Yes"` / `"No"` profile value.
pub fn yes_no(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" => Some(true),
        "no" => Some(false),
        _ => None,
    }
}

/// Rank of a degree string: doctorate 5, master 4, bachelor 3, associate 2,
/// high school 1, unrecognised 0.
pub fn degree_priority(degree: &str) -> u8 {
    let d = degree.to_lowercase();
    if d.contains("doctor") || d.contains("phd") || d.contains("ph.d") {
        5
    } else if d.contains("master") {
        4
    } else if d.contains("bachelor") {
        3
    } else if d.contains("associate") {
        2
    } else if d.contains("high school") || d.contains("high-school") {
        1
    } else {
        0
    }
}

impl ApplicantProfile {
    /// Highest degree priority across all education entries.
    pub fn highest_degree_priority(&self) -> u8 {
        self.education
            .iter()
            .map(|e| degree_priority(&e.degree))
            .max()
            .unwrap_or(0)
    }

    pub fn first_name(&self) -> Option<&str> {
        self.personal_info.name.split_whitespace().next()
    }

    pub fn last_name(&self) -> Option<&str> {
        self.personal_info.name.split_whitespace().last()
    }

    pub fn latest_role(&self) -> Option<&WorkExperience> {
        self.work_experience.first()
    }

    pub fn top_skills(&self, n: usize) -> Vec<&str> {
        self.skills
            .iter()
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
            .take(n)
            .collect()
    }

    pub fn years_of_experience(&self) -> &str {
        let years = self.questions.years_of_experience.trim();
        if years.is_empty() {
            "several"
        } else {
            years
        }
    }

    /// Absolute résumé path, resolved against the working directory.
    pub fn resume_absolute_path(&self) -> Option<PathBuf> {
        let path = self.resume_path.as_ref()?;
        if path.as_os_str().is_empty() {
            return None;
        }
        if path.is_absolute() {
            return Some(path.clone());
        }
        std::env::current_dir().ok().map(|cwd| cwd.join(path))
    }

    /// Plain-text summary handed to the language model.
    pub fn render_context(&self, job_title: &str, company: &str) -> String {
        let mut lines = Vec::new();
        let p = &self.personal_info;
        if !p.name.is_empty() {
            lines.push(format!("Name: {}", p.name));
        }
        if let Some(role) = self.latest_role() {
            lines.push(format!("Most recent role: {} at {}", role.title, role.company));
            if !role.description.is_empty() {
                lines.push(format!("Role summary: {}", role.description));
            }
        }
        for earlier in self.work_experience.iter().skip(1) {
            lines.push(format!("Earlier role: {} at {}", earlier.title, earlier.company));
        }
        lines.push(format!("Years of experience: {}", self.years_of_experience()));
        if !self.skills.is_empty() {
            lines.push(format!("Skills: {}", self.skills.join(", ")));
        }
        for edu in &self.education {
            lines.push(format!(
                "Education: {} in {}, {}",
                edu.degree, edu.field_of_study, edu.school
            ));
        }
        if !self.certifications.is_empty() {
            lines.push(format!("Certifications: {}", self.certifications.join(", ")));
        }
        if !self.languages.is_empty() {
            lines.push(format!("Languages: {}", self.languages.join(", ")));
        }
        let q = &self.questions;
        lines.push(format!(
            "Preferences: work setting {}, relocate {}, travel {}, start {}, salary {}",
            q.preferred_work_setting,
            q.willing_to_relocate,
            q.willing_to_travel,
            q.preferred_start_date,
            q.salary_expectation
        ));
        lines.push(format!("Applying for: {job_title} at {company}"));
        lines.join("\n")
    }

    /// Placeholder profile written when none exists yet.
    pub fn template(email: Option<&str>) -> Self {
        Self {
            personal_info: PersonalInfo {
                name: "Your Name".into(),
                email: email.unwrap_or("you@example.com").into(),
                phone: "+1 555 0100".into(),
                address: "Your Address".into(),
                website: "https://example.com".into(),
                linkedin: "https://www.linkedin.com/in/your-profile".into(),
            },
            education: vec![Education {
                school: "Your University".into(),
                degree: "Your Degree".into(),
                field_of_study: "Your Field".into(),
                start_date: "MM/YYYY".into(),
                end_date: "MM/YYYY".into(),
                gpa: "4.0".into(),
            }],
            work_experience: vec![WorkExperience {
                company: "Your Last Company".into(),
                title: "Your Title".into(),
                location: "City, State".into(),
                start_date: "MM/YYYY".into(),
                end_date: "MM/YYYY".into(),
                description: "Brief description of your role".into(),
            }],
            skills: vec!["Skill 1".into(), "Skill 2".into(), "Skill 3".into()],
            certifications: vec!["Certification 1".into(), "Certification 2".into()],
            languages: vec!["English".into()],
            resume_path: None,
            questions: ScreeningAnswers {
                years_of_experience: "3".into(),
                willing_to_relocate: "Yes".into(),
                willing_to_travel: "Yes".into(),
                preferred_work_setting: "Hybrid".into(),
                salary_expectation: "$80,000 - $100,000".into(),
                preferred_start_date: "As soon as possible".into(),
                visa_sponsorship_required: "No".into(),
                cleared_security_clearance: "No".into(),
            },
        }
    }
}

/// Result of [`ProfileStore::load_or_create`].
#[derive(Debug, Clone)]
pub struct LoadedProfile {
    pub profile: ApplicantProfile,
    /// The file did not exist and a template was written in its place.
    pub incomplete: bool,
}

/// JSON file holding the applicant profile.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<ApplicantProfile> {
        let raw = fs::read_to_string(&self.path)?;
        serde_json::from_str(&raw).map_err(|e| {
            EasyApplyError::Profile(format!("{}: {e}", self.path.display()))
        })
    }

    /// Load the profile, writing a template first when the file is missing.
    pub fn load_or_create(&self, email: Option<&str>) -> Result<LoadedProfile> {
        if self.path.exists() {
            return Ok(LoadedProfile {
                profile: self.load()?,
                incomplete: false,
            });
        }

        let profile = ApplicantProfile::template(email);
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&profile)?)?;
        warn!(
            target: "profile",
            path = %self.path.display(),
            "created template profile; update it with your information"
        );
        info!(target: "profile", "template profile flagged incomplete");

        Ok(LoadedProfile {
            profile,
            incomplete: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_degrees(degrees: &[&str]) -> ApplicantProfile {
        ApplicantProfile {
            education: degrees
                .iter()
                .map(|d| Education {
                    degree: d.to_string(),
                    ..Education::default()
                })
                .collect(),
            ..ApplicantProfile::default()
        }
    }

    #[test]
    fn highest_degree_is_max_over_entries() {
        let profile = with_degrees(&["Bachelor of Science", "Master's in CS", "High School"]);
        assert_eq!(profile.highest_degree_priority(), 4);
        assert_eq!(with_degrees(&[]).highest_degree_priority(), 0);
        assert_eq!(degree_priority("PhD, Physics"), 5);
    }

    #[test]
    fn names_split_on_whitespace() {
        let mut profile = ApplicantProfile::default();
        profile.personal_info.name = "Ada  King Lovelace".into();
        assert_eq!(profile.first_name(), Some("Ada"));
        assert_eq!(profile.last_name(), Some("Lovelace"));
    }

    #[test]
    fn yes_no_is_case_insensitive() {
        assert_eq!(yes_no(" YES "), Some(true));
        assert_eq!(yes_no("no"), Some(false));
        assert_eq!(yes_no("maybe"), None);
    }

    #[test]
    fn missing_file_writes_template_and_flags_incomplete() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path().join("nested/resume_data.json"));

        let first = store.load_or_create(Some("ada@example.com")).unwrap();
        assert!(first.incomplete);
        assert_eq!(first.profile.personal_info.email, "ada@example.com");
        assert!(store.path().exists());

        let second = store.load_or_create(None).unwrap();
        assert!(!second.incomplete);
        assert_eq!(second.profile, first.profile);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume_data.json");
        fs::write(
            &path,
            r#"{"personal_info": {"name": "Ada Lovelace"}, "questions": {"willing_to_relocate": "No"}}"#,
        )
        .unwrap();

        let profile = ProfileStore::new(&path).load().unwrap();
        assert_eq!(profile.personal_info.name, "Ada Lovelace");
        assert_eq!(profile.questions.willing_to_relocate, "No");
        assert!(profile.skills.is_empty());
    }

    #[test]
    fn malformed_json_is_a_profile_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume_data.json");
        fs::write(&path, "{not json").unwrap();
        let err = ProfileStore::new(&path).load().unwrap_err();
        assert!(matches!(err, EasyApplyError::Profile(_)));
    }
}
