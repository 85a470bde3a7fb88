//! Quick-apply wizard automation.
//!
//! Everything here operates through a borrowed
//! [`BrowserSession`](easyapply_drivers::BrowserSession) and a read-only
//! [`ApplicantProfile`]:
//!
//! - [`classifier`]: field kind and label resolution for one control
//! - [`rules`]: ordered keyword tables mapping identifiers to profile answers
//! - [`filler`]: selects, radios, checkboxes, text and file inputs
//! - [`answerer`]: free-text questions via an [`AnswerSource`], with fallbacks
//! - [`wizard`]: the per-application step loop
//! - [`batch`]: many applications against a [`JobBoard`]
//!
//! # Examples
//!
//! ```rust
//! use easyapply_wizard::rules::{choose_radio, RadioChoice};
//! use easyapply_wizard::ApplicantProfile;
//!
//! let mut profile = ApplicantProfile::default();
//! profile.questions.willing_to_relocate = "Yes".into();
//!
//! let options = [RadioChoice::new("Yes", "Yes"), RadioChoice::new("No", "No")];
//! assert_eq!(choose_radio("are you willing to relocate?", &options, &profile), Some(0));
//! ```
pub mod answerer;
pub mod batch;
pub mod classifier;
pub mod filler;
pub mod profile;
pub mod rules;
pub mod wizard;

pub use answerer::{AnswerSource, LlmAnswerSource, NoAnswerSource, QuestionAnswerer};
pub use batch::{AppliedJob, AppliedLog, BatchReport, BatchRunner, BatchSettings, JobBoard};
pub use filler::{FieldFiller, FillOutcome, FillReport};
pub use profile::{ApplicantProfile, LoadedProfile, ProfileStore};
pub use wizard::{
    ApplicationOutcome, ApplicationWizard, JobPosting, WizardOptions, WizardState,
};
