use easyapply_wizard::profile::{Education, WorkExperience};
use easyapply_wizard::ApplicantProfile;

pub fn profile() -> ApplicantProfile {
    let mut p = ApplicantProfile::default();
    p.personal_info.name = "Ada Lovelace".into();
    p.personal_info.email = "ada@example.com".into();
    p.personal_info.phone = "+44 20 7946 0000".into();
    p.education = vec![
        Education {
            school: "University of London".into(),
            degree: "Bachelor of Science".into(),
            ..Education::default()
        },
        Education {
            school: "University of Cambridge".into(),
            degree: "Master of Science".into(),
            ..Education::default()
        },
    ];
    p.work_experience = vec![WorkExperience {
        company: "Analytical Engines Ltd".into(),
        title: "Software Engineer".into(),
        ..WorkExperience::default()
    }];
    p.skills = vec!["Rust".into(), "Distributed systems".into(), "SQL".into()];
    p.questions.years_of_experience = "7".into();
    p.questions.willing_to_relocate = "Yes".into();
    p.questions.visa_sponsorship_required = "No".into();
    p.questions.preferred_work_setting = "Remote".into();
    p
}
