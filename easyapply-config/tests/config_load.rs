use easyapply_config::{EasyApplyConfigLoader, LlmSettings};
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

const FILE_YAML: &str = r#"
version: "0.1"
headless: true
profile_path: "profiles/me.json"
credentials:
  email: "${LINKEDIN_EMAIL}"
  password: "${LINKEDIN_PASSWORD}"
search:
  keywords: "backend engineer"
  location: "Remote"
  max_applications: 3
wizard:
  max_steps: 8
llm:
  provider: gemini
  api_key: "${GEMINI_API_KEY}"
  temperature: 0.7
"#;

#[test]
#[serial]
fn test_config_load() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "easyapply.yaml", FILE_YAML);

    temp_env::with_vars(
        [
            ("LINKEDIN_EMAIL", Some("me@example.com")),
            ("LINKEDIN_PASSWORD", Some("hunter2")),
            ("GEMINI_API_KEY", Some("g-key")),
        ],
        || {
            let config = EasyApplyConfigLoader::new()
                .with_file(&p)
                .load()
                .expect("load system config");

            assert!(config.headless);
            assert_eq!(config.profile_path, PathBuf::from("profiles/me.json"));
            assert_eq!(config.search.max_applications, 3);
            assert_eq!(config.wizard.max_steps, 8);
            // untouched wizard fields keep their defaults
            assert_eq!(config.wizard.wait_timeout_ms, 5_000);

            let creds = config.credentials.expect("credentials present");
            assert_eq!(creds.email, "me@example.com");
            assert_eq!(creds.password, "hunter2");

            match config.llm {
                LlmSettings::Gemini { api_key, model, .. } => {
                    assert_eq!(api_key, "g-key");
                    assert_eq!(model, "gemini-1.5-flash");
                }
                other => panic!("expected gemini settings, got {other:?}"),
            }
        },
    );
}

#[test]
#[serial]
fn environment_overrides_file_values() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "easyapply.yaml", FILE_YAML);

    temp_env::with_vars(
        [
            ("EASYAPPLY__WIZARD__MAX_STEPS", Some("12")),
            ("EASYAPPLY__SEARCH__LOCATION", Some("Toronto")),
        ],
        || {
            let config = EasyApplyConfigLoader::new()
                .with_file(&p)
                .load()
                .expect("load with env overrides");

            assert_eq!(config.wizard.max_steps, 12);
            assert_eq!(config.search.location, "Toronto");
            assert_eq!(config.search.keywords, "backend engineer");
        },
    );
}

#[test]
#[serial]
fn missing_optional_file_falls_back_to_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = EasyApplyConfigLoader::new()
        .with_optional_file(tmp.path().join("absent.yaml"))
        .load()
        .expect("defaults only");

    assert!(matches!(config.llm, LlmSettings::None));
    assert_eq!(config.applied_jobs_path, PathBuf::from("applied_jobs.json"));
    assert!(config.credentials.is_none());
}

#[test]
#[serial]
fn missing_required_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let result = EasyApplyConfigLoader::new()
        .with_file(tmp.path().join("absent.yaml"))
        .load();
    assert!(result.is_err());
}
