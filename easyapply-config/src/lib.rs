//! Loader for EasyApply configuration with YAML + environment overlays.
//!
//! Sources are merged in order: YAML files/snippets first, then
//! `EASYAPPLY__`-prefixed environment variables (double underscore separates
//! nesting, e.g. `EASYAPPLY__WIZARD__MAX_STEPS=12`). After merging, every
//! string value has `${VAR}` references expanded recursively.
use config::{Config, ConfigError, Environment, File};
use easyapply_common::LlmConfig;
use easyapply_common::observability::{LogConfig, LogFormat};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Deserialize)]
pub struct EasyApplyConfig {
    pub version: Option<String>,
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    #[serde(default)]
    pub headless: bool,
    /// Root of the job site; login and search paths are joined onto it.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_profile_path")]
    pub profile_path: PathBuf,
    #[serde(default = "default_applied_jobs_path")]
    pub applied_jobs_path: PathBuf,
    #[serde(default)]
    pub credentials: Option<Credentials>,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub wizard: WizardSettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub location: String,
    #[serde(default = "default_max_applications")]
    pub max_applications: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            keywords: String::new(),
            location: String::new(),
            max_applications: default_max_applications(),
        }
    }
}

/// Step budget and pacing for the application wizard.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WizardSettings {
    pub max_steps: u32,
    /// Ceiling for bounded waits on elements and conditions.
    pub wait_timeout_ms: u64,
    /// Pause after small writes (typing, toggles).
    pub settle_ms: u64,
    /// Pause after clicks that re-render the wizard.
    pub long_settle_ms: u64,
    pub generation_timeout_secs: u64,
    pub between_jobs_min_secs: u64,
    pub between_jobs_max_secs: u64,
}

impl Default for WizardSettings {
    fn default() -> Self {
        Self {
            max_steps: 10,
            wait_timeout_ms: 5_000,
            settle_ms: 500,
            long_settle_ms: 2_000,
            generation_timeout_secs: 30,
            between_jobs_min_secs: 5,
            between_jobs_max_secs: 10,
        }
    }
}

impl WizardSettings {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum LlmSettings {
    Gemini {
        #[serde(default = "default_gemini_model")]
        model: String,
        api_key: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<u32>,
    },
    Ollama {
        model: String,
        #[serde(default = "default_ollama_endpoint")]
        endpoint: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<u32>,
    },
    /// No provider: every free-text answer comes from the fallback table.
    #[default]
    None,
}

impl LlmSettings {
    /// Provider configuration understood by `easyapply_llm::ensure_llm_ready`.
    pub fn to_llm_config(&self) -> LlmConfig {
        match self {
            Self::Gemini {
                model,
                api_key,
                temperature,
                ..
            } => LlmConfig::Gemini {
                api_key: api_key.clone(),
                model: model.clone(),
                temperature: *temperature,
            },
            Self::Ollama {
                model, endpoint, ..
            } => LlmConfig::Ollama {
                base_url: endpoint.clone(),
                model: model.clone(),
            },
            Self::None => LlmConfig::None,
        }
    }

    pub fn temperature(&self) -> Option<f32> {
        match self {
            Self::Gemini { temperature, .. } | Self::Ollama { temperature, .. } => *temperature,
            Self::None => None,
        }
    }

    pub fn max_tokens(&self) -> Option<u32> {
        match self {
            Self::Gemini { max_tokens, .. } | Self::Ollama { max_tokens, .. } => *max_tokens,
            Self::None => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub dir: Option<PathBuf>,
    pub json: bool,
    pub stderr: bool,
    pub filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            dir: None,
            json: false,
            stderr: true,
            filter: "info".to_string(),
        }
    }
}

impl LogSettings {
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            log_dir: self.dir.clone(),
            emit_stderr: self.stderr,
            format: if self.json {
                LogFormat::Json
            } else {
                LogFormat::Text
            },
            default_filter: self.filter.clone(),
            ..LogConfig::default()
        }
    }
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".into()
}
fn default_base_url() -> String {
    "https://www.linkedin.com".into()
}
fn default_profile_path() -> PathBuf {
    PathBuf::from("resume_data.json")
}
fn default_applied_jobs_path() -> PathBuf {
    PathBuf::from("applied_jobs.json")
}
fn default_max_applications() -> usize {
    10
}
fn default_gemini_model() -> String {
    "gemini-1.5-flash".into()
}
fn default_ollama_endpoint() -> String {
    "http://localhost:11434".into()
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct EasyApplyConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for EasyApplyConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl EasyApplyConfigLoader {
    /// Empty loader; `EASYAPPLY__` env overrides are applied on [`load`](Self::load).
    ///
    /// ```
    /// use easyapply_config::EasyApplyConfigLoader;
    ///
    /// let config = EasyApplyConfigLoader::new()
    ///     .with_yaml_str("version: '1'")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.wizard.max_steps, 10);
    /// assert_eq!(config.webdriver_url, "http://localhost:9515");
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; the format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent, so deployments can rely on the
    /// environment alone.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use easyapply_config::{EasyApplyConfigLoader, LlmSettings};
    ///
    /// let cfg = EasyApplyConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// search:
    ///   keywords: "rust engineer"
    ///   location: "Berlin"
    /// llm:
    ///   provider: ollama
    ///   model: "llama3"
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.search.keywords, "rust engineer");
    /// assert_eq!(cfg.search.max_applications, 10);
    /// assert!(matches!(cfg.llm, LlmSettings::Ollama { .. }));
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// `${VAR}` placeholders are expanded before materialising the structs, so
    /// secrets can stay out of the YAML file.
    pub fn load(self) -> Result<EasyApplyConfig, ConfigError> {
        // Environment goes last so it overrides every file source.
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("EASYAPPLY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: EasyApplyConfig =
            serde_json::from_value(v).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("GEMINI_API_KEY", Some("abc123"), || {
            let mut v = json!("key-${GEMINI_API_KEY}");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("key-abc123"));
        });
    }

    #[test]
    fn expands_in_array_and_object() {
        temp_env::with_vars(
            [("JOB_TITLE", Some("Engineer")), ("CITY", Some("Lisbon"))],
            || {
                let mut v = json!([
                    "title-$JOB_TITLE",
                    { "search": "${JOB_TITLE} in ${CITY}" },
                    42,
                    true,
                    null
                ]);
                expand_env_in_value(&mut v);
                assert_eq!(
                    v,
                    json!(["title-Engineer", { "search": "Engineer in Lisbon" }, 42, true, null])
                );
            },
        );
    }

    #[test]
    fn expands_recursively_and_stops_on_cycles() {
        temp_env::with_vars(
            [
                ("INNER", Some("secret")),
                ("OUTER", Some("pre-${INNER}")),
                ("A", Some("${B}")),
                ("B", Some("${A}")),
            ],
            || {
                let mut v = json!("${OUTER}");
                expand_env_in_value(&mut v);
                assert_eq!(v, json!("pre-secret"));

                let mut cyclic = json!("x=${A}");
                expand_env_in_value(&mut cyclic);
                let s = cyclic.as_str().unwrap();
                assert!(s.starts_with("x=") && s.contains("${"));
            },
        );
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${EASYAPPLY_DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${EASYAPPLY_DOES_NOT_EXIST}"));
    }

    #[test]
    fn gemini_settings_map_to_llm_config() {
        let settings: LlmSettings = serde_json::from_value(json!({
            "provider": "gemini",
            "api_key": "k",
            "temperature": 0.7
        }))
        .unwrap();

        assert_eq!(settings.temperature(), Some(0.7));
        match settings.to_llm_config() {
            LlmConfig::Gemini { model, api_key, .. } => {
                assert_eq!(model, "gemini-1.5-flash");
                assert_eq!(api_key, "k");
            }
            other => panic!("expected gemini, got {other:?}"),
        }
    }

    #[test]
    fn log_settings_select_json_format() {
        let settings = LogSettings {
            json: true,
            stderr: false,
            ..LogSettings::default()
        };
        let cfg = settings.to_log_config();
        assert_eq!(cfg.format, LogFormat::Json);
        assert!(!cfg.emit_stderr);
        assert_eq!(cfg.app_name, "easyapply");
    }
}
