//! Common types and utilities shared across EasyApply crates.
//!
//! This crate defines the LLM provider configuration, observability helpers,
//! and the shared error taxonomy used throughout the EasyApply workspace. It
//! is intentionally lightweight so that every crate can depend on it without
//! introducing heavy transitive costs.
//!
//! # Overview
//!
//! - [`LlmConfig`]: Provider‑agnostic LLM configuration
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`EasyApplyError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! Not-found conditions are expected while scanning a form and are
//! distinguished from hard failures:
//!
//! ```rust
//! use easyapply_common::EasyApplyError;
//!
//! let err = EasyApplyError::NotFound("button[aria-label='Next']".into());
//! assert!(err.is_not_found());
//! assert!(!EasyApplyError::Config("missing api key".into()).is_not_found());
//! ```
use serde::{Deserialize, Serialize};

pub mod observability;

/// Configuration for an LLM provider used to answer free-text questions.
///
/// Feature flags control which variants are compiled in.
/// See the `easyapply-llm` crate for concrete client implementations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LlmConfig {
    #[cfg(feature = "ollama")]
    Ollama {
        base_url: String,
        model: String,
    },
    #[cfg(feature = "gemini")]
    Gemini {
        api_key: String,
        model: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        temperature: Option<f32>,
    },
    None,
}

impl Default for LlmConfig {
    fn default() -> Self {
        // Gemini is the hosted default; without it, fall back to a local Ollama.
        #[cfg(feature = "gemini")]
        {
            Self::Gemini {
                api_key: String::new(),
                model: "gemini-1.5-flash".to_string(),
                temperature: Some(0.7),
            }
        }
        #[cfg(all(not(feature = "gemini"), feature = "ollama"))]
        {
            Self::Ollama {
                base_url: "http://localhost:11434".to_string(),
                model: "llama3".to_string(),
            }
        }
        #[cfg(not(any(feature = "gemini", feature = "ollama")))]
        {
            Self::None
        }
    }
}

/// Error types used across the EasyApply system.
#[derive(thiserror::Error, Debug)]
pub enum EasyApplyError {
    /// An element or condition was absent when looked up.
    #[error("Element not found: {0}")]
    NotFound(String),

    /// A bounded wait elapsed before its condition held.
    #[error("Timed out waiting for: {0}")]
    Timeout(String),

    /// The browser driver (WebDriver session, script execution) reported an error.
    #[error("Driver error: {0}")]
    Driver(#[from] anyhow::Error),

    /// A text-generation provider failed to answer.
    #[error("Agent error: {0}")]
    Agent(String),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The applicant profile could not be read or written.
    #[error("Profile error: {0}")]
    Profile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl EasyApplyError {
    /// True for the expected negative results of element lookups and waits.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Timeout(_))
    }
}

/// Convenient alias for results that use [`EasyApplyError`].
pub type Result<T> = std::result::Result<T, EasyApplyError>;
