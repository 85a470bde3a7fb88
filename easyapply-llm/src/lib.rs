//! Provider‑agnostic LLM integration for EasyApply.
//!
//! This crate exposes a common [`traits::LlmClient`] interface and concrete
//! provider implementations for Gemini and Ollama. It also provides a
//! convenience function to initialize a client from an
//! [`easyapply_common::LlmConfig`].
//!
//! # Examples
//! ```no_run
//! use easyapply_common::{LlmConfig, Result};
//! use easyapply_llm::ensure_llm_ready;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let cfg = LlmConfig::default();
//! let client = ensure_llm_ready(&cfg).await?;
//! assert!(!client.model_name().is_empty());
//! # Ok(())
//! # }
//! ```
pub mod gemini;
pub mod ollama;
pub mod traits;

use easyapply_common::{EasyApplyError, LlmConfig};
use std::sync::Arc;
use traits::LlmClient;

/// Default model recommendations for answering application questions.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2:3b";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Build an LLM client for `config`, pulling local models when needed.
pub async fn ensure_llm_ready(
    config: &LlmConfig,
) -> easyapply_common::Result<Arc<dyn LlmClient + Send + Sync + 'static>> {
    match config {
        #[cfg(feature = "ollama")]
        LlmConfig::Ollama { base_url, model } => {
            let client = ollama::OllamaClient::new(base_url.clone(), model.clone()).await?;
            Ok(Arc::new(client))
        }
        #[cfg(feature = "gemini")]
        LlmConfig::Gemini {
            api_key,
            model,
            temperature,
        } => {
            let client = gemini::GeminiClient::new(api_key.clone(), model.clone())?
                .with_default_temperature(*temperature);
            Ok(Arc::new(client))
        }
        LlmConfig::None => Err(EasyApplyError::Config("No LLM configured".to_string())),
        #[allow(unreachable_patterns)]
        _ => Err(EasyApplyError::Config("LLM provider not enabled".to_string())),
    }
}
