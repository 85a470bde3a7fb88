use async_trait::async_trait;
use easyapply_common::{EasyApplyError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub model: Option<String>,
    pub tokens_used: Option<u32>,
}

#[derive(thiserror::Error, Debug)]
pub enum LlmError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid API key")]
    Unauthorized,

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Content blocked by safety filters")]
    Blocked,

    #[error("Empty response from provider")]
    Empty,
}

impl From<LlmError> for EasyApplyError {
    fn from(e: LlmError) -> Self {
        EasyApplyError::Agent(e.to_string())
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a response to the given prompt with optional system prompt
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse>;

    /// Check if the LLM service is available
    async fn health_check(&self) -> Result<bool>;

    /// Get the model name being used
    fn model_name(&self) -> &str;

    /// System prompt used when answering application questions.
    fn default_applicant_system_prompt(&self) -> &str {
        r#"You are helping a job applicant fill in an online application form.

Guidelines:
- Answer in the first person, as the applicant
- Keep answers short: two to four sentences unless the question asks for a number or a single word
- Use only facts present in the applicant context; never invent employers, degrees, or dates
- Be specific about the role and company when the question asks about motivation
- Do not add greetings, sign-offs, markdown, or quotation marks"#
    }

    /// Answer one application question given a rendered applicant context.
    ///
    /// Surrounding quotes and whitespace are stripped; an empty answer is an error.
    async fn answer_question(
        &self,
        question: &str,
        applicant_context: &str,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<String> {
        let prompt = format!(
            "APPLICANT CONTEXT:\n{}\n\nQUESTION: \"{}\"\n\nAnswer:",
            applicant_context, question
        );

        tracing::debug!(target: "llm.answer", %question, "requesting answer");
        let response = self
            .generate(
                &prompt,
                Some(self.default_applicant_system_prompt()),
                max_tokens,
                temperature,
            )
            .await?;

        let answer = response.text.trim().trim_matches('"').trim().to_string();
        if answer.is_empty() {
            return Err(LlmError::Empty.into());
        }
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canned(&'static str);

    #[async_trait]
    impl LlmClient for Canned {
        async fn generate(
            &self,
            prompt: &str,
            system_prompt: Option<&str>,
            _max_tokens: Option<u32>,
            _temperature: Option<f32>,
        ) -> Result<LlmResponse> {
            assert!(prompt.contains("QUESTION:"));
            assert!(system_prompt.is_some());
            Ok(LlmResponse {
                text: self.0.to_string(),
                model: None,
                tokens_used: None,
            })
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    #[tokio::test]
    async fn answer_is_trimmed_of_quotes() {
        let client = Canned("  \"I enjoy building reliable systems.\"\n");
        let answer = client
            .answer_question("Why this role?", "Name: Ada", None, None)
            .await
            .unwrap();
        assert_eq!(answer, "I enjoy building reliable systems.");
    }

    #[tokio::test]
    async fn blank_answer_is_an_agent_error() {
        let client = Canned("   ");
        let err = client
            .answer_question("Why this role?", "Name: Ada", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, EasyApplyError::Agent(_)));
    }
}
