mod client;
pub mod prompt_builder;
pub(crate) mod schema;
pub(crate) mod types;

pub use prompt_builder::{OpenAiOutputBuilder, OpenAiPromptBuilder};
pub use schema::StructuredOutput;

use crate::error::Result;
use crate::traits::{Agent, OutputBuilder, PromptBuilder};

use client::OpenAiClient;

#[derive(Clone)]
pub struct OpenAi {
    api_key: String,
    pub(crate) model: String,
    base_url: Option<String>,
}

impl OpenAi {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub(crate) fn client(&self) -> OpenAiClient {
        let client = OpenAiClient::new(&self.api_key);
        match self.base_url {
            Some(ref url) => client.with_base_url(url),
            None => client,
        }
    }

    /// Structured extraction in one call: system prompt, user prompt, typed result.
    pub async fn extract<T: StructuredOutput + Send + 'static>(
        &self,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> Result<T> {
        self.prompt(user_prompt)
            .preamble(system_prompt)
            .output::<T>()
            .send()
            .await
    }
}

impl Agent for OpenAi {
    type PromptBuilder = OpenAiPromptBuilder;

    fn prompt(&self, input: impl Into<String>) -> Self::PromptBuilder {
        OpenAiPromptBuilder::new(self.clone(), input.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_new() {
        let ai = OpenAi::new("sk-test", "gpt-4o");
        assert_eq!(ai.model(), "gpt-4o");
        assert!(ai.base_url.is_none());
    }

    #[test]
    fn test_with_base_url() {
        let ai = OpenAi::new("sk-test", "gpt-4o").with_base_url("http://localhost:9999/v1");
        assert_eq!(ai.base_url.as_deref(), Some("http://localhost:9999/v1"));
    }
}
