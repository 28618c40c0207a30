use std::marker::PhantomData;

use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;
use crate::traits::{OutputBuilder, PromptBuilder};

use super::schema::StructuredOutput;
use super::types::*;
use super::OpenAi;

pub struct OpenAiPromptBuilder {
    agent: OpenAi,
    input: String,
    preamble: Option<String>,
    temperature: Option<f32>,
}

impl OpenAiPromptBuilder {
    pub(crate) fn new(agent: OpenAi, input: String) -> Self {
        Self {
            agent,
            input,
            preamble: None,
            temperature: None,
        }
    }

    /// Constrain the reply to `T`'s schema.
    pub fn output<T: StructuredOutput + Send + 'static>(self) -> OpenAiOutputBuilder<T> {
        OpenAiOutputBuilder {
            builder: self,
            _phantom: PhantomData,
        }
    }

    fn wire_messages(&self) -> Vec<WireMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(ref preamble) = self.preamble {
            messages.push(WireMessage::system(preamble));
        }
        messages.push(WireMessage::user(&self.input));
        messages
    }
}

impl PromptBuilder for OpenAiPromptBuilder {
    fn preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = Some(preamble.into());
        self
    }

    fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

pub struct OpenAiOutputBuilder<T> {
    builder: OpenAiPromptBuilder,
    _phantom: PhantomData<T>,
}

#[async_trait]
impl<T: StructuredOutput + Send + 'static> OutputBuilder<T> for OpenAiOutputBuilder<T> {
    async fn send(self) -> Result<T> {
        let model = &self.builder.agent.model;
        debug!(model = %model, type_name = T::type_name(), "Structured output request");

        let temperature = if accepts_temperature(model) {
            Some(self.builder.temperature.unwrap_or(0.0))
        } else {
            None
        };

        let request = StructuredRequest {
            model: model.clone(),
            messages: self.builder.wire_messages(),
            temperature,
            response_format: ResponseFormat::strict_schema("structured_response", T::openai_schema()),
        };

        let json_str = self.builder.agent.client().structured_output(&request).await?;

        Ok(serde_json::from_str(crate::util::strip_code_blocks(&json_str))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Agent;

    #[test]
    fn preamble_precedes_input() {
        let builder = OpenAi::new("sk-test", "gpt-4o")
            .prompt("page text")
            .preamble("extract links");

        let messages = serde_json::to_value(builder.wire_messages()).unwrap();
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[0]["content"], "extract links");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "page text");
    }

    #[test]
    fn input_alone_is_a_single_user_message() {
        let builder = OpenAi::new("sk-test", "gpt-4o").prompt("page text");
        assert_eq!(builder.wire_messages().len(), 1);
    }
}
