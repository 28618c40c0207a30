use async_trait::async_trait;

use crate::error::Result;

pub trait Agent: Clone + Send + Sync {
    type PromptBuilder: PromptBuilder;

    fn prompt(&self, input: impl Into<String>) -> Self::PromptBuilder;
}

/// Request options shared by every provider's prompt builder.
pub trait PromptBuilder: Send + Sized {
    fn preamble(self, preamble: impl Into<String>) -> Self;
    fn temperature(self, temperature: f32) -> Self;
}

/// Sends the prompt with the response constrained to `T`'s JSON schema and
/// deserializes the reply into it.
#[async_trait]
pub trait OutputBuilder<T>: Send {
    async fn send(self) -> Result<T>;
}
