use ai_client::{Agent, OpenAi, OutputBuilder, PromptBuilder};
use anyhow::Result;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::traits::UrlExtractor;

/// Upper bound on text sent to the model.
const MAX_INPUT_BYTES: usize = 100_000;

const PROMPT_TEMPLATE: &str = "You are an expert web data extractor. Your task is to extract all valid URLs from the following fetched data. Return them as an array of strings.

Fetched Data:
{{fetched_data}}";

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtractUrlsInput {
    /// The data fetched from the URL.
    pub fetched_data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtractUrlsOutput {
    /// An array of URLs extracted from the fetched data.
    pub urls: Vec<String>,
}

pub fn render_prompt(input: &ExtractUrlsInput) -> String {
    let data = ai_client::truncate_to_char_boundary(&input.fetched_data, MAX_INPUT_BYTES);
    PROMPT_TEMPLATE.replace("{{fetched_data}}", data)
}

pub struct OpenAiUrlExtractor {
    ai: OpenAi,
}

impl OpenAiUrlExtractor {
    pub fn new(ai: OpenAi) -> Self {
        Self { ai }
    }

    pub async fn run(&self, input: ExtractUrlsInput) -> Result<ExtractUrlsOutput> {
        let output = self
            .ai
            .prompt(render_prompt(&input))
            .temperature(0.0)
            .output::<ExtractUrlsOutput>()
            .send()
            .await?;

        info!(model = self.ai.model(), count = output.urls.len(), "Extracted URLs");
        Ok(output)
    }
}

#[async_trait]
impl UrlExtractor for OpenAiUrlExtractor {
    async fn extract_urls(&self, fetched_data: &str) -> Result<Vec<String>> {
        let output = self
            .run(ExtractUrlsInput {
                fetched_data: fetched_data.to_string(),
            })
            .await?;
        Ok(output.urls)
    }
}
