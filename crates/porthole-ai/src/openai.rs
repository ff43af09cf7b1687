use std::time::Duration;

use async_trait::async_trait;
use porthole_query::document_to_json;
use serde::Deserialize;

use crate::{AiError, Cost, GeneratedQuery, GenerateRequest, QueryGenerator};

const REQUEST_TIMEOUT_SECS: u64 = 30;
const MAX_SAMPLE_DOCS: usize = 5;

/// Query generator backed by an OpenAI-compatible chat-completions endpoint.
pub struct OpenAiGenerator {
    endpoint: String,
    api_key: String,
    model: String,
    /// USD per million prompt / completion tokens, for cost reporting.
    prompt_rate: f64,
    completion_rate: f64,
    client: reqwest::Client,
}

impl OpenAiGenerator {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, AiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AiError::Http(e.to_string()))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            prompt_rate: 0.0,
            completion_rate: 0.0,
            client,
        })
    }

    /// Set per-million-token USD rates used for the reported cost.
    pub fn with_rates(mut self, prompt_rate: f64, completion_rate: f64) -> Self {
        self.prompt_rate = prompt_rate;
        self.completion_rate = completion_rate;
        self
    }
}

/// Build the user prompt. Content stays minimal: the collection name, a few
/// sample documents for shape, the current time for relative phrases, and
/// the output contract.
fn build_prompt(request: &GenerateRequest) -> String {
    let mut prompt = String::new();
    prompt.push_str(&format!(
        "Write a MongoDB find filter as a single JSON object for the \
         collection \"{}\".\n",
        request.collection
    ));
    prompt.push_str(
        "Use {\"$date\": \"<ISO-8601>\"} for date values and \
         {\"$oid\": \"<hex>\"} for document ids.\n",
    );
    let now = request
        .now
        .try_to_rfc3339_string()
        .unwrap_or_else(|_| request.now.timestamp_millis().to_string());
    prompt.push_str(&format!("The current time is {now}.\n"));

    if !request.samples.is_empty() {
        prompt.push_str("Sample documents:\n");
        for sample in request.samples.iter().take(MAX_SAMPLE_DOCS) {
            prompt.push_str(&document_to_json(sample).to_string());
            prompt.push('\n');
        }
    }

    prompt.push_str(&format!("Request: {}\n", request.prompt));
    prompt.push_str("Answer with the JSON object only, no explanation.");
    prompt
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[async_trait]
impl QueryGenerator for OpenAiGenerator {
    async fn generate(&self, request: &GenerateRequest) -> Result<GeneratedQuery, AiError> {
        let model = request.model.as_deref().unwrap_or(&self.model);
        let body = serde_json::json!({
            "model": model,
            "messages": [{ "role": "user", "content": build_prompt(request) }],
            "temperature": 0,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AiError::Http(format!("{status}: {detail}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AiError::MalformedResponse(e.to_string()))?;

        let query_text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AiError::MalformedResponse("no choices in response".into()))?;

        let cost = parsed.usage.map(|u| Cost {
            total_cost: (u.prompt_tokens as f64 * self.prompt_rate
                + u.completion_tokens as f64 * self.completion_rate)
                / 1_000_000.0,
        });

        Ok(GeneratedQuery { query_text, cost })
    }
}
