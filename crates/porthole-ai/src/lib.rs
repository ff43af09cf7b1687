//! Natural-language-to-query generation boundary.
//!
//! The generator is an untrusted collaborator: it returns candidate query
//! text that callers must re-validate through `porthole_query::parse_query`
//! before use. Nothing here executes queries.

mod openai;

use async_trait::async_trait;
use bson::Document;

pub use openai::OpenAiGenerator;

/// Inputs for one generation attempt. Sample documents give the model the
/// collection's shape; the timestamp anchors relative phrases like
/// "last week".
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub collection: String,
    pub prompt: String,
    pub samples: Vec<Document>,
    pub now: bson::DateTime,
    pub model: Option<String>,
}

/// A candidate query string plus what producing it cost.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedQuery {
    pub query_text: String,
    pub cost: Option<Cost>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cost {
    /// Total cost in USD for the request.
    pub total_cost: f64,
}

#[derive(Debug)]
pub enum AiError {
    /// Transport-level failure talking to the model endpoint.
    Http(String),
    /// The endpoint answered but not in the shape we expect.
    MalformedResponse(String),
}

impl std::fmt::Display for AiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AiError::Http(msg) => write!(f, "ai request failed: {msg}"),
            AiError::MalformedResponse(msg) => write!(f, "malformed ai response: {msg}"),
        }
    }
}

impl std::error::Error for AiError {}

/// Produces candidate query text from a natural-language description.
#[async_trait]
pub trait QueryGenerator: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> Result<GeneratedQuery, AiError>;
}
