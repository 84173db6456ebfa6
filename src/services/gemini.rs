use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};
use crate::services::http::HttpClient;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [TextPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

impl<'a> Content<'a> {
    const fn text(text: &'a str) -> Self {
        Self {
            parts: [TextPart { text }],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Generated reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeminiReply {
    pub text: String,
}

/// Text generation through the Generative Language API
pub struct Gemini {
    client: HttpClient,
    model: String,
    default_key: Option<String>,
}

impl Gemini {
    pub fn new(client: HttpClient, model: impl Into<String>, default_key: Option<String>) -> Self {
        Self {
            client,
            model: model.into(),
            default_key: default_key.filter(|key| !key.trim().is_empty()),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Caller key, else the configured one
    pub fn resolve_key<'a>(&'a self, supplied: Option<&'a str>) -> Result<&'a str> {
        supplied
            .filter(|key| !key.is_empty())
            .or(self.default_key.as_deref())
            .ok_or_else(|| GatewayError::validation("Parameter apikey is required"))
    }

    pub async fn generate(&self, text: &str, system: Option<&str>, api_key: &str) -> Result<GeminiReply> {
        let body = GenerateContentRequest {
            contents: [Content::text(text)],
            system_instruction: system.map(Content::text),
        };

        let response: GenerateContentResponse = self
            .client
            .post_json(
                &format!("/models/{}:generateContent", self.model),
                &body,
                &[("x-goog-api-key", api_key)],
            )
            .await?;

        let text: String = response
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect();

        if text.is_empty() {
            let reason = response
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .map_or_else(|| "Empty response from Gemini".to_string(), |r| format!("Prompt blocked: {r}"));
            return Err(GatewayError::upstream("gemini", reason));
        }

        Ok(GeminiReply { text })
    }
}
