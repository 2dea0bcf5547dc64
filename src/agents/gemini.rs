use crate::error::{KnowledgeError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request body for the `generateContent` endpoint
#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    #[serde(rename = "systemInstruction")]
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

/// Response from the `generateContent` endpoint
#[derive(Debug, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidatePart {
    #[serde(default)]
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenation of every text part of every candidate
    pub fn text(&self) -> String {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| p.text.as_deref())
            .collect()
    }
}

/// Minimal Gemini REST client
pub struct GeminiClient {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// Create a new client
    ///
    /// # Arguments
    ///
    /// * `api_base` - API root, e.g. `https://generativelanguage.googleapis.com/v1beta`
    /// * `api_key` - Google / Gemini API key
    /// * `model` - Model name (e.g., "gemini-2.0-flash")
    /// * `timeout` - Per-request timeout
    pub fn new(api_base: &str, api_key: String, model: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| KnowledgeError::ModelApi(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    /// Send one user turn under `instruction` and return the reply text
    pub async fn generate(&self, instruction: &str, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part { text: instruction }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: prompt }],
            }],
        };

        let start = std::time::Instant::now();
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| KnowledgeError::ModelApi(format!("Network error: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            return Err(KnowledgeError::ModelApi(format!(
                "Gemini API error {}: {}",
                status, body
            )));
        }

        let result: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| KnowledgeError::ModelApi(format!("Failed to parse response: {}", e)))?;

        log::debug!("Gemini call to {} took {:?}", self.model, start.elapsed());
        Ok(result.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_base: &str) -> GeminiClient {
        GeminiClient::new(
            api_base,
            "test-key".to_string(),
            "gemini-2.0-flash".to_string(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_endpoint() {
        let c = client("https://generativelanguage.googleapis.com/v1beta/");
        assert_eq!(
            c.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let request = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part { text: "be brief" }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: "Hello!" }],
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "be brief");
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Hello!");
    }

    #[test]
    fn test_response_text_concatenates_parts() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{
                "candidates": [
                    {"content": {"role": "model", "parts": [{"text": "Hello! "}, {"functionCall": {}}, {"text": "I am the agent."}]}},
                    {"finishReason": "SAFETY"}
                ],
                "usageMetadata": {"totalTokenCount": 12}
            }"#,
        )
        .unwrap();
        assert_eq!(response.text(), "Hello! I am the agent.");
    }

    #[test]
    fn test_empty_response_text() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response.text(), "");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_model_api_error() {
        let c = client("http://127.0.0.1:9");
        let err = c.generate("instruction", "prompt").await.unwrap_err();
        assert!(matches!(err, KnowledgeError::ModelApi(_)));
    }
}
