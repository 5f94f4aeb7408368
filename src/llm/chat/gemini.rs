use async_trait::async_trait;
use log::{ error, info };
use serde::{ Deserialize, Serialize };

use super::{ ChatBackend, ChatRequest, ChatTurn, GenerationError, TurnRole };
use crate::llm::{ LlmConfig, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL };

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent {
    role: TurnRole,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleResponse {
    #[serde(default)]
    candidates: Vec<GoogleCandidate>,
    prompt_feedback: Option<GooglePromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleCandidate {
    content: Option<GoogleContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GoogleContent {
    #[serde(default)]
    parts: Vec<GooglePart>,
}

#[derive(Deserialize)]
struct GooglePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GooglePromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct GoogleErrorEnvelope {
    error: GoogleError,
}

#[derive(Deserialize)]
struct GoogleError {
    message: Option<String>,
    status: Option<String>,
    #[serde(default)]
    details: Vec<GoogleErrorDetail>,
}

#[derive(Deserialize)]
struct GoogleErrorDetail {
    reason: Option<String>,
}

const SERVICE_DISABLED_MARKERS: [&str; 2] = ["SERVICE_DISABLED", "API has not been used"];
const INVALID_KEY_MARKERS: [&str; 2] = ["API key not valid", "INVALID_ARGUMENT"];

/// Maps an upstream failure description onto the error taxonomy. The text is
/// preserved verbatim when it matches no known condition.
pub fn classify_upstream(detail: impl Into<String>) -> GenerationError {
    let detail = detail.into();
    if SERVICE_DISABLED_MARKERS.iter().any(|m| detail.contains(m)) {
        GenerationError::ServiceNotEnabled
    } else if INVALID_KEY_MARKERS.iter().any(|m| detail.contains(m)) {
        GenerationError::InvalidCredential
    } else {
        GenerationError::Upstream(detail)
    }
}

/// Condenses an error response into `[<http status>] <status>: <message> (<reasons>)`,
/// falling back to the raw body when it is not a Google error envelope.
fn describe_error_body(http_status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<GoogleErrorEnvelope>(body) {
        Ok(envelope) => {
            let err = envelope.error;
            let mut detail = format!("[{}]", http_status);
            if let Some(status) = err.status {
                detail.push_str(&format!(" {}:", status));
            }
            detail.push(' ');
            detail.push_str(err.message.as_deref().unwrap_or("no error message"));
            let reasons: Vec<String> = err.details
                .into_iter()
                .filter_map(|d| d.reason)
                .collect();
            if !reasons.is_empty() {
                detail.push_str(&format!(" ({})", reasons.join(", ")));
            }
            detail
        }
        Err(_) => format!("[{}] {}", http_status, body.trim()),
    }
}

fn extract_reply(response: GoogleResponse) -> Result<String, GenerationError> {
    let candidate = match response.candidates.into_iter().next() {
        Some(c) => c,
        None => {
            let reason = response.prompt_feedback
                .and_then(|f| f.block_reason)
                .map(|r| format!("prompt was blocked ({})", r))
                .unwrap_or_else(|| "response contained no candidates".to_string());
            return Err(GenerationError::Upstream(reason));
        }
    };

    let text: String = candidate.content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    if text.is_empty() {
        if let Some(reason) = candidate.finish_reason.filter(|r| r != "STOP") {
            return Err(
                GenerationError::Upstream(format!("candidate finished without text ({})", reason))
            );
        }
    }
    Ok(text)
}

fn to_content(turn: &ChatTurn) -> GeminiContent {
    GeminiContent {
        role: turn.role,
        parts: vec![GeminiPart { text: turn.text.clone() }],
    }
}

fn build_payload(request: &ChatRequest) -> GenerateContentRequest {
    let mut contents: Vec<GeminiContent> = request.history.iter().map(to_content).collect();
    contents.push(to_content(&ChatTurn::user(request.prompt.clone())));
    GenerateContentRequest {
        contents,
        generation_config: GeminiGenerationConfig {
            temperature: request.config.temperature,
            max_output_tokens: request.config.max_output_tokens,
        },
    }
}

/// `generateContent` client for the Gemini REST API.
pub struct GeminiChatClient {
    client: reqwest::Client,
    model: String,
    base_url: String,
}

impl GeminiChatClient {
    pub fn new(
        model: Option<String>,
        base_url: Option<String>,
        timeout: std::time::Duration
    ) -> Result<Self, GenerationError> {
        let chat_model = model.unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let client = reqwest::Client
            ::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Upstream(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            model: chat_model,
            base_url,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, GenerationError> {
        Self::new(config.completion_model.clone(), config.base_url.clone(), config.timeout)
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl ChatBackend for GeminiChatClient {
    async fn send_chat(
        &self,
        credential: &str,
        request: &ChatRequest
    ) -> Result<String, GenerationError> {
        let url = self.endpoint();
        info!(
            "GeminiChatClient::send_chat() → model={} base_url={} history_turns={}",
            self.model,
            self.base_url,
            request.history.len()
        );

        let response = self.client
            .post(&url)
            .header("x-goog-api-key", credential)
            .json(&build_payload(request))
            .send().await
            .map_err(|e| {
                error!("API Request Error: {}", e);
                GenerationError::Upstream(format!("request to {} failed: {}", self.base_url, e))
            })?;

        let status = response.status();
        let body = response
            .text().await
            .map_err(|e| {
                error!("Failed to read Gemini response body: {}", e);
                GenerationError::Upstream(format!("failed to read response body: {}", e))
            })?;

        if !status.is_success() {
            let detail = describe_error_body(status, &body);
            error!("API Request Error: {}", detail);
            return Err(classify_upstream(detail));
        }

        let parsed: GoogleResponse = serde_json
            ::from_str(&body)
            .map_err(|e| GenerationError::Upstream(format!("failed to parse response: {}", e)))?;
        extract_reply(parsed)
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::chat::GenerationConfig;
    use reqwest::StatusCode;
    use serde_json::json;

    #[test]
    fn service_disabled_takes_precedence() {
        let err = classify_upstream(
            "[403 Forbidden] PERMISSION_DENIED: Generative Language API has not been used in project 1 (SERVICE_DISABLED)"
        );
        assert_eq!(err, GenerationError::ServiceNotEnabled);
    }

    #[test]
    fn invalid_key_is_recognised() {
        let err = classify_upstream(
            "[400 Bad Request] INVALID_ARGUMENT: API key not valid. Please pass a valid API key."
        );
        assert_eq!(err, GenerationError::InvalidCredential);
        assert_eq!(classify_upstream("API key not valid"), GenerationError::InvalidCredential);
    }

    #[test]
    fn other_failures_keep_original_text() {
        let raw = "[429 Too Many Requests] RESOURCE_EXHAUSTED: Resource has been exhausted";
        let err = classify_upstream(raw);
        assert_eq!(err, GenerationError::Upstream(raw.to_string()));
        assert!(err.to_string().contains(raw));
        assert!(err.to_string().starts_with("Gemini API error: "));
    }

    #[test]
    fn error_envelope_is_condensed() {
        let body =
            json!({
            "error": {
                "code": 403,
                "message": "Generative Language API has not been used in project 42",
                "status": "PERMISSION_DENIED",
                "details": [{ "@type": "type.googleapis.com/google.rpc.ErrorInfo", "reason": "SERVICE_DISABLED" }]
            }
        }).to_string();
        let detail = describe_error_body(StatusCode::FORBIDDEN, &body);
        assert_eq!(
            detail,
            "[403 Forbidden] PERMISSION_DENIED: Generative Language API has not been used in project 42 (SERVICE_DISABLED)"
        );
    }

    #[test]
    fn non_json_error_body_is_kept_raw() {
        let detail = describe_error_body(StatusCode::BAD_GATEWAY, "upstream connect error\n");
        assert_eq!(detail, "[502 Bad Gateway] upstream connect error");
    }

    #[test]
    fn payload_puts_prompt_after_history() {
        let request = ChatRequest {
            history: vec![ChatTurn::user("A"), ChatTurn::model("B")],
            prompt: "C".to_string(),
            config: GenerationConfig::default(),
        };
        let encoded = serde_json::to_string(&build_payload(&request)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(
            value,
            json!({
                "contents": [
                    { "role": "user", "parts": [{ "text": "A" }] },
                    { "role": "model", "parts": [{ "text": "B" }] },
                    { "role": "user", "parts": [{ "text": "C" }] }
                ],
                "generationConfig": { "temperature": 0.7, "maxOutputTokens": 2048 }
            })
        );
    }

    #[test]
    fn reply_joins_candidate_parts() {
        let response: GoogleResponse = serde_json
            ::from_value(
                json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": "I'm " }, { "text": "well." }] },
                    "finishReason": "STOP"
                }]
            })
            )
            .unwrap();
        assert_eq!(extract_reply(response).unwrap(), "I'm well.");
    }

    #[test]
    fn blocked_prompt_is_an_upstream_error() {
        let response: GoogleResponse = serde_json
            ::from_value(json!({ "promptFeedback": { "blockReason": "SAFETY" } }))
            .unwrap();
        match extract_reply(response) {
            Err(GenerationError::Upstream(msg)) => assert!(msg.contains("SAFETY")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let client = GeminiChatClient::new(
            Some("gemini-test".into()),
            Some("http://localhost:9/".into()),
            std::time::Duration::from_secs(1)
        ).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:9/v1beta/models/gemini-test:generateContent");
        assert_eq!(client.get_model(), "gemini-test");
    }
}
