//! Suggestion engine client for a hosted `generateContent` endpoint.
//!
//! One suggestion is one blocking HTTPS POST: the prompt goes out as a single
//! text part, the first candidate's first text part comes back verbatim.
//! There is no streaming and no retry; the caller decides what to do with a
//! failure.

use crate::core::settings::GenerationSettings;
use crate::core::suggestion::SuggestionKind;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Why a suggestion could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// The request never got a response (DNS, TLS, timeout, reset...).
    #[error("Failed to reach the generation service: {0}")]
    Transport(String),

    /// The endpoint answered with a non-success status.
    #[error("{message}")]
    Endpoint { status: u16, message: String },

    /// The endpoint answered successfully but without candidate text.
    #[error("The generation service returned no suggestion")]
    MissingCandidate,

    /// The success body was not the expected JSON shape.
    #[error("Unreadable response from the generation service: {0}")]
    InvalidResponse(String),

    /// The client is missing a credential or could not be built.
    #[error("Generation service is not configured: {0}")]
    NotConfigured(String),
}

/// Produces suggestion text for a note body.
///
/// Implementations must be stateless with respect to the editor: they never
/// touch session state, the caller applies the result.
pub trait SuggestionEngine: Send + Sync {
    fn generate(&self, kind: SuggestionKind, content: &str) -> Result<String, GenerationError>;
}

/// Extra instructions for refinement prompts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptOptions {
    /// Desired tone such as `professional` or `casual`.
    pub tone: Option<String>,
    /// Upper bound on the refined text, in characters.
    pub max_length: Option<usize>,
}

/// Builds the instruction sent for `kind`, embedding `content` verbatim.
pub fn build_prompt(kind: SuggestionKind, content: &str, options: &PromptOptions) -> String {
    match kind {
        SuggestionKind::RefineText => {
            let mut extra = String::new();
            if let Some(tone) = options.tone.as_deref().filter(|t| !t.trim().is_empty()) {
                extra.push_str(&format!(" Adopt a {} tone.", tone.trim()));
            }
            if let Some(max) = options.max_length {
                extra.push_str(&format!(" Keep the refined note under {max} characters."));
            }
            format!(
                "You are a world-class editor. Refine the following note to improve its clarity, \
                 style, and grammar, while preserving the core meaning. Do not add any new \
                 information.{extra} ORIGINAL NOTE: {content} REFINED NOTE:"
            )
        }
        SuggestionKind::GenerateTitle => format!(
            "Based on the following note, generate a single, short, and compelling title. Do not \
             add any extra text or quotation marks. NOTE: {content} TITLE:"
        ),
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

impl GenerateRequest {
    fn from_prompt(prompt: String) -> Self {
        Self {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
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
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Maps an HTTP status and body to suggestion text or a [`GenerationError`].
pub fn interpret_response(status: u16, body: &str) -> Result<String, GenerationError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<ErrorEnvelope>(body)
            .ok()
            .and_then(|env| env.error)
            .and_then(|err| err.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("HTTP error! Status: {status}"));
        return Err(GenerationError::Endpoint { status, message });
    }

    let parsed: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

    parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or(GenerationError::MissingCandidate)
}

/// [`SuggestionEngine`] backed by the Gemini `generateContent` REST API.
pub struct GeminiClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: String,
    options: PromptOptions,
}

impl GeminiClient {
    /// Default API root.
    pub const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com/v1beta";
    /// Default model name.
    pub const DEFAULT_MODEL: &'static str = "gemini-1.5-flash";

    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GenerationError::NotConfigured("missing API key".to_string()));
        }

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::NotConfigured(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            options: PromptOptions::default(),
        })
    }

    /// Builds a client from persisted settings, including prompt options.
    pub fn from_settings(settings: &GenerationSettings) -> Result<Self, GenerationError> {
        let api_key = settings.api_key.clone().unwrap_or_default();
        let client = Self::new(
            settings.base_url.clone(),
            settings.model.clone(),
            api_key,
            Duration::from_secs(settings.timeout_secs),
        )?;
        Ok(client.with_prompt_options(PromptOptions {
            tone: settings.tone.clone(),
            max_length: settings.max_length,
        }))
    }

    pub fn with_prompt_options(mut self, options: PromptOptions) -> Self {
        self.options = options;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }
}

impl SuggestionEngine for GeminiClient {
    fn generate(&self, kind: SuggestionKind, content: &str) -> Result<String, GenerationError> {
        let prompt = build_prompt(kind, content, &self.options);
        log::info!("requesting {kind} suggestion from {}", self.model);

        let response = self
            .http
            .post(self.endpoint_url())
            .json(&GenerateRequest::from_prompt(prompt))
            .send()
            // The URL carries the key; keep it out of the message.
            .map_err(|e| GenerationError::Transport(e.without_url().to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| GenerationError::Transport(e.without_url().to_string()))?;

        interpret_response(status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL_PATH: &str = "/models/gemini-1.5-flash:generateContent";

    fn client_for(server: &MockServer) -> GeminiClient {
        GeminiClient::new(
            server.uri(),
            GeminiClient::DEFAULT_MODEL,
            "test-key",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn candidate_body(text: &str) -> serde_json::Value {
        json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }], "role": "model" },
                "finishReason": "STOP"
            }]
        })
    }

    #[test]
    fn test_title_prompt_embeds_content() {
        let prompt = build_prompt(
            SuggestionKind::GenerateTitle,
            "Meeting notes about Q3",
            &PromptOptions::default(),
        );
        assert!(prompt.contains("NOTE: Meeting notes about Q3 TITLE:"));
        assert!(prompt.contains("single, short, and compelling title"));
    }

    #[test]
    fn test_refine_prompt_embeds_markup_verbatim() {
        let content = "<p>teh <b>draft</b></p>";
        let prompt = build_prompt(SuggestionKind::RefineText, content, &PromptOptions::default());
        assert!(prompt.contains("ORIGINAL NOTE: <p>teh <b>draft</b></p> REFINED NOTE:"));
        assert!(!prompt.contains("tone"));
    }

    #[test]
    fn test_refine_prompt_options() {
        let options = PromptOptions {
            tone: Some("casual".to_string()),
            max_length: Some(280),
        };
        let prompt = build_prompt(SuggestionKind::RefineText, "x", &options);
        assert!(prompt.contains("Adopt a casual tone."));
        assert!(prompt.contains("under 280 characters"));
    }

    #[test]
    fn test_interpret_success_returns_first_candidate_verbatim() {
        let body = json!({
            "candidates": [
                { "content": { "parts": [{ "text": "<p>First</p>\n" }, { "text": "ignored" }] } },
                { "content": { "parts": [{ "text": "Second" }] } }
            ]
        })
        .to_string();
        assert_eq!(interpret_response(200, &body).unwrap(), "<p>First</p>\n");
    }

    #[test]
    fn test_interpret_error_uses_endpoint_message() {
        let body = json!({ "error": { "code": 400, "message": "API key not valid." } }).to_string();
        assert_eq!(
            interpret_response(400, &body),
            Err(GenerationError::Endpoint {
                status: 400,
                message: "API key not valid.".to_string()
            })
        );
    }

    #[test]
    fn test_interpret_error_without_message_is_generic() {
        let err = interpret_response(502, "<html>Bad Gateway</html>").unwrap_err();
        assert_eq!(err.to_string(), "HTTP error! Status: 502");
    }

    #[test]
    fn test_interpret_missing_candidate() {
        assert_eq!(
            interpret_response(200, r#"{"candidates":[]}"#),
            Err(GenerationError::MissingCandidate)
        );
        assert_eq!(
            interpret_response(200, r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#),
            Err(GenerationError::MissingCandidate)
        );
        assert_eq!(
            interpret_response(200, r#"{"candidates":[{"finishReason":"SAFETY"}]}"#),
            Err(GenerationError::MissingCandidate)
        );
    }

    #[test]
    fn test_interpret_invalid_json() {
        assert!(matches!(
            interpret_response(200, "not json"),
            Err(GenerationError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_missing_api_key_is_not_configured() {
        let settings = GenerationSettings {
            api_key: None,
            ..GenerationSettings::default()
        };
        assert!(matches!(
            GeminiClient::from_settings(&settings),
            Err(GenerationError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_endpoint_url_carries_model_and_key() {
        let client = GeminiClient::new(
            "https://example.test/v1beta/",
            "gemini-1.5-flash",
            "abc",
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            client.endpoint_url(),
            "https://example.test/v1beta/models/gemini-1.5-flash:generateContent?key=abc"
        );
    }

    #[test]
    fn test_generate_posts_single_prompt_part() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let server = rt.block_on(MockServer::start());
        let expected_prompt = build_prompt(
            SuggestionKind::GenerateTitle,
            "Meeting notes about Q3",
            &PromptOptions::default(),
        );
        rt.block_on(
            Mock::given(method("POST"))
                .and(path(MODEL_PATH))
                .and(query_param("key", "test-key"))
                .and(body_json(json!({ "contents": [{ "parts": [{ "text": expected_prompt }] }] })))
                .respond_with(ResponseTemplate::new(200).set_body_json(candidate_body("Q3 Meeting Recap")))
                .expect(1)
                .mount(&server),
        );

        let text = client_for(&server)
            .generate(SuggestionKind::GenerateTitle, "Meeting notes about Q3")
            .unwrap();
        assert_eq!(text, "Q3 Meeting Recap");
    }

    #[test]
    fn test_generate_surfaces_server_error() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let server = rt.block_on(MockServer::start());
        rt.block_on(
            Mock::given(method("POST"))
                .and(path(MODEL_PATH))
                .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                    "error": { "code": 500, "message": "Internal error encountered.", "status": "INTERNAL" }
                })))
                .expect(1)
                .mount(&server),
        );

        let err = client_for(&server)
            .generate(SuggestionKind::RefineText, "<p>draft</p>")
            .unwrap_err();
        assert_eq!(
            err,
            GenerationError::Endpoint {
                status: 500,
                message: "Internal error encountered.".to_string()
            }
        );
    }

    #[test]
    fn test_generate_transport_failure() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = GeminiClient::new(
            format!("http://127.0.0.1:{port}"),
            "m",
            "secret-key",
            Duration::from_secs(2),
        )
        .unwrap();

        let err = client.generate(SuggestionKind::GenerateTitle, "x").unwrap_err();
        match err {
            GenerationError::Transport(msg) => assert!(!msg.contains("secret-key")),
            other => panic!("expected transport error, got {other:?}"),
        }
    }
}
