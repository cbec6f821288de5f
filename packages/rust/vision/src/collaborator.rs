//! HTTP collaborators: the vision-capable chat endpoint used for scoring and
//! refinement, and the screenshot service used to rasterize candidates.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use stylepress_shared::{CollaboratorConfig, Result, StylePressError, ValidationResult};

use crate::{PageRenderer, StyleRefiner, VisionScorer};

/// User-Agent string for collaborator requests.
const USER_AGENT: &str = concat!("StylePress/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Chat collaborator
// ---------------------------------------------------------------------------

/// Client for an OpenAI-compatible vision chat endpoint.
#[derive(Debug, Clone)]
pub struct Collaborator {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl Collaborator {
    /// Build from config, reading the API key from the configured env var.
    pub fn from_config(config: &CollaboratorConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            StylePressError::config(format!(
                "collaborator API key not found. Set the {} environment variable.",
                config.api_key_env
            ))
        })?;
        if api_key.is_empty() {
            return Err(StylePressError::config(format!(
                "collaborator API key env var {} is empty",
                config.api_key_env
            )));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StylePressError::Collaborator(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
        })
    }

    /// Send one prompt with zero or more PNG attachments; return the reply
    /// text.
    #[instrument(skip_all, fields(model = %self.model, images = images.len()))]
    pub async fn complete(&self, prompt: &str, images: &[&[u8]]) -> Result<String> {
        let mut content = vec![serde_json::json!({ "type": "text", "text": prompt })];
        for image in images {
            content.push(serde_json::json!({
                "type": "image_url",
                "image_url": {
                    "url": format!("data:image/png;base64,{}", BASE64.encode(image)),
                },
            }));
        }

        let body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": content }],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| StylePressError::Collaborator(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(StylePressError::Collaborator(format!(
                "endpoint returned {status}: {detail}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| StylePressError::Collaborator(format!("malformed response: {e}")))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| StylePressError::Collaborator("response had no choices".into()))?;

        debug!(chars = text.len(), "collaborator replied");
        Ok(text)
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

const SCORE_PROMPT: &str = "\
You are comparing two page screenshots. The first is the brand reference, the \
second is a styled article page. Score how well the article page matches the \
reference on each dimension, 0-100. Reply with JSON only:\n\
{\"color_match\": n, \"typography_match\": n, \"spacing_match\": n, \
\"visual_depth\": n, \"brand_fit\": n, \"layout_sophistication\": n, \
\"notes\": \"...\", \"fixes\": [\"one concrete CSS change each\"]}";

/// [`VisionScorer`] over the chat collaborator.
#[derive(Debug, Clone)]
pub struct HttpVisionScorer {
    collaborator: Collaborator,
}

impl HttpVisionScorer {
    pub fn new(collaborator: Collaborator) -> Self {
        Self { collaborator }
    }
}

#[async_trait]
impl VisionScorer for HttpVisionScorer {
    async fn score(&self, reference_png: &[u8], candidate_png: &[u8]) -> Result<ValidationResult> {
        let reply = self
            .collaborator
            .complete(SCORE_PROMPT, &[reference_png, candidate_png])
            .await?;
        parse_score_reply(&reply)
    }
}

/// Extract the JSON object from a scorer reply that may carry fences or
/// surrounding prose.
fn parse_score_reply(reply: &str) -> Result<ValidationResult> {
    let start = reply.find('{').ok_or_else(|| {
        StylePressError::Collaborator("scorer reply contained no JSON object".into())
    })?;
    let end = reply.rfind('}').ok_or_else(|| {
        StylePressError::Collaborator("scorer reply contained no JSON object".into())
    })?;
    serde_json::from_str(&reply[start..=end])
        .map_err(|e| StylePressError::Collaborator(format!("unparseable score JSON: {e}")))
}

// ---------------------------------------------------------------------------
// Refinement
// ---------------------------------------------------------------------------

/// [`StyleRefiner`] over the chat collaborator.
#[derive(Debug, Clone)]
pub struct HttpStyleRefiner {
    collaborator: Collaborator,
    max_stylesheet_chars: usize,
}

impl HttpStyleRefiner {
    pub fn new(collaborator: Collaborator, max_stylesheet_chars: usize) -> Self {
        Self {
            collaborator,
            max_stylesheet_chars,
        }
    }
}

#[async_trait]
impl StyleRefiner for HttpStyleRefiner {
    async fn refine(&self, stylesheet: &str, validation: &ValidationResult) -> Result<String> {
        let truncated: String = stylesheet.chars().take(self.max_stylesheet_chars).collect();
        let fixes = if validation.fixes.is_empty() {
            "- improve overall fidelity to the reference".to_string()
        } else {
            validation
                .fixes
                .iter()
                .map(|f| format!("- {f}"))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let prompt = format!(
            "Rewrite this stylesheet to address the fixes below. Keep every \
             selector that exists, change values only where the fixes call for \
             it, and reference only the custom properties already defined in \
             :root. Reply with the complete stylesheet and nothing else.\n\n\
             Observations: {notes}\n\nFixes:\n{fixes}\n\nStylesheet:\n{truncated}",
            notes = validation.notes,
        );

        self.collaborator.complete(&prompt, &[]).await
    }
}

// ---------------------------------------------------------------------------
// Screenshot service
// ---------------------------------------------------------------------------

/// [`PageRenderer`] backed by a headless-browser screenshot service that
/// accepts `{html, css}` and returns PNG bytes.
#[derive(Debug, Clone)]
pub struct ScreenshotService {
    client: Client,
    endpoint: String,
}

impl ScreenshotService {
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| StylePressError::Collaborator(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl PageRenderer for ScreenshotService {
    #[instrument(skip_all, fields(endpoint = %self.endpoint))]
    async fn screenshot(&self, markup: &str, stylesheet: &str) -> Result<Vec<u8>> {
        let body = serde_json::json!({ "html": markup, "css": stylesheet });
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| StylePressError::Collaborator(format!("screenshot request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StylePressError::Collaborator(format!(
                "screenshot service returned {status}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StylePressError::Collaborator(format!("screenshot body unreadable: {e}")))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_reply_with_fences_parses() {
        let reply = "Here are the scores:\n```json\n{\"color_match\": 82, \
                     \"typography_match\": 74, \"spacing_match\": 90, \
                     \"visual_depth\": 60, \"brand_fit\": 78, \
                     \"layout_sophistication\": 70, \"notes\": \"flat\", \
                     \"fixes\": [\"add shadow to cards\"]}\n```";
        let result = parse_score_reply(reply).expect("parses");
        assert_eq!(result.color_match, 82.0);
        assert_eq!(result.fixes, vec!["add shadow to cards".to_string()]);
        assert!((result.overall() - 75.666).abs() < 0.01);
    }

    #[test]
    fn score_reply_without_json_is_an_error() {
        let err = parse_score_reply("I cannot compare these images.").unwrap_err();
        assert!(matches!(err, StylePressError::Collaborator(_)));
    }

    #[test]
    fn missing_dimensions_default_to_zero_is_rejected() {
        // serde requires all six dimensions; a partial object is malformed.
        let err = parse_score_reply("{\"color_match\": 80}").unwrap_err();
        assert!(err.to_string().contains("unparseable"));
    }
}
