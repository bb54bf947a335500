//! `OpenAI`-compatible chat-completions gateway provider.

use serde::{Deserialize, Serialize};

use super::VisionProvider;
use crate::AiError;

/// Provider for any `OpenAI`-compatible gateway with vision support.
pub struct GatewayProvider {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl GatewayProvider {
    /// Creates a new gateway provider. `base_url` is the API root without
    /// the `/chat/completions` suffix.
    #[must_use]
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            api_key,
            base_url,
            model,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: ChatContent<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum ChatContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Wraps a raw base64 payload as a data URI unless the caller already sent
/// one.
fn to_data_uri(image_base64: &str) -> String {
    if image_base64.starts_with("data:") {
        image_base64.to_string()
    } else {
        format!("data:image/jpeg;base64,{image_base64}")
    }
}

#[async_trait::async_trait]
impl VisionProvider for GatewayProvider {
    async fn analyze_image(
        &self,
        system_prompt: &str,
        user_text: &str,
        image_base64: &str,
    ) -> Result<String, AiError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: ChatContent::Text(system_prompt),
                },
                ChatMessage {
                    role: "user",
                    content: ChatContent::Parts(vec![
                        ContentPart::Text {
                            text: user_text.to_string(),
                        },
                        ContentPart::ImageUrl {
                            image_url: ImageUrl {
                                url: to_data_uri(image_base64),
                            },
                        },
                    ]),
                },
            ],
        };

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            log::error!("AI gateway error: {status} {body}");
            return Err(match status.as_u16() {
                429 => AiError::RateLimited,
                402 => AiError::CreditsExhausted,
                code => AiError::Gateway { status: code },
            });
        }

        let response: ChatResponse = resp.json().await?;
        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::to_data_uri;

    #[test]
    fn raw_base64_gains_data_uri_prefix() {
        assert_eq!(to_data_uri("aGVsbG8="), "data:image/jpeg;base64,aGVsbG8=");
    }

    #[test]
    fn existing_data_uri_passes_through() {
        let uri = "data:image/png;base64,aGVsbG8=";
        assert_eq!(to_data_uri(uri), uri);
    }
}
