//! Vision provider abstraction.
//!
//! Classification talks to any `OpenAI`-compatible chat-completions
//! gateway that accepts image content, selected via environment variables.

pub mod gateway;

use crate::AiError;

/// Trait for vision-capable model providers.
#[async_trait::async_trait]
pub trait VisionProvider: Send + Sync {
    /// Sends one image with a text instruction and returns the model's raw
    /// text reply.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] if the request fails, including
    /// [`AiError::RateLimited`] and [`AiError::CreditsExhausted`] for the
    /// corresponding gateway statuses.
    async fn analyze_image(
        &self,
        system_prompt: &str,
        user_text: &str,
        image_base64: &str,
    ) -> Result<String, AiError>;
}

/// Creates a vision provider from environment variables.
///
/// * `AI_GATEWAY_API_KEY` — required bearer token.
/// * `AI_GATEWAY_URL` — chat-completions base, defaults to the Lovable
///   gateway.
/// * `AI_MODEL` — defaults to `google/gemini-2.5-flash`.
///
/// # Errors
///
/// Returns [`AiError::Config`] if no API key is set.
pub fn create_provider_from_env() -> Result<Box<dyn VisionProvider>, AiError> {
    let api_key = std::env::var("AI_GATEWAY_API_KEY").map_err(|_| AiError::Config {
        message: "AI_GATEWAY_API_KEY environment variable not set".to_string(),
    })?;
    let base_url = std::env::var("AI_GATEWAY_URL")
        .unwrap_or_else(|_| "https://ai.gateway.lovable.dev/v1".to_string());
    let model =
        std::env::var("AI_MODEL").unwrap_or_else(|_| "google/gemini-2.5-flash".to_string());

    log::info!("Using AI gateway at {base_url} with model {model}");
    Ok(Box::new(gateway::GatewayProvider::new(
        api_key, base_url, model,
    )))
}
