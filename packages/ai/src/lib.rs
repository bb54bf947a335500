#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! AI image classification for civic issue reports.
//!
//! A submitted photo is sent to a vision-capable model behind an
//! `OpenAI`-compatible gateway, which is asked for a strict JSON object
//! naming the issue category, a confidence score, and a short description.
//! The model's category suggestion is advisory only: the authoritative
//! priority always comes from the fixed category table in
//! [`aura_report_models::IssueCategory::default_priority`], never from
//! model output. A response that cannot be parsed degrades to a
//! conservative fallback classification instead of failing the request.

pub mod providers;
pub mod rate_limit;

use std::str::FromStr as _;

use aura_report_models::{IssueCategory, PriorityLevel};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while classifying an image.
#[derive(Debug, Error)]
pub enum AiError {
    /// HTTP request to the AI gateway failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The gateway rejected the request for quota reasons.
    #[error("AI gateway rate limit exceeded")]
    RateLimited,

    /// The gateway account has no credits left.
    #[error("AI credits exhausted")]
    CreditsExhausted,

    /// Any other gateway failure.
    #[error("AI gateway error: {status}")]
    Gateway {
        /// HTTP status returned by the gateway.
        status: u16,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Description.
        message: String,
    },
}

/// Maximum accepted image payload, in decoded bytes.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Estimates the decoded size of a base64 image payload without decoding
/// it. Base64 carries 3 bytes per 4 characters.
#[must_use]
pub const fn estimated_image_bytes(base64_len: usize) -> usize {
    base64_len * 3 / 4
}

/// A completed classification of a report photo.
///
/// `priority` is always derived from `category` via the fixed table, so a
/// model that hallucinates a priority cannot influence triage ordering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    /// The issue category the image was matched to.
    pub category: IssueCategory,
    /// Priority derived from the category table.
    pub priority: PriorityLevel,
    /// Model confidence, clamped to `0.0..=1.0`.
    pub confidence: f64,
    /// Short human-readable description of the issue.
    pub description: String,
    /// Why this priority level applies.
    pub severity_reason: String,
}

impl Classification {
    /// The conservative result used when the model's output cannot be
    /// parsed: the report is still created, but flagged for manual review.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            category: IssueCategory::Other,
            priority: IssueCategory::Other.default_priority(),
            confidence: 0.5,
            description: "Unable to analyze image. Please verify the issue type manually."
                .to_string(),
            severity_reason: "Manual verification required".to_string(),
        }
    }
}

/// What the model is asked to produce. Every field is optional so a
/// partially well-formed reply still yields a usable classification.
#[derive(Deserialize)]
struct RawClassification {
    category: Option<String>,
    confidence: Option<f64>,
    description: Option<String>,
    severity_reason: Option<String>,
}

/// Builds the system prompt, enumerating every category with its
/// definition so the model's vocabulary matches the taxonomy exactly.
#[must_use]
pub fn build_system_prompt() -> String {
    let names = IssueCategory::all()
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ");

    let mut prompt = format!(
        "You are an AI assistant for a civic issue reporting system in Pune, India.\n\
         Analyze the image and identify the type of urban sanitation/cleanliness issue.\n\
         \n\
         You MUST respond with a JSON object containing:\n\
         - category: One of: {names}\n\
         - confidence: A number between 0 and 1 indicating how confident you are\n\
         - description: A brief description of the issue (max 100 words)\n\
         - severity_reason: Why you assigned this priority level\n\
         \n\
         Category definitions:\n"
    );
    for category in IssueCategory::all() {
        prompt.push_str("- ");
        prompt.push_str(category.as_ref());
        prompt.push_str(": ");
        prompt.push_str(category.definition());
        prompt.push('\n');
    }
    prompt.push_str("\nIMPORTANT: Respond ONLY with valid JSON, no markdown, no extra text.");
    prompt
}

/// Parses the model's reply into a [`Classification`].
///
/// Tolerates markdown code fences around the JSON. An unknown category
/// maps to [`IssueCategory::Other`], confidence is clamped to `0.0..=1.0`,
/// and a reply that is not JSON at all yields
/// [`Classification::fallback`]. This function never fails: a bad model
/// reply must not lose the citizen's report.
#[must_use]
pub fn parse_classification(content: &str) -> Classification {
    let cleaned = content
        .replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string();

    let Ok(raw) = serde_json::from_str::<RawClassification>(&cleaned) else {
        log::error!("failed to parse model reply as JSON: {content}");
        return Classification::fallback();
    };

    let category = raw
        .category
        .as_deref()
        .and_then(|name| IssueCategory::from_str(name).ok())
        .unwrap_or(IssueCategory::Other);

    Classification {
        category,
        priority: category.default_priority(),
        confidence: raw.confidence.unwrap_or(0.5).clamp(0.0, 1.0),
        description: raw
            .description
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| "Issue detected".to_string()),
        severity_reason: raw
            .severity_reason
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| "Standard priority assigned".to_string()),
    }
}

/// Classifies a report photo: builds the prompt, queries the vision
/// provider, and parses the reply.
///
/// # Errors
///
/// Returns [`AiError`] when the gateway request itself fails
/// (including [`AiError::RateLimited`] and [`AiError::CreditsExhausted`]).
/// A gateway reply that arrives but cannot be parsed is NOT an error; it
/// degrades to [`Classification::fallback`].
pub async fn classify_image(
    provider: &dyn providers::VisionProvider,
    image_base64: &str,
) -> Result<Classification, AiError> {
    let system_prompt = build_system_prompt();
    let content = provider
        .analyze_image(
            &system_prompt,
            "Analyze this image and identify the civic/sanitation issue. Respond with JSON only.",
            image_base64,
        )
        .await?;
    Ok(parse_classification(&content))
}
