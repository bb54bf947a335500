#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the civic issue server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the core report entity to allow independent evolution of the API
//! contract — in particular, reporter contact details never cross this
//! boundary.

use aura_ai::Classification;
use aura_report_models::{IssueCategory, PriorityLevel, Report, ReportStatus};
use aura_store::ReportQuery;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A civic issue report as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiReport {
    /// Unique report ID.
    pub id: String,
    /// Issue category.
    pub category: IssueCategory,
    /// Priority level name.
    pub priority: PriorityLevel,
    /// Priority numeric value (1-4).
    pub priority_value: u8,
    /// Lifecycle status.
    pub status: ReportStatus,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// Street address or landmark.
    pub address: String,
    /// When the report was filed (ISO 8601).
    pub created_at: DateTime<Utc>,
    /// When the report was resolved, if it is resolved.
    pub resolved_at: Option<DateTime<Utc>>,
    /// AI-generated description of the issue.
    pub ai_description: Option<String>,
    /// AI classification confidence (0-1).
    pub ai_confidence: Option<f64>,
    /// Photo taken when the issue was reported.
    pub before_image_url: Option<String>,
    /// Photo taken after cleanup.
    pub after_image_url: Option<String>,
    /// Whether the reporting citizen confirmed the cleanup.
    pub citizen_verified: Option<bool>,
    /// Free-text citizen feedback.
    pub citizen_feedback: Option<String>,
}

impl From<Report> for ApiReport {
    fn from(report: Report) -> Self {
        Self {
            id: report.id,
            category: report.category,
            priority: report.priority,
            priority_value: report.priority.value(),
            status: report.status,
            latitude: report.latitude,
            longitude: report.longitude,
            address: report.address,
            created_at: report.created_at,
            resolved_at: report.resolved_at,
            ai_description: report.ai_description,
            ai_confidence: report.ai_confidence,
            before_image_url: report.before_image_url,
            after_image_url: report.after_image_url,
            citizen_verified: report.citizen_verified,
            citizen_feedback: report.citizen_feedback,
        }
    }
}

/// Query parameters for the reports endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQueryParams {
    /// Keep only reports with this status.
    pub status: Option<ReportStatus>,
    /// Keep only reports at or above this priority (1-4 or name).
    pub min_priority: Option<PriorityLevel>,
    /// Order by creation time, newest first.
    pub recent: Option<bool>,
    /// Maximum number of results.
    pub limit: Option<usize>,
}

impl From<&ReportQueryParams> for ReportQuery {
    fn from(params: &ReportQueryParams) -> Self {
        Self {
            status: params.status,
            min_priority: params.min_priority,
            recent_first: params.recent.unwrap_or(false),
            limit: params.limit,
        }
    }
}

/// Status counts for the dashboard header.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStatusCounts {
    /// Reports awaiting triage.
    pub pending: usize,
    /// Reports being worked.
    pub progress: usize,
    /// Resolved reports.
    pub resolved: usize,
    /// pending + progress + resolved; duplicates excluded.
    pub all: usize,
    /// Raw report count, duplicates included.
    pub total: usize,
}

/// A node in the category taxonomy returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCategoryNode {
    /// Category name.
    pub name: String,
    /// One-line definition.
    pub definition: String,
    /// Default priority level name.
    pub priority: PriorityLevel,
    /// Default priority numeric value (1-4).
    pub priority_value: u8,
}

impl From<IssueCategory> for ApiCategoryNode {
    fn from(category: IssueCategory) -> Self {
        let priority = category.default_priority();
        Self {
            name: category.to_string(),
            definition: category.definition().to_string(),
            priority,
            priority_value: priority.value(),
        }
    }
}

/// Request body for the analyze endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// The report photo as base64 (raw or data URI).
    pub image_base64: String,
}

/// Response from the analyze endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    /// The issue category the image was matched to.
    pub category: IssueCategory,
    /// Priority derived from the category table.
    pub priority: PriorityLevel,
    /// Model confidence (0-1).
    pub confidence: f64,
    /// Short description of the issue.
    pub description: String,
    /// Why this priority level applies.
    pub severity_reason: String,
}

impl From<Classification> for AnalyzeResponse {
    fn from(classification: Classification) -> Self {
        Self {
            category: classification.category,
            priority: classification.priority,
            confidence: classification.confidence,
            description: classification.description,
            severity_reason: classification.severity_reason,
        }
    }
}

/// Request body for the status update endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    /// The status to move the report to.
    pub status: ReportStatus,
}

/// Request body for the citizen feedback endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    /// Whether the citizen confirms the issue was fixed.
    pub verified: bool,
    /// Optional free-text feedback.
    pub feedback: Option<String>,
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// Error body returned to clients. Details stay in the server log.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Short client-safe message.
    pub error: String,
}
