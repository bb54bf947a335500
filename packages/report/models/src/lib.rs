#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Sanitation issue taxonomy and the canonical report entity.
//!
//! This crate defines the closed category, priority, and status enumerations
//! used across the entire Aura system, plus the `Report` record shape shared
//! by the triage index, the dispatch engine, and the API layer. The category
//! to priority lookup mirrors the table used by the AI classification
//! endpoint, so a manually filed report and an AI-classified report always
//! agree on default priorities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Priority level for a report, from 1 (low) to 4 (critical).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PriorityLevel {
    /// Routine cleanup, no hazard.
    Low = 1,
    /// Standard response window.
    Medium = 2,
    /// Hazardous, respond same day.
    High = 3,
    /// Public health or safety danger, respond immediately.
    Critical = 4,
}

impl PriorityLevel {
    /// Returns the numeric value of this priority level.
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Creates a priority level from a numeric value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not in the range 1-4.
    pub const fn from_value(value: u8) -> Result<Self, InvalidPriorityError> {
        match value {
            1 => Ok(Self::Low),
            2 => Ok(Self::Medium),
            3 => Ok(Self::High),
            4 => Ok(Self::Critical),
            _ => Err(InvalidPriorityError { value }),
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Low, Self::Medium, Self::High, Self::Critical]
    }
}

/// Error returned when attempting to create a [`PriorityLevel`] from an
/// invalid numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid priority value {value}: expected 1-4")]
pub struct InvalidPriorityError {
    /// The invalid priority value that was provided.
    pub value: u8,
}

/// Closed enumeration of sanitation issue categories.
///
/// Every report carries exactly one category, assigned at creation from the
/// AI classification (or [`IssueCategory::Other`] when classification fails)
/// and manually overridable by staff afterwards.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IssueCategory {
    /// Pile of trash/garbage on streets or public areas.
    GarbageDump,
    /// Overflowing or uncleaned public dustbins.
    DustbinNotCleaned,
    /// Smoke or fire from burning waste.
    BurningGarbage,
    /// Uncovered manholes or drainage openings.
    OpenManhole,
    /// Stagnant/dirty water accumulation.
    StagnantWater,
    /// Dead animal carcass on public property.
    DeadAnimal,
    /// Sewage or drain overflow.
    SewageOverflow,
    /// Unswept streets with leaves/dust.
    SweepingNotDone,
    /// Any other cleanliness issue.
    Other,
}

impl IssueCategory {
    /// Returns the default priority for this category.
    ///
    /// This is the fixed lookup used by the classification endpoint to turn
    /// the model's category into a `{category, priority}` pair.
    #[must_use]
    pub const fn default_priority(self) -> PriorityLevel {
        match self {
            Self::BurningGarbage | Self::DeadAnimal | Self::SewageOverflow => {
                PriorityLevel::Critical
            }
            Self::OpenManhole | Self::StagnantWater => PriorityLevel::High,
            Self::GarbageDump | Self::DustbinNotCleaned | Self::Other => PriorityLevel::Medium,
            Self::SweepingNotDone => PriorityLevel::Low,
        }
    }

    /// Returns the one-line definition used in the classification prompt.
    #[must_use]
    pub const fn definition(self) -> &'static str {
        match self {
            Self::GarbageDump => "Pile of trash/garbage on streets or public areas",
            Self::DustbinNotCleaned => "Overflowing or uncleaned public dustbins",
            Self::BurningGarbage => "Smoke or fire from burning waste",
            Self::OpenManhole => "Uncovered manholes or drainage openings",
            Self::StagnantWater => "Stagnant/dirty water accumulation",
            Self::DeadAnimal => "Dead animal carcass on public property",
            Self::SewageOverflow => "Sewage or drain overflow",
            Self::SweepingNotDone => "Unswept streets with leaves/dust",
            Self::Other => "Any other cleanliness issue",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::GarbageDump,
            Self::DustbinNotCleaned,
            Self::BurningGarbage,
            Self::OpenManhole,
            Self::StagnantWater,
            Self::DeadAnimal,
            Self::SewageOverflow,
            Self::SweepingNotDone,
            Self::Other,
        ]
    }
}

/// Lifecycle status of a report.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReportStatus {
    /// Filed, awaiting staff action.
    Pending,
    /// A crew has been assigned or dispatched.
    InProgress,
    /// Cleaned up and closed out.
    Resolved,
    /// Marked as a duplicate of another report.
    Duplicate,
}

impl ReportStatus {
    /// Whether this status permits no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Duplicate)
    }

    /// Returns the statuses reachable from this one.
    ///
    /// The happy path is pending -> `in_progress` -> resolved; any
    /// non-terminal status may branch to duplicate.
    #[must_use]
    pub fn valid_transitions(self) -> Vec<Self> {
        match self {
            Self::Pending => vec![Self::InProgress, Self::Resolved, Self::Duplicate],
            Self::InProgress => vec![Self::Resolved, Self::Duplicate],
            Self::Resolved | Self::Duplicate => vec![],
        }
    }

    /// Whether a direct transition to `to` is permitted.
    #[must_use]
    pub fn can_transition_to(self, to: Self) -> bool {
        self.valid_transitions().contains(&to)
    }

    /// Validates a transition, returning a typed error describing the
    /// rejected move.
    ///
    /// # Errors
    ///
    /// Returns [`StatusTransitionError`] when the transition is a no-op,
    /// leaves a terminal status, or is otherwise not in the table.
    pub fn validate_transition(self, to: Self) -> Result<(), StatusTransitionError> {
        if self == to {
            return Err(StatusTransitionError::SameStatus { status: self });
        }
        if self.is_terminal() {
            return Err(StatusTransitionError::FromTerminal { status: self });
        }
        if !self.can_transition_to(to) {
            return Err(StatusTransitionError::NotPermitted { from: self, to });
        }
        Ok(())
    }
}

/// Error returned when a report status transition is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StatusTransitionError {
    /// Transition to the same status.
    #[error("report is already {status}")]
    SameStatus {
        /// The current (and requested) status.
        status: ReportStatus,
    },
    /// Transition out of a terminal status.
    #[error("cannot transition out of terminal status {status}")]
    FromTerminal {
        /// The terminal status.
        status: ReportStatus,
    },
    /// Transition not in the table.
    #[error("transition from {from} to {to} is not permitted")]
    NotPermitted {
        /// The current status.
        from: ReportStatus,
        /// The requested status.
        to: ReportStatus,
    },
}

/// A citizen-filed sanitation report, in its public (restricted-view) shape.
///
/// Reporter name and phone never appear here; the public read path strips
/// them before records leave the data store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Report {
    /// Stable unique identifier.
    pub id: String,
    /// Issue category, set at creation from AI output.
    pub category: IssueCategory,
    /// Priority, set at creation from the category lookup and manually
    /// overridable.
    pub priority: PriorityLevel,
    /// Lifecycle status.
    pub status: ReportStatus,
    /// WGS84 latitude in degrees.
    pub latitude: f64,
    /// WGS84 longitude in degrees.
    pub longitude: f64,
    /// Free-text address; may be empty.
    pub address: String,
    /// When the report was filed.
    pub created_at: DateTime<Utc>,
    /// When the report was resolved. Set if and only if status is resolved.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Description produced by the AI classifier.
    pub ai_description: Option<String>,
    /// Classifier confidence in 0..=1.
    pub ai_confidence: Option<f64>,
    /// Photo taken at filing time.
    pub before_image_url: Option<String>,
    /// Photo taken after cleanup.
    pub after_image_url: Option<String>,
    /// Citizen confirmation that the issue was actually fixed. Only
    /// meaningful once the report is resolved.
    pub citizen_verified: Option<bool>,
    /// Free-text citizen feedback, post-resolution only.
    pub citizen_feedback: Option<String>,
}

impl Report {
    /// Creates a freshly filed report at the given location.
    ///
    /// Priority comes from the category's default lookup.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        category: IssueCategory,
        latitude: f64,
        longitude: f64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            category,
            priority: category.default_priority(),
            status: ReportStatus::Pending,
            latitude,
            longitude,
            address: String::new(),
            created_at,
            resolved_at: None,
            ai_description: None,
            ai_confidence: None,
            before_image_url: None,
            after_image_url: None,
            citizen_verified: None,
            citizen_feedback: None,
        }
    }

    /// Applies a validated status transition, maintaining the
    /// `resolved_at` invariant.
    ///
    /// # Errors
    ///
    /// Returns [`StatusTransitionError`] when the move is rejected; the
    /// report is left unchanged.
    pub fn transition_to(
        &mut self,
        to: ReportStatus,
        now: DateTime<Utc>,
    ) -> Result<(), StatusTransitionError> {
        self.status.validate_transition(to)?;
        self.status = to;
        self.resolved_at = if to == ReportStatus::Resolved {
            Some(now)
        } else {
            None
        };
        Ok(())
    }

    /// Records post-resolution citizen feedback.
    ///
    /// # Errors
    ///
    /// Returns [`FeedbackError`] when the report is not resolved; feedback
    /// is only meaningful after cleanup.
    pub fn record_feedback(
        &mut self,
        verified: bool,
        feedback: Option<String>,
    ) -> Result<(), FeedbackError> {
        if self.status != ReportStatus::Resolved {
            return Err(FeedbackError::NotResolved {
                status: self.status,
            });
        }
        self.citizen_verified = Some(verified);
        self.citizen_feedback = feedback;
        Ok(())
    }
}

/// Error returned when citizen feedback is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FeedbackError {
    /// Feedback submitted before the report was resolved.
    #[error("feedback is only accepted on resolved reports (status is {status})")]
    NotResolved {
        /// The report's current status.
        status: ReportStatus,
    },
}
