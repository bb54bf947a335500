#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Report persistence seam.
//!
//! [`ReportStore`] is the boundary to whatever holds the reports — the
//! production deployment binds it to a hosted database, tests and local
//! development use [`MemoryReportStore`]. Writes are fire-and-confirm:
//! a failed write surfaces as an error for the caller to report, there is
//! no automatic retry or queueing here.

use aura_report_models::{
    FeedbackError, PriorityLevel, Report, ReportStatus, StatusTransitionError,
};
use chrono::{DateTime, Utc};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Errors surfaced by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No report with the requested id.
    #[error("report not found: {id}")]
    NotFound {
        /// The id that was looked up.
        id: String,
    },

    /// A status change was rejected by the lifecycle rules.
    #[error(transparent)]
    Transition(#[from] StatusTransitionError),

    /// Feedback was submitted for a report that is not resolved.
    #[error(transparent)]
    InvalidFeedback(#[from] FeedbackError),

    /// The backing store could not be reached.
    #[error("store unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },
}

/// Filter and ordering options for listing reports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportQuery {
    /// Keep only reports with this status.
    pub status: Option<ReportStatus>,
    /// Keep only reports at or above this priority.
    pub min_priority: Option<PriorityLevel>,
    /// Order by `created_at` descending (ties by id ascending) instead of
    /// insertion order.
    pub recent_first: bool,
    /// Truncate the result after this many reports.
    pub limit: Option<usize>,
}

/// Boundary trait for the external report store.
#[async_trait::async_trait]
pub trait ReportStore: Send + Sync {
    /// Lists reports matching `query`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the backing store cannot be
    /// reached.
    async fn list_reports(&self, query: &ReportQuery) -> Result<Vec<Report>, StoreError>;

    /// Fetches a single report by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown id.
    async fn get_report(&self, id: &str) -> Result<Report, StoreError>;

    /// Applies a status transition, setting or clearing `resolved_at`
    /// according to the lifecycle invariant, and returns the updated
    /// report.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown id or
    /// [`StoreError::Transition`] when the move is rejected; the stored
    /// report is unchanged on error.
    async fn update_status(
        &self,
        id: &str,
        status: ReportStatus,
        now: DateTime<Utc>,
    ) -> Result<Report, StoreError>;

    /// Records citizen feedback on a resolved report.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown id or
    /// [`StoreError::InvalidFeedback`] when the report is not resolved.
    async fn submit_feedback(
        &self,
        id: &str,
        verified: bool,
        feedback: Option<String>,
    ) -> Result<Report, StoreError>;
}

/// In-memory [`ReportStore`] used by tests and local development.
#[derive(Debug, Default)]
pub struct MemoryReportStore {
    reports: Mutex<Vec<Report>>,
}

impl MemoryReportStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `reports`.
    #[must_use]
    pub fn with_reports(reports: Vec<Report>) -> Self {
        Self {
            reports: Mutex::new(reports),
        }
    }

    /// Inserts a new pending report and returns its generated id.
    pub fn insert(&self, mut report: Report) -> String {
        if report.id.is_empty() {
            report.id = uuid::Uuid::new_v4().to_string();
        }
        let id = report.id.clone();
        self.lock().push(report);
        id
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Report>> {
        self.reports.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn apply_query(mut reports: Vec<Report>, query: &ReportQuery) -> Vec<Report> {
    reports.retain(|report| {
        query.status.is_none_or(|status| report.status == status)
            && query
                .min_priority
                .is_none_or(|minimum| report.priority >= minimum)
    });
    if query.recent_first {
        reports.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
    }
    if let Some(limit) = query.limit {
        reports.truncate(limit);
    }
    reports
}

#[async_trait::async_trait]
impl ReportStore for MemoryReportStore {
    async fn list_reports(&self, query: &ReportQuery) -> Result<Vec<Report>, StoreError> {
        Ok(apply_query(self.lock().clone(), query))
    }

    async fn get_report(&self, id: &str) -> Result<Report, StoreError> {
        self.lock()
            .iter()
            .find(|report| report.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    async fn update_status(
        &self,
        id: &str,
        status: ReportStatus,
        now: DateTime<Utc>,
    ) -> Result<Report, StoreError> {
        let mut reports = self.lock();
        let report = reports
            .iter_mut()
            .find(|report| report.id == id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
        report.transition_to(status, now)?;
        log::debug!("report {id} moved to {status}");
        Ok(report.clone())
    }

    async fn submit_feedback(
        &self,
        id: &str,
        verified: bool,
        feedback: Option<String>,
    ) -> Result<Report, StoreError> {
        let mut reports = self.lock();
        let report = reports
            .iter_mut()
            .find(|report| report.id == id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
        report.record_feedback(verified, feedback)?;
        Ok(report.clone())
    }
}
