#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! In-memory triage index over the current report working set.
//!
//! Owns the canonical set of reports for one viewing session and answers
//! list and map queries from the same source of truth: status filters,
//! precomputed status counts for dashboard badges, minimum-priority filters
//! for the "high priority only" toggle, and id lookups for selection.
//!
//! The index also keeps an id -> marker-handle map so a single marker can be
//! restyled (e.g. highlighted as selected) without rebuilding the whole
//! marker set. The map is purely a rendering optimization: it is rebuilt on
//! every [`TriageIndex::load`] and never treated as a source of truth for
//! report state.

use std::collections::HashMap;

use aura_report_models::{PriorityLevel, Report, ReportStatus};
use serde::Serialize;
use thiserror::Error;

/// Errors produced by triage index queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TriageError {
    /// The requested report id is not in the current working set, typically
    /// because the set refreshed underneath a stale selection. Callers
    /// should treat the selection as cleared.
    #[error("report {id} not found in the current working set")]
    NotFound {
        /// The id that missed.
        id: String,
    },
}

/// Status filter for list and map views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    /// Identity filter: every loaded report.
    #[default]
    All,
    /// Only reports with the given status.
    Only(ReportStatus),
}

impl StatusFilter {
    fn matches(self, report: &Report) -> bool {
        match self {
            Self::All => true,
            Self::Only(status) => report.status == status,
        }
    }
}

/// Precomputed per-status counts for the current working set.
///
/// `all` covers the three live statuses only; duplicate-status reports are
/// excluded from it and appear solely in `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    /// Reports awaiting action.
    pub pending: usize,
    /// Reports with a crew assigned.
    pub progress: usize,
    /// Resolved reports.
    pub resolved: usize,
    /// pending + progress + resolved.
    pub all: usize,
    /// Raw size of the working set, duplicates included.
    pub total: usize,
}

/// Visual style of a rendered map marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkerStyle {
    /// Colored by lifecycle status (public issues map).
    Status(ReportStatus),
    /// Colored by priority (admin dispatch map).
    Priority(PriorityLevel),
}

/// Handle to one rendered marker.
///
/// Holds just enough state to restyle the marker in place; the underlying
/// [`Report`] remains the single source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerHandle {
    /// Base style derived from the report at load time.
    pub style: MarkerStyle,
    /// Whether the marker currently renders as selected.
    pub selected: bool,
}

/// Which attribute drives marker coloring for this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkerPalette {
    /// Color by lifecycle status (public issues map).
    ByStatus,
    /// Color by priority (admin dispatch map).
    #[default]
    ByPriority,
}

impl MarkerPalette {
    fn style_for(self, report: &Report) -> MarkerStyle {
        match self {
            Self::ByStatus => MarkerStyle::Status(report.status),
            Self::ByPriority => MarkerStyle::Priority(report.priority),
        }
    }
}

/// The triage index for one viewing session.
#[derive(Debug, Default)]
pub struct TriageIndex {
    reports: Vec<Report>,
    by_id: HashMap<String, usize>,
    markers: HashMap<String, MarkerHandle>,
    counts: StatusCounts,
    palette: MarkerPalette,
}

impl TriageIndex {
    /// Creates an empty index with priority-colored markers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty index with the given marker palette.
    #[must_use]
    pub fn with_palette(palette: MarkerPalette) -> Self {
        Self {
            palette,
            ..Self::default()
        }
    }

    /// Replaces the full working set.
    ///
    /// Counts and the marker map are recomputed before this returns, so no
    /// query can observe a mix of old and new data. Loading the same set
    /// twice yields identical derived views.
    pub fn load(&mut self, reports: Vec<Report>) {
        self.by_id = reports
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.clone(), i))
            .collect();
        self.markers = reports
            .iter()
            .map(|r| {
                (
                    r.id.clone(),
                    MarkerHandle {
                        style: self.palette.style_for(r),
                        selected: false,
                    },
                )
            })
            .collect();
        self.counts = Self::count(&reports);
        self.reports = reports;
    }

    fn count(reports: &[Report]) -> StatusCounts {
        let mut counts = StatusCounts {
            total: reports.len(),
            ..StatusCounts::default()
        };
        for report in reports {
            match report.status {
                ReportStatus::Pending => counts.pending += 1,
                ReportStatus::InProgress => counts.progress += 1,
                ReportStatus::Resolved => counts.resolved += 1,
                ReportStatus::Duplicate => {}
            }
        }
        counts.all = counts.pending + counts.progress + counts.resolved;
        counts
    }

    /// Reports matching the filter, in insertion order.
    #[must_use]
    pub fn filter_by_status(&self, filter: StatusFilter) -> Vec<&Report> {
        self.reports.iter().filter(|r| filter.matches(r)).collect()
    }

    /// Reports matching the filter, most recently created first.
    ///
    /// Ties on `created_at` break by id ascending so the ordering is
    /// deterministic across loads.
    #[must_use]
    pub fn filter_by_status_recent(&self, filter: StatusFilter) -> Vec<&Report> {
        let mut matched = self.filter_by_status(filter);
        matched.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        matched
    }

    /// Reports at or above the given priority, in insertion order.
    #[must_use]
    pub fn filter_by_priority(&self, minimum: PriorityLevel) -> Vec<&Report> {
        self.reports
            .iter()
            .filter(|r| r.priority >= minimum)
            .collect()
    }

    /// Precomputed status counts for the current working set.
    #[must_use]
    pub const fn counts_by_status(&self) -> StatusCounts {
        self.counts
    }

    /// Looks up a single report by id.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::NotFound`] when the id is absent from the
    /// current load; the caller should treat its selection as stale.
    pub fn select(&self, id: &str) -> Result<&Report, TriageError> {
        self.by_id
            .get(id)
            .map(|&i| &self.reports[i])
            .ok_or_else(|| TriageError::NotFound { id: id.to_string() })
    }

    /// The marker handle for a report, if it is in the current set.
    #[must_use]
    pub fn marker(&self, id: &str) -> Option<&MarkerHandle> {
        self.markers.get(id)
    }

    /// Restyles a single marker as selected, clearing any previous
    /// selection, without rebuilding the marker set.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::NotFound`] for a stale id; existing marker
    /// state is left unchanged.
    pub fn set_selected(&mut self, id: &str) -> Result<(), TriageError> {
        if !self.markers.contains_key(id) {
            return Err(TriageError::NotFound { id: id.to_string() });
        }
        for (marker_id, handle) in &mut self.markers {
            handle.selected = marker_id == id;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aura_report_models::IssueCategory;
    use chrono::{TimeZone as _, Utc};

    fn report(id: &str, status: ReportStatus, category: IssueCategory, minute: u32) -> Report {
        let created = Utc.with_ymd_and_hms(2024, 6, 1, 9, minute, 0).unwrap();
        let mut r = Report::new(id, category, 18.52, 73.85, created);
        r.status = status;
        r
    }

    fn sample_set() -> Vec<Report> {
        vec![
            report("r-1", ReportStatus::Pending, IssueCategory::GarbageDump, 0),
            report("r-2", ReportStatus::InProgress, IssueCategory::OpenManhole, 1),
            report("r-3", ReportStatus::Resolved, IssueCategory::DeadAnimal, 2),
            report("r-4", ReportStatus::Pending, IssueCategory::SweepingNotDone, 2),
            report("r-5", ReportStatus::Duplicate, IssueCategory::GarbageDump, 3),
        ]
    }

    #[test]
    fn counts_exclude_duplicates_from_all() {
        let mut index = TriageIndex::new();
        index.load(sample_set());
        let counts = index.counts_by_status();
        assert_eq!(counts.pending, 2);
        assert_eq!(counts.progress, 1);
        assert_eq!(counts.resolved, 1);
        assert_eq!(counts.all, counts.pending + counts.progress + counts.resolved);
        assert_eq!(counts.total, 5);
    }

    #[test]
    fn all_filter_is_identity() {
        let mut index = TriageIndex::new();
        let set = sample_set();
        index.load(set.clone());
        let mut expected: Vec<&str> = set.iter().map(|r| r.id.as_str()).collect();
        let mut got: Vec<&str> = index
            .filter_by_status(StatusFilter::All)
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        expected.sort_unstable();
        got.sort_unstable();
        assert_eq!(got, expected);
    }

    #[test]
    fn status_filter_preserves_insertion_order() {
        let mut index = TriageIndex::new();
        index.load(sample_set());
        let ids: Vec<&str> = index
            .filter_by_status(StatusFilter::Only(ReportStatus::Pending))
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, ["r-1", "r-4"]);
    }

    #[test]
    fn recency_ordering_breaks_ties_by_id() {
        let mut index = TriageIndex::new();
        index.load(sample_set());
        let ids: Vec<&str> = index
            .filter_by_status_recent(StatusFilter::All)
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        // r-3 and r-4 share a created_at; the smaller id sorts first.
        assert_eq!(ids, ["r-5", "r-3", "r-4", "r-2", "r-1"]);
    }

    #[test]
    fn load_fully_replaces_prior_state() {
        let mut index = TriageIndex::new();
        index.load(sample_set());
        let replacement = vec![report(
            "r-9",
            ReportStatus::Pending,
            IssueCategory::StagnantWater,
            5,
        )];
        index.load(replacement);

        let ids: Vec<&str> = index
            .filter_by_status(StatusFilter::All)
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, ["r-9"]);
        assert!(index.select("r-1").is_err(), "stale id must be gone");
        assert!(index.marker("r-1").is_none(), "stale marker must be gone");
        assert_eq!(index.counts_by_status().total, 1);
    }

    #[test]
    fn load_is_idempotent() {
        let mut index = TriageIndex::new();
        index.load(sample_set());
        let first = index.counts_by_status();
        index.load(sample_set());
        assert_eq!(index.counts_by_status(), first);
    }

    #[test]
    fn priority_filter_is_at_least() {
        let mut index = TriageIndex::new();
        index.load(sample_set());
        let ids: Vec<&str> = index
            .filter_by_priority(PriorityLevel::High)
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        // open_manhole is high, dead_animal is critical.
        assert_eq!(ids, ["r-2", "r-3"]);
    }

    #[test]
    fn select_signals_not_found() {
        let mut index = TriageIndex::new();
        index.load(sample_set());
        assert_eq!(index.select("r-2").unwrap().id, "r-2");
        let err = index.select("r-404").unwrap_err();
        assert_eq!(
            err,
            TriageError::NotFound {
                id: "r-404".to_string()
            }
        );
    }

    #[test]
    fn selection_restyles_one_marker_in_place() {
        let mut index = TriageIndex::new();
        index.load(sample_set());

        index.set_selected("r-2").unwrap();
        assert!(index.marker("r-2").unwrap().selected);
        assert!(!index.marker("r-1").unwrap().selected);

        // Moving the selection clears the previous one.
        index.set_selected("r-3").unwrap();
        assert!(!index.marker("r-2").unwrap().selected);
        assert!(index.marker("r-3").unwrap().selected);

        // A stale id is rejected and leaves marker state alone.
        assert!(index.set_selected("r-404").is_err());
        assert!(index.marker("r-3").unwrap().selected);
    }

    #[test]
    fn palette_drives_marker_styles() {
        let mut by_priority = TriageIndex::new();
        by_priority.load(sample_set());
        assert_eq!(
            by_priority.marker("r-2").unwrap().style,
            MarkerStyle::Priority(PriorityLevel::High)
        );

        let mut by_status = TriageIndex::with_palette(MarkerPalette::ByStatus);
        by_status.load(sample_set());
        assert_eq!(
            by_status.marker("r-2").unwrap().style,
            MarkerStyle::Status(ReportStatus::InProgress)
        );
    }
}
