#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Crew dispatch lifecycle for servicing a selected report.
//!
//! A [`Dispatcher`] manages exactly one active task at a time through a
//! small state machine: idle -> routing -> navigating -> complete. Selecting
//! a report computes the distance/ETA pair and an illustrative route curve;
//! starting navigation hands off to an external mapping application via a
//! deep link (this system never computes real road routing); completing a
//! task clears it and tells the caller to persist the report as resolved.
//!
//! Transitions attempted from the wrong state are rejected with a typed
//! error and leave the machine untouched — there are no partial transitions.

use aura_report_models::Report;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Lifecycle state of the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavigationState {
    /// No report selected.
    #[default]
    Idle,
    /// Report selected, route and ETA computed, navigation not started.
    Routing,
    /// External turn-by-turn handoff issued.
    Navigating,
}

impl NavigationState {
    /// Short lowercase name for error messages and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Routing => "routing",
            Self::Navigating => "navigating",
        }
    }
}

impl std::fmt::Display for NavigationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced by dispatch lifecycle methods.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// A lifecycle method was called from a state that does not permit it.
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        /// The attempted action.
        action: &'static str,
        /// The state the dispatcher was (and still is) in.
        state: NavigationState,
    },
}

/// The active crew task derived from the currently selected report.
///
/// Ephemeral: replaced when a different report is selected, discarded on
/// completion, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct CrewTask {
    /// The report being serviced.
    pub report: Report,
    /// Crew origin as `[lat, lon]` degrees.
    pub crew_location: aura_geo::LatLon,
    /// Great-circle distance from crew to report, km.
    pub distance_km: f64,
    /// Pessimistic travel estimate in whole minutes.
    pub eta_minutes: u32,
    /// Display-only curve approximating a road path. Not used for the
    /// distance/ETA numbers above.
    pub route: Vec<aura_geo::LatLon>,
}

/// Instruction to the caller after a task completes: persist the report as
/// resolved through the external data store. Persistence (and any retry of
/// a failed write) is the caller's responsibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionReceipt {
    /// Id of the report to resolve.
    pub report_id: String,
    /// Resolution timestamp to persist.
    pub resolved_at: DateTime<Utc>,
}

/// One-task-at-a-time dispatch state machine.
#[derive(Debug, Default)]
pub struct Dispatcher {
    state: NavigationState,
    task: Option<CrewTask>,
}

impl Dispatcher {
    /// Creates an idle dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> NavigationState {
        self.state
    }

    /// The active task, if any.
    #[must_use]
    pub const fn task(&self) -> Option<&CrewTask> {
        self.task.as_ref()
    }

    /// Selects a report to service, computing its distance, ETA, and
    /// illustrative route, and enters routing.
    ///
    /// Selecting while routing replaces the in-flight task (only one active
    /// task is supported); there is no queueing.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidTransition`] while navigating — the
    /// crew must cancel navigation first.
    pub fn select_report(
        &mut self,
        report: Report,
        crew_location: aura_geo::LatLon,
    ) -> Result<&CrewTask, DispatchError> {
        if self.state == NavigationState::Navigating {
            return Err(DispatchError::InvalidTransition {
                action: "select a report",
                state: self.state,
            });
        }

        let distance_km = aura_geo::distance_km(
            crew_location[0],
            crew_location[1],
            report.latitude,
            report.longitude,
        );
        let destination = [report.latitude, report.longitude];
        let task = CrewTask {
            eta_minutes: aura_geo::eta_minutes(distance_km),
            route: aura_geo::illustrative_route(crew_location, destination),
            report,
            crew_location,
            distance_km,
        };
        self.state = NavigationState::Routing;
        Ok(&*self.task.insert(task))
    }

    /// Starts external turn-by-turn navigation, returning the mapping
    /// application deep link.
    ///
    /// Opening the link is the caller's side effect; this core only builds
    /// it.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidTransition`] unless routing.
    pub fn start_navigation(&mut self) -> Result<String, DispatchError> {
        if self.state != NavigationState::Routing {
            return Err(DispatchError::InvalidTransition {
                action: "start navigation",
                state: self.state,
            });
        }
        let task = self.task.as_ref().ok_or(DispatchError::InvalidTransition {
            action: "start navigation",
            state: self.state,
        })?;

        let url = maps_deep_link(
            task.crew_location,
            [task.report.latitude, task.report.longitude],
        );
        self.state = NavigationState::Navigating;
        Ok(url)
    }

    /// Cancels external navigation, returning to routing with the route and
    /// ETA retained unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidTransition`] unless navigating.
    pub fn cancel_navigation(&mut self) -> Result<(), DispatchError> {
        if self.state != NavigationState::Navigating {
            return Err(DispatchError::InvalidTransition {
                action: "cancel navigation",
                state: self.state,
            });
        }
        self.state = NavigationState::Routing;
        Ok(())
    }

    /// Marks the active task complete, clearing it and returning the
    /// instruction to persist the report as resolved.
    ///
    /// Completion is terminal for the task: the dispatcher returns to idle
    /// with no selected report.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidTransition`] unless routing or
    /// navigating.
    pub fn mark_complete(&mut self, now: DateTime<Utc>) -> Result<CompletionReceipt, DispatchError> {
        if self.state == NavigationState::Idle {
            return Err(DispatchError::InvalidTransition {
                action: "mark complete",
                state: self.state,
            });
        }
        let task = self.task.take().ok_or(DispatchError::InvalidTransition {
            action: "mark complete",
            state: self.state,
        })?;
        self.state = NavigationState::Idle;
        Ok(CompletionReceipt {
            report_id: task.report.id,
            resolved_at: now,
        })
    }
}

/// Builds the Google Maps driving-directions deep link for the external
/// turn-by-turn handoff. Coordinates are URL-encoded (the `,` separator
/// becomes `%2C`); this is fire-and-forget with no response contract.
#[must_use]
pub fn maps_deep_link(origin: aura_geo::LatLon, destination: aura_geo::LatLon) -> String {
    format!(
        "https://www.google.com/maps/dir/?api=1&origin={}&destination={}&travelmode=driving",
        encode_coordinate(origin),
        encode_coordinate(destination),
    )
}

fn encode_coordinate(point: aura_geo::LatLon) -> String {
    format!("{}%2C{}", point[0], point[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use aura_report_models::{IssueCategory, Report, ReportStatus};
    use chrono::TimeZone as _;

    fn report(id: &str, lat: f64, lon: f64) -> Report {
        let created = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        let mut r = Report::new(id, IssueCategory::GarbageDump, lat, lon, created);
        r.status = ReportStatus::InProgress;
        r
    }

    const CREW: aura_geo::LatLon = [18.5204, 73.8567];

    #[test]
    fn transition_table() {
        let mut dispatcher = Dispatcher::new();
        assert_eq!(dispatcher.state(), NavigationState::Idle);

        dispatcher.select_report(report("r-1", 18.53, 73.86), CREW).unwrap();
        assert_eq!(dispatcher.state(), NavigationState::Routing);

        dispatcher.start_navigation().unwrap();
        assert_eq!(dispatcher.state(), NavigationState::Navigating);

        // Selecting while navigating is rejected and changes nothing.
        let err = dispatcher
            .select_report(report("r-2", 18.54, 73.87), CREW)
            .unwrap_err();
        assert_eq!(
            err,
            DispatchError::InvalidTransition {
                action: "select a report",
                state: NavigationState::Navigating,
            }
        );
        assert_eq!(dispatcher.state(), NavigationState::Navigating);
        assert_eq!(dispatcher.task().unwrap().report.id, "r-1");

        dispatcher.cancel_navigation().unwrap();
        assert_eq!(dispatcher.state(), NavigationState::Routing);

        // Now the replacement is allowed.
        dispatcher.select_report(report("r-2", 18.54, 73.87), CREW).unwrap();
        assert_eq!(dispatcher.state(), NavigationState::Routing);
        assert_eq!(dispatcher.task().unwrap().report.id, "r-2");
    }

    #[test]
    fn cancel_retains_route_and_eta() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.select_report(report("r-1", 18.6, 73.9), CREW).unwrap();
        let before = dispatcher.task().unwrap().clone();
        dispatcher.start_navigation().unwrap();
        dispatcher.cancel_navigation().unwrap();
        assert_eq!(dispatcher.task().unwrap(), &before);
    }

    #[test]
    fn invalid_transitions_are_rejected() {
        let mut dispatcher = Dispatcher::new();
        assert!(dispatcher.start_navigation().is_err());
        assert!(dispatcher.cancel_navigation().is_err());
        assert!(dispatcher.mark_complete(Utc::now()).is_err());

        dispatcher.select_report(report("r-1", 18.6, 73.9), CREW).unwrap();
        // Cancel is only valid while navigating.
        assert!(dispatcher.cancel_navigation().is_err());
        assert_eq!(dispatcher.state(), NavigationState::Routing);
    }

    #[test]
    fn completion_clears_task_and_instructs_persistence() {
        let now = Utc::now();
        let mut dispatcher = Dispatcher::new();
        dispatcher.select_report(report("r-1", 18.6, 73.9), CREW).unwrap();
        dispatcher.start_navigation().unwrap();

        let receipt = dispatcher.mark_complete(now).unwrap();
        assert_eq!(receipt.report_id, "r-1");
        assert_eq!(receipt.resolved_at, now);
        assert_eq!(dispatcher.state(), NavigationState::Idle);
        assert!(dispatcher.task().is_none());
    }

    #[test]
    fn same_point_task_has_zero_distance_and_eta() {
        let mut dispatcher = Dispatcher::new();
        let task = dispatcher
            .select_report(report("r-1", CREW[0], CREW[1]), CREW)
            .unwrap();
        assert_eq!(task.distance_km, 0.0);
        assert_eq!(task.eta_minutes, 0);

        dispatcher.start_navigation().unwrap();
        let receipt = dispatcher.mark_complete(Utc::now()).unwrap();
        assert_eq!(receipt.report_id, "r-1");
        assert_eq!(dispatcher.state(), NavigationState::Idle);
    }

    #[test]
    fn deep_link_encodes_coordinates() {
        let url = maps_deep_link([18.5204, 73.8567], [18.54, 73.87]);
        assert_eq!(
            url,
            "https://www.google.com/maps/dir/?api=1&origin=18.5204%2C73.8567\
             &destination=18.54%2C73.87&travelmode=driving"
        );
    }
}
