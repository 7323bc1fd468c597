//! Local fetch throttle.
//!
//! An advisory cooldown that keeps repeated runs from hammering the
//! provider: a fetch is allowed only when the stored report for the target
//! is at least an hour old. Nothing here is enforced cryptographically;
//! deleting the report resets the clock.

use chrono::{DateTime, Duration, Utc};

use crate::models::Report;

/// Minimum minutes between fetches for the same target.
const COOLDOWN_MINUTES: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied { last_update: DateTime<Utc> },
}

#[derive(Debug, Clone, Copy)]
pub struct RateGate {
    cooldown: Duration,
}

impl Default for RateGate {
    fn default() -> Self {
        Self {
            cooldown: Duration::minutes(COOLDOWN_MINUTES),
        }
    }
}

impl RateGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether a new fetch is permitted given the previously stored
    /// report, if any. Callers must short-circuit on `Denied` before making
    /// any network call.
    pub fn check(&self, previous: Option<&Report>) -> Decision {
        self.check_at(previous, Utc::now())
    }

    fn check_at(&self, previous: Option<&Report>, now: DateTime<Utc>) -> Decision {
        match previous {
            None => Decision::Allowed,
            Some(report) => {
                if now - report.captured_at >= self.cooldown {
                    Decision::Allowed
                } else {
                    Decision::Denied {
                        last_update: report.captured_at,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DiffResult, GroupSnapshot};

    fn report_captured(minutes_ago: i64) -> Report {
        let mut report = Report::new(
            "me",
            GroupSnapshot::new(),
            GroupSnapshot::new(),
            DiffResult::default(),
        );
        report.captured_at = Utc::now() - Duration::minutes(minutes_ago);
        report
    }

    #[test]
    fn test_no_previous_report_is_allowed() {
        assert_eq!(RateGate::new().check(None), Decision::Allowed);
    }

    #[test]
    fn test_recent_report_is_denied_with_timestamp() {
        let report = report_captured(59);
        match RateGate::new().check(Some(&report)) {
            Decision::Denied { last_update } => assert_eq!(last_update, report.captured_at),
            Decision::Allowed => panic!("59 minutes must be denied"),
        }
    }

    #[test]
    fn test_old_report_is_allowed() {
        let report = report_captured(61);
        assert_eq!(RateGate::new().check(Some(&report)), Decision::Allowed);
    }

    #[test]
    fn test_exact_boundary_is_allowed() {
        let gate = RateGate::new();
        let report = report_captured(0);
        let now = report.captured_at + Duration::minutes(60);
        assert_eq!(gate.check_at(Some(&report), now), Decision::Allowed);
    }
}
