//! Session state reducer — an explicit, pure transition function over the
//! optimization session, replacing ad-hoc per-field mutation.
//!
//! The HTTP layer holds one `OptimizationState` per session and mutates it
//! exclusively through `reduce`. `StartCycle` while a cycle is in flight is
//! rejected — at most one in-flight cycle per session is a caller-side
//! obligation, and the reducer is where this deployment enforces it.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::optimize::history::{HistoryLog, IterationRecord};
use crate::optimize::scoring::MatchAssessment;

/// Phase of the optimization session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    CycleInFlight,
}

/// The whole session state threaded through the reducer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationState {
    pub phase: Phase,
    pub history: HistoryLog,
    /// Most recent assessment, retained for display between cycles.
    pub last_assessment: Option<MatchAssessment>,
}

impl Default for OptimizationState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            history: HistoryLog::new(),
            last_assessment: None,
        }
    }
}

impl OptimizationState {
    /// Iteration count supplied to the controller: completed iterations so far.
    pub fn iteration_count(&self) -> u32 {
        self.history.iteration_count()
    }
}

/// Tagged action set — every session mutation goes through one of these.
#[derive(Debug, Clone)]
pub enum CycleAction {
    StartCycle,
    CycleSucceeded {
        record: IterationRecord,
        assessment: MatchAssessment,
    },
    CycleFailed,
    OptionApplied {
        record: IterationRecord,
        assessment: MatchAssessment,
    },
}

/// Pure transition function. Returns the next state, or an error for
/// transitions the session must not make (re-entrant `StartCycle`).
pub fn reduce(state: &OptimizationState, action: CycleAction) -> Result<OptimizationState, AppError> {
    let mut next = state.clone();

    match action {
        CycleAction::StartCycle => {
            if state.phase == Phase::CycleInFlight {
                return Err(AppError::Conflict(
                    "An optimization cycle is already in flight for this session".to_string(),
                ));
            }
            next.phase = Phase::CycleInFlight;
        }
        CycleAction::CycleSucceeded { record, assessment }
        | CycleAction::OptionApplied { record, assessment } => {
            next.phase = Phase::Idle;
            next.history.append(record);
            next.last_assessment = Some(assessment);
        }
        CycleAction::CycleFailed => {
            // The failed cycle leaves no trace: no record, assessment as-is.
            next.phase = Phase::Idle;
        }
    }

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn assessment(score: u8) -> MatchAssessment {
        MatchAssessment {
            score,
            strengths: vec![],
            gaps: vec![],
        }
    }

    fn record(n: u32, score: u8) -> IterationRecord {
        IterationRecord {
            iteration_number: n,
            score,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_start_cycle_from_idle() {
        let state = OptimizationState::default();
        let next = reduce(&state, CycleAction::StartCycle).unwrap();
        assert_eq!(next.phase, Phase::CycleInFlight);
        assert_eq!(next.iteration_count(), 0);
    }

    #[test]
    fn test_reentrant_start_cycle_is_rejected() {
        let state = OptimizationState::default();
        let in_flight = reduce(&state, CycleAction::StartCycle).unwrap();
        let err = reduce(&in_flight, CycleAction::StartCycle).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_cycle_succeeded_records_and_returns_to_idle() {
        let state = reduce(&OptimizationState::default(), CycleAction::StartCycle).unwrap();
        let next = reduce(
            &state,
            CycleAction::CycleSucceeded {
                record: record(1, 64),
                assessment: assessment(64),
            },
        )
        .unwrap();

        assert_eq!(next.phase, Phase::Idle);
        assert_eq!(next.iteration_count(), 1);
        assert_eq!(next.history.last_score(), Some(64));
        assert_eq!(next.last_assessment.as_ref().unwrap().score, 64);
    }

    #[test]
    fn test_cycle_failed_leaves_no_trace() {
        let mut state = reduce(&OptimizationState::default(), CycleAction::StartCycle).unwrap();
        state = reduce(
            &state,
            CycleAction::CycleSucceeded {
                record: record(1, 50),
                assessment: assessment(50),
            },
        )
        .unwrap();

        let started = reduce(&state, CycleAction::StartCycle).unwrap();
        let failed = reduce(&started, CycleAction::CycleFailed).unwrap();

        assert_eq!(failed.phase, Phase::Idle);
        assert_eq!(failed.iteration_count(), 1);
        assert_eq!(failed.last_assessment.as_ref().unwrap().score, 50);
    }

    #[test]
    fn test_safe_to_start_again_after_failure() {
        let started = reduce(&OptimizationState::default(), CycleAction::StartCycle).unwrap();
        let failed = reduce(&started, CycleAction::CycleFailed).unwrap();
        assert!(reduce(&failed, CycleAction::StartCycle).is_ok());
    }

    #[test]
    fn test_option_applied_appends_record() {
        let state = OptimizationState::default();
        let next = reduce(
            &state,
            CycleAction::OptionApplied {
                record: record(1, 96),
                assessment: assessment(96),
            },
        )
        .unwrap();
        assert_eq!(next.iteration_count(), 1);
        assert_eq!(next.history.last_score(), Some(96));
    }

    #[test]
    fn test_reduce_is_pure() {
        let state = OptimizationState::default();
        let _ = reduce(&state, CycleAction::StartCycle).unwrap();
        assert_eq!(state.phase, Phase::Idle);
    }
}
