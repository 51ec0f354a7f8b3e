//! Axum route handlers for the Optimization API.
//!
//! The handlers are the "surrounding editor" boundary: they validate input,
//! own the per-session reducer state, enforce the manual-refine score window,
//! and commit each cycle's edited document back to the client. The controller
//! below them never loops and never touches session state.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::Resume;
use crate::optimize::controller::{
    self, CycleOutcome, MANUAL_FLOOR_SCORE, MANUAL_TARGET_SCORE,
};
use crate::optimize::history::IterationRecord;
use crate::optimize::options::BulletOption;
use crate::optimize::reducer::{reduce, CycleAction, OptimizationState};
use crate::optimize::scoring::MatchAssessment;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CycleRequest {
    /// Absent for the first cycle of a document; a new session is opened.
    /// A supplied id must name an existing session.
    pub session_id: Option<Uuid>,
    pub resume: Resume,
    pub target_description: String,
}

#[derive(Debug, Serialize)]
pub struct CycleResponse {
    pub session_id: Uuid,
    pub document: Resume,
    pub assessment: MatchAssessment,
    pub history_entry: IterationRecord,
    pub improvement_summary: String,
    /// `new_score - prior_score`; absent on the session's first iteration.
    pub score_delta: Option<i16>,
}

#[derive(Debug, Deserialize)]
pub struct OptionsRequest {
    pub resume: Resume,
    pub target_description: String,
    pub gaps: Vec<String>,
    pub assessment: MatchAssessment,
}

#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    pub options: Vec<BulletOption>,
}

#[derive(Debug, Deserialize)]
pub struct ApplyOptionRequest {
    pub session_id: Option<Uuid>,
    pub resume: Resume,
    pub target_description: String,
    pub option: BulletOption,
}

#[derive(Debug, Serialize)]
pub struct ApplyOptionResponse {
    pub session_id: Uuid,
    pub document: Resume,
    pub assessment: MatchAssessment,
    pub history_entry: IterationRecord,
    /// True once the score reaches the manual target; the client stops
    /// offering further options.
    pub refine_complete: bool,
    pub score_delta: Option<i16>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub session_id: Uuid,
    pub records: Vec<IterationRecord>,
    pub last_delta: Option<i16>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/optimize/cycle
///
/// Runs exactly one optimization cycle. The caller decides whether to invoke
/// again, typically while the returned score is below the auto target.
pub async fn handle_run_cycle(
    State(state): State<AppState>,
    Json(request): Json<CycleRequest>,
) -> Result<Json<CycleResponse>, AppError> {
    if request.target_description.trim().is_empty() {
        return Err(AppError::Validation(
            "target_description cannot be empty".to_string(),
        ));
    }

    let session_id = request.session_id.unwrap_or_else(Uuid::new_v4);
    let (iteration_count, guard) = begin_cycle(&state, session_id, request.session_id.is_none())?;

    let outcome = controller::run_cycle(
        state.scorer.as_ref(),
        state.content.as_ref(),
        state.gap_bullets.as_ref(),
        &request.resume,
        &request.target_description,
        iteration_count,
    )
    .await;

    let outcome = finish_cycle(&state, session_id, guard, outcome, false)?;
    let score_delta = last_delta(&state, session_id)?;

    Ok(Json(CycleResponse {
        session_id,
        document: outcome.document,
        assessment: outcome.assessment,
        history_entry: outcome.record,
        improvement_summary: outcome.improvement_summary,
        score_delta,
    }))
}

/// POST /api/v1/optimize/options
///
/// Manual refine mode: five themed candidate edit sets. Only available while
/// the score sits in `[90, 98)` — this precondition is caller policy and is
/// enforced here at the boundary, not inside the generator.
pub async fn handle_generate_options(
    State(state): State<AppState>,
    Json(request): Json<OptionsRequest>,
) -> Result<Json<OptionsResponse>, AppError> {
    if request.target_description.trim().is_empty() {
        return Err(AppError::Validation(
            "target_description cannot be empty".to_string(),
        ));
    }

    let score = request.assessment.score;
    if score < MANUAL_FLOOR_SCORE || score >= MANUAL_TARGET_SCORE {
        return Err(AppError::Validation(format!(
            "Manual refine requires a score in [{MANUAL_FLOOR_SCORE}, {MANUAL_TARGET_SCORE}), got {score}"
        )));
    }

    let options = controller::generate_options(
        state.option_source.as_ref(),
        &request.resume,
        &request.target_description,
        &request.gaps,
        &request.assessment,
    )
    .await?;

    Ok(Json(OptionsResponse { options }))
}

/// POST /api/v1/optimize/apply-option
///
/// Applies a manually selected option (append-only), rescores, and records
/// the iteration. `refine_complete` tells the client to stop offering options.
pub async fn handle_apply_option(
    State(state): State<AppState>,
    Json(request): Json<ApplyOptionRequest>,
) -> Result<Json<ApplyOptionResponse>, AppError> {
    if request.target_description.trim().is_empty() {
        return Err(AppError::Validation(
            "target_description cannot be empty".to_string(),
        ));
    }

    let session_id = request.session_id.unwrap_or_else(Uuid::new_v4);
    let (iteration_count, guard) = begin_cycle(&state, session_id, request.session_id.is_none())?;

    let outcome = controller::apply_option(
        state.scorer.as_ref(),
        &request.resume,
        &request.target_description,
        &request.option,
        iteration_count,
    )
    .await;

    let outcome = finish_cycle(&state, session_id, guard, outcome, true)?;
    let score_delta = last_delta(&state, session_id)?;
    let refine_complete = outcome.assessment.score >= MANUAL_TARGET_SCORE;

    Ok(Json(ApplyOptionResponse {
        session_id,
        document: outcome.document,
        assessment: outcome.assessment,
        history_entry: outcome.record,
        refine_complete,
        score_delta,
    }))
}

/// GET /api/v1/optimize/history/:session_id
///
/// Renders the append-only iteration history for a session.
pub async fn handle_get_history(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<HistoryResponse>, AppError> {
    let sessions = state
        .sessions
        .read()
        .map_err(|_| AppError::Internal(anyhow::anyhow!("session store poisoned")))?;

    let session = sessions
        .get(&session_id)
        .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))?;

    Ok(Json(HistoryResponse {
        session_id,
        records: session.history.records().to_vec(),
        last_delta: session.history.last_delta(),
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Session reducer plumbing
// ────────────────────────────────────────────────────────────────────────────

/// Releases a session's in-flight latch if the cycle future is dropped
/// before `finish_cycle` runs. Axum drops handler futures when the client
/// disconnects — often mid-oracle-call — and without this the session would
/// answer 409 to every subsequent request.
struct CycleGuard {
    sessions: Arc<RwLock<HashMap<Uuid, OptimizationState>>>,
    session_id: Uuid,
    armed: bool,
}

impl CycleGuard {
    fn new(sessions: Arc<RwLock<HashMap<Uuid, OptimizationState>>>, session_id: Uuid) -> Self {
        Self {
            sessions,
            session_id,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!(
            "Cycle for session {} dropped before completion; releasing in-flight latch",
            self.session_id
        );
        let Ok(mut sessions) = self.sessions.write() else {
            return;
        };
        if let Some(session) = sessions.get_mut(&self.session_id) {
            if let Ok(reset) = reduce(session, CycleAction::CycleFailed) {
                *session = reset;
            }
        }
    }
}

/// Marks the session's cycle as in flight and returns the iteration count
/// plus the latch guard. Rejects re-entrant triggering while a cycle is
/// running, and unknown session ids supplied by the caller — only
/// `session_id: None` requests open a new session.
fn begin_cycle(
    state: &AppState,
    session_id: Uuid,
    open_new: bool,
) -> Result<(u32, CycleGuard), AppError> {
    let mut sessions = state
        .sessions
        .write()
        .map_err(|_| AppError::Internal(anyhow::anyhow!("session store poisoned")))?;

    let session = if open_new {
        sessions.entry(session_id).or_default()
    } else {
        sessions
            .get_mut(&session_id)
            .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))?
    };
    let started = reduce(session, CycleAction::StartCycle)?;
    let iteration_count = started.iteration_count();
    *session = started;
    Ok((
        iteration_count,
        CycleGuard::new(Arc::clone(&state.sessions), session_id),
    ))
}

/// Feeds the cycle result through the reducer and disarms the latch guard.
/// A failed cycle leaves the session history untouched and re-surfaces the
/// error unmodified.
fn finish_cycle(
    state: &AppState,
    session_id: Uuid,
    guard: CycleGuard,
    outcome: Result<CycleOutcome, AppError>,
    via_option: bool,
) -> Result<CycleOutcome, AppError> {
    let mut sessions = state
        .sessions
        .write()
        .map_err(|_| AppError::Internal(anyhow::anyhow!("session store poisoned")))?;
    let session = sessions
        .get_mut(&session_id)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("session vanished mid-cycle")))?;

    let result = match outcome {
        Ok(outcome) => {
            let action = if via_option {
                CycleAction::OptionApplied {
                    record: outcome.record.clone(),
                    assessment: outcome.assessment.clone(),
                }
            } else {
                CycleAction::CycleSucceeded {
                    record: outcome.record.clone(),
                    assessment: outcome.assessment.clone(),
                }
            };
            *session = reduce(session, action)?;
            Ok(outcome)
        }
        Err(e) => {
            *session = reduce(session, CycleAction::CycleFailed)?;
            Err(e)
        }
    };

    drop(sessions);
    guard.disarm();
    result
}

fn last_delta(state: &AppState, session_id: Uuid) -> Result<Option<i16>, AppError> {
    let sessions = state
        .sessions
        .read()
        .map_err(|_| AppError::Internal(anyhow::anyhow!("session store poisoned")))?;
    Ok(sessions.get(&session_id).and_then(|s| s.history.last_delta()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::resume::{ExperienceEntry, SkillGroup};
    use crate::optimize::reducer::Phase;
    use async_trait::async_trait;

    struct StubScorer(u8);

    #[async_trait]
    impl crate::optimize::scoring::MatchScorer for StubScorer {
        async fn score(&self, _resume: &Resume, _target: &str) -> Result<MatchAssessment, AppError> {
            Ok(MatchAssessment {
                score: self.0,
                strengths: vec![],
                gaps: vec!["Docker experience".to_string()],
            })
        }
    }

    struct StubContent;

    #[async_trait]
    impl crate::optimize::content::ContentGenerator for StubContent {
        async fn rewrite_summary(&self, _current: &str, _target: &str, _gaps: &[String]) -> Result<String, AppError> {
            Ok("REWRITTEN".to_string())
        }

        async fn rewrite_achievements(
            &self,
            _title: &str,
            _company: &str,
            _current: &[String],
            _target: &str,
            _gaps: &[String],
        ) -> Result<Vec<String>, AppError> {
            Ok(vec!["REWRITTEN bullet".to_string()])
        }

        async fn suggest_skills(&self, _skills: &[String], _target: &str) -> Result<Vec<String>, AppError> {
            Ok(vec![])
        }
    }

    /// Scorer stuck on a never-resolving oracle call, for exercising the
    /// client-disconnect path.
    struct HangingScorer;

    #[async_trait]
    impl crate::optimize::scoring::MatchScorer for HangingScorer {
        async fn score(&self, _resume: &Resume, _target: &str) -> Result<MatchAssessment, AppError> {
            std::future::pending::<()>().await;
            unreachable!()
        }
    }

    struct StubGapBullets;

    #[async_trait]
    impl crate::optimize::gap_bullets::GapBulletSource for StubGapBullets {
        async fn bullets_for_gaps(
            &self,
            gaps: &[String],
            _target: &str,
            _context: &str,
        ) -> Result<Vec<String>, AppError> {
            Ok(gaps.iter().map(|g| format!("Demonstrated {g}")).collect())
        }
    }

    struct StubOptions;

    #[async_trait]
    impl crate::optimize::options::OptionSource for StubOptions {
        async fn options(
            &self,
            _resume: &Resume,
            _target: &str,
            gaps: &[String],
            _assessment: &MatchAssessment,
        ) -> Result<Vec<BulletOption>, AppError> {
            Ok((1..=5)
                .map(|i| BulletOption {
                    theme: format!("Theme {i}"),
                    achievements: gaps.iter().map(|g| format!("{i}: {g}")).collect(),
                })
                .collect())
        }
    }

    fn test_state(score: u8) -> AppState {
        AppState {
            config: Config {
                anthropic_api_key: "test-key".to_string(),
                port: 0,
                rust_log: "info".to_string(),
            },
            scorer: Arc::new(StubScorer(score)),
            content: Arc::new(StubContent),
            gap_bullets: Arc::new(StubGapBullets),
            option_source: Arc::new(StubOptions),
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn make_resume() -> Resume {
        Resume {
            summary: "Summary".to_string(),
            experience: vec![ExperienceEntry {
                id: Uuid::new_v4(),
                title: "Engineer".to_string(),
                company: "Acme".to_string(),
                date_range: "2020 – Present".to_string(),
                achievements: vec!["Old".to_string()],
            }],
            skill_groups: vec![SkillGroup {
                category: "Core".to_string(),
                skills: vec!["Rust".to_string()],
            }],
            target_description: String::new(),
        }
    }

    #[tokio::test]
    async fn test_cycle_rejects_empty_target_description() {
        let state = test_state(50);
        let err = handle_run_cycle(
            State(state),
            Json(CycleRequest {
                session_id: None,
                resume: make_resume(),
                target_description: "  ".to_string(),
            }),
        )
        .await
        .err()
        .unwrap();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_cycle_opens_session_and_records_iteration() {
        let state = test_state(50);
        let response = handle_run_cycle(
            State(state.clone()),
            Json(CycleRequest {
                session_id: None,
                resume: make_resume(),
                target_description: "Rust role".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.0.history_entry.iteration_number, 1);
        assert!(response.0.score_delta.is_none());

        let sessions = state.sessions.read().unwrap();
        let session = sessions.get(&response.0.session_id).unwrap();
        assert_eq!(session.iteration_count(), 1);
    }

    #[tokio::test]
    async fn test_second_cycle_reports_score_delta() {
        let state = test_state(60);
        let first = handle_run_cycle(
            State(state.clone()),
            Json(CycleRequest {
                session_id: None,
                resume: make_resume(),
                target_description: "Rust role".to_string(),
            }),
        )
        .await
        .unwrap();

        let second = handle_run_cycle(
            State(state),
            Json(CycleRequest {
                session_id: Some(first.0.session_id),
                resume: first.0.document.clone(),
                target_description: "Rust role".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(second.0.history_entry.iteration_number, 2);
        // Stub scorer is constant, so delta is zero — present, not absent
        assert_eq!(second.0.score_delta, Some(0));
    }

    #[tokio::test]
    async fn test_cycle_with_unknown_session_id_is_404() {
        let state = test_state(50);
        let err = handle_run_cycle(
            State(state),
            Json(CycleRequest {
                session_id: Some(Uuid::new_v4()),
                resume: make_resume(),
                target_description: "Rust role".to_string(),
            }),
        )
        .await
        .err()
        .unwrap();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_disconnect_mid_cycle_releases_session() {
        let state = test_state(50);
        let first = handle_run_cycle(
            State(state.clone()),
            Json(CycleRequest {
                session_id: None,
                resume: make_resume(),
                target_description: "Rust role".to_string(),
            }),
        )
        .await
        .unwrap();
        let session_id = first.0.session_id;

        // A disconnecting client drops the handler future mid-oracle-call.
        let mut hanging = state.clone();
        hanging.scorer = Arc::new(HangingScorer);
        let task = tokio::spawn(handle_run_cycle(
            State(hanging),
            Json(CycleRequest {
                session_id: Some(session_id),
                resume: make_resume(),
                target_description: "Rust role".to_string(),
            }),
        ));

        // Wait until the cycle is latched in flight, then drop it.
        loop {
            {
                let sessions = state.sessions.read().unwrap();
                if sessions.get(&session_id).unwrap().phase == Phase::CycleInFlight {
                    break;
                }
            }
            tokio::task::yield_now().await;
        }
        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        // The latch is released and the dropped cycle left no record.
        let second = handle_run_cycle(
            State(state.clone()),
            Json(CycleRequest {
                session_id: Some(session_id),
                resume: first.0.document.clone(),
                target_description: "Rust role".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(second.0.history_entry.iteration_number, 2);
    }

    #[tokio::test]
    async fn test_options_allowed_at_93() {
        let state = test_state(93);
        let response = handle_generate_options(
            State(state),
            Json(OptionsRequest {
                resume: make_resume(),
                target_description: "Rust role".to_string(),
                gaps: vec!["Docker".to_string()],
                assessment: MatchAssessment {
                    score: 93,
                    strengths: vec![],
                    gaps: vec!["Docker".to_string()],
                },
            }),
        )
        .await
        .unwrap();
        assert_eq!(response.0.options.len(), 5);
    }

    #[tokio::test]
    async fn test_options_rejected_at_85_and_98() {
        for score in [85_u8, 98] {
            let state = test_state(score);
            let err = handle_generate_options(
                State(state),
                Json(OptionsRequest {
                    resume: make_resume(),
                    target_description: "Rust role".to_string(),
                    gaps: vec![],
                    assessment: MatchAssessment {
                        score,
                        strengths: vec![],
                        gaps: vec![],
                    },
                }),
            )
            .await
            .err()
            .unwrap();
            assert!(matches!(err, AppError::Validation(_)), "score {score}");
        }
    }

    #[tokio::test]
    async fn test_apply_option_reports_refine_complete_at_98() {
        let state = test_state(98);
        let response = handle_apply_option(
            State(state),
            Json(ApplyOptionRequest {
                session_id: None,
                resume: make_resume(),
                target_description: "Rust role".to_string(),
                option: BulletOption {
                    theme: "Depth".to_string(),
                    achievements: vec!["Bullet".to_string()],
                },
            }),
        )
        .await
        .unwrap();
        assert!(response.0.refine_complete);
        assert_eq!(response.0.history_entry.iteration_number, 1);
    }

    #[tokio::test]
    async fn test_history_unknown_session_is_404() {
        let state = test_state(50);
        let err = handle_get_history(State(state), Path(Uuid::new_v4()))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_history_lists_records_in_append_order() {
        let state = test_state(70);
        let first = handle_run_cycle(
            State(state.clone()),
            Json(CycleRequest {
                session_id: None,
                resume: make_resume(),
                target_description: "Rust role".to_string(),
            }),
        )
        .await
        .unwrap();

        handle_run_cycle(
            State(state.clone()),
            Json(CycleRequest {
                session_id: Some(first.0.session_id),
                resume: first.0.document.clone(),
                target_description: "Rust role".to_string(),
            }),
        )
        .await
        .unwrap();

        let history = handle_get_history(State(state), Path(first.0.session_id))
            .await
            .unwrap();
        let numbers: Vec<u32> = history
            .0
            .records
            .iter()
            .map(|r| r.iteration_number)
            .collect();
        assert_eq!(numbers, vec![1, 2]);
    }
}
