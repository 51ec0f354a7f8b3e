//! Match scoring — pluggable, trait-based scorer that rates a resume against
//! a target job description.
//!
//! Default: `LlmMatchScorer` (Claude-backed). Tests use deterministic stubs —
//! the oracle is generative and non-deterministic, so assertions are on
//! shape and merge invariants only, never on generated text.
//!
//! `AppState` holds an `Arc<dyn MatchScorer>`, swapped at startup.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::llm_client::prompts::ACTIONABLE_GAPS_INSTRUCTION;
use crate::llm_client::LlmClient;
use crate::models::resume::{render_resume_text, Resume};
use crate::optimize::prompts::{SCORE_PROMPT_TEMPLATE, SCORE_SYSTEM};

/// Assessment of how well a resume matches a target description.
/// Produced fresh on every scoring call; never mutated, only superseded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchAssessment {
    /// 0–100.
    pub score: u8,
    pub strengths: Vec<String>,
    /// Specific, individually addressable deficiencies. Every downstream
    /// generator assumes each gap string is actionable on its own.
    pub gaps: Vec<String>,
}

/// The scoring oracle seam. Implement this to swap backends without touching
/// the controller or handlers.
///
/// Carried in `AppState` as `Arc<dyn MatchScorer>`. No retries are performed
/// by implementations — a failure aborts the caller's cycle.
#[async_trait]
pub trait MatchScorer: Send + Sync {
    async fn score(
        &self,
        resume: &Resume,
        target_description: &str,
    ) -> Result<MatchAssessment, AppError>;
}

/// Wire shape of the scoring oracle's response.
#[derive(Debug, Deserialize)]
struct ScoreResponse {
    match_score: i64,
    strengths: Vec<String>,
    gaps: Vec<String>,
}

/// Claude-backed match scorer. Renders the resume to flat text and sends the
/// scoring rubric; the oracle's internals are opaque.
pub struct LlmMatchScorer(pub LlmClient);

#[async_trait]
impl MatchScorer for LlmMatchScorer {
    async fn score(
        &self,
        resume: &Resume,
        target_description: &str,
    ) -> Result<MatchAssessment, AppError> {
        let resume_text = render_resume_text(resume);
        let prompt = SCORE_PROMPT_TEMPLATE
            .replace("{actionable_gaps_instruction}", ACTIONABLE_GAPS_INSTRUCTION)
            .replace("{resume_text}", &resume_text)
            .replace("{target_description}", target_description);

        let response: ScoreResponse = self
            .0
            .call_json(&prompt, SCORE_SYSTEM)
            .await
            .map_err(|e| AppError::Oracle(format!("Match scoring failed: {e}")))?;

        Ok(MatchAssessment {
            score: response.match_score.clamp(0, 100) as u8,
            strengths: response.strengths,
            gaps: response.gaps,
        })
    }
}
