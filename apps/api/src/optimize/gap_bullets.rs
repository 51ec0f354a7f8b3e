//! Gap bullet generation — exactly one new achievement line per outstanding
//! gap, for additive insertion into the first experience entry.
//!
//! HARD CONTRACT: the returned array length must equal `gaps.len()`.
//! A count mismatch is a `Validation` error, never papered over with
//! placeholder text.

use async_trait::async_trait;

use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::optimize::prompts::{CONTENT_SYSTEM, GAP_BULLETS_PROMPT_TEMPLATE};

/// Seam for the gap-targeted bullet oracle.
#[async_trait]
pub trait GapBulletSource: Send + Sync {
    /// Returns one achievement bullet per gap. Order-correspondence is not
    /// guaranteed; count-correspondence is.
    async fn bullets_for_gaps(
        &self,
        gaps: &[String],
        target_description: &str,
        experience_context: &str,
    ) -> Result<Vec<String>, AppError>;
}

/// Claude-backed gap bullet generator.
pub struct LlmGapBulletSource(pub LlmClient);

#[async_trait]
impl GapBulletSource for LlmGapBulletSource {
    async fn bullets_for_gaps(
        &self,
        gaps: &[String],
        target_description: &str,
        experience_context: &str,
    ) -> Result<Vec<String>, AppError> {
        if gaps.is_empty() {
            return Ok(Vec::new());
        }

        let gaps_json = serde_json::to_string(gaps).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to serialize gaps: {e}"))
        })?;
        let prompt = GAP_BULLETS_PROMPT_TEMPLATE
            .replace("{gaps_json}", &gaps_json)
            .replace("{target_description}", target_description)
            .replace("{experience_context}", experience_context);

        let bullets: Vec<String> = self
            .0
            .call_json(&prompt, CONTENT_SYSTEM)
            .await
            .map_err(|e| AppError::Oracle(format!("Gap bullet generation failed: {e}")))?;

        if bullets.len() != gaps.len() {
            return Err(AppError::Validation(format!(
                "Gap bullet generation returned {} bullets for {} gaps",
                bullets.len(),
                gaps.len()
            )));
        }

        Ok(bullets)
    }
}
