//! Content generation oracle — rewrites summaries and achievement lists and
//! suggests skills. Outputs are validated for shape only (non-empty, correct
//! element type); truthfulness is the prompt's responsibility.

use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::optimize::prompts::{
    ACHIEVEMENTS_REWRITE_PROMPT_TEMPLATE, CONTENT_SYSTEM, SKILLS_SUGGEST_PROMPT_TEMPLATE,
    SUMMARY_REWRITE_PROMPT_TEMPLATE,
};

/// The content generation seam. One implementation per backend; tests use
/// deterministic stubs.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Rewrites the professional summary. The result replaces the current
    /// summary unconditionally.
    async fn rewrite_summary(
        &self,
        current_summary: &str,
        target_description: &str,
        gaps: &[String],
    ) -> Result<String, AppError>;

    /// Rewrites one experience entry's achievement list as a full
    /// replacement set (6–8 bullets).
    async fn rewrite_achievements(
        &self,
        title: &str,
        company: &str,
        current_achievements: &[String],
        target_description: &str,
        gaps: &[String],
    ) -> Result<Vec<String>, AppError>;

    /// Suggests additional skills drawn from the target description.
    async fn suggest_skills(
        &self,
        current_skills: &[String],
        target_description: &str,
    ) -> Result<Vec<String>, AppError>;
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    summary: String,
}

/// Claude-backed content generator.
pub struct LlmContentGenerator(pub LlmClient);

#[async_trait]
impl ContentGenerator for LlmContentGenerator {
    async fn rewrite_summary(
        &self,
        current_summary: &str,
        target_description: &str,
        gaps: &[String],
    ) -> Result<String, AppError> {
        let gaps_json = to_json(gaps)?;
        let prompt = SUMMARY_REWRITE_PROMPT_TEMPLATE
            .replace("{current_summary}", current_summary)
            .replace("{target_description}", target_description)
            .replace("{gaps_json}", &gaps_json);

        let response: SummaryResponse = self
            .0
            .call_json(&prompt, CONTENT_SYSTEM)
            .await
            .map_err(|e| AppError::Oracle(format!("Summary rewrite failed: {e}")))?;

        if response.summary.trim().is_empty() {
            return Err(AppError::Validation(
                "Summary rewrite returned an empty summary".to_string(),
            ));
        }

        Ok(response.summary)
    }

    async fn rewrite_achievements(
        &self,
        title: &str,
        company: &str,
        current_achievements: &[String],
        target_description: &str,
        gaps: &[String],
    ) -> Result<Vec<String>, AppError> {
        let prompt = ACHIEVEMENTS_REWRITE_PROMPT_TEMPLATE
            .replace("{title}", title)
            .replace("{company}", company)
            .replace("{achievements_json}", &to_json(current_achievements)?)
            .replace("{target_description}", target_description)
            .replace("{gaps_json}", &to_json(gaps)?);

        let bullets: Vec<String> = self
            .0
            .call_json(&prompt, CONTENT_SYSTEM)
            .await
            .map_err(|e| {
                AppError::Oracle(format!("Achievement rewrite for '{title}' failed: {e}"))
            })?;

        if bullets.is_empty() || bullets.iter().any(|b| b.trim().is_empty()) {
            return Err(AppError::Validation(format!(
                "Achievement rewrite for '{title}' returned empty content"
            )));
        }

        Ok(bullets)
    }

    async fn suggest_skills(
        &self,
        current_skills: &[String],
        target_description: &str,
    ) -> Result<Vec<String>, AppError> {
        let prompt = SKILLS_SUGGEST_PROMPT_TEMPLATE
            .replace("{current_skills_json}", &to_json(current_skills)?)
            .replace("{target_description}", target_description);

        let skills: Vec<String> = self
            .0
            .call_json(&prompt, CONTENT_SYSTEM)
            .await
            .map_err(|e| AppError::Oracle(format!("Skill suggestion failed: {e}")))?;

        Ok(skills
            .into_iter()
            .filter(|s| !s.trim().is_empty())
            .collect())
    }
}

fn to_json(values: &[String]) -> Result<String, AppError> {
    serde_json::to_string(values)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize prompt input: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_response_deserializes() {
        let json = r#"{"summary": "Seasoned Rust engineer."}"#;
        let response: SummaryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.summary, "Seasoned Rust engineer.");
    }

    #[test]
    fn test_to_json_preserves_order() {
        let values = vec!["Docker".to_string(), "Kubernetes".to_string()];
        assert_eq!(to_json(&values).unwrap(), r#"["Docker","Kubernetes"]"#);
    }
}
