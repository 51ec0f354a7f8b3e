//! Bullet option generation — manual refine mode.
//!
//! Produces exactly five independent, differently-themed candidate edit
//! sets, each collectively addressing every outstanding gap, for manual
//! side-by-side selection. The `[90,98)` score window is caller policy and
//! is enforced at the HTTP handler, not here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::models::resume::{render_resume_text, Resume};
use crate::optimize::prompts::{BULLET_OPTIONS_PROMPT_TEMPLATE, CONTENT_SYSTEM};
use crate::optimize::scoring::MatchAssessment;

/// Number of candidate edit sets offered per manual refine request.
pub const OPTION_COUNT: usize = 5;

/// One candidate edit set: a theme plus bullets that together address every
/// outstanding gap. Selecting an option appends its achievements to the
/// first experience entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulletOption {
    pub theme: String,
    pub achievements: Vec<String>,
}

/// Seam for the option oracle.
#[async_trait]
pub trait OptionSource: Send + Sync {
    async fn options(
        &self,
        resume: &Resume,
        target_description: &str,
        gaps: &[String],
        assessment: &MatchAssessment,
    ) -> Result<Vec<BulletOption>, AppError>;
}

/// Claude-backed option generator.
pub struct LlmOptionSource(pub LlmClient);

#[async_trait]
impl OptionSource for LlmOptionSource {
    async fn options(
        &self,
        resume: &Resume,
        target_description: &str,
        gaps: &[String],
        assessment: &MatchAssessment,
    ) -> Result<Vec<BulletOption>, AppError> {
        let gaps_json = serde_json::to_string(gaps).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to serialize gaps: {e}"))
        })?;
        let prompt = BULLET_OPTIONS_PROMPT_TEMPLATE
            .replace("{resume_text}", &render_resume_text(resume))
            .replace("{target_description}", target_description)
            .replace("{gaps_json}", &gaps_json)
            .replace("{score}", &assessment.score.to_string());

        let options: Vec<BulletOption> = self
            .0
            .call_json(&prompt, CONTENT_SYSTEM)
            .await
            .map_err(|e| AppError::Oracle(format!("Option generation failed: {e}")))?;

        if options.len() != OPTION_COUNT {
            return Err(AppError::Validation(format!(
                "Option generation returned {} options, expected {OPTION_COUNT}",
                options.len()
            )));
        }

        if options.iter().any(|o| o.achievements.is_empty()) {
            return Err(AppError::Validation(
                "Option generation returned an option with no achievements".to_string(),
            ));
        }

        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bullet_option_deserializes() {
        let json = r#"{
            "theme": "Technical depth",
            "achievements": ["Deployed services on Kubernetes", "Automated infra with Terraform"]
        }"#;
        let option: BulletOption = serde_json::from_str(json).unwrap();
        assert_eq!(option.theme, "Technical depth");
        assert_eq!(option.achievements.len(), 2);
    }

    #[test]
    fn test_option_count_is_five() {
        assert_eq!(OPTION_COUNT, 5);
    }
}
