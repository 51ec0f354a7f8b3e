//! Optimization controller — one full cycle of score → strategy → generate →
//! merge → rescore → record.
//!
//! Flow: score current resume → short-circuit at the auto target → pick
//! strategy from the iteration count alone → generate via the oracles →
//! pure merge into a copy → rescore the copy → emit the iteration record.
//!
//! The controller never loops: each invocation is one discrete,
//! user-re-triggerable cycle, and automatic unattended looping against a
//! paid generation service is deliberately not offered. Whether to run
//! another cycle is caller policy, typically gated on `score <
//! AUTO_TARGET_SCORE` plus explicit user action.
//!
//! No partial commit: every oracle failure aborts the cycle before anything
//! reaches the live document, so a half-applied major rewrite can never
//! become visible.

use chrono::Utc;
use tracing::info;

use crate::errors::AppError;
use crate::models::resume::Resume;
use crate::optimize::content::ContentGenerator;
use crate::optimize::gap_bullets::GapBulletSource;
use crate::optimize::history::IterationRecord;
use crate::optimize::merge::{
    merge, skills_from_gaps, AchievementEdit, EntryRewrite, Improvement,
};
use crate::optimize::options::{BulletOption, OptionSource};
use crate::optimize::scoring::{MatchAssessment, MatchScorer};

/// Convergence threshold for the automatic cycle. At or above this the cycle
/// short-circuits without generating anything.
pub const AUTO_TARGET_SCORE: u8 = 95;

/// Convergence threshold for manual refine mode. Options are offered while
/// the score sits in `[MANUAL_FLOOR_SCORE, MANUAL_TARGET_SCORE)`.
pub const MANUAL_TARGET_SCORE: u8 = 98;

/// Lower bound of the manual refine window.
pub const MANUAL_FLOOR_SCORE: u8 = 90;

/// The two mutually exclusive per-cycle strategies, selected purely by
/// iteration count — never by score magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// First cycle: full rewrite of summary, every entry's achievements, and
    /// a skill suggestion pass.
    MajorRewrite,
    /// Later cycles: additive, gap-targeted edits only.
    GapTargeted,
}

pub fn select_strategy(iteration_count: u32) -> Strategy {
    if iteration_count == 0 {
        Strategy::MajorRewrite
    } else {
        Strategy::GapTargeted
    }
}

/// Result of one completed cycle. The caller commits `document` as the new
/// live resume and feeds `record` to the session reducer.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub document: Resume,
    pub assessment: MatchAssessment,
    pub record: IterationRecord,
    pub improvement_summary: String,
}

/// Runs exactly one optimization cycle against the supplied resume copy.
///
/// Oracle calls are awaited sequentially — including the per-entry rewrite
/// loop — so a failure aborts with a bounded, identifiable subset of work
/// done and nothing merged.
pub async fn run_cycle(
    scorer: &dyn MatchScorer,
    content: &dyn ContentGenerator,
    gap_bullets: &dyn GapBulletSource,
    resume: &Resume,
    target_description: &str,
    iteration_count: u32,
) -> Result<CycleOutcome, AppError> {
    let assessment = scorer.score(resume, target_description).await?;
    info!(
        "Cycle {}: initial score {}/100, {} gaps",
        iteration_count + 1,
        assessment.score,
        assessment.gaps.len()
    );

    // Required short-circuit: at or above the auto target nothing is
    // generated, the iteration is recorded at the current score.
    if assessment.score >= AUTO_TARGET_SCORE {
        let record = IterationRecord {
            iteration_number: iteration_count + 1,
            score: assessment.score,
            timestamp: Utc::now(),
        };
        return Ok(CycleOutcome {
            document: resume.clone(),
            assessment: assessment.clone(),
            improvement_summary: format!(
                "Score {} already meets the {} target — no changes made",
                assessment.score, AUTO_TARGET_SCORE
            ),
            record,
        });
    }

    let strategy = select_strategy(iteration_count);
    let (improvement, improvement_summary) = match strategy {
        Strategy::MajorRewrite => {
            major_rewrite(content, resume, target_description, &assessment.gaps).await?
        }
        Strategy::GapTargeted => {
            gap_targeted(gap_bullets, resume, target_description, &assessment.gaps).await?
        }
    };

    let edited = merge(resume, &improvement);

    // Rescore the edited copy, never the original.
    let new_assessment = scorer.score(&edited, target_description).await?;
    info!(
        "Cycle {}: {:?} complete, score {} -> {}",
        iteration_count + 1,
        strategy,
        assessment.score,
        new_assessment.score
    );

    let record = IterationRecord {
        iteration_number: iteration_count + 1,
        score: new_assessment.score,
        timestamp: Utc::now(),
    };

    Ok(CycleOutcome {
        document: edited,
        assessment: new_assessment,
        record,
        improvement_summary,
    })
}

/// First-cycle strategy: rewrite everything. Summary and every entry's
/// achievement list are replaced unconditionally; suggested skills merge
/// into the first group through the duplicate filter.
async fn major_rewrite(
    content: &dyn ContentGenerator,
    resume: &Resume,
    target_description: &str,
    gaps: &[String],
) -> Result<(Improvement, String), AppError> {
    let summary = content
        .rewrite_summary(&resume.summary, target_description, gaps)
        .await?;

    // Sequential by design: a failure leaves a bounded, identifiable subset
    // of entries processed, and none of it is merged.
    let mut rewrites = Vec::with_capacity(resume.experience.len());
    for entry in &resume.experience {
        let achievements = content
            .rewrite_achievements(
                &entry.title,
                &entry.company,
                &entry.achievements,
                target_description,
                gaps,
            )
            .await?;
        rewrites.push(EntryRewrite {
            entry_id: entry.id,
            achievements,
        });
    }

    let suggested = content
        .suggest_skills(resume.first_group_skills(), target_description)
        .await?;

    let summary_text = format!(
        "Rewrote the summary, replaced achievements for {} experience entries, and suggested {} skills",
        rewrites.len(),
        suggested.len()
    );

    Ok((
        Improvement {
            summary: Some(summary),
            achievements: Some(AchievementEdit::Replace { rewrites }),
            new_skills: suggested,
        },
        summary_text,
    ))
}

/// Later-cycle strategy: purely additive. One bullet per gap appended to the
/// first experience entry, plus skill keywords tokenized from the gaps.
async fn gap_targeted(
    gap_bullets: &dyn GapBulletSource,
    resume: &Resume,
    target_description: &str,
    gaps: &[String],
) -> Result<(Improvement, String), AppError> {
    let context = experience_context(resume);
    let bullets = gap_bullets
        .bullets_for_gaps(gaps, target_description, &context)
        .await?;

    // Count contract re-checked before anything is merged.
    if bullets.len() != gaps.len() {
        return Err(AppError::Validation(format!(
            "Expected one bullet per gap ({} gaps), got {}",
            gaps.len(),
            bullets.len()
        )));
    }

    let new_skills = skills_from_gaps(gaps, resume.first_group_skills());

    let summary_text = format!(
        "Added {} gap-targeted achievements and {} skill keywords",
        bullets.len(),
        new_skills.len()
    );

    Ok((
        Improvement {
            summary: None,
            achievements: Some(AchievementEdit::AppendFirst { bullets }),
            new_skills,
        },
        summary_text,
    ))
}

/// Generates the manual-refine candidate sets. Range-checking the score
/// window is the caller's job (see the options handler).
pub async fn generate_options(
    source: &dyn OptionSource,
    resume: &Resume,
    target_description: &str,
    gaps: &[String],
    assessment: &MatchAssessment,
) -> Result<Vec<BulletOption>, AppError> {
    source
        .options(resume, target_description, gaps, assessment)
        .await
}

/// Applies a manually selected option: append its achievements to the first
/// experience entry, rescore, and emit the iteration record.
pub async fn apply_option(
    scorer: &dyn MatchScorer,
    resume: &Resume,
    target_description: &str,
    option: &BulletOption,
    iteration_count: u32,
) -> Result<CycleOutcome, AppError> {
    let improvement = Improvement {
        summary: None,
        achievements: Some(AchievementEdit::AppendFirst {
            bullets: option.achievements.clone(),
        }),
        new_skills: Vec::new(),
    };

    let edited = merge(resume, &improvement);
    let assessment = scorer.score(&edited, target_description).await?;
    info!(
        "Applied option '{}': score {}/100",
        option.theme, assessment.score
    );

    let record = IterationRecord {
        iteration_number: iteration_count + 1,
        score: assessment.score,
        timestamp: Utc::now(),
    };

    Ok(CycleOutcome {
        document: edited,
        assessment,
        record,
        improvement_summary: format!(
            "Applied option '{}' with {} achievements",
            option.theme,
            option.achievements.len()
        ),
    })
}

/// Flattened experience context handed to the gap bullet oracle.
fn experience_context(resume: &Resume) -> String {
    resume
        .experience
        .iter()
        .map(|entry| {
            format!(
                "{} at {} ({}): {}",
                entry.title,
                entry.company,
                entry.date_range,
                entry.achievements.join("; ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
