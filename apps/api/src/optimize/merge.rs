//! Pure merge rules — applies a cycle's generated content to a resume copy.
//!
//! `merge` never mutates its input. The controller applies it to an
//! in-memory copy and the caller commits that copy only after the whole
//! cycle succeeds, so a failed cycle can never leave a half-applied rewrite.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::resume::Resume;

/// Candidate skill keywords kept per gap-targeted cycle.
pub const MAX_GAP_SKILLS: usize = 5;

/// Replacement achievements for one experience entry, referenced by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryRewrite {
    pub entry_id: Uuid,
    pub achievements: Vec<String>,
}

/// How a cycle edits achievement lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum AchievementEdit {
    /// Full replacement per entry (major rewrite).
    Replace { rewrites: Vec<EntryRewrite> },
    /// Append to the first experience entry only (gap-targeted / option apply).
    /// Existing bullets are preserved as a prefix, in order.
    AppendFirst { bullets: Vec<String> },
}

/// Everything one cycle wants to change. Transient — exists only between
/// generation and merge within a single cycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Improvement {
    /// Replaces the summary unconditionally when present.
    pub summary: Option<String>,
    pub achievements: Option<AchievementEdit>,
    /// Merged into the first skill group only, after the duplicate filter.
    pub new_skills: Vec<String>,
}

/// Applies an improvement to a copy of the resume. Pure: the input resume is
/// untouched and the result is a new value.
pub fn merge(resume: &Resume, improvement: &Improvement) -> Resume {
    let mut edited = resume.clone();

    if let Some(summary) = &improvement.summary {
        edited.summary = summary.clone();
    }

    match &improvement.achievements {
        Some(AchievementEdit::Replace { rewrites }) => {
            for rewrite in rewrites {
                if let Some(entry) = edited.experience.iter_mut().find(|e| e.id == rewrite.entry_id)
                {
                    entry.achievements = rewrite.achievements.clone();
                }
            }
        }
        Some(AchievementEdit::AppendFirst { bullets }) => {
            if let Some(entry) = edited.experience.first_mut() {
                entry.achievements.extend(bullets.iter().cloned());
            }
        }
        None => {}
    }

    if !improvement.new_skills.is_empty() {
        if let Some(group) = edited.skill_groups.first_mut() {
            let kept = filter_new_skills(&group.skills, &improvement.new_skills);
            group.skills.extend(kept);
        }
    }

    edited
}

/// The sole skill de-duplication rule, used everywhere skills are merged.
///
/// A candidate is kept only if no existing skill case-insensitively contains
/// it as a substring AND it does not contain any existing skill (bidirectional
/// containment). Order of kept candidates follows the candidate input order.
pub fn filter_new_skills(existing: &[String], candidates: &[String]) -> Vec<String> {
    // Kept candidates join the comparison set so the merged list can never
    // contain a bidirectional-containment pair.
    let mut seen_lower: Vec<String> = existing.iter().map(|s| s.to_lowercase()).collect();
    let mut kept: Vec<String> = Vec::new();

    for candidate in candidates {
        let candidate_lower = candidate.to_lowercase();
        if candidate_lower.is_empty() {
            continue;
        }

        let duplicate = seen_lower
            .iter()
            .any(|e| e.contains(&candidate_lower) || candidate_lower.contains(e));

        if !duplicate {
            seen_lower.push(candidate_lower);
            kept.push(candidate.clone());
        }
    }

    kept
}

/// Derives candidate skill keywords from gap strings: split on whitespace and
/// commas, keep tokens longer than 3 characters, filter against the existing
/// first-group skills, cap at `MAX_GAP_SKILLS`.
pub fn skills_from_gaps(gaps: &[String], existing: &[String]) -> Vec<String> {
    let tokens: Vec<String> = gaps
        .iter()
        .flat_map(|gap| gap.split(|c: char| c.is_whitespace() || c == ','))
        .filter(|token| token.chars().count() > 3)
        .map(|token| token.to_string())
        .collect();

    filter_new_skills(existing, &tokens)
        .into_iter()
        .take(MAX_GAP_SKILLS)
        .collect()
}
