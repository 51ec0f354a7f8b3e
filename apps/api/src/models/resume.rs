//! Resume data model — the structured document the optimization loop edits.
//!
//! The resume is owned by the surrounding editor; the controller borrows it
//! for one cycle, produces an edited copy, and the caller commits that copy.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The structured resume being optimized against a target job description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resume {
    pub summary: String,
    pub experience: Vec<ExperienceEntry>,
    pub skill_groups: Vec<SkillGroup>,
    pub target_description: String,
}

/// One work-experience entry. `id` is stable and unique for the resume's
/// lifetime — improvements reference entries by id, never by index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub date_range: String,
    pub achievements: Vec<String>,
}

/// A named group of skills, e.g. "Languages" or "Infrastructure".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillGroup {
    pub category: String,
    pub skills: Vec<String>,
}

impl Resume {
    /// Skills in the first group — the only group skill merges touch.
    pub fn first_group_skills(&self) -> &[String] {
        self.skill_groups
            .first()
            .map(|g| g.skills.as_slice())
            .unwrap_or(&[])
    }
}

/// Renders the resume as flat text for scoring.
///
/// The scoring oracle consumes a textual rendering of summary + experience +
/// skills rather than the structured document.
pub fn render_resume_text(resume: &Resume) -> String {
    let mut text = String::new();

    if !resume.summary.trim().is_empty() {
        text.push_str("SUMMARY\n");
        text.push_str(&resume.summary);
        text.push_str("\n\n");
    }

    if !resume.experience.is_empty() {
        text.push_str("EXPERIENCE\n");
        for entry in &resume.experience {
            text.push_str(&format!(
                "{} — {} ({})\n",
                entry.title, entry.company, entry.date_range
            ));
            for achievement in &entry.achievements {
                text.push_str(&format!("- {achievement}\n"));
            }
            text.push('\n');
        }
    }

    if !resume.skill_groups.is_empty() {
        text.push_str("SKILLS\n");
        for group in &resume.skill_groups {
            text.push_str(&format!("{}: {}\n", group.category, group.skills.join(", ")));
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_resume() -> Resume {
        Resume {
            summary: "Backend engineer with 6 years of experience.".to_string(),
            experience: vec![
                ExperienceEntry {
                    id: Uuid::new_v4(),
                    title: "Senior Engineer".to_string(),
                    company: "Acme Corp".to_string(),
                    date_range: "2021 – Present".to_string(),
                    achievements: vec![
                        "Led migration to event-driven architecture".to_string(),
                        "Reduced API latency by 35%".to_string(),
                    ],
                },
                ExperienceEntry {
                    id: Uuid::new_v4(),
                    title: "Software Engineer".to_string(),
                    company: "Initech".to_string(),
                    date_range: "2018 – 2021".to_string(),
                    achievements: vec!["Built internal billing service".to_string()],
                },
            ],
            skill_groups: vec![
                SkillGroup {
                    category: "Languages".to_string(),
                    skills: vec!["Rust".to_string(), "Python".to_string()],
                },
                SkillGroup {
                    category: "Infrastructure".to_string(),
                    skills: vec!["PostgreSQL".to_string()],
                },
            ],
            target_description: "Senior Rust engineer for distributed systems.".to_string(),
        }
    }

    #[test]
    fn test_render_includes_all_sections() {
        let text = render_resume_text(&sample_resume());
        assert!(text.contains("SUMMARY"));
        assert!(text.contains("EXPERIENCE"));
        assert!(text.contains("SKILLS"));
        assert!(text.contains("Senior Engineer — Acme Corp"));
        assert!(text.contains("- Reduced API latency by 35%"));
        assert!(text.contains("Languages: Rust, Python"));
    }

    #[test]
    fn test_render_skips_empty_summary() {
        let mut resume = sample_resume();
        resume.summary = "  ".to_string();
        let text = render_resume_text(&resume);
        assert!(!text.contains("SUMMARY"));
    }

    #[test]
    fn test_first_group_skills_empty_when_no_groups() {
        let mut resume = sample_resume();
        resume.skill_groups.clear();
        assert!(resume.first_group_skills().is_empty());
    }

    #[test]
    fn test_resume_roundtrips_through_json() {
        let resume = sample_resume();
        let json = serde_json::to_string(&resume).unwrap();
        let recovered: Resume = serde_json::from_str(&json).unwrap();
        assert_eq!(recovered.experience.len(), 2);
        assert_eq!(recovered.experience[0].id, resume.experience[0].id);
        assert_eq!(recovered.skill_groups[0].skills, resume.skill_groups[0].skills);
    }
}
