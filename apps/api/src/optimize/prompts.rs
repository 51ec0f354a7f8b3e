// All LLM prompt constants for the optimization module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for match scoring — enforces JSON-only output.
pub const SCORE_SYSTEM: &str =
    "You are an expert resume reviewer and hiring strategist. \
    Rate how well a resume matches a target job description. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Match scoring prompt template.
/// Replace: {actionable_gaps_instruction}, {resume_text}, {target_description}
pub const SCORE_PROMPT_TEMPLATE: &str = r#"Rate how well the following resume matches the target job description.

Score out of 100 using this EXACT rubric:
- Keyword match (max 40 points): technical terms (max 20), domain terminology (max 10), industry buzzwords (max 10)
- Skills overlap (max 30 points): required skills present in the resume
- Experience relevance (max 20 points): how directly the stated experience applies to the role
- Completeness of coverage (max 10 points): how much of the job description the resume addresses

{actionable_gaps_instruction}

Return a JSON object with this EXACT schema (no extra fields):
{
  "match_score": 72,
  "strengths": ["Strong distributed systems background", "Rust listed prominently"],
  "gaps": ["Kubernetes deployment experience", "Terraform infrastructure-as-code"]
}

TARGET JOB DESCRIPTION:
{target_description}

RESUME:
{resume_text}"#;

/// System prompt for all content generation calls — enforces JSON-only output.
pub const CONTENT_SYSTEM: &str = "You are an expert resume writer producing \
    concise, achievement-oriented resume content tailored to a target role. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT invent employers, titles, or dates not present in the input.";

/// Summary rewrite prompt template.
/// Replace: {current_summary}, {target_description}, {gaps_json}
pub const SUMMARY_REWRITE_PROMPT_TEMPLATE: &str = r#"Rewrite this professional summary to better match the target job description.

Keep it to 2-4 sentences. Preserve the candidate's actual seniority and field.
Weave in the listed gaps only where the current summary plausibly supports them.

CURRENT SUMMARY:
{current_summary}

TARGET JOB DESCRIPTION:
{target_description}

GAPS TO ADDRESS:
{gaps_json}

Return a JSON object:
{
  "summary": "The rewritten summary text"
}"#;

/// Achievement rewrite prompt template (full replacement of one entry's bullets).
/// Replace: {title}, {company}, {achievements_json}, {target_description}, {gaps_json}
pub const ACHIEVEMENTS_REWRITE_PROMPT_TEMPLATE: &str = r#"Rewrite the achievement bullets for this work experience entry to better match the target job description.

ROLE: {title} at {company}

CURRENT ACHIEVEMENTS:
{achievements_json}

TARGET JOB DESCRIPTION:
{target_description}

GAPS TO ADDRESS:
{gaps_json}

Rules:
1. Return 6 to 8 bullets — a full replacement set for this entry
2. Every bullet starts with a strong action verb and quantifies impact where the input supports it
3. Reframe existing accomplishments toward the target role; do NOT fabricate new ones
4. Address the listed gaps only where the current achievements plausibly support them

Return a JSON array of strings:
["Rewritten bullet one", "Rewritten bullet two"]"#;

/// Skill suggestion prompt template.
/// Replace: {current_skills_json}, {target_description}
pub const SKILLS_SUGGEST_PROMPT_TEMPLATE: &str = r#"Suggest additional skills for this resume based on the target job description.

CURRENT SKILLS:
{current_skills_json}

TARGET JOB DESCRIPTION:
{target_description}

Rules:
1. Suggest only skills named or clearly implied by the job description
2. Do NOT repeat skills already listed
3. Use the exact skill names as they appear in the job description
4. Order by relevance, most relevant first

Return a JSON array of strings:
["Kubernetes", "Terraform"]"#;

/// Gap bullet prompt template — one bullet per outstanding gap.
/// Replace: {gaps_json}, {target_description}, {experience_context}
pub const GAP_BULLETS_PROMPT_TEMPLATE: &str = r#"Write exactly ONE new achievement bullet for EACH gap listed below, grounded in the candidate's experience context.

GAPS (one bullet per gap — the returned array MUST have exactly this many elements):
{gaps_json}

TARGET JOB DESCRIPTION:
{target_description}

EXPERIENCE CONTEXT:
{experience_context}

Rules:
1. Return EXACTLY one bullet per gap — same array length as the gaps list
2. Each bullet starts with a strong action verb
3. Ground every bullet in the experience context; reframe, never fabricate
4. Each bullet directly demonstrates the corresponding gap

Return a JSON array of strings:
["Bullet addressing the first gap", "Bullet addressing the second gap"]"#;

/// Bullet option prompt template — five independent candidate edit sets.
/// Replace: {resume_text}, {target_description}, {gaps_json}, {score}
pub const BULLET_OPTIONS_PROMPT_TEMPLATE: &str = r#"The resume below scores {score}/100 against the target job description. Produce 5 independent, differently-themed sets of achievement bullets for manual side-by-side selection.

GAPS — every option's bullets must collectively address ALL of these:
{gaps_json}

TARGET JOB DESCRIPTION:
{target_description}

RESUME:
{resume_text}

Rules:
1. Return EXACTLY 5 options
2. Each option has a short distinct theme (e.g. "Technical depth", "Leadership", "Delivery velocity")
3. Each option's achievements, taken together, cover every listed gap
4. Ground every bullet in the resume content; reframe, never fabricate
5. Options must differ meaningfully in emphasis, not just wording

Return a JSON array:
[
  {
    "theme": "Technical depth",
    "achievements": ["Bullet one", "Bullet two", "Bullet three"]
  }
]"#;
