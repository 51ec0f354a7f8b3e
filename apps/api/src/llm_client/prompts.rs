// Shared prompt constants and prompt-building utilities.
// Each oracle adapter defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Instruction demanding specific, individually actionable gap descriptions.
/// Every downstream generator assumes each gap string can be addressed on
/// its own, so vague categories ("better soft skills") are forbidden here.
pub const ACTIONABLE_GAPS_INSTRUCTION: &str = "\
    Each gap MUST name one specific, addressable deficiency — a concrete \
    technology, skill, or experience the resume lacks for this role \
    (e.g. 'Kubernetes deployment experience'). \
    NEVER return vague categories such as 'improve wording' or 'more impact'.";
