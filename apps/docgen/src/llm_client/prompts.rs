// Shared prompt constants and prompt-building utilities.
// Each module that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt used for every outline-shaped request.
pub const OUTLINE_SYSTEM: &str = "You are a professional document assistant \
    who designs clear, well-structured outlines for presentations and documents.";

/// System prompt used when asking for prose section content.
pub const CONTENT_SYSTEM: &str = "You are a professional document writer \
    who produces accurate, informative and well-organised section content.";

/// Appended to every prompt that expects structured output.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    Respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Make sure the JSON can be parsed directly.";
