//! Prompt text for the code-generation calls.
//!
//! Three shapes: a fresh request for a topic, a correction request
//! embedding the previous failure detail, and the stricter fallback used
//! when a response fails the quality heuristic.

/// System prompt for the primary generation call.
pub const CODEGEN_SYSTEM_PROMPT: &str = "You are a math visualization expert who \
creates Manim code. Only respond with complete, working Python code for Manim, \
no explanations.";

/// System prompt for the one stricter retry after a heuristic miss.
pub const STRICT_SYSTEM_PROMPT: &str = "You MUST ONLY output complete Python code \
for Manim. NO explanations, NO comments, NO conversation.";

/// User prompt for a fresh generation request.
pub fn fresh_prompt(topic: &str) -> String {
    format!(
        "Explain {topic} by generating Manim video code. The video must render in \
         a single take. Return ONLY the Python code for Manim with no explanations \
         or anything else."
    )
}

/// User prompt for a correction request, biased toward fixing the
/// previous attempt's failure.
pub fn correction_prompt(topic: &str, prior_error: &str) -> String {
    format!(
        "The previous Manim program for {topic} failed to render. Generate a \
         corrected, complete program that avoids the failure below. Return ONLY \
         the Python code for Manim.\n\nFailure detail:\n{prior_error}"
    )
}

/// User prompt for the stricter secondary call.
pub fn strict_prompt(topic: &str) -> String {
    format!(
        "Generate ONLY the complete Python Manim code to visualize {topic}. DO NOT \
         include any explanations, just the full working code."
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
