//! Generated-response extraction and code-quality heuristics.
//!
//! The generation service is asked for pure Manim source, but responses
//! sometimes arrive wrapped in explanatory prose around a fenced code
//! block. [`extract_code_block`] pulls out the first fenced payload;
//! [`CodeValidator`] is the pluggable "does this look like code?" check
//! the generation client consults before accepting a response. The
//! heuristic is best-effort only — the renderer is the real correctness
//! oracle.

use std::sync::OnceLock;

use regex::Regex;

/// Minimum number of lines below which a response is assumed to be prose
/// or a truncated fragment rather than a complete Manim program.
pub const MIN_CODE_LINES: usize = 10;

/// Conversational lead-ins that indicate the model is explaining rather
/// than emitting pure code.
const LEAD_IN_PHRASES: &[&str] = &["Here's", "Here is", "I'll", "Certainly"];

// ---------------------------------------------------------------------------
// Fenced-block extraction
// ---------------------------------------------------------------------------

fn fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```(?:python)?\n(.*?)```").expect("fence regex is valid")
    })
}

/// Extract a single code payload from a possibly noisy response.
///
/// Returns the content of the first fenced code block (with or without a
/// `python` language tag). If the response contains no fence, the raw
/// response is returned verbatim.
pub fn extract_code_block(response: &str) -> String {
    match fence_regex().captures(response) {
        Some(caps) => caps[1].to_string(),
        None => response.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Quality heuristic
// ---------------------------------------------------------------------------

/// Pluggable acceptance check for generated source text.
pub trait CodeValidator: Send + Sync {
    /// Whether `text` looks like a usable program rather than prose.
    fn is_acceptable(&self, text: &str) -> bool;
}

/// Line-count and lead-in-phrase sniffing.
///
/// Rejects responses shorter than `min_lines` or containing a
/// conversational lead-in anywhere in the text.
pub struct HeuristicValidator {
    pub min_lines: usize,
}

impl Default for HeuristicValidator {
    fn default() -> Self {
        Self {
            min_lines: MIN_CODE_LINES,
        }
    }
}

impl CodeValidator for HeuristicValidator {
    fn is_acceptable(&self, text: &str) -> bool {
        if text.lines().count() < self.min_lines {
            return false;
        }
        !LEAD_IN_PHRASES.iter().any(|phrase| text.contains(phrase))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
