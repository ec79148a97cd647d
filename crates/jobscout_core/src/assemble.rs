use crate::policy::SecurityPolicy;
use crate::types::{ExtractedPosting, ExtractionOutcome};

pub const TRUNCATION_MARKER: &str = "\n\n[Content truncated]";

/// Cuts `content` to `max_chars` characters and appends [`TRUNCATION_MARKER`].
/// Returns the text and whether it was cut. Re-applying it to its own output
/// yields the same text.
pub fn truncate_content(content: &str, max_chars: usize) -> (String, bool) {
    if let Some(kept) = content.strip_suffix(TRUNCATION_MARKER) {
        if kept.chars().count() <= max_chars {
            return (content.to_string(), true);
        }
    }
    match content.char_indices().nth(max_chars) {
        None => (content.to_string(), false),
        Some((end, _)) => {
            let kept = content[..end].trim_end();
            (format!("{kept}{TRUNCATION_MARKER}"), true)
        }
    }
}

pub fn assemble(outcome: ExtractionOutcome, url: &str, policy: &SecurityPolicy) -> ExtractedPosting {
    let (content, truncated) = truncate_content(outcome.content.trim(), policy.max_content_chars);
    let content_length = content.chars().count();
    ExtractedPosting {
        content,
        source: outcome.source,
        method: outcome.method,
        url: url.to_string(),
        content_length,
        truncated,
    }
}
