use crate::assemble::truncate_content;
use crate::cascade::Document;
use crate::text::{html_to_text, ConvertMode};
use crate::types::{ExtractionOutcome, ParseMethod};

/// Last-resort strategy for any page.
///
/// A structured posting that is too short on its own stays at the top and
/// the flattened page text is appended under it, so the labelled fields
/// survive next to whatever the page body adds.
pub fn extract_generic(doc: &Document<'_>) -> Option<ExtractionOutcome> {
    let page = html_to_text(doc.raw(), ConvertMode::Document);
    let page = page.trim();
    let posting = doc
        .structured()
        .map(|posting| posting.to_content())
        .filter(|content| !content.is_empty());

    let (content, method) = match posting {
        Some(posting) if page.is_empty() || posting.chars().count() >= doc.min_chars() => {
            (posting, ParseMethod::GenericJsonLd)
        }
        Some(posting) => (format!("{posting}\n\n{page}"), ParseMethod::GenericJsonLd),
        None => (page.to_string(), ParseMethod::Generic),
    };
    let content = truncate_content(&content, doc.max_chars()).0;
    (!content.is_empty()).then(|| doc.outcome(content, method))
}

/// Strips scripts, styles, page chrome and comments, keeps block structure as
/// line breaks and bullets, and caps the result at `max_chars`.
pub fn clean_document(html: &str, max_chars: usize) -> String {
    let text = html_to_text(html, ConvertMode::Document);
    truncate_content(&text, max_chars).0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::SecurityPolicy;
    use crate::source::JobSource;

    fn policy() -> SecurityPolicy {
        SecurityPolicy::default()
    }

    const SHORT_POSTING: &str = r#"<script type="application/ld+json">
        {"@type":"JobPosting","title":"Backend Engineer","hiringOrganization":{"name":"Acme"},"description":"<p>Build APIs</p>"}
        </script>"#;

    #[test]
    fn short_posting_is_kept_above_page_text() {
        let html = format!(
            "<html><head>{SHORT_POSTING}</head><body><p>Acme builds payment rails for small shops.</p></body></html>"
        );
        let doc = Document::parse(&html, JobSource::Generic, &policy());
        let outcome = extract_generic(&doc).unwrap();
        assert_eq!(outcome.method, ParseMethod::GenericJsonLd);
        assert_eq!(
            outcome.content,
            "JOB TITLE: Backend Engineer\nCOMPANY: Acme\n\nJOB DESCRIPTION:\nBuild APIs\n\n\
             Acme builds payment rails for small shops."
        );
    }

    #[test]
    fn page_without_posting_is_flattened() {
        let doc = Document::parse(
            "<html><body><h1>Careers</h1><p>No openings today.</p></body></html>",
            JobSource::Generic,
            &policy(),
        );
        let outcome = extract_generic(&doc).unwrap();
        assert_eq!(outcome.method, ParseMethod::Generic);
        assert!(outcome.content.contains("No openings today."));
    }

    #[test]
    fn clean_document_caps_output() {
        let html = format!("<body><p>{}</p></body>", "x".repeat(500));
        let text = clean_document(&html, 100);
        assert!(text.starts_with(&"x".repeat(100)));
        assert!(text.ends_with("[Content truncated]"));
    }
}
