//! Ordered extraction strategies.
//!
//! Strategies are plain functions evaluated in [`STRATEGIES`] order; the
//! first one returning `Some` wins. A winner that is too short gets one more
//! chance through the generic strategy before the page is declared empty,
//! and the failure reports the longest candidate seen.

use scraper::Html;
use serde_json::Value;

use crate::failure::FailureKind;
use crate::generic::extract_generic;
use crate::policy::SecurityPolicy;
use crate::posting::JobPosting;
use crate::sites::extract_site_specific;
use crate::source::JobSource;
use crate::structured::{extract_structured, find_job_posting, posting_from_json_ld};
use crate::types::{ExtractionOutcome, ParseMethod};

pub type Strategy = fn(&Document<'_>) -> Option<ExtractionOutcome>;

pub const STRATEGIES: [Strategy; 3] = [structured_strategy, site_strategy, extract_generic];

/// A decoded response body parsed once and shared by every strategy.
pub struct Document<'a> {
    raw: &'a str,
    html: Html,
    json: Option<Value>,
    source: JobSource,
    min_chars: usize,
    max_chars: usize,
}

impl<'a> Document<'a> {
    pub fn parse(raw: &'a str, source: JobSource, policy: &SecurityPolicy) -> Self {
        let trimmed = raw.trim();
        let json = if trimmed.starts_with('{') || trimmed.starts_with('[') {
            serde_json::from_str(trimmed).ok()
        } else {
            None
        };
        Self {
            raw,
            html: Html::parse_document(raw),
            json,
            source,
            min_chars: policy.min_content_chars,
            max_chars: policy.max_content_chars,
        }
    }

    pub fn raw(&self) -> &str {
        self.raw
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    pub fn source(&self) -> JobSource {
        self.source
    }

    pub fn min_chars(&self) -> usize {
        self.min_chars
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// The first `JobPosting` object, whether the body is JSON or HTML with JSON-LD.
    pub fn structured(&self) -> Option<JobPosting> {
        self.json
            .as_ref()
            .and_then(find_job_posting)
            .map(posting_from_json_ld)
            .filter(|posting| !posting.is_empty())
            .or_else(|| extract_structured(&self.html))
    }

    pub fn outcome(&self, content: String, method: ParseMethod) -> ExtractionOutcome {
        ExtractionOutcome {
            content: content.trim().to_string(),
            source: self.source,
            method,
        }
    }
}

fn structured_strategy(doc: &Document<'_>) -> Option<ExtractionOutcome> {
    let content = doc.structured()?.to_content();
    (!content.is_empty()).then(|| doc.outcome(content, ParseMethod::JsonLd))
}

fn site_strategy(doc: &Document<'_>) -> Option<ExtractionOutcome> {
    let posting = extract_site_specific(doc.html(), doc.source())?;
    Some(doc.outcome(posting.to_content(), ParseMethod::SiteSpecific))
}

/// First strategy that produces anything, without length validation.
pub fn run_strategies(doc: &Document<'_>) -> Option<ExtractionOutcome> {
    STRATEGIES.iter().find_map(|strategy| strategy(doc))
}

/// Runs the cascade over a decoded body and enforces the minimum length.
pub fn extract_posting(
    raw: &str,
    source: JobSource,
    policy: &SecurityPolicy,
) -> Result<ExtractionOutcome, FailureKind> {
    let doc = Document::parse(raw, source, policy);
    let min = policy.min_content_chars;

    let best = match run_strategies(&doc) {
        Some(outcome) if outcome.char_len() >= min => return Ok(outcome),
        Some(outcome) if !outcome.method.is_generic() => match extract_generic(&doc) {
            Some(generic) if generic.char_len() >= min => return Ok(generic),
            Some(generic) if generic.char_len() > outcome.char_len() => Some(generic),
            _ => Some(outcome),
        },
        other => other,
    };

    Err(FailureKind::InsufficientContent {
        length: best.map_or(0, |outcome| outcome.char_len()),
        min,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> SecurityPolicy {
        SecurityPolicy::default()
    }

    #[test]
    fn structured_data_wins_over_site_layout() {
        let html = format!(
            r#"<html><head><script type="application/ld+json">
            {{"@type":"JobPosting","title":"SRE","hiringOrganization":{{"name":"Acme"}},"description":"{}"}}
            </script></head><body><h1 class="top-card-layout__title">Other</h1>
            <div class="description__text">Other body</div></body></html>"#,
            "Keep the lights on. ".repeat(10)
        );
        let outcome = extract_posting(&html, JobSource::Linkedin, &policy()).unwrap();
        assert_eq!(outcome.method, ParseMethod::JsonLd);
        assert!(outcome.content.starts_with("JOB TITLE: SRE\nCOMPANY: Acme"));
    }

    #[test]
    fn short_site_result_falls_back_to_generic() {
        let filler = "Generic paragraph text that is long enough to count. ".repeat(4);
        let html = format!(
            r#"<html><body><h1 data-test="job-title">Chef</h1>
            <div data-test="employer-name">Bistro</div><section><p>{filler}</p></section></body></html>"#
        );
        let outcome = extract_posting(&html, JobSource::Glassdoor, &policy()).unwrap();
        assert_eq!(outcome.method, ParseMethod::Generic);
        assert_eq!(outcome.source, JobSource::Glassdoor);
        assert!(outcome.content.contains("Bistro"));
    }

    #[test]
    fn json_body_is_searched_for_postings() {
        let body = format!(
            r#"{{"data":{{"@type":"JobPosting","title":"Analyst","description":"{}"}}}}"#,
            "Analyse things daily. ".repeat(8)
        );
        let outcome = extract_posting(&body, JobSource::Generic, &policy()).unwrap();
        assert_eq!(outcome.method, ParseMethod::JsonLd);
        assert!(outcome.content.starts_with("JOB TITLE: Analyst"));
    }

    #[test]
    fn insufficient_content_reports_longest_candidate() {
        let html = r#"<html><head><script type="application/ld+json">
            {"@type":"JobPosting","title":"Backend Engineer","hiringOrganization":{"name":"Acme"},"description":"<p>Build APIs</p>"}
            </script></head><body></body></html>"#;
        let err = extract_posting(html, JobSource::Generic, &policy()).unwrap_err();
        // "JOB TITLE: Backend Engineer\nCOMPANY: Acme\n\nJOB DESCRIPTION:\nBuild APIs"
        assert_eq!(err, FailureKind::InsufficientContent { length: 70, min: 100 });
    }

    #[test]
    fn empty_page_is_insufficient() {
        let err = extract_posting("<html><body></body></html>", JobSource::Generic, &policy())
            .unwrap_err();
        assert_eq!(err, FailureKind::InsufficientContent { length: 0, min: 100 });
    }
}
