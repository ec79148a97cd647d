use std::fmt;

use crate::source::JobSource;

/// Raw response handed from the fetcher to the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub status: u16,
    pub final_url: String,
    /// Header names are stored lowercased.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl FetchResult {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseMethod {
    JsonLd,
    SiteSpecific,
    GenericJsonLd,
    Generic,
    PortalApi,
}

impl ParseMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            ParseMethod::JsonLd => "json-ld",
            ParseMethod::SiteSpecific => "site-specific",
            ParseMethod::GenericJsonLd => "generic-json-ld",
            ParseMethod::Generic => "generic",
            ParseMethod::PortalApi => "api",
        }
    }

    pub fn is_generic(self) -> bool {
        matches!(self, ParseMethod::Generic | ParseMethod::GenericJsonLd)
    }
}

impl fmt::Display for ParseMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text produced by one extraction strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionOutcome {
    pub content: String,
    pub source: JobSource,
    pub method: ParseMethod,
}

impl ExtractionOutcome {
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// Final, length-bounded result of a successful extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPosting {
    pub content: String,
    pub source: JobSource,
    pub method: ParseMethod,
    pub url: String,
    pub content_length: usize,
    pub truncated: bool,
}
