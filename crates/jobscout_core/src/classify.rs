use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use thiserror::Error;

use crate::types::FetchResult;

const ACCEPTED_CONTENT_TYPES: [&str; 3] = ["text/html", "application/xhtml", "application/json"];

const LOGIN_INDICATORS: [&str; 8] = [
    "sign in to view",
    "login required",
    "authwall",
    "please log in",
    "log in to view",
    "sign in to continue",
    "join to view",
    "you must be logged in",
];

const JOB_CONTENT_INDICATORS: [&str; 3] = ["job description", "requirements", "responsibilities"];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Rejection {
    #[error("upstream answered {0}: login required or access forbidden")]
    AuthWallOrForbidden(u16),
    #[error("upstream answered 404")]
    NotFound,
    #[error("upstream answered {0}")]
    UpstreamError(u16),
    #[error("unsupported content type {0}")]
    UnsupportedContentType(String),
    #[error("page is behind a login wall")]
    AuthWall,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBody {
    pub text: String,
    pub encoding_label: String,
    /// Malformed byte sequences were replaced with U+FFFD.
    pub had_replacements: bool,
}

/// Decides whether a response is worth extracting and returns its text if so.
pub fn classify(result: &FetchResult) -> Result<DecodedBody, Rejection> {
    match result.status {
        200..=299 => {}
        401 | 403 => return Err(Rejection::AuthWallOrForbidden(result.status)),
        404 => return Err(Rejection::NotFound),
        status => return Err(Rejection::UpstreamError(status)),
    }

    let content_type = result.content_type().unwrap_or_default();
    if !is_accepted_content_type(content_type) {
        let shown = if content_type.is_empty() {
            "(none)".to_string()
        } else {
            content_type.to_string()
        };
        return Err(Rejection::UnsupportedContentType(shown));
    }

    let decoded = decode_body(&result.body, Some(content_type));
    if is_auth_wall(&decoded.text) {
        return Err(Rejection::AuthWall);
    }
    Ok(decoded)
}

fn is_accepted_content_type(content_type: &str) -> bool {
    let lowered = content_type.to_ascii_lowercase();
    ACCEPTED_CONTENT_TYPES
        .iter()
        .any(|accepted| lowered.contains(accepted))
}

pub fn has_login_indicator(lowered: &str) -> bool {
    LOGIN_INDICATORS
        .iter()
        .any(|phrase| lowered.contains(phrase))
}

pub fn has_job_content(lowered: &str) -> bool {
    JOB_CONTENT_INDICATORS
        .iter()
        .any(|phrase| lowered.contains(phrase))
}

/// A login prompt with no job content next to it.
pub fn is_auth_wall(body: &str) -> bool {
    let lowered = body.to_lowercase();
    has_login_indicator(&lowered) && !has_job_content(&lowered)
}

/// Decode raw bytes into UTF-8 using: BOM -> Content-Type charset -> chardetng fallback.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> DecodedBody {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_with(bytes, encoding);
    }

    if let Some(label) = content_type.and_then(extract_charset) {
        if let Some(enc) = Encoding::for_label(label.as_bytes()) {
            return decode_with(bytes, enc);
        }
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let enc = detector.guess(None, true);
    decode_with(bytes, enc)
}

fn extract_charset(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .filter_map(|part| {
            let (key, value) = part.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("charset")
                .then(|| value.trim_matches([' ', '"', '\''].as_ref()).to_string())
        })
        .next()
}

fn decode_with(bytes: &[u8], enc: &'static Encoding) -> DecodedBody {
    let (text, used, had_errors) = enc.decode(bytes);
    DecodedBody {
        text: text.into_owned(),
        encoding_label: used.name().to_string(),
        had_replacements: had_errors,
    }
}
