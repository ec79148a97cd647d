//! Schema.org `JobPosting` objects embedded as JSON-LD.

use scraper::{Html, Selector};
use serde_json::{Map, Value};

use crate::posting::JobPosting;
use crate::text::{clean_inline, fragment_to_text};

const JOB_POSTING_TYPE: &str = "JobPosting";

/// Scans every JSON-LD block of the page and returns the first `JobPosting`.
pub fn extract_structured(doc: &Html) -> Option<JobPosting> {
    let selector = Selector::parse(r#"script[type*="ld+json"]"#).ok()?;
    doc.select(&selector)
        .filter_map(|script| parse_json_ld(&script.text().collect::<String>()))
        .find_map(|value| find_job_posting(&value).map(posting_from_json_ld))
        .filter(|posting| !posting.is_empty())
}

/// Depth-first search through arrays, `@graph` containers and nested values.
pub fn find_job_posting(value: &Value) -> Option<&Value> {
    match value {
        Value::Object(map) => {
            if map.get("@type").is_some_and(|t| matches_type(t, JOB_POSTING_TYPE)) {
                return Some(value);
            }
            if let Some(found) = map.get("@graph").and_then(find_job_posting) {
                return Some(found);
            }
            map.values().find_map(find_job_posting)
        }
        Value::Array(items) => items.iter().find_map(find_job_posting),
        _ => None,
    }
}

pub fn posting_from_json_ld(value: &Value) -> JobPosting {
    let Some(map) = value.as_object() else {
        return JobPosting::default();
    };

    JobPosting {
        title: map
            .get("title")
            .or_else(|| map.get("name"))
            .and_then(plain_text),
        company: map.get("hiringOrganization").and_then(organization_name),
        location: location(map),
        employment_type: map.get("employmentType").and_then(employment_type),
        seniority: None,
        salary: map
            .get("baseSalary")
            .or_else(|| map.get("estimatedSalary"))
            .and_then(salary),
        status: None,
        description: map
            .get("description")
            .and_then(Value::as_str)
            .map(fragment_to_text)
            .filter(|text| !text.is_empty()),
        requirements: requirements(map),
    }
}

pub(crate) fn parse_json_ld(raw: &str) -> Option<Value> {
    let trimmed = raw
        .trim()
        .trim_start_matches("<!--")
        .trim_end_matches("-->")
        .trim()
        .trim_start_matches("<![CDATA[")
        .trim_end_matches("]]>")
        .trim();
    if trimmed.is_empty() {
        return None;
    }
    serde_json::from_str(trimmed).ok().or_else(|| {
        // Raw control characters inside strings are the usual reason publishers' JSON-LD fails.
        let relaxed: String = trimmed
            .chars()
            .map(|ch| if ch.is_control() { ' ' } else { ch })
            .collect();
        serde_json::from_str(&relaxed).ok()
    })
}

fn matches_type(value: &Value, expected: &str) -> bool {
    match value {
        Value::String(s) => s
            .rsplit(['/', ':'])
            .next()
            .is_some_and(|name| name.eq_ignore_ascii_case(expected)),
        Value::Array(items) => items.iter().any(|v| matches_type(v, expected)),
        _ => false,
    }
}

fn plain_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => fragment_to_text(s),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let text = clean_inline(&text);
    (!text.is_empty()).then_some(text)
}

fn organization_name(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => map.get("name").and_then(plain_text),
        Value::Array(items) => items.iter().find_map(organization_name),
        other => plain_text(other),
    }
}

fn location(map: &Map<String, Value>) -> Option<String> {
    let mut places: Vec<String> = match map.get("jobLocation") {
        Some(Value::Array(items)) => items.iter().filter_map(place).collect(),
        Some(single) => place(single).into_iter().collect(),
        None => Vec::new(),
    };
    places.dedup();

    let remote = map
        .get("jobLocationType")
        .and_then(Value::as_str)
        .is_some_and(|kind| kind.eq_ignore_ascii_case("TELECOMMUTE"));
    if remote {
        places.push("Remote".to_string());
    }

    (!places.is_empty()).then(|| places.join(" | "))
}

fn place(value: &Value) -> Option<String> {
    let address = match value {
        Value::Object(map) => map.get("address").unwrap_or(value),
        other => other,
    };
    match address {
        Value::String(_) => plain_text(address),
        Value::Object(parts) => {
            let mut pieces: Vec<String> = Vec::new();
            for key in ["addressLocality", "addressRegion", "addressCountry"] {
                let piece = match parts.get(key) {
                    Some(Value::Object(country)) => country.get("name").and_then(plain_text),
                    Some(other) => plain_text(other),
                    None => None,
                };
                if let Some(piece) = piece {
                    if !pieces.contains(&piece) {
                        pieces.push(piece);
                    }
                }
            }
            if pieces.is_empty() {
                parts.get("name").and_then(plain_text)
            } else {
                Some(pieces.join(", "))
            }
        }
        _ => None,
    }
}

fn employment_type(value: &Value) -> Option<String> {
    let kinds: Vec<String> = match value {
        Value::Array(items) => items.iter().filter_map(Value::as_str).map(humanize).collect(),
        Value::String(s) => s.split(',').map(humanize).collect(),
        _ => Vec::new(),
    };
    let kinds: Vec<String> = kinds.into_iter().filter(|k| !k.is_empty()).collect();
    (!kinds.is_empty()).then(|| kinds.join(", "))
}

/// `FULL_TIME` -> `Full time`.
fn humanize(raw: &str) -> String {
    let spaced = raw.trim().replace(['_', '-'], " ").to_lowercase();
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn salary(value: &Value) -> Option<String> {
    let Value::Object(map) = value else {
        return plain_text(value);
    };
    let currency = map.get("currency").and_then(Value::as_str).unwrap_or("");

    let (amount, unit) = match map.get("value") {
        Some(Value::Object(quantity)) => {
            let unit = quantity.get("unitText").and_then(Value::as_str);
            let min = quantity.get("minValue").and_then(number_text);
            let max = quantity.get("maxValue").and_then(number_text);
            let exact = quantity.get("value").and_then(number_text);
            let amount = match (min, max, exact) {
                (Some(min), Some(max), _) if min != max => Some(format!("{min} - {max}")),
                (Some(min), _, _) => Some(min),
                (None, Some(max), _) => Some(max),
                (None, None, exact) => exact,
            };
            (amount, unit)
        }
        Some(other) => (number_text(other), None),
        None => (None, None),
    };

    let amount = amount?;
    let mut text = if currency.is_empty() {
        amount
    } else {
        format!("{currency} {amount}")
    };
    if let Some(unit) = unit.filter(|unit| !unit.trim().is_empty()) {
        text.push_str(" per ");
        text.push_str(unit.trim());
    }
    Some(text)
}

fn number_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(int), _) => Some(int.to_string()),
            (None, Some(float)) if float.fract() == 0.0 => Some(format!("{float:.0}")),
            _ => Some(n.to_string()),
        },
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn requirements(map: &Map<String, Value>) -> Option<String> {
    let blocks: Vec<String> = [
        "qualifications",
        "experienceRequirements",
        "educationRequirements",
        "skills",
    ]
    .iter()
    .filter_map(|key| map.get(*key))
    .filter_map(requirement_text)
    .collect();
    (!blocks.is_empty()).then(|| blocks.join("\n\n"))
}

fn requirement_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => fragment_to_text(s),
        Value::Array(items) => items
            .iter()
            .filter_map(requirement_text)
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(map) => {
            if let Some(text) = map.get("description").and_then(Value::as_str) {
                fragment_to_text(text)
            } else if let Some(months) = map.get("monthsOfExperience").and_then(number_text) {
                format!("{months} months of experience")
            } else if let Some(category) = map.get("credentialCategory").and_then(Value::as_str) {
                clean_inline(category)
            } else {
                map.get("name").and_then(plain_text).unwrap_or_default()
            }
        }
        _ => String::new(),
    };
    let text = text.trim().to_string();
    (!text.is_empty()).then_some(text)
}
