//! Direct JSON API client for the single-page job portal.
//!
//! The portal renders postings client-side, so the HTML shell carries no job
//! text. Postings are read from its public API instead, through the same
//! guard and bounded fetcher as every other request.

use std::sync::Arc;

use engine_logging::engine_debug;
use jobscout_core::{
    classify, fragment_to_text, portal_job_id, ExtractFailure, FailureKind, Guard, JobPosting,
    JobSource, ValidatedTarget,
};
use serde::Deserialize;
use serde_json::Value;

use crate::fetch::Fetcher;

pub const DEFAULT_PORTAL_API: &str = "https://api.mycareersfuture.gov.sg/v2/jobs";

#[derive(Debug, Clone)]
pub struct PortalSettings {
    pub api_base: String,
}

impl Default for PortalSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_PORTAL_API.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PortalJob {
    title: Option<String>,
    posted_company: Option<PortalCompany>,
    address: Option<PortalAddress>,
    employment_types: Vec<Value>,
    position_levels: Vec<Value>,
    salary: Option<PortalSalary>,
    description: Option<String>,
    minimum_years_experience: Option<Value>,
    skills: Vec<Value>,
    status: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PortalCompany {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PortalAddress {
    street_address: Option<String>,
    district: Option<Value>,
    districts: Vec<Value>,
    postal_code: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PortalSalary {
    minimum: Option<Value>,
    maximum: Option<Value>,
    #[serde(rename = "type")]
    kind: Option<Value>,
}

pub struct PortalClient {
    guard: Guard,
    fetcher: Arc<dyn Fetcher>,
    settings: PortalSettings,
}

impl PortalClient {
    pub fn new(guard: Guard, fetcher: Arc<dyn Fetcher>, settings: PortalSettings) -> Self {
        Self {
            guard,
            fetcher,
            settings,
        }
    }

    /// The job id when `target` is a portal posting URL; `None` sends the
    /// request down the ordinary HTML path.
    pub fn job_id_for(target: &ValidatedTarget) -> Option<String> {
        if JobSource::from_host(target.hostname()) != JobSource::MyCareersFuture {
            return None;
        }
        portal_job_id(target.url())
    }

    /// Fetches one posting from the API and renders it.
    pub async fn fetch_posting(&self, job_id: &str) -> Result<JobPosting, ExtractFailure> {
        let api_url = format!("{}/{job_id}", self.settings.api_base.trim_end_matches('/'));
        let target = self
            .guard
            .validate(&api_url)
            .map_err(|rejection| ExtractFailure::new(rejection, format!("portal api url {api_url}")))?;
        engine_debug!("portal api request for job {job_id}");

        let response = self.fetcher.fetch(&target).await?;
        let decoded = classify(&response)
            .map_err(|rejection| ExtractFailure::new(rejection, format!("portal api {api_url}")))?;
        let job: PortalJob = serde_json::from_str(&decoded.text).map_err(|err| {
            ExtractFailure::new(FailureKind::Internal, format!("portal api payload: {err}"))
        })?;
        Ok(job.into_posting())
    }
}

impl PortalJob {
    fn into_posting(self) -> JobPosting {
        JobPosting {
            title: self.title.map(|title| title.trim().to_string()),
            company: self.posted_company.and_then(|company| company.name),
            location: self.address.as_ref().and_then(PortalAddress::render),
            employment_type: join_labels(&self.employment_types, "employmentType"),
            seniority: join_labels(&self.position_levels, "position"),
            salary: self.salary.as_ref().and_then(PortalSalary::render),
            status: self.status.as_ref().and_then(closed_status),
            description: self
                .description
                .as_deref()
                .map(fragment_to_text)
                .filter(|text| !text.is_empty()),
            requirements: requirements(self.minimum_years_experience.as_ref(), &self.skills),
        }
    }
}

impl PortalAddress {
    fn render(&self) -> Option<String> {
        let district = self
            .district
            .as_ref()
            .and_then(|district| label(district, "location"))
            .or_else(|| self.districts.iter().find_map(|d| label(d, "location")));
        let parts: Vec<String> = [
            self.street_address.clone(),
            district,
            self.postal_code.as_ref().and_then(scalar_text),
        ]
        .into_iter()
        .flatten()
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect();
        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

impl PortalSalary {
    /// `SGD 5000 - 8000 Monthly`.
    fn render(&self) -> Option<String> {
        let min = self.minimum.as_ref().and_then(amount);
        let max = self.maximum.as_ref().and_then(amount);
        let range = match (min, max) {
            (Some(min), Some(max)) if min != max => format!("{min} - {max}"),
            (Some(value), _) | (None, Some(value)) => value,
            (None, None) => return None,
        };
        let mut text = format!("SGD {range}");
        if let Some(kind) = self.kind.as_ref().and_then(|kind| label(kind, "salaryType")) {
            text.push(' ');
            text.push_str(&kind);
        }
        Some(text)
    }
}

/// Salary bounds arrive either as bare numbers or as `{ "amount": n }`.
fn amount(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => map.get("amount").and_then(scalar_text),
        other => scalar_text(other),
    }
}

fn closed_status(status: &Value) -> Option<String> {
    let text = label(status, "jobStatus")?;
    (!text.eq_ignore_ascii_case("open")).then_some(text)
}

fn requirements(min_years: Option<&Value>, skills: &[Value]) -> Option<String> {
    let mut blocks = Vec::new();
    if let Some(years) = min_years.and_then(scalar_text).filter(|years| years != "0") {
        blocks.push(format!("Minimum {years} years of experience"));
    }
    let skills: Vec<String> = skills
        .iter()
        .filter_map(|skill| label(skill, "skill"))
        .map(|skill| format!("\u{2022} {skill}"))
        .collect();
    if !skills.is_empty() {
        blocks.push(format!("Skills:\n{}", skills.join("\n")));
    }
    (!blocks.is_empty()).then(|| blocks.join("\n\n"))
}

fn join_labels(items: &[Value], key: &str) -> Option<String> {
    let labels: Vec<String> = items.iter().filter_map(|item| label(item, key)).collect();
    (!labels.is_empty()).then(|| labels.join(", "))
}

/// A string, or the `key` member of an object.
fn label(value: &Value, key: &str) -> Option<String> {
    match value {
        Value::Object(map) => map.get(key).and_then(scalar_text),
        other => scalar_text(other),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(float) if float.fract() == 0.0 => format!("{float:.0}"),
            _ => n.to_string(),
        },
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}
