//! Structural layouts of the job boards we know by name.
//!
//! Each board lists, per field, the probes to try in priority order. The
//! first probe that yields non-empty text wins. New layout variants are added
//! by appending probes, never by editing existing ones.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use crate::posting::JobPosting;
use crate::source::JobSource;
use crate::text::{clean_inline, element_to_text, inline_text, ConvertMode};

/// Fewer recovered fields than this and the layout is considered a miss.
pub const MIN_SITE_FIELDS: usize = 2;

static PORTAL_JOB_ID: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|[^0-9a-f])([0-9a-f]{32})/?$").ok());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Company,
    Location,
    EmploymentType,
    Seniority,
    Salary,
    Description,
    Requirements,
}

#[derive(Clone, Copy)]
pub enum Probe {
    /// Whitespace-collapsed text of the first element matching the selector.
    Text(&'static str),
    /// Block conversion of the first match: bullets and paragraph breaks kept.
    Block(&'static str),
    /// Layout logic a single selector cannot express.
    Custom(fn(&Html) -> Option<String>),
}

pub struct FieldRule {
    pub field: Field,
    pub probes: &'static [Probe],
}

pub struct SiteLayout {
    pub source: JobSource,
    pub rules: &'static [FieldRule],
}

impl SiteLayout {
    pub fn for_source(source: JobSource) -> Option<&'static SiteLayout> {
        match source {
            JobSource::Linkedin => Some(&LINKEDIN),
            JobSource::Indeed => Some(&INDEED),
            JobSource::Glassdoor => Some(&GLASSDOOR),
            JobSource::MyCareersFuture => Some(&MYCAREERSFUTURE),
            JobSource::Generic => None,
        }
    }

    pub fn apply(&self, doc: &Html) -> JobPosting {
        let mut posting = JobPosting::default();
        for rule in self.rules {
            let value = rule.probes.iter().find_map(|probe| run_probe(doc, probe));
            let slot = match rule.field {
                Field::Title => &mut posting.title,
                Field::Company => &mut posting.company,
                Field::Location => &mut posting.location,
                Field::EmploymentType => &mut posting.employment_type,
                Field::Seniority => &mut posting.seniority,
                Field::Salary => &mut posting.salary,
                Field::Description => &mut posting.description,
                Field::Requirements => &mut posting.requirements,
            };
            if slot.is_none() {
                *slot = value;
            }
        }
        posting
    }
}

/// Applies the board's layout; `None` when the board is unknown or fewer
/// than [`MIN_SITE_FIELDS`] fields were recovered.
pub fn extract_site_specific(doc: &Html, source: JobSource) -> Option<JobPosting> {
    let layout = SiteLayout::for_source(source)?;
    let posting = layout.apply(doc);
    (posting.field_count() >= MIN_SITE_FIELDS).then_some(posting)
}

/// The 32-character hex job id at the end of a portal URL path.
pub fn portal_job_id(url: &Url) -> Option<String> {
    let captures = PORTAL_JOB_ID.as_ref()?.captures(url.path())?;
    captures.get(1).map(|m| m.as_str().to_ascii_lowercase())
}

fn run_probe(doc: &Html, probe: &Probe) -> Option<String> {
    let text = match probe {
        Probe::Text(selector) => first_match(doc, selector, inline_text),
        Probe::Block(selector) => {
            first_match(doc, selector, |el| element_to_text(el, ConvertMode::Fragment))
        }
        Probe::Custom(extract) => extract(doc),
    }?;
    let text = text.trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn first_match(
    doc: &Html,
    selector: &str,
    render: impl Fn(scraper::ElementRef<'_>) -> String,
) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    doc.select(&selector)
        .map(render)
        .find(|text| !text.trim().is_empty())
}

fn linkedin_criterion(doc: &Html, wanted: &str) -> Option<String> {
    let item = Selector::parse(".description__job-criteria-item").ok()?;
    let header = Selector::parse(".description__job-criteria-subheader").ok()?;
    let value = Selector::parse(".description__job-criteria-text").ok()?;
    doc.select(&item).find_map(|el| {
        let label = el.select(&header).next().map(inline_text)?;
        if !label.eq_ignore_ascii_case(wanted) {
            return None;
        }
        el.select(&value).next().map(inline_text)
    })
}

fn linkedin_employment_type(doc: &Html) -> Option<String> {
    linkedin_criterion(doc, "Employment type")
}

fn linkedin_seniority(doc: &Html) -> Option<String> {
    linkedin_criterion(doc, "Seniority level")
}

fn indeed_job_type(doc: &Html) -> Option<String> {
    const KINDS: [&str; 6] = [
        "Full-time",
        "Part-time",
        "Contract",
        "Temporary",
        "Internship",
        "Permanent",
    ];
    let section = Selector::parse("#jobDetailsSection, #salaryInfoAndJobType").ok()?;
    let text = doc
        .select(&section)
        .map(inline_text)
        .collect::<Vec<_>>()
        .join(" ");
    let found: Vec<&str> = KINDS
        .iter()
        .copied()
        .filter(|kind| text.contains(kind))
        .collect();
    (!found.is_empty()).then(|| clean_inline(&found.join(", ")))
}

/// Skill pills rendered the same way as the portal API's skill list.
fn mycareersfuture_skills(doc: &Html) -> Option<String> {
    let pill = Selector::parse(r#"[data-cy="job-skills"] label, #skills-needed label"#).ok()?;
    let skills: Vec<String> = doc
        .select(&pill)
        .map(inline_text)
        .filter(|skill| !skill.is_empty())
        .map(|skill| format!("\u{2022} {skill}"))
        .collect();
    (!skills.is_empty()).then(|| format!("Skills:\n{}", skills.join("\n")))
}

static LINKEDIN: SiteLayout = SiteLayout {
    source: JobSource::Linkedin,
    rules: &[
        FieldRule {
            field: Field::Title,
            probes: &[
                Probe::Text(".top-card-layout__title"),
                Probe::Text(".topcard__title"),
                Probe::Text(".job-details-jobs-unified-top-card__job-title"),
                Probe::Text("h1"),
            ],
        },
        FieldRule {
            field: Field::Company,
            probes: &[
                Probe::Text(".topcard__org-name-link"),
                Probe::Text(".top-card-layout__second-subline .topcard__flavor a"),
                Probe::Text(".job-details-jobs-unified-top-card__company-name"),
            ],
        },
        FieldRule {
            field: Field::Location,
            probes: &[
                Probe::Text(".topcard__flavor--bullet"),
                Probe::Text(".job-details-jobs-unified-top-card__bullet"),
            ],
        },
        FieldRule {
            field: Field::EmploymentType,
            probes: &[Probe::Custom(linkedin_employment_type)],
        },
        FieldRule {
            field: Field::Seniority,
            probes: &[Probe::Custom(linkedin_seniority)],
        },
        FieldRule {
            field: Field::Description,
            probes: &[
                Probe::Block(".show-more-less-html__markup"),
                Probe::Block(".description__text"),
                Probe::Block("#job-details"),
                Probe::Block(".jobs-description__content"),
            ],
        },
        FieldRule {
            field: Field::Requirements,
            probes: &[
                Probe::Block(".job-details-skill-match-status-list"),
                Probe::Block(".job-details-how-you-match__skills-section"),
            ],
        },
    ],
};

static INDEED: SiteLayout = SiteLayout {
    source: JobSource::Indeed,
    rules: &[
        FieldRule {
            field: Field::Title,
            probes: &[
                Probe::Text(r#"[data-testid="jobsearch-JobInfoHeader-title"]"#),
                Probe::Text("h1.jobsearch-JobInfoHeader-title"),
                Probe::Text("h1"),
            ],
        },
        FieldRule {
            field: Field::Company,
            probes: &[
                Probe::Text(r#"[data-testid="inlineHeader-companyName"]"#),
                Probe::Text(r#"[data-company-name="true"]"#),
                Probe::Text(".jobsearch-InlineCompanyRating div"),
            ],
        },
        FieldRule {
            field: Field::Location,
            probes: &[
                Probe::Text(r#"[data-testid="inlineHeader-companyLocation"]"#),
                Probe::Text(r#"[data-testid="job-location"]"#),
                Probe::Text(".jobsearch-JobInfoHeader-subtitle > div:last-child"),
            ],
        },
        FieldRule {
            field: Field::Salary,
            probes: &[
                Probe::Text("#salaryInfoAndJobType > span:first-child"),
                Probe::Text(r#"[data-testid="attribute_snippet_compensation"]"#),
            ],
        },
        FieldRule {
            field: Field::EmploymentType,
            probes: &[Probe::Custom(indeed_job_type)],
        },
        FieldRule {
            field: Field::Description,
            probes: &[
                Probe::Block("#jobDescriptionText"),
                Probe::Block(".jobsearch-jobDescriptionText"),
            ],
        },
        FieldRule {
            field: Field::Requirements,
            probes: &[
                Probe::Block("#qualificationsSection"),
                Probe::Block(r#"[data-testid="qualifications-list"]"#),
            ],
        },
    ],
};

static GLASSDOOR: SiteLayout = SiteLayout {
    source: JobSource::Glassdoor,
    rules: &[
        FieldRule {
            field: Field::Title,
            probes: &[
                Probe::Text(r#"[data-test="job-title"]"#),
                Probe::Text(r#"[data-test="jobTitle"]"#),
                Probe::Text("h1"),
            ],
        },
        FieldRule {
            field: Field::Company,
            probes: &[
                Probe::Text(r#"[data-test="employer-name"]"#),
                Probe::Text(r#"[data-test="employerName"]"#),
            ],
        },
        FieldRule {
            field: Field::Location,
            probes: &[
                Probe::Text(r#"[data-test="location"]"#),
                Probe::Text(r#"[data-test="emp-location"]"#),
            ],
        },
        FieldRule {
            field: Field::Salary,
            probes: &[
                Probe::Text(r#"[data-test="detailSalary"]"#),
                Probe::Text(r#"[data-test="salary-estimate"]"#),
            ],
        },
        FieldRule {
            field: Field::Description,
            probes: &[
                Probe::Block(r#"[class*="JobDetails_jobDescription"]"#),
                Probe::Block(".jobDescriptionContent"),
                Probe::Block("#JobDescriptionContainer"),
            ],
        },
        FieldRule {
            field: Field::Requirements,
            probes: &[Probe::Block(r#"[data-test="job-qualifications"]"#)],
        },
    ],
};

static MYCAREERSFUTURE: SiteLayout = SiteLayout {
    source: JobSource::MyCareersFuture,
    rules: &[
        FieldRule {
            field: Field::Title,
            probes: &[Probe::Text("#job_title"), Probe::Text("h1")],
        },
        FieldRule {
            field: Field::Company,
            probes: &[
                Probe::Text(r#"[data-cy="company-hire-info__company"]"#),
                Probe::Text(r#"[data-testid="company-hire-info"]"#),
            ],
        },
        FieldRule {
            field: Field::Location,
            probes: &[Probe::Text("#address")],
        },
        FieldRule {
            field: Field::EmploymentType,
            probes: &[Probe::Text("#employment_type")],
        },
        FieldRule {
            field: Field::Seniority,
            probes: &[Probe::Text("#seniority")],
        },
        FieldRule {
            field: Field::Salary,
            probes: &[Probe::Text(r#"[data-cy="salary-range"]"#)],
        },
        FieldRule {
            field: Field::Description,
            probes: &[
                Probe::Block("#description-content"),
                Probe::Block("#job_description"),
            ],
        },
        FieldRule {
            field: Field::Requirements,
            probes: &[
                Probe::Block("#requirements-content"),
                Probe::Custom(mycareersfuture_skills),
            ],
        },
    ],
};
