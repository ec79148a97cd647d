//! Jobscout core: pure URL policy, content classification and the
//! job-posting extraction cascade. Nothing in this crate touches the network.
mod assemble;
mod cascade;
mod classify;
mod failure;
mod generic;
mod guard;
mod policy;
mod posting;
mod response;
mod sites;
mod source;
mod structured;
mod text;
mod types;

pub use assemble::{assemble, truncate_content, TRUNCATION_MARKER};
pub use cascade::{extract_posting, run_strategies, Document, Strategy, STRATEGIES};
pub use classify::{
    classify, decode_body, has_job_content, has_login_indicator, is_auth_wall, DecodedBody,
    Rejection,
};
pub use failure::{ExtractFailure, FailureKind};
pub use generic::{clean_document, extract_generic};
pub use guard::{Guard, GuardRejection, ValidatedTarget, MAX_URL_LENGTH};
pub use policy::{AddressRange, SecurityPolicy, DEFAULT_BLOCKED_HOSTS, DEFAULT_BLOCKED_RANGES};
pub use posting::JobPosting;
pub use response::{FailureBody, JobPostingResponse, ResponseBody, SuccessBody};
pub use sites::{
    extract_site_specific, portal_job_id, Field, FieldRule, Probe, SiteLayout, MIN_SITE_FIELDS,
};
pub use source::JobSource;
pub use structured::{extract_structured, find_job_posting, posting_from_json_ld};
pub use text::{
    clean_inline, element_to_text, fragment_to_text, html_to_text, inline_text, ConvertMode, BULLET,
};
pub use types::{ExtractedPosting, ExtractionOutcome, FetchResult, ParseMethod};
