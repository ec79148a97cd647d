use serde::Serialize;

use crate::failure::ExtractFailure;
use crate::source::JobSource;
use crate::types::ExtractedPosting;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessBody {
    pub success: bool,
    pub content: String,
    pub source: JobSource,
    pub parse_method: String,
    pub url: String,
    pub content_length: usize,
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureBody {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<JobSource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Success(SuccessBody),
    Failure(FailureBody),
}

/// What the caller of `ExtractJobPosting` receives: a status and a JSON body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobPostingResponse {
    pub status: u16,
    pub body: ResponseBody,
}

impl JobPostingResponse {
    pub fn success(posting: ExtractedPosting) -> Self {
        Self {
            status: 200,
            body: ResponseBody::Success(SuccessBody {
                success: true,
                content: posting.content,
                source: posting.source,
                parse_method: posting.method.as_str().to_string(),
                url: posting.url,
                content_length: posting.content_length,
                truncated: posting.truncated,
            }),
        }
    }

    pub fn failure(failure: &ExtractFailure) -> Self {
        Self {
            status: failure.status_code(),
            body: ResponseBody::Failure(FailureBody {
                success: false,
                error: failure.kind.user_message(),
                hint: failure.kind.hint().map(str::to_string),
                source: failure.board,
            }),
        }
    }

    pub fn from_result(result: Result<ExtractedPosting, ExtractFailure>) -> Self {
        match result {
            Ok(posting) => Self::success(posting),
            Err(failure) => Self::failure(&failure),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.body, ResponseBody::Success(_))
    }

    pub fn body_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::FailureKind;
    use crate::types::ParseMethod;
    use serde_json::{json, Value};

    #[test]
    fn success_body_uses_camel_case_fields() {
        let response = JobPostingResponse::success(ExtractedPosting {
            content: "JOB TITLE: X".to_string(),
            source: JobSource::MyCareersFuture,
            method: ParseMethod::PortalApi,
            url: "https://www.mycareersfuture.gov.sg/job/x".to_string(),
            content_length: 12,
            truncated: false,
        });
        let value: Value = serde_json::from_str(&response.body_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "success": true,
                "content": "JOB TITLE: X",
                "source": "mycareersfuture",
                "parseMethod": "api",
                "url": "https://www.mycareersfuture.gov.sg/job/x",
                "contentLength": 12,
                "truncated": false
            })
        );
    }

    #[test]
    fn failure_body_omits_missing_hint_and_source() {
        let failure = ExtractFailure::new(FailureKind::Network, "connection refused");
        let response = JobPostingResponse::failure(&failure);
        assert_eq!(response.status, 502);
        let value: Value = serde_json::from_str(&response.body_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"success": false, "error": "Could not connect to the site"})
        );
    }
}
