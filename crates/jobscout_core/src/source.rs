use std::fmt;

use serde::Serialize;

/// Which job board a page came from, derived from the hostname.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobSource {
    Linkedin,
    Indeed,
    Glassdoor,
    MyCareersFuture,
    Generic,
}

impl JobSource {
    pub fn from_host(hostname: &str) -> Self {
        let host = hostname.trim_end_matches('.').to_ascii_lowercase();
        let on = |domain: &str| host == domain || host.ends_with(&format!(".{domain}"));
        if on("linkedin.com") {
            JobSource::Linkedin
        } else if on("mycareersfuture.gov.sg") {
            JobSource::MyCareersFuture
        } else if host.split('.').any(|label| label == "indeed") {
            JobSource::Indeed
        } else if host.split('.').any(|label| label == "glassdoor") {
            JobSource::Glassdoor
        } else {
            JobSource::Generic
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobSource::Linkedin => "linkedin",
            JobSource::Indeed => "indeed",
            JobSource::Glassdoor => "glassdoor",
            JobSource::MyCareersFuture => "mycareersfuture",
            JobSource::Generic => "generic",
        }
    }
}

impl fmt::Display for JobSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::JobSource;

    #[test]
    fn regional_boards_are_recognized() {
        assert_eq!(JobSource::from_host("www.linkedin.com"), JobSource::Linkedin);
        assert_eq!(JobSource::from_host("sg.linkedin.com"), JobSource::Linkedin);
        assert_eq!(JobSource::from_host("uk.indeed.com"), JobSource::Indeed);
        assert_eq!(JobSource::from_host("www.glassdoor.co.uk"), JobSource::Glassdoor);
        assert_eq!(
            JobSource::from_host("www.mycareersfuture.gov.sg"),
            JobSource::MyCareersFuture
        );
    }

    #[test]
    fn lookalike_domains_are_generic() {
        assert_eq!(JobSource::from_host("notlinkedin.com"), JobSource::Generic);
        assert_eq!(JobSource::from_host("linkedin.com.evil.io"), JobSource::Generic);
        assert_eq!(JobSource::from_host("boards.greenhouse.io"), JobSource::Generic);
    }
}
