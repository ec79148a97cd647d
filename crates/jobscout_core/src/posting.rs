use crate::text::clean_inline;

/// Fields recovered from a posting. Every field is optional; whatever is
/// present gets rendered, whatever is missing is left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobPosting {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub seniority: Option<String>,
    pub salary: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
}

impl JobPosting {
    /// Number of fields carrying non-blank text.
    pub fn field_count(&self) -> usize {
        self.fields().iter().filter(|field| field.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.field_count() == 0
    }

    /// Renders the canonical multi-line layout:
    ///
    /// ```text
    /// JOB TITLE: ...
    /// COMPANY: ...
    /// LOCATION: ...
    ///
    /// JOB DESCRIPTION:
    /// ...
    ///
    /// REQUIREMENTS:
    /// ...
    /// ```
    pub fn to_content(&self) -> String {
        let header_lines = [
            ("JOB TITLE", &self.title),
            ("COMPANY", &self.company),
            ("LOCATION", &self.location),
            ("EMPLOYMENT TYPE", &self.employment_type),
            ("SENIORITY LEVEL", &self.seniority),
            ("SALARY", &self.salary),
            ("JOB STATUS", &self.status),
        ];

        let mut sections: Vec<String> = Vec::new();

        let header = header_lines
            .iter()
            .filter_map(|(label, value)| {
                non_blank(value).map(|value| format!("{label}: {}", clean_inline(value)))
            })
            .collect::<Vec<_>>()
            .join("\n");
        if !header.is_empty() {
            sections.push(header);
        }

        if let Some(description) = non_blank(&self.description) {
            sections.push(format!("JOB DESCRIPTION:\n{}", description.trim()));
        }
        if let Some(requirements) = non_blank(&self.requirements) {
            sections.push(format!("REQUIREMENTS:\n{}", requirements.trim()));
        }

        sections.join("\n\n")
    }

    fn fields(&self) -> [Option<&str>; 9] {
        [
            non_blank(&self.title),
            non_blank(&self.company),
            non_blank(&self.location),
            non_blank(&self.employment_type),
            non_blank(&self.seniority),
            non_blank(&self.salary),
            non_blank(&self.status),
            non_blank(&self.description),
            non_blank(&self.requirements),
        ]
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::JobPosting;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_present_fields_in_canonical_order() {
        let posting = JobPosting {
            title: Some("Backend  Engineer".to_string()),
            company: Some("Acme".to_string()),
            salary: Some("USD 100000 - 150000 per YEAR".to_string()),
            description: Some("Build APIs\n\n\u{2022} Rust".to_string()),
            requirements: Some("5 years experience".to_string()),
            ..JobPosting::default()
        };

        assert_eq!(
            posting.to_content(),
            "JOB TITLE: Backend Engineer\nCOMPANY: Acme\nSALARY: USD 100000 - 150000 per YEAR\n\n\
             JOB DESCRIPTION:\nBuild APIs\n\n\u{2022} Rust\n\n\
             REQUIREMENTS:\n5 years experience"
        );
        assert_eq!(posting.field_count(), 5);
    }

    #[test]
    fn blank_fields_are_omitted_and_not_counted() {
        let posting = JobPosting {
            title: Some("  ".to_string()),
            description: Some("Only a body".to_string()),
            ..JobPosting::default()
        };
        assert_eq!(posting.field_count(), 1);
        assert_eq!(posting.to_content(), "JOB DESCRIPTION:\nOnly a body");
    }

    #[test]
    fn empty_posting_renders_nothing() {
        assert!(JobPosting::default().is_empty());
        assert_eq!(JobPosting::default().to_content(), "");
    }
}
