//! Site-keyed selector table.
//!
//! Each [`SelectorRule`] is keyed by a hostname substring and carries one
//! optional CSS query per posting field. The table is plain data: it can be
//! extended at runtime or loaded from JSON, and is versioned so callers can
//! tell which revision produced a record.

use serde::{Deserialize, Serialize};

/// Revision of [`SelectorRegistry::builtin`]. Bump when any selector changes.
pub const BUILTIN_REGISTRY_VERSION: u32 = 1;

/// Per-site mapping from a posting field to the DOM query that extracts it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SelectorRule {
    /// Hostname substring, e.g. `"greenhouse.io"`.
    pub domain_match: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_selector: Option<String>,
}

impl SelectorRule {
    pub fn new(domain_match: impl Into<String>) -> Self {
        Self {
            domain_match: domain_match.into(),
            title_selector: None,
            company_selector: None,
            description_selector: None,
            location_selector: None,
        }
    }

    pub fn title(mut self, selector: &str) -> Self {
        self.title_selector = Some(selector.to_string());
        self
    }

    pub fn company(mut self, selector: &str) -> Self {
        self.company_selector = Some(selector.to_string());
        self
    }

    pub fn description(mut self, selector: &str) -> Self {
        self.description_selector = Some(selector.to_string());
        self
    }

    pub fn location(mut self, selector: &str) -> Self {
        self.location_selector = Some(selector.to_string());
        self
    }

    /// Case-insensitive hostname substring test. An empty key never matches.
    pub fn matches_host(&self, hostname: &str) -> bool {
        let key = self.domain_match.trim().to_ascii_lowercase();
        !key.is_empty() && hostname.to_ascii_lowercase().contains(&key)
    }
}

/// Ordered selector table. First registered match wins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectorRegistry {
    pub version: u32,
    pub rules: Vec<SelectorRule>,
}

impl Default for SelectorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SelectorRegistry {
    /// An empty table: every extraction uses generic defaults only.
    pub fn empty() -> Self {
        Self {
            version: 0,
            rules: Vec::new(),
        }
    }

    /// Hand-maintained table for the major job boards and ATS vendors.
    pub fn builtin() -> Self {
        let rules = vec![
            SelectorRule::new("linkedin.com")
                .title(".job-details-jobs-unified-top-card__job-title, .top-card-layout__title")
                .company(
                    ".job-details-jobs-unified-top-card__company-name, .topcard__org-name-link",
                )
                .description("#job-details, .show-more-less-html__markup")
                .location(".job-details-jobs-unified-top-card__bullet, .topcard__flavor--bullet"),
            SelectorRule::new("indeed.com")
                .title("h1.jobsearch-JobInfoHeader-title, [data-testid=\"jobsearch-JobInfoHeader-title\"]")
                .company("[data-testid=\"inlineHeader-companyName\"], [data-company-name]")
                .description("#jobDescriptionText")
                .location("[data-testid=\"inlineHeader-companyLocation\"], [data-testid=\"job-location\"]"),
            SelectorRule::new("greenhouse.io")
                .title(".app-title, h1.section-header")
                .company(".company-name")
                .description("#content, .job__description")
                .location(".location, .job__location"),
            SelectorRule::new("lever.co")
                .title(".posting-headline h2")
                .description(".posting-page .section-wrapper, [data-qa=\"job-description\"]")
                .location(".posting-categories .location, .sort-by-location"),
            SelectorRule::new("myworkdayjobs.com")
                .title("[data-automation-id=\"jobPostingHeader\"]")
                .description("[data-automation-id=\"jobPostingDescription\"]")
                .location("[data-automation-id=\"locations\"] dd"),
            SelectorRule::new("ashbyhq.com")
                .title("h1.ashby-job-posting-heading, h1")
                .description("[class*=\"_descriptionText\"], .ashby-job-posting-description")
                .location("[class*=\"_location\"]"),
            SelectorRule::new("glassdoor.")
                .title("[data-test=\"job-title\"]")
                .company("[data-test=\"employer-name\"]")
                .description("[class*=\"JobDetails_jobDescription\"], .jobDescriptionContent")
                .location("[data-test=\"location\"]"),
            SelectorRule::new("wellfound.com")
                .title("h1")
                .company("a[href^=\"/company/\"] h2, a[href^=\"/company/\"]")
                .description("[class*=\"description\"]"),
        ];

        Self {
            version: BUILTIN_REGISTRY_VERSION,
            rules,
        }
    }

    /// Parse a table from JSON (`{ "version": n, "rules": [...] }`).
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Append a rule. It only wins for hosts no earlier rule claims.
    pub fn register(&mut self, rule: SelectorRule) {
        self.rules.push(rule);
    }

    /// First rule whose key is a substring of `hostname`.
    pub fn lookup(&self, hostname: &str) -> Option<&SelectorRule> {
        if hostname.trim().is_empty() {
            return None;
        }
        self.rules.iter().find(|r| r.matches_host(hostname))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_keys_are_disjoint_for_known_hosts() {
        let registry = SelectorRegistry::builtin();
        for host in [
            "www.linkedin.com",
            "boards.greenhouse.io",
            "jobs.lever.co",
            "acme.wd5.myworkdayjobs.com",
            "jobs.ashbyhq.com",
            "uk.indeed.com",
        ] {
            let hits = registry
                .rules
                .iter()
                .filter(|r| r.matches_host(host))
                .count();
            assert_eq!(hits, 1, "{host} should match exactly one rule");
        }
    }

    #[test]
    fn first_registered_rule_wins_on_overlap() {
        let mut registry = SelectorRegistry::empty();
        registry.register(SelectorRule::new("example.com").title("h1.first"));
        registry.register(SelectorRule::new("jobs.example.com").title("h1.second"));

        let rule = registry.lookup("jobs.example.com").unwrap();
        assert_eq!(rule.title_selector.as_deref(), Some("h1.first"));
    }

    #[test]
    fn lookup_is_case_insensitive_and_ignores_empty_hosts() {
        let registry = SelectorRegistry::builtin();
        assert!(registry.lookup("Boards.Greenhouse.IO").is_some());
        assert!(registry.lookup("").is_none());
        assert!(registry.lookup("example.org").is_none());
    }

    #[test]
    fn table_loads_from_json() {
        let registry = SelectorRegistry::from_json(
            r#"{ "version": 7, "rules": [ { "domainMatch": "jobs.acme.test", "titleSelector": "h1" } ] }"#,
        )
        .unwrap();
        assert_eq!(registry.version, 7);
        let rule = registry.lookup("jobs.acme.test").unwrap();
        assert_eq!(rule.title_selector.as_deref(), Some("h1"));
        assert!(rule.company_selector.is_none());
    }
}
