//! Ordered keyword → value decision table.
//!
//! Rules are evaluated top to bottom against a control's context string; a
//! rule matches when any of its keywords is a substring of the context. The
//! first matching rule decides. If its value resolves empty the control is
//! left alone; later rules are never consulted.
//!
//! Order matters: `"name"` is a substring of `"first name"`, so the specific
//! name rules must sit above the generic full-name rule.

use crate::types::ProfileValues;
use aho_corasick::{AhoCorasick, AhoCorasickBuilder, BuildError};
use serde::{Deserialize, Serialize};

/// Revision of [`RuleTable::builtin`]. Bump when a keyword or the order changes.
pub const BUILTIN_RULES_VERSION: u32 = 1;

/// How a matched rule derives its value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "value")]
pub enum Resolver {
    FirstName,
    LastName,
    FullName,
    Email,
    Phone,
    Linkedin,
    Portfolio,
    SalaryTarget,
    NoticePeriod,
    CoverLetter,
    Literal(String),
}

/// Everything a resolver may read at match time.
#[derive(Debug, Clone, Copy)]
pub struct MatchEnv<'a> {
    pub profile: &'a ProfileValues,
    /// Title of the page being filled (for synthesized answers).
    pub page_title: &'a str,
}

impl Resolver {
    pub fn resolve(&self, env: &MatchEnv<'_>) -> String {
        let profile = &env.profile.profile;
        let prefs = &env.profile.preferences;
        match self {
            Resolver::FirstName => profile
                .full_name
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string(),
            Resolver::LastName => profile
                .full_name
                .split_whitespace()
                .skip(1)
                .collect::<Vec<_>>()
                .join(" "),
            Resolver::FullName => profile.full_name.trim().to_string(),
            Resolver::Email => profile.email.trim().to_string(),
            Resolver::Phone => profile.phone.trim().to_string(),
            Resolver::Linkedin => profile.linkedin_url.trim().to_string(),
            Resolver::Portfolio => profile.portfolio_url.trim().to_string(),
            Resolver::SalaryTarget => format_salary(prefs.salary_target),
            Resolver::NoticePeriod => prefs.notice_period.trim().to_string(),
            Resolver::CoverLetter => format!(
                "I am excited about this opportunity at {} because...",
                env.page_title.trim()
            ),
            Resolver::Literal(v) => v.clone(),
        }
    }
}

/// `0` (and anything non-positive or non-finite) means "not set".
fn format_salary(target: f64) -> String {
    if !target.is_finite() || target <= 0.0 {
        return String::new();
    }
    if target.fract() == 0.0 {
        format!("{}", target as u64)
    } else {
        format!("{}", target)
    }
}

/// One row of the decision table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldRule {
    pub name: String,
    pub keywords: Vec<String>,
    pub resolver: Resolver,
}

impl FieldRule {
    pub fn new(name: &str, keywords: &[&str], resolver: Resolver) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            resolver,
        }
    }
}

/// A rule that produced a non-empty value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch<'t> {
    pub rule: &'t FieldRule,
    pub value: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RuleTableError {
    #[error("rule table is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("keyword matcher for rule {rule:?} could not be built: {source}")]
    Matcher {
        rule: String,
        #[source]
        source: BuildError,
    },
}

#[derive(Serialize, Deserialize)]
struct RawTable {
    version: u32,
    rules: Vec<FieldRule>,
}

/// Ordered, versioned rule list with precompiled keyword matchers.
#[derive(Debug, Clone)]
pub struct RuleTable {
    version: u32,
    rules: Vec<FieldRule>,
    matchers: Vec<Option<AhoCorasick>>,
}

impl RuleTable {
    pub fn new(version: u32, rules: Vec<FieldRule>) -> Result<Self, RuleTableError> {
        let mut rules = rules;
        let mut matchers = Vec::with_capacity(rules.len());
        for rule in &mut rules {
            rule.keywords = rule
                .keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect();
            if rule.keywords.is_empty() {
                matchers.push(None);
                continue;
            }
            let matcher = AhoCorasickBuilder::new()
                .build(&rule.keywords)
                .map_err(|source| RuleTableError::Matcher {
                    rule: rule.name.clone(),
                    source,
                })?;
            matchers.push(Some(matcher));
        }
        Ok(Self {
            version,
            rules,
            matchers,
        })
    }

    /// The standard eleven rules, specific before generic.
    pub fn builtin() -> Self {
        let rules = vec![
            FieldRule::new("first_name", &["first name", "given name"], Resolver::FirstName),
            FieldRule::new(
                "last_name",
                &["last name", "family name", "surname"],
                Resolver::LastName,
            ),
            FieldRule::new("full_name", &["full name", "name"], Resolver::FullName),
            FieldRule::new("email", &["email", "e-mail"], Resolver::Email),
            FieldRule::new("phone", &["phone", "mobile", "cell"], Resolver::Phone),
            FieldRule::new("linkedin", &["linkedin", "linked in"], Resolver::Linkedin),
            FieldRule::new(
                "portfolio",
                &["portfolio", "website", "personal site"],
                Resolver::Portfolio,
            ),
            FieldRule::new(
                "salary",
                &["salary", "compensation", "expectation"],
                Resolver::SalaryTarget,
            ),
            FieldRule::new(
                "notice_period",
                &["notice", "start date", "earliest"],
                Resolver::NoticePeriod,
            ),
            FieldRule::new(
                "work_authorization",
                &["sponsorship", "visa", "authorized"],
                Resolver::Literal("Yes".to_string()),
            ),
            FieldRule::new(
                "cover_letter",
                &["why us", "why do you want", "cover letter"],
                Resolver::CoverLetter,
            ),
        ];
        Self::new(BUILTIN_RULES_VERSION, rules).expect("valid builtin keyword patterns")
    }

    /// Parse a table from JSON (`{ "version": n, "rules": [...] }`).
    pub fn from_json(json: &str) -> Result<Self, RuleTableError> {
        let raw: RawTable = serde_json::from_str(json)?;
        Self::new(raw.version, raw.rules)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&RawTable {
            version: self.version,
            rules: self.rules.clone(),
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// First rule whose keywords hit `context`, if its value is non-empty.
    pub fn resolve(&self, context: &str, env: &MatchEnv<'_>) -> Option<RuleMatch<'_>> {
        let context = context.to_lowercase();
        let rule = self
            .rules
            .iter()
            .zip(&self.matchers)
            .find(|(_, matcher)| matcher.as_ref().is_some_and(|m| m.is_match(&context)))
            .map(|(rule, _)| rule)?;

        let value = rule.resolver.resolve(env);
        (!value.is_empty()).then_some(RuleMatch { rule, value })
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Preferences, Profile};

    fn values() -> ProfileValues {
        ProfileValues::new(
            Profile {
                full_name: "Grace Brewster Hopper".to_string(),
                email: "grace@example.com".to_string(),
                phone: "+1 555 0100".to_string(),
                linkedin_url: "https://linkedin.com/in/grace".to_string(),
                portfolio_url: String::new(),
                skills: vec![],
            },
            Preferences {
                salary_target: 150000.0,
                ..Default::default()
            },
        )
    }

    fn env(profile: &ProfileValues) -> MatchEnv<'_> {
        MatchEnv {
            profile,
            page_title: "Acme Careers",
        }
    }

    #[test]
    fn specific_name_rules_shadow_generic_name() {
        let table = RuleTable::builtin();
        let profile = values();
        let env = env(&profile);

        let hit = table.resolve("first name  first_name fname", &env).unwrap();
        assert_eq!(hit.rule.name, "first_name");
        assert_eq!(hit.value, "Grace");

        let hit = table.resolve("surname   ", &env).unwrap();
        assert_eq!(hit.value, "Brewster Hopper");

        let hit = table.resolve("your name   ", &env).unwrap();
        assert_eq!(hit.rule.name, "full_name");
        assert_eq!(hit.value, "Grace Brewster Hopper");
    }

    #[test]
    fn empty_value_stops_evaluation() {
        let table = RuleTable::builtin();
        let profile = values();
        assert!(table.resolve("personal website   ", &env(&profile)).is_none());

        // linkedin precedes portfolio and is set.
        let hit = table
            .resolve("linkedin profile website", &env(&profile))
            .unwrap();
        assert_eq!(hit.rule.name, "linkedin");
    }

    #[test]
    fn single_token_name_leaves_last_name_empty() {
        let mut profile = values();
        profile.profile.full_name = "Madonna".to_string();
        let table = RuleTable::builtin();

        // "last name" also contains "name"; the generic rule must not step in.
        assert!(table.resolve("last name  lname l", &env(&profile)).is_none());
        assert_eq!(
            table.resolve("first name  fname f", &env(&profile)).unwrap().value,
            "Madonna"
        );
    }

    #[test]
    fn empty_email_does_not_fall_through_to_phone() {
        let mut profile = values();
        profile.profile.email.clear();
        let table = RuleTable::builtin();
        assert!(table.resolve("email or mobile", &env(&profile)).is_none());
    }

    #[test]
    fn composite_resolvers() {
        let table = RuleTable::builtin();
        let profile = values();
        let env = env(&profile);

        assert_eq!(table.resolve("salary expectations", &env).unwrap().value, "150000");
        assert_eq!(
            table.resolve("earliest start", &env).unwrap().value,
            "2 weeks"
        );
        assert_eq!(table.resolve("require visa sponsorship?", &env).unwrap().value, "Yes");
        assert_eq!(
            table.resolve("why do you want to join", &env).unwrap().value,
            "I am excited about this opportunity at Acme Careers because..."
        );
    }

    #[test]
    fn unset_salary_is_not_a_match() {
        assert_eq!(format_salary(0.0), "");
        assert_eq!(format_salary(-5.0), "");
        assert_eq!(format_salary(95000.5), "95000.5");
    }

    #[test]
    fn no_keyword_hit_is_none() {
        let table = RuleTable::builtin();
        let profile = values();
        assert!(table.resolve("favourite colour", &env(&profile)).is_none());
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let table = RuleTable::new(
            1,
            vec![FieldRule::new("email", &["E-Mail"], Resolver::Email)],
        )
        .unwrap();
        let profile = values();
        assert!(table.resolve("Your E-MAIL address", &env(&profile)).is_some());
    }

    #[test]
    fn table_survives_json_round_trip_with_order() {
        let table = RuleTable::builtin();
        let json = table.to_json().unwrap();
        let loaded = RuleTable::from_json(&json).unwrap();
        let names: Vec<_> = loaded.rules().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(&names[..3], &["first_name", "last_name", "full_name"]);
        assert_eq!(loaded.version(), BUILTIN_RULES_VERSION);
        assert_eq!(loaded.rules().last().unwrap().resolver, Resolver::CoverLetter);
    }
}
