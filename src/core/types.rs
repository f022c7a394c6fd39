use serde::{Deserialize, Serialize};

// ───────────────────────────────────────────────────────────────────────────
// Extraction output
// ───────────────────────────────────────────────────────────────────────────

/// Normalized result of scraping one job-posting page.
///
/// Every field is always present (possibly empty) and trimmed; extraction
/// never returns a partial record.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PostingRecord {
    pub title: String,
    pub company: String,
    pub raw_description: String,
    pub location: String,
    pub meta_description: String,
    pub source_url: String,
}

// ───────────────────────────────────────────────────────────────────────────
// Profile projection (read-only input to autofill)
// ───────────────────────────────────────────────────────────────────────────

/// Identity fields the form matcher can draw from.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub linkedin_url: String,
    pub portfolio_url: String,
    pub skills: Vec<String>,
}

/// Job-search preferences. Defaults mirror the stored extension config.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub notice_period: String,
    pub salary_min: f64,
    pub salary_target: f64,
    pub currency: String,
    pub is_negotiable: bool,
    pub locations: Vec<String>,
    pub remote: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            notice_period: "2 weeks".to_string(),
            salary_min: 0.0,
            salary_target: 0.0,
            currency: "USD".to_string(),
            is_negotiable: true,
            locations: Vec::new(),
            remote: true,
        }
    }
}

/// Caller-supplied profile + preferences. Never mutated by the engine.
///
/// Deserializes straight from the `{ "profile": …, "preferences": … }` shape
/// the extension stores; unrelated keys (webhook, sheets) are ignored.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ProfileValues {
    pub profile: Profile,
    pub preferences: Preferences,
}

impl ProfileValues {
    pub fn new(profile: Profile, preferences: Preferences) -> Self {
        Self {
            profile,
            preferences,
        }
    }
}

// ───────────────────────────────────────────────────────────────────────────
// Autofill
// ───────────────────────────────────────────────────────────────────────────

/// Text signals gathered for one form control.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormElementContext {
    pub label_text: String,
    pub placeholder: String,
    pub name_attr: String,
    pub id_attr: String,
}

impl FormElementContext {
    /// Lower-cased, space-joined `label placeholder name id`.
    ///
    /// Only ever used for substring containment, so empty parts are kept as
    /// empty slots rather than squeezed out.
    pub fn context_string(&self) -> String {
        format!(
            "{} {} {} {}",
            self.label_text, self.placeholder, self.name_attr, self.id_attr
        )
        .to_lowercase()
    }
}

/// One control that received a value during a pass.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FilledField {
    /// Position in `input, textarea, select` document order.
    pub index: usize,
    /// Name of the rule that produced the value.
    pub rule: String,
    pub value: String,
}

/// Summary of one autofill pass.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AutofillReport {
    pub inspected: usize,
    pub skipped_hidden: usize,
    pub skipped_filled: usize,
    pub unmatched: usize,
    pub filled: Vec<FilledField>,
    #[serde(default)]
    pub cancelled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_string_keeps_empty_slots() {
        let ctx = FormElementContext {
            name_attr: "personal_email".to_string(),
            ..Default::default()
        };
        assert_eq!(ctx.context_string(), "  personal_email ");
    }

    #[test]
    fn profile_values_read_extension_shape() {
        let raw = r#"{
            "profile": { "fullName": "Ada Lovelace", "email": "ada@example.com" },
            "preferences": { "salaryTarget": 120000 },
            "n8n": { "webhookBaseUrl": "http://localhost:5678/webhook/" }
        }"#;
        let values: ProfileValues = serde_json::from_str(raw).unwrap();
        assert_eq!(values.profile.full_name, "Ada Lovelace");
        assert_eq!(values.preferences.salary_target, 120000.0);
        assert_eq!(values.preferences.notice_period, "2 weeks");
        assert!(values.profile.phone.is_empty());
    }

    #[test]
    fn posting_record_serializes_camel_case() {
        let record = PostingRecord {
            raw_description: "Build things".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["rawDescription"], "Build things");
        assert!(json.get("sourceUrl").is_some());
    }
}
