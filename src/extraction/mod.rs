//! Job-posting extraction.
//!
//! `extract` is total: every field that has no site selector, or whose
//! selector resolves to nothing, falls back to its generic default on its own.
//!
//! | field          | site selector          | generic default                |
//! |----------------|------------------------|--------------------------------|
//! | title          | `title_selector`       | `<title>` text                 |
//! | company        | `company_selector`     | `og:site_name` → `application-name` → `""` |
//! | rawDescription | `description_selector` | full body text                 |
//! | location       | `location_selector`    | `""`                           |

pub mod metadata;
pub mod registry;

pub use registry::{SelectorRegistry, SelectorRule, BUILTIN_REGISTRY_VERSION};

use crate::types::PostingRecord;
use scraper::Html;
use std::sync::OnceLock;
use tracing::debug;
use url::Url;

static BUILTIN_REGISTRY: OnceLock<SelectorRegistry> = OnceLock::new();

fn builtin_registry() -> &'static SelectorRegistry {
    BUILTIN_REGISTRY.get_or_init(SelectorRegistry::builtin)
}

/// Extract with the built-in registry.
pub fn extract(document: &Html, hostname: &str) -> PostingRecord {
    Extractor::new(builtin_registry()).extract(document, hostname)
}

/// Parse `html` and extract, deriving the hostname from `url`.
///
/// An unparsable URL yields an empty hostname (generic defaults only) but is
/// still echoed back as `sourceUrl`.
pub fn extract_from_html(html: &str, url: &str) -> PostingRecord {
    Extractor::new(builtin_registry()).extract_from_html(html, url)
}

/// Visible text of the page body, whitespace-collapsed.
pub fn page_text(html: &str) -> String {
    metadata::body_text(&Html::parse_document(html))
}

/// Extraction bound to a specific selector table.
#[derive(Clone, Copy)]
pub struct Extractor<'a> {
    registry: &'a SelectorRegistry,
}

impl<'a> Extractor<'a> {
    pub fn new(registry: &'a SelectorRegistry) -> Self {
        Self { registry }
    }

    pub fn extract_from_html(&self, html: &str, url: &str) -> PostingRecord {
        let document = Html::parse_document(html);
        let hostname = hostname_of(url);
        let mut record = self.extract(&document, &hostname);
        record.source_url = url.trim().to_string();
        record
    }

    pub fn extract(&self, document: &Html, hostname: &str) -> PostingRecord {
        let rule = self.registry.lookup(hostname);
        match rule {
            Some(r) => debug!("selector rule {:?} applies to {}", r.domain_match, hostname),
            None => debug!("no selector rule for {:?}; generic defaults only", hostname),
        }

        let field = |pick: fn(&SelectorRule) -> Option<&String>| -> Option<String> {
            let selector = rule.and_then(pick)?;
            metadata::first_text(document, selector)
        };

        let title = field(|r| r.title_selector.as_ref())
            .unwrap_or_else(|| metadata::document_title(document));
        let company = field(|r| r.company_selector.as_ref())
            .or_else(|| metadata::site_name(document))
            .unwrap_or_default();
        let raw_description = field(|r| r.description_selector.as_ref())
            .unwrap_or_else(|| metadata::body_text(document));
        let location = field(|r| r.location_selector.as_ref()).unwrap_or_default();

        PostingRecord {
            title,
            company,
            raw_description,
            location,
            meta_description: metadata::meta_description(document),
            source_url: String::new(),
        }
    }
}

/// Lower-cased host of `url`, or `""` when it has none.
pub fn hostname_of(url: &str) -> String {
    Url::parse(url.trim())
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
        .unwrap_or_default()
}
