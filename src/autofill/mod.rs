//! Profile-driven form autofill.
//!
//! One pass walks every `input`, `textarea` and `select` in document order,
//! strictly one at a time:
//!
//! 1. cancellation check
//! 2. skip `type=hidden` / `type=submit` and the other non-text inputs
//!    (`file`, `button`, `reset`, `image`)
//! 3. skip controls that already hold a value (live read)
//! 4. classify → match against the [`RuleTable`] → inject
//!
//! Which controls exist, and their labels, come from a single markup snapshot
//! taken at the start of the pass; values are always read live, so each
//! control observes every earlier write.

pub mod classifier;
pub mod document;
pub mod injector;
pub mod memory;
pub mod pacing;
pub mod rules;

pub use classifier::{classify, find_label, snapshot_controls, ControlSnapshot};
pub use document::{DomEvent, FormDocument, HighlightStyle, WriteOutcome, WritePath};
pub use injector::Injector;
pub use memory::HtmlFormDocument;
pub use pacing::Pacing;
pub use rules::{FieldRule, MatchEnv, Resolver, RuleTable, BUILTIN_RULES_VERSION};

use crate::core::config::JobflowConfig;
use crate::extraction::metadata::document_title;
use crate::types::{AutofillReport, FilledField, ProfileValues};
use scraper::Html;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum AutofillError {
    #[error("could not snapshot the document: {0}")]
    Snapshot(#[source] anyhow::Error),
    #[error("document backend failed on control #{index}: {source}")]
    Document {
        index: usize,
        #[source]
        source: anyhow::Error,
    },
}

/// Knobs for one pass.
#[derive(Debug, Clone, Default)]
pub struct AutofillOptions {
    pub rules: RuleTable,
    pub injector: Injector,
    /// Checked between controls; a cancelled pass keeps what it already filled.
    pub cancel: Option<CancellationToken>,
}

impl AutofillOptions {
    pub fn from_config(cfg: &JobflowConfig) -> Self {
        Self {
            rules: RuleTable::builtin(),
            injector: Injector::new(
                HighlightStyle::from_config(&cfg.highlight),
                Pacing::from_config(&cfg.pacing),
            ),
            cancel: None,
        }
    }

    pub fn with_rules(mut self, rules: RuleTable) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.injector = self.injector.with_pacing(pacing);
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }
}

/// Page title and classified controls from one snapshot.
fn plan_pass(markup: &str) -> (String, Vec<ControlSnapshot>) {
    let document = Html::parse_document(markup);
    (document_title(&document), snapshot_controls(&document))
}

/// Run one autofill pass over `doc`.
///
/// Per-control problems (no matching rule, empty value, vanished control,
/// a control that refuses or drops the value) are skipped silently. Only a backend fault ends the pass early; fields
/// written before it stay written.
pub async fn autofill<D>(
    doc: &mut D,
    profile: &ProfileValues,
    options: &AutofillOptions,
) -> Result<AutofillReport, AutofillError>
where
    D: FormDocument + ?Sized,
{
    let markup = doc.markup().await.map_err(AutofillError::Snapshot)?;
    let (page_title, controls) = plan_pass(&markup);
    let env = MatchEnv {
        profile,
        page_title: &page_title,
    };

    let mut report = AutofillReport::default();
    for control in &controls {
        if options.is_cancelled() {
            info!("autofill cancelled before control #{}", control.index);
            report.cancelled = true;
            break;
        }

        if control.is_excluded() {
            report.skipped_hidden += 1;
            continue;
        }
        report.inspected += 1;

        let fault = |source| AutofillError::Document {
            index: control.index,
            source,
        };

        let current = doc.current_value(control.index).await.map_err(fault)?;
        match current {
            Some(v) if v.is_empty() => {}
            Some(_) => {
                report.skipped_filled += 1;
                continue;
            }
            None => {
                debug!("control #{} vanished; skipping", control.index);
                report.unmatched += 1;
                continue;
            }
        }

        let context = control.context.context_string();
        let Some(hit) = options.rules.resolve(&context, &env) else {
            debug!("control #{} unmatched: {:?}", control.index, context.trim());
            report.unmatched += 1;
            continue;
        };

        let written = options
            .injector
            .inject(doc, control, &hit.value)
            .await
            .map_err(fault)?;
        if written {
            debug!("control #{} filled by rule {}", control.index, hit.rule.name);
            report.filled.push(FilledField {
                index: control.index,
                rule: hit.rule.name.clone(),
                value: hit.value,
            });
        } else {
            report.unmatched += 1;
        }
    }

    info!(
        "autofill pass: {} filled, {} already filled, {} unmatched, {} hidden/submit{}",
        report.filled.len(),
        report.skipped_filled,
        report.unmatched,
        report.skipped_hidden,
        if report.cancelled { " (cancelled)" } else { "" }
    );
    Ok(report)
}
