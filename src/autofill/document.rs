//! The live document as seen by the autofill pipeline.
//!
//! Controls are addressed by their position in
//! `document.querySelectorAll("input, textarea, select")` order, which is
//! also the order `scraper` yields them from a markup snapshot.

use crate::core::config::HighlightConfig;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

/// CSS query enumerating fillable controls, in document order.
pub const CONTROL_SELECTOR: &str = "input, textarea, select";

/// Controls matching [`CONTROL_SELECTOR`] that a live page would report.
///
/// `scraper` keeps `<template>` contents in the tree while
/// `querySelectorAll` never sees them, so those controls are dropped to keep
/// snapshot indices aligned with the page.
pub fn live_controls(document: &Html) -> Vec<ElementRef<'_>> {
    let Ok(selector) = Selector::parse(CONTROL_SELECTOR) else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter(|control| !in_template(*control))
        .collect()
}

/// Whether `element` sits inside `<template>` contents.
pub(crate) fn in_template(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| a.value().name() == "template")
}

/// How a value reached the control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePath {
    /// Through the prototype's own `value` setter, bypassing any accessor a
    /// UI framework installed on the instance.
    Native,
    /// Plain `el.value = v`.
    Assignment,
}

/// Result of a write attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(WritePath),
    /// The requested path does not exist for this control.
    Unavailable,
    /// No control at that index any more.
    Missing,
    /// The control threw on the write (a file input given a path string).
    Rejected,
}

/// Notifications dispatched after a write. Both bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomEvent {
    Input,
    Change,
}

impl DomEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomEvent::Input => "input",
            DomEvent::Change => "change",
        }
    }
}

/// Inline style marking a machine-filled field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightStyle {
    pub background: String,
    pub border: String,
    pub transition: String,
}

impl Default for HighlightStyle {
    fn default() -> Self {
        Self {
            background: "#e0e7ff".to_string(),
            border: "2px solid #6366f1".to_string(),
            transition: "all 0.3s ease".to_string(),
        }
    }
}

impl HighlightStyle {
    pub fn from_config(cfg: &HighlightConfig) -> Self {
        let defaults = Self::default();
        let pick = |v: &Option<String>, d: String| {
            v.as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or(d)
        };
        Self {
            background: pick(&cfg.background, defaults.background),
            border: pick(&cfg.border, defaults.border),
            transition: pick(&cfg.transition, defaults.transition),
        }
    }
}

/// A document the orchestrator can read and mutate.
///
/// Implementations return `Err` only for backend faults (lost CDP session,
/// evaluation failure). A control that has vanished is not a fault: reads
/// yield `None` and writes yield [`WriteOutcome::Missing`].
#[async_trait]
pub trait FormDocument: Send {
    /// Serialized markup of the current tree.
    async fn markup(&mut self) -> anyhow::Result<String>;

    /// Live `value` of the control, or `None` if it no longer exists.
    async fn current_value(&mut self, index: usize) -> anyhow::Result<Option<String>>;

    async fn focus(&mut self, index: usize) -> anyhow::Result<()>;

    async fn write_value(
        &mut self,
        index: usize,
        value: &str,
        path: WritePath,
    ) -> anyhow::Result<WriteOutcome>;

    async fn dispatch(&mut self, index: usize, event: DomEvent) -> anyhow::Result<()>;

    async fn blur(&mut self, index: usize) -> anyhow::Result<()>;

    async fn highlight(&mut self, index: usize, style: &HighlightStyle) -> anyhow::Result<()>;
}
