//! In-memory [`FormDocument`] over parsed markup.
//!
//! Controls keep the live state a browser would hold outside the markup:
//! the value slot, focus, dispatched events and inline highlight. An
//! optional framework value tracker behaves like the one React installs on
//! controlled inputs: assignments through the instance accessor update the
//! tracker too, so a following `input` event looks like "no change"; writes
//! through the native setter leave the tracker stale, so the event is seen.

use super::document::{
    live_controls, DomEvent, FormDocument, HighlightStyle, WriteOutcome, WritePath,
};
use crate::extraction::metadata::normalize_text;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

/// Live state of one control.
#[derive(Debug, Clone, Default)]
pub struct ControlState {
    pub tag: String,
    pub input_type: Option<String>,
    /// The underlying value slot.
    pub value: String,
    /// Allowed values for a `<select>`; empty for other controls.
    pub options: Vec<String>,
    /// Framework's last-seen value, when a framework manages this control.
    pub tracker: Option<String>,
    /// Values the framework picked up through its change handler.
    pub framework_changes: Vec<String>,
    pub events: Vec<DomEvent>,
    pub writes: Vec<WritePath>,
    pub focused: bool,
    pub focus_count: usize,
    pub highlight: Option<HighlightStyle>,
}

impl ControlState {
    fn from_element(element: ElementRef<'_>) -> Self {
        let el = element.value();
        let tag = el.name().to_string();
        let input_type = el.attr("type").map(|t| t.trim().to_ascii_lowercase());
        let mut state = ControlState {
            tag: tag.clone(),
            input_type: input_type.clone(),
            ..Default::default()
        };

        match tag.as_str() {
            "textarea" => state.value = element.text().collect(),
            "select" => {
                let mut selected = None;
                if let Ok(options) = Selector::parse("option") {
                    for option in element.select(&options) {
                        let value = option
                            .value()
                            .attr("value")
                            .map(str::to_string)
                            .unwrap_or_else(|| normalize_text(&option.text().collect::<String>()));
                        if selected.is_none() && option.value().attr("selected").is_some() {
                            selected = Some(value.clone());
                        }
                        state.options.push(value);
                    }
                }
                state.value = selected
                    .or_else(|| state.options.first().cloned())
                    .unwrap_or_default();
            }
            _ => {
                state.value = match (el.attr("value"), input_type.as_deref()) {
                    (Some(v), _) => v.to_string(),
                    // Browsers report "on" for value-less checkboxes and radios.
                    (None, Some("checkbox")) | (None, Some("radio")) => "on".to_string(),
                    (None, _) => String::new(),
                };
            }
        }
        state
    }

    /// File inputs throw on any non-empty string assignment.
    fn refuses(&self, value: &str) -> bool {
        self.tag == "input" && self.input_type.as_deref() == Some("file") && !value.is_empty()
    }

    /// What the slot holds after storing `value` (a select rejects unknown options).
    fn coerce(&self, value: &str) -> String {
        if self.tag == "select" && !self.options.iter().any(|o| o == value) {
            String::new()
        } else {
            value.to_string()
        }
    }
}

/// Parsed page plus per-control live state.
#[derive(Debug, Clone)]
pub struct HtmlFormDocument {
    markup: String,
    controls: Vec<ControlState>,
    native_setter: bool,
    /// Events observed by a listener on the document root.
    bubbled: Vec<(usize, DomEvent)>,
}

impl HtmlFormDocument {
    pub fn parse(markup: &str) -> Self {
        let controls = {
            let document = Html::parse_document(markup);
            live_controls(&document)
                .into_iter()
                .map(ControlState::from_element)
                .collect()
        };
        Self {
            markup: markup.to_string(),
            controls,
            native_setter: true,
            bubbled: Vec::new(),
        }
    }

    /// Put every control under framework value tracking.
    pub fn with_framework_tracking(mut self) -> Self {
        for control in &mut self.controls {
            control.tracker = Some(control.value.clone());
        }
        self
    }

    /// Simulate a runtime with no reachable prototype setter.
    pub fn without_native_setter(mut self) -> Self {
        self.native_setter = false;
        self
    }

    pub fn controls(&self) -> &[ControlState] {
        &self.controls
    }

    pub fn control(&self, index: usize) -> Option<&ControlState> {
        self.controls.get(index)
    }

    pub fn value(&self, index: usize) -> Option<&str> {
        self.controls.get(index).map(|c| c.value.as_str())
    }

    /// Events that reached the document root, in dispatch order.
    pub fn bubbled_events(&self) -> &[(usize, DomEvent)] {
        &self.bubbled
    }

    /// Simulate a user typing into a control (bypasses event bookkeeping).
    pub fn set_user_value(&mut self, index: usize, value: &str) {
        if let Some(control) = self.controls.get_mut(index) {
            control.value = control.coerce(value);
            if control.tracker.is_some() {
                control.tracker = Some(control.value.clone());
            }
        }
    }
}

#[async_trait]
impl FormDocument for HtmlFormDocument {
    async fn markup(&mut self) -> anyhow::Result<String> {
        Ok(self.markup.clone())
    }

    async fn current_value(&mut self, index: usize) -> anyhow::Result<Option<String>> {
        Ok(self.controls.get(index).map(|c| c.value.clone()))
    }

    async fn focus(&mut self, index: usize) -> anyhow::Result<()> {
        for (i, control) in self.controls.iter_mut().enumerate() {
            control.focused = i == index;
            if i == index {
                control.focus_count += 1;
            }
        }
        Ok(())
    }

    async fn write_value(
        &mut self,
        index: usize,
        value: &str,
        path: WritePath,
    ) -> anyhow::Result<WriteOutcome> {
        if path == WritePath::Native && !self.native_setter {
            return Ok(WriteOutcome::Unavailable);
        }
        let Some(control) = self.controls.get_mut(index) else {
            return Ok(WriteOutcome::Missing);
        };
        if control.refuses(value) {
            return Ok(WriteOutcome::Rejected);
        }
        control.value = control.coerce(value);
        if path == WritePath::Assignment && control.tracker.is_some() {
            // The framework's instance accessor swallows the assignment into its tracker.
            control.tracker = Some(control.value.clone());
        }
        control.writes.push(path);
        Ok(WriteOutcome::Written(path))
    }

    async fn dispatch(&mut self, index: usize, event: DomEvent) -> anyhow::Result<()> {
        let Some(control) = self.controls.get_mut(index) else {
            return Ok(());
        };
        control.events.push(event);
        if let Some(tracked) = control.tracker.as_mut() {
            if *tracked != control.value {
                *tracked = control.value.clone();
                control.framework_changes.push(control.value.clone());
            }
        }
        self.bubbled.push((index, event));
        Ok(())
    }

    async fn blur(&mut self, index: usize) -> anyhow::Result<()> {
        if let Some(control) = self.controls.get_mut(index) {
            control.focused = false;
        }
        Ok(())
    }

    async fn highlight(&mut self, index: usize, style: &HighlightStyle) -> anyhow::Result<()> {
        if let Some(control) = self.controls.get_mut(index) {
            control.highlight = Some(style.clone());
        }
        Ok(())
    }
}
