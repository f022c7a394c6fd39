//! [`FormDocument`] over a live Chromium page.
//!
//! Each operation is a small self-contained script evaluated in the page. The
//! control is re-resolved by index every time, so a re-render between steps
//! yields "missing" instead of writing into a detached node.

use crate::autofill::{DomEvent, FormDocument, HighlightStyle, WriteOutcome, WritePath};
use crate::autofill::document::CONTROL_SELECTOR;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chromiumoxide::Page;
use serde_json::Value;

pub struct CdpFormDocument {
    page: Page,
}

impl CdpFormDocument {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn into_page(self) -> Page {
        self.page
    }

    async fn eval(&self, script: String) -> Result<Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| anyhow!("page evaluation failed: {}", e))?;
        // `undefined` / `null` come back without a value.
        Ok(result.into_value::<Value>().unwrap_or(Value::Null))
    }
}

/// Wrap `body` so it runs with `el` bound to control `index` (or returns `null`).
fn control_script(index: usize, body: &str) -> String {
    let selector = Value::String(CONTROL_SELECTOR.to_string());
    format!(
        "(() => {{ const el = document.querySelectorAll({selector})[{index}]; \
         if (!el) return null; {body} }})()"
    )
}

/// JS string literal for `value`.
fn js_string(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

/// Run a write statement, reporting a thrown exception as `'rejected'`.
fn guarded_write(statement: &str, outcome: &str) -> String {
    format!("try {{ {statement} }} catch (e) {{ return 'rejected'; }} return '{outcome}';")
}

fn native_write_body(value: &str) -> String {
    format!(
        "const d = Object.getOwnPropertyDescriptor(Object.getPrototypeOf(el), 'value'); \
         if (!d || typeof d.set !== 'function') return 'unavailable'; {}",
        guarded_write(&format!("d.set.call(el, {});", js_string(value)), "native")
    )
}

fn assignment_write_body(value: &str) -> String {
    guarded_write(&format!("el.value = {};", js_string(value)), "assignment")
}

fn highlight_body(style: &HighlightStyle) -> String {
    format!(
        "el.style.backgroundColor = {}; el.style.border = {}; el.style.transition = {}; return true;",
        js_string(&style.background),
        js_string(&style.border),
        js_string(&style.transition)
    )
}

fn parse_write_outcome(v: &Value) -> WriteOutcome {
    match v.as_str() {
        Some("native") => WriteOutcome::Written(WritePath::Native),
        Some("assignment") => WriteOutcome::Written(WritePath::Assignment),
        Some("unavailable") => WriteOutcome::Unavailable,
        Some("rejected") => WriteOutcome::Rejected,
        _ => WriteOutcome::Missing,
    }
}

#[async_trait]
impl FormDocument for CdpFormDocument {
    async fn markup(&mut self) -> Result<String> {
        self.page
            .content()
            .await
            .map_err(|e| anyhow!("Failed to get page content: {}", e))
    }

    async fn current_value(&mut self, index: usize) -> Result<Option<String>> {
        let v = self
            .eval(control_script(index, "return String(el.value ?? '');"))
            .await?;
        Ok(v.as_str().map(str::to_string))
    }

    async fn focus(&mut self, index: usize) -> Result<()> {
        self.eval(control_script(index, "el.focus(); return true;"))
            .await
            .map(|_| ())
    }

    async fn write_value(&mut self, index: usize, value: &str, path: WritePath) -> Result<WriteOutcome> {
        let body = match path {
            WritePath::Native => native_write_body(value),
            WritePath::Assignment => assignment_write_body(value),
        };
        let v = self.eval(control_script(index, &body)).await?;
        Ok(parse_write_outcome(&v))
    }

    async fn dispatch(&mut self, index: usize, event: DomEvent) -> Result<()> {
        let body = format!(
            "el.dispatchEvent(new Event({}, {{ bubbles: true }})); return true;",
            js_string(event.as_str())
        );
        self.eval(control_script(index, &body)).await.map(|_| ())
    }

    async fn blur(&mut self, index: usize) -> Result<()> {
        self.eval(control_script(index, "el.blur(); return true;"))
            .await
            .map(|_| ())
    }

    async fn highlight(&mut self, index: usize, style: &HighlightStyle) -> Result<()> {
        self.eval(control_script(index, &highlight_body(style)))
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripts_address_controls_by_index() {
        let script = control_script(4, "return 1;");
        assert!(script.contains(r#"document.querySelectorAll("input, textarea, select")[4]"#));
        assert!(script.starts_with("(() => {"));
        assert!(script.ends_with("})()"));
    }

    #[test]
    fn values_are_escaped_as_js_literals() {
        let body = assignment_write_body("O'Brien \"Jr\"\n");
        assert_eq!(
            body,
            r#"try { el.value = "O'Brien \"Jr\"\n"; } catch (e) { return 'rejected'; } return 'assignment';"#
        );
    }

    #[test]
    fn native_write_uses_prototype_setter() {
        let body = native_write_body("x");
        assert!(body.contains("Object.getPrototypeOf(el)"));
        assert!(body.contains("try { d.set.call(el, \"x\"); } catch (e) { return 'rejected'; }"));
    }

    #[test]
    fn write_outcomes_map_from_script_results() {
        assert_eq!(
            parse_write_outcome(&Value::from("native")),
            WriteOutcome::Written(WritePath::Native)
        );
        assert_eq!(parse_write_outcome(&Value::from("unavailable")), WriteOutcome::Unavailable);
        assert_eq!(parse_write_outcome(&Value::from("rejected")), WriteOutcome::Rejected);
        assert_eq!(parse_write_outcome(&Value::Null), WriteOutcome::Missing);
    }
}
