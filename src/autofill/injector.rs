use super::classifier::ControlSnapshot;
use super::document::{DomEvent, FormDocument, HighlightStyle, WriteOutcome, WritePath};
use super::pacing::Pacing;
use tracing::debug;

/// Writes resolved values into controls the way a framework will notice.
#[derive(Debug, Clone)]
pub struct Injector {
    style: HighlightStyle,
    pacing: Pacing,
}

impl Default for Injector {
    fn default() -> Self {
        Self::new(HighlightStyle::default(), Pacing::default())
    }
}

impl Injector {
    pub fn new(style: HighlightStyle, pacing: Pacing) -> Self {
        Self { style, pacing }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    /// Fill `control` with `value`.
    ///
    /// Returns `Ok(false)` without touching the document when the control is
    /// excluded, already holds a value, has vanished, or `value` is empty.
    /// A control that refuses or drops the value is blurred again and also
    /// yields `Ok(false)`, with no events and no highlight.
    /// On success the pacing delay has already elapsed when this returns.
    pub async fn inject<D>(
        &self,
        doc: &mut D,
        control: &ControlSnapshot,
        value: &str,
    ) -> anyhow::Result<bool>
    where
        D: FormDocument + ?Sized,
    {
        let index = control.index;
        if control.is_excluded() || value.is_empty() {
            return Ok(false);
        }
        match doc.current_value(index).await? {
            Some(current) if current.is_empty() => {}
            _ => return Ok(false),
        }

        doc.focus(index).await?;

        let path = match doc.write_value(index, value, WritePath::Native).await? {
            WriteOutcome::Written(path) => path,
            WriteOutcome::Unavailable => {
                debug!("control #{}: no native value setter, assigning directly", index);
                match doc.write_value(index, value, WritePath::Assignment).await? {
                    WriteOutcome::Written(path) => path,
                    _ => return self.abandon(doc, index).await,
                }
            }
            WriteOutcome::Missing | WriteOutcome::Rejected => return self.abandon(doc, index).await,
        };

        // A select drops values that are not among its options.
        if doc.current_value(index).await?.as_deref() != Some(value) {
            debug!("control #{} did not keep the value written via {:?}", index, path);
            return self.abandon(doc, index).await;
        }

        doc.dispatch(index, DomEvent::Input).await?;
        doc.dispatch(index, DomEvent::Change).await?;
        doc.blur(index).await?;
        doc.highlight(index, &self.style).await?;

        debug!("control #{} written via {:?}", index, path);
        self.pacing.pause().await;
        Ok(true)
    }

    async fn abandon<D>(&self, doc: &mut D, index: usize) -> anyhow::Result<bool>
    where
        D: FormDocument + ?Sized,
    {
        doc.blur(index).await?;
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autofill::memory::HtmlFormDocument;
    use crate::types::FormElementContext;

    fn snapshot(index: usize, input_type: Option<&str>) -> ControlSnapshot {
        ControlSnapshot {
            index,
            tag: "input".to_string(),
            input_type: input_type.map(str::to_string),
            context: FormElementContext::default(),
        }
    }

    fn injector() -> Injector {
        Injector::default().with_pacing(Pacing::none())
    }

    #[tokio::test]
    async fn refuses_excluded_controls_and_empty_values() {
        let mut doc = HtmlFormDocument::parse(r#"<input type="hidden"><input>"#);
        let injector = injector();

        assert!(!injector.inject(&mut doc, &snapshot(0, Some("hidden")), "x").await.unwrap());
        assert!(!injector.inject(&mut doc, &snapshot(1, None), "").await.unwrap());
        assert!(doc.controls().iter().all(|c| c.writes.is_empty() && c.focus_count == 0));
    }

    #[tokio::test]
    async fn vanished_control_is_not_written() {
        let mut doc = HtmlFormDocument::parse("<input>");
        assert!(!injector().inject(&mut doc, &snapshot(5, None), "x").await.unwrap());
    }

    #[tokio::test]
    async fn rejected_write_is_skipped_quietly() {
        let mut doc = HtmlFormDocument::parse(r#"<input type="file" name="cv">"#);
        // Snapshot without a type: only the backend knows it is a file input.
        let written = injector()
            .inject(&mut doc, &snapshot(0, None), "resume.pdf")
            .await
            .unwrap();

        let control = doc.control(0).unwrap();
        assert!(!written);
        assert_eq!(control.value, "");
        assert!(control.events.is_empty());
        assert!(control.highlight.is_none());
        assert!(!control.focused);
    }

    #[tokio::test]
    async fn select_without_matching_option_is_not_counted() {
        let mut doc = HtmlFormDocument::parse(
            r#"<select><option value="">-</option><option>Yes</option><option>No</option></select>"#,
        );
        let control = ControlSnapshot {
            tag: "select".to_string(),
            ..snapshot(0, None)
        };
        let written = injector().inject(&mut doc, &control, "1 month").await.unwrap();

        assert!(!written);
        assert_eq!(doc.value(0), Some(""));
        assert!(doc.control(0).unwrap().events.is_empty());
        assert!(doc.control(0).unwrap().highlight.is_none());
    }

    #[tokio::test]
    async fn writes_once_then_leaves_value_alone() {
        let mut doc = HtmlFormDocument::parse("<input>");
        let injector = injector();
        let control = snapshot(0, None);

        assert!(injector.inject(&mut doc, &control, "first").await.unwrap());
        assert!(!injector.inject(&mut doc, &control, "second").await.unwrap());
        assert_eq!(doc.value(0), Some("first"));
        assert_eq!(doc.control(0).unwrap().writes.len(), 1);
    }
}
