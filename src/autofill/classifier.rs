use super::document::{in_template, live_controls};
use crate::extraction::metadata::element_text;
use crate::types::FormElementContext;
use scraper::{ElementRef, Html, Selector};

/// Tags accepted as a proximity label (preceding sibling heuristic).
const PROXIMITY_LABEL_TAGS: &[&str] = &["label", "span", "div", "h3", "h4"];

/// Input types that never take typed text.
const EXCLUDED_INPUT_TYPES: &[&str] = &["hidden", "submit", "file", "button", "reset", "image"];

/// A control as captured from one markup snapshot.
#[derive(Debug, Clone)]
pub struct ControlSnapshot {
    pub index: usize,
    pub tag: String,
    /// Lower-cased `type` attribute, if any.
    pub input_type: Option<String>,
    pub context: FormElementContext,
}

impl ControlSnapshot {
    /// Hidden, submit and other non-text inputs are never inspected for injection.
    pub fn is_excluded(&self) -> bool {
        self.input_type
            .as_deref()
            .is_some_and(|t| EXCLUDED_INPUT_TYPES.contains(&t))
    }
}

/// Every fillable control in document order, classified.
pub fn snapshot_controls(document: &Html) -> Vec<ControlSnapshot> {
    live_controls(document)
        .into_iter()
        .enumerate()
        .map(|(index, control)| ControlSnapshot {
            index,
            tag: control.value().name().to_string(),
            input_type: control
                .value()
                .attr("type")
                .map(|t| t.trim().to_ascii_lowercase()),
            context: classify(document, control),
        })
        .collect()
}

/// Gather the text signals for one control.
pub fn classify(document: &Html, control: ElementRef<'_>) -> FormElementContext {
    let attr = |name: &str| {
        control
            .value()
            .attr(name)
            .map(|v| v.to_lowercase())
            .unwrap_or_default()
    };

    FormElementContext {
        label_text: find_label(document, control)
            .map(|label| element_text(label).to_lowercase())
            .unwrap_or_default(),
        placeholder: attr("placeholder"),
        name_attr: attr("name"),
        id_attr: attr("id"),
    }
}

/// Most likely label for `control`. First hit wins; texts are never merged.
///
/// 1. `<label for=ID>` pointing at the control's id
/// 2. an ancestor `<label>` wrapping the control
/// 3. the previous element sibling, or the parent's previous element sibling
///    when the control has none, if its tag is in [`PROXIMITY_LABEL_TAGS`]
pub fn find_label<'a>(document: &'a Html, control: ElementRef<'a>) -> Option<ElementRef<'a>> {
    if let Some(id) = control.value().id().filter(|id| !id.is_empty()) {
        if let Ok(labels) = Selector::parse("label[for]") {
            if let Some(label) = document
                .select(&labels)
                .find(|l| l.value().attr("for") == Some(id) && !in_template(*l))
            {
                return Some(label);
            }
        }
    }

    if let Some(wrapping) = control
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "label")
    {
        return Some(wrapping);
    }

    let candidate = previous_element_sibling(control).or_else(|| {
        control
            .parent()
            .and_then(ElementRef::wrap)
            .and_then(previous_element_sibling)
    })?;

    PROXIMITY_LABEL_TAGS
        .contains(&candidate.value().name())
        .then_some(candidate)
}

fn previous_element_sibling(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.prev_siblings().find_map(ElementRef::wrap)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contexts(html: &str) -> Vec<FormElementContext> {
        let document = Html::parse_document(html);
        snapshot_controls(&document)
            .into_iter()
            .map(|c| c.context)
            .collect()
    }

    #[test]
    fn id_linked_label_beats_wrapping_label() {
        let ctx = contexts(
            r#"<label for="fn">First Name</label>
               <label>Applicant <input id="fn" name="applicant"></label>"#,
        );
        assert_eq!(ctx[0].label_text, "first name");
    }

    #[test]
    fn wrapping_label_when_no_id_link() {
        let ctx = contexts(r#"<label>  E-mail
                address <input name="contact"></label>"#);
        assert_eq!(ctx[0].label_text, "e-mail address");
    }

    #[test]
    fn previous_sibling_in_allow_list() {
        let ctx = contexts(r#"<div><h4>Phone Number</h4><input name="q1"></div>"#);
        assert_eq!(ctx[0].label_text, "phone number");
    }

    #[test]
    fn parent_previous_sibling_when_control_is_first_child() {
        let ctx = contexts(
            r#"<span>LinkedIn Profile</span><div class="wrap"><input name="q2"></div>"#,
        );
        assert_eq!(ctx[0].label_text, "linkedin profile");
    }

    #[test]
    fn sibling_outside_allow_list_is_ignored() {
        let ctx = contexts(r#"<div><p>Salary</p><input name="q3"></div>"#);
        assert_eq!(ctx[0].label_text, "");
    }

    #[test]
    fn text_nodes_are_not_siblings() {
        let ctx = contexts(r#"<div><span>City</span> some text <input name="q4"></div>"#);
        assert_eq!(ctx[0].label_text, "city");
    }

    #[test]
    fn bare_control_yields_attribute_only_context() {
        let ctx = contexts(r#"<form><input name="personal_email"></form>"#);
        assert_eq!(ctx[0].label_text, "");
        assert_eq!(ctx[0].context_string(), "  personal_email ");
    }

    #[test]
    fn attributes_are_lower_cased() {
        let ctx = contexts(r#"<input id="Email" name="UserEmail" placeholder="Your Email">"#);
        assert_eq!(ctx[0].placeholder, "your email");
        assert_eq!(ctx[0].name_attr, "useremail");
        assert_eq!(ctx[0].id_attr, "email");
    }

    #[test]
    fn snapshot_flags_hidden_and_submit() {
        let document = Html::parse_document(
            r#"<input type="HIDDEN" name="csrf"><input type="submit"><textarea name="bio"></textarea><select name="c"></select>"#,
        );
        let controls = snapshot_controls(&document);
        assert_eq!(controls.len(), 4);
        assert!(controls[0].is_excluded());
        assert!(controls[1].is_excluded());
        assert_eq!(controls[2].tag, "textarea");
        assert!(!controls[3].is_excluded());
    }

    #[test]
    fn non_text_inputs_are_excluded() {
        let document = Html::parse_document(
            r#"<input type="file" id="cover_letter"><input type="Button"><input type="reset">
               <input type="image"><input type="email"><input type="checkbox">"#,
        );
        let excluded: Vec<bool> = snapshot_controls(&document)
            .iter()
            .map(ControlSnapshot::is_excluded)
            .collect();
        assert_eq!(excluded, vec![true, true, true, true, false, false]);
    }

    #[test]
    fn template_controls_do_not_shift_indices() {
        let document = Html::parse_document(
            r#"<template><input name="tpl"></template><input name="first_name"><input name="email">"#,
        );
        let controls = snapshot_controls(&document);
        assert_eq!(controls.len(), 2);
        assert_eq!(controls[0].index, 0);
        assert_eq!(controls[0].context.name_attr, "first_name");
        assert_eq!(controls[1].context.name_attr, "email");
    }
}
