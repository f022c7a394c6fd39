use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Collapse whitespace runs to single spaces and trim.
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized text content of an element.
pub fn element_text(element: ElementRef<'_>) -> String {
    normalize_text(&element.text().collect::<String>())
}

/// Text of the first element matching `selector_str`, if it is non-empty.
///
/// A selector that fails to parse is treated as unmatched.
pub fn first_text(document: &Html, selector_str: &str) -> Option<String> {
    let selector = match Selector::parse(selector_str) {
        Ok(s) => s,
        Err(e) => {
            debug!("unparsable selector {:?}: {:?}", selector_str, e);
            return None;
        }
    };

    document
        .select(&selector)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
}

/// Trimmed `content` of the first meta tag matching `selector_str`.
fn meta_content(document: &Html, selector_str: &str) -> Option<String> {
    let selector = Selector::parse(selector_str).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

/// Document `<title>` text; empty when absent.
pub fn document_title(document: &Html) -> String {
    first_text(document, "title").unwrap_or_default()
}

/// Full visible-ish page text: the body, or the whole tree when no body exists.
///
/// Script, style and template contents are not page text and are skipped.
pub fn body_text(document: &Html) -> String {
    let root = Selector::parse("body")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .unwrap_or_else(|| document.root_element());

    let mut out = String::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden_parent = node
            .parent()
            .and_then(ElementRef::wrap)
            .map(|p| matches!(p.value().name(), "script" | "style" | "noscript" | "template"))
            .unwrap_or(false);
        if hidden_parent {
            continue;
        }
        out.push_str(text);
        out.push(' ');
    }
    normalize_text(&out)
}

/// `<meta name="description">` content; empty when absent.
pub fn meta_description(document: &Html) -> String {
    meta_content(document, "meta[name=\"description\"]").unwrap_or_default()
}

/// Site-name metadata used as the last company fallback.
///
/// Precedence: `og:site_name`, then `application-name`.
pub fn site_name(document: &Html) -> Option<String> {
    meta_content(document, "meta[property=\"og:site_name\"]")
        .or_else(|| meta_content(document, "meta[name=\"application-name\"]"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_text_skips_scripts_and_collapses_whitespace() {
        let html = Html::parse_document(
            r#"<html><head><title>T</title></head><body>
                <h1>Senior   Engineer</h1>
                <script>var x = "noise";</script>
                <p>Remote
                   friendly</p>
            </body></html>"#,
        );
        assert_eq!(body_text(&html), "Senior Engineer Remote friendly");
    }

    #[test]
    fn site_name_prefers_open_graph() {
        let html = Html::parse_document(
            r#"<head>
                <meta name="application-name" content="App Name">
                <meta property="og:site_name" content=" Acme Corp ">
            </head>"#,
        );
        assert_eq!(site_name(&html).as_deref(), Some("Acme Corp"));

        let html = Html::parse_document(r#"<head><meta name="application-name" content="Beta"></head>"#);
        assert_eq!(site_name(&html).as_deref(), Some("Beta"));
    }

    #[test]
    fn bad_selector_is_unmatched() {
        let html = Html::parse_document("<h1>x</h1>");
        assert!(first_text(&html, "h1[[").is_none());
    }
}
