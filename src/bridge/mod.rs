//! Browser bridge: drives the extraction and autofill engines against real
//! pages over CDP. Nothing in `extraction` or `autofill` depends on this.

pub mod browser_manager;
pub mod cdp;

pub use browser_manager::{find_chrome_executable, wait_until_stable, BrowserSession};
pub use cdp::CdpFormDocument;

use crate::autofill::{autofill, AutofillOptions};
use crate::extraction::{extract_from_html, page_text};
use crate::types::{AutofillReport, PostingRecord, ProfileValues};
use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};

/// A posting captured from a live tab.
#[derive(Debug, Clone)]
pub struct CapturedPosting {
    pub record: PostingRecord,
    pub raw_html: String,
    /// Visible body text, sent to the intake webhook.
    pub page_text: String,
}

/// Open `url` in a background tab, extract, and close the tab.
///
/// The tab is closed whether or not extraction succeeds.
pub async fn capture_posting(session: &BrowserSession, url: &str) -> Result<CapturedPosting> {
    let page = session.open(url).await?;

    let content = page
        .content()
        .await
        .map_err(|e| anyhow!("Failed to get page content: {}", e));

    // Prefer the post-redirect URL so hostname matching sees the real board.
    let final_url = page
        .url()
        .await
        .ok()
        .flatten()
        .unwrap_or_else(|| url.to_string());

    if let Err(e) = page.close().await {
        warn!("failed to close capture tab for {}: {}", url, e);
    }

    let raw_html = content?;
    let record = extract_from_html(&raw_html, &final_url);
    info!(
        "captured posting {:?} at {:?} ({} chars)",
        record.title,
        record.company,
        raw_html.len()
    );
    Ok(CapturedPosting {
        record,
        page_text: page_text(&raw_html),
        raw_html,
    })
}

/// Open `url` and run one autofill pass on it. The tab stays open for review.
pub async fn autofill_url(
    session: &BrowserSession,
    url: &str,
    profile: &ProfileValues,
    options: &AutofillOptions,
) -> Result<(CdpFormDocument, AutofillReport)> {
    let page = session.open(url).await?;
    let mut doc = CdpFormDocument::new(page);
    let report = autofill(&mut doc, profile, options)
        .await
        .with_context(|| format!("autofill failed on {}", url))?;
    Ok((doc, report))
}
