//! Launching and driving a Chromium-family browser for the bridge.

use crate::core::config::BrowserConfig as BrowserSettings;
use anyhow::{anyhow, Result};
use chromiumoxide::browser::BrowserConfig;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

// ── Browser executable discovery ─────────────────────────────────────────────

/// Binary names looked up on `PATH`, most preferred first.
const PATH_BINARIES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "brave-browser",
    "chrome",
];

#[cfg(target_os = "macos")]
const INSTALL_PATHS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
];

#[cfg(target_os = "windows")]
const INSTALL_PATHS: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const INSTALL_PATHS: &[&str] = &[
    "/usr/bin/google-chrome",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
];

/// Locate a browser: configured path or `CHROME_EXECUTABLE`, then `PATH`,
/// then the platform's usual install locations.
pub fn find_chrome_executable(settings: &BrowserSettings) -> Option<String> {
    settings
        .resolve_executable()
        .or_else(|| on_path(PATH_BINARIES))
        .or_else(|| {
            INSTALL_PATHS
                .iter()
                .find(|p| Path::new(p).is_file())
                .map(|p| p.to_string())
        })
}

fn on_path(binaries: &[&str]) -> Option<String> {
    let dirs: Vec<PathBuf> = std::env::split_paths(&std::env::var_os("PATH")?).collect();
    first_in(&dirs, binaries)
}

/// First existing `dir/binary`, trying each binary across all dirs in turn.
fn first_in(dirs: &[PathBuf], binaries: &[&str]) -> Option<String> {
    binaries
        .iter()
        .flat_map(|bin| dirs.iter().map(move |dir| dir.join(bin)))
        .find(|candidate| candidate.is_file())
        .map(|p| p.to_string_lossy().into_owned())
}

// ── Browser config builder ───────────────────────────────────────────────────

/// Build a `BrowserConfig`.
///
/// Capture runs headless; autofill runs headed so the user can review and
/// submit the form themselves.
pub fn build_browser_config(exe: &str, headless: bool, width: u32, height: u32) -> Result<BrowserConfig> {
    let mut builder = BrowserConfig::builder()
        .chrome_executable(exe)
        .viewport(Viewport {
            width,
            height,
            device_scale_factor: Some(1.0),
            emulating_mobile: false,
            is_landscape: true,
            has_touch: false,
        })
        .window_size(width, height)
        .arg("--disable-gpu")
        .arg("--no-sandbox")
        .arg("--disable-dev-shm-usage")
        .arg("--disable-extensions")
        .arg("--disable-sync")
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--disable-blink-features=AutomationControlled");

    if !headless {
        builder = builder.with_head();
    }

    builder
        .build()
        .map_err(|e| anyhow!("Failed to build browser config: {}", e))
}

// ── Session ──────────────────────────────────────────────────────────────────

/// A launched browser and the task draining its CDP handler.
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    settings: BrowserSettings,
}

impl BrowserSession {
    pub async fn launch(settings: &BrowserSettings, headless: bool) -> Result<Self> {
        let exe = find_chrome_executable(settings).ok_or_else(|| {
            anyhow!("No browser found. Install Brave, Chrome, or Chromium, or set CHROME_EXECUTABLE.")
        })?;
        info!("🚀 launching browser ({}, headless={})", exe, headless);

        let config = build_browser_config(&exe, headless, 1366, 900)?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| anyhow!("Failed to launch browser ({}): {}", exe, e))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!("CDP handler error: {}", e);
                }
            }
        });

        Ok(Self {
            browser,
            handler,
            settings: settings.clone(),
        })
    }

    /// Open `url` in a fresh tab and wait for it to settle.
    pub async fn open(&self, url: &str) -> Result<Page> {
        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| anyhow!("Failed to open {}: {}", url, e))?;
        wait_until_stable(
            &page,
            self.settings.resolve_wait_quiet_ms(),
            self.settings.resolve_wait_timeout_ms(),
        )
        .await?;
        Ok(page)
    }

    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("browser close failed: {}", e);
        }
        self.handler.abort();
    }
}

// ── Settle wait ──────────────────────────────────────────────────────────────

const SETTLE_POLL: Duration = Duration::from_millis(250);
const SETTLE_PROBE: &str =
    "[document.readyState, performance.getEntriesByType('resource').length]";

/// Block until the document is `complete` and no new resource has loaded for
/// `quiet_ms`, giving up quietly after `timeout_ms`.
pub async fn wait_until_stable(page: &Page, quiet_ms: u64, timeout_ms: u64) -> Result<()> {
    let quiet = Duration::from_millis(quiet_ms);
    let deadline = Instant::now() + Duration::from_millis(timeout_ms);
    let mut seen: Option<u64> = None;
    let mut quiet_since = Instant::now();

    while Instant::now() < deadline {
        let (complete, resources) = settle_probe(page).await;
        if !complete || seen != Some(resources) {
            seen = Some(resources);
            quiet_since = Instant::now();
        } else if quiet_since.elapsed() >= quiet {
            debug!("page settled with {} resources", resources);
            return Ok(());
        }
        tokio::time::sleep(SETTLE_POLL).await;
    }

    debug!("page still busy after {}ms; continuing", timeout_ms);
    Ok(())
}

/// `(readyState == "complete", resource count)`; a failed probe reads as busy.
async fn settle_probe(page: &Page) -> (bool, u64) {
    let probe = match page.evaluate(SETTLE_PROBE).await {
        Ok(result) => result.into_value::<Value>().unwrap_or(Value::Null),
        Err(e) => {
            debug!("settle probe failed: {}", e);
            Value::Null
        }
    };
    (
        probe[0].as_str() == Some("complete"),
        probe[1].as_u64().unwrap_or(0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_missing_executable_is_ignored() {
        let settings = BrowserSettings {
            executable: Some("/definitely/not/a/browser".to_string()),
            ..Default::default()
        };
        // Falls through to discovery; must not echo the bogus path back.
        assert_ne!(
            find_chrome_executable(&settings).as_deref(),
            Some("/definitely/not/a/browser")
        );
    }

    #[test]
    fn binary_preference_beats_path_order() {
        let root = std::env::temp_dir().join(format!("jobflow-path-{}", std::process::id()));
        let (early, late) = (root.join("a"), root.join("b"));
        std::fs::create_dir_all(&early).unwrap();
        std::fs::create_dir_all(&late).unwrap();
        std::fs::write(early.join("chromium"), b"").unwrap();
        std::fs::write(late.join("google-chrome"), b"").unwrap();

        let found = first_in(&[early.clone(), late.clone()], PATH_BINARIES);
        assert_eq!(found, Some(late.join("google-chrome").to_string_lossy().into_owned()));
        assert_eq!(first_in(&[early], &["brave-browser"]), None);

        let _ = std::fs::remove_dir_all(&root);
    }
}
