use std::path::Path;

// ---------------------------------------------------------------------------
// JobflowConfig: file-based config loader (jobflow.json) with env-var fallback
// ---------------------------------------------------------------------------

pub const ENV_CONFIG_PATH: &str = "JOBFLOW_CONFIG";
pub const ENV_PACING_MIN_MS: &str = "JOBFLOW_PACING_MIN_MS";
pub const ENV_PACING_MAX_MS: &str = "JOBFLOW_PACING_MAX_MS";
pub const ENV_WEBHOOK_BASE_URL: &str = "JOBFLOW_WEBHOOK_BASE_URL";
pub const ENV_CHROME_EXECUTABLE: &str = "CHROME_EXECUTABLE";

pub const DEFAULT_PACING_MIN_MS: u64 = 150;
pub const DEFAULT_PACING_MAX_MS: u64 = 300;
pub const DEFAULT_WEBHOOK_BASE_URL: &str = "http://localhost:5678/webhook/";

/// Inter-injection delay bounds (mirrors the `pacing` key in jobflow.json).
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct PacingConfig {
    pub min_ms: Option<u64>,
    pub max_ms: Option<u64>,
}

impl PacingConfig {
    /// Lower bound: JSON field → `JOBFLOW_PACING_MIN_MS` → 150.
    pub fn resolve_min_ms(&self) -> u64 {
        if let Some(n) = self.min_ms {
            return n;
        }
        env_u64(ENV_PACING_MIN_MS).unwrap_or(DEFAULT_PACING_MIN_MS)
    }

    /// Upper bound: JSON field → `JOBFLOW_PACING_MAX_MS` → 300.
    ///
    /// Never below the resolved lower bound.
    pub fn resolve_max_ms(&self) -> u64 {
        let max = self
            .max_ms
            .or_else(|| env_u64(ENV_PACING_MAX_MS))
            .unwrap_or(DEFAULT_PACING_MAX_MS);
        max.max(self.resolve_min_ms())
    }
}

/// Visual marker applied to machine-filled controls.
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct HighlightConfig {
    pub background: Option<String>,
    pub border: Option<String>,
    pub transition: Option<String>,
}

/// Where captured postings are sent.
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct IntakeConfig {
    pub webhook_base_url: Option<String>,
}

impl IntakeConfig {
    /// Webhook base: JSON field → `JOBFLOW_WEBHOOK_BASE_URL` → local n8n default.
    pub fn resolve_webhook_base_url(&self) -> String {
        if let Some(u) = &self.webhook_base_url {
            if !u.trim().is_empty() {
                return u.trim().to_string();
            }
        }
        std::env::var(ENV_WEBHOOK_BASE_URL)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_WEBHOOK_BASE_URL.to_string())
    }
}

/// Browser bridge settings.
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct BrowserConfig {
    /// Explicit executable path. Falls back to `CHROME_EXECUTABLE`, then auto-discovery.
    pub executable: Option<String>,
    /// Network-quiet window before a page counts as settled. Default: 1500.
    pub wait_quiet_ms: Option<u64>,
    /// Hard cap on the settle wait. Default: 10000.
    pub wait_timeout_ms: Option<u64>,
}

impl BrowserConfig {
    pub fn resolve_executable(&self) -> Option<String> {
        if let Some(p) = &self.executable {
            let p = p.trim();
            if !p.is_empty() && Path::new(p).exists() {
                return Some(p.to_string());
            }
        }
        chrome_executable_override()
    }

    pub fn resolve_wait_quiet_ms(&self) -> u64 {
        self.wait_quiet_ms.unwrap_or(1500)
    }

    pub fn resolve_wait_timeout_ms(&self) -> u64 {
        self.wait_timeout_ms.unwrap_or(10_000)
    }
}

/// Top-level config loaded from `jobflow.json`.
#[derive(serde::Deserialize, Default, Clone, Debug)]
#[serde(default)]
pub struct JobflowConfig {
    pub pacing: PacingConfig,
    pub highlight: HighlightConfig,
    pub intake: IntakeConfig,
    pub browser: BrowserConfig,
}

/// Load `jobflow.json` from standard locations.
///
/// Search order (first found wins):
/// 1. `JOBFLOW_CONFIG` env var path
/// 2. `./jobflow.json`
/// 3. `../jobflow.json`
/// 4. `~/.jobflow/jobflow.json`
///
/// Missing file → `JobflowConfig::default()` (silent, all env-var fallbacks apply).
/// Parse error → log a warning, return `JobflowConfig::default()`.
pub fn load_config() -> JobflowConfig {
    let candidates: Vec<std::path::PathBuf> = {
        let mut v = vec![
            std::path::PathBuf::from("jobflow.json"),
            std::path::PathBuf::from("../jobflow.json"),
        ];
        if let Some(home) = dirs::home_dir() {
            v.push(home.join(".jobflow").join("jobflow.json"));
        }
        if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
            v.insert(0, std::path::PathBuf::from(env_path));
        }
        v
    };

    for path in &candidates {
        match std::fs::read_to_string(path) {
            Ok(contents) => return parse_config(&contents, path),
            Err(_) => continue,
        }
    }

    JobflowConfig::default()
}

fn parse_config(contents: &str, path: &Path) -> JobflowConfig {
    match serde_json::from_str::<JobflowConfig>(contents) {
        Ok(cfg) => {
            tracing::info!("jobflow.json loaded from {}", path.display());
            cfg
        }
        Err(e) => {
            tracing::warn!(
                "jobflow.json parse error at {}: {}; using defaults",
                path.display(),
                e
            );
            JobflowConfig::default()
        }
    }
}

/// Optional override for the Chromium-family browser executable.
///
/// Only returns a value when `CHROME_EXECUTABLE` is set to an existing path.
pub fn chrome_executable_override() -> Option<String> {
    let p = std::env::var(ENV_CHROME_EXECUTABLE).ok()?;
    let p = p.trim();
    if p.is_empty() {
        return None;
    }
    if Path::new(p).exists() {
        Some(p.to_string())
    } else {
        None
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
