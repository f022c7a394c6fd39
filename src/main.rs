use anyhow::{anyhow, bail, Context, Result};
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use jobflow::autofill::{autofill, AutofillOptions, HtmlFormDocument, Pacing, RuleTable};
use jobflow::bridge::{self, BrowserSession};
use jobflow::intake::IntakeClient;
use jobflow::extraction::page_text;
use jobflow::{extract_from_html, load_config, JobflowConfig, ProfileValues};

const USAGE: &str = "\
usage:
  jobflow extract <url> [--html FILE] [--send]
  jobflow autofill <url> --profile FILE [--rules FILE]
  jobflow autofill --html FILE --profile FILE [--rules FILE]

environment:
  JOBFLOW_CONFIG             path to jobflow.json
  JOBFLOW_WEBHOOK_BASE_URL   intake webhook base (default http://localhost:5678/webhook/)
  CHROME_EXECUTABLE          browser binary override
  RUST_LOG                   log filter (default info)";

struct Args {
    command: String,
    url: Option<String>,
    html: Option<String>,
    profile: Option<String>,
    rules: Option<String>,
    send: bool,
}

fn parse_args(raw: &[String]) -> Result<Args> {
    let mut it = raw.iter().skip(1);
    let command = it.next().cloned().ok_or_else(|| anyhow!("missing command"))?;
    let mut args = Args {
        command,
        url: None,
        html: None,
        profile: None,
        rules: None,
        send: false,
    };

    while let Some(a) = it.next() {
        let mut value_for = |flag: &str| {
            it.next()
                .cloned()
                .ok_or_else(|| anyhow!("{} needs a value", flag))
        };
        match a.as_str() {
            "--html" => args.html = Some(value_for("--html")?),
            "--profile" => args.profile = Some(value_for("--profile")?),
            "--rules" => args.rules = Some(value_for("--rules")?),
            "--send" => args.send = true,
            other if other.starts_with("--") => bail!("unknown flag {}", other),
            other => {
                if args.url.is_some() {
                    bail!("unexpected argument {}", other);
                }
                args.url = Some(other.to_string());
            }
        }
    }
    Ok(args)
}

fn read_file(path: &str) -> Result<String> {
    std::fs::read_to_string(Path::new(path)).with_context(|| format!("cannot read {}", path))
}

fn load_profile(path: &str) -> Result<ProfileValues> {
    serde_json::from_str(&read_file(path)?).with_context(|| format!("invalid profile json in {}", path))
}

fn autofill_options(cfg: &JobflowConfig, rules: Option<&str>) -> Result<AutofillOptions> {
    let options = AutofillOptions::from_config(cfg);
    match rules {
        Some(path) => {
            let table = RuleTable::from_json(&read_file(path)?)
                .with_context(|| format!("invalid rule table in {}", path))?;
            info!("loaded rule table v{} ({} rules)", table.version(), table.rules().len());
            Ok(options.with_rules(table))
        }
        None => Ok(options),
    }
}

async fn run_extract(cfg: &JobflowConfig, args: &Args) -> Result<()> {
    let url = args.url.as_deref().unwrap_or_default();

    let (record, text) = match &args.html {
        Some(path) => {
            let html = read_file(path)?;
            (extract_from_html(&html, url), page_text(&html))
        }
        None => {
            if url.is_empty() {
                bail!("extract needs a url or --html FILE");
            }
            let session = BrowserSession::launch(&cfg.browser, true).await?;
            let captured = bridge::capture_posting(&session, url).await;
            session.close().await;
            let captured = captured?;
            (captured.record, captured.page_text)
        }
    };

    println!("{}", serde_json::to_string_pretty(&record)?);

    if args.send {
        let client = IntakeClient::from_config(&cfg.intake)?;
        client.send(url, &text, &record).await?;
    }
    Ok(())
}

async fn run_autofill(cfg: &JobflowConfig, args: &Args) -> Result<()> {
    let profile_path = args
        .profile
        .as_deref()
        .ok_or_else(|| anyhow!("autofill needs --profile FILE"))?;
    let profile = load_profile(profile_path)?;
    let cancel = CancellationToken::new();
    let options = autofill_options(cfg, args.rules.as_deref())?.with_cancel(cancel.clone());

    if let Some(path) = &args.html {
        // Offline dry run: no browser, no pacing.
        let mut doc = HtmlFormDocument::parse(&read_file(path)?);
        let options = options.with_pacing(Pacing::none());
        let report = autofill(&mut doc, &profile, &options).await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let url = args
        .url
        .as_deref()
        .ok_or_else(|| anyhow!("autofill needs a url or --html FILE"))?;

    let session = BrowserSession::launch(&cfg.browser, false).await?;

    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let outcome = bridge::autofill_url(&session, url, &profile, &options).await;
    match &outcome {
        Ok((_, report)) if !report.cancelled => {
            println!("{}", serde_json::to_string_pretty(report)?);
            info!("review the form in the browser window; press Ctrl-C to close");
            let _ = watcher.await;
        }
        Ok((_, report)) => {
            warn!("autofill interrupted; {} field(s) were filled", report.filled.len());
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        Err(_) => watcher.abort(),
    }

    session.close().await;
    outcome.map(|_| ())
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let raw: Vec<String> = std::env::args().collect();
    if raw.iter().any(|a| a == "--help" || a == "-h") {
        println!("{}", USAGE);
        return Ok(());
    }

    let args = match parse_args(&raw) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    let cfg = load_config();
    match args.command.as_str() {
        "extract" => run_extract(&cfg, &args).await,
        "autofill" => run_autofill(&cfg, &args).await,
        other => {
            eprintln!("unknown command {}\n\n{}", other, USAGE);
            std::process::exit(2);
        }
    }
}
