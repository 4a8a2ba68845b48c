//! CLI binary for docshift.
//!
//! A thin shim over the library crate that maps CLI flags to a
//! `RelayConfig`, runs one conversion, and prints the result.

use anyhow::{Context, Result};
use clap::Parser;
use docshift::{
    convert_to_file_with_cancel, CancellationToken, ConversionObserver, DocumentFormat,
    RelayConfig, RelayError,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── Spinner-backed observer ──────────────────────────────────────────────

/// Terminal observer: a single spinner line that narrates the submit,
/// poll, and download stages.
struct CliObserver {
    bar: ProgressBar,
}

impl CliObserver {
    fn new() -> std::sync::Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_prefix("Converting");
        bar.set_message("submitting job…");
        bar.enable_steady_tick(Duration::from_millis(80));
        std::sync::Arc::new(Self { bar })
    }
}

impl ConversionObserver for CliObserver {
    fn on_submitted(&self, job_id: &str) {
        self.bar.set_message(format!("job {job_id} accepted"));
    }

    fn on_poll(&self, attempt: u32, max: u32) {
        self.bar
            .set_message(format!("waiting for provider (check {attempt}/{max})"));
    }

    fn on_download_start(&self, _url: &str) {
        self.bar.set_prefix("Downloading");
        self.bar.set_message("fetching converted file…");
    }

    fn on_complete(&self, artifact_bytes: u64) {
        self.bar
            .finish_with_message(format!("done ({artifact_bytes} bytes)"));
    }

    fn on_failed(&self, _error: &RelayError) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # PDF to Word (output defaults to report.docx)
  docshift report.pdf

  # Word to PDF with an explicit destination
  docshift letter.docx -o out/letter.pdf

  # Explicit target format, faster polling
  docshift report.pdf --to docx --poll-interval 2 --max-polls 120

  # Stats as JSON on stdout
  docshift report.pdf --json

ENVIRONMENT VARIABLES:
  DOCSHIFT_API_KEY    Provider bearer token (required; CONVERT_TOKEN also honoured)
  DOCSHIFT_API_BASE   Provider endpoint (default: https://api.cloudconvert.com/v2)

SETUP:
  1. Set the token:   export DOCSHIFT_API_KEY=ey...
  2. Convert:         docshift report.pdf
"#;

/// Convert PDF and Word documents through a cloud conversion API.
#[derive(Parser, Debug)]
#[command(
    name = "docshift",
    version,
    about = "Convert PDF and Word documents through a cloud conversion API",
    arg_required_else_help = true,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input document (pdf, docx, or doc).
    input: PathBuf,

    /// Target format. Defaults to the input's counterpart (pdf→docx, docx/doc→pdf).
    #[arg(long, value_name = "FORMAT")]
    to: Option<DocumentFormat>,

    /// Destination path. Defaults to the input stem with the target extension.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Provider API bearer token.
    #[arg(long, env = "DOCSHIFT_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Provider API base URL.
    #[arg(long, env = "DOCSHIFT_API_BASE")]
    api_base: Option<String>,

    /// Seconds between job status checks.
    #[arg(long, default_value_t = 5)]
    poll_interval: u64,

    /// Give up after this many status checks.
    #[arg(long, default_value_t = 60)]
    max_polls: u32,

    /// Retries of a failed status request before giving up on transport.
    #[arg(long, default_value_t = 3)]
    transient_retries: u32,

    /// Print run statistics as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Disable the spinner.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner is the user-facing feedback channel; keep library logs
    // at error level while it is active unless verbosity is requested.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    // ── Resolve formats and paths ────────────────────────────────────────
    let source = DocumentFormat::from_path(&cli.input)
        .with_context(|| format!("cannot infer a format for {}", cli.input.display()))?;
    let target = cli.to.unwrap_or_else(|| source.counterpart());
    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.input.with_extension(target.extension()));

    // ── Build config ─────────────────────────────────────────────────────
    let mut builder = RelayConfig::builder()
        .poll_interval_secs(cli.poll_interval)
        .max_poll_attempts(cli.max_polls)
        .max_transient_retries(cli.transient_retries);

    match cli.api_key {
        Some(ref key) => builder = builder.api_key(key),
        None => {
            // Fall back to the full env lookup (includes the legacy name).
            let env_cfg = RelayConfig::from_env().context(
                "no API key: pass --api-key or set DOCSHIFT_API_KEY",
            )?;
            builder = builder.api_key(env_cfg.api_key);
        }
    }
    if let Some(ref base) = cli.api_base {
        builder = builder.api_base(base);
    }
    if show_progress {
        builder = builder.observer(CliObserver::new());
    }
    let config = builder.build().context("Invalid configuration")?;

    // ── Run conversion, cancelling on Ctrl-C ─────────────────────────────
    let cancel = CancellationToken::new();
    let ctrlc_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrlc_token.cancel();
        }
    });

    let stats = convert_to_file_with_cancel(&cli.input, target, &output_path, &config, &cancel)
        .await
        .with_context(|| {
            format!(
                "failed to convert {} to {target}",
                cli.input.display()
            )
        })?;

    // ── Report ───────────────────────────────────────────────────────────
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&stats).context("serialising stats")?);
    } else if !cli.quiet {
        eprintln!(
            "✔ {} -> {}  ({} bytes, {} status checks, {}ms)",
            cli.input.display(),
            output_path.display(),
            stats.artifact_bytes,
            stats.poll_attempts,
            stats.total_ms,
        );
    }

    Ok(())
}
