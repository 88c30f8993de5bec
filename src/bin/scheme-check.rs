//! CLI binary for scheme-eligibility.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PipelineConfig` and a `RawProfile`, drives a `Session`, and prints the
//! summary and localized verdict.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use scheme_eligibility::pipeline::input::resolve_input;
use scheme_eligibility::{
    collect_profile, Language, PageSeparator, PipelineConfig, PipelineProgressCallback,
    ProgressCallback, RawProfile, RunOutput, SchemeSummary, Session, Stage, Verdict,
};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner that follows the session's stages and logs one line per
/// language. Languages may finish out of order.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<String, Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(style);
        bar.set_prefix("Starting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn elapsed_secs(&self, language: &str) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(language))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_stage_change(&self, stage: Stage) {
        let message = match stage {
            Stage::Extracting => "Reading PDF text…",
            Stage::Summarizing => "Summarising scheme…",
            Stage::AwaitingProfile => "Scheme summarised",
            Stage::Evaluating => "Checking eligibility…",
            Stage::Translating => "Translating result…",
            Stage::Done | Stage::Failed => {
                self.bar.finish_and_clear();
                return;
            }
            Stage::AwaitingDocument => "",
        };
        self.bar.set_prefix(stage.to_string());
        self.bar.set_message(message);
    }

    fn on_translation_start(&self, language: &str, _total: usize) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(language.to_string(), Instant::now());
        }
    }

    fn on_translation_complete(&self, language: &str, total: usize, text_len: usize) {
        let secs = self.elapsed_secs(language);
        self.bar.println(format!(
            "  {} {:<3} of {:<2}  {:<8}  {}",
            green("✓"),
            language,
            total,
            dim(&format!("{text_len:>5} bytes")),
            dim(&format!("{secs:.1}s")),
        ));
    }

    fn on_translation_error(&self, language: &str, total: usize, error: &str) {
        let secs = self.elapsed_secs(language);

        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {:<3} of {:<2}  {}  {}",
            red("✗"),
            language,
            total,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
    }

    fn on_run_complete(&self, requested: usize, succeeded: usize) {
        let failed = requested.saturating_sub(succeeded);
        if failed > 0 {
            self.bar.println(format!(
                "{} {}/{} languages rendered  ({} failed)",
                yellow("⚠"),
                bold(&succeeded.to_string()),
                requested,
                red(&failed.to_string()),
            ));
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Check a senior farmer in Telangana against a local scheme PDF
  scheme-check pension.pdf --age 65 --income 80000 --category general --state Telangana

  # Pick languages (ISO codes or names); English is rendered without a model call
  scheme-check pension.pdf --age 40 --income "₹1,20,000" --category obc \
      --state "Tamil Nadu" --languages en,ta,hi

  # Scheme PDF from a URL, JSON output to a file
  scheme-check https://example.gov.in/scheme.pdf --age 30 --income 50000 \
      --category sc --state Bihar --json -o result.json

PROFILE FIELDS:
  --age        whole years, 0-120
  --income     annual income in rupees; "80000", "80,000", "₹80,000", "Rs. 80000"
  --category   general, obc, sc, st, ews, other
  --state      any Indian state or union territory (e.g. "Andhra Pradesh", "Delhi")

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  RUST_LOG                Override log filter (e.g. scheme_eligibility=debug)
"#;

/// Check eligibility for a government scheme from its PDF.
#[derive(Parser, Debug)]
#[command(
    name = "scheme-check",
    version,
    about = "Check eligibility for an Indian government scheme from its PDF",
    long_about = "Reads a government scheme PDF (local file or URL), summarises its benefits, \
eligibility criteria and required documents with an LLM, evaluates a user profile against the \
criteria, and explains the verdict in simple language in English and Indian regional languages.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Age in whole years.
    #[arg(long, allow_hyphen_values = true)]
    age: String,

    /// Annual income in rupees.
    #[arg(long, allow_hyphen_values = true)]
    income: String,

    /// Social category: general, obc, sc, st, ews, other.
    #[arg(long)]
    category: String,

    /// State or union territory of residence.
    #[arg(long)]
    state: String,

    /// Gender (optional).
    #[arg(long)]
    gender: Option<String>,

    /// Occupation (optional).
    #[arg(long)]
    occupation: Option<String>,

    /// Education (optional).
    #[arg(long)]
    education: Option<String>,

    /// Languages for the result, comma separated (codes or names).
    #[arg(long, short = 'l', env = "SCHEME_CHECK_LANGUAGES", value_delimiter = ',',
          value_parser = parse_language, default_value = "en,hi,te")]
    languages: Vec<Language>,

    /// Write the result to this file instead of stdout.
    #[arg(short, long, env = "SCHEME_CHECK_OUTPUT")]
    output: Option<PathBuf>,

    /// LLM model ID (e.g. gpt-4o-mini, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(
        long,
        env = "EDGEQUAKE_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: openai, anthropic, gemini, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// Max characters of document text sent for summarisation.
    #[arg(long, env = "SCHEME_CHECK_MAX_INPUT_CHARS", default_value_t = 10_000)]
    max_input_chars: usize,

    /// Number of concurrent translation calls.
    #[arg(short, long, env = "SCHEME_CHECK_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "SCHEME_CHECK_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Retries per model call on failure.
    #[arg(long, env = "SCHEME_CHECK_MAX_RETRIES", default_value_t = 0)]
    max_retries: u32,

    /// How page texts are joined before summarisation.
    #[arg(long, env = "SCHEME_CHECK_SEPARATOR", value_enum, default_value = "blank")]
    separator: SeparatorArg,

    /// Output structured JSON (RunOutput) instead of text.
    #[arg(long, env = "SCHEME_CHECK_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "SCHEME_CHECK_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SCHEME_CHECK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "SCHEME_CHECK_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "SCHEME_CHECK_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Per-call LLM timeout in seconds.
    #[arg(long, env = "SCHEME_CHECK_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum SeparatorArg {
    Blank,
    FormFeed,
    Marker,
}

impl From<SeparatorArg> for PageSeparator {
    fn from(v: SeparatorArg) -> Self {
        match v {
            SeparatorArg::Blank => PageSeparator::BlankLine,
            SeparatorArg::FormFeed => PageSeparator::FormFeed,
            SeparatorArg::Marker => PageSeparator::Marker,
        }
    }
}

fn parse_language(s: &str) -> Result<Language, String> {
    s.parse()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO-level library logs unless --verbose is set.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Validate the profile before spending any model calls ─────────────
    let raw = RawProfile {
        gender: cli.gender.clone(),
        occupation: cli.occupation.clone(),
        education: cli.education.clone(),
        ..RawProfile::new(&cli.age, &cli.income, &cli.category, &cli.state)
    };
    let profile = collect_profile(&raw).context("Invalid profile")?;

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn PipelineProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run ──────────────────────────────────────────────────────────────
    let document = resolve_input(&cli.input, config.download_timeout_secs)
        .await
        .context("Failed to read the scheme document")?;

    let mut session = Session::from_config(config).context("No LLM provider available")?;
    session
        .ingest(document)
        .await
        .context("Failed to summarise the scheme")?;
    session
        .set_profile(profile)
        .context("Failed to set the profile")?;
    let output = session
        .complete(&cli.languages)
        .await
        .context("Failed to evaluate eligibility")?;

    let rendered = if cli.json {
        serde_json::to_string_pretty(&output).context("Failed to serialise output")?
    } else {
        render_text(&output, cli.output.is_none())
    };

    match cli.output {
        Some(ref path) => {
            tokio::fs::write(path, rendered.as_bytes())
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if !cli.quiet {
                eprintln!(
                    "{}  {}  →  {}",
                    verdict_mark(output.verdict.verdict),
                    output.verdict.verdict,
                    bold(&path.display().to_string())
                );
            }
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(rendered.as_bytes())
                .context("Failed to write to stdout")?;
            if !rendered.ends_with('\n') {
                handle.write_all(b"\n").ok();
            }
        }
    }

    if !cli.quiet && !cli.json {
        let s = &output.stats;
        eprintln!(
            "{}",
            dim(&format!(
                "{} pages, {} chars{}  ·  {} model requests  ·  {}ms total",
                s.page_count,
                s.input_chars,
                if s.input_truncated { " (truncated)" } else { "" },
                s.model_requests,
                s.total_duration_ms
            ))
        );
    }

    Ok(())
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .max_input_chars(cli.max_input_chars)
        .translation_concurrency(cli.concurrency)
        .temperature(cli.temperature)
        .max_retries(cli.max_retries)
        .page_separator(cli.separator.clone().into())
        .languages(cli.languages.clone())
        .download_timeout_secs(cli.download_timeout)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn verdict_mark(verdict: Verdict) -> String {
    match verdict {
        Verdict::Eligible => green("✔"),
        Verdict::NotEligible => red("✘"),
        Verdict::Uncertain => yellow("?"),
    }
}

/// Human-readable report; colour only when writing to a terminal stream.
fn render_text(output: &RunOutput, colour: bool) -> String {
    let head = |s: &str| if colour { bold(s) } else { s.to_string() };
    let mut out = String::new();

    // The English entry already carries the summary.
    if output.localized.get(Language::English).is_none() {
        render_summary(&mut out, &output.summary, &head);
    }

    out.push_str(&format!(
        "\n{}\n",
        head(&format!("Result: {}", output.verdict.verdict))
    ));
    if output.summary.input_truncated {
        out.push_str("\n(The document was long; only its beginning was summarised.)\n");
    }
    for (code, text) in &output.localized.entries {
        let rule = format!("── {code} ──");
        out.push_str(&format!("\n{}\n{}\n", if colour { cyan(&rule) } else { rule }, text.trim_end()));
    }
    if output.is_partial() {
        out.push_str(&format!("\n{}\n", head("Not available:")));
        for (code, err) in &output.localized.failures {
            out.push_str(&format!("  {code}: {err}\n"));
        }
    }
    out
}

fn render_summary(out: &mut String, summary: &SchemeSummary, head: &dyn Fn(&str) -> String) {
    if let Some(ref name) = summary.scheme_name {
        out.push_str(&format!("{}\n", head(name)));
    }
    if let Some(ref purpose) = summary.purpose {
        out.push_str(&format!("{purpose}\n"));
    }
    for (title, items) in [
        ("Key benefits", &summary.benefits),
        ("Eligibility criteria", &summary.eligibility_criteria),
        ("Required documents", &summary.required_documents),
        ("How to apply", &summary.application_process),
    ] {
        if items.is_empty() {
            continue;
        }
        out.push_str(&format!("\n{}\n", head(title)));
        for item in items {
            out.push_str(&format!("  • {item}\n"));
        }
    }
    let details = &summary.important_details;
    if !details.is_empty() {
        out.push_str(&format!("\n{}\n", head("Important details")));
        for (label, value) in [
            ("Application deadline", &details.application_deadline),
            ("Contact", &details.contact_information),
            ("Subsidy amount", &details.subsidy_amount),
        ] {
            if let Some(value) = value {
                out.push_str(&format!("  • {label}: {value}\n"));
            }
        }
    }
}
