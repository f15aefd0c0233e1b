//! CLI binary for joypdf.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `AnalysisConfig` and prints results.

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use joypdf::{
    analyze, extract, html_to_file, inspect, render_to_file, AnalysisConfig, AnalysisResult,
    AnalysisProgressCallback, ExtractionMethod, OcrMode, Operation, ProgressCallback,
    RenderStrategy,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
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

/// Terminal progress: a page bar while extracting (useful for long OCR runs)
/// and a spinner while waiting for the model.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        Self::spinner(&bar, "Preparing", "Opening PDF…");
        Arc::new(Self { bar })
    }

    fn spinner(bar: &ProgressBar, prefix: &'static str, msg: &'static str) {
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(style);
        bar.set_prefix(prefix);
        bar.set_message(msg);
        bar.enable_steady_tick(Duration::from_millis(80));
    }

    fn activate_bar(&self, total: usize, prefix: &'static str) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.set_style(style);
        self.bar.set_prefix(prefix);
        self.bar.reset_eta();
    }
}

impl AnalysisProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, total_pages: usize) {
        self.activate_bar(total_pages, "Reading");
    }

    fn on_ocr_fallback(&self, total_pages: usize) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("No text layer found, running OCR on {total_pages} pages…"))
        ));
        self.activate_bar(total_pages, "OCR");
    }

    fn on_page_extracted(&self, page_num: usize, total_pages: usize, chars: usize) {
        self.bar.set_message(format!("page {page_num}/{total_pages}"));
        if chars == 0 {
            self.bar.println(format!(
                "  {} Page {:>3}/{:<3}  {}",
                cyan("⚠"),
                page_num,
                total_pages,
                dim("no text")
            ));
        }
        self.bar.inc(1);
    }

    fn on_extraction_complete(&self, method: ExtractionMethod, chars: usize) {
        let how = match method {
            ExtractionMethod::TextLayer => "text layer",
            ExtractionMethod::Ocr => "OCR",
        };
        self.bar.println(format!(
            "{} Extracted {} chars via {}",
            green("✓"),
            bold(&chars.to_string()),
            how
        ));
    }

    fn on_completion_start(&self, model: &str) {
        self.bar.reset();
        Self::spinner(&self.bar, "Asking", "waiting for the model…");
        self.bar.set_message(format!("waiting for {model}…"));
    }

    fn on_completion_complete(&self, success: bool, duration_ms: u64) {
        self.bar.finish_and_clear();
        let mark = if success { green("✓") } else { red("✗") };
        eprintln!(
            "{} Model replied in {}",
            mark,
            dim(&format!("{:.1}s", duration_ms as f64 / 1000.0))
        );
    }

    fn on_render_complete(&self, pages: usize, bytes: usize) {
        eprintln!(
            "{} Rendered {} page(s), {}",
            green("✓"),
            pages,
            dim(&format!("{:.1} KiB", bytes as f64 / 1024.0))
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Summarize a PDF (stdout)
  joypdf report.pdf

  # Evaluate a resume against a role and export the review
  joypdf cv.pdf --operation "evaluate resume" \
      --context "Senior backend engineer, Rust and Postgres" --pdf

  # Solve an assignment, write the answer as Markdown and as PDF
  joypdf homework.pdf --operation solve -o answers.md --pdf answers.pdf

  # Analyze a PDF from a URL
  joypdf https://arxiv.org/pdf/1706.03762 --operation summarize

  # Just print the extracted text (no API key needed)
  joypdf --extract-only scan.pdf

  # Re-render an edited answer to PDF without asking the model again
  joypdf --render-only answers.md --pdf answers.pdf

  # Page count and text-layer probe
  joypdf --inspect document.pdf

OPERATIONS:
  "summarize pdf"     (aliases: summarize, summary)      concise summary
  "evaluate resume"   (aliases: evaluate, resume)        HR-style resume review
  "Solve Assignment"  (aliases: solve, assignment)       complete, formal answers

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (default provider)
  OPENAI_API_KEY          OpenAI API key          (with --provider openai)
  ANTHROPIC_API_KEY       Anthropic API key       (with --provider anthropic)
  JOYPDF_PROVIDER         Override provider
  JOYPDF_MODEL            Override model ID
  PDFIUM_LIB_PATH         Directory containing libpdfium

  Variables are also read from a .env file in the working directory.

SETUP:
  1. Install libpdfium next to the binary or set PDFIUM_LIB_PATH.
  2. Install tesseract for scanned PDFs (apt install tesseract-ocr).
  3. Set the key:   export GEMINI_API_KEY=...
  4. Run:           joypdf document.pdf --pdf
"#;

/// Summarize PDFs, evaluate resumes and solve assignments with an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "joypdf",
    version,
    about = "Summarize PDFs, evaluate resumes and solve assignments with an LLM",
    long_about = "Extract the text of a PDF (with OCR for scanned documents), ask a hosted LLM \
to summarize it, evaluate it as a resume, or solve it as an assignment, and export the answer \
as a styled PDF. Uses Google Gemini by default; any edgequake-llm provider works.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL (a text file with --render-only).
    input: String,

    /// Operation: "summarize pdf", "evaluate resume" or "Solve Assignment".
    #[arg(long, env = "JOYPDF_OPERATION", default_value = "summarize pdf")]
    operation: String,

    /// Extra context appended to the prompt (e.g. the role for a resume).
    #[arg(long, env = "JOYPDF_CONTEXT", conflicts_with = "context_file")]
    context: Option<String>,

    /// Read the extra context from a file.
    #[arg(long, env = "JOYPDF_CONTEXT_FILE")]
    context_file: Option<PathBuf>,

    /// Write the answer text to this file instead of stdout.
    #[arg(short, long, env = "JOYPDF_OUTPUT")]
    output: Option<PathBuf>,

    /// Export the answer as PDF (default file name: summary.pdf).
    #[arg(long, env = "JOYPDF_PDF", num_args = 0..=1, default_missing_value = "summary.pdf")]
    pdf: Option<PathBuf>,

    /// Export the answer as a standalone HTML page.
    #[arg(long, env = "JOYPDF_HTML")]
    html: Option<PathBuf>,

    /// PDF layout: markdown or lines.
    #[arg(long, env = "JOYPDF_STRATEGY", value_enum, default_value = "markdown")]
    strategy: StrategyArg,

    /// LLM provider: gemini, openai, anthropic, ollama, …
    #[arg(long, env = "JOYPDF_PROVIDER")]
    provider: Option<String>,

    /// LLM model ID (default: gemini-2.5-flash).
    #[arg(long, env = "JOYPDF_MODEL")]
    model: Option<String>,

    /// Environment variable that must hold the API key ("none" to skip the check).
    #[arg(long, env = "JOYPDF_API_KEY_ENV")]
    api_key_env: Option<String>,

    /// Max LLM output tokens.
    #[arg(long, env = "JOYPDF_MAX_TOKENS")]
    max_tokens: Option<usize>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "JOYPDF_TEMPERATURE")]
    temperature: Option<f32>,

    /// Retries on LLM failure.
    #[arg(long, env = "JOYPDF_MAX_RETRIES", default_value_t = 2)]
    max_retries: u32,

    /// Never OCR; fail on PDFs without a text layer.
    #[arg(long, env = "JOYPDF_NO_OCR")]
    no_ocr: bool,

    /// Tesseract language(s), e.g. eng or eng+deu.
    #[arg(long, env = "JOYPDF_OCR_LANG", default_value = "eng")]
    ocr_lang: String,

    /// Rasterisation DPI for OCR (72–600).
    #[arg(long, env = "JOYPDF_OCR_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    ocr_dpi: u32,

    /// Path to the tesseract executable.
    #[arg(long, env = "JOYPDF_TESSERACT")]
    tesseract: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "JOYPDF_PASSWORD")]
    password: Option<String>,

    /// Print the extracted text and stop (no LLM call).
    #[arg(long, conflicts_with_all = ["render_only", "inspect"])]
    extract_only: bool,

    /// Treat INPUT as answer text and only export it (no PDF input, no LLM call).
    #[arg(long, conflicts_with = "inspect")]
    render_only: bool,

    /// Print page count and text-layer status only.
    #[arg(long)]
    inspect: bool,

    /// Output structured JSON instead of plain text.
    #[arg(long, env = "JOYPDF_JSON")]
    json: bool,

    /// Disable progress output.
    #[arg(long, env = "JOYPDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "JOYPDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "JOYPDF_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "JOYPDF_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// LLM call timeout in seconds.
    #[arg(long, env = "JOYPDF_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum StrategyArg {
    Markdown,
    Lines,
}

impl From<StrategyArg> for RenderStrategy {
    fn from(v: StrategyArg) -> Self {
        match v {
            StrategyArg::Markdown => RenderStrategy::Markdown,
            StrategyArg::Lines => RenderStrategy::LineOriented,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the keys may already be in the environment.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
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

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn AnalysisProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Render-only mode ─────────────────────────────────────────────────
    if cli.render_only {
        let text = tokio::fs::read_to_string(&cli.input)
            .await
            .with_context(|| format!("Failed to read {}", cli.input))?;
        if cli.pdf.is_none() && cli.html.is_none() {
            bail!("--render-only needs --pdf and/or --html");
        }
        let answer = saved_answer(text)?;
        return export(&cli, &answer, &config).await;
    }

    // ── Inspect mode ─────────────────────────────────────────────────────
    if cli.inspect {
        let info = inspect(&cli.input, &config)
            .await
            .context("Failed to inspect PDF")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&info).context("Failed to serialize info")?
            );
        } else {
            println!("File:         {}", info.name);
            println!("Size:         {} bytes", info.size_bytes);
            println!("Pages:        {}", info.page_count);
            println!(
                "Text layer:   {}",
                if info.has_embedded_text { "yes" } else { "no (OCR needed)" }
            );
        }
        return Ok(());
    }

    // ── Extract-only mode ────────────────────────────────────────────────
    if cli.extract_only {
        let extracted = extract(&cli.input, &config)
            .await
            .context("Extraction failed")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&extracted).context("Failed to serialise output")?
            );
        } else {
            emit_text(&cli, extracted.as_str()).await?;
        }
        return Ok(());
    }

    // ── Analysis ─────────────────────────────────────────────────────────
    let operation = Operation::from_label(&cli.operation)
        .with_context(|| format!("Unknown --operation '{}'", cli.operation))?;
    let context = read_context(&cli).await?;

    let output = analyze(&cli.input, operation.label(), context.as_deref(), &config)
        .await
        .context("Analysis failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        );
    }

    let answer = match output.result.into_result() {
        Ok(answer) => answer,
        Err(e) => {
            // The sentinel text is what the user would have seen in the result box.
            if !cli.json {
                eprintln!("{} {}", red("✘"), e);
            }
            std::process::exit(1);
        }
    };

    if !cli.json {
        emit_text(&cli, &answer).await?;
    }
    export(&cli, &answer, &config).await?;

    if !cli.quiet && !cli.json {
        if let Some(stats) = output.stats {
            eprintln!(
                "   {} tokens in  /  {} tokens out  —  {}ms",
                dim(&stats.input_tokens.to_string()),
                dim(&stats.output_tokens.to_string()),
                stats.duration_ms,
            );
        }
    }

    Ok(())
}

/// Text saved by an earlier run, refused when it is a failed analysis.
fn saved_answer(text: String) -> Result<String> {
    match AnalysisResult::from_text(text).into_result() {
        Ok(answer) if answer.trim().is_empty() => bail!("Nothing to render: the input is empty"),
        Ok(answer) => Ok(answer),
        Err(e) => bail!("Refusing to export a failed analysis: {}", e),
    }
}

/// Write `text` to `--output` or stdout.
async fn emit_text(cli: &Cli, text: &str) -> Result<()> {
    if let Some(ref path) = cli.output {
        tokio::fs::write(path, text)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if !cli.quiet {
            eprintln!("{}  →  {}", green("✔"), bold(&path.display().to_string()));
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(text.as_bytes())
            .context("Failed to write to stdout")?;
        if !text.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }
    Ok(())
}

/// Run the `--pdf` / `--html` exports.
async fn export(cli: &Cli, text: &str, config: &AnalysisConfig) -> Result<()> {
    if let Some(ref path) = cli.pdf {
        let rendered = render_to_file(text, path, config)
            .await
            .context("PDF export failed")?;
        announce(cli, path, &format!("{} page(s)", rendered.page_count));
    }
    if let Some(ref path) = cli.html {
        html_to_file(text, path)
            .await
            .context("HTML export failed")?;
        announce(cli, path, "html");
    }
    Ok(())
}

fn announce(cli: &Cli, path: &Path, what: &str) {
    if !cli.quiet {
        eprintln!(
            "{}  {}  →  {}",
            green("✔"),
            dim(what),
            bold(&path.display().to_string())
        );
    }
}

async fn read_context(cli: &Cli) -> Result<Option<String>> {
    match (&cli.context, &cli.context_file) {
        (Some(ctx), _) => Ok(Some(ctx.clone())),
        (None, Some(path)) => Ok(Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read context from {:?}", path))?,
        )),
        (None, None) => Ok(None),
    }
}

/// Map CLI args to `AnalysisConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<AnalysisConfig> {
    let mut builder = AnalysisConfig::builder()
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout)
        .ocr_mode(if cli.no_ocr {
            OcrMode::Disabled
        } else {
            OcrMode::Auto
        })
        .ocr_language(cli.ocr_lang.clone())
        .ocr_dpi(cli.ocr_dpi)
        .render_strategy(cli.strategy.clone().into());

    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
        // A different provider reads a different key; let edgequake-llm check it.
        if cli.api_key_env.is_none() && provider != joypdf::config::DEFAULT_PROVIDER {
            builder = builder.api_key_env(None);
        }
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref var) = cli.api_key_env {
        let var = (!var.eq_ignore_ascii_case("none")).then(|| var.clone());
        builder = builder.api_key_env(var);
    }
    if let Some(n) = cli.max_tokens {
        builder = builder.max_tokens(n);
    }
    if let Some(t) = cli.temperature {
        builder = builder.temperature(t);
    }
    if let Some(ref bin) = cli.tesseract {
        builder = builder.tesseract_bin(bin.clone());
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saved_error_text_is_not_exported() {
        let err = saved_answer("[Error calling Gemini API: quota exceeded]".to_string()).unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[test]
    fn saved_answer_passes_through() {
        assert_eq!(saved_answer("# Review\n\nHire.".to_string()).unwrap(), "# Review\n\nHire.");
        assert!(saved_answer("  \n".to_string()).is_err());
    }
}
