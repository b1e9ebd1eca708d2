use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::fs;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use sekretar_core::{
    AnalysisResult, ChunkLimits, HttpGenerator, Orchestrator, ProgressRecord, ProgressTracker,
    Provider, Status, Transcript, format_report_readable,
};

use crate::cache::{get_cache_dir, get_report_path};

mod cache;

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", secs / 60.0, secs % 60.0)
    }
}

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, Default, ValueEnum)]
enum CliProvider {
    #[default]
    Grok,
    Openai,
    Gemini,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Grok => Provider::Grok,
            CliProvider::Openai => Provider::Openai,
            CliProvider::Gemini => Provider::Gemini,
        }
    }
}

#[derive(Parser)]
#[command(name = "sekretar")]
#[command(about = "Analyze a timestamped transcript into a structured AI meeting report")]
struct Cli {
    /// Path to a Whisper-style transcript JSON ({text, segments, language})
    transcript: PathBuf,

    /// Report title. Defaults to the transcript file name.
    #[arg(short, long)]
    title: Option<String>,

    /// Report language (e.g., "en", "ru", "uk"). Defaults to the transcript's detected language.
    #[arg(short, long)]
    lang: Option<String>,

    /// AI provider for report generation
    #[arg(short, long, default_value = "grok")]
    provider: CliProvider,

    /// Maximum segments per chunk
    #[arg(long, default_value_t = ChunkLimits::default().max_segments)]
    max_segments: usize,

    /// Maximum characters per chunk
    #[arg(long, default_value_t = ChunkLimits::default().max_chars)]
    max_chars: usize,

    /// Force re-analysis even if a cached report exists
    #[arg(short, long)]
    force: bool,
}

fn create_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos:>3}% {msg}")
            .unwrap()
            .progress_chars("=> "),
    );
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

async fn load_transcript(path: &Path) -> Result<Transcript> {
    let json_content = fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read transcript from {}", path.display()))?;
    let transcript: Transcript = serde_json::from_str(&json_content)
        .with_context(|| format!("{} is not a valid transcript JSON", path.display()))?;
    Ok(transcript)
}

async fn load_report(path: &Path) -> Result<AnalysisResult> {
    let json_content = fs::read_to_string(path).await?;
    let report: AnalysisResult = serde_json::from_str(&json_content)?;
    Ok(report)
}

async fn save_report(report: &AnalysisResult, path: &Path) -> Result<()> {
    let pretty_json = serde_json::to_string_pretty(report)?;
    fs::write(path, &pretty_json).await?;
    Ok(())
}

/// A report enters the cache only when its operation did not end in the
/// error state.
fn worth_caching(record: Option<&ProgressRecord>) -> bool {
    record.is_none_or(|record| record.status != Status::Error)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sekretar=warn,sekretar_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let provider: Provider = cli.provider.into();

    // Validate API key early
    if let Err(e) = provider.validate_api_key() {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    println!(
        "\n{}  {}\n",
        style("sekretar").cyan().bold(),
        style("Transcript Analyzer").dim()
    );
    println!("{}", style("─".repeat(60)).dim());

    let total_start = Instant::now();

    // Step 1: Load transcript
    let transcript = load_transcript(&cli.transcript).await?;
    let duration_mins = transcript.duration_seconds() / 60.0;
    println!(
        "{} Transcript loaded: {:.1} min, {} segments, {}",
        style("✓").green().bold(),
        duration_mins,
        transcript.segments.len(),
        style(&transcript.language).yellow()
    );

    let title = cli.title.clone().unwrap_or_else(|| {
        cli.transcript
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled recording".to_string())
    });
    let report_lang = cli.lang.unwrap_or_else(|| transcript.language.clone());

    // Setup cache directory keyed by the transcript's canonical path
    let canonical = fs::canonicalize(&cli.transcript)
        .await
        .unwrap_or_else(|_| cli.transcript.clone());
    let cache_dir = get_cache_dir(&canonical.to_string_lossy());
    fs::create_dir_all(&cache_dir).await?;
    let report_path = get_report_path(&cache_dir, &provider, &report_lang);
    debug!(path = %report_path.display(), "report cache path");

    // Step 2: Analyze (check cache with provider+lang)
    let step_start = Instant::now();
    let mut report_saved = true;
    let report = if !cli.force && report_path.exists() {
        let report = load_report(&report_path).await?;
        println!(
            "{} Report generated ({}) {}",
            style("✓").green().bold(),
            provider.name(),
            style("(cached)").dim()
        );
        report
    } else {
        let generator = HttpGenerator::new(provider.clone())?;
        let orchestrator = Orchestrator::new(Arc::new(generator), ProgressTracker::new())
            .with_limits(ChunkLimits {
                max_segments: cli.max_segments,
                max_chars: cli.max_chars,
            });
        let operation_id = Uuid::new_v4().to_string();

        let task = {
            let orchestrator = orchestrator.clone();
            let transcript = transcript.clone();
            let title = title.clone();
            let report_lang = report_lang.clone();
            let operation_id = operation_id.clone();
            tokio::spawn(async move {
                orchestrator
                    .analyze_transcription(&title, &transcript, &report_lang, Some(&operation_id))
                    .await
            })
        };

        let bar = create_progress_bar();
        bar.set_message(format!(
            "Analyzing with {} ({} report)...",
            provider.name(),
            report_lang
        ));
        while !task.is_finished() {
            if let Some(record) = orchestrator.get_progress(&operation_id).await {
                bar.set_position(record.overall_percent() as u64);
                bar.set_message(record.message.clone());
            }
            tokio::time::sleep(Duration::from_millis(120)).await;
        }
        let report = task.await?;
        bar.set_position(100);
        bar.finish_with_message(format!(
            "{} Report generated ({}) {}",
            style("✓").green().bold(),
            provider.name(),
            style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
        ));

        let record = orchestrator.get_progress(&operation_id).await;
        if let Some(record) = &record {
            if record.status == Status::Error {
                eprintln!(
                    "{} {}",
                    style("Warning:").yellow().bold(),
                    record.error.as_deref().unwrap_or("analysis failed")
                );
            }
        }

        // Save to cache; failed analyses stay out so the next run retries
        if worth_caching(record.as_ref()) {
            save_report(&report, &report_path).await?;
        } else {
            report_saved = false;
        }
        report
    };

    println!(
        "\n{} {}",
        style("Total time:").dim(),
        style(format_duration(total_start.elapsed())).cyan().bold()
    );
    if report_saved {
        println!(
            "{} {}\n",
            style("Saved:").dim(),
            style(report_path.display()).cyan()
        );
    }
    println!("{}", style("─".repeat(60)).dim());

    // Human-readable output
    let readable = format_report_readable(&report);
    println!("{}", readable);

    Ok(())
}
