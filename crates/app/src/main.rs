use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use doc_segmenter_core::{
    annotate_pdf, extract_segments, HighlightThresholds, Payload, SegmentationOptions,
    DEFAULT_SEGMENT_TOKENS,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "doc-segmenter", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Split a PDF/DOCX document into token-bounded segments and print them as JSON.
    Extract {
        /// Path to the PDF/DOCX file to segment.
        #[arg(long)]
        file: PathBuf,
        /// Write the JSON result here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Approximate max tokens (whitespace-delimited words) per segment.
        #[arg(long, env = "DOC_SEGMENTER_SEGMENT_TOKENS", default_value_t = DEFAULT_SEGMENT_TOKENS)]
        segment_tokens: usize,
        /// Emit single-line JSON.
        #[arg(long, default_value_t = false)]
        compact: bool,
    },
    /// Paint confidence highlights from scored segments onto a PDF.
    Annotate {
        /// Path to the source PDF.
        #[arg(long)]
        file: PathBuf,
        /// JSON array of segments carrying page, bbox and confidence.
        #[arg(long)]
        segments: PathBuf,
        /// Path to write the annotated PDF.
        #[arg(long)]
        output: PathBuf,
        /// Confidence >= this becomes blue.
        #[arg(long, env = "DOC_SEGMENTER_BLUE_THRESHOLD", default_value_t = 0.6)]
        blue_threshold: f64,
        /// Confidence >= this becomes yellow.
        #[arg(long, env = "DOC_SEGMENTER_YELLOW_THRESHOLD", default_value_t = 0.7)]
        yellow_threshold: f64,
        /// Confidence >= this becomes red.
        #[arg(long, env = "DOC_SEGMENTER_RED_THRESHOLD", default_value_t = 0.8)]
        red_threshold: f64,
    },
}

fn render_payload(payload: &Payload, compact: bool) -> serde_json::Result<String> {
    if compact {
        serde_json::to_string(payload)
    } else {
        serde_json::to_string_pretty(payload)
    }
}

fn render_annotate_result(output: &Path) -> String {
    serde_json::json!({ "output": output.display().to_string() }).to_string()
}

/// Sends a rendered result to `output` when given, otherwise to `stdout`.
fn emit(rendered: &str, output: Option<&Path>, stdout: &mut impl Write) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(output = %path.display(), "wrote segments");
        }
        None => {
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    // stdout is reserved for the JSON result
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "doc-segmenter boot"
    );

    match cli.command {
        Command::Extract {
            file,
            output,
            segment_tokens,
            compact,
        } => {
            let options = SegmentationOptions {
                max_tokens: segment_tokens,
                ..SegmentationOptions::default()
            };
            let payload = extract_segments(&file, options)?;
            let rendered = render_payload(&payload, compact)?;
            emit(&rendered, output.as_deref(), &mut std::io::stdout().lock())?;
        }
        Command::Annotate {
            file,
            segments,
            output,
            blue_threshold,
            yellow_threshold,
            red_threshold,
        } => {
            let thresholds = HighlightThresholds {
                blue: blue_threshold,
                yellow: yellow_threshold,
                red: red_threshold,
            };
            annotate_pdf(&file, &segments, &output, &thresholds)?;
            emit(
                &render_annotate_result(&output),
                None,
                &mut std::io::stdout().lock(),
            )?;
        }
    }

    Ok(())
}
