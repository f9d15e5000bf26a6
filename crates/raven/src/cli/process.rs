//! The `raven process` command.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use raven_core::output::OutputFormat as CoreOutputFormat;
use raven_core::{Classification, Config, Raven, ResponseWriter, UploadResponse};

/// Arguments for the `process` command.
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Image files making up one upload, processed in order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Classification selecting the planned sizes
    /// (avatar, audio-art, art, generic-image)
    #[arg(short, long, default_value = "generic-image")]
    pub kind: Classification,

    /// Directory variants are written under (overrides `server.base_dir`)
    #[arg(long)]
    pub base_dir: Option<PathBuf>,

    /// Maximum variants encoded at once (overrides `variants.max_concurrent_workers`)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,
}

impl Default for ProcessArgs {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            kind: Classification::GenericImage,
            base_dir: None,
            workers: None,
            output: None,
            format: OutputFormat::Json,
        }
    }
}

/// Supported output formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One JSON document
    Json,
    /// One JSON object per line: variants, failures, then a summary
    Jsonl,
}

impl From<OutputFormat> for CoreOutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => CoreOutputFormat::Json,
            OutputFormat::Jsonl => CoreOutputFormat::JsonLines,
        }
    }
}

/// Execute the process command.
pub async fn execute(args: ProcessArgs, config: Config) -> anyhow::Result<()> {
    let config = apply_overrides(config, &args);
    let raven = Raven::new(config);

    let response = raven.process_upload(args.kind, &args.files).await?;
    emit(&response, &args)?;

    if !response.is_success() {
        anyhow::bail!(
            "Upload rejected: {}",
            response
                .detail
                .as_deref()
                .or(response.reason.as_deref())
                .unwrap_or("unknown reason")
        );
    }
    if !response.failures.is_empty() {
        tracing::warn!("{} variant(s) failed", response.failures.len());
    }
    Ok(())
}

fn apply_overrides(mut config: Config, args: &ProcessArgs) -> Config {
    if let Some(base_dir) = &args.base_dir {
        config.server.base_dir = base_dir.clone();
    }
    if let Some(workers) = args.workers {
        config.variants.max_concurrent_workers = workers.max(1);
    }
    config
}

fn emit(response: &UploadResponse, args: &ProcessArgs) -> anyhow::Result<()> {
    match &args.output {
        Some(path) => {
            let file = File::create(path)?;
            write_response(BufWriter::new(file), response, args.format)?;
            tracing::info!("Output written to {:?}", path);
        }
        None => write_response(io::stdout().lock(), response, args.format)?,
    }
    Ok(())
}

fn write_response<W: Write>(
    writer: W,
    response: &UploadResponse,
    format: OutputFormat,
) -> io::Result<()> {
    let mut writer = ResponseWriter::new(writer, format.into(), true);
    writer.write(response)?;
    writer.flush()
}
