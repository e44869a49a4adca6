//! Blobwritr - Resumable uploads for cloud object storage
//!
//! Streams a local file into a chunked, resumable write channel. If the
//! upload fails mid-flight the channel state is saved to disk; rerunning
//! with --resume continues from the last acknowledged byte.

use anyhow::Context;
use blobwritr::{Client, Config, UploadTarget, WriteChannel, WriterState};
use clap::Parser;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Blobwritr - Chunked resumable uploader for cloud object storage
#[derive(Parser, Debug)]
#[command(name = "blobwritr")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// File to upload
    file: PathBuf,

    /// Destination bucket
    #[arg(short, long, conflicts_with = "signed_url")]
    bucket: Option<String>,

    /// Object name; defaults to the file name
    #[arg(short, long)]
    name: Option<String>,

    /// Pre-signed upload URL, as an alternative to --bucket
    #[arg(long)]
    signed_url: Option<String>,

    /// Content type recorded on the uploaded object
    #[arg(long)]
    content_type: Option<String>,

    /// Where channel state is saved if the upload fails
    #[arg(long, default_value = "blobwritr.state")]
    state: PathBuf,

    /// Resume from previously saved channel state
    #[arg(long)]
    resume: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Blobwritr v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::load(&args.config)?;
    info!("Loaded configuration from {:?}", args.config);

    let client = Client::new(&config)?;

    let mut file = File::open(&args.file)
        .with_context(|| format!("failed to open {}", args.file.display()))?;

    let mut writer = if args.resume {
        let raw = std::fs::read_to_string(&args.state)
            .with_context(|| format!("failed to read saved state {}", args.state.display()))?;
        let state: WriterState = serde_json::from_str(&raw).context("malformed saved state")?;
        anyhow::ensure!(state.is_open(), "saved state is for a completed upload");

        // Already-acknowledged bytes plus the captured buffer are re-seeded
        // from the state, so the source skips past both.
        let skip = state.position() + state.buffered_len() as u64;
        file.seek(SeekFrom::Start(skip))?;
        info!(position = state.position(), "resuming upload");
        client.restore(&state)
    } else {
        let target = target_from_args(&args)?;
        client.writer(target)?
    };

    if let Err(err) = stream(&mut writer, &mut file) {
        let state = writer.capture();
        std::fs::write(&args.state, serde_json::to_string_pretty(&state)?)
            .with_context(|| format!("failed to save state to {}", args.state.display()))?;
        warn!(state = %args.state.display(), "upload failed, channel state saved");
        return Err(err.context("upload failed; rerun with --resume to continue"));
    }

    info!(bytes = writer.position(), "upload complete");
    Ok(())
}

fn target_from_args(args: &Args) -> anyhow::Result<UploadTarget> {
    if let Some(url) = &args.signed_url {
        return Ok(UploadTarget::signed_url(url.as_str()));
    }

    let bucket = args
        .bucket
        .as_deref()
        .context("either --bucket or --signed-url is required")?;
    let name = match &args.name {
        Some(name) => name.clone(),
        None => args
            .file
            .file_name()
            .context("cannot derive object name from file path; pass --name")?
            .to_string_lossy()
            .into_owned(),
    };

    Ok(match &args.content_type {
        Some(content_type) => {
            UploadTarget::blob_with_content_type(bucket, name, content_type.as_str())
        }
        None => UploadTarget::blob(bucket, name),
    })
}

/// Pump the file through the channel and close it.
fn stream(writer: &mut WriteChannel, file: &mut File) -> anyhow::Result<()> {
    let mut buf = vec![0u8; 256 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        writer.write(&buf[..n])?;
    }
    writer.close()?;
    Ok(())
}
