//! facegate: command-line entry point for the selfie verification core.

use anyhow::{bail, Context};
use clap::Parser;
use facegate_quality::FrameQualityGate;
use facegate_types::{DetachedCapture, FaceLandmarkFrame, ImageBlob, Timestamp};
use facegate_utils::LogFormat;
use facegate_verification::{
    CaptureOutcome, EntryParams, FlowConfig, SecretString, SessionActor, SessionController,
    SubmitAck,
};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "facegate", about = "Selfie verification tooling")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "FACEGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Compliance API base URL.
    #[arg(long, env = "FACEGATE_API_BASE_URL")]
    api_base_url: Option<String>,

    /// HS256 secret for token signatures.
    #[arg(long, env = "FACEGATE_TOKEN_SECRET", hide_env_values = true)]
    token_secret: Option<String>,

    /// Accept tokens without signature verification when no secret is set.
    #[arg(long, env = "FACEGATE_ALLOW_UNVERIFIED_TOKENS")]
    allow_unverified_tokens: bool,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "FACEGATE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "FACEGATE_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Access-token tools.
    #[command(name = "token")]
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
    /// Landmark-frame tools.
    #[command(name = "frames")]
    Frames {
        #[command(subcommand)]
        action: FramesAction,
    },
    /// Drive a full verification flow against the compliance API.
    Run {
        /// Bearer token the flow is entered with.
        #[arg(long)]
        token: String,
        /// Captured selfie: a JPEG/PNG file or a file holding a data URL.
        #[arg(long)]
        image: PathBuf,
        /// JSON-lines file of landmark frames to feed before capture.
        #[arg(long)]
        frames: PathBuf,
        /// Where to send the user afterwards.
        #[arg(long)]
        callback: Option<String>,
    },
}

#[derive(clap::Subcommand)]
enum TokenAction {
    /// Validate a token and print its subject and remaining lifetime.
    Inspect { token: String },
}

#[derive(clap::Subcommand)]
enum FramesAction {
    /// Print one verdict per JSON-lines frame.
    Evaluate {
        /// Input file; stdin when omitted.
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    facegate_utils::init_tracing(config.log_format, &config.log_level);

    match cli.command {
        Command::Token { action } => match action {
            TokenAction::Inspect { token } => inspect_token(&config, &token),
        },
        Command::Frames { action } => match action {
            FramesAction::Evaluate { input } => evaluate_frames(&config, input.as_deref()),
        },
        Command::Run {
            token,
            image,
            frames,
            callback,
        } => run_flow(&config, token, &image, &frames, callback).await,
    }
}

/// File config as the base, CLI flags and env vars on top.
fn load_config(cli: &Cli) -> anyhow::Result<FlowConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let path_str = path.to_str().context("config path is not valid UTF-8")?;
            let config = FlowConfig::from_toml_file(path_str)
                .with_context(|| format!("loading {}", path.display()))?;
            tracing::info!("Loaded config from {}", path.display());
            config
        }
        None => FlowConfig::default(),
    };

    if let Some(url) = &cli.api_base_url {
        config.api_base_url = url.clone();
    }
    if let Some(secret) = &cli.token_secret {
        config.token_secret = Some(SecretString::new(secret.clone()));
    }
    config.allow_unverified_tokens |= cli.allow_unverified_tokens;
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    config.validate()?;
    Ok(config)
}

fn inspect_token(config: &FlowConfig, token: &str) -> anyhow::Result<()> {
    let validator = config.build_validator()?;
    let validated = validator.validate(token)?;
    let payload = &validated.payload;

    println!("subject:   {}", validated.subject_id);
    println!("trust:     {:?}", validated.trust);
    match payload.expires_at() {
        Some(expires_at) => {
            let remaining = expires_at.secs_until(Timestamp::now());
            println!(
                "expires:   {} ({})",
                expires_at.as_secs(),
                facegate_utils::format_remaining(remaining)
            );
        }
        None => println!("expires:   never"),
    }
    if let Some(callback) = payload.callback_url() {
        println!("callback:  {callback}");
    }
    Ok(())
}

fn evaluate_frames(config: &FlowConfig, input: Option<&Path>) -> anyhow::Result<()> {
    let gate = FrameQualityGate::new(config.quality.clone());
    let reader: Box<dyn BufRead> = match input {
        Some(path) => Box::new(BufReader::new(
            std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(std::io::stdin())),
    };
    for frame in read_frames(reader)? {
        let verdict = gate.evaluate(&frame);
        println!("{}", serde_json::to_string(&verdict)?);
    }
    Ok(())
}

async fn run_flow(
    config: &FlowConfig,
    token: String,
    image_path: &Path,
    frames_path: &Path,
    callback: Option<String>,
) -> anyhow::Result<()> {
    let image = load_image(image_path)?;
    let frames = read_frames(BufReader::new(
        std::fs::File::open(frames_path)
            .with_context(|| format!("opening {}", frames_path.display()))?,
    ))?;

    let backend = Arc::new(config.build_backend());
    let controller = SessionController::new(
        EntryParams::new(Some(token), callback),
        config.components(backend)?,
        Box::new(DetachedCapture),
    );
    let (handle, task) = SessionActor::spawn(controller, config.frame_channel_capacity);
    handle.begin().await?;

    // Each capture request queues behind the frame offered before it, so
    // it is judged against that frame's verdict.
    let mut captured = false;
    for (index, frame) in frames.into_iter().enumerate() {
        if !handle.offer_frame(frame) {
            bail!("session stopped before frame {index} could be judged");
        }
        match handle.capture(image.clone()).await? {
            CaptureOutcome::Captured => {
                captured = true;
                break;
            }
            CaptureOutcome::Refused(reason) => {
                tracing::debug!(frame = index, %reason, "frame judged")
            }
        }
    }
    if !captured {
        let last = handle.snapshot().last_verdict;
        handle.leave().await?;
        bail!(
            "no frame passed the quality gate (last: {} - {})",
            last.reason_code,
            last.message
        );
    }

    if let SubmitAck::TokenRejected(e) = handle.submit().await? {
        tracing::warn!("token rejected at submission: {e}");
    }
    let settled = handle.settled().await?;
    let result = settled
        .flow_result
        .context("session ended without a result")?;
    if let Some(detail) = &settled.failure_detail {
        tracing::warn!("verification failed: {detail}");
    }

    handle.leave().await?;
    if let Some(url) = handle.snapshot().redirect_url {
        tracing::info!("redirect: {url}");
    }
    drop(handle);
    task.await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Read a selfie from disk. A file starting with `data:` is treated as a
/// data URL; anything else as raw bytes typed by extension.
fn load_image(path: &Path) -> anyhow::Result<ImageBlob> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    if bytes.starts_with(b"data:") {
        let text = String::from_utf8(bytes).context("data URL is not valid UTF-8")?;
        return Ok(ImageBlob::from_data_url(text.trim())?);
    }
    let mime_type = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("png") => "image/png",
        Some(ext) if ext.eq_ignore_ascii_case("webp") => "image/webp",
        _ => "image/jpeg",
    };
    Ok(ImageBlob::new(bytes, mime_type)?)
}

/// Parse JSON-lines landmark frames, skipping blank lines.
fn read_frames(reader: impl BufRead) -> anyhow::Result<Vec<FaceLandmarkFrame>> {
    let mut frames = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let frame: FaceLandmarkFrame = serde_json::from_str(&line)
            .with_context(|| format!("line {}: invalid landmark frame", index + 1))?;
        frames.push(frame);
    }
    Ok(frames)
}
