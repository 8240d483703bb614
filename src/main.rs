//! Subrelay - Caption Extraction, Translation and Burn-in Pipeline
//!
//! Command-line entry point. Each subcommand runs one pipeline stage; `process`
//! runs all of them on a single video.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};

use subrelay::cli::{Args, Commands};
use subrelay::config::Config;
use subrelay::error::{ErrorBody, ErrorKind, SubrelayError};
use subrelay::workflow::Workflow;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file; the guard flushes the file on drop
    let log_dir = std::env::current_dir()?.join(".subrelay").join("log");
    let _log_guard = setup_logging(&log_dir, args.verbose)?;
    info!("Starting Subrelay");

    let json_errors = args.json_errors;
    if let Err(err) = run(args).await {
        let code = exit_code(&err);
        error!("{:#}", err);

        if json_errors {
            let body = match err.downcast_ref::<SubrelayError>() {
                Some(e) => ErrorBody::from(e),
                None => ErrorBody { error: format!("{:#}", err) },
            };
            eprintln!("{}", serde_json::to_string(&body)?);
        } else {
            eprintln!("Error: {:#}", err);
        }
        return Ok(ExitCode::from(code));
    }

    Ok(ExitCode::SUCCESS)
}

async fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;

    match args.command {
        Commands::InitConfig { output } => {
            Config::default().save_to_file(&output)?;
            println!("Wrote default configuration to {}", output.display());
        }
        Commands::Check => {
            let workflow = Workflow::new(config);
            let mut all_ok = true;
            for (component, status) in workflow.check().await {
                match status {
                    Ok(detail) => println!("{:<20} OK      {}", component, detail),
                    Err(e) => {
                        all_ok = false;
                        println!("{:<20} MISSING {}", component, e);
                    }
                }
            }
            if !all_ok {
                anyhow::bail!(SubrelayError::ResourceMissing("one or more components unavailable".to_string()));
            }
        }
        Commands::Extract { input, output } => {
            info!("Extracting audio from: {}", input.display());
            Workflow::new(config).extract_audio(&input, &output).await?;
        }
        Commands::Transcribe { input, output, language } => {
            info!("Transcribing audio: {}", input.display());
            let document = Workflow::new(config)
                .generate_captions(&input, &output, language.as_deref())
                .await?;
            info!("Wrote {} cues to {}", document.len(), output.display());
        }
        Commands::Translate { input, output } => {
            info!("Translating subtitles: {}", input.display());
            let output = output.unwrap_or_else(|| {
                format!("subtitles_{}.srt", config.translate.target_language).into()
            });
            let report = Workflow::new(config).translate_captions(&input, &output).await?;
            if report.is_degraded() {
                info!("Translation degraded: {} fallbacks, passthrough: {:?}", report.fallbacks, report.passthrough);
            }
        }
        Commands::Embed { video, subtitles, output } => {
            info!("Burning subtitles into video: {}", video.display());
            Workflow::new(config).burn_captions(&video, &subtitles, &output).await?;
        }
        Commands::Process { input, output, keep_intermediates } => {
            info!("Processing video file: {}", input.display());
            Workflow::new(config)
                .process(&input, &output, keep_intermediates.as_deref())
                .await?;
        }
    }

    info!("Subrelay completed successfully");
    Ok(())
}

fn load_config(args: &Args) -> Result<Config> {
    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            // Try to load subrelay.toml from current directory first
            if std::path::Path::new("subrelay.toml").exists() {
                info!("Found subrelay.toml in current directory, loading...");
                Config::from_file("subrelay.toml")?
            } else {
                Config::default()
            }
        }
    };
    Ok(config)
}

fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<SubrelayError>().map(SubrelayError::kind) {
        Some(ErrorKind::Input) => 2,
        Some(ErrorKind::Resource) => 3,
        Some(ErrorKind::ExternalTool) => 4,
        Some(ErrorKind::Format) => 5,
        _ => 1,
    }
}

/// Setup logging to both console and file. Buffered file lines are written when the guard drops.
fn setup_logging(log_dir: &Path, verbose: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(log_dir, "subrelay.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("subrelay.log").display());

    Ok(guard)
}
