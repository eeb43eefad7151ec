//! facelens - analyze a photo's facial attributes with the remote service
//!
//! This tool provides commands for:
//! - Checking service configuration
//! - Showing the usage analytics dashboard
//! - Uploading and analyzing a photo, with user-driven retry
//!
//! Uses XDG Base Directory specification for file locations:
//! - Config: $XDG_CONFIG_HOME/facelens/config.toml (~/.config/facelens/config.toml)
//! - Logs: $XDG_STATE_HOME/facelens/facelens.log (~/.local/state/facelens/facelens.log)

mod render;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use facelens_core::client::HttpClients;
use facelens_core::{source, Config, Error, Orchestrator, Phase, StartOutcome};
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Parser)]
#[command(name = "facelens")]
#[command(about = "Analyze facial attributes in a photo")]
#[command(version)]
struct Args {
    /// Write logs to the XDG state directory
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show service configuration
    Status,

    /// Show the usage analytics dashboard
    Analytics {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Upload a photo and show its analysis
    Analyze {
        /// Photo to analyze
        path: PathBuf,

        /// Retry a failed submission up to this many times
        #[arg(short, long, default_value_t = 0)]
        retries: u32,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load().context("failed to load configuration")?;

    let _log_guard = if args.verbose {
        Some(
            facelens_core::logging::init(&config.logging)
                .context("failed to initialize logging")?,
        )
    } else {
        None
    };
    tracing::info!("facelens starting");

    match args.command {
        Command::Status => cmd_status(&config),
        Command::Analytics { format } => block_on(cmd_analytics(&config, format)),
        Command::Analyze {
            path,
            retries,
            format,
        } => block_on(cmd_analyze(&config, path, retries, format)),
    }
}

/// Run a command on a single-threaded runtime
fn block_on<F: std::future::Future<Output = Result<()>>>(future: F) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create runtime")?;
    runtime.block_on(future)
}

fn cmd_status(config: &Config) -> Result<()> {
    println!("facelens Configuration");
    println!("======================");
    println!();

    let service = &config.service;
    println!("Config File:     {}", Config::config_path().display());
    println!("Log File:        {}", Config::log_path().display());
    println!();

    if !service.is_ready() {
        println!("Service is not configured. Add it to config.toml:");
        println!();
        println!("  [service]");
        println!("  base_url = \"https://your-facelens-server.com\"");
        return Ok(());
    }

    println!(
        "Base URL:        {}",
        service.base_url.as_deref().unwrap_or("<not set>")
    );
    println!(
        "API Key:         {}",
        if service.api_key.is_some() {
            "<set>"
        } else {
            "<not set>"
        }
    );
    println!("Timeout:         {}s", service.timeout_secs);
    println!("Upload:          {}", service.upload_path);
    println!("Analyze:         {}", service.analyze_path);
    println!("Analytics:       {}", service.analytics_path);

    println!();
    match service.validate() {
        Ok(()) => println!("Status: Ready"),
        Err(e) => println!("Status: Invalid ({})", e),
    }

    Ok(())
}

fn mount_orchestrator(config: &Config) -> Result<Orchestrator> {
    let clients = HttpClients::new(&config.service)
        .context("service is not configured; run 'facelens status' for details")?;
    Ok(Orchestrator::with_http(clients))
}

async fn cmd_analytics(config: &Config, format: Format) -> Result<()> {
    let orchestrator = mount_orchestrator(config)?;
    orchestrator.mount().await;

    let view = orchestrator.analytics();
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&view.summary)?),
        Format::Text => render::print_dashboard(&view),
    }
    Ok(())
}

async fn cmd_analyze(config: &Config, path: PathBuf, retries: u32, format: Format) -> Result<()> {
    // Image source: permission problems are a one-time notice, not a workflow state
    let image = match source::select_from_path(&path) {
        Ok(image) => image,
        Err(Error::PermissionDenied(message)) => {
            eprintln!("Permission needed: {}", message);
            return Ok(());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to open {}", path.display()));
        }
    };

    let orchestrator = mount_orchestrator(config)?;
    orchestrator.mount().await;

    tracing::info!(image = %image, retries, "Analyzing photo");
    orchestrator
        .select_image(image)
        .map_err(|rejection| anyhow::anyhow!(rejection))?;

    let show_progress = format == Format::Text;
    let mut attempts_left = retries;
    loop {
        let spinner = show_progress.then(|| spawn_spinner(&orchestrator));
        let outcome = orchestrator.start_analysis().await;
        if let Some((bar, watcher)) = spinner {
            watcher.abort();
            bar.finish_and_clear();
        }

        match outcome {
            StartOutcome::Finished(Phase::Failed) if attempts_left > 0 => {
                attempts_left -= 1;
                if let Some(reason) = orchestrator.state().failure() {
                    tracing::warn!(error = %reason, attempts_left, "Retrying failed submission");
                    eprintln!("Analysis failed: {}. Retrying...", reason);
                }
            }
            StartOutcome::Rejected(rejection) => anyhow::bail!(rejection),
            StartOutcome::Finished(_) => break,
        }
    }

    orchestrator.settle().await;

    let state = orchestrator.state();
    let analytics = orchestrator.analytics();
    match format {
        Format::Json => render::print_json(&state, &analytics)?,
        Format::Text => {
            render::print_dashboard(&analytics);
            println!();
            render::print_workflow(&state);
        }
    }

    if state.phase() == Phase::Failed {
        std::process::exit(1);
    }
    Ok(())
}

/// Spinner that follows the workflow phase through a read-only subscription
fn spawn_spinner(orchestrator: &Orchestrator) -> (ProgressBar, tokio::task::JoinHandle<()>) {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.enable_steady_tick(Duration::from_millis(100));

    let mut rx = orchestrator.subscribe();
    let watched = bar.clone();
    let watcher = tokio::spawn(async move {
        loop {
            let message = match rx.borrow_and_update().phase() {
                Phase::Uploading => "Uploading photo...",
                Phase::Analyzing => "Analyzing photo...",
                _ => "",
            };
            watched.set_message(message);
            if rx.changed().await.is_err() {
                return;
            }
        }
    });

    (bar, watcher)
}
