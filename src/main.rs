//! folio CLI entry point.
//!
//! Provides `serve`, `submit`, and `check` subcommands for running the contact
//! endpoint, sending one message from the shell, or printing the resolved
//! delivery routing.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use folio::config::{FolioConfig, SinkKind};
use folio::contact::pipeline::ContactPipeline;
use folio::contact::RawFields;
use folio::credentials::load_credentials;

/// folio: contact form backend for a personal portfolio site.
#[derive(Parser)]
#[command(name = "folio", version, about)]
struct Cli {
    /// Path to a `.env` file with credentials.
    #[arg(long, global = true, default_value = ".env")]
    env_file: PathBuf,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Run the HTTP contact endpoint.
    Serve,
    /// Submit one contact message and print the outcome.
    Submit {
        /// Sender name.
        #[arg(long, default_value = "")]
        name: String,
        /// Sender email.
        #[arg(long, default_value = "")]
        email: String,
        /// Message subject.
        #[arg(long, default_value = "")]
        subject: String,
        /// Message body.
        #[arg(long, default_value = "")]
        message: String,
    },
    /// Print the resolved delivery routing without sending anything.
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => handle_serve(&cli.env_file).await,
        Command::Submit {
            name,
            email,
            subject,
            message,
        } => handle_submit(&cli.env_file, RawFields::new(name, email, subject, message)).await,
        Command::Check => handle_check(&cli.env_file),
    }
}

fn load_config(env_file: &Path) -> anyhow::Result<FolioConfig> {
    load_config_with_path(env_file).map(|(config, _)| config)
}

/// Load configuration and report which file it was resolved from.
fn load_config_with_path(env_file: &Path) -> anyhow::Result<(FolioConfig, PathBuf)> {
    let credentials = load_credentials(env_file)?;
    let path = FolioConfig::config_path_with(|key| credentials.resolve(key));
    let config = FolioConfig::load(&credentials).context("failed to load configuration")?;
    Ok((config, path))
}

/// Run the HTTP server until Ctrl-C.
async fn handle_serve(env_file: &Path) -> anyhow::Result<()> {
    // The logs directory comes from config, so config is read before the
    // subscriber exists; its source is logged once logging is up.
    let (config, config_path) = load_config_with_path(env_file)?;
    let _logging_guard = folio::logging::init_server(&config.server.logs_dir, "info")?;
    if config_path.exists() {
        info!(path = %config_path.display(), "configuration loaded from file");
    } else {
        info!(path = %config_path.display(), "no config file found, using defaults");
    }

    let pipeline = Arc::new(ContactPipeline::from_config(&config));
    info!(
        mode = %config.site.mode,
        primary = pipeline.has_primary(),
        sandbox = pipeline.has_sandbox(),
        sink = pipeline.sink_name(),
        "contact pipeline ready"
    );

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;
    info!(addr = %config.server.bind, "listening");

    axum::serve(listener, folio::server::router(pipeline))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("received shutdown signal");
        })
        .await
        .context("server error")?;

    info!("folio shut down cleanly");
    Ok(())
}

/// Submit one message through the configured pipeline.
async fn handle_submit(env_file: &Path, fields: RawFields) -> anyhow::Result<()> {
    folio::logging::init_cli("warn");
    let config = load_config(env_file)?;
    let pipeline = ContactPipeline::from_config(&config);

    let outcome = pipeline.submit(&fields).await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if !outcome.delivered {
        std::process::exit(1);
    }
    Ok(())
}

/// Print routing decisions.
fn handle_check(env_file: &Path) -> anyhow::Result<()> {
    folio::logging::init_cli("warn");
    let config = load_config(env_file)?;
    let sandbox = config.site.mode.allows_sandbox() && config.sandbox.enabled;

    println!("mode:     {}", config.site.mode);
    println!("owner:    {}", config.site.owner_email);
    println!("primary:  {}", if config.primary.is_configured() { "configured" } else { "absent" });
    println!("sandbox:  {}", if sandbox { "enabled" } else { "disabled" });
    match config.sink.kind {
        SinkKind::File => println!("sink:     file ({})", config.sink.path.display()),
        SinkKind::Log => println!("sink:     log"),
    }
    if !config.primary.is_configured() && !sandbox {
        println!("warning:  no mail transport; submissions will be rejected as a configuration error");
    }
    Ok(())
}
