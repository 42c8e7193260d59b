//! # jobwatch
//!
//! Submit jobs to the legacy or generic job API and follow them until they
//! finish.
//!
//! ## Usage
//! ```bash
//! jobwatch jobs
//! jobwatch run txt2img --spec '{"prompt": "a cat"}' --watch
//! jobwatch watch <request-id> txt2img
//! jobwatch cancel <request-id> txt2img
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use jobwatch_cli::config::WatcherConfig;
use jobwatch_cli::output::{to_line, UpdateLine};
use jobwatch_core::status::StatusUpdate;
use jobwatch_core::types::RequestId;
use jobwatch_tracker::{observer, JobGateway};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "jobwatch",
    about = "Submit remote jobs and track them to completion",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the merged job catalog of both backends.
    Jobs,

    /// List providers known to the generic backend.
    Providers,

    /// Submit a job and print its request id.
    Run {
        /// Job identifier from the catalog.
        job: String,

        /// Job input as a JSON document.
        #[arg(long, default_value = "{}")]
        spec: String,

        /// Keep polling the new request until it reaches a terminal state.
        #[arg(long)]
        watch: bool,
    },

    /// Invoke a job synchronously and print the response.
    Call {
        job: String,

        /// Request body as a JSON document.
        #[arg(long, default_value = "{}")]
        body: String,
    },

    /// Follow an existing request until it reaches a terminal state.
    Watch { request: String, job: String },

    /// Stop tracking a request and cancel it remotely.
    Cancel { request: String, job: String },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "jobwatch=info,jobwatch_tracker=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = WatcherConfig::from_env()?;
    tracing::debug!(
        legacy_url = %config.legacy_url,
        generic_url = %config.generic_url,
        "Loaded configuration",
    );

    let gateway = jobwatch_cli::build_gateway(&config)?;
    gateway
        .refresh()
        .await
        .context("failed to load the job catalog")?;

    let result = execute(&gateway, cli.command).await;
    gateway.tracker().shutdown().await;
    result
}

async fn execute(gateway: &JobGateway, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Jobs => {
            println!("{}", serde_json::to_string_pretty(&gateway.list().await)?);
        }
        Commands::Providers => {
            println!("{}", serde_json::to_string_pretty(&gateway.providers().await?)?);
        }
        Commands::Run { job, spec, watch } => {
            let spec = parse_json("--spec", &spec)?;
            if watch {
                let (tx, rx) = mpsc::unbounded_channel();
                let request_id = gateway
                    .run_and_listen(&job, &spec, observer::channel(tx))
                    .await?;
                println!("{}", serde_json::json!({ "request_id": request_id }));
                follow(gateway, &request_id, &job, rx).await?;
            } else {
                let request_id = gateway.run(&job, &spec).await?;
                println!("{}", serde_json::json!({ "request_id": request_id }));
            }
        }
        Commands::Call { job, body } => {
            let body = parse_json("--body", &body)?;
            println!("{}", serde_json::to_string_pretty(&gateway.call(&job, &body).await?)?);
        }
        Commands::Watch { request, job } => {
            let (tx, rx) = mpsc::unbounded_channel();
            gateway.listen(&request, &job, observer::channel(tx)).await?;
            let request_id = RequestId::parse(request)?;
            follow(gateway, &request_id, &job, rx).await?;
        }
        Commands::Cancel { request, job } => {
            gateway.cancel(&request, &job).await?;
            println!("{}", serde_json::json!({ "request_id": request, "cancelled": true }));
        }
    }
    Ok(())
}

/// Print updates until a terminal one arrives. Ctrl-C cancels the request.
async fn follow(
    gateway: &JobGateway,
    request_id: &RequestId,
    job: &str,
    mut rx: mpsc::UnboundedReceiver<StatusUpdate>,
) -> anyhow::Result<()> {
    loop {
        tokio::select! {
            update = rx.recv() => {
                let Some(update) = update else {
                    tracing::warn!(request_id = %request_id, "Tracking ended without a terminal update");
                    return Ok(());
                };
                println!("{}", to_line(&UpdateLine::now(request_id, &update))?);
                if update.status.is_terminal() {
                    return Ok(());
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!(request_id = %request_id, "Interrupted, cancelling request");
                gateway.cancel(request_id.as_str(), job).await?;
                return Ok(());
            }
        }
    }
}

fn parse_json(flag: &str, raw: &str) -> anyhow::Result<serde_json::Value> {
    serde_json::from_str(raw).with_context(|| format!("{flag} is not valid JSON"))
}
