//! LaunchGuard command line
//!
//! - `serve` - webhook ingress endpoint, optionally with an embedded DLQ runner
//! - `dlq-run` - DLQ retry worker (continuous, or one batch with `--once`)
//! - `wait-ready` - block until the health endpoint answers 200
//! - `gate` - run the readiness gate, print the report, exit 0 on GO

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use launchguard::adapters::postgres::{self, PostgresDlqStore, PostgresWebhookEventStore};
use launchguard::adapters::{
    webhook_router, AdminClient, ClamdScanner, FilesystemBackuper, HealthProbe,
    RustlsCertificateInspector, TokioHostResolver, WebhookAppState,
};
use launchguard::application::{
    standard_suite, DlqRunner, LoggingHandler, ReadinessGate, SuiteDeps, WebhookIngress,
};
use launchguard::config::{AppConfig, ServerConfig};
use launchguard::ports::{DlqStore, ServiceProbe, WebhookEventStore, WebhookHandler};

#[derive(Parser, Debug)]
#[command(name = "launchguard")]
#[command(version)]
#[command(about = "Webhook reliability and deployment readiness gate")]
struct Cli {
    /// Configuration file, overridden by LAUNCHGUARD__* environment variables
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the webhook ingress endpoint
    Serve {
        /// Also run the DLQ retry worker in this process
        #[arg(long)]
        with_dlq_runner: bool,
    },

    /// Retry due dead-letter entries
    DlqRun {
        /// Process a single batch and exit
        #[arg(long)]
        once: bool,
    },

    /// Poll the health endpoint until it answers 200
    WaitReady {
        /// Endpoint to poll; defaults to the gate target's health path
        #[arg(long)]
        url: Option<String>,

        /// Overall timeout in seconds; defaults to gate.probe.timeout_secs
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Run the deployment readiness gate
    Gate {
        /// Base URL of the deployment under test
        #[arg(long)]
        target_url: Option<String>,

        /// Do not block the release on SKIPPED checks
        #[arg(long)]
        allow_skips: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::from(2);
        }
    };

    init_tracing(&config.server);

    match run(cli.command, config).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Command failed");
            ExitCode::from(2)
        }
    }
}

/// Logs go to stderr so that `gate` output on stdout stays machine-readable.
fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if server.is_production() {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(command: Command, mut config: AppConfig) -> anyhow::Result<ExitCode> {
    config.validate().context("Invalid configuration")?;

    match command {
        Command::Serve { with_dlq_runner } => serve(config, with_dlq_runner).await,
        Command::DlqRun { once } => dlq_run(config, once).await,
        Command::WaitReady { url, timeout_secs } => wait_ready(config, url, timeout_secs).await,
        Command::Gate {
            target_url,
            allow_skips,
        } => {
            if let Some(url) = target_url {
                config.gate.target_url = url;
            }
            if allow_skips {
                config.gate.allow_skips = true;
            }
            gate(config).await
        }
    }
}

/// Flips the watch channel on Ctrl-C.
fn shutdown_channel() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            if tx.send(true).is_err() {
                tracing::debug!("No shutdown listeners remain");
            }
        }
    });
    rx
}

/// Opens the pool and builds both Postgres stores.
async fn stores(
    config: &AppConfig,
) -> anyhow::Result<(Arc<dyn WebhookEventStore>, Arc<dyn DlqStore>)> {
    config.validate_database().context("Invalid database configuration")?;
    let pool = postgres::connect(&config.database).await?;

    let events: Arc<dyn WebhookEventStore> = Arc::new(PostgresWebhookEventStore::new(pool.clone()));
    let dlq: Arc<dyn DlqStore> = Arc::new(PostgresDlqStore::new(pool));
    Ok((events, dlq))
}

async fn serve(config: AppConfig, with_dlq_runner: bool) -> anyhow::Result<ExitCode> {
    let (events, dlq) = stores(&config).await?;
    let handler: Arc<dyn WebhookHandler> = Arc::new(LoggingHandler);

    let ingress = Arc::new(WebhookIngress::new(
        events,
        dlq.clone(),
        handler.clone(),
        config.dlq.backoff_policy(),
    ));
    let app = webhook_router(WebhookAppState { ingress }, config.server.request_timeout());

    let shutdown = shutdown_channel();
    let runner = if with_dlq_runner {
        let runner = DlqRunner::with_config(dlq, handler, config.dlq.runner_config());
        let rx = shutdown.clone();
        Some(tokio::spawn(async move { runner.run(rx).await }))
    } else {
        None
    };

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(%addr, with_dlq_runner, "Webhook ingress listening");

    let mut server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if server_shutdown.wait_for(|stop| *stop).await.is_err() {
                tracing::debug!("Shutdown sender dropped; stopping server");
            }
        })
        .await
        .context("Server error")?;

    if let Some(task) = runner {
        task.await.context("DLQ runner panicked")??;
    }

    tracing::info!("Webhook ingress stopped");
    Ok(ExitCode::SUCCESS)
}

async fn dlq_run(config: AppConfig, once: bool) -> anyhow::Result<ExitCode> {
    let (_, dlq) = stores(&config).await?;
    let runner = DlqRunner::with_config(dlq, Arc::new(LoggingHandler), config.dlq.runner_config());

    if once {
        let report = runner.poll_once().await?;
        tracing::info!(
            succeeded = report.succeeded,
            rescheduled = report.rescheduled,
            dead = report.dead,
            "DLQ batch processed"
        );
    } else {
        runner.run(shutdown_channel()).await?;
    }

    Ok(ExitCode::SUCCESS)
}

async fn wait_ready(
    config: AppConfig,
    url: Option<String>,
    timeout_secs: Option<u64>,
) -> anyhow::Result<ExitCode> {
    let probe_config = &config.gate.probe;
    let url = match url {
        Some(url) => url,
        None => config
            .gate
            .health_url()
            .context("No --url given and gate.target_url is not usable")?
            .to_string(),
    };
    let timeout = timeout_secs
        .map(Duration::from_secs)
        .unwrap_or_else(|| probe_config.timeout());

    let probe = HealthProbe::new(probe_config.request_timeout());
    if probe.wait_ready(&url, timeout, probe_config.retry_interval()).await {
        println!("ready {}", url);
        Ok(ExitCode::SUCCESS)
    } else {
        println!("not-ready {} after_secs={}", url, timeout.as_secs());
        Ok(ExitCode::FAILURE)
    }
}

async fn gate(config: AppConfig) -> anyhow::Result<ExitCode> {
    config.validate_gate().context("Invalid gate configuration")?;
    let gate_config = config.gate;
    let request_timeout = gate_config.probe.request_timeout();
    let check_timeout = gate_config.check_timeout();

    let deps = SuiteDeps {
        probe: Arc::new(HealthProbe::new(request_timeout)),
        admin: Arc::new(AdminClient::new(gate_config.target()?, request_timeout)),
        resolver: Arc::new(TokioHostResolver::new(check_timeout)),
        inspector: Arc::new(RustlsCertificateInspector::new(check_timeout)?),
        backuper: Arc::new(FilesystemBackuper::new(
            gate_config.backup.dir.clone(),
            gate_config.backup.command.clone(),
        )),
        scanner: Arc::new(ClamdScanner::new(
            gate_config.antivirus.address.clone(),
            check_timeout,
        )),
    };

    tracing::info!(
        target_url = %gate_config.target_url,
        strict = gate_config.strict(),
        "Running readiness gate"
    );
    let mut gate = ReadinessGate::new(gate_config, standard_suite(deps));
    let verdict = gate.run().await;

    for line in verdict.report_lines() {
        println!("{}", line);
    }
    Ok(ExitCode::from(verdict.exit_code() as u8))
}
