//! # ptp-probe
//!
//! Remote diagnostics for the linuxptp daemon and its GNSS receiver,
//! driven over a Kubernetes exec session.
//!
//! ## Overview
//!
//! The probe resolves the daemon pod by name prefix, opens a TTY-attached
//! shell in its container, and either:
//! - runs the fixed diagnostic script (default), or
//! - attaches this terminal to the remote shell (`--attach`).
//!
//! ## Architecture
//!
//! This is Layer 3 - the binary that ties together:
//! - ptp-probe-core: Core types
//! - ptp-probe-cluster: Pod resolution and exec sessions
//! - ptp-probe-expect: Send/expect automation

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{error, info};

use ptp_probe_cluster::{ClusterClient, ContainerTarget, SessionHandle, ShellSession};
use ptp_probe_core::ProbeConfig;
use ptp_probe_expect::ShellDriver;

/// Scripted diagnostics for the linuxptp daemon over a remote cluster shell.
#[derive(Debug, Parser)]
#[command(name = "ptp-probe", version, about)]
struct Cli {
    /// Path to kubeconfig. Required.
    #[arg(short = 'k', long)]
    kubeconfig: PathBuf,

    /// YAML file overriding the default probe configuration.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Target the GNSS receiver container instead of the daemon container.
    #[arg(long)]
    gps: bool,

    /// Attach this terminal to the remote shell instead of running the
    /// scripted probe.
    #[arg(long)]
    attach: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = match &cli.config {
        Some(path) => ProbeConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ProbeConfig::default(),
    };
    config.validate()?;

    info!("kubeconfig: {}", cli.kubeconfig.display());
    let client = ClusterClient::from_kubeconfig(&cli.kubeconfig).await?;

    let container = if cli.gps {
        &config.target.gps_container
    } else {
        &config.target.container
    };
    let target = ContainerTarget::resolve(
        client,
        &config.target.namespace,
        &config.target.pod_prefix,
        container,
    )
    .await?;
    info!("resolved target: {target:?}");

    let (session, handle) = target.open_shell().await?;

    if cli.attach {
        attach(session, handle).await?;
        return Ok(true);
    }

    let mut driver = ShellDriver::new(session).with_step_timeout(config.timeouts.step());
    if let Some(session_timeout) = config.timeouts.session() {
        driver = driver.with_session_timeout(session_timeout);
    }

    let outcome = driver.run(&config.diagnostic_script()).await;
    drop(driver);
    handle.wait().await?;

    if outcome.is_success() {
        info!("probe {outcome}");
        Ok(true)
    } else {
        error!("probe {outcome}");
        Ok(false)
    }
}

/// Wire this process's stdin/stdout to the remote shell.
///
/// The no-expect case of the same session primitive: bytes pass through
/// untouched until the remote process exits or stdin closes.
async fn attach(mut session: ShellSession, handle: SessionHandle) -> anyhow::Result<()> {
    println!("Attached to remote shell; exit the shell to detach.");

    let mut stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut buf = [0u8; 1024];
    let mut stdin_open = true;

    loop {
        tokio::select! {
            chunk = session.recv() => match chunk {
                Some(bytes) => {
                    stdout.write_all(&bytes).await?;
                    stdout.flush().await?;
                }
                None => break,
            },
            read = stdin.read(&mut buf), if stdin_open => match read? {
                0 => {
                    stdin_open = false;
                    session.close_input().await?;
                }
                n => session.write(&buf[..n]).await?,
            },
        }
    }

    drop(session);
    handle.wait().await?;
    Ok(())
}
