//! hostprobe CLI
//!
//! Resolve hostspecs into backends and run commands or state checks
//! against every resolved target.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use hostprobe_checks::{File, Group, Package, Service, User};
use hostprobe_core::get_backends;
use hostprobe_exec::{Backend, BackendOptions};

#[derive(Parser)]
#[command(name = "hostprobe")]
#[command(about = "Run commands and state checks against local and remote hosts", long_about = None)]
struct Cli {
    /// Target hostspecs, e.g. `web01`, `ssh://admin@web01?sudo=true`,
    /// `docker://app`, `local://`. Defaults to the local machine.
    #[arg(long = "hosts", value_delimiter = ',')]
    hosts: Vec<String>,

    /// Wrap every command in sudo
    #[arg(long)]
    sudo: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the resolved backends without running anything
    Targets,

    /// Run a shell command on every target
    Run {
        /// Print full results as JSON
        #[arg(long)]
        json: bool,
        /// The command to run
        command: String,
    },

    /// Check host state on every target
    Check {
        #[command(subcommand)]
        check: Checks,
    },
}

#[derive(Subcommand)]
enum Checks {
    /// A unix group exists
    Group { name: String },
    /// A unix user exists
    User { name: String },
    /// A path exists
    File { path: String },
    /// A package is installed
    Package { name: String },
    /// A service is running
    Service { name: String },
}

fn label(backend: &Arc<dyn Backend>) -> String {
    match backend.target() {
        Some(target) => format!("{}://{}", backend.connection_type(), target),
        None => format!("{}://", backend.connection_type()),
    }
}

async fn run_command(
    backends: &[Arc<dyn Backend>],
    command: &str,
    json: bool,
) -> Result<bool> {
    // a raw CLI command is not a template, so a literal `%` stays `%`
    let command = command.replace('%', "%%");
    let mut all_ok = true;
    for backend in backends {
        let result = match backend.run(&command, &[]).await {
            Ok(result) => result,
            Err(e) => {
                warn!(target = %label(backend), error = %e, "command failed to execute");
                all_ok = false;
                continue;
            }
        };
        if json {
            println!("{}", serde_json::to_string(&result)?);
        } else {
            println!("=== {} (exit {})", label(backend), result.status);
            print!("{}", result.stdout);
            if !result.stderr.is_empty() {
                eprint!("{}", result.stderr);
            }
        }
        all_ok = all_ok && result.success();
    }
    Ok(all_ok)
}

async fn run_check(backends: &[Arc<dyn Backend>], check: &Checks) -> Result<bool> {
    let mut all_ok = true;
    for backend in backends {
        let ok = match check {
            Checks::Group { name } => Group::new(backend.clone(), name.as_str()).exists().await?,
            Checks::User { name } => User::new(backend.clone(), name.as_str()).exists().await?,
            Checks::File { path } => File::new(backend.clone(), path.as_str()).exists().await?,
            Checks::Package { name } => {
                Package::new(backend.clone(), name.as_str())
                    .is_installed()
                    .await?
            }
            Checks::Service { name } => {
                Service::new(backend.clone(), name.as_str())
                    .is_running()
                    .await?
            }
        };
        println!("{}: {}", label(backend), if ok { "ok" } else { "FAIL" });
        all_ok = all_ok && ok;
    }
    Ok(all_ok)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut defaults = BackendOptions::default();
    if cli.sudo {
        defaults = defaults.with_sudo();
    }

    // no hosts means the local machine
    let hosts = if cli.hosts.is_empty() {
        vec![String::new()]
    } else {
        cli.hosts.clone()
    };

    let backends = get_backends(&hosts, &defaults).await?;

    let ok = match &cli.command {
        Commands::Targets => {
            for backend in &backends {
                println!("{}", label(backend));
            }
            true
        }
        Commands::Run { json, command } => run_command(&backends, command, *json).await?,
        Commands::Check { check } => run_check(&backends, check).await?,
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
