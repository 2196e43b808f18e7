use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, Layer};

use flincli::cluster::ClusterClient;
use flincli::config::Config;
use flincli::deploy::{DeployParams, DeployRequest, DeployService, SavepointPolicy};
use flincli::output;
use flincli::DeployResult;

#[derive(Parser)]
#[command(name = "flincli")]
#[command(about = "Cli for flink jobs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all jobs
    List {
        /// Show all jobs, not only running ones
        #[arg(short, long)]
        all: bool,
    },

    /// Deploy a job jar
    Deploy {
        /// Job base name
        #[arg(short, long, value_name = "JOB_BASE_NAME")]
        name: String,

        /// Path of file to upload to Flink
        #[arg(short = 'f', long, value_name = "FILE_PATH")]
        jarfile: PathBuf,

        /// Parameters to run job, as key=value
        #[arg(short, long, value_name = "PARAMS")]
        params: Vec<String>,

        /// Job parallelism
        #[arg(long, value_name = "PARALLELISM")]
        parallelism: Option<u32>,

        /// Savepoint path for job
        #[arg(short, long, value_name = "SAVEPOINT_PATH")]
        savepoint: Option<String>,

        /// Entry class for job
        #[arg(short, long, value_name = "ENTRYCLASS")]
        entryclass: Option<String>,
    },

    /// Trigger a savepoint for job
    Savepoint {
        /// Job base name
        #[arg(short = 'n', long, value_name = "JOB_BASE_NAME")]
        job_base_name: String,

        /// Alternative savepoint path
        #[arg(short, long, value_name = "SAVEPOINT_PATH")]
        savepoint_path: Option<String>,
    },
}

/// Console logging on stderr; with a log directory, also daily rolling files
/// split by level (e.g. logs/flincli.log.2024-12-22, logs/error.log.2024-12-22).
fn init_logging(log_dir: Option<&Path>) -> Vec<WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let mut guards = Vec::new();
    let file_layers = log_dir.and_then(|dir| {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("Failed to create log directory {}: {}", dir.display(), e);
            return None;
        }

        let (info_file, info_guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "flincli.log"));
        let (error_file, error_guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "error.log"));
        guards.push(info_guard);
        guards.push(error_guard);

        let info_layer = tracing_subscriber::fmt::layer()
            .with_writer(info_file)
            .with_ansi(false)
            .with_filter(LevelFilter::INFO);

        let error_layer = tracing_subscriber::fmt::layer()
            .with_writer(error_file)
            .with_ansi(false)
            .with_filter(LevelFilter::ERROR);

        Some(info_layer.and_then(error_layer))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layers)
        .init();

    guards
}

async fn run(command: Commands, config: &Config) -> DeployResult<()> {
    // fails before any remote call when FLINK_BASE_URL is missing
    let client = ClusterClient::new(config)?;
    info!("Using Flink at {}", client.base_url());
    let service = DeployService::new(client, SavepointPolicy::from(config));

    match command {
        Commands::List { all } => {
            let jobs = if all {
                service.discovery().list_all().await?
            } else {
                service.discovery().list_running().await?
            };
            println!("{}", output::render_jobs(&jobs));
        }
        Commands::Deploy {
            name,
            jarfile,
            params,
            parallelism,
            savepoint,
            entryclass,
        } => {
            let params = DeployParams {
                program_args: params,
                savepoint_path: savepoint,
                entry_class: entryclass,
                parallelism,
            };
            let request = DeployRequest::new(name, jarfile, params);
            let outcome = service.deploy(request.clone()).await?;
            println!("{}", output::render_deploy(&request.name, &outcome));
        }
        Commands::Savepoint {
            job_base_name,
            savepoint_path,
        } => {
            let location = service
                .trigger_savepoint(&job_base_name, savepoint_path.as_deref())
                .await?;
            println!("Savepoint created: {}", location);
        }
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration from environment
    let config = Config::from_env();
    let _log_guards = init_logging(config.log_dir.as_deref());

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
