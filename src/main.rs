use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dotenv::dotenv;
use serde::Serialize;

use jobctl::jobs::ExtraVarsInput;
use jobctl::{logging, ClientConfig, HttpTransport, JobError, JobResource, LaunchOptions, MonitorOptions};

/// Launch, follow and cancel jobs on a job-management server
#[derive(Parser, Debug)]
#[command(name = "jobctl")]
#[command(about = "Launch, monitor, inspect and cancel automation jobs")]
#[command(version)]
struct Cli {
    /// Server host (overrides JOBCTL_HOST)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Username for basic authentication (overrides JOBCTL_USERNAME)
    #[arg(long, global = true)]
    username: Option<String>,

    /// Password for basic authentication (overrides JOBCTL_PASSWORD)
    #[arg(long, global = true)]
    password: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    insecure: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Launch a job from a job template
    Launch {
        /// Job template id
        template_id: u64,

        /// Extra variables as inline text, or @FILE (@- for stdin)
        #[arg(long, value_name = "VALUE|@FILE")]
        extra_vars: Option<String>,

        /// Never open the editor for extra variables
        #[arg(long)]
        no_input: bool,

        /// Follow the job until it finishes
        #[arg(long)]
        monitor: bool,

        /// Give up monitoring after this many seconds
        #[arg(long, value_name = "SECONDS")]
        timeout: Option<f64>,
    },

    /// Show the status of a job
    Status {
        /// Job id
        job_id: u64,

        /// Show the full job record
        #[arg(long)]
        detail: bool,
    },

    /// Follow a job until it finishes
    Monitor {
        /// Job id
        job_id: u64,

        /// Initial seconds between status checks
        #[arg(long, default_value_t = 1.0, value_name = "SECONDS")]
        min_interval: f64,

        /// Maximum seconds between status checks
        #[arg(long, default_value_t = 5.0, value_name = "SECONDS")]
        max_interval: f64,

        /// Give up after this many seconds
        #[arg(long, value_name = "SECONDS")]
        timeout: Option<f64>,
    },

    /// Cancel a running job
    Cancel {
        /// Job id
        job_id: u64,

        /// Fail if the job is not running
        #[arg(long)]
        fail_if_not_running: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(cli.verbose) {
        eprintln!("{} {}", "Warning:".yellow().bold(), e);
    }

    if let Err(err) = run(cli).await {
        let code = err
            .downcast_ref::<JobError>()
            .map(JobError::exit_code)
            .unwrap_or(1);
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let transport = HttpTransport::new(&config).context("Failed to create HTTP client")?;
    let jobs = JobResource::new(Arc::new(transport));

    match cli.command {
        Commands::Launch {
            template_id,
            extra_vars,
            no_input,
            monitor,
            timeout,
        } => {
            let mut options = LaunchOptions::default()
                .with_no_input(no_input)
                .with_monitor(monitor, optional_seconds(timeout, "--timeout")?);
            if let Some(value) = extra_vars {
                options = options.with_extra_vars(ExtraVarsInput::from_cli_value(&value)?);
            }
            print_json(&jobs.launch(template_id, options).await?)
        }
        Commands::Status { job_id, detail } => print_json(&jobs.status(job_id, detail).await?),
        Commands::Monitor {
            job_id,
            min_interval,
            max_interval,
            timeout,
        } => {
            let options = MonitorOptions::default()
                .with_min_interval(seconds(min_interval, "--min-interval")?)
                .with_max_interval(seconds(max_interval, "--max-interval")?)
                .with_timeout(optional_seconds(timeout, "--timeout")?);
            print_json(&jobs.monitor(job_id, options).await?)
        }
        Commands::Cancel {
            job_id,
            fail_if_not_running,
        } => print_json(&jobs.cancel(job_id, fail_if_not_running).await?),
    }
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = ClientConfig::from_env().context("Failed to load configuration")?;

    if let Some(host) = &cli.host {
        config = config.with_host(host)?;
    }
    if let Some(username) = &cli.username {
        config.username = Some(username.clone());
    }
    if let Some(password) = &cli.password {
        config.password = Some(password.clone());
    }
    if cli.insecure {
        config.verify_ssl = false;
    }
    Ok(config)
}

fn seconds(value: f64, flag: &str) -> Result<Duration> {
    Duration::try_from_secs_f64(value).map_err(|_| {
        JobError::tool(format!("{} must be a non-negative number of seconds", flag)).into()
    })
}

fn optional_seconds(value: Option<f64>, flag: &str) -> Result<Option<Duration>> {
    value.map(|v| seconds(v, flag)).transpose()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render result")?;
    println!("{}", rendered);
    Ok(())
}
