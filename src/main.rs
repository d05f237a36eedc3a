use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use sparrow_lite::config::{
    DurationConfig, PolicyKind, SchedulerConfig, WorkerConfig, WorkerEndpoint,
    DEFAULT_WORKER_PORT,
};
use sparrow_lite::scheduler::{build_policy, Bimodal, Runner};
use sparrow_lite::stats::RunStats;
use sparrow_lite::transport::TcpTransport;
use sparrow_lite::worker::WorkerServer;

#[derive(Parser, Debug)]
#[command(name = "sparrow-lite")]
#[command(version)]
#[command(about = "Batch sampling vs. late binding over a pool of simulated workers")]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start a worker that simulates tasks
    Worker(WorkerArgs),

    /// Run a scheduling experiment against a pool of workers
    Schedule(ScheduleArgs),
}

// =============================================================================
// Worker Arguments
// =============================================================================

#[derive(Parser, Debug)]
struct WorkerArgs {
    /// Port to listen on
    #[arg(default_value_t = DEFAULT_WORKER_PORT)]
    port: u16,
}

// =============================================================================
// Schedule Arguments
// =============================================================================

#[derive(Parser, Debug)]
struct ScheduleArgs {
    /// Worker addresses (comma-separated, format: "host:port")
    /// Example: "10.96.1.135:9100,10.96.1.136:9100"
    #[arg(long)]
    workers: String,

    /// Dispatch policy
    #[arg(long, short = 'm', value_enum, default_value = "batch")]
    mode: PolicyKind,

    /// Number of jobs to run
    #[arg(long, default_value = "100")]
    jobs: usize,

    /// Tasks per job (batch sampling only)
    #[arg(long, default_value = "3")]
    tasks: usize,

    /// Address sent to workers as the origin of each ASSIGN
    #[arg(long, default_value = "127.0.0.1")]
    scheduler_addr: String,

    /// Duration of a light job in milliseconds
    #[arg(long, default_value = "30")]
    light_ms: u64,

    /// Duration of a heavy job in milliseconds
    #[arg(long, default_value = "400")]
    heavy_ms: u64,

    /// Fraction of jobs that are heavy
    #[arg(long, default_value = "0.1")]
    heavy_ratio: f64,

    /// Seed for the job duration mix
    #[arg(long)]
    seed: Option<u64>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table")]
    output: OutputFormat,
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

// =============================================================================
// Handlers
// =============================================================================

async fn run_worker(args: WorkerArgs) -> Result<(), Box<dyn std::error::Error>> {
    let server = WorkerServer::bind(&WorkerConfig::with_port(args.port)).await?;
    server.run().await?;
    Ok(())
}

async fn run_schedule(args: ScheduleArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = SchedulerConfig {
        workers: WorkerEndpoint::parse_list(&args.workers)?,
        policy: args.mode,
        jobs: args.jobs,
        tasks_per_job: args.tasks,
        scheduler_addr: args.scheduler_addr,
        durations: DurationConfig {
            light_ms: args.light_ms,
            heavy_ms: args.heavy_ms,
            heavy_ratio: args.heavy_ratio,
            seed: args.seed,
        },
    };
    config.validate()?;

    tracing::info!(
        workers = config.workers.len(),
        policy = %config.policy,
        jobs = config.jobs,
        "Scheduler configured"
    );

    let policy = build_policy(&config, Arc::new(TcpTransport::new()));
    let runner = Runner::new(policy, Bimodal::new(&config.durations));
    let stats = runner.run(config.jobs).await?;

    print_stats(&stats, &args.output)?;
    Ok(())
}

fn print_stats(stats: &RunStats, output: &OutputFormat) -> Result<(), serde_json::Error> {
    match output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(stats)?);
        }
        OutputFormat::Table => {
            println!();
            println!("=== {} results ({} jobs) ===", stats.policy.to_uppercase(), stats.jobs);
            println!("Avg wait time:     {:>10.2} ms", stats.avg_wait_ms);
            println!("Avg service time:  {:>10.2} ms", stats.avg_service_ms);
            println!("Avg response time: {:>10.2} ms", stats.avg_response_ms);
            println!("Avg RPCs per job:  {:>10.2}", stats.avg_rpcs_per_job);
            println!("Total RPCs:        {:>10}", stats.total_rpcs);
            println!("  PROBE:           {:>10}", stats.rpc_breakdown.probes);
            println!("  ASSIGN:          {:>10}", stats.rpc_breakdown.assigns);
            println!("  REQUEST:         {:>10}", stats.rpc_breakdown.requests);
            println!("  CANCEL:          {:>10}", stats.rpc_breakdown.cancels);
            if stats.failed_rpcs > 0 {
                println!("Failed RPCs:       {:>10}", stats.failed_rpcs);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match args.command {
        Commands::Worker(worker_args) => run_worker(worker_args).await?,
        Commands::Schedule(schedule_args) => run_schedule(schedule_args).await?,
    }

    Ok(())
}
