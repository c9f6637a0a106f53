use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use matriz::cleanup;
use matriz::cnpj::Cnpj;
use matriz::jobs::{JobRegistry, JobReport, JobRunner};
use matriz::lookup::{client_from_config, HttpLookupClient, LookupClient};
use matriz::pipeline::EnrichmentPipeline;
use matriz::rows::{CsvRowStore, RowStore};
use matriz::Config;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// How often the enrich command polls its job for progress
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Enrich CNPJ spreadsheets with public registration data
#[derive(Parser)]
#[command(name = "matriz")]
#[command(about = "Batch CNPJ enrichment for CSV spreadsheets", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrich every row of a CSV and write the result as a new artifact
    Enrich {
        /// Input CSV with a `cnpj` column
        input: PathBuf,

        /// Directory for the enriched artifact (default: FILES_DIR)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Look up a single CNPJ and print the record as JSON
    Lookup {
        /// Identifier in any common format (digits, dots, slash, dash)
        cnpj: String,
    },
    /// Remove enriched artifacts past the retention window
    Sweep {
        /// Run one pass and exit instead of sweeping periodically
        #[arg(long)]
        once: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(cli.verbose >= 2)
        .init();

    debug!("matriz started with verbosity level: {}", cli.verbose);

    let result = match cli.command {
        Commands::Enrich { input, output_dir } => run_enrich(input, output_dir).await,
        Commands::Lookup { cnpj } => run_lookup(&cnpj).await,
        Commands::Sweep { once } => run_sweep(once).await,
    };

    if let Err(e) = result {
        error!("Fatal error: {}", e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run_enrich(input: PathBuf, output_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let mut config = Config::from_env();
    if let Some(dir) = output_dir {
        config.files_dir = dir;
    }

    let bytes = std::fs::metadata(&input)
        .with_context(|| format!("cannot read {}", input.display()))?
        .len();
    if bytes > config.max_upload_bytes() {
        bail!(
            "{} is {} bytes; the limit is {} MB",
            input.display(),
            bytes,
            config.max_file_size_mb
        );
    }

    let store: Arc<dyn RowStore> = Arc::new(CsvRowStore::new(&config.files_dir));
    let rows = store.load(&input).await?;
    let total = rows.len();
    info!("loaded {} rows from {}", total, input.display());

    let client = client_from_config(&config)?;
    let pipeline = Arc::new(EnrichmentPipeline::new(
        client,
        JobRegistry::new(),
        config.request_delay,
    ));
    let runner = JobRunner::new(pipeline, store, config.max_rows);

    let token = runner.submit(rows).await?;
    debug!("submitted job {}", token);

    let bar = create_progress_bar();
    bar.set_message(format!("{total} rows"));
    let report = loop {
        let report = runner.registry().status(&token).await;
        if let Some(progress) = report.progress() {
            bar.set_position(u64::from(progress));
        }
        if report.is_terminal() {
            break report;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    };

    match report {
        JobReport::Completed { file, .. } => {
            bar.finish_with_message("done");
            match file {
                Some(name) => println!("{}", config.files_dir.join(name).display()),
                None => println!("job {token} finished with no artifact"),
            }
            Ok(())
        }
        JobReport::Failed { error, .. } => {
            bar.abandon_with_message("failed");
            bail!(
                "enrichment failed: {}",
                error.as_deref().unwrap_or("unknown error")
            )
        }
        other => {
            bar.abandon();
            bail!("job {token} ended in unexpected state: {other:?}")
        }
    }
}

async fn run_lookup(raw: &str) -> anyhow::Result<()> {
    let config = Config::from_env();
    let cnpj =
        Cnpj::parse(raw).ok_or_else(|| anyhow!("'{raw}' contains no identifier digits"))?;
    debug!("looking up {}", cnpj);

    let client = HttpLookupClient::from_config(&config)?;
    match client.fetch(&cnpj).await? {
        Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
        None => println!("no record found for {cnpj}"),
    }
    Ok(())
}

async fn run_sweep(once: bool) -> anyhow::Result<()> {
    let config = Config::from_env();
    if once {
        let stats = cleanup::sweep_once(&config.files_dir, config.max_file_age).await?;
        println!(
            "swept {}: {} scanned, {} removed",
            config.files_dir.display(),
            stats.scanned,
            stats.removed
        );
        return Ok(());
    }
    cleanup::run_sweeper(config.files_dir, config.max_file_age).await;
    Ok(())
}

/// Create a percentage progress bar for a running job
fn create_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% ({eta}) {msg}")
            .unwrap()
            .progress_chars("█▓▒░ "),
    );
    pb
}
