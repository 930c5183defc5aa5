use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use hoops_client::{ReqwestFetcher, TableExtractor};
use hoops_core::models::{RecordKind, SEASONS, StoredSalary};
use hoops_core::{
    AppError, IngestReport, IngestService, NullStore, PersistPipeline, PipelineConfig,
    RecordStore, RetryPolicy, RetryingStore, SalarySource, TracingPipelineReporter,
};
use hoops_db::{Database, DatabaseConfig};

#[derive(Parser)]
#[command(name = "hoops", version, about = "NBA salary scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape salary tables and store every row
    Scrape {
        /// Which tables to scrape
        #[arg(short, long, value_enum, default_value_t = KindArg::All)]
        kind: KindArg,

        /// Maximum number of concurrent inserts
        #[arg(short, long, env = "HOOPS_CONCURRENCY", default_value_t = 10)]
        concurrency: usize,

        /// Timeout for a single insert, in seconds
        #[arg(long, env = "HOOPS_ITEM_TIMEOUT_SECS", default_value_t = 10)]
        item_timeout_secs: u64,

        /// Deadline for the whole run, in seconds (0 disables it)
        #[arg(long, env = "HOOPS_RUN_TIMEOUT_SECS", default_value_t = 300)]
        run_timeout_secs: u64,

        /// Extra attempts for transient insert failures
        #[arg(long, default_value_t = 0)]
        retries: u32,

        /// Empty the target tables before inserting
        #[arg(long, default_value_t = false)]
        fresh: bool,

        /// Scrape and extract without touching the database
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Print the run reports as JSON
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Exit with a non-zero status if any record failed
        #[arg(long, default_value_t = false)]
        fail_on_error: bool,
    },

    /// Show stored salary rows
    List {
        /// Which table to read
        #[arg(short, long)]
        kind: RecordKind,

        /// Number of rows to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Delete every stored row of the given tables
    Reset {
        #[arg(short, long, value_enum)]
        kind: KindArg,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KindArg {
    Player,
    Team,
    All,
}

impl KindArg {
    /// Kinds in processing order: players before teams.
    fn kinds(self) -> Vec<RecordKind> {
        match self {
            KindArg::Player => vec![RecordKind::Player],
            KindArg::Team => vec![RecordKind::Team],
            KindArg::All => RecordKind::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Csv,
    Json,
}

struct ScrapeArgs {
    kinds: Vec<RecordKind>,
    pipeline: PipelineConfig,
    run_timeout: Option<Duration>,
    retries: u32,
    fresh: bool,
    dry_run: bool,
    json: bool,
    fail_on_error: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Setup tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("hoops=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scrape {
            kind,
            concurrency,
            item_timeout_secs,
            run_timeout_secs,
            retries,
            fresh,
            dry_run,
            json,
            fail_on_error,
        } => {
            let args = ScrapeArgs {
                kinds: kind.kinds(),
                pipeline: PipelineConfig::new(concurrency, Duration::from_secs(item_timeout_secs)),
                run_timeout: (run_timeout_secs > 0).then(|| Duration::from_secs(run_timeout_secs)),
                retries,
                fresh,
                dry_run,
                json,
                fail_on_error,
            };
            cmd_scrape(args).await?;
        }
        Commands::List {
            kind,
            limit,
            format,
        } => {
            let db = connect_db().await?;
            cmd_list(&db, kind, limit, format).await?;
        }
        Commands::Reset { kind } => {
            let db = connect_db().await?;
            for kind in kind.kinds() {
                let removed = db.reset(kind).await?;
                println!("Cleared {} ({removed} rows)", kind.table_name());
            }
        }
    }

    Ok(())
}

/// Connect to PostgreSQL and apply pending migrations.
async fn connect_db() -> Result<Database> {
    let config = DatabaseConfig::from_env()?;
    let db = Database::connect(&config)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await?;
    tracing::info!(max_connections = config.max_connections, "Connected to PostgreSQL");
    Ok(db)
}

async fn cmd_scrape(args: ScrapeArgs) -> Result<()> {
    // Reject bad limits before any network or database work
    args.pipeline.validate()?;

    let cancel = CancellationToken::new();
    spawn_cancel_triggers(&cancel, args.run_timeout);

    let fetcher = ReqwestFetcher::new().context("Failed to create HTTP client")?;

    let reports = if args.dry_run {
        tracing::info!("Dry run: records will not be stored");
        scrape_kinds(&args, &fetcher, &cancel, |_| NullStore).await?
    } else {
        let db = connect_db().await?;
        if args.fresh {
            for kind in &args.kinds {
                db.reset(*kind).await?;
            }
        }
        scrape_kinds(&args, &fetcher, &cancel, |kind| db.salary_repo(kind)).await?
    };

    // Stop the signal and deadline watchers
    cancel.cancel();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_report(report);
        }
    }

    let failed: usize = reports.iter().map(|r| r.summary.failed).sum();
    if args.fail_on_error && failed > 0 {
        anyhow::bail!("{failed} record(s) failed to persist");
    }

    Ok(())
}

/// Run every requested kind in order with one shared token.
///
/// A cancelled ingest stops the remaining kinds; the reports gathered so far are kept.
async fn scrape_kinds<S, F>(
    args: &ScrapeArgs,
    fetcher: &ReqwestFetcher,
    cancel: &CancellationToken,
    store_for: F,
) -> Result<Vec<IngestReport>>
where
    S: RecordStore,
    F: Fn(RecordKind) -> S,
{
    let policy = RetryPolicy::new(args.retries.saturating_add(1));
    let mut reports = Vec::with_capacity(args.kinds.len());

    for &kind in &args.kinds {
        let source = SalarySource::for_kind(kind);
        let extractor = TableExtractor::new(&source.layout)?;
        let store = RetryingStore::new(store_for(kind), policy.clone());
        let pipeline = PersistPipeline::new(store, args.pipeline.clone())?;
        let service = IngestService::new(kind, fetcher.clone(), extractor, pipeline);

        match service
            .ingest(&source.url, cancel, &TracingPipelineReporter)
            .await
        {
            Ok(report) => reports.push(report),
            Err(AppError::Cancelled) => {
                tracing::warn!(%kind, "Run cancelled before scraping finished");
                break;
            }
            Err(e) => return Err(e.into()),
        }

        if cancel.is_cancelled() {
            tracing::warn!("Run cancelled; skipping remaining tables");
            break;
        }
    }

    Ok(reports)
}

/// Cancel the run on Ctrl-C or when the optional deadline passes.
fn spawn_cancel_triggers(cancel: &CancellationToken, run_timeout: Option<Duration>) {
    let token = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            () = token.cancelled() => {}
            signal = tokio::signal::ctrl_c() => {
                if signal.is_ok() {
                    tracing::warn!("Interrupted, cancelling in-flight inserts");
                    token.cancel();
                }
            }
        }
    });

    if let Some(deadline) = run_timeout {
        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {}
                () = tokio::time::sleep(deadline) => {
                    tracing::warn!(secs = deadline.as_secs(), "Run deadline reached, cancelling");
                    token.cancel();
                }
            }
        });
    }
}

fn print_report(report: &IngestReport) {
    println!("{} salaries ({}):", report.kind, report.url);
    println!("{}\n", report.summary);
}

async fn cmd_list(db: &Database, kind: RecordKind, limit: usize, format: OutputFormat) -> Result<()> {
    let rows = db.salary_repo(kind).list(limit).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Csv => write_csv(&rows)?,
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("No rows stored in {}", kind.table_name());
                return Ok(());
            }
            print_table(&rows);
            println!("\nTotal: {} rows", rows.len());
        }
    }

    Ok(())
}

fn write_csv(rows: &[StoredSalary]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    writer.write_record(header())?;
    for row in rows {
        writer.write_record(cells(row))?;
    }
    writer.flush()?;
    Ok(())
}

fn print_table(rows: &[StoredSalary]) {
    let header = header();
    let body: Vec<Vec<String>> = rows.iter().map(cells).collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|col| {
            body.iter()
                .map(|r| r[col].len())
                .chain(std::iter::once(header[col].len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let render = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("{}", render(header.as_slice()));
    for row in &body {
        println!("{}", render(row.as_slice()));
    }
}

fn header() -> Vec<String> {
    ["id", "name"]
        .into_iter()
        .map(String::from)
        .chain(SEASONS.iter().map(|s| format!("salary{s}")))
        .collect()
}

fn cells(row: &StoredSalary) -> Vec<String> {
    [row.id.to_string(), row.name.clone()]
        .into_iter()
        .chain(row.amounts.iter().map(|a| a.clone().unwrap_or_default()))
        .collect()
}
