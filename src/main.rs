use clap::{ArgAction, Parser, Subcommand};
use eyre::{Result, WrapErr};
use labmatch::checks::{check_reservation_consistency, ensure_capacity};
use labmatch::config::{Config, HistoryKind, SourceKind};
use labmatch::display::{
    display_anomalies, display_details, display_empty, display_stats, display_unassigned,
};
use labmatch::loaders::Loader;
use labmatch::recorder::RunRecord;
use labmatch::stores::{CsvStore, HistoryEntry, RunStore};
use labmatch::{Dataset, Engine, PersistenceError, Persisted, Recorder, RunId, Snapshot};
use std::path::PathBuf;
use tracing::{Level, info};

#[derive(Parser)]
#[command(author, version, about = "Assign students to laboratories")]
struct Args {
    /// Use FILE instead of labmatch.toml
    #[arg(short, long, value_name = "FILE", default_value = "labmatch.toml")]
    config: PathBuf,
    /// Do not record the run
    #[arg(short = 'n', long)]
    dry_run: bool,
    /// Set verbosity level
    #[arg(short, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Assign students and record the run (default)
    Run,
    /// Show the recorded runs for a student, newest first
    History { student: String },
}

enum History {
    Database(Loader),
    Csv(CsvStore),
}

impl RunStore for History {
    async fn append(&mut self, record: &RunRecord) -> Result<RunId, PersistenceError> {
        match self {
            History::Database(loader) => loader.append(record).await,
            History::Csv(store) => store.append(record).await,
        }
    }

    async fn history(&mut self, student_id: &str) -> Result<Vec<HistoryEntry>, PersistenceError> {
        match self {
            History::Database(loader) => loader.history(student_id).await,
            History::Csv(store) => store.history(student_id).await,
        }
    }
}

async fn load(config: &Config) -> Result<Dataset> {
    match config.source.kind {
        SourceKind::Database => Loader::new(&config.database_url()?).await?.load().await,
        SourceKind::File => Dataset::load(config.dataset_path()?),
    }
}

async fn open_history(config: &Config) -> Result<History> {
    Ok(match config.history.kind {
        HistoryKind::Database => History::Database(Loader::new(&config.database_url()?).await?),
        HistoryKind::Csv => History::Csv(CsvStore::new(config.history_path()?)),
    })
}

async fn run(config: &Config, dry_run: bool) -> Result<()> {
    let dataset = load(config).await?;
    let engine = Engine::new(config.matching.clone());
    let (snapshot, outcome, persisted) = if dry_run {
        let snapshot = Snapshot::new(dataset)?;
        let outcome = engine.run(&snapshot);
        (snapshot, outcome, None)
    } else {
        let mut store = open_history(config).await?;
        let report = engine.execute(dataset, &Recorder::new(), &mut store).await?;
        (report.snapshot, report.outcome, Some(report.persisted))
    };
    display_details(&snapshot, &outcome);
    display_stats(&snapshot, &outcome);
    display_unassigned(&snapshot, &outcome);
    display_empty(&outcome);
    display_anomalies(&outcome);
    if engine.config().special_admission {
        check_reservation_consistency(&snapshot, &outcome);
    }
    ensure_capacity(&outcome)?;
    match persisted {
        Some(Persisted::Recorded(id)) => println!("Recorded as batch {id}"),
        Some(Persisted::Unpersisted(e)) => return Err(e).wrap_err("run could not be recorded"),
        None => info!("dry run, nothing recorded"),
    }
    Ok(())
}

async fn history(config: &Config, student: &str) -> Result<()> {
    let entries = open_history(config)
        .await?
        .history(student)
        .await
        .wrap_err("cannot read matching history")?;
    if entries.is_empty() {
        println!("No recorded run for {student}");
    }
    for entry in entries {
        println!(
            "{} {} {} {}% {}",
            entry.batch_id,
            entry.executed_at.format("%Y-%m-%d %H:%M:%S"),
            entry.assigned_lab_id.as_deref().unwrap_or("unassigned"),
            entry.satisfaction,
            entry.summary
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    let level = match args.verbose {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();
    let config = Config::load(&args.config)?;
    match args.command.unwrap_or(Command::Run) {
        Command::Run => run(&config, args.dry_run).await,
        Command::History { student } => history(&config, &student).await,
    }
}
