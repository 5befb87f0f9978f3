use clap::Parser;
use miette::{IntoDiagnostic, Result};
use payout_engine::application::batch::BatchOrchestrator;
use payout_engine::config::SettlementConfig;
use payout_engine::domain::ports::SettlementPorts;
use payout_engine::infrastructure::alerts::RecordingAlertSink;
use payout_engine::infrastructure::clock::SystemClock;
use payout_engine::infrastructure::in_memory::{InMemoryLedger, InMemoryTripService};
use payout_engine::infrastructure::processor::MockProcessorGateway;
use payout_engine::interfaces::csv::account_writer::HostAccountWriter;
use payout_engine::interfaces::fixture::Fixture;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON fixture describing accounts, payouts, fees, trips, disputes,
    /// and scripted processor outcomes
    fixture: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[cfg(feature = "storage-rocksdb")]
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Upper bound on hosts settled concurrently
    #[arg(long, default_value_t = 4)]
    parallel_hosts: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let file = File::open(&cli.fixture).into_diagnostic()?;
    let fixture = Fixture::from_reader(file).into_diagnostic()?;

    let trips = InMemoryTripService::new();
    let processor = MockProcessorGateway::new();
    let alerts = RecordingAlertSink::new();
    fixture.seed_collaborators(&trips, &processor).await;

    let config = SettlementConfig {
        max_concurrent_hosts: cli.parallel_hosts,
        ..SettlementConfig::default()
    };

    #[cfg(feature = "storage-rocksdb")]
    if let Some(db_path) = &cli.db_path {
        let ledger =
            payout_engine::infrastructure::rocksdb::RocksDbLedger::open(db_path).into_diagnostic()?;
        return run_batch(ledger, fixture, trips, processor, alerts, config).await;
    }

    run_batch(InMemoryLedger::new(), fixture, trips, processor, alerts, config).await
}

async fn run_batch<L>(
    ledger: L,
    fixture: Fixture,
    trips: InMemoryTripService,
    processor: MockProcessorGateway,
    alerts: RecordingAlertSink,
    config: SettlementConfig,
) -> Result<()>
where
    L: payout_engine::domain::ports::PayoutStore
        + payout_engine::domain::ports::HostAccountStore
        + payout_engine::domain::ports::FeeObligationStore
        + payout_engine::domain::ports::SettlementUnitOfWork
        + 'static,
{
    let ledger = Arc::new(ledger);
    fixture
        .seed_ledger(ledger.as_ref(), ledger.as_ref(), ledger.as_ref())
        .await
        .into_diagnostic()?;

    let ports = SettlementPorts {
        payouts: ledger.clone(),
        accounts: ledger.clone(),
        fees: ledger.clone(),
        trips: Arc::new(trips),
        gateway: Arc::new(processor),
        unit_of_work: ledger.clone(),
        alerts: Arc::new(alerts.clone()),
        clock: Arc::new(SystemClock),
    };

    let orchestrator = BatchOrchestrator::new(ports.clone(), config);
    let report = orchestrator.run().await.into_diagnostic()?;

    let soft = report.failures.iter().filter(|f| f.is_soft()).count();
    let hard = report.failures.len() - soft;
    println!(
        "processed {} payouts totalling {}; {} deferred, {} failed",
        report.processed, report.total_amount, soft, hard
    );
    for alert in alerts.events().await {
        eprintln!(
            "ALERT host={} amount={} attempts={} error={}",
            alert.host,
            alert.amount.value(),
            alert.attempts,
            alert.error
        );
    }

    let accounts = ports.accounts.all().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = HostAccountWriter::new(stdout.lock());
    writer.write_accounts(accounts).into_diagnostic()?;

    Ok(())
}
