//! Array Capacity Inventory
//!
//! Runs one inventory pass: collects pool capacity from every array in the
//! inventory files, rolls it up per client, and publishes the result.

use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use array_capacity_inventory::domain::ports::{MetricsSink, MetricsSinkRef, SessionConnectorRef};
use array_capacity_inventory::logging::{self, LoggingConfig};
use array_capacity_inventory::{
    ArrayCollector, CapacityAggregator, CollectorConfig, Error, FixtureConnector, FleetCollector,
    InfluxConfig, InfluxSink, Inventory, InventorySource, MemorySink, Pipeline, Publisher,
    PublisherConfig, Result, SiteLayout, SshConfig, SshConnector, VendorRegistry,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Array Capacity Inventory - per-pool and per-client SAN capacity metrics
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Inventory file per vendor, as <vendor>=<path> (ibm, huawei, 3par, dell)
    #[arg(long, env = "INVENTORY", value_delimiter = ',', required = true)]
    inventory: Vec<InventorySource>,

    /// Login user on the array CLIs
    #[arg(long, env = "ARRAY_USERNAME")]
    username: Option<String>,

    /// Password on the array CLIs
    #[arg(long, env = "ARRAY_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Clients to report (default: every client in the inventory)
    #[arg(long, env = "CLIENTS", value_delimiter = ',')]
    client: Vec<String>,

    /// Named sites, in stretched pool matching order
    #[arg(long, env = "SITES", value_delimiter = ',', default_value = "P16,Z141")]
    site: Vec<String>,

    /// Site tag of stretched pools
    #[arg(long, env = "STRETCHED_SITE", default_value = "Stretched")]
    stretched_site: String,

    /// InfluxDB base URL
    #[arg(long, env = "INFLUX_URL", default_value = "http://localhost:8086")]
    influx_url: String,

    /// InfluxDB database
    #[arg(long, env = "INFLUX_DB", default_value = "capacity_metrics")]
    influx_db: String,

    /// Measurement for per-pool records
    #[arg(long, env = "POOL_MEASUREMENT", default_value = "pool_capacity")]
    pool_measurement: String,

    /// Measurement for per-client records
    #[arg(long, env = "CLIENT_MEASUREMENT", default_value = "client_capacity")]
    client_measurement: String,

    /// Arrays collected concurrently
    #[arg(long, env = "CONCURRENCY", default_value = "8")]
    concurrency: usize,

    /// Upper bound on one array's collection, in seconds
    #[arg(long, env = "ARRAY_TIMEOUT_SECS", default_value = "120")]
    array_timeout_secs: u64,

    /// SSH dial timeout, in seconds
    #[arg(long, env = "CONNECT_TIMEOUT_SECS", default_value = "10")]
    connect_timeout_secs: u64,

    /// Serve command output from <vendor>-pools.txt / <vendor>-firmware.txt
    /// in this directory instead of connecting to the arrays
    #[arg(long, env = "FIXTURES")]
    fixtures: Option<PathBuf>,

    /// Print line protocol to stdout instead of writing to InfluxDB
    #[arg(long, env = "DRY_RUN")]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,

    /// Directory of the daily diagnostic log
    #[arg(long, env = "LOG_DIR", default_value = "logs")]
    log_dir: PathBuf,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = logging::init_logging(&LoggingConfig {
        level: args.log_level.clone(),
        json: args.log_json,
        log_dir: Some(args.log_dir.clone()),
    })?;

    info!("Start");
    info!("  Version: {}", array_capacity_inventory::VERSION);
    info!("  Concurrency: {}", args.concurrency);
    info!("  Dry run: {}", args.dry_run);

    let result = run(&args).await;
    if let Err(e) = &result {
        error!(scope = ?e.scope(), "Run aborted: {}", e);
    }

    info!("Finish");
    result
}

async fn run(args: &Args) -> Result<()> {
    let inventory = Inventory::load(&args.inventory)?.filter_clients(&args.client);
    let clients = if args.client.is_empty() {
        inventory.clients()
    } else {
        args.client.clone()
    };
    info!("Inventory: {} arrays, clients {:?}", inventory.len(), clients);

    let registry = VendorRegistry::with_builtin_drivers();
    let connector = build_connector(args, &registry)?;

    let (sink, dry_run_sink) = build_sink(args)?;

    let collector = FleetCollector::new(
        CollectorConfig {
            concurrency: args.concurrency,
            array_timeout: Duration::from_secs(args.array_timeout_secs),
        },
        ArrayCollector::new(connector, registry),
    );
    let aggregator = CapacityAggregator::new(SiteLayout {
        sites: args.site.clone(),
        stretched_site: args.stretched_site.clone(),
        ..Default::default()
    });
    let publisher = Publisher::new(
        PublisherConfig {
            pool_measurement: args.pool_measurement.clone(),
            client_measurement: args.client_measurement.clone(),
        },
        sink,
    );
    let pipeline = Pipeline::new(collector, aggregator, publisher);

    let timestamp_ns = Utc::now()
        .timestamp_nanos_opt()
        .ok_or_else(|| Error::Internal("system clock outside the nanosecond range".into()))?;

    let report = pipeline.run(inventory.arrays(), &clients, timestamp_ns).await;

    if let Some(memory) = dry_run_sink {
        for line in memory.lines() {
            println!("{}", line);
        }
    }

    for failed in report.failed_arrays() {
        for issue in &failed.issues {
            warn!(array = %failed.array, "Not collected: {}", issue);
        }
    }
    if report.published.failed > 0 {
        warn!("{} records were not published", report.published.failed);
    }

    Ok(())
}

fn build_connector(args: &Args, registry: &VendorRegistry) -> Result<SessionConnectorRef> {
    if let Some(dir) = &args.fixtures {
        info!("Serving command output from fixtures in {}", dir.display());
        let connector: SessionConnectorRef = Arc::new(FixtureConnector::from_dir(dir, registry)?);
        return Ok(connector);
    }

    let username = args
        .username
        .clone()
        .ok_or_else(|| Error::Configuration("--username (ARRAY_USERNAME) is required".into()))?;
    let password = args
        .password
        .clone()
        .ok_or_else(|| Error::Configuration("--password (ARRAY_PASSWORD) is required".into()))?;

    let connector: SessionConnectorRef = Arc::new(SshConnector::new(SshConfig {
        username,
        password,
        connect_timeout: Duration::from_secs(args.connect_timeout_secs),
        ..Default::default()
    }));
    Ok(connector)
}

fn build_sink(args: &Args) -> Result<(MetricsSinkRef, Option<Arc<MemorySink>>)> {
    if args.dry_run {
        let memory = Arc::new(MemorySink::new());
        let sink: MetricsSinkRef = memory.clone();
        return Ok((sink, Some(memory)));
    }

    let sink = InfluxSink::new(&InfluxConfig {
        url: args.influx_url.clone(),
        database: args.influx_db.clone(),
        ..Default::default()
    })?;
    info!("Publishing to {}", sink.endpoint());
    let sink: MetricsSinkRef = Arc::new(sink);
    Ok((sink, None))
}
