use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};

use crate::collection::constants::{
    DEFAULT_BASE_URL, DEFAULT_DEPART_AT, DEPART_AT_FORMAT, MAX_ROUTES, MAX_WAYPOINTS,
};
use crate::collection::{
    GeoParquetWriter, NodePool, RouteClientConfig, RouteCollectionError, RouteCollectorConfig,
    RouteSampler, RunState,
};

/// Command line tool for batch collection of edge travel times and geometries
/// from the TomTom Routing API
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct ProbeApp {
    #[command(subcommand)]
    pub op: ProbeOperation,
}

#[derive(Debug, Clone, Subcommand)]
pub enum ProbeOperation {
    /// sample random routes over the input nodes and collect per-leg travel
    /// times into batched GeoParquet outputs
    Collect {
        /// input GeoParquet node table with `source` id and point `geometry` columns
        #[arg(long)]
        input: PathBuf,
        /// directory for batch artifacts and the run checkpoint
        #[arg(long)]
        output: PathBuf,
        /// number of routes to sample (at most 2400)
        #[arg(long)]
        routes: usize,
        /// waypoints per route (2 to 150)
        #[arg(long)]
        waypoints: usize,
        /// routes per output artifact
        #[arg(long)]
        batch_size: usize,
        /// routing API key, passed through as the `key` query parameter
        #[arg(long)]
        api_key: String,
        /// route sampling seed
        #[arg(long, default_value_t = 13081996)]
        seed: u64,
        /// departure time for every request (%Y-%m-%dT%H:%M:%S)
        #[arg(long, default_value = DEFAULT_DEPART_AT)]
        depart_at: String,
        /// routing endpoint prefix
        #[arg(long, default_value = DEFAULT_BASE_URL)]
        base_url: String,
        /// retry attempts after a failed request
        #[arg(long, default_value_t = 2)]
        max_retries: u32,
        /// per-request timeout in seconds
        #[arg(long, default_value_t = 60)]
        timeout: u64,
        /// continue an interrupted run from the checkpoint in the output directory
        #[arg(long)]
        resume: bool,
    },
}

impl ProbeOperation {
    pub fn run(self) -> Result<(), RouteCollectionError> {
        match self {
            ProbeOperation::Collect {
                input,
                output,
                routes,
                waypoints,
                batch_size,
                api_key,
                seed,
                depart_at,
                base_url,
                max_retries,
                timeout,
                resume,
            } => {
                if routes == 0 || routes > MAX_ROUTES {
                    return Err(RouteCollectionError::InvalidUserInput(format!(
                        "route count must be in 1..={MAX_ROUTES}, got {routes}"
                    )));
                }
                if waypoints < 2 || waypoints > MAX_WAYPOINTS {
                    return Err(RouteCollectionError::InvalidUserInput(format!(
                        "waypoints per route must be in 2..={MAX_WAYPOINTS}, got {waypoints}"
                    )));
                }
                let depart_at = NaiveDateTime::parse_from_str(&depart_at, DEPART_AT_FORMAT)
                    .map_err(|e| {
                        RouteCollectionError::InvalidUserInput(format!(
                            "departure time '{depart_at}' is not {DEPART_AT_FORMAT}: {e}"
                        ))
                    })?;

                log::info!("loading node pool from {}", input.display());
                let pool = NodePool::from_parquet(&input)?;
                log::info!("{} candidate nodes", pool.len());

                let sampled = RouteSampler::new(seed).sample(&pool, routes, waypoints)?;
                log::info!("sampled {routes} routes of {waypoints} waypoints (seed {seed})");

                let client = RouteClientConfig {
                    base_url,
                    api_key,
                    depart_at,
                    max_retries,
                    timeout: Duration::from_secs(timeout),
                }
                .build()?;
                let writer = GeoParquetWriter::new(&output);
                let collector = RouteCollectorConfig {
                    batch_size,
                    output_directory: output,
                }
                .build(&client, &writer)?;

                let mut state = if resume {
                    RunState::load_or_new(collector.run_state_path())?
                } else {
                    RunState::new()
                };

                let summary = collector.collect(&sampled, &mut state, |cp| {
                    log::info!(
                        "batch {}: {} routes, {} records, request time {:.2}s",
                        cp.batch_index,
                        cp.routes,
                        cp.records,
                        cp.request_time.as_secs_f64()
                    );
                })?;

                log::info!(
                    "collected {} records over {} batches in {:.2}s ({} of {} routes failed)",
                    summary.records,
                    summary.batches,
                    summary.elapsed.as_secs_f64(),
                    summary.failed_routes,
                    summary.routes
                );
                if !state.failed_routes.is_empty() {
                    log::warn!(
                        "failed route rows recorded in the checkpoint for re-query: {:?}",
                        state.failed_routes
                    );
                }
                Ok(())
            }
        }
    }
}
