use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use kdam::tqdm;

use super::constants::RUN_STATE_FILENAME;
use super::{
    parse_route, BatchCheckpoint, EdgeRecord, ResultWriter, RouteCollectionError, RouteFetcher,
    RouteOutcome, RunState, SampledRoutes,
};

#[derive(Debug, Clone)]
pub struct RouteCollectorConfig {
    /// routes per output artifact
    pub batch_size: usize,
    /// destination for batch artifacts and the run checkpoint
    pub output_directory: PathBuf,
}

impl RouteCollectorConfig {
    pub fn build<'a>(
        &self,
        fetcher: &'a dyn RouteFetcher,
        writer: &'a dyn ResultWriter,
    ) -> Result<RouteCollector<'a>, RouteCollectionError> {
        if self.batch_size == 0 {
            return Err(RouteCollectionError::InvalidUserInput(String::from(
                "batch size must be at least 1",
            )));
        }
        crate::util::fs::create_dirs(&self.output_directory)?;
        Ok(RouteCollector {
            batch_size: self.batch_size,
            run_state_path: self.output_directory.join(RUN_STATE_FILENAME),
            fetcher,
            writer,
        })
    }
}

/// totals for one `collect` call (a resumed run counts only what it
/// processed itself).
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub batches: usize,
    pub routes: usize,
    pub records: u64,
    pub failed_routes: usize,
    pub elapsed: Duration,
}

/// drives the request → parse → persist pipeline over fixed-size batches.
/// sole owner of [RunState]: no other component advances the counters.
pub struct RouteCollector<'a> {
    batch_size: usize,
    run_state_path: PathBuf,
    fetcher: &'a dyn RouteFetcher,
    writer: &'a dyn ResultWriter,
}

impl<'a> RouteCollector<'a> {
    pub fn run_state_path(&self) -> &Path {
        &self.run_state_path
    }

    /// process every remaining batch. per route: fetch, parse, classify.
    /// failures cost that route its records and nothing else; the run only
    /// aborts on write or checkpoint I/O errors. after each batch the
    /// artifact is written, the state persisted, and `on_checkpoint` called.
    pub fn collect<F>(
        &self,
        routes: &SampledRoutes,
        state: &mut RunState,
        mut on_checkpoint: F,
    ) -> Result<RunSummary, RouteCollectionError>
    where
        F: FnMut(&BatchCheckpoint),
    {
        let total = routes.len();
        let n_batches = total.div_ceil(self.batch_size);
        let first_batch = state.next_batch;
        if first_batch > n_batches {
            return Err(RouteCollectionError::RunStateError(format!(
                "checkpoint points at batch {first_batch} but only {n_batches} batches exist"
            )));
        }
        if first_batch > 0 {
            log::info!(
                "resuming at batch {first_batch} of {n_batches} (route {}, next id {})",
                state.route_index,
                state.id_counter
            );
        }

        let initial_ids = state.id_counter;
        let initial_failures = state.failed_routes.len();
        let run_start = Instant::now();

        for batch_index in first_batch..n_batches {
            let start = batch_index * self.batch_size;
            let end = ((batch_index + 1) * self.batch_size).min(total);
            let mut records: Vec<EdgeRecord> = Vec::new();
            let mut request_time = Duration::ZERO;

            let rows = tqdm!(
                start..end,
                total = end - start,
                desc = format!("batch {batch_index}")
            );
            for row in rows {
                let request_start = Instant::now();
                let fetched = self.fetcher.fetch_route(&routes.coordinates[row]);
                request_time += request_start.elapsed();

                let outcome = match fetched {
                    Ok(payload) => parse_route(payload, &routes.routes[row], state.id_counter),
                    Err(e) => RouteOutcome::from_fetch_error(e),
                };
                match outcome {
                    RouteOutcome::Collected(mut collected) => {
                        state.id_counter += collected.len() as u64;
                        records.append(&mut collected);
                    }
                    RouteOutcome::Transport(detail) => {
                        log::warn!("route {row} transport failure: {detail}");
                        state.failed_routes.push(row);
                    }
                    RouteOutcome::Upstream(status) => {
                        log::warn!("route {row} rejected upstream: HTTP {status}");
                        state.failed_routes.push(row);
                    }
                    RouteOutcome::Malformed(detail) => {
                        log::warn!("route {row} returned malformed payload: {detail}");
                        state.failed_routes.push(row);
                    }
                }
                state.route_index = row + 1;
            }
            eprintln!();

            self.writer.write_batch(batch_index, &records)?;
            state.next_batch = batch_index + 1;
            state.save(&self.run_state_path)?;

            let checkpoint = BatchCheckpoint {
                batch_index,
                routes: end - start,
                records: records.len(),
                request_time,
            };
            on_checkpoint(&checkpoint);
        }

        Ok(RunSummary {
            batches: n_batches - first_batch,
            routes: total - (first_batch * self.batch_size).min(total),
            records: state.id_counter - initial_ids,
            failed_routes: state.failed_routes.len() - initial_failures,
            elapsed: run_start.elapsed(),
        })
    }
}
