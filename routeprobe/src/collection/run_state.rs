use std::fs::File;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::RouteCollectionError;

/// counters threaded across batch boundaries, owned and mutated only by the
/// driver. persisted as JSON after every batch so an interrupted run can
/// continue from its first unwritten batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    /// global row currently being processed; advances once per route,
    /// success or failure
    pub route_index: usize,
    /// next edge record id; advances only on collected records, so ids are
    /// contiguous across the whole run
    pub id_counter: u64,
    /// first batch index that has not been written yet
    pub next_batch: usize,
    /// rows whose request or parse failed, candidates for a re-query run
    pub failed_routes: Vec<usize>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save(&self, path: &Path) -> Result<(), RouteCollectionError> {
        let file = File::create(path).map_err(|e| {
            RouteCollectionError::RunStateError(format!(
                "cannot create '{}': {e}",
                path.to_str().unwrap_or_default()
            ))
        })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| RouteCollectionError::RunStateError(format!("serialization failed: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self, RouteCollectionError> {
        let file = File::open(path).map_err(|e| {
            RouteCollectionError::RunStateError(format!(
                "cannot open '{}': {e}",
                path.to_str().unwrap_or_default()
            ))
        })?;
        serde_json::from_reader(file)
            .map_err(|e| RouteCollectionError::RunStateError(format!("deserialization failed: {e}")))
    }

    /// restore a checkpoint if one exists, otherwise start fresh.
    pub fn load_or_new(path: &Path) -> Result<Self, RouteCollectionError> {
        if path.is_file() {
            Self::load(path)
        } else {
            Ok(Self::new())
        }
    }
}

/// emitted through the driver's callback after each batch artifact is
/// written and the run state persisted.
#[derive(Debug, Clone)]
pub struct BatchCheckpoint {
    pub batch_index: usize,
    /// routes processed in this batch
    pub routes: usize,
    /// records written to this batch's artifact
    pub records: usize,
    /// wall time spent inside HTTP requests for this batch
    pub request_time: Duration,
}
