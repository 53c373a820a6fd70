mod client;
mod driver;
mod error;
mod node_pool;
mod parser;
mod record;
mod response;
mod run_state;
mod sampler;
mod writer;

pub mod constants;

pub use client::{FetchError, RouteClient, RouteClientConfig, RouteFetcher};
pub use driver::{RouteCollector, RouteCollectorConfig, RunSummary};
pub use error::RouteCollectionError;
pub use node_pool::NodePool;
pub use parser::{parse_route, RouteOutcome};
pub use record::EdgeRecord;
pub use response::{LegSummary, RouteAlternative, RouteLeg, RoutePoint, RoutingResponse};
pub use run_state::{BatchCheckpoint, RunState};
pub use sampler::{RouteSampler, SampledRoutes};
pub use writer::{GeoParquetWriter, ResultWriter};
