#[derive(thiserror::Error, Debug)]
pub enum RouteCollectionError {
    #[error("invalid user input: {0}")]
    InvalidUserInput(String),
    #[error("failed to read input node table: {0}")]
    NodeTableError(String),
    #[error("failed while sampling routes: {0}")]
    SamplingError(String),
    #[error("failed to build HTTP client: {0}")]
    ClientBuildError(String),
    #[error("failed to write batch artifact: {0}")]
    BatchWriteError(String),
    #[error("failed to persist or restore run state: {0}")]
    RunStateError(String),
    #[error("internal error: {0}")]
    InternalError(String),
}
