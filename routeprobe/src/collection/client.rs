use std::time::Duration;

use chrono::NaiveDateTime;
use geo::Point;
use itertools::Itertools;

use super::constants::DEPART_AT_FORMAT;
use super::RouteCollectionError;

/// why a single route request produced no payload. transport and upstream
/// failures stay distinguishable so callers can log, re-query, or escalate.
#[derive(thiserror::Error, Debug, Clone)]
pub enum FetchError {
    #[error("transport failure after {attempts} attempt(s): {detail}")]
    Transport { attempts: u32, detail: String },
    #[error("upstream rejected request with HTTP {status}")]
    Upstream { status: u16 },
    #[error("response body was not valid JSON: {0}")]
    Decode(String),
}

/// the driver's seam to the routing service: one waypoint chain in, one raw
/// JSON payload (or a classified failure) out.
pub trait RouteFetcher {
    fn fetch_route(&self, waypoints: &[Point<f64>]) -> Result<serde_json::Value, FetchError>;
}

#[derive(Debug, Clone)]
pub struct RouteClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub depart_at: NaiveDateTime,
    /// retry attempts after the first failed request, zero backoff between
    pub max_retries: u32,
    pub timeout: Duration,
}

impl RouteClientConfig {
    pub fn build(self) -> Result<RouteClient, RouteCollectionError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| RouteCollectionError::ClientBuildError(format!("{e}")))?;
        Ok(RouteClient {
            client,
            config: self,
        })
    }
}

/// blocking HTTP client for the routing API. one underlying connection pool
/// is built once and reused for every route in the run.
pub struct RouteClient {
    client: reqwest::blocking::Client,
    config: RouteClientConfig,
}

impl RouteClient {
    /// full request URL for a waypoint chain: `{base}{lat,lon:lat,lon:...}/json`
    pub fn route_url(&self, waypoints: &[Point<f64>]) -> String {
        format!("{}{}/json", self.config.base_url, waypoint_path(waypoints))
    }
}

impl RouteFetcher for RouteClient {
    fn fetch_route(&self, waypoints: &[Point<f64>]) -> Result<serde_json::Value, FetchError> {
        let url = self.route_url(waypoints);
        let depart_at = self.config.depart_at.format(DEPART_AT_FORMAT).to_string();
        let query = [
            ("key", self.config.api_key.as_str()),
            ("computeTravelTimeFor", "all"),
            ("departAt", depart_at.as_str()),
        ];

        let attempts = self.config.max_retries + 1;
        let mut last_error = FetchError::Transport {
            attempts: 0,
            detail: String::from("no request issued"),
        };
        for attempt in 1..=attempts {
            match self.client.get(&url).query(&query).send() {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response
                            .json::<serde_json::Value>()
                            .map_err(|e| FetchError::Decode(format!("{e}")));
                    }
                    last_error = FetchError::Upstream {
                        status: status.as_u16(),
                    };
                    if !retryable_status(status.as_u16()) {
                        return Err(last_error);
                    }
                }
                Err(e) => {
                    last_error = FetchError::Transport {
                        attempts: attempt,
                        detail: format!("{e}"),
                    };
                }
            }
            // no backoff between attempts
        }
        Err(last_error)
    }
}

/// rate limiting and server-side errors are worth another attempt; every
/// other non-200 status fails the route immediately.
fn retryable_status(status: u16) -> bool {
    status == 429 || (500..=599).contains(&status)
}

/// serialize a waypoint chain into the request path. stored points are
/// (longitude, latitude); the path wants `lat,lon` pairs, colon-separated.
pub fn waypoint_path(waypoints: &[Point<f64>]) -> String {
    waypoints
        .iter()
        .map(|p| format!("{},{}", p.y(), p.x()))
        .join(":")
}
