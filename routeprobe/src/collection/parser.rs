use geo::LineString;
use itertools::Itertools;

use super::{EdgeRecord, FetchError, RoutingResponse};

/// classification of a single route's processing. failures never escape the
/// route boundary; the driver records them and moves on.
#[derive(Debug, Clone)]
pub enum RouteOutcome {
    /// zero or more records. an empty vec means the service answered but
    /// found no routable path.
    Collected(Vec<EdgeRecord>),
    /// connection failure, timeout, or retry exhaustion
    Transport(String),
    /// final non-200 status from the service
    Upstream(u16),
    /// payload decoded but did not have the expected shape
    Malformed(String),
}

impl RouteOutcome {
    pub fn from_fetch_error(error: FetchError) -> Self {
        match error {
            FetchError::Transport { .. } => RouteOutcome::Transport(error.to_string()),
            FetchError::Upstream { status } => RouteOutcome::Upstream(status),
            FetchError::Decode(detail) => RouteOutcome::Malformed(detail),
        }
    }
}

/// turn one route's JSON payload into edge records. `route_nodes` is the
/// sampled node id sequence for this route; `next_id` is the run-wide id the
/// first record receives, with subsequent records numbered contiguously.
///
/// exactly one route alternative is required. with a single alternative the
/// leg-to-node mapping is unambiguous: leg `k` connects `route_nodes[k]` to
/// `route_nodes[k + 1]`. a multi-alternative payload fails the route instead
/// of guessing an offset policy.
pub fn parse_route(
    payload: serde_json::Value,
    route_nodes: &[i64],
    next_id: u64,
) -> RouteOutcome {
    let response: RoutingResponse = match serde_json::from_value(payload) {
        Ok(r) => r,
        Err(e) => return RouteOutcome::Malformed(format!("unexpected payload shape: {e}")),
    };

    if response.routes.is_empty() {
        return RouteOutcome::Collected(vec![]);
    }
    if response.routes.len() > 1 {
        return RouteOutcome::Malformed(format!(
            "expected one route alternative, got {}",
            response.routes.len()
        ));
    }

    let route = &response.routes[0];
    if route.legs.len() + 1 != route_nodes.len() {
        return RouteOutcome::Malformed(format!(
            "{} legs cannot chain {} waypoints",
            route.legs.len(),
            route_nodes.len()
        ));
    }

    let mut records = Vec::with_capacity(route.legs.len());
    let mut id = next_id;
    for ((source, target), leg) in route_nodes.iter().tuple_windows().zip(route.legs.iter()) {
        // response points are (latitude, longitude) by field name; records
        // store (longitude, latitude), matching the node table
        let geometry = LineString::from(
            leg.points
                .iter()
                .map(|p| (p.longitude, p.latitude))
                .collect::<Vec<_>>(),
        );
        records.push(EdgeRecord {
            id,
            source: *source,
            target: *target,
            length: leg.summary.length_in_meters,
            tt: leg.summary.no_traffic_travel_time_in_seconds,
            tt_traffic: leg.summary.travel_time_in_seconds,
            tt_historical: leg.summary.historic_traffic_travel_time_in_seconds,
            geometry,
        });
        id += 1;
    }
    RouteOutcome::Collected(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leg(length: i64, tt: i64, tt_traffic: i64, tt_historical: i64) -> serde_json::Value {
        json!({
            "points": [
                {"latitude": 39.73, "longitude": -105.25},
                {"latitude": 39.74, "longitude": -105.20},
                {"latitude": 39.75, "longitude": -105.15},
                {"latitude": 39.76, "longitude": -105.10},
            ],
            "summary": {
                "lengthInMeters": length,
                "noTrafficTravelTimeInSeconds": tt,
                "travelTimeInSeconds": tt_traffic,
                "historicTrafficTravelTimeInSeconds": tt_historical,
            }
        })
    }

    #[test]
    fn two_leg_response_chains_three_waypoints() {
        let payload = json!({"routes": [{"legs": [leg(1000, 60, 90, 80), leg(500, 30, 40, 35)]}]});
        let outcome = parse_route(payload, &[11, 22, 33], 5);
        let records = match outcome {
            RouteOutcome::Collected(r) => r,
            other => panic!("expected records, got {other:?}"),
        };
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.id, 5);
        assert_eq!((first.source, first.target), (11, 22));
        assert_eq!(first.length, 1000);
        assert_eq!(first.tt, 60);
        assert_eq!(first.tt_traffic, 90);
        assert_eq!(first.tt_historical, 80);
        let coords: Vec<(f64, f64)> = first.geometry.coords().map(|c| (c.x, c.y)).collect();
        assert_eq!(coords.len(), 4);
        // (longitude, latitude) order, swapped from the response fields
        assert_eq!(coords[0], (-105.25, 39.73));

        let second = &records[1];
        assert_eq!(second.id, 6);
        assert_eq!((second.source, second.target), (22, 33));
    }

    #[test]
    fn missing_routes_key_yields_no_records() {
        let outcome = parse_route(json!({"formatVersion": "0.0.12"}), &[1, 2], 0);
        match outcome {
            RouteOutcome::Collected(records) => assert!(records.is_empty()),
            other => panic!("expected empty collection, got {other:?}"),
        }
    }

    #[test]
    fn empty_routes_list_yields_no_records() {
        let outcome = parse_route(json!({"routes": []}), &[1, 2], 0);
        match outcome {
            RouteOutcome::Collected(records) => assert!(records.is_empty()),
            other => panic!("expected empty collection, got {other:?}"),
        }
    }

    #[test]
    fn multiple_alternatives_fail_the_route() {
        let payload = json!({"routes": [
            {"legs": [leg(1, 1, 1, 1)]},
            {"legs": [leg(2, 2, 2, 2)]},
        ]});
        let outcome = parse_route(payload, &[1, 2], 0);
        assert!(matches!(outcome, RouteOutcome::Malformed(_)));
    }

    #[test]
    fn leg_count_mismatch_fails_the_route() {
        let payload = json!({"routes": [{"legs": [leg(1, 1, 1, 1)]}]});
        let outcome = parse_route(payload, &[1, 2, 3], 0);
        assert!(matches!(outcome, RouteOutcome::Malformed(_)));
    }

    #[test]
    fn malformed_summary_fails_the_route() {
        let payload = json!({"routes": [{"legs": [{"points": [], "summary": {}}]}]});
        let outcome = parse_route(payload, &[1, 2], 0);
        assert!(matches!(outcome, RouteOutcome::Malformed(_)));
    }

    #[test]
    fn fetch_errors_map_to_their_outcome_class() {
        let transport = RouteOutcome::from_fetch_error(FetchError::Transport {
            attempts: 3,
            detail: String::from("connection refused"),
        });
        assert!(matches!(transport, RouteOutcome::Transport(_)));

        let upstream = RouteOutcome::from_fetch_error(FetchError::Upstream { status: 429 });
        assert!(matches!(upstream, RouteOutcome::Upstream(429)));

        let decode = RouteOutcome::from_fetch_error(FetchError::Decode(String::from("eof")));
        assert!(matches!(decode, RouteOutcome::Malformed(_)));
    }
}
