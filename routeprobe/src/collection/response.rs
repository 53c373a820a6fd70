use serde::Deserialize;

/// wire model of the routing API's calculateRoute response. unknown fields
/// are ignored; a payload without a `routes` key deserializes to an empty
/// route set, which downstream treats as "no routable path".
#[derive(Debug, Clone, Deserialize)]
pub struct RoutingResponse {
    #[serde(default)]
    pub routes: Vec<RouteAlternative>,
}

/// one logical route in the response. the API can in principle return
/// alternatives, but this pipeline requests exactly one origin/waypoint
/// chain per call and rejects multi-alternative payloads at parse time.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteAlternative {
    pub legs: Vec<RouteLeg>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteLeg {
    pub points: Vec<RoutePoint>,
    pub summary: LegSummary,
}

/// response points carry named latitude/longitude fields, the opposite order
/// from the `lat,lon` pairs serialized into the request path.
#[derive(Debug, Clone, Deserialize)]
pub struct RoutePoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegSummary {
    pub length_in_meters: i64,
    pub no_traffic_travel_time_in_seconds: i64,
    pub travel_time_in_seconds: i64,
    pub historic_traffic_travel_time_in_seconds: i64,
}
