/// default TomTom calculateRoute endpoint prefix. the waypoint chain and
/// `/json` suffix are appended per request.
pub const DEFAULT_BASE_URL: &str = "https://api.tomtom.com/routing/1/calculateRoute/";

/// default departure time sent as the `departAt` query parameter.
pub const DEFAULT_DEPART_AT: &str = "2024-07-30T03:30:00";

/// format of the `departAt` query parameter.
pub const DEPART_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// node identifier column expected in the input table.
pub const NODE_ID_COLUMN: &str = "source";

/// WKB point geometry column expected in the input table.
pub const GEOMETRY_COLUMN: &str = "geometry";

/// upstream per-run route ceiling.
pub const MAX_ROUTES: usize = 2400;

/// upstream per-request waypoint ceiling.
pub const MAX_WAYPOINTS: usize = 150;

/// filename of the persisted run checkpoint in the output directory.
pub const RUN_STATE_FILENAME: &str = "runstate.json";
