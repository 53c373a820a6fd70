use geo::LineString;

/// one collected leg of a successfully answered route. `id` is unique and
/// contiguous across the entire run, not per batch.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRecord {
    pub id: u64,
    pub source: i64,
    pub target: i64,
    /// leg length in meters
    pub length: i64,
    /// free-flow travel time in seconds
    pub tt: i64,
    /// travel time with live traffic in seconds
    pub tt_traffic: i64,
    /// travel time from historical traffic in seconds
    pub tt_historical: i64,
    /// leg polyline in (longitude, latitude) order
    pub geometry: LineString<f64>,
}
