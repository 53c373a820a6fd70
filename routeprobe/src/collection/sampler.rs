use geo::Point;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{NodePool, RouteCollectionError};

/// all synthesized routes for one run: node id sequences and their resolved
/// coordinate rows, in matching order. row `i` of both fields describes the
/// same route.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledRoutes {
    pub routes: Vec<Vec<i64>>,
    pub coordinates: Vec<Vec<Point<f64>>>,
}

impl SampledRoutes {
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// draws route node sequences uniformly with replacement from a [NodePool],
/// seeded so that equal seed + pool + shape always reproduces equal output.
#[derive(Debug, Clone, Copy)]
pub struct RouteSampler {
    seed: u64,
}

impl RouteSampler {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn sample(
        &self,
        pool: &NodePool,
        n_routes: usize,
        waypoints_per_route: usize,
    ) -> Result<SampledRoutes, RouteCollectionError> {
        let ids = pool.ids();
        if ids.is_empty() {
            return Err(RouteCollectionError::SamplingError(String::from(
                "node pool is empty",
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut routes = Vec::with_capacity(n_routes);
        let mut coordinates = Vec::with_capacity(n_routes);
        for _ in 0..n_routes {
            let mut route = Vec::with_capacity(waypoints_per_route);
            let mut row = Vec::with_capacity(waypoints_per_route);
            for _ in 0..waypoints_per_route {
                let id = ids[rng.random_range(0..ids.len())];
                let point = pool.get(id).ok_or_else(|| {
                    RouteCollectionError::SamplingError(format!(
                        "sampled node {id} has no geometry"
                    ))
                })?;
                route.push(id);
                row.push(*point);
            }
            routes.push(route);
            coordinates.push(row);
        }

        Ok(SampledRoutes {
            routes,
            coordinates,
        })
    }
}
