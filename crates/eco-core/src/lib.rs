//! Core logic for eco-aware road routing: geometry, candidate generation,
//! environmental metrics and composite scoring. No I/O lives here.

pub mod candidates;
pub mod geo;
pub mod instructions;
pub mod metrics;
pub mod models;
pub mod scoring;

pub use candidates::{build_candidates, dedupe_routes, estimated_routes, shape_hash};
pub use geo::{geohash, haversine_m, max_jump_m, polyline_length_m, resample_polyline};
pub use models::{
    CompareFastest, Coordinate, CoordinateError, EnrichedRoute, HealthRisk, Profile,
    ProfileWeights, RawRoute, RouteMetrics, RouteRole, RouteSource, RouteStep, RoutingMode,
    RoutingRequest, RoutingResponse, UnknownProfile,
};
pub use scoring::{build_response, rank_routes};
