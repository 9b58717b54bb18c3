//! Clients for the external road-routing and air-quality services.

pub mod air;
pub mod road;

pub use air::{AirQualityLookup, AirQualityProvider, AqiResult, OpenMeteoClient};
pub use road::{OsrmClient, RoadProvider, RoadRouteResult};
