//! Core library for the `climate` CLI.
//!
//! This crate defines:
//! - The globe projection, drag momentum and globe widgets
//! - Location selection and the period-aware climate view
//! - Chart descriptors with AQI colour bands
//! - Clients for the dashboard backend and geocoders
//! - Configuration handling
//!
//! It is used by `climate-cli`, but the state machines carry no I/O and can be
//! driven by any host.

pub mod anomaly;
pub mod aqi;
pub mod chart;
pub mod config;
pub mod coordinator;
pub mod dashboard;
pub mod debounce;
pub mod error;
pub mod export;
pub mod forecast;
pub mod globe;
pub mod model;
pub mod momentum;
pub mod projection;
pub mod provider;
pub mod refresh;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use aqi::AqiBand;
pub use chart::{ChartDescriptor, ChartRenderer};
pub use config::Config;
pub use dashboard::{Dashboard, DashboardEvent, Services};
pub use error::{ClimateError, GeometryError};
pub use globe::{GlobePair, GlobeWidget};
pub use model::{ClimateDataPayload, Location, TimePeriod};
pub use momentum::{DragMomentum, MomentumParams};
pub use projection::{GeoPoint, ViewportGeometry, pixel_to_lat_lon};
pub use view::{ClimateRequest, ClimateResponse, ClimateView};
