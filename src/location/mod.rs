//! Location subsystem: reverse geocoding, the located-city store, and the
//! service that drives a device fix through the pipeline.

pub mod providers;
pub mod service;
pub mod store;
pub mod types;

pub use providers::{HttpGeocoder, ReverseGeocoder};
pub use service::LocationService;
pub use store::{CitySnapshot, CityStore};
pub use types::{LocatedCity, LocateOutcome, LocationError, Placemark, ServiceState};
