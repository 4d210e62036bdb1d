//! Location service — runs one fix through the pipeline.
//!
//! Flow:  raw WGS-84 → GCJ-02 → reverse geocode → trim names → city ids → store
//!
//! The service listens for exactly one fix per `start()`; it is Stopped
//! after the fix whether the fix succeeded or not.

use super::providers::ReverseGeocoder;
use super::store::CityStore;
use super::types::{LocateOutcome, LocatedCity, LocationError, ServiceState};
use crate::city::{self, CityReferenceTable};
use crate::coord::{self, GeoPoint};
use std::sync::Arc;
use tracing::{info, warn};

pub struct LocationService {
    geocoder: Box<dyn ReverseGeocoder>,
    store: Arc<CityStore>,
    table: Arc<CityReferenceTable>,
    state: ServiceState,
    relocate: bool,
}

impl LocationService {
    pub fn new(
        geocoder: Box<dyn ReverseGeocoder>,
        store: Arc<CityStore>,
        table: Arc<CityReferenceTable>,
    ) -> Self {
        Self {
            geocoder,
            store,
            table,
            state: ServiceState::Idle,
            relocate: false,
        }
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    /// Begin listening for a fix. `relocate` marks a user-requested relocation,
    /// which adds a notice to the outcome.
    pub fn start(&mut self, relocate: bool) {
        self.relocate = relocate;
        if self.state != ServiceState::Listening {
            info!("Location service listening (relocate={})", relocate);
            self.state = ServiceState::Listening;
        }
    }

    pub fn stop(&mut self) {
        if self.state == ServiceState::Listening {
            info!("Location service stopped");
        }
        self.state = ServiceState::Stopped;
    }

    /// Handle a location fix. Ignored with [`LocationError::NotListening`]
    /// unless the service was started.
    pub fn on_location_changed(&mut self, raw: GeoPoint) -> Result<LocateOutcome, LocationError> {
        if self.state != ServiceState::Listening {
            return Err(LocationError::NotListening(self.state));
        }

        let result = self.locate(raw);
        if let Err(ref e) = result {
            warn!("定位失败，{}", e);
        }
        self.stop();
        result
    }

    fn locate(&self, raw: GeoPoint) -> Result<LocateOutcome, LocationError> {
        info!("Raw position: {}", raw);
        let corrected = coord::wgs84_to_gcj02(raw);
        info!("Corrected position: {}", corrected);

        let placemark = self.geocoder.reverse(corrected)?;

        let mut outcome = LocateOutcome {
            raw,
            corrected,
            upper_city: String::new(),
            city: String::new(),
            upper_updated: false,
            city_updated: false,
            notice: None,
        };

        if placemark.upper_city.trim().is_empty() {
            warn!("Geocoder returned no upper-level city for {}", corrected);
            return Ok(outcome);
        }

        let upper_name = city::trim_city(&placemark.upper_city).to_string();
        let diff_upper = self
            .store
            .upper_city()
            .map_or(true, |current| current.name != upper_name);
        if diff_upper {
            let id = city::resolve_id(&upper_name, &self.table);
            self.store
                .update_upper_city(LocatedCity::new(id, upper_name.as_str(), true));
            outcome.upper_updated = true;
        }

        // outside the municipalities and capitals, the lower-level city is the one shown
        let city_name = if city::is_capital(&upper_name) {
            upper_name.clone()
        } else {
            city::trim_city(&placemark.city).to_string()
        };
        info!("Located: {} / {}", placemark.upper_city, city_name);

        // the lower city is only refreshed when the upper city changed
        let diff_city = self
            .store
            .city()
            .map_or(true, |current| current.name != city_name);
        if diff_upper && diff_city {
            let id = city::resolve_id(&city_name, &self.table);
            self.store
                .update_city(LocatedCity::new(id, city_name.as_str(), false));
            outcome.city_updated = true;
        }

        if self.relocate {
            outcome.notice = Some(format!("定位成功：{}", city_name));
        }
        outcome.upper_city = upper_name;
        outcome.city = city_name;
        Ok(outcome)
    }
}
