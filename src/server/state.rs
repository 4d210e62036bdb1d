use crate::city::CityReferenceTable;
use crate::location::{CityStore, LocationService};
use std::sync::{Arc, Mutex};

pub struct AppState {
    pub service: Mutex<LocationService>,
    pub store: Arc<CityStore>,
    pub table: Arc<CityReferenceTable>,
}
