//! Observable in-memory store of the located cities.
//!
//! Readers either poll [`CityStore::snapshot`] or hold a
//! [`watch::Receiver`] from [`CityStore::subscribe`] and are woken on every
//! update.

use super::types::LocatedCity;
use serde::Serialize;
use tokio::sync::watch;
use tracing::info;

/// Current upper-level and lower-level city.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CitySnapshot {
    pub upper: Option<LocatedCity>,
    pub city: Option<LocatedCity>,
}

pub struct CityStore {
    tx: watch::Sender<CitySnapshot>,
}

impl CityStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(CitySnapshot::default());
        Self { tx }
    }

    pub fn snapshot(&self) -> CitySnapshot {
        self.tx.borrow().clone()
    }

    pub fn upper_city(&self) -> Option<LocatedCity> {
        self.tx.borrow().upper.clone()
    }

    pub fn city(&self) -> Option<LocatedCity> {
        self.tx.borrow().city.clone()
    }

    pub fn update_upper_city(&self, city: LocatedCity) {
        info!("Upper city -> {} ({})", city.name, city.id);
        self.tx.send_modify(|snap| snap.upper = Some(city));
    }

    pub fn update_city(&self, city: LocatedCity) {
        info!("City -> {} ({})", city.name, city.id);
        self.tx.send_modify(|snap| snap.city = Some(city));
    }

    pub fn subscribe(&self) -> watch::Receiver<CitySnapshot> {
        self.tx.subscribe()
    }
}

impl Default for CityStore {
    fn default() -> Self {
        Self::new()
    }
}
