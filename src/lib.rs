//! mars-locator — WGS-84 → GCJ-02 correction, reverse geocoding and city id
//! resolution for China-facing location features.

pub mod city;
pub mod config;
pub mod coord;
pub mod location;
pub mod logging;
pub mod server;
