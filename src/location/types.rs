//! Core types for the location subsystem.

use crate::coord::GeoPoint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two administrative names a reverse-geocode yields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placemark {
    /// Province or municipality (e.g. "四川省", "北京市")
    pub upper_city: String,
    /// Prefecture-level city (e.g. "成都市")
    pub city: String,
}

/// A located city as published to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocatedCity {
    pub id: i32,
    pub name: String,
    /// True for the upper-level (province/municipality) entry.
    pub upper: bool,
    pub located_at: DateTime<Utc>,
}

impl LocatedCity {
    pub fn new(id: i32, name: impl Into<String>, upper: bool) -> Self {
        Self {
            id,
            name: name.into(),
            upper,
            located_at: Utc::now(),
        }
    }
}

/// Lifecycle of the location service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ServiceState {
    Idle,
    Listening,
    Stopped,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Listening => write!(f, "Listening"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

/// What a single location fix produced.
#[derive(Debug, Clone, Serialize)]
pub struct LocateOutcome {
    pub raw: GeoPoint,
    pub corrected: GeoPoint,
    /// Trimmed upper-level city name; empty when the geocoder had none.
    pub upper_city: String,
    /// Trimmed name of the city that was (or would have been) published.
    pub city: String,
    pub upper_updated: bool,
    pub city_updated: bool,
    /// Success message for a user-requested relocation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// Location pipeline errors.
#[derive(Debug)]
pub enum LocationError {
    Network(String),
    InvalidResponse(String),
    /// A fix arrived while the service was not listening.
    NotListening(ServiceState),
}

impl fmt::Display for LocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::InvalidResponse(msg) => write!(f, "Invalid geocoder response: {}", msg),
            Self::NotListening(state) => {
                write!(f, "Location service is not listening (state: {})", state)
            }
        }
    }
}

impl std::error::Error for LocationError {}
