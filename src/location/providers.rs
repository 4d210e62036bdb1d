//! Reverse-geocoding providers.

use super::types::{LocationError, Placemark};
use crate::config::GeocoderConfig;
use crate::coord::GeoPoint;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Turns a GCJ-02 point into administrative names.
pub trait ReverseGeocoder: Send + Sync {
    fn reverse(&self, point: GeoPoint) -> Result<Placemark, LocationError>;
}

// ─── Regeocoding HTTP provider ──────────────────────────────────

#[derive(Deserialize, Debug)]
struct RegeocodeResponse {
    #[serde(default, rename = "addrList")]
    addr_list: Vec<RegeocodeAddress>,
}

#[derive(Deserialize, Debug)]
struct RegeocodeAddress {
    /// "province,city,district," — trailing comma included
    #[serde(default, rename = "admName")]
    adm_name: Option<String>,
}

/// Blocking HTTP geocoder speaking the `regeocoding?l=lat,lng&type=010` API.
pub struct HttpGeocoder {
    endpoint: String,
    user_agent: String,
    timeout: Duration,
}

impl HttpGeocoder {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::from_config(&GeocoderConfig {
            endpoint: endpoint.into(),
            ..GeocoderConfig::default()
        })
    }

    pub fn from_config(config: &GeocoderConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            user_agent: config.user_agent.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

impl ReverseGeocoder for HttpGeocoder {
    fn reverse(&self, point: GeoPoint) -> Result<Placemark, LocationError> {
        debug!("GET {}?l={}&type=010", self.endpoint, point);

        let response = ureq::get(&self.endpoint)
            .set("User-Agent", &self.user_agent)
            .query("l", &point.to_string())
            .query("type", "010")
            .timeout(self.timeout)
            .call()
            .map_err(|e| LocationError::Network(e.to_string()))?;

        let body: serde_json::Value = response
            .into_json()
            .map_err(|e| LocationError::InvalidResponse(e.to_string()))?;

        parse_placemark(body)
    }
}

/// Extract upper city and city from a regeocoding JSON body.
pub fn parse_placemark(body: serde_json::Value) -> Result<Placemark, LocationError> {
    let response: RegeocodeResponse = serde_json::from_value(body)
        .map_err(|e| LocationError::InvalidResponse(e.to_string()))?;

    let adm_name = response
        .addr_list
        .into_iter()
        .find_map(|addr| addr.adm_name.filter(|name| !name.trim().is_empty()))
        .ok_or_else(|| LocationError::InvalidResponse("no admName in addrList".into()))?;

    let mut parts = adm_name.split(',').map(str::trim).filter(|p| !p.is_empty());
    let upper_city = parts.next().unwrap_or_default().to_string();
    let city = parts.next().map(str::to_string).unwrap_or_else(|| upper_city.clone());

    Ok(Placemark { upper_city, city })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_municipality() {
        let body = json!({
            "queryLocation": [39.938133, 116.395739],
            "addrList": [{
                "type": "doorPlc",
                "status": 1,
                "name": "西城区",
                "admCode": "110102",
                "admName": "北京市,北京市,西城区,",
                "nearestPoint": [116.39568, 39.93814],
                "distance": 1.5
            }]
        });
        let placemark = parse_placemark(body).unwrap();
        assert_eq!(placemark.upper_city, "北京市");
        assert_eq!(placemark.city, "北京市");
    }

    #[test]
    fn test_parse_province() {
        let body = json!({
            "addrList": [{ "admName": "四川省,成都市,武侯区," }]
        });
        let placemark = parse_placemark(body).unwrap();
        assert_eq!(placemark.upper_city, "四川省");
        assert_eq!(placemark.city, "成都市");
    }

    #[test]
    fn test_parse_single_component() {
        let body = json!({ "addrList": [{ "admName": "香港特别行政区," }] });
        let placemark = parse_placemark(body).unwrap();
        assert_eq!(placemark.upper_city, "香港特别行政区");
        assert_eq!(placemark.city, "香港特别行政区");
    }

    #[test]
    fn test_parse_skips_empty_entries() {
        let body = json!({
            "addrList": [{ "admName": "" }, { "admName": "广东省,深圳市,南山区," }]
        });
        assert_eq!(parse_placemark(body).unwrap().city, "深圳市");
    }

    #[test]
    fn test_parse_empty_list() {
        let body = json!({ "addrList": [] });
        assert!(matches!(parse_placemark(body), Err(LocationError::InvalidResponse(_))));
    }

    #[test]
    fn test_parse_wrong_shape() {
        let body = json!({ "addrList": "nope" });
        assert!(matches!(parse_placemark(body), Err(LocationError::InvalidResponse(_))));
    }

    #[test]
    fn test_unreachable_endpoint() {
        let geocoder = HttpGeocoder::new("http://127.0.0.1:9/regeocoding");
        let result = geocoder.reverse(GeoPoint::new(39.9, 116.4));
        assert!(matches!(result, Err(LocationError::Network(_))));
    }
}
