use chrono::Utc;
use serde::Deserialize;

use crate::foundation::core::{AddressResult, GeoFix};
use crate::foundation::error::{GeoCamError, GeoCamResult};

/// Latest position, read fresh at every render.
pub trait LocationProvider {
    fn current_fix(&self) -> Option<GeoFix>;
}

/// Latest reverse-geocoded address, read fresh at every render.
pub trait AddressProvider {
    fn current_address(&self) -> Option<AddressResult>;
}

impl LocationProvider for Option<GeoFix> {
    fn current_fix(&self) -> Option<GeoFix> {
        *self
    }
}

impl LocationProvider for tokio::sync::watch::Receiver<Option<GeoFix>> {
    fn current_fix(&self) -> Option<GeoFix> {
        *self.borrow()
    }
}

impl AddressProvider for Option<AddressResult> {
    fn current_address(&self) -> Option<AddressResult> {
        self.clone()
    }
}

impl AddressProvider for tokio::sync::watch::Receiver<Option<AddressResult>> {
    fn current_address(&self) -> Option<AddressResult> {
        self.borrow().clone()
    }
}

/// Public OpenStreetMap reverse geocoder.
pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

/// Reverse geocoding against a Nominatim-compatible endpoint.
/// Reverse geocoding through a Nominatim `/reverse` endpoint.
#[derive(Clone, Debug)]
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
    error: Option<String>,
}

impl NominatimGeocoder {
    pub fn new(base_url: &str, user_agent: &str) -> GeoCamResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| GeoCamError::network(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn reverse_url(&self, fix: &GeoFix) -> String {
        format!(
            "{}/reverse?format=json&lat={}&lon={}&zoom=18&addressdetails=1",
            self.base_url, fix.latitude, fix.longitude
        )
    }

    pub async fn reverse(&self, fix: &GeoFix) -> GeoCamResult<AddressResult> {
        let url = self.reverse_url(fix);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| GeoCamError::network(format!("GET {url}: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(GeoCamError::network(format!("GET {url}: http {status}")));
        }
        let body = resp
            .bytes()
            .await
            .map_err(|e| GeoCamError::network(format!("GET {url}: read body: {e}")))?;
        parse_reverse_response(&body)
    }

    /// [`NominatimGeocoder::reverse`], logging failures and yielding `None`.
    pub async fn lookup(&self, fix: &GeoFix) -> Option<AddressResult> {
        match self.reverse(fix).await {
            Ok(addr) => Some(addr),
            Err(err) => {
                tracing::warn!(error = %err, "reverse geocoding failed");
                None
            }
        }
    }
}

/// Extract `display_name` from a `/reverse?format=json` body.
pub fn parse_reverse_response(body: &[u8]) -> GeoCamResult<AddressResult> {
    let parsed: ReverseResponse = serde_json::from_slice(body)
        .map_err(|e| GeoCamError::serde(format!("reverse geocode json: {e}")))?;
    if let Some(err) = parsed.error {
        return Err(GeoCamError::network(format!("reverse geocode: {err}")));
    }
    match parsed.display_name.filter(|s| !s.trim().is_empty()) {
        Some(name) => Ok(AddressResult::new(name, Utc::now())),
        None => Err(GeoCamError::network("reverse geocode returned no display_name")),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sources/location.rs"]
mod tests;
