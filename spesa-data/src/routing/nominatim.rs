//! Nominatim-backed `Geocoder` implementation.
//!
//! Turns a free-text address into WGS84 coordinates via the Nominatim search
//! API. The public instance requires an identifying user agent and modest
//! request rates; point `base_url` at a self-hosted instance for anything
//! heavier.

use std::time::Duration;

use geo::Coord;
use reqwest::Client;
use serde::Deserialize;
use tokio::runtime::Runtime;

use spesa_core::{GeocodeError, Geocoder};

use super::{ProviderBuildError, build_runtime, run_blocking};

/// Default user agent for Nominatim requests; the service rejects anonymous
/// clients.
pub const DEFAULT_USER_AGENT: &str = "spesa-geocoder/0.1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// One entry of a Nominatim search response.
///
/// Coordinates arrive as strings in the JSON payload.
#[derive(Debug, Deserialize)]
struct SearchResult {
    lat: String,
    lon: String,
}

/// Configuration for [`NominatimGeocoder`].
#[derive(Debug, Clone)]
pub struct NominatimGeocoderConfig {
    /// Base URL of the Nominatim instance.
    pub base_url: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for NominatimGeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl NominatimGeocoderConfig {
    /// Create a new configuration with the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Address-to-coordinates resolver backed by Nominatim.
pub struct NominatimGeocoder {
    client: Client,
    config: NominatimGeocoderConfig,
    runtime: Runtime,
}

impl std::fmt::Debug for NominatimGeocoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NominatimGeocoder")
            .field("client", &self.client)
            .field("config", &self.config)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish()
    }
}

impl NominatimGeocoder {
    /// Create a geocoder against the public Nominatim instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn new() -> Result<Self, ProviderBuildError> {
        Self::with_config(NominatimGeocoderConfig::default())
    }

    /// Create a geocoder with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn with_config(config: NominatimGeocoderConfig) -> Result<Self, ProviderBuildError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ProviderBuildError::HttpClient)?;
        let runtime = build_runtime()?;
        Ok(Self {
            client,
            config,
            runtime,
        })
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.config.base_url.trim_end_matches('/'))
    }

    async fn fetch_async(&self, address: &str) -> Result<Option<Coord<f64>>, GeocodeError> {
        let url = self.search_url();

        let response = self
            .client
            .get(&url)
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;

        let results: Vec<SearchResult> =
            response.json().await.map_err(|err| GeocodeError::Parse {
                message: err.to_string(),
            })?;

        convert_results(results)
    }

    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &str) -> GeocodeError {
        if error.is_timeout() {
            return GeocodeError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return GeocodeError::HttpStatus {
                url: url.to_owned(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        GeocodeError::Network {
            url: url.to_owned(),
            message: error.to_string(),
        }
    }
}

impl Geocoder for NominatimGeocoder {
    fn geocode(&self, address: &str) -> Result<Option<Coord<f64>>, GeocodeError> {
        run_blocking(&self.runtime, self.fetch_async(address))
    }
}

/// Convert the decoded search results into a coordinate.
///
/// An empty result set means the address is unknown, which is a valid
/// outcome, not an error; unparseable coordinate strings are provider
/// defects.
fn convert_results(results: Vec<SearchResult>) -> Result<Option<Coord<f64>>, GeocodeError> {
    let Some(first) = results.into_iter().next() else {
        return Ok(None);
    };
    let lat: f64 = first.lat.trim().parse().map_err(|_| GeocodeError::Parse {
        message: format!("invalid latitude {:?}", first.lat),
    })?;
    let lon: f64 = first.lon.trim().parse().map_err(|_| GeocodeError::Parse {
        message: format!("invalid longitude {:?}", first.lon),
    })?;
    Ok(Some(Coord { x: lon, y: lat }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn deserialises_search_payload() {
        let json = r#"[{"lat": "45.4642", "lon": "9.1900", "display_name": "Milano"}]"#;
        let results: Vec<SearchResult> = serde_json::from_str(json).expect("should deserialise");
        let coord = convert_results(results).expect("convert").expect("one hit");
        assert!((coord.y - 45.4642).abs() < 1e-9);
        assert!((coord.x - 9.19).abs() < 1e-9);
    }

    #[rstest]
    fn empty_results_mean_no_match() {
        assert_eq!(convert_results(Vec::new()), Ok(None));
    }

    #[rstest]
    fn unparseable_coordinates_are_a_parse_error() {
        let results = vec![SearchResult {
            lat: "forty-five".to_owned(),
            lon: "9.19".to_owned(),
        }];
        assert!(matches!(
            convert_results(results),
            Err(GeocodeError::Parse { .. })
        ));
    }

    #[rstest]
    fn config_builder_pattern() {
        let config = NominatimGeocoderConfig::new("http://geo.local")
            .with_timeout(Duration::from_secs(2))
            .with_user_agent("test-agent/1.0");

        assert_eq!(config.base_url, "http://geo.local");
        assert_eq!(config.timeout, Duration::from_secs(2));
        assert_eq!(config.user_agent, "test-agent/1.0");
    }
}
