//! HTTP-based `RoutingProvider` using OSRM's Route API.
//!
//! # Architecture
//!
//! The [`RoutingProvider`] trait is synchronous so the planner stays
//! embeddable in synchronous contexts. This provider bridges the async HTTP
//! calls to the sync interface by blocking on a Tokio runtime it owns; see
//! [`super::run_blocking`] for the runtime rules.
//!
//! # Example
//!
//! ```no_run
//! use geo::Coord;
//! use spesa_core::RoutingProvider;
//! use spesa_data::HttpRoutingProvider;
//!
//! let provider = HttpRoutingProvider::new("http://localhost:5000")?;
//! let km = provider.road_distance(
//!     Coord { x: 9.19, y: 45.46 },
//!     Coord { x: 9.21, y: 45.48 },
//! )?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::time::Duration;

use geo::Coord;
use reqwest::Client;
use tokio::runtime::Runtime;

use spesa_core::{Meters, RoutingError, RoutingProvider};

use super::osrm::RouteResponse;
use super::{ProviderBuildError, build_runtime, run_blocking};

/// Default user agent for OSRM requests.
pub const DEFAULT_USER_AGENT: &str = "spesa-routing/0.1";

/// Default request timeout in seconds.
///
/// Distance lookups happen per store while the user waits; a slow provider
/// call must degrade that one store quickly rather than stall the plan.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration for [`HttpRoutingProvider`].
#[derive(Debug, Clone)]
pub struct HttpRoutingProviderConfig {
    /// Base URL for the OSRM service (e.g., `"http://localhost:5000"`).
    pub base_url: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for HttpRoutingProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HttpRoutingProviderConfig {
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

/// Road-distance provider backed by an OSRM Route service.
pub struct HttpRoutingProvider {
    client: Client,
    config: HttpRoutingProviderConfig,
    runtime: Runtime,
}

impl std::fmt::Debug for HttpRoutingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRoutingProvider")
            .field("client", &self.client)
            .field("config", &self.config)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish()
    }
}

impl HttpRoutingProvider {
    /// Create a new provider with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(HttpRoutingProviderConfig::new(base_url))
    }

    /// Create a new provider with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn with_config(config: HttpRoutingProviderConfig) -> Result<Self, ProviderBuildError> {
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

    /// Build the OSRM Route API URL for a coordinate pair.
    ///
    /// The URL format is `{base_url}/route/v1/driving/{lon},{lat};{lon},{lat}`
    /// with the geometry payload suppressed.
    fn build_route_url(&self, from: Coord<f64>, to: Coord<f64>) -> String {
        format!(
            "{}/route/v1/driving/{},{};{},{}?overview=false",
            self.config.base_url.trim_end_matches('/'),
            from.x,
            from.y,
            to.x,
            to.y,
        )
    }

    /// Fetch the road distance asynchronously.
    async fn fetch_distance_async(
        &self,
        from: Coord<f64>,
        to: Coord<f64>,
    ) -> Result<Meters, RoutingError> {
        let url = self.build_route_url(from, to);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;

        let route_response: RouteResponse =
            response
                .json()
                .await
                .map_err(|err| RoutingError::Parse {
                    message: err.to_string(),
                })?;

        Self::convert_response(route_response)
    }

    /// Convert a reqwest error to a `RoutingError`.
    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &str) -> RoutingError {
        if error.is_timeout() {
            return RoutingError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return RoutingError::HttpStatus {
                url: url.to_owned(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        RoutingError::Network {
            url: url.to_owned(),
            message: error.to_string(),
        }
    }

    /// Convert an OSRM response to a distance.
    fn convert_response(response: RouteResponse) -> Result<Meters, RoutingError> {
        if !response.is_ok() {
            return Err(RoutingError::Service {
                code: response.code,
                message: response.message.unwrap_or_default(),
            });
        }

        let distance = response
            .routes
            .and_then(|routes| routes.into_iter().next())
            .map(|route| route.distance)
            .ok_or(RoutingError::NoRoute)?;

        // Invalid values (negative, NaN, infinite) are provider defects, not
        // unreachable stores; surface them as parse failures.
        if !distance.is_finite() || distance < 0.0 {
            return Err(RoutingError::Parse {
                message: format!("invalid route distance {distance}"),
            });
        }
        if distance > f64::from(u32::MAX) {
            return Err(RoutingError::Parse {
                message: format!("route distance {distance} out of range"),
            });
        }
        Ok(Meters::new(distance.round() as u32))
    }
}

impl RoutingProvider for HttpRoutingProvider {
    fn road_distance(&self, from: Coord<f64>, to: Coord<f64>) -> Result<Meters, RoutingError> {
        run_blocking(&self.runtime, self.fetch_distance_async(from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn provider() -> HttpRoutingProvider {
        HttpRoutingProvider::new("http://osrm.example.com").expect("provider should build")
    }

    fn response(code: &str, distances: Option<Vec<f64>>) -> RouteResponse {
        RouteResponse {
            code: code.to_string(),
            message: None,
            routes: distances.map(|values| {
                values
                    .into_iter()
                    .map(|distance| super::super::osrm::RouteSummary {
                        distance,
                        duration: 0.0,
                    })
                    .collect()
            }),
        }
    }

    #[rstest]
    fn build_route_url_formats_coordinates(provider: HttpRoutingProvider) {
        let url = provider.build_route_url(
            Coord { x: 9.19, y: 45.46 },
            Coord { x: 9.21, y: 45.48 },
        );

        assert_eq!(
            url,
            "http://osrm.example.com/route/v1/driving/9.19,45.46;9.21,45.48?overview=false"
        );
    }

    #[rstest]
    fn build_route_url_strips_trailing_slash() {
        let provider =
            HttpRoutingProvider::new("http://osrm.example.com/").expect("provider should build");

        let url = provider.build_route_url(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 });

        assert!(url.starts_with("http://osrm.example.com/route/"));
        assert!(!url.contains("//route"));
    }

    #[rstest]
    fn convert_response_rounds_to_meters() {
        let distance = HttpRoutingProvider::convert_response(response(
            "Ok",
            Some(vec![5021.4, 9000.0]),
        ))
        .expect("should convert");

        assert_eq!(distance, Meters::new(5021));
    }

    #[rstest]
    fn convert_response_handles_service_error() {
        let mut failure = response("NoRoute", None);
        failure.message = Some("Impossible route".to_string());

        let err = HttpRoutingProvider::convert_response(failure).expect_err("should fail");

        match err {
            RoutingError::Service { code, message } => {
                assert_eq!(code, "NoRoute");
                assert_eq!(message, "Impossible route");
            }
            _ => panic!("expected Service, got {err:?}"),
        }
    }

    #[rstest]
    fn convert_response_handles_missing_routes() {
        let err = HttpRoutingProvider::convert_response(response("Ok", Some(vec![])))
            .expect_err("should fail");
        assert_eq!(err, RoutingError::NoRoute);

        let err = HttpRoutingProvider::convert_response(response("Ok", None))
            .expect_err("should fail");
        assert_eq!(err, RoutingError::NoRoute);
    }

    #[rstest]
    #[case(-1.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn convert_response_rejects_invalid_distances(#[case] distance: f64) {
        let err = HttpRoutingProvider::convert_response(response("Ok", Some(vec![distance])))
            .expect_err("should fail");
        assert!(matches!(err, RoutingError::Parse { .. }));
    }

    #[rstest]
    fn config_builder_pattern() {
        let config = HttpRoutingProviderConfig::new("http://example.com")
            .with_timeout(Duration::from_secs(3))
            .with_user_agent("test-agent/1.0");

        assert_eq!(config.base_url, "http://example.com");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.user_agent, "test-agent/1.0");
    }
}
