//! OSRM API response types for the Route service.
//!
//! The Route API returns the fastest road route between the supplied
//! coordinates together with its length in metres.
//!
//! See: <http://project-osrm.org/docs/v5.24.0/api/#route-service>

use serde::Deserialize;

/// OSRM Route API response.
///
/// The response holds one or more routes on success or an error message on
/// failure; the `code` field carries the response status.
#[derive(Debug, Deserialize)]
pub(crate) struct RouteResponse {
    /// Status code from OSRM.
    ///
    /// Common values:
    /// - `"Ok"` - Request was successful
    /// - `"InvalidQuery"` - Invalid query parameters
    /// - `"NoRoute"` - No route was found between the points
    pub(crate) code: String,

    /// Optional error message when `code` is not `"Ok"`.
    pub(crate) message: Option<String>,

    /// Candidate routes, fastest first.
    pub(crate) routes: Option<Vec<RouteSummary>>,
}

/// One route in an OSRM response.
#[derive(Debug, Deserialize)]
pub(crate) struct RouteSummary {
    /// Route length in metres.
    pub(crate) distance: f64,

    /// Travel time in seconds; unused by the distance provider.
    #[serde(default)]
    #[expect(dead_code, reason = "decoded for completeness of the wire format")]
    pub(crate) duration: f64,
}

impl RouteResponse {
    /// Check if the response indicates success.
    pub(crate) fn is_ok(&self) -> bool {
        self.code == "Ok"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialise_success_response() {
        let json = r#"{
            "code": "Ok",
            "routes": [{"distance": 5021.3, "duration": 612.0}]
        }"#;

        let response: RouteResponse = serde_json::from_str(json).expect("should deserialise");

        assert!(response.is_ok());
        assert!(response.message.is_none());
        let routes = response.routes.expect("should have routes");
        assert_eq!(routes.len(), 1);
        assert!((routes[0].distance - 5021.3).abs() < f64::EPSILON);
    }

    #[test]
    fn deserialise_error_response() {
        let json = r#"{
            "code": "NoRoute",
            "message": "Impossible route between points"
        }"#;

        let response: RouteResponse = serde_json::from_str(json).expect("should deserialise");

        assert!(!response.is_ok());
        assert_eq!(
            response.message,
            Some("Impossible route between points".to_string())
        );
        assert!(response.routes.is_none());
    }

    #[test]
    fn deserialise_response_without_duration() {
        let json = r#"{
            "code": "Ok",
            "routes": [{"distance": 100.0}]
        }"#;

        let response: RouteResponse = serde_json::from_str(json).expect("should deserialise");
        let routes = response.routes.expect("should have routes");
        assert!((routes[0].distance - 100.0).abs() < f64::EPSILON);
    }
}
