//! Travel distances and the routing and geocoding collaborator contracts.
//!
//! Distances are integer metres; road distances returned by a provider are
//! rendered as kilometres with one decimal. A store whose distance cannot be
//! computed carries a tagged sentinel ([`RouteDistance::Unresolved`] or
//! [`RouteDistance::ProviderError`]) instead of a magic number, and callers
//! branch on the tag.

use geo::Coord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A travel distance in whole metres.
///
/// # Examples
/// ```
/// use spesa_core::Meters;
///
/// let d = Meters::from_km(7.5);
/// assert_eq!(d.get(), 7_500);
/// assert_eq!(d.to_string(), "7.5 km");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Meters(u32);

impl Meters {
    /// Zero metres.
    pub const ZERO: Self = Self(0);

    /// Construct from a metre count.
    #[must_use]
    pub const fn new(meters: u32) -> Self {
        Self(meters)
    }

    /// Construct from kilometres, rounding to the nearest metre.
    ///
    /// Negative or non-finite input clamps to zero.
    #[must_use]
    pub fn from_km(km: f64) -> Self {
        if !km.is_finite() || km <= 0.0 {
            return Self::ZERO;
        }
        let meters = (km * 1000.0).round();
        if meters > f64::from(u32::MAX) {
            Self(u32::MAX)
        } else {
            Self(meters as u32)
        }
    }

    /// The distance in metres.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for Meters {
    /// Kilometres with one decimal, the way distances are shown to users.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1} km", f64::from(self.0) / 1000.0)
    }
}

/// Outcome of resolving a store's travel distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteDistance {
    /// The routing provider returned a road distance.
    Resolved(Meters),
    /// The store address has no directory match.
    Unresolved,
    /// The directory row is unusable or the provider call failed.
    ProviderError,
}

impl RouteDistance {
    /// Whether the distance is resolved and within `radius` (inclusive).
    #[must_use]
    pub fn is_within(self, radius: Meters) -> bool {
        matches!(self, Self::Resolved(m) if m <= radius)
    }

    /// The resolved distance, when present.
    #[must_use]
    pub const fn resolved(self) -> Option<Meters> {
        match self {
            Self::Resolved(m) => Some(m),
            Self::Unresolved | Self::ProviderError => None,
        }
    }
}

impl std::fmt::Display for RouteDistance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resolved(m) => m.fmt(f),
            Self::Unresolved => f.write_str("unresolved"),
            Self::ProviderError => f.write_str("provider error"),
        }
    }
}

/// Errors from [`RoutingProvider::road_distance`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// The request exceeded the configured timeout.
    #[error("routing request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Request URL.
        url: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },
    /// The provider answered with a non-success HTTP status.
    #[error("routing request to {url} failed with HTTP {status}: {message}")]
    HttpStatus {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Provider message.
        message: String,
    },
    /// The request failed below HTTP, e.g. connection refused.
    #[error("routing request to {url} failed: {message}")]
    Network {
        /// Request URL.
        url: String,
        /// Transport error description.
        message: String,
    },
    /// The provider reported an application-level error.
    #[error("routing service error {code}: {message}")]
    Service {
        /// Provider status code.
        code: String,
        /// Provider message.
        message: String,
    },
    /// The response body could not be decoded.
    #[error("failed to parse routing response: {message}")]
    Parse {
        /// Decoding failure description.
        message: String,
    },
    /// The provider found no route between the two points.
    #[error("no route between the requested points")]
    NoRoute,
}

/// Compute the road distance between two WGS84 coordinates.
///
/// Implementations apply a short per-call timeout; the caller treats any
/// error as that one store's [`RouteDistance::ProviderError`] and carries on.
pub trait RoutingProvider {
    /// Road distance from `from` to `to`.
    ///
    /// Coordinates use `x = longitude`, `y = latitude`.
    ///
    /// # Errors
    /// Returns [`RoutingError`] when the provider cannot produce a distance.
    fn road_distance(&self, from: Coord<f64>, to: Coord<f64>) -> Result<Meters, RoutingError>;
}

/// Errors from [`Geocoder::geocode`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeocodeError {
    /// The request exceeded the configured timeout.
    #[error("geocoding request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Request URL.
        url: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },
    /// The provider answered with a non-success HTTP status.
    #[error("geocoding request to {url} failed with HTTP {status}: {message}")]
    HttpStatus {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Provider message.
        message: String,
    },
    /// The request failed below HTTP.
    #[error("geocoding request to {url} failed: {message}")]
    Network {
        /// Request URL.
        url: String,
        /// Transport error description.
        message: String,
    },
    /// The response body could not be decoded.
    #[error("failed to parse geocoding response: {message}")]
    Parse {
        /// Decoding failure description.
        message: String,
    },
}

/// Resolve a free-text address to WGS84 coordinates.
pub trait Geocoder {
    /// Coordinates for `address`, or `None` when the provider has no match.
    ///
    /// # Errors
    /// Returns [`GeocodeError`] on transport or decoding failures.
    fn geocode(&self, address: &str) -> Result<Option<Coord<f64>>, GeocodeError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 0)]
    #[case(7.5, 7_500)]
    #[case(-3.0, 0)]
    #[case(f64::NAN, 0)]
    fn meters_from_km(#[case] km: f64, #[case] expected: u32) {
        assert_eq!(Meters::from_km(km).get(), expected);
    }

    #[rstest]
    fn boundary_distance_is_within_radius() {
        let radius = Meters::from_km(10.0);
        assert!(RouteDistance::Resolved(Meters::from_km(10.0)).is_within(radius));
        assert!(!RouteDistance::Resolved(Meters::new(10_001)).is_within(radius));
        assert!(!RouteDistance::Unresolved.is_within(radius));
        assert!(!RouteDistance::ProviderError.is_within(radius));
    }

    #[rstest]
    fn display_uses_one_decimal() {
        assert_eq!(Meters::new(5_050).to_string(), "5.1 km");
        assert_eq!(RouteDistance::Unresolved.to_string(), "unresolved");
    }
}
