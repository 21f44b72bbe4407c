//! Plan command implementation for the Spesa CLI.

use std::io::{BufReader, Write};

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use geo::Coord;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use spesa_core::{Geocoder, Meters, PlanRequest, PlanSession, Planner, StopLimit};
use spesa_data::{
    HttpRoutingProvider, HttpRoutingProviderConfig, NominatimGeocoder, NominatimGeocoderConfig,
    SqlitePriceStore,
};
use spesa_planner::ShoppingPlanner;

use crate::{
    ARG_PLAN_DB, ARG_PLAN_NOMINATIM_BASE_URL, ARG_PLAN_OSRM_BASE_URL, ARG_PLAN_REQUEST, CliError,
    ENV_PLAN_DB, ENV_PLAN_REQUEST,
};

/// CLI arguments for the `plan` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Compute a shopping plan by loading the price database and \
                 querying an OSRM instance for travel distances. The request \
                 itself is provided as a JSON file with the item list, the \
                 radius in km, the stop limit (1, 2, 3, or \"unbounded\"), \
                 and optionally the user location or a free-text address.",
    about = "Compute a shopping plan"
)]
#[ortho_config(prefix = "SPESA")]
pub(crate) struct PlanArgs {
    /// Path to a JSON file containing the plan request.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) request_path: Option<Utf8PathBuf>,
    /// Path to the SQLite price database.
    #[arg(long = ARG_PLAN_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) db: Option<Utf8PathBuf>,
    /// Base URL for the OSRM server (e.g. "http://localhost:5000").
    #[arg(long = ARG_PLAN_OSRM_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) osrm_base_url: Option<String>,
    /// Base URL for the Nominatim geocoder.
    #[arg(long = ARG_PLAN_NOMINATIM_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) nominatim_base_url: Option<String>,
}

impl PlanArgs {
    pub(crate) fn into_config(self) -> Result<PlanConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        PlanConfig::try_from(merged)
    }
}

/// Resolved `plan` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlanConfig {
    /// Path to the JSON request file.
    pub(crate) request_path: Utf8PathBuf,
    /// Path to the SQLite price database.
    pub(crate) db: Utf8PathBuf,
    /// Base URL for the OSRM route service.
    pub(crate) osrm_base_url: String,
    /// Base URL for the Nominatim geocoder.
    pub(crate) nominatim_base_url: String,
}

impl PlanConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.request_path, ARG_PLAN_REQUEST)?;
        require_existing(&self.db, ARG_PLAN_DB)?;
        Ok(())
    }
}

impl TryFrom<PlanArgs> for PlanConfig {
    type Error = CliError;

    fn try_from(args: PlanArgs) -> Result<Self, Self::Error> {
        let request_path = args.request_path.ok_or(CliError::MissingArgument {
            field: ARG_PLAN_REQUEST,
            env: ENV_PLAN_REQUEST,
        })?;
        let db = args.db.ok_or(CliError::MissingArgument {
            field: ARG_PLAN_DB,
            env: ENV_PLAN_DB,
        })?;
        let osrm_base_url = args
            .osrm_base_url
            .unwrap_or_else(|| HttpRoutingProviderConfig::default().base_url);
        let nominatim_base_url = args
            .nominatim_base_url
            .unwrap_or_else(|| NominatimGeocoderConfig::default().base_url);

        Ok(Self {
            request_path,
            db,
            osrm_base_url,
            nominatim_base_url,
        })
    }
}

pub(crate) fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match std::fs::metadata(path.as_std_path()) {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// On-disk shape of the plan request file.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PlanRequestFile {
    /// Free-text item queries.
    pub(crate) items: Vec<String>,
    /// Search radius in kilometres.
    pub(crate) radius_km: f64,
    /// Stop limit: 1, 2, 3, or "unbounded".
    pub(crate) stop_limit: StopLimit,
    /// Explicit user coordinates; wins over `user_address`.
    #[serde(default)]
    pub(crate) user_location: Option<LatLon>,
    /// Free-text address to geocode into the user location.
    #[serde(default)]
    pub(crate) user_address: Option<String>,
}

/// Latitude/longitude pair as written in request files.
#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct LatLon {
    pub(crate) lat: f64,
    pub(crate) lon: f64,
}

impl From<LatLon> for Coord<f64> {
    fn from(value: LatLon) -> Self {
        Self {
            x: value.lon,
            y: value.lat,
        }
    }
}

pub(crate) fn run_plan(args: PlanArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    execute_plan(&config, writer)
}

pub(crate) fn execute_plan(config: &PlanConfig, writer: &mut dyn Write) -> Result<(), CliError> {
    config.validate_sources()?;

    let request_file = read_request(&config.request_path)?;
    let store = SqlitePriceStore::open(&config.db)?;
    let ledger = store.load_ledger()?;
    let directory = store.load_directory()?;
    let catalog = store.load_catalog()?;

    let location = resolve_location(config, &request_file)?;
    let mut session = match location {
        Some(coord) => PlanSession::with_location(coord),
        None => PlanSession::new(),
    };

    let routing = HttpRoutingProvider::with_config(HttpRoutingProviderConfig::new(
        config.osrm_base_url.clone(),
    ))
    .map_err(|source| CliError::BuildProvider {
        base_url: config.osrm_base_url.clone(),
        source,
    })?;
    let planner = ShoppingPlanner::new(directory, routing).with_catalog(catalog);

    let request = PlanRequest {
        items: request_file.items,
        radius: Meters::from_km(request_file.radius_km),
        stop_limit: request_file.stop_limit,
    };
    let plan = planner.plan(&ledger, &mut session, &request)?;

    serde_json::to_writer_pretty(&mut *writer, &plan).map_err(CliError::SerializePlan)?;
    writeln!(writer).map_err(CliError::WriteOutput)
}

fn read_request(path: &Utf8Path) -> Result<PlanRequestFile, CliError> {
    let file = std::fs::File::open(path.as_std_path()).map_err(|source| CliError::OpenInput {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| CliError::ParseInput {
        path: path.to_path_buf(),
        source,
    })
}

/// Pick the user location: explicit coordinates win, then a geocoded
/// address, then none at all (radius filter disabled).
fn resolve_location(
    config: &PlanConfig,
    request: &PlanRequestFile,
) -> Result<Option<Coord<f64>>, CliError> {
    if let Some(latlon) = request.user_location {
        return Ok(Some(latlon.into()));
    }
    let Some(address) = request.user_address.as_deref() else {
        return Ok(None);
    };

    let geocoder = NominatimGeocoder::with_config(NominatimGeocoderConfig::new(
        config.nominatim_base_url.clone(),
    ))
    .map_err(|source| CliError::BuildProvider {
        base_url: config.nominatim_base_url.clone(),
        source,
    })?;
    let coord = geocoder
        .geocode(address)
        .map_err(|source| CliError::Geocode {
            address: address.to_owned(),
            source,
        })?
        .ok_or_else(|| CliError::UnknownAddress {
            address: address.to_owned(),
        })?;
    info!("geocoded {address:?} to ({:.5}, {:.5})", coord.y, coord.x);
    Ok(Some(coord))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn args(request: Option<&str>, db: Option<&str>) -> PlanArgs {
        PlanArgs {
            request_path: request.map(Utf8PathBuf::from),
            db: db.map(Utf8PathBuf::from),
            osrm_base_url: None,
            nominatim_base_url: None,
        }
    }

    #[rstest]
    fn config_requires_request_path() {
        let outcome = PlanConfig::try_from(args(None, Some("prices.db")));
        assert!(matches!(
            outcome,
            Err(CliError::MissingArgument {
                field: ARG_PLAN_REQUEST,
                ..
            })
        ));
    }

    #[rstest]
    fn config_requires_db_path() {
        let outcome = PlanConfig::try_from(args(Some("request.json"), None));
        assert!(matches!(
            outcome,
            Err(CliError::MissingArgument {
                field: ARG_PLAN_DB,
                ..
            })
        ));
    }

    #[rstest]
    fn config_fills_provider_defaults() {
        let config = PlanConfig::try_from(args(Some("request.json"), Some("prices.db")))
            .expect("both paths set");
        assert_eq!(config.osrm_base_url, "http://localhost:5000");
        assert_eq!(
            config.nominatim_base_url,
            "https://nominatim.openstreetmap.org"
        );
    }

    #[rstest]
    fn request_file_accepts_numeric_and_named_stop_limits() {
        let json = r#"{
            "items": ["latte", "pane"],
            "radius_km": 10.0,
            "stop_limit": "unbounded",
            "user_location": {"lat": 45.46, "lon": 9.19}
        }"#;
        let parsed: PlanRequestFile = serde_json::from_str(json).expect("parse");
        assert_eq!(parsed.stop_limit, StopLimit::Unbounded);
        let coord: Coord<f64> = parsed.user_location.expect("location").into();
        assert!((coord.x - 9.19).abs() < 1e-9);
    }

    // Without a user location no routing call is made, so the whole command
    // runs offline against a scratch database.
    #[rstest]
    fn plans_end_to_end_without_a_location() {
        use spesa_core::test_support::{store_record, transaction};

        let dir = tempfile::TempDir::new().expect("temp dir");
        let db = camino::Utf8PathBuf::from_path_buf(dir.path().join("prices.db"))
            .expect("utf-8 path");
        let request_path = camino::Utf8PathBuf::from_path_buf(dir.path().join("request.json"))
            .expect("utf-8 path");

        let mut store = SqlitePriceStore::open(&db).expect("open");
        store
            .append_transactions(&[
                transaction("Conad", "Via Roma 1", "LATTE", 120),
                transaction("Aldi", "Via Po 2", "LATTE", 100),
                transaction("Conad", "Via Roma 1", "PANE", 90),
            ])
            .expect("seed ledger");
        store
            .upsert_stores(&[
                store_record("Conad", "Via Roma 1", 9.21, 45.47),
                store_record("Aldi", "Via Po 2", 9.10, 45.40),
            ])
            .expect("seed stores");

        std::fs::write(
            request_path.as_std_path(),
            r#"{"items": ["latte", "pane"], "radius_km": 10.0, "stop_limit": 2}"#,
        )
        .expect("write request");

        let config = PlanConfig {
            request_path,
            db,
            osrm_base_url: "http://localhost:5000".to_owned(),
            nominatim_base_url: "http://localhost:8080".to_owned(),
        };
        let mut output = Vec::new();
        execute_plan(&config, &mut output).expect("plan");

        let plan: serde_json::Value =
            serde_json::from_slice(&output).expect("plan output is JSON");
        assert_eq!(plan["total"], "1.90");
        assert_eq!(plan["missing_items"].as_array().map(Vec::len), Some(0));
    }
}
