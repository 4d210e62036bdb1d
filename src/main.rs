use clap::{Parser, Subcommand};
use mars_locator::city::{self, CityRecord, CityReferenceTable};
use mars_locator::config::Config;
use mars_locator::coord::{self, GeoPoint};
use mars_locator::location::{CityStore, HttpGeocoder, LocationService};
use mars_locator::{logging, server};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// mars-locator — WGS-84 → GCJ-02 location pipeline
///
/// Examples:
///   marsloc transform --lat 39.908692 --lng 116.397477
///   marsloc city-id 成都市
///   marsloc locate --lat 30.572815 --lng 104.066801 --relocate
///   marsloc serve --port 3000
#[derive(Parser)]
#[command(name = "marsloc", version, about, long_about = None)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug-level logging (RUST_LOG still wins).
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a WGS-84 coordinate to GCJ-02.
    Transform {
        /// Latitude (-90 to 90).
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Longitude (-180 to 180).
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        /// Convert GCJ-02 back to WGS-84 (approximate).
        #[arg(long)]
        reverse: bool,
    },
    /// Resolve a city name to its numeric id.
    CityId {
        name: String,
        /// Skip suffix trimming ("北京市" is looked up as-is).
        #[arg(long)]
        raw: bool,
    },
    /// Run a device fix through the full pipeline.
    Locate {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        /// Report the located city as a user-requested relocation.
        #[arg(long)]
        relocate: bool,
    },
    /// Serve the HTTP API.
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Serialize)]
struct TransformOutput {
    lat: f64,
    lng: f64,
    in_china: bool,
}

fn main() {
    let cli = Cli::parse();
    logging::initialize_logging(cli.verbose);

    let config = Config::load(cli.config.as_deref()).unwrap_or_else(|e| fail(e));
    let table = match &config.cities.table_path {
        Some(path) => Arc::new(CityReferenceTable::load_or_empty(path)),
        None => city::bundled(),
    };

    match cli.command {
        Command::Transform { lat, lng, reverse } => {
            let point = GeoPoint::checked(lat, lng).unwrap_or_else(|e| fail(e));
            let out = if reverse {
                coord::gcj02_to_wgs84(point)
            } else {
                coord::wgs84_to_gcj02(point)
            };
            print_json(&TransformOutput {
                lat: out.lat,
                lng: out.lng,
                in_china: !coord::out_of_china(point),
            });
        }
        Command::CityId { name, raw } => {
            let name = if raw { name.as_str() } else { city::trim_city(&name) };
            print_json(&CityRecord {
                name: name.to_string(),
                id: city::resolve_id(name, &table),
            });
        }
        Command::Locate { lat, lng, relocate } => {
            let point = GeoPoint::checked(lat, lng).unwrap_or_else(|e| fail(e));
            let geocoder = HttpGeocoder::from_config(&config.geocoder);
            let mut service =
                LocationService::new(Box::new(geocoder), Arc::new(CityStore::new()), table);

            service.start(relocate);
            let outcome = service.on_location_changed(point).unwrap_or_else(|e| fail(e));
            if let Some(ref notice) = outcome.notice {
                eprintln!("  {}", notice);
            }
            print_json(&outcome);
        }
        Command::Serve { host, port } => {
            let host = host.unwrap_or(config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let geocoder = HttpGeocoder::from_config(&config.geocoder);
            let router = server::build_router(Box::new(geocoder), table);

            let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| fail(e));
            runtime
                .block_on(server::start(&host, port, router))
                .unwrap_or_else(|e| fail(e));
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => fail(e),
    }
}

fn fail(e: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", e);
    std::process::exit(1);
}
