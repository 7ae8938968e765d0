//! Operator CLI for authoring and checking delivery zones.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use geozone::config::{Config, GeocoderConfig};
use geozone::geocoding::{GeocodingClient, NominatimClient};
use geozone::models::{BoundingBox, Coordinate};
use geozone::zones::{draft_area, estimate_radius_km, load_catalog_file, ResolveOptions, ZoneResolver};

#[derive(Parser, Debug)]
#[command(name = "author")]
#[command(about = "Author and check delivery zones")]
struct Args {
    /// Optional config file (geocoder and resolve settings)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search places by name
    Search { text: String },

    /// Print a catalog snippet for a new area built from a place
    Draft {
        /// Place reference from `search` (e.g. R123)
        place_ref: String,

        /// Zone (city) the area belongs to
        #[arg(long)]
        zone: String,
    },

    /// Estimate a service radius from a centroid and bounding box
    Estimate {
        /// Centroid as "lat,lng"
        #[arg(long, value_parser = parse_coordinate)]
        centroid: Coordinate,

        /// Southwest corner as "lat,lng"
        #[arg(long, value_parser = parse_coordinate)]
        sw: Coordinate,

        /// Northeast corner as "lat,lng"
        #[arg(long, value_parser = parse_coordinate)]
        ne: Coordinate,
    },

    /// Resolve a point against a catalog file
    Resolve {
        #[arg(long)]
        catalog: PathBuf,

        #[arg(allow_negative_numbers = true)]
        lat: f64,

        #[arg(allow_negative_numbers = true)]
        lng: f64,
    },

    /// Validate every area in a catalog file
    Check {
        #[arg(long)]
        catalog: PathBuf,
    },

    /// Address for a point
    Reverse {
        #[arg(allow_negative_numbers = true)]
        lat: f64,

        #[arg(allow_negative_numbers = true)]
        lng: f64,
    },
}

/// Parse "lat,lng"
fn parse_coordinate(s: &str) -> Result<Coordinate, String> {
    let (lat, lng) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lng\", got '{}'", s))?;
    let lat: f64 = lat.trim().parse().map_err(|_| format!("bad latitude '{}'", lat))?;
    let lng: f64 = lng.trim().parse().map_err(|_| format!("bad longitude '{}'", lng))?;
    Coordinate::new(lat, lng).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let (geocoder_config, resolve_options) = match &args.config {
        Some(path) => {
            let config = Config::load_from_file(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            (config.geocoder, config.resolve)
        }
        None => (GeocoderConfig::default(), ResolveOptions::default()),
    };

    match args.command {
        Command::Search { text } => {
            let client = NominatimClient::new(&geocoder_config)?;
            let suggestions = client.search(&text).await?;
            if suggestions.is_empty() {
                println!("No places found for '{}'", text);
            }
            for s in suggestions {
                println!("{:<12} {}", s.place_ref, s.description);
            }
        }
        Command::Draft { place_ref, zone } => {
            let client = NominatimClient::new(&geocoder_config)?;
            let draft = draft_area(&client, &zone, &place_ref).await?;
            if !draft.radius_estimated {
                warn!(
                    "No bounding box for {}; radius left unset (default {} km applies)",
                    place_ref, resolve_options.default_area_radius_km
                );
            }
            print!("{}", draft.to_toml()?);
        }
        Command::Estimate { centroid, sw, ne } => {
            let bounds = BoundingBox::new(sw, ne)?;
            let radius = estimate_radius_km(centroid, &bounds)?;
            println!("{}", radius);
        }
        Command::Resolve { catalog, lat, lng } => {
            let catalog = load_catalog_file(&catalog)?;
            let resolver = ZoneResolver::new(resolve_options);
            let result = resolver.resolve(&catalog, Coordinate { lat, lng })?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Check { catalog: path } => {
            let catalog = load_catalog_file(&path)?;
            info!(
                "Loaded {} zones, {} areas from {}",
                catalog.zone_count(),
                catalog.area_count(),
                path.display()
            );
            let problems = catalog.malformed_areas();
            for p in &problems {
                println!("{}", p);
            }
            if !problems.is_empty() {
                anyhow::bail!("{} malformed areas", problems.len());
            }
            println!(
                "OK: {} zones, {} areas",
                catalog.zone_count(),
                catalog.area_count()
            );
        }
        Command::Reverse { lat, lng } => {
            let client = NominatimClient::new(&geocoder_config)?;
            match client.reverse_geocode(Coordinate::new(lat, lng)?).await? {
                Some(address) => println!("{}", address),
                None => println!("No address found"),
            }
        }
    }

    Ok(())
}
