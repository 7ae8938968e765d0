//! Query server for delivery-zone resolution.
//!
//! Serves point resolution, zone listings and radius estimates over HTTP
//! against the most recently published catalog snapshot.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use geozone::config::Config;
use geozone::models::{Area, BoundingBox, Coordinate, ResolutionResult};
use geozone::zones::{estimate_radius_km, CatalogStore, ResolveOptions, ZoneResolver};
use geozone::ZoneError;

/// Upper bound for the per-request `limit` override
const MAX_LIMIT: usize = 20;

#[derive(Parser, Debug)]
#[command(name = "query")]
#[command(about = "Delivery-zone resolution server")]
struct Args {
    /// Config file
    #[arg(short, long, default_value = "geozone.toml")]
    config: PathBuf,

    /// Listen address (overrides config)
    #[arg(short, long)]
    listen: Option<String>,
}

/// Application state shared across handlers
struct AppState {
    store: CatalogStore,
    resolver: ZoneResolver,
    catalog_path: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!("Geozone Query Server");
    let config = Config::load_from_file(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    let listen = args.listen.unwrap_or(config.server.listen.clone());

    let state = Arc::new(AppState {
        store: CatalogStore::new(),
        resolver: ZoneResolver::new(config.resolve),
        catalog_path: config.catalog.path.clone(),
    });

    // Load the catalog in the background; endpoints answer 503 until it is published
    {
        let state = Arc::clone(&state);
        let interval = config.server.reload_interval_secs;
        tokio::spawn(async move {
            info!("Loading zone catalog from {}", state.catalog_path.display());
            if let Err(e) = state.store.reload_from(&state.catalog_path).await {
                error!("Initial catalog load failed: {}", e);
            }

            if let Some(secs) = interval {
                let mut ticker = tokio::time::interval(Duration::from_secs(secs.max(1)));
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    if let Err(e) = state.store.reload_from(&state.catalog_path).await {
                        error!("Periodic catalog reload failed: {}", e);
                    }
                }
            }
        });
    }

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/v1/resolve", get(resolve_handler))
        .route("/v1/zones", get(zones_handler))
        .route("/v1/estimate-radius", get(estimate_radius_handler))
        .route("/v1/reload", post(reload_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Starting server on {}", listen);

    let listener = tokio::net::TcpListener::bind(&listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse { error: msg.into() }))
}

fn zone_error(e: ZoneError) -> ApiError {
    let status = match e {
        ZoneError::InvalidCoordinate { .. }
        | ZoneError::InvalidBounds(_)
        | ZoneError::InvalidOptions(_) => StatusCode::BAD_REQUEST,
        ZoneError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, e.to_string())
}

/// Health check endpoint
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let snapshot = state.store.snapshot().ok();
    Json(HealthResponse {
        status: if snapshot.is_some() { "ok" } else { "loading" },
        ready: snapshot.is_some(),
        zones: snapshot.as_ref().map_or(0, |c| c.zone_count()),
        areas: snapshot.as_ref().map_or(0, |c| c.area_count()),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    ready: bool,
    zones: usize,
    areas: usize,
}

/// Resolve a point to a zone/area or nearby suggestions
async fn resolve_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResolveParams>,
) -> Result<Json<ResolveResponse>, ApiError> {
    let opts = params
        .apply_overrides(state.resolver.options())
        .map_err(zone_error)?;
    let catalog = state.store.snapshot().map_err(zone_error)?;
    let point = Coordinate {
        lat: params.lat,
        lng: params.lng,
    };

    let result = geozone::zones::resolve(&catalog, point, &opts).map_err(|e| {
        warn!("Rejected resolve request: {}", e);
        zone_error(e)
    })?;

    Ok(Json(ResolveResponse {
        message: result.message(),
        result,
    }))
}

#[derive(Deserialize)]
struct ResolveParams {
    lat: f64,
    lng: f64,
    /// Default area radius override
    radius_km: Option<f64>,
    /// Nearby threshold override
    threshold_km: Option<f64>,
    /// Number of nearby suggestions
    limit: Option<usize>,
}

impl ResolveParams {
    fn apply_overrides(&self, base: &ResolveOptions) -> Result<ResolveOptions, ZoneError> {
        let mut opts = *base;
        if let Some(r) = self.radius_km {
            opts.default_area_radius_km = r;
        }
        if let Some(t) = self.threshold_km {
            opts.nearby_threshold_km = t;
        }
        if let Some(limit) = self.limit {
            opts.max_nearby_results = limit.min(MAX_LIMIT);
        }
        opts.validate()?;
        Ok(opts)
    }
}

#[derive(Serialize)]
struct ResolveResponse {
    #[serde(flatten)]
    result: ResolutionResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

/// List zones in the current snapshot
async fn zones_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ZonesResponse>, ApiError> {
    let catalog = state.store.snapshot().map_err(zone_error)?;
    let zones = catalog
        .zones()
        .iter()
        .map(|z| ZoneSummary {
            name: z.name.clone(),
            display_order: z.display_order,
            extent: z.extent(),
            areas: z.areas.clone(),
        })
        .collect();

    Ok(Json(ZonesResponse {
        loaded_at: catalog.loaded_at(),
        zones,
    }))
}

#[derive(Serialize)]
struct ZonesResponse {
    loaded_at: DateTime<Utc>,
    zones: Vec<ZoneSummary>,
}

#[derive(Serialize)]
struct ZoneSummary {
    name: String,
    display_order: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    extent: Option<BoundingBox>,
    areas: Vec<Area>,
}

/// Estimate a service radius from a centroid and bounding box
async fn estimate_radius_handler(
    Query(params): Query<EstimateParams>,
) -> Result<Json<EstimateResponse>, ApiError> {
    let centroid = Coordinate {
        lat: params.lat,
        lng: params.lng,
    };
    let bounds = BoundingBox {
        southwest: Coordinate {
            lat: params.sw_lat,
            lng: params.sw_lng,
        },
        northeast: Coordinate {
            lat: params.ne_lat,
            lng: params.ne_lng,
        },
    };

    let radius_km = estimate_radius_km(centroid, &bounds).map_err(zone_error)?;
    Ok(Json(EstimateResponse { radius_km }))
}

#[derive(Deserialize)]
struct EstimateParams {
    lat: f64,
    lng: f64,
    sw_lat: f64,
    sw_lng: f64,
    ne_lat: f64,
    ne_lng: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EstimateResponse {
    radius_km: f64,
}

/// Re-read the catalog file and publish a new snapshot
async fn reload_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthResponse>, ApiError> {
    let catalog = state
        .store
        .reload_from(&state.catalog_path)
        .await
        .map_err(zone_error)?;

    Ok(Json(HealthResponse {
        status: "ok",
        ready: true,
        zones: catalog.zone_count(),
        areas: catalog.area_count(),
    }))
}
