//! Delivery-zone engine.
//!
//! Resolves a coordinate to the configured zone/area containing it, ranks
//! nearby areas when none does, and estimates radii for newly authored areas.

mod authoring;
mod catalog;
pub mod geometry;
mod radius;
mod resolver;

pub use authoring::{draft_area, AreaDraft};
pub use catalog::{load_catalog_file, parse_catalog, CatalogStore, ZoneCatalog};
pub use geometry::{contains_box, haversine_km};
pub use radius::estimate_radius_km;
pub use resolver::{
    resolve, ResolveOptions, ZoneResolver, DEFAULT_AREA_RADIUS_KM, MAX_NEARBY_RESULTS,
    NEARBY_THRESHOLD_KM,
};
