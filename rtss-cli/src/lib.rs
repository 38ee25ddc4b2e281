//! # rtss-cli
//!
//! Géocodage et segmentation d'un réseau routier RTSS en ligne de commande.
//!
//! ## Features
//!
//! - Lecture des routes et des mesures depuis GeoJSON
//! - Configuration par presets embarqués (`mtq`, `minimal`) ou fichier JSON
//! - Export GeoJSON des segments (streaming geozero)
//! - Rapport d'exécution JSON
//!
//! ## Usage CLI
//!
//! ```bash
//! # Point RTSS vers coordonnées
//! rtss geocode --routes routes.geojson --rtss 10-1-210-C --chainage 0+250 --offset 3
//!
//! # Coordonnées vers point RTSS
//! rtss locate --routes routes.geojson -- 250.0 -3.0
//!
//! # Segmentation d'après des plages d'attributs
//! rtss segment --routes routes.geojson --ranges vitesses.json --output segments.geojson
//! ```

pub mod config;
pub mod export;
pub mod network;
pub mod report;
pub mod source;

pub use config::Config;
pub use network::load_registry;
pub use report::{RunReport, RunStatus};
