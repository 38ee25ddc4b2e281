//! # rtss
//!
//! Référence linéaire pour le réseau routier: conversion entre la position
//! d'une route (RTSS + chaînage + décalage latéral) et la géométrie planaire,
//! segmentation attribuée des routes et recherche de routes.
//!
//! ## Features
//!
//! - Géocodage direct et inverse des points, lignes et polygones
//! - Registre du réseau avec index spatial `rstar` (route la plus proche)
//! - Recherche textuelle approximative sur les codes et noms de routes
//! - Segmentation par points de rupture, construite en lot et en parallèle
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rtss::{Chainage, Geocodage, GeocodageOptions, PointRtss, Rtss};
//!
//! let registry = Geocodage::from_records(records, GeocodageOptions::default())?;
//! let rtss = Rtss::new("00010-01-210-000C")?;
//! let point = PointRtss::new(rtss.clone(), Chainage::parse("0+250")?, 3.0);
//! let xy = registry.get(&rtss)?.geocoder_point(&point, true)?;
//! ```

pub mod chainage;
pub mod error;
pub mod feat_rtss;
pub mod frame;
pub mod geocodage;
pub mod geometry;
pub mod linear_referencing;
pub mod reseau_segmenter;
pub mod rtss;
pub mod search;
pub mod segmentation;

pub use chainage::Chainage;
pub use error::{ErrorKind, RtssError};
pub use feat_rtss::{FeatRtss, TraceMode};
pub use frame::{ReferenceFrame, Unit};
pub use geocodage::{Geocodage, GeocodageOptions, RouteRecord};
pub use geometry::{LineRtss, PointRtss, PolygonRtss, RtssGeometry, Side};
pub use linear_referencing::{LinearReferencing, SegmentFeature};
pub use reseau_segmenter::{
    AttributeRange, BuildReport, InterpolationParams, Measurement, ReseauSegmenter, Skipped,
};
pub use rtss::Rtss;
pub use search::SearchEngine;
pub use segmentation::{Attributes, LineSegmentationElement, SegmentationPoint};
