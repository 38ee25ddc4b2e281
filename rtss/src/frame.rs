//! Référentiels de coordonnées des sources de routes

use std::fmt;

use crate::RtssError;

/// Unité des axes d'un référentiel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Metre,
    Degree,
}

/// Mapping EPSG → (nom, unité)
const FRAMES: &[(u32, &str, Unit)] = &[
    (32198, "NAD83 / Quebec Lambert", Unit::Metre),
    (6622, "NAD83(CSRS) / Quebec Lambert", Unit::Metre),
    (32187, "NAD83 / MTM zone 7", Unit::Metre),
    (32188, "NAD83 / MTM zone 8", Unit::Metre),
    (2949, "NAD83(CSRS) / MTM zone 7", Unit::Metre),
    (2950, "NAD83(CSRS) / MTM zone 8", Unit::Metre),
    (2951, "NAD83(CSRS) / MTM zone 9", Unit::Metre),
    (2952, "NAD83(CSRS) / MTM zone 10", Unit::Metre),
    (26917, "NAD83 / UTM zone 17N", Unit::Metre),
    (26918, "NAD83 / UTM zone 18N", Unit::Metre),
    (26919, "NAD83 / UTM zone 19N", Unit::Metre),
    (26920, "NAD83 / UTM zone 20N", Unit::Metre),
    (2154, "RGF93 / Lambert-93", Unit::Metre),
    (3857, "WGS 84 / Pseudo-Mercator", Unit::Metre),
    (4326, "WGS 84", Unit::Degree),
    (4269, "NAD83", Unit::Degree),
    (4617, "NAD83(CSRS)", Unit::Degree),
];

/// Référentiel d'une source de routes ou d'une requête
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceFrame {
    /// Code EPSG
    pub epsg: u32,

    /// Nom du référentiel
    pub name: &'static str,

    /// Unité des axes
    pub unit: Unit,
}

impl Default for ReferenceFrame {
    fn default() -> Self {
        Self {
            epsg: 32198, // Québec Lambert par défaut
            name: "NAD83 / Quebec Lambert",
            unit: Unit::Metre,
        }
    }
}

impl ReferenceFrame {
    /// Recherche un référentiel connu par son code EPSG
    pub fn from_epsg(epsg: u32) -> Result<Self, RtssError> {
        FRAMES
            .iter()
            .find(|&&(code, _, _)| code == epsg)
            .map(|&(epsg, name, unit)| Self { epsg, name, unit })
            .ok_or_else(|| RtssError::UnknownFrame(format!("EPSG:{}", epsg)))
    }

    /// Parse `EPSG:32198`, `32198` ou un nom connu
    pub fn parse(text: &str) -> Result<Self, RtssError> {
        let trimmed = text.trim();
        let code = trimmed
            .strip_prefix("EPSG:")
            .or_else(|| trimmed.strip_prefix("epsg:"))
            .unwrap_or(trimmed);

        if let Ok(epsg) = code.parse::<u32>() {
            return Self::from_epsg(epsg);
        }

        FRAMES
            .iter()
            .find(|&&(_, name, _)| name.eq_ignore_ascii_case(trimmed))
            .map(|&(epsg, name, unit)| Self { epsg, name, unit })
            .ok_or_else(|| RtssError::UnknownFrame(trimmed.to_string()))
    }

    pub fn is_metric(&self) -> bool {
        self.unit == Unit::Metre
    }

    /// # Errors
    ///
    /// `RtssError::NonMetricFrame` si les axes ne sont pas en mètres.
    pub fn ensure_metric(&self) -> Result<(), RtssError> {
        if self.is_metric() {
            Ok(())
        } else {
            Err(RtssError::NonMetricFrame(self.to_string()))
        }
    }
}

impl fmt::Display for ReferenceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}
