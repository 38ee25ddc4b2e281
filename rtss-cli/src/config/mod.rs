//! Configuration de la source de routes

use serde::{Deserialize, Serialize};
use std::path::Path;

use anyhow::{Context, Result};
use rtss::{GeocodageOptions, ReferenceFrame};

/// Presets embarqués disponibles
pub const PRESETS: &[&str] = &["mtq", "minimal"];

/// Configuration principale
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Propriété portant le code RTSS
    pub rtss_field: String,

    /// Propriété portant le chaînage de fin
    pub chainage_f_field: String,

    /// Propriété portant le chaînage de début (0 si absente)
    #[serde(default)]
    pub chainage_d_field: Option<String>,

    /// Propriété portant le nom de la route, indexé pour la recherche
    #[serde(default)]
    pub name_field: Option<String>,

    /// Code EPSG des géométries de la source
    #[serde(default = "default_epsg")]
    pub epsg: u32,

    /// Pas de densification (m)
    #[serde(default = "default_densify_step")]
    pub densify_step: f64,

    /// Nombre de résultats de recherche par défaut
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

fn default_epsg() -> u32 {
    32198
}

fn default_densify_step() -> f64 {
    rtss::feat_rtss::DEFAULT_DENSIFY_STEP
}

fn default_search_limit() -> usize {
    rtss::geocodage::DEFAULT_SEARCH_LIMIT
}

impl Config {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Charge une configuration depuis un preset embarqué
    pub fn from_preset(preset: &str) -> Result<Self> {
        match preset {
            "mtq" => Self::load_embedded(include_str!("presets/mtq.json")),
            "minimal" => Self::load_embedded(include_str!("presets/minimal.json")),
            _ => anyhow::bail!("Unknown preset: {}. Use: {}", preset, PRESETS.join(", ")),
        }
    }

    fn load_embedded(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse embedded config")
    }

    /// Preset par son nom, sinon chemin vers un JSON, puis surcharges d'environnement
    pub fn resolve(spec: &str) -> Result<Self> {
        let mut config = if PRESETS.contains(&spec) {
            Self::from_preset(spec)?
        } else {
            Self::load(Path::new(spec))?
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Applique `RTSS_EPSG` et `RTSS_DENSIFY_STEP`
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(epsg) = std::env::var("RTSS_EPSG") {
            self.epsg = epsg
                .trim()
                .parse()
                .context(format!("Invalid RTSS_EPSG: {}", epsg))?;
        }
        if let Ok(step) = std::env::var("RTSS_DENSIFY_STEP") {
            self.densify_step = step
                .trim()
                .parse()
                .context(format!("Invalid RTSS_DENSIFY_STEP: {}", step))?;
        }
        Ok(())
    }

    /// Référentiel de la source
    pub fn frame(&self) -> Result<ReferenceFrame> {
        ReferenceFrame::from_epsg(self.epsg).context("Unsupported source EPSG")
    }

    pub fn geocodage_options(&self) -> GeocodageOptions {
        GeocodageOptions {
            densify_step: self.densify_step,
            index_names: self.name_field.is_some(),
        }
    }
}
