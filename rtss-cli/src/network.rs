//! Construction du registre de routes depuis une source GeoJSON

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use rtss::Geocodage;

use crate::config::Config;
use crate::report::RunReport;
use crate::source::{read_routes, RouteSource};

/// Lit la source et construit le registre; les routes invalides sont
/// consignées dans le rapport et ignorées
pub fn load_registry(path: &Path, config: &Config, report: &mut RunReport) -> Result<Geocodage> {
    let source = read_routes(path, config)?;
    report.record_rejected(&source.rejected);
    build_registry(source, config, report)
}

/// Construit le registre à partir de routes déjà lues
pub fn build_registry(
    source: RouteSource,
    config: &Config,
    report: &mut RunReport,
) -> Result<Geocodage> {
    let mut registry = Geocodage::new(config.frame()?, config.geocodage_options())
        .context("Route source frame must be metric")?;

    for record in source.records {
        let code = record.rtss.clone();
        if let Err(e) = registry.add_record(record) {
            warn!(rtss = %code, error = %e, "Route rejected");
            report.record_route_error(&code, e.kind(), &e.to_string());
        }
    }

    if registry.is_empty() {
        anyhow::bail!("No valid route in source: {}", config.rtss_field);
    }

    report.routes_loaded = registry.len();
    info!(
        routes = registry.len(),
        frame = %registry.frame(),
        "Route network loaded"
    );
    Ok(registry)
}
