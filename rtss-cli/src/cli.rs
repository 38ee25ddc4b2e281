//! Définition et implémentation des commandes CLI
//!
//! - `geocode`: point RTSS → coordonnées
//! - `locate`: coordonnées → point RTSS
//! - `search`: recherche approximative d'une route
//! - `segment`: plages d'attributs → segments GeoJSON
//! - `interpolate`: mesures ponctuelles → segments GeoJSON

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use geo::Point;
use tracing::info;

use rtss::{Chainage, Geocodage, InterpolationParams, PointRtss, ReseauSegmenter, Rtss};
use rtss_cli::export::export_to_geojson;
use rtss_cli::source::{read_measurements, read_ranges};
use rtss_cli::{load_registry, Config, RunReport, RunStatus};

/// Route network source
#[derive(Args, Debug)]
pub struct NetworkArgs {
    /// Routes GeoJSON (one LineString per route)
    #[arg(short, long)]
    pub routes: PathBuf,

    /// Config preset name (mtq/minimal) or path to a JSON config
    #[arg(long, default_value = "minimal")]
    pub config: String,
}

/// Output of the segmentation commands
#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Output GeoJSON file for the segments
    #[arg(short, long)]
    pub output: PathBuf,

    /// Write the run report as JSON to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Skip densification when building segment geometries
    #[arg(long)]
    pub no_densify: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute the coordinates of a route position (RTSS, chainage, offset)
    Geocode {
        #[command(flatten)]
        network: NetworkArgs,

        /// Route code (e.g. 00010-01-210-000C or 10-1-210-C)
        #[arg(long)]
        rtss: String,

        /// Chainage in metres or km+m (e.g. 2+293.5)
        #[arg(long)]
        chainage: String,

        /// Lateral offset in metres, right of the route is positive
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        offset: f64,

        /// Use the raw segment direction instead of the densified tangent
        #[arg(long)]
        no_densify: bool,
    },

    /// Locate coordinates on the nearest route
    Locate {
        #[command(flatten)]
        network: NetworkArgs,

        /// X coordinate in the route source frame
        #[arg(allow_negative_numbers = true)]
        x: f64,

        /// Y coordinate in the route source frame
        #[arg(allow_negative_numbers = true)]
        y: f64,

        /// Maximum distance to the route (metres)
        #[arg(long, default_value_t = 50.0)]
        max_dist: f64,

        /// Force the route instead of searching the nearest one
        #[arg(long)]
        rtss: Option<String>,
    },

    /// Fuzzy search of a route by code or name
    Search {
        #[command(flatten)]
        network: NetworkArgs,

        /// Text to search (partial code or route name)
        query: String,

        /// Maximum number of results (default: config search_limit)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Segment routes from attribute ranges (JSON array)
    Segment {
        #[command(flatten)]
        network: NetworkArgs,

        /// Attribute ranges: [{"rtss", "chainage_d", "chainage_f", "attributes", "offsets"}]
        #[arg(long)]
        ranges: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Segment routes from the nearest point measurement
    Interpolate {
        #[command(flatten)]
        network: NetworkArgs,

        /// Measurement points GeoJSON
        #[arg(short, long)]
        measurements: PathBuf,

        /// Property holding the measured value
        #[arg(long)]
        value_field: String,

        /// Property holding the route of each measurement
        #[arg(long)]
        rtss_field: Option<String>,

        /// Only use measurements of the same route number
        #[arg(long, requires = "rtss_field")]
        match_route: bool,

        /// Sampling step along each route (metres)
        #[arg(long, default_value_t = 10.0)]
        step: f64,

        /// Maximum distance from a sample to a measurement (metres)
        #[arg(long, default_value_t = 50.0)]
        max_dist: f64,

        /// Name of the produced attribute (default: value_field)
        #[arg(long)]
        attribute: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },
}

/// Charge la configuration puis le réseau
fn open_network(args: &NetworkArgs, report: &mut RunReport) -> Result<(Config, Geocodage)> {
    let config = Config::resolve(&args.config)
        .context(format!("Failed to load config: {}", args.config))?;
    let registry = load_registry(&args.routes, &config, report)?;
    Ok((config, registry))
}

/// Réseau des commandes de consultation: les rejets sont journalisés,
/// stdout ne porte que le résultat
fn open_lookup_network(command: &str, args: &NetworkArgs) -> Result<(Config, Geocodage)> {
    let mut report = RunReport::new(command);
    let opened = open_network(args, &mut report)?;
    report.log_network();
    Ok(opened)
}

/// Exécute la commande geocode
pub fn cmd_geocode(
    network: &NetworkArgs,
    rtss: &str,
    chainage: &str,
    offset: f64,
    densify: bool,
) -> Result<()> {
    let (_, registry) = open_lookup_network("geocode", network)?;

    let rtss = Rtss::new(rtss)?;
    let chainage = Chainage::parse(chainage)?;
    let feat = registry.get(&rtss)?;
    if !feat.contains_chainage(chainage) {
        info!(
            rtss = %rtss,
            chainage = chainage.value(),
            "Chainage outside route domain, clamped"
        );
    }

    let point = feat.geocoder_point(&PointRtss::new(rtss, chainage, offset), densify)?;
    println!("{:.3} {:.3}", point.x(), point.y());
    Ok(())
}

/// Exécute la commande locate
pub fn cmd_locate(
    network: &NetworkArgs,
    x: f64,
    y: f64,
    max_dist: f64,
    rtss: Option<&str>,
) -> Result<()> {
    let (_, registry) = open_lookup_network("locate", network)?;
    let query = Point::new(x, y);

    let located = match rtss {
        Some(code) => {
            let rtss = Rtss::new(code)?;
            registry
                .geocoder_point_on_rtss(&query, &rtss, Some(max_dist))?
                .with_context(|| format!("Point is farther than {} m from {}", max_dist, rtss))?
        }
        None => registry.geocoder_inv_point(&query, max_dist)?,
    };

    println!(
        "{} {} {:.3}",
        located.rtss().formatted(),
        located.chainage().formatted(3),
        located.offset()
    );
    Ok(())
}

/// Exécute la commande search
pub fn cmd_search(network: &NetworkArgs, query: &str, limit: Option<usize>) -> Result<()> {
    let (config, registry) = open_lookup_network("search", network)?;
    let limit = limit.unwrap_or(config.search_limit);

    let results = registry.search(query, limit);
    if results.is_empty() {
        println!("No route matches {:?}", query);
        return Ok(());
    }

    for (rtss, score) in results {
        match registry.name(&rtss) {
            Some(name) => println!("{}  {:.3}  {}", rtss.formatted(), score, name),
            None => println!("{}  {:.3}", rtss.formatted(), score),
        }
    }
    Ok(())
}

/// Exécute la commande segment
pub fn cmd_segment(network: &NetworkArgs, ranges: &Path, output: &OutputArgs) -> Result<()> {
    let started_at = Instant::now();
    let mut report = RunReport::new("segment");
    let (_, registry) = open_network(network, &mut report)?;

    let ranges = read_ranges(ranges)?;
    report.inputs_read = ranges.len();
    info!(ranges = ranges.len(), "Attribute ranges read");

    let mut segmenter = ReseauSegmenter::new(registry);
    let build = segmenter.add_ranges(ranges);
    report.record_build(&build);

    write_segments(&segmenter, output, &mut report)?;
    finish(report, started_at, output.report.as_deref())
}

/// Exécute la commande interpolate
pub fn cmd_interpolate(
    network: &NetworkArgs,
    measurements: &Path,
    value_field: &str,
    rtss_field: Option<&str>,
    params: InterpolationParams,
    output: &OutputArgs,
) -> Result<()> {
    let started_at = Instant::now();
    let mut report = RunReport::new("interpolate");
    let (_, registry) = open_network(network, &mut report)?;

    let source = read_measurements(measurements, value_field, rtss_field)?;
    report.record_rejected(&source.rejected);
    report.inputs_read = source.measurements.len();
    if source.measurements.is_empty() {
        anyhow::bail!("No valid measurement in {}", measurements.display());
    }

    let mut segmenter = ReseauSegmenter::new(registry);
    let build = segmenter
        .interpolate_nearest(&source.measurements, &params)
        .context("Interpolation failed")?;
    report.record_build(&build);

    write_segments(&segmenter, output, &mut report)?;
    finish(report, started_at, output.report.as_deref())
}

fn write_segments(
    segmenter: &ReseauSegmenter,
    output: &OutputArgs,
    report: &mut RunReport,
) -> Result<()> {
    let features = segmenter
        .create_features(!output.no_densify)
        .context("Failed to build segment geometries")?;
    export_to_geojson(&features, &segmenter.geocodage().frame(), &output.output)?;
    report.features_written = features.len();

    info!(
        segments = features.len(),
        output = %output.output.display(),
        "Segments written"
    );
    Ok(())
}

fn finish(mut report: RunReport, started_at: Instant, report_path: Option<&Path>) -> Result<()> {
    report.set_duration(started_at.elapsed());
    report.finalize();
    report.display();

    if let Some(path) = report_path {
        report
            .save_to_file(path)
            .context(format!("Failed to write report: {}", path.display()))?;
    }

    if report.status == RunStatus::Failed {
        anyhow::bail!("{}", report.summary());
    }
    Ok(())
}
