//! Point d'entrée CLI pour rtss

use anyhow::Result;
use clap::Parser;
use tracing::{debug, Level};
use tracing_subscriber::{fmt, EnvFilter};

use rtss::InterpolationParams;

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant ou parent
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::Commands;

/// Référence linéaire RTSS: géocodage, localisation et segmentation du réseau routier
#[derive(Parser)]
#[command(name = "rtss")]
#[command(author, version)]
#[command(about = "Géocodage et segmentation d'un réseau routier en référence linéaire RTSS")]
#[command(long_about = "Convertit entre positions routières (RTSS + chaînage + décalage) et coordonnées planes, recherche des routes et segmente le réseau d'après des plages d'attributs ou des mesures ponctuelles.\n\nLes routes sont lues depuis un GeoJSON dont les propriétés sont décrites par la configuration (preset mtq/minimal ou fichier JSON).")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    // Configurer le logging
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Geocode {
            network,
            rtss,
            chainage,
            offset,
            no_densify,
        } => {
            debug!(rtss = %rtss, chainage = %chainage, offset, "Geocode");
            cli::cmd_geocode(&network, &rtss, &chainage, offset, !no_densify)?;
        }
        Commands::Locate {
            network,
            x,
            y,
            max_dist,
            rtss,
        } => {
            debug!(x, y, max_dist, "Locate");
            cli::cmd_locate(&network, x, y, max_dist, rtss.as_deref())?;
        }
        Commands::Search {
            network,
            query,
            limit,
        } => {
            debug!(query = %query, "Search");
            cli::cmd_search(&network, &query, limit)?;
        }
        Commands::Segment {
            network,
            ranges,
            output,
        } => {
            debug!(ranges = %ranges.display(), output = %output.output.display(), "Segment");
            cli::cmd_segment(&network, &ranges, &output)?;
        }
        Commands::Interpolate {
            network,
            measurements,
            value_field,
            rtss_field,
            match_route,
            step,
            max_dist,
            attribute,
            output,
        } => {
            debug!(measurements = %measurements.display(), step, max_dist, "Interpolate");
            let params = InterpolationParams {
                step,
                max_dist,
                attribute: attribute.unwrap_or_else(|| value_field.clone()),
                match_route,
            };
            cli::cmd_interpolate(
                &network,
                &measurements,
                &value_field,
                rtss_field.as_deref(),
                params,
                &output,
            )?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // stdout reste réservé aux résultats
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
