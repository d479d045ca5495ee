use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "biomap")]
#[command(about = "BioMap - biomass production maps of Brazil")]
#[command(version)]
#[command(long_about = "
BioMap draws choropleth maps of biomass production per municipality or state, with
processing units and consumption centers as point markers.

Examples:
  biomap render --dataset cana --output cana.png --legend cana_legend.png
  biomap render --dataset cana --region SP --output cana_sp.png --svg cana_sp.svg
  biomap scale --dataset cana --region 'Minas Gerais' --buckets 6
  biomap info --dataset cana
  biomap config --example > biomap.toml
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Data directory (overrides [data].root)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a map to PNG, with optional legends and SVG export
    Render {
        /// Dataset prefix under biomass/ (the bare state map when omitted)
        #[arg(short, long)]
        dataset: Option<String>,

        /// Region to show: a state code, a state name, or "Brasil"
        #[arg(short, long, default_value = "Brasil")]
        region: String,

        /// Output PNG file
        #[arg(short, long, required = true)]
        output: PathBuf,

        /// Write the colorbar to this PNG file
        #[arg(long)]
        legend: Option<PathBuf>,

        /// Also export the map (and its colorbar) as SVG
        #[arg(long)]
        svg: Option<PathBuf>,

        /// Directory for the per-layer unit legends
        #[arg(long)]
        units_legend_dir: Option<PathBuf>,

        /// Unit layers to leave off the map
        #[arg(long, num_args = 1..)]
        hide_units: Vec<String>,

        /// Width in pixels
        #[arg(long)]
        width: Option<u32>,

        /// Height in pixels
        #[arg(long)]
        height: Option<u32>,
    },

    /// Print a dataset's metadata
    Info {
        /// Dataset prefix under biomass/
        #[arg(short, long, required = true)]
        dataset: String,
    },

    /// Print the color scale boundaries for a region
    Scale {
        /// Dataset prefix under biomass/
        #[arg(short, long, required = true)]
        dataset: String,

        /// Region: a state code, a state name, or "Brasil"
        #[arg(short, long, default_value = "Brasil")]
        region: String,

        /// Number of edges of the discretized scale
        #[arg(long)]
        buckets: Option<usize>,
    },

    /// List datasets and unit tables in the data directory
    List,

    /// Show configuration
    Config {
        /// Print an example biomap.toml
        #[arg(long)]
        example: bool,
    },
}

fn setup_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(root) = cli.data_dir {
        config.data.root = root;
    }

    match cli.command {
        Commands::Render {
            dataset,
            region,
            output,
            legend,
            svg,
            units_legend_dir,
            hide_units,
            width,
            height,
        } => {
            commands::render::execute(
                &config,
                dataset,
                region,
                output,
                legend,
                svg,
                units_legend_dir,
                hide_units,
                width,
                height,
            )?;
        }

        Commands::Info { dataset } => {
            commands::info::execute(&config, &dataset)?;
        }

        Commands::Scale { dataset, region, buckets } => {
            commands::scale::execute(&config, &dataset, &region, buckets)?;
        }

        Commands::List => {
            commands::list::execute(&config)?;
        }

        Commands::Config { example } => {
            if example {
                print!("{}", Config::example_toml()?);
            } else {
                print!("{}", toml::to_string_pretty(&config)?);
            }
        }
    }

    Ok(())
}
