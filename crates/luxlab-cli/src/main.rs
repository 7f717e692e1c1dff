mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use luxlab_core::{Plan, PricingStrategy};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "luxlab-cli")]
#[command(about = "Convert luxury catalog pages into priced B2B workbooks")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one conversion in-process and write the workbook
    Convert {
        /// Catalog listing URL
        #[arg(long)]
        url: String,

        /// aggressive, balanced, premium or custom
        #[arg(long, default_value = "balanced")]
        strategy: PricingStrategy,

        /// Target margin for the custom strategy, e.g. 0.4
        #[arg(long)]
        custom_margin: Option<f64>,

        /// Plan whose entitlements apply to this run
        #[arg(long, default_value = "professional")]
        plan: Plan,

        /// Output directory; defaults to LUXLAB_EXPORT_DIR
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Preview the first entries of a catalog page
    Analyze {
        #[arg(long)]
        url: String,

        #[arg(long, default_value = "trial")]
        plan: Plan,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut config = luxlab_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Convert {
            url,
            strategy,
            custom_margin,
            plan,
            out,
        }) => {
            if let Some(out) = out {
                config.export_dir = out;
            }
            commands::run_convert(&config, url, strategy, custom_margin, plan).await?;
        }
        Some(Commands::Analyze { url, plan }) => {
            commands::run_analyze(&config, &url, plan).await?;
        }
        None => println!("luxlab-cli: use `convert` or `analyze` (see --help)"),
    }

    Ok(())
}
