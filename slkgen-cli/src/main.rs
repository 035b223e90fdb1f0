use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use slkgen_core::{run, ConverterSettings};

#[derive(Debug, Parser)]
#[command(name = "slkgen", version, about = "Writes Warcraft III unit SLK files from resolved unit data")]
struct Args {
    /// Resolved units JSON (field ID to value per unit).
    #[arg(long)]
    input: PathBuf,

    /// Field catalog JSON describing every field ID.
    #[arg(long)]
    catalog: PathBuf,

    /// Directory holding the SLK header templates, or an asset root above it.
    #[arg(long, default_value = "assets/Units")]
    templates: PathBuf,

    #[arg(long)]
    output: PathBuf,

    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let settings = ConverterSettings {
        input_path: args.input,
        catalog_path: args.catalog,
        template_path: args.templates,
        output_path: args.output,
    };

    match run(settings) {
        Ok(summary) => {
            info!(
                units = summary.units,
                files = summary.files_written.len(),
                skipped_fields = summary.anomalies.len(),
                "done"
            );
        }
        Err(err) => {
            error!("{err}");
            std::process::exit(1);
        }
    }
}
