//! `ffslicer` — slice one or more STL volumes into G-code.

mod config;
mod pipeline;
mod session;
mod stl;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use config::{parse_override_args, PrintConfig};
use pipeline::Pipeline;
use session::Session;

/// Slice STL volumes into G-code for a single print.
#[derive(Parser, Debug)]
#[command(name = "ffslicer", version, about)]
struct Cli {
    /// Input STL file(s), one volume each, in extruder order.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output G-code path.
    #[arg(short = 'o', long, default_value = "out.gcode")]
    output: PathBuf,

    /// Extruder index for each input, e.g. `--extruder 0 --extruder 1`.
    /// Defaults to extruder 0 for every input not given one explicitly.
    #[arg(long = "extruder")]
    extruders: Vec<u32>,

    /// Configuration override, repeatable: `-s key=value`.
    #[arg(short = 's', long = "set")]
    overrides: Vec<String>,

    /// Load a `PrintConfig` JSON sidecar before applying `-s` overrides.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut print_config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config file {}", path.display()))?
        }
        None => PrintConfig::default(),
    };

    let overrides = parse_override_args(&cli.overrides).map_err(anyhow::Error::from)?;
    print_config
        .apply_overrides(&overrides)
        .map_err(anyhow::Error::from)?;

    let pipeline = Pipeline::new(print_config).map_err(anyhow::Error::from)?;
    pipeline.pre_setup().map_err(anyhow::Error::from)?;

    let mut volumes_raw = Vec::with_capacity(cli.inputs.len());
    for (i, path) in cli.inputs.iter().enumerate() {
        let triangles = stl::load_stl(path).map_err(anyhow::Error::from)?;
        let extruder = cli.extruders.get(i).copied().unwrap_or(0);
        info!(path = %path.display(), extruder, triangles = triangles.len(), "loaded volume");
        volumes_raw.push((triangles, extruder));
    }

    let model = pipeline.prepare_model(volumes_raw).map_err(anyhow::Error::from)?;
    let slice_data = pipeline
        .process_slice_data(&model)
        .map_err(anyhow::Error::from)?;

    let mut session = Session::new(pipeline.profile().clone(), pipeline.planner_settings(), 0);

    let gcode = pipeline.write_gcode(&slice_data, &mut session);
    pipeline
        .finalize(&gcode, &cli.output)
        .with_context(|| format!("writing output file {}", cli.output.display()))?;

    Ok(())
}
