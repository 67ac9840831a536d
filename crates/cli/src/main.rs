use std::fs;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use slime2schem::args::Args;
use slime2schem::{convert, output};
use slime2schem_format::read_world;

fn main() -> Result<()> {
    let config = Args::parse().into_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let start = Instant::now();
    tracing::info!("Reading slime world: {}", config.input.display());

    let data = fs::read(&config.input)
        .with_context(|| format!("reading input file {}", config.input.display()))?;
    let world = read_world(&data, &config.options).context("parsing slime world")?;
    drop(data);

    tracing::info!(
        "Parsed {} chunks (data version: {})",
        world.chunks.len(),
        world.data_version,
    );

    let result = convert::convert(world, &config.options).context("converting")?;
    let schem = result.schematic;
    let (width, height, length) = (schem.width(), schem.height(), schem.length());

    tracing::info!(
        "Converted {} non-air blocks ({} unique block states)",
        result.total_blocks,
        schem.palette_len(),
    );

    output::write_atomic(&config.output, |w| schem.save(w).context("saving schematic"))?;

    tracing::info!("Schematic saved to: {}", config.output.display());
    tracing::info!("Dimensions: {} x {} x {} (Width x Height x Length)", width, height, length);
    tracing::info!("Done in {:.2?}", start.elapsed());
    Ok(())
}
