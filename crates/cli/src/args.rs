//! Command-line options.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{ArgGroup, Parser};
use slime2schem_format::DecodeOptions;

#[derive(Parser, Debug)]
#[command(
    name = "slime2schem",
    version,
    about = "Converts a SlimeWorld (.slime) file to Sponge Schematic v3 (.schem) format.",
    after_help = "The output schematic can be pasted in Minecraft using WorldEdit:\n  //schematic load <filename>\n  //paste"
)]
#[command(group(ArgGroup::new("source").required(true).args(["input", "input_flag"])))]
pub struct Args {
    /// Path to the .slime file to convert
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Path to the .slime file to convert (alternative to INPUT)
    #[arg(short = 'i', long = "input", value_name = "FILE")]
    input_flag: Option<PathBuf>,

    /// Path for the output .schem file (default: input name with .schem extension)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Fail on corrupt packed block data or malformed entity records instead
    /// of falling back
    #[arg(long, env = "SLIME2SCHEM_STRICT")]
    strict: bool,
}

/// Resolved run configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
    pub options: DecodeOptions,
}

impl Args {
    pub fn into_config(self) -> Result<Config> {
        let Some(input) = self.input.or(self.input_flag) else {
            bail!("no input file given");
        };
        let output = self.output.unwrap_or_else(|| input.with_extension("schem"));
        Ok(Config {
            input,
            output,
            options: DecodeOptions { strict: self.strict },
        })
    }
}
