//! Gather sampled frames from LAMMPS dumps into a single extended xyz file.
use std::io::Write;
use std::num::NonZeroU64;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use env_logger::{Builder, Env};
use log::LevelFilter;

use dumpxyz::config::parse_type_mapping;
use dumpxyz::{batch, Config, ConfigError, ErrorPolicy};

fn type_mapping_parser(s: &str) -> Result<(String, String), ConfigError> {
    parse_type_mapping(s)
}

/// Convert the selected frames of all LAMMPS dumps below a directory into one extended xyz file.
///
/// Settings are read from `dumpxyz.toml` in the working directory if it exists (or from the file
/// given with `--config`). Flags given here take precedence over the file.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Directory that is searched recursively for dump files.
    input: Option<PathBuf>,

    /// Output path (extxyz).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file (toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Keep every frame whose timestep is a multiple of this value.
    #[arg(long)]
    stride: Option<NonZeroU64>,

    /// Largest timestep to keep (inclusive).
    #[arg(long)]
    max_timestep: Option<u64>,

    /// Map an atom type onto a species, as `TOKEN=SPECIES`. May be given multiple times.
    ///
    /// When given, these mappings replace the configured type map entirely.
    /// Atom types that are not mapped are written as `X`.
    #[arg(short, long = "type", value_parser = type_mapping_parser)]
    types: Vec<(String, String)>,

    /// Value of the `name` key in every block.
    #[arg(long)]
    name: Option<String>,

    /// File name suffix of dump files.
    #[arg(long)]
    suffix: Option<String>,

    /// Number of worker threads. Defaults to the available parallelism.
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Leave malformed files out of the output instead of aborting.
    #[arg(long)]
    skip_malformed: bool,

    /// Print the effective configuration as toml and exit.
    #[arg(long)]
    print_config: bool,

    /// Increase the log level (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Args {
    fn log_level(&self) -> LevelFilter {
        match (self.quiet, self.verbose) {
            (true, _) => LevelFilter::Warn,
            (false, 0) => LevelFilter::Info,
            (false, 1) => LevelFilter::Debug,
            (false, _) => LevelFilter::Trace,
        }
    }

    /// Layer the flags that were given on top of `config`.
    fn apply(self, mut config: Config) -> Config {
        if let Some(input) = self.input {
            config.input_dir = input;
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        if let Some(stride) = self.stride {
            config.sampling.stride = stride;
        }
        if let Some(max_timestep) = self.max_timestep {
            config.sampling.max_timestep = max_timestep;
        }
        if !self.types.is_empty() {
            config.type_map = self.types.into_iter().collect();
        }
        if let Some(name) = self.name {
            config.name = name;
        }
        if let Some(suffix) = self.suffix {
            config.suffix = suffix;
        }
        if self.jobs.is_some() {
            config.jobs = self.jobs;
        }
        if self.skip_malformed {
            config.on_error = ErrorPolicy::Skip;
        }
        config
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // RUST_LOG still wins over the flags.
    Builder::new()
        .filter_level(args.log_level())
        .parse_env(Env::default())
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    let config = Config::load(args.config.as_deref())?;
    let print_config = args.print_config;
    let config = args.apply(config);

    if print_config {
        print!("{}", config.to_toml().context("could not serialize the configuration")?);
        return Ok(());
    }

    let summary = batch::run(&config)?;
    if summary.failed > 0 {
        log::warn!(
            "{} of {} files were skipped because they could not be read",
            summary.failed,
            summary.files
        );
    }
    Ok(())
}
