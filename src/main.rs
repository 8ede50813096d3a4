//! nc2sp2 command-line entry point.
//!
//! Converts one NetCDF wave-spectra file, or every matching file in a
//! directory, into SWAN SP2 spectral boundary files.

use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use nc2sp2::{
    list_input_files, run_conversion, AngleUnits, Convention, ConverterConfig, DirectionOrigin,
    OutputMode, RotationSense,
};

#[derive(Parser, Debug)]
#[command(
    name = "nc2sp2",
    version,
    about = "Convert NetCDF wave spectra to SWAN SP2 spectral boundary files"
)]
struct Args {
    /// Input NetCDF file, or a directory to convert in batch
    input: PathBuf,

    /// Output directory for SP2 files
    #[arg(long, short = 'o', default_value = "converted_sp2_files")]
    out_dir: PathBuf,

    /// Output filename prefix (defaults to each input file's stem)
    #[arg(long)]
    prefix: Option<String>,

    /// Write one SP2 file per location instead of one combined file
    #[arg(long)]
    per_location: bool,

    /// Direction origin assumed when the file declares none
    #[arg(long, value_enum, default_value_t = OriginArg::North)]
    origin: OriginArg,

    /// Rotation sense assumed when the file declares none
    #[arg(long, value_enum, default_value_t = SenseArg::Cw)]
    sense: SenseArg,

    /// Direction units assumed when the file declares none
    #[arg(long, value_enum, default_value_t = UnitsArg::Degrees)]
    units: UnitsArg,

    /// Fail instead of assuming a default convention when metadata is missing
    #[arg(long)]
    strict_metadata: bool,

    /// Clamp densities strictly below this threshold to zero
    #[arg(long, allow_negative_numbers = true)]
    clamp: Option<f64>,

    /// SP2 exception value written for missing bins
    #[arg(long, default_value_t = -99.0, allow_negative_numbers = true)]
    exception: f64,

    /// SWAN version string for the file header
    #[arg(long, default_value = "41.41")]
    swan_version: String,

    /// Project name for the file header
    #[arg(long, default_value = "WaveDataProject")]
    project: String,

    /// Run number for the file header
    #[arg(long, default_value = "1.0")]
    run_number: String,

    /// Only convert these location ids (comma separated)
    #[arg(long, value_delimiter = ',')]
    locations: Vec<String>,

    /// Start of the time range to convert (RFC 3339)
    #[arg(long)]
    from: Option<DateTime<Utc>>,

    /// End of the time range to convert (RFC 3339)
    #[arg(long)]
    to: Option<DateTime<Utc>>,

    /// Filename prefix filter in batch directory mode
    #[arg(long, default_value = "esp_")]
    batch_prefix: String,

    /// Overwrite existing output files instead of skipping them
    #[arg(long)]
    overwrite: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum OriginArg {
    North,
    East,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum SenseArg {
    /// Clockwise
    Cw,
    /// Counter-clockwise
    Ccw,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum UnitsArg {
    Degrees,
    Radians,
}

impl Args {
    fn default_convention(&self) -> Option<Convention> {
        if self.strict_metadata {
            return None;
        }
        Some(Convention {
            origin: match self.origin {
                OriginArg::North => DirectionOrigin::North,
                OriginArg::East => DirectionOrigin::East,
            },
            sense: match self.sense {
                SenseArg::Cw => RotationSense::Clockwise,
                SenseArg::Ccw => RotationSense::CounterClockwise,
            },
            units: match self.units {
                UnitsArg::Degrees => AngleUnits::Degrees,
                UnitsArg::Radians => AngleUnits::Radians,
            },
        })
    }

    fn config_for(&self, input: PathBuf) -> ConverterConfig {
        let mut config = ConverterConfig::new(input, self.out_dir.clone())
            .with_default_convention(self.default_convention())
            .with_clamp_threshold(self.clamp)
            .with_exception_value(self.exception)
            .with_mode(if self.per_location {
                OutputMode::PerLocation
            } else {
                OutputMode::Combined
            })
            .with_overwrite(self.overwrite);
        config.swan_version = self.swan_version.clone();
        config.project_name = self.project.clone();
        config.run_number = self.run_number.clone();
        if let Some(ref prefix) = self.prefix {
            config = config.with_prefix(prefix.clone());
        }
        if !self.locations.is_empty() {
            config = config.with_location_subset(self.locations.clone());
        }
        if self.from.is_some() || self.to.is_some() {
            config = config.with_time_range(
                self.from.unwrap_or(DateTime::<Utc>::MIN_UTC),
                self.to.unwrap_or(DateTime::<Utc>::MAX_UTC),
            );
        }
        config
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let args = Args::parse();

    let inputs = if args.input.is_dir() {
        let files = list_input_files(&args.input, Some(&args.batch_prefix))
            .with_context(|| format!("scanning {}", args.input.display()))?;
        if files.is_empty() {
            bail!(
                "no {}*.nc files found in {}",
                args.batch_prefix,
                args.input.display()
            );
        }
        files
    } else {
        vec![args.input.clone()]
    };

    let bar = ProgressBar::new(inputs.len() as u64).with_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
            .expect("valid progress template"),
    );

    let mut files_written = 0usize;
    let mut blocks_written = 0usize;
    for input in &inputs {
        bar.set_message(
            input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
        let config = args.config_for(input.clone());
        let report = run_conversion(&config)
            .map_err(|e| anyhow::anyhow!("{}: {e}", e.kind()))
            .with_context(|| format!("converting {}", input.display()))?;
        files_written += report.output_files.len();
        blocks_written += report.blocks_written;
        bar.inc(1);
    }
    bar.finish_and_clear();

    info!(
        inputs = inputs.len(),
        files_written, blocks_written, "conversion complete"
    );
    Ok(())
}
