//! Converter configuration.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::convention::Convention;

/// How output files are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// One SP2 file holding every location (SWAN multi-location layout).
    #[default]
    Combined,
    /// One SP2 file per location, named after the location id.
    PerLocation,
}

/// Configuration for one conversion run.
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    /// Input NetCDF path.
    pub input: PathBuf,
    /// Directory receiving SP2 output.
    pub output_dir: PathBuf,
    /// Output filename prefix; defaults to the input file stem.
    pub prefix: Option<String>,
    /// Convention assumed when the file carries no convention attributes.
    /// `None` means such a file is a metadata error.
    pub default_convention: Option<Convention>,
    /// Densities strictly below this threshold are clamped to zero; a value
    /// exactly at the threshold is kept. `None` disables clamping.
    pub clamp_threshold: Option<f64>,
    /// SP2 exception value, written to the header and used as the sentinel
    /// token for fill bins.
    pub exception_value: f64,
    /// SWAN version string for the header.
    pub swan_version: String,
    /// Project name for the header.
    pub project_name: String,
    /// Run number for the header.
    pub run_number: String,
    pub mode: OutputMode,
    /// When set, only these location ids are converted, in input order.
    pub location_subset: Option<Vec<String>>,
    /// When set, only timestamps inside this inclusive range are converted.
    pub time_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    /// Overwrite existing output files instead of skipping them.
    pub overwrite: bool,
}

impl ConverterConfig {
    /// Create a configuration with the original tool's defaults.
    pub fn new(input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output_dir: output_dir.into(),
            prefix: None,
            default_convention: Some(Convention::nautical()),
            clamp_threshold: None,
            exception_value: -99.0,
            swan_version: "41.41".to_string(),
            project_name: "WaveDataProject".to_string(),
            run_number: "1.0".to_string(),
            mode: OutputMode::Combined,
            location_subset: None,
            time_range: None,
            overwrite: false,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_default_convention(mut self, convention: Option<Convention>) -> Self {
        self.default_convention = convention;
        self
    }

    pub fn with_clamp_threshold(mut self, threshold: Option<f64>) -> Self {
        self.clamp_threshold = threshold;
        self
    }

    pub fn with_exception_value(mut self, value: f64) -> Self {
        self.exception_value = value;
        self
    }

    pub fn with_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_location_subset(mut self, ids: Vec<String>) -> Self {
        self.location_subset = Some(ids);
        self
    }

    pub fn with_time_range(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.time_range = Some((from, to));
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Output filename stem: the configured prefix or the input file stem.
    pub fn output_stem(&self) -> String {
        match self.prefix {
            Some(ref p) => p.clone(),
            None => Path::new(&self.input)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "output".to_string()),
        }
    }

    /// Output path for the combined-mode file.
    pub fn combined_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.sp2", self.output_stem()))
    }

    /// Output path for one location in per-location mode.
    pub fn location_path(&self, location_id: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{}.sp2", self.output_stem(), location_id))
    }
}
