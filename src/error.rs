//! Error taxonomy for the conversion pipeline.
//!
//! Every failure is fatal to the run: the converter is a deterministic batch
//! transform over static input, so retrying without changing the input or
//! configuration cannot succeed. Errors carry enough context (location id,
//! timestamp, field) to diagnose the failing block.

use thiserror::Error;

/// Error type for NetCDF-to-SP2 conversion.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Malformed or missing input structure (dimension, coordinate variable,
    /// or a shape that does not match the advertised dimension lengths).
    #[error("schema error: {0}")]
    Schema(String),

    /// Required unit/convention metadata is absent and no default is
    /// configured.
    #[error("metadata error: {0}")]
    Metadata(String),

    /// Unit or convention flags produce an ambiguous or unsupported mapping.
    #[error("convention error: {0}")]
    Convention(String),

    /// A density value cannot be represented in the output grammar's
    /// fixed-width field.
    #[error("range error at location {location}, time {time}: value {value} does not fit a {width}-character field")]
    Range {
        location: String,
        time: String,
        value: f64,
        width: usize,
    },

    /// I/O failure while writing output.
    #[error("write error: {0}")]
    Write(#[from] std::io::Error),

    /// Underlying NetCDF library failure while reading input.
    #[error("schema error: {0}")]
    NetCDF(#[from] netcdf::Error),
}

impl ConvertError {
    /// Short kind tag for CLI error reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            ConvertError::Schema(_) | ConvertError::NetCDF(_) => "SchemaError",
            ConvertError::Metadata(_) => "MetadataError",
            ConvertError::Convention(_) => "ConventionError",
            ConvertError::Range { .. } => "RangeError",
            ConvertError::Write(_) => "WriteError",
        }
    }
}
