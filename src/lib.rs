//! # nc2sp2
//!
//! Convert gridded spectral ocean-wave data (NetCDF, energy density over
//! time x location x frequency x direction) into SWAN SP2 spectral
//! boundary-condition files.
//!
//! The pipeline is a single deterministic batch transform:
//! - read coordinate axes, unit/convention metadata, and the density array
//!   ([`io::read_spectral_grid`]);
//! - normalize frequency units to Hz and direction angles to nautical
//!   bearings through one composed affine map ([`convention`]);
//! - re-sort both spectral axes into ascending order where the transform
//!   made them non-monotonic;
//! - serialize per-location, per-timestamp spectral blocks in SWAN's
//!   fixed-width SP2 grammar ([`io::sp2_writer`]), either one combined file
//!   or one file per location ([`convert::run_conversion`]).
//!
//! All errors are fatal to the run; partial output files are unreliable.

pub mod config;
pub mod convention;
pub mod convert;
pub mod error;
pub mod io;
pub mod spectrum;

pub use config::{ConverterConfig, OutputMode};
pub use convention::{
    AngleUnits, AxisOrder, Convention, DirectionOrigin, DirectionTransform, FrequencyUnits,
    RotationSense,
};
pub use convert::{list_input_files, run_conversion, ConversionReport};
pub use error::ConvertError;
pub use io::{read_spectral_grid, BlockFormatter, Sp2Header, Sp2Writer};
pub use spectrum::{NormalizedSpectrum, SpectralGrid, SpectralLocation};
