//! I/O: NetCDF spectral input and SWAN SP2 text output.

pub mod netcdf_reader;
pub mod sp2_writer;

pub use netcdf_reader::read_spectral_grid;
pub use sp2_writer::{format_swan_time, BlockFormatter, Sp2Header, Sp2Writer, DENSITY_FIELD_WIDTH};
