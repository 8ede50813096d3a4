//! SWAN SP2 spectral file output.
//!
//! Writes the SWAN "standard spectral file" layout:
//!
//! ```text
//! SWAN   1                                Swan standard spectral file, version
//! $   Data produced by SWAN version 41.41
//! $   Project: WaveDataProject        ;  run number: 1.0
//! TIME                                    time-dependent data
//!      1                                  time coding option
//! LONLAT                                  locations in spherical coordinates
//!      1                                  number of locations
//!     5.3200    60.3900
//! AFREQ                                   absolute frequencies in Hz
//!      3                                  number of frequencies
//!     0.1000
//! ...
//! QUANT
//!      1                                  number of quantities in table
//! EnDens                                  energy densities in J/m2/Hz/degr
//! J/m2/Hz/degr                            unit
//! -9.9000e+01                          exception value
//! 20240101.000000                         date and time
//! FACTOR
//! 1.0000000000000000e+00
//!      1      1      1      1
//! ...
//! ```
//!
//! Field widths, precision, and the exception sentinel are compatibility
//! critical and reproduced byte-for-byte: `%10.4f` coordinates, frequencies
//! and directions; six-wide integer density fields; `%.16e` FACTOR lines;
//! `%10.4e` exception value; timestamps as `YYYYMMDD.HHMMSS`.
//!
//! Each spectral block is assembled into a buffer and written as one unit,
//! so an I/O failure never leaves half a block in the file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::ConvertError;
use crate::spectrum::{NormalizedSpectrum, SpectralLocation};

/// Width of one integer density field.
pub const DENSITY_FIELD_WIDTH: usize = 6;

/// Header metadata for one SP2 document.
#[derive(Debug, Clone)]
pub struct Sp2Header {
    pub swan_version: String,
    pub project_name: String,
    pub run_number: String,
    pub exception_value: f64,
}

/// Format a timestamp in SWAN time coding option 1 (`YYYYMMDD.HHMMSS`).
pub fn format_swan_time(t: &DateTime<Utc>) -> String {
    t.format("%Y%m%d.%H%M%S").to_string()
}

/// C-style scientific notation (`-9.9000e+01`): fixed decimal count and a
/// signed two-digit exponent. Rust's `{:e}` writes bare one-digit exponents,
/// which would break byte compatibility with the target format.
fn format_exp(value: f64, precision: usize) -> String {
    let s = format!("{value:.precision$e}");
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exp.abs())
        }
        None => s,
    }
}

/// Formatter for per-(location, time) spectral blocks.
///
/// The clamp rule is deterministic and inclusive at the boundary: a density
/// exactly equal to the threshold is kept, only values strictly below are
/// clamped to zero. Fill bins (NaN in the normalized slice) render as the
/// exception value.
#[derive(Debug, Clone)]
pub struct BlockFormatter {
    clamp_threshold: Option<f64>,
    exception_value: f64,
}

impl BlockFormatter {
    pub fn new(clamp_threshold: Option<f64>, exception_value: f64) -> Self {
        Self {
            clamp_threshold,
            exception_value,
        }
    }

    /// Render one spectral block (FACTOR line plus F rows of D integer
    /// fields). Fails with a range error when a rounded density does not fit
    /// the six-character field.
    pub fn format_block(
        &self,
        spectrum: &NormalizedSpectrum,
        factor: f64,
        location_id: &str,
        time_tag: &str,
    ) -> Result<String, ConvertError> {
        let mut out = String::with_capacity(
            16 + 24 + spectrum.n_freq * (spectrum.n_dir * (DENSITY_FIELD_WIDTH + 1) + 1),
        );
        out.push_str("FACTOR\n");
        out.push_str(&format_exp(factor, 16));
        out.push('\n');

        for fi in 0..spectrum.n_freq {
            let row = spectrum.row(fi);
            for (di, &v) in row.iter().enumerate() {
                let cell = if v.is_nan() {
                    self.exception_value.round() as i64
                } else {
                    let v = match self.clamp_threshold {
                        Some(threshold) if v < threshold => 0.0,
                        _ => v,
                    };
                    v.round() as i64
                };
                let field = format!("{cell:>width$}", width = DENSITY_FIELD_WIDTH);
                if field.len() > DENSITY_FIELD_WIDTH {
                    return Err(ConvertError::Range {
                        location: location_id.to_string(),
                        time: time_tag.to_string(),
                        value: row[di],
                        width: DENSITY_FIELD_WIDTH,
                    });
                }
                if di > 0 {
                    out.push(' ');
                }
                out.push_str(&field);
            }
            out.push('\n');
        }
        Ok(out)
    }
}

/// Sequencing writer for one SP2 output file.
pub struct Sp2Writer<W: Write> {
    writer: BufWriter<W>,
}

impl Sp2Writer<File> {
    /// Create (or truncate) the target file.
    pub fn create(path: &Path) -> Result<Self, ConvertError> {
        let file = File::create(path)?;
        Ok(Self::new(file))
    }
}

impl<W: Write> Sp2Writer<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    /// Write the document header: file identification, location table,
    /// frequency and direction axes, and the quantity section.
    pub fn write_header(
        &mut self,
        header: &Sp2Header,
        locations: &[SpectralLocation],
        frequencies_hz: &[f64],
        directions_deg: &[f64],
    ) -> Result<(), ConvertError> {
        let w = &mut self.writer;
        writeln!(
            w,
            "SWAN   1                                Swan standard spectral file, version"
        )?;
        writeln!(w, "$   Data produced by SWAN version {}", header.swan_version)?;
        writeln!(
            w,
            "$   Project: {}        ;  run number: {}",
            header.project_name, header.run_number
        )?;
        writeln!(w, "TIME                                    time-dependent data")?;
        writeln!(w, "     1                                  time coding option")?;
        writeln!(w, "LONLAT                                  locations in spherical coordinates")?;
        writeln!(
            w,
            "{:6}                                  number of locations",
            locations.len()
        )?;
        for loc in locations {
            writeln!(w, "{:10.4} {:10.4}", loc.longitude, loc.latitude)?;
        }
        writeln!(w, "AFREQ                                   absolute frequencies in Hz")?;
        writeln!(
            w,
            "{:6}                                  number of frequencies",
            frequencies_hz.len()
        )?;
        for &f in frequencies_hz {
            writeln!(w, "{f:10.4}")?;
        }
        writeln!(w, "NDIR                                    spectral nautical directions in degr")?;
        writeln!(
            w,
            "{:6}                                  number of directions",
            directions_deg.len()
        )?;
        for &d in directions_deg {
            writeln!(w, "{d:10.4}")?;
        }
        writeln!(w, "QUANT")?;
        writeln!(w, "     1                                  number of quantities in table")?;
        writeln!(w, "EnDens                                  energy densities in J/m2/Hz/degr")?;
        writeln!(w, "J/m2/Hz/degr                            unit")?;
        writeln!(
            w,
            "{:>10}                          exception value",
            format_exp(header.exception_value, 4)
        )?;
        Ok(())
    }

    /// Write the timestamp line opening one time step.
    pub fn write_time_line(&mut self, time: &DateTime<Utc>) -> Result<(), ConvertError> {
        writeln!(
            self.writer,
            "{}                         date and time",
            format_swan_time(time)
        )?;
        Ok(())
    }

    /// Write one preformatted spectral block as a single unit.
    pub fn write_block(&mut self, block: &str) -> Result<(), ConvertError> {
        self.writer.write_all(block.as_bytes())?;
        Ok(())
    }

    /// Flush and close the file.
    pub fn finish(mut self) -> Result<(), ConvertError> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn uniform_spectrum(n_freq: usize, n_dir: usize, value: f64) -> NormalizedSpectrum {
        NormalizedSpectrum {
            n_freq,
            n_dir,
            values: vec![value; n_freq * n_dir],
        }
    }

    fn test_header() -> Sp2Header {
        Sp2Header {
            swan_version: "41.41".into(),
            project_name: "WaveDataProject".into(),
            run_number: "1.0".into(),
            exception_value: -99.0,
        }
    }

    #[test]
    fn test_format_exp_c_style() {
        assert_eq!(format_exp(-99.0, 4), "-9.9000e+01");
        assert_eq!(format_exp(1.0, 16), "1.0000000000000000e+00");
        assert_eq!(format_exp(0.0125, 4), "1.2500e-02");
    }

    #[test]
    fn test_swan_time_format() {
        let t = Utc.with_ymd_and_hms(2024, 1, 2, 3, 0, 0).unwrap();
        assert_eq!(format_swan_time(&t), "20240102.030000");
    }

    #[test]
    fn test_header_golden() {
        let loc = SpectralLocation {
            id: "P0001".into(),
            longitude: 5.32,
            latitude: 60.39,
        };
        let mut buf = Vec::new();
        {
            let mut writer = Sp2Writer::new(&mut buf);
            writer
                .write_header(&test_header(), &[loc], &[0.1, 0.2, 0.3], &[0.0, 90.0, 180.0, 270.0])
                .unwrap();
            writer.finish().unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        let expected = "\
SWAN   1                                Swan standard spectral file, version
$   Data produced by SWAN version 41.41
$   Project: WaveDataProject        ;  run number: 1.0
TIME                                    time-dependent data
     1                                  time coding option
LONLAT                                  locations in spherical coordinates
     1                                  number of locations
    5.3200    60.3900
AFREQ                                   absolute frequencies in Hz
     3                                  number of frequencies
    0.1000
    0.2000
    0.3000
NDIR                                    spectral nautical directions in degr
     4                                  number of directions
    0.0000
   90.0000
  180.0000
  270.0000
QUANT
     1                                  number of quantities in table
EnDens                                  energy densities in J/m2/Hz/degr
J/m2/Hz/degr                            unit
-9.9000e+01                          exception value
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_block_uniform_ones() {
        let formatter = BlockFormatter::new(None, -99.0);
        let spec = uniform_spectrum(3, 4, 1.0);
        let block = formatter
            .format_block(&spec, 1.0, "P0001", "20240101.000000")
            .unwrap();
        let expected = "\
FACTOR
1.0000000000000000e+00
     1      1      1      1
     1      1      1      1
     1      1      1      1
";
        assert_eq!(block, expected);
    }

    #[test]
    fn test_block_fill_sentinel() {
        let formatter = BlockFormatter::new(None, -99.0);
        let mut spec = uniform_spectrum(2, 2, 5.0);
        spec.values[3] = f64::NAN;
        let block = formatter
            .format_block(&spec, 1.0, "P0001", "20240101.000000")
            .unwrap();
        assert_eq!(block, "FACTOR\n1.0000000000000000e+00\n     5      5\n     5    -99\n");
    }

    #[test]
    fn test_clamp_boundary_inclusive() {
        let formatter = BlockFormatter::new(Some(10.0), -99.0);
        let mut spec = uniform_spectrum(1, 3, 10.0);
        spec.values[1] = 10.0 - 1e-9; // just below threshold: clamped
        spec.values[2] = 42.0;
        let block = formatter
            .format_block(&spec, 1.0, "P0001", "20240101.000000")
            .unwrap();
        assert_eq!(block, "FACTOR\n1.0000000000000000e+00\n    10      0     42\n");
    }

    #[test]
    fn test_field_overflow_is_range_error() {
        let formatter = BlockFormatter::new(None, -99.0);
        let spec = uniform_spectrum(1, 1, 1.0e7);
        let err = formatter
            .format_block(&spec, 1.0, "P0042", "20240101.000000")
            .unwrap_err();
        assert_eq!(err.kind(), "RangeError");
        assert!(err.to_string().contains("P0042"));
    }

    #[test]
    fn test_negative_overflow_is_range_error() {
        // -123456 needs seven characters in a six-wide field.
        let formatter = BlockFormatter::new(None, -99.0);
        let spec = uniform_spectrum(1, 1, -123456.0);
        let err = formatter
            .format_block(&spec, 1.0, "P0001", "20240101.000000")
            .unwrap_err();
        assert_eq!(err.kind(), "RangeError");
    }

    #[test]
    fn test_time_line() {
        let mut buf = Vec::new();
        {
            let mut writer = Sp2Writer::new(&mut buf);
            let t = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap();
            writer.write_time_line(&t).unwrap();
            writer.finish().unwrap();
        }
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "20240630.120000                         date and time\n"
        );
    }
}
