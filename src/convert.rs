//! Conversion pipeline.
//!
//! Single-threaded, synchronous, no state across runs: read the spectral
//! grid, build the convention transform and axis ordering once, then iterate
//! locations (input order) and times (ascending) writing SP2 output. Each
//! (location, time) block is a pure function of its normalized slice.
//!
//! Partial output from an aborted run is explicitly unreliable and must be
//! discarded by the caller; no crash-safety is attempted.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::{ConverterConfig, OutputMode};
use crate::convention::{apply_permutation, AxisOrder};
use crate::error::ConvertError;
use crate::io::netcdf_reader::read_spectral_grid;
use crate::io::sp2_writer::{format_swan_time, BlockFormatter, Sp2Header, Sp2Writer};
use crate::spectrum::SpectralGrid;

/// Summary of one conversion run.
#[derive(Debug, Clone, Default)]
pub struct ConversionReport {
    /// Output files written (empty when an existing file was skipped).
    pub output_files: Vec<PathBuf>,
    /// Spectral blocks written across all files.
    pub blocks_written: usize,
    /// Locations converted.
    pub locations: usize,
    /// Timestamps converted.
    pub times: usize,
}

/// Convert one NetCDF file per the configuration.
pub fn run_conversion(config: &ConverterConfig) -> Result<ConversionReport, ConvertError> {
    info!(input = %config.input.display(), "reading spectral grid");
    let grid = read_spectral_grid(&config.input, config.default_convention)?;
    let (n_time, n_loc, n_freq, n_dir) = grid.shape();
    debug!(n_time, n_loc, n_freq, n_dir, "grid loaded");

    // Normalize units and convention once; everything downstream consumes
    // the transformed axes and the permutations.
    let frequencies_hz: Vec<f64> = grid
        .frequencies
        .iter()
        .map(|&f| grid.frequency_units.to_hz(f))
        .collect();
    let bearings = grid.convention.to_nautical().apply_all(&grid.directions);
    let order = AxisOrder::new(&frequencies_hz, &bearings);
    if !order.is_identity() {
        debug!("axis reordering required for target convention");
    }
    let frequencies_sorted = apply_permutation(&frequencies_hz, &order.freq_perm);
    let directions_sorted = apply_permutation(&bearings, &order.dir_perm);

    let loc_indices = select_locations(&grid, config)?;
    let time_indices = select_times(&grid, config)?;

    fs::create_dir_all(&config.output_dir)?;

    let header = Sp2Header {
        swan_version: config.swan_version.clone(),
        project_name: config.project_name.clone(),
        run_number: config.run_number.clone(),
        exception_value: config.exception_value,
    };
    let formatter = BlockFormatter::new(config.clamp_threshold, config.exception_value);

    let mut report = ConversionReport {
        locations: loc_indices.len(),
        times: time_indices.len(),
        ..Default::default()
    };

    match config.mode {
        OutputMode::Combined => {
            let path = config.combined_path();
            if path.exists() && !config.overwrite {
                warn!(path = %path.display(), "output exists, skipping (use overwrite to replace)");
                return Ok(report);
            }
            let mut writer = Sp2Writer::create(&path)?;
            let locations: Vec<_> = loc_indices
                .iter()
                .map(|&l| grid.locations[l].clone())
                .collect();
            writer.write_header(&header, &locations, &frequencies_sorted, &directions_sorted)?;
            for &t in &time_indices {
                writer.write_time_line(&grid.times[t])?;
                for &l in &loc_indices {
                    let block = format_one_block(&grid, &formatter, &order, t, l)?;
                    writer.write_block(&block)?;
                    report.blocks_written += 1;
                }
            }
            writer.finish()?;
            info!(path = %path.display(), blocks = report.blocks_written, "wrote SP2 file");
            report.output_files.push(path);
        }
        OutputMode::PerLocation => {
            for &l in &loc_indices {
                let location = grid.locations[l].clone();
                let path = config.location_path(&location.id);
                if path.exists() && !config.overwrite {
                    warn!(path = %path.display(), "output exists, skipping (use overwrite to replace)");
                    continue;
                }
                let mut writer = Sp2Writer::create(&path)?;
                writer.write_header(
                    &header,
                    std::slice::from_ref(&location),
                    &frequencies_sorted,
                    &directions_sorted,
                )?;
                for &t in &time_indices {
                    writer.write_time_line(&grid.times[t])?;
                    let block = format_one_block(&grid, &formatter, &order, t, l)?;
                    writer.write_block(&block)?;
                    report.blocks_written += 1;
                }
                writer.finish()?;
                info!(path = %path.display(), location = %location.id, "wrote SP2 file");
                report.output_files.push(path);
            }
        }
    }

    Ok(report)
}

/// Format the spectral block for one (time, location) pair.
fn format_one_block(
    grid: &SpectralGrid,
    formatter: &BlockFormatter,
    order: &AxisOrder,
    time_idx: usize,
    loc_idx: usize,
) -> Result<String, ConvertError> {
    let spectrum = grid.normalized_slice(time_idx, loc_idx, order);
    formatter.format_block(
        &spectrum,
        grid.factor(time_idx, loc_idx),
        &grid.locations[loc_idx].id,
        &format_swan_time(&grid.times[time_idx]),
    )
}

/// Resolve the location subset to indices, preserving input order.
fn select_locations(
    grid: &SpectralGrid,
    config: &ConverterConfig,
) -> Result<Vec<usize>, ConvertError> {
    match config.location_subset {
        None => Ok((0..grid.locations.len()).collect()),
        Some(ref ids) => {
            for id in ids {
                if !grid.locations.iter().any(|l| &l.id == id) {
                    return Err(ConvertError::Schema(format!(
                        "location id {id:?} not present in input (known: {})",
                        grid.locations
                            .iter()
                            .map(|l| l.id.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    )));
                }
            }
            let indices: Vec<usize> = grid
                .locations
                .iter()
                .enumerate()
                .filter(|(_, l)| ids.contains(&l.id))
                .map(|(i, _)| i)
                .collect();
            Ok(indices)
        }
    }
}

/// Resolve the time-range subset to indices, ascending.
fn select_times(grid: &SpectralGrid, config: &ConverterConfig) -> Result<Vec<usize>, ConvertError> {
    let indices: Vec<usize> = match config.time_range {
        None => (0..grid.times.len()).collect(),
        Some((from, to)) => grid
            .times
            .iter()
            .enumerate()
            .filter(|(_, t)| **t >= from && **t <= to)
            .map(|(i, _)| i)
            .collect(),
    };
    if indices.is_empty() {
        return Err(ConvertError::Schema(
            "time-range selection matches no timestamps".into(),
        ));
    }
    Ok(indices)
}

/// List input NetCDF files in a directory, sorted by name. `prefix` narrows
/// the scan (the original tool's `esp_*.nc` batch convention).
pub fn list_input_files(dir: &Path, prefix: Option<&str>) -> Result<Vec<PathBuf>, ConvertError> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.extension().is_some_and(|ext| ext == "nc")
                && match prefix {
                    Some(prefix) => p
                        .file_name()
                        .is_some_and(|n| n.to_string_lossy().starts_with(prefix)),
                    None => true,
                }
        })
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_list_input_files_filters_and_sorts() {
        let dir = tempdir().unwrap();
        for name in ["esp_02.nc", "esp_01.nc", "other.nc", "esp_03.txt"] {
            File::create(dir.path().join(name)).unwrap();
        }

        let all = list_input_files(dir.path(), None).unwrap();
        assert_eq!(all.len(), 3);

        let esp = list_input_files(dir.path(), Some("esp_")).unwrap();
        let names: Vec<_> = esp
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["esp_01.nc", "esp_02.nc"]);
    }
}
