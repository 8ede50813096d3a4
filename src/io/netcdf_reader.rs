//! NetCDF input for wave spectra.
//!
//! Reads one self-describing spectral file into a [`SpectralGrid`]:
//! coordinate axes, unit/convention attributes, the 4-D energy-density array,
//! and the optional per-(time, location) FACTOR variable.
//!
//! Expected variables (candidate names, first match wins):
//! - `frequency` / `freq`: 1D frequency axis, `units` attribute (Hz or rad/s)
//! - `direction` / `dir`: 1D direction axis, `units` plus convention
//!   attributes (`origin`, `rotation`) or a combined `convention` attribute
//! - `longitude` / `lon`, `latitude` / `lat`: 1D location coordinates
//! - `time`: CF-encoded timestamps (`<unit> since <epoch>`)
//! - `energy_density` / `efth` / `density`: 4-D density, shape
//!   (time, location, frequency, direction), `_FillValue` for missing bins
//! - `factor` (optional): 2-D (time, location) FACTOR values
//!
//! Attribute decoding follows the usual NetCDF conventions: packed data with
//! `scale_factor`/`add_offset` is unpacked, fill values are preserved as the
//! declared sentinel for the formatter to detect.

use std::path::Path;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

use crate::convention::{AngleUnits, Convention, DirectionOrigin, FrequencyUnits, RotationSense};
use crate::error::ConvertError;
use crate::spectrum::{SpectralGrid, SpectralLocation};

const FREQUENCY_NAMES: &[&str] = &["frequency", "freq", "frequencies"];
const DIRECTION_NAMES: &[&str] = &["direction", "dir", "directions"];
const LONGITUDE_NAMES: &[&str] = &["longitude", "lon"];
const LATITUDE_NAMES: &[&str] = &["latitude", "lat"];
const TIME_NAMES: &[&str] = &["time"];
const DENSITY_NAMES: &[&str] = &["energy_density", "efth", "density", "EnDens"];
const FACTOR_NAMES: &[&str] = &["factor"];
const STATION_NAMES: &[&str] = &["station", "station_id", "id"];

/// Read a spectral grid from a NetCDF file.
///
/// `default_convention` is used when the direction variable carries no
/// convention attributes; `None` turns that situation into a metadata error.
pub fn read_spectral_grid(
    path: &Path,
    default_convention: Option<Convention>,
) -> Result<SpectralGrid, ConvertError> {
    let file = netcdf::open(path)?;

    let frequencies = read_coord(&file, FREQUENCY_NAMES)?;
    let directions = read_coord(&file, DIRECTION_NAMES)?;
    let longitudes = read_coord(&file, LONGITUDE_NAMES)?;
    let latitudes = read_coord(&file, LATITUDE_NAMES)?;

    if longitudes.len() != latitudes.len() {
        return Err(ConvertError::Schema(format!(
            "longitude length {} does not match latitude length {}",
            longitudes.len(),
            latitudes.len()
        )));
    }

    let frequency_units = read_frequency_units(&file, default_convention)?;
    let convention = read_direction_convention(&file, default_convention)?;
    let times = read_times(&file)?;

    let locations = read_locations(&file, &longitudes, &latitudes);

    let (density, fill_value) = read_density(
        &file,
        times.len(),
        locations.len(),
        frequencies.len(),
        directions.len(),
    )?;

    let factors = read_factors(&file, times.len(), locations.len())?;

    SpectralGrid::new(
        frequencies,
        frequency_units,
        directions,
        convention,
        locations,
        times,
        density,
        fill_value,
        factors,
    )
}

/// Read a 1D coordinate variable, trying candidate names in order.
fn read_coord(file: &netcdf::File, names: &[&str]) -> Result<Vec<f64>, ConvertError> {
    for name in names {
        if let Some(var) = file.variable(name) {
            let data: Vec<f64> = var.get_values(..)?;
            return Ok(data);
        }
    }
    Err(ConvertError::Schema(format!(
        "missing required coordinate variable: {}",
        names.join(" or ")
    )))
}

fn find_variable<'f>(file: &'f netcdf::File, names: &[&str]) -> Option<netcdf::Variable<'f>> {
    names.iter().find_map(|name| file.variable(name))
}

/// Get a string attribute value.
fn get_attr_str(var: &netcdf::Variable, name: &str) -> Option<String> {
    var.attribute_value(name)
        .and_then(|r| r.ok())
        .and_then(|v| match v {
            netcdf::AttributeValue::Str(s) => Some(s),
            _ => None,
        })
}

/// Get an f64 attribute value.
fn get_attr_f64(var: &netcdf::Variable, name: &str) -> Option<f64> {
    var.attribute_value(name)
        .and_then(|r| r.ok())
        .and_then(|v| match v {
            netcdf::AttributeValue::Double(d) => Some(d),
            netcdf::AttributeValue::Float(f) => Some(f as f64),
            netcdf::AttributeValue::Int(i) => Some(i as f64),
            netcdf::AttributeValue::Short(s) => Some(s as f64),
            _ => None,
        })
}

fn read_frequency_units(
    file: &netcdf::File,
    default_convention: Option<Convention>,
) -> Result<FrequencyUnits, ConvertError> {
    let var = find_variable(file, FREQUENCY_NAMES)
        .ok_or_else(|| ConvertError::Schema("missing frequency variable".into()))?;
    match get_attr_str(&var, "units") {
        Some(units) => FrequencyUnits::parse(&units),
        None if default_convention.is_some() => Ok(FrequencyUnits::Hertz),
        None => Err(ConvertError::Metadata(
            "frequency variable has no units attribute and no default convention is configured"
                .into(),
        )),
    }
}

/// Resolve the declared direction convention from variable attributes.
///
/// Recognized forms, in priority order:
/// 1. A combined `convention` attribute: `nautical`/`oceanographic`
///    (from North, clockwise) or `mathematical`/`cartesian` (from East,
///    counter-clockwise), with units taken from the `units` attribute.
/// 2. Separate `origin` and `rotation` attributes plus `units`.
/// 3. The configured default convention (units still overridden by a
///    `units` attribute when present).
fn read_direction_convention(
    file: &netcdf::File,
    default_convention: Option<Convention>,
) -> Result<Convention, ConvertError> {
    let var = find_variable(file, DIRECTION_NAMES)
        .ok_or_else(|| ConvertError::Schema("missing direction variable".into()))?;

    let units_attr = match get_attr_str(&var, "units") {
        Some(s) => Some(AngleUnits::parse(&s)?),
        None => None,
    };

    if let Some(name) = get_attr_str(&var, "convention") {
        let base = match name.trim().to_lowercase().as_str() {
            "nautical" | "oceanographic" | "meteorological" => Convention::nautical(),
            "mathematical" | "cartesian" => Convention::mathematical(),
            other => {
                return Err(ConvertError::Convention(format!(
                    "unresolvable direction convention: {other:?}"
                )))
            }
        };
        return Ok(Convention {
            units: units_attr.unwrap_or(base.units),
            ..base
        });
    }

    match (get_attr_str(&var, "origin"), get_attr_str(&var, "rotation")) {
        (Some(origin), Some(rotation)) => {
            let origin = DirectionOrigin::parse(&origin)?;
            let sense = RotationSense::parse(&rotation)?;
            let units = match units_attr {
                Some(u) => u,
                None => {
                    default_convention
                        .ok_or_else(|| {
                            ConvertError::Metadata(
                                "direction variable has no units attribute and no default \
                                 convention is configured"
                                    .into(),
                            )
                        })?
                        .units
                }
            };
            Ok(Convention {
                origin,
                sense,
                units,
            })
        }
        _ => match default_convention {
            Some(default) => Ok(Convention {
                units: units_attr.unwrap_or(default.units),
                ..default
            }),
            None => Err(ConvertError::Metadata(
                "direction variable carries no convention attributes and no default convention \
                 is configured"
                    .into(),
            )),
        },
    }
}

/// Decode the CF time axis into UTC timestamps.
fn read_times(file: &netcdf::File) -> Result<Vec<DateTime<Utc>>, ConvertError> {
    let var = find_variable(file, TIME_NAMES)
        .ok_or_else(|| ConvertError::Schema("missing time variable".into()))?;
    let units = get_attr_str(&var, "units").ok_or_else(|| {
        ConvertError::Metadata("time variable has no CF units attribute".into())
    })?;
    let (unit_seconds, epoch) = parse_cf_time_units(&units)?;
    let raw: Vec<f64> = var.get_values(..)?;
    Ok(raw
        .iter()
        .map(|&v| epoch + Duration::milliseconds((v * unit_seconds * 1000.0).round() as i64))
        .collect())
}

/// Parse a CF time units string, e.g. `seconds since 1970-01-01 00:00:00`.
/// Returns the unit length in seconds and the epoch.
fn parse_cf_time_units(units: &str) -> Result<(f64, DateTime<Utc>), ConvertError> {
    let (unit, base) = units.split_once(" since ").ok_or_else(|| {
        ConvertError::Metadata(format!("time units {units:?} is not CF '<unit> since <epoch>'"))
    })?;

    let unit_seconds = match unit.trim().to_lowercase().as_str() {
        "seconds" | "second" | "s" => 1.0,
        "minutes" | "minute" | "min" => 60.0,
        "hours" | "hour" | "h" => 3600.0,
        "days" | "day" | "d" => 86400.0,
        other => {
            return Err(ConvertError::Metadata(format!(
                "unsupported CF time unit: {other:?}"
            )))
        }
    };

    let base = base.trim().trim_end_matches(" UTC").trim_end_matches('Z');
    let epoch = NaiveDateTime::parse_from_str(base, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(base, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| {
            NaiveDate::parse_from_str(base, "%Y-%m-%d").map(|d| d.and_hms_opt(0, 0, 0).unwrap())
        })
        .map_err(|_| ConvertError::Metadata(format!("unparseable CF time epoch: {base:?}")))?;

    Ok((unit_seconds, epoch.and_utc()))
}

/// Assemble location records: ids from an integer station variable when
/// present, otherwise synthesized in input order.
fn read_locations(
    file: &netcdf::File,
    longitudes: &[f64],
    latitudes: &[f64],
) -> Vec<SpectralLocation> {
    let ids: Option<Vec<i64>> = find_variable(file, STATION_NAMES)
        .and_then(|var| var.get_values::<i64, _>(..).ok())
        .filter(|ids| ids.len() == longitudes.len());

    longitudes
        .iter()
        .zip(latitudes.iter())
        .enumerate()
        .map(|(i, (&lon, &lat))| SpectralLocation {
            id: match ids {
                Some(ref ids) => format!("P{:04}", ids[i]),
                None => format!("P{:04}", i + 1),
            },
            longitude: lon,
            latitude: lat,
        })
        .collect()
}

/// Read the 4-D density variable, validating its declared shape against the
/// coordinate axis lengths. Packed data is unpacked; fill values stay as the
/// declared sentinel.
fn read_density(
    file: &netcdf::File,
    n_time: usize,
    n_loc: usize,
    n_freq: usize,
    n_dir: usize,
) -> Result<(Vec<f64>, f64), ConvertError> {
    let var = find_variable(file, DENSITY_NAMES).ok_or_else(|| {
        ConvertError::Schema(format!(
            "missing required data variable: {}",
            DENSITY_NAMES.join(" or ")
        ))
    })?;

    let dims = var.dimensions();
    let dim_lens: Vec<usize> = dims.iter().map(|d| d.len()).collect();
    if dim_lens != [n_time, n_loc, n_freq, n_dir] {
        return Err(ConvertError::Schema(format!(
            "density shape {:?} does not match (time, location, frequency, direction) = \
             ({n_time}, {n_loc}, {n_freq}, {n_dir})",
            dim_lens
        )));
    }

    let scale = get_attr_f64(&var, "scale_factor").unwrap_or(1.0);
    let offset = get_attr_f64(&var, "add_offset").unwrap_or(0.0);
    let fill = get_attr_f64(&var, "_FillValue")
        .or_else(|| get_attr_f64(&var, "missing_value"))
        .unwrap_or(f64::NAN);

    let raw: Vec<f64> = var.get_values(..)?;
    let density = raw
        .iter()
        .map(|&v| {
            if !v.is_finite() || v == fill {
                fill
            } else {
                v * scale + offset
            }
        })
        .collect();

    Ok((density, fill))
}

/// Read the optional (time, location) FACTOR variable.
fn read_factors(
    file: &netcdf::File,
    n_time: usize,
    n_loc: usize,
) -> Result<Option<Vec<f64>>, ConvertError> {
    let Some(var) = find_variable(file, FACTOR_NAMES) else {
        return Ok(None);
    };
    let data: Vec<f64> = var.get_values(..)?;
    if data.len() != n_time * n_loc {
        return Err(ConvertError::Schema(format!(
            "factor length {} does not match (time, location) = {}",
            data.len(),
            n_time * n_loc
        )));
    }
    Ok(Some(data))
}
