//! Spectral grid data model.
//!
//! A [`SpectralGrid`] is the in-memory form of one input file: coordinate
//! axes, unit/convention metadata, and the flat 4-D energy-density array
//! indexed (time, location, frequency, direction). It is constructed once by
//! the reader, validated, and never mutated afterwards.
//!
//! [`NormalizedSpectrum`] is the transient per-(location, time) slice in
//! output units and axis order; fill bins carry NaN so the formatter can
//! substitute the sentinel token.

use chrono::{DateTime, Utc};

use crate::convention::{AxisOrder, Convention, FrequencyUnits};
use crate::error::ConvertError;

/// A fixed geographic point carrying a time series of spectra.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralLocation {
    /// Stable identifier, from the file or synthesized (`P0001`, ...).
    pub id: String,
    pub longitude: f64,
    pub latitude: f64,
}

/// Immutable input model: coordinates, metadata, and the density array.
#[derive(Debug, Clone)]
pub struct SpectralGrid {
    /// Frequency bins in the declared units (strictly positive).
    pub frequencies: Vec<f64>,
    pub frequency_units: FrequencyUnits,
    /// Direction bins in the declared convention.
    pub directions: Vec<f64>,
    pub convention: Convention,
    pub locations: Vec<SpectralLocation>,
    /// Timestamps, strictly ascending.
    pub times: Vec<DateTime<Utc>>,
    /// Energy density, flat row-major over (time, location, frequency,
    /// direction). Units: J/m2/Hz/degr after normalization.
    density: Vec<f64>,
    /// Declared fill value marking missing bins.
    pub fill_value: f64,
    /// Optional per-(time, location) FACTOR values; 1.0 when absent.
    factors: Option<Vec<f64>>,
}

impl SpectralGrid {
    /// Assemble and validate a grid. Fails with a schema error when the
    /// density length does not match the advertised axis lengths, an axis is
    /// empty, a frequency is non-positive or non-finite, or times are not
    /// strictly ascending. Axis ordering is not checked here; the normalizer
    /// re-sorts both spectral axes through [`AxisOrder`].
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        frequencies: Vec<f64>,
        frequency_units: FrequencyUnits,
        directions: Vec<f64>,
        convention: Convention,
        locations: Vec<SpectralLocation>,
        times: Vec<DateTime<Utc>>,
        density: Vec<f64>,
        fill_value: f64,
        factors: Option<Vec<f64>>,
    ) -> Result<Self, ConvertError> {
        if frequencies.is_empty() || directions.is_empty() || locations.is_empty() || times.is_empty()
        {
            return Err(ConvertError::Schema(
                "every axis (time, location, frequency, direction) must be non-empty".into(),
            ));
        }
        if frequencies.iter().any(|&f| f <= 0.0 || !f.is_finite()) {
            return Err(ConvertError::Schema(
                "frequency axis contains non-positive or non-finite values".into(),
            ));
        }
        if times.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConvertError::Schema(
                "time axis is not strictly ascending".into(),
            ));
        }
        let expected = times.len() * locations.len() * frequencies.len() * directions.len();
        if density.len() != expected {
            return Err(ConvertError::Schema(format!(
                "density length {} does not match shape ({}, {}, {}, {}) = {}",
                density.len(),
                times.len(),
                locations.len(),
                frequencies.len(),
                directions.len(),
                expected
            )));
        }
        if let Some(ref f) = factors {
            let want = times.len() * locations.len();
            if f.len() != want {
                return Err(ConvertError::Schema(format!(
                    "factor length {} does not match (time, location) = {}",
                    f.len(),
                    want
                )));
            }
        }
        Ok(Self {
            frequencies,
            frequency_units,
            directions,
            convention,
            locations,
            times,
            density,
            fill_value,
            factors,
        })
    }

    /// Array shape (T, L, F, D).
    pub fn shape(&self) -> (usize, usize, usize, usize) {
        (
            self.times.len(),
            self.locations.len(),
            self.frequencies.len(),
            self.directions.len(),
        )
    }

    /// True when `v` is the declared fill value (or NaN from upstream).
    pub fn is_fill(&self, v: f64) -> bool {
        !v.is_finite() || v == self.fill_value
    }

    /// Raw F x D density slice for one (time, location) pair.
    pub fn slice(&self, time_idx: usize, loc_idx: usize) -> &[f64] {
        let (_, n_loc, n_freq, n_dir) = self.shape();
        let stride = n_freq * n_dir;
        let start = (time_idx * n_loc + loc_idx) * stride;
        &self.density[start..start + stride]
    }

    /// FACTOR value for one (time, location) pair; 1.0 when the input file
    /// carried no factor variable.
    pub fn factor(&self, time_idx: usize, loc_idx: usize) -> f64 {
        match self.factors {
            Some(ref f) => f[time_idx * self.locations.len() + loc_idx],
            None => 1.0,
        }
    }

    /// Extract the normalized slice for one (time, location) pair: axes
    /// reordered per `order`, fill bins replaced with NaN.
    pub fn normalized_slice(
        &self,
        time_idx: usize,
        loc_idx: usize,
        order: &AxisOrder,
    ) -> NormalizedSpectrum {
        let (_, _, n_freq, n_dir) = self.shape();
        let raw = self.slice(time_idx, loc_idx);
        let mut values = Vec::with_capacity(n_freq * n_dir);
        for &fi in &order.freq_perm {
            for &di in &order.dir_perm {
                let v = raw[fi * n_dir + di];
                values.push(if self.is_fill(v) { f64::NAN } else { v });
            }
        }
        NormalizedSpectrum {
            n_freq,
            n_dir,
            values,
        }
    }
}

/// One F x D density slice in output units and axis order. Fill bins are NaN.
#[derive(Debug, Clone)]
pub struct NormalizedSpectrum {
    pub n_freq: usize,
    pub n_dir: usize,
    /// Row-major by frequency then direction.
    pub values: Vec<f64>,
}

impl NormalizedSpectrum {
    /// One frequency row (all directions).
    pub fn row(&self, freq_idx: usize) -> &[f64] {
        &self.values[freq_idx * self.n_dir..(freq_idx + 1) * self.n_dir]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convention::sort_permutation;
    use chrono::TimeZone;

    fn test_times(n: usize) -> Vec<DateTime<Utc>> {
        (0..n)
            .map(|i| Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::hours(3 * i as i64))
            .collect()
    }

    fn test_location() -> SpectralLocation {
        SpectralLocation {
            id: "P0001".into(),
            longitude: 5.32,
            latitude: 60.39,
        }
    }

    fn small_grid(density: Vec<f64>) -> SpectralGrid {
        SpectralGrid::new(
            vec![0.1, 0.2, 0.3],
            FrequencyUnits::Hertz,
            vec![0.0, 90.0, 180.0, 270.0],
            Convention::nautical(),
            vec![test_location()],
            test_times(1),
            density,
            -999.0,
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let err = SpectralGrid::new(
            vec![0.1, 0.2, 0.3],
            FrequencyUnits::Hertz,
            vec![0.0, 90.0, 180.0, 270.0],
            Convention::nautical(),
            vec![test_location()],
            test_times(1),
            vec![1.0; 11],
            -999.0,
            None,
        )
        .unwrap_err();
        assert_eq!(err.kind(), "SchemaError");
    }

    #[test]
    fn test_non_ascending_times_rejected() {
        let mut times = test_times(2);
        times.swap(0, 1);
        let err = SpectralGrid::new(
            vec![0.1],
            FrequencyUnits::Hertz,
            vec![0.0],
            Convention::nautical(),
            vec![test_location()],
            times,
            vec![1.0, 1.0],
            -999.0,
            None,
        )
        .unwrap_err();
        assert_eq!(err.kind(), "SchemaError");
    }

    #[test]
    fn test_slice_indexing() {
        let density: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let grid = small_grid(density);
        let s = grid.slice(0, 0);
        assert_eq!(s.len(), 12);
        assert_eq!(s[0], 0.0);
        assert_eq!(s[11], 11.0);
    }

    #[test]
    fn test_normalized_slice_identity_order() {
        let density: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let grid = small_grid(density);
        let order = AxisOrder::new(&grid.frequencies, &grid.directions);
        assert!(order.is_identity());
        let spec = grid.normalized_slice(0, 0, &order);
        assert_eq!(spec.row(1), &[4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_normalized_slice_reorders_directions() {
        // Direction axis [90, 0, 270, 180]: permutation [1, 0, 3, 2].
        let density: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let mut grid = small_grid(density);
        grid.directions = vec![90.0, 0.0, 270.0, 180.0];
        let order = AxisOrder {
            freq_perm: sort_permutation(&grid.frequencies),
            dir_perm: sort_permutation(&grid.directions),
        };
        let spec = grid.normalized_slice(0, 0, &order);
        assert_eq!(spec.row(0), &[1.0, 0.0, 3.0, 2.0]);
    }

    #[test]
    fn test_fill_maps_to_nan() {
        let mut density = vec![1.0; 12];
        density[5] = -999.0;
        let grid = small_grid(density);
        let order = AxisOrder::new(&grid.frequencies, &grid.directions);
        let spec = grid.normalized_slice(0, 0, &order);
        assert!(spec.values[5].is_nan());
        assert_eq!(spec.values[4], 1.0);
    }

    #[test]
    fn test_default_factor() {
        let grid = small_grid(vec![1.0; 12]);
        assert_eq!(grid.factor(0, 0), 1.0);
    }
}
