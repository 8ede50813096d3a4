//! Directional convention and unit normalization.
//!
//! Wave spectra arrive with direction bins expressed in whatever convention
//! the producing model used: degrees or radians, measured from North or from
//! East, rotating clockwise or counter-clockwise. SWAN's SP2 grammar wants
//! nautical directions: degrees, measured from North, clockwise. The
//! normalizer reduces every input convention to that target through one
//! composed affine map,
//!
//! ```text
//! bearing = (sense * theta_deg + shift) mod 360
//! ```
//!
//! with `sense = +1` for clockwise input, `-1` for counter-clockwise, and
//! `shift = 0°` for a North origin, `90°` for an East origin. The identity
//! falls out for input already in the target convention.
//!
//! Applying the transform can make the direction sequence non-monotonic, so
//! the normalizer also computes the permutation restoring ascending order;
//! the same machinery re-sorts a frequency axis that arrives descending.

use crate::error::ConvertError;

/// Angular units for direction bins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AngleUnits {
    Degrees,
    Radians,
}

impl AngleUnits {
    /// Resolve a units attribute string ("degree", "degrees", "rad", ...).
    pub fn parse(s: &str) -> Result<Self, ConvertError> {
        match s.trim().to_lowercase().as_str() {
            "degree" | "degrees" | "deg" | "degr" => Ok(AngleUnits::Degrees),
            "radian" | "radians" | "rad" => Ok(AngleUnits::Radians),
            other => Err(ConvertError::Convention(format!(
                "unresolvable direction unit: {other:?}"
            ))),
        }
    }
}

/// Reference origin for direction angles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionOrigin {
    /// Angles measured from geographic North (compass convention).
    North,
    /// Angles measured from East (mathematical convention).
    East,
}

impl DirectionOrigin {
    pub fn parse(s: &str) -> Result<Self, ConvertError> {
        match s.trim().to_lowercase().as_str() {
            "north" | "n" => Ok(DirectionOrigin::North),
            "east" | "e" => Ok(DirectionOrigin::East),
            other => Err(ConvertError::Convention(format!(
                "unresolvable direction origin: {other:?}"
            ))),
        }
    }
}

/// Rotation sense for direction angles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationSense {
    Clockwise,
    CounterClockwise,
}

impl RotationSense {
    pub fn parse(s: &str) -> Result<Self, ConvertError> {
        match s.trim().to_lowercase().as_str() {
            "clockwise" | "cw" => Ok(RotationSense::Clockwise),
            "counterclockwise" | "counter-clockwise" | "ccw" | "anticlockwise" => {
                Ok(RotationSense::CounterClockwise)
            }
            other => Err(ConvertError::Convention(format!(
                "unresolvable rotation sense: {other:?}"
            ))),
        }
    }

    fn sign(self) -> f64 {
        match self {
            RotationSense::Clockwise => 1.0,
            RotationSense::CounterClockwise => -1.0,
        }
    }
}

/// Directional convention value object: origin, sense, and units. Built once
/// from file attributes (or the configured default) and consumed everywhere
/// through [`DirectionTransform`]; there are no hidden defaults elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Convention {
    pub origin: DirectionOrigin,
    pub sense: RotationSense,
    pub units: AngleUnits,
}

impl Convention {
    /// The SP2 target convention: nautical directions in degrees.
    pub fn nautical() -> Self {
        Self {
            origin: DirectionOrigin::North,
            sense: RotationSense::Clockwise,
            units: AngleUnits::Degrees,
        }
    }

    /// Mathematical convention: degrees from East, counter-clockwise.
    pub fn mathematical() -> Self {
        Self {
            origin: DirectionOrigin::East,
            sense: RotationSense::CounterClockwise,
            units: AngleUnits::Degrees,
        }
    }

    /// Transform mapping angles in this convention to nautical bearings.
    pub fn to_nautical(self) -> DirectionTransform {
        let shift = match self.origin {
            DirectionOrigin::North => 0.0,
            DirectionOrigin::East => 90.0,
        };
        DirectionTransform {
            units: self.units,
            sense: self.sense.sign(),
            shift_deg: shift,
        }
    }
}

/// Composed affine direction map, `bearing = (sense * theta + shift) mod 360`
/// after unit conversion to degrees.
#[derive(Debug, Clone, Copy)]
pub struct DirectionTransform {
    units: AngleUnits,
    sense: f64,
    shift_deg: f64,
}

impl DirectionTransform {
    /// Map one input angle to a nautical bearing in [0, 360).
    pub fn apply(&self, theta: f64) -> f64 {
        let deg = match self.units {
            AngleUnits::Degrees => theta,
            AngleUnits::Radians => theta.to_degrees(),
        };
        (self.sense * deg + self.shift_deg).rem_euclid(360.0)
    }

    /// Map a whole direction axis.
    pub fn apply_all(&self, angles: &[f64]) -> Vec<f64> {
        angles.iter().map(|&a| self.apply(a)).collect()
    }

    /// Undo the transform for a single bearing, returning degrees in the
    /// source orientation (before any radian conversion). The sense factor
    /// is its own inverse.
    pub fn unapply_deg(&self, bearing: f64) -> f64 {
        (self.sense * (bearing - self.shift_deg)).rem_euclid(360.0)
    }
}

/// Frequency units recognized on the frequency coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyUnits {
    Hertz,
    RadiansPerSecond,
}

impl FrequencyUnits {
    pub fn parse(s: &str) -> Result<Self, ConvertError> {
        match s.trim().to_lowercase().as_str() {
            "hz" | "hertz" | "1/s" | "s-1" | "s^-1" => Ok(FrequencyUnits::Hertz),
            "rad/s" | "rad s-1" | "radians/s" => Ok(FrequencyUnits::RadiansPerSecond),
            other => Err(ConvertError::Convention(format!(
                "unresolvable frequency unit: {other:?}"
            ))),
        }
    }

    /// Convert a frequency value to Hz.
    pub fn to_hz(self, f: f64) -> f64 {
        match self {
            FrequencyUnits::Hertz => f,
            FrequencyUnits::RadiansPerSecond => f / (2.0 * std::f64::consts::PI),
        }
    }
}

/// Stable argsort: the permutation `p` such that `values[p[0]] <= values[p[1]] <= ...`.
///
/// The result is a bijection on `0..values.len()`; extracting slices with it
/// restores ascending order on the axis.
pub fn sort_permutation(values: &[f64]) -> Vec<usize> {
    let mut perm: Vec<usize> = (0..values.len()).collect();
    perm.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    perm
}

/// Reorder a slice by a permutation produced by [`sort_permutation`].
pub fn apply_permutation<T: Copy>(values: &[T], perm: &[usize]) -> Vec<T> {
    perm.iter().map(|&i| values[i]).collect()
}

/// Axis reordering for one spectral grid: permutations restoring ascending
/// order on the frequency axis and the (transformed) direction axis.
#[derive(Debug, Clone)]
pub struct AxisOrder {
    pub freq_perm: Vec<usize>,
    pub dir_perm: Vec<usize>,
}

impl AxisOrder {
    /// Compute axis permutations for frequencies (already in Hz) and
    /// nautical direction bearings.
    pub fn new(frequencies_hz: &[f64], bearings: &[f64]) -> Self {
        Self {
            freq_perm: sort_permutation(frequencies_hz),
            dir_perm: sort_permutation(bearings),
        }
    }

    /// True when both permutations are the identity.
    pub fn is_identity(&self) -> bool {
        self.freq_perm.iter().enumerate().all(|(i, &p)| i == p)
            && self.dir_perm.iter().enumerate().all(|(i, &p)| i == p)
    }
}
