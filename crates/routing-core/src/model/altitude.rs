//! Altitude values and bounds.
//!
//! Mirrors the source's `Altitude`/`AltitudeUnit` pair, but fixes the
//! truncating comparator and replaces the `-999999`/`999999` sentinel
//! convention with an explicit [`AltitudeBound`].

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

const MT_TO_FT: f64 = 3.28084;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AltitudeUnit {
    #[serde(alias = "mt")]
    Meters,
    #[serde(alias = "ft")]
    Feet,
}

/// A unit-aware altitude value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Altitude {
    pub value: f64,
    pub unit: AltitudeUnit,
}

impl Altitude {
    pub fn new(value: f64, unit: AltitudeUnit) -> Self {
        Self { value, unit }
    }

    pub fn meters(value: f64) -> Self {
        Self::new(value, AltitudeUnit::Meters)
    }

    /// Convert to `unit`, returning a new value.
    pub fn convert_to(&self, unit: AltitudeUnit) -> Altitude {
        if self.unit == unit {
            return *self;
        }
        let value = match (self.unit, unit) {
            (AltitudeUnit::Meters, AltitudeUnit::Feet) => self.value * MT_TO_FT,
            (AltitudeUnit::Feet, AltitudeUnit::Meters) => self.value / MT_TO_FT,
            _ => self.value,
        };
        Altitude::new(value, unit)
    }

    /// Normalize to meters.
    pub fn normalize(&self) -> f64 {
        self.convert_to(AltitudeUnit::Meters).value
    }

    /// `self - other`, converting `other` to `self`'s unit first.
    pub fn subtract(&self, other: &Altitude) -> f64 {
        self.value - other.convert_to(self.unit).value
    }

    pub fn distance(&self, other: &Altitude) -> f64 {
        (self.normalize() - other.normalize()).abs()
    }

    /// Total ordering over normalized meter values. Unlike the source's
    /// `int(a.Subtract(b).Value)` comparator, this never collapses sub-meter
    /// differences to zero.
    pub fn compare(&self, other: &Altitude) -> Ordering {
        self.normalize().total_cmp(&other.normalize())
    }

    /// Strict containment: `min < self < max`, after normalisation.
    pub fn is_within(&self, min: &AltitudeBound, max: &AltitudeBound) -> bool {
        let v = self.normalize();
        let above_min = match min {
            AltitudeBound::Unbounded => true,
            AltitudeBound::Bounded(a) => v > a.normalize(),
        };
        let below_max = match max {
            AltitudeBound::Unbounded => true,
            AltitudeBound::Bounded(a) => v < a.normalize(),
        };
        above_min && below_max
    }
}

impl PartialEq for Altitude {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

/// An altitude limit on a [`crate::model::Feature3D`]: either a concrete
/// value or explicitly unbounded. Replaces the source's sentinel constants
/// (`DEFAULT_MIN_ALT = -999999`, `DEFAULT_MAX_ALT = 999999`) so arithmetic
/// never has to guess whether a value is "real" or a placeholder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AltitudeBound {
    Unbounded,
    Bounded(Altitude),
}

impl AltitudeBound {
    pub fn normalize_min(&self) -> f64 {
        match self {
            AltitudeBound::Unbounded => f64::NEG_INFINITY,
            AltitudeBound::Bounded(a) => a.normalize(),
        }
    }

    pub fn normalize_max(&self) -> f64 {
        match self {
            AltitudeBound::Unbounded => f64::INFINITY,
            AltitudeBound::Bounded(a) => a.normalize(),
        }
    }

    /// The smaller of two lower bounds (unbounded absorbs any finite value).
    pub fn min_of(a: AltitudeBound, b: AltitudeBound) -> AltitudeBound {
        match (a, b) {
            (AltitudeBound::Unbounded, _) | (_, AltitudeBound::Unbounded) => {
                AltitudeBound::Unbounded
            }
            (AltitudeBound::Bounded(x), AltitudeBound::Bounded(y)) => {
                if x.normalize() <= y.normalize() {
                    AltitudeBound::Bounded(x)
                } else {
                    AltitudeBound::Bounded(y)
                }
            }
        }
    }

    /// The larger of two upper bounds (unbounded absorbs any finite value).
    pub fn max_of(a: AltitudeBound, b: AltitudeBound) -> AltitudeBound {
        match (a, b) {
            (AltitudeBound::Unbounded, _) | (_, AltitudeBound::Unbounded) => {
                AltitudeBound::Unbounded
            }
            (AltitudeBound::Bounded(x), AltitudeBound::Bounded(y)) => {
                if x.normalize() >= y.normalize() {
                    AltitudeBound::Bounded(x)
                } else {
                    AltitudeBound::Bounded(y)
                }
            }
        }
    }
}
