//! Pluggable sampling strategies over a 2D/3D bounding box (spec §4.2).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::model::Waypoint;

/// `sampleXY`/`sampleZ` contract shared by all samplers.
pub trait Sampler: Send {
    fn sample_xy(&mut self, min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> (f64, f64);
    fn sample_z(&mut self, min_z: f64, max_z: f64) -> f64;

    fn sample_xyz(
        &mut self,
        min_x: f64,
        max_x: f64,
        min_y: f64,
        max_y: f64,
        min_z: f64,
        max_z: f64,
    ) -> (f64, f64, f64) {
        let (x, y) = self.sample_xy(min_x, max_x, min_y, max_y);
        let z = self.sample_z(min_z, max_z);
        (x, y, z)
    }
}

/// Independent uniform draws per axis from a seeded PRNG.
pub struct UniformSampler {
    rng: StdRng,
}

impl UniformSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Sampler for UniformSampler {
    fn sample_xy(&mut self, min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> (f64, f64) {
        (
            self.rng.random_range(min_x..=max_x),
            self.rng.random_range(min_y..=max_y),
        )
    }

    fn sample_z(&mut self, min_z: f64, max_z: f64) -> f64 {
        self.rng.random_range(min_z..=max_z)
    }
}

/// Deterministic low-discrepancy sequence, bases 2 (x), 3 (y), 5 (z). The
/// index increments once per `sample_xy` call and is read, not advanced, by
/// the paired `sample_z`, so an xy/z pair originates from the same index.
pub struct HaltonSampler {
    index: u64,
}

impl HaltonSampler {
    pub fn new(_seed: u64) -> Self {
        // Halton is purely deterministic; `_seed` is accepted so callers can
        // select a sampler uniformly regardless of variant.
        Self { index: 0 }
    }

    fn halton(mut index: u64, base: u64) -> f64 {
        let mut f = 1.0_f64;
        let mut r = 0.0_f64;
        while index > 0 {
            f /= base as f64;
            r += f * (index % base) as f64;
            index /= base;
        }
        r
    }
}

impl Sampler for HaltonSampler {
    fn sample_xy(&mut self, min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> (f64, f64) {
        self.index += 1;
        let x = min_x + Self::halton(self.index, 2) * (max_x - min_x);
        let y = min_y + Self::halton(self.index, 3) * (max_y - min_y);
        (x, y)
    }

    fn sample_z(&mut self, min_z: f64, max_z: f64) -> f64 {
        min_z + Self::halton(self.index, 5) * (max_z - min_z)
    }
}

/// Decorates an inner sampler: with probability `p_bias`, `sample_xy`
/// returns the goal's (lon, lat) instead of delegating. The choice is
/// remembered so the paired `sample_z` returns the goal's altitude iff the
/// goal was chosen for xy.
pub struct GoalBiasSampler {
    inner: Box<dyn Sampler>,
    goal: Waypoint,
    p_bias: f64,
    rng: StdRng,
    last_chose_goal: bool,
}

impl GoalBiasSampler {
    pub fn new(inner: Box<dyn Sampler>, goal: Waypoint, p_bias: f64, seed: u64) -> Self {
        Self {
            inner,
            goal,
            p_bias,
            rng: StdRng::seed_from_u64(seed ^ 0x9E37_79B9_7F4A_7C15),
            last_chose_goal: false,
        }
    }
}

impl Sampler for GoalBiasSampler {
    fn sample_xy(&mut self, min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> (f64, f64) {
        if self.p_bias > 0.0 && self.rng.random_range(0.0..1.0) < self.p_bias {
            self.last_chose_goal = true;
            (self.goal.lon, self.goal.lat)
        } else {
            self.last_chose_goal = false;
            self.inner.sample_xy(min_x, max_x, min_y, max_y)
        }
    }

    fn sample_z(&mut self, min_z: f64, max_z: f64) -> f64 {
        if self.last_chose_goal {
            self.goal.alt.normalize()
        } else {
            self.inner.sample_z(min_z, max_z)
        }
    }
}

/// Construct the sampler selected by wire value, as a trait object.
pub fn new_sampler(sampler_type: crate::model::SamplerType, seed: u64) -> Box<dyn Sampler> {
    match sampler_type {
        crate::model::SamplerType::Uniform => Box::new(UniformSampler::new(seed)),
        crate::model::SamplerType::Halton => Box::new(HaltonSampler::new(seed)),
    }
}
