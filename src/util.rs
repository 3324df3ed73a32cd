use std::ops::Range;
use std::sync::{Mutex, PoisonError};

use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{thread_rng, Rng, SeedableRng};

/// Source of uniformly distributed vectors, used to perturb reflections.
///
/// The renderer only ever asks for a vector whose three components are
/// independently drawn from `range`. Implementations must be shareable across
/// the rayon worker threads.
pub trait VectorSampler: Sync {
    fn vec3(&self, range: Range<f32>) -> Vector3<f32>;
}

fn random_vec<R: Rng + ?Sized>(rng: &mut R, range: Range<f32>) -> Vector3<f32> {
    // gen_range는 빈 범위에서 panic 하니까 미리 걸러냄
    if range.is_empty() {
        return Vector3::repeat(range.start);
    }

    Vector3::new(
        rng.gen_range(range.clone()),
        rng.gen_range(range.clone()),
        rng.gen_range(range),
    )
}

/// 스레드마다 따로 있는 `thread_rng` 사용. 기본값.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngSampler;

impl VectorSampler for ThreadRngSampler {
    fn vec3(&self, range: Range<f32>) -> Vector3<f32> {
        random_vec(&mut thread_rng(), range)
    }
}

/// Reproducible sampler backed by a seeded [`StdRng`].
///
/// The sequence is only reproducible when pixels are visited in a fixed order,
/// i.e. with `Settings::parallel` turned off.
#[derive(Debug)]
pub struct SeededSampler {
    rng: Mutex<StdRng>,
}

impl SeededSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl VectorSampler for SeededSampler {
    fn vec3(&self, range: Range<f32>) -> Vector3<f32> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        random_vec(&mut *rng, range)
    }
}

/// Always yields the same vector, regardless of the requested range.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConstantSampler(pub Vector3<f32>);

impl VectorSampler for ConstantSampler {
    fn vec3(&self, _range: Range<f32>) -> Vector3<f32> {
        self.0
    }
}
