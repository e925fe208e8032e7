//! Simulated measurement source.

use super::SampleSource;
use crate::ess::codec::{MAX_DIMS, Value, ValueFormat};
use crate::ess::registry::ValidRange;
use crate::ess::uuids::Characteristic;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Draws uniformly distributed samples inside each channel's valid range.
///
/// Seed it for reproducible runs; otherwise it is seeded from OS entropy.
pub struct RandomSampleSource {
    rng: StdRng,
}

impl RandomSampleSource {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

impl SampleSource for RandomSampleSource {
    fn sample(
        &mut self,
        _channel: Characteristic,
        format: &ValueFormat,
        range: &ValidRange,
    ) -> Value {
        let dims = format.dims as usize;
        let mut components = [0i64; MAX_DIMS];
        for (i, slot) in components.iter_mut().enumerate().take(dims) {
            let lower = range.lower.components().get(i).copied().unwrap_or(0);
            let upper = range.upper.components().get(i).copied().unwrap_or(lower);
            let (lo, hi) = if lower <= upper {
                (lower, upper)
            } else {
                (upper, lower)
            };
            let lo = lo.max(format.min_component());
            let hi = hi.min(format.max_component()).max(lo);
            *slot = self.rng.gen_range(lo..=hi);
        }
        Value::from_components(&components[..dims]).unwrap_or(Value::scalar(0))
    }
}
