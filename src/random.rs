//! Pluggable randomness for example synthesis.

use rand::Rng;

const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Source of uniform floats in `[0, 1)`.
pub trait RandomSource {
    fn next(&mut self) -> f64;
}

/// Thread-local `rand` generator. Not reproducible across calls.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next(&mut self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Adapter for any `rand::Rng`, e.g. a seeded `StdRng`.
#[derive(Debug, Clone)]
pub struct RngSource<R>(pub R);

impl<R: Rng> RandomSource for RngSource<R> {
    fn next(&mut self) -> f64 {
        self.0.gen::<f64>()
    }
}

/// Replays a fixed sequence of values, wrapping around at the end.
#[derive(Debug, Clone)]
pub struct SequenceRandom {
    values: Vec<f64>,
    pos: usize,
}

impl SequenceRandom {
    /// Values outside `[0, 1)` are clamped into it.
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        let mut values: Vec<f64> = values.into();
        if values.is_empty() {
            values.push(0.0);
        }
        for v in &mut values {
            *v = v.clamp(0.0, 1.0 - f64::EPSILON);
        }
        Self { values, pos: 0 }
    }
}

impl RandomSource for SequenceRandom {
    fn next(&mut self) -> f64 {
        let v = self.values[self.pos];
        self.pos = (self.pos + 1) % self.values.len();
        v
    }
}

/// Integer in `[min, max)`. Returns `min` when the range is empty.
pub fn random_in_range<R: RandomSource + ?Sized>(rng: &mut R, min: i64, max: i64) -> i64 {
    if max <= min {
        return min;
    }
    let span = (max - min) as f64;
    min + ((rng.next() * span).floor() as i64).min(max - min - 1)
}

/// Index into a collection of `len` elements. `len` must be non-zero.
pub fn random_index<R: RandomSource + ?Sized>(rng: &mut R, len: usize) -> usize {
    random_in_range(rng, 0, len as i64) as usize
}

/// Alphanumeric string (`[A-Za-z0-9]`) of exactly `len` characters.
pub fn random_string<R: RandomSource + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| ALPHANUMERIC[random_index(rng, ALPHANUMERIC.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn sequence_replays_and_wraps() {
        let mut rng = SequenceRandom::new([0.1, 0.5]);
        assert_eq!(rng.next(), 0.1);
        assert_eq!(rng.next(), 0.5);
        assert_eq!(rng.next(), 0.1);
    }

    #[test]
    fn sequence_clamps_out_of_range_values() {
        let mut rng = SequenceRandom::new([1.5, -2.0]);
        assert!(rng.next() < 1.0);
        assert_eq!(rng.next(), 0.0);
    }

    #[test]
    fn empty_sequence_yields_zero() {
        let mut rng = SequenceRandom::new(Vec::<f64>::new());
        assert_eq!(rng.next(), 0.0);
    }

    #[test]
    fn random_in_range_bounds() {
        let mut low = SequenceRandom::new([0.0]);
        let mut high = SequenceRandom::new([0.999_999]);
        assert_eq!(random_in_range(&mut low, 1, 10), 1);
        assert_eq!(random_in_range(&mut high, 1, 10), 9);
    }

    #[test]
    fn random_in_range_empty_range_returns_min() {
        let mut rng = SequenceRandom::new([0.7]);
        assert_eq!(random_in_range(&mut rng, 4, 4), 4);
    }

    #[test]
    fn random_index_picks_by_fraction() {
        let mut rng = SequenceRandom::new([0.0, 0.5, 0.99]);
        assert_eq!(random_index(&mut rng, 2), 0);
        assert_eq!(random_index(&mut rng, 2), 1);
        assert_eq!(random_index(&mut rng, 2), 1);
    }

    #[test]
    fn random_string_is_alphanumeric_with_exact_length() {
        let mut rng = RngSource(StdRng::seed_from_u64(7));
        for _ in 0..50 {
            let s = random_string(&mut rng, 15);
            assert_eq!(s.len(), 15);
            assert!(s.chars().all(|c| c.is_ascii_alphanumeric()), "got {s}");
        }
    }

    #[test]
    fn random_string_from_fixed_sequence() {
        let mut rng = SequenceRandom::new([0.0]);
        assert_eq!(random_string(&mut rng, 3), "AAA");
    }

    #[test]
    fn thread_random_stays_in_unit_interval() {
        let mut rng = ThreadRandom;
        for _ in 0..100 {
            let v = rng.next();
            assert!((0.0..1.0).contains(&v));
        }
    }
}
