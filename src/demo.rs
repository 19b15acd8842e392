//! Synthetic series for trying the gauge without a recording.

use rand::Rng;

use crate::error::Result;
use crate::series::TimeSeries;

/// Bounded random walk, like an altitude trace from a short flight.
pub fn random_walk<R: Rng>(
    rng: &mut R,
    samples: usize,
    frequency: f64,
    ceiling: f64,
    unit: &str,
) -> Result<TimeSeries> {
    let mut value = rng.random_range(0.0..=ceiling / 4.0);
    let mut drift = 0.0_f64;
    let data = (0..samples)
        .map(|_| {
            drift = (drift + rng.random_range(-0.5..0.5)).clamp(-2.0, 2.0);
            value = (value + drift).clamp(0.0, ceiling);
            value
        })
        .collect();
    TimeSeries::new(data, frequency, unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graduation::GraduationScale;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_walk_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let series = random_walk(&mut rng, 500, 10.0, 120.0, "m").unwrap();
        assert_eq!(series.len(), 500);
        assert!(series.samples().iter().all(|&v| (0.0..=120.0).contains(&v)));
        assert!(GraduationScale::plan(series.samples()).is_ok());
    }

    #[test]
    fn test_random_walk_is_reproducible() {
        let a = random_walk(&mut StdRng::seed_from_u64(3), 50, 5.0, 80.0, "m").unwrap();
        let b = random_walk(&mut StdRng::seed_from_u64(3), 50, 5.0, 80.0, "m").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_random_walk_needs_samples() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(random_walk(&mut rng, 0, 10.0, 50.0, "m").is_err());
    }
}
