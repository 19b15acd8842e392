//! Graduation planning: picks a round step so the dial always has headroom above the data.

use tracing::debug;

use crate::error::{GaugeError, Result};

/// Step sizes tried in ascending order.
pub const STEP_PALETTE: [f64; 7] = [1.0, 2.0, 5.0, 10.0, 20.0, 30.0, 50.0];

/// Major division counts tried for each step, fewest first.
pub const STEP_COUNTS: [usize; 3] = [8, 9, 10];

/// Exclusive upper bound on the data maximum the palette can graduate.
pub const MAX_SUPPORTED_VALUE: f64 = 500.0;

/// Base angular sweep per division; one hundredth is removed per extra division.
const SWEEP_BASE: f64 = 0.21;
const SWEEP_PER_DIVISION: f64 = 0.01;

/// Radian offset between adjacent minor tick positions for `step_count` divisions.
pub fn tick_offset(step_count: usize) -> f64 {
    SWEEP_BASE - SWEEP_PER_DIVISION * step_count as f64
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraduationScale {
    ticks: Vec<f64>,
    step: f64,
    step_count: usize,
    angular_multiplier: f64,
}

impl GraduationScale {
    /// Plans the scale for a full sample set.
    pub fn plan(samples: &[f64]) -> Result<Self> {
        if samples.is_empty() {
            return Err(GaugeError::InvalidInput(
                "cannot graduate an empty series".to_string(),
            ));
        }

        let max = samples.iter().copied().fold(0.0_f64, f64::max);

        let (step, step_count) = STEP_PALETTE
            .iter()
            .flat_map(|&step| STEP_COUNTS.iter().map(move |&count| (step, count)))
            .find(|&(step, count)| step * count as f64 > max)
            .ok_or_else(|| {
                GaugeError::InvalidInput(format!(
                    "maximum sample {max} is outside the supported range (must be below {MAX_SUPPORTED_VALUE})"
                ))
            })?;

        let scale = Self::with_step(step, step_count);
        debug!(
            max,
            step,
            step_count,
            multiplier = scale.angular_multiplier,
            "Planned graduation"
        );
        Ok(scale)
    }

    fn with_step(step: f64, step_count: usize) -> Self {
        let ticks = (0..=step_count).map(|i| i as f64 * step).collect();
        Self {
            ticks,
            step,
            step_count,
            angular_multiplier: tick_offset(step_count) / 2.0,
        }
    }

    pub fn ticks(&self) -> &[f64] {
        &self.ticks
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn angular_multiplier(&self) -> f64 {
        self.angular_multiplier
    }

    /// Highest graduated value.
    pub fn top(&self) -> f64 {
        self.step * self.step_count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_plan_example_from_docs() {
        let scale = GraduationScale::plan(&[1.0, 37.0, 12.0]).unwrap();
        assert_eq!(scale.step(), 5.0);
        assert_eq!(scale.step_count(), 8);
        assert_eq!(
            scale.ticks(),
            &[0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 35.0, 40.0]
        );
    }

    #[test]
    fn test_plan_requires_strict_headroom() {
        // 8 * 5 = 40 is not strictly above 40
        let scale = GraduationScale::plan(&[0.0, 10.0, 20.0, 31.0, 40.0]).unwrap();
        assert_eq!(scale.step(), 5.0);
        assert_eq!(scale.step_count(), 9);
        assert_eq!(scale.top(), 45.0);
        assert_eq!(scale.ticks().len(), 10);
    }

    #[test]
    fn test_plan_search_order() {
        let cases: [(f64, f64, usize); 11] = [
            (0.0, 1.0, 8),
            (7.9, 1.0, 8),
            (8.0, 1.0, 9),
            (9.5, 1.0, 10),
            (10.0, 2.0, 8),
            (19.0, 2.0, 10),
            (20.0, 5.0, 8),
            (99.0, 10.0, 10),
            (100.0, 20.0, 8),
            (300.0, 50.0, 8),
            (499.0, 50.0, 10),
        ];
        for (max, step, count) in cases {
            let scale = GraduationScale::plan(&[max]).unwrap();
            assert_eq!((scale.step(), scale.step_count()), (step, count), "max {max}");
            assert!(scale.top() > max);
        }
    }

    #[test]
    fn test_plan_brute_force_matches_first_fit() {
        let mut max = 0.0_f64;
        while max < MAX_SUPPORTED_VALUE {
            let scale = GraduationScale::plan(&[max]).unwrap();
            let expected = STEP_PALETTE
                .iter()
                .flat_map(|&e| STEP_COUNTS.iter().map(move |&k| e * k as f64))
                .find(|&top| top > max)
                .unwrap();
            assert_eq!(scale.top(), expected);
            assert!(STEP_COUNTS.contains(&(scale.ticks().len() - 1)));
            max += 0.7;
        }
    }

    #[test]
    fn test_negative_data_plans_from_zero() {
        let scale = GraduationScale::plan(&[-12.0, -3.0]).unwrap();
        assert_eq!((scale.step(), scale.step_count()), (1.0, 8));
        assert_eq!(scale.ticks()[0], 0.0);
    }

    #[test]
    fn test_plan_rejects_empty() {
        assert!(matches!(
            GraduationScale::plan(&[]),
            Err(GaugeError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_plan_rejects_out_of_range() {
        assert!(GraduationScale::plan(&[500.0]).is_err());
        assert!(GraduationScale::plan(&[1.0, 1200.0]).is_err());
        assert!(GraduationScale::plan(&[f64::INFINITY]).is_err());
    }

    #[test]
    fn test_angular_multiplier_values() {
        let expected = [(7.0, 0.065), (8.5, 0.06), (9.5, 0.055)];
        for (max, multiplier) in expected {
            let scale = GraduationScale::plan(&[max]).unwrap();
            assert!((scale.angular_multiplier() - multiplier).abs() < EPS);
        }
    }

    #[test]
    fn test_angular_multiplier_decreases_with_divisions() {
        let multipliers: Vec<f64> = STEP_COUNTS
            .iter()
            .map(|&count| GraduationScale::with_step(1.0, count).angular_multiplier())
            .collect();
        assert!(multipliers.iter().all(|&m| m > 0.0));
        assert!(multipliers.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_tick_offset_is_twice_multiplier() {
        for count in STEP_COUNTS {
            let scale = GraduationScale::with_step(2.0, count);
            assert!((tick_offset(scale.ticks().len() - 1) - 2.0 * scale.angular_multiplier()).abs() < EPS);
        }
    }
}
