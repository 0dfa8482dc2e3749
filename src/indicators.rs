use crate::models::PriceSeries;
use std::collections::VecDeque;

/// `(end - start) * 100 / start`. A zero `start` yields inf or NaN rather than an error.
pub fn percentage_change(start: f32, end: f32) -> f32 {
    ((end - start) * 100.0) / start
}

/// Percentage change truncated toward zero, used for integer trigger comparisons.
/// Non-finite values saturate (NaN becomes 0).
pub fn truncated_percentage_change(start: f32, end: f32) -> i64 {
    percentage_change(start, end) as i64
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WindowExtremes {
    pub running_max: Vec<f32>,
    pub running_min: Vec<f32>,
}

impl WindowExtremes {
    pub fn len(&self) -> usize {
        self.running_max.len()
    }

    pub fn is_empty(&self) -> bool {
        self.running_max.is_empty()
    }
}

pub fn calculate_window_extremes(series: &PriceSeries, period: usize) -> WindowExtremes {
    let closes = series.closes();
    WindowExtremes {
        running_max: calculate_rolling_max(&closes, period),
        running_min: calculate_rolling_min(&closes, period),
    }
}

/// Maximum over the trailing `period` values ending at each index. The window start
/// clamps to 0, so a period longer than the input yields a running maximum from the start.
pub fn calculate_rolling_max(prices: &[f32], period: usize) -> Vec<f32> {
    rolling_extreme(prices, period, |current, back| current >= back)
}

/// Minimum counterpart of [`calculate_rolling_max`].
pub fn calculate_rolling_min(prices: &[f32], period: usize) -> Vec<f32> {
    rolling_extreme(prices, period, |current, back| current <= back)
}

// Monotonic deque of indices; `dominates(current, back)` evicts from the back.
fn rolling_extreme<F>(prices: &[f32], period: usize, dominates: F) -> Vec<f32>
where
    F: Fn(f32, f32) -> bool,
{
    if prices.is_empty() {
        return Vec::new();
    }
    let period = period.max(1);

    let mut window: VecDeque<usize> = VecDeque::with_capacity(period.min(prices.len()));
    let mut extremes = Vec::with_capacity(prices.len());

    for (i, &price) in prices.iter().enumerate() {
        while window.front().is_some_and(|&front| i - front >= period) {
            window.pop_front();
        }
        while window
            .back()
            .is_some_and(|&back| dominates(price, prices[back]))
        {
            window.pop_back();
        }
        window.push_back(i);

        // The deque always holds `i` at this point.
        let front = window.front().copied().unwrap_or(i);
        extremes.push(prices[front]);
    }

    extremes
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn brute_force(prices: &[f32], period: usize) -> (Vec<f32>, Vec<f32>) {
        let mut maxes = Vec::with_capacity(prices.len());
        let mut mins = Vec::with_capacity(prices.len());
        for i in 0..prices.len() {
            let start = (i + 1).saturating_sub(period);
            let window = &prices[start..=i];
            maxes.push(window.iter().copied().fold(f32::NEG_INFINITY, f32::max));
            mins.push(window.iter().copied().fold(f32::INFINITY, f32::min));
        }
        (maxes, mins)
    }

    #[test]
    fn percentage_change_matches_formula() {
        assert!((percentage_change(100.0, 110.0) - 10.0).abs() < 1e-5);
        assert!((percentage_change(110.0, 95.0) + 13.636_364).abs() < 1e-4);
    }

    #[test]
    fn percentage_change_with_zero_start_is_not_finite() {
        assert!(percentage_change(0.0, 10.0).is_infinite());
        assert!(percentage_change(0.0, 0.0).is_nan());
        assert_eq!(truncated_percentage_change(0.0, 0.0), 0);
        assert_eq!(truncated_percentage_change(0.0, 5.0), i64::MAX);
    }

    #[test]
    fn truncation_goes_toward_zero() {
        // (110 - 102) * 100 / 102 = 7.84...
        assert_eq!(truncated_percentage_change(102.0, 110.0), 7);
        // (90 - 110) * 100 / 110 = -18.18...
        assert_eq!(truncated_percentage_change(110.0, 90.0), -18);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(calculate_rolling_max(&[], 3).is_empty());
        assert!(calculate_rolling_min(&[], 3).is_empty());
        let extremes = calculate_window_extremes(&PriceSeries::from_closes("EMPTY", &[]), 5);
        assert!(extremes.is_empty());
    }

    #[test]
    fn trailing_window_of_three() {
        let prices = [100.0, 101.0, 102.0, 103.0, 110.0, 95.0, 90.0, 85.0, 130.0, 140.0];
        let maxes = calculate_rolling_max(&prices, 3);
        let mins = calculate_rolling_min(&prices, 3);
        assert_eq!(
            maxes,
            vec![100.0, 101.0, 102.0, 103.0, 110.0, 110.0, 110.0, 95.0, 130.0, 140.0]
        );
        assert_eq!(
            mins,
            vec![100.0, 100.0, 100.0, 101.0, 102.0, 95.0, 90.0, 85.0, 85.0, 85.0]
        );
    }

    #[test]
    fn period_longer_than_series_clamps_to_start() {
        let prices = [5.0, 3.0, 8.0, 1.0, 9.0, 2.0, 7.0, 4.0, 6.0, 0.5];
        let maxes = calculate_rolling_max(&prices, 200);
        let mins = calculate_rolling_min(&prices, 200);
        assert_eq!(maxes, vec![5.0, 5.0, 8.0, 8.0, 9.0, 9.0, 9.0, 9.0, 9.0, 9.0]);
        assert_eq!(mins, vec![5.0, 3.0, 3.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.5]);
    }

    #[test]
    fn period_of_one_is_identity() {
        let prices = [4.0, 2.0, 6.0, 6.0, 1.0];
        assert_eq!(calculate_rolling_max(&prices, 1), prices.to_vec());
        assert_eq!(calculate_rolling_min(&prices, 1), prices.to_vec());
    }

    #[test]
    fn matches_brute_force_on_random_series() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for len in [1usize, 2, 17, 250, 3000] {
            let prices: Vec<f32> = (0..len)
                .map(|_| rng.gen_range(1.0f32..500.0).round())
                .collect();
            for period in [1, len, len + 10, 7] {
                let (expected_max, expected_min) = brute_force(&prices, period);
                assert_eq!(calculate_rolling_max(&prices, period), expected_max);
                assert_eq!(calculate_rolling_min(&prices, period), expected_min);
            }
        }
    }

    #[test]
    fn extremes_bracket_every_close() {
        let mut rng = StdRng::seed_from_u64(42);
        let closes: Vec<f32> = (0..500).map(|_| rng.gen_range(10.0f32..20.0)).collect();
        let series = PriceSeries::from_closes("RND", &closes);
        for period in [1, 5, 90, 600] {
            let extremes = calculate_window_extremes(&series, period);
            assert_eq!(extremes.len(), closes.len());
            for (i, close) in closes.iter().enumerate() {
                assert!(extremes.running_max[i] >= *close);
                assert!(extremes.running_min[i] <= *close);
            }
        }
    }
}
