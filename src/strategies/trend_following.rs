use crate::error::ConfigError;
use crate::indicators::{
    calculate_window_extremes, percentage_change, truncated_percentage_change,
};
use crate::models::*;
use crate::param_utils::{get_param_i64, get_percentage_param};
use std::collections::{BTreeMap, HashMap};

pub const TEMPLATE_ID: &str = "trend_following";
pub const DEFAULT_NAME: &str = "Trend Following Strategy";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendFollowingParams {
    pub lookback_period: i64,
    pub enter_trigger_percent: i64,
    pub exit_trigger_percent: i64,
    pub target_percent: i64,
    pub stop_loss_percent: i64,
}

impl Default for TrendFollowingParams {
    fn default() -> Self {
        Self {
            lookback_period: 90,
            enter_trigger_percent: 5,
            exit_trigger_percent: 5,
            target_percent: 20,
            stop_loss_percent: 10,
        }
    }
}

impl TrendFollowingParams {
    pub fn from_parameters(parameters: &HashMap<String, f64>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let params = Self {
            lookback_period: get_param_i64(
                parameters,
                "lookbackPeriod",
                defaults.lookback_period,
            )?,
            enter_trigger_percent: get_percentage_param(
                parameters,
                "enterTriggerPercent",
                defaults.enter_trigger_percent,
            )?,
            exit_trigger_percent: get_percentage_param(
                parameters,
                "exitTriggerPercent",
                defaults.exit_trigger_percent,
            )?,
            target_percent: get_percentage_param(
                parameters,
                "targetPercent",
                defaults.target_percent,
            )?,
            stop_loss_percent: get_percentage_param(
                parameters,
                "stopLossPercent",
                defaults.stop_loss_percent,
            )?,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lookback_period < 1 {
            return Err(ConfigError::InvalidLookback(self.lookback_period));
        }
        let percentages = [
            ("enterTriggerPercent", self.enter_trigger_percent),
            ("exitTriggerPercent", self.exit_trigger_percent),
            ("targetPercent", self.target_percent),
            ("stopLossPercent", self.stop_loss_percent),
        ];
        for (name, value) in percentages {
            if value < 0 {
                return Err(ConfigError::NegativePercentage {
                    name: name.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }

    pub fn to_map(&self) -> BTreeMap<String, i64> {
        BTreeMap::from([
            ("lookbackPeriod".to_string(), self.lookback_period),
            ("enterTriggerPercent".to_string(), self.enter_trigger_percent),
            ("exitTriggerPercent".to_string(), self.exit_trigger_percent),
            ("targetPercent".to_string(), self.target_percent),
            ("stopLossPercent".to_string(), self.stop_loss_percent),
        ])
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PositionState {
    Flat,
    Long { entry_price: f32 },
    Short { entry_price: f32 },
}

/// Breakout strategy: enters when the close moves far enough away from the trailing
/// window extreme, exits on target, stop loss or a reversal of the same size.
pub struct TrendFollowingStrategy {
    template_id: String,
    name: String,
    params: TrendFollowingParams,
}

impl TrendFollowingStrategy {
    pub fn new(name: &str, params: TrendFollowingParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            template_id: TEMPLATE_ID.to_string(),
            name: name.to_string(),
            params,
        })
    }

    pub fn from_parameters(
        name: &str,
        parameters: &HashMap<String, f64>,
    ) -> Result<Self, ConfigError> {
        Self::new(name, TrendFollowingParams::from_parameters(parameters)?)
    }

    fn next_state(
        &self,
        state: PositionState,
        close: f32,
        up_move: i64,
        down_move: i64,
    ) -> (PositionState, SignalAction) {
        let p = &self.params;
        match state {
            PositionState::Flat => {
                if up_move >= p.enter_trigger_percent {
                    (PositionState::Long { entry_price: close }, SignalAction::EnterLong)
                } else if down_move >= p.enter_trigger_percent {
                    (PositionState::Short { entry_price: close }, SignalAction::EnterShort)
                } else {
                    (PositionState::Flat, SignalAction::None)
                }
            }
            PositionState::Long { entry_price } => {
                let change = percentage_change(entry_price, close);
                if change >= p.target_percent as f32
                    || down_move >= p.exit_trigger_percent
                    || -change >= p.stop_loss_percent as f32
                {
                    (PositionState::Flat, SignalAction::ExitLong)
                } else {
                    (state, SignalAction::None)
                }
            }
            PositionState::Short { entry_price } => {
                let change = percentage_change(entry_price, close);
                if -change >= p.target_percent as f32
                    || up_move >= p.exit_trigger_percent
                    || change >= p.stop_loss_percent as f32
                {
                    (PositionState::Flat, SignalAction::ExitShort)
                } else {
                    (state, SignalAction::None)
                }
            }
        }
    }
}

impl super::Strategy for TrendFollowingStrategy {
    fn get_template_id(&self) -> &str {
        &self.template_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> BTreeMap<String, i64> {
        self.params.to_map()
    }

    fn generate_signals(&self, series: &PriceSeries) -> Vec<SignalAction> {
        let n = series.len();
        let mut signals = vec![SignalAction::None; n];
        if n == 0 {
            return signals;
        }

        // validate() guarantees a positive lookback
        let period = usize::try_from(self.params.lookback_period).unwrap_or(usize::MAX);
        let extremes = calculate_window_extremes(series, period);
        let mut state = PositionState::Flat;

        for (i, record) in series.records().iter().enumerate() {
            let close = record.close_price;
            // Moves are truncated toward zero before comparing against whole-number triggers.
            let up_move = truncated_percentage_change(extremes.running_min[i], close);
            let down_move =
                truncated_percentage_change(extremes.running_max[i], close).saturating_neg();

            let (next, signal) = self.next_state(state, close, up_move, down_move);
            state = next;
            signals[i] = signal;
        }

        signals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::Strategy;

    fn scenario_strategy() -> TrendFollowingStrategy {
        TrendFollowingStrategy::new(
            DEFAULT_NAME,
            TrendFollowingParams {
                lookback_period: 3,
                enter_trigger_percent: 5,
                exit_trigger_percent: 5,
                target_percent: 20,
                stop_loss_percent: 10,
            },
        )
        .expect("valid params")
    }

    const SCENARIO: [f32; 10] = [
        100.0, 101.0, 102.0, 103.0, 110.0, 95.0, 90.0, 85.0, 130.0, 140.0,
    ];

    #[test]
    fn breakout_scenario_produces_expected_signals() {
        let series = PriceSeries::from_closes("SCN", &SCENARIO);
        let signals = scenario_strategy().generate_signals(&series);

        assert_eq!(
            signals,
            vec![
                SignalAction::None,
                SignalAction::None,
                SignalAction::None,
                SignalAction::None,
                // min over 102..110 gives 7.84%, truncated to 7
                SignalAction::EnterLong,
                // 110 -> 95 breaches the 10% stop loss
                SignalAction::ExitLong,
                // 90 is 18% below the trailing max of 110
                SignalAction::EnterShort,
                SignalAction::None,
                // 130 is 52% above the trailing min of 85
                SignalAction::ExitShort,
                SignalAction::EnterLong,
            ]
        );
    }

    #[test]
    fn stop_loss_alone_closes_long() {
        // Exit trigger set high so only the stop loss can fire.
        let strategy = TrendFollowingStrategy::new(
            DEFAULT_NAME,
            TrendFollowingParams {
                lookback_period: 3,
                enter_trigger_percent: 5,
                exit_trigger_percent: 100,
                target_percent: 20,
                stop_loss_percent: 10,
            },
        )
        .expect("valid params");
        let series =
            PriceSeries::from_closes("SL", &[100.0, 101.0, 102.0, 103.0, 110.0, 105.0, 90.0]);
        let signals = strategy.generate_signals(&series);
        assert_eq!(signals[4], SignalAction::EnterLong);
        assert_eq!(signals[5], SignalAction::None);
        assert_eq!(signals[6], SignalAction::ExitLong);
    }

    #[test]
    fn target_closes_long() {
        let strategy = TrendFollowingStrategy::new(
            DEFAULT_NAME,
            TrendFollowingParams {
                lookback_period: 2,
                enter_trigger_percent: 5,
                exit_trigger_percent: 50,
                target_percent: 20,
                stop_loss_percent: 50,
            },
        )
        .expect("valid params");
        let series = PriceSeries::from_closes("TGT", &[100.0, 106.0, 110.0, 119.0, 128.0]);
        let signals = strategy.generate_signals(&series);
        assert_eq!(signals[1], SignalAction::EnterLong);
        // 128 vs 106 is +20.75%
        assert_eq!(
            &signals[2..],
            &[SignalAction::None, SignalAction::None, SignalAction::ExitLong]
        );
    }

    #[test]
    fn fractional_moves_below_trigger_are_ignored() {
        // 104.9 vs 100 is 4.9%, which truncates to 4 and must not trigger at 5.
        let strategy = scenario_strategy();
        let series = PriceSeries::from_closes("TRN", &[100.0, 104.9]);
        assert_eq!(
            strategy.generate_signals(&series),
            vec![SignalAction::None, SignalAction::None]
        );
    }

    #[test]
    fn empty_series_yields_no_signals() {
        let series = PriceSeries::from_closes("EMPTY", &[]);
        assert!(scenario_strategy().generate_signals(&series).is_empty());
    }

    #[test]
    fn signals_alternate_between_entries_and_exits() {
        let closes: Vec<f32> = (0..400)
            .map(|i| 100.0 + 30.0 * ((i as f32) * 0.21).sin() + (i % 7) as f32)
            .collect();
        let series = PriceSeries::from_closes("ALT", &closes);
        let signals = scenario_strategy().generate_signals(&series);
        assert_eq!(signals.len(), closes.len());

        let mut open = false;
        for signal in signals.iter().filter(|s| **s != SignalAction::None) {
            if signal.is_entry() {
                assert!(!open, "entry while a position is open");
                open = true;
            } else {
                assert!(open, "exit without an open position");
                open = false;
            }
        }
    }

    #[test]
    fn rejects_degenerate_configuration() {
        assert_eq!(
            TrendFollowingStrategy::new(
                DEFAULT_NAME,
                TrendFollowingParams {
                    lookback_period: 0,
                    ..TrendFollowingParams::default()
                }
            )
            .err(),
            Some(ConfigError::InvalidLookback(0))
        );
        assert!(matches!(
            TrendFollowingStrategy::new(
                DEFAULT_NAME,
                TrendFollowingParams {
                    stop_loss_percent: -1,
                    ..TrendFollowingParams::default()
                }
            ),
            Err(ConfigError::NegativePercentage { .. })
        ));
    }
}
