use crate::backtester::DEFAULT_WORKER_COUNT;
use crate::models::BacktestJob;
use crate::strategy::trend_following::DEFAULT_NAME;
use crate::strategy::TrendFollowingParams;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::PathBuf;

pub const DEFAULT_DATA_DIR: &str = "data";

/// Symbols backtested when none are configured.
pub const DEFAULT_SYMBOLS: [(&str, &str); 5] = [
    ("Meta", "META.csv"),
    ("Tesla", "TSLA.csv"),
    ("Amazon", "AMZN.csv"),
    ("Apple", "AAPL.csv"),
    ("Google", "GOOG.csv"),
];

/// Every setting key read from the environment.
pub const SETTING_KEYS: [&str; 9] = [
    "WORKER_COUNT",
    "LOOKBACK_PERIOD",
    "ENTER_TRIGGER_PERCENTAGE",
    "EXIT_TRIGGER_PERCENTAGE",
    "TARGET_PERCENTAGE",
    "STOP_LOSS_PERCENTAGE",
    "STRATEGY_NAME",
    "DATA_DIR",
    "SYMBOLS",
];

/// Collects the known setting keys through `lookup`, skipping keys it has no value for.
pub fn collect_settings<F>(lookup: F) -> HashMap<String, String>
where
    F: Fn(&str) -> Option<String>,
{
    SETTING_KEYS
        .iter()
        .filter_map(|key| lookup(key).map(|value| (key.to_string(), value)))
        .collect()
}

/// Data directory from settings alone, without validating the rest.
pub fn data_dir_setting(settings: &HashMap<String, String>) -> PathBuf {
    setting(settings, "DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub worker_count: usize,
    pub strategy_name: String,
    pub strategy: TrendFollowingParams,
    pub data_dir: PathBuf,
    pub jobs: Vec<BacktestJob>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            strategy_name: DEFAULT_NAME.to_string(),
            strategy: TrendFollowingParams::default(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            jobs: default_jobs(),
        }
    }
}

impl RunSettings {
    /// Reads optional settings, falling back to defaults for anything missing or blank.
    pub fn from_settings_map(settings: &HashMap<String, String>) -> Result<Self> {
        let defaults = Self::default();
        let strategy = TrendFollowingParams {
            lookback_period: optional_setting_i64(
                settings,
                "LOOKBACK_PERIOD",
                defaults.strategy.lookback_period,
                1,
            )?,
            enter_trigger_percent: optional_setting_i64(
                settings,
                "ENTER_TRIGGER_PERCENTAGE",
                defaults.strategy.enter_trigger_percent,
                0,
            )?,
            exit_trigger_percent: optional_setting_i64(
                settings,
                "EXIT_TRIGGER_PERCENTAGE",
                defaults.strategy.exit_trigger_percent,
                0,
            )?,
            target_percent: optional_setting_i64(
                settings,
                "TARGET_PERCENTAGE",
                defaults.strategy.target_percent,
                0,
            )?,
            stop_loss_percent: optional_setting_i64(
                settings,
                "STOP_LOSS_PERCENTAGE",
                defaults.strategy.stop_loss_percent,
                0,
            )?,
        };
        let worker_count = optional_setting_i64(
            settings,
            "WORKER_COUNT",
            defaults.worker_count as i64,
            1,
        )? as usize;
        let strategy_name = setting(settings, "STRATEGY_NAME")
            .map(str::to_string)
            .unwrap_or(defaults.strategy_name);
        let data_dir = data_dir_setting(settings);
        let jobs = match setting(settings, "SYMBOLS") {
            Some(raw) => parse_symbol_list(raw)
                .map_err(|err| anyhow!("Setting SYMBOLS is invalid: {}", err))?,
            None => defaults.jobs,
        };

        Ok(Self {
            worker_count,
            strategy_name,
            strategy,
            data_dir,
            jobs,
        })
    }

    /// Strategy parameters in the named form accepted by `create_strategy`.
    pub fn strategy_parameters(&self) -> HashMap<String, f64> {
        self.strategy
            .to_map()
            .into_iter()
            .map(|(key, value)| (key, value as f64))
            .collect()
    }
}

pub fn default_jobs() -> Vec<BacktestJob> {
    DEFAULT_SYMBOLS
        .iter()
        .map(|(symbol, file)| BacktestJob::new(*symbol, *file))
        .collect()
}

/// Parses a single `NAME=LOCATION` entry.
pub fn parse_symbol_entry(raw: &str) -> Result<BacktestJob> {
    let (name, location) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected NAME=PATH (value: {})", raw))?;
    let (name, location) = (name.trim(), location.trim());
    if name.is_empty() || location.is_empty() {
        return Err(anyhow!("expected NAME=PATH (value: {})", raw));
    }
    Ok(BacktestJob::new(name, location))
}

/// Parses `NAME=LOCATION` entries separated by commas.
pub fn parse_symbol_list(raw: &str) -> Result<Vec<BacktestJob>> {
    let jobs = raw
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(parse_symbol_entry)
        .collect::<Result<Vec<_>>>()?;
    if jobs.is_empty() {
        return Err(anyhow!("at least one symbol is required"));
    }
    Ok(jobs)
}

fn setting<'a>(settings: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    settings
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

fn optional_setting_i64(
    settings: &HashMap<String, String>,
    key: &str,
    default: i64,
    min: i64,
) -> Result<i64> {
    let Some(raw) = setting(settings, key) else {
        return Ok(default);
    };
    let value = raw
        .parse::<i64>()
        .map_err(|_| anyhow!("Setting {} must be an integer (value: {})", key, raw))?;
    if value < min {
        return Err(anyhow!(
            "Setting {} must be >= {} (value: {})",
            key,
            min,
            raw
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_settings_use_defaults() {
        let run = RunSettings::from_settings_map(&HashMap::new()).expect("defaults");
        assert_eq!(run, RunSettings::default());
        assert_eq!(run.worker_count, 5);
        assert_eq!(run.strategy.lookback_period, 90);
        assert_eq!(run.jobs.len(), 5);
        assert_eq!(run.jobs[0], BacktestJob::new("Meta", "META.csv"));
    }

    #[test]
    fn overrides_are_applied() {
        let run = RunSettings::from_settings_map(&settings(&[
            ("WORKER_COUNT", "8"),
            ("LOOKBACK_PERIOD", "30"),
            ("STOP_LOSS_PERCENTAGE", " 7 "),
            ("DATA_DIR", "/tmp/prices"),
            ("SYMBOLS", "Nvidia=NVDA.csv, Intel=INTC.csv"),
        ]))
        .expect("valid settings");
        assert_eq!(run.worker_count, 8);
        assert_eq!(run.strategy.lookback_period, 30);
        assert_eq!(run.strategy.stop_loss_percent, 7);
        assert_eq!(run.data_dir, PathBuf::from("/tmp/prices"));
        assert_eq!(
            run.jobs,
            vec![
                BacktestJob::new("Nvidia", "NVDA.csv"),
                BacktestJob::new("Intel", "INTC.csv")
            ]
        );
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(RunSettings::from_settings_map(&settings(&[("WORKER_COUNT", "0")])).is_err());
        assert!(RunSettings::from_settings_map(&settings(&[("LOOKBACK_PERIOD", "0")])).is_err());
        assert!(
            RunSettings::from_settings_map(&settings(&[("TARGET_PERCENTAGE", "-5")])).is_err()
        );
        assert!(RunSettings::from_settings_map(&settings(&[("WORKER_COUNT", "many")])).is_err());
        assert!(RunSettings::from_settings_map(&settings(&[("SYMBOLS", "Meta")])).is_err());
    }

    #[test]
    fn collects_only_known_keys() {
        let collected = collect_settings(|key| match key {
            "WORKER_COUNT" => Some("3".to_string()),
            "DATA_DIR" => Some("/srv/prices".to_string()),
            _ => None,
        });
        assert_eq!(collected.len(), 2);
        assert_eq!(collected.get("WORKER_COUNT").map(String::as_str), Some("3"));
        assert!(!collected.contains_key("PATH"));
    }

    #[test]
    fn data_dir_ignores_other_invalid_settings() {
        let raw = settings(&[("WORKER_COUNT", "many"), ("DATA_DIR", "/srv/prices")]);
        assert!(RunSettings::from_settings_map(&raw).is_err());
        assert_eq!(data_dir_setting(&raw), PathBuf::from("/srv/prices"));
        assert_eq!(
            data_dir_setting(&HashMap::new()),
            PathBuf::from(DEFAULT_DATA_DIR)
        );
    }

    #[test]
    fn strategy_parameters_use_named_keys() {
        let params = RunSettings::default().strategy_parameters();
        assert_eq!(params.get("lookbackPeriod"), Some(&90.0));
        assert_eq!(params.get("stopLossPercent"), Some(&10.0));
    }
}
