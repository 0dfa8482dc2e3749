use crate::error::ConfigError;
use crate::models::*;
use std::collections::{BTreeMap, HashMap};

pub trait Strategy {
    fn get_template_id(&self) -> &str;
    /// Display name used in reports.
    fn name(&self) -> &str;
    /// Named configuration, for reporting and logging.
    fn parameters(&self) -> BTreeMap<String, i64>;
    /// One signal per record of `series`, in the same order.
    fn generate_signals(&self, series: &PriceSeries) -> Vec<SignalAction>;
}

#[path = "strategies/trend_following.rs"]
pub mod trend_following;

pub use trend_following::{TrendFollowingParams, TrendFollowingStrategy};

pub fn create_strategy(
    template_id: &str,
    name: &str,
    parameters: HashMap<String, f64>,
) -> Result<Box<dyn Strategy + Send + Sync>, ConfigError> {
    match template_id {
        "trend_following" => Ok(Box::new(TrendFollowingStrategy::from_parameters(
            name, &parameters,
        )?)),
        _ => Err(ConfigError::UnknownStrategy(template_id.to_string())),
    }
}
