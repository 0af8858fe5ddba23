//! Validator and operator records
//!
//! Validators come from the directory. An operator is a validator that runs
//! a restake bot: it has a bot address and a run schedule.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

const SECONDS_PER_DAY: u64 = 24 * 3600;

/// Validator as published by the directory
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatorRecord {
    pub operator_address: String,

    #[serde(default)]
    pub moniker: Option<String>,

    /// Bond status, e.g. `BOND_STATUS_BONDED`
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub commission: Option<Commission>,

    /// Restake bot details, absent when the validator runs no bot
    #[serde(default, deserialize_with = "restake_or_false")]
    pub restake: Option<RestakeInfo>,
}

impl ValidatorRecord {
    /// Identity key, the operator address
    pub fn address(&self) -> &str {
        &self.operator_address
    }

    pub fn is_restake(&self) -> bool {
        self.restake.is_some()
    }

    pub fn bot_address(&self) -> Option<&str> {
        self.restake.as_ref().map(|restake| restake.address.as_str())
    }

    /// Commission rate as a fraction, zero when unknown
    pub fn commission_rate(&self) -> f64 {
        self.commission
            .as_ref()
            .and_then(|commission| commission.commission_rates.rate.to_f64())
            .unwrap_or(0.0)
    }
}

/// Validator commission
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commission {
    pub commission_rates: CommissionRates,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionRates {
    pub rate: Decimal,
}

/// Restake bot details
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestakeInfo {
    /// Bot address granted authz by delegators
    pub address: String,

    #[serde(default)]
    pub run_time: Option<RunTime>,

    #[serde(default)]
    pub minimum_reward: Option<u64>,
}

/// The directory publishes `"restake": false` for validators without a bot
fn restake_or_false<'de, D>(deserializer: D) -> Result<Option<RestakeInfo>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Field {
        Info(RestakeInfo),
        Flag(bool),
    }

    Ok(match Option::<Field>::deserialize(deserializer)? {
        Some(Field::Info(info)) => Some(info),
        Some(Field::Flag(_)) | None => None,
    })
}

/// When a bot runs: one time of day, several, or an interval
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RunTime {
    Single(String),
    Multiple(Vec<String>),
}

impl RunTime {
    /// Runs per day, capped at `max` when given. Never below one.
    pub fn runs_per_day(&self, max: Option<u32>) -> u32 {
        let runs = match self {
            Self::Multiple(times) => times.len() as u32,
            Self::Single(time) => match time.trim().strip_prefix("every") {
                Some(interval) => parse_interval(interval.trim())
                    .map(|secs| (SECONDS_PER_DAY / secs) as u32)
                    .unwrap_or(1),
                None => 1,
            },
        };
        let runs = runs.max(1);
        match max {
            Some(max) if max > 0 && runs > max => max,
            _ => runs,
        }
    }
}

/// Parse `15 minutes`, `1 hour`, `hour` or `30m` into seconds
fn parse_interval(interval: &str) -> Option<u64> {
    let split = interval
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(interval.len());
    let (count, unit) = interval.split_at(split);
    let count: u64 = if count.is_empty() { 1 } else { count.parse().ok()? };

    let unit_secs = match unit.trim() {
        "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3600,
        "d" | "day" | "days" => SECONDS_PER_DAY,
        _ => return None,
    };
    let secs = count.checked_mul(unit_secs)?;
    (secs > 0).then_some(secs)
}

/// A validator eligible to run restake for delegators
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorRecord {
    /// Operator address of the validator
    #[serde(alias = "operator_address")]
    pub address: String,

    #[serde(alias = "bot_address")]
    pub bot_address: String,

    #[serde(default)]
    pub moniker: Option<String>,

    #[serde(default, alias = "run_time")]
    pub run_time: Option<RunTime>,

    #[serde(default, alias = "minimum_reward")]
    pub minimum_reward: Option<u64>,
}

impl OperatorRecord {
    /// Operator view of a validator, if it runs a bot
    pub fn from_validator(validator: &ValidatorRecord) -> Option<Self> {
        let restake = validator.restake.as_ref()?;
        Some(Self {
            address: validator.operator_address.clone(),
            bot_address: restake.address.clone(),
            moniker: validator.moniker.clone(),
            run_time: restake.run_time.clone(),
            minimum_reward: restake.minimum_reward,
        })
    }

    /// Runs per day, one when no schedule is published
    pub fn runs_per_day(&self, max: Option<u32>) -> u32 {
        self.run_time
            .as_ref()
            .map_or(1, |run_time| run_time.runs_per_day(max))
    }
}
