//! APY aggregation
//!
//! A validator's yield is the chain APR less its commission. When the
//! validator runs a restake operator the rewards compound on every run.

use restake_core::{OperatorRecord, ValidatorRecord};
use std::collections::BTreeMap;

const DAYS_PER_YEAR: f64 = 365.0;

/// Annual yield of one validator, compounded per operator run when present
pub fn validator_apy(
    validator: &ValidatorRecord,
    operator: Option<&OperatorRecord>,
    estimated_apr: f64,
) -> f64 {
    let apr = estimated_apr * (1.0 - validator.commission_rate());
    match operator {
        Some(operator) => {
            let periods = f64::from(operator.runs_per_day(None)) * DAYS_PER_YEAR;
            (1.0 + apr / periods).powf(periods) - 1.0
        }
        None => apr,
    }
}

/// Yield of every validator, keyed by operator address.
///
/// Operators are matched on their operator address, not the bot address.
pub fn compute_apy(
    validators: &BTreeMap<String, ValidatorRecord>,
    operators: &[OperatorRecord],
    estimated_apr: f64,
) -> BTreeMap<String, f64> {
    validators
        .iter()
        .map(|(address, validator)| {
            let operator = operators.iter().find(|operator| &operator.address == address);
            (address.clone(), validator_apy(validator, operator, estimated_apr))
        })
        .collect()
}
