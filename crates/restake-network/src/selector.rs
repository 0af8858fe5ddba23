//! # Operator Selection
//!
//! Filters validators into operators under an allow/block policy and ranks
//! them for display.
//!
//! Ranking shuffles on every call so that equally eligible operators take
//! turns at the top of the list. The owner's operator, when present, is
//! always first.

use rand::seq::SliceRandom;
use rand::Rng;
use restake_core::{NetworkConfig, OperatorRecord, ValidatorRecord};
use std::collections::BTreeMap;

/// Allow/block list policy for operator addresses
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OperatorPolicy {
    allow: Option<Vec<String>>,
    block: Option<Vec<String>>,
}

impl OperatorPolicy {
    pub fn new(allow: Option<Vec<String>>, block: Option<Vec<String>>) -> Self {
        Self { allow, block }
    }

    pub fn from_config(config: &NetworkConfig) -> Self {
        Self::new(config.allow_operators.clone(), config.block_operators.clone())
    }

    /// Allow list is checked first, then the block list. Unlisted addresses
    /// pass unless an allow list exists.
    pub fn allow_operator(&self, address: &str) -> bool {
        if let Some(allow) = &self.allow {
            if !allow.iter().any(|allowed| allowed == address) {
                return false;
            }
        }
        if let Some(block) = &self.block {
            if block.iter().any(|blocked| blocked == address) {
                return false;
            }
        }
        true
    }
}

/// Operators of a network.
///
/// An explicit operator list in the config is used verbatim. Otherwise every
/// restake validator passing the policy becomes an operator.
pub fn select_operators(validators: &[ValidatorRecord], config: &NetworkConfig) -> Vec<OperatorRecord> {
    if let Some(operators) = &config.operators {
        return operators.clone();
    }

    let policy = OperatorPolicy::from_config(config);
    validators
        .iter()
        .filter(|validator| policy.allow_operator(validator.address()))
        .filter_map(OperatorRecord::from_validator)
        .collect()
}

/// Shuffle operators, then move the owner's operator to the front
pub fn sort_operators<R: Rng + ?Sized>(
    operators: &[OperatorRecord],
    owner_address: Option<&str>,
    rng: &mut R,
) -> Vec<OperatorRecord> {
    let mut sorted = operators.to_vec();
    sorted.shuffle(rng);
    if let Some(owner) = owner_address {
        sorted.sort_by_key(|operator| operator.address != owner);
    }
    sorted
}

/// Operator count before validators are loaded
pub fn estimate_operator_count(
    config: &NetworkConfig,
    operator_addresses: Option<&BTreeMap<String, String>>,
) -> usize {
    if let Some(operators) = &config.operators {
        return operators.len();
    }

    let policy = OperatorPolicy::from_config(config);
    operator_addresses.map_or(0, |addresses| {
        addresses
            .keys()
            .filter(|address| policy.allow_operator(address))
            .count()
    })
}
