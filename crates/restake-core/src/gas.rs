//! # Gas Price Engine
//!
//! Derives the low/average/high gas price schedule for a resolved chain.
//!
//! All arithmetic uses [`Decimal`] so that prices for chains with anywhere
//! between 0 and 18 decimals come out exact.
//!
//! ## Derivation
//!
//! | Input | low | average | high |
//! |-------|-----|---------|------|
//! | explicit price `p` | `p` | fee average, else `p` | fee high, else `average × 2` |
//! | no explicit price | fee minimum, else `default × 0.5` | fee average, else `default` | fee high, else `average × 2` |
//!
//! `default` is `0.000000025 × 10^decimals` rounded to 14 significant digits,
//! raised to the fee minimum when that is larger. A fee hint that would break
//! `low <= average <= high` is ignored and the computed value kept. An explicit
//! step override replaces the computed tiers entirely.

use crate::chain::{ChainProfile, MAX_DECIMALS};
use crate::config::NetworkConfig;
use crate::error::{ConfigError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Significant digits kept when computing the default gas price
pub const GAS_PRICE_SIGNIFICANT_DIGITS: u32 = 14;

/// Base default gas price per unit of display token, 0.000000025
const BASE_GAS_PRICE: Decimal = Decimal::from_parts(25, 0, 0, false, 9);

/// A gas price in the fee-payment wire format, `<decimal><denom>`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GasPrice {
    pub amount: Decimal,
    pub denom: String,
}

impl GasPrice {
    pub fn new(amount: Decimal, denom: impl Into<String>) -> Self {
        Self {
            amount: amount.normalize(),
            denom: denom.into(),
        }
    }
}

impl FromStr for GasPrice {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let split = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| ConfigError::InvalidGasPrice(format!("missing denom in '{}'", s)))?;
        let (amount, denom) = s.split_at(split);

        if amount.is_empty() {
            return Err(ConfigError::InvalidGasPrice(format!(
                "missing amount in '{}'",
                s
            )));
        }
        if !is_valid_denom(denom) {
            return Err(ConfigError::InvalidGasPrice(format!(
                "invalid denom '{}'",
                denom
            )));
        }

        let amount = Decimal::from_str(amount)
            .map_err(|e| ConfigError::InvalidGasPrice(format!("'{}': {}", s, e)))?;

        Ok(Self::new(amount, denom))
    }
}

impl fmt::Display for GasPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount.normalize(), self.denom)
    }
}

/// Denoms start with a letter and are 3 to 128 characters of
/// alphanumerics or `/:._-`
fn is_valid_denom(denom: &str) -> bool {
    let mut chars = denom.chars();
    let starts_with_letter = chars.next().map_or(false, |c| c.is_ascii_alphabetic());
    starts_with_letter
        && (3..=128).contains(&denom.len())
        && chars.all(|c| c.is_ascii_alphanumeric() || "/:._-".contains(c))
}

/// Low/average/high gas prices, in chain denom units
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasPriceStep {
    pub low: Decimal,
    pub average: Decimal,
    pub high: Decimal,
}

impl GasPriceStep {
    /// Non-negative and `low <= average <= high`
    pub fn is_ordered(&self) -> bool {
        !self.low.is_sign_negative() && self.low <= self.average && self.average <= self.high
    }
}

/// Schedule tier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GasTier {
    Low,
    Average,
    High,
}

/// Fully derived gas price schedule
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GasPriceSchedule {
    pub low: Decimal,
    pub average: Decimal,
    pub high: Decimal,

    /// Price used when no tier is chosen
    pub base: Decimal,

    /// Always the chain's own denom
    pub denom: String,

    /// Multiplier applied to estimated gas consumption
    pub gas_modifier: f64,
}

impl GasPriceSchedule {
    /// Base price in wire format
    pub fn gas_price(&self) -> GasPrice {
        GasPrice::new(self.base, self.denom.clone())
    }

    /// Price of a tier in wire format
    pub fn tier(&self, tier: GasTier) -> GasPrice {
        let amount = match tier {
            GasTier::Low => self.low,
            GasTier::Average => self.average,
            GasTier::High => self.high,
        };
        GasPrice::new(amount, self.denom.clone())
    }

    pub fn step(&self) -> GasPriceStep {
        GasPriceStep {
            low: self.low,
            average: self.average,
            high: self.high,
        }
    }

    /// Gas limit for an estimated consumption
    pub fn gas_limit(&self, estimated_gas: u64) -> u64 {
        (estimated_gas as f64 * self.gas_modifier).ceil() as u64
    }
}

/// Explicit gas settings taken from a network config
#[derive(Clone, Copy, Debug, Default)]
pub struct GasOverrides<'a> {
    pub gas_price: Option<&'a str>,
    pub gas_price_step: Option<&'a GasPriceStep>,
    pub gas_modifier: Option<f64>,
}

impl<'a> GasOverrides<'a> {
    pub fn from_config(config: &'a NetworkConfig) -> Self {
        Self {
            gas_price: config.gas_price.as_deref(),
            gas_price_step: config.gas_price_step.as_ref(),
            gas_modifier: Some(config.gas_modifier()),
        }
    }
}

/// `0.000000025 × 10^decimals`, rounded to 14 significant digits
pub fn default_gas_price(decimals: u32) -> Result<Decimal> {
    if decimals > MAX_DECIMALS {
        return Err(ConfigError::UnsupportedDecimals {
            decimals,
            max: MAX_DECIMALS,
        });
    }
    let value = BASE_GAS_PRICE * Decimal::from(10u64.pow(decimals));
    let rounded = value
        .round_sf(GAS_PRICE_SIGNIFICANT_DIGITS)
        .unwrap_or(value);
    Ok(rounded.normalize())
}

/// Keep a fee hint only if it is non-negative, at least `floor` and small
/// enough to double into a high tier
fn accept_hint(hint: Option<Decimal>, floor: Decimal, tier: &str) -> Option<Decimal> {
    let hint = non_negative(hint)?;
    if hint < floor || doubled(hint).is_none() {
        tracing::warn!(
            tier,
            hint = %hint,
            floor = %floor,
            "Ignoring fee hint that breaks gas price ordering"
        );
        return None;
    }
    Some(hint)
}

fn non_negative(hint: Option<Decimal>) -> Option<Decimal> {
    hint.filter(|value| !value.is_sign_negative())
}

/// Fallback high tier, `None` on overflow
fn doubled(value: Decimal) -> Option<Decimal> {
    value.checked_mul(Decimal::TWO)
}

/// High hint if it keeps the ordering, else twice the average
fn high_tier(hint: Option<Decimal>, average: Decimal) -> Result<Decimal> {
    if let Some(hint) = non_negative(hint) {
        if hint >= average {
            return Ok(hint);
        }
        tracing::warn!(
            tier = "high",
            hint = %hint,
            floor = %average,
            "Ignoring fee hint that breaks gas price ordering"
        );
    }
    doubled(average).ok_or_else(|| {
        ConfigError::InvalidGasPrice(format!("{} is too large to derive a high gas price", average))
    })
}

fn checked_step(step: &GasPriceStep) -> Result<GasPriceStep> {
    if !step.is_ordered() {
        return Err(ConfigError::InvalidGasPriceStep(format!(
            "expected 0 <= low <= average <= high, got {} / {} / {}",
            step.low, step.average, step.high
        )));
    }
    Ok(*step)
}

/// Derive the gas price schedule for a chain.
///
/// # Errors
///
/// Fails with a [`ConfigError`] when the explicit gas price is malformed,
/// names another denom or is too large to derive a high tier from, or when
/// an explicit step is out of order.
pub fn derive_schedule(
    profile: &ChainProfile,
    overrides: &GasOverrides<'_>,
) -> Result<GasPriceSchedule> {
    let fee = profile.fee_token();
    if fee.is_none() {
        tracing::debug!(
            network = %profile.name,
            denom = %profile.denom,
            "No fee token for chain denom, using computed default"
        );
    }
    let fee_average = fee.and_then(|token| token.average_gas_price);
    let fee_high = fee.and_then(|token| token.high_gas_price);

    let (base, computed) = match overrides.gas_price {
        Some(raw) => {
            let price: GasPrice = raw.parse()?;
            if price.denom != profile.denom {
                return Err(ConfigError::GasPriceDenomMismatch {
                    expected: profile.denom.clone(),
                    found: price.denom,
                });
            }
            let low = price.amount;
            let average = accept_hint(fee_average, low, "average").unwrap_or(low);
            let high = high_tier(fee_high, average)?;
            (price.amount, GasPriceStep { low, average, high })
        }
        None => {
            let minimum = non_negative(fee.and_then(|token| token.low_gas_price))
                .or_else(|| non_negative(fee.and_then(|token| token.fixed_min_gas_price)))
                .and_then(|minimum| accept_hint(Some(minimum), Decimal::ZERO, "low"));
            let mut default = default_gas_price(profile.decimals)?;
            if let Some(minimum) = minimum {
                if minimum > default {
                    default = minimum;
                }
            }
            let low = minimum.unwrap_or(default / Decimal::TWO);
            let average = accept_hint(fee_average, low, "average").unwrap_or(default);
            let high = high_tier(fee_high, average)?;
            (average, GasPriceStep { low, average, high })
        }
    };

    let step = match overrides.gas_price_step {
        Some(step) => checked_step(step)?,
        None => computed,
    };

    let schedule = GasPriceSchedule {
        low: step.low.normalize(),
        average: step.average.normalize(),
        high: step.high.normalize(),
        base: base.normalize(),
        denom: profile.denom.clone(),
        gas_modifier: overrides
            .gas_modifier
            .filter(|modifier| *modifier > 0.0)
            .unwrap_or(crate::config::DEFAULT_GAS_MODIFIER),
    };

    tracing::debug!(
        network = %profile.name,
        low = %schedule.low,
        average = %schedule.average,
        high = %schedule.high,
        "Derived gas price schedule"
    );

    Ok(schedule)
}
