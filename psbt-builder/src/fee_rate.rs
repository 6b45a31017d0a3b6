use std::fmt;

use bitcoin::Amount;

use crate::{
    constants::{DEFAULT_FEE_RATE, MAX_FEE_RATE, MIN_FEE_RATE},
    error::FeeRateError,
};

/// A fee rate expressed in satoshis per virtual byte.
///
/// Fractional rates are allowed (e.g. `0.6` sat/vB). Non-finite values and values outside
/// [`MIN_FEE_RATE`]..=[`MAX_FEE_RATE`] are rejected when converting from `f64`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct FeeRate(f64);

impl FeeRate {
    pub fn sat_per_vbyte(&self) -> f64 {
        self.0
    }

    /// Fee for `vsize` virtual bytes, rounded to the nearest satoshi.
    pub fn fee(&self, vsize: usize) -> Amount {
        Amount::from_sat((vsize as f64 * self.0).round() as u64)
    }
}

impl Default for FeeRate {
    fn default() -> Self {
        FeeRate(DEFAULT_FEE_RATE)
    }
}

impl TryFrom<f64> for FeeRate {
    type Error = FeeRateError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() {
            return Err(FeeRateError::NotFinite);
        }

        if value < MIN_FEE_RATE {
            return Err(FeeRateError::TooLow(value));
        }

        if value > MAX_FEE_RATE {
            return Err(FeeRateError::TooHigh(value));
        }

        Ok(FeeRate(value))
    }
}

impl fmt::Display for FeeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sat/vB", self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for FeeRate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = <f64 as serde::Deserialize>::deserialize(deserializer)?;
        FeeRate::try_from(value).map_err(serde::de::Error::custom)
    }
}
