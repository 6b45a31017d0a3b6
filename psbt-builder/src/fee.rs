use crate::{
    error::PsbtBuildError,
    fee_rate::FeeRate,
    input_calc::estimated_vsize,
};

/// Estimated network fee, in satoshis, for a transaction spending `input_count` inputs
/// into `output_count` outputs at `fee_rate`.
///
/// The estimate comes from the fixed byte model in [`crate::input_calc`]; it never looks
/// at the actual scripts, so the same shape always costs the same on every network.
pub fn estimate_fee(input_count: usize, output_count: usize, fee_rate: &FeeRate) -> u64 {
    fee_rate
        .fee(estimated_vsize(input_count, output_count))
        .to_sat()
}

/// Value left over once outputs are paid: `total_input - total_output`.
///
/// Fails with the exact shortfall when the outputs plus `fee` cannot be covered.
pub(crate) fn remaining_after_outputs(
    total_input: u64,
    total_output: u64,
    fee: u64,
) -> Result<u64, PsbtBuildError> {
    let required = total_output
        .checked_add(fee)
        .ok_or(PsbtBuildError::AmountOverflow)?;

    if total_input < required {
        return Err(PsbtBuildError::InsufficientFunds {
            shortfall: required - total_input,
        });
    }

    Ok(total_input - total_output)
}

/// Outcome of the second fee pass once a change output has been added.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ChangeSettlement {
    /// Keep the change output with this value; `fee` is the re-estimated fee.
    Keep { fee: u64, change: u64 },
    /// The re-estimated fee leaves nothing for change; drop the output and give the
    /// whole remainder to the fee.
    Drop { fee: u64 },
}

/// Second fee pass: re-estimate with the change output counted and take the extra cost
/// out of the change.
///
/// This runs exactly once. A change value that ends up at or below the dust limit after
/// the re-estimate is kept as is; only a change that cannot pay for itself is dropped.
pub(crate) fn settle_change(
    remaining: u64,
    input_count: usize,
    output_count_with_change: usize,
    fee_rate: &FeeRate,
) -> ChangeSettlement {
    let final_fee = estimate_fee(input_count, output_count_with_change, fee_rate);

    match remaining.checked_sub(final_fee) {
        Some(change) if change > 0 => ChangeSettlement::Keep {
            fee: final_fee,
            change,
        },
        _ => ChangeSettlement::Drop { fee: remaining },
    }
}
