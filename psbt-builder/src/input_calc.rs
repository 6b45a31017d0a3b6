//! Byte model used by the fee estimator.
//!
//! The model does not look at the real script types being spent or paid to. Every input
//! is priced as a common single-signature witness input and every output as a common
//! small witness output, which keeps the estimate deterministic and network agnostic.

// Version (4) + locktime (4) + input count (1) + output count (1)
pub const TX_OVERHEAD_SIZE: usize = 10;

// Outpoint, scriptSig length, scriptSig and sequence of one input
pub const INPUT_FRAMING_SIZE: usize = 148;

// Signature + public key pushed in the witness of one input
pub const INPUT_WITNESS_SIZE: usize = 107;

/// Everything one input contributes to the byte count.
pub const INPUT_SIZE: usize = INPUT_FRAMING_SIZE + INPUT_WITNESS_SIZE; // 148 + 107 = 255 bytes

// Value (8) + script length (1) + ~25 bytes of script
pub const OUTPUT_SIZE: usize = 34;

/// Byte count before the conversion to virtual bytes.
pub const fn estimated_weight(input_count: usize, output_count: usize) -> usize {
    TX_OVERHEAD_SIZE + input_count * INPUT_SIZE + output_count * OUTPUT_SIZE
}

/// Virtual size of a transaction with the given shape, rounded up.
pub const fn estimated_vsize(input_count: usize, output_count: usize) -> usize {
    (estimated_weight(input_count, output_count) + 3) / 4
}
