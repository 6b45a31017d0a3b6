/// Outputs at or below this value are not worth creating; remainders this small are
/// absorbed into the fee instead of becoming change.
pub const DUST_LIMIT: u64 = 546;

/// Lowest fee rate (sat/vB) the console accepts.
pub const MIN_FEE_RATE: f64 = 0.01;

/// Highest fee rate (sat/vB) the console accepts. Keeps every fee the byte model can
/// produce far inside `u64`.
pub const MAX_FEE_RATE: f64 = 100_000.0;

/// Fee rate used when the caller does not pick one.
pub const DEFAULT_FEE_RATE: f64 = 1.0;
