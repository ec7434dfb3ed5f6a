/// Default time allowed for the source endpoint to accept a connection (5 seconds)
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;
/// Default shutdown grace period, as a multiple of the batch interval
pub const GRACE_PERIOD_INTERVAL_MULTIPLIER: u32 = 2;
/// Parallelism hint used when the platform cannot report available cores
pub const FALLBACK_PARALLELISM: usize = 4;
