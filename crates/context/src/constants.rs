//! Engine defaults.

/// Default fragment TTLs, in seconds.
pub const PRIMARY_TTL_SECS: u64 = 60;
pub const DETAILED_TTL_SECS: u64 = 300;
pub const INTRADAY_TTL_SECS: u64 = 30;
pub const SWING_TTL_SECS: u64 = 300;
pub const LONG_TERM_TTL_SECS: u64 = 900;

/// Default raw dataset TTLs, in seconds.
pub const GLOBAL_INDICES_TTL_SECS: u64 = 30;
pub const DOMESTIC_QUOTES_TTL_SECS: u64 = 30;
pub const HISTORICAL_CANDLES_TTL_SECS: u64 = 300;
pub const SECTOR_PERFORMANCE_TTL_SECS: u64 = 900;
pub const FUNDAMENTALS_TTL_SECS: u64 = 3600;

/// Default upper bound on a single upstream call.
pub const UPSTREAM_TIMEOUT_MS: u64 = 5_000;

/// Minimum time a rate-limited slot waits before calling upstream again.
pub const RATE_LIMIT_BACKOFF_SECS: u64 = 60;

/// Daily candles fetched for technicals and swing trend (calendar days).
/// 120 calendar days leave roughly 80 sessions, enough for SMA-50 and MACD(12, 26, 9).
pub const DAILY_LOOKBACK_DAYS: u32 = 120;

/// Weekly candles fetched for the long-term trend (calendar days).
pub const WEEKLY_LOOKBACK_DAYS: u32 = 730;

/// Number of sectors reported as leaders or laggards.
pub const SECTOR_RANK_SIZE: usize = 3;

/// Fragment payload schema version.
pub const FRAGMENT_SCHEMA_VERSION: u32 = 1;
