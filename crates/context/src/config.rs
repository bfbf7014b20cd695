//! Engine configuration.
//!
//! Defaults cover every setting. Hosts can deserialize a [`ContextConfig`]
//! from their own configuration file, or overlay `MP_*` environment
//! variables with [`ContextConfig::from_env`].

use std::time::Duration;

use marketpulse_sources::{
    CircuitBreakerConfig, Endpoint, GatewayGuardConfig, RateLimitConfig,
};
use serde::{Deserialize, Serialize};

use crate::cache::EntryKind;
use crate::constants::*;
use crate::errors::{ContextError, Result};
use crate::fragments::FragmentKind;

/// Per-entry-kind durations in seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KindSeconds {
    pub primary: u64,
    pub detailed: u64,
    pub intraday: u64,
    pub swing: u64,
    pub long_term: u64,
    pub global_indices: u64,
    pub domestic_quotes: u64,
    pub historical_candles: u64,
    pub sector_performance: u64,
    pub fundamentals: u64,
}

impl KindSeconds {
    pub fn default_ttls() -> Self {
        Self {
            primary: PRIMARY_TTL_SECS,
            detailed: DETAILED_TTL_SECS,
            intraday: INTRADAY_TTL_SECS,
            swing: SWING_TTL_SECS,
            long_term: LONG_TERM_TTL_SECS,
            global_indices: GLOBAL_INDICES_TTL_SECS,
            domestic_quotes: DOMESTIC_QUOTES_TTL_SECS,
            historical_candles: HISTORICAL_CANDLES_TTL_SECS,
            sector_performance: SECTOR_PERFORMANCE_TTL_SECS,
            fundamentals: FUNDAMENTALS_TTL_SECS,
        }
    }

    /// Time-bucket widths default to each kind's TTL.
    pub fn default_buckets() -> Self {
        Self::default_ttls()
    }

    pub fn get(&self, kind: EntryKind) -> u64 {
        match kind {
            EntryKind::Fragment(FragmentKind::Primary) => self.primary,
            EntryKind::Fragment(FragmentKind::Detailed) => self.detailed,
            EntryKind::Fragment(FragmentKind::Intraday) => self.intraday,
            EntryKind::Fragment(FragmentKind::Swing) => self.swing,
            EntryKind::Fragment(FragmentKind::LongTerm) => self.long_term,
            EntryKind::Source(Endpoint::GlobalIndices) => self.global_indices,
            EntryKind::Source(Endpoint::DomesticQuotes) => self.domestic_quotes,
            EntryKind::Source(Endpoint::HistoricalCandles) => self.historical_candles,
            EntryKind::Source(Endpoint::SectorPerformance) => self.sector_performance,
            EntryKind::Source(Endpoint::Fundamentals) => self.fundamentals,
        }
    }

    fn set(&mut self, kind: EntryKind, secs: u64) {
        let slot = match kind {
            EntryKind::Fragment(FragmentKind::Primary) => &mut self.primary,
            EntryKind::Fragment(FragmentKind::Detailed) => &mut self.detailed,
            EntryKind::Fragment(FragmentKind::Intraday) => &mut self.intraday,
            EntryKind::Fragment(FragmentKind::Swing) => &mut self.swing,
            EntryKind::Fragment(FragmentKind::LongTerm) => &mut self.long_term,
            EntryKind::Source(Endpoint::GlobalIndices) => &mut self.global_indices,
            EntryKind::Source(Endpoint::DomesticQuotes) => &mut self.domestic_quotes,
            EntryKind::Source(Endpoint::HistoricalCandles) => &mut self.historical_candles,
            EntryKind::Source(Endpoint::SectorPerformance) => &mut self.sector_performance,
            EntryKind::Source(Endpoint::Fundamentals) => &mut self.fundamentals,
        };
        *slot = secs;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CyclePhase {
    Recovery,
    Expansion,
    LateExpansion,
    Contraction,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateTrend {
    Rising,
    Stable,
    Falling,
}

/// Macro-cycle view maintained by hand rather than derived from live data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacroOutlook {
    pub cycle_phase: CyclePhase,
    pub interest_rate_trend: RateTrend,
    pub inflation_trend: RateTrend,
    pub summary: String,
}

impl Default for MacroOutlook {
    fn default() -> Self {
        Self {
            cycle_phase: CyclePhase::Expansion,
            interest_rate_trend: RateTrend::Stable,
            inflation_trend: RateTrend::Falling,
            summary: "Mid-cycle expansion with easing inflation".to_string(),
        }
    }
}

/// P/E bands used to classify valuation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationBands {
    pub undervalued_below_pe: f64,
    pub overvalued_above_pe: f64,
}

impl Default for ValuationBands {
    fn default() -> Self {
        Self {
            undervalued_below_pe: 18.0,
            overvalued_above_pe: 24.0,
        }
    }
}

/// Protection applied in front of the upstream gateway.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewaySettings {
    pub requests_per_minute: u32,
    pub burst_capacity: f64,
    pub failure_threshold: u32,
    pub recovery_timeout_secs: u64,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            requests_per_minute: 120,
            burst_capacity: 20.0,
            failure_threshold: 5,
            recovery_timeout_secs: 30,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContextConfig {
    /// Freshness window per entry kind.
    pub ttl_secs: KindSeconds,
    /// Time-bucket width per entry kind.
    pub bucket_secs: KindSeconds,
    pub upstream_timeout_ms: u64,
    pub rate_limit_backoff_secs: u64,
    /// Domestic benchmarks reported by the primary fragment next to the scope index.
    pub benchmark_indices: Vec<String>,
    /// Sectors considered defensive when reading sector rotation.
    pub defensive_sectors: Vec<String>,
    pub daily_lookback_days: u32,
    pub weekly_lookback_days: u32,
    pub valuation: ValuationBands,
    pub macro_outlook: MacroOutlook,
    pub gateway: GatewaySettings,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            ttl_secs: KindSeconds::default_ttls(),
            bucket_secs: KindSeconds::default_buckets(),
            upstream_timeout_ms: UPSTREAM_TIMEOUT_MS,
            rate_limit_backoff_secs: RATE_LIMIT_BACKOFF_SECS,
            benchmark_indices: vec![
                "NIFTY".to_string(),
                "BANKNIFTY".to_string(),
                "SENSEX".to_string(),
            ],
            defensive_sectors: vec![
                "FMCG".to_string(),
                "PHARMA".to_string(),
                "HEALTHCARE".to_string(),
                "UTILITIES".to_string(),
            ],
            daily_lookback_days: DAILY_LOOKBACK_DAYS,
            weekly_lookback_days: WEEKLY_LOOKBACK_DAYS,
            valuation: ValuationBands::default(),
            macro_outlook: MacroOutlook::default(),
            gateway: GatewaySettings::default(),
        }
    }
}

impl ContextConfig {
    /// Defaults overlaid with `MP_*` environment variables (and a `.env` file if present).
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut config = Self::default();

        for kind in EntryKind::all() {
            let name = format!("MP_TTL_{}_SECS", kind.env_name());
            if let Some(secs) = env_parse::<u64>(&name) {
                config.ttl_secs.set(kind, secs);
            }
            let name = format!("MP_BUCKET_{}_SECS", kind.env_name());
            if let Some(secs) = env_parse::<u64>(&name) {
                config.bucket_secs.set(kind, secs);
            }
        }
        if let Some(ms) = env_parse("MP_UPSTREAM_TIMEOUT_MS") {
            config.upstream_timeout_ms = ms;
        }
        if let Some(secs) = env_parse("MP_RATE_LIMIT_BACKOFF_SECS") {
            config.rate_limit_backoff_secs = secs;
        }
        if let Some(list) = env_list("MP_BENCHMARK_INDICES") {
            config.benchmark_indices = list;
        }
        if let Some(list) = env_list("MP_DEFENSIVE_SECTORS") {
            config.defensive_sectors = list;
        }
        if let Some(rpm) = env_parse("MP_GATEWAY_REQUESTS_PER_MINUTE") {
            config.gateway.requests_per_minute = rpm;
        }
        if let Some(threshold) = env_parse("MP_GATEWAY_FAILURE_THRESHOLD") {
            config.gateway.failure_threshold = threshold;
        }
        config
    }

    /// Reject settings that would break freshness or bucketing.
    pub fn validate(&self) -> Result<()> {
        for kind in EntryKind::all() {
            if self.ttl_secs.get(kind) == 0 {
                return Err(ContextError::InvalidConfig(format!("ttl for {} is zero", kind)));
            }
            if self.bucket_secs.get(kind) == 0 {
                return Err(ContextError::InvalidConfig(format!(
                    "bucket width for {} is zero",
                    kind
                )));
            }
        }
        if self.upstream_timeout_ms == 0 {
            return Err(ContextError::InvalidConfig(
                "upstream timeout is zero".to_string(),
            ));
        }
        if self.valuation.undervalued_below_pe >= self.valuation.overvalued_above_pe {
            return Err(ContextError::InvalidConfig(
                "valuation bands overlap".to_string(),
            ));
        }
        Ok(())
    }

    pub fn ttl(&self, kind: EntryKind) -> Duration {
        Duration::from_secs(self.ttl_secs.get(kind))
    }

    pub fn bucket_width(&self, kind: EntryKind) -> Duration {
        Duration::from_secs(self.bucket_secs.get(kind))
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }

    pub fn rate_limit_backoff(&self) -> Duration {
        Duration::from_secs(self.rate_limit_backoff_secs)
    }

    pub fn gateway_guard(&self) -> GatewayGuardConfig {
        GatewayGuardConfig {
            call_timeout: self.upstream_timeout(),
            rate_limit: RateLimitConfig {
                requests_per_minute: self.gateway.requests_per_minute,
                burst_capacity: self.gateway.burst_capacity,
            },
            circuit_breaker: CircuitBreakerConfig {
                failure_threshold: self.gateway.failure_threshold,
                recovery_timeout: Duration::from_secs(self.gateway.recovery_timeout_secs),
                ..Default::default()
            },
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn env_list(name: &str) -> Option<Vec<String>> {
    let list: Vec<String> = std::env::var(name)
        .ok()?
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    (!list.is_empty()).then_some(list)
}
