//! In-crate mock gateway and build harness.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use marketpulse_sources::{
    Candle, CandleInterval, Endpoint, FundamentalsSnapshot, HistoryRange, IndexSnapshot,
    QuoteBatch, QuoteSnapshot, SectorSnapshot, SourceError, SourceGateway,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{BuildContext, ResolvedFragments};
use crate::cache::InMemoryCacheStore;
use crate::clock::ManualClock;
use crate::config::ContextConfig;
use crate::coordinator::BuildCoordinator;
use crate::degradation::DegradationPolicy;
use crate::scope::ContextScope;

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 5, 9, 30, 0).unwrap()
}

pub fn quote(symbol: &str, last: Decimal, previous_close: Decimal) -> QuoteSnapshot {
    QuoteSnapshot {
        symbol: symbol.to_string(),
        timestamp: start(),
        open: previous_close,
        high: last.max(previous_close) + dec!(50),
        low: last.min(previous_close) - dec!(50),
        last,
        previous_close,
        volume: None,
    }
}

fn sector(name: &str, day: Decimal, week: Decimal, advancers: u32, decliners: u32) -> SectorSnapshot {
    SectorSnapshot {
        sector: name.to_string(),
        change_percent_1d: day,
        change_percent_1w: week,
        advancers,
        decliners,
        timestamp: start(),
    }
}

/// Steadily rising closes, one bar per interval.
fn rising_candles(count: usize, step_days: i64) -> Vec<Candle> {
    (0..count)
        .map(|i| {
            let close = Decimal::from(20_000 + 20 * i as i64);
            Candle {
                timestamp: start() - ChronoDuration::days(step_days * (count - i) as i64),
                open: close - dec!(10),
                high: close + dec!(40),
                low: close - dec!(40),
                close,
                volume: None,
            }
        })
        .collect()
}

pub struct MockGateway {
    calls: Mutex<HashMap<Endpoint, usize>>,
    failures: Mutex<HashMap<Endpoint, SourceError>>,
    quotes: Mutex<Vec<QuoteSnapshot>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            quotes: Mutex::new(vec![
                quote("NIFTY", dec!(22220), dec!(22000)),
                quote("BANKNIFTY", dec!(48480), dec!(48000)),
                quote("SENSEX", dec!(73000), dec!(72500)),
            ]),
        }
    }

    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.calls.lock().unwrap().get(&endpoint).copied().unwrap_or(0)
    }

    pub fn fail(&self, endpoint: Endpoint, error: SourceError) {
        self.failures.lock().unwrap().insert(endpoint, error);
    }

    pub fn recover(&self, endpoint: Endpoint) {
        self.failures.lock().unwrap().remove(&endpoint);
    }

    pub fn set_quotes(&self, quotes: Vec<QuoteSnapshot>) {
        *self.quotes.lock().unwrap() = quotes;
    }

    fn enter(&self, endpoint: Endpoint) -> Result<(), SourceError> {
        *self.calls.lock().unwrap().entry(endpoint).or_insert(0) += 1;
        match self.failures.lock().unwrap().get(&endpoint) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SourceGateway for MockGateway {
    fn id(&self) -> &'static str {
        "MOCK"
    }

    async fn fetch_global_indices(&self) -> Result<Vec<IndexSnapshot>, SourceError> {
        self.enter(Endpoint::GlobalIndices)?;
        Ok(vec![
            IndexSnapshot {
                symbol: "SPX".to_string(),
                name: "S&P 500".to_string(),
                value: dec!(5000),
                change: dec!(25),
                change_percent: dec!(0.5),
                timestamp: start(),
            },
            IndexSnapshot {
                symbol: "NIKKEI".to_string(),
                name: "Nikkei 225".to_string(),
                value: dec!(38000),
                change: dec!(-114),
                change_percent: dec!(-0.3),
                timestamp: start(),
            },
        ])
    }

    async fn fetch_domestic_quotes(&self, symbols: &[String]) -> Result<QuoteBatch, SourceError> {
        self.enter(Endpoint::DomesticQuotes)?;
        let quotes = self.quotes.lock().unwrap().clone();
        let mut batch = QuoteBatch::new();
        for symbol in symbols {
            let result = quotes
                .iter()
                .find(|q| &q.symbol == symbol)
                .cloned()
                .ok_or_else(|| SourceError::upstream("domestic_quotes", format!("no quote for {}", symbol)));
            batch.insert(symbol.clone(), result);
        }
        Ok(batch)
    }

    async fn fetch_historical_candles(
        &self,
        _symbol: &str,
        interval: CandleInterval,
        range: HistoryRange,
    ) -> Result<Vec<Candle>, SourceError> {
        self.enter(Endpoint::HistoricalCandles)?;
        Ok(match interval {
            CandleInterval::Weekly => rising_candles(range.days as usize / 7, 7),
            _ => rising_candles(80, 1),
        })
    }

    async fn fetch_sector_performance(&self) -> Result<Vec<SectorSnapshot>, SourceError> {
        self.enter(Endpoint::SectorPerformance)?;
        Ok(vec![
            sector("IT", dec!(1.4), dec!(3.2), 8, 2),
            sector("BANKING", dec!(0.9), dec!(1.8), 9, 3),
            sector("AUTO", dec!(0.5), dec!(2.1), 10, 5),
            sector("FMCG", dec!(-0.2), dec!(-0.5), 6, 9),
            sector("PHARMA", dec!(-0.6), dec!(-1.1), 4, 8),
            sector("METAL", dec!(-1.1), dec!(0.4), 3, 9),
        ])
    }

    async fn fetch_fundamentals(&self, symbol: &str) -> Result<FundamentalsSnapshot, SourceError> {
        self.enter(Endpoint::Fundamentals)?;
        Ok(FundamentalsSnapshot {
            symbol: symbol.to_string(),
            pe_ratio: Some(dec!(21.4)),
            pb_ratio: Some(dec!(3.6)),
            dividend_yield: Some(dec!(1.3)),
            earnings_growth: Some(dec!(12.5)),
            as_of: start(),
        })
    }
}

/// Owns everything a [`BuildContext`] borrows.
pub struct Harness {
    pub gateway: Arc<MockGateway>,
    pub store: Arc<InMemoryCacheStore>,
    pub clock: Arc<ManualClock>,
    pub coordinator: BuildCoordinator,
    pub policy: DegradationPolicy,
    pub config: ContextConfig,
    pub scope: ContextScope,
    pub resolved: ResolvedFragments,
}

impl Harness {
    pub fn new() -> Self {
        let gateway = Arc::new(MockGateway::new());
        let store = Arc::new(InMemoryCacheStore::new());
        let clock = Arc::new(ManualClock::new(start()));
        let config = ContextConfig::default();
        Self {
            coordinator: BuildCoordinator::new(store.clone(), clock.clone()),
            policy: DegradationPolicy::new(config.rate_limit_backoff()),
            gateway,
            store,
            clock,
            config,
            scope: ContextScope::index("NIFTY"),
            resolved: ResolvedFragments::new(),
        }
    }

    pub fn context(&self) -> BuildContext<'_> {
        BuildContext {
            scope: &self.scope,
            gateway: self.gateway.as_ref(),
            store: self.store.as_ref(),
            coordinator: &self.coordinator,
            policy: &self.policy,
            clock: self.clock.as_ref(),
            config: &self.config,
            resolved: &self.resolved,
        }
    }
}
