//! Scripted upstream gateway shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use marketpulse_context::{ContextComposer, ContextConfig, InMemoryCacheStore, ManualClock};
use marketpulse_sources::{
    Candle, CandleInterval, Endpoint, FundamentalsSnapshot, HistoryRange, IndexSnapshot,
    QuoteBatch, QuoteSnapshot, SectorSnapshot, SourceError, SourceGateway,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Monday morning, market open.
pub fn market_open() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 15, 0).unwrap()
}

/// Gateway answering from fixed fixtures, with per-endpoint call counters,
/// injectable failures and an optional delay on every call.
pub struct ScriptedGateway {
    calls: HashMap<Endpoint, AtomicUsize>,
    failures: Mutex<HashMap<Endpoint, SourceError>>,
    delay: Mutex<Option<Duration>>,
    quotes: Mutex<Vec<QuoteSnapshot>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            calls: Endpoint::ALL
                .iter()
                .map(|endpoint| (*endpoint, AtomicUsize::new(0)))
                .collect(),
            failures: Mutex::new(HashMap::new()),
            delay: Mutex::new(None),
            quotes: Mutex::new(vec![
                quote("NIFTY", dec!(22150), dec!(22000)),
                quote("BANKNIFTY", dec!(48300), dec!(48000)),
                quote("SENSEX", dec!(73100), dec!(72600)),
            ]),
        }
    }

    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.calls[&endpoint].load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        Endpoint::ALL.iter().map(|e| self.calls(*e)).sum()
    }

    pub fn fail(&self, endpoint: Endpoint, error: SourceError) {
        self.failures.lock().unwrap().insert(endpoint, error);
    }

    pub fn fail_all(&self) {
        for endpoint in Endpoint::ALL {
            self.fail(endpoint, SourceError::upstream(endpoint.as_str(), "provider outage"));
        }
    }

    pub fn recover(&self, endpoint: Endpoint) {
        self.failures.lock().unwrap().remove(&endpoint);
    }

    pub fn recover_all(&self) {
        self.failures.lock().unwrap().clear();
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn set_last(&self, symbol: &str, last: Decimal) {
        let mut quotes = self.quotes.lock().unwrap();
        if let Some(q) = quotes.iter_mut().find(|q| q.symbol == symbol) {
            q.last = last;
            q.high = q.high.max(last);
            q.low = q.low.min(last);
        }
    }

    async fn enter(&self, endpoint: Endpoint) -> Result<(), SourceError> {
        self.calls[&endpoint].fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let failure = self.failures.lock().unwrap().get(&endpoint).cloned();
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

pub fn quote(symbol: &str, last: Decimal, previous_close: Decimal) -> QuoteSnapshot {
    QuoteSnapshot {
        symbol: symbol.to_string(),
        timestamp: market_open(),
        open: previous_close + dec!(20),
        high: last.max(previous_close) + dec!(60),
        low: last.min(previous_close) - dec!(40),
        last,
        previous_close,
        volume: None,
    }
}

fn index(symbol: &str, name: &str, value: Decimal, change_percent: Decimal) -> IndexSnapshot {
    IndexSnapshot {
        symbol: symbol.to_string(),
        name: name.to_string(),
        value,
        change: (value * change_percent / dec!(100)).round_dp(2),
        change_percent,
        timestamp: market_open(),
    }
}

fn sector(name: &str, day: Decimal, week: Decimal, advancers: u32, decliners: u32) -> SectorSnapshot {
    SectorSnapshot {
        sector: name.to_string(),
        change_percent_1d: day,
        change_percent_1w: week,
        advancers,
        decliners,
        timestamp: market_open(),
    }
}

/// Closes rising by 15 points per bar with a small alternating wobble.
fn candles(count: usize, step_days: i64) -> Vec<Candle> {
    (0..count)
        .map(|i| {
            let wobble = if i % 2 == 0 { dec!(12) } else { dec!(-12) };
            let close = Decimal::from(19_800 + 15 * i as i64) + wobble;
            Candle {
                timestamp: market_open() - ChronoDuration::days(step_days * (count - i) as i64),
                open: close - dec!(8),
                high: close + dec!(45),
                low: close - dec!(45),
                close,
                volume: None,
            }
        })
        .collect()
}

#[async_trait]
impl SourceGateway for ScriptedGateway {
    fn id(&self) -> &'static str {
        "SCRIPTED"
    }

    async fn fetch_global_indices(&self) -> Result<Vec<IndexSnapshot>, SourceError> {
        self.enter(Endpoint::GlobalIndices).await?;
        Ok(vec![
            index("SPX", "S&P 500", dec!(5120), dec!(0.6)),
            index("NDX", "Nasdaq 100", dec!(18100), dec!(0.9)),
            index("FTSE", "FTSE 100", dec!(7700), dec!(-0.2)),
        ])
    }

    async fn fetch_domestic_quotes(&self, symbols: &[String]) -> Result<QuoteBatch, SourceError> {
        self.enter(Endpoint::DomesticQuotes).await?;
        let quotes = self.quotes.lock().unwrap().clone();
        let mut batch = QuoteBatch::new();
        for symbol in symbols {
            let result = quotes
                .iter()
                .find(|q| &q.symbol == symbol)
                .cloned()
                .ok_or_else(|| SourceError::upstream("domestic_quotes", format!("unknown symbol {}", symbol)));
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
        self.enter(Endpoint::HistoricalCandles).await?;
        Ok(match interval {
            CandleInterval::Weekly => candles((range.days / 7) as usize, 7),
            _ => candles(90, 1),
        })
    }

    async fn fetch_sector_performance(&self) -> Result<Vec<SectorSnapshot>, SourceError> {
        self.enter(Endpoint::SectorPerformance).await?;
        Ok(vec![
            sector("IT", dec!(1.2), dec!(2.8), 7, 3),
            sector("BANKING", dec!(0.8), dec!(2.2), 9, 3),
            sector("AUTO", dec!(0.4), dec!(1.5), 9, 6),
            sector("ENERGY", dec!(0.1), dec!(0.3), 5, 5),
            sector("FMCG", dec!(-0.3), dec!(-0.4), 5, 10),
            sector("PHARMA", dec!(-0.5), dec!(-0.9), 4, 9),
        ])
    }

    async fn fetch_fundamentals(&self, symbol: &str) -> Result<FundamentalsSnapshot, SourceError> {
        self.enter(Endpoint::Fundamentals).await?;
        Ok(FundamentalsSnapshot {
            symbol: symbol.to_string(),
            pe_ratio: Some(dec!(22.1)),
            pb_ratio: Some(dec!(3.4)),
            dividend_yield: Some(dec!(1.2)),
            earnings_growth: Some(dec!(11.0)),
            as_of: market_open(),
        })
    }
}

/// A composer over a scripted gateway, a fresh store and a manual clock.
pub struct TestEngine {
    pub gateway: Arc<ScriptedGateway>,
    pub store: Arc<InMemoryCacheStore>,
    pub clock: Arc<ManualClock>,
    pub composer: Arc<ContextComposer>,
}

impl TestEngine {
    pub fn new() -> Self {
        Self::with_config(ContextConfig::default())
    }

    pub fn with_config(config: ContextConfig) -> Self {
        let gateway = Arc::new(ScriptedGateway::new());
        let store = Arc::new(InMemoryCacheStore::new());
        let clock = Arc::new(ManualClock::new(market_open()));
        let upstream: Arc<dyn SourceGateway> = gateway.clone();
        let composer = ContextComposer::new(upstream, config)
            .unwrap()
            .with_store(store.clone())
            .with_clock(clock.clone());
        Self {
            gateway,
            store,
            clock,
            composer: Arc::new(composer),
        }
    }

    pub fn advance(&self, secs: u64) {
        self.clock.advance(Duration::from_secs(secs));
    }
}
