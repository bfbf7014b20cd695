use marketpulse_sources::{Candle, CandleInterval, HistoryRange, SectorSnapshot};
use rust_decimal::Decimal;

use super::{require_any_source, BuildContext};
use crate::constants::{FRAGMENT_SCHEMA_VERSION, SECTOR_RANK_SIZE};
use crate::errors::Result;
use crate::fragments::{DetailedContext, FragmentKind, IndexMove, SectorMove, TechnicalSnapshot};
use crate::indicators::{closes, classify_trend, macd, market_breadth, round2, rsi, sma, Macd};
use crate::provenance::{Provenance, Tagged};

pub(super) async fn build(ctx: &BuildContext<'_>) -> Result<DetailedContext> {
    let index = ctx.scope.index_key();
    let range = HistoryRange::days(ctx.config.daily_lookback_days);
    let (sectors, candles) = futures::join!(
        ctx.sector_performance(),
        ctx.candles(&index, CandleInterval::Daily, range)
    );

    let primary = ctx.sibling(FragmentKind::Primary);
    let from_primary = primary
        .as_ref()
        .and_then(|fragment| fragment.as_primary())
        .and_then(|primary| primary.domestic(&index))
        .filter(|level| !level.value.value.is_zero())
        .map(Tagged::reused_from);
    if from_primary.is_none() {
        require_any_source(FragmentKind::Detailed, &[&sectors, &candles])?;
    }

    let index_level = from_primary.unwrap_or_else(|| match index_from_candles(&index, &candles.value) {
        Some(level) => Tagged::new(level, candles.provenance.weakest(Provenance::Approximated))
            .with_note("derived from the last daily close"),
        None => Tagged::approximated(IndexMove::flat(&index), "no index data available"),
    });

    let closes = closes(&candles.value);
    let technicals = candles.tag(if closes.is_empty() {
        TechnicalSnapshot::neutral()
    } else {
        TechnicalSnapshot {
            rsi_14: rsi(&closes, 14).map(round2),
            macd: macd(&closes, 12, 26, 9).map(|m| Macd {
                line: round2(m.line),
                signal: round2(m.signal),
                histogram: round2(m.histogram),
            }),
            sma_20: sma(&closes, 20).map(round2),
            sma_50: sma(&closes, 50).map(round2),
            trend: classify_trend(&closes, 20, 50),
        }
    });

    let filtered: Vec<SectorSnapshot> = sectors
        .value
        .iter()
        .filter(|s| ctx.scope.includes_sector(&s.sector))
        .cloned()
        .collect();
    let (leaders, laggards) = rank_by_session(&filtered);

    Ok(DetailedContext {
        version: FRAGMENT_SCHEMA_VERSION,
        scope_index: index,
        index_level,
        technicals,
        breadth: sectors.tag(market_breadth(&filtered)),
        sector_leaders: sectors.tag(leaders),
        sector_laggards: sectors.tag(laggards),
    })
}

/// Index level from the last two daily candles.
fn index_from_candles(index: &str, candles: &[Candle]) -> Option<IndexMove> {
    let last = candles.last()?;
    let previous = candles.len().checked_sub(2).and_then(|i| candles.get(i));
    let change = previous.map(|p| last.close - p.close).unwrap_or(Decimal::ZERO);
    let change_percent = match previous {
        Some(p) if !p.close.is_zero() => (change / p.close * Decimal::ONE_HUNDRED).round_dp(2),
        _ => Decimal::ZERO,
    };
    Some(IndexMove {
        value: last.close,
        change,
        change_percent,
        ..IndexMove::flat(index)
    })
}

/// Top and bottom sectors by session change.
fn rank_by_session(sectors: &[SectorSnapshot]) -> (Vec<SectorMove>, Vec<SectorMove>) {
    let mut ranked: Vec<&SectorSnapshot> = sectors.iter().collect();
    ranked.sort_by(|a, b| {
        b.change_percent_1d
            .cmp(&a.change_percent_1d)
            .then_with(|| a.sector.cmp(&b.sector))
    });
    let leaders = ranked
        .iter()
        .take(SECTOR_RANK_SIZE)
        .map(|s| SectorMove::from(*s))
        .collect();
    let laggards = ranked
        .iter()
        .rev()
        .take(SECTOR_RANK_SIZE)
        .map(|s| SectorMove::from(*s))
        .collect();
    (leaders, laggards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::test_support::Harness;
    use crate::fragments::Fragment;
    use crate::indicators::TrendDirection;
    use crate::scope::ContextScope;
    use marketpulse_sources::{Endpoint, SourceError};
    use std::sync::Arc;

    async fn with_primary(harness: &mut Harness) {
        let primary = super::super::primary::build(&harness.context()).await.unwrap();
        harness.resolved.insert(Arc::new(Fragment::Primary(primary)));
    }

    #[tokio::test]
    async fn test_index_level_is_reused_from_primary() {
        let mut harness = Harness::new();
        with_primary(&mut harness).await;

        let detailed = build(&harness.context()).await.unwrap();
        let primary = harness.resolved.get(FragmentKind::Primary).unwrap().as_primary().unwrap().clone();

        assert_eq!(detailed.index_level.provenance, Provenance::Reused);
        assert_eq!(detailed.index_level.value, primary.domestic("NIFTY").unwrap().value);
        assert_eq!(detailed.technicals.provenance, Provenance::Real);
        assert_eq!(detailed.technicals.value.trend, TrendDirection::Uptrend);
        assert!(detailed.technicals.value.rsi_14.is_some());
        assert!(detailed.technicals.value.macd.is_some());
    }

    #[tokio::test]
    async fn test_without_primary_index_level_is_approximated() {
        let harness = Harness::new();
        let detailed = build(&harness.context()).await.unwrap();

        assert_eq!(detailed.index_level.provenance, Provenance::Approximated);
        assert!(!detailed.index_level.value.value.is_zero());
    }

    #[tokio::test]
    async fn test_sector_failure_degrades_sector_fields_only() {
        let mut harness = Harness::new();
        with_primary(&mut harness).await;
        harness.gateway.fail(
            Endpoint::SectorPerformance,
            SourceError::upstream("sector_performance", "HTTP 500"),
        );

        let detailed = build(&harness.context()).await.unwrap();
        assert_eq!(detailed.breadth.provenance, Provenance::Approximated);
        assert_eq!(detailed.sector_leaders.provenance, Provenance::Approximated);
        assert!(detailed.sector_leaders.value.is_empty());
        assert_eq!(detailed.technicals.provenance, Provenance::Real);
        assert_eq!(detailed.index_level.provenance, Provenance::Reused);
    }

    #[tokio::test]
    async fn test_sector_filter() {
        let mut harness = Harness::new();
        harness.scope = ContextScope::index("NIFTY").with_sectors(["it", "pharma"]);

        let detailed = build(&harness.context()).await.unwrap();
        let leaders: Vec<&str> = detailed
            .sector_leaders
            .value
            .iter()
            .map(|m| m.sector.as_str())
            .collect();
        assert_eq!(leaders, vec!["IT", "PHARMA"]);
        assert_eq!(detailed.breadth.value.advancers, 12);
    }
}
