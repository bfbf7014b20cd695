use marketpulse_sources::{CandleInterval, HistoryRange, SectorSnapshot};
use rust_decimal::Decimal;

use super::intraday::session_levels;
use super::{require_any_source, BuildContext, Dependency, Sourced};
use crate::constants::{FRAGMENT_SCHEMA_VERSION, SECTOR_RANK_SIZE};
use crate::errors::Result;
use crate::fragments::{FragmentKind, SectorRotation, SwingContext, SwingRange};
use crate::indicators::{closes, classify_trend, percent_return, pivot_levels, round2, Momentum};
use crate::provenance::Tagged;

/// Sessions covered by the swing range.
const SWING_WINDOW: usize = 20;

pub(super) async fn build(ctx: &BuildContext<'_>) -> Result<SwingContext> {
    let index = ctx.scope.index_key();
    let intraday = ctx.sibling(FragmentKind::Intraday);
    let reusable = intraday.as_ref().and_then(|fragment| fragment.as_intraday());
    let range = HistoryRange::days(ctx.config.daily_lookback_days);

    let (candles, sectors, quotes) = futures::join!(
        ctx.candles(&index, CandleInterval::Daily, range),
        ctx.sector_performance(),
        async {
            match reusable {
                Some(_) => None,
                None => Some(ctx.domestic_quotes(std::slice::from_ref(&index)).await),
            }
        }
    );

    let (pivots, momentum) = match reusable {
        Some(intraday) => (
            Tagged::reused_from(&intraday.pivots),
            Tagged::reused_from(&intraday.momentum),
        ),
        None => {
            let mut dependencies: Vec<&dyn Dependency> = Vec::new();
            dependencies.push(&candles);
            dependencies.push(&sectors);
            if let Some(quotes) = &quotes {
                dependencies.push(quotes);
            }
            require_any_source(FragmentKind::Swing, &dependencies)?;

            match quotes.as_ref().and_then(|q| q.pick(&index)) {
                Some(picked) => session_levels(&picked),
                None => (
                    Tagged::approximated(
                        pivot_levels(Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
                        "no session quote available",
                    ),
                    Tagged::approximated(Momentum::Neutral, "no session quote available"),
                ),
            }
        }
    };

    let closes = closes(&candles.value);
    let window = &candles.value[candles.value.len().saturating_sub(SWING_WINDOW)..];
    let swing_range = if window.is_empty() {
        SwingRange::neutral()
    } else {
        SwingRange {
            high: window.iter().map(|c| c.high).max(),
            low: window.iter().map(|c| c.low).min(),
            return_percent: percent_return(&closes, SWING_WINDOW).map(round2),
            sessions: window.len(),
        }
    };

    Ok(SwingContext {
        version: FRAGMENT_SCHEMA_VERSION,
        scope_index: index,
        pivots,
        momentum,
        trend: candles.tag(classify_trend(&closes, 20, 50)),
        swing_range: candles.tag(swing_range),
        sector_rotation: sector_rotation(ctx, &sectors),
    })
}

/// Weekly rotation over the sectors the scope includes.
pub(super) fn sector_rotation(
    ctx: &BuildContext<'_>,
    sectors: &Sourced<Vec<SectorSnapshot>>,
) -> Tagged<SectorRotation> {
    let filtered = sectors
        .value
        .iter()
        .filter(|s| ctx.scope.includes_sector(&s.sector));
    sectors.tag(SectorRotation::from_sectors(
        filtered,
        &ctx.config.defensive_sectors,
        SECTOR_RANK_SIZE,
    ))
}
