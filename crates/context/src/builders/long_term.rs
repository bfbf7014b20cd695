use marketpulse_sources::{CandleInterval, HistoryRange};

use super::swing::sector_rotation;
use super::{require_any_source, BuildContext, Dependency};
use crate::constants::FRAGMENT_SCHEMA_VERSION;
use crate::errors::Result;
use crate::fragments::{FragmentKind, LongTermContext, SectorRotation, Valuation};
use crate::indicators::{closes, classify_trend};
use crate::provenance::Tagged;

/// 10- and 40-week averages, roughly the 50- and 200-day pair.
const SHORT_WEEKS: usize = 10;
const LONG_WEEKS: usize = 40;

pub(super) async fn build(ctx: &BuildContext<'_>) -> Result<LongTermContext> {
    let index = ctx.scope.index_key();
    let swing = ctx.sibling(FragmentKind::Swing);
    let reused_rotation = swing
        .as_ref()
        .and_then(|fragment| fragment.as_swing())
        .map(|swing| Tagged::reused_from(&swing.sector_rotation));
    let reuse = reused_rotation.is_some();
    let range = HistoryRange::days(ctx.config.weekly_lookback_days);

    let (fundamentals, weekly, sectors) = futures::join!(
        ctx.fundamentals(&index),
        ctx.candles(&index, CandleInterval::Weekly, range),
        async {
            if reuse {
                None
            } else {
                Some(ctx.sector_performance().await)
            }
        }
    );

    let sector_rotation = match (reused_rotation, &sectors) {
        (Some(rotation), _) => rotation,
        (None, sectors) => {
            let mut dependencies: Vec<&dyn Dependency> = Vec::new();
            dependencies.push(&fundamentals);
            dependencies.push(&weekly);
            if let Some(sectors) = sectors {
                dependencies.push(sectors);
            }
            require_any_source(FragmentKind::LongTerm, &dependencies)?;

            match sectors {
                Some(sectors) => sector_rotation(ctx, sectors),
                None => Tagged::approximated(
                    SectorRotation::neutral(),
                    "no sector data available",
                ),
            }
        }
    };

    let closes = closes(&weekly.value);

    Ok(LongTermContext {
        version: FRAGMENT_SCHEMA_VERSION,
        scope_index: index,
        sector_rotation,
        valuation: fundamentals.tag(Valuation::from_fundamentals(
            &fundamentals.value,
            &ctx.config.valuation,
        )),
        long_term_trend: weekly.tag(classify_trend(&closes, SHORT_WEEKS, LONG_WEEKS)),
        macro_cycle: Tagged::approximated(
            ctx.config.macro_outlook.clone(),
            "static macro outlook from configuration",
        ),
    })
}
