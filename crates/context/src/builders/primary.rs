use log::debug;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;

use super::{require_any_source, BuildContext};
use crate::constants::FRAGMENT_SCHEMA_VERSION;
use crate::errors::Result;
use crate::fragments::{FragmentKind, IndexMove, MarketSentiment, PrimaryContext, TradingStyle};
use crate::provenance::{Provenance, Tagged};

const GLOBAL_WEIGHT: f64 = 0.4;
const DOMESTIC_WEIGHT: f64 = 0.6;
/// Score points per percent of average index change.
const POINTS_PER_PERCENT: f64 = 20.0;
/// Domestic move (in percent) wide enough to favor intraday trading.
const WIDE_SESSION_PERCENT: f64 = 1.0;

/// Scope index first, then the configured benchmarks, without duplicates.
pub(crate) fn domestic_symbols(ctx: &BuildContext<'_>) -> Vec<String> {
    let mut symbols = vec![ctx.scope.index_key()];
    for benchmark in &ctx.config.benchmark_indices {
        let benchmark = benchmark.trim().to_uppercase();
        if !benchmark.is_empty() && !symbols.contains(&benchmark) {
            symbols.push(benchmark);
        }
    }
    symbols
}

pub(super) async fn build(ctx: &BuildContext<'_>) -> Result<PrimaryContext> {
    let symbols = domestic_symbols(ctx);
    let (global, domestic) = futures::join!(ctx.global_indices(), ctx.domestic_quotes(&symbols));
    require_any_source(FragmentKind::Primary, &[&global, &domestic])?;

    let global_indices = global.tag(global.value.iter().map(IndexMove::from).collect::<Vec<_>>());

    let domestic_indices: Vec<Tagged<IndexMove>> = symbols
        .iter()
        .map(|symbol| match domestic.pick(symbol) {
            Some(picked) => picked.tag(IndexMove::from_quote(&picked.quote)),
            None => Tagged::approximated(IndexMove::flat(symbol), format!("no quote for {}", symbol)),
        })
        .collect();

    let global_changes: Vec<Decimal> = global_indices.value.iter().map(|m| m.change_percent).collect();
    let domestic_changes: Vec<Decimal> = domestic_indices
        .iter()
        .filter(|m| m.provenance != Provenance::Approximated)
        .map(|m| m.value.change_percent)
        .collect();
    let domestic_average = average(&domestic_changes);
    let score = market_score(average(&global_changes), domestic_average);

    let provenance = Provenance::weakest_of(
        std::iter::once(global_indices.provenance).chain(domestic_indices.iter().map(|m| m.provenance)),
    );
    let note = (provenance != Provenance::Real)
        .then(|| "derived from partially degraded index data".to_string());
    let sentiment = MarketSentiment::from_score(score);
    let styles = favorable_styles(sentiment, domestic_average.unwrap_or(0.0));

    debug!(
        "Primary context for '{}': score {:.1}, {:?}",
        ctx.scope.index_key(),
        score,
        sentiment
    );

    Ok(PrimaryContext {
        version: FRAGMENT_SCHEMA_VERSION,
        scope_index: ctx.scope.index_key(),
        global_indices,
        domestic_indices,
        market_score: Tagged::new(score, provenance).with_optional_note(note.clone()),
        sentiment: Tagged::new(sentiment, provenance).with_optional_note(note.clone()),
        favorable_styles: Tagged::new(styles, provenance).with_optional_note(note),
    })
}

fn average(changes: &[Decimal]) -> Option<f64> {
    if changes.is_empty() {
        return None;
    }
    let sum: Decimal = changes.iter().sum();
    (sum / Decimal::from(changes.len())).to_f64()
}

/// 50 plus 20 points per percent of weighted average change, clamped to 0-100.
///
/// When only one side has data it carries the full weight.
fn market_score(global: Option<f64>, domestic: Option<f64>) -> f64 {
    let blended = match (global, domestic) {
        (Some(g), Some(d)) => g * GLOBAL_WEIGHT + d * DOMESTIC_WEIGHT,
        (Some(g), None) => g,
        (None, Some(d)) => d,
        (None, None) => 0.0,
    };
    let score = 50.0 + blended * POINTS_PER_PERCENT;
    ((score * 10.0).round() / 10.0).clamp(0.0, 100.0)
}

fn favorable_styles(sentiment: MarketSentiment, domestic_change: f64) -> Vec<TradingStyle> {
    let mut styles = match sentiment {
        MarketSentiment::Bullish => vec![TradingStyle::Swing, TradingStyle::LongTerm],
        MarketSentiment::Neutral => vec![TradingStyle::Intraday, TradingStyle::Swing],
        MarketSentiment::Bearish => vec![TradingStyle::Intraday, TradingStyle::Hedged],
    };
    if domestic_change.abs() >= WIDE_SESSION_PERCENT && !styles.contains(&TradingStyle::Intraday) {
        styles.insert(0, TradingStyle::Intraday);
    }
    styles
}
