use marketpulse_sources::QuoteBatch;

use super::{BuildContext, PickedQuote, Sourced};
use crate::constants::FRAGMENT_SCHEMA_VERSION;
use crate::errors::{ContextError, Result};
use crate::fragments::{FragmentKind, IntradayContext, SessionRange};
use crate::indicators::{approximate_vwap, classify_momentum, pivot_levels, to_f64, Momentum, PivotLevels};
use crate::provenance::Tagged;

pub(super) async fn build(ctx: &BuildContext<'_>) -> Result<IntradayContext> {
    let index = ctx.scope.index_key();
    let quotes = ctx.domestic_quotes(std::slice::from_ref(&index)).await;
    let picked = require_quote(FragmentKind::Intraday, &quotes, &index)?;
    let (pivots, momentum) = session_levels(&picked);
    let quote = &picked.quote;

    Ok(IntradayContext {
        version: FRAGMENT_SCHEMA_VERSION,
        scope_index: index,
        session: picked.tag(SessionRange::from(quote)),
        pivots,
        vwap: picked.tag(approximate_vwap(quote.high, quote.low, quote.last)),
        momentum,
    })
}

/// The scope index quote, or `AllSourcesUnavailable` when there is none.
pub(super) fn require_quote(
    kind: FragmentKind,
    quotes: &Sourced<QuoteBatch>,
    index: &str,
) -> Result<PickedQuote> {
    quotes.pick(index).ok_or_else(|| ContextError::AllSourcesUnavailable {
        fragment: kind.to_string(),
        reasons: vec![quotes
            .failure_reason()
            .unwrap_or_else(|| format!("domestic_quotes: no quote for {}", index))],
    })
}

/// Pivot levels and momentum derived from the session quote.
pub(super) fn session_levels(picked: &PickedQuote) -> (Tagged<PivotLevels>, Tagged<Momentum>) {
    let quote = &picked.quote;
    (
        picked.tag(pivot_levels(quote.high, quote.low, quote.last)),
        picked.tag(classify_momentum(to_f64(quote.change_percent()))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::test_support::{quote, Harness};
    use crate::provenance::Provenance;
    use marketpulse_sources::{Endpoint, SourceError};
    use rust_decimal_macros::dec;
    use std::time::Duration;

    #[tokio::test]
    async fn test_levels_from_session_quote() {
        let harness = Harness::new();
        let intraday = build(&harness.context()).await.unwrap();

        // NIFTY: last 22220, previous close 22000, high 22270, low 21950
        assert_eq!(intraday.session.value.change_percent, dec!(1.00));
        assert_eq!(intraday.pivots.value.pivot, dec!(22146.67));
        assert_eq!(intraday.momentum.value, Momentum::StrongBullish);
        assert_eq!(intraday.session.provenance, Provenance::Real);
        // Typical price of a live session bar carries the quote's provenance.
        assert_eq!(intraday.vwap.value, dec!(22146.67));
        assert_eq!(intraday.vwap.provenance, Provenance::Real);
    }

    #[tokio::test]
    async fn test_missing_quote_fails() {
        let harness = Harness::new();
        harness.gateway.fail(
            Endpoint::DomesticQuotes,
            SourceError::Timeout {
                endpoint: "domestic_quotes".to_string(),
                elapsed: Duration::from_secs(5),
            },
        );

        let error = build(&harness.context()).await.unwrap_err();
        match error {
            ContextError::AllSourcesUnavailable { fragment, reasons } => {
                assert_eq!(fragment, "intraday");
                assert_eq!(reasons, vec!["domestic_quotes: timeout".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_stale_quote_after_expiry() {
        let harness = Harness::new();
        build(&harness.context()).await.unwrap();

        harness.clock.advance(Duration::from_secs(31));
        harness.gateway.set_quotes(vec![quote("SENSEX", dec!(73000), dec!(72500))]);
        let intraday = build(&harness.context()).await.unwrap();

        assert_eq!(intraday.session.provenance, Provenance::StaleFallback);
        assert_eq!(intraday.pivots.provenance, Provenance::StaleFallback);
        assert_eq!(intraday.vwap.provenance, Provenance::StaleFallback);
    }
}
