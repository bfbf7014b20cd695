//! Concurrent identical requests share one build and one upstream fetch.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::TestEngine;
use futures::future::join_all;
use marketpulse_context::{
    ComposeRequest, CompositeResponse, ContextComposerTrait, ContextScope, ContextShape,
    FragmentKind, ServedFrom,
};
use marketpulse_sources::Endpoint;

async fn compose_concurrently(
    engine: &TestEngine,
    requests: Vec<ComposeRequest>,
) -> Vec<CompositeResponse> {
    let handles = requests.into_iter().map(|request| {
        let composer = Arc::clone(&engine.composer);
        tokio::spawn(async move { composer.compose(&request).await })
    });
    join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fifty_identical_requests_fetch_once() {
    let engine = TestEngine::new();
    engine.gateway.set_delay(Duration::from_millis(50));
    let request = ComposeRequest::for_shape(ContextShape::Intraday, ContextScope::index("NIFTY"));

    let responses = compose_concurrently(&engine, vec![request; 50]).await;

    assert_eq!(responses.len(), 50);
    assert_eq!(engine.gateway.calls(Endpoint::GlobalIndices), 1);
    // One benchmark batch for Primary, one index quote for Intraday.
    assert_eq!(engine.gateway.calls(Endpoint::DomesticQuotes), 2);
    assert_eq!(engine.gateway.calls(Endpoint::HistoricalCandles), 0);

    let stats = engine.composer.stats();
    // Two fragments and three raw datasets.
    assert_eq!(stats.builds, 5);
    assert_eq!(stats.failures, 0);

    // Late arrivals may read the finished intraday entry from cache, which
    // reports it as reused; the values are the same build either way.
    let first = &responses[0];
    let first_intraday = first.fragment(FragmentKind::Intraday).and_then(|f| f.as_intraday()).unwrap();
    for response in &responses[1..] {
        assert_eq!(response.fragment(FragmentKind::Primary), first.fragment(FragmentKind::Primary));
        for kind in [FragmentKind::Primary, FragmentKind::Intraday] {
            assert_eq!(
                response.slot(kind).unwrap().built_at,
                first.slot(kind).unwrap().built_at
            );
        }
        let intraday = response.fragment(FragmentKind::Intraday).and_then(|f| f.as_intraday()).unwrap();
        assert_eq!(intraday.session.value, first_intraday.session.value);
        assert_eq!(intraday.pivots.value, first_intraday.pivots.value);
        assert!(intraday.session.provenance.is_real_like());
    }

    let built = responses
        .iter()
        .filter(|r| r.slot(FragmentKind::Primary).unwrap().served_from == ServedFrom::Built)
        .count();
    assert_eq!(built, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_overlapping_shapes_share_primary() {
    let engine = TestEngine::new();
    engine.gateway.set_delay(Duration::from_millis(30));
    let scope = ContextScope::index("NIFTY");
    let requests: Vec<ComposeRequest> = [
        ContextShape::Overview,
        ContextShape::Detailed,
        ContextShape::Intraday,
        ContextShape::Swing,
        ContextShape::LongTerm,
    ]
    .into_iter()
    .cycle()
    .take(20)
    .map(|shape| ComposeRequest::for_shape(shape, scope.clone()))
    .collect();

    let responses = compose_concurrently(&engine, requests).await;

    assert_eq!(engine.gateway.calls(Endpoint::GlobalIndices), 1);
    assert_eq!(engine.gateway.calls(Endpoint::SectorPerformance), 1);
    assert_eq!(engine.gateway.calls(Endpoint::Fundamentals), 1);

    let primaries: Vec<_> = responses
        .iter()
        .filter_map(|r| r.fragment(FragmentKind::Primary))
        .collect();
    assert_eq!(primaries.len(), 20);
    assert!(primaries.windows(2).all(|pair| pair[0] == pair[1]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_failure_is_shared_not_retried() {
    let engine = TestEngine::new();
    engine.gateway.set_delay(Duration::from_millis(30));
    engine.gateway.fail_all();
    let request = ComposeRequest::for_shape(ContextShape::Overview, ContextScope::index("NIFTY"));

    let handles = (0..10).map(|_| {
        let composer = Arc::clone(&engine.composer);
        let request = request.clone();
        tokio::spawn(async move { composer.compose(&request).await })
    });
    let results = join_all(handles).await;

    assert!(results
        .into_iter()
        .all(|joined| joined.unwrap().is_err()));
    assert_eq!(engine.gateway.calls(Endpoint::GlobalIndices), 1);
    assert_eq!(engine.gateway.calls(Endpoint::DomesticQuotes), 1);
    // Both raw datasets and the primary fragment failed once each.
    assert_eq!(engine.composer.stats().failures, 3);
}
