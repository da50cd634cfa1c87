//! Cast dispatcher tests
//!
//! Synchronous validation, background execution and terminal outcomes.

mod common;

use common::{stream_url, FakeDevice, FakeExtractor};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use twitchcast::models::{CastTarget, Quality};
use twitchcast::stream::{
    CastDispatcher, CastFailure, CastOutcome, DispatchError, DispatchOptions, ResolveError,
    StreamResolver,
};

const LIVING_ROOM: &str = "192.168.1.50";

fn targets() -> Vec<CastTarget> {
    vec![CastTarget {
        name: "Living Room".into(),
        address: LIVING_ROOM.parse().unwrap(),
        max_quality: Quality::from("720p"),
    }]
}

fn dispatcher(
    extractor: &Arc<FakeExtractor>,
    device: &Arc<FakeDevice>,
    options: DispatchOptions,
) -> CastDispatcher {
    let resolver = Arc::new(StreamResolver::new(extractor.clone()));
    CastDispatcher::start(targets(), resolver, device.clone(), options)
}

// =============================================================================
// Synchronous Rejections
// =============================================================================

#[tokio::test]
async fn test_unknown_device_rejected_without_work() {
    let extractor = Arc::new(FakeExtractor::with_tiers(&["720p"]));
    let device = Arc::new(FakeDevice::new());
    let dispatcher = dispatcher(&extractor, &device, DispatchOptions::default());

    for address in ["10.0.0.9", "not-an-ip", ""] {
        let err = dispatcher.dispatch("abc", address).unwrap_err();
        assert!(matches!(err, DispatchError::UnknownDevice(ref a) if a == address));
    }

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(extractor.calls(), 0);
    assert!(device.plays().is_empty());
}

#[tokio::test]
async fn test_invalid_channel_rejected() {
    let extractor = Arc::new(FakeExtractor::with_tiers(&["720p"]));
    let device = Arc::new(FakeDevice::new());
    let dispatcher = dispatcher(&extractor, &device, DispatchOptions::default());

    let err = dispatcher.dispatch("--output=x", LIVING_ROOM).unwrap_err();
    assert!(matches!(err, DispatchError::InvalidChannel(_)));
    assert_eq!(extractor.calls(), 0);
}

#[tokio::test(flavor = "current_thread")]
async fn test_full_queue_rejects() {
    let extractor = Arc::new(FakeExtractor::with_tiers(&["720p"]));
    let device = Arc::new(FakeDevice::new());
    let options = DispatchOptions {
        queue_capacity: 1,
        ..DispatchOptions::default()
    };
    let dispatcher = dispatcher(&extractor, &device, options);

    // The worker cannot drain the queue until this task yields
    let first = dispatcher.dispatch("abc", LIVING_ROOM);
    let second = dispatcher.dispatch("abc", LIVING_ROOM);

    assert!(first.is_ok());
    assert!(matches!(second, Err(DispatchError::QueueFull)));

    let outcome = first.unwrap().outcome().await.unwrap();
    assert!(outcome.is_done());
}

// =============================================================================
// Outcomes
// =============================================================================

#[tokio::test]
async fn test_cast_uses_fallback_quality() {
    let extractor = Arc::new(FakeExtractor::with_tiers(&["480p", "worst"]));
    let device = Arc::new(FakeDevice::new());
    let dispatcher = dispatcher(&extractor, &device, DispatchOptions::default());

    let ticket = dispatcher.dispatch("abc", LIVING_ROOM).unwrap();
    assert_eq!(ticket.channel, "abc");
    assert_eq!(ticket.target.name, "Living Room");

    match ticket.outcome().await {
        Some(CastOutcome::Done(stream)) => {
            assert_eq!(stream.quality.as_str(), "480p");
            assert_eq!(stream.url, stream_url("480p"));
        }
        other => panic!("Expected Done, got {:?}", other),
    }

    let address: IpAddr = LIVING_ROOM.parse().unwrap();
    assert_eq!(device.plays(), vec![(address, stream_url("480p"))]);
}

#[tokio::test]
async fn test_dispatch_acknowledges_before_cast_finishes() {
    let extractor = Arc::new(FakeExtractor::with_tiers(&["720p"]).slow(Duration::from_millis(200)));
    let device = Arc::new(FakeDevice::new());
    let dispatcher = dispatcher(&extractor, &device, DispatchOptions::default());

    let ticket = dispatcher.dispatch("abc", LIVING_ROOM).unwrap();
    assert!(device.plays().is_empty());

    assert!(ticket.outcome().await.unwrap().is_done());
    assert_eq!(device.plays().len(), 1);
}

#[tokio::test]
async fn test_offline_channel_fails_without_casting() {
    let extractor = Arc::new(FakeExtractor::offline());
    let device = Arc::new(FakeDevice::new());
    let dispatcher = dispatcher(&extractor, &device, DispatchOptions::default());

    let outcome = dispatcher
        .dispatch("abc", LIVING_ROOM)
        .unwrap()
        .outcome()
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        CastOutcome::Failed(CastFailure::Resolve(ResolveError::NoStreamAvailable { .. }))
    ));
    assert!(device.plays().is_empty());
}

#[tokio::test]
async fn test_device_failure_is_reported() {
    let extractor = Arc::new(FakeExtractor::with_tiers(&["720p"]));
    let device = Arc::new(FakeDevice::failing());
    let dispatcher = dispatcher(&extractor, &device, DispatchOptions::default());

    let outcome = dispatcher
        .dispatch("abc", LIVING_ROOM)
        .unwrap()
        .outcome()
        .await
        .unwrap();

    assert!(matches!(outcome, CastOutcome::Failed(CastFailure::Device(_))));
    assert_eq!(device.plays().len(), 1);
}

#[tokio::test]
async fn test_slow_cast_times_out() {
    let extractor = Arc::new(FakeExtractor::with_tiers(&["720p"]).slow(Duration::from_secs(5)));
    let device = Arc::new(FakeDevice::new());
    let options = DispatchOptions {
        cast_timeout: Duration::from_millis(50),
        ..DispatchOptions::default()
    };
    let dispatcher = dispatcher(&extractor, &device, options);

    let outcome = dispatcher
        .dispatch("abc", LIVING_ROOM)
        .unwrap()
        .outcome()
        .await
        .unwrap();

    match outcome {
        CastOutcome::Failed(CastFailure::TimedOut(after)) => {
            assert_eq!(after, Duration::from_millis(50));
        }
        other => panic!("Expected TimedOut, got {:?}", other),
    }
    assert!(device.plays().is_empty());
}

#[tokio::test]
async fn test_dropped_ticket_does_not_stop_cast() {
    let extractor = Arc::new(FakeExtractor::with_tiers(&["720p"]));
    let device = Arc::new(FakeDevice::new());
    let dispatcher = dispatcher(&extractor, &device, DispatchOptions::default());

    drop(dispatcher.dispatch("abc", LIVING_ROOM).unwrap());

    for _ in 0..50 {
        if !device.plays().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(device.plays().len(), 1);
}
