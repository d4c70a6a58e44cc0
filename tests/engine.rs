//! End-to-end engine behavior against the in-process store.

use std::sync::Arc;

use floodgate::{
    CreateParams, Floodgate, FloodgateConfig, FloodgateError, MemoryStore, TimeSegment, UpdatePatch,
};

fn engine() -> Floodgate {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    Floodgate::new(Arc::new(MemoryStore::new()), FloodgateConfig::default())
}

fn params(key: &str, max: u64, time: TimeSegment) -> CreateParams {
    CreateParams {
        key: key.to_string(),
        max,
        time,
    }
}

#[tokio::test]
async fn test_create_then_find() {
    let gate = engine();

    let rule = gate
        .create(params("k", 10, TimeSegment::Minute))
        .await
        .unwrap();
    assert_eq!(rule.key, "k");
    assert_eq!(rule.max, 10);
    assert_eq!(rule.time, TimeSegment::Minute);

    let found = gate.find("k").await.unwrap().unwrap();
    assert_eq!(found, rule);
}

#[tokio::test]
async fn test_create_assigns_uuid_id() {
    let gate = engine();

    let rule = gate
        .create(params("k", 10, TimeSegment::Minute))
        .await
        .unwrap();
    assert!(uuid::Uuid::parse_str(&rule.id).is_ok());
    assert_eq!(gate.find_id("k").await.unwrap(), Some(rule.id));
}

#[tokio::test]
async fn test_create_duplicate_key() {
    let gate = engine();

    gate.create(params("k", 10, TimeSegment::Minute))
        .await
        .unwrap();
    let err = gate
        .create(params("k", 5, TimeSegment::Hour))
        .await
        .unwrap_err();
    assert!(matches!(err, FloodgateError::DuplicateKey(_)));

    // The original rule is untouched.
    let rule = gate.find("k").await.unwrap().unwrap();
    assert_eq!(rule.max, 10);
}

#[tokio::test]
async fn test_create_zero_max_persists_nothing() {
    let gate = engine();

    let err = gate
        .create(params("k", 0, TimeSegment::Minute))
        .await
        .unwrap_err();
    assert!(matches!(err, FloodgateError::InvalidMax(0)));
    assert!(gate.find("k").await.unwrap().is_none());
}

#[tokio::test]
async fn test_invalid_segment_name_is_rejected() {
    // String entry points go through FromStr; an unrecognized segment never
    // reaches the store.
    let err = "invalid".parse::<TimeSegment>().unwrap_err();
    assert!(matches!(err, FloodgateError::InvalidSegment(_)));
}

#[tokio::test]
async fn test_find_unknown_key() {
    let gate = engine();
    assert!(gate.find("nonexistent").await.unwrap().is_none());
    assert!(gate.find_id("nonexistent").await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_max() {
    let gate = engine();

    gate.create(params("k", 10, TimeSegment::Minute))
        .await
        .unwrap();
    let updated = gate.update("k", UpdatePatch { max: Some(20) }).await.unwrap();
    assert!(updated);

    let rule = gate.find("k").await.unwrap().unwrap();
    assert_eq!(rule.max, 20);
    // Everything else is immutable.
    assert_eq!(rule.time, TimeSegment::Minute);
}

#[tokio::test]
async fn test_update_unknown_key_creates_nothing() {
    let gate = engine();

    let updated = gate
        .update("ghost", UpdatePatch { max: Some(5) })
        .await
        .unwrap();
    assert!(!updated);
    assert!(gate.find("ghost").await.unwrap().is_none());
}

#[tokio::test]
async fn test_incr_counts_toward_stats() {
    let gate = engine();

    gate.create(params("k", 10, TimeSegment::Minute))
        .await
        .unwrap();
    for _ in 0..3 {
        assert!(gate.incr("k").await.unwrap());
    }

    let stats = gate.stats("k").await.unwrap().unwrap();
    assert_eq!(stats.counters[&TimeSegment::Minute], 3);
    assert!(stats.allowed);
}

#[tokio::test]
async fn test_incr_unknown_key_returns_false() {
    let gate = engine();
    assert!(!gate.incr("nonexistent").await.unwrap());
}

#[tokio::test]
async fn test_incr_tracks_auxiliary_segments() {
    let gate = engine();

    gate.create(params("k", 10, TimeSegment::Minute))
        .await
        .unwrap();
    gate.incr("k").await.unwrap();

    let stats = gate.stats("k").await.unwrap().unwrap();
    // The rule enforces minute, but every tracked segment counts the event.
    for segment in TimeSegment::ALL {
        assert_eq!(stats.counters[&segment], 1, "segment {segment}");
    }
}

#[tokio::test]
async fn test_blocked_at_max() {
    let gate = engine();

    gate.create(params("k1", 2, TimeSegment::Minute))
        .await
        .unwrap();
    gate.incr("k1").await.unwrap();
    gate.incr("k1").await.unwrap();

    let stats = gate.stats("k1").await.unwrap().unwrap();
    assert_eq!(stats.counters[&TimeSegment::Minute], 2);
    assert!(!stats.allowed);
    assert_eq!(stats.percent, "100.00");
}

#[tokio::test]
async fn test_allowed_below_max() {
    let gate = engine();

    gate.create(params("k2", 10, TimeSegment::Minute))
        .await
        .unwrap();
    gate.incr("k2").await.unwrap();

    let stats = gate.stats("k2").await.unwrap().unwrap();
    assert_eq!(stats.counters[&TimeSegment::Minute], 1);
    assert!(stats.allowed);
    assert_eq!(stats.percent, "10.00");
}

#[tokio::test]
async fn test_percent_past_limit_keeps_rising() {
    let gate = engine();

    gate.create(params("k", 2, TimeSegment::Minute))
        .await
        .unwrap();
    for _ in 0..3 {
        gate.incr("k").await.unwrap();
    }

    let stats = gate.stats("k").await.unwrap().unwrap();
    assert!(!stats.allowed);
    assert_eq!(stats.percent, "150.00");
}

#[tokio::test]
async fn test_stats_unknown_key() {
    let gate = engine();
    assert!(gate.stats("nonexistent").await.unwrap().is_none());
}

#[tokio::test]
async fn test_clear_resets_counters_keeps_rule() {
    let gate = engine();

    gate.create(params("k", 10, TimeSegment::Minute))
        .await
        .unwrap();
    gate.incr("k").await.unwrap();
    gate.incr("k").await.unwrap();

    assert!(gate.clear("k").await.unwrap());

    let stats = gate.stats("k").await.unwrap().unwrap();
    assert_eq!(stats.counters[&TimeSegment::Minute], 0);
    assert!(stats.allowed);
    assert!(gate.find("k").await.unwrap().is_some());

    // A fresh increment starts a new window at 1.
    gate.incr("k").await.unwrap();
    assert_eq!(gate.read("k", TimeSegment::Minute).await.unwrap(), 1);
}

#[tokio::test]
async fn test_clear_unknown_key_returns_false() {
    let gate = engine();
    assert!(!gate.clear("nonexistent").await.unwrap());
}

#[tokio::test]
async fn test_remove_is_idempotent() {
    let gate = engine();

    gate.create(params("k", 10, TimeSegment::Minute))
        .await
        .unwrap();
    gate.incr("k").await.unwrap();

    assert!(gate.remove("k").await.unwrap());
    assert!(gate.find("k").await.unwrap().is_none());
    assert!(gate.stats("k").await.unwrap().is_none());

    // Second removal is a clean false, never an error.
    assert!(!gate.remove("k").await.unwrap());
}

#[tokio::test]
async fn test_removed_key_can_be_recreated() {
    let gate = engine();

    let first = gate
        .create(params("k", 10, TimeSegment::Minute))
        .await
        .unwrap();
    gate.incr("k").await.unwrap();
    gate.remove("k").await.unwrap();

    let second = gate
        .create(params("k", 5, TimeSegment::Hour))
        .await
        .unwrap();
    assert_ne!(first.id, second.id);

    // No counters leaked from the first incarnation.
    let stats = gate.stats("k").await.unwrap().unwrap();
    assert_eq!(stats.counters[&TimeSegment::Hour], 0);
}

#[tokio::test]
async fn test_custom_prefix_and_segments() {
    let config = FloodgateConfig {
        key_prefix: "custom".to_string(),
        time_segments: vec![TimeSegment::Minute, TimeSegment::Hour],
    };
    let gate = Floodgate::new(Arc::new(MemoryStore::new()), config);
    assert_eq!(gate.prefix(), "custom");
    assert_eq!(
        gate.time_segments(),
        &[TimeSegment::Minute, TimeSegment::Hour]
    );

    gate.create(params("k", 10, TimeSegment::Minute))
        .await
        .unwrap();
    gate.incr("k").await.unwrap();

    let stats = gate.stats("k").await.unwrap().unwrap();
    assert_eq!(stats.counters.len(), 2);
    assert_eq!(stats.counters[&TimeSegment::Minute], 1);
    assert_eq!(stats.counters[&TimeSegment::Hour], 1);
}

#[tokio::test]
async fn test_create_rejects_untracked_segment() {
    // A rule enforced on a segment the engine does not track would never see
    // its counter move, so its quota could never be reached.
    let config = FloodgateConfig {
        key_prefix: "narrow".to_string(),
        time_segments: vec![TimeSegment::Minute, TimeSegment::Hour],
    };
    let gate = Floodgate::new(Arc::new(MemoryStore::new()), config);

    let err = gate
        .create(params("k", 2, TimeSegment::Day))
        .await
        .unwrap_err();
    assert!(matches!(err, FloodgateError::InvalidSegment(_)));
    assert!(gate.find("k").await.unwrap().is_none());

    // A tracked segment still enforces normally under the narrowed config.
    gate.create(params("k", 2, TimeSegment::Minute))
        .await
        .unwrap();
    for _ in 0..3 {
        gate.incr("k").await.unwrap();
    }
    let stats = gate.stats("k").await.unwrap().unwrap();
    assert!(!stats.allowed);
    assert_eq!(stats.percent, "150.00");
}

#[tokio::test]
async fn test_engines_share_state_through_store() {
    // Two engine instances over the same store see each other's writes; the
    // engine itself holds no state between calls.
    let store = Arc::new(MemoryStore::new());
    let a = Floodgate::new(
        Arc::clone(&store) as Arc<dyn floodgate::CounterStore>,
        FloodgateConfig::default(),
    );
    let b = Floodgate::new(
        store as Arc<dyn floodgate::CounterStore>,
        FloodgateConfig::default(),
    );

    a.create(params("k", 10, TimeSegment::Minute)).await.unwrap();
    b.incr("k").await.unwrap();

    let stats = a.stats("k").await.unwrap().unwrap();
    assert_eq!(stats.counters[&TimeSegment::Minute], 1);
}

#[tokio::test]
async fn test_concurrent_increments_are_all_counted() {
    let store = Arc::new(MemoryStore::new());
    let gate = Arc::new(Floodgate::new(
        store as Arc<dyn floodgate::CounterStore>,
        FloodgateConfig::default(),
    ));

    // A day-long window keeps this robust against window boundaries mid-test.
    gate.create(params("k", 1000, TimeSegment::Day))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let gate = Arc::clone(&gate);
        handles.push(tokio::spawn(async move {
            for _ in 0..25 {
                gate.incr("k").await.unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(gate.read("k", TimeSegment::Day).await.unwrap(), 200);
}
