use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use crate::cache::{
    CacheError, CacheStore, CacheValue, MAX_TTL_SECONDS, MemoryCacheStore, SettingsCacheKey,
    TimeBoundCache,
};
use crate::config::Environment;
use crate::config::settings::MemoryCacheConfig;
use crate::engine::{ReloadError, SettingsCacheEngine};
use crate::error::AppError;
use crate::test_support::{FlakyCache, MemorySettingsStore};

const TTL: u64 = 30;

struct Harness {
    store: Arc<MemorySettingsStore>,
    memory: Arc<MemoryCacheStore>,
    cache: Arc<FlakyCache>,
    engine: Arc<SettingsCacheEngine>,
}

impl Harness {
    fn new(rows: &[(&str, bool)]) -> Self {
        let store = Arc::new(MemorySettingsStore::with_rows(rows.iter().copied()));
        let memory = Arc::new(MemoryCacheStore::new(&MemoryCacheConfig::default()));
        let cache = Arc::new(FlakyCache::new(memory.clone()));
        let engine = Arc::new(SettingsCacheEngine::new(
            store.clone(),
            cache.clone(),
            SettingsCacheKey::new(Environment::Test, "settings"),
            TTL,
        ));
        Self {
            store,
            memory,
            cache,
            engine,
        }
    }

    fn key(&self) -> &str {
        self.engine.cache_key().as_str()
    }

    async fn snapshot(&self) -> BTreeMap<String, CacheValue> {
        self.memory
            .hgetall(self.key())
            .await
            .unwrap()
            .into_iter()
            .collect()
    }
}

fn flags(pairs: &[(&str, bool)]) -> BTreeMap<String, bool> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), *value))
        .collect()
}

#[tokio::test]
async fn test_reload_is_idempotent() {
    let h = Harness::new(&[("ALPHA", true), ("BETA", false)]);

    assert_eq!(h.engine.reload_all().await, Ok(2));
    let first = h.snapshot().await;
    assert_eq!(h.engine.reload_all().await, Ok(2));
    let second = h.snapshot().await;

    assert_eq!(first, second);
    assert_eq!(first.get("ALPHA"), Some(&CacheValue::flag(true)));
    assert_eq!(first.get("BETA"), Some(&CacheValue::flag(false)));
}

#[tokio::test(start_paused = true)]
async fn test_reload_sets_ttl_on_snapshot() {
    let h = Harness::new(&[("ALPHA", true)]);

    h.engine.reload_all().await.unwrap();
    assert_eq!(
        h.memory.ttl(h.key()).unwrap(),
        Some(Duration::from_secs(TTL))
    );
}

#[tokio::test]
async fn test_empty_store_leaves_no_snapshot() {
    let h = Harness::new(&[]);
    h.memory
        .hset(h.key(), &[("STALE".to_string(), CacheValue::flag(true))])
        .await
        .unwrap();

    assert_eq!(h.engine.reload_all().await, Ok(0));
    assert!(!h.memory.exists(h.key()).await.unwrap());
    assert!(h.engine.get_all().await.is_empty());
    assert!(!h.engine.get_one("ANY").await);

    // Without a snapshot every read goes back to the store.
    assert_eq!(h.store.list_calls(), 3);
}

#[tokio::test]
async fn test_concurrent_reads_share_one_reload() {
    let h = Harness::new(&[("ALPHA", true), ("BETA", false)]);
    h.store.set_delay(Duration::from_millis(30));

    let reads = (0..32).map(|i| {
        let engine = h.engine.clone();
        async move {
            let key = if i % 2 == 0 { "alpha" } else { "beta" };
            engine.get_one(key).await
        }
    });
    let results = join_all(reads).await;

    assert_eq!(h.store.list_calls(), 1);
    for (i, enabled) in results.into_iter().enumerate() {
        assert_eq!(enabled, i % 2 == 0);
    }
}

#[tokio::test]
async fn test_failed_batch_keeps_prior_snapshot() {
    let h = Harness::new(&[("ALPHA", true)]);
    h.engine.reload_all().await.unwrap();
    let before = h.snapshot().await;

    h.store.put("ALPHA", false);
    h.store.put("GAMMA", true);
    h.cache.fail_batches(true);

    let err = h.engine.reload_all().await.unwrap_err();
    assert!(matches!(err, ReloadError::Cache(_)));
    assert_eq!(h.snapshot().await, before);
}

#[tokio::test]
async fn test_failed_store_read_leaves_cache_untouched() {
    let h = Harness::new(&[("ALPHA", true)]);
    h.store.set_failing(true);

    let err = h.engine.reload_all().await.unwrap_err();
    assert!(matches!(err, ReloadError::Store(_)));
    assert!(!h.memory.exists(h.key()).await.unwrap());
}

#[tokio::test]
async fn test_missing_field_in_live_snapshot_is_false_without_reload() {
    let h = Harness::new(&[("ALPHA", true)]);
    h.engine.reload_all().await.unwrap();
    assert_eq!(h.store.list_calls(), 1);

    assert!(!h.engine.get_one("BETA").await);
    assert!(h.engine.get_one("alpha").await);
    assert_eq!(h.store.list_calls(), 1);
}

#[tokio::test]
async fn test_reads_fall_back_when_cache_fails() {
    let h = Harness::new(&[("ALPHA", true), ("BETA", false)]);
    h.cache.set_down(true);

    assert!(h.engine.get_one(" alpha ").await);
    assert!(!h.engine.get_one("BETA").await);
    assert!(!h.engine.get_one("MISSING").await);
    assert_eq!(
        h.engine.get_all().await,
        flags(&[("ALPHA", true), ("BETA", false)])
    );
}

#[tokio::test]
async fn test_read_errors_fall_back_without_touching_snapshot() {
    let h = Harness::new(&[("ALPHA", true)]);
    h.engine.reload_all().await.unwrap();
    h.store.put("ALPHA", false);
    h.cache.fail_reads(true);

    assert!(!h.engine.get_one("ALPHA").await);
    assert_eq!(h.store.list_calls(), 1);
    assert_eq!(h.snapshot().await.get("ALPHA"), Some(&CacheValue::flag(true)));
}

#[tokio::test]
async fn test_reads_fall_back_when_reload_fails() {
    let h = Harness::new(&[("ALPHA", true)]);
    h.cache.fail_batches(true);

    assert!(h.engine.get_one("ALPHA").await);
    assert_eq!(h.engine.get_all().await, flags(&[("ALPHA", true)]));
}

#[tokio::test]
async fn test_reads_degrade_when_both_stores_fail() {
    let h = Harness::new(&[("ALPHA", true)]);
    h.cache.set_down(true);
    h.store.set_failing(true);

    assert!(!h.engine.get_one("ALPHA").await);
    assert!(h.engine.get_all().await.is_empty());
}

#[tokio::test]
async fn test_get_all_loads_and_decodes() {
    let h = Harness::new(&[("ALPHA", true), ("BETA", false)]);

    assert_eq!(
        h.engine.get_all().await,
        flags(&[("ALPHA", true), ("BETA", false)])
    );
    assert_eq!(h.store.list_calls(), 1);

    h.engine.get_all().await;
    assert_eq!(h.store.list_calls(), 1);
}

#[tokio::test]
async fn test_foreign_encodings_decode_by_truth_table() {
    let h = Harness::new(&[("ALPHA", true)]);
    h.engine.reload_all().await.unwrap();
    h.memory
        .hset(
            h.key(),
            &[
                ("INT_ON".to_string(), CacheValue::Integer(1)),
                ("BOOL_ON".to_string(), CacheValue::Bool(true)),
                ("WORD".to_string(), CacheValue::Text("yes".to_string())),
            ],
        )
        .await
        .unwrap();

    assert!(h.engine.get_one("INT_ON").await);
    assert!(h.engine.get_one("BOOL_ON").await);
    assert!(!h.engine.get_one("WORD").await);
}

#[tokio::test(start_paused = true)]
async fn test_expired_snapshot_reloads_once() {
    let h = Harness::new(&[("ALPHA", true)]);

    assert!(h.engine.get_one("ALPHA").await);
    assert_eq!(h.store.list_calls(), 1);

    tokio::time::advance(Duration::from_secs(TTL - 1)).await;
    assert!(h.engine.get_one("ALPHA").await);
    assert_eq!(h.store.list_calls(), 1);

    h.store.put("ALPHA", false);
    tokio::time::advance(Duration::from_secs(2)).await;
    assert!(!h.engine.get_one("ALPHA").await);
    assert!(!h.engine.get_one("ALPHA").await);
    assert_eq!(h.store.list_calls(), 2);
}

#[tokio::test]
async fn test_invalidate_picks_up_direct_writes() {
    let h = Harness::new(&[("ALPHA", true)]);
    assert!(h.engine.get_one("ALPHA").await);

    h.store.put("ALPHA", false);
    assert!(h.engine.get_one("ALPHA").await);

    assert_eq!(h.engine.invalidate().await.unwrap(), 1);
    assert!(!h.engine.get_one("ALPHA").await);
}

#[tokio::test]
async fn test_invalidate_supersedes_stale_reload() {
    let h = Harness::new(&[("ALPHA", true)]);
    h.store.set_delay(Duration::from_millis(40));

    let stale = {
        let engine = h.engine.clone();
        tokio::spawn(async move { engine.reload_all().await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    // The in-flight reload already read the old rows.
    h.store.put("BETA", true);
    h.store.set_delay(Duration::ZERO);

    assert_eq!(h.engine.invalidate().await.unwrap(), 2);
    assert_eq!(stale.await.unwrap(), Ok(1));
    assert!(h.engine.get_one("BETA").await);
    assert_eq!(h.store.list_calls(), 2);
}

#[tokio::test]
async fn test_invalidate_surfaces_errors() {
    let h = Harness::new(&[("ALPHA", true)]);

    h.cache.fail_batches(true);
    assert!(matches!(
        h.engine.invalidate().await,
        Err(AppError::Reload(ReloadError::Cache(_)))
    ));

    h.cache.set_down(true);
    assert!(matches!(h.engine.invalidate().await, Err(AppError::Cache(_))));
}

#[tokio::test(start_paused = true)]
async fn test_set_one_only_touches_live_snapshot() {
    let h = Harness::new(&[("ALPHA", false)]);

    assert!(!h.engine.set_one("alpha", true).await.unwrap());
    assert!(!h.memory.exists(h.key()).await.unwrap());

    h.engine.reload_all().await.unwrap();
    tokio::time::advance(Duration::from_secs(10)).await;

    assert!(h.engine.set_one("alpha", true).await.unwrap());
    assert!(h.engine.get_one("ALPHA").await);
    assert_eq!(
        h.memory.ttl(h.key()).unwrap(),
        Some(Duration::from_secs(TTL))
    );
}

#[tokio::test(start_paused = true)]
async fn test_cache_timeouts_fall_back_to_store() {
    let store = Arc::new(MemorySettingsStore::with_rows([("ALPHA", true), ("BETA", false)]));
    let memory = Arc::new(MemoryCacheStore::new(&MemoryCacheConfig::default()));
    let slow = Arc::new(FlakyCache::new(memory.clone()));
    slow.set_delay(Duration::from_secs(60));
    let engine = SettingsCacheEngine::new(
        store.clone(),
        Arc::new(TimeBoundCache::new(slow, Duration::from_millis(50))),
        SettingsCacheKey::new(Environment::Test, "settings"),
        TTL,
    );

    assert!(engine.get_one("ALPHA").await);
    assert!(!engine.get_one("BETA").await);
    assert_eq!(
        engine.get_all().await,
        flags(&[("ALPHA", true), ("BETA", false)])
    );
    assert!(matches!(
        engine.invalidate().await,
        Err(AppError::Cache(CacheError::Timeout { .. }))
    ));
    assert!(!memory.exists(engine.cache_key().as_str()).await.unwrap());
}

#[tokio::test]
async fn test_oversized_ttl_fails_reload_and_keeps_cache_usable() {
    let store = Arc::new(MemorySettingsStore::with_rows([("ALPHA", true)]));
    let memory = Arc::new(MemoryCacheStore::new(&MemoryCacheConfig::default()));
    let engine = SettingsCacheEngine::new(
        store.clone(),
        memory.clone(),
        SettingsCacheKey::new(Environment::Test, "settings"),
        u64::MAX / 2,
    );

    assert!(matches!(
        engine.reload_all().await,
        Err(ReloadError::Cache(_))
    ));
    assert!(engine.get_one("ALPHA").await);

    let key = engine.cache_key().as_str();
    assert!(!memory.exists(key).await.unwrap());
    memory
        .hset(key, &[("ALPHA".to_string(), CacheValue::flag(true))])
        .await
        .unwrap();
    assert!(memory.expire(key, MAX_TTL_SECONDS).await.unwrap());
}
