//! Integration Tests for the Cache Facade
//!
//! Drives the public API end to end against the in-memory store. The tests
//! at the bottom need a live Redis server and are ignored by default.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smartcache::contract::pack;
use smartcache::{Cache, CacheError, Config, Decoded, KeyTtl, KeyType, MemoryStore, Reply, Store};

// == Helper Functions ==

fn create_test_cache() -> (Cache, MemoryStore) {
    let store = MemoryStore::new();
    (Cache::new(Arc::new(store.clone())), store)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Session {
    user_id: u64,
    roles: Vec<String>,
}

// == Invalid Input ==

#[tokio::test]
async fn test_invalid_keys_never_reach_store() {
    let (cache, store) = create_test_cache();

    assert!(!cache.set("", "v", None).await.unwrap());
    assert!(!cache.update_field("", "f", "v", None).await.unwrap());
    assert_eq!(cache.push_left("", [1], None).await.unwrap(), None);
    assert_eq!(cache.push_right("", [1], None).await.unwrap(), None);
    assert!(!cache.add_member("", "m").await.unwrap());
    assert!(!cache.update_scored("", [("m", 1.0)], None).await.unwrap());
    assert_eq!(cache.append("", "x").await.unwrap(), None);

    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_invalid_values_never_reach_store() {
    let (cache, store) = create_test_cache();

    assert!(!cache.set("k", "", None).await.unwrap());
    assert!(!cache.set("k", &None::<u32>, None).await.unwrap());
    assert!(!cache.set("k", &(), None).await.unwrap());
    assert!(!cache.update_field("h", "f", &None::<String>, None).await.unwrap());

    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_falsy_values_are_stored() {
    let (cache, _) = create_test_cache();

    assert!(cache.set("zero", &0, None).await.unwrap());
    assert!(cache.set("no", &false, None).await.unwrap());
    assert_eq!(cache.get::<i32>("zero").await.unwrap(), Some(Decoded::Value(0)));
    assert_eq!(cache.get::<bool>("no").await.unwrap(), Some(Decoded::Value(false)));
}

// == Scalars ==

#[tokio::test]
async fn test_structured_value_roundtrip() {
    let (cache, _) = create_test_cache();
    let session = Session {
        user_id: 42,
        roles: vec!["admin".to_string(), "ops".to_string()],
    };

    let key = pack(["session", "42"]);
    assert!(cache.set(&key, &session, Some(600)).await.unwrap());

    let read = cache.get::<Session>(&key).await.unwrap();
    assert_eq!(read, Some(Decoded::Value(session)));
    assert_eq!(cache.ttl(&key).await.unwrap(), KeyTtl::Expires(600));
}

#[tokio::test]
async fn test_foreign_bytes_read_raw() {
    let (cache, store) = create_test_cache();
    store.set("legacy", b"plain text".to_vec()).await.unwrap();

    let read = cache.get::<Session>("legacy").await.unwrap().unwrap();
    assert!(read.is_raw());
    assert_eq!(read.raw(), Some(&b"plain text"[..]));
}

#[tokio::test]
async fn test_numeric_keys_are_coerced() {
    let (cache, store) = create_test_cache();

    cache.set(1001, "v", None).await.unwrap();
    assert!(store.exists("1001").await.unwrap());
    assert!(cache.exists(1001).await.unwrap());
}

// == TTL Refresh ==

#[tokio::test]
async fn test_every_expiring_write_refreshes_ttl() {
    let (cache, store) = create_test_cache();

    cache.set("s", "v", Some(11)).await.unwrap();
    cache.update_field("h", "f", "v", Some(12)).await.unwrap();
    cache.push_left("l", [1], Some(13)).await.unwrap();
    cache.push_right("r", [1], Some(14)).await.unwrap();
    cache.update_scored("z", [("m", 1.0)], Some(15)).await.unwrap();

    for (key, ttl) in [("s", 11), ("h", 12), ("l", 13), ("r", 14), ("z", 15)] {
        assert_eq!(store.ttl(key).await.unwrap(), KeyTtl::Expires(ttl), "key {}", key);
    }
}

#[tokio::test]
async fn test_ttl_refresh_on_existing_key() {
    let (cache, _) = create_test_cache();

    cache.push_right("feed", [1], Some(5)).await.unwrap();
    cache.push_right("feed", [2], Some(900)).await.unwrap();
    assert_eq!(cache.ttl("feed").await.unwrap(), KeyTtl::Expires(900));
    assert_eq!(cache.size("feed").await.unwrap(), 2);
}

#[tokio::test]
async fn test_oversized_ttl_is_rejected() {
    let (cache, _) = create_test_cache();

    let result = cache.set("k", "v", Some(u64::MAX)).await;
    assert!(matches!(result, Err(CacheError::Store(msg)) if msg.contains("invalid expire time")));
    assert!(cache.expire("k", u64::MAX).await.is_err());
}

#[tokio::test]
async fn test_configured_default_ttl() {
    let config = Config {
        default_ttl: 120,
        ..Config::default()
    };
    let store = MemoryStore::new();
    let cache = Cache::new(Arc::new(store.clone())).with_default_ttl(config.default_ttl);

    cache.set("k", "v", None).await.unwrap();
    assert_eq!(store.ttl("k").await.unwrap(), KeyTtl::Expires(120));
}

// == Lists ==

#[tokio::test]
async fn test_list_push_pop_both_ends() {
    let (cache, _) = create_test_cache();

    cache.push_left("left", [1, 2, 3], None).await.unwrap();
    let mut popped = Vec::new();
    for _ in 0..3 {
        popped.push(cache.pop_left::<i32>("left").await.unwrap().unwrap());
    }
    assert_eq!(popped, vec![Decoded::Value(3), Decoded::Value(2), Decoded::Value(1)]);

    cache.push_right("right", [1, 2, 3], None).await.unwrap();
    let mut popped = Vec::new();
    for _ in 0..3 {
        popped.push(cache.pop_right::<i32>("right").await.unwrap().unwrap());
    }
    assert_eq!(popped, vec![Decoded::Value(3), Decoded::Value(2), Decoded::Value(1)]);
}

#[tokio::test]
async fn test_list_range_mixed_payloads() {
    let (cache, store) = create_test_cache();

    cache.push_right("mixed", [1, 2], None).await.unwrap();
    store.rpush("mixed", vec![b"oops".to_vec()]).await.unwrap();

    let items = cache.list_range::<i32>("mixed", 0, 10).await.unwrap();
    assert_eq!(
        items,
        vec![
            Decoded::Value(1),
            Decoded::Value(2),
            Decoded::Raw(b"oops".to_vec())
        ]
    );
}

// == Hashes, Sets, Sorted Sets ==

#[tokio::test]
async fn test_hash_fields() {
    let (cache, _) = create_test_cache();

    cache.update_field("u1", "name", "alice", None).await.unwrap();
    assert_eq!(
        cache.field_value::<String>("u1", "name").await.unwrap(),
        Some(Decoded::Value("alice".to_string()))
    );
    assert_eq!(cache.field_value::<String>("u1", "email").await.unwrap(), None);
    assert_eq!(cache.size("u1").await.unwrap(), 1);
}

#[tokio::test]
async fn test_set_membership() {
    let (cache, _) = create_test_cache();

    cache.add_member("tags", "rust").await.unwrap();
    assert!(cache.contains("tags", "rust").await.unwrap());
    cache.remove_member("tags", "rust").await.unwrap();
    assert!(!cache.contains("tags", "rust").await.unwrap());
    assert!(!cache.exists("tags").await.unwrap());
}

#[tokio::test]
async fn test_random_member_reads_named_set() {
    let (cache, _) = create_test_cache();

    cache.add_member("one", "only").await.unwrap();
    cache.add_member("other", "elsewhere").await.unwrap();

    for _ in 0..10 {
        let picked = cache.random_member::<String>("one").await.unwrap();
        assert_eq!(picked, Some(Decoded::Value("only".to_string())));
    }
}

#[tokio::test]
async fn test_sorted_set_range() {
    let (cache, _) = create_test_cache();

    cache
        .update_scored("board", [("alice", 10.0), ("bob", 5.0)], None)
        .await
        .unwrap();
    let members = cache.range_by_score::<String>("board", 0, 10).await.unwrap();
    assert_eq!(
        members,
        vec![
            Decoded::Value("bob".to_string()),
            Decoded::Value("alice".to_string())
        ]
    );
    assert_eq!(cache.size("board").await.unwrap(), 2);
}

// == Introspection ==

#[tokio::test]
async fn test_size_rejects_scalars() {
    let (cache, _) = create_test_cache();

    cache.set("name", "alice", None).await.unwrap();
    assert!(matches!(
        cache.size("name").await,
        Err(CacheError::TypeMismatch(_))
    ));
    assert_eq!(cache.key_type("name").await.unwrap(), KeyType::String);
}

#[tokio::test]
async fn test_scan_lists_all_keys() {
    let (cache, _) = create_test_cache();

    for i in 0..25 {
        cache.set(pack(["item".to_string(), i.to_string()]), &i, None).await.unwrap();
    }
    cache.add_member("set", "m").await.unwrap();

    let mut keys = cache.scan_db().collect_keys().await.unwrap();
    keys.sort();
    assert_eq!(keys.len(), 26);
    assert!(keys.contains(&"item_7".to_string()));
    assert!(keys.contains(&"set".to_string()));
}

// == Gateway ==

#[tokio::test]
async fn test_gateway_matches_store() {
    let (cache, store) = create_test_cache();
    cache.set("greeting", "hello", None).await.unwrap();

    let via_cache = cache.call("strlen", ["greeting"]).await.unwrap();
    let direct = store
        .command("STRLEN", vec![b"greeting".to_vec()])
        .await
        .unwrap();
    assert_eq!(via_cache, direct);

    assert!(matches!(
        cache.call("nonexistent_command", ["x"]).await,
        Err(CacheError::UnsupportedOperation(_))
    ));
}

#[tokio::test]
async fn test_gateway_dbsize() {
    let (cache, _) = create_test_cache();
    cache.set("a", &1, None).await.unwrap();
    cache.set("b", &2, None).await.unwrap();

    assert_eq!(
        cache.call("DBSIZE", Vec::<&str>::new()).await.unwrap(),
        Reply::Int(2)
    );
}

// == Live Redis ==
// Run with `cargo test -- --ignored` against a server at CACHE_HOST:CACHE_PORT.

#[tokio::test]
#[ignore]
async fn test_redis_roundtrip() {
    let cache = Cache::connect(&Config::from_env()).await.unwrap();
    let key = pack(["smartcache", "it", "roundtrip"]);

    assert!(cache.set(&key, &vec![1, 2, 3], Some(30)).await.unwrap());
    assert_eq!(
        cache.get::<Vec<i32>>(&key).await.unwrap(),
        Some(Decoded::Value(vec![1, 2, 3]))
    );
    assert_eq!(cache.ttl(&key).await.unwrap(), KeyTtl::Expires(30));
    assert!(cache.delete(&key).await.unwrap());
}

#[tokio::test]
#[ignore]
async fn test_redis_list_and_gateway() {
    let cache = Cache::connect(&Config::from_env()).await.unwrap();
    let key = pack(["smartcache", "it", "list"]);
    cache.delete(&key).await.unwrap();

    cache.push_left(&key, [1, 2, 3], Some(30)).await.unwrap();
    assert_eq!(cache.size(&key).await.unwrap(), 3);
    assert_eq!(cache.call("LLEN", [key.as_str()]).await.unwrap(), Reply::Int(3));
    assert_eq!(cache.pop_left::<i32>(&key).await.unwrap(), Some(Decoded::Value(3)));
    assert!(matches!(
        cache.call("NOSUCHCOMMAND", [key.as_str()]).await,
        Err(CacheError::UnsupportedOperation(_))
    ));

    cache.delete(&key).await.unwrap();
}
