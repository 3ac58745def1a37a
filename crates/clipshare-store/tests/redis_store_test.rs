//! Live Redis tests for the store adapter and the mutation protocol.
//!
//! Run with a Redis server available:
//!
//! ```bash
//! REDIS_URL=redis://localhost:6379/15 cargo test -p clipshare-store -- --ignored
//! ```

use std::time::Duration;

use clipshare_store::test_fixtures::TestRedis;
use clipshare_store::{
    collection_key, record, Error, KeyTtl, KvStore, NewClipItem, Transaction, TxOutcome,
};

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn test_redis_overlapping_watches_one_winner() {
    dotenvy::dotenv().ok();
    let mut env = TestRedis::connect().await.unwrap();
    let key = "clip:test-overlap";
    env.track(key);
    env.redis.set_with_expiry(key, b"base", 60).await.unwrap();

    let mut first = env.redis.watch(key).await.unwrap();
    let mut second = env.redis.watch(key).await.unwrap();
    assert_eq!(first.get().await.unwrap(), Some(b"base".to_vec()));
    assert_eq!(second.get().await.unwrap(), Some(b"base".to_vec()));

    let a = first
        .execute(
            Transaction::new()
                .set(key, b"first".to_vec())
                .expire(key, Duration::from_secs(60)),
        )
        .await
        .unwrap();
    let b = second
        .execute(
            Transaction::new()
                .set(key, b"second".to_vec())
                .expire(key, Duration::from_secs(60)),
        )
        .await
        .unwrap();

    assert_eq!(a, TxOutcome::Committed);
    assert_eq!(b, TxOutcome::Aborted);
    assert_eq!(env.redis.get(key).await.unwrap(), Some(b"first".to_vec()));

    env.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn test_redis_unwatch_then_commit() {
    dotenvy::dotenv().ok();
    let mut env = TestRedis::connect().await.unwrap();
    let key = "clip:test-unwatch";
    env.track(key);
    env.redis.set_with_expiry(key, b"base", 60).await.unwrap();

    let session = env.redis.watch(key).await.unwrap();
    session.unwatch().await.unwrap();

    let session = env.redis.watch(key).await.unwrap();
    let outcome = session
        .execute(Transaction::new().set(key, b"next".to_vec()))
        .await
        .unwrap();
    assert_eq!(outcome, TxOutcome::Committed);
    assert_eq!(env.redis.ttl(key).await.unwrap(), KeyTtl::NoExpiry);

    env.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn test_redis_share_scenario() {
    dotenvy::dotenv().ok();
    let mut env = TestRedis::connect().await.unwrap();
    let created = env.clips.lifecycle.create().await.unwrap();
    let id = created.id.clone();
    env.track(collection_key(&id));

    let text = env
        .clips
        .collections
        .add_item(&id, NewClipItem::text("hello"))
        .await
        .unwrap();
    let url = env
        .clips
        .collections
        .add_item(&id, NewClipItem::url("http://x.com"))
        .await
        .unwrap();
    assert_eq!(
        env.clips.lifecycle.read(&id).await.unwrap().items,
        vec![url.clone(), text.clone()]
    );

    env.clips.collections.delete_item(&id, &text.id).await.unwrap();
    assert_eq!(env.clips.lifecycle.read(&id).await.unwrap().items, vec![url]);

    let err = env
        .clips
        .collections
        .delete_item(&id, &text.id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ItemNotFound(_)));

    match env.redis.ttl(&collection_key(&id)).await.unwrap() {
        KeyTtl::Expires(left) => {
            assert!(left <= Duration::from_secs(env.clips.lifecycle.ttl_secs()))
        }
        other => panic!("expected an expiry, got {:?}", other),
    }

    env.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn test_redis_corrupted_record() {
    dotenvy::dotenv().ok();
    let mut env = TestRedis::connect().await.unwrap();
    let key = collection_key("test-corrupted");
    env.track(key.clone());
    env.redis
        .set_with_expiry(&key, b"{\"id\":", 60)
        .await
        .unwrap();

    let err = env.clips.lifecycle.read("test-corrupted").await.unwrap_err();
    assert!(matches!(err, Error::Corrupted(_)));
    assert!(record::decode(b"{\"id\":").is_err());

    env.cleanup().await.unwrap();
}
