//! Integration tests for the shared-collection mutation protocol.
//!
//! All tests run against `MemoryStore`, which implements the same
//! watch/transaction semantics as Redis and lets a competing write be placed
//! inside a repository operation's watch window deterministically.

use std::time::Duration;

use clipshare_store::{
    collection_key, record, ClipItemType, ClipStore, Error, KeyTtl, KvStore, MemoryStore,
    NewClipItem, SharedClipCollection,
};

const BASE_URL: &str = "http://localhost:3000";

fn setup() -> (ClipStore, MemoryStore) {
    ClipStore::in_memory(BASE_URL)
}

#[tokio::test]
async fn test_read_after_create_is_empty() {
    let (clips, _) = setup();

    let created = clips.lifecycle.create().await.unwrap();
    let read = clips.lifecycle.read(&created.id).await.unwrap();

    assert_eq!(read.id, created.id);
    assert!(read.items.is_empty());
    assert_eq!(created.url, format!("{}/clip/{}", BASE_URL, created.id));
}

#[tokio::test]
async fn test_serialized_adds_are_newest_first() {
    let (clips, _) = setup();
    let id = clips.lifecycle.create().await.unwrap().id;

    let mut added = Vec::new();
    for n in 0..10 {
        let item = clips
            .collections
            .add_item(&id, NewClipItem::text(format!("item {}", n)))
            .await
            .unwrap();
        added.push(item);
    }

    let read = clips.lifecycle.read(&id).await.unwrap();
    added.reverse();
    assert_eq!(read.items, added);
    assert_eq!(read.items[0].content, "item 9");
}

#[tokio::test]
async fn test_duplicate_content_is_kept() {
    let (clips, _) = setup();
    let id = clips.lifecycle.create().await.unwrap().id;

    for _ in 0..3 {
        clips
            .collections
            .add_item(&id, NewClipItem::text("same"))
            .await
            .unwrap();
    }

    let read = clips.lifecycle.read(&id).await.unwrap();
    assert_eq!(read.items.len(), 3);
}

#[tokio::test]
async fn test_add_to_missing_collection() {
    let (clips, memory) = setup();

    let err = clips
        .collections
        .add_item("missing", NewClipItem::text("hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NotFound(_)));
    assert_eq!(memory.open_watches(), 0);
}

#[tokio::test]
async fn test_delete_nonexistent_item_is_item_not_found() {
    let (clips, _) = setup();
    let id = clips.lifecycle.create().await.unwrap().id;
    clips
        .collections
        .add_item(&id, NewClipItem::text("keep me"))
        .await
        .unwrap();

    let err = clips
        .collections
        .delete_item(&id, "not-an-item")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ItemNotFound(_)));
    assert_eq!(clips.lifecycle.read(&id).await.unwrap().items.len(), 1);
}

#[tokio::test]
async fn test_mutations_on_corrupted_record() {
    let (clips, memory) = setup();
    memory
        .set_with_expiry("clip:garbled", b"not json at all", 60)
        .await
        .unwrap();

    let add = clips
        .collections
        .add_item("garbled", NewClipItem::text("x"))
        .await
        .unwrap_err();
    let delete = clips
        .collections
        .delete_item("garbled", "x")
        .await
        .unwrap_err();

    assert!(matches!(add, Error::Corrupted(_)));
    assert!(matches!(delete, Error::Corrupted(_)));
    assert_eq!(memory.open_watches(), 0);
    // Corrupted records are left untouched
    assert_eq!(
        memory.get("clip:garbled").await.unwrap(),
        Some(b"not json at all".to_vec())
    );
}

#[tokio::test]
async fn test_concurrent_writer_causes_conflict() {
    let (clips, memory) = setup();
    let id = clips.lifecycle.create().await.unwrap().id;
    let key = collection_key(&id);

    // Another client commits its own add inside our watch window
    let mut theirs = clips.lifecycle.read(&id).await.unwrap();
    theirs.prepend(NewClipItem::text("theirs").into_item());
    memory.interleave_write(&key, record::encode(&theirs).unwrap());

    let err = clips
        .collections
        .add_item(&id, NewClipItem::text("mine"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Conflict(_)));
    assert!(err.is_retryable());
    assert_eq!(memory.open_watches(), 0);

    // Their write survives; ours was not applied over it
    let read = clips.lifecycle.read(&id).await.unwrap();
    assert_eq!(read, theirs);
}

#[tokio::test]
async fn test_conflicting_delete_leaves_record_alone() {
    let (clips, memory) = setup();
    let id = clips.lifecycle.create().await.unwrap().id;
    let item = clips
        .collections
        .add_item(&id, NewClipItem::text("target"))
        .await
        .unwrap();

    let mut theirs = clips.lifecycle.read(&id).await.unwrap();
    theirs.prepend(NewClipItem::url("http://x.com").into_item());
    memory.interleave_write(&collection_key(&id), record::encode(&theirs).unwrap());

    let err = clips
        .collections
        .delete_item(&id, &item.id)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Conflict(_)));
    let read = clips.lifecycle.read(&id).await.unwrap();
    assert_eq!(read.items.len(), 2);

    // A retry from scratch succeeds against the new state
    clips.collections.delete_item(&id, &item.id).await.unwrap();
    let read = clips.lifecycle.read(&id).await.unwrap();
    assert_eq!(read.items.len(), 1);
    assert_eq!(read.items[0].item_type, ClipItemType::Url);
}

#[tokio::test]
async fn test_racing_adds_have_at_most_one_winner_per_state() {
    let (clips, memory) = setup();
    let id = clips.lifecycle.create().await.unwrap().id;
    let key = collection_key(&id);

    // Two clients both watch and read the same prior state
    let mut first = memory.watch(&key).await.unwrap();
    let mut second = memory.watch(&key).await.unwrap();
    let base = record::decode(&first.get().await.unwrap().unwrap()).unwrap();
    assert_eq!(
        record::decode(&second.get().await.unwrap().unwrap()).unwrap(),
        base
    );

    let mut a = base.clone();
    a.prepend(NewClipItem::text("a").into_item());
    let mut b = base.clone();
    b.prepend(NewClipItem::text("b").into_item());

    let outcome_a = first
        .execute(clipshare_store::Transaction::new().set(key.clone(), record::encode(&a).unwrap()))
        .await
        .unwrap();
    let outcome_b = second
        .execute(clipshare_store::Transaction::new().set(key.clone(), record::encode(&b).unwrap()))
        .await
        .unwrap();

    assert_eq!(outcome_a, clipshare_store::TxOutcome::Committed);
    assert_eq!(outcome_b, clipshare_store::TxOutcome::Aborted);
    assert_eq!(clips.lifecycle.read(&id).await.unwrap(), a);
}

#[tokio::test]
async fn test_concurrent_adds_conflict_without_losing_commits() {
    let (clips, memory) = setup();
    let id = clips.lifecycle.create().await.unwrap().id;

    let attempts = (0..25).map(|n| {
        let clips = clips.clone();
        let id = id.clone();
        async move {
            clips
                .collections
                .add_item(&id, NewClipItem::text(format!("n{}", n)))
                .await
        }
    });
    let results = futures::future::join_all(attempts).await;

    let committed: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(Error::Conflict(_))))
        .count();
    assert_eq!(committed.len() + conflicts, 25);
    // All 25 watch windows overlap: exactly one writer wins that round
    assert_eq!(committed.len(), 1);
    assert_eq!(conflicts, 24);

    // Every committed item is present; nothing else is
    let read = clips.lifecycle.read(&id).await.unwrap();
    assert_eq!(read.items.len(), committed.len());
    for item in committed {
        assert!(read.items.contains(item));
    }
    assert_eq!(memory.open_watches(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_mutation_never_extends_ttl() {
    let (clips, memory) = setup();
    let clips = clips.with_collection_ttl(600);
    let id = clips.lifecycle.create().await.unwrap().id;
    let key = collection_key(&id);

    tokio::time::advance(Duration::from_secs(100)).await;
    let before = memory.ttl(&key).await.unwrap();
    assert_eq!(before, KeyTtl::Expires(Duration::from_secs(500)));

    let item = clips
        .collections
        .add_item(&id, NewClipItem::text("hello"))
        .await
        .unwrap();
    let after_add = memory.ttl(&key).await.unwrap();
    assert_eq!(after_add, KeyTtl::Expires(Duration::from_secs(500)));

    tokio::time::advance(Duration::from_secs(50)).await;
    clips.collections.delete_item(&id, &item.id).await.unwrap();
    assert_eq!(
        memory.ttl(&key).await.unwrap(),
        KeyTtl::Expires(Duration::from_secs(450))
    );

    // The collection still dies on its original schedule
    tokio::time::advance(Duration::from_secs(450)).await;
    let err = clips.lifecycle.read(&id).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test(start_paused = true)]
async fn test_repeated_mutations_keep_sub_second_lifetime() {
    let (clips, memory) = setup();
    let clips = clips.with_collection_ttl(1);
    let id = clips.lifecycle.create().await.unwrap().id;
    let key = collection_key(&id);

    // 400 ms left; whole-second TTL handling would round this up
    tokio::time::advance(Duration::from_millis(600)).await;
    for n in 0..5 {
        clips
            .collections
            .add_item(&id, NewClipItem::text(format!("n{}", n)))
            .await
            .unwrap();
    }
    assert_eq!(
        memory.ttl(&key).await.unwrap(),
        KeyTtl::Expires(Duration::from_millis(400))
    );

    tokio::time::advance(Duration::from_millis(400)).await;
    let err = clips.lifecycle.read(&id).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_record_without_ttl_stays_without_ttl() {
    let (clips, memory) = setup();
    let record = record::encode(&SharedClipCollection::empty("forever")).unwrap();
    memory.write_raw("clip:forever", record);
    assert_eq!(memory.ttl("clip:forever").await.unwrap(), KeyTtl::NoExpiry);

    clips
        .collections
        .add_item("forever", NewClipItem::text("hello"))
        .await
        .unwrap();

    assert_eq!(memory.ttl("clip:forever").await.unwrap(), KeyTtl::NoExpiry);
}

#[tokio::test]
async fn test_watch_released_on_success() {
    let (clips, memory) = setup();
    let id = clips.lifecycle.create().await.unwrap().id;

    let item = clips
        .collections
        .add_item(&id, NewClipItem::html("hi", "<b>hi</b>"))
        .await
        .unwrap();
    assert_eq!(memory.open_watches(), 0);

    clips.collections.delete_item(&id, &item.id).await.unwrap();
    assert_eq!(memory.open_watches(), 0);
}

#[tokio::test]
async fn test_share_scenario() {
    let (clips, _) = setup();
    let id = clips.lifecycle.create().await.unwrap().id;

    let text = clips
        .collections
        .add_item(&id, NewClipItem::text("hello"))
        .await
        .unwrap();
    assert_eq!(text.item_type, ClipItemType::Text);
    assert_eq!(text.content, "hello");

    let url = clips
        .collections
        .add_item(&id, NewClipItem::url("http://x.com"))
        .await
        .unwrap();

    let read = clips.lifecycle.read(&id).await.unwrap();
    assert_eq!(read.items, vec![url.clone(), text.clone()]);

    clips.collections.delete_item(&id, &text.id).await.unwrap();
    let read = clips.lifecycle.read(&id).await.unwrap();
    assert_eq!(read.items, vec![url]);

    let err = clips
        .collections
        .delete_item(&id, &text.id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ItemNotFound(_)));
}
