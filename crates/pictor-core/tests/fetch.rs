use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use pictor_core::app::resolve;
use pictor_core::impls::{InMemoryDownloader, InMemoryStorageClient, StorageError};
use pictor_core::{BucketPath, ProviderBuilder, Reference};
use tokio::sync::mpsc;
use url::Url;

const AVATAR: &[u8] = b"\x89PNG avatar";

fn setup() -> (Arc<InMemoryStorageClient>, Arc<InMemoryDownloader>) {
    let storage = InMemoryStorageClient::new(Url::parse("https://storage.example.com").unwrap())
        .with_latency(Duration::from_millis(50));
    storage.insert_object("avatars/42.png");

    let downloader = InMemoryDownloader::new();
    let signed = storage.signed_path(&BucketPath::parse("avatars/42.png").unwrap());
    downloader.insert(&signed, Bytes::from_static(AVATAR), "image/png");
    downloader.insert("/a/b.png", Bytes::from_static(b"cdn"), "image/png");

    (Arc::new(storage), Arc::new(downloader))
}

#[tokio::test]
async fn direct_url_scenario() {
    let (storage, _) = setup();
    let reference = Reference::parse("https://cdn.example.com/a/b.png").unwrap();

    assert!(matches!(reference, Reference::Direct(_)));
    assert_eq!(reference.cache_identity().as_str(), "/a/b.png");

    let resolved = resolve(&reference, &*storage).await.unwrap();
    assert_eq!(resolved.url().as_str(), "https://cdn.example.com/a/b.png");
    assert_eq!(storage.sign_calls(), 0);
}

#[tokio::test]
async fn bucket_path_scenario() {
    let (storage, _) = setup();
    let reference = Reference::parse("avatars/42.png").unwrap();

    assert!(reference.is_stored());
    assert_eq!(reference.cache_identity().as_str(), "avatars/42.png");

    let resolved = resolve(&reference, &*storage).await.unwrap();
    assert_eq!(storage.sign_calls(), 1);
    assert_eq!(resolved.url().path(), "/object/sign/avatars/42.png");
}

#[test]
fn garbage_scenario() {
    assert_eq!(Reference::parse("not a valid anything!!"), None);
}

#[tokio::test]
async fn identity_is_stable_across_signed_urls() {
    let (storage, downloader) = setup();
    let provider = ProviderBuilder::new()
        .storage(storage.clone())
        .downloader(downloader)
        .build_for_raw("avatars/42.png")
        .unwrap();

    let before = provider.cache_identity().clone();
    let first = resolve(provider.reference(), &*storage).await.unwrap();
    let second = resolve(provider.reference(), &*storage).await.unwrap();

    assert_ne!(first.url(), second.url());
    assert_eq!(provider.cache_identity(), &before);
    assert_eq!(provider.reference().cache_identity(), before);
}

#[tokio::test]
async fn concurrent_fetches_are_not_deduplicated() {
    let (storage, downloader) = setup();
    let provider = ProviderBuilder::new()
        .storage(storage.clone())
        .downloader(downloader.clone())
        .build_for_raw("avatars/42.png")
        .unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    for _ in 0..2 {
        let tx = tx.clone();
        provider.fetch_data(move |result| {
            let _ = tx.send(result);
        });
    }
    drop(tx);

    let mut delivered = Vec::new();
    while let Some(result) = rx.recv().await {
        delivered.push(result.unwrap());
    }

    assert_eq!(delivered.len(), 2);
    assert!(delivered.iter().all(|bytes| bytes.as_ref() == AVATAR));
    assert_eq!(storage.sign_calls(), 2);
    assert_eq!(downloader.downloads(), 2);
}

#[tokio::test]
async fn signing_failure_reaches_both_conventions() {
    let (storage, downloader) = setup();
    storage.revoke_credentials();
    let provider = ProviderBuilder::new()
        .storage(storage.clone())
        .downloader(downloader.clone())
        .build_for_raw("avatars/42.png")
        .unwrap();

    let err = provider.fetch_image().await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<StorageError>(),
        Some(StorageError::Unauthorized)
    ));

    let (tx, mut rx) = mpsc::unbounded_channel();
    provider.fetch_data(move |result| {
        let _ = tx.send(result);
    });
    let results: Vec<_> = {
        let mut results = Vec::new();
        while let Some(result) = rx.recv().await {
            results.push(result);
        }
        results
    };

    assert_eq!(results.len(), 1);
    assert!(results[0].is_err());
    assert_eq!(downloader.downloads(), 0);
}
