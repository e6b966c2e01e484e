//! ReferenceProvider - Reference と外部コラボレーターを束ねる
//!
//! # 公開 API
//! - `cache_identity()`: I/O なしで即座に返る cache key
//! - `fetch_data(handler)`: callback 方式（バックグラウンドタスクで実行）
//! - `fetch_image()`: async 方式
//!
//! どちらも同じ resolve → download パイプライン（`FetchRun`）を通ります。
//! 呼び出しごとに新しい `FetchRun` を作るので、同じ参照への同時 fetch も
//! それぞれ独立に署名・ダウンロードします（重複排除はしない）。

use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, warn};

use super::bridge;
use super::resolver::resolve;
use crate::domain::{BoxError, CacheIdentity, FetchPhase, Reference};
use crate::ports::{DownloadOptions, DownloadResult, Downloader, StorageClient};

/// Binds one [`Reference`] to a storage client and a downloader.
pub struct ReferenceProvider<S, D> {
    reference: Reference,
    identity: CacheIdentity,
    storage: Arc<S>,
    downloader: Arc<D>,
    options: DownloadOptions,
}

impl<S, D> ReferenceProvider<S, D>
where
    S: StorageClient + 'static,
    D: Downloader + 'static,
{
    pub fn new(reference: Reference, storage: Arc<S>, downloader: Arc<D>) -> Self {
        let identity = reference.cache_identity();
        Self {
            reference,
            identity,
            storage,
            downloader,
            options: DownloadOptions::default(),
        }
    }

    pub fn with_options(mut self, options: DownloadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn reference(&self) -> &Reference {
        &self.reference
    }

    /// Cache key for downstream caches. Available before any fetch.
    pub fn cache_identity(&self) -> &CacheIdentity {
        &self.identity
    }

    pub fn options(&self) -> &DownloadOptions {
        &self.options
    }

    /// Fetch the raw bytes and hand them to `handler`.
    ///
    /// Returns immediately. The work runs on a detached tokio task that the caller
    /// cannot cancel; its only observable effect is the single `handler` call, with
    /// either the bytes or the first error (resolution or download).
    ///
    /// Must be called from within a tokio runtime.
    pub fn fetch_data<F>(&self, handler: F)
    where
        F: FnOnce(Result<Bytes, BoxError>) + Send + 'static,
    {
        let run = self.run();
        tokio::spawn(async move {
            let result = run.execute().await.map(|downloaded| downloaded.original_data);
            handler(result);
        });
    }

    /// Fetch and return the decoded image.
    ///
    /// Fails with the first error encountered; a resolution failure means no download
    /// is attempted.
    pub async fn fetch_image(&self) -> Result<D::Image, BoxError> {
        self.run()
            .execute()
            .await
            .map(|downloaded| downloaded.image)
    }

    fn run(&self) -> FetchRun<S, D> {
        FetchRun {
            reference: self.reference.clone(),
            identity: self.identity.clone(),
            storage: Arc::clone(&self.storage),
            downloader: Arc::clone(&self.downloader),
            options: self.options.clone(),
            phase: FetchPhase::Idle,
        }
    }
}

/// One fetch call: Idle -> Resolving -> Downloading -> Completed/Failed.
struct FetchRun<S, D> {
    reference: Reference,
    identity: CacheIdentity,
    storage: Arc<S>,
    downloader: Arc<D>,
    options: DownloadOptions,
    phase: FetchPhase,
}

impl<S, D> FetchRun<S, D>
where
    S: StorageClient + 'static,
    D: Downloader + 'static,
{
    async fn execute(mut self) -> Result<DownloadResult<D::Image>, BoxError> {
        self.enter(FetchPhase::Resolving);
        let resolved = match resolve(&self.reference, &*self.storage).await {
            Ok(resolved) => resolved,
            Err(err) => return Err(self.fail(Box::new(err))),
        };

        self.enter(FetchPhase::Downloading);
        match bridge::download(&*self.downloader, resolved.url(), &self.options).await {
            Ok(downloaded) => {
                self.enter(FetchPhase::Completed);
                Ok(downloaded)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    fn enter(&mut self, next: FetchPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "illegal fetch transition {} -> {}",
            self.phase,
            next
        );
        debug!(
            identity = %self.identity,
            kind = self.reference.kind(),
            from = %self.phase,
            to = %next,
            "fetch phase"
        );
        self.phase = next;
    }

    fn fail(&mut self, err: BoxError) -> BoxError {
        warn!(identity = %self.identity, phase = %self.phase, error = %err, "fetch failed");
        self.enter(FetchPhase::Failed);
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BucketPath, CompletionDropped};
    use crate::impls::{
        DownloadError, InMemoryDownloader, InMemoryStorageClient, StorageError, StoredImage,
    };
    use tokio::sync::mpsc;
    use url::Url;

    const PNG: &[u8] = b"\x89PNG fake";

    fn storage() -> Arc<InMemoryStorageClient> {
        let storage = InMemoryStorageClient::new(Url::parse("https://storage.example.com").unwrap());
        storage.insert_object("avatars/42.png");
        Arc::new(storage)
    }

    fn bucket(raw: &str) -> BucketPath {
        BucketPath::parse(raw).unwrap()
    }

    fn provider(
        raw: &str,
        storage: Arc<InMemoryStorageClient>,
        downloader: Arc<InMemoryDownloader>,
    ) -> ReferenceProvider<InMemoryStorageClient, InMemoryDownloader> {
        ReferenceProvider::new(Reference::parse(raw).unwrap(), storage, downloader)
    }

    #[tokio::test]
    async fn identity_is_available_without_io() {
        let storage = storage();
        let downloader = Arc::new(InMemoryDownloader::new());
        let provider = provider("avatars/42.png", storage.clone(), downloader.clone());

        assert_eq!(provider.cache_identity().as_str(), "avatars/42.png");
        assert_eq!(storage.sign_calls(), 0);
        assert_eq!(downloader.downloads(), 0);
    }

    #[tokio::test]
    async fn fetch_image_for_direct_reference() {
        let storage = storage();
        let downloader = Arc::new(InMemoryDownloader::new());
        downloader.insert("/a/b.png", Bytes::from_static(PNG), "image/png");
        let provider = provider("https://cdn.example.com/a/b.png", storage.clone(), downloader);

        let image: StoredImage = provider.fetch_image().await.unwrap();

        assert_eq!(image.bytes.as_ref(), PNG);
        assert_eq!(image.content_type, "image/png");
        assert_eq!(storage.sign_calls(), 0);
    }

    #[tokio::test]
    async fn fetch_image_for_stored_reference_signs_first() {
        let storage = storage();
        let downloader = Arc::new(InMemoryDownloader::new());
        let path = storage.signed_path(&bucket("avatars/42.png"));
        downloader.insert(&path, Bytes::from_static(PNG), "image/png");
        let provider = provider("avatars/42.png", storage.clone(), downloader.clone());

        let image = provider.fetch_image().await.unwrap();

        assert_eq!(image.bytes.as_ref(), PNG);
        assert_eq!(storage.sign_calls(), 1);
        assert_eq!(downloader.downloads(), 1);
    }

    #[tokio::test]
    async fn signing_failure_skips_download() {
        let storage = storage();
        storage.revoke_credentials();
        let downloader = Arc::new(InMemoryDownloader::new());
        let provider = provider("avatars/42.png", storage, downloader.clone());

        let err = provider.fetch_image().await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<StorageError>(),
            Some(StorageError::Unauthorized)
        ));
        assert_eq!(downloader.downloads(), 0);
    }

    #[tokio::test]
    async fn download_failure_is_forwarded() {
        let downloader = Arc::new(InMemoryDownloader::new());
        let provider = provider("https://cdn.example.com/missing.png", storage(), downloader);

        let err = provider.fetch_image().await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DownloadError>(),
            Some(DownloadError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn options_reach_the_downloader() {
        let downloader = Arc::new(InMemoryDownloader::new());
        downloader.insert("/a.gif", Bytes::from_static(b"GIF89a"), "image/gif");
        let provider = provider("https://cdn.example.com/a.gif", storage(), downloader)
            .with_options(DownloadOptions {
                accept_content_types: vec!["image/png".to_string()],
                ..DownloadOptions::default()
            });

        let err = provider.fetch_image().await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DownloadError>(),
            Some(DownloadError::ContentTypeRejected { .. })
        ));
    }

    #[tokio::test]
    async fn repeated_completion_resumes_once() {
        let downloader = Arc::new(InMemoryDownloader::new());
        downloader.insert("/a.png", Bytes::from_static(PNG), "image/png");
        downloader.repeat_completion(3);
        let provider = provider("https://cdn.example.com/a.png", storage(), downloader);

        let image = provider.fetch_image().await.unwrap();
        assert_eq!(image.bytes.as_ref(), PNG);
    }

    #[tokio::test]
    async fn dropped_completion_fails_instead_of_hanging() {
        let downloader = Arc::new(InMemoryDownloader::new());
        downloader.insert("/a.png", Bytes::from_static(PNG), "image/png");
        downloader.drop_completion();
        let provider = provider("https://cdn.example.com/a.png", storage(), downloader);

        let err = provider.fetch_image().await.unwrap_err();
        assert!(err.downcast_ref::<CompletionDropped>().is_some());
    }

    #[tokio::test]
    async fn fetch_data_calls_handler_once_with_bytes() {
        let storage = storage();
        let downloader = Arc::new(InMemoryDownloader::new());
        let path = storage.signed_path(&bucket("avatars/42.png"));
        downloader.insert(&path, Bytes::from_static(PNG), "image/png");
        downloader.repeat_completion(2);
        let provider = provider("avatars/42.png", storage, downloader);

        let (tx, mut rx) = mpsc::unbounded_channel();
        provider.fetch_data(move |result| {
            let _ = tx.send(result);
        });

        let bytes = rx.recv().await.unwrap().unwrap();
        assert_eq!(bytes.as_ref(), PNG);
        // handler は FnOnce なので、送信側はここで閉じている
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn fetch_data_reports_signing_failure_once() {
        let storage = storage();
        storage.revoke_credentials();
        let downloader = Arc::new(InMemoryDownloader::new());
        let provider = provider("avatars/42.png", storage, downloader.clone());

        let (tx, mut rx) = mpsc::unbounded_channel();
        provider.fetch_data(move |result| {
            let _ = tx.send(result);
        });

        let err = rx.recv().await.unwrap().unwrap_err();
        assert!(err.downcast_ref::<StorageError>().is_some());
        assert!(rx.recv().await.is_none());
        assert_eq!(downloader.downloads(), 0);
    }

    #[tokio::test]
    async fn fetch_data_reports_download_failure_once() {
        let storage = storage();
        let downloader = Arc::new(InMemoryDownloader::new());
        let provider = provider("https://cdn.example.com/missing.png", storage.clone(), downloader);

        let (tx, mut rx) = mpsc::unbounded_channel();
        provider.fetch_data(move |result| {
            let _ = tx.send(result);
        });

        let err = rx.recv().await.unwrap().unwrap_err();
        assert_eq!(
            err.downcast_ref::<DownloadError>(),
            Some(&DownloadError::NotFound {
                url: "https://cdn.example.com/missing.png".to_string()
            })
        );
        assert!(rx.recv().await.is_none());
        assert_eq!(storage.sign_calls(), 0);
    }
}
