//! InMemoryStorageClient - 開発用の storage backend
//!
//! # 実装詳細
//! - 存在するオブジェクトのキー集合を Mutex で保持（await を跨いでロックしない）
//! - 署名付き URL: `{base}/object/sign/{key}?token=...&expires=...`
//! - token は呼び出しごとにランダム、有効期限は Clock + TTL
//! - 呼び出し回数を数える（重複排除がないことの確認用）

use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

use crate::domain::{BucketPath, ResolvedUrl};
use crate::ports::{Clock, StorageClient, SystemClock};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("object not found: {key}")]
    ObjectNotFound { key: String },

    #[error("storage credentials are not valid")]
    Unauthorized,

    #[error("base url cannot hold a path: {0}")]
    InvalidBaseUrl(String),
}

/// Storage backend kept entirely in memory.
pub struct InMemoryStorageClient<C = SystemClock> {
    base_url: Url,
    ttl: ChronoDuration,
    clock: C,
    latency: Option<Duration>,
    objects: Mutex<HashSet<String>>,
    authorized: AtomicBool,
    sign_calls: AtomicUsize,
}

impl InMemoryStorageClient<SystemClock> {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            ttl: ChronoDuration::hours(1),
            clock: SystemClock,
            latency: None,
            objects: Mutex::new(HashSet::new()),
            authorized: AtomicBool::new(true),
            sign_calls: AtomicUsize::new(0),
        }
    }
}

impl<C: Clock> InMemoryStorageClient<C> {
    /// Swap the clock used for expiry timestamps.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> InMemoryStorageClient<C2> {
        InMemoryStorageClient {
            base_url: self.base_url,
            ttl: self.ttl,
            clock,
            latency: self.latency,
            objects: self.objects,
            authorized: self.authorized,
            sign_calls: self.sign_calls,
        }
    }

    pub fn with_ttl(mut self, ttl: ChronoDuration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Delay every signing call (makes overlapping calls observable).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Register an object key. Returns `false` for malformed keys.
    pub fn insert_object(&self, key: &str) -> bool {
        let Some(path) = BucketPath::parse(key) else {
            return false;
        };
        self.lock_objects().insert(path.key().to_string());
        true
    }

    /// Make every following signing call fail with `Unauthorized`.
    pub fn revoke_credentials(&self) {
        self.authorized.store(false, Ordering::SeqCst);
    }

    pub fn restore_credentials(&self) {
        self.authorized.store(true, Ordering::SeqCst);
    }

    /// Number of `signed_url` calls so far (including failed ones).
    pub fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }

    /// Path component every signed URL for `path` will have.
    pub fn signed_path(&self, path: &BucketPath) -> String {
        self.unsigned_url(path)
            .map(|url| url.path().to_string())
            .unwrap_or_default()
    }

    fn unsigned_url(&self, path: &BucketPath) -> Result<Url, StorageError> {
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.path_segments_mut()
            .map_err(|_| StorageError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["object", "sign"])
            .extend(path.key().split('/'));
        Ok(url)
    }

    fn lock_objects(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.objects.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl<C: Clock> StorageClient for InMemoryStorageClient<C> {
    type Error = StorageError;

    async fn signed_url(&self, path: &BucketPath) -> Result<ResolvedUrl, StorageError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if !self.authorized.load(Ordering::SeqCst) {
            return Err(StorageError::Unauthorized);
        }
        if !self.lock_objects().contains(path.key()) {
            return Err(StorageError::ObjectNotFound {
                key: path.key().to_string(),
            });
        }

        let expires_at = self.clock.now() + self.ttl;
        let token = format!("{:016x}", rand::random::<u64>());
        let mut url = self.unsigned_url(path)?;
        url.query_pairs_mut()
            .append_pair("token", &token)
            .append_pair("expires", &expires_at.timestamp().to_string());

        Ok(ResolvedUrl::expiring(url, expires_at))
    }
}
