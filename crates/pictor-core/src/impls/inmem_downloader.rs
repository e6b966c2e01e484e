//! InMemoryDownloader - 開発用の downloader
//!
//! URL の path（query は無視）でオブジェクトを引きます。
//! completion は tokio タスクから非同期に呼ばれます。
//!
//! # テスト用の設定
//! - `repeat_completion(n)`: completion を n 回呼ぶ（契約違反の downloader を再現）
//! - `drop_completion()`: completion を呼ばずに捨てる

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

use crate::ports::{Completion, DownloadOptions, DownloadResult, Downloader};

/// "Decoded" image: the bytes and their content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub bytes: Bytes,
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DownloadError {
    #[error("no object at {url}")]
    NotFound { url: String },

    #[error("content type {content_type} is not accepted")]
    ContentTypeRejected { content_type: String },

    #[error("download of {url} timed out")]
    TimedOut { url: String },
}

pub struct InMemoryDownloader {
    objects: Mutex<HashMap<String, StoredImage>>,
    latency: Option<Duration>,
    downloads: AtomicUsize,
    completions_per_download: AtomicUsize,
    drop_completion: AtomicBool,
}

impl InMemoryDownloader {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            latency: None,
            downloads: AtomicUsize::new(0),
            completions_per_download: AtomicUsize::new(1),
            drop_completion: AtomicBool::new(false),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Serve `bytes` for every URL whose path is `path`.
    pub fn insert(&self, path: &str, bytes: Bytes, content_type: &str) {
        let image = StoredImage {
            bytes,
            content_type: content_type.to_string(),
        };
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(path.to_string(), image);
    }

    pub fn repeat_completion(&self, times: usize) {
        self.completions_per_download.store(times, Ordering::SeqCst);
    }

    pub fn drop_completion(&self) {
        self.drop_completion.store(true, Ordering::SeqCst);
    }

    /// Number of `download` calls so far.
    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    fn lookup(
        &self,
        url: &Url,
        options: &DownloadOptions,
    ) -> Result<DownloadResult<StoredImage>, DownloadError> {
        if let (Some(latency), Some(timeout)) = (self.latency, options.timeout())
            && latency > timeout
        {
            return Err(DownloadError::TimedOut {
                url: url.to_string(),
            });
        }

        let image = self
            .objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(url.path())
            .cloned()
            .ok_or_else(|| DownloadError::NotFound {
                url: url.to_string(),
            })?;

        if !options.accepts(&image.content_type) {
            return Err(DownloadError::ContentTypeRejected {
                content_type: image.content_type,
            });
        }

        Ok(DownloadResult {
            original_data: image.bytes.clone(),
            image,
            url: url.clone(),
        })
    }
}

impl Default for InMemoryDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl Downloader for InMemoryDownloader {
    type Image = StoredImage;
    type Error = DownloadError;

    fn download(
        &self,
        url: &Url,
        options: &DownloadOptions,
        mut completion: Completion<DownloadResult<StoredImage>, DownloadError>,
    ) {
        self.downloads.fetch_add(1, Ordering::SeqCst);

        let result = self.lookup(url, options);
        // タイムアウト時は timeout 経過で打ち切る
        let latency = match (self.latency, options.timeout()) {
            (Some(latency), Some(timeout)) => Some(latency.min(timeout)),
            (latency, _) => latency,
        };
        let times = self.completions_per_download.load(Ordering::SeqCst);
        let drop_it = self.drop_completion.load(Ordering::SeqCst);

        tokio::spawn(async move {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
            if drop_it {
                drop(completion);
                return;
            }
            for _ in 0..times {
                completion(result.clone());
            }
        });
    }
}
