//! Downloader port - 画像のダウンロードとデコード
//!
//! 実際の HTTP 取得、デコード、メモリ/ディスクキャッシュは外部の downloader が担当します。
//! API は completion callback 方式（1 回だけ呼ばれる契約）です。
//!
//! # 注意
//! `Completion` は `FnMut` なので、実装が契約を破って複数回呼ぶこともありえます。
//! core 側（`app::bridge`）は最初の 1 回だけを採用します。

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Completion callback handed to a downloader.
pub type Completion<T, E> = Box<dyn FnMut(Result<T, E>) + Send + 'static>;

/// Successful download: the decoded image plus the bytes it was decoded from.
#[derive(Debug, Clone)]
pub struct DownloadResult<I> {
    pub image: I,
    pub original_data: Bytes,
    pub url: Url,
}

/// Options passed verbatim to the downloader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadOptions {
    /// Give up after this many seconds (`None`: downloader default).
    pub timeout_secs: Option<u64>,

    /// Accepted `Content-Type`s. Empty means anything.
    pub accept_content_types: Vec<String>,

    /// Let the downloader keep the bytes in its disk cache.
    pub cache_to_disk: bool,
}

impl DownloadOptions {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Does `content_type` pass the accept list?
    pub fn accepts(&self, content_type: &str) -> bool {
        self.accept_content_types.is_empty()
            || self
                .accept_content_types
                .iter()
                .any(|accepted| accepted.eq_ignore_ascii_case(content_type))
    }
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            accept_content_types: Vec::new(),
            cache_to_disk: true,
        }
    }
}

/// Downloader は URL から画像を取得し、completion で結果を返す
///
/// `download` はすぐに返り、結果は別のタイミングで completion に届きます。
pub trait Downloader: Send + Sync {
    /// Decoded image type produced by this downloader.
    type Image: Send + 'static;
    type Error: std::error::Error + Send + Sync + 'static;

    fn download(
        &self,
        url: &Url,
        options: &DownloadOptions,
        completion: Completion<DownloadResult<Self::Image>, Self::Error>,
    );
}

impl<D: Downloader + ?Sized> Downloader for Arc<D> {
    type Image = D::Image;
    type Error = D::Error;

    fn download(
        &self,
        url: &Url,
        options: &DownloadOptions,
        completion: Completion<DownloadResult<Self::Image>, Self::Error>,
    ) {
        (**self).download(url, options, completion)
    }
}
