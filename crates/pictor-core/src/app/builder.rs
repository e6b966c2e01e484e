//! ProviderBuilder - ReferenceProvider の構築とワイヤリング
//!
//! # Fail-fast 設計
//! - storage / downloader が未設定なら build 時に `BuildError`
//! - 生文字列から作る場合、参照として解釈できなければ `UnrecognizedReference`

use std::sync::Arc;

use super::config::ProviderConfig;
use super::provider::ReferenceProvider;
use crate::domain::Reference;
use crate::ports::{DownloadOptions, Downloader, StorageClient};

/// ProviderBuilder は storage client と downloader を一度だけ設定し、
/// 参照ごとに `ReferenceProvider` を作る
///
/// # 使用例
/// ```ignore
/// let builder = ProviderBuilder::new()
///     .storage(storage)
///     .downloader(downloader)
///     .config(&config);
/// let provider = builder.build_for_raw("avatars/42.png")?;
/// ```
pub struct ProviderBuilder<S, D> {
    storage: Option<Arc<S>>,
    downloader: Option<Arc<D>>,
    options: DownloadOptions,
}

/// BuildError は provider 構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("storage client is not configured")]
    MissingStorage,

    #[error("downloader is not configured")]
    MissingDownloader,

    #[error("not a URL or bucket path: {0:?}")]
    UnrecognizedReference(String),
}

impl<S, D> ProviderBuilder<S, D>
where
    S: StorageClient + 'static,
    D: Downloader + 'static,
{
    pub fn new() -> Self {
        Self {
            storage: None,
            downloader: None,
            options: DownloadOptions::default(),
        }
    }

    pub fn storage(mut self, storage: Arc<S>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn downloader(mut self, downloader: Arc<D>) -> Self {
        self.downloader = Some(downloader);
        self
    }

    pub fn options(mut self, options: DownloadOptions) -> Self {
        self.options = options;
        self
    }

    /// Take the download options from a loaded config.
    pub fn config(self, config: &ProviderConfig) -> Self {
        self.options(config.download.clone())
    }

    /// Build a provider for an already-parsed reference.
    ///
    /// The builder can be reused for more references.
    pub fn build_for(&self, reference: Reference) -> Result<ReferenceProvider<S, D>, BuildError> {
        let storage = self.storage.clone().ok_or(BuildError::MissingStorage)?;
        let downloader = self.downloader.clone().ok_or(BuildError::MissingDownloader)?;
        Ok(ReferenceProvider::new(reference, storage, downloader).with_options(self.options.clone()))
    }

    /// Parse `raw` and build a provider for it.
    pub fn build_for_raw(&self, raw: &str) -> Result<ReferenceProvider<S, D>, BuildError> {
        let reference = Reference::parse(raw)
            .ok_or_else(|| BuildError::UnrecognizedReference(raw.to_string()))?;
        self.build_for(reference)
    }
}

impl<S, D> Default for ProviderBuilder<S, D>
where
    S: StorageClient + 'static,
    D: Downloader + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
