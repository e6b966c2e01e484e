//! Errors - fetch 経路のエラー
//!
//! resolution の失敗も download の失敗も、同じ `BoxError` でそのまま呼び出し側へ渡します。
//! 区別したい場合は具体的なエラー型へ downcast します。

/// Error channel shared by both fetch conventions.
///
/// Holds the collaborator's own error unchanged (storage client or downloader).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The downloader dropped its completion callback without calling it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("downloader dropped its completion without reporting a result for {url}")]
pub struct CompletionDropped {
    pub url: String,
}
