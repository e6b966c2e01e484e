//! Resolver - Reference を取得可能な URL に変換
//!
//! - Direct: そのまま返す（バックエンド呼び出しなし、失敗しない）
//! - Stored: StorageClient に署名付き URL を毎回問い合わせる
//!
//! 署名付き URL はキャッシュしません。取得のたびに新しい URL を発行します。

use tracing::debug;

use crate::domain::{Reference, ResolvedUrl};
use crate::ports::StorageClient;

/// Resolve a reference into a URL that can be fetched now.
///
/// Backend errors are returned unchanged.
pub async fn resolve<S>(reference: &Reference, storage: &S) -> Result<ResolvedUrl, S::Error>
where
    S: StorageClient + ?Sized,
{
    match reference {
        Reference::Direct(url) => Ok(ResolvedUrl::permanent(url.clone())),
        Reference::Stored(path) => {
            debug!(path = %path, "requesting signed url");
            storage.signed_url(path).await
        }
    }
}
