//! StorageClient port - object storage backend（署名付き URL の発行）
//!
//! bucket path を直接取得可能な URL に変換するのはバックエンドの責務です。
//! このクレートは結果をキャッシュせず、呼ばれるたびにそのまま委譲します。

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::{BucketPath, ResolvedUrl};

/// StorageClient は bucket path に対する署名付き URL を発行
///
/// # 失敗
/// 認証切れ、オブジェクトなし、ネットワーク障害など。
/// エラーは呼び出し側へそのまま転送されます（リトライしない）。
#[async_trait]
pub trait StorageClient: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn signed_url(&self, path: &BucketPath) -> Result<ResolvedUrl, Self::Error>;
}

#[async_trait]
impl<S: StorageClient + ?Sized> StorageClient for Arc<S> {
    type Error = S::Error;

    async fn signed_url(&self, path: &BucketPath) -> Result<ResolvedUrl, Self::Error> {
        (**self).signed_url(path).await
    }
}
