//! Reference - リモート画像への論理的な参照
//!
//! # 二種類の参照
//! - **Direct**: scheme 付きの絶対 URL（そのまま取得できる）
//! - **Stored**: bucket 内のパス（署名付き URL への解決が必要）
//!
//! どちらも cache identity を I/O なしで導出できます。
//! identity は「論理的なリソース」から決まり、解決後の署名付き URL には依存しません。

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use super::bucket_path::BucketPath;

/// A logical pointer to a remote image.
///
/// Closed on purpose: resolution and identity derivation match on it exhaustively.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
    /// Absolute URL with a scheme; fetchable as is.
    Direct(Url),

    /// Object in a storage bucket; needs a signed URL before it can be fetched.
    Stored(BucketPath),
}

impl Reference {
    /// Parse a raw string into a reference.
    ///
    /// A URL with a scheme wins over a bucket path, so ambiguous strings become `Direct`.
    /// Returns `None` when the string is neither, or has surrounding whitespace or
    /// embedded tabs/newlines (`Url::parse` would silently strip those).
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.trim() != raw || raw.contains(['\t', '\n', '\r']) {
            return None;
        }
        if let Ok(url) = Url::parse(raw)
            && !url.scheme().is_empty()
        {
            return Some(Reference::Direct(url));
        }
        BucketPath::parse(raw).map(Reference::Stored)
    }

    /// Stable cache key for this reference. Pure, no I/O.
    ///
    /// Not namespaced by kind: a cannot-be-a-base URL such as `x:avatars/42.png` has
    /// the same identity as the bucket path `avatars/42.png`.
    pub fn cache_identity(&self) -> CacheIdentity {
        match self {
            Reference::Direct(url) => CacheIdentity(url.path().to_string()),
            Reference::Stored(path) => CacheIdentity(path.key().to_string()),
        }
    }

    pub fn is_stored(&self) -> bool {
        matches!(self, Reference::Stored(_))
    }

    /// Short label for logs (`direct` / `stored`).
    pub fn kind(&self) -> &'static str {
        match self {
            Reference::Direct(_) => "direct",
            Reference::Stored(_) => "stored",
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Direct(url) => write!(f, "{url}"),
            Reference::Stored(path) => write!(f, "{path}"),
        }
    }
}

impl From<RemoteFile> for Reference {
    fn from(remote_file: RemoteFile) -> Self {
        match remote_file {
            RemoteFile::Url(url) => Reference::Direct(url),
            RemoteFile::Storage(path) => Reference::Stored(path),
        }
    }
}

/// Already-typed remote file, as stored by other layers (e.g. in a JSON column).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RemoteFile {
    Url(Url),
    Storage(BucketPath),
}

/// Cache key derived from a [`Reference`].
///
/// Never built from a resolved (signed) URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheIdentity(String);

impl CacheIdentity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
