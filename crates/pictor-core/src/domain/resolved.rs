//! ResolvedUrl - 取得可能な URL（毎回新しく作られ、キャッシュされない）

use chrono::{DateTime, Utc};
use std::fmt;
use url::Url;

/// A URL that can be fetched right now.
///
/// Produced fresh on every resolution and dropped after the fetch that used it.
/// Signed URLs from a storage backend carry their expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUrl {
    url: Url,
    expires_at: Option<DateTime<Utc>>,
}

impl ResolvedUrl {
    /// URL that does not expire.
    pub fn permanent(url: Url) -> Self {
        Self {
            url,
            expires_at: None,
        }
    }

    /// Time-limited URL (e.g. a signed URL).
    pub fn expiring(url: Url, expires_at: DateTime<Utc>) -> Self {
        Self {
            url,
            expires_at: Some(expires_at),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Has the URL expired at `now`? Permanent URLs never do.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

impl fmt::Display for ResolvedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}
