//! BucketPath - object storage 上のオブジェクトを指すパス
//!
//! # 構文
//! - `bucket/object/key` の形（最低 2 セグメント）
//! - 先頭と末尾の `/` は 1 つだけ取り除く
//! - bucket: `[a-z0-9][a-z0-9._-]*`
//! - object: ASCII 英数字と `- _ . ~ @ + =`、`.` / `..` セグメントは不可
//!
//! 正規化済みのキー（`key()`）は cache identity としてそのまま使われます。

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A validated path to an object inside a storage bucket.
///
/// Holds the canonical key only; `bucket()` and `object()` are views into it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketPath {
    key: String,
    bucket_len: usize,
}

impl BucketPath {
    /// Parse a raw key. Returns `None` when the string is not a well-formed bucket path.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.strip_prefix('/').unwrap_or(raw);
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);

        let mut segments = trimmed.split('/');
        let bucket = segments.next()?;
        if !is_valid_bucket(bucket) {
            return None;
        }

        let mut object_segments = 0usize;
        for segment in segments {
            if !is_valid_object_segment(segment) {
                return None;
            }
            object_segments += 1;
        }
        if object_segments == 0 {
            return None;
        }

        Some(Self {
            key: trimmed.to_string(),
            bucket_len: bucket.len(),
        })
    }

    /// Build a path from a bucket and an object key.
    pub fn new(bucket: &str, object: &str) -> Option<Self> {
        Self::parse(&format!("{bucket}/{object}"))
    }

    /// Canonical key (`bucket/object/key`).
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn bucket(&self) -> &str {
        &self.key[..self.bucket_len]
    }

    /// Object key inside the bucket (everything after the first `/`).
    pub fn object(&self) -> &str {
        &self.key[self.bucket_len + 1..]
    }
}

fn is_valid_bucket(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c.is_ascii_digit() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-'))
}

fn is_valid_object_segment(segment: &str) -> bool {
    if segment.is_empty() || segment == "." || segment == ".." {
        return false;
    }
    segment
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~' | '@' | '+' | '='))
}

impl fmt::Display for BucketPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

// 永続化では key 文字列だけを持つ（デシリアライズ時に再検証する）
impl Serialize for BucketPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.key)
    }
}

impl<'de> Deserialize<'de> for BucketPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        BucketPath::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid bucket path: {raw}")))
    }
}
