//! Impls - 実装（開発用・テスト用）
//!
//! このモジュールには ports の実装を含めます。
//!
//! # 含まれる実装
//! - **InMemoryStorageClient**: 開発用の storage backend（署名付き URL を発行）
//! - **InMemoryDownloader**: 開発用の downloader（path でバイト列を返す）
//!
//! # 本番用実装
//! 本番用の実装（実際の object storage / HTTP downloader）は別クレートに配置します。

pub mod inmem_downloader;
pub mod inmem_storage;

// 主要な型を再エクスポート
pub use self::inmem_downloader::{DownloadError, InMemoryDownloader, StoredImage};
pub use self::inmem_storage::{InMemoryStorageClient, StorageError};
