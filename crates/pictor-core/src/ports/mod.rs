//! Ports - 外部コラボレーターへの抽象化レイヤー
//!
//! 各 trait は外部システム（object storage, 画像 downloader など）への
//! インターフェースを提供し、実装の詳細を隠蔽します。
//! 開発/テスト用の実装は `impls` にあります。

pub mod clock;
pub mod downloader;
pub mod storage_client;

// 主要な trait を再エクスポート
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::downloader::{Completion, DownloadOptions, DownloadResult, Downloader};
pub use self::storage_client::StorageClient;
