//! App - アプリケーション層
//!
//! ports を組み合わせて、参照の解決と取得を実装します。
//!
//! # 主要コンポーネント
//! - **resolve**: Reference → ResolvedUrl
//! - **bridge**: downloader の completion callback → future
//! - **ReferenceProvider**: 公開 API（cache identity / callback fetch / async fetch）
//! - **ProviderBuilder**: 構築とワイヤリング
//! - **ProviderConfig**: JSON 設定

pub mod bridge;
pub mod builder;
pub mod config;
pub mod provider;
pub mod resolver;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, ProviderBuilder};
pub use self::config::{ConfigError, ProviderConfig};
pub use self::provider::ReferenceProvider;
pub use self::resolver::resolve;
