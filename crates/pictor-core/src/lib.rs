//! pictor-core
//!
//! Remote image references: parse, derive a cache identity, resolve, fetch.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（Reference, BucketPath, CacheIdentity, ResolvedUrl, FetchPhase）
//! - **ports**: 抽象化レイヤー（StorageClient, Downloader, Clock）
//! - **app**: アプリケーションロジック（resolve, bridge, ReferenceProvider, ProviderBuilder, config）
//! - **impls**: 実装（InMemoryStorageClient, InMemoryDownloader など開発用）

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{ProviderBuilder, ProviderConfig, ReferenceProvider};
pub use domain::{BoxError, BucketPath, CacheIdentity, Reference, RemoteFile, ResolvedUrl};
