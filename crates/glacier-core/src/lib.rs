//! glacier-core
//!
//! Building blocks for sweeping Amazon S3 Glacier vaults.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, vault, job, inventory, action, errors）
//! - **ports**: 抽象化レイヤー（GlacierService, DeleteProgress）
//! - **impls**: 実装（AWS SDK 版と、テスト・デモ用の InMemoryGlacier）
//! - **classifier**: ジョブの分類（純粋関数）
//! - **app**: アプリケーションロジック（builder, deleter, waiter, monitor, orchestrator）
//! - **config**: 環境変数とコマンドライン引数からの設定

pub mod app;
pub mod classifier;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{App, AppBuilder, BuildError};
pub use config::{ConfigSource, GlacierConfig};
pub use domain::GlacierError;
