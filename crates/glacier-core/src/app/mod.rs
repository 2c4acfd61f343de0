//! App - アプリケーション層
//!
//! ports を組み合わせて vault 掃除の手順を実装します。
//!
//! # 主要コンポーネント
//! - **AppBuilder**: 設定の検証とワイヤリング
//! - **GlacierClient**: GlacierService の薄いラッパー（ログ付き）
//! - **BulkArchiveDeleter**: 上限付き並列でのアーカイブ削除
//! - **JobWaiter**: 1 つのジョブの完了待ち
//! - **FleetMonitor**: 全 vault の未完了インベントリジョブの監視
//! - **VaultDeletionOrchestrator**: precheck → vault 削除

pub mod builder;
pub mod client;
pub mod deleter;
pub mod monitor;
pub mod orchestrator;
pub mod waiter;

// 主要な型を再エクスポート
pub use self::builder::{App, AppBuilder, BuildError};
pub use self::client::GlacierClient;
pub use self::deleter::{ArchiveFailure, BulkArchiveDeleter, DeleteSummary};
pub use self::monitor::{FleetMonitor, FleetSnapshot, MonitorReport, MonitorStop, WatchedJob};
pub use self::orchestrator::{Precheck, VaultDeletion, VaultDeletionOrchestrator, VaultDeletionReport};
pub use self::waiter::{Consumption, JobWaiter, WaitOutcome};
