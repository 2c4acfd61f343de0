//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」。外部システム（Glacier、端末の進捗表示）
//! へのインターフェースを提供し、実装の詳細を隠蔽します。

pub mod glacier;
pub mod progress;

pub use self::glacier::GlacierService;
pub use self::progress::{DeleteProgress, NoopProgress};
