//! AppBuilder - アプリケーションの構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - GlacierClient を 1 つ作り、各コンポーネントに注入する

use std::sync::Arc;

use super::client::GlacierClient;
use super::deleter::BulkArchiveDeleter;
use super::monitor::FleetMonitor;
use super::orchestrator::VaultDeletionOrchestrator;
use super::waiter::JobWaiter;
use crate::config::GlacierConfig;
use crate::domain::ConfigError;
use crate::impls::AwsGlacierService;
use crate::ports::GlacierService;

/// AppBuilder はアプリケーションを構築
///
/// # 使用例
/// ```ignore
/// let app = AppBuilder::new(config)
///     .service(Arc::new(InMemoryGlacier::new()))
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - build() 時に設定を検証する
/// - サービスが未設定なら BuildError を返す
pub struct AppBuilder {
    config: GlacierConfig,
    service: Option<Arc<dyn GlacierService>>,
}

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("No Glacier service configured. Call service() or connect_aws() before build().")]
    MissingService,
}

impl AppBuilder {
    pub fn new(config: GlacierConfig) -> Self {
        Self {
            config,
            service: None,
        }
    }

    /// 任意の GlacierService を差し込む（テスト・デモ用）
    pub fn service(mut self, service: Arc<dyn GlacierService>) -> Self {
        self.service = Some(service);
        self
    }

    /// AWS SDK の設定を読み込み、本物の Glacier に接続
    pub async fn connect_aws(mut self) -> Result<Self, BuildError> {
        self.config.validate()?;
        let service = AwsGlacierService::connect(&self.config).await;
        self.service = Some(Arc::new(service));
        Ok(self)
    }

    /// AppBuilder を構築して App を生成
    ///
    /// # 検証
    /// - GlacierConfig::validate()
    /// - サービスが設定されていること
    pub fn build(self) -> Result<App, BuildError> {
        self.config.validate()?;
        let service = self.service.ok_or(BuildError::MissingService)?;

        let client = GlacierClient::new(service);
        let deleter = Arc::new(BulkArchiveDeleter::new(
            client.clone(),
            self.config.max_parallelism,
        ));
        let waiter = Arc::new(JobWaiter::new(
            client.clone(),
            deleter.clone(),
            self.config.poll_interval,
        ));
        let monitor = FleetMonitor::new(client.clone(), self.config.poll_interval);
        let orchestrator =
            VaultDeletionOrchestrator::new(client.clone(), deleter.clone(), waiter.clone());

        Ok(App {
            config: self.config,
            client,
            deleter,
            waiter,
            monitor,
            orchestrator,
        })
    }
}

/// App は組み立て済みのコンポーネント一式
pub struct App {
    pub config: GlacierConfig,
    pub client: GlacierClient,
    pub deleter: Arc<BulkArchiveDeleter>,
    pub waiter: Arc<JobWaiter>,
    pub monitor: FleetMonitor,
    pub orchestrator: VaultDeletionOrchestrator,
}
