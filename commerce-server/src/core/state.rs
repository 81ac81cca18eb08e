use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::JwtService;
use crate::cart::CartStore;
use crate::checkout::CheckoutOrchestrator;
use crate::core::{BackgroundTasks, Config, Result, ServerError, TaskKind};
use crate::db::DbService;
use crate::notify::{NotificationEmitter, NotificationSink, NotifyWorker, StoreSink};
use crate::orders::OrderFlow;
use crate::payments::{LocalProofStorage, PaymentLedger, ProofStorage};

/// 服务器状态 - 持有所有服务的共享引用
///
/// 所有字段都是 `Clone` 的轻量句柄（连接池 / Arc），请求处理函数通过
/// `State<ServerState>` 获取。
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | pool | SQLite 连接池 |
/// | jwt_service | JWT 认证服务 |
/// | emitter | 通知 outbox 入队 + 唤醒 |
/// | cart / checkout / orders / payments | 业务服务 |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub pool: SqlitePool,
    pub jwt_service: Arc<JwtService>,
    pub emitter: NotificationEmitter,
    pub cart: CartStore,
    pub checkout: CheckoutOrchestrator,
    pub orders: OrderFlow,
    pub payments: PaymentLedger,
}

impl ServerState {
    /// 打开数据库、执行迁移并装配所有服务
    pub async fn initialize(config: &Config) -> Result<Self> {
        if config.database_file != ":memory:" {
            std::fs::create_dir_all(&config.work_dir)?;
        }
        let db = DbService::new(&config.database_path())
            .await
            .map_err(|e| ServerError::Database(e.message))?;

        let storage = Arc::new(LocalProofStorage::new(
            config.proofs_dir(),
            config.public_base_url.clone(),
        ));
        Ok(Self::with_pool(config.clone(), db.pool, storage))
    }

    /// 使用已有连接池和凭证存储装配（测试可替换存储实现）
    pub fn with_pool(config: Config, pool: SqlitePool, storage: Arc<dyn ProofStorage>) -> Self {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let emitter = NotificationEmitter::new();

        let cart = CartStore::new(pool.clone());
        let checkout = CheckoutOrchestrator::new(pool.clone(), emitter.clone());
        let orders = OrderFlow::new(pool.clone(), emitter.clone());
        let payments = PaymentLedger::new(
            pool.clone(),
            storage,
            emitter.clone(),
            config.upload_timeout(),
            config.max_proof_size,
        );

        Self {
            config,
            pool,
            jwt_service,
            emitter,
            cart,
            checkout,
            orders,
            payments,
        }
    }

    /// 启动后台任务（通知 outbox worker）
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let sink: Arc<dyn NotificationSink> = Arc::new(StoreSink::new(self.pool.clone()));
        self.start_background_tasks_with_sink(sink)
    }

    pub fn start_background_tasks_with_sink(&self, sink: Arc<dyn NotificationSink>) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();
        let worker = NotifyWorker::new(
            self.pool.clone(),
            sink,
            self.emitter.wake_handle(),
            self.config.notify_scan_interval(),
            tasks.shutdown_token(),
        );
        tasks.spawn("notify_worker", TaskKind::Worker, worker.run());
        tracing::info!(tasks = tasks.len(), "Background tasks started");
        tasks
    }
}
