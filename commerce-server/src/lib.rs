//! Commerce Server - 订单 / 付款 / 库存一致性引擎
//!
//! # 模块结构
//!
//! ```text
//! commerce-server/src/
//! ├── core/          # 配置、状态、HTTP 服务器、后台任务
//! ├── auth/          # JWT 认证、角色授权
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # SQLite 连接池与仓储
//! ├── cart/          # 购物车
//! ├── checkout/      # 结账编排
//! ├── orders/        # 订单状态机
//! ├── payments/      # 付款台账与审核
//! ├── inventory.rs   # 库存台账
//! ├── notify/        # 通知 outbox
//! └── utils/         # 日志、校验
//! ```

pub mod api;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod core;
pub mod db;
pub mod error;
pub mod inventory;
pub mod money;
pub mod notify;
pub mod orders;
pub mod payments;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService, Role};
pub use core::{Config, Server, ServerState};
pub use error::{CommerceError, CommerceResult};
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

pub fn print_banner() {
    println!(
        r#"
   ______
  / ____/___  ____ ___  ____ ___  ___  ______________
 / /   / __ \/ __ `__ \/ __ `__ \/ _ \/ ___/ ___/ _ \
/ /___/ /_/ / / / / / / / / / / /  __/ /  / /__/  __/
\____/\____/_/ /_/ /_/_/ /_/ /_/\___/_/   \___/\___/
    "#
    );
}
