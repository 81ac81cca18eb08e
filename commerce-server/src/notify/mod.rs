//! 通知模块 (outbox 模式)
//!
//! 业务事务内写入 `notification_outbox`，提交后唤醒 [`NotifyWorker`]
//! 投递到 [`NotificationSink`]。投递失败只记录日志并重试，从不影响已提交的业务写入。
//!
//! - [`NotificationEmitter`] - 事务内入队 + 提交后唤醒
//! - [`events`] - 事件内容构造
//! - [`NotifyWorker`] - 后台投递
//! - [`StoreSink`] - 默认投递目标：用户通知表

pub mod emitter;
pub mod events;
pub mod sink;
pub mod worker;

pub use emitter::NotificationEmitter;
pub use sink::{NotificationSink, NotifyError, StoreSink};
pub use worker::NotifyWorker;
