//! Logging Infrastructure
//!
//! Structured logging setup with support for both development and production environments.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the logger (stdout only)
pub fn init_logger() {
    init_logger_with_file(None, false, None);
}

/// Initialize the logger with optional daily-rolling file output
///
/// `RUST_LOG` 优先；否则使用 `log_level`（默认 info）。
/// 返回的 guard 必须在进程生命周期内持有，否则文件日志会丢失。
pub fn init_logger_with_file(
    log_level: Option<&str>,
    json: bool,
    log_dir: Option<&Path>,
) -> Option<WorkerGuard> {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_writer, guard) = match log_dir {
        Some(dir) if std::fs::create_dir_all(dir).is_ok() => {
            let appender = tracing_appender::rolling::daily(dir, "commerce-server");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        _ => (None, None),
    };

    let file_layer = file_writer.map(|writer| {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
    });

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);

    // try_init: 测试中可能重复初始化
    let result = if json {
        registry.with(fmt::layer().json().with_target(true)).try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_file(false)
                    .with_line_number(false)
                    .with_thread_ids(false)
                    .with_target(false),
            )
            .try_init()
    };
    if let Err(e) = result {
        eprintln!("Logger already initialized: {e}");
    }

    guard
}
