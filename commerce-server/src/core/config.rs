use std::path::PathBuf;
use std::time::Duration;

use crate::auth::JwtConfig;

/// 服务器配置
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录（数据库、日志、付款凭证） |
/// | HTTP_PORT | 8080 | HTTP 服务端口 |
/// | DATABASE_FILE | commerce.db | WORK_DIR 下的 SQLite 文件名 |
/// | ENVIRONMENT | development | 运行环境 |
/// | REQUEST_TIMEOUT_MS | 30000 | 请求超时(毫秒) |
/// | UPLOAD_TIMEOUT_MS | 15000 | 凭证存储调用超时(毫秒) |
/// | MAX_PROOF_SIZE | 10485760 | 付款凭证最大字节数 |
/// | PUBLIC_BASE_URL | http://localhost:{HTTP_PORT} | 凭证 URL 前缀 |
/// | NOTIFY_SCAN_INTERVAL_MS | 5000 | 通知 outbox 扫描周期 |
///
/// JWT 相关变量见 [`JwtConfig`]。
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// SQLite 文件名（相对 work_dir）；`:memory:` 表示内存库
    pub database_file: String,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 运行环境: development | production
    pub environment: String,
    /// 请求超时时间 (毫秒)
    pub request_timeout_ms: u64,
    /// 凭证上传超时 (毫秒)
    pub upload_timeout_ms: u64,
    /// 付款凭证大小上限 (字节)
    pub max_proof_size: usize,
    /// 对外可访问的基础 URL
    pub public_base_url: String,
    /// 通知 worker 兜底扫描周期 (毫秒)
    pub notify_scan_interval_ms: u64,
}

/// 10 MB
pub const DEFAULT_MAX_PROOF_SIZE: usize = 10 * 1024 * 1024;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        let http_port = env_or("HTTP_PORT", 8080u16);
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port,
            database_file: std::env::var("DATABASE_FILE")
                .unwrap_or_else(|_| "commerce.db".into()),
            jwt: JwtConfig::default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            request_timeout_ms: env_or("REQUEST_TIMEOUT_MS", 30_000),
            upload_timeout_ms: env_or("UPLOAD_TIMEOUT_MS", 15_000),
            max_proof_size: env_or("MAX_PROOF_SIZE", DEFAULT_MAX_PROOF_SIZE),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{http_port}")),
            notify_scan_interval_ms: env_or("NOTIFY_SCAN_INTERVAL_MS", 5_000),
        }
    }

    /// 测试用配置：内存数据库 + 固定 JWT 密钥
    pub fn for_tests(work_dir: impl Into<String>) -> Self {
        Self {
            work_dir: work_dir.into(),
            http_port: 0,
            database_file: ":memory:".into(),
            jwt: JwtConfig {
                secret: "test-secret-test-secret-test-secret-0123".into(),
                expiration_minutes: 60,
                issuer: "commerce-server".into(),
                audience: "commerce-clients".into(),
            },
            environment: "test".into(),
            request_timeout_ms: 30_000,
            upload_timeout_ms: 5_000,
            max_proof_size: DEFAULT_MAX_PROOF_SIZE,
            public_base_url: "http://localhost".into(),
            notify_scan_interval_ms: 60_000,
        }
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn database_path(&self) -> String {
        if self.database_file == ":memory:" {
            return self.database_file.clone();
        }
        PathBuf::from(&self.work_dir)
            .join(&self.database_file)
            .to_string_lossy()
            .into_owned()
    }

    pub fn logs_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// 付款凭证存储目录
    pub fn proofs_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("uploads").join("payments")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_millis(self.upload_timeout_ms)
    }

    pub fn notify_scan_interval(&self) -> Duration {
        Duration::from_millis(self.notify_scan_interval_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_under_work_dir() {
        let mut config = Config::for_tests("/tmp/commerce");
        assert_eq!(config.database_path(), ":memory:");
        config.database_file = "commerce.db".into();
        assert_eq!(config.database_path(), "/tmp/commerce/commerce.db");
        assert_eq!(
            config.proofs_dir(),
            PathBuf::from("/tmp/commerce/uploads/payments")
        );
        assert_eq!(config.logs_dir(), PathBuf::from("/tmp/commerce/logs"));
    }

    #[test]
    fn test_default_proof_limit_is_ten_megabytes() {
        let config = Config::for_tests("/tmp/commerce");
        assert_eq!(config.max_proof_size, 10_485_760);
        assert!(!config.is_production());
    }
}
