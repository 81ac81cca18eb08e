use commerce_server::{Config, Server, ServerState, init_logger_with_file, print_banner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 环境变量 (.env 可选)
    dotenv::dotenv().ok();

    // 2. 加载配置
    let config = Config::from_env();

    // 3. 日志：生产环境 JSON + 按天滚动文件
    let _log_guard = init_logger_with_file(
        None,
        config.is_production(),
        Some(config.logs_dir().as_path()),
    );

    print_banner();
    tracing::info!(environment = %config.environment, "Commerce server starting...");

    if config.is_production() && std::env::var("JWT_SECRET").is_err() {
        anyhow::bail!("JWT_SECRET must be set in production");
    }
    config
        .jwt
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid JWT configuration: {e}"))?;

    // 4. 初始化状态并启动 HTTP 服务器
    let state = ServerState::initialize(&config).await?;
    let server = Server::with_state(config, state);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
