use kasmoni_server::{Config, Server, ServerState, setup_environment};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 设置环境 (dotenv, 日志)
    setup_environment()?;

    tracing::info!("Kasmoni server starting...");

    // 2. 加载配置
    let config = Config::from_env()?;
    tracing::info!(environment = %config.environment, "Configuration loaded");

    // 3. 初始化服务器状态 (数据库、迁移、JWT)
    let state = ServerState::initialize(&config).await?;

    // 4. 启动 HTTP 服务器
    let server = Server::with_state(config, state);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
