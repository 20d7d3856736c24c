use crate::auth::JwtConfig;
use crate::utils::AppError;

/// 开发环境下未设置 JWT_SECRET 时使用的密钥
const DEV_JWT_SECRET: &str = "kasmoni-development-secret-do-not-use-in-production";

/// 服务器配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | DATABASE_PATH | kasmoni.db | SQLite 文件 (测试可用 `:memory:`) |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | JWT_SECRET | (仅开发环境有默认值) | HS256 密钥，至少 32 字符 |
/// | JWT_ISSUER | kasmoni-auth | 令牌签发者 |
/// | JWT_AUDIENCE | kasmoni-admin | 令牌受众 |
/// | TREND_MONTHS_DEFAULT | 6 | 统计趋势默认月数 |
///
/// 日志相关变量 (LOG_LEVEL / LOG_JSON / LOG_DIR) 在 [`crate::setup_environment`] 中读取。
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite 数据库路径
    pub database_path: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 统计趋势默认月数
    pub trend_months_default: u32,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 非开发环境缺少 JWT_SECRET 或密钥过短时返回 `ConfigError`
    pub fn from_env() -> Result<Self, AppError> {
        let environment = env_or("ENVIRONMENT", "development");
        let secret = load_jwt_secret(&environment)?;

        Ok(Self {
            database_path: env_or("DATABASE_PATH", "kasmoni.db"),
            http_port: env_parse("HTTP_PORT", 3000),
            jwt: JwtConfig {
                secret,
                issuer: env_or("JWT_ISSUER", "kasmoni-auth"),
                audience: env_or("JWT_AUDIENCE", "kasmoni-admin"),
                expiration_minutes: env_parse("JWT_EXPIRATION_MINUTES", 60),
            },
            environment,
            trend_months_default: env_parse::<u32>("TREND_MONTHS_DEFAULT", 6).clamp(1, 24),
        })
    }

    /// 测试配置: 内存数据库 + 固定密钥
    pub fn for_tests(secret: impl Into<String>) -> Self {
        Self {
            database_path: ":memory:".into(),
            http_port: 0,
            jwt: JwtConfig {
                secret: secret.into(),
                issuer: "kasmoni-auth".into(),
                audience: "kasmoni-admin".into(),
                expiration_minutes: 60,
            },
            environment: "test".into(),
            trend_months_default: 6,
        }
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn load_jwt_secret(environment: &str) -> Result<String, AppError> {
    match std::env::var("JWT_SECRET") {
        Ok(secret) if secret.len() >= 32 => Ok(secret),
        Ok(_) => Err(AppError::config(
            "JWT_SECRET must be at least 32 characters long",
        )),
        Err(_) if environment == "development" => {
            tracing::warn!("JWT_SECRET not set, using the development secret");
            Ok(DEV_JWT_SECRET.to_string())
        }
        Err(_) => Err(AppError::config(format!(
            "JWT_SECRET environment variable must be set in {environment}"
        ))),
    }
}
