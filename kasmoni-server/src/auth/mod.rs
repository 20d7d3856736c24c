//! 认证授权模块
//!
//! 令牌由外部身份服务签发，本服务只做校验：
//! - [`JwtService`] - JWT 令牌校验 (测试中也用于签发)
//! - [`CurrentUser`] - 当前用户会话上下文
//! - [`require_auth`] - 认证中间件
//! - [`require_admin`] / [`require_super_user`] - 角色检查中间件

pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod session;

pub use jwt::{Claims, JwtConfig, JwtError, JwtService};
pub use middleware::{CurrentUserExt, require_admin, require_auth, require_super_user};
pub use session::{CurrentUser, SessionTracker};
