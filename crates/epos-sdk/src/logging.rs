//! 日志初始化
//!
//! 默认只输出本 SDK（`epos_*` crates）info 及以上级别的日志；
//! 设置 `RUST_LOG` 时以环境变量为准。

use tracing_subscriber::EnvFilter;

/// 未设置 `RUST_LOG` 时使用的过滤指令
pub const DEFAULT_LOG_DIRECTIVE: &str = "epos=info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE))
}

/// 安装全局 fmt 订阅器
///
/// 已安装过全局订阅器时 panic；不确定时使用 [`try_init_logging`]。
pub fn init_logging() {
    tracing_subscriber::fmt().with_env_filter(env_filter()).init();
}

/// 安装全局 fmt 订阅器，已安装时返回错误
pub fn try_init_logging() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .try_init()
}
