//! 日志初始化
//!
//! 库 crate 只通过 `tracing` 宏输出日志；订阅者只由二进制程序安装。

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// 默认过滤规则（未设置 `RUST_LOG` 时）
const DEFAULT_FILTER: &str = "info";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoggerError {
    #[error("Invalid log filter '{filter}': {message}")]
    InvalidFilter { filter: String, message: String },

    #[error("A global tracing subscriber is already installed")]
    AlreadyInitialized,
}

/// 安装全局日志订阅者
///
/// 过滤规则优先读取 `RUST_LOG`，否则使用 `info`。
/// `log` crate 的记录会通过 `tracing-log` 转发。
pub fn init_logger() -> Result<(), LoggerError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => install(filter),
        Err(_) => init_logger_with_filter(DEFAULT_FILTER),
    }
}

/// 使用指定的过滤规则安装全局日志订阅者
///
/// # 示例
///
/// ```no_run
/// ctc_sdk::init_logger_with_filter("ctc_control=debug,info").unwrap();
/// ```
pub fn init_logger_with_filter(filter: &str) -> Result<(), LoggerError> {
    let env_filter = EnvFilter::try_new(filter).map_err(|e| LoggerError::InvalidFilter {
        filter: filter.to_string(),
        message: e.to_string(),
    })?;
    install(env_filter)
}

fn install(filter: EnvFilter) -> Result<(), LoggerError> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|_| LoggerError::AlreadyInitialized)?;

    // 其他组件可能已经安装了 log 转发器，忽略即可
    let _ = tracing_log::LogTracer::init();
    Ok(())
}
