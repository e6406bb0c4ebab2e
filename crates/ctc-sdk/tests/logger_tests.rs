//! 日志初始化测试
//!
//! 全局订阅者每个进程只能安装一次，所以这些断言放在同一个测试里。

use ctc_sdk::{LoggerError, init_logger, init_logger_with_filter};

#[test]
fn test_logger_installs_once() {
    let err = init_logger_with_filter("ctc_control=loud").unwrap_err();
    assert!(matches!(err, LoggerError::InvalidFilter { .. }));

    init_logger_with_filter("ctc_control=debug,warn").unwrap();
    tracing::info!("logger installed");

    assert_eq!(
        init_logger_with_filter("info"),
        Err(LoggerError::AlreadyInitialized)
    );
    assert_eq!(init_logger(), Err(LoggerError::AlreadyInitialized));
}
