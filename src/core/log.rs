//! 日志系统模块
//!
//! 控制台输出总是开启；配置打开 `file_output` 时再叠加一个按天滚动的文件层。
//! 框架和应用程序的日志分别使用 `dx11_framework::engine` / `dx11_framework::app`
//! 两个 target，可以用 `RUST_LOG` 单独过滤。
//!
//! ```no_run
//! use dx11_framework::core::{config::LogLevel, log};
//! use dx11_framework::engine_log;
//!
//! log::init_logger(LogLevel::Info, false, None);
//! engine_log!(info, width = 800, height = 600, "Window created");
//! ```

use std::path::{Path, PathBuf};

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use super::config::LogLevel;

const DEFAULT_LOG_FILE: &str = "dx11_framework.log";

/// 把日志文件路径拆成（目录，文件名）；缺少的部分用默认值补齐
fn split_log_path(path: &str) -> (PathBuf, String) {
    let path = Path::new(path);
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let filename = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(DEFAULT_LOG_FILE)
        .to_string();
    (directory, filename)
}

/// 初始化全局日志订阅者，进程内只能调用一次
///
/// `RUST_LOG` 存在时优先于 `level`。`file_output` 为真时写入 `log_file_path`
/// （默认 `dx11_framework.log`），文件层不带 ANSI 颜色。
pub fn init_logger(level: LogLevel, file_output: bool, log_file_path: Option<&str>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter()));

    let file_layer = file_output.then(|| {
        let (directory, filename) = split_log_path(log_file_path.unwrap_or(DEFAULT_LOG_FILE));
        fmt::layer()
            .with_ansi(false)
            .with_writer(RollingFileAppender::new(Rotation::DAILY, directory, filename))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .init();
}

impl LogLevel {
    /// `EnvFilter` 使用的过滤指令
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// 框架日志：`engine_log!(warn, error = %e, "Frame skipped")`
#[macro_export]
macro_rules! engine_log {
    ($level:ident, $($arg:tt)*) => {
        tracing::$level!(target: "dx11_framework::engine", $($arg)*)
    };
}

/// 应用层日志：`app_log!(info, frames, "Headless run finished")`
#[macro_export]
macro_rules! app_log {
    ($level:ident, $($arg:tt)*) => {
        tracing::$level!(target: "dx11_framework::app", $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives() {
        assert_eq!(LogLevel::Trace.as_filter(), "trace");
        assert_eq!(LogLevel::Warn.as_filter(), "warn");
        assert!(EnvFilter::try_new(LogLevel::Error.as_filter()).is_ok());
    }

    #[test]
    fn test_log_path_split() {
        assert_eq!(split_log_path("logs/run.log"), (PathBuf::from("logs"), "run.log".to_string()));
        assert_eq!(split_log_path("run.log"), (PathBuf::from("."), "run.log".to_string()));
        assert_eq!(split_log_path(""), (PathBuf::from("."), DEFAULT_LOG_FILE.to_string()));
    }

    #[test]
    fn test_target_macros_expand() {
        // 没有订阅者时宏只展开为空操作
        engine_log!(info, frames = 1, "engine");
        app_log!(error, "app");
    }
}
