//! 核心功能模块
//!
//! 本模块提供了框架的基础功能：日志系统、配置管理、场景描述和错误处理。
//! 这些模块独立于具体的图形 API。
//!
//! # 模块组织
//!
//! - `log`：日志系统，基于 tracing
//! - `config`：配置管理，支持从配置文件和命令行加载框架设置
//! - `scene`：场景描述文件（放置的模型、雾效、光源初始参数）
//! - `error`：错误处理，定义统一的错误类型
//! - `input`：键盘鼠标输入，映射为相机移动和按键动作

pub mod log;
pub mod input;
pub mod config;
pub mod scene;
pub mod error;

// 重新导出常用类型，方便使用
pub use error::{Result, FrameworkError, GraphicsError};
pub use config::Config;
pub use scene::SceneConfig;
