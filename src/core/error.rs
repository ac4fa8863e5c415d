//! 错误处理模块
//!
//! 定义了框架中使用的统一错误类型。
//!
//! # 错误分类
//!
//! - **初始化错误**：设备/交换链创建、着色器编译、资源加载、状态对象创建失败，
//!   `Graphics::initialize` 返回 `Err`，调用方必须放弃启动
//! - **帧内可恢复错误**：常量缓冲区上传失败，当前阶段提前返回，本帧剩余绘制被跳过
//! - **致命运行时错误**：呈现失败或设备移除，调用方记录日志后终止进程

use std::fmt;
use std::path::PathBuf;

/// 框架统一的 Result 类型
pub type Result<T> = std::result::Result<T, FrameworkError>;

/// 框架的错误类型
#[derive(Debug)]
pub enum FrameworkError {
    /// 配置错误
    Config(ConfigError),

    /// 图形 API 错误
    Graphics(GraphicsError),

    /// 资源（纹理、模型、着色器源码）加载错误
    Asset(AssetError),

    /// IO 错误
    Io(std::io::Error),

    /// 初始化错误
    Initialization(String),

    /// 运行时错误
    Runtime(String),
}

/// 配置相关的错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置文件未找到
    FileNotFound(String),

    /// 配置文件解析失败
    ParseError(String),

    /// 配置项缺失
    MissingField(String),

    /// 配置值无效
    InvalidValue { field: String, reason: String },
}

/// 图形 API 相关的错误
#[derive(Debug, Clone, PartialEq)]
pub enum GraphicsError {
    /// 设备创建失败
    DeviceCreation(String),

    /// 交换链错误
    SwapchainError(String),

    /// 着色器编译失败（附带编译器诊断信息）
    ShaderCompilation { path: String, diagnostic: String },

    /// 资源创建失败
    ResourceCreation(String),

    /// 常量缓冲区或实例缓冲区上传失败
    BufferUpload { buffer: String, reason: String },

    /// 本帧已因先前的失败被中止
    FrameAborted(String),

    /// 帧阶段调用顺序错误
    FrameOrder(String),

    /// 呈现失败；`device_removed` 保存设备移除原因
    Presentation {
        reason: String,
        device_removed: Option<String>,
    },
}

/// 资源加载相关的错误
#[derive(Debug)]
pub enum AssetError {
    /// 文件不存在
    FileNotFound(PathBuf),

    /// 不支持的文件格式
    UnsupportedFormat(String),

    /// 解析失败
    ParseError(String),

    /// 数据验证失败
    ValidationError(String),
}

impl GraphicsError {
    /// 是否为致命错误（需要终止进程）
    pub fn is_fatal(&self) -> bool {
        matches!(self, GraphicsError::Presentation { .. })
    }
}

impl FrameworkError {
    /// 是否为致命错误
    pub fn is_fatal(&self) -> bool {
        matches!(self, FrameworkError::Graphics(e) if e.is_fatal())
    }
}

impl fmt::Display for FrameworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameworkError::Config(e) => write!(f, "Configuration error: {}", e),
            FrameworkError::Graphics(e) => write!(f, "Graphics error: {}", e),
            FrameworkError::Asset(e) => write!(f, "Asset error: {}", e),
            FrameworkError::Io(e) => write!(f, "IO error: {}", e),
            FrameworkError::Initialization(msg) => write!(f, "Initialization error: {}", msg),
            FrameworkError::Runtime(msg) => write!(f, "Runtime error: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {}", path),
            ConfigError::ParseError(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::MissingField(field) => write!(f, "Missing required field: {}", field),
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphicsError::DeviceCreation(msg) => write!(f, "Device creation failed: {}", msg),
            GraphicsError::SwapchainError(msg) => write!(f, "Swapchain error: {}", msg),
            GraphicsError::ShaderCompilation { path, diagnostic } => {
                write!(f, "Shader compilation failed for '{}': {}", path, diagnostic)
            }
            GraphicsError::ResourceCreation(msg) => write!(f, "Resource creation failed: {}", msg),
            GraphicsError::BufferUpload { buffer, reason } => {
                write!(f, "Failed to upload '{}': {}", buffer, reason)
            }
            GraphicsError::FrameAborted(msg) => write!(f, "Frame aborted: {}", msg),
            GraphicsError::FrameOrder(msg) => write!(f, "Frame phase out of order: {}", msg),
            GraphicsError::Presentation { reason, device_removed: Some(removed) } => {
                write!(f, "Graphics device removed ({}): {}", removed, reason)
            }
            GraphicsError::Presentation { reason, device_removed: None } => {
                write!(f, "Swap chain failed to present frame: {}", reason)
            }
        }
    }
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::FileNotFound(path) => write!(f, "Asset not found: {}", path.display()),
            AssetError::UnsupportedFormat(msg) => write!(f, "Unsupported asset format: {}", msg),
            AssetError::ParseError(msg) => write!(f, "Failed to parse asset: {}", msg),
            AssetError::ValidationError(msg) => write!(f, "Asset validation failed: {}", msg),
        }
    }
}

impl std::error::Error for FrameworkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FrameworkError::Io(e) => Some(e),
            FrameworkError::Graphics(e) => Some(e),
            FrameworkError::Config(e) => Some(e),
            FrameworkError::Asset(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for GraphicsError {}
impl std::error::Error for AssetError {}

impl From<std::io::Error> for FrameworkError {
    fn from(err: std::io::Error) -> Self {
        FrameworkError::Io(err)
    }
}

impl From<ConfigError> for FrameworkError {
    fn from(err: ConfigError) -> Self {
        FrameworkError::Config(err)
    }
}

impl From<GraphicsError> for FrameworkError {
    fn from(err: GraphicsError) -> Self {
        FrameworkError::Graphics(err)
    }
}

impl From<AssetError> for FrameworkError {
    fn from(err: AssetError) -> Self {
        FrameworkError::Asset(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presentation_is_fatal() {
        let err: FrameworkError = GraphicsError::Presentation {
            reason: "DXGI_ERROR_DEVICE_REMOVED".to_string(),
            device_removed: Some("DXGI_ERROR_DEVICE_HUNG".to_string()),
        }
        .into();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("device removed"));
    }

    #[test]
    fn test_upload_failure_is_recoverable() {
        let err: FrameworkError = GraphicsError::BufferUpload {
            buffer: "cb_vs_fog".to_string(),
            reason: "map failed".to_string(),
        }
        .into();
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("cb_vs_fog"));
    }
}
