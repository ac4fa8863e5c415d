//! 配置管理模块
//!
//! 提供框架配置的加载、解析和管理功能。
//! 支持从 TOML 配置文件加载，也支持命令行参数覆盖。
//!
//! # 配置文件格式 (config.toml)
//!
//! ```toml
//! [window]
//! width = 1280
//! height = 720
//! title = "DX11 Framework"
//! resizable = false
//!
//! [graphics]
//! backend = "d3d11"   # 或 "headless"
//! vsync = true
//!
//! [logging]
//! level = "info"      # trace, debug, info, warn, error
//! file_output = false
//!
//! [assets]
//! root = "res"
//! scene = "scene.toml"
//!
//! [headless]
//! frames = 120
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::{ConfigError, Result};

/// 框架配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// 窗口配置
    #[serde(default)]
    pub window: WindowConfig,

    /// 图形配置
    #[serde(default)]
    pub graphics: GraphicsConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,

    /// 资源路径配置
    #[serde(default)]
    pub assets: AssetsConfig,

    /// 无窗口运行配置
    #[serde(default)]
    pub headless: HeadlessConfig,
}

/// 窗口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// 窗口宽度
    #[serde(default = "default_width")]
    pub width: u32,

    /// 窗口高度
    #[serde(default = "default_height")]
    pub height: u32,

    /// 窗口标题
    #[serde(default = "default_title")]
    pub title: String,

    /// 是否可调整大小
    #[serde(default = "default_resizable")]
    pub resizable: bool,
}

/// 图形配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphicsConfig {
    /// 图形后端选择
    #[serde(default = "default_backend")]
    pub backend: GraphicsBackend,

    /// 垂直同步（呈现间隔 1 或 0）
    #[serde(default = "default_vsync")]
    pub vsync: bool,
}

/// 图形后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphicsBackend {
    /// 记录型参考设备，不需要窗口和 GPU
    Headless,
    /// Direct3D 11 后端（仅 Windows）
    D3d11,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// 是否输出到文件
    #[serde(default = "default_file_output")]
    pub file_output: bool,

    /// 日志文件路径
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// 资源路径配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// 资源根目录（着色器、纹理、模型都相对于它）
    #[serde(default = "default_assets_root")]
    pub root: PathBuf,

    /// 场景描述文件（相对于资源根目录）
    #[serde(default = "default_scene_file")]
    pub scene: String,
}

/// 无窗口运行配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlessConfig {
    /// 运行的帧数
    #[serde(default = "default_frames")]
    pub frames: u32,

    /// 每帧模拟的时间步长（毫秒）
    #[serde(default = "default_frame_time")]
    pub frame_time_ms: f32,
}

// 默认值函数
fn default_width() -> u32 { 1280 }
fn default_height() -> u32 { 720 }
fn default_title() -> String { "DX11 Framework".to_string() }
fn default_resizable() -> bool { false }
fn default_backend() -> GraphicsBackend {
    if cfg!(target_os = "windows") {
        GraphicsBackend::D3d11
    } else {
        GraphicsBackend::Headless
    }
}
fn default_vsync() -> bool { true }
fn default_log_level() -> LogLevel { LogLevel::Info }
fn default_file_output() -> bool { false }
fn default_log_file() -> String { "dx11_framework.log".to_string() }
fn default_assets_root() -> PathBuf { PathBuf::from("res") }
fn default_scene_file() -> String { "scene.toml".to_string() }
fn default_frames() -> u32 { 120 }
fn default_frame_time() -> f32 { 16.0 }

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            title: default_title(),
            resizable: default_resizable(),
        }
    }
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            vsync: default_vsync(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_output: default_file_output(),
            log_file: default_log_file(),
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            root: default_assets_root(),
            scene: default_scene_file(),
        }
    }
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            frames: default_frames(),
            frame_time_ms: default_frame_time(),
        }
    }
}

impl Config {
    /// 从配置文件加载
    ///
    /// # 示例
    ///
    /// ```no_run
    /// use dx11_framework::core::Config;
    ///
    /// let config = Config::from_file("config.toml").unwrap();
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let contents = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path_str.clone()))?;

        Self::from_toml_str(&contents)
    }

    /// 从 TOML 文本解析
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()).into())
    }

    /// 从配置文件加载，如果文件不存在则使用默认配置
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::from_file(path).unwrap_or_default()
    }

    /// 保存配置到文件
    #[allow(dead_code)]
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// 场景描述文件的完整路径
    pub fn scene_path(&self) -> PathBuf {
        self.assets.root.join(&self.assets.scene)
    }

    /// 从命令行参数覆盖配置
    ///
    /// 支持的参数：
    /// - `--headless`: 使用无窗口参考设备
    /// - `--d3d11`: 使用 Direct3D 11 后端
    /// - `--width <value>` / `--height <value>`: 设置窗口尺寸
    /// - `--frames <value>`: 无窗口模式下运行的帧数
    /// - `--no-vsync`: 关闭垂直同步
    pub fn apply_args<I>(&mut self, args: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

        if args.iter().any(|a| a == "--headless") {
            self.graphics.backend = GraphicsBackend::Headless;
        }

        if args.iter().any(|a| a == "--d3d11") {
            self.graphics.backend = GraphicsBackend::D3d11;
        }

        if args.iter().any(|a| a == "--no-vsync") {
            self.graphics.vsync = false;
        }

        if let Some(width) = parse_flag_value(&args, "--width") {
            self.window.width = width;
        }

        if let Some(height) = parse_flag_value(&args, "--height") {
            self.window.height = height;
        }

        if let Some(frames) = parse_flag_value(&args, "--frames") {
            self.headless.frames = frames;
        }
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "window.width/height".to_string(),
                reason: "Window dimensions must be greater than 0".to_string(),
            }.into());
        }

        // 分屏视口宽度为 width / 2
        if self.window.width < 2 {
            return Err(ConfigError::InvalidValue {
                field: "window.width".to_string(),
                reason: "Window must be at least 2 pixels wide for split view".to_string(),
            }.into());
        }

        if self.headless.frame_time_ms < 0.0 || !self.headless.frame_time_ms.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "headless.frame_time_ms".to_string(),
                reason: "Frame time must be a finite, non-negative number".to_string(),
            }.into());
        }

        if self.assets.scene.is_empty() {
            return Err(ConfigError::MissingField("assets.scene".to_string()).into());
        }

        Ok(())
    }
}

fn parse_flag_value<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    let idx = args.iter().position(|a| a == flag)?;
    args.get(idx + 1)?.parse().ok()
}

impl GraphicsBackend {
    /// 获取后端名称
    pub fn name(&self) -> &'static str {
        match self {
            GraphicsBackend::Headless => "Headless",
            GraphicsBackend::D3d11 => "Direct3D 11",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 720);
        assert!(config.graphics.vsync);
        assert_eq!(config.scene_path(), PathBuf::from("res").join("scene.toml"));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.window.width = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_args() {
        let mut config = Config::default();
        config.apply_args(["app", "--headless", "--width", "640", "--frames", "3", "--no-vsync"]);
        assert_eq!(config.graphics.backend, GraphicsBackend::Headless);
        assert_eq!(config.window.width, 640);
        assert_eq!(config.headless.frames, 3);
        assert!(!config.graphics.vsync);

        // 非法数值被忽略
        config.apply_args(["app", "--height", "abc"]);
        assert_eq!(config.window.height, 720);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml_str(
            r#"
            [graphics]
            backend = "headless"

            [headless]
            frames = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.graphics.backend, GraphicsBackend::Headless);
        assert_eq!(config.headless.frames, 5);
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.headless.frame_time_ms, 16.0);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let err = Config::from_toml_str("[window\nwidth = ").unwrap_err();
        assert!(matches!(
            err,
            crate::core::error::FrameworkError::Config(ConfigError::ParseError(_))
        ));
    }
}
