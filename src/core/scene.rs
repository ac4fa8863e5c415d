//! 场景配置模块
//!
//! 场景描述文件（`res/scene.toml`）列出放置的模型及其初始变换，
//! 以及清屏颜色、雾效和光源的初始参数。初始化时读取一次。
//!
//! ```toml
//! clear_color = [0.0, 0.0, 0.0, 1.0]
//!
//! [fog]
//! color = [0.2, 0.2, 0.2]
//! start = 10.0
//! end = 50.0
//! enable = false
//!
//! [[models]]
//! name = "Nanosuit"
//! path = "models/nanosuit.obj"
//! texture = "textures/nanosuit.png"
//! [models.transform]
//! position = [0.0, 0.0, 0.0]
//! rotation = [0.0, 180.0, 0.0]
//! scale = [0.5, 0.5, 0.5]
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::error::{ConfigError, FrameworkError, Result};
use crate::math::{matrix, utils, Matrix4};

/// 3D 变换数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// 位置 (x, y, z)
    #[serde(default = "default_position")]
    pub position: [f32; 3],

    /// 旋转（欧拉角，度数）(pitch, yaw, roll)
    #[serde(default = "default_rotation")]
    pub rotation: [f32; 3],

    /// 缩放 (x, y, z)
    #[serde(default = "default_scale")]
    pub scale: [f32; 3],
}

fn default_position() -> [f32; 3] {
    [0.0, 0.0, 0.0]
}

fn default_rotation() -> [f32; 3] {
    [0.0, 0.0, 0.0]
}

fn default_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: default_position(),
            rotation: default_rotation(),
            scale: default_scale(),
        }
    }
}

impl Transform {
    /// 旋转（弧度）
    pub fn rotation_radians(&self) -> [f32; 3] {
        self.rotation.map(utils::deg_to_rad)
    }

    /// 创建模型矩阵
    ///
    /// 变换顺序：缩放 -> 旋转 -> 平移
    pub fn to_matrix(&self) -> Matrix4 {
        let [pitch, yaw, roll] = self.rotation_radians();
        let [px, py, pz] = self.position;
        let [sx, sy, sz] = self.scale;

        matrix::translation(px, py, pz)
            * matrix::rotation_roll_pitch_yaw(pitch, yaw, roll)
            * matrix::scaling(sx, sy, sz)
    }
}

/// 雾效初始参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FogConfig {
    #[serde(default = "default_fog_color")]
    pub color: [f32; 3],

    #[serde(default = "default_fog_start")]
    pub start: f32,

    #[serde(default = "default_fog_end")]
    pub end: f32,

    #[serde(default)]
    pub enable: bool,
}

fn default_fog_color() -> [f32; 3] {
    [0.2, 0.2, 0.2]
}

fn default_fog_start() -> f32 {
    10.0
}

fn default_fog_end() -> f32 {
    50.0
}

impl Default for FogConfig {
    fn default() -> Self {
        Self {
            color: default_fog_color(),
            start: default_fog_start(),
            end: default_fog_end(),
            enable: false,
        }
    }
}

/// 光源初始参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightConfig {
    #[serde(default = "default_ambient_color")]
    pub ambient_color: [f32; 3],

    #[serde(default = "default_ambient_strength")]
    pub ambient_strength: f32,

    #[serde(default = "default_light_color")]
    pub light_color: [f32; 3],

    #[serde(default = "default_light_strength")]
    pub light_strength: f32,

    /// 是否使用点光源（同时控制天空盒是否绘制）
    #[serde(default = "default_use_point_light")]
    pub use_point_light: bool,

    /// 光源模型路径（相对于资源根目录）
    #[serde(default = "default_light_model")]
    pub model: String,

    /// 光源模型的纹理路径
    #[serde(default = "default_light_texture")]
    pub texture: String,
}

fn default_ambient_color() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn default_ambient_strength() -> f32 {
    0.1
}

fn default_light_color() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn default_light_strength() -> f32 {
    1.0
}

fn default_use_point_light() -> bool {
    true
}

fn default_light_model() -> String {
    "models/light.obj".to_string()
}

fn default_light_texture() -> String {
    "textures/light.png".to_string()
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            ambient_color: default_ambient_color(),
            ambient_strength: default_ambient_strength(),
            light_color: default_light_color(),
            light_strength: default_light_strength(),
            use_point_light: default_use_point_light(),
            model: default_light_model(),
            texture: default_light_texture(),
        }
    }
}

/// 模型配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// 模型名称（编辑器面板中显示）
    pub name: String,

    /// 模型文件路径（相对于资源根目录）
    pub path: String,

    /// 漫反射纹理路径（可选）
    #[serde(default)]
    pub texture: Option<String>,

    /// 模型变换
    #[serde(default)]
    pub transform: Transform,
}

/// 场景配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    /// 清屏颜色
    #[serde(default = "default_clear_color")]
    pub clear_color: [f32; 4],

    #[serde(default)]
    pub fog: FogConfig,

    #[serde(default)]
    pub light: LightConfig,

    /// 放置的模型；第 0 个模型是第三人称相机、碰撞检测和公告板的目标
    #[serde(default)]
    pub models: Vec<ModelConfig>,
}

fn default_clear_color() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

impl SceneConfig {
    /// 从文件加载场景配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            FrameworkError::Config(ConfigError::FileNotFound(format!(
                "Failed to read scene file '{}': {}",
                path.display(),
                e
            )))
        })?;

        let scene = Self::from_toml_str(&contents)?;
        tracing::info!(path = %path.display(), models = scene.models.len(), "Loaded scene description");
        Ok(scene)
    }

    /// 从 TOML 文本解析并验证
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let scene: SceneConfig = toml::from_str(contents).map_err(|e| {
            FrameworkError::Config(ConfigError::ParseError(format!(
                "Failed to parse scene description: {}",
                e
            )))
        })?;
        scene.validate()?;
        Ok(scene)
    }

    /// 验证场景描述
    pub fn validate(&self) -> Result<()> {
        if self.models.is_empty() {
            return Err(ConfigError::MissingField("models".to_string()).into());
        }

        for (i, model) in self.models.iter().enumerate() {
            if model.path.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("models[{}].path", i),
                    reason: "Model path must not be empty".to_string(),
                }
                .into());
            }
        }

        if self.fog.end <= self.fog.start {
            return Err(ConfigError::InvalidValue {
                field: "fog.end".to_string(),
                reason: "Fog end must be greater than fog start".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r#"
        [[models]]
        name = "Nanosuit"
        path = "models/nanosuit.obj"
        texture = "textures/nanosuit.png"
        [models.transform]
        position = [1.0, 2.0, 3.0]
    "#;

    #[test]
    fn test_default_transform() {
        let transform = Transform::default();
        assert_eq!(transform.position, [0.0, 0.0, 0.0]);
        assert_eq!(transform.rotation, [0.0, 0.0, 0.0]);
        assert_eq!(transform.scale, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_transform_to_matrix() {
        let transform = Transform {
            position: [1.0, 2.0, 3.0],
            rotation: [0.0, 0.0, 0.0],
            scale: [1.0, 1.0, 1.0],
        };
        let matrix = transform.to_matrix();

        assert!((matrix[(0, 3)] - 1.0).abs() < 0.001);
        assert!((matrix[(1, 3)] - 2.0).abs() < 0.001);
        assert!((matrix[(2, 3)] - 3.0).abs() < 0.001);
    }

    #[test]
    fn test_parse_scene_with_defaults() {
        let scene = SceneConfig::from_toml_str(SCENE).unwrap();
        assert_eq!(scene.models.len(), 1);
        assert_eq!(scene.models[0].transform.scale, [1.0, 1.0, 1.0]);
        assert_eq!(scene.fog, FogConfig::default());
        assert_eq!(scene.light.ambient_strength, 0.1);
        assert!(scene.light.use_point_light);
        assert_eq!(scene.light.texture, "textures/light.png");
    }

    #[test]
    fn test_scene_without_models_is_rejected() {
        let err = SceneConfig::from_toml_str("clear_color = [0.0, 0.0, 0.0, 1.0]").unwrap_err();
        assert!(matches!(
            err,
            FrameworkError::Config(ConfigError::MissingField(_))
        ));
    }

    #[test]
    fn test_inverted_fog_range_is_rejected() {
        let text = format!("{}\n[fog]\nstart = 50.0\nend = 10.0\n", SCENE);
        assert!(SceneConfig::from_toml_str(&text).is_err());
    }
}
