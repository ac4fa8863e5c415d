//! 帧参数
//!
//! 由输入处理和编辑器面板修改、在每帧开始时读取的标志集合。

use super::states::SamplerKind;

/// 应用状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameState {
    #[default]
    Menu,
    Play,
    Edit,
    Help,
}

impl GameState {
    /// 菜单或帮助页面正在显示
    pub fn is_menu(self) -> bool {
        matches!(self, GameState::Menu | GameState::Help)
    }
}

/// 帮助页面
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HelpPage {
    #[default]
    Camera,
    Light,
    Scene,
}

impl HelpPage {
    pub const COUNT: usize = 3;

    pub fn index(self) -> usize {
        match self {
            HelpPage::Camera => 0,
            HelpPage::Light => 1,
            HelpPage::Scene => 2,
        }
    }

    pub fn from_index(index: usize) -> Self {
        match index % Self::COUNT {
            0 => HelpPage::Camera,
            1 => HelpPage::Light,
            _ => HelpPage::Scene,
        }
    }

    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub fn previous(self) -> Self {
        Self::from_index(self.index() + Self::COUNT - 1)
    }
}

/// 场景开关
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneParams {
    pub clear_color: [f32; 4],
    pub rasterizer_solid: bool,
    pub sampler: SamplerKind,
    /// 模板遮罩预处理
    pub use_mask: bool,
    /// 圆形遮罩，否则方形
    pub circle_mask: bool,
    /// 后处理阶段的多视图效果
    pub multi_view: bool,
    pub use_texture: bool,
    pub alpha_factor: f32,
    /// 第 0 个模型始终面向相机
    pub use_billboarding: bool,
    /// 点相机与第 0 个模型发生碰撞（`update` 写入）
    pub camera_collision: bool,
}

impl Default for SceneParams {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
            rasterizer_solid: true,
            sampler: SamplerKind::Anisotropic,
            use_mask: false,
            circle_mask: true,
            multi_view: false,
            use_texture: true,
            alpha_factor: 1.0,
            use_billboarding: false,
            camera_collision: false,
        }
    }
}

/// 视口开关
///
/// `use_left` / `use_right` 是一次性请求，由 `begin_frame` 消费。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportParams {
    pub use_full: bool,
    pub use_split: bool,
    pub use_left: bool,
    pub use_right: bool,
    /// 分屏时由左侧（Main）相机接收控制
    pub control_left_side: bool,
}

impl Default for ViewportParams {
    fn default() -> Self {
        Self {
            use_full: true,
            use_split: false,
            use_left: false,
            use_right: false,
            control_left_side: true,
        }
    }
}

/// 光源交互状态
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightParams {
    /// 鼠标悬停在光源上，绘制轮廓
    pub light_hover: bool,
    /// 光源被主相机携带
    pub light_stuck: bool,
    /// 主相机足够近，可以拾取光源（`update` 写入）
    pub is_equippable: bool,
    pub light_flicker: bool,
    pub flicker_amount: f32,
}

impl Default for LightParams {
    fn default() -> Self {
        Self {
            light_hover: false,
            light_stuck: false,
            is_equippable: false,
            light_flicker: false,
            flicker_amount: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlineParams {
    pub outline_color: [f32; 3],
    pub outline_size: f32,
}

impl Default for OutlineParams {
    fn default() -> Self {
        Self {
            outline_color: [1.0, 0.6, 0.1],
            outline_size: 1.1,
        }
    }
}

/// 编辑器面板开关
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpawnWindow {
    pub scene_window: bool,
    pub light_window: bool,
    pub fog_window: bool,
    pub model_window: bool,
    pub camera_window: bool,
    pub stencil_window: bool,
}
