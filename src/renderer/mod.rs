//! 渲染器模块
//!
//! 本模块提供帧调度器 `Graphics` 及其依赖的状态表、常量缓冲区、着色器和绘制辅助函数。
//! 应用程序通过 `Renderer` 使用它，而不需要关心具体使用的是哪个设备。
//!
//! # 架构设计
//!
//! - `Renderer`：对外的渲染器接口
//! - `Backend`：内部枚举，封装以不同设备实例化的 `Graphics`
//! - 设备实现在 `gfx` 模块中，按 API 分类组织

use tracing::info;
#[cfg(target_os = "windows")]
use winit::window::Window;

use crate::component::Camera3D;
use crate::core::config::GraphicsBackend;
use crate::core::error::Result;
use crate::core::input::InputAction;
use crate::core::{Config, SceneConfig};
#[cfg(target_os = "windows")]
use crate::gfx::D3d11Device;
use crate::gfx::HeadlessDevice;

pub mod assets;
pub mod constant_buffer;
pub mod constants;
pub mod device;
pub mod drawable;
pub mod graphics;
pub mod overlay;
pub mod params;
pub mod shaders;
pub mod states;
pub mod text;

pub use graphics::{Graphics, GraphicsSettings};
pub use params::GameState;

use assets::FileAssets;
use overlay::EditorOverlay;

/// 以具体设备实例化的帧调度器
///
/// 通过枚举而非 trait 对象分发，`Graphics` 的泛型方法保持静态调用。
enum Backend {
    Headless(Graphics<HeadlessDevice>),
    #[cfg(target_os = "windows")]
    D3d11(Graphics<D3d11Device>),
}

pub struct Renderer {
    backend: Backend,
}

impl Renderer {
    /// 创建无窗口渲染器
    pub fn headless(config: &Config, scene: &SceneConfig) -> Result<Self> {
        info!("Initializing headless device");
        let settings = GraphicsSettings::from_config(config);
        let assets = FileAssets::new(&config.assets.root);
        let device = HeadlessDevice::new(settings.width, settings.height);
        let graphics = Graphics::initialize(device, &assets, scene, settings)?;
        Ok(Self { backend: Backend::Headless(graphics) })
    }

    /// 在窗口上创建 Direct3D 11 渲染器
    #[cfg(target_os = "windows")]
    pub fn d3d11(window: &Window, config: &Config, scene: &SceneConfig) -> Result<Self> {
        info!("Initializing Direct3D 11 device");
        let settings = GraphicsSettings::from_config(config);
        let assets = FileAssets::new(&config.assets.root);
        let device = D3d11Device::new(window, settings.width, settings.height)?;
        let graphics = Graphics::initialize(device, &assets, scene, settings)?;
        Ok(Self { backend: Backend::D3d11(graphics) })
    }

    /// 按配置选择后端；Direct3D 11 需要窗口
    #[cfg(target_os = "windows")]
    pub fn new(window: &Window, config: &Config, scene: &SceneConfig) -> Result<Self> {
        match config.graphics.backend {
            GraphicsBackend::Headless => Self::headless(config, scene),
            GraphicsBackend::D3d11 => Self::d3d11(window, config, scene),
        }
    }

    pub fn backend_kind(&self) -> GraphicsBackend {
        match &self.backend {
            Backend::Headless(_) => GraphicsBackend::Headless,
            #[cfg(target_os = "windows")]
            Backend::D3d11(_) => GraphicsBackend::D3d11,
        }
    }

    /// 渲染并呈现一帧
    pub fn draw(&mut self) -> Result<()> {
        match &mut self.backend {
            Backend::Headless(g) => g.draw_frame(),
            #[cfg(target_os = "windows")]
            Backend::D3d11(g) => g.draw_frame(),
        }
    }

    /// 推进场景（毫秒）
    pub fn update(&mut self, delta_time: f32) {
        match &mut self.backend {
            Backend::Headless(g) => g.update(delta_time),
            #[cfg(target_os = "windows")]
            Backend::D3d11(g) => g.update(delta_time),
        }
    }

    pub fn handle_action(&mut self, action: InputAction) {
        match &mut self.backend {
            Backend::Headless(g) => g.handle_action(action),
            #[cfg(target_os = "windows")]
            Backend::D3d11(g) => g.handle_action(action),
        }
    }

    /// 当前可由键盘鼠标控制的相机
    pub fn controlled_camera_mut(&mut self) -> Option<&mut Camera3D> {
        match &mut self.backend {
            Backend::Headless(g) => g.controlled_camera_mut(),
            #[cfg(target_os = "windows")]
            Backend::D3d11(g) => g.controlled_camera_mut(),
        }
    }

    pub fn game_state(&self) -> GameState {
        match &self.backend {
            Backend::Headless(g) => g.game_state,
            #[cfg(target_os = "windows")]
            Backend::D3d11(g) => g.game_state,
        }
    }

    pub fn set_game_state(&mut self, state: GameState) {
        match &mut self.backend {
            Backend::Headless(g) => g.game_state = state,
            #[cfg(target_os = "windows")]
            Backend::D3d11(g) => g.game_state = state,
        }
    }

    pub fn set_overlay(&mut self, overlay: Box<dyn EditorOverlay>) {
        match &mut self.backend {
            Backend::Headless(g) => g.set_overlay(overlay),
            #[cfg(target_os = "windows")]
            Backend::D3d11(g) => g.set_overlay(overlay),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn res_config() -> Config {
        let mut config = Config::default();
        config.assets.root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("res");
        config.graphics.backend = GraphicsBackend::Headless;
        config
    }

    #[test]
    fn test_headless_renderer_runs_bundled_scene() {
        let config = res_config();
        let scene = SceneConfig::from_file(config.scene_path()).unwrap();
        let mut renderer = Renderer::headless(&config, &scene).unwrap();
        assert_eq!(renderer.backend_kind(), GraphicsBackend::Headless);
        assert_eq!(renderer.game_state(), GameState::Menu);
        assert!(renderer.controlled_camera_mut().is_none());

        renderer.draw().unwrap();
        renderer.handle_action(InputAction::Play);
        assert!(renderer.controlled_camera_mut().is_some());
        for _ in 0..3 {
            renderer.update(16.0);
            renderer.draw().unwrap();
        }
    }

    #[test]
    fn test_missing_asset_root_fails_initialization() {
        let mut config = res_config();
        let scene = SceneConfig::from_file(config.scene_path()).unwrap();
        config.assets.root = PathBuf::from("does-not-exist");
        assert!(Renderer::headless(&config, &scene).is_err());
    }
}
