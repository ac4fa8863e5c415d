//! 编辑器覆盖层
//!
//! EDIT 模式下 `end_frame` 在文字之后、呈现之前调用覆盖层。
//! 主面板总是打开，其余面板由 `SpawnWindow` 的开关决定。
//! 具体的控件实现不在本 crate 中。

use tracing::trace;

use super::params::SpawnWindow;
use super::states::{CameraId, StateKey};

/// 编辑器面板
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorPanel {
    Main,
    Scene,
    Light,
    Fog,
    Model,
    Camera,
    Stencil,
}

impl SpawnWindow {
    /// 本帧需要绘制的面板（主面板在前）
    pub fn open_panels(&self) -> Vec<EditorPanel> {
        let toggles = [
            (self.scene_window, EditorPanel::Scene),
            (self.light_window, EditorPanel::Light),
            (self.fog_window, EditorPanel::Fog),
            (self.model_window, EditorPanel::Model),
            (self.camera_window, EditorPanel::Camera),
            (self.stencil_window, EditorPanel::Stencil),
        ];

        std::iter::once(EditorPanel::Main)
            .chain(toggles.into_iter().filter(|(open, _)| *open).map(|(_, panel)| panel))
            .collect()
    }
}

/// 编辑器覆盖层
pub trait EditorOverlay {
    /// 绘制打开的面板；`camera` 为当前使用的相机
    fn render(&mut self, panels: &[EditorPanel], camera: CameraId);
}

/// 不绘制任何内容的覆盖层
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOverlay;

impl EditorOverlay for NoOverlay {
    fn render(&mut self, panels: &[EditorPanel], camera: CameraId) {
        trace!(panels = panels.len(), camera = camera.name(), "Editor overlay skipped");
    }
}
