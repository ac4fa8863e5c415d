//! 场景对象模块
//!
//! - `SceneObject`：带类别标签的变换状态 + 网格/纹理句柄
//! - `Camera3D` / `Camera2D`：包装场景对象的相机
//! - `Light`：可拾取、可闪烁的点光源
//! - `collision` / `billboard`：`Graphics::update` 使用的辅助函数

pub mod game_object;
pub mod camera;
pub mod light;
pub mod collision;
pub mod billboard;

pub use game_object::{ObjectKind, SceneObject};
pub use camera::{Camera2D, Camera3D};
pub use light::Light;
