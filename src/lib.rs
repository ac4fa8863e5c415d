//! DX11 Framework - Direct3D 11 风格的渲染框架
//!
//! 一个小型演示场景：可操控的相机、可拾取的点光源、雾效、模板遮罩、
//! 描边、分屏视口、天空盒、实例化地面以及菜单/帮助页面。
//! 本库提供帧调度器和它依赖的全部模块。
//!
//! # 模块结构
//!
//! - `core`: 核心功能模块（日志、配置、场景描述、错误处理、输入）
//! - `math`: 基于 nalgebra 的左手坐标系矩阵运算
//! - `component`: 场景对象、相机、光源、碰撞检测和公告板
//! - `geometry`: 几何体模块（顶点格式、网格、内置几何体、OBJ 加载器）
//! - `renderer`: 帧调度器、状态表、常量缓冲区、着色器
//! - `gfx`: 渲染设备实现（headless 参考设备、Direct3D 11）
//!
//! # 使用示例
//!
//! ```no_run
//! use dx11_framework::core::{Config, SceneConfig};
//! use dx11_framework::core::input::InputAction;
//! use dx11_framework::renderer::Renderer;
//!
//! let config = Config::default();
//! let scene = SceneConfig::from_file(config.scene_path()).unwrap();
//!
//! // 无窗口运行：所有调用记录在内存中
//! let mut renderer = Renderer::headless(&config, &scene).unwrap();
//! renderer.handle_action(InputAction::Play);
//! renderer.update(16.0);
//! renderer.draw().unwrap();
//! ```

pub mod core;
pub mod math;
pub mod component;
pub mod geometry;
pub mod renderer;
pub mod gfx;
