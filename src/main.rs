//! DX11 Framework - 演示程序入口
//!
//! 支持 Direct3D 11 窗口模式和 headless 模式。
//! 可以通过配置文件或命令行参数选择使用的后端。
//!
//! # 使用方法
//!
//! ```bash
//! # 使用配置文件
//! cargo run
//!
//! # 无窗口运行 300 帧
//! cargo run -- --headless --frames 300
//! ```
//!
//! # 架构概览
//!
//! ```text
//! ┌─────────────┐
//! │   main.rs   │  应用程序入口：配置、窗口、输入、主循环
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │  Renderer   │  后端选择
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │  Graphics   │  帧调度器
//! └──────┬──────┘
//!        │
//!   ┌────┴─────┐
//!   │          │
//! ┌─▼──────┐ ┌─▼────┐
//! │Headless│ │D3D11 │  RenderDevice 实现
//! └────────┘ └──────┘
//! ```

use dx11_framework::core::config::GraphicsBackend;
use dx11_framework::core::input::InputAction;
use dx11_framework::core::{log, Config, FrameworkError, SceneConfig};
use dx11_framework::renderer::Renderer;
use dx11_framework::{app_log, engine_log};

/// 帧错误处理：致命错误终止进程，其余错误只跳过本帧
fn handle_frame_error(e: FrameworkError) {
    if e.is_fatal() {
        engine_log!(error, error = %e, "Fatal rendering error, shutting down");
        eprintln!("{}", e);
        std::process::exit(-1);
    }
    engine_log!(warn, error = %e, "Frame skipped");
}

/// 应用程序入口点
///
/// # 初始化流程
///
/// 1. 加载框架配置文件（config.toml）
/// 2. 应用命令行参数覆盖并验证
/// 3. 初始化日志系统
/// 4. 加载场景描述文件（资源根目录下的 scene.toml）
/// 5. 创建渲染器并启动主循环
///
/// # 命令行参数
///
/// - `--headless` / `--d3d11`: 选择后端
/// - `--width <value>` / `--height <value>`: 设置窗口尺寸
/// - `--frames <value>`: headless 模式运行的帧数
/// - `--no-vsync`: 关闭垂直同步
fn main() {
    let mut config = Config::from_file_or_default("config.toml");
    config.apply_args(std::env::args());

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    let log_file = config.logging.file_output.then_some(config.logging.log_file.as_str());
    log::init_logger(config.logging.level, config.logging.file_output, log_file);
    app_log!(info, version = env!("CARGO_PKG_VERSION"), "DX11 Framework starting...");

    let scene = match SceneConfig::from_file(config.scene_path()) {
        Ok(scene) => scene,
        Err(e) => {
            app_log!(error, error = %e, "Failed to load scene description");
            eprintln!("Failed to load scene description: {}", e);
            std::process::exit(1);
        }
    };

    engine_log!(
        info,
        backend = config.graphics.backend.name(),
        width = config.window.width,
        height = config.window.height,
        vsync = config.graphics.vsync,
        models = scene.models.len(),
        "Graphics configuration"
    );

    let result = match config.graphics.backend {
        GraphicsBackend::Headless => run_headless(&config, &scene),
        GraphicsBackend::D3d11 => run_windowed(config, scene),
    };

    if let Err(e) = result {
        app_log!(error, error = %e, "Failed to run");
        eprintln!("Failed to run: {}", e);
        std::process::exit(1);
    }
}

/// 无窗口运行固定帧数
fn run_headless(config: &Config, scene: &SceneConfig) -> dx11_framework::core::Result<()> {
    let mut renderer = Renderer::headless(config, scene)?;
    renderer.handle_action(InputAction::Play);

    let frames = config.headless.frames;
    let dt = config.headless.frame_time_ms;
    for _ in 0..frames {
        renderer.update(dt);
        if let Err(e) = renderer.draw() {
            handle_frame_error(e);
        }
    }

    app_log!(info, frames, "Headless run finished");
    Ok(())
}

#[cfg(not(target_os = "windows"))]
fn run_windowed(_config: Config, _scene: SceneConfig) -> dx11_framework::core::Result<()> {
    Err(FrameworkError::Initialization(
        "Direct3D 11 backend is only available on Windows, use --headless".to_string(),
    ))
}

/// 创建窗口并进入事件循环
///
/// # 事件处理
///
/// - `CloseRequested`：退出程序
/// - 键盘/鼠标：交给 `InputSystem`，按键动作转发给渲染器
/// - `RedrawRequested`：更新相机和场景，渲染一帧
#[cfg(target_os = "windows")]
fn run_windowed(config: Config, scene: SceneConfig) -> dx11_framework::core::Result<()> {
    use std::time::Instant;

    use dx11_framework::core::input::InputSystem;
    use winit::dpi::PhysicalSize;
    use winit::event::{Event, KeyEvent, WindowEvent};
    use winit::event_loop::EventLoop;
    use winit::keyboard::PhysicalKey;
    use winit::window::WindowBuilder;

    let event_loop = EventLoop::new()
        .map_err(|e| FrameworkError::Initialization(format!("Failed to create event loop: {}", e)))?;
    let window = WindowBuilder::new()
        .with_title(config.window.title.clone())
        .with_inner_size(PhysicalSize::new(config.window.width, config.window.height))
        .with_resizable(config.window.resizable)
        .build(&event_loop)
        .map_err(|e| FrameworkError::Initialization(format!("Failed to create window: {}", e)))?;

    let mut renderer = Renderer::new(&window, &config, &scene)?;
    let mut input = InputSystem::new();
    let mut last_frame = Instant::now();

    engine_log!(info, "Renderer initialized, entering main loop...");

    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    app_log!(info, "Close requested, shutting down...");
                    elwt.exit();
                }
                WindowEvent::KeyboardInput {
                    event: KeyEvent { physical_key: PhysicalKey::Code(code), state, .. },
                    ..
                } => {
                    if let Some(action) = input.on_keyboard_input(code, state) {
                        renderer.handle_action(action);
                    }
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    input.on_mouse_button(&window, button, state);
                }
                WindowEvent::CursorMoved { position, .. } => {
                    input.on_mouse_move((position.x, position.y));
                }
                WindowEvent::Focused(false) => input.reset_mouse(),
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let dt = now.duration_since(last_frame).as_secs_f32() * 1000.0;
                    last_frame = now;

                    if let Some(camera) = renderer.controlled_camera_mut() {
                        input.update_camera(camera, dt);
                    }
                    renderer.update(dt);
                    if let Err(e) = renderer.draw() {
                        handle_frame_error(e);
                    }
                }
                _ => {}
            },
            Event::AboutToWait => window.request_redraw(),
            _ => {}
        })
        .map_err(|e| FrameworkError::Runtime(format!("Event loop error: {}", e)))
}
