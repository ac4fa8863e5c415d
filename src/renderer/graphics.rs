//! 帧调度器
//!
//! `Graphics` 拥有设备、全部状态对象、常量缓冲区和场景，按固定顺序执行一帧：
//!
//! ```text
//! begin_frame   绑定离屏目标、状态、视口、采样器；上传雾效/光源/场景常量缓冲区
//! render_frame  遮罩 -> 模型 -> 基础几何体 -> 光源（轮廓）-> 菜单 -> 天空盒
//! end_frame     后处理到后缓冲区 -> 文字 -> 编辑器面板 -> 解绑 -> 呈现
//! ```
//!
//! 分屏模式下 `draw_frame` 先后以左、右视口执行 `begin_frame + render_frame`，
//! 最后执行一次 `end_frame`。
//!
//! 常量缓冲区上传失败会中止当前阶段：本帧后续阶段返回 `FrameAborted`，
//! 不再发出任何绘制调用，也不呈现。呈现失败是致命错误。

use tracing::{debug, error, info, warn};

use crate::component::{billboard, collision, Camera2D, Camera3D, Light, ObjectKind, SceneObject};
use crate::core::config::Config;
use crate::core::error::{FrameworkError, GraphicsError, Result};
use crate::core::input::InputAction;
use crate::core::scene::{ModelConfig, SceneConfig};
use crate::geometry::primitives;
use crate::math::Vector3;
use super::assets::{paths, AssetLoader};
use super::constant_buffer::ConstantBuffer;
use super::constants::{
    matrix_data, slots, CbPsLight, CbPsOutline, CbPsScene, CbVsFog, CbVsFullscreen, CbVsMatrix,
    CbVsMatrix2D,
};
use super::device::{GpuMesh, RenderDevice, RenderTarget, ShaderResource, ShaderStage, TextureHandle};
use super::drawable::{draw_object, draw_sprite, upload_mesh, Ground};
use super::overlay::{EditorOverlay, NoOverlay};
use super::params::{
    GameState, HelpPage, LightParams, OutlineParams, SceneParams, SpawnWindow, ViewportParams,
};
use super::shaders::ShaderSet;
use super::states::{
    select_bindings, CameraId, RasterizerMode, RenderStates, StateTable, StencilMode,
};
use super::text::TextRenderer;

pub const TEXT_EQUIP_LIGHT: &str = "Press 'C' to equip light.";
pub const TEXT_HELP: &str = "Press 'F3' to view help menu.";
pub const TEXT_SWITCH_TO_EDIT: &str = "Press 'F2' to switch to EDIT mode.";
pub const TEXT_SWITCH_TO_PLAY: &str = "Press 'F1' to switch to PLAY mode.";

const CUBE_COUNT: usize = 3;
const GROUND_TILES: u32 = 400;
const GROUND_TILE_SIZE: f32 = 10.0;
const SKYBOX_SCALE: f32 = 500.0;
const MASK_SIZE: f32 = 256.0;
const MENU_ALPHA: f32 = 0.9;

const CAMERA_FOV: f32 = 70.0;
const CAMERA_NEAR: f32 = 0.1;
const CAMERA_FAR: f32 = 1000.0;

/// 点相机与第 0 个模型的碰撞圆柱
const COLLISION_RADIUS: f32 = 20.0;
const COLLISION_HEIGHT: f32 = 10.0;
/// 主相机拾取光源的距离
const EQUIP_RADIUS: f32 = 5.0;

/// 初始化参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphicsSettings {
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl GraphicsSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            width: config.window.width,
            height: config.window.height,
            vsync: config.graphics.vsync,
        }
    }
}

/// 当前帧所处的阶段
#[derive(Debug, Clone, PartialEq, Eq)]
enum FrameState {
    Idle,
    Recording,
    Aborted(String),
}

/// 菜单和遮罩精灵
#[derive(Debug, Clone)]
struct Sprites {
    background: SceneObject,
    logo: SceneObject,
    help_camera: SceneObject,
    help_light: SceneObject,
    help_scene: SceneObject,
    circle: SceneObject,
    square: SceneObject,
}

impl Sprites {
    fn help_page(&self, page: HelpPage) -> &SceneObject {
        match page {
            HelpPage::Camera => &self.help_camera,
            HelpPage::Light => &self.help_light,
            HelpPage::Scene => &self.help_scene,
        }
    }
}

/// 帧调度器
pub struct Graphics<D: RenderDevice> {
    device: D,
    width: u32,
    height: u32,
    vsync: bool,

    states: RenderStates,
    shaders: ShaderSet,

    cb_vs_matrix: ConstantBuffer<CbVsMatrix>,
    cb_vs_matrix_2d: ConstantBuffer<CbVsMatrix2D>,
    cb_vs_fullscreen: ConstantBuffer<CbVsFullscreen>,
    cb_vs_fog: ConstantBuffer<CbVsFog>,
    cb_ps_light: ConstantBuffer<CbPsLight>,
    cb_ps_scene: ConstantBuffer<CbPsScene>,
    cb_ps_outline: ConstantBuffer<CbPsOutline>,

    cameras: StateTable<CameraId, Camera3D>,
    camera_2d: Camera2D,
    camera_to_use: CameraId,
    light: Light,
    renderables: Vec<SceneObject>,
    cubes: Vec<SceneObject>,
    skybox: SceneObject,
    ground: Ground,
    fullscreen: GpuMesh,
    sprites: Sprites,
    text: TextRenderer,

    overlay: Box<dyn EditorOverlay>,
    frame_state: FrameState,

    pub game_state: GameState,
    pub help_page: HelpPage,
    pub scene_params: SceneParams,
    pub viewport_params: ViewportParams,
    pub light_params: LightParams,
    pub outline_params: OutlineParams,
    pub spawn_window: SpawnWindow,
}

fn load_texture<D, A>(device: &mut D, assets: &A, path: &str) -> Result<TextureHandle>
where
    D: RenderDevice + ?Sized,
    A: AssetLoader + ?Sized,
{
    let texture = assets.load_texture(path)?;
    device.create_texture(path, texture.width, texture.height, &texture.rgba)
}

/// 创建窗口居中的精灵
fn centered_sprite(
    name: &str,
    mesh: GpuMesh,
    texture: TextureHandle,
    (width, height): (f32, f32),
    window: (u32, u32),
) -> SceneObject {
    let mut sprite = SceneObject::new(name, ObjectKind::Sprite { width, height }).with_mesh(mesh, Some(texture));
    sprite.set_position_xyz(
        window.0 as f32 / 2.0 - width / 2.0,
        window.1 as f32 / 2.0 - height / 2.0,
        0.0,
    );
    sprite
}

fn load_model<D, A>(device: &mut D, assets: &A, config: &ModelConfig) -> Result<SceneObject>
where
    D: RenderDevice + ?Sized,
    A: AssetLoader + ?Sized,
{
    let mesh = assets.load_mesh(&config.path)?;
    let gpu_mesh = upload_mesh(device, &mesh)?;
    let texture = match &config.texture {
        Some(path) => Some(load_texture(device, assets, path)?),
        None => None,
    };

    let mut object = SceneObject::new(config.name.clone(), ObjectKind::Model).with_mesh(gpu_mesh, texture);
    let [px, py, pz] = config.transform.position;
    let [rx, ry, rz] = config.transform.rotation_radians();
    let [sx, sy, sz] = config.transform.scale;
    object.set_position_xyz(px, py, pz);
    object.set_rotation_xyz(rx, ry, rz);
    object.set_scale(sx, sy, sz);
    Ok(object)
}

impl<D: RenderDevice> Graphics<D> {
    /// 创建状态对象、编译着色器、加载场景
    pub fn initialize<A: AssetLoader + ?Sized>(
        mut device: D,
        assets: &A,
        scene: &SceneConfig,
        settings: GraphicsSettings,
    ) -> Result<Self> {
        let GraphicsSettings { width, height, vsync } = settings;
        info!(backend = device.backend_name(), width, height, vsync, "Initializing graphics");

        if scene.models.is_empty() {
            return Err(FrameworkError::Initialization("Scene must contain at least one model".to_string()));
        }

        // 状态对象与着色器
        let states = RenderStates::new(&mut device, width, height)?;
        let shaders = ShaderSet::compile(&mut device, assets)?;

        // 常量缓冲区
        let cb_vs_matrix = ConstantBuffer::new(&mut device, "cb_vs_matrix")?;
        let cb_vs_matrix_2d = ConstantBuffer::new(&mut device, "cb_vs_matrix_2d")?;
        let cb_vs_fullscreen = ConstantBuffer::new(&mut device, "cb_vs_fullscreen")?;
        let mut cb_vs_fog = ConstantBuffer::<CbVsFog>::new(&mut device, "cb_vs_fog")?;
        let cb_ps_light = ConstantBuffer::new(&mut device, "cb_ps_light")?;
        let cb_ps_scene = ConstantBuffer::new(&mut device, "cb_ps_scene")?;
        let cb_ps_outline = ConstantBuffer::new(&mut device, "cb_ps_outline")?;

        {
            let fog = cb_vs_fog.data_mut();
            fog.fog_color = scene.fog.color;
            fog.fog_start = scene.fog.start;
            fog.fog_end = scene.fog.end;
            fog.fog_enable = scene.fog.enable as u32;
        }

        // 模型
        let renderables = scene
            .models
            .iter()
            .map(|model| load_model(&mut device, assets, model))
            .collect::<Result<Vec<_>>>()?;

        let light_mesh = assets.load_mesh(&scene.light.model)?;
        let mut light = Light::new(&scene.light);
        light.mesh = Some(upload_mesh(&mut device, &light_mesh)?);
        light.texture = Some(load_texture(&mut device, assets, &scene.light.texture)?);
        light.set_scale(1.0, 1.0, 1.0);

        // 精灵
        let window = (width, height);
        let window_size = (width as f32, height as f32);
        let quad = upload_mesh(&mut device, &primitives::sprite_quad())?;
        let sprite = |device: &mut D, name: &str, path: &str, size: (f32, f32)| -> Result<SceneObject> {
            let texture = load_texture(device, assets, path)?;
            Ok(centered_sprite(name, quad, texture, size, window))
        };
        let sprites = Sprites {
            background: sprite(&mut device, "MenuBackground", paths::TEXTURE_MENU_BG, window_size)?,
            logo: sprite(&mut device, "MenuLogo", paths::TEXTURE_MENU_LOGO, window_size)?,
            help_camera: sprite(&mut device, "HelpCamera", paths::TEXTURE_MENU_CAMERA, window_size)?,
            help_light: sprite(&mut device, "HelpLight", paths::TEXTURE_MENU_LIGHT, window_size)?,
            help_scene: sprite(&mut device, "HelpScene", paths::TEXTURE_MENU_SCENE, window_size)?,
            circle: sprite(&mut device, "MaskCircle", paths::TEXTURE_CIRCLE, (MASK_SIZE, MASK_SIZE))?,
            square: sprite(&mut device, "MaskSquare", paths::TEXTURE_SQUARE, (MASK_SIZE, MASK_SIZE))?,
        };

        // 相机
        let mut camera_2d = Camera2D::new();
        camera_2d.set_projection_values(window_size.0, window_size.1, 0.0, 1.0);

        let aspect = window_size.0 / window_size.1;
        let first_model = renderables[0].position();
        let mut cameras = StateTable::build(|id: CameraId| match id {
            CameraId::Main => Camera3D::new("Main", Vector3::new(0.0, 9.0, -20.0)),
            CameraId::Point => Camera3D::new("Point", Vector3::new(0.0, 9.0, -55.0)),
            CameraId::Third => Camera3D::new("Third", first_model),
        });
        for (_, camera) in cameras.iter_mut() {
            camera.set_projection_values(CAMERA_FOV, aspect, CAMERA_NEAR, CAMERA_FAR);
        }

        // 光源放在主相机前方
        let main = cameras.get(CameraId::Main);
        let in_front = main.position() + main.forward(false);
        light.set_position_xyz(in_front.x, crate::component::light::LIGHT_REST_HEIGHT, in_front.z + 5.0);
        light.set_rotation(main.rotation());

        // 基础几何体
        let cube_mesh = upload_mesh(&mut device, &primitives::cube())?;
        let box_texture = load_texture(&mut device, assets, paths::TEXTURE_BOX)?;
        let cubes = (0..CUBE_COUNT)
            .map(|i| {
                let mut cube = SceneObject::new(format!("Cube{}", i), ObjectKind::Primitive)
                    .with_mesh(cube_mesh, Some(box_texture));
                cube.set_position_xyz(-5.0 + i as f32 * 5.0, 9.0, 0.0);
                cube
            })
            .collect();

        let stars_texture = load_texture(&mut device, assets, paths::TEXTURE_STARS)?;
        let skybox = SceneObject::new("Skybox", ObjectKind::Primitive).with_mesh(cube_mesh, Some(stars_texture));

        let fullscreen = upload_mesh(&mut device, &primitives::fullscreen_quad())?;
        let font = assets.load_font(paths::FONT_HUD)?;
        let text = TextRenderer::new(&mut device, &font)?;

        let plane_mesh = upload_mesh(&mut device, &primitives::plane())?;
        let grass_texture = load_texture(&mut device, assets, paths::TEXTURE_GRASS)?;
        let mut ground = Ground::new(&mut device, plane_mesh, grass_texture, GROUND_TILES)?;
        ground.object.set_scale(GROUND_TILE_SIZE, 1.0, GROUND_TILE_SIZE);

        info!(
            models = renderables.len(),
            cubes = CUBE_COUNT,
            ground_tiles = ground.instance_count(),
            "Scene initialized"
        );

        Ok(Self {
            device,
            width,
            height,
            vsync,
            states,
            shaders,
            cb_vs_matrix,
            cb_vs_matrix_2d,
            cb_vs_fullscreen,
            cb_vs_fog,
            cb_ps_light,
            cb_ps_scene,
            cb_ps_outline,
            cameras,
            camera_2d,
            camera_to_use: CameraId::Main,
            light,
            renderables,
            cubes,
            skybox,
            ground,
            fullscreen,
            sprites,
            text,
            overlay: Box::new(NoOverlay),
            frame_state: FrameState::Idle,
            game_state: GameState::default(),
            help_page: HelpPage::default(),
            scene_params: SceneParams { clear_color: scene.clear_color, ..SceneParams::default() },
            viewport_params: ViewportParams::default(),
            light_params: LightParams::default(),
            outline_params: OutlineParams::default(),
            spawn_window: SpawnWindow::default(),
        })
    }

    // ========== 访问器 ==========

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn states(&self) -> &RenderStates {
        &self.states
    }

    pub fn camera_to_use(&self) -> CameraId {
        self.camera_to_use
    }

    pub fn set_camera_to_use(&mut self, camera: CameraId) {
        self.camera_to_use = camera;
    }

    pub fn camera(&self, id: CameraId) -> &Camera3D {
        self.cameras.get(id)
    }

    pub fn camera_mut(&mut self, id: CameraId) -> &mut Camera3D {
        self.cameras.get_mut(id)
    }

    pub fn light(&self) -> &Light {
        &self.light
    }

    pub fn light_mut(&mut self) -> &mut Light {
        &mut self.light
    }

    pub fn renderables(&self) -> &[SceneObject] {
        &self.renderables
    }

    pub fn renderables_mut(&mut self) -> &mut [SceneObject] {
        &mut self.renderables
    }

    pub fn cubes(&self) -> &[SceneObject] {
        &self.cubes
    }

    pub fn text(&self) -> &TextRenderer {
        &self.text
    }

    pub fn fog_mut(&mut self) -> &mut CbVsFog {
        self.cb_vs_fog.data_mut()
    }

    pub fn set_overlay(&mut self, overlay: Box<dyn EditorOverlay>) {
        self.overlay = overlay;
    }

    /// 由输入控制的相机；菜单状态和第三人称相机返回 `None`
    pub fn controlled_camera_mut(&mut self) -> Option<&mut Camera3D> {
        if self.game_state.is_menu() || self.camera_to_use == CameraId::Third {
            return None;
        }
        Some(self.cameras.get_mut(self.camera_to_use))
    }

    /// 处理按键动作
    pub fn handle_action(&mut self, action: InputAction) {
        match action {
            InputAction::Play => self.game_state = GameState::Play,
            InputAction::Edit => self.game_state = GameState::Edit,
            InputAction::Help => self.game_state = GameState::Help,
            InputAction::Menu => self.game_state = GameState::Menu,
            InputAction::NextHelpPage if self.game_state == GameState::Help => {
                self.help_page = self.help_page.next();
            }
            InputAction::PreviousHelpPage if self.game_state == GameState::Help => {
                self.help_page = self.help_page.previous();
            }
            InputAction::ToggleLight => {
                let lights = &mut self.light_params;
                if lights.light_stuck {
                    lights.light_stuck = false;
                } else if lights.is_equippable && self.camera_to_use == CameraId::Main {
                    lights.light_stuck = true;
                }
            }
            InputAction::NextHelpPage | InputAction::PreviousHelpPage => {}
        }
        debug!(?action, state = ?self.game_state, page = ?self.help_page, "Input action");
    }

    // ========== 帧 ==========

    /// 执行完整的一帧；分屏时渲染左右两次。总是调用 `end_frame`，返回第一个错误
    pub fn draw_frame(&mut self) -> Result<()> {
        let passes = self.record_passes();
        let end = self.end_frame();
        passes.and(end)
    }

    fn record_passes(&mut self) -> Result<()> {
        if self.viewport_params.use_split {
            self.viewport_params.use_left = true;
            self.begin_frame()?;
            self.render_frame()?;

            self.viewport_params.use_right = true;
            self.begin_frame()?;
            self.render_frame()
        } else {
            self.begin_frame()?;
            self.render_frame()
        }
    }

    pub fn begin_frame(&mut self) -> Result<()> {
        if let FrameState::Aborted(reason) = &self.frame_state {
            return Err(GraphicsError::FrameAborted(reason.clone()).into());
        }

        let bindings = select_bindings(&mut self.viewport_params, &self.scene_params, self.camera_to_use);
        self.camera_to_use = bindings.camera;

        // 渲染目标
        self.device.set_render_target(Some(RenderTarget::Offscreen), true);
        if bindings.clear_offscreen {
            self.device.clear_render_target(RenderTarget::Offscreen, self.scene_params.clear_color);
            self.device.clear_depth_stencil();
        }

        // 渲染状态
        self.device.set_triangle_list_topology();
        self.states.bind_rasterizer(&mut self.device, bindings.rasterizer);
        self.states.bind_stencil(&mut self.device, StencilMode::Off);
        self.states.bind_blend(&mut self.device);
        self.states.bind_viewport(&mut self.device, bindings.viewport);
        self.states.bind_sampler(&mut self.device, bindings.sampler);

        self.frame_state = FrameState::Recording;

        if let Err(e) = self.apply_frame_constants() {
            self.frame_state = FrameState::Aborted(e.to_string());
            return Err(e);
        }
        Ok(())
    }

    fn apply_frame_constants(&mut self) -> Result<()> {
        self.cb_vs_fog.apply_changes(&mut self.device)?;
        self.device.set_constant_buffer(ShaderStage::Vertex, slots::FOG, self.cb_vs_fog.buffer());
        self.device.set_constant_buffer(ShaderStage::Pixel, slots::FOG, self.cb_vs_fog.buffer());

        {
            let light = self.cb_ps_light.data_mut();
            light.use_quad = 0;
            light.light_flicker = self.light_params.light_flicker as u32;
            light.flicker_amount = self.light_params.flicker_amount;
            self.light.update_constant_buffer(light);
        }
        self.cb_ps_light.apply_changes(&mut self.device)?;
        self.device.set_constant_buffer(ShaderStage::Pixel, slots::LIGHT, self.cb_ps_light.buffer());

        {
            let scene = self.cb_ps_scene.data_mut();
            scene.alpha_factor = self.scene_params.alpha_factor;
            scene.use_texture = self.scene_params.use_texture as u32;
        }
        self.cb_ps_scene.apply_changes(&mut self.device)?;
        self.device.set_constant_buffer(ShaderStage::Pixel, slots::SCENE, self.cb_ps_scene.buffer());
        Ok(())
    }

    fn ensure_recording(&self, phase: &str) -> Result<()> {
        match &self.frame_state {
            FrameState::Recording => Ok(()),
            FrameState::Aborted(reason) => Err(GraphicsError::FrameAborted(reason.clone()).into()),
            FrameState::Idle => {
                Err(GraphicsError::FrameOrder(format!("{} called before begin_frame", phase)).into())
            }
        }
    }

    pub fn render_frame(&mut self) -> Result<()> {
        self.ensure_recording("render_frame")?;

        if let Err(e) = self.render_passes() {
            self.frame_state = FrameState::Aborted(e.to_string());
            return Err(e);
        }
        Ok(())
    }

    fn render_passes(&mut self) -> Result<()> {
        let view_projection = self.cameras.get(self.camera_to_use).view_projection();
        let world_ortho = *self.camera_2d.world_ortho_matrix();
        let device = &mut self.device;

        // 模板遮罩
        if self.scene_params.use_mask {
            self.shaders.sprite_discard.bind(device);
            self.states.bind_stencil(device, StencilMode::Mask);
            let mask = if self.scene_params.circle_mask { &self.sprites.circle } else { &self.sprites.square };
            draw_sprite(device, &mut self.cb_vs_matrix_2d, mask, &world_ortho)?;
            self.states.bind_stencil(device, StencilMode::Write);
        }

        // 模型
        self.shaders.model.bind(device);
        for object in &self.renderables {
            draw_object(device, &mut self.cb_vs_matrix, object, &view_projection)?;
        }

        // 基础几何体
        for cube in &self.cubes {
            draw_object(device, &mut self.cb_vs_matrix, cube, &view_projection)?;
        }
        self.shaders.model_instanced.bind(device);
        self.ground.draw(device, &mut self.cb_vs_matrix, &mut self.cb_ps_light, &view_projection)?;

        // 光源轮廓
        if self.light_params.light_hover {
            self.cb_ps_outline.data_mut().outline_color = self.outline_params.outline_color;
            self.cb_ps_outline.apply_changes(device)?;
            device.set_constant_buffer(ShaderStage::Pixel, slots::OUTLINE, self.cb_ps_outline.buffer());

            self.shaders.model.bind(device);
            self.states.bind_stencil(device, StencilMode::Write);
            draw_object(device, &mut self.cb_vs_matrix, &self.light, &view_projection)?;

            let size = self.outline_params.outline_size;
            self.shaders.outline.bind(device);
            self.light.set_scale(size, size, size);
            self.states.bind_stencil(device, StencilMode::Mask);
            draw_object(device, &mut self.cb_vs_matrix, &self.light, &view_projection)?;

            device.set_constant_buffer(ShaderStage::Pixel, slots::FOG, self.cb_vs_fog.buffer());
        }

        self.shaders.model_no_light.bind(device);
        self.light.set_scale(1.0, 1.0, 1.0);
        draw_object(device, &mut self.cb_vs_matrix, &self.light, &view_projection)?;

        // 菜单
        if self.game_state.is_menu() {
            self.shaders.sprite.bind(device);

            {
                let scene = self.cb_ps_scene.data_mut();
                scene.alpha_factor = MENU_ALPHA;
                scene.use_texture = 0;
            }
            self.cb_ps_scene.apply_changes(device)?;
            device.set_constant_buffer(ShaderStage::Pixel, slots::SPRITE_SCENE, self.cb_ps_scene.buffer());
            draw_sprite(device, &mut self.cb_vs_matrix_2d, &self.sprites.background, &world_ortho)?;

            self.cb_ps_scene.data_mut().use_texture = 1;
            self.cb_ps_scene.apply_changes(device)?;
            device.set_constant_buffer(ShaderStage::Pixel, slots::SPRITE_SCENE, self.cb_ps_scene.buffer());
            let page = if self.game_state == GameState::Menu {
                &self.sprites.logo
            } else {
                self.sprites.help_page(self.help_page)
            };
            draw_sprite(device, &mut self.cb_vs_matrix_2d, page, &world_ortho)?;
        }

        // 天空盒（由点光源开关控制）
        if self.cb_ps_light.data().use_point_light != 0 {
            self.shaders.model.bind(device);
            self.skybox.set_scale(SKYBOX_SCALE, SKYBOX_SCALE, SKYBOX_SCALE);
            self.skybox.set_position(self.cameras.get(self.camera_to_use).position());
            self.states.bind_stencil(device, StencilMode::Off);
            self.states.bind_rasterizer(device, RasterizerMode::Cubemap);
            draw_object(device, &mut self.cb_vs_matrix, &self.skybox, &view_projection)?;
            self.states
                .bind_rasterizer(device, RasterizerMode::from_solid(self.scene_params.rasterizer_solid));
        }

        Ok(())
    }

    pub fn end_frame(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.frame_state, FrameState::Idle) {
            FrameState::Recording => {}
            FrameState::Aborted(reason) => {
                warn!(reason = %reason, "Frame aborted, skipping presentation");
                return Err(GraphicsError::FrameAborted(reason).into());
            }
            FrameState::Idle => {
                return Err(GraphicsError::FrameOrder("end_frame called before begin_frame".to_string()).into());
            }
        }

        // 后缓冲区
        self.device.set_render_target(Some(RenderTarget::BackBuffer), false);
        self.device.clear_render_target(RenderTarget::BackBuffer, self.scene_params.clear_color);

        // 后处理：采样离屏目标，总是实心绘制
        self.cb_vs_fullscreen.data_mut().multi_view = self.scene_params.multi_view as u32;
        self.cb_vs_fullscreen.apply_changes(&mut self.device)?;
        self.shaders.fullscreen.bind(&mut self.device);
        self.device
            .set_constant_buffer(ShaderStage::Vertex, slots::MATRIX, self.cb_vs_fullscreen.buffer());
        self.states.bind_rasterizer(&mut self.device, RasterizerMode::Solid);
        self.device.set_shader_resource(0, Some(ShaderResource::OffscreenTarget));
        self.fullscreen.draw(&mut self.device);

        let text = self.draw_text();

        if self.game_state == GameState::Edit {
            let panels = self.spawn_window.open_panels();
            self.overlay.render(&panels, self.camera_to_use);
        }

        // 解绑，下一帧可以再次写入离屏目标
        self.device.set_render_target(None, false);
        self.device.set_shader_resource(0, None);

        if let Err(e) = text {
            warn!(error = %e, "Text upload failed, skipping presentation");
            return Err(e);
        }

        let sync_interval = if self.vsync { 1 } else { 0 };
        self.device.present(sync_interval).map_err(|e| {
            error!(error = %e, "Failed to present frame");
            e
        })
    }

    /// 提示文字：精灵着色器 + 2D 矩阵，场景参数在槽位 1 打开纹理
    fn draw_text(&mut self) -> Result<()> {
        self.text.begin();
        let (w, h) = (self.width as f32, self.height as f32);

        let mut lines = Vec::new();
        if !self.game_state.is_menu() {
            let mut equip_position = [w / 2.0 - 115.0, h / 2.0 - 20.0];
            if self.viewport_params.use_split {
                equip_position[0] = equip_position[0] / 2.0 - 50.0;
            }

            if self.light_params.is_equippable
                && self.camera_to_use == CameraId::Main
                && !self.light_params.light_stuck
            {
                lines.push((TEXT_EQUIP_LIGHT, equip_position));
            }
            lines.push((TEXT_HELP, [w / 2.0 - 150.0, 0.0]));
        }

        let mode_position = [w - 350.0, 0.0];
        match self.game_state {
            GameState::Play => lines.push((TEXT_SWITCH_TO_EDIT, mode_position)),
            GameState::Edit => lines.push((TEXT_SWITCH_TO_PLAY, mode_position)),
            GameState::Menu | GameState::Help => {}
        }
        if lines.is_empty() {
            return Ok(());
        }

        let device = &mut self.device;
        self.shaders.sprite.bind(device);
        self.cb_vs_matrix_2d.data_mut().wvp = matrix_data(self.camera_2d.world_ortho_matrix());
        self.cb_vs_matrix_2d.apply_changes(device)?;
        device.set_constant_buffer(ShaderStage::Vertex, slots::MATRIX, self.cb_vs_matrix_2d.buffer());

        {
            let scene = self.cb_ps_scene.data_mut();
            scene.alpha_factor = 1.0;
            scene.use_texture = 1;
        }
        self.cb_ps_scene.apply_changes(device)?;
        device.set_constant_buffer(ShaderStage::Pixel, slots::SPRITE_SCENE, self.cb_ps_scene.buffer());

        for (line, position) in lines {
            self.text.draw(device, line, position)?;
        }
        Ok(())
    }

    // ========== 更新 ==========

    /// 推进动画和交互状态（毫秒），不访问 GPU
    pub fn update(&mut self, dt: f32) {
        for cube in &mut self.cubes {
            cube.adjust_rotation_xyz(0.0, 0.001 * dt, 0.0);
        }
        self.ground.animate(dt);

        let model = &self.renderables[0];
        self.cameras.get_mut(CameraId::Third).update_third_person(model);
        self.scene_params.camera_collision =
            collision::check_cylinder(self.cameras.get(CameraId::Point), model, COLLISION_RADIUS, COLLISION_HEIGHT);

        if self.scene_params.use_billboarding && self.camera_to_use != CameraId::Third {
            let yaw = billboard::billboard_yaw(self.cameras.get(self.camera_to_use), model);
            self.renderables[0].set_rotation_xyz(0.0, yaw, 0.0);
        }

        let main = self.cameras.get(CameraId::Main);
        self.light.update_physics(main, self.light_params.light_stuck, dt);
        self.light
            .update_flicker(self.light_params.light_flicker, self.light_params.flicker_amount, dt);
        self.light_params.is_equippable = collision::check_sphere(main, &self.light, EQUIP_RADIUS);

        debug!(
            camera_collision = self.scene_params.camera_collision,
            equippable = self.light_params.is_equippable,
            "Scene updated"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::headless::{Command, HeadlessDevice};
    use crate::renderer::assets::testing;
    use crate::renderer::device::{ShaderHandle, StateHandle, Viewport};
    use crate::renderer::overlay::EditorPanel;
    use crate::renderer::states::ViewportSide;
    use std::cell::RefCell;
    use std::rc::Rc;

    const SCENE: &str = r#"
        [[models]]
        name = "Nanosuit"
        path = "models/nanosuit.obj"
        texture = "textures/nanosuit.png"
        [models.transform]
        position = [0.0, 0.0, 10.0]
    "#;

    fn graphics() -> Graphics<HeadlessDevice> {
        let scene = SceneConfig::from_toml_str(SCENE).unwrap();
        let assets = testing::assets_for(&scene);
        let settings = GraphicsSettings { width: 800, height: 600, vsync: true };
        let mut graphics = Graphics::initialize(HeadlessDevice::new(800, 600), &assets, &scene, settings).unwrap();
        graphics.game_state = GameState::Play;
        graphics.device_mut().clear_commands();
        graphics
    }

    fn draws(commands: &[Command]) -> Vec<(Option<(ShaderHandle, ShaderHandle)>, u32)> {
        let mut shaders = None;
        let mut out = Vec::new();
        for command in commands {
            match command {
                Command::SetShaders { vs, ps } => shaders = Some((*vs, *ps)),
                Command::Draw { index_count, .. } => out.push((shaders, *index_count)),
                _ => {}
            }
        }
        out
    }

    fn texts(graphics: &Graphics<HeadlessDevice>) -> Vec<String> {
        graphics.text().runs().iter().map(|run| run.text.clone()).collect()
    }

    fn bound_stencil(graphics: &Graphics<HeadlessDevice>) -> StateHandle {
        graphics.device().bound().depth_stencil.map(|(state, _)| state).unwrap()
    }

    #[test]
    fn test_initialize_builds_scene() {
        let graphics = graphics();
        assert_eq!(graphics.renderables().len(), 1);
        assert_eq!(graphics.cubes().len(), 3);
        assert_eq!(graphics.camera(CameraId::Main).position(), Vector3::new(0.0, 9.0, -20.0));
        assert_eq!(graphics.camera(CameraId::Point).position(), Vector3::new(0.0, 9.0, -55.0));
        assert_eq!(graphics.camera(CameraId::Third).position(), Vector3::new(0.0, 0.0, 10.0));

        let light = graphics.light().position();
        assert_eq!(light.y, 5.25);
        assert!((light.z - (-14.0)).abs() < 1e-4);
    }

    #[test]
    fn test_missing_texture_fails_initialization() {
        let scene = SceneConfig::from_toml_str(SCENE).unwrap();
        let mut assets = testing::assets_for(&scene);
        assets.remove(paths::TEXTURE_STARS);
        let settings = GraphicsSettings { width: 800, height: 600, vsync: true };

        assert!(Graphics::initialize(HeadlessDevice::new(800, 600), &assets, &scene, settings).is_err());
    }

    #[test]
    fn test_default_flags_bind_solid_full_main() {
        let mut graphics = graphics();
        graphics.begin_frame().unwrap();

        let bound = graphics.device().bound();
        assert_eq!(bound.rasterizer, Some(*graphics.states().rasterizers.get(RasterizerMode::Solid)));
        assert_eq!(bound.viewport, Some(Viewport::new(0.0, 0.0, 800.0, 600.0)));
        assert_eq!(bound.viewport, Some(*graphics.states().viewports.get(ViewportSide::Full)));
        assert_eq!(graphics.camera_to_use(), CameraId::Main);
        assert_eq!(bound.render_target, Some(RenderTarget::Offscreen));
        assert!(graphics.device().commands().contains(&Command::ClearRenderTarget(RenderTarget::Offscreen)));
    }

    #[test]
    fn test_begin_frame_binds_frame_constants() {
        let mut graphics = graphics();
        graphics.begin_frame().unwrap();

        let cbs = &graphics.device().bound().constant_buffers;
        let fog = graphics.device().buffer_named("cb_vs_fog").unwrap();
        assert_eq!(cbs.get(&(ShaderStage::Vertex, slots::FOG)), Some(&fog));
        assert_eq!(cbs.get(&(ShaderStage::Pixel, slots::FOG)), Some(&fog));
        assert_eq!(
            cbs.get(&(ShaderStage::Pixel, slots::LIGHT)),
            graphics.device().buffer_named("cb_ps_light").as_ref()
        );
        assert_eq!(
            cbs.get(&(ShaderStage::Pixel, slots::SCENE)),
            graphics.device().buffer_named("cb_ps_scene").as_ref()
        );
    }

    #[test]
    fn test_flush_failure_prevents_all_draws() {
        for buffer in ["cb_vs_fog", "cb_ps_light", "cb_ps_scene"] {
            let mut graphics = graphics();
            graphics.device_mut().fail_uploads_to(buffer);

            let err = graphics.draw_frame().unwrap_err();
            assert!(!err.is_fatal(), "{}", buffer);
            assert_eq!(graphics.device().draw_count(), 0, "{}", buffer);
            assert_eq!(graphics.device().frames_presented(), 0, "{}", buffer);

            // 后续阶段报告中止
            graphics.device_mut().clear_upload_failures();
            graphics.device_mut().fail_uploads_to(buffer);
            assert!(graphics.begin_frame().is_err());
            assert!(matches!(
                graphics.render_frame(),
                Err(FrameworkError::Graphics(GraphicsError::FrameAborted(_)))
            ));
            assert!(graphics.end_frame().is_err());

            // 恢复后下一帧正常
            graphics.device_mut().clear_upload_failures();
            graphics.draw_frame().unwrap();
            assert_eq!(graphics.device().frames_presented(), 1);
        }
    }

    #[test]
    fn test_render_before_begin_is_an_order_error() {
        let mut graphics = graphics();
        assert!(matches!(
            graphics.render_frame(),
            Err(FrameworkError::Graphics(GraphicsError::FrameOrder(_)))
        ));
        assert!(graphics.end_frame().is_err());
        assert_eq!(graphics.device().draw_count(), 0);
    }

    #[test]
    fn test_mask_toggle_leaves_write_then_restores_order() {
        let mut graphics = graphics();
        graphics.light_mut().use_point_light = false;

        graphics.draw_frame().unwrap();
        let baseline = draws(graphics.device().commands());
        graphics.device_mut().clear_commands();

        // 第一帧：遮罩打开
        graphics.scene_params.use_mask = true;
        graphics.begin_frame().unwrap();
        graphics.render_frame().unwrap();
        let write = graphics.states().stencils.get(StencilMode::Write).state;
        assert_eq!(bound_stencil(&graphics), write);
        graphics.end_frame().unwrap();
        let masked = draws(graphics.device().commands());
        graphics.device_mut().clear_commands();

        assert_eq!(masked.len(), baseline.len() + 1);
        assert_eq!(masked[0].0.map(|(_, ps)| ps), Some(graphics.shaders.sprite_discard.ps));
        assert_eq!(&masked[1..], &baseline[..]);

        // 第二帧：遮罩关闭
        graphics.scene_params.use_mask = false;
        graphics.begin_frame().unwrap();
        graphics.render_frame().unwrap();
        let off = graphics.states().stencils.get(StencilMode::Off).state;
        assert_eq!(bound_stencil(&graphics), off);
        graphics.end_frame().unwrap();
        assert_eq!(draws(graphics.device().commands()), baseline);
    }

    #[test]
    fn test_no_render_target_hazards_across_frames() {
        let mut graphics = graphics();
        for frame in 0..6 {
            graphics.viewport_params.use_split = frame % 2 == 1;
            graphics.scene_params.multi_view = frame % 3 == 0;
            graphics.draw_frame().unwrap();
        }
        assert!(graphics.device().hazards().is_empty(), "{:?}", graphics.device().hazards());
        assert_eq!(graphics.device().frames_presented(), 6);
        assert!(graphics.device().bound().shader_resources.is_empty());
        assert_eq!(graphics.device().bound().render_target, None);
    }

    #[test]
    fn test_split_view_renders_left_then_right() {
        let mut graphics = graphics();
        graphics.viewport_params.use_split = true;
        graphics.viewport_params.use_full = false;
        graphics.draw_frame().unwrap();

        let commands = graphics.device().commands();
        let viewports: Vec<Viewport> = commands
            .iter()
            .filter_map(|c| match c {
                Command::SetViewport(v) => Some(*v),
                _ => None,
            })
            .collect();
        assert_eq!(
            viewports,
            vec![Viewport::new(0.0, 0.0, 400.0, 600.0), Viewport::new(400.0, 0.0, 400.0, 600.0)]
        );

        let clears = commands
            .iter()
            .filter(|c| **c == Command::ClearRenderTarget(RenderTarget::Offscreen))
            .count();
        assert_eq!(clears, 1);
        assert_eq!(graphics.camera_to_use(), CameraId::Point);
        assert_eq!(graphics.device().frames_presented(), 1);
    }

    #[test]
    fn test_presentation_failure_is_fatal() {
        let mut graphics = graphics();
        graphics.device_mut().fail_next_present(Some("DXGI_ERROR_DEVICE_HUNG"));

        let err = graphics.draw_frame().unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("DXGI_ERROR_DEVICE_HUNG"));
    }

    #[test]
    fn test_vsync_controls_sync_interval() {
        let mut graphics = graphics();
        graphics.vsync = false;
        graphics.draw_frame().unwrap();
        assert!(graphics.device().commands().contains(&Command::Present { sync_interval: 0 }));
    }

    #[test]
    fn test_skybox_follows_point_light_flag() {
        let mut graphics = graphics();
        let cubemap = *graphics.states().rasterizers.get(RasterizerMode::Cubemap);

        graphics.draw_frame().unwrap();
        assert!(graphics.device().commands().contains(&Command::SetRasterizer(cubemap)));
        assert_eq!(graphics.skybox.position(), graphics.camera(CameraId::Main).position());
        assert_eq!(graphics.skybox.scale(), Vector3::new(500.0, 500.0, 500.0));

        graphics.device_mut().clear_commands();
        graphics.light_mut().use_point_light = false;
        graphics.draw_frame().unwrap();
        assert!(!graphics.device().commands().contains(&Command::SetRasterizer(cubemap)));
    }

    #[test]
    fn test_wireframe_is_restored_after_skybox() {
        let mut graphics = graphics();
        graphics.scene_params.rasterizer_solid = false;
        graphics.begin_frame().unwrap();
        graphics.render_frame().unwrap();

        let wireframe = *graphics.states().rasterizers.get(RasterizerMode::Wireframe);
        assert_eq!(graphics.device().bound().rasterizer, Some(wireframe));

        // 后处理总是实心
        graphics.end_frame().unwrap();
        let solid = *graphics.states().rasterizers.get(RasterizerMode::Solid);
        assert_eq!(graphics.device().bound().rasterizer, Some(solid));
    }

    #[test]
    fn test_outline_pass() {
        let mut graphics = graphics();
        graphics.light_params.light_hover = true;
        graphics.begin_frame().unwrap();
        graphics.render_frame().unwrap();

        let outline = graphics.device().buffer_named("cb_ps_outline").unwrap();
        let commands = graphics.device().commands();
        let outline_bind = Command::SetConstantBuffer { stage: ShaderStage::Pixel, slot: slots::OUTLINE, buffer: outline };
        assert!(commands.contains(&outline_bind));

        let outline_draws = draws(commands)
            .into_iter()
            .filter(|(shaders, _)| *shaders == Some((graphics.shaders.outline.vs, graphics.shaders.outline.ps)))
            .count();
        assert_eq!(outline_draws, 1);

        // 雾效重新占用槽位 1，光源恢复原始大小
        let fog = graphics.device().buffer_named("cb_vs_fog").unwrap();
        assert_eq!(graphics.device().bound().constant_buffers.get(&(ShaderStage::Pixel, slots::FOG)), Some(&fog));
        assert_eq!(graphics.light().scale(), Vector3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_outline_upload_failure_aborts_rest_of_frame() {
        let mut graphics = graphics();
        graphics.light_params.light_hover = true;
        graphics.device_mut().fail_uploads_to("cb_ps_outline");

        assert!(graphics.draw_frame().is_err());
        assert_eq!(graphics.device().frames_presented(), 0);
        let has_light_draw = draws(graphics.device().commands())
            .iter()
            .any(|(shaders, _)| shaders.map(|(_, ps)| ps) == Some(graphics.shaders.model_no_light.ps));
        assert!(!has_light_draw);
    }

    #[test]
    fn test_menu_pass_draws_background_and_page() {
        let mut graphics = graphics();
        graphics.game_state = GameState::Help;
        graphics.help_page = HelpPage::Light;
        graphics.draw_frame().unwrap();

        let sprite_draws = draws(graphics.device().commands())
            .into_iter()
            .filter(|(shaders, _)| *shaders == Some((graphics.shaders.sprite.vs, graphics.shaders.sprite.ps)))
            .count();
        assert_eq!(sprite_draws, 2);

        let page_texture = graphics.sprites.help_light.texture.unwrap();
        assert!(graphics
            .device()
            .commands()
            .contains(&Command::SetShaderResource { slot: 0, resource: Some(ShaderResource::Texture(page_texture)) }));
        assert!(texts(&graphics).is_empty());
    }

    #[test]
    fn test_mode_prompts() {
        let mut graphics = graphics();
        graphics.draw_frame().unwrap();
        assert_eq!(texts(&graphics), vec![TEXT_HELP, TEXT_SWITCH_TO_EDIT]);

        graphics.device_mut().clear_commands();
        graphics.game_state = GameState::Edit;
        graphics.draw_frame().unwrap();
        assert_eq!(texts(&graphics), vec![TEXT_HELP, TEXT_SWITCH_TO_PLAY]);
    }

    #[test]
    fn test_text_drawn_as_atlas_quads_with_sprite_shader() {
        let mut graphics = graphics();
        graphics.draw_frame().unwrap();

        let sprite = (graphics.shaders.sprite.vs, graphics.shaders.sprite.ps);
        let glyphs: u32 = graphics.text().runs().iter().map(|run| run.glyphs).sum();
        assert!(glyphs > 0);

        let text_draws: Vec<u32> = draws(graphics.device().commands())
            .into_iter()
            .filter(|(shaders, _)| *shaders == Some(sprite))
            .map(|(_, index_count)| index_count)
            .collect();
        assert_eq!(text_draws.len(), 2);
        assert_eq!(text_draws.iter().sum::<u32>(), glyphs * 6);

        let atlas = Some(ShaderResource::Texture(graphics.text().texture()));
        assert!(graphics.device().commands().contains(&Command::SetShaderResource { slot: 0, resource: atlas }));

        // 精灵着色器在槽位 1 读取场景参数：纹理打开，完全不透明
        let scene = graphics.device().buffer_named("cb_ps_scene").unwrap();
        let bound = graphics.device().bound();
        assert_eq!(bound.constant_buffers.get(&(ShaderStage::Pixel, slots::SPRITE_SCENE)), Some(&scene));
        let data: CbPsScene = bytemuck::pod_read_unaligned(&graphics.device().buffer_contents(scene).unwrap()[..16]);
        assert_eq!((data.alpha_factor, data.use_texture), (1.0, 1));

        let matrix_2d = graphics.device().buffer_named("cb_vs_matrix_2d").unwrap();
        assert_eq!(bound.constant_buffers.get(&(ShaderStage::Vertex, slots::MATRIX)), Some(&matrix_2d));
    }

    #[test]
    fn test_text_upload_failure_skips_presentation() {
        let mut graphics = graphics();
        graphics.device_mut().fail_uploads_to("Text_vb");

        let err = graphics.draw_frame().unwrap_err();
        assert!(!err.is_fatal());
        assert_eq!(graphics.device().frames_presented(), 0);
        assert!(graphics.device().bound().shader_resources.is_empty());

        graphics.device_mut().clear_upload_failures();
        graphics.draw_frame().unwrap();
        assert!(graphics.device().hazards().is_empty());
        assert_eq!(graphics.device().frames_presented(), 1);
    }

    #[test]
    fn test_missing_font_fails_initialization() {
        let scene = SceneConfig::from_toml_str(SCENE).unwrap();
        let mut assets = testing::assets_for(&scene);
        assets.remove(paths::FONT_HUD);
        let settings = GraphicsSettings { width: 800, height: 600, vsync: true };
        assert!(Graphics::initialize(HeadlessDevice::new(800, 600), &assets, &scene, settings).is_err());
    }

    #[test]
    fn test_light_drawn_with_its_own_texture() {
        let mut graphics = graphics();
        let light_texture = graphics.light().texture.unwrap();
        assert_eq!(graphics.device().texture_info(light_texture).map(|(name, ..)| name), Some("textures/light.png"));

        graphics.begin_frame().unwrap();
        graphics.render_frame().unwrap();

        // 无光照着色器的那次绘制之前，槽位 0 上是光源自己的纹理
        let no_light = graphics.shaders.model_no_light.ps;
        let mut shaders = None;
        let mut texture = None;
        let mut light_draws = Vec::new();
        for command in graphics.device().commands() {
            match command {
                Command::SetShaders { ps, .. } => shaders = Some(*ps),
                Command::SetShaderResource { slot: 0, resource } => texture = *resource,
                Command::Draw { .. } if shaders == Some(no_light) => light_draws.push(texture),
                _ => {}
            }
        }
        assert_eq!(light_draws, vec![Some(ShaderResource::Texture(light_texture))]);
    }

    fn equip_hint(graphics: &Graphics<HeadlessDevice>) -> Option<[f32; 2]> {
        graphics
            .text()
            .runs()
            .iter()
            .find(|run| run.text == TEXT_EQUIP_LIGHT)
            .map(|run| run.position)
    }

    #[test]
    fn test_equip_hint_only_for_main_camera() {
        let mut graphics = graphics();
        graphics.light_params.is_equippable = true;
        graphics.draw_frame().unwrap();
        assert_eq!(equip_hint(&graphics), Some([285.0, 280.0]));

        graphics.device_mut().clear_commands();
        graphics.light_params.light_stuck = true;
        graphics.draw_frame().unwrap();
        assert_eq!(equip_hint(&graphics), None);

        // 分屏时右侧最后渲染，当前相机为 Point
        graphics.device_mut().clear_commands();
        graphics.light_params.light_stuck = false;
        graphics.viewport_params.use_split = true;
        graphics.draw_frame().unwrap();
        assert_eq!(graphics.camera_to_use(), CameraId::Point);
        assert_eq!(equip_hint(&graphics), None);
    }

    struct RecordingOverlay(Rc<RefCell<Vec<Vec<EditorPanel>>>>);

    impl EditorOverlay for RecordingOverlay {
        fn render(&mut self, panels: &[EditorPanel], _camera: CameraId) {
            self.0.borrow_mut().push(panels.to_vec());
        }
    }

    #[test]
    fn test_overlay_only_in_edit_mode() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut graphics = graphics();
        graphics.set_overlay(Box::new(RecordingOverlay(calls.clone())));
        graphics.spawn_window.light_window = true;

        graphics.draw_frame().unwrap();
        assert!(calls.borrow().is_empty());

        graphics.game_state = GameState::Edit;
        graphics.draw_frame().unwrap();
        assert_eq!(*calls.borrow(), vec![vec![EditorPanel::Main, EditorPanel::Light]]);
    }

    #[test]
    fn test_update_spins_cubes_and_checks_proximity() {
        let mut graphics = graphics();
        graphics.update(1000.0);

        for cube in graphics.cubes() {
            assert!((cube.rotation().y - 1.0).abs() < 1e-6);
        }
        // 光源在 (0, 5.25, -14)，距主相机约 7 个单位
        assert!(!graphics.light_params.is_equippable);
        assert!(!graphics.scene_params.camera_collision);

        graphics.camera_mut(CameraId::Main).set_position_xyz(0.0, 7.0, -14.0);
        graphics.update(16.0);
        assert!(graphics.light_params.is_equippable);

        graphics.camera_mut(CameraId::Point).set_position_xyz(0.0, 5.0, 5.0);
        graphics.camera_mut(CameraId::Main).set_position_xyz(100.0, 9.0, 100.0);
        graphics.update(16.0);
        assert!(graphics.scene_params.camera_collision);
        assert!(!graphics.light_params.is_equippable);
    }

    #[test]
    fn test_billboarding_skipped_for_third_person() {
        let mut graphics = graphics();
        graphics.scene_params.use_billboarding = true;

        graphics.set_camera_to_use(CameraId::Third);
        graphics.update(16.0);
        assert_eq!(graphics.renderables()[0].rotation().y, 0.0);

        graphics.set_camera_to_use(CameraId::Main);
        graphics.camera_mut(CameraId::Main).set_position_xyz(-20.0, 9.0, 10.0);
        graphics.update(16.0);
        let yaw = graphics.renderables()[0].rotation().y;
        assert!((yaw - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn test_actions_switch_state_and_pages() {
        let mut graphics = graphics();
        graphics.handle_action(InputAction::NextHelpPage);
        assert_eq!(graphics.help_page, HelpPage::Camera);

        graphics.handle_action(InputAction::Help);
        graphics.handle_action(InputAction::PreviousHelpPage);
        assert_eq!(graphics.game_state, GameState::Help);
        assert_eq!(graphics.help_page, HelpPage::Scene);
        assert!(graphics.controlled_camera_mut().is_none());

        graphics.handle_action(InputAction::Edit);
        assert_eq!(graphics.game_state, GameState::Edit);
        assert!(graphics.controlled_camera_mut().is_some());
    }

    #[test]
    fn test_light_equips_only_when_in_reach() {
        let mut graphics = graphics();
        graphics.handle_action(InputAction::ToggleLight);
        assert!(!graphics.light_params.light_stuck);

        graphics.light_params.is_equippable = true;
        graphics.handle_action(InputAction::ToggleLight);
        assert!(graphics.light_params.light_stuck);

        graphics.handle_action(InputAction::ToggleLight);
        assert!(!graphics.light_params.light_stuck);
    }

    #[test]
    fn test_carried_light_follows_main_camera() {
        let mut graphics = graphics();
        graphics.light_params.light_stuck = true;
        graphics.camera_mut(CameraId::Main).set_position_xyz(30.0, 9.0, 30.0);
        graphics.update(16.0);

        let light = graphics.light().position();
        assert!((light - Vector3::new(30.0, 8.0, 33.0)).norm() < 1e-4);
    }
}
