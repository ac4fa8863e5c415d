//! 统一的渲染设备接口
//!
//! `RenderDevice` 以 Direct3D 11 的设备 + 立即上下文为模型：资源创建与状态绑定
//! 都是同步调用，调用返回时要么已经完成、要么已经失败。
//!
//! 所有 GPU 资源通过轻量的句柄引用，句柄本身不拥有资源；资源归设备所有，
//! 随设备一起释放。
//!
//! # 实现
//!
//! - `gfx::headless::HeadlessDevice`：记录所有调用的参考设备（测试、CI、`--headless`）
//! - `gfx::d3d11::D3d11Device`：Windows 上的 Direct3D 11 实现

use crate::core::error::Result;
use crate::geometry::VertexLayout;

/// 缓冲区句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// 纹理句柄（带着色器资源视图）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// 着色器句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u32);

/// 不可变状态对象句柄（混合、深度模板、光栅化、采样器）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateHandle(pub u32);

/// 渲染目标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderTarget {
    /// 交换链后缓冲区
    BackBuffer,
    /// 离屏颜色目标，后处理阶段作为输入采样
    Offscreen,
}

/// 可绑定到像素着色器资源槽位的资源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderResource {
    Texture(TextureHandle),
    /// 离屏渲染目标的着色器资源视图
    OffscreenTarget,
}

/// 着色器阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Pixel,
}

/// 缓冲区用途
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    Vertex,
    Index,
    /// 动态常量缓冲区（CPU 可写，Map + WRITE_DISCARD）
    Constant,
    /// 动态实例缓冲区
    Instance,
    /// 每次绘制前整体重写的顶点缓冲区（文字四边形）
    DynamicVertex,
}

/// 缓冲区描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferDesc {
    pub name: String,
    pub kind: BufferKind,
    pub byte_width: u32,
}

impl BufferDesc {
    pub fn new(name: impl Into<String>, kind: BufferKind, byte_width: u32) -> Self {
        Self { name: name.into(), kind, byte_width }
    }

    /// 是否允许每帧从 CPU 更新
    pub fn is_dynamic(&self) -> bool {
        matches!(self.kind, BufferKind::Constant | BufferKind::Instance | BufferKind::DynamicVertex)
    }
}

/// 面剔除模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    None,
    Front,
    Back,
}

/// 光栅化状态描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterizerDesc {
    /// 实心填充，否则线框
    pub solid: bool,
    pub cull: CullMode,
}

/// 比较函数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonFunc {
    Always,
    Equal,
    NotEqual,
    LessEqual,
}

/// 模板通过时的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StencilOp {
    Keep,
    Replace,
}

/// 深度模板状态描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthStencilDesc {
    pub depth_enable: bool,
    pub depth_func: ComparisonFunc,
    pub stencil_enable: bool,
    pub stencil_func: ComparisonFunc,
    pub stencil_pass_op: StencilOp,
    /// 绑定时使用的模板参考值
    pub stencil_ref: u32,
}

/// 采样过滤方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerFilter {
    Anisotropic,
    Linear,
    Point,
}

/// 采样器状态描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerDesc {
    pub filter: SamplerFilter,
    pub max_anisotropy: u32,
}

/// 混合状态描述（源 alpha 混合）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendDesc {
    pub alpha_blend: bool,
}

/// 视口
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height, min_depth: 0.0, max_depth: 1.0 }
    }
}

/// GPU 上的网格：顶点 + 索引缓冲区
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuMesh {
    pub vertex_buffer: BufferHandle,
    pub index_buffer: BufferHandle,
    pub index_count: u32,
    pub stride: u32,
}

/// 统一的渲染设备接口
///
/// 资源创建方法只在初始化阶段调用，失败即初始化失败；
/// 绑定方法对应立即上下文上的无返回值调用；
/// `update_buffer` 与 `present` 是帧内可能失败的调用。
pub trait RenderDevice {
    /// 后端名称
    fn backend_name(&self) -> &'static str;

    /// 交换链尺寸
    fn size(&self) -> (u32, u32);

    // ========== 资源创建 ==========

    /// 创建缓冲区；动态缓冲区的 `initial` 可以为 `None`
    fn create_buffer(&mut self, desc: &BufferDesc, initial: Option<&[u8]>) -> Result<BufferHandle>;

    /// 从 RGBA8 像素创建纹理
    fn create_texture(&mut self, name: &str, width: u32, height: u32, rgba: &[u8]) -> Result<TextureHandle>;

    /// 编译顶点着色器（入口 `VS`，目标 `vs_5_0`）并创建输入布局
    fn compile_vertex_shader(&mut self, path: &str, source: &str, layout: VertexLayout) -> Result<ShaderHandle>;

    /// 编译像素着色器（入口 `PS`，目标 `ps_5_0`）
    fn compile_pixel_shader(&mut self, path: &str, source: &str) -> Result<ShaderHandle>;

    fn create_rasterizer_state(&mut self, desc: &RasterizerDesc) -> Result<StateHandle>;

    fn create_depth_stencil_state(&mut self, desc: &DepthStencilDesc) -> Result<StateHandle>;

    fn create_sampler_state(&mut self, desc: &SamplerDesc) -> Result<StateHandle>;

    fn create_blend_state(&mut self, desc: &BlendDesc) -> Result<StateHandle>;

    // ========== 帧内上传 ==========

    /// 整体覆盖动态缓冲区内容（Map + WRITE_DISCARD）
    fn update_buffer(&mut self, buffer: BufferHandle, data: &[u8]) -> Result<()>;

    // ========== 立即上下文 ==========

    /// 绑定渲染目标；`None` 解绑所有渲染目标。`with_depth` 同时绑定深度模板表面
    fn set_render_target(&mut self, target: Option<RenderTarget>, with_depth: bool);

    fn clear_render_target(&mut self, target: RenderTarget, color: [f32; 4]);

    fn clear_depth_stencil(&mut self);

    fn set_triangle_list_topology(&mut self);

    fn set_rasterizer_state(&mut self, state: StateHandle);

    fn set_depth_stencil_state(&mut self, state: StateHandle, stencil_ref: u32);

    fn set_blend_state(&mut self, state: StateHandle);

    fn set_viewport(&mut self, viewport: &Viewport);

    fn set_sampler(&mut self, slot: u32, state: StateHandle);

    fn set_shaders(&mut self, vs: ShaderHandle, ps: ShaderHandle);

    fn set_constant_buffer(&mut self, stage: ShaderStage, slot: u32, buffer: BufferHandle);

    /// 绑定或解绑（`None`）像素着色器资源槽位
    fn set_shader_resource(&mut self, slot: u32, resource: Option<ShaderResource>);

    /// 绑定顶点缓冲区：`(缓冲区, 步长)`，从槽位 0 开始
    fn set_vertex_buffers(&mut self, buffers: &[(BufferHandle, u32)]);

    fn set_index_buffer(&mut self, buffer: BufferHandle);

    fn draw_indexed(&mut self, index_count: u32);

    fn draw_indexed_instanced(&mut self, index_count: u32, instance_count: u32);

    /// 呈现；失败为致命错误，设备移除时附带移除原因
    fn present(&mut self, sync_interval: u32) -> Result<()>;
}

impl GpuMesh {
    /// 绑定顶点/索引缓冲区并绘制
    pub fn draw<D: RenderDevice + ?Sized>(&self, device: &mut D) {
        device.set_vertex_buffers(&[(self.vertex_buffer, self.stride)]);
        device.set_index_buffer(self.index_buffer);
        device.draw_indexed(self.index_count);
    }
}
