//! 无窗口参考设备
//!
//! `HeadlessDevice` 在内存中实现 `RenderDevice`：资源保存在 CPU 侧，
//! 每个立即上下文调用都追加到命令日志，并维护当前绑定状态。
//! 用于测试、CI 以及 `--headless` 运行。
//!
//! 额外提供：
//! - 故障注入（指定缓冲区上传失败、状态对象创建失败、呈现失败）
//! - 渲染目标与着色器资源的读写冲突检测
//! - 着色器入口点检查（`VS` / `PS`）

use std::collections::HashMap;

use tracing::{debug, trace, warn};

use crate::core::error::{GraphicsError, Result};
use crate::geometry::VertexLayout;
use crate::renderer::device::{
    BlendDesc, BufferDesc, BufferHandle, DepthStencilDesc, RasterizerDesc, RenderDevice,
    RenderTarget, SamplerDesc, ShaderHandle, ShaderResource, ShaderStage, StateHandle,
    TextureHandle, Viewport,
};

/// 记录的立即上下文调用
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetRenderTarget { target: Option<RenderTarget>, with_depth: bool },
    ClearRenderTarget(RenderTarget),
    ClearDepthStencil,
    SetTopology,
    SetRasterizer(StateHandle),
    SetDepthStencil { state: StateHandle, stencil_ref: u32 },
    SetBlend(StateHandle),
    SetViewport(Viewport),
    SetSampler { slot: u32, state: StateHandle },
    SetShaders { vs: ShaderHandle, ps: ShaderHandle },
    SetConstantBuffer { stage: ShaderStage, slot: u32, buffer: BufferHandle },
    SetShaderResource { slot: u32, resource: Option<ShaderResource> },
    SetVertexBuffers(Vec<(BufferHandle, u32)>),
    SetIndexBuffer(BufferHandle),
    UpdateBuffer(BufferHandle),
    Draw { index_count: u32, instance_count: u32 },
    Present { sync_interval: u32 },
}

impl Command {
    pub fn is_draw(&self) -> bool {
        matches!(self, Command::Draw { .. })
    }
}

/// 当前绑定到立即上下文的状态
#[derive(Debug, Clone, Default)]
pub struct BoundState {
    pub render_target: Option<RenderTarget>,
    pub rasterizer: Option<StateHandle>,
    pub depth_stencil: Option<(StateHandle, u32)>,
    pub blend: Option<StateHandle>,
    pub viewport: Option<Viewport>,
    pub sampler: Option<StateHandle>,
    pub shaders: Option<(ShaderHandle, ShaderHandle)>,
    pub constant_buffers: HashMap<(ShaderStage, u32), BufferHandle>,
    pub shader_resources: HashMap<u32, ShaderResource>,
}

/// 编译得到的着色器
#[derive(Debug, Clone)]
pub struct ShaderRecord {
    pub path: String,
    pub stage: ShaderStage,
    pub layout: Option<VertexLayout>,
}

#[derive(Debug, Clone)]
struct BufferRecord {
    desc: BufferDesc,
    contents: Vec<u8>,
}

#[derive(Debug, Clone)]
struct TextureRecord {
    name: String,
    width: u32,
    height: u32,
}

/// 记录所有调用的参考设备
#[derive(Debug)]
pub struct HeadlessDevice {
    width: u32,
    height: u32,
    buffers: Vec<BufferRecord>,
    textures: Vec<TextureRecord>,
    shaders: Vec<ShaderRecord>,
    states: u32,
    bound: BoundState,
    commands: Vec<Command>,
    hazards: Vec<String>,
    frames_presented: u64,
    failing_uploads: Vec<String>,
    fail_state_creation: bool,
    fail_present: Option<Option<String>>,
}

impl HeadlessDevice {
    pub fn new(width: u32, height: u32) -> Self {
        debug!(width, height, "Headless device created");
        Self {
            width,
            height,
            buffers: Vec::new(),
            textures: Vec::new(),
            shaders: Vec::new(),
            states: 0,
            bound: BoundState::default(),
            commands: Vec::new(),
            hazards: Vec::new(),
            frames_presented: 0,
            failing_uploads: Vec::new(),
            fail_state_creation: false,
            fail_present: None,
        }
    }

    // ========== 查询 ==========

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    pub fn draw_count(&self) -> usize {
        self.commands.iter().filter(|c| c.is_draw()).count()
    }

    pub fn bound(&self) -> &BoundState {
        &self.bound
    }

    /// 检测到的渲染目标 / 着色器资源冲突
    pub fn hazards(&self) -> &[String] {
        &self.hazards
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// 缓冲区当前内容
    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(buffer.0 as usize).map(|b| b.contents.as_slice())
    }

    /// 按名称查找缓冲区
    pub fn buffer_named(&self, name: &str) -> Option<BufferHandle> {
        self.buffers
            .iter()
            .position(|b| b.desc.name == name)
            .map(|i| BufferHandle(i as u32))
    }

    pub fn shader(&self, shader: ShaderHandle) -> Option<&ShaderRecord> {
        self.shaders.get(shader.0 as usize)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// 纹理名称与尺寸
    pub fn texture_info(&self, texture: TextureHandle) -> Option<(&str, u32, u32)> {
        self.textures
            .get(texture.0 as usize)
            .map(|t| (t.name.as_str(), t.width, t.height))
    }

    // ========== 故障注入 ==========

    /// 之后对指定名称缓冲区的上传全部失败
    pub fn fail_uploads_to(&mut self, name: &str) {
        self.failing_uploads.push(name.to_string());
    }

    pub fn clear_upload_failures(&mut self) {
        self.failing_uploads.clear();
    }

    pub fn fail_state_creation(&mut self, fail: bool) {
        self.fail_state_creation = fail;
    }

    /// 下一次呈现失败；`device_removed` 为设备移除原因
    pub fn fail_next_present(&mut self, device_removed: Option<&str>) {
        self.fail_present = Some(device_removed.map(str::to_string));
    }

    fn next_state(&mut self, kind: &str) -> Result<StateHandle> {
        if self.fail_state_creation {
            return Err(GraphicsError::ResourceCreation(format!("Failed to create {} state", kind)).into());
        }
        let handle = StateHandle(self.states);
        self.states += 1;
        trace!(kind, handle = handle.0, "State object created");
        Ok(handle)
    }

    fn add_shader(&mut self, path: &str, source: &str, stage: ShaderStage, layout: Option<VertexLayout>) -> Result<ShaderHandle> {
        let (entry, target) = match stage {
            ShaderStage::Vertex => ("VS", "vs_5_0"),
            ShaderStage::Pixel => ("PS", "ps_5_0"),
        };

        if !has_entry_point(source, entry) {
            return Err(GraphicsError::ShaderCompilation {
                path: path.to_string(),
                diagnostic: format!("{}: error X3501: '{}': entrypoint not found ({})", path, entry, target),
            }
            .into());
        }

        let handle = ShaderHandle(self.shaders.len() as u32);
        self.shaders.push(ShaderRecord { path: path.to_string(), stage, layout });
        Ok(handle)
    }

    fn record_hazard(&mut self, message: String) {
        warn!(hazard = %message, "Render target / shader resource hazard");
        self.hazards.push(message);
    }
}

/// 源码中是否存在名为 `entry` 的函数
fn has_entry_point(source: &str, entry: &str) -> bool {
    let is_ident = |c: char| c.is_ascii_alphanumeric() || c == '_';

    source.match_indices(entry).any(|(start, _)| {
        let before_ok = source[..start].chars().next_back().map_or(true, |c| !is_ident(c));
        let after = source[start + entry.len()..].trim_start();
        before_ok && after.starts_with('(')
    })
}

impl RenderDevice for HeadlessDevice {
    fn backend_name(&self) -> &'static str {
        "Headless"
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn create_buffer(&mut self, desc: &BufferDesc, initial: Option<&[u8]>) -> Result<BufferHandle> {
        if desc.byte_width == 0 {
            return Err(GraphicsError::ResourceCreation(format!("Buffer '{}' has zero size", desc.name)).into());
        }

        let contents = match initial {
            Some(data) if data.len() == desc.byte_width as usize => data.to_vec(),
            Some(data) => {
                return Err(GraphicsError::ResourceCreation(format!(
                    "Buffer '{}' initial data is {} bytes, expected {}",
                    desc.name,
                    data.len(),
                    desc.byte_width
                ))
                .into())
            }
            None if desc.is_dynamic() => vec![0; desc.byte_width as usize],
            None => {
                return Err(GraphicsError::ResourceCreation(format!(
                    "Immutable buffer '{}' requires initial data",
                    desc.name
                ))
                .into())
            }
        };

        let handle = BufferHandle(self.buffers.len() as u32);
        self.buffers.push(BufferRecord { desc: desc.clone(), contents });
        Ok(handle)
    }

    fn create_texture(&mut self, name: &str, width: u32, height: u32, rgba: &[u8]) -> Result<TextureHandle> {
        if width == 0 || height == 0 || rgba.len() != (width * height * 4) as usize {
            return Err(GraphicsError::ResourceCreation(format!(
                "Texture '{}' has invalid size {}x{} for {} bytes",
                name,
                width,
                height,
                rgba.len()
            ))
            .into());
        }

        let handle = TextureHandle(self.textures.len() as u32);
        self.textures.push(TextureRecord { name: name.to_string(), width, height });
        Ok(handle)
    }

    fn compile_vertex_shader(&mut self, path: &str, source: &str, layout: VertexLayout) -> Result<ShaderHandle> {
        self.add_shader(path, source, ShaderStage::Vertex, Some(layout))
    }

    fn compile_pixel_shader(&mut self, path: &str, source: &str) -> Result<ShaderHandle> {
        self.add_shader(path, source, ShaderStage::Pixel, None)
    }

    fn create_rasterizer_state(&mut self, _desc: &RasterizerDesc) -> Result<StateHandle> {
        self.next_state("rasterizer")
    }

    fn create_depth_stencil_state(&mut self, _desc: &DepthStencilDesc) -> Result<StateHandle> {
        self.next_state("depth stencil")
    }

    fn create_sampler_state(&mut self, _desc: &SamplerDesc) -> Result<StateHandle> {
        self.next_state("sampler")
    }

    fn create_blend_state(&mut self, _desc: &BlendDesc) -> Result<StateHandle> {
        self.next_state("blend")
    }

    fn update_buffer(&mut self, buffer: BufferHandle, data: &[u8]) -> Result<()> {
        let record = self.buffers.get_mut(buffer.0 as usize).ok_or_else(|| GraphicsError::BufferUpload {
            buffer: format!("#{}", buffer.0),
            reason: "Unknown buffer".to_string(),
        })?;

        if self.failing_uploads.iter().any(|name| *name == record.desc.name) {
            return Err(GraphicsError::BufferUpload {
                buffer: record.desc.name.clone(),
                reason: "Failed to map buffer (injected)".to_string(),
            }
            .into());
        }

        if !record.desc.is_dynamic() {
            return Err(GraphicsError::BufferUpload {
                buffer: record.desc.name.clone(),
                reason: "Buffer is not CPU writable".to_string(),
            }
            .into());
        }

        if data.len() > record.contents.len() {
            return Err(GraphicsError::BufferUpload {
                buffer: record.desc.name.clone(),
                reason: format!("{} bytes do not fit into {} bytes", data.len(), record.contents.len()),
            }
            .into());
        }

        // WRITE_DISCARD：未写入部分的内容未定义，这里清零
        record.contents.fill(0);
        record.contents[..data.len()].copy_from_slice(data);
        self.commands.push(Command::UpdateBuffer(buffer));
        Ok(())
    }

    fn set_render_target(&mut self, target: Option<RenderTarget>, with_depth: bool) {
        if target == Some(RenderTarget::Offscreen) {
            let sampled = self
                .bound
                .shader_resources
                .iter()
                .any(|(_, r)| *r == ShaderResource::OffscreenTarget);
            if sampled {
                self.record_hazard("Offscreen target bound for output while still bound as a shader resource".to_string());
            }
        }
        self.bound.render_target = target;
        self.commands.push(Command::SetRenderTarget { target, with_depth });
    }

    fn clear_render_target(&mut self, target: RenderTarget, _color: [f32; 4]) {
        self.commands.push(Command::ClearRenderTarget(target));
    }

    fn clear_depth_stencil(&mut self) {
        self.commands.push(Command::ClearDepthStencil);
    }

    fn set_triangle_list_topology(&mut self) {
        self.commands.push(Command::SetTopology);
    }

    fn set_rasterizer_state(&mut self, state: StateHandle) {
        self.bound.rasterizer = Some(state);
        self.commands.push(Command::SetRasterizer(state));
    }

    fn set_depth_stencil_state(&mut self, state: StateHandle, stencil_ref: u32) {
        self.bound.depth_stencil = Some((state, stencil_ref));
        self.commands.push(Command::SetDepthStencil { state, stencil_ref });
    }

    fn set_blend_state(&mut self, state: StateHandle) {
        self.bound.blend = Some(state);
        self.commands.push(Command::SetBlend(state));
    }

    fn set_viewport(&mut self, viewport: &Viewport) {
        self.bound.viewport = Some(*viewport);
        self.commands.push(Command::SetViewport(*viewport));
    }

    fn set_sampler(&mut self, slot: u32, state: StateHandle) {
        self.bound.sampler = Some(state);
        self.commands.push(Command::SetSampler { slot, state });
    }

    fn set_shaders(&mut self, vs: ShaderHandle, ps: ShaderHandle) {
        self.bound.shaders = Some((vs, ps));
        self.commands.push(Command::SetShaders { vs, ps });
    }

    fn set_constant_buffer(&mut self, stage: ShaderStage, slot: u32, buffer: BufferHandle) {
        self.bound.constant_buffers.insert((stage, slot), buffer);
        self.commands.push(Command::SetConstantBuffer { stage, slot, buffer });
    }

    fn set_shader_resource(&mut self, slot: u32, resource: Option<ShaderResource>) {
        if resource == Some(ShaderResource::OffscreenTarget) && self.bound.render_target == Some(RenderTarget::Offscreen) {
            self.record_hazard(format!("Offscreen target sampled in slot {} while bound as render target", slot));
        }
        match resource {
            Some(r) => {
                self.bound.shader_resources.insert(slot, r);
            }
            None => {
                self.bound.shader_resources.remove(&slot);
            }
        }
        self.commands.push(Command::SetShaderResource { slot, resource });
    }

    fn set_vertex_buffers(&mut self, buffers: &[(BufferHandle, u32)]) {
        self.commands.push(Command::SetVertexBuffers(buffers.to_vec()));
    }

    fn set_index_buffer(&mut self, buffer: BufferHandle) {
        self.commands.push(Command::SetIndexBuffer(buffer));
    }

    fn draw_indexed(&mut self, index_count: u32) {
        self.commands.push(Command::Draw { index_count, instance_count: 1 });
    }

    fn draw_indexed_instanced(&mut self, index_count: u32, instance_count: u32) {
        self.commands.push(Command::Draw { index_count, instance_count });
    }

    fn present(&mut self, sync_interval: u32) -> Result<()> {
        if let Some(device_removed) = self.fail_present.take() {
            return Err(GraphicsError::Presentation {
                reason: "Swap chain failed to present frame".to_string(),
                device_removed,
            }
            .into());
        }
        self.frames_presented += 1;
        self.commands.push(Command::Present { sync_interval });
        Ok(())
    }
}
