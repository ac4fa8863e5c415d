//! `RenderDevice` 的 Direct3D 11 实现
//!
//! 句柄是设备内部表的下标。绑定方法收到未知句柄时记录警告并忽略该调用。

use std::ffi::CString;

use raw_window_handle::HasWindowHandle;
use tracing::{debug, error, trace, warn};
use windows::{
    core::PCSTR,
    Win32::Graphics::Direct3D::Fxc::*,
    Win32::Graphics::Direct3D::*,
    Win32::Graphics::Direct3D11::*,
    Win32::Graphics::Dxgi::Common::*,
    Win32::Graphics::Dxgi::*,
};

use crate::core::error::{GraphicsError, Result};
use crate::geometry::vertex::ElementFormat;
use crate::geometry::VertexLayout;
use crate::renderer::device::{
    BlendDesc, BufferDesc, BufferHandle, BufferKind, ComparisonFunc, CullMode, DepthStencilDesc,
    RasterizerDesc, RenderDevice, RenderTarget, SamplerDesc, SamplerFilter, ShaderHandle,
    ShaderResource, ShaderStage, StateHandle, StencilOp, TextureHandle, Viewport,
};
use super::context::{resource_error, D3d11Context};

struct GpuBuffer {
    desc: BufferDesc,
    buffer: ID3D11Buffer,
}

enum CompiledShader {
    Vertex { shader: ID3D11VertexShader, layout: ID3D11InputLayout },
    Pixel(ID3D11PixelShader),
}

enum StateObject {
    Rasterizer(ID3D11RasterizerState),
    DepthStencil(ID3D11DepthStencilState),
    Sampler(ID3D11SamplerState),
    Blend(ID3D11BlendState),
}

/// Direct3D 11 渲染设备
pub struct D3d11Device {
    ctx: D3d11Context,
    width: u32,
    height: u32,
    buffers: Vec<GpuBuffer>,
    textures: Vec<ID3D11ShaderResourceView>,
    shaders: Vec<CompiledShader>,
    states: Vec<StateObject>,
}

fn comparison(func: ComparisonFunc) -> D3D11_COMPARISON_FUNC {
    match func {
        ComparisonFunc::Always => D3D11_COMPARISON_ALWAYS,
        ComparisonFunc::Equal => D3D11_COMPARISON_EQUAL,
        ComparisonFunc::NotEqual => D3D11_COMPARISON_NOT_EQUAL,
        ComparisonFunc::LessEqual => D3D11_COMPARISON_LESS_EQUAL,
    }
}

fn stencil_op(op: StencilOp) -> D3D11_STENCIL_OP {
    match op {
        StencilOp::Keep => D3D11_STENCIL_OP_KEEP,
        StencilOp::Replace => D3D11_STENCIL_OP_REPLACE,
    }
}

fn element_format(format: ElementFormat) -> DXGI_FORMAT {
    match format {
        ElementFormat::Float2 => DXGI_FORMAT_R32G32_FLOAT,
        ElementFormat::Float3 => DXGI_FORMAT_R32G32B32_FLOAT,
    }
}

unsafe fn blob_bytes(blob: &ID3DBlob) -> &[u8] {
    std::slice::from_raw_parts(blob.GetBufferPointer() as *const u8, blob.GetBufferSize())
}

/// 编译 HLSL，失败时返回编译器诊断信息
fn compile(path: &str, source: &str, entry: &str, target: &str) -> Result<ID3DBlob> {
    let to_cstring = |s: &str| {
        CString::new(s).map_err(|e| GraphicsError::ShaderCompilation {
            path: path.to_string(),
            diagnostic: e.to_string(),
        })
    };
    let name = to_cstring(path)?;
    let entry_c = to_cstring(entry)?;
    let target_c = to_cstring(target)?;

    let flags = if cfg!(debug_assertions) {
        D3DCOMPILE_DEBUG | D3DCOMPILE_SKIP_OPTIMIZATION
    } else {
        D3DCOMPILE_OPTIMIZATION_LEVEL3
    };

    let mut blob: Option<ID3DBlob> = None;
    let mut errors: Option<ID3DBlob> = None;
    let result = unsafe {
        D3DCompile(
            source.as_ptr() as *const _,
            source.len(),
            PCSTR(name.as_ptr() as *const u8),
            None,
            None,
            PCSTR(entry_c.as_ptr() as *const u8),
            PCSTR(target_c.as_ptr() as *const u8),
            flags,
            0,
            &mut blob,
            Some(&mut errors),
        )
    };

    let diagnostic = errors
        .as_ref()
        .map(|e| String::from_utf8_lossy(unsafe { blob_bytes(e) }).trim_end_matches('\0').to_string());

    match (result, blob) {
        (Ok(()), Some(blob)) => {
            if let Some(warnings) = diagnostic.filter(|d| !d.is_empty()) {
                warn!(path, %warnings, "Shader compiled with warnings");
            }
            Ok(blob)
        }
        (result, _) => Err(GraphicsError::ShaderCompilation {
            path: path.to_string(),
            diagnostic: diagnostic.unwrap_or_else(|| match result {
                Err(e) => e.to_string(),
                Ok(()) => "Compiler returned no bytecode".to_string(),
            }),
        }
        .into()),
    }
}

impl D3d11Device {
    /// 为窗口创建设备、交换链和帧缓冲
    pub fn new(window: &impl HasWindowHandle, width: u32, height: u32) -> Result<Self> {
        let ctx = D3d11Context::new(window, width, height)?;
        Ok(Self {
            ctx,
            width,
            height,
            buffers: Vec::new(),
            textures: Vec::new(),
            shaders: Vec::new(),
            states: Vec::new(),
        })
    }

    pub fn feature_level(&self) -> D3D_FEATURE_LEVEL {
        self.ctx.feature_level
    }

    fn buffer(&self, handle: BufferHandle) -> Option<&ID3D11Buffer> {
        let buffer = self.buffers.get(handle.0 as usize).map(|b| &b.buffer);
        if buffer.is_none() {
            warn!(handle = handle.0, "Unknown buffer handle");
        }
        buffer
    }

    fn state(&self, handle: StateHandle) -> Option<&StateObject> {
        let state = self.states.get(handle.0 as usize);
        if state.is_none() {
            warn!(handle = handle.0, "Unknown state handle");
        }
        state
    }

    fn push_state(&mut self, state: StateObject) -> StateHandle {
        let handle = StateHandle(self.states.len() as u32);
        self.states.push(state);
        handle
    }

    fn render_target_view(&self, target: RenderTarget) -> &ID3D11RenderTargetView {
        match target {
            RenderTarget::BackBuffer => &self.ctx.back_buffer,
            RenderTarget::Offscreen => &self.ctx.offscreen.rtv,
        }
    }

    fn create_input_layout(&self, layout: VertexLayout, bytecode: &[u8]) -> Result<ID3D11InputLayout> {
        let semantics = layout
            .elements()
            .iter()
            .map(|e| CString::new(e.semantic))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| GraphicsError::ResourceCreation(e.to_string()))?;

        let descs: Vec<D3D11_INPUT_ELEMENT_DESC> = layout
            .elements()
            .iter()
            .zip(&semantics)
            .map(|(element, semantic)| D3D11_INPUT_ELEMENT_DESC {
                SemanticName: PCSTR(semantic.as_ptr() as *const u8),
                SemanticIndex: 0,
                Format: element_format(element.format),
                InputSlot: element.slot,
                AlignedByteOffset: element.offset,
                InputSlotClass: if element.per_instance {
                    D3D11_INPUT_PER_INSTANCE_DATA
                } else {
                    D3D11_INPUT_PER_VERTEX_DATA
                },
                InstanceDataStepRate: element.per_instance as u32,
            })
            .collect();

        let mut input_layout: Option<ID3D11InputLayout> = None;
        unsafe {
            self.ctx
                .device
                .CreateInputLayout(&descs, bytecode, Some(&mut input_layout))
                .map_err(|e| resource_error("Failed to create input layout", e))?;
        }
        input_layout.ok_or_else(|| GraphicsError::ResourceCreation("Input layout missing".to_string()).into())
    }
}

impl RenderDevice for D3d11Device {
    fn backend_name(&self) -> &'static str {
        "Direct3D 11"
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn create_buffer(&mut self, desc: &BufferDesc, initial: Option<&[u8]>) -> Result<BufferHandle> {
        let bind = match desc.kind {
            BufferKind::Vertex | BufferKind::Instance | BufferKind::DynamicVertex => D3D11_BIND_VERTEX_BUFFER,
            BufferKind::Index => D3D11_BIND_INDEX_BUFFER,
            BufferKind::Constant => D3D11_BIND_CONSTANT_BUFFER,
        };
        let (usage, cpu_access) = if desc.is_dynamic() {
            (D3D11_USAGE_DYNAMIC, D3D11_CPU_ACCESS_WRITE.0 as u32)
        } else {
            (D3D11_USAGE_IMMUTABLE, 0)
        };

        let buffer_desc = D3D11_BUFFER_DESC {
            ByteWidth: desc.byte_width,
            Usage: usage,
            BindFlags: bind.0 as u32,
            CPUAccessFlags: cpu_access,
            MiscFlags: 0,
            StructureByteStride: 0,
        };
        let data = initial.map(|bytes| D3D11_SUBRESOURCE_DATA {
            pSysMem: bytes.as_ptr() as *const _,
            SysMemPitch: 0,
            SysMemSlicePitch: 0,
        });

        let mut buffer: Option<ID3D11Buffer> = None;
        unsafe {
            self.ctx
                .device
                .CreateBuffer(&buffer_desc, data.as_ref().map(|d| d as *const _), Some(&mut buffer))
                .map_err(|e| resource_error(&format!("Failed to create buffer '{}'", desc.name), e))?;
        }
        let buffer = buffer.ok_or_else(|| GraphicsError::ResourceCreation(format!("Buffer '{}' missing", desc.name)))?;

        let handle = BufferHandle(self.buffers.len() as u32);
        self.buffers.push(GpuBuffer { desc: desc.clone(), buffer });
        trace!(name = %desc.name, bytes = desc.byte_width, "Buffer created");
        Ok(handle)
    }

    fn create_texture(&mut self, name: &str, width: u32, height: u32, rgba: &[u8]) -> Result<TextureHandle> {
        if rgba.len() != (width * height * 4) as usize {
            return Err(GraphicsError::ResourceCreation(format!("Texture '{}' has wrong pixel count", name)).into());
        }

        let desc = D3D11_TEXTURE2D_DESC {
            Width: width,
            Height: height,
            MipLevels: 1,
            ArraySize: 1,
            Format: DXGI_FORMAT_R8G8B8A8_UNORM,
            SampleDesc: DXGI_SAMPLE_DESC { Count: 1, Quality: 0 },
            Usage: D3D11_USAGE_IMMUTABLE,
            BindFlags: D3D11_BIND_SHADER_RESOURCE.0 as u32,
            CPUAccessFlags: 0,
            MiscFlags: 0,
        };
        let data = D3D11_SUBRESOURCE_DATA {
            pSysMem: rgba.as_ptr() as *const _,
            SysMemPitch: width * 4,
            SysMemSlicePitch: 0,
        };

        let srv = unsafe {
            let mut texture: Option<ID3D11Texture2D> = None;
            self.ctx
                .device
                .CreateTexture2D(&desc, Some(&data as *const _), Some(&mut texture))
                .map_err(|e| resource_error(&format!("Failed to create texture '{}'", name), e))?;
            let texture =
                texture.ok_or_else(|| GraphicsError::ResourceCreation(format!("Texture '{}' missing", name)))?;

            let mut srv: Option<ID3D11ShaderResourceView> = None;
            self.ctx
                .device
                .CreateShaderResourceView(&texture, None, Some(&mut srv))
                .map_err(|e| resource_error(&format!("Failed to create view for texture '{}'", name), e))?;
            srv.ok_or_else(|| GraphicsError::ResourceCreation(format!("Texture view '{}' missing", name)))?
        };

        let handle = TextureHandle(self.textures.len() as u32);
        self.textures.push(srv);
        debug!(name, width, height, "Texture created");
        Ok(handle)
    }

    fn compile_vertex_shader(&mut self, path: &str, source: &str, layout: VertexLayout) -> Result<ShaderHandle> {
        let blob = compile(path, source, "VS", "vs_5_0")?;
        let bytecode = unsafe { blob_bytes(&blob) };

        let mut shader: Option<ID3D11VertexShader> = None;
        unsafe {
            self.ctx
                .device
                .CreateVertexShader(bytecode, None, Some(&mut shader))
                .map_err(|e| resource_error(&format!("Failed to create vertex shader '{}'", path), e))?;
        }
        let shader = shader.ok_or_else(|| GraphicsError::ResourceCreation(format!("Vertex shader '{}' missing", path)))?;
        let layout = self.create_input_layout(layout, bytecode)?;

        let handle = ShaderHandle(self.shaders.len() as u32);
        self.shaders.push(CompiledShader::Vertex { shader, layout });
        Ok(handle)
    }

    fn compile_pixel_shader(&mut self, path: &str, source: &str) -> Result<ShaderHandle> {
        let blob = compile(path, source, "PS", "ps_5_0")?;

        let mut shader: Option<ID3D11PixelShader> = None;
        unsafe {
            self.ctx
                .device
                .CreatePixelShader(blob_bytes(&blob), None, Some(&mut shader))
                .map_err(|e| resource_error(&format!("Failed to create pixel shader '{}'", path), e))?;
        }
        let shader = shader.ok_or_else(|| GraphicsError::ResourceCreation(format!("Pixel shader '{}' missing", path)))?;

        let handle = ShaderHandle(self.shaders.len() as u32);
        self.shaders.push(CompiledShader::Pixel(shader));
        Ok(handle)
    }

    fn create_rasterizer_state(&mut self, desc: &RasterizerDesc) -> Result<StateHandle> {
        let d3d_desc = D3D11_RASTERIZER_DESC {
            FillMode: if desc.solid { D3D11_FILL_SOLID } else { D3D11_FILL_WIREFRAME },
            CullMode: match desc.cull {
                CullMode::None => D3D11_CULL_NONE,
                CullMode::Front => D3D11_CULL_FRONT,
                CullMode::Back => D3D11_CULL_BACK,
            },
            FrontCounterClockwise: false.into(),
            DepthBias: 0,
            DepthBiasClamp: 0.0,
            SlopeScaledDepthBias: 0.0,
            DepthClipEnable: true.into(),
            ScissorEnable: false.into(),
            MultisampleEnable: false.into(),
            AntialiasedLineEnable: false.into(),
        };

        let mut state: Option<ID3D11RasterizerState> = None;
        unsafe {
            self.ctx
                .device
                .CreateRasterizerState(&d3d_desc, Some(&mut state))
                .map_err(|e| resource_error("Failed to create rasterizer state", e))?;
        }
        let state = state.ok_or_else(|| GraphicsError::ResourceCreation("Rasterizer state missing".to_string()))?;
        Ok(self.push_state(StateObject::Rasterizer(state)))
    }

    fn create_depth_stencil_state(&mut self, desc: &DepthStencilDesc) -> Result<StateHandle> {
        let face = D3D11_DEPTH_STENCILOP_DESC {
            StencilFailOp: D3D11_STENCIL_OP_KEEP,
            StencilDepthFailOp: D3D11_STENCIL_OP_KEEP,
            StencilPassOp: stencil_op(desc.stencil_pass_op),
            StencilFunc: comparison(desc.stencil_func),
        };
        let d3d_desc = D3D11_DEPTH_STENCIL_DESC {
            DepthEnable: desc.depth_enable.into(),
            DepthWriteMask: D3D11_DEPTH_WRITE_MASK_ALL,
            DepthFunc: comparison(desc.depth_func),
            StencilEnable: desc.stencil_enable.into(),
            StencilReadMask: D3D11_DEFAULT_STENCIL_READ_MASK as u8,
            StencilWriteMask: D3D11_DEFAULT_STENCIL_WRITE_MASK as u8,
            FrontFace: face,
            BackFace: face,
        };

        let mut state: Option<ID3D11DepthStencilState> = None;
        unsafe {
            self.ctx
                .device
                .CreateDepthStencilState(&d3d_desc, Some(&mut state))
                .map_err(|e| resource_error("Failed to create depth stencil state", e))?;
        }
        let state = state.ok_or_else(|| GraphicsError::ResourceCreation("Depth stencil state missing".to_string()))?;
        Ok(self.push_state(StateObject::DepthStencil(state)))
    }

    fn create_sampler_state(&mut self, desc: &SamplerDesc) -> Result<StateHandle> {
        let d3d_desc = D3D11_SAMPLER_DESC {
            Filter: match desc.filter {
                SamplerFilter::Anisotropic => D3D11_FILTER_ANISOTROPIC,
                SamplerFilter::Linear => D3D11_FILTER_MIN_MAG_MIP_LINEAR,
                SamplerFilter::Point => D3D11_FILTER_MIN_MAG_MIP_POINT,
            },
            AddressU: D3D11_TEXTURE_ADDRESS_WRAP,
            AddressV: D3D11_TEXTURE_ADDRESS_WRAP,
            AddressW: D3D11_TEXTURE_ADDRESS_WRAP,
            MipLODBias: 0.0,
            MaxAnisotropy: desc.max_anisotropy,
            ComparisonFunc: D3D11_COMPARISON_NEVER,
            BorderColor: [0.0; 4],
            MinLOD: 0.0,
            MaxLOD: D3D11_FLOAT32_MAX,
        };

        let mut state: Option<ID3D11SamplerState> = None;
        unsafe {
            self.ctx
                .device
                .CreateSamplerState(&d3d_desc, Some(&mut state))
                .map_err(|e| resource_error("Failed to create sampler state", e))?;
        }
        let state = state.ok_or_else(|| GraphicsError::ResourceCreation("Sampler state missing".to_string()))?;
        Ok(self.push_state(StateObject::Sampler(state)))
    }

    fn create_blend_state(&mut self, desc: &BlendDesc) -> Result<StateHandle> {
        let target = D3D11_RENDER_TARGET_BLEND_DESC {
            BlendEnable: desc.alpha_blend.into(),
            SrcBlend: D3D11_BLEND_SRC_ALPHA,
            DestBlend: D3D11_BLEND_INV_SRC_ALPHA,
            BlendOp: D3D11_BLEND_OP_ADD,
            SrcBlendAlpha: D3D11_BLEND_ONE,
            DestBlendAlpha: D3D11_BLEND_ZERO,
            BlendOpAlpha: D3D11_BLEND_OP_ADD,
            RenderTargetWriteMask: D3D11_COLOR_WRITE_ENABLE_ALL.0 as u8,
        };
        let mut render_targets = [D3D11_RENDER_TARGET_BLEND_DESC::default(); 8];
        render_targets[0] = target;
        let d3d_desc = D3D11_BLEND_DESC {
            AlphaToCoverageEnable: false.into(),
            IndependentBlendEnable: false.into(),
            RenderTarget: render_targets,
        };

        let mut state: Option<ID3D11BlendState> = None;
        unsafe {
            self.ctx
                .device
                .CreateBlendState(&d3d_desc, Some(&mut state))
                .map_err(|e| resource_error("Failed to create blend state", e))?;
        }
        let state = state.ok_or_else(|| GraphicsError::ResourceCreation("Blend state missing".to_string()))?;
        Ok(self.push_state(StateObject::Blend(state)))
    }

    fn update_buffer(&mut self, buffer: BufferHandle, data: &[u8]) -> Result<()> {
        let record = self.buffers.get(buffer.0 as usize).ok_or_else(|| GraphicsError::BufferUpload {
            buffer: format!("#{}", buffer.0),
            reason: "Unknown buffer".to_string(),
        })?;
        if !record.desc.is_dynamic() || data.len() > record.desc.byte_width as usize {
            return Err(GraphicsError::BufferUpload {
                buffer: record.desc.name.clone(),
                reason: format!("Cannot write {} bytes", data.len()),
            }
            .into());
        }

        unsafe {
            let mut mapped = D3D11_MAPPED_SUBRESOURCE::default();
            self.ctx
                .context
                .Map(&record.buffer, 0, D3D11_MAP_WRITE_DISCARD, 0, Some(&mut mapped))
                .map_err(|e| GraphicsError::BufferUpload {
                    buffer: record.desc.name.clone(),
                    reason: e.to_string(),
                })?;
            std::ptr::copy_nonoverlapping(data.as_ptr(), mapped.pData as *mut u8, data.len());
            self.ctx.context.Unmap(&record.buffer, 0);
        }
        Ok(())
    }

    fn set_render_target(&mut self, target: Option<RenderTarget>, with_depth: bool) {
        unsafe {
            match target {
                Some(target) => {
                    let rtv = Some(self.render_target_view(target).clone());
                    let dsv = with_depth.then_some(&self.ctx.depth_stencil);
                    self.ctx.context.OMSetRenderTargets(Some(&[rtv]), dsv);
                }
                None => self.ctx.context.OMSetRenderTargets(None, None),
            }
        }
    }

    fn clear_render_target(&mut self, target: RenderTarget, color: [f32; 4]) {
        unsafe {
            self.ctx.context.ClearRenderTargetView(self.render_target_view(target), &color);
        }
    }

    fn clear_depth_stencil(&mut self) {
        unsafe {
            self.ctx.context.ClearDepthStencilView(
                &self.ctx.depth_stencil,
                (D3D11_CLEAR_DEPTH.0 | D3D11_CLEAR_STENCIL.0) as u32,
                1.0,
                0,
            );
        }
    }

    fn set_triangle_list_topology(&mut self) {
        unsafe {
            self.ctx.context.IASetPrimitiveTopology(D3D11_PRIMITIVE_TOPOLOGY_TRIANGLELIST);
        }
    }

    fn set_rasterizer_state(&mut self, state: StateHandle) {
        if let Some(StateObject::Rasterizer(s)) = self.state(state) {
            unsafe { self.ctx.context.RSSetState(s) };
        }
    }

    fn set_depth_stencil_state(&mut self, state: StateHandle, stencil_ref: u32) {
        if let Some(StateObject::DepthStencil(s)) = self.state(state) {
            unsafe { self.ctx.context.OMSetDepthStencilState(s, stencil_ref) };
        }
    }

    fn set_blend_state(&mut self, state: StateHandle) {
        if let Some(StateObject::Blend(s)) = self.state(state) {
            unsafe { self.ctx.context.OMSetBlendState(s, None, 0xffff_ffff) };
        }
    }

    fn set_viewport(&mut self, viewport: &Viewport) {
        let vp = D3D11_VIEWPORT {
            TopLeftX: viewport.x,
            TopLeftY: viewport.y,
            Width: viewport.width,
            Height: viewport.height,
            MinDepth: viewport.min_depth,
            MaxDepth: viewport.max_depth,
        };
        unsafe { self.ctx.context.RSSetViewports(Some(&[vp])) };
    }

    fn set_sampler(&mut self, slot: u32, state: StateHandle) {
        if let Some(StateObject::Sampler(s)) = self.state(state) {
            unsafe { self.ctx.context.PSSetSamplers(slot, Some(&[Some(s.clone())])) };
        }
    }

    fn set_shaders(&mut self, vs: ShaderHandle, ps: ShaderHandle) {
        let shaders = (self.shaders.get(vs.0 as usize), self.shaders.get(ps.0 as usize));
        match shaders {
            (Some(CompiledShader::Vertex { shader: vs, layout }), Some(CompiledShader::Pixel(ps))) => unsafe {
                self.ctx.context.IASetInputLayout(layout);
                self.ctx.context.VSSetShader(vs, None);
                self.ctx.context.PSSetShader(ps, None);
            },
            _ => warn!(vs = vs.0, ps = ps.0, "Invalid shader pair"),
        }
    }

    fn set_constant_buffer(&mut self, stage: ShaderStage, slot: u32, buffer: BufferHandle) {
        let Some(buffer) = self.buffer(buffer).cloned() else {
            return;
        };
        unsafe {
            match stage {
                ShaderStage::Vertex => self.ctx.context.VSSetConstantBuffers(slot, Some(&[Some(buffer)])),
                ShaderStage::Pixel => self.ctx.context.PSSetConstantBuffers(slot, Some(&[Some(buffer)])),
            }
        }
    }

    fn set_shader_resource(&mut self, slot: u32, resource: Option<ShaderResource>) {
        let view = match resource {
            None => None,
            Some(ShaderResource::OffscreenTarget) => Some(self.ctx.offscreen.srv.clone()),
            Some(ShaderResource::Texture(texture)) => match self.textures.get(texture.0 as usize) {
                Some(srv) => Some(srv.clone()),
                None => {
                    warn!(texture = texture.0, "Unknown texture handle");
                    return;
                }
            },
        };
        unsafe { self.ctx.context.PSSetShaderResources(slot, Some(&[view])) };
    }

    fn set_vertex_buffers(&mut self, buffers: &[(BufferHandle, u32)]) {
        let mut views = Vec::with_capacity(buffers.len());
        let mut strides = Vec::with_capacity(buffers.len());
        for &(handle, stride) in buffers {
            let Some(buffer) = self.buffer(handle).cloned() else {
                return;
            };
            views.push(Some(buffer));
            strides.push(stride);
        }
        let offsets = vec![0u32; buffers.len()];

        unsafe {
            self.ctx.context.IASetVertexBuffers(
                0,
                views.len() as u32,
                Some(views.as_ptr()),
                Some(strides.as_ptr()),
                Some(offsets.as_ptr()),
            );
        }
    }

    fn set_index_buffer(&mut self, buffer: BufferHandle) {
        if let Some(buffer) = self.buffer(buffer) {
            unsafe { self.ctx.context.IASetIndexBuffer(buffer, DXGI_FORMAT_R32_UINT, 0) };
        }
    }

    fn draw_indexed(&mut self, index_count: u32) {
        unsafe { self.ctx.context.DrawIndexed(index_count, 0, 0) };
    }

    fn draw_indexed_instanced(&mut self, index_count: u32, instance_count: u32) {
        unsafe { self.ctx.context.DrawIndexedInstanced(index_count, instance_count, 0, 0, 0) };
    }

    fn present(&mut self, sync_interval: u32) -> Result<()> {
        let hr = unsafe { self.ctx.swap_chain.Present(sync_interval, DXGI_PRESENT(0)) };
        if let Err(e) = hr.ok() {
            let device_removed = unsafe { self.ctx.device.GetDeviceRemovedReason() }
                .err()
                .map(|reason| reason.to_string());
            error!(error = %e, ?device_removed, "Present failed");
            return Err(GraphicsError::Presentation { reason: e.to_string(), device_removed }.into());
        }
        Ok(())
    }
}
