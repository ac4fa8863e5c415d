//! Direct3D 11 设备上下文
//!
//! # 初始化流程
//!
//! 1. 从窗口句柄获取 HWND
//! 2. 创建 D3D11 设备、立即上下文和交换链（调试构建启用调试层）
//! 3. 创建后缓冲区渲染目标视图
//! 4. 创建离屏颜色目标（渲染目标视图 + 着色器资源视图）
//! 5. 创建深度模板表面（D24S8）

use raw_window_handle::{HasWindowHandle, RawWindowHandle};
use tracing::{debug, info};
use windows::{
    Win32::Foundation::{HMODULE, HWND},
    Win32::Graphics::Direct3D::*,
    Win32::Graphics::Direct3D11::*,
    Win32::Graphics::Dxgi::Common::*,
    Win32::Graphics::Dxgi::*,
};

use crate::core::error::{GraphicsError, Result};

const COLOR_FORMAT: DXGI_FORMAT = DXGI_FORMAT_R8G8B8A8_UNORM;
const DEPTH_FORMAT: DXGI_FORMAT = DXGI_FORMAT_D24_UNORM_S8_UINT;

pub(super) fn device_error(what: &str, e: windows::core::Error) -> GraphicsError {
    GraphicsError::DeviceCreation(format!("{}: {}", what, e))
}

pub(super) fn resource_error(what: &str, e: windows::core::Error) -> GraphicsError {
    GraphicsError::ResourceCreation(format!("{}: {}", what, e))
}

/// 离屏颜色目标
pub(super) struct OffscreenTarget {
    pub rtv: ID3D11RenderTargetView,
    pub srv: ID3D11ShaderResourceView,
}

/// Direct3D 11 设备、立即上下文、交换链和帧缓冲
pub(super) struct D3d11Context {
    pub device: ID3D11Device,
    pub context: ID3D11DeviceContext,
    pub swap_chain: IDXGISwapChain,
    pub back_buffer: ID3D11RenderTargetView,
    pub offscreen: OffscreenTarget,
    pub depth_stencil: ID3D11DepthStencilView,
    pub feature_level: D3D_FEATURE_LEVEL,
}

fn hwnd_of(window: &impl HasWindowHandle) -> Result<HWND> {
    let handle = window
        .window_handle()
        .map_err(|e| GraphicsError::DeviceCreation(format!("Failed to get window handle: {}", e)))?;

    match handle.as_raw() {
        RawWindowHandle::Win32(win32) => Ok(HWND(win32.hwnd.get() as *mut core::ffi::c_void)),
        _ => Err(GraphicsError::DeviceCreation("Expected a Win32 window handle".to_string()).into()),
    }
}

impl D3d11Context {
    pub fn new(window: &impl HasWindowHandle, width: u32, height: u32) -> Result<Self> {
        let hwnd = hwnd_of(window)?;

        let swap_chain_desc = DXGI_SWAP_CHAIN_DESC {
            BufferDesc: DXGI_MODE_DESC {
                Width: width,
                Height: height,
                Format: COLOR_FORMAT,
                RefreshRate: DXGI_RATIONAL { Numerator: 60, Denominator: 1 },
                ..Default::default()
            },
            SampleDesc: DXGI_SAMPLE_DESC { Count: 1, Quality: 0 },
            BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
            BufferCount: 1,
            OutputWindow: hwnd,
            Windowed: true.into(),
            SwapEffect: DXGI_SWAP_EFFECT_DISCARD,
            Flags: 0,
        };

        let flags = if cfg!(debug_assertions) {
            D3D11_CREATE_DEVICE_DEBUG
        } else {
            D3D11_CREATE_DEVICE_FLAG(0)
        };
        let feature_levels = [D3D_FEATURE_LEVEL_11_1, D3D_FEATURE_LEVEL_11_0];

        let mut swap_chain: Option<IDXGISwapChain> = None;
        let mut device: Option<ID3D11Device> = None;
        let mut context: Option<ID3D11DeviceContext> = None;
        let mut feature_level = D3D_FEATURE_LEVEL_11_0;

        unsafe {
            D3D11CreateDeviceAndSwapChain(
                None,
                D3D_DRIVER_TYPE_HARDWARE,
                HMODULE::default(),
                flags,
                Some(&feature_levels),
                D3D11_SDK_VERSION,
                Some(&swap_chain_desc),
                Some(&mut swap_chain),
                Some(&mut device),
                Some(&mut feature_level),
                Some(&mut context),
            )
            .map_err(|e| device_error("Failed to create device and swap chain", e))?;
        }

        let (Some(swap_chain), Some(device), Some(context)) = (swap_chain, device, context) else {
            return Err(GraphicsError::DeviceCreation("Device creation returned no objects".to_string()).into());
        };
        info!(?feature_level, width, height, "D3D11 device and swap chain created");

        let back_buffer = unsafe {
            let texture: ID3D11Texture2D = swap_chain
                .GetBuffer(0)
                .map_err(|e| device_error("Failed to get back buffer", e))?;
            let mut rtv: Option<ID3D11RenderTargetView> = None;
            device
                .CreateRenderTargetView(&texture, None, Some(&mut rtv))
                .map_err(|e| device_error("Failed to create back buffer view", e))?;
            rtv.ok_or_else(|| GraphicsError::DeviceCreation("Back buffer view missing".to_string()))?
        };

        let offscreen = Self::create_offscreen(&device, width, height)?;
        let depth_stencil = Self::create_depth_stencil(&device, width, height)?;
        debug!("Offscreen target and depth stencil created");

        Ok(Self {
            device,
            context,
            swap_chain,
            back_buffer,
            offscreen,
            depth_stencil,
            feature_level,
        })
    }

    fn texture_desc(width: u32, height: u32, format: DXGI_FORMAT, bind: D3D11_BIND_FLAG) -> D3D11_TEXTURE2D_DESC {
        D3D11_TEXTURE2D_DESC {
            Width: width,
            Height: height,
            MipLevels: 1,
            ArraySize: 1,
            Format: format,
            SampleDesc: DXGI_SAMPLE_DESC { Count: 1, Quality: 0 },
            Usage: D3D11_USAGE_DEFAULT,
            BindFlags: bind.0 as u32,
            CPUAccessFlags: 0,
            MiscFlags: 0,
        }
    }

    fn create_offscreen(device: &ID3D11Device, width: u32, height: u32) -> Result<OffscreenTarget> {
        let bind = D3D11_BIND_FLAG(D3D11_BIND_RENDER_TARGET.0 | D3D11_BIND_SHADER_RESOURCE.0);
        let desc = Self::texture_desc(width, height, COLOR_FORMAT, bind);

        unsafe {
            let mut texture: Option<ID3D11Texture2D> = None;
            device
                .CreateTexture2D(&desc, None, Some(&mut texture))
                .map_err(|e| device_error("Failed to create offscreen texture", e))?;
            let texture = texture
                .ok_or_else(|| GraphicsError::DeviceCreation("Offscreen texture missing".to_string()))?;

            let mut rtv: Option<ID3D11RenderTargetView> = None;
            device
                .CreateRenderTargetView(&texture, None, Some(&mut rtv))
                .map_err(|e| device_error("Failed to create offscreen render target view", e))?;

            let mut srv: Option<ID3D11ShaderResourceView> = None;
            device
                .CreateShaderResourceView(&texture, None, Some(&mut srv))
                .map_err(|e| device_error("Failed to create offscreen shader resource view", e))?;

            match (rtv, srv) {
                (Some(rtv), Some(srv)) => Ok(OffscreenTarget { rtv, srv }),
                _ => Err(GraphicsError::DeviceCreation("Offscreen views missing".to_string()).into()),
            }
        }
    }

    fn create_depth_stencil(device: &ID3D11Device, width: u32, height: u32) -> Result<ID3D11DepthStencilView> {
        let desc = Self::texture_desc(width, height, DEPTH_FORMAT, D3D11_BIND_DEPTH_STENCIL);

        unsafe {
            let mut texture: Option<ID3D11Texture2D> = None;
            device
                .CreateTexture2D(&desc, None, Some(&mut texture))
                .map_err(|e| device_error("Failed to create depth stencil buffer", e))?;
            let texture = texture
                .ok_or_else(|| GraphicsError::DeviceCreation("Depth stencil buffer missing".to_string()))?;

            let mut dsv: Option<ID3D11DepthStencilView> = None;
            device
                .CreateDepthStencilView(&texture, None, Some(&mut dsv))
                .map_err(|e| device_error("Failed to create depth stencil view", e))?;
            dsv.ok_or_else(|| GraphicsError::DeviceCreation("Depth stencil view missing".to_string()).into())
        }
    }
}
