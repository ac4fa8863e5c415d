//! Direct3D 11 后端
//!
//! - `context`：设备、立即上下文、交换链、后缓冲区/离屏目标/深度模板视图
//! - `device`：在上下文之上实现 `RenderDevice`（资源表、HLSL 编译、状态绑定、呈现）

mod context;
mod device;

pub use device::D3d11Device;
