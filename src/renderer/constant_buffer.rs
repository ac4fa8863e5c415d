//! 常量缓冲区
//!
//! `ConstantBuffer<T>` 是 GPU 常量缓冲区在 CPU 侧的镜像。
//!
//! # 协议
//!
//! - 只有显式调用 `apply_changes` 时才把数据推送到 GPU
//! - 每次推送都传输整个结构体，不支持部分更新
//! - 推送失败时记录错误并返回 `Err`，调用方必须中止当前阶段
//! - 通过 `data_mut` 修改数据会把缓冲区标记为脏，推送成功后清除

use bytemuck::Pod;
use tracing::error;

use crate::core::error::{GraphicsError, Result};
use super::device::{BufferDesc, BufferHandle, BufferKind, RenderDevice};

/// CPU 侧镜像的常量缓冲区
pub struct ConstantBuffer<T: Pod> {
    name: &'static str,
    buffer: BufferHandle,
    data: T,
    dirty: bool,
}

impl<T: Pod> ConstantBuffer<T> {
    /// 在设备上创建常量缓冲区，初始数据为全零
    pub fn new<D: RenderDevice + ?Sized>(device: &mut D, name: &'static str) -> Result<Self> {
        let size = std::mem::size_of::<T>();
        if size % 16 != 0 {
            return Err(GraphicsError::ResourceCreation(format!(
                "Constant buffer '{}' must be 16-byte aligned, got {} bytes",
                name, size
            ))
            .into());
        }

        let desc = BufferDesc::new(name, BufferKind::Constant, size as u32);
        let buffer = device.create_buffer(&desc, None)?;

        Ok(Self {
            name,
            buffer,
            data: T::zeroed(),
            dirty: true,
        })
    }

    /// 缓冲区名称
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 设备侧缓冲区句柄
    pub fn buffer(&self) -> BufferHandle {
        self.buffer
    }

    /// 当前 CPU 侧数据
    pub fn data(&self) -> &T {
        &self.data
    }

    /// 可变访问 CPU 侧数据，标记为脏
    pub fn data_mut(&mut self) -> &mut T {
        self.dirty = true;
        &mut self.data
    }

    /// 自上次成功推送以来是否被修改过
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// 把整个结构体推送到 GPU
    pub fn apply_changes<D: RenderDevice + ?Sized>(&mut self, device: &mut D) -> Result<()> {
        match device.update_buffer(self.buffer, bytemuck::bytes_of(&self.data)) {
            Ok(()) => {
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                error!(buffer = self.name, error = %e, "Failed to apply constant buffer changes");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::headless::HeadlessDevice;
    use crate::renderer::constants::CbPsScene;

    #[test]
    fn test_flush_uploads_whole_struct() {
        let mut device = HeadlessDevice::new(800, 600);
        let mut cb = ConstantBuffer::<CbPsScene>::new(&mut device, "cb_ps_scene").unwrap();

        cb.data_mut().alpha_factor = 0.5;
        assert!(cb.is_dirty());
        cb.apply_changes(&mut device).unwrap();
        assert!(!cb.is_dirty());

        let uploaded = device.buffer_contents(cb.buffer()).unwrap();
        assert_eq!(uploaded.len(), std::mem::size_of::<CbPsScene>());
        assert_eq!(uploaded, bytemuck::bytes_of(cb.data()));
    }

    #[test]
    fn test_failed_flush_keeps_dirty_flag() {
        let mut device = HeadlessDevice::new(800, 600);
        let mut cb = ConstantBuffer::<CbPsScene>::new(&mut device, "cb_ps_scene").unwrap();
        cb.data_mut().use_texture = 1;

        device.fail_uploads_to("cb_ps_scene");
        let err = cb.apply_changes(&mut device).unwrap_err();
        assert!(!err.is_fatal());
        assert!(cb.is_dirty());
    }

    #[test]
    fn test_unaligned_struct_is_rejected() {
        let mut device = HeadlessDevice::new(800, 600);
        assert!(ConstantBuffer::<[f32; 3]>::new(&mut device, "bad").is_err());
    }
}
