//! 绘制辅助
//!
//! 把场景对象的矩阵写入常量缓冲区、绑定纹理并发出绘制调用。
//! 常量缓冲区上传失败时立即返回错误，不会发出绘制调用。

use bytemuck::Pod;
use tracing::debug;

use crate::component::{ObjectKind, SceneObject};
use crate::core::error::Result;
use crate::geometry::{primitives, InstanceOffset, MeshData};
use crate::math::Matrix4;
use super::constant_buffer::ConstantBuffer;
use super::constants::{matrix_data, slots, CbPsLight, CbVsMatrix, CbVsMatrix2D};
use super::device::{
    BufferDesc, BufferHandle, BufferKind, GpuMesh, RenderDevice, ShaderResource, ShaderStage, TextureHandle,
};

/// 地面波动幅度（模型空间）
const WAVE_AMPLITUDE: f32 = 0.05;
/// 地面波动的空间频率
const WAVE_FREQUENCY: f32 = 0.6;
/// 地面波动速度（弧度 / 毫秒）
const WAVE_SPEED: f32 = 0.002;

/// 上传网格到 GPU
pub fn upload_mesh<D, V>(device: &mut D, mesh: &MeshData<V>) -> Result<GpuMesh>
where
    D: RenderDevice + ?Sized,
    V: Pod,
{
    let name = mesh.name.as_deref().unwrap_or("Mesh");
    let vertex_buffer = device.create_buffer(
        &BufferDesc::new(format!("{}_vb", name), BufferKind::Vertex, mesh.vertex_bytes().len() as u32),
        Some(mesh.vertex_bytes()),
    )?;
    let index_buffer = device.create_buffer(
        &BufferDesc::new(format!("{}_ib", name), BufferKind::Index, mesh.index_bytes().len() as u32),
        Some(mesh.index_bytes()),
    )?;

    debug!(mesh = name, vertices = mesh.vertex_count(), indices = mesh.index_count(), "Mesh uploaded");

    Ok(GpuMesh {
        vertex_buffer,
        index_buffer,
        index_count: mesh.index_count() as u32,
        stride: std::mem::size_of::<V>() as u32,
    })
}

/// 没有纹理的对象解绑槽位 0，不会沿用上一次绘制的纹理
fn bind_texture<D: RenderDevice + ?Sized>(device: &mut D, texture: Option<TextureHandle>) {
    device.set_shader_resource(0, texture.map(ShaderResource::Texture));
}

/// 绘制 3D 对象（模型、光源、基础几何体）
pub fn draw_object<D: RenderDevice + ?Sized>(
    device: &mut D,
    cb: &mut ConstantBuffer<CbVsMatrix>,
    object: &SceneObject,
    view_projection: &Matrix4,
) -> Result<()> {
    let Some(mesh) = object.mesh else {
        return Ok(());
    };

    let world = object.matrix();
    *cb.data_mut() = CbVsMatrix {
        world_view_proj: matrix_data(&(view_projection * world)),
        world: matrix_data(world),
    };
    cb.apply_changes(device)?;
    device.set_constant_buffer(ShaderStage::Vertex, slots::MATRIX, cb.buffer());

    bind_texture(device, object.texture);
    mesh.draw(device);
    Ok(())
}

/// 绘制屏幕空间精灵
pub fn draw_sprite<D: RenderDevice + ?Sized>(
    device: &mut D,
    cb: &mut ConstantBuffer<CbVsMatrix2D>,
    sprite: &SceneObject,
    world_ortho: &Matrix4,
) -> Result<()> {
    debug_assert!(matches!(sprite.kind(), ObjectKind::Sprite { .. }));
    let Some(mesh) = sprite.mesh else {
        return Ok(());
    };

    cb.data_mut().wvp = matrix_data(&(world_ortho * sprite.matrix()));
    cb.apply_changes(device)?;
    device.set_constant_buffer(ShaderStage::Vertex, slots::MATRIX, cb.buffer());

    bind_texture(device, sprite.texture);
    mesh.draw(device);
    Ok(())
}

/// 实例化绘制的波动地面
#[derive(Debug, Clone)]
pub struct Ground {
    pub object: SceneObject,
    instance_buffer: BufferHandle,
    offsets: Vec<InstanceOffset>,
    elapsed: f32,
    dirty: bool,
}

impl Ground {
    /// `count` 个瓦片，模型空间间距为 1（由对象缩放决定实际尺寸）
    pub fn new<D: RenderDevice + ?Sized>(
        device: &mut D,
        mesh: GpuMesh,
        texture: TextureHandle,
        count: u32,
    ) -> Result<Self> {
        let offsets = primitives::grid_offsets(count, 1.0);
        let bytes: &[u8] = bytemuck::cast_slice(&offsets);
        let instance_buffer = device.create_buffer(
            &BufferDesc::new("ground_instances", BufferKind::Instance, bytes.len() as u32),
            Some(bytes),
        )?;

        Ok(Self {
            object: SceneObject::new("Ground", ObjectKind::Primitive).with_mesh(mesh, Some(texture)),
            instance_buffer,
            offsets,
            elapsed: 0.0,
            dirty: false,
        })
    }

    pub fn instance_count(&self) -> u32 {
        self.offsets.len() as u32
    }

    pub fn offsets(&self) -> &[InstanceOffset] {
        &self.offsets
    }

    /// 推进波动动画（只修改 CPU 数据）
    pub fn animate(&mut self, dt: f32) {
        self.elapsed += dt;
        let phase = self.elapsed * WAVE_SPEED;
        for instance in &mut self.offsets {
            let [x, _, z] = instance.offset;
            instance.offset[1] = WAVE_AMPLITUDE * (phase + (x + z) * WAVE_FREQUENCY).sin();
        }
        self.dirty = true;
    }

    /// 上传实例数据并绘制；`use_quad` 在绘制期间打开
    pub fn draw<D: RenderDevice + ?Sized>(
        &mut self,
        device: &mut D,
        cb_matrix: &mut ConstantBuffer<CbVsMatrix>,
        cb_light: &mut ConstantBuffer<CbPsLight>,
        view_projection: &Matrix4,
    ) -> Result<()> {
        let Some(mesh) = self.object.mesh else {
            return Ok(());
        };

        if self.dirty {
            device.update_buffer(self.instance_buffer, bytemuck::cast_slice(&self.offsets))?;
            self.dirty = false;
        }

        let world = self.object.matrix();
        *cb_matrix.data_mut() = CbVsMatrix {
            world_view_proj: matrix_data(&(view_projection * world)),
            world: matrix_data(world),
        };
        cb_matrix.apply_changes(device)?;
        device.set_constant_buffer(ShaderStage::Vertex, slots::MATRIX, cb_matrix.buffer());

        cb_light.data_mut().use_quad = 1;
        cb_light.apply_changes(device)?;

        bind_texture(device, self.object.texture);
        device.set_vertex_buffers(&[
            (mesh.vertex_buffer, mesh.stride),
            (self.instance_buffer, std::mem::size_of::<InstanceOffset>() as u32),
        ]);
        device.set_index_buffer(mesh.index_buffer);
        device.draw_indexed_instanced(mesh.index_count, self.instance_count());

        cb_light.data_mut().use_quad = 0;
        cb_light.apply_changes(device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::headless::{Command, HeadlessDevice};

    fn ground(device: &mut HeadlessDevice) -> Ground {
        let mesh = upload_mesh(device, &primitives::plane()).unwrap();
        let texture = device.create_texture("grass", 1, 1, &[0, 255, 0, 255]).unwrap();
        Ground::new(device, mesh, texture, 400).unwrap()
    }

    #[test]
    fn test_upload_mesh() {
        let mut device = HeadlessDevice::new(800, 600);
        let mesh = upload_mesh(&mut device, &primitives::cube()).unwrap();
        assert_eq!(mesh.index_count, 36);
        assert_eq!(mesh.stride, 32);
        assert!(device.buffer_named("Cube_vb").is_some());
    }

    #[test]
    fn test_object_without_mesh_draws_nothing() {
        let mut device = HeadlessDevice::new(800, 600);
        let mut cb = ConstantBuffer::<CbVsMatrix>::new(&mut device, "cb_vs_matrix").unwrap();
        let camera = SceneObject::new("Camera", ObjectKind::Camera3D);

        draw_object(&mut device, &mut cb, &camera, &Matrix4::identity()).unwrap();
        assert_eq!(device.draw_count(), 0);
    }

    #[test]
    fn test_matrix_upload_failure_skips_draw() {
        let mut device = HeadlessDevice::new(800, 600);
        let mesh = upload_mesh(&mut device, &primitives::cube()).unwrap();
        let mut cb = ConstantBuffer::<CbVsMatrix>::new(&mut device, "cb_vs_matrix").unwrap();
        let cube = SceneObject::new("Cube", ObjectKind::Primitive).with_mesh(mesh, None);

        device.fail_uploads_to("cb_vs_matrix");
        assert!(draw_object(&mut device, &mut cb, &cube, &Matrix4::identity()).is_err());
        assert_eq!(device.draw_count(), 0);
    }

    #[test]
    fn test_untextured_object_does_not_inherit_texture() {
        let mut device = HeadlessDevice::new(800, 600);
        let mesh = upload_mesh(&mut device, &primitives::cube()).unwrap();
        let grass = device.create_texture("grass", 1, 1, &[0, 255, 0, 255]).unwrap();
        let mut cb = ConstantBuffer::<CbVsMatrix>::new(&mut device, "cb_vs_matrix").unwrap();

        let textured = SceneObject::new("Box", ObjectKind::Primitive).with_mesh(mesh, Some(grass));
        let plain = SceneObject::new("Plain", ObjectKind::Model).with_mesh(mesh, None);

        draw_object(&mut device, &mut cb, &textured, &Matrix4::identity()).unwrap();
        assert_eq!(device.bound().shader_resources.get(&0), Some(&ShaderResource::Texture(grass)));

        draw_object(&mut device, &mut cb, &plain, &Matrix4::identity()).unwrap();
        assert_eq!(device.bound().shader_resources.get(&0), None);
        assert_eq!(device.draw_count(), 2);
    }

    #[test]
    fn test_ground_draws_all_instances_and_resets_quad_flag() {
        let mut device = HeadlessDevice::new(800, 600);
        let mut ground = ground(&mut device);
        let mut cb_matrix = ConstantBuffer::<CbVsMatrix>::new(&mut device, "cb_vs_matrix").unwrap();
        let mut cb_light = ConstantBuffer::<CbPsLight>::new(&mut device, "cb_ps_light").unwrap();

        ground.animate(16.0);
        ground.draw(&mut device, &mut cb_matrix, &mut cb_light, &Matrix4::identity()).unwrap();

        assert!(device.commands().contains(&Command::Draw { index_count: 6, instance_count: 400 }));
        assert_eq!(cb_light.data().use_quad, 0);

        let uploaded = device.buffer_named("ground_instances").and_then(|b| device.buffer_contents(b)).unwrap();
        assert_eq!(uploaded, bytemuck::cast_slice::<InstanceOffset, u8>(ground.offsets()));
    }

    #[test]
    fn test_ground_wave_stays_small() {
        let mut device = HeadlessDevice::new(800, 600);
        let mut ground = ground(&mut device);
        for _ in 0..50 {
            ground.animate(33.0);
        }
        assert!(ground.offsets().iter().all(|o| o.offset[1].abs() <= WAVE_AMPLITUDE));
        assert!(ground.offsets().iter().any(|o| o.offset[1] != 0.0));
    }
}
