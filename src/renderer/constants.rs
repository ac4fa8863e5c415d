//! 着色器常量缓冲区布局
//!
//! 与 `res/shaders/*.fx` 中的 cbuffer 一一对应。所有结构体为 `#[repr(C)]`，
//! 大小是 16 字节的整数倍；HLSL 的 `bool` 以 `u32` 存储。
//! 矩阵按列主序上传，着色器中使用 `mul(M, v)`。
//!
//! | 缓冲区 | 阶段 | 槽位 |
//! |---|---|---|
//! | `CbVsMatrix` / `CbVsMatrix2D` | VS | 0 |
//! | `CbVsFullscreen` | VS | 0 |
//! | `CbVsFog` | VS + PS | 1 |
//! | `CbPsOutline` | PS | 1（覆盖雾效槽位，仅轮廓绘制期间） |
//! | `CbPsLight` | PS | 2 |
//! | `CbPsScene` | PS | 3（菜单阶段重新绑定到 1） |

use bytemuck::{Pod, Zeroable};

use crate::math::Matrix4;

/// 常量缓冲区槽位
pub mod slots {
    pub const MATRIX: u32 = 0;
    pub const FOG: u32 = 1;
    pub const OUTLINE: u32 = 1;
    pub const LIGHT: u32 = 2;
    pub const SCENE: u32 = 3;
    /// 菜单精灵的着色器在槽位 1 读取场景参数
    pub const SPRITE_SCENE: u32 = 1;
}

/// 列主序矩阵数据
pub fn matrix_data(m: &Matrix4) -> [[f32; 4]; 4] {
    let columns: &[[f32; 4]; 4] = m.as_ref();
    *columns
}

/// 3D 模型的矩阵
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CbVsMatrix {
    pub world_view_proj: [[f32; 4]; 4],
    pub world: [[f32; 4]; 4],
}

/// 2D 精灵的矩阵
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CbVsMatrix2D {
    pub wvp: [[f32; 4]; 4],
}

/// 全屏后处理参数
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CbVsFullscreen {
    pub multi_view: u32,
    pub _pad: [u32; 3],
}

/// 雾效参数
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CbVsFog {
    pub fog_color: [f32; 3],
    pub fog_start: f32,
    pub fog_end: f32,
    pub fog_enable: u32,
    pub _pad: [f32; 2],
}

/// 点光源参数
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CbPsLight {
    pub ambient_color: [f32; 3],
    pub ambient_strength: f32,

    pub light_color: [f32; 3],
    pub light_strength: f32,

    pub specular_color: [f32; 3],
    pub specular_intensity: f32,

    pub light_position: [f32; 3],
    pub specular_power: f32,

    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    pub use_point_light: u32,

    pub use_quad: u32,
    pub light_flicker: u32,
    pub flicker_amount: f32,
    pub _pad: f32,
}

/// 场景参数
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CbPsScene {
    pub alpha_factor: f32,
    pub use_texture: u32,
    pub _pad: [f32; 2],
}

/// 轮廓颜色
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CbPsOutline {
    pub outline_color: [f32; 3],
    pub _pad: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::matrix;
    use std::mem::size_of;

    #[test]
    fn test_cbuffer_sizes_are_16_byte_multiples() {
        assert_eq!(size_of::<CbVsMatrix>(), 128);
        assert_eq!(size_of::<CbVsMatrix2D>(), 64);
        assert_eq!(size_of::<CbVsFullscreen>(), 16);
        assert_eq!(size_of::<CbVsFog>(), 32);
        assert_eq!(size_of::<CbPsLight>(), 96);
        assert_eq!(size_of::<CbPsScene>(), 16);
        assert_eq!(size_of::<CbPsOutline>(), 16);
    }

    #[test]
    fn test_matrix_data_is_column_major() {
        let m = matrix::translation(1.0, 2.0, 3.0);
        let data = matrix_data(&m);
        assert_eq!(data[3][0], 1.0);
        assert_eq!(data[3][1], 2.0);
        assert_eq!(data[3][2], 3.0);
    }
}
