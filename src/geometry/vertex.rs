//! 顶点格式定义模块
//!
//! 定义着色器使用的三种顶点格式及其输入布局描述：
//!
//! - `VertexPosTexNrm`：模型、立方体、地面（Model / Model_NoLight / Outline 着色器）
//! - `VertexPosTex`：2D 精灵（Sprite / Sprite_Discard 着色器）
//! - `VertexPos`：全屏四边形（Fullscreen 着色器）
//!
//! 所有结构使用 `#[repr(C)]` 并实现 `Pod`，可直接作为字节上传。

use bytemuck::{Pod, Zeroable};

/// 位置 + 纹理坐标 + 法线
///
/// # 内存布局
///
/// - position: 12 bytes
/// - texcoord: 8 bytes
/// - normal: 12 bytes
/// - **总计**: 32 bytes
#[repr(C)]
#[derive(Default, Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct VertexPosTexNrm {
    pub position: [f32; 3],
    pub texcoord: [f32; 2],
    pub normal: [f32; 3],
}

impl VertexPosTexNrm {
    #[inline]
    pub const fn new(position: [f32; 3], texcoord: [f32; 2], normal: [f32; 3]) -> Self {
        Self { position, texcoord, normal }
    }
}

/// 位置 + 纹理坐标（精灵）
#[repr(C)]
#[derive(Default, Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct VertexPosTex {
    pub position: [f32; 3],
    pub texcoord: [f32; 2],
}

impl VertexPosTex {
    #[inline]
    pub const fn new(position: [f32; 3], texcoord: [f32; 2]) -> Self {
        Self { position, texcoord }
    }
}

/// 仅位置（全屏四边形）
#[repr(C)]
#[derive(Default, Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct VertexPos {
    pub position: [f32; 3],
}

/// 地面实例数据：每个实例的世界空间偏移
#[repr(C)]
#[derive(Default, Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceOffset {
    pub offset: [f32; 3],
}

/// 顶点元素格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementFormat {
    Float2,
    Float3,
}

/// 输入布局中的一个元素
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputElement {
    pub semantic: &'static str,
    pub format: ElementFormat,
    /// 所在顶点缓冲区槽位
    pub slot: u32,
    pub offset: u32,
    /// 是否为逐实例数据
    pub per_instance: bool,
}

const fn element(semantic: &'static str, format: ElementFormat, slot: u32, offset: u32, per_instance: bool) -> InputElement {
    InputElement { semantic, format, slot, offset, per_instance }
}

const POS_TEX_NRM: [InputElement; 3] = [
    element("POSITION", ElementFormat::Float3, 0, 0, false),
    element("TEXCOORD", ElementFormat::Float2, 0, 12, false),
    element("NORMAL", ElementFormat::Float3, 0, 20, false),
];

const POS_TEX_NRM_INSTANCED: [InputElement; 4] = [
    element("POSITION", ElementFormat::Float3, 0, 0, false),
    element("TEXCOORD", ElementFormat::Float2, 0, 12, false),
    element("NORMAL", ElementFormat::Float3, 0, 20, false),
    element("INSTANCEPOS", ElementFormat::Float3, 1, 0, true),
];

const POS_TEX: [InputElement; 2] = [
    element("POSITION", ElementFormat::Float3, 0, 0, false),
    element("TEXCOORD", ElementFormat::Float2, 0, 12, false),
];

const POS: [InputElement; 1] = [element("POSITION", ElementFormat::Float3, 0, 0, false)];

/// 顶点着色器的输入布局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexLayout {
    PosTexNrm,
    /// `PosTexNrm` + 槽位 1 上的逐实例偏移
    PosTexNrmInstanced,
    PosTex,
    Pos,
}

impl VertexLayout {
    /// 输入元素列表
    pub fn elements(&self) -> &'static [InputElement] {
        match self {
            VertexLayout::PosTexNrm => &POS_TEX_NRM,
            VertexLayout::PosTexNrmInstanced => &POS_TEX_NRM_INSTANCED,
            VertexLayout::PosTex => &POS_TEX,
            VertexLayout::Pos => &POS,
        }
    }

    /// 槽位 0 的顶点步长（字节）
    pub fn stride(&self) -> u32 {
        match self {
            VertexLayout::PosTexNrm | VertexLayout::PosTexNrmInstanced => {
                std::mem::size_of::<VertexPosTexNrm>() as u32
            }
            VertexLayout::PosTex => std::mem::size_of::<VertexPosTex>() as u32,
            VertexLayout::Pos => std::mem::size_of::<VertexPos>() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn test_vertex_sizes() {
        assert_eq!(size_of::<VertexPosTexNrm>(), 32);
        assert_eq!(size_of::<VertexPosTex>(), 20);
        assert_eq!(size_of::<VertexPos>(), 12);
        assert_eq!(size_of::<InstanceOffset>(), 12);
    }

    #[test]
    fn test_layout_offsets_match_struct() {
        for layout in [VertexLayout::PosTexNrm, VertexLayout::PosTex, VertexLayout::Pos] {
            let last = layout.elements().last().unwrap();
            let width = match last.format {
                ElementFormat::Float2 => 8,
                ElementFormat::Float3 => 12,
            };
            assert_eq!(last.offset + width, layout.stride());
        }
    }

    #[test]
    fn test_instanced_layout_uses_second_slot() {
        let elements = VertexLayout::PosTexNrmInstanced.elements();
        let instance = elements.iter().find(|e| e.per_instance).unwrap();
        assert_eq!(instance.slot, 1);
        assert_eq!(instance.semantic, "INSTANCEPOS");
    }
}
