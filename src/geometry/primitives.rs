//! 程序生成的基础几何体
//!
//! 所有三角形以顺时针为正面（Direct3D 默认的剔除约定）。
//!
//! - `cube`：单位立方体，中心在原点，边长 1（立方体与天空盒共用）
//! - `plane`：XZ 平面上的单位四边形，法线 +Y（地面瓦片）
//! - `sprite_quad`：屏幕空间 (0,0)-(1,1) 四边形，y 轴向下
//! - `fullscreen_quad`：覆盖整个 NDC 的四边形

use super::mesh::MeshData;
use super::vertex::{InstanceOffset, VertexPos, VertexPosTex, VertexPosTexNrm};
use crate::math::Vector3;

const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

/// 每个面的 (法线, 上方向)
const CUBE_FACES: [([f32; 3], [f32; 3]); 6] = [
    ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
    ([0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
    ([-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
    ([0.0, -1.0, 0.0], [0.0, 0.0, -1.0]),
];

/// 从外侧观察时顺时针的面四边形：左下、左上、右上、右下
fn face(center: Vector3, normal: Vector3, up: Vector3, half: f32) -> [VertexPosTexNrm; 4] {
    let right = normal.cross(&up) * half;
    let up = up * half;
    let n = [normal.x, normal.y, normal.z];
    let corner = |p: Vector3, uv: [f32; 2]| VertexPosTexNrm::new([p.x, p.y, p.z], uv, n);

    [
        corner(center - right - up, [0.0, 1.0]),
        corner(center - right + up, [0.0, 0.0]),
        corner(center + right + up, [1.0, 0.0]),
        corner(center + right - up, [1.0, 1.0]),
    ]
}

/// 单位立方体（24 个顶点，36 个索引）
pub fn cube() -> MeshData<VertexPosTexNrm> {
    let mut mesh = MeshData::with_name("Cube");

    for (normal, up) in CUBE_FACES {
        let normal = Vector3::from(normal);
        let base = mesh.vertices.len() as u32;
        mesh.vertices.extend(face(normal * 0.5, normal, Vector3::from(up), 0.5));
        mesh.indices.extend(QUAD_INDICES.iter().map(|i| base + i));
    }

    mesh
}

/// XZ 平面上的单位四边形
pub fn plane() -> MeshData<VertexPosTexNrm> {
    let vertices = face(
        Vector3::zeros(),
        Vector3::new(0.0, 1.0, 0.0),
        Vector3::new(0.0, 0.0, 1.0),
        0.5,
    );
    MeshData::from_parts("Plane", vertices.to_vec(), QUAD_INDICES.to_vec())
}

/// 精灵四边形（像素空间，y 轴向下），由世界矩阵缩放到精灵尺寸
pub fn sprite_quad() -> MeshData<VertexPosTex> {
    MeshData::from_parts(
        "Sprite",
        vec![
            VertexPosTex::new([0.0, 0.0, 0.0], [0.0, 0.0]),
            VertexPosTex::new([1.0, 0.0, 0.0], [1.0, 0.0]),
            VertexPosTex::new([1.0, 1.0, 0.0], [1.0, 1.0]),
            VertexPosTex::new([0.0, 1.0, 0.0], [0.0, 1.0]),
        ],
        QUAD_INDICES.to_vec(),
    )
}

/// 全屏四边形（NDC 空间）
pub fn fullscreen_quad() -> MeshData<VertexPos> {
    MeshData::from_parts(
        "Fullscreen",
        vec![
            VertexPos { position: [-1.0, -1.0, 0.0] },
            VertexPos { position: [-1.0, 1.0, 0.0] },
            VertexPos { position: [1.0, 1.0, 0.0] },
            VertexPos { position: [1.0, -1.0, 0.0] },
        ],
        QUAD_INDICES.to_vec(),
    )
}

/// 以原点为中心的正方形网格实例偏移（`count` 向上取整为完全平方数的边长）
pub fn grid_offsets(count: u32, spacing: f32) -> Vec<InstanceOffset> {
    let side = (count as f32).sqrt().ceil().max(1.0) as u32;
    let half = (side as f32 - 1.0) * 0.5;

    (0..count)
        .map(|i| {
            let x = (i % side) as f32 - half;
            let z = (i / side) as f32 - half;
            InstanceOffset { offset: [x * spacing, 0.0, z * spacing] }
        })
        .collect()
}
