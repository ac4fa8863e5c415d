//! 网格数据结构模块
//!
//! CPU 侧的网格数据容器，用于存储从文件加载或程序生成的几何数据。
//! 渲染器将 `MeshData` 上传为顶点/索引缓冲区。

use bytemuck::Pod;

use super::vertex::VertexPosTexNrm;

/// CPU侧网格数据
///
/// 泛型参数 `V` 为顶点格式，默认是模型使用的 `VertexPosTexNrm`。
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData<V: Pod = VertexPosTexNrm> {
    /// 顶点数组
    pub vertices: Vec<V>,

    /// 索引数组（三角形列表）
    pub indices: Vec<u32>,

    /// 网格名称（可选）
    pub name: Option<String>,
}

impl<V: Pod> MeshData<V> {
    /// 创建空网格
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            name: None,
        }
    }

    /// 创建带名称的空网格
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            name: Some(name.into()),
        }
    }

    /// 由顶点和索引直接构建
    pub fn from_parts(name: impl Into<String>, vertices: Vec<V>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            name: Some(name.into()),
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// 顶点数据的字节视图
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// 索引数据的字节视图
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// 验证网格数据的完整性
    pub fn validate(&self) -> Result<(), String> {
        if self.vertices.is_empty() || self.indices.is_empty() {
            return Err("网格不包含任何顶点或索引".to_string());
        }

        if self.indices.len() % 3 != 0 {
            return Err(format!(
                "索引数量必须是3的倍数，当前为: {}",
                self.indices.len()
            ));
        }

        let vertex_count = self.vertices.len() as u32;
        if let Some((i, &index)) = self.indices.iter().enumerate().find(|&(_, &idx)| idx >= vertex_count) {
            return Err(format!(
                "索引 {} 处的值 {} 超出顶点范围 (0-{})",
                i,
                index,
                vertex_count - 1
            ));
        }

        Ok(())
    }
}

impl<V: Pod> Default for MeshData<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::vertex::VertexPos;

    fn triangle() -> MeshData<VertexPos> {
        MeshData::from_parts(
            "Triangle",
            vec![
                VertexPos { position: [0.0, 0.0, 0.0] },
                VertexPos { position: [1.0, 0.0, 0.0] },
                VertexPos { position: [0.0, 1.0, 0.0] },
            ],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn test_mesh_data_creation() {
        let mesh: MeshData = MeshData::new();

        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.index_count(), 0);
        assert!(mesh.name.is_none());
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn test_byte_views() {
        let mesh = triangle();
        assert_eq!(mesh.vertex_bytes().len(), 36);
        assert_eq!(mesh.index_bytes().len(), 12);
        assert_eq!(mesh.triangle_count(), 1);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_out_of_range_index() {
        let mut mesh = triangle();
        mesh.indices[2] = 7;
        let err = mesh.validate().unwrap_err();
        assert!(err.contains("7"));
    }
}
