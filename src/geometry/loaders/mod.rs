//! 模型加载器模块
//!
//! 提供统一的模型加载接口。目前支持 Wavefront OBJ 格式（使用 tobj crate）。

use crate::core::error::{AssetError, Result};
use crate::geometry::mesh::MeshData;
use std::path::Path;

pub mod obj_loader;

pub use obj_loader::ObjLoader;

/// 网格加载器 trait
///
/// 加载器是无状态的（使用关联函数），只返回 CPU 侧的 `MeshData`，不涉及 GPU 资源。
pub trait MeshLoader {
    /// 从文件路径加载网格
    fn load_from_file(path: &Path) -> Result<MeshData>;

    /// 从内存数据加载网格
    fn load_from_memory(data: &[u8]) -> Result<MeshData>;

    /// 支持的文件扩展名（小写，不含点号）
    fn supported_extensions() -> &'static [&'static str];
}

fn extension_of(path: &Path) -> Result<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .ok_or_else(|| {
            AssetError::UnsupportedFormat(format!("Cannot determine extension of '{}'", path.display())).into()
        })
}

/// 根据文件扩展名选择合适的加载器
pub fn load_mesh(path: &Path) -> Result<MeshData> {
    let extension = extension_of(path)?;

    if ObjLoader::supported_extensions().contains(&extension.as_str()) {
        ObjLoader::load_from_file(path)
    } else {
        Err(AssetError::UnsupportedFormat(format!("Unsupported mesh format: .{}", extension)).into())
    }
}

/// 根据扩展名从内存加载（供自定义资源来源使用）
pub fn load_mesh_from_memory(path: &Path, data: &[u8]) -> Result<MeshData> {
    let extension = extension_of(path)?;

    if ObjLoader::supported_extensions().contains(&extension.as_str()) {
        ObjLoader::load_from_memory(data)
    } else {
        Err(AssetError::UnsupportedFormat(format!("Unsupported mesh format: .{}", extension)).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_extension() {
        assert!(load_mesh(Path::new("model.fbx")).is_err());
        assert!(load_mesh(Path::new("model")).is_err());
    }
}
