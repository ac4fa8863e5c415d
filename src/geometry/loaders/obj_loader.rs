//! OBJ 文件加载器
//!
//! 使用 tobj crate 加载 Wavefront OBJ 格式的模型，转换为 `VertexPosTexNrm` 网格。

use super::MeshLoader;
use crate::core::error::{AssetError, Result};
use crate::geometry::mesh::MeshData;
use crate::geometry::vertex::VertexPosTexNrm;
use crate::math::Vector3;
use std::io::{BufReader, Cursor};
use std::path::Path;

/// OBJ 格式加载器
///
/// - 自动三角化，使用单一索引
/// - 多个对象合并为一个网格
/// - UV 坐标翻转（V轴：1.0 - v）
/// - 缺失法线时按面法线累加重建
pub struct ObjLoader;

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    }
}

impl ObjLoader {
    fn build_mesh(name: &str, models: Vec<tobj::Model>) -> Result<MeshData> {
        if models.is_empty() {
            return Err(AssetError::ValidationError(format!("OBJ '{}' contains no objects", name)).into());
        }

        let mut mesh_data = MeshData::with_name(name);
        let mut has_normals = true;

        for model in &models {
            let mesh = &model.mesh;
            let positions = &mesh.positions;
            let normals = &mesh.normals;
            let texcoords = &mesh.texcoords;

            if positions.len() % 3 != 0 {
                return Err(AssetError::ParseError(format!(
                    "Incomplete position data in '{}': {} floats",
                    model.name,
                    positions.len()
                ))
                .into());
            }

            let vertex_start = mesh_data.vertices.len() as u32;
            let vertex_count = positions.len() / 3;
            has_normals &= normals.len() >= vertex_count * 3;

            for i in 0..vertex_count {
                let position = [positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]];

                let normal = if normals.len() >= (i + 1) * 3 {
                    [normals[i * 3], normals[i * 3 + 1], normals[i * 3 + 2]]
                } else {
                    [0.0, 0.0, 0.0]
                };

                let texcoord = if texcoords.len() >= (i + 1) * 2 {
                    [texcoords[i * 2], 1.0 - texcoords[i * 2 + 1]]
                } else {
                    [0.0, 0.0]
                };

                mesh_data.vertices.push(VertexPosTexNrm::new(position, texcoord, normal));
            }

            mesh_data
                .indices
                .extend(mesh.indices.iter().map(|&index| vertex_start + index));
        }

        if !has_normals {
            tracing::debug!(mesh = name, "OBJ has no normals, reconstructing");
            reconstruct_normals(&mut mesh_data);
        }

        mesh_data.validate().map_err(AssetError::ValidationError)?;

        tracing::debug!(
            mesh = name,
            vertices = mesh_data.vertex_count(),
            triangles = mesh_data.triangle_count(),
            "Loaded OBJ mesh"
        );

        Ok(mesh_data)
    }
}

/// 面法线累加后归一化
fn reconstruct_normals(mesh: &mut MeshData) {
    let mut accum = vec![Vector3::zeros(); mesh.vertices.len()];

    for tri in mesh.indices.chunks_exact(3) {
        let p = |k: usize| Vector3::from(mesh.vertices[tri[k] as usize].position);
        let n = (p(1) - p(0)).cross(&(p(2) - p(0)));
        for &i in tri {
            accum[i as usize] += n;
        }
    }

    for (vertex, n) in mesh.vertices.iter_mut().zip(accum) {
        let n = n.try_normalize(1e-12).unwrap_or_else(Vector3::y);
        vertex.normal = [n.x, n.y, n.z];
    }
}

impl MeshLoader for ObjLoader {
    fn load_from_file(path: &Path) -> Result<MeshData> {
        if !path.exists() {
            return Err(AssetError::FileNotFound(path.to_path_buf()).into());
        }

        let (models, _materials) = tobj::load_obj(path, &load_options())
            .map_err(|e| AssetError::ParseError(format!("{}: {}", path.display(), e)))?;

        let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("Unnamed");
        Self::build_mesh(name, models)
    }

    fn load_from_memory(data: &[u8]) -> Result<MeshData> {
        let mut reader = BufReader::new(Cursor::new(data));

        // 内存中的模型不解析 mtllib
        let (models, _materials) = tobj::load_obj_buf(&mut reader, &load_options(), |_| {
            Err(tobj::LoadError::OpenFileFailed)
        })
        .map_err(|e| AssetError::ParseError(e.to_string()))?;

        Self::build_mesh("Memory", models)
    }

    fn supported_extensions() -> &'static [&'static str] {
        &["obj"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD_OBJ: &str = "\
v -1.0 0.0 -1.0
v -1.0 0.0 1.0
v 1.0 0.0 1.0
v 1.0 0.0 -1.0
vt 0.0 0.0
vt 0.0 1.0
vt 1.0 1.0
vt 1.0 0.0
f 1/1 2/2 3/3 4/4
";

    #[test]
    fn test_supported_extensions() {
        assert_eq!(ObjLoader::supported_extensions(), &["obj"]);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ObjLoader::load_from_file(Path::new("nonexistent.obj"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_memory_triangulates_and_rebuilds_normals() {
        let mesh = ObjLoader::load_from_memory(QUAD_OBJ.as_bytes()).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);

        // 顶点顺序 1-2-3 从上方看是顺时针，重建的法线朝 +Y
        for v in &mesh.vertices {
            assert!((v.normal[1] - 1.0).abs() < 1e-5);
        }
        // V 轴翻转
        assert_eq!(mesh.vertices[1].texcoord, [0.0, 0.0]);
    }

    #[test]
    fn test_load_without_geometry_fails() {
        assert!(ObjLoader::load_from_memory(b"# empty\n").is_err());
    }
}
