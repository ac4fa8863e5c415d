//! 几何体模块
//!
//! 顶点格式、CPU 侧网格数据、程序生成的基础几何体以及模型加载器。
//!
//! ```text
//! 文件 (OBJ) / 程序生成
//!     ↓
//! MeshData (CPU侧数据)
//!     ↓
//! GpuMesh (顶点/索引缓冲区)
//! ```

pub mod vertex;
pub mod mesh;
pub mod primitives;
pub mod loaders;

pub use vertex::{VertexLayout, VertexPos, VertexPosTex, VertexPosTexNrm, InstanceOffset};
pub use mesh::MeshData;
