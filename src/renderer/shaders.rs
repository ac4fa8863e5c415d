//! 着色器
//!
//! 所有 HLSL 源文件位于 `res/shaders`，入口点为 `VS` / `PS`，
//! 目标为 `vs_5_0` / `ps_5_0`。初始化时一次性编译；任何编译失败都是致命的，
//! 错误中带有编译器诊断信息。
//!
//! | 着色器 | 用途 | 输入布局 |
//! |---|---|---|
//! | `Model.fx` | 带光照的模型 / 立方体 / 天空盒 | `PosTexNrm` |
//! | `Model_Instanced.fx` | 实例化地面（像素着色器与 `Model.fx` 共用） | `PosTexNrmInstanced` |
//! | `Model_NoLight.fx` | 不受光照的灯模型 | - |
//! | `Outline.fx` | 光源轮廓 | `PosTexNrm` |
//! | `Sprite.fx` | 精灵与菜单 | `PosTex` |
//! | `Sprite_Discard.fx` | 模板遮罩（丢弃透明像素） | - |
//! | `Fullscreen.fx` | 后处理 | `Pos` |

use tracing::{error, info};

use crate::core::error::Result;
use crate::geometry::VertexLayout;
use super::assets::{paths, AssetLoader};
use super::device::{RenderDevice, ShaderHandle};

/// 一对绑定在一起的顶点 / 像素着色器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderPair {
    pub vs: ShaderHandle,
    pub ps: ShaderHandle,
}

impl ShaderPair {
    pub fn bind<D: RenderDevice + ?Sized>(&self, device: &mut D) {
        device.set_shaders(self.vs, self.ps);
    }
}

/// 初始化时编译的全部着色器
#[derive(Debug, Clone, Copy)]
pub struct ShaderSet {
    /// 带光照的模型
    pub model: ShaderPair,
    /// 实例化地面
    pub model_instanced: ShaderPair,
    /// 不受光照（模型顶点着色器 + 无光照像素着色器）
    pub model_no_light: ShaderPair,
    /// 轮廓（模型顶点着色器 + 纯色像素着色器）
    pub outline: ShaderPair,
    pub sprite: ShaderPair,
    /// 精灵顶点着色器 + 丢弃透明像素的像素着色器
    pub sprite_discard: ShaderPair,
    pub fullscreen: ShaderPair,
}

fn vertex<D, A>(device: &mut D, assets: &A, path: &str, layout: VertexLayout) -> Result<ShaderHandle>
where
    D: RenderDevice + ?Sized,
    A: AssetLoader + ?Sized,
{
    let source = assets.load_shader_source(path)?;
    device.compile_vertex_shader(path, &source, layout).map_err(|e| {
        error!(path, error = %e, "Failed to create vertex shader");
        e
    })
}

fn pixel<D, A>(device: &mut D, assets: &A, path: &str) -> Result<ShaderHandle>
where
    D: RenderDevice + ?Sized,
    A: AssetLoader + ?Sized,
{
    let source = assets.load_shader_source(path)?;
    device.compile_pixel_shader(path, &source).map_err(|e| {
        error!(path, error = %e, "Failed to create pixel shader");
        e
    })
}

impl ShaderSet {
    pub fn compile<D, A>(device: &mut D, assets: &A) -> Result<Self>
    where
        D: RenderDevice + ?Sized,
        A: AssetLoader + ?Sized,
    {
        // 模型
        let vs_model = vertex(device, assets, paths::SHADER_MODEL, VertexLayout::PosTexNrm)?;
        let ps_model = pixel(device, assets, paths::SHADER_MODEL)?;
        let vs_instanced = vertex(device, assets, paths::SHADER_MODEL_INSTANCED, VertexLayout::PosTexNrmInstanced)?;
        let ps_no_light = pixel(device, assets, paths::SHADER_MODEL_NO_LIGHT)?;
        let vs_outline = vertex(device, assets, paths::SHADER_OUTLINE, VertexLayout::PosTexNrm)?;
        let ps_outline = pixel(device, assets, paths::SHADER_OUTLINE)?;

        // 精灵
        let vs_sprite = vertex(device, assets, paths::SHADER_SPRITE, VertexLayout::PosTex)?;
        let ps_sprite = pixel(device, assets, paths::SHADER_SPRITE)?;
        let ps_sprite_discard = pixel(device, assets, paths::SHADER_SPRITE_DISCARD)?;

        // 后处理
        let vs_fullscreen = vertex(device, assets, paths::SHADER_FULLSCREEN, VertexLayout::Pos)?;
        let ps_fullscreen = pixel(device, assets, paths::SHADER_FULLSCREEN)?;

        info!(backend = device.backend_name(), "Shaders compiled");

        Ok(Self {
            model: ShaderPair { vs: vs_model, ps: ps_model },
            model_instanced: ShaderPair { vs: vs_instanced, ps: ps_model },
            model_no_light: ShaderPair { vs: vs_model, ps: ps_no_light },
            outline: ShaderPair { vs: vs_outline, ps: ps_outline },
            sprite: ShaderPair { vs: vs_sprite, ps: ps_sprite },
            sprite_discard: ShaderPair { vs: vs_sprite, ps: ps_sprite_discard },
            fullscreen: ShaderPair { vs: vs_fullscreen, ps: ps_fullscreen },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{FrameworkError, GraphicsError};
    use crate::core::SceneConfig;
    use crate::gfx::headless::HeadlessDevice;
    use crate::renderer::assets::testing;

    fn scene() -> SceneConfig {
        SceneConfig::from_toml_str(
            r#"
            [[models]]
            name = "Nanosuit"
            path = "models/nanosuit.obj"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_all_shaders_compile() {
        let mut device = HeadlessDevice::new(800, 600);
        let assets = testing::assets_for(&scene());
        let shaders = ShaderSet::compile(&mut device, &assets).unwrap();

        assert_eq!(shaders.model.ps, shaders.model_instanced.ps);
        assert_eq!(shaders.sprite.vs, shaders.sprite_discard.vs);
        let layout = device.shader(shaders.model_instanced.vs).and_then(|s| s.layout);
        assert_eq!(layout, Some(VertexLayout::PosTexNrmInstanced));
    }

    #[test]
    fn test_compile_failure_carries_diagnostic() {
        let mut device = HeadlessDevice::new(800, 600);
        let mut assets = testing::assets_for(&scene());
        assets.insert(paths::SHADER_OUTLINE, "float4 main() : SV_TARGET { return 1; }");

        match ShaderSet::compile(&mut device, &assets) {
            Err(FrameworkError::Graphics(GraphicsError::ShaderCompilation { path, diagnostic })) => {
                assert_eq!(path, paths::SHADER_OUTLINE);
                assert!(!diagnostic.is_empty());
            }
            other => panic!("expected shader compilation error, got {:?}", other.map(|_| ())),
        }
    }
}
