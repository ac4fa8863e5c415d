//! 资源加载
//!
//! `Graphics::initialize` 通过 `AssetLoader` 读取着色器源码、纹理、字体和模型，
//! 路径相对于资源根目录。任何缺失或损坏的资源都是致命的初始化错误。
//!
//! - `FileAssets`：从磁盘读取（image 解码纹理，fontdue 解析字体，tobj 解析 OBJ）
//! - `MemoryAssets`：从内存表读取，用于嵌入资源和测试

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::error::{AssetError, Result};
use crate::geometry::loaders;
use crate::geometry::MeshData;

/// 固定的资源路径
pub mod paths {
    pub const SHADER_MODEL: &str = "shaders/Model.fx";
    pub const SHADER_MODEL_INSTANCED: &str = "shaders/Model_Instanced.fx";
    pub const SHADER_MODEL_NO_LIGHT: &str = "shaders/Model_NoLight.fx";
    pub const SHADER_OUTLINE: &str = "shaders/Outline.fx";
    pub const SHADER_SPRITE: &str = "shaders/Sprite.fx";
    pub const SHADER_SPRITE_DISCARD: &str = "shaders/Sprite_Discard.fx";
    pub const SHADER_FULLSCREEN: &str = "shaders/Fullscreen.fx";

    pub const TEXTURE_BOX: &str = "textures/CrashBox.png";
    pub const TEXTURE_GRASS: &str = "textures/grass.png";
    pub const TEXTURE_STARS: &str = "textures/stars.png";
    pub const TEXTURE_MENU_BG: &str = "textures/Transparency.png";
    pub const TEXTURE_MENU_LOGO: &str = "textures/dx-logo-new.png";
    pub const TEXTURE_MENU_CAMERA: &str = "textures/camera.png";
    pub const TEXTURE_MENU_LIGHT: &str = "textures/point-light.png";
    pub const TEXTURE_MENU_SCENE: &str = "textures/scene.png";
    pub const TEXTURE_CIRCLE: &str = "textures/circle.png";
    pub const TEXTURE_SQUARE: &str = "textures/purpleheart.png";

    pub const FONT_HUD: &str = "fonts/DejaVuSansMono.ttf";

    pub const SHADERS: [&str; 7] = [
        SHADER_MODEL,
        SHADER_MODEL_INSTANCED,
        SHADER_MODEL_NO_LIGHT,
        SHADER_OUTLINE,
        SHADER_SPRITE,
        SHADER_SPRITE_DISCARD,
        SHADER_FULLSCREEN,
    ];

    pub const TEXTURES: [&str; 10] = [
        TEXTURE_BOX,
        TEXTURE_GRASS,
        TEXTURE_STARS,
        TEXTURE_MENU_BG,
        TEXTURE_MENU_LOGO,
        TEXTURE_MENU_CAMERA,
        TEXTURE_MENU_LIGHT,
        TEXTURE_MENU_SCENE,
        TEXTURE_CIRCLE,
        TEXTURE_SQUARE,
    ];
}

/// 解码后的 RGBA8 纹理
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl TextureData {
    fn decode(path: &str, bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| AssetError::ParseError(format!("Failed to decode texture {}: {}", path, e)))?
            .to_rgba8();
        let (width, height) = image.dimensions();
        Ok(Self { width, height, rgba: image.into_raw() })
    }
}

fn parse_font(path: &str, bytes: &[u8]) -> Result<fontdue::Font> {
    fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
        .map_err(|e| AssetError::ParseError(format!("Failed to parse font {}: {}", path, e)).into())
}

/// 资源来源
pub trait AssetLoader {
    fn load_shader_source(&self, path: &str) -> Result<String>;

    fn load_texture(&self, path: &str) -> Result<TextureData>;

    /// TrueType / OpenType 字体
    fn load_font(&self, path: &str) -> Result<fontdue::Font>;

    fn load_mesh(&self, path: &str) -> Result<MeshData>;
}

/// 磁盘上的资源目录
#[derive(Debug, Clone)]
pub struct FileAssets {
    root: PathBuf,
}

impl FileAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let full = self.root.join(path);
        if full.exists() {
            Ok(full)
        } else {
            Err(AssetError::FileNotFound(full).into())
        }
    }
}

impl AssetLoader for FileAssets {
    fn load_shader_source(&self, path: &str) -> Result<String> {
        let full = self.resolve(path)?;
        Ok(std::fs::read_to_string(full)?)
    }

    fn load_texture(&self, path: &str) -> Result<TextureData> {
        let full = self.resolve(path)?;
        let bytes = std::fs::read(&full)?;
        let texture = TextureData::decode(path, &bytes)?;
        debug!(path, width = texture.width, height = texture.height, "Loaded texture");
        Ok(texture)
    }

    fn load_font(&self, path: &str) -> Result<fontdue::Font> {
        let full = self.resolve(path)?;
        let font = parse_font(path, &std::fs::read(&full)?)?;
        debug!(path, glyphs = font.glyph_count(), "Loaded font");
        Ok(font)
    }

    fn load_mesh(&self, path: &str) -> Result<MeshData> {
        let full = self.resolve(path)?;
        loaders::load_mesh(&full)
    }
}

/// 内存中的资源表
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), bytes.into());
    }

    pub fn remove(&mut self, path: &str) -> Option<Vec<u8>> {
        self.files.remove(path)
    }

    fn get(&self, path: &str) -> Result<&[u8]> {
        self.files
            .get(path)
            .map(Vec::as_slice)
            .ok_or_else(|| AssetError::FileNotFound(PathBuf::from(path)).into())
    }
}

impl AssetLoader for MemoryAssets {
    fn load_shader_source(&self, path: &str) -> Result<String> {
        let bytes = self.get(path)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| AssetError::ParseError(format!("{}: {}", path, e)).into())
    }

    fn load_texture(&self, path: &str) -> Result<TextureData> {
        TextureData::decode(path, self.get(path)?)
    }

    fn load_font(&self, path: &str) -> Result<fontdue::Font> {
        parse_font(path, self.get(path)?)
    }

    fn load_mesh(&self, path: &str) -> Result<MeshData> {
        loaders::load_mesh_from_memory(Path::new(path), self.get(path)?)
    }
}

/// 测试用资源：真实的着色器源码和字体、1x1 纹理、一个简单的 OBJ 模型
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::core::scene::SceneConfig;

    pub const TRIANGLE_OBJ: &str = "\
v 0.0 0.0 0.0
v 0.0 1.0 0.0
v 1.0 0.0 0.0
vn 0.0 0.0 -1.0
f 1//1 2//1 3//1
";

    pub const FONT_BYTES: &[u8] = include_bytes!("../../res/fonts/DejaVuSansMono.ttf");

    pub fn png_1x1() -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
            .unwrap();
        bytes
    }

    pub fn shader_source(path: &str) -> &'static str {
        match path {
            paths::SHADER_MODEL => include_str!("../../res/shaders/Model.fx"),
            paths::SHADER_MODEL_INSTANCED => include_str!("../../res/shaders/Model_Instanced.fx"),
            paths::SHADER_MODEL_NO_LIGHT => include_str!("../../res/shaders/Model_NoLight.fx"),
            paths::SHADER_OUTLINE => include_str!("../../res/shaders/Outline.fx"),
            paths::SHADER_SPRITE => include_str!("../../res/shaders/Sprite.fx"),
            paths::SHADER_SPRITE_DISCARD => include_str!("../../res/shaders/Sprite_Discard.fx"),
            paths::SHADER_FULLSCREEN => include_str!("../../res/shaders/Fullscreen.fx"),
            _ => panic!("unknown shader {}", path),
        }
    }

    /// 覆盖给定场景所需的全部资源
    pub fn assets_for(scene: &SceneConfig) -> MemoryAssets {
        let mut assets = MemoryAssets::new();
        for path in paths::SHADERS {
            assets.insert(path, shader_source(path));
        }
        let png = png_1x1();
        for path in paths::TEXTURES {
            assets.insert(path, png.clone());
        }
        assets.insert(paths::FONT_HUD, FONT_BYTES);
        assets.insert(scene.light.model.clone(), TRIANGLE_OBJ);
        assets.insert(scene.light.texture.clone(), png.clone());
        for model in &scene.models {
            assets.insert(model.path.clone(), TRIANGLE_OBJ);
            if let Some(texture) = &model.texture {
                assets.insert(texture.clone(), png.clone());
            }
        }
        assets
    }
}
