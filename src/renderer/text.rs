//! 屏幕空间文字
//!
//! 初始化时用 fontdue 把可打印 ASCII 字符光栅化到一张字形图集（白色 RGB，
//! alpha 为覆盖率），之后每段文字排版成一串纹理四边形，
//! 用 `Sprite.fx` 和 2D 矩阵常量缓冲区绘制。
//!
//! 顶点缓冲区是动态的，每次绘制整体覆盖（WRITE_DISCARD）；
//! 索引缓冲区按最大字符数一次性生成。

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::core::error::{AssetError, Result};
use crate::geometry::VertexPosTex;
use super::device::{
    BufferDesc, BufferHandle, BufferKind, RenderDevice, ShaderResource, TextureHandle,
};

/// 字号（像素）
pub const FONT_SIZE: f32 = 18.0;
/// 单次绘制的最大字符数
pub const MAX_TEXT_CHARS: usize = 128;

const ATLAS_WIDTH: u32 = 256;
const GLYPH_PADDING: u32 = 1;
const FIRST_CHAR: char = ' ';
const LAST_CHAR: char = '~';
/// 图集中没有的字符用它代替
const FALLBACK_CHAR: char = '?';

/// 图集中的一个字形
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    /// 相对于笔位置和行顶的偏移（像素，y 向下）
    pub offset: [f32; 2],
    pub size: [f32; 2],
    pub uv_min: [f32; 2],
    pub uv_max: [f32; 2],
    pub advance: f32,
}

/// 光栅化后的字形图集
#[derive(Debug, Clone)]
pub struct GlyphAtlas {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
    glyphs: HashMap<char, Glyph>,
}

struct Bitmap {
    c: char,
    metrics: fontdue::Metrics,
    coverage: Vec<u8>,
    x: u32,
    y: u32,
}

impl GlyphAtlas {
    /// 光栅化 `' '..='~'` 并按行装箱
    pub fn build(font: &fontdue::Font, px: f32) -> Result<Self> {
        let ascent = font
            .horizontal_line_metrics(px)
            .map(|m| m.ascent)
            .ok_or_else(|| AssetError::ParseError("Font has no horizontal line metrics".to_string()))?;

        // 行装箱：放不下就换行
        let mut bitmaps = Vec::new();
        let (mut cursor_x, mut cursor_y, mut row_height) = (GLYPH_PADDING, GLYPH_PADDING, 0);
        for c in FIRST_CHAR..=LAST_CHAR {
            let (metrics, coverage) = font.rasterize(c, px);
            let (w, h) = (metrics.width as u32, metrics.height as u32);
            if cursor_x + w + GLYPH_PADDING > ATLAS_WIDTH {
                cursor_y += row_height + GLYPH_PADDING;
                cursor_x = GLYPH_PADDING;
                row_height = 0;
            }
            bitmaps.push(Bitmap { c, metrics, coverage, x: cursor_x, y: cursor_y });
            cursor_x += w + GLYPH_PADDING;
            row_height = row_height.max(h);
        }
        let height = (cursor_y + row_height + GLYPH_PADDING).next_power_of_two();

        let mut rgba = vec![0u8; (ATLAS_WIDTH * height * 4) as usize];
        for texel in rgba.chunks_exact_mut(4) {
            texel[..3].fill(255);
        }

        let mut glyphs = HashMap::new();
        for Bitmap { c, metrics, coverage, x, y } in bitmaps {
            let (w, h) = (metrics.width as u32, metrics.height as u32);
            for row in 0..h {
                for col in 0..w {
                    let alpha = coverage[(row * w + col) as usize];
                    rgba[(((y + row) * ATLAS_WIDTH + x + col) * 4 + 3) as usize] = alpha;
                }
            }

            let (atlas_w, atlas_h) = (ATLAS_WIDTH as f32, height as f32);
            glyphs.insert(
                c,
                Glyph {
                    // fontdue 的 ymin 是位图底边相对基线的高度（y 向上）
                    offset: [metrics.xmin as f32, ascent - (metrics.ymin as f32 + h as f32)],
                    size: [w as f32, h as f32],
                    uv_min: [x as f32 / atlas_w, y as f32 / atlas_h],
                    uv_max: [(x + w) as f32 / atlas_w, (y + h) as f32 / atlas_h],
                    advance: metrics.advance_width,
                },
            );
        }

        debug!(width = ATLAS_WIDTH, height, glyphs = glyphs.len(), px, "Glyph atlas built");
        Ok(Self { width: ATLAS_WIDTH, height, rgba, glyphs })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    /// 字符对应的字形；图集外的字符返回 `'?'`
    pub fn glyph(&self, c: char) -> Option<&Glyph> {
        self.glyphs.get(&c).or_else(|| self.glyphs.get(&FALLBACK_CHAR))
    }

    /// 一行文字的宽度（像素）
    pub fn measure(&self, text: &str) -> f32 {
        text.chars().filter_map(|c| self.glyph(c)).map(|g| g.advance).sum()
    }

    /// 排版成四边形顶点，每个可见字形 4 个；`origin` 为左上角（像素）
    pub fn layout(&self, text: &str, origin: [f32; 2]) -> Vec<VertexPosTex> {
        let mut vertices = Vec::with_capacity(text.len() * 4);
        let mut pen = origin[0];
        for glyph in text.chars().filter_map(|c| self.glyph(c)) {
            if glyph.size[0] > 0.0 && glyph.size[1] > 0.0 {
                let x0 = pen + glyph.offset[0];
                let y0 = origin[1] + glyph.offset[1];
                let (x1, y1) = (x0 + glyph.size[0], y0 + glyph.size[1]);
                let ([u0, v0], [u1, v1]) = (glyph.uv_min, glyph.uv_max);
                vertices.extend([
                    VertexPosTex::new([x0, y0, 0.0], [u0, v0]),
                    VertexPosTex::new([x1, y0, 0.0], [u1, v0]),
                    VertexPosTex::new([x1, y1, 0.0], [u1, v1]),
                    VertexPosTex::new([x0, y1, 0.0], [u0, v1]),
                ]);
            }
            pen += glyph.advance;
        }
        vertices
    }
}

/// 已绘制的一段文字
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub position: [f32; 2],
    pub glyphs: u32,
}

/// 字形图集 + 四边形批次
///
/// 调用方负责绑定精灵着色器和 2D 矩阵常量缓冲区。
#[derive(Debug)]
pub struct TextRenderer {
    atlas: GlyphAtlas,
    texture: TextureHandle,
    vertex_buffer: BufferHandle,
    index_buffer: BufferHandle,
    runs: Vec<TextRun>,
}

impl TextRenderer {
    pub fn new<D: RenderDevice + ?Sized>(device: &mut D, font: &fontdue::Font) -> Result<Self> {
        let atlas = GlyphAtlas::build(font, FONT_SIZE)?;
        let (width, height) = atlas.size();
        let texture = device.create_texture("GlyphAtlas", width, height, atlas.rgba())?;

        let vertex_bytes = (MAX_TEXT_CHARS * 4 * std::mem::size_of::<VertexPosTex>()) as u32;
        let vertex_buffer =
            device.create_buffer(&BufferDesc::new("Text_vb", BufferKind::DynamicVertex, vertex_bytes), None)?;

        let indices: Vec<u32> = (0..MAX_TEXT_CHARS as u32)
            .flat_map(|i| [0, 1, 2, 0, 2, 3].map(|k| i * 4 + k))
            .collect();
        let index_bytes: &[u8] = bytemuck::cast_slice(&indices);
        let index_buffer = device.create_buffer(
            &BufferDesc::new("Text_ib", BufferKind::Index, index_bytes.len() as u32),
            Some(index_bytes),
        )?;

        Ok(Self { atlas, texture, vertex_buffer, index_buffer, runs: Vec::new() })
    }

    pub fn atlas(&self) -> &GlyphAtlas {
        &self.atlas
    }

    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    /// 本帧绘制过的文字
    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    /// 开始新的一帧，清空记录
    pub fn begin(&mut self) {
        self.runs.clear();
    }

    /// 上传顶点并绘制一段文字；上传失败时不发出绘制调用
    pub fn draw<D: RenderDevice + ?Sized>(&mut self, device: &mut D, text: &str, position: [f32; 2]) -> Result<()> {
        let mut vertices = self.atlas.layout(text, position);
        if vertices.len() > MAX_TEXT_CHARS * 4 {
            warn!(text, max = MAX_TEXT_CHARS, "Text truncated");
            vertices.truncate(MAX_TEXT_CHARS * 4);
        }
        let glyphs = (vertices.len() / 4) as u32;

        if glyphs > 0 {
            device.update_buffer(self.vertex_buffer, bytemuck::cast_slice(&vertices))?;
            device.set_vertex_buffers(&[(self.vertex_buffer, std::mem::size_of::<VertexPosTex>() as u32)]);
            device.set_index_buffer(self.index_buffer);
            device.set_shader_resource(0, Some(ShaderResource::Texture(self.texture)));
            device.draw_indexed(glyphs * 6);
        }

        self.runs.push(TextRun { text: text.to_string(), position, glyphs });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::headless::{Command, HeadlessDevice};
    use crate::renderer::assets::testing;

    fn font() -> fontdue::Font {
        fontdue::Font::from_bytes(testing::FONT_BYTES, fontdue::FontSettings::default()).unwrap()
    }

    #[test]
    fn test_atlas_covers_printable_ascii() {
        let atlas = GlyphAtlas::build(&font(), FONT_SIZE).unwrap();
        let (width, height) = atlas.size();
        assert_eq!(width, ATLAS_WIDTH);
        assert!(height.is_power_of_two());
        assert_eq!(atlas.rgba().len(), (width * height * 4) as usize);

        for c in FIRST_CHAR..=LAST_CHAR {
            let glyph = atlas.glyphs.get(&c).unwrap();
            assert!(glyph.advance > 0.0, "{:?}", c);
            assert!(glyph.uv_max[0] <= 1.0 && glyph.uv_max[1] <= 1.0, "{:?}", c);
        }

        // 颜色恒为白色，覆盖率写入 alpha
        assert!(atlas.rgba().chunks_exact(4).all(|t| t[..3] == [255, 255, 255]));
        assert!(atlas.rgba().chunks_exact(4).any(|t| t[3] > 0));
    }

    #[test]
    fn test_layout_skips_blank_glyphs_and_advances() {
        let atlas = GlyphAtlas::build(&font(), FONT_SIZE).unwrap();
        let vertices = atlas.layout("Press 'C'", [100.0, 50.0]);
        // 空格不产生四边形
        assert_eq!(vertices.len(), 8 * 4);

        let lefts: Vec<f32> = vertices.chunks_exact(4).map(|q| q[0].position[0]).collect();
        assert!(lefts.windows(2).all(|w| w[1] > w[0]));
        assert!(lefts[0] >= 100.0 - 2.0);
        assert!(vertices.iter().all(|v| v.position[1] >= 50.0 - 1.0 && v.position[1] <= 50.0 + FONT_SIZE * 1.5));
        assert!((atlas.measure("ab") - (atlas.measure("a") + atlas.measure("b"))).abs() < 1e-4);
    }

    #[test]
    fn test_unknown_characters_use_fallback() {
        let atlas = GlyphAtlas::build(&font(), FONT_SIZE).unwrap();
        assert_eq!(atlas.glyph('é'), atlas.glyph('?'));
        assert_eq!(atlas.layout("é", [0.0, 0.0]), atlas.layout("?", [0.0, 0.0]));
    }

    #[test]
    fn test_draw_uploads_quads_and_binds_atlas() {
        let mut device = HeadlessDevice::new(800, 600);
        let mut text = TextRenderer::new(&mut device, &font()).unwrap();
        device.clear_commands();

        text.draw(&mut device, "Hi there", [10.0, 0.0]).unwrap();
        text.draw(&mut device, "   ", [10.0, 20.0]).unwrap();

        let commands = device.commands();
        assert!(commands.contains(&Command::SetShaderResource {
            slot: 0,
            resource: Some(ShaderResource::Texture(text.texture()))
        }));
        assert_eq!(commands.iter().filter(|c| c.is_draw()).count(), 1);
        assert!(commands.contains(&Command::Draw { index_count: 7 * 6, instance_count: 1 }));
        assert_eq!(
            text.runs().iter().map(|r| (r.text.as_str(), r.glyphs)).collect::<Vec<_>>(),
            vec![("Hi there", 7), ("   ", 0)]
        );

        text.begin();
        assert!(text.runs().is_empty());
    }

    #[test]
    fn test_long_text_is_truncated() {
        let mut device = HeadlessDevice::new(800, 600);
        let mut text = TextRenderer::new(&mut device, &font()).unwrap();
        let long = "x".repeat(MAX_TEXT_CHARS + 10);
        text.draw(&mut device, &long, [0.0, 0.0]).unwrap();
        assert_eq!(text.runs()[0].glyphs, MAX_TEXT_CHARS as u32);
    }

    #[test]
    fn test_vertex_upload_failure_skips_draw() {
        let mut device = HeadlessDevice::new(800, 600);
        let mut text = TextRenderer::new(&mut device, &font()).unwrap();
        device.fail_uploads_to("Text_vb");
        assert!(text.draw(&mut device, "Hi", [0.0, 0.0]).is_err());
        assert_eq!(device.draw_count(), 0);
        assert!(text.runs().is_empty());
    }
}
