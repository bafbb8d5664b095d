use crate::canvas::{Canvas, ImageId};
use crate::text::{measure_line, TextCache};
use ab_glyph::FontArc;
use anyhow::{anyhow, bail, Context, Result};
use reflex_core::Color;
use std::path::Path;
use tiny_skia::{
    FillRule, FilterQuality, IntSize, Paint, PathBuilder, Pixmap, PixmapPaint, Transform,
};

fn to_skia(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color[0], color[1], color[2], color[3])
}

/// Software canvas backed by a tiny-skia pixmap. Offscreen by itself;
/// display adapters wrap it and override presentation.
pub struct SkiaCanvas {
    width: u32,
    height: u32,
    pixmap: Pixmap,
    text_cache: TextCache,
    images: Vec<Pixmap>,
}

impl SkiaCanvas {
    pub fn new(width: u32, height: u32, font: FontArc) -> Result<Self> {
        let pixmap = Pixmap::new(width, height)
            .ok_or_else(|| anyhow!("invalid canvas size {width}x{height}"))?;
        Ok(Self {
            width,
            height,
            pixmap,
            text_cache: TextCache::new(font),
            images: Vec::new(),
        })
    }

    /// Premultiplied RGBA frame bytes, row-major.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }
}

impl Canvas for SkiaCanvas {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self, color: Color) {
        self.pixmap.fill(to_skia(color));
    }

    fn measure_text(&self, text: &str, size: f32) -> (u32, u32) {
        measure_line(self.text_cache.font(), text, size)
    }

    fn draw_text(&mut self, text: &str, top_left: (i32, i32), size: f32, color: Color) {
        let pm = self.text_cache.get_or_render(text, size, color);
        self.pixmap.draw_pixmap(
            top_left.0,
            top_left.1,
            (*pm).as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    fn load_image(&mut self, path: &Path) -> Result<ImageId> {
        let decoded = image::open(path)
            .with_context(|| format!("unable to decode image {}", path.display()))?
            .to_rgba8();
        let (w, h) = decoded.dimensions();
        let mut data = decoded.into_raw();
        // tiny-skia stores premultiplied alpha.
        for px in data.chunks_exact_mut(4) {
            let a = px[3] as u16;
            px[0] = (px[0] as u16 * a / 255) as u8;
            px[1] = (px[1] as u16 * a / 255) as u8;
            px[2] = (px[2] as u16 * a / 255) as u8;
        }
        let size = IntSize::from_wh(w, h)
            .ok_or_else(|| anyhow!("image {} has a zero dimension", path.display()))?;
        let pixmap = Pixmap::from_vec(data, size)
            .ok_or_else(|| anyhow!("image {} does not fit a pixmap", path.display()))?;
        let id = ImageId(self.images.len());
        self.images.push(pixmap);
        Ok(id)
    }

    fn image_size(&self, image: ImageId) -> (u32, u32) {
        self.images
            .get(image.0)
            .map_or((0, 0), |pm| (pm.width(), pm.height()))
    }

    fn scale_image(&mut self, image: ImageId, width: u32, height: u32) -> Result<ImageId> {
        if width == 0 || height == 0 {
            bail!("cannot scale image to {width}x{height}");
        }
        let src = self
            .images
            .get(image.0)
            .ok_or_else(|| anyhow!("unknown image handle"))?;
        let sx = width as f32 / src.width() as f32;
        let sy = height as f32 / src.height() as f32;
        let mut scaled =
            Pixmap::new(width, height).ok_or_else(|| anyhow!("scale target too large"))?;
        scaled.draw_pixmap(
            0,
            0,
            src.as_ref(),
            &PixmapPaint {
                quality: FilterQuality::Bilinear,
                ..PixmapPaint::default()
            },
            Transform::from_scale(sx, sy),
            None,
        );
        let id = ImageId(self.images.len());
        self.images.push(scaled);
        Ok(id)
    }

    fn draw_image(&mut self, image: ImageId, top_left: (i32, i32)) {
        if let Some(pm) = self.images.get(image.0) {
            self.pixmap.draw_pixmap(
                top_left.0,
                top_left.1,
                pm.as_ref(),
                &PixmapPaint::default(),
                Transform::identity(),
                None,
            );
        }
    }

    fn fill_circle(&mut self, center: (i32, i32), radius: u32, color: Color) {
        let mut pb = PathBuilder::new();
        pb.push_circle(center.0 as f32, center.1 as f32, radius as f32);
        let path = match pb.finish() {
            Some(path) => path,
            None => return,
        };
        let mut paint = Paint::default();
        paint.anti_alias = false;
        paint.set_color(to_skia(color));
        self.pixmap
            .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }

    fn present(&mut self) {
        // Offscreen canvas; display adapters override presentation.
    }
}
