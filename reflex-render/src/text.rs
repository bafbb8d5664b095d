use ab_glyph::{point, Font, FontArc, Glyph, PxScale, ScaleFont};
use reflex_core::Color;
use std::collections::HashMap;
use std::sync::Arc;
use string_cache::DefaultAtom as Atom;
use tiny_skia::{Pixmap, PremultipliedColorU8};

/// Measures a single line. Width is the pen advance (so trailing spaces
/// count), height is the font's line height at this scale.
pub fn measure_line(font: &FontArc, text: &str, size: f32) -> (u32, u32) {
    let sf = font.as_scaled(PxScale::from(size));
    let mut width = 0.0f32;
    let mut prev = None;
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(p) = prev {
            width += sf.kern(p, id);
        }
        width += sf.h_advance(id);
        prev = Some(id);
    }
    let height = (sf.ascent() - sf.descent()).ceil().max(1.0) as u32;
    (width.ceil() as u32, height)
}

/// Rasterizes one line of text into a transparent premultiplied pixmap.
/// Glyphs sit on the baseline at the font's ascent, so pixmaps of the
/// same size stack with consistent spacing.
pub fn rasterize_line(font: &FontArc, text: &str, size: f32, color: Color) -> Pixmap {
    let scale = PxScale::from(size);
    let sf = font.as_scaled(scale);

    let mut glyphs = Vec::<Glyph>::new();
    let mut pen_x = 0.0f32;
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = glyphs.last() {
            pen_x += sf.kern(prev.id, id);
        }
        glyphs.push(Glyph {
            id,
            scale,
            position: point(pen_x, sf.ascent()),
        });
        pen_x += sf.h_advance(id);
    }

    let (w, h) = measure_line(font, text, size);
    let mut pm = match Pixmap::new(w.max(1), h.max(1)) {
        Some(pm) => pm,
        None => return Pixmap::new(1, 1).unwrap(),
    };

    let stride = pm.width() as usize;
    let (width, height) = (pm.width() as i32, pm.height() as i32);
    let dst = pm.pixels_mut();
    for glyph in &glyphs {
        if let Some(outline) = font.outline_glyph(glyph.clone()) {
            let bounds = outline.px_bounds();
            outline.draw(|x, y, coverage| {
                if coverage <= f32::EPSILON {
                    return;
                }
                let px = x as i32 + bounds.min.x as i32;
                let py = y as i32 + bounds.min.y as i32;
                if px < 0 || py < 0 || px >= width || py >= height {
                    return;
                }
                let alpha = (coverage * color[3] as f32 / 255.0).clamp(0.0, 1.0);
                let src = PremultipliedColorU8::from_rgba(
                    (color[0] as f32 * alpha) as u8,
                    (color[1] as f32 * alpha) as u8,
                    (color[2] as f32 * alpha) as u8,
                    (alpha * 255.0) as u8,
                );
                if let Some(src) = src {
                    // Porter-Duff over in premultiplied space.
                    let i = py as usize * stride + px as usize;
                    let bg = dst[i];
                    let inv = 1.0 - (src.alpha() as f32 / 255.0);
                    dst[i] = PremultipliedColorU8::from_rgba(
                        src.red().saturating_add((bg.red() as f32 * inv) as u8),
                        src.green().saturating_add((bg.green() as f32 * inv) as u8),
                        src.blue().saturating_add((bg.blue() as f32 * inv) as u8),
                        src.alpha().saturating_add((bg.alpha() as f32 * inv) as u8),
                    )
                    .unwrap_or(bg);
                }
            });
        }
    }

    pm
}

/// Rendered-line cache. Uncapped frame rates redraw the same strings
/// every iteration, so lines are rasterized once per (text, size, color).
pub struct TextCache {
    font: FontArc,
    map: HashMap<(Atom, u32, Color), Arc<Pixmap>>,
}

impl TextCache {
    pub fn new(font: FontArc) -> Self {
        Self {
            font,
            map: HashMap::new(),
        }
    }

    pub fn font(&self) -> &FontArc {
        &self.font
    }

    pub fn get_or_render(&mut self, text: &str, size: f32, color: Color) -> Arc<Pixmap> {
        let key = (Atom::from(text), size.to_bits(), color);
        if let Some(pm) = self.map.get(&key) {
            return Arc::clone(pm);
        }
        let pm = Arc::new(rasterize_line(&self.font, text, size, color));
        self.map.insert(key, Arc::clone(&pm));
        pm
    }
}
