use anyhow::{bail, Result};
use reflex_core::Color;
use std::path::Path;

/// Handle to an image decoded by a canvas. Only meaningful to the canvas
/// that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageId(pub(crate) usize);

/// Render target for stimulus units.
///
/// Drawing happens on an offscreen surface; `present` pushes the frame to
/// whatever display backs the canvas. Text is measured through the canvas
/// so layout stays consistent with the font the canvas rasterizes with.
pub trait Canvas {
    fn size(&self) -> (u32, u32);
    fn clear(&mut self, color: Color);

    fn measure_text(&self, text: &str, size: f32) -> (u32, u32);
    fn draw_text(&mut self, text: &str, top_left: (i32, i32), size: f32, color: Color);

    fn load_image(&mut self, path: &Path) -> Result<ImageId>;
    fn image_size(&self, image: ImageId) -> (u32, u32);
    fn scale_image(&mut self, image: ImageId, width: u32, height: u32) -> Result<ImageId>;
    fn draw_image(&mut self, image: ImageId, top_left: (i32, i32));

    fn fill_circle(&mut self, center: (i32, i32), radius: u32, color: Color);

    fn present(&mut self);
}

/// Headless canvas that records draw activity instead of rasterizing.
#[derive(Debug)]
pub struct NullCanvas {
    size: (u32, u32),
    image_size: (u32, u32),
    images: usize,
    pub fail_scaling: bool,
    pub clears: usize,
    pub presents: usize,
    pub draws: usize,
    pub text_draws: Vec<(String, (i32, i32))>,
    pub circle_draws: Vec<(i32, i32)>,
}

impl NullCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            image_size: (64, 64),
            images: 0,
            fail_scaling: false,
            clears: 0,
            presents: 0,
            draws: 0,
            text_draws: Vec::new(),
            circle_draws: Vec::new(),
        }
    }

    pub fn with_image_size(mut self, width: u32, height: u32) -> Self {
        self.image_size = (width, height);
        self
    }
}

impl Canvas for NullCanvas {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn clear(&mut self, _color: Color) {
        self.clears += 1;
    }

    fn measure_text(&self, text: &str, size: f32) -> (u32, u32) {
        // Fixed-advance fake metrics keep layout assertions exact.
        let w = text.chars().count() as u32 * (size / 2.0).ceil() as u32;
        (w, size.ceil() as u32)
    }

    fn draw_text(&mut self, text: &str, top_left: (i32, i32), _size: f32, _color: Color) {
        self.draws += 1;
        self.text_draws.push((text.to_string(), top_left));
    }

    fn load_image(&mut self, _path: &Path) -> Result<ImageId> {
        let id = ImageId(self.images);
        self.images += 1;
        Ok(id)
    }

    fn image_size(&self, _image: ImageId) -> (u32, u32) {
        self.image_size
    }

    fn scale_image(&mut self, _image: ImageId, width: u32, height: u32) -> Result<ImageId> {
        if self.fail_scaling {
            bail!("scaling disabled");
        }
        self.image_size = (width, height);
        let id = ImageId(self.images);
        self.images += 1;
        Ok(id)
    }

    fn draw_image(&mut self, _image: ImageId, _top_left: (i32, i32)) {
        self.draws += 1;
    }

    fn fill_circle(&mut self, center: (i32, i32), _radius: u32, _color: Color) {
        self.draws += 1;
        self.circle_draws.push(center);
    }

    fn present(&mut self) {
        self.presents += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_canvas_counts_activity() {
        let mut canvas = NullCanvas::new(640, 480);
        canvas.clear([0, 0, 0, 255]);
        canvas.fill_circle((320, 240), 25, [255, 0, 0, 255]);
        canvas.present();
        assert_eq!((canvas.clears, canvas.draws, canvas.presents), (1, 1, 1));
    }

    #[test]
    fn null_canvas_scaling_can_fail() {
        let mut canvas = NullCanvas::new(640, 480);
        canvas.fail_scaling = true;
        let id = canvas.load_image(Path::new("whatever.png")).unwrap();
        assert!(canvas.scale_image(id, 640, 480).is_err());
    }
}
