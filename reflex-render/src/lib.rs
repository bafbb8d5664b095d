pub mod canvas;
pub mod skia;
pub mod text;

pub use canvas::{Canvas, ImageId, NullCanvas};
pub use skia::SkiaCanvas;
