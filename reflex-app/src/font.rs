use ab_glyph::FontArc;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const FALLBACK_FONTS: [&str; 5] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/Library/Fonts/Arial Unicode.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Loads the configured font, or the first usable system fallback.
pub fn load_font(configured: Option<&Path>) -> Result<FontArc> {
    let candidates: Vec<PathBuf> = configured
        .map(Path::to_path_buf)
        .into_iter()
        .chain(FALLBACK_FONTS.iter().map(PathBuf::from))
        .collect();
    for path in &candidates {
        if path.is_file() {
            let bytes =
                fs::read(path).with_context(|| format!("unable to read {}", path.display()))?;
            let font = FontArc::try_from_vec(bytes)
                .with_context(|| format!("{} is not a usable font", path.display()))?;
            info!("using font {}", path.display());
            return Ok(font);
        }
    }
    bail!("no usable font found; set \"font\" in the settings file");
}
