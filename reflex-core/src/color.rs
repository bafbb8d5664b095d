/// RGBA, straight alpha.
pub type Color = [u8; 4];

pub const BLACK: Color = [0, 0, 0, 255];
pub const WHITE: Color = [255, 255, 255, 255];
pub const RED: Color = [255, 0, 0, 255];
pub const GREEN: Color = [0, 255, 0, 255];
pub const BLUE: Color = [0, 0, 255, 255];
pub const YELLOW: Color = [255, 255, 0, 255];
pub const CYAN: Color = [0, 255, 255, 255];

/// Looks up a color by its conventional name, case-insensitive.
pub fn named(name: &str) -> Option<Color> {
    match name.to_ascii_lowercase().as_str() {
        "black" => Some(BLACK),
        "white" => Some(WHITE),
        "red" => Some(RED),
        "green" => Some(GREEN),
        "blue" => Some(BLUE),
        "yellow" => Some(YELLOW),
        "cyan" => Some(CYAN),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_is_case_insensitive() {
        assert_eq!(named("Red"), Some(RED));
        assert_eq!(named("YELLOW"), Some(YELLOW));
        assert_eq!(named("mauve"), None);
    }
}
