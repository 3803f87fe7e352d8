#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::opaque(0, 0, 0);
    pub const WHITE: Rgba = Rgba::opaque(255, 255, 255);

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Components scaled to `0.0..=1.0` for cairo.
    pub fn to_f64(self) -> (f64, f64, f64, f64) {
        (
            self.r as f64 / 255.0,
            self.g as f64 / 255.0,
            self.b as f64 / 255.0,
            self.a as f64 / 255.0,
        )
    }
}

const NAMED: &[(&str, Rgba)] = &[
    ("black", Rgba::opaque(0, 0, 0)),
    ("white", Rgba::opaque(255, 255, 255)),
    ("red", Rgba::opaque(255, 0, 0)),
    ("green", Rgba::opaque(0, 128, 0)),
    ("lime", Rgba::opaque(0, 255, 0)),
    ("blue", Rgba::opaque(0, 0, 255)),
    ("yellow", Rgba::opaque(255, 255, 0)),
    ("cyan", Rgba::opaque(0, 255, 255)),
    ("magenta", Rgba::opaque(255, 0, 255)),
    ("gray", Rgba::opaque(128, 128, 128)),
    ("grey", Rgba::opaque(128, 128, 128)),
    ("silver", Rgba::opaque(192, 192, 192)),
    ("maroon", Rgba::opaque(128, 0, 0)),
    ("navy", Rgba::opaque(0, 0, 128)),
    ("purple", Rgba::opaque(128, 0, 128)),
    ("teal", Rgba::opaque(0, 128, 128)),
    ("olive", Rgba::opaque(128, 128, 0)),
    ("orange", Rgba::opaque(255, 165, 0)),
];

/// Parse `#RGB`, `#RRGGBB`, `#RRGGBBAA` (the `#` is optional) or a basic
/// colour name.
pub fn parse_colour(value: &str) -> Option<Rgba> {
    let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
    if let Some((_, colour)) = NAMED.iter().find(|(name, _)| name.eq_ignore_ascii_case(value)) {
        return Some(*colour);
    }

    let hex = value.strip_prefix('#').unwrap_or(value);
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

    match hex.len() {
        3 => {
            // #abc is shorthand for #aabbcc
            let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|n| n * 17);
            Some(Rgba::opaque(nibble(0)?, nibble(1)?, nibble(2)?))
        }
        6 => Some(Rgba::opaque(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Rgba {
            r: byte(0)?,
            g: byte(2)?,
            b: byte(4)?,
            a: byte(6)?,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_forms() {
        assert_eq!(parse_colour("#000000"), Some(Rgba::BLACK));
        assert_eq!(parse_colour("FFFFFF"), Some(Rgba::WHITE));
        assert_eq!(parse_colour("#fff"), Some(Rgba::WHITE));
        assert_eq!(parse_colour("#1a2b3c"), Some(Rgba::opaque(0x1a, 0x2b, 0x3c)));
        assert_eq!(
            parse_colour("#10203080"),
            Some(Rgba { r: 0x10, g: 0x20, b: 0x30, a: 0x80 })
        );
    }

    #[test]
    fn test_names_and_quotes() {
        assert_eq!(parse_colour("Black"), Some(Rgba::BLACK));
        assert_eq!(parse_colour("\"white\""), Some(Rgba::WHITE));
        assert_eq!(parse_colour("orange"), Some(Rgba::opaque(255, 165, 0)));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_colour(""), None);
        assert_eq!(parse_colour("#12345"), None);
        assert_eq!(parse_colour("#gggggg"), None);
        assert_eq!(parse_colour("chartreuse-ish"), None);
    }

    #[test]
    fn test_to_f64() {
        let (r, g, b, a) = Rgba::WHITE.to_f64();
        assert_eq!((r, g, b, a), (1.0, 1.0, 1.0, 1.0));
    }
}
