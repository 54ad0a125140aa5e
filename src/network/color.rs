use eframe::egui::Color32;
use tracing::warn;

pub const FALLBACK_COLOR: Color32 = Color32::WHITE;
const DARK_LABEL: Color32 = Color32::from_rgb(0x34, 0x34, 0x34);
const LIGHT_LABEL: Color32 = Color32::from_rgb(0xed, 0xed, 0xed);

/// Parses `#rgb`, `#rgba`, `#rrggbb` and `#rrggbbaa` (the `#` is optional).
/// Five and seven digit inputs are right-padded with zeros.
pub fn parse_hex(raw: &str) -> Option<Color32> {
    let digits = raw.trim().trim_start_matches('#');
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let nibble = |index: usize| u8::from_str_radix(&digits[index..=index], 16).ok();
    let byte = |index: usize| u8::from_str_radix(&digits[index..index + 2], 16).ok();

    match digits.len() {
        3 => Some(Color32::from_rgb(
            nibble(0)? * 17,
            nibble(1)? * 17,
            nibble(2)? * 17,
        )),
        4 => Some(Color32::from_rgba_unmultiplied(
            nibble(0)? * 17,
            nibble(1)? * 17,
            nibble(2)? * 17,
            nibble(3)? * 17,
        )),
        5 | 7 => parse_hex(&format!("{digits:0<width$}", width = digits.len() + 1)),
        6 => Some(Color32::from_rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Color32::from_rgba_unmultiplied(
            byte(0)?,
            byte(2)?,
            byte(4)?,
            byte(6)?,
        )),
        _ => None,
    }
}

pub fn color_or_fallback(raw: &str) -> Color32 {
    parse_hex(raw).unwrap_or_else(|| {
        warn!(color = raw, "invalid hex color, using fallback");
        FALLBACK_COLOR
    })
}

/// Relative luminance on a 0..=100 scale.
pub fn luminance(color: Color32) -> f32 {
    fn channel(value: u8) -> f32 {
        let srgb = value as f32 / 255.0;
        let linear = if srgb <= 0.039_28 {
            srgb / 12.92
        } else {
            ((srgb + 0.055) / 1.055).powf(2.4)
        };
        linear * 100.0
    }

    0.2126 * channel(color.r()) + 0.7152 * channel(color.g()) + 0.0722 * channel(color.b())
}

pub fn label_color_for(fill: Color32) -> Color32 {
    if luminance(fill) > 50.0 {
        DARK_LABEL
    } else {
        LIGHT_LABEL
    }
}

/// Gray multiply tint for a brightness offset in `0..=1`.
pub fn gray_tint(brightness: f32) -> Color32 {
    let level = (brightness.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_gray(level)
}

pub fn multiply(color: Color32, tint: Color32) -> Color32 {
    let channel = |a: u8, b: u8| ((a as u16 * b as u16) / 255) as u8;
    Color32::from_rgba_unmultiplied(
        channel(color.r(), tint.r()),
        channel(color.g(), tint.g()),
        channel(color.b(), tint.b()),
        color.a(),
    )
}

pub fn with_alpha(color: Color32, alpha: f32) -> Color32 {
    color.gamma_multiply(alpha.clamp(0.0, 1.0))
}
