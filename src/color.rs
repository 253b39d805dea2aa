//! Color helpers shared by the markup parser and the mesh assembler.

use palette::{LinSrgba, Srgba};

/// 8-bit sRGB color with alpha, as written into vertex buffers.
pub type Color32 = Srgba<u8>;

pub const WHITE: Color32 = Srgba::new(255, 255, 255, 255);
pub const BLACK: Color32 = Srgba::new(0, 0, 0, 255);
pub const CLEAR: Color32 = Srgba::new(0, 0, 0, 0);
/// Default `<mark>` color: yellow at 50% opacity.
pub const HIGHLIGHT: Color32 = Srgba::new(255, 255, 0, 128);

/// Color space the vertex colors are written in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorSpace {
    #[default]
    Gamma,
    Linear,
}

/// Parses `#RGB`, `#RGBA`, `#RRGGBB` and `#RRGGBBAA`.
pub fn parse_hex(value: &str) -> Option<Color32> {
    let hex = value.strip_prefix('#')?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

    match hex.len() {
        3 => Some(Srgba::new(nibble(0)?, nibble(1)?, nibble(2)?, 255)),
        4 => Some(Srgba::new(nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?)),
        6 => Some(Srgba::new(byte(0)?, byte(2)?, byte(4)?, 255)),
        8 => Some(Srgba::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

/// Parses a two digit `#AA` alpha value.
pub fn parse_alpha(value: &str) -> Option<u8> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 2 {
        return None;
    }
    u8::from_str_radix(hex, 16).ok()
}

/// Colors that may be written by name in `<color=name>`.
pub fn named(name: &str) -> Option<Color32> {
    let color = match name.to_ascii_lowercase().as_str() {
        "red" => Srgba::new(255, 0, 0, 255),
        "lightblue" => Srgba::new(173, 216, 230, 255),
        "blue" => Srgba::new(0, 0, 255, 255),
        "grey" | "gray" => Srgba::new(128, 128, 128, 255),
        "black" => BLACK,
        "green" => Srgba::new(0, 255, 0, 255),
        "white" => WHITE,
        "orange" => Srgba::new(255, 128, 0, 255),
        "purple" => Srgba::new(160, 32, 240, 255),
        "yellow" => Srgba::new(255, 255, 0, 255),
        _ => return None,
    };
    Some(color)
}

/// Component-wise product, used to tint glyph colors with gradients.
pub fn multiply(a: Color32, b: Color32) -> Color32 {
    let mul = |x: u8, y: u8| ((x as u16 * y as u16 + 127) / 255) as u8;
    Srgba::new(
        mul(a.red, b.red),
        mul(a.green, b.green),
        mul(a.blue, b.blue),
        mul(a.alpha, b.alpha),
    )
}

pub fn with_alpha(color: Color32, alpha: u8) -> Color32 {
    Srgba::new(color.red, color.green, color.blue, alpha)
}

/// Converts the color channels to linear light, keeping alpha as is.
pub fn to_linear(color: Color32) -> Color32 {
    let linear: LinSrgba<f32> = color.into_format::<f32, f32>().into_linear();
    let linear = linear.into_format::<u8, u8>();
    Srgba::new(linear.red, linear.green, linear.blue, color.alpha)
}

/// Linear interpolation between two colors, `t` in `[0, 1]`.
pub fn lerp(a: Color32, b: Color32, t: f32) -> Color32 {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    Srgba::new(
        mix(a.red, b.red),
        mix(a.green, b.green),
        mix(a.blue, b.blue),
        mix(a.alpha, b.alpha),
    )
}
