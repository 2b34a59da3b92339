//! Palettes - five HSL colors spread around a base hue

use image::Rgba;

pub const PALETTE_LEN: usize = 5;

/// Hue offsets from the base hue, in palette order
const HUE_OFFSETS: [f64; PALETTE_LEN] = [0.0, 120.0, 240.0, 30.0, -30.0];

const SATURATION: f64 = 0.8;
const LIGHTNESS: f64 = 0.6;

/// Color for points that never escape (#0a0a1a)
pub const INSIDE_COLOR: Rgba<u8> = Rgba([0x0a, 0x0a, 0x1a, 0xff]);

/// Color in HSL space. Saturation and lightness are fractions in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub hue: f64,
    pub saturation: f64,
    pub lightness: f64,
}

impl Hsl {
    pub fn new(hue: f64, saturation: f64, lightness: f64) -> Self {
        Self {
            hue: hue.rem_euclid(360.0),
            saturation: saturation.clamp(0.0, 1.0),
            lightness: lightness.clamp(0.0, 1.0),
        }
    }

    pub fn to_rgba(&self) -> Rgba<u8> {
        let chroma = (1.0 - (2.0 * self.lightness - 1.0).abs()) * self.saturation;
        let sector = self.hue.rem_euclid(360.0) / 60.0;
        let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
        let (r, g, b) = match sector as u32 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };
        let m = self.lightness - chroma / 2.0;
        let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Rgba([channel(r), channel(g), channel(b), 255])
    }
}

pub type Palette = [Hsl; PALETTE_LEN];

/// Five colors at base, +120, +240, +30 and -30 degrees
pub fn palette(base_hue: f64) -> Palette {
    HUE_OFFSETS.map(|offset| Hsl::new(base_hue + offset, SATURATION, LIGHTNESS))
}

/// Palette entry for an arbitrary index, cycling past the end
pub fn pick(palette: &Palette, index: usize) -> Rgba<u8> {
    palette[index % PALETTE_LEN].to_rgba()
}

/// Escape-time coloring: dark for non-escaping points, otherwise a hue
/// proportional to how long the orbit stayed bounded
pub fn escape_color(count: u32, max_iter: u32) -> Rgba<u8> {
    if count >= max_iter {
        return INSIDE_COLOR;
    }
    let hue = count as f64 / max_iter as f64 * 360.0;
    Hsl::new(hue, 1.0, 0.5).to_rgba()
}
