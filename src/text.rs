// Text -> mask rasterization.
// The renderer only needs "a gray mask of this text, this tall", so it talks to a trait.
// The built-in rasterizer draws embedded-graphics monospace bitmap fonts.

use std::convert::Infallible;

use embedded_graphics::{
    Drawable, Pixel,
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Point, Size},
    mono_font::{MonoFont, MonoTextStyle, ascii},
    pixelcolor::BinaryColor,
    text::{Baseline, Text},
};
use image::{Luma, imageops};

use crate::error::Error;
use crate::types::Mask;

pub trait TextRasterizer {
    /// Return a mask exactly `height` rows tall and as wide as the rendered text.
    fn rasterize(&self, text: &str, height: u32) -> Result<Mask, Error>;
}

pub struct MonoRasterizer {
    font: &'static MonoFont<'static>,
    scale: u32,    // integer magnification (font size x virtual scale)
    baseline: i32, // vertical offset of the glyph tops, in scaled pixels
}

impl MonoRasterizer {
    pub fn new(font_name: &str, scale: u32, baseline: i32) -> Result<Self, Error> {
        let font = font_by_name(font_name).ok_or_else(|| {
            Error::Config(format!(
                "unknown font '{font_name}', expected one of {}",
                FONT_NAMES.join(", ")
            ))
        })?;
        if scale == 0 {
            return Err(Error::Config("font scale must be at least 1".into()));
        }
        Ok(Self { font, scale, baseline })
    }
}

impl TextRasterizer for MonoRasterizer {
    fn rasterize(&self, text: &str, height: u32) -> Result<Mask, Error> {
        let style = MonoTextStyle::new(self.font, BinaryColor::On);
        let glyph_height = self.font.character_size.height;
        let advance = self.font.character_size.width + self.font.character_spacing;
        let width = advance * text.chars().count() as u32;

        // Draw at native size, then blow up with nearest-neighbour so pixels stay crisp.
        let mut native = MaskTarget { mask: Mask::new(width.max(1), glyph_height) };
        let Ok(_) = Text::with_baseline(text, Point::zero(), style, Baseline::Top).draw(&mut native);
        let scaled = imageops::resize(
            &native.mask,
            width.max(1) * self.scale,
            glyph_height * self.scale,
            imageops::FilterType::Nearest,
        );

        let mut out = Mask::new(width * self.scale, height);
        imageops::replace(&mut out, &scaled, 0, i64::from(self.baseline));
        Ok(out)
    }
}

/// Lets embedded-graphics draw straight into an `image` gray buffer.
struct MaskTarget {
    mask: Mask,
}

impl OriginDimensions for MaskTarget {
    fn size(&self) -> Size {
        Size::new(self.mask.width(), self.mask.height())
    }
}

impl DrawTarget for MaskTarget {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(pos, color) in pixels {
            if pos.x < 0 || pos.y < 0 {
                continue;
            }
            let (x, y) = (pos.x as u32, pos.y as u32);
            if x >= self.mask.width() || y >= self.mask.height() {
                continue;
            }
            let value = if color.is_on() { 255 } else { 0 };
            self.mask.put_pixel(x, y, Luma([value]));
        }
        Ok(())
    }
}

const FONT_NAMES: [&str; 13] = [
    "4x6", "5x7", "5x8", "6x9", "6x10", "6x12", "6x13", "7x13", "7x14", "8x13", "9x15", "9x18",
    "10x20",
];

fn font_by_name(name: &str) -> Option<&'static MonoFont<'static>> {
    let font = match name.to_ascii_lowercase().as_str() {
        "4x6" => &ascii::FONT_4X6,
        "5x7" => &ascii::FONT_5X7,
        "5x8" => &ascii::FONT_5X8,
        "6x9" => &ascii::FONT_6X9,
        "6x10" => &ascii::FONT_6X10,
        "6x12" => &ascii::FONT_6X12,
        "6x13" => &ascii::FONT_6X13,
        "7x13" => &ascii::FONT_7X13,
        "7x14" => &ascii::FONT_7X14,
        "8x13" => &ascii::FONT_8X13,
        "9x15" => &ascii::FONT_9X15,
        "9x18" => &ascii::FONT_9X18,
        "10x20" => &ascii::FONT_10X20,
        _ => return None,
    };
    Some(font)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_is_as_tall_as_requested_and_as_wide_as_text() {
        let rasterizer = MonoRasterizer::new("6x10", 1, 0).unwrap();
        let mask = rasterizer.rasterize("AB", 12).unwrap();
        assert_eq!(mask.dimensions(), (12, 12));
        assert!(mask.pixels().any(|p| p[0] > 0), "no glyph pixels drawn");
    }

    #[test]
    fn scale_multiplies_width() {
        let rasterizer = MonoRasterizer::new("5x8", 3, 0).unwrap();
        let mask = rasterizer.rasterize("Hi", 24).unwrap();
        assert_eq!(mask.width(), 2 * 5 * 3);
    }

    #[test]
    fn baseline_offset_can_push_glyphs_off_the_mask() {
        let rasterizer = MonoRasterizer::new("6x10", 1, 20).unwrap();
        let mask = rasterizer.rasterize("X", 10).unwrap();
        assert!(mask.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn unknown_font_is_a_configuration_error() {
        assert!(matches!(MonoRasterizer::new("ADDLG___.TTF", 1, 0), Err(Error::Config(_))));
    }
}
