// Core types shared by the render pipeline and the player.

use image::{GrayImage, RgbImage};
use serde::Deserialize;

use crate::error::Error;

/// The wide RGB raster the scroll window slides across.
pub type Canvas = RgbImage;

/// Single-channel text mask; nonzero where glyphs are drawn.
pub type Mask = GrayImage;

/// One packed frame: `width * height * 3` bytes in physical LED order.
pub type Frame = Vec<u8>;

/// Where the first LED of the strip sits on the panel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirstLed {
    #[default]
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl FirstLed {
    /// Bottom corners scan rows from the bottom up.
    pub fn upside_down(self) -> bool {
        matches!(self, FirstLed::BottomLeft | FirstLed::BottomRight)
    }

    /// Row index of the first row that runs backwards in a serpentine strip.
    pub fn first_flipped_row(self) -> usize {
        match self {
            FirstLed::TopLeft | FirstLed::BottomLeft => 1,
            FirstLed::TopRight | FirstLed::BottomRight => 0,
        }
    }
}

/// Physical panel description, fixed for one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayGeometry {
    pub width: usize,                      // LEDs per row
    pub height: usize,                     // number of rows
    pub first_led: FirstLed,               // scan-start corner
    pub flipped_rows: Option<Vec<usize>>,  // None = serpentine default
}

impl DisplayGeometry {
    pub fn new(
        width: usize,
        height: usize,
        first_led: FirstLed,
        flipped_rows: Option<Vec<usize>>,
    ) -> Result<Self, Error> {
        if width == 0 || height == 0 {
            return Err(Error::Config(format!(
                "display must be at least 1x1 LEDs, got {width}x{height}"
            )));
        }
        if let Some(rows) = &flipped_rows {
            if let Some(bad) = rows.iter().find(|&&row| row >= height) {
                return Err(Error::Config(format!(
                    "flipped row {bad} is outside a display of {height} rows"
                )));
            }
        }
        Ok(Self { width, height, first_led, flipped_rows })
    }

    /// Bytes per frame on the wire (without the trailing latch byte).
    pub fn frame_len(&self) -> usize {
        self.width * self.height * 3
    }
}
