// Logical (x, y) to physical LED order.
//
// LED panels are usually one long strip folded into rows. With serpentine (zig-zag)
// wiring every other row runs backwards, and depending on which corner the strip
// starts in the rows may also be scanned bottom-up.
//
// 4x3, first LED top-left:     first LED bottom-left:
//   LED0  LED1  LED2  LED3       LED8  LED9  LED10 LED11
//   LED7  LED6  LED5  LED4       LED7  LED6  LED5  LED4
//   LED8  LED9  LED10 LED11      LED0  LED1  LED2  LED3

use image::RgbImage;

use crate::types::DisplayGeometry;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct RowMap {
    source_row: usize, // which image row feeds this physical row
    flipped: bool,     // physical row runs right-to-left
}

/// Index function for one display, computed once.
#[derive(Clone, Debug)]
pub struct Topology {
    width: usize,
    height: usize,
    rows: Vec<RowMap>,
}

impl Topology {
    pub fn new(geometry: &DisplayGeometry) -> Self {
        let (width, height) = (geometry.width, geometry.height);
        let upside_down = geometry.first_led.upside_down();
        let first_flipped = geometry.first_led.first_flipped_row();

        let rows = (0..height)
            .map(|y| {
                let flipped = match &geometry.flipped_rows {
                    Some(explicit) => explicit.contains(&y),
                    None => y % 2 == first_flipped,
                };
                let source_row = if upside_down { height - 1 - y } else { y };
                RowMap { source_row, flipped }
            })
            .collect();

        Self { width, height, rows }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Image row that feeds physical row `y`.
    pub fn source_row(&self, y: usize) -> usize {
        self.rows[y].source_row
    }

    #[cfg(test)]
    pub fn is_flipped(&self, y: usize) -> bool {
        self.rows[y].flipped
    }

    /// Byte offset in the frame buffer for display column `x` of physical row `y`.
    pub fn physical_offset(&self, x: usize, y: usize) -> usize {
        let x2 = if self.rows[y].flipped { self.width - 1 - x } else { x };
        (y * self.width + x2) * 3
    }

    /// Inverse of the mapping: image `(x, y)` shown by the LED at byte `offset`.
    pub fn logical_position(&self, offset: usize) -> (usize, usize) {
        let led = offset / 3;
        let (row, col) = (led / self.width, led % self.width);
        let x = if self.rows[row].flipped { self.width - 1 - col } else { col };
        (x, self.rows[row].source_row)
    }

    /// Reorder a display-sized image into raw RGB triples in strip order.
    pub fn remap(&self, img: &RgbImage) -> Vec<u8> {
        debug_assert_eq!(img.dimensions(), (self.width as u32, self.height as u32));
        let mut out = vec![0u8; self.width * self.height * 3];
        for y in 0..self.height {
            let source_row = self.source_row(y) as u32;
            for x in 0..self.width {
                let offset = self.physical_offset(x, y);
                out[offset..offset + 3].copy_from_slice(&img.get_pixel(x as u32, source_row).0);
            }
        }
        out
    }
}
