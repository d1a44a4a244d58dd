// Preview window: shows what the LED panel would show, no hardware needed.
// Frames arrive already packed for the strip (GRB order, 7-bit gamma payloads), so each
// one is decoded back to screen colors and put at the LEDs' logical positions.

use minifb::{Key, Scale, Window, WindowOptions};

use crate::error::Error;
use crate::gamma::{GAMMA, MAX_PAYLOAD};
use crate::player::{CancelToken, FrameSink};
use crate::topology::Topology;

pub struct PreviewWindow {
    window: Window,
    topology: Topology,
    cancel: CancelToken, // raised when the window closes or ESC is pressed
    screen: Vec<u32>,    // 0x00RRGGBB per LED
    to_screen: [u8; 128],
}

impl PreviewWindow {
    pub fn new(topology: Topology, cancel: CancelToken) -> Result<Self, Error> {
        let (width, height) = (topology.width(), topology.height());
        let options = WindowOptions { scale: Scale::X16, ..WindowOptions::default() };
        let window = Window::new("ledz preview", width, height, options)
            .map_err(|e| Error::Window(e.to_string()))?;
        Ok(Self {
            window,
            screen: vec![0u32; width * height],
            topology,
            cancel,
            to_screen: payload_to_screen_table(),
        })
    }

    fn present(&mut self) -> Result<(), Error> {
        if !self.window.is_open() || self.window.is_key_down(Key::Escape) {
            self.cancel.cancel();
            return Ok(());
        }
        self.window
            .update_with_buffer(&self.screen, self.topology.width(), self.topology.height())
            .map_err(|e| Error::Window(e.to_string()))
    }
}

impl FrameSink for PreviewWindow {
    fn send_frame(&mut self, frame: &[u8]) -> Result<(), Error> {
        let width = self.topology.width();
        for (i, grb) in frame.chunks_exact(3).enumerate() {
            let (x, y) = self.topology.logical_position(i * 3);
            let g = u32::from(self.to_screen[usize::from(grb[0] & MAX_PAYLOAD)]);
            let r = u32::from(self.to_screen[usize::from(grb[1] & MAX_PAYLOAD)]);
            let b = u32::from(self.to_screen[usize::from(grb[2] & MAX_PAYLOAD)]);
            self.screen[y * width + x] = (r << 16) | (g << 8) | b;
        }
        self.present()
    }

    fn blank(&mut self, _frame_len: usize) -> Result<(), Error> {
        self.screen.fill(0);
        // The window may already be gone (that is how previews usually end).
        if self.window.is_open() {
            self.window
                .update_with_buffer(&self.screen, self.topology.width(), self.topology.height())
                .map_err(|e| Error::Window(e.to_string()))?;
        }
        Ok(())
    }
}

/// Undo the LED gamma so the window looks roughly like the panel does to the eye.
fn payload_to_screen_table() -> [u8; 128] {
    let mut table = [0u8; 128];
    for (payload, slot) in table.iter_mut().enumerate() {
        let level = payload as f64 / f64::from(MAX_PAYLOAD);
        *slot = (level.powf(1.0 / GAMMA) * 255.0).round() as u8;
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamma::GammaTable;

    #[test]
    fn screen_table_spans_full_range() {
        let table = payload_to_screen_table();
        assert_eq!(table[0], 0);
        assert_eq!(table[127], 255);
        assert!(table.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn screen_table_roughly_inverts_gamma() {
        let gamma = GammaTable::new();
        let table = payload_to_screen_table();
        for v in [64u8, 128, 200] {
            let back = table[usize::from(gamma.lookup(v) & MAX_PAYLOAD)];
            assert!((i16::from(back) - i16::from(v)).abs() <= 12, "{v} came back as {back}");
        }
    }
}
