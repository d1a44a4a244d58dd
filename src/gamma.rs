// LPD8806 gamma correction and wire packing.
// The chip takes 7-bit channel values; the high bit marks a data byte so it can't be
// confused with the zero latch byte that ends a frame.

/// High bit set on every data byte.
pub const MARKER: u8 = 0x80;
/// Largest 7-bit payload the chip understands.
pub const MAX_PAYLOAD: u8 = 0x7F;
/// Perceptual exponent for the LED response curve.
pub const GAMMA: f64 = 2.5;

pub struct GammaTable {
    // 8-bit channel value -> marker | 7-bit gamma-corrected payload
    table: [u8; 256],
}

impl GammaTable {
    /// Build the table once at startup.
    pub fn new() -> Self {
        let mut table = [0u8; 256];
        for (v, slot) in table.iter_mut().enumerate() {
            let c = v as f64 / 255.0;
            let payload = (c.powf(GAMMA) * f64::from(MAX_PAYLOAD) + 0.5) as u8;
            *slot = MARKER | payload;
        }
        Self { table }
    }

    #[inline]
    pub fn lookup(&self, v: u8) -> u8 {
        self.table[v as usize]
    }

    /// Turn raw RGB triples (already in physical LED order) into wire bytes.
    /// The strip is wired GREEN, RED, BLUE, so each triple is reordered here.
    pub fn pack(&self, raw_rgb: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(raw_rgb.len());
        for rgb in raw_rgb.chunks_exact(3) {
            out.push(self.lookup(rgb[1]));
            out.push(self.lookup(rgb[0]));
            out.push(self.lookup(rgb[2]));
        }
        out
    }
}

impl Default for GammaTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Scale one packed byte's payload, clamping at the chip maximum. The marker bit is kept.
#[inline]
pub fn scale_payload(byte: u8, factor: f64) -> u8 {
    let scaled = (f64::from(byte & MAX_PAYLOAD) * factor) as u32;
    MARKER | scaled.min(u32::from(MAX_PAYLOAD)) as u8
}

/// Dim or brighten a packed frame in place.
pub fn scale_brightness(frame: &mut [u8], factor: f64) {
    for byte in frame.iter_mut() {
        *byte = scale_payload(*byte, factor);
    }
}
