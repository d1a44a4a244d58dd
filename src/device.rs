// The SPI side of things: setting the port speed and pushing bytes at the strip.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::Error;
use crate::player::FrameSink;

/// Zero byte that latches a frame into the LPD8806 chain.
pub const LATCH: u8 = 0x00;
/// Extra "off" bytes sent on top of a frame when blanking.
pub const BLANK_PAD: usize = 9;

/// Run the external speed tool (`spiset -D <device> -s <bps>`). Output is discarded.
pub fn configure_bus_speed(tool: &Path, device: &Path, bits_per_second: u32) -> Result<(), Error> {
    log::debug!("Setting {} to {} bps", device.display(), bits_per_second);
    let status = Command::new(tool)
        .arg("-D")
        .arg(device)
        .arg("-s")
        .arg(bits_per_second.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|e| Error::DeviceSetup(format!("could not run {}: {e}", tool.display())))?;

    if !status.success() {
        return Err(Error::DeviceSetup(format!(
            "could not set spi port {} to speed {} ({status})",
            device.display(),
            bits_per_second
        )));
    }
    Ok(())
}

/// Any byte sink standing in for the SPI device (a file in /dev, or a Vec in tests).
pub struct SpiBus<W: Write> {
    path: PathBuf, // for error messages
    writer: W,
}

impl SpiBus<std::fs::File> {
    pub fn open(path: &Path) -> Result<Self, Error> {
        let file = OpenOptions::new().write(true).open(path).map_err(|e| Error::io(path, e))?;
        Ok(Self::new(path, file))
    }
}

impl<W: Write> SpiBus<W> {
    pub fn new(path: &Path, writer: W) -> Self {
        Self { path: path.to_path_buf(), writer }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_flushed(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let path = &self.path;
        let io = |e| Error::io(path, e);
        self.writer.write_all(bytes).map_err(io)?;
        self.writer.write_all(&[LATCH]).map_err(io)?;
        // flush so the frame delay starts after the bytes are really out
        self.writer.flush().map_err(io)
    }
}

impl<W: Write> FrameSink for SpiBus<W> {
    fn send_frame(&mut self, frame: &[u8]) -> Result<(), Error> {
        self.write_flushed(frame)
    }

    fn blank(&mut self, frame_len: usize) -> Result<(), Error> {
        // All LEDs off: marker bit with zero payload.
        self.write_flushed(&vec![crate::gamma::MARKER; frame_len + BLANK_PAD])
    }
}
