// A movie is just the packed frames, in order.
//
// On disk the classic format is the frames concatenated with nothing else; the frame
// size has to come from the display config. Newer files may start with a small header
// that records the geometry:
//
//   "LEDZ" | version u8 | width u16 LE | height u16 LE | frame count u32 LE | frames...
//
// Packed bytes always have the high bit set, so a headerless file can never begin
// with the ASCII magic.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use crate::error::Error;
use crate::gamma;
use crate::types::{DisplayGeometry, Frame};

const MAGIC: &[u8; 4] = b"LEDZ";
const VERSION: u8 = 1;
const HEADER_LEN: usize = 4 + 1 + 2 + 2 + 4;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Movie {
    width: usize,
    height: usize,
    frames: Vec<Frame>,
}

impl Movie {
    pub fn new(geometry: &DisplayGeometry) -> Self {
        Self { width: geometry.width, height: geometry.height, frames: Vec::new() }
    }

    pub fn frame_len(&self) -> usize {
        self.width * self.height * 3
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Append one packed frame. Every frame must match the display size.
    pub fn push(&mut self, frame: Frame) -> Result<(), Error> {
        if frame.len() != self.frame_len() {
            return Err(Error::Config(format!(
                "frame of {} bytes does not fit a {}x{} display",
                frame.len(),
                self.width,
                self.height
            )));
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Scale every payload once, before playback starts.
    pub fn scale_brightness(&mut self, factor: f64) {
        for frame in &mut self.frames {
            gamma::scale_brightness(frame, factor);
        }
    }

    pub fn write_to(&self, path: &Path, with_header: bool) -> Result<(), Error> {
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let mut out = BufWriter::new(file);
        let io = |e| Error::io(path, e);

        if with_header {
            let mut header = Vec::with_capacity(HEADER_LEN);
            header.extend_from_slice(MAGIC);
            header.push(VERSION);
            header.extend_from_slice(&(self.width as u16).to_le_bytes());
            header.extend_from_slice(&(self.height as u16).to_le_bytes());
            header.extend_from_slice(&(self.frames.len() as u32).to_le_bytes());
            out.write_all(&header).map_err(io)?;
        }
        for frame in &self.frames {
            out.write_all(frame).map_err(io)?;
        }
        out.flush().map_err(io)
    }

    /// Load a movie for this display, with or without a header.
    pub fn read_from(path: &Path, geometry: &DisplayGeometry) -> Result<Self, Error> {
        let mut bytes = Vec::new();
        File::open(path)
            .and_then(|mut f| f.read_to_end(&mut bytes))
            .map_err(|e| Error::io(path, e))?;
        Self::decode(&bytes, geometry).map_err(|reason| Error::MovieFormat { path: path.to_path_buf(), reason })
    }

    fn decode(bytes: &[u8], geometry: &DisplayGeometry) -> Result<Self, String> {
        let mut movie = Movie::new(geometry);
        let frame_len = movie.frame_len();

        let (body, expected_frames) = if bytes.starts_with(MAGIC) {
            if bytes.len() < HEADER_LEN {
                return Err("truncated header".into());
            }
            if bytes[4] != VERSION {
                return Err(format!("unsupported version {}", bytes[4]));
            }
            let width = u16::from_le_bytes([bytes[5], bytes[6]]) as usize;
            let height = u16::from_le_bytes([bytes[7], bytes[8]]) as usize;
            let count = u32::from_le_bytes([bytes[9], bytes[10], bytes[11], bytes[12]]) as usize;
            if (width, height) != (geometry.width, geometry.height) {
                return Err(format!(
                    "movie was made for a {width}x{height} display, this one is {}x{}",
                    geometry.width, geometry.height
                ));
            }
            (&bytes[HEADER_LEN..], Some(count))
        } else {
            (bytes, None)
        };

        if body.len() % frame_len != 0 {
            return Err(format!(
                "{} bytes is not a whole number of {frame_len}-byte frames",
                body.len()
            ));
        }
        movie.frames = body.chunks_exact(frame_len).map(<[u8]>::to_vec).collect();

        if let Some(count) = expected_frames {
            if count != movie.frames.len() {
                return Err(format!("header says {count} frames, file holds {}", movie.frames.len()));
            }
        }
        Ok(movie)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FirstLed;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn geometry() -> DisplayGeometry {
        DisplayGeometry::new(2, 2, FirstLed::TopLeft, None).unwrap()
    }

    fn sample_movie() -> Movie {
        let mut movie = Movie::new(&geometry());
        movie.push(vec![0x80; 12]).unwrap();
        movie.push((0..12).map(|i| 0x80 | i).collect()).unwrap();
        movie
    }

    #[test]
    fn push_rejects_wrong_sized_frames() {
        let mut movie = Movie::new(&geometry());
        assert!(matches!(movie.push(vec![0x80; 11]), Err(Error::Config(_))));
    }

    #[rstest]
    #[case(false)]
    #[case(true)]
    fn file_round_trip(#[case] with_header: bool) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movie.ledz");
        let movie = sample_movie();
        movie.write_to(&path, with_header).unwrap();
        assert_eq!(Movie::read_from(&path, &geometry()).unwrap(), movie);
    }

    #[test]
    fn headerless_file_is_plain_concatenation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movie.ledz");
        sample_movie().write_to(&path, false).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 24);
        assert_eq!(&bytes[12..], &(0..12).map(|i| 0x80 | i).collect::<Vec<u8>>()[..]);
    }

    #[test]
    fn header_geometry_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movie.ledz");
        sample_movie().write_to(&path, true).unwrap();
        let other = DisplayGeometry::new(1, 4, FirstLed::TopLeft, None).unwrap();
        assert!(matches!(Movie::read_from(&path, &other), Err(Error::MovieFormat { .. })));
    }

    #[test]
    fn trailing_partial_frame_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movie.ledz");
        std::fs::write(&path, vec![0x80; 13]).unwrap();
        assert!(matches!(Movie::read_from(&path, &geometry()), Err(Error::MovieFormat { .. })));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Movie::read_from(Path::new("/nonexistent/movie"), &geometry()).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/movie"));
    }

    #[test]
    fn brightness_applies_to_every_frame() {
        let mut movie = Movie::new(&geometry());
        movie.push(vec![0xFF; 12]).unwrap();
        movie.scale_brightness(0.5);
        assert!(movie.frames()[0].iter().all(|&b| b == 0x80 | 63));
    }
}
