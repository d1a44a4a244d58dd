// Builds the wide canvas the scroll window slides over:
// [ lead-in | continued canvas | text | lead-out ]
// Foreground shows where the mask is set, background everywhere else.

use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage, imageops};

use crate::error::Error;
use crate::fill::{ColorSpec, fill};
use crate::types::{Canvas, Mask};

/// Column widths and height of the canvas around the text.
pub struct CanvasLayout {
    pub lead_in: u32,
    pub lead_out: u32,
    pub height: u32,
    pub continuation: Option<Canvas>, // earlier run's canvas, pasted right after the lead-in
}

impl CanvasLayout {
    fn continuation_width(&self) -> u32 {
        self.continuation.as_ref().map_or(0, |c| c.width())
    }
}

pub enum Composed {
    Canvas(Canvas),          // ready for the sampler
    Checkpointed(PathBuf),   // saved for a later run; nothing else to do
}

pub struct CanvasComposer {
    pub foreground: ColorSpec,
    pub background: ColorSpec,
    pub compress: f64,              // horizontal squeeze; 1.0 leaves the canvas alone
    pub checkpoint: Option<PathBuf>, // Some = save the canvas and stop
}

impl CanvasComposer {
    pub fn build(&self, mask: &Mask, layout: &CanvasLayout) -> Result<Composed, Error> {
        let canvas = composite(&self.foreground, &self.background, mask, layout)?;

        if let Some(path) = &self.checkpoint {
            log::info!("Saving intermediary canvas to {}", path.display());
            canvas.save(path).map_err(|e| Error::image(path, e))?;
            return Ok(Composed::Checkpointed(path.clone()));
        }

        Ok(Composed::Canvas(compress(canvas, self.compress)))
    }
}

/// Composite foreground over background through the mask, then paste the continuation.
pub fn composite(
    foreground: &ColorSpec,
    background: &ColorSpec,
    mask: &Mask,
    layout: &CanvasLayout,
) -> Result<Canvas, Error> {
    if mask.height() != layout.height {
        return Err(Error::Config(format!(
            "text mask is {} rows tall, canvas needs {}",
            mask.height(),
            layout.height
        )));
    }
    if let Some(continued) = &layout.continuation {
        if continued.height() != layout.height {
            return Err(Error::Config(format!(
                "continued canvas is {} rows tall, this display needs {}",
                continued.height(),
                layout.height
            )));
        }
    }

    let Some((text_x, width)) = layout.lead_in.checked_add(layout.continuation_width()).and_then(|text_x| {
        Some((text_x, text_x.checked_add(mask.width())?.checked_add(layout.lead_out)?))
    }) else {
        return Err(Error::Config("canvas is too wide; lower compress or shorten the text".into()));
    };
    let height = layout.height;

    let fg = fill(width, height, foreground);
    let bg = fill(width, height, background);

    let mut canvas = RgbImage::from_fn(width, height, |x, y| {
        let alpha = if x >= text_x && x < text_x + mask.width() {
            u32::from(mask.get_pixel(x - text_x, y)[0])
        } else {
            0
        };
        blend(fg.get_pixel(x, y), bg.get_pixel(x, y), alpha)
    });

    if let Some(continued) = &layout.continuation {
        log::info!("Appending to intermediary canvas");
        imageops::replace(&mut canvas, continued, i64::from(layout.lead_in), 0);
    }
    Ok(canvas)
}

#[inline]
fn blend(fg: &Rgb<u8>, bg: &Rgb<u8>, alpha: u32) -> Rgb<u8> {
    let mix = |f: u8, b: u8| ((u32::from(f) * alpha + u32::from(b) * (255 - alpha) + 127) / 255) as u8;
    Rgb([mix(fg[0], bg[0]), mix(fg[1], bg[1]), mix(fg[2], bg[2])])
}

/// Squeeze (factor > 1) or stretch (factor < 1) horizontally only.
pub fn compress(canvas: Canvas, factor: f64) -> Canvas {
    if factor == 1.0 {
        return canvas;
    }
    let width = ((f64::from(canvas.width()) / factor) as u32).max(1);
    imageops::resize(&canvas, width, canvas.height(), imageops::FilterType::Lanczos3)
}

/// Read a canvas saved by an earlier checkpoint run.
pub fn load_continuation(path: &Path) -> Result<Canvas, Error> {
    let img = image::open(path).map_err(|e| match e {
        image::ImageError::IoError(io) => Error::io(path, io),
        other => Error::image(path, other),
    })?;
    Ok(img.to_rgb8())
}
