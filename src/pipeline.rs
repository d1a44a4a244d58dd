// Text in, packed movie out:
// fill -> compose -> sample -> remap -> gamma pack.

use std::path::PathBuf;

use crate::compose::{CanvasComposer, CanvasLayout, Composed, load_continuation};
use crate::config::Config;
use crate::error::Error;
use crate::fill::ColorSpec;
use crate::gamma::GammaTable;
use crate::movie::Movie;
use crate::sampler::FrameSampler;
use crate::text::TextRasterizer;
use crate::topology::Topology;
use crate::types::DisplayGeometry;

pub enum Rendered {
    Movie(Movie),
    Checkpointed(PathBuf),
}

/// Everything needed to render one scroll, decoupled from how it was configured.
pub struct RenderJob {
    pub geometry: DisplayGeometry,
    pub text: String,
    pub foreground: ColorSpec,
    pub background: ColorSpec,
    pub virtual_scale: u32,
    pub compress: f64,
    pub vertical_smooth: bool,
    pub lead_in: bool,
    pub lead_out: bool,
    pub continue_from: Option<PathBuf>, // append to this saved canvas
    pub checkpoint_to: Option<PathBuf>, // save the canvas here and stop
}

impl RenderJob {
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let text = config.text.clone().unwrap_or_default();
        Ok(Self {
            geometry: config.geometry()?,
            text,
            foreground: ColorSpec::parse(&config.foreground)?,
            background: ColorSpec::parse(&config.background)?,
            virtual_scale: config.virtual_scale,
            compress: config.compress,
            vertical_smooth: config.verticalsmooth,
            // A checkpoint leaves lead-in/out to the run that finishes the movie.
            lead_in: !config.noleadin && !config.tobecontinued,
            lead_out: !config.noleadout && !config.tobecontinued,
            continue_from: config.continued.then(|| config.canvas.clone()),
            checkpoint_to: config.tobecontinued.then(|| config.canvas.clone()),
        })
    }

    pub fn render(
        &self,
        rasterizer: &dyn TextRasterizer,
        topology: &Topology,
        gamma: &GammaTable,
    ) -> Result<Rendered, Error> {
        log::info!("Rendering image");
        let (width, height) = (self.geometry.width as u32, self.geometry.height as u32);
        let canvas_height = height * self.virtual_scale;

        // Lead sections are one screen wide *after* compression.
        let screen_width = (f64::from(width * self.virtual_scale) * self.compress) as u32;
        let layout = CanvasLayout {
            lead_in: if self.lead_in { screen_width } else { 0 },
            lead_out: if self.lead_out { screen_width } else { 0 },
            height: canvas_height,
            continuation: match &self.continue_from {
                Some(path) => Some(load_continuation(path)?),
                None => None,
            },
        };

        let mask = rasterizer.rasterize(&self.text, canvas_height)?;
        let composer = CanvasComposer {
            foreground: self.foreground.clone(),
            background: self.background.clone(),
            compress: self.compress,
            checkpoint: self.checkpoint_to.clone(),
        };
        let canvas = match composer.build(&mask, &layout)? {
            Composed::Canvas(canvas) => canvas,
            Composed::Checkpointed(path) => return Ok(Rendered::Checkpointed(path)),
        };

        log::info!("Creating movie");
        let sampler = FrameSampler::new(canvas, width, height, self.virtual_scale, self.vertical_smooth);
        let mut movie = Movie::new(&self.geometry);
        for frame in sampler.frames() {
            movie.push(gamma.pack(&topology.remap(&frame)))?;
        }
        log::debug!("Rendered {} frames", movie.len());
        Ok(Rendered::Movie(movie))
    }
}
