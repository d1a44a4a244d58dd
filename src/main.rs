// ledz: scrolling text on LED displays built with LPD8806-based addressable LED strips.
//
// What a run does:
// • Reads ledz.toml (or the file named on the command line) plus key=value overrides.
// • Either renders the text into a movie or loads a stored movie (input = ...).
// • Then saves it (output = ...), or plays it on the SPI bus, or in a preview window.
// • Ctrl-C blanks the panel before exiting.

mod compose;
mod config;
mod device;
mod draw;
mod error;
mod fill;
mod gamma;
mod movie;
mod pipeline;
mod player;
mod sampler;
mod text;
mod topology;
mod types;

use config::Config;
use device::SpiBus;
use draw::PreviewWindow;
use error::Error;
use gamma::GammaTable;
use movie::Movie;
use pipeline::{RenderJob, Rendered};
use player::{CancelToken, MoviePlayer, Outcome, Pacing};
use text::MonoRasterizer;
use topology::Topology;

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    /* --- Settings ---
       Everything is checked here, before the bus is touched or a pixel is drawn. */
    let config = Config::load(std::env::args().skip(1))?;
    config.validate()?;
    let geometry = config.geometry()?;

    /* --- Bus speed ---
       Only when frames will actually go out over SPI. */
    if config.uses_bus() {
        device::configure_bus_speed(&config.spiset, &config.spidev, config.spispeed)?;
    }

    /* --- Shared tables, computed once --- */
    let gamma = GammaTable::new();
    let topology = Topology::new(&geometry);

    /* --- Movie: load or render --- */
    let movie = match &config.input {
        Some(path) => {
            log::info!("Reading from movie file");
            Movie::read_from(path, &geometry)?
        }
        None => {
            let job = RenderJob::from_config(&config)?;
            let rasterizer = MonoRasterizer::new(
                &config.font,
                config.fontsize * config.virtual_scale,
                config.fontbase * config.virtual_scale as i32,
            )?;
            match job.render(&rasterizer, &topology, &gamma)? {
                Rendered::Movie(movie) => movie,
                Rendered::Checkpointed(path) => {
                    log::info!("Canvas saved to {}; continue with continued = true", path.display());
                    return Ok(());
                }
            }
        }
    };

    if let Some(path) = &config.output {
        log::info!("Saving movie");
        return movie.write_to(path, config.header);
    }

    /* --- Playback --- */
    let cancel = CancelToken::new();
    cancel.install_interrupt_handler()?;
    let pacing = Pacing::new(movie.frame_len(), config.spispeed, config.frame_rate());

    let outcome = if config.preview {
        let window = PreviewWindow::new(topology, cancel.clone())?;
        let mut player = MoviePlayer::new(window, movie, pacing, config.playcount, config.brightness, cancel);
        let outcome = player.play()?;
        log::debug!("Preview finished ({:?})", player.state());
        outcome
    } else {
        let bus = SpiBus::open(&config.spidev)?;
        let mut player = MoviePlayer::new(bus, movie, pacing, config.playcount, config.brightness, cancel);
        let outcome = player.play()?;
        log::debug!("Playback finished ({:?})", player.state());
        outcome
    };

    if outcome == Outcome::Cancelled {
        log::info!("Stopped early; display blanked");
    }
    Ok(())
}
