// Plays a movie to a sink (the SPI bus or the preview window) at a steady rate.
//
// Idle -> Playing -> (Looping | Stopped) -> Blanked
//
// Ctrl-C only raises a flag. The player notices it between frames (and while
// sleeping), blanks the panel itself and returns, so the "all off" bytes are
// on the wire before the process exits.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::Error;
use crate::movie::Movie;

/// Longest single sleep between cancellation checks.
const CANCEL_POLL: Duration = Duration::from_millis(10);

/// Where frames go.
pub trait FrameSink {
    /// Write one packed frame and wait until it has been sent.
    fn send_frame(&mut self, frame: &[u8]) -> Result<(), Error>;
    /// Turn every LED off.
    fn blank(&mut self, frame_len: usize) -> Result<(), Error>;
}

/// Shared "please stop" flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag on Ctrl-C (SIGINT).
    pub fn install_interrupt_handler(&self) -> Result<(), Error> {
        let flag = self.clone();
        ctrlc::set_handler(move || {
            log::info!("Ctrl-C pressed, blanking screen");
            flag.cancel();
        })
        .map_err(|e| Error::Interrupt(e.to_string()))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Frame rate and inter-frame delay, given what the bus can carry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pacing {
    pub fps: f64,
    pub max_fps: f64,
    pub transfer: Duration, // time on the wire for one frame
    pub delay: Duration,    // sleep after each frame
    pub clamped: bool,      // requested rate was above max_fps
}

impl Pacing {
    pub fn new(frame_len: usize, bus_bits_per_second: u32, requested_fps: f64) -> Self {
        let transfer = (frame_len * 8) as f64 / f64::from(bus_bits_per_second);
        let max_fps = 1.0 / transfer;

        if requested_fps > max_fps {
            return Self {
                fps: max_fps,
                max_fps,
                transfer: Duration::from_secs_f64(transfer),
                delay: Duration::ZERO,
                clamped: true,
            };
        }
        let delay = (1.0 / requested_fps - transfer).max(0.0);
        Self {
            fps: requested_fps,
            max_fps,
            transfer: Duration::from_secs_f64(transfer),
            delay: Duration::from_secs_f64(delay),
            clamped: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    Playing,
    Looping, // finished a pass, more to go
    Stopped, // finished the last pass
    Blanked,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Cancelled,
}

pub struct MoviePlayer<S: FrameSink> {
    sink: S,
    movie: Movie,
    pacing: Pacing,
    loops: u32, // 0 = forever
    cancel: CancelToken,
    state: PlayerState,
}

impl<S: FrameSink> MoviePlayer<S> {
    /// Brightness is baked into the frames here, once.
    pub fn new(
        sink: S,
        mut movie: Movie,
        pacing: Pacing,
        loops: u32,
        brightness: f64,
        cancel: CancelToken,
    ) -> Self {
        if brightness != 1.0 {
            log::info!("Adjusting brightness");
            movie.scale_brightness(brightness);
        }
        if pacing.clamped {
            log::warn!(
                "Frame rate is faster than the {:.1} fps maximum at this bus speed; displaying frames at maximum speed",
                pacing.max_fps
            );
        }
        Self { sink, movie, pacing, loops, cancel, state: PlayerState::Idle }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    #[cfg(test)]
    pub fn movie(&self) -> &Movie {
        &self.movie
    }

    #[cfg(test)]
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Play all loops, then blank. Also blanks (and returns early) when cancelled.
    pub fn play(&mut self) -> Result<Outcome, Error> {
        log::info!("Playing movie ({:.1} fps)", self.pacing.fps);
        let played = self.run_loops();
        let blanked = self.blank();

        // A failed frame write is the more interesting error, but a failed blank
        // still has to be seen.
        match (played, blanked) {
            (Err(e), Err(blank_err)) => {
                log::error!("Blanking after failure also failed: {blank_err}");
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
            (Ok(_), Err(blank_err)) => Err(blank_err),
            (Ok(outcome), Ok(())) => Ok(outcome),
        }
    }

    fn run_loops(&mut self) -> Result<Outcome, Error> {
        if self.movie.is_empty() {
            log::warn!("Movie has no frames");
            self.state = PlayerState::Stopped;
            return Ok(Outcome::Completed);
        }

        let mut passes = 0u32;
        loop {
            self.state = PlayerState::Playing;
            for frame in self.movie.frames() {
                if self.cancel.is_cancelled() {
                    return Ok(Outcome::Cancelled);
                }
                self.sink.send_frame(frame)?;
                if !sleep_unless_cancelled(self.pacing.delay, &self.cancel) {
                    return Ok(Outcome::Cancelled);
                }
            }

            passes += 1;
            if self.loops != 0 && passes >= self.loops {
                self.state = PlayerState::Stopped;
                return Ok(Outcome::Completed);
            }
            self.state = PlayerState::Looping;
        }
    }

    fn blank(&mut self) -> Result<(), Error> {
        match self.sink.blank(self.movie.frame_len()) {
            Ok(()) => {
                self.state = PlayerState::Blanked;
                Ok(())
            }
            Err(e) => {
                log::error!("Could not blank the display: {e}");
                Err(e)
            }
        }
    }
}

/// Sleep in short slices; false if cancelled on the way.
fn sleep_unless_cancelled(total: Duration, cancel: &CancelToken) -> bool {
    let deadline = Instant::now() + total;
    loop {
        if cancel.is_cancelled() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep((deadline - now).min(CANCEL_POLL));
    }
}
