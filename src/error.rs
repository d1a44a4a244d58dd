// One error type for the whole program.
// Every variant states *where* things went wrong; file errors always carry the path.
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String), // Bad geometry, unknown color, missing size, conflicting modes

    #[error("Device setup error: {0}")]
    DeviceSetup(String), // Setting the bus speed failed

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    }, // Movie, checkpoint or bus read/write failed

    #[error("Image error on {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    }, // Checkpoint PNG could not be decoded/encoded

    #[error("Movie format error in {}: {reason}", path.display())]
    MovieFormat { path: PathBuf, reason: String },

    #[error("Window error: {0}")]
    Window(String), // Preview window creation/update failed

    #[error("Interrupt handler error: {0}")]
    Interrupt(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }

    pub fn image(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Error::Image { path: path.into(), source }
    }
}
