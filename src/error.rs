/// Errors from the fallible edges: config files, terminal I/O, PNG output
/// and command-line parsing.  The simulation itself never fails.

use crate::config::ConfigError;

#[derive(thiserror::Error, Debug)]
pub enum BackdropError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// A `WIDTHxHEIGHT` argument that did not parse or had a zero side.
    #[error("Invalid size '{0}': expected WIDTHxHEIGHT with non-zero sides")]
    InvalidSize(String),
}

pub type Result<T> = std::result::Result<T, BackdropError>;
