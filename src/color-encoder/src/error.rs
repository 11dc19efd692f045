//! Error types for color statistics, shifting and model selection.

use std::path::PathBuf;
use thiserror::Error;

use crate::color::Channel;

pub type Result<T> = std::result::Result<T, ColorError>;

#[derive(Error, Debug)]
pub enum ColorError {
    /// Image file is missing or could not be decoded.
    #[error("Failed to load image {path:?}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The source statistics of a shift have no spread in this channel.
    #[error("Zero-variance {channel} channel in shift source statistics")]
    ZeroVariance { channel: Channel },

    #[error("Non-finite {which} statistics: {value}")]
    NonFiniteStats { which: &'static str, value: f32 },

    #[error("Image shapes differ: {left:?} vs {right:?}")]
    ShapeMismatch {
        left: (u32, u32),
        right: (u32, u32),
    },

    #[error("Expected {expected} values for a color statistics vector, got {actual}")]
    VectorLength { expected: usize, actual: usize },

    #[error("Unknown backbone {0:?}, expected one of R34, R50")]
    UnknownBackbone(String),
}
