//! Color correction for scanned documents.
//!
//! A ResNet regressor predicts the per-channel mean and standard deviation a scan
//! would have if it were clean; [`color::apply_color_shift`] then moves the scan's
//! measured statistics onto the prediction.

pub mod color;
pub mod common;
pub mod data;
pub mod error;
pub mod model;
pub mod utils;

pub use color::{ColorStats, apply_color_shift, channel_stats};
pub use error::ColorError;
pub use model::{backbone::Backbone, encoder::ColorEncoder};
pub use utils::metrics::psnr;
