pub mod augmentation;
pub mod batch;
pub mod conversion;
pub mod loader;
pub mod normalize;
