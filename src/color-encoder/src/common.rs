pub const CHANNELS: usize = 3;
/// Side length images are resized to before statistics are taken.
pub const IMAGE_SIZE: u32 = 512;
pub const TARGET_DIM: usize = crate::color::stats::STATS_VECTOR_LEN;
