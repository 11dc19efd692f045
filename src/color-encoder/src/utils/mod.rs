pub mod app_paths;
pub mod metrics;
