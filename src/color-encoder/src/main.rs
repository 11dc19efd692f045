use color_encoder::{ColorError, model::training::training_loop, utils::app_paths::AppPaths};
use color_eyre::{Result, eyre::WrapErr};
use log::{error, info};
use std::{
    fs::File,
    time::{SystemTime, UNIX_EPOCH},
};

fn main() -> Result<()> {
    color_eyre::install()?;
    let paths = AppPaths::from_env();

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    if let Some(log_file) = paths.log_file(timestamp) {
        if let Some(dir) = log_file.parent() {
            std::fs::create_dir_all(dir)
                .wrap_err_with(|| format!("Failed to create log directory {dir:?}"))?;
        }
        let file = File::create(&log_file)
            .wrap_err_with(|| format!("Failed to create log file {log_file:?}"))?;
        logger.target(env_logger::Target::Pipe(Box::new(file)));
    }
    logger.init();

    info!("Training data: {:?}, validation data: {:?}", paths.train_root, paths.valid_root);
    if let Err(e) = training_loop(&paths) {
        if let Some(ColorError::UnknownBackbone(name)) =
            e.chain().find_map(|c| c.downcast_ref::<ColorError>())
        {
            error!("Correct model not selected: unknown backbone {name:?}");
        } else {
            error!("{e:#}");
        }
        return Err(e);
    }
    Ok(())
}
