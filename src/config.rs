//! Config handling

use tracing::log::LevelFilter;

use crate::cli::CliOptions;
use crate::constants::{DEFAULT_HELPER_MODEL, DEFAULT_IMAGE_MODEL, DEFAULT_POST_MODEL};

/// Sets up logging based on the debug flag
pub fn setup_logging(debug: bool) -> Result<(), Box<std::io::Error>> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut logger = simple_logger::SimpleLogger::new().with_level(level);
    if !debug {
        logger = logger
            .with_module_level("tracing", LevelFilter::Warn)
            .with_module_level("rustls", LevelFilter::Info)
            .with_module_level("hyper_util", LevelFilter::Info)
            .with_module_level("reqwest", LevelFilter::Info)
            .with_module_level("tower_sessions", LevelFilter::Warn)
            .with_module_level("h2", LevelFilter::Info);
    }
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })
}

/// Which model handles which job.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ModelConfig {
    /// Writes posts
    pub post_model: String,
    /// Verifies keys and derives image prompts
    pub helper_model: String,
    /// Draws images
    pub image_model: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            post_model: DEFAULT_POST_MODEL.to_string(),
            helper_model: DEFAULT_HELPER_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
        }
    }
}

impl From<&CliOptions> for ModelConfig {
    fn from(cli: &CliOptions) -> Self {
        Self {
            post_model: cli.post_model.clone(),
            helper_model: cli.helper_model.clone(),
            image_model: cli.image_model.clone(),
        }
    }
}
