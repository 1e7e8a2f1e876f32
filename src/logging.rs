//! Log to a file in the cache directory; the terminal belongs to the UI.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

use crate::cache::CacheManager;

/// `RUST_LOG` wins over the configured level.
pub fn env_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level).map_err(|e| eyre!("Invalid log level '{}': {}", level, e))
}

/// Install the global subscriber, appending to the log file. Returns its path.
pub fn init(cache: &CacheManager, level: &str) -> Result<PathBuf> {
    cache.ensure_cache_dir()?;
    let path = cache.log_file();
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level)?)
        .with_timer(ChronoLocal::rfc_3339())
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| eyre!("Could not start logging: {}", e))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_levels_and_directives() {
        assert!(env_filter("info").is_ok());
        assert!(env_filter("flowdash=debug,ureq=warn").is_ok());
    }
}
