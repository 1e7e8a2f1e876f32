use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for flowdash
#[derive(Parser, Debug, Default)]
#[command(version, about = "flowdash")]
pub struct Args {
    /// Dashboard location to open: a full URL (http://host/#...), a bare
    /// fragment (#breakdown=...) or the fragment text itself
    pub location: Option<String>,

    /// Base URL of the flow query backend (overrides [backend] base_url)
    #[arg(long = "endpoint")]
    pub endpoint: Option<String>,

    /// Enable debug mode to show operational information
    #[arg(long = "debug", action)]
    pub debug: bool,

    /// Log level for the log file (error, warn, info, debug, trace)
    #[arg(long = "log-level")]
    pub log_level: Option<String>,

    /// Fetch the query once and write the chart to this PNG file instead of
    /// starting the dashboard
    #[arg(long = "export")]
    pub export: Option<PathBuf>,

    /// Print the normalized fragment for LOCATION and exit
    #[arg(long = "print-fragment", action)]
    pub print_fragment: bool,

    /// Write the default configuration file and exit
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Overwrite an existing configuration file with --generate-config
    #[arg(long = "force", action)]
    pub force: bool,

    /// Clear all cache data (log files) and exit
    #[arg(long = "clear-cache", action)]
    pub clear_cache: bool,
}
