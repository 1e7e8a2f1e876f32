use flowdash::config::{AppConfig, ConfigManager};
use flowdash::query_form::WINDOW_MINUTES_MAX;
use std::fs;
use tempfile::TempDir;

// Helper to create a temporary config directory for testing
fn setup_test_config_dir() -> (TempDir, ConfigManager) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_manager = ConfigManager::with_dir(temp_dir.path().to_path_buf());
    (temp_dir, config_manager)
}

fn write_config(manager: &ConfigManager, content: &str) {
    manager.ensure_config_dir().unwrap();
    fs::write(manager.config_path("config.toml"), content).unwrap();
}

#[test]
fn test_default_config() {
    let config = AppConfig::default();

    assert_eq!(config.version, "0.1");

    // Backend defaults
    assert_eq!(config.backend.base_url, "http://localhost:9991");
    assert_eq!(config.backend.timeout_secs, 30);

    // Query defaults
    assert_eq!(config.query.default_window_minutes, 15);
    assert_eq!(config.query.default_top_flows, 10);
    assert!(config.query.default_breakdown.is_empty());

    // Chart defaults
    assert!(config.chart.stacked);
    assert!(config.chart.y_starts_at_zero);
    assert_eq!(config.chart.title, "Flow bps");

    // Performance defaults
    assert_eq!(config.performance.event_poll_interval_ms, 25);
    assert_eq!(config.performance.suggestion_limit, 8);

    // Theme defaults
    assert_eq!(config.theme.colors.controls_bg, "indexed(236)");
    assert_eq!(config.theme.series.len(), 12);

    // Debug defaults
    assert!(!config.debug.enabled);
    assert_eq!(config.debug.log_level, "info");
}

#[test]
fn test_generate_default_config() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let template = config_manager.generate_default_config();

    assert!(template.contains("[backend]"));
    assert!(template.contains("[query]"));
    assert!(template.contains("[chart]"));
    assert!(template.contains("[performance]"));
    assert!(template.contains("[theme.colors]"));
    assert!(template.contains("[debug]"));

    // Only settings the dashboard reads are offered
    for unused in ["color_mode", "modal_border_error", "success =", "warning ="] {
        assert!(!template.contains(unused), "template mentions {}", unused);
    }
    assert!(template.contains("table_selected"));

    // The template is valid TOML and validates as-is
    let config: AppConfig = toml::from_str(&template).expect("template parses");
    assert!(config.validate().is_ok());
}

#[test]
fn test_write_default_config() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let path = config_manager.write_default_config(false).unwrap();
    assert!(path.exists());
    assert_eq!(path, config_manager.config_path("config.toml"));

    // A second write without force refuses to clobber
    let err = config_manager.write_default_config(false).unwrap_err();
    assert!(err.to_string().contains("--force"));

    fs::write(&path, "version = \"0.1\"\n").unwrap();
    config_manager.write_default_config(true).unwrap();
    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("[backend]"));
}

#[test]
fn test_missing_file_yields_defaults() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let config = AppConfig::load_from(&config_manager).unwrap();
    assert_eq!(config.backend.base_url, "http://localhost:9991");
    assert_eq!(config.query.default_top_flows, 10);
}

#[test]
fn test_partial_config_merges_over_defaults() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    write_config(
        &config_manager,
        r##"
[backend]
base_url = "https://flows.example.net/api"

[query]
default_top_flows = 25
default_breakdown = ["src_asn", "dst_asn"]

[chart]
stacked = false

[[fields.dicts]]
field = "src_asn"
columns = ["name"]

[theme.colors]
primary = "#ff8800"
"##,
    );

    let config = AppConfig::load_from(&config_manager).unwrap();

    assert_eq!(config.backend.base_url, "https://flows.example.net/api");
    // Untouched values keep their defaults
    assert_eq!(config.backend.timeout_secs, 30);
    assert_eq!(config.query.default_top_flows, 25);
    assert_eq!(config.query.default_breakdown, vec!["src_asn", "dst_asn"]);
    assert_eq!(config.query.default_window_minutes, 15);
    assert!(!config.chart.stacked);
    assert_eq!(config.chart.title, "Flow bps");
    assert_eq!(config.fields.dicts.len(), 1);
    assert_eq!(config.fields.dicts[0].columns, vec!["name"]);
    assert_eq!(config.theme.colors.primary, "#ff8800");
    assert_eq!(config.theme.colors.error, "red");
}

#[test]
fn test_malformed_toml_is_an_error() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    write_config(&config_manager, "[backend\nbase_url = ");

    let err = AppConfig::load_from(&config_manager).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test]
fn test_invalid_base_url_rejected() {
    let mut config = AppConfig::default();
    config.backend.base_url = "localhost:9991".to_string();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("base_url"));
}

#[test]
fn test_top_flows_bounds() {
    let mut config = AppConfig::default();

    config.query.default_top_flows = 0;
    assert!(config.validate().is_err());

    config.query.default_top_flows = 10001;
    assert!(config.validate().is_err());

    config.query.default_top_flows = 1;
    assert!(config.validate().is_ok());

    config.query.default_top_flows = 10000;
    assert!(config.validate().is_ok());
}

#[test]
fn test_zero_values_rejected() {
    let mut config = AppConfig::default();
    config.backend.timeout_secs = 0;
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.performance.event_poll_interval_ms = 0;
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.query.default_window_minutes = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_window_minutes_bounded() {
    let mut config = AppConfig::default();

    config.query.default_window_minutes = i64::MAX;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("default_window_minutes"));

    config.query.default_window_minutes = WINDOW_MINUTES_MAX + 1;
    assert!(config.validate().is_err());

    config.query.default_window_minutes = WINDOW_MINUTES_MAX;
    assert!(config.validate().is_ok());
}

#[test]
fn test_invalid_colors_rejected() {
    std::env::remove_var("NO_COLOR");

    let mut config = AppConfig::default();
    config.theme.colors.primary = "not_a_color".to_string();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("primary"));

    let mut config = AppConfig::default();
    config.theme.series.push("chartreuse-ish".to_string());
    assert!(config.validate().is_err());
}

#[test]
fn test_unsupported_version_rejected() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    write_config(&config_manager, "version = \"2.0\"\n");

    let err = AppConfig::load_from(&config_manager).unwrap_err();
    assert!(err.to_string().contains("Unsupported config version"));
}
