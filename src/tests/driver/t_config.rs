use std::path::Path;

use indoc::indoc;

use crate::driver::config::{CheckerConfig, LogFormat};

#[test]
fn empty_config_uses_defaults() {
    let config = CheckerConfig::parse("").unwrap();
    assert_eq!(config, CheckerConfig::default());
    assert!(config.check.permissive_casts);
    assert!(config.check.static_fields);
    assert_eq!(config.log.level, "warn");
    assert_eq!(config.log.format, LogFormat::Text);
}

#[test]
fn sections_override_defaults() {
    let config = CheckerConfig::parse(indoc! {r#"
        [check]
        permissive_casts = false
        suppress = ["initialization.invalid.cast"]

        [log]
        level = "debug"
        format = "json"
    "#})
    .unwrap();

    let options = config.options();
    assert!(!options.permissive_casts);
    assert!(options.static_fields);
    assert!(config.is_suppressed("initialization.invalid.cast"));
    assert!(!config.is_suppressed("initialization.fields.uninitialized"));
    assert_eq!(config.log.level, "debug");
    assert_eq!(config.log.format, LogFormat::Json);
}

#[test]
fn parse_includes_line_number_on_error() {
    let err = CheckerConfig::parse("[check]\nstatic_fields = true\nverbose = 1\n").unwrap_err();
    assert!(
        err.message.starts_with("line 3:"),
        "error should include line number: {}",
        err.message
    );
}

#[test]
fn missing_file_means_defaults() {
    let config = CheckerConfig::load(Path::new("/nonexistent/fbc.toml")).unwrap();
    assert_eq!(config, CheckerConfig::default());
}

#[test]
fn error_display_names_the_file() {
    let err = CheckerConfig::parse("[log]\nformat = \"xml\"\n").unwrap_err();
    assert!(err.path.is_none());
    assert!(!err.to_string().is_empty());

    let with_path = crate::driver::config::ConfigError {
        path: Some("fbc.toml".into()),
        message: "line 1: bad".to_string(),
    };
    assert_eq!(with_path.to_string(), "fbc.toml: line 1: bad");
}
