//! Tests for configuration profiles, environment overrides and merging behavior.

use mixer_config::{ConfigDiscovery, ExtractVueStyles};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use tempfile::TempDir;

fn test_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

fn write_config(dir: &TempDir, body: &str) {
    fs::write(dir.path().join("mixer.toml"), body).expect("write config");
}

#[test]
fn profile_overrides_options() {
    let _guard = test_lock().lock().expect("lock");
    let dir = TempDir::new().expect("tempdir");
    write_config(
        &dir,
        r#"
[options]
public_path = "public"
source_maps = true

[profiles.production.options]
production = true
versioning = true
"#,
    );

    let config = ConfigDiscovery::new(dir.path())
        .load_with_profile("production")
        .expect("load with profile");

    assert!(config.options.production);
    assert!(config.options.versioning);
    assert!(config.options.source_maps); // preserved
    assert!(!config.options.wants_source_maps());
}

#[test]
fn profile_overrides_settings() {
    let _guard = test_lock().lock().expect("lock");
    let dir = TempDir::new().expect("tempdir");
    write_config(
        &dir,
        r#"
[settings]
log_level = "info"

[profiles.ci.settings]
log_level = "debug"
trace = true
"#,
    );

    let config = ConfigDiscovery::new(dir.path())
        .load_with_profile("ci")
        .expect("load with profile");

    assert_eq!(config.settings.log_level.as_deref(), Some("debug"));
    assert!(config.settings.trace);
}

#[test]
fn profile_can_switch_vue_extraction_to_a_file() {
    let _guard = test_lock().lock().expect("lock");
    let dir = TempDir::new().expect("tempdir");
    write_config(
        &dir,
        r#"
[options]
extract_vue_styles = true

[profiles.split.options]
extract_vue_styles = "/css/components.css"
"#,
    );

    let config = ConfigDiscovery::new(dir.path())
        .load_with_profile("split")
        .expect("load with profile");

    assert_eq!(
        config.options.extract_vue_styles,
        ExtractVueStyles::File("/css/components.css".to_string())
    );
}

#[test]
fn environment_overrides_file_values() {
    let _guard = test_lock().lock().expect("lock");
    let dir = TempDir::new().expect("tempdir");
    write_config(
        &dir,
        r#"
[options]
public_path = "public"
"#,
    );

    // SAFETY: serialized by test_lock; no other thread reads the environment here.
    unsafe { env::set_var("MIXER_OPTIONS__PUBLIC_PATH", "web") };
    let config = ConfigDiscovery::new(dir.path()).load();
    unsafe { env::remove_var("MIXER_OPTIONS__PUBLIC_PATH") };

    assert_eq!(config.expect("load").options.public_path, PathBuf::from("web"));
}

#[test]
fn unknown_option_is_rejected() {
    let _guard = test_lock().lock().expect("lock");
    let dir = TempDir::new().expect("tempdir");
    write_config(
        &dir,
        r#"
[options]
publicPath = "web"
"#,
    );

    assert!(ConfigDiscovery::new(dir.path()).load().is_err());
}
