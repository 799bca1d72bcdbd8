use std::sync::Mutex;
use std::time::Duration;

use tempfile::{Builder, NamedTempFile};

use driver_monitor::config::{AlarmSinkKind, MonitorConfig};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "DRIVEMON_CONFIG",
        "DRIVEMON_CLASSIFIER_URL",
        "DRIVEMON_CLASSIFIER_TIMEOUT_MS",
        "DRIVEMON_CAMERA",
        "DRIVEMON_TICK_MS",
        "DRIVEMON_ALERT_COOLDOWN_MS",
        "DRIVEMON_REPORT_DIR",
        "DRIVEMON_SESSION_PATH",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_json_config_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "classifier": { "url": "http://10.0.0.5:5000/infer", "timeout_ms": 1500 },
        "camera": { "source": "stub://cabin", "width": 320, "height": 240, "tick_ms": 750 },
        "alerts": { "cooldown_ms": 8000, "sink": "silent" },
        "event_log": { "retention": 50 },
        "report": { "dir": "/var/lib/drivemon/reports" }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("DRIVEMON_CONFIG", file.path());
    std::env::set_var("DRIVEMON_TICK_MS", "400");
    std::env::set_var("DRIVEMON_SESSION_PATH", "/run/drivemon/session.json");

    let cfg = MonitorConfig::load().expect("load config");

    assert_eq!(cfg.classifier.url, "http://10.0.0.5:5000/infer");
    assert_eq!(cfg.classifier.timeout, Duration::from_millis(1500));
    assert_eq!(cfg.camera.source, "stub://cabin");
    assert_eq!(cfg.camera.width, 320);
    assert_eq!(cfg.camera.height, 240);
    assert_eq!(cfg.camera.tick, Duration::from_millis(400));
    assert_eq!(cfg.alerts.cooldown, Duration::from_millis(8000));
    assert_eq!(cfg.alerts.sink, AlarmSinkKind::Silent);
    assert_eq!(cfg.retention, 50);
    assert_eq!(
        cfg.report_dir,
        std::path::PathBuf::from("/var/lib/drivemon/reports")
    );
    assert_eq!(
        cfg.session_path.as_deref(),
        Some(std::path::Path::new("/run/drivemon/session.json"))
    );

    clear_env();
}

#[test]
fn loads_toml_config() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = Builder::new().suffix(".toml").tempfile().expect("temp config");
    let toml = r#"
        [classifier]
        url = "stub://offline"

        [camera]
        source = "stub://cabin"
        jpeg_quality = 85
    "#;
    std::io::Write::write_all(&mut file, toml.as_bytes()).expect("write config");
    std::env::set_var("DRIVEMON_CONFIG", file.path());

    let cfg = MonitorConfig::load().expect("load config");
    assert_eq!(cfg.classifier.url, "stub://offline");
    assert_eq!(cfg.camera.jpeg_quality, 85);
    assert_eq!(cfg.camera.tick, Duration::from_millis(500));

    clear_env();
}

#[test]
fn defaults_without_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = MonitorConfig::load().expect("load defaults");
    assert_eq!(cfg.classifier.url, "http://127.0.0.1:5000/infer");
    assert_eq!(cfg.classifier.timeout, Duration::from_millis(2000));
    assert_eq!(cfg.camera.source, "stub://front_camera");
    assert_eq!(cfg.alerts.cooldown, Duration::from_millis(5000));
    assert_eq!(cfg.retention, 20);
    assert!(cfg.session_path.is_none());
}

#[test]
fn rejects_invalid_env_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("DRIVEMON_TICK_MS", "fast");
    assert!(MonitorConfig::load().is_err());
    clear_env();

    std::env::set_var("DRIVEMON_CLASSIFIER_URL", "ftp://classifier/infer");
    assert!(MonitorConfig::load().is_err());
    clear_env();

    std::env::set_var("DRIVEMON_CONFIG", "/nonexistent/drivemon.json");
    assert!(MonitorConfig::load().is_err());
    clear_env();
}
