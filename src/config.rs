use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::event_log::DEFAULT_RETENTION;
use crate::frame::DEFAULT_JPEG_QUALITY;

const DEFAULT_CLASSIFIER_URL: &str = "http://127.0.0.1:5000/infer";
const DEFAULT_CLASSIFIER_TIMEOUT_MS: u64 = 2000;
const DEFAULT_CAMERA_SOURCE: &str = "stub://front_camera";
const DEFAULT_CAMERA_WIDTH: u32 = 640;
const DEFAULT_CAMERA_HEIGHT: u32 = 480;
const DEFAULT_TICK_MS: u64 = 500;
const DEFAULT_COOLDOWN_MS: u64 = 5000;
const DEFAULT_REPORT_DIR: &str = ".";

#[derive(Debug, Deserialize, Default)]
struct MonitorConfigFile {
    classifier: Option<ClassifierConfigFile>,
    camera: Option<CameraConfigFile>,
    alerts: Option<AlertsConfigFile>,
    event_log: Option<EventLogConfigFile>,
    report: Option<ReportConfigFile>,
    session: Option<SessionConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct ClassifierConfigFile {
    url: Option<String>,
    timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    source: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    tick_ms: Option<u64>,
    jpeg_quality: Option<u8>,
}

#[derive(Debug, Deserialize, Default)]
struct AlertsConfigFile {
    cooldown_ms: Option<u64>,
    sink: Option<AlarmSinkKind>,
}

#[derive(Debug, Deserialize, Default)]
struct EventLogConfigFile {
    retention: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct ReportConfigFile {
    dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct SessionConfigFile {
    path: Option<PathBuf>,
}

/// How alarms are played.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AlarmSinkKind {
    #[default]
    Bell,
    Silent,
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub classifier: ClassifierSettings,
    pub camera: CameraSettings,
    pub alerts: AlertSettings,
    pub retention: usize,
    pub report_dir: PathBuf,
    pub session_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ClassifierSettings {
    pub url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct CameraSettings {
    pub source: String,
    pub width: u32,
    pub height: u32,
    pub tick: Duration,
    pub jpeg_quality: u8,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            source: DEFAULT_CAMERA_SOURCE.to_string(),
            width: DEFAULT_CAMERA_WIDTH,
            height: DEFAULT_CAMERA_HEIGHT,
            tick: Duration::from_millis(DEFAULT_TICK_MS),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AlertSettings {
    pub cooldown: Duration,
    pub sink: AlarmSinkKind,
}

impl MonitorConfig {
    /// Load from `DRIVEMON_CONFIG` (if set), then apply env overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("DRIVEMON_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: MonitorConfigFile) -> Self {
        let classifier = file.classifier.unwrap_or_default();
        let camera = file.camera.unwrap_or_default();
        let alerts = file.alerts.unwrap_or_default();
        Self {
            classifier: ClassifierSettings {
                url: classifier
                    .url
                    .unwrap_or_else(|| DEFAULT_CLASSIFIER_URL.to_string()),
                timeout: Duration::from_millis(
                    classifier
                        .timeout_ms
                        .unwrap_or(DEFAULT_CLASSIFIER_TIMEOUT_MS),
                ),
            },
            camera: CameraSettings {
                source: camera
                    .source
                    .unwrap_or_else(|| DEFAULT_CAMERA_SOURCE.to_string()),
                width: camera.width.unwrap_or(DEFAULT_CAMERA_WIDTH),
                height: camera.height.unwrap_or(DEFAULT_CAMERA_HEIGHT),
                tick: Duration::from_millis(camera.tick_ms.unwrap_or(DEFAULT_TICK_MS)),
                jpeg_quality: camera.jpeg_quality.unwrap_or(DEFAULT_JPEG_QUALITY),
            },
            alerts: AlertSettings {
                cooldown: Duration::from_millis(alerts.cooldown_ms.unwrap_or(DEFAULT_COOLDOWN_MS)),
                sink: alerts.sink.unwrap_or_default(),
            },
            retention: file
                .event_log
                .and_then(|log| log.retention)
                .unwrap_or(DEFAULT_RETENTION),
            report_dir: file
                .report
                .and_then(|report| report.dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_DIR)),
            session_path: file.session.and_then(|session| session.path),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("DRIVEMON_CLASSIFIER_URL") {
            if !url.trim().is_empty() {
                self.classifier.url = url.trim().to_string();
            }
        }
        if let Ok(timeout) = std::env::var("DRIVEMON_CLASSIFIER_TIMEOUT_MS") {
            self.classifier.timeout = Duration::from_millis(parse_millis(
                "DRIVEMON_CLASSIFIER_TIMEOUT_MS",
                &timeout,
            )?);
        }
        if let Ok(source) = std::env::var("DRIVEMON_CAMERA") {
            if !source.trim().is_empty() {
                self.camera.source = source.trim().to_string();
            }
        }
        if let Ok(tick) = std::env::var("DRIVEMON_TICK_MS") {
            self.camera.tick = Duration::from_millis(parse_millis("DRIVEMON_TICK_MS", &tick)?);
        }
        if let Ok(cooldown) = std::env::var("DRIVEMON_ALERT_COOLDOWN_MS") {
            self.alerts.cooldown =
                Duration::from_millis(parse_millis("DRIVEMON_ALERT_COOLDOWN_MS", &cooldown)?);
        }
        if let Ok(dir) = std::env::var("DRIVEMON_REPORT_DIR") {
            if !dir.trim().is_empty() {
                self.report_dir = PathBuf::from(dir.trim());
            }
        }
        if let Ok(path) = std::env::var("DRIVEMON_SESSION_PATH") {
            if !path.trim().is_empty() {
                self.session_path = Some(PathBuf::from(path.trim()));
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if !self.classifier.url.starts_with("stub://") {
            let url = Url::parse(&self.classifier.url)
                .map_err(|e| anyhow!("invalid classifier url {}: {}", self.classifier.url, e))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(anyhow!(
                    "classifier url must use http, https or stub (got {})",
                    url.scheme()
                ));
            }
        }
        if self.classifier.timeout.is_zero() {
            return Err(anyhow!("classifier timeout must be greater than zero"));
        }
        if self.camera.tick.is_zero() {
            return Err(anyhow!("tick interval must be greater than zero"));
        }
        if !(1..=100).contains(&self.camera.jpeg_quality) {
            return Err(anyhow!("jpeg quality must be within 1..=100"));
        }
        if self.retention == 0 {
            return Err(anyhow!("event log retention must be greater than zero"));
        }
        Ok(())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::from_file(MonitorConfigFile::default())
    }
}

fn read_config_file(path: &Path) -> Result<MonitorConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}

fn parse_millis(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| anyhow!("{} must be an integer number of milliseconds", key))
}
