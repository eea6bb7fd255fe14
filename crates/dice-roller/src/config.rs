//! Application configuration loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working setup:
//!
//! ```toml
//! [session]
//! base_url = "http://localhost:8080/"
//!
//! [render]
//! rotation_step = 0.01
//! fps = 60
//!
//! [service]
//! connect_latency_ms = 0
//!
//! [log]
//! level = "info"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use collab_client::ServiceConfig;
use serde::{Deserialize, Serialize};

/// Errors from loading an [`AppConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config `{}`: {source}", path.display())]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML for this layout.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value is out of its allowed range.
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where the session lives.
    pub session: SessionConfig,
    /// Scene and animation parameters.
    pub render: RenderConfig,
    /// In-process service tuning.
    pub service: ServiceSection,
    /// Logger settings.
    pub log: LogConfig,
}

/// `[session]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Page address without a fragment. The document id is appended as
    /// `#<id>` once a session is created.
    pub base_url: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/".to_string(),
        }
    }
}

/// `[render]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Radians added to both rotation axes per frame by the originator.
    pub rotation_step: f64,
    /// Frames per second of the render loop.
    pub fps: u32,
    /// Viewport width in pixels.
    pub width: u32,
    /// Viewport height in pixels.
    pub height: u32,
    /// Vertical field of view in degrees.
    pub fov: f64,
    /// Near clipping plane.
    pub near: f64,
    /// Far clipping plane.
    pub far: f64,
    /// Camera distance from the origin along z.
    pub camera_z: f64,
    /// Cube color as `0xRRGGBB`.
    pub cube_color: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            rotation_step: 0.01,
            fps: 60,
            width: 800,
            height: 600,
            fov: 75.0,
            near: 0.1,
            far: 1000.0,
            camera_z: 5.0,
            cube_color: 0x00ff00,
        }
    }
}

impl RenderConfig {
    /// Time between two frames.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.fps.max(1)
    }

    /// Viewport aspect ratio.
    pub fn aspect(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height.max(1))
    }
}

/// `[service]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSection {
    /// Simulated latency of connect round trips, in milliseconds.
    pub connect_latency_ms: u64,
}

impl ServiceSection {
    /// Convert to the service's own config type.
    pub fn to_service_config(&self) -> ServiceConfig {
        ServiceConfig {
            connect_latency: Duration::from_millis(self.connect_latency_ms),
        }
    }
}

/// `[log]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// One of `trace`, `debug`, `info`, `warn`, `error`.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let render = &self.render;
        if !render.rotation_step.is_finite() {
            return Err(ConfigError::Invalid(
                "render.rotation_step must be finite".into(),
            ));
        }
        if render.fps == 0 {
            return Err(ConfigError::Invalid("render.fps must be positive".into()));
        }
        if render.width == 0 || render.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "render size must be non-zero, got {}x{}",
                render.width, render.height
            )));
        }
        if !(render.near > 0.0 && render.far > render.near) {
            return Err(ConfigError::Invalid(format!(
                "clipping planes must satisfy 0 < near < far, got near={} far={}",
                render.near, render.far
            )));
        }
        if render.cube_color > 0xff_ffff {
            return Err(ConfigError::Invalid(format!(
                "render.cube_color {:#x} is not a 24-bit color",
                render.cube_color
            )));
        }
        if self.session.base_url.contains('#') {
            return Err(ConfigError::Invalid(
                "session.base_url must not carry a fragment".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.render.rotation_step, 0.01);
        assert_eq!(config.render.fov, 75.0);
        assert_eq!(config.render.cube_color, 0x00ff00);
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [render]
            fps = 30

            [service]
            connect_latency_ms = 40
            "#,
        )
        .unwrap();
        assert_eq!(config.render.fps, 30);
        assert_eq!(config.render.width, 800);
        assert_eq!(
            config.service.to_service_config().connect_latency,
            Duration::from_millis(40)
        );
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn frame_interval_follows_fps() {
        let render = RenderConfig {
            fps: 50,
            ..RenderConfig::default()
        };
        assert_eq!(render.frame_interval(), Duration::from_millis(20));
    }

    #[test]
    fn rejects_zero_fps() {
        let err = AppConfig::from_toml_str("[render]\nfps = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_inverted_clipping_planes() {
        let err = AppConfig::from_toml_str("[render]\nnear = 10.0\nfar = 1.0\n").unwrap_err();
        assert!(err.to_string().contains("near"));
    }

    #[test]
    fn rejects_base_url_with_fragment() {
        let err =
            AppConfig::from_toml_str("[session]\nbase_url = \"http://x/#abc\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = AppConfig::from_toml_str("[render\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reads_a_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[log]\nlevel = \"debug\"").unwrap();
        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.render, RenderConfig::default());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = AppConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}
