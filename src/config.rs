//! Renderer configuration.
//!
//! `RendererConfig` carries everything the [`DeferredRenderer`](crate::DeferredRenderer)
//! used to read from process-wide globals: the logical game resolution, the
//! real window size, the texture size policy and the capture settings. It is
//! owned by the renderer instance and handed to the backend and capture
//! components when they need it.
//!
//! `RendererConfig` provides defaults via [`Default`] and a fluent
//! [`RendererConfig::builder()`] with validation. It can also be read from a
//! JSON document.
//!
//! # Examples
//!
//! ```rust
//! use deferred_render::config::{BackendKind, RendererConfig};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = RendererConfig::builder()
//!     .screen(640, 480)
//!     .backend(BackendKind::Null)
//!     .scale_down_all_textures(true)
//!     .gif_delay_cs(5)
//!     .build()?;
//! assert_eq!(cfg.window.width, 640);
//! # Ok(()) }
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::render::backend::SurfaceSize;

/// Which backend implementation gets created at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// CPU reference rasterizer.
    #[default]
    Software,
    /// Renders nothing, records every call. Used by tests and headless runs.
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Size policy applied when a lazy picture is materialized.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TexturePolicy {
    /// Halve every texture on materialize.
    pub scale_down_all: bool,
    /// Halve textures that look like pixel-doubled ("2×") art.
    pub detect_pixel_doubled: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub screenshots_dir: PathBuf,
    pub recordings_dir: PathBuf,
    /// Delay between recorded frames, in 1/100 s.
    pub gif_delay_cs: u16,
    /// Length of one logical frame tick, used to pace recording.
    pub frame_interval_ms: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            screenshots_dir: PathBuf::from("screenshots"),
            recordings_dir: PathBuf::from("gif-recordings"),
            gif_delay_cs: 4,
            frame_interval_ms: 1000 / 65,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Logical game resolution (the virtual render buffer).
    pub screen: SurfaceSize,
    /// Real window size.
    pub window: SurfaceSize,
    pub backend: BackendKind,
    /// Overrides the hardware texture limit reported by the backend.
    pub max_texture_size: Option<SurfaceSize>,
    pub textures: TexturePolicy,
    pub capture: CaptureConfig,
    pub log_level: LogLevel,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            screen: SurfaceSize { width: 800, height: 600 },
            window: SurfaceSize { width: 800, height: 600 },
            backend: BackendKind::default(),
            max_texture_size: None,
            textures: TexturePolicy::default(),
            capture: CaptureConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl RendererConfig {
    pub fn builder() -> RendererConfigBuilder {
        RendererConfigBuilder::default()
    }

    /// Parses a JSON document. Missing fields fall back to their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let cfg: RendererConfig = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        validate(&cfg)?;
        Ok(cfg)
    }

    /// Reads and parses a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&contents)
    }
}

/// Builder for [`RendererConfig`].
#[derive(Debug, Clone, Default)]
pub struct RendererConfigBuilder {
    inner: RendererConfig,
    window_set: bool,
}

impl RendererConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut RendererConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn screen(self, width: u32, height: u32) -> Self { self.map(|c| c.screen = SurfaceSize { width, height }) }
    pub fn window(mut self, width: u32, height: u32) -> Self {
        self.window_set = true;
        self.map(|c| c.window = SurfaceSize { width, height })
    }
    pub fn backend(self, kind: BackendKind) -> Self { self.map(|c| c.backend = kind) }
    pub fn max_texture_size(self, width: u32, height: u32) -> Self { self.map(|c| c.max_texture_size = Some(SurfaceSize { width, height })) }
    pub fn scale_down_all_textures(self, on: bool) -> Self { self.map(|c| c.textures.scale_down_all = on) }
    pub fn detect_pixel_doubled(self, on: bool) -> Self { self.map(|c| c.textures.detect_pixel_doubled = on) }
    pub fn screenshots_dir<P: Into<PathBuf>>(self, dir: P) -> Self { self.map(|c| c.capture.screenshots_dir = dir.into()) }
    pub fn recordings_dir<P: Into<PathBuf>>(self, dir: P) -> Self { self.map(|c| c.capture.recordings_dir = dir.into()) }
    pub fn gif_delay_cs(self, delay: u16) -> Self { self.map(|c| c.capture.gif_delay_cs = delay) }
    pub fn frame_interval_ms(self, ms: u32) -> Self { self.map(|c| c.capture.frame_interval_ms = ms) }
    pub fn log_level(self, level: LogLevel) -> Self { self.map(|c| c.log_level = level) }

    /// Apply multiple changes in one go.
    pub fn with(self, f: impl FnOnce(&mut RendererConfig)) -> Self { self.map(f) }

    /// Validate and build the final config.
    ///
    /// The window follows the screen size unless it was set explicitly.
    pub fn build(mut self) -> Result<RendererConfig, ConfigError> {
        if !self.window_set {
            self.inner.window = self.inner.screen;
        }
        validate(&self.inner)?;
        Ok(self.inner)
    }
}

// ---------- Validation ----------

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    ZeroScreen,
    ZeroWindow,
    ZeroFrameDelay,
    ZeroFrameInterval,
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroScreen => write!(f, "screen resolution must be at least 1x1"),
            ConfigError::ZeroWindow => write!(f, "window size must be at least 1x1"),
            ConfigError::ZeroFrameDelay => write!(f, "gif_delay_cs must be at least 1"),
            ConfigError::ZeroFrameInterval => write!(f, "frame_interval_ms must be at least 1"),
            ConfigError::Parse(msg) => write!(f, "cannot parse configuration: {msg}"),
        }
    }
}
impl std::error::Error for ConfigError {}

fn validate(c: &RendererConfig) -> Result<(), ConfigError> {
    if c.screen.width == 0 || c.screen.height == 0 {
        return Err(ConfigError::ZeroScreen);
    }
    if c.window.width == 0 || c.window.height == 0 {
        return Err(ConfigError::ZeroWindow);
    }
    if c.capture.gif_delay_cs == 0 {
        return Err(ConfigError::ZeroFrameDelay);
    }
    if c.capture.frame_interval_ms == 0 {
        return Err(ConfigError::ZeroFrameInterval);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_follows_screen_unless_set() {
        let cfg = RendererConfig::builder().screen(320, 240).build().unwrap();
        assert_eq!(cfg.window, SurfaceSize { width: 320, height: 240 });

        let cfg = RendererConfig::builder().screen(320, 240).window(1280, 720).build().unwrap();
        assert_eq!(cfg.window, SurfaceSize { width: 1280, height: 720 });
    }

    #[test]
    fn rejects_invalid_values() {
        assert_eq!(RendererConfig::builder().screen(0, 10).build().unwrap_err(), ConfigError::ZeroScreen);
        assert_eq!(RendererConfig::builder().gif_delay_cs(0).build().unwrap_err(), ConfigError::ZeroFrameDelay);
        assert_eq!(RendererConfig::builder().frame_interval_ms(0).build().unwrap_err(), ConfigError::ZeroFrameInterval);
    }

    #[test]
    fn json_fills_in_defaults() {
        let cfg = RendererConfig::from_json_str(
            r#"{ "backend": "null", "textures": { "scale_down_all": true }, "capture": { "gif_delay_cs": 6 } }"#,
        )
        .unwrap();

        assert_eq!(cfg.backend, BackendKind::Null);
        assert!(cfg.textures.scale_down_all);
        assert!(!cfg.textures.detect_pixel_doubled);
        assert_eq!(cfg.capture.gif_delay_cs, 6);
        assert_eq!(cfg.capture.frame_interval_ms, 15);
        assert_eq!(cfg.screen, SurfaceSize { width: 800, height: 600 });
    }

    #[test]
    fn json_errors_are_reported() {
        assert!(matches!(RendererConfig::from_json_str("{ nope"), Err(ConfigError::Parse(_))));
    }
}
