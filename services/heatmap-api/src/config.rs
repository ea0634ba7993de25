//! Service configuration.
//!
//! Defaults reproduce the reference rendering. A YAML file can override any
//! section, and a few environment variables override the file:
//!
//! | Variable                   | Field                     |
//! |----------------------------|---------------------------|
//! | `HEATMAP_ARTIFACT_DIR`     | `store.artifact_dir`      |
//! | `HEATMAP_RASTERIZER`       | `raster.backend`          |
//! | `CHROME_BIN`               | `raster.chrome_binary`    |
//! | `HEATMAP_MAX_UPLOAD_BYTES` | `server.max_upload_bytes` |

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use heatmap_common::RenderConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub store: StoreConfig,
    pub render: RenderConfig,
    pub raster: RasterConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Flat directory holding generated documents and images
    pub artifact_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("static"),
        }
    }
}

/// Which rasterizer turns documents into images.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterBackend {
    #[default]
    Native,
    Chrome,
}

impl FromStr for RasterBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" => Ok(RasterBackend::Native),
            "chrome" | "chromium" => Ok(RasterBackend::Chrome),
            other => bail!("unknown rasterizer '{}': expected 'native' or 'chrome'", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    pub backend: RasterBackend,
    pub width: u32,
    pub height: u32,
    /// Time given to the page to load tiles and draw before capture
    pub settle_delay_ms: u64,
    pub poll_attempts: u32,
    pub poll_interval_ms: u64,
    pub timeout_secs: u64,
    pub chrome_binary: String,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            backend: RasterBackend::Native,
            width: 1280,
            height: 720,
            settle_delay_ms: 3000,
            poll_attempts: 10,
            poll_interval_ms: 500,
            timeout_secs: 60,
            chrome_binary: "chromium".to_string(),
        }
    }
}

impl RasterConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:5000".to_string(),
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}

impl ServiceConfig {
    /// Load from an optional YAML file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply overrides from `lookup` (normally the process environment).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("HEATMAP_ARTIFACT_DIR") {
            self.store.artifact_dir = PathBuf::from(dir);
        }
        if let Some(backend) = lookup("HEATMAP_RASTERIZER") {
            self.raster.backend = backend.parse()?;
        }
        if let Some(binary) = lookup("CHROME_BIN") {
            self.raster.chrome_binary = binary;
        }
        if let Some(limit) = lookup("HEATMAP_MAX_UPLOAD_BYTES") {
            self.server.max_upload_bytes = limit
                .trim()
                .parse()
                .with_context(|| format!("HEATMAP_MAX_UPLOAD_BYTES is not a byte count: {}", limit))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.render.validate().context("Invalid render config")?;

        let raster = &self.raster;
        if raster.width == 0 || raster.height == 0 {
            bail!(
                "raster size must be non-zero, got {}x{}",
                raster.width,
                raster.height
            );
        }
        let [pad_x, pad_y] = self.render.map.fit_padding;
        if 2 * pad_x >= raster.width || 2 * pad_y >= raster.height {
            bail!(
                "fit padding {:?} leaves no room in a {}x{} image",
                self.render.map.fit_padding,
                raster.width,
                raster.height
            );
        }
        if raster.poll_attempts == 0 {
            bail!("raster.poll_attempts must be at least 1");
        }
        if raster.timeout_secs == 0 {
            bail!("raster.timeout_secs must be at least 1");
        }
        if raster.backend == RasterBackend::Chrome && raster.chrome_binary.trim().is_empty() {
            bail!("raster.chrome_binary must be set for the chrome backend");
        }
        if self.server.max_upload_bytes == 0 {
            bail!("server.max_upload_bytes must be positive");
        }
        Ok(())
    }
}
