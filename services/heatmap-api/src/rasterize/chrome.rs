//! Headless Chrome/Chromium screenshot backend.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{RasterizeError, Rasterizer};

/// Longest stderr excerpt carried in an error.
const STDERR_LIMIT: usize = 2000;

#[derive(Debug, Clone)]
pub struct ChromeRasterizer {
    binary: String,
    width: u32,
    height: u32,
    settle: Duration,
}

impl ChromeRasterizer {
    pub fn new(binary: String, width: u32, height: u32, settle: Duration) -> Self {
        Self {
            binary,
            width,
            height,
            settle,
        }
    }

    /// Command line for one screenshot.
    pub fn arguments(&self, document: &Path, image: &Path) -> Vec<String> {
        vec![
            "--headless".to_string(),
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-gpu".to_string(),
            "--hide-scrollbars".to_string(),
            format!("--window-size={},{}", self.width, self.height),
            format!("--virtual-time-budget={}", self.settle.as_millis()),
            format!("--screenshot={}", image.display()),
            format!("file://{}", document.display()),
        ]
    }
}

fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[async_trait]
impl Rasterizer for ChromeRasterizer {
    fn name(&self) -> &'static str {
        "chrome"
    }

    async fn rasterize(&self, document: &Path, image: &Path) -> Result<(), RasterizeError> {
        let document = tokio::fs::canonicalize(document).await?;
        let image = absolute(image)?;
        let args = self.arguments(&document, &image);
        debug!(binary = %self.binary, ?args, "Launching headless browser");

        // kill_on_drop tears the browser down when the timeout drops this future
        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| RasterizeError::Launch {
                binary: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let excerpt: String = stderr.chars().take(STDERR_LIMIT).collect();
            warn!(status = %output.status, stderr = %excerpt, "Headless browser failed");
            return Err(RasterizeError::Browser {
                status: output.status.to_string(),
                stderr: excerpt.trim().to_string(),
            });
        }

        Ok(())
    }
}
