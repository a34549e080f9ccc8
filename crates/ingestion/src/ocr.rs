//! Optical character recognition for textless pages
//!
//! Rasterizes a single PDF page and runs it through an OCR tool. Both
//! steps shell out to the standard poppler/tesseract binaries; command
//! names and resolution are configurable.

use async_trait::async_trait;
use rapt_common::config::OcrConfig;
use rapt_common::errors::{AppError, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// Trait for per-page text recognition
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognize text on one page (1-based page number) of `path`.
    async fn recognize_page(&self, path: &Path, page_number: u32) -> Result<String>;
}

/// OCR via `pdftoppm` rasterization and `tesseract` recognition
pub struct TesseractOcr {
    config: OcrConfig,
}

impl TesseractOcr {
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }

    async fn rasterize(&self, path: &Path, page_number: u32, workdir: &Path) -> Result<PathBuf> {
        let prefix = workdir.join("page");
        let output = Command::new(&self.config.pdftoppm_cmd)
            .arg("-png")
            .arg("-r")
            .arg(self.config.dpi.to_string())
            .arg("-f")
            .arg(page_number.to_string())
            .arg("-l")
            .arg(page_number.to_string())
            .arg(path)
            .arg(&prefix)
            .output()
            .await
            .map_err(|e| AppError::Indexing {
                message: format!("Failed to run {}: {}", self.config.pdftoppm_cmd, e),
            })?;

        if !output.status.success() {
            return Err(AppError::Indexing {
                message: format!(
                    "{} exited with {}: {}",
                    self.config.pdftoppm_cmd,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        // pdftoppm pads the page number in the output name, so scan the
        // workdir rather than guessing the digit width
        let mut entries = std::fs::read_dir(workdir)?;
        entries
            .find_map(|entry| {
                let entry = entry.ok()?;
                let name = entry.file_name();
                let name = name.to_string_lossy();
                (name.starts_with("page") && name.ends_with(".png")).then(|| entry.path())
            })
            .ok_or_else(|| AppError::Indexing {
                message: format!("No raster produced for page {}", page_number),
            })
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn recognize_page(&self, path: &Path, page_number: u32) -> Result<String> {
        if !self.config.enabled {
            return Ok(String::new());
        }

        let workdir = std::env::temp_dir().join(format!("rapt-ocr-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&workdir)?;

        let result = async {
            let image = self.rasterize(path, page_number, &workdir).await?;

            let output = Command::new(&self.config.tesseract_cmd)
                .arg(&image)
                .arg("stdout")
                .output()
                .await
                .map_err(|e| AppError::Indexing {
                    message: format!("Failed to run {}: {}", self.config.tesseract_cmd, e),
                })?;

            if !output.status.success() {
                return Err(AppError::Indexing {
                    message: format!(
                        "{} exited with {}: {}",
                        self.config.tesseract_cmd,
                        output.status,
                        String::from_utf8_lossy(&output.stderr).trim()
                    ),
                });
            }

            let text = String::from_utf8_lossy(&output.stdout).into_owned();
            debug!(
                page = page_number,
                chars = text.len(),
                "OCR recognized page"
            );
            Ok(text)
        }
        .await;

        let _ = std::fs::remove_dir_all(&workdir);
        result
    }
}

/// OCR engine that recognizes nothing; used when OCR is disabled.
pub struct NoopOcr;

#[async_trait]
impl OcrEngine for NoopOcr {
    async fn recognize_page(&self, _path: &Path, _page_number: u32) -> Result<String> {
        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_recognizes_nothing() {
        let ocr = NoopOcr;
        let text = ocr
            .recognize_page(Path::new("/nonexistent.pdf"), 1)
            .await
            .unwrap();
        assert!(text.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_tesseract_short_circuits() {
        let ocr = TesseractOcr::new(OcrConfig {
            enabled: false,
            ..OcrConfig::default()
        });
        let text = ocr
            .recognize_page(Path::new("/nonexistent.pdf"), 1)
            .await
            .unwrap();
        assert!(text.is_empty());
    }

    #[tokio::test]
    async fn test_missing_binary_is_an_error() {
        let ocr = TesseractOcr::new(OcrConfig {
            pdftoppm_cmd: "definitely-not-a-real-binary".to_string(),
            ..OcrConfig::default()
        });
        let err = ocr
            .recognize_page(Path::new("/nonexistent.pdf"), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Indexing { .. }));
    }
}
