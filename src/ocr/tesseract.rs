//! Tesseract OCR backend implementation.
//!
//! Uses Tesseract OCR via command-line for text extraction. Each image is
//! written to a temporary PNG first.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use image::DynamicImage;
use tracing::debug;

use super::backend::{OcrBackend, OcrConfig, OcrError, OcrResult};

const BINARY_NAME: &str = "tesseract";

/// Tesseract OCR backend.
pub struct TesseractBackend {
    config: OcrConfig,
}

impl TesseractBackend {
    /// Create a new Tesseract backend with default configuration.
    pub fn new() -> Self {
        Self {
            config: OcrConfig::default(),
        }
    }

    /// Create a new Tesseract backend with custom configuration.
    pub fn with_config(config: OcrConfig) -> Self {
        Self { config }
    }

    /// Resolve the tesseract binary: configured path, `PATH`, then fallback
    /// install locations.
    pub fn binary(&self) -> Option<PathBuf> {
        if let Some(ref path) = self.config.tesseract_path {
            return path.exists().then(|| path.clone());
        }
        if let Ok(path) = which::which(BINARY_NAME) {
            return Some(path);
        }
        fallback_dirs()
            .into_iter()
            .map(|dir| dir.join(executable_name()))
            .find(|p| p.exists())
    }

    /// Run Tesseract on an image file.
    fn run_tesseract(&self, binary: &Path, image_path: &Path) -> Result<String, OcrError> {
        let output = Command::new(binary)
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.config.language])
            .output();

        match output {
            Ok(output) => {
                if output.status.success() {
                    Ok(String::from_utf8_lossy(&output.stdout).to_string())
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    Err(OcrError::OcrFailed(format!("tesseract failed: {}", stderr)))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(not_found()),
            Err(e) => Err(OcrError::Io(e)),
        }
    }
}

impl Default for TesseractBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found() -> OcrError {
    OcrError::BackendNotAvailable("tesseract not found (install tesseract-ocr)".to_string())
}

fn executable_name() -> String {
    format!("{}{}", BINARY_NAME, std::env::consts::EXE_SUFFIX)
}

/// Install locations checked when tesseract is not on `PATH`.
fn fallback_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
    {
        dirs.push(exe_dir.join(BINARY_NAME));
    }
    if cfg!(windows) {
        dirs.push(PathBuf::from(r"C:\Program Files\Tesseract-OCR"));
    }
    dirs
}

impl OcrBackend for TesseractBackend {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn is_available(&self) -> bool {
        self.binary().is_some()
    }

    fn availability_hint(&self) -> String {
        if self.is_available() {
            "Tesseract is available".to_string()
        } else {
            "Tesseract not installed. Install with: apt install tesseract-ocr, \
             or set ocr.tesseract_path"
                .to_string()
        }
    }

    fn ocr_image(&self, image: &DynamicImage) -> Result<OcrResult, OcrError> {
        let start = Instant::now();
        let binary = self.binary().ok_or_else(not_found)?;

        let file = tempfile::Builder::new()
            .prefix("wuzup-ocr-")
            .suffix(".png")
            .tempfile()?;
        image
            .save_with_format(file.path(), image::ImageFormat::Png)
            .map_err(|e| OcrError::ImageError(e.to_string()))?;

        let text = self.run_tesseract(&binary, file.path())?;
        let elapsed = start.elapsed();
        debug!(
            "tesseract produced {} chars in {}ms",
            text.len(),
            elapsed.as_millis()
        );

        Ok(OcrResult {
            text,
            backend: self.name(),
            processing_time_ms: elapsed.as_millis() as u64,
        })
    }
}
