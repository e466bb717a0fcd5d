//! OCR backend abstraction.
//!
//! The extractor only needs "image in, text out"; backends hide how the
//! engine is driven.

use std::path::PathBuf;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from OCR backends.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    ImageError(String),
}

/// Result of one OCR run.
#[derive(Debug, Clone)]
pub struct OcrResult {
    /// Extracted text content.
    pub text: String,
    /// Which backend produced this result.
    pub backend: &'static str,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Trait for OCR backends.
pub trait OcrBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Check if this backend is available (dependencies installed).
    fn is_available(&self) -> bool;

    /// Get a description of what's needed to make this backend available.
    fn availability_hint(&self) -> String;

    /// Run OCR on a decoded image.
    fn ocr_image(&self, image: &DynamicImage) -> Result<OcrResult, OcrError>;
}

/// Configuration for the OCR engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OcrConfig {
    /// Language for OCR (e.g., "eng", "chi_sim").
    #[serde(default = "default_language")]
    pub language: String,
    /// Explicit tesseract binary. Looked up on `PATH` when unset.
    #[serde(default)]
    pub tesseract_path: Option<PathBuf>,
}

fn default_language() -> String {
    "eng".to_string()
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            tesseract_path: None,
        }
    }
}
