//! OCR text extraction.
//!
//! Light-on-dark and colored text often vanishes in a single grayscale
//! pass, so every image is OCR'd five times: composited on white, on black,
//! and as each RGB channel of the white composite. Results are merged
//! line by line, keeping the first casing of each line.
//!
//! Tesseract (command-line) is the only engine; [`OcrBackend`] exists so the
//! extractor can be driven by a fake in tests.

mod backend;
mod extractor;
mod tesseract;
pub mod variants;

pub use backend::{OcrBackend, OcrConfig, OcrError, OcrResult};
pub use extractor::ImageTextExtractor;
pub use tesseract::TesseractBackend;
