//! Multi-pass OCR over one image.

use std::sync::Arc;

use image::DynamicImage;
use tracing::debug;

use super::backend::{OcrBackend, OcrError};
use super::variants::ocr_variants;
use crate::utils::UniqueLines;

/// Runs the OCR engine over every rendering of an image and merges the
/// results line by line.
#[derive(Clone)]
pub struct ImageTextExtractor {
    backend: Arc<dyn OcrBackend>,
}

impl ImageTextExtractor {
    pub fn new(backend: Arc<dyn OcrBackend>) -> Self {
        Self { backend }
    }

    /// OCR `image` and return its deduplicated lines joined by newlines.
    pub fn image_to_text(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let mut lines = UniqueLines::new();
        self.collect_lines(image, &mut lines)?;
        Ok(lines.join())
    }

    /// OCR `image` and append its lines to `lines`.
    ///
    /// Runs exactly five passes (white, black, red, green, blue). A line is
    /// kept only the first time its lower-cased form is seen in `lines`, so
    /// sharing one set across images deduplicates across all of them.
    pub fn collect_lines(
        &self,
        image: &DynamicImage,
        lines: &mut UniqueLines,
    ) -> Result<(), OcrError> {
        debug!(
            "Running OCR on {}x{} image with {}",
            image.width(),
            image.height(),
            self.backend.name()
        );
        for (variant, rendered) in ocr_variants(image) {
            let result = self.backend.ocr_image(&rendered)?;
            let before = lines.len();
            lines.push_text(result.text.trim());
            debug!(
                "OCR pass '{}' took {}ms, {} new line(s)",
                variant,
                result.processing_time_ms,
                lines.len() - before
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::OcrResult;
    use std::sync::Mutex;

    /// Returns canned text per pass and counts calls.
    struct ScriptedOcr {
        outputs: Vec<&'static str>,
        calls: Mutex<usize>,
    }

    impl ScriptedOcr {
        fn new(outputs: Vec<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                outputs,
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    impl OcrBackend for ScriptedOcr {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn is_available(&self) -> bool {
            true
        }

        fn availability_hint(&self) -> String {
            String::new()
        }

        fn ocr_image(&self, _image: &DynamicImage) -> Result<OcrResult, OcrError> {
            let mut calls = self.calls.lock().unwrap();
            let text = self.outputs.get(*calls).copied().unwrap_or_default();
            *calls += 1;
            Ok(OcrResult {
                text: text.to_string(),
                backend: "scripted",
                processing_time_ms: 0,
            })
        }
    }

    struct FailingOcr;

    impl OcrBackend for FailingOcr {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn is_available(&self) -> bool {
            false
        }

        fn availability_hint(&self) -> String {
            "never".to_string()
        }

        fn ocr_image(&self, _image: &DynamicImage) -> Result<OcrResult, OcrError> {
            Err(OcrError::OcrFailed("boom".to_string()))
        }
    }

    fn image() -> DynamicImage {
        DynamicImage::new_rgba8(8, 8)
    }

    #[test]
    fn test_always_five_passes() {
        let ocr = ScriptedOcr::new(vec![]);
        let extractor = ImageTextExtractor::new(ocr.clone());
        assert_eq!(extractor.image_to_text(&image()).unwrap(), "");
        assert_eq!(ocr.calls(), 5);

        let ocr = ScriptedOcr::new(vec!["a", "b", "c", "d", "e"]);
        let extractor = ImageTextExtractor::new(ocr.clone());
        extractor.image_to_text(&image()).unwrap();
        assert_eq!(ocr.calls(), 5);
    }

    #[test]
    fn test_first_casing_wins_across_passes() {
        let ocr = ScriptedOcr::new(vec![
            "Hello World\nSALE",
            "hello world\nDark Text",
            "  sale  \n\n   \nRed Only",
            "DARK TEXT",
            "Blue\nred only",
        ]);
        let extractor = ImageTextExtractor::new(ocr);
        assert_eq!(
            extractor.image_to_text(&image()).unwrap(),
            "Hello World\nSALE\nDark Text\nRed Only\nBlue"
        );
    }

    #[test]
    fn test_blank_output_dropped() {
        let ocr = ScriptedOcr::new(vec!["   ", "\n\n", "\t", "", " \n \n "]);
        let extractor = ImageTextExtractor::new(ocr);
        assert_eq!(extractor.image_to_text(&image()).unwrap(), "");
    }

    #[test]
    fn test_shared_set_dedups_across_images() {
        let ocr = ScriptedOcr::new(vec![
            "Price", "", "", "", "", // first image
            "PRICE\nTotal", "", "", "", "", // second image
        ]);
        let extractor = ImageTextExtractor::new(ocr.clone());
        let mut lines = UniqueLines::new();
        extractor.collect_lines(&image(), &mut lines).unwrap();
        extractor.collect_lines(&image(), &mut lines).unwrap();
        assert_eq!(lines.join(), "Price\nTotal");
        assert_eq!(ocr.calls(), 10);
    }

    #[test]
    fn test_backend_error_propagates() {
        let extractor = ImageTextExtractor::new(Arc::new(FailingOcr));
        let err = extractor.image_to_text(&image()).unwrap_err();
        assert!(matches!(err, OcrError::OcrFailed(_)));
    }
}
