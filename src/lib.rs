//! wuzup - extract human-readable text from web pages and images.
//!
//! Pages are loaded either with a plain HTTP request or rendered in a
//! headless browser; CSS selectors pick the elements to read. Images those
//! elements reference are OCR'd and merged with the elements' own text.

pub mod cli;
pub mod config;
pub mod extract;
pub mod ocr;
pub mod scrapers;
pub mod utils;

pub use config::Settings;
pub use extract::{Backend, ExtractError, ExtractRequest, Extractor};
pub use scrapers::{FetchError, Fetcher, ScrapeResult};
