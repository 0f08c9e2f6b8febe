//! Fuzzy matching of OCR text against game catalogs and platform aliases.
//!
//! The pipeline normalizes raw OCR text ([`text`]), resolves the platform
//! from an alias table ([`platform`]), then ranks titles from that
//! platform's catalog ([`catalog`]).

pub mod catalog;
pub mod loader;
pub mod ocr;
pub mod platform;
pub mod similarity;
pub mod store;
pub mod text;
