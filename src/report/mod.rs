//! Presentation of comparison results: terminal output, host metadata and
//! the JSON result log.

pub mod host;
pub mod json;
pub mod terminal;
