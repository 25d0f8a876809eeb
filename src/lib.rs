//! # graderace
//!
//! Summarise horse-race result pages with Gemini.
//!
//! ## Pipeline
//!
//! - **Fetch**: download the page and decode it from Shift_JIS
//! - **Extract**: take the whitespace-normalized text of `div#main_contents`
//! - **Summarise**: send it to Gemini (flash or pro) and print/copy the result

pub mod agent;
pub mod config;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod scraper;
pub mod summary;

pub use config::Config;
pub use pipeline::{Pipeline, PipelineError};
pub use summary::Summary;
