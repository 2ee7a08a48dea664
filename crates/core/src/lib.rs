//! Core library: search, download, resize and verify image datasets.

pub mod config;
pub mod error;
pub mod imaging;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod preview;
pub mod query;
pub mod rate_limit;
pub mod retrieval;
pub mod verify;

pub use error::{PipelineError, Result};
pub use pipeline::{Pipeline, PipelineBuilder};
