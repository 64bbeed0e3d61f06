// image-cli library
// Pipeline operations are usable without the command-line layer.

pub mod batch;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod external;
pub mod logging;
pub mod pipeline;
pub mod watermark;
