//! Batch processing: collect inputs, then run one operation over each of
//! them in turn.

pub mod collect;
pub mod runner;

pub use collect::{collect, Collected};
pub use runner::{output_dir_for, run, BatchReport};
