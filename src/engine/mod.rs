pub mod cutter;
pub mod processor;
#[cfg(test)]
mod integration_tests;

pub use cutter::{run_cutter, BatchBuffer, BatchCutter};
pub use processor::{BatchProcessor, OutcomeLedger};
