pub mod handler;
pub mod source;

pub use handler::{handler_fn, BatchHandler, FnHandler};
pub use source::{LineSource, ReadOutcome};
