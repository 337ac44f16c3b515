pub mod aggregation;
pub mod cli;
pub mod error;
pub mod executor;
pub mod filter;
pub mod input;
pub mod output;
pub mod selection;
pub mod source;
pub mod viewport;

pub use error::{Error, Result, discard_aborted};
