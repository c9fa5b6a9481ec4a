//! Error plumbing and small utilities shared by the prompthub crates.

pub mod error;
pub mod time;

pub use error::FromMessage;
