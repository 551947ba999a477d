//! Utility functions and helpers.

pub mod http;
pub mod log;

#[cfg(test)]
pub(crate) mod testing;
